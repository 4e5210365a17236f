// Derived channel metrics: engagement, growth, upload cadence and the 0-100 performance score.
// Everything here is pure arithmetic over already-fetched video statistics.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::Serialize;
use std::collections::HashMap;

/// Window used when comparing recent uploads against the oldest ones
pub const GROWTH_WINDOW: usize = 10;
const FREQUENCY_GAPS: usize = 10;
const RECENT_UPLOADS: usize = 10;
const TOP_KEYWORDS: usize = 5;

const VIRAL_VIEWS: u64 = 1_000_000;
const POPULAR_VIEWS: u64 = 100_000;
const MODERATE_VIEWS: u64 = 10_000;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSample {
    pub video_id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub thumbnail_url: Option<String>,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
}

/// Channel-level facts that do not come from the video list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub channel_id: String,
    pub title: String,
    pub thumbnail_url: String,
    pub subscriber_count: u64,
    pub video_count: u64,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UploadFrequency {
    Daily,
    #[serde(rename = "Every 2-3 days")]
    EveryFewDays,
    Weekly,
    #[serde(rename = "Bi-weekly")]
    BiWeekly,
    Monthly,
    Irregular,
}

impl UploadFrequency {
    pub fn label(self) -> &'static str {
        match self {
            UploadFrequency::Daily => "Daily",
            UploadFrequency::EveryFewDays => "Every 2-3 days",
            UploadFrequency::Weekly => "Weekly",
            UploadFrequency::BiWeekly => "Bi-weekly",
            UploadFrequency::Monthly => "Monthly",
            UploadFrequency::Irregular => "Irregular",
        }
    }

    fn from_average_gap(days: f64) -> Self {
        if days <= 1.0 {
            UploadFrequency::Daily
        } else if days <= 3.0 {
            UploadFrequency::EveryFewDays
        } else if days <= 7.0 {
            UploadFrequency::Weekly
        } else if days <= 14.0 {
            UploadFrequency::BiWeekly
        } else if days <= 30.0 {
            UploadFrequency::Monthly
        } else {
            UploadFrequency::Irregular
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ViewDistribution {
    pub viral: usize,
    pub popular: usize,
    pub moderate: usize,
    pub low: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMetrics {
    pub video_sample_size: usize,
    pub total_views: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub avg_views_per_video: u64,
    pub avg_likes_per_video: u64,
    pub avg_comments_per_video: u64,
    pub overall_engagement_rate: f64,
    pub average_engagement_rate: f64,
    pub like_rate: f64,
    pub comment_rate: f64,
    pub upload_frequency: UploadFrequency,
    pub view_distribution: ViewDistribution,
    pub growth_rate: f64,
    pub best_upload_day: Option<&'static str>,
    pub average_upload_hour: u32,
    pub top_keywords: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceScore {
    pub views: u32,
    pub subscribers: u32,
    pub engagement: u32,
    pub consistency: u32,
    pub viral_potential: u32,
    pub overall: u32,
    pub level: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViralScore {
    pub score: u32,
    pub level: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tip {
    pub title: &'static str,
    pub description: String,
    pub priority: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub title: &'static str,
    pub description: String,
    pub recommendation: String,
    pub better_channel: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoHighlight {
    pub video_id: String,
    pub title: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub thumbnail_url: Option<String>,
    pub published_at: DateTime<Utc>,
}

/// One side of a channel comparison
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub subscriber_count: u64,
    pub video_count: u64,
    /// Views summed over the sampled videos
    pub view_count: u64,
    pub engagement_rate: f64,
    pub growth_rate: f64,
    pub upload_frequency: UploadFrequency,
    pub avg_upload_time: String,
    pub viral_videos: usize,
    pub published_at: Option<DateTime<Utc>>,
    pub best_performing_video: Option<VideoHighlight>,
    pub recent_uploads: Vec<VideoHighlight>,
    pub top_keywords: Vec<String>,
    pub performance: PerformanceScore,
    pub viral_score: ViralScore,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub channel1: ChannelProfile,
    pub channel2: ChannelProfile,
    /// "Channel 1", "Channel 2" or "Tie" by overall performance score
    pub winner: &'static str,
    pub insights: Vec<Insight>,
}

// ============================================================================
// Engagement
// ============================================================================

/// (likes + comments) / views as a percentage. Zero views yields zero.
pub fn engagement_rate(video: &VideoSample) -> f64 {
    if video.views == 0 {
        return 0.0;
    }
    (video.likes + video.comments) as f64 / video.views as f64 * 100.0
}

/// Mean of the per-video engagement rates
pub fn average_engagement_rate(videos: &[VideoSample]) -> f64 {
    if videos.is_empty() {
        return 0.0;
    }
    videos.iter().map(engagement_rate).sum::<f64>() / videos.len() as f64
}

/// Engagement over the summed counts, so large videos weigh more
pub fn overall_engagement_rate(videos: &[VideoSample]) -> f64 {
    let views: u64 = videos.iter().map(|v| v.views).sum();
    if views == 0 {
        return 0.0;
    }
    let interactions: u64 = videos.iter().map(|v| v.likes + v.comments).sum();
    interactions as f64 / views as f64 * 100.0
}

// ============================================================================
// Growth and cadence
// ============================================================================

fn newest_first(videos: &[VideoSample]) -> Vec<&VideoSample> {
    let mut sorted: Vec<&VideoSample> = videos.iter().collect();
    sorted.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    sorted
}

fn mean_views(videos: &[&VideoSample]) -> f64 {
    if videos.is_empty() {
        return 0.0;
    }
    videos.iter().map(|v| v.views as f64).sum::<f64>() / videos.len() as f64
}

/// Percentage change between the average views of the newest `window` videos
/// and the oldest `window` videos. Fewer than two videos yields zero.
pub fn growth_rate(videos: &[VideoSample], window: usize) -> f64 {
    if videos.len() < 2 || window == 0 {
        return 0.0;
    }

    let sorted = newest_first(videos);
    let take = window.min(sorted.len());
    let recent = mean_views(&sorted[..take]);
    let older = mean_views(&sorted[sorted.len() - take..]);

    if older > 0.0 {
        (recent - older) / older * 100.0
    } else {
        0.0
    }
}

pub fn upload_frequency(videos: &[VideoSample]) -> UploadFrequency {
    if videos.len() < 2 {
        return UploadFrequency::Irregular;
    }

    let sorted = newest_first(videos);
    let gaps: Vec<f64> = sorted
        .windows(2)
        .take(FREQUENCY_GAPS)
        .map(|pair| {
            let seconds = (pair[0].published_at - pair[1].published_at).num_seconds().abs();
            seconds as f64 / 86_400.0
        })
        .collect();

    let average = gaps.iter().sum::<f64>() / gaps.len() as f64;
    UploadFrequency::from_average_gap(average)
}

pub fn view_distribution(videos: &[VideoSample]) -> ViewDistribution {
    videos.iter().fold(ViewDistribution::default(), |mut dist, video| {
        match video.views {
            v if v > VIRAL_VIEWS => dist.viral += 1,
            v if v > POPULAR_VIEWS => dist.popular += 1,
            v if v > MODERATE_VIEWS => dist.moderate += 1,
            _ => dist.low += 1,
        }
        dist
    })
}

/// Videos above max(100K, twice the channel's mean views)
pub fn viral_video_count(videos: &[VideoSample]) -> usize {
    if videos.is_empty() {
        return 0;
    }
    let total: u64 = videos.iter().map(|v| v.views).sum();
    let threshold = (POPULAR_VIEWS as f64).max(total as f64 / videos.len() as f64 * 2.0);
    videos.iter().filter(|v| v.views as f64 > threshold).count()
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Most common upload weekday; ties go to the earlier day starting from Sunday
pub fn best_upload_day(videos: &[VideoSample]) -> Option<&'static str> {
    let mut counts = [0usize; 7];
    for video in videos {
        counts[video.published_at.weekday().num_days_from_sunday() as usize] += 1;
    }

    let (best, count) = counts
        .iter()
        .enumerate()
        .fold((0usize, 0usize), |best, (day, &count)| if count > best.1 { (day, count) } else { best });

    if count == 0 {
        return None;
    }
    let day = Weekday::Sun;
    let day = (0..best).fold(day, |d, _| d.succ());
    Some(weekday_name(day))
}

/// Rounded mean UTC hour of upload, 12 when there are no videos
pub fn average_upload_hour(videos: &[VideoSample]) -> u32 {
    if videos.is_empty() {
        return 12;
    }
    let sum: u32 = videos.iter().map(|v| v.published_at.hour()).sum();
    (sum as f64 / videos.len() as f64).round() as u32
}

/// Most frequent lower-cased title words longer than three characters
pub fn top_keywords(videos: &[VideoSample], limit: usize) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut order = 0usize;

    for video in videos {
        for word in video.title.to_lowercase().split_whitespace() {
            if word.chars().count() <= 3 {
                continue;
            }
            let entry = counts.entry(word.to_string()).or_insert_with(|| {
                order += 1;
                (0, order)
            });
            entry.0 += 1;
        }
    }

    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked.into_iter().take(limit).map(|(word, _)| word).collect()
}

pub fn channel_metrics(videos: &[VideoSample]) -> ChannelMetrics {
    let n = videos.len();
    let total_views: u64 = videos.iter().map(|v| v.views).sum();
    let total_likes: u64 = videos.iter().map(|v| v.likes).sum();
    let total_comments: u64 = videos.iter().map(|v| v.comments).sum();

    let per_video = |total: u64| if n == 0 { 0 } else { (total as f64 / n as f64).round() as u64 };
    let rate = |part: u64| if total_views == 0 { 0.0 } else { part as f64 / total_views as f64 * 100.0 };

    ChannelMetrics {
        video_sample_size: n,
        total_views,
        total_likes,
        total_comments,
        avg_views_per_video: per_video(total_views),
        avg_likes_per_video: per_video(total_likes),
        avg_comments_per_video: per_video(total_comments),
        overall_engagement_rate: overall_engagement_rate(videos),
        average_engagement_rate: average_engagement_rate(videos),
        like_rate: rate(total_likes),
        comment_rate: rate(total_comments),
        upload_frequency: upload_frequency(videos),
        view_distribution: view_distribution(videos),
        growth_rate: growth_rate(videos, GROWTH_WINDOW),
        best_upload_day: best_upload_day(videos),
        average_upload_hour: average_upload_hour(videos),
        top_keywords: top_keywords(videos, TOP_KEYWORDS),
    }
}

// ============================================================================
// Scoring
// ============================================================================

fn bucket<T: PartialOrd + Copy>(value: T, table: &[(T, u32)]) -> u32 {
    table
        .iter()
        .find(|(threshold, _)| value > *threshold)
        .map(|(_, points)| *points)
        .unwrap_or(0)
}

const VIEW_BUCKETS: [(u64, u32); 10] = [
    (1_000_000, 20),
    (500_000, 18),
    (100_000, 16),
    (50_000, 14),
    (10_000, 12),
    (5_000, 10),
    (1_000, 8),
    (500, 6),
    (100, 4),
    (0, 2),
];

const SUBSCRIBER_BUCKETS: [(u64, u32); 10] = [
    (10_000_000, 20),
    (5_000_000, 18),
    (1_000_000, 16),
    (500_000, 14),
    (100_000, 12),
    (50_000, 10),
    (10_000, 8),
    (5_000, 6),
    (1_000, 4),
    (0, 2),
];

const ENGAGEMENT_BUCKETS: [(f64, u32); 10] = [
    (10.0, 20),
    (8.0, 18),
    (6.0, 16),
    (4.0, 14),
    (3.0, 12),
    (2.0, 10),
    (1.5, 8),
    (1.0, 6),
    (0.5, 4),
    (0.0, 2),
];

fn consistency_points(frequency: UploadFrequency) -> u32 {
    match frequency {
        UploadFrequency::Daily => 20,
        UploadFrequency::EveryFewDays => 18,
        UploadFrequency::Weekly => 16,
        UploadFrequency::BiWeekly => 12,
        UploadFrequency::Monthly => 8,
        UploadFrequency::Irregular => 4,
    }
}

fn viral_potential_points(metrics: &ChannelMetrics) -> u32 {
    let n = metrics.video_sample_size as f64;
    let viral_ratio = metrics.view_distribution.viral as f64 / n;
    let popular_ratio = metrics.view_distribution.popular as f64 / n;

    let mut points = bucket(viral_ratio, &[(0.1, 8), (0.05, 6), (0.02, 4)]);
    points += bucket(popular_ratio, &[(0.3, 6), (0.2, 4), (0.1, 2)]);
    points += bucket(metrics.growth_rate, &[(50.0, 6), (20.0, 4), (0.0, 2)]);
    points.min(20)
}

pub fn performance_level(score: u32) -> &'static str {
    match score {
        80.. => "Excellent",
        60..=79 => "Good",
        40..=59 => "Average",
        _ => "Needs Work",
    }
}

/// Five 0-20 components summed to a 0-100 score. A channel with no sampled
/// videos scores zero across the board.
pub fn performance_score(metrics: &ChannelMetrics, subscriber_count: u64) -> PerformanceScore {
    if metrics.video_sample_size == 0 {
        return PerformanceScore {
            views: 0,
            subscribers: 0,
            engagement: 0,
            consistency: 0,
            viral_potential: 0,
            overall: 0,
            level: performance_level(0),
        };
    }

    let views = bucket(metrics.avg_views_per_video, &VIEW_BUCKETS);
    let subscribers = bucket(subscriber_count, &SUBSCRIBER_BUCKETS);
    let engagement = bucket(metrics.overall_engagement_rate, &ENGAGEMENT_BUCKETS);
    let consistency = consistency_points(metrics.upload_frequency);
    let viral_potential = viral_potential_points(metrics);
    let overall = views + subscribers + engagement + consistency + viral_potential;

    PerformanceScore {
        views,
        subscribers,
        engagement,
        consistency,
        viral_potential,
        overall,
        level: performance_level(overall),
    }
}

pub fn viral_score(engagement_rate: f64, viral_videos: usize) -> ViralScore {
    let raw = engagement_rate * 10.0 + viral_videos as f64 * 5.0;
    let score = raw.round().clamp(0.0, 100.0) as u32;
    let level = match score {
        81.. => "Viral",
        61..=80 => "Popular",
        41..=60 => "Moderate",
        _ => "Low",
    };
    ViralScore { score, level }
}

pub fn improvement_tips(score: &PerformanceScore, metrics: &ChannelMetrics) -> Vec<Tip> {
    let mut tips = Vec::new();

    if score.views < 10 {
        tips.push(Tip {
            title: "Improve Thumbnails & Titles",
            description: "Create eye-catching thumbnails and compelling titles with clear faces and curiosity-driven text.".to_string(),
            priority: "high",
        });
    }
    if score.engagement < 12 {
        tips.push(Tip {
            title: "Boost Engagement",
            description: "Ask questions, respond to comments within the first hour, and use calls to action.".to_string(),
            priority: "high",
        });
    }
    if score.consistency < 15 {
        tips.push(Tip {
            title: "Upload Consistently",
            description: format!(
                "Your current frequency: {}. Try uploading at least weekly on the same day.",
                metrics.upload_frequency.label()
            ),
            priority: "medium",
        });
    }
    if score.viral_potential < 10 {
        tips.push(Tip {
            title: "Follow Trends",
            description: "Create content around trending topics and participate in challenges.".to_string(),
            priority: "high",
        });
    }
    if let Some(day) = metrics.best_upload_day {
        tips.push(Tip {
            title: "Optimal Upload Time",
            description: format!("Your most common upload day is {}. Upload between 2-4 PM or 7-9 PM for maximum reach.", day),
            priority: "medium",
        });
    }

    tips
}

// ============================================================================
// Comparison
// ============================================================================

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 1234 -> "1.2K", 2_500_000 -> "2.5M"
pub fn compact_number(value: u64) -> String {
    if value >= 1_000_000 {
        format!("{:.1}M", value as f64 / 1_000_000.0)
    } else if value >= 1_000 {
        format!("{:.1}K", value as f64 / 1_000.0)
    } else {
        value.to_string()
    }
}

fn highlight(video: &VideoSample) -> VideoHighlight {
    VideoHighlight {
        video_id: video.video_id.clone(),
        title: video.title.clone(),
        view_count: video.views,
        like_count: video.likes,
        comment_count: video.comments,
        thumbnail_url: video.thumbnail_url.clone(),
        published_at: video.published_at,
    }
}

/// `videos` are expected in the playlist's order (newest first)
pub fn channel_profile(summary: &ChannelSummary, videos: &[VideoSample]) -> ChannelProfile {
    let metrics = channel_metrics(videos);
    let viral_videos = viral_video_count(videos);
    let engagement = round2(metrics.overall_engagement_rate);
    let performance = performance_score(&metrics, summary.subscriber_count);

    // First video wins ties, matching a left fold over the list
    let best_performing_video = videos
        .iter()
        .fold(None::<&VideoSample>, |best, v| match best {
            Some(b) if b.views >= v.views => Some(b),
            _ => Some(v),
        })
        .map(highlight);

    ChannelProfile {
        id: summary.channel_id.clone(),
        title: summary.title.clone(),
        thumbnail: summary.thumbnail_url.clone(),
        subscriber_count: summary.subscriber_count,
        video_count: summary.video_count,
        view_count: metrics.total_views,
        engagement_rate: engagement,
        growth_rate: round2(metrics.growth_rate),
        upload_frequency: metrics.upload_frequency,
        avg_upload_time: format!("{}:00", metrics.average_upload_hour),
        viral_videos,
        published_at: summary.published_at,
        best_performing_video,
        recent_uploads: videos.iter().take(RECENT_UPLOADS).map(highlight).collect(),
        top_keywords: metrics.top_keywords.clone(),
        performance,
        viral_score: viral_score(engagement, viral_videos),
    }
}

fn leader(first_ahead: bool) -> &'static str {
    if first_ahead {
        "Channel 1"
    } else {
        "Channel 2"
    }
}

pub fn growth_insights(a: &ChannelProfile, b: &ChannelProfile) -> Vec<Insight> {
    let mut insights = Vec::new();

    if a.avg_upload_time != b.avg_upload_time {
        let a_hour: u32 = a.avg_upload_time.split(':').next().and_then(|h| h.parse().ok()).unwrap_or(0);
        let b_hour: u32 = b.avg_upload_time.split(':').next().and_then(|h| h.parse().ok()).unwrap_or(0);
        let (better, time) = if a_hour > b_hour { ("Channel 1", &a.avg_upload_time) } else { ("Channel 2", &b.avg_upload_time) };
        insights.push(Insight {
            title: "Upload Timing",
            description: format!("{} uploads at {}, which may reach more viewers during peak hours.", better, time),
            recommendation: format!("Consider adjusting your upload time to {} for better visibility.", time),
            better_channel: better,
        });
    }

    if a.viral_videos != b.viral_videos {
        let better = leader(a.viral_videos > b.viral_videos);
        let diff = a.viral_videos.abs_diff(b.viral_videos);
        insights.push(Insight {
            title: "Viral Content",
            description: format!("{} has {} more viral videos, significantly boosting subscriber growth.", better, diff),
            recommendation: "Analyze your viral videos to understand what works, then create more content in that style.".to_string(),
            better_channel: better,
        });
    }

    if (a.engagement_rate - b.engagement_rate).abs() > 1.0 {
        let better = leader(a.engagement_rate > b.engagement_rate);
        insights.push(Insight {
            title: "Audience Engagement",
            description: format!(
                "{} has a higher engagement rate ({:.2}%), indicating stronger audience connection.",
                better,
                a.engagement_rate.max(b.engagement_rate)
            ),
            recommendation: "Respond to comments soon after posting to boost engagement and recommendation chances.".to_string(),
            better_channel: better,
        });
    }

    if a.view_count.abs_diff(b.view_count) > 100_000 {
        let better = leader(a.view_count > b.view_count);
        insights.push(Insight {
            title: "View Count Advantage",
            description: format!(
                "{} has {} more total views, indicating stronger content reach.",
                better,
                compact_number(a.view_count.abs_diff(b.view_count))
            ),
            recommendation: "Analyze high-performing videos from the leading channel to understand successful content patterns.".to_string(),
            better_channel: better,
        });
    }

    if a.subscriber_count.abs_diff(b.subscriber_count) > 10_000 {
        let better = leader(a.subscriber_count > b.subscriber_count);
        insights.push(Insight {
            title: "Subscriber Base",
            description: format!(
                "{} has {} more subscribers, indicating stronger audience loyalty.",
                better,
                compact_number(a.subscriber_count.abs_diff(b.subscriber_count))
            ),
            recommendation: "Focus on consistent upload schedules and community engagement to build subscriber loyalty.".to_string(),
            better_channel: better,
        });
    }

    insights
}

pub fn compare_channels(
    first: (&ChannelSummary, &[VideoSample]),
    second: (&ChannelSummary, &[VideoSample]),
) -> Comparison {
    let channel1 = channel_profile(first.0, first.1);
    let channel2 = channel_profile(second.0, second.1);

    let winner = match channel1.performance.overall.cmp(&channel2.performance.overall) {
        std::cmp::Ordering::Greater => "Channel 1",
        std::cmp::Ordering::Less => "Channel 2",
        std::cmp::Ordering::Equal => "Tie",
    };
    let insights = growth_insights(&channel1, &channel2);

    Comparison {
        channel1,
        channel2,
        winner,
        insights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn video(days_ago: i64, views: u64, likes: u64, comments: u64) -> VideoSample {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 15, 0, 0).unwrap();
        VideoSample {
            video_id: format!("v{}", days_ago),
            title: format!("Rust tutorial episode {}", days_ago),
            published_at: base - Duration::days(days_ago),
            thumbnail_url: None,
            views,
            likes,
            comments,
        }
    }

    fn summary(subscribers: u64) -> ChannelSummary {
        ChannelSummary {
            channel_id: "UC123".to_string(),
            title: "Channel".to_string(),
            thumbnail_url: String::new(),
            subscriber_count: subscribers,
            video_count: 5,
            published_at: None,
        }
    }

    #[test]
    fn test_engagement_zero_views_is_zero() {
        let v = video(0, 0, 10, 5);
        assert_eq!(engagement_rate(&v), 0.0);
        assert_eq!(overall_engagement_rate(&[v.clone()]), 0.0);
        assert_eq!(average_engagement_rate(&[]), 0.0);
    }

    #[test]
    fn test_engagement_rate() {
        let v = video(0, 1000, 40, 10);
        assert!((engagement_rate(&v) - 5.0).abs() < 1e-9);

        // mean of 5% and 0%
        let videos = vec![v, video(1, 0, 0, 0)];
        assert!((average_engagement_rate(&videos) - 2.5).abs() < 1e-9);
        assert!((overall_engagement_rate(&videos) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_growth_needs_two_videos() {
        assert_eq!(growth_rate(&[], GROWTH_WINDOW), 0.0);
        assert_eq!(growth_rate(&[video(0, 5000, 0, 0)], GROWTH_WINDOW), 0.0);
    }

    #[test]
    fn test_growth_recent_vs_oldest() {
        // newest has 300 views, oldest 100 -> +200%
        let videos = vec![video(10, 100, 0, 0), video(0, 300, 0, 0)];
        assert!((growth_rate(&videos, 1) - 200.0).abs() < 1e-9);

        // older average of zero is reported as no growth
        let flat = vec![video(10, 0, 0, 0), video(0, 300, 0, 0)];
        assert_eq!(growth_rate(&flat, 1), 0.0);
    }

    #[test]
    fn test_upload_frequency_buckets() {
        assert_eq!(upload_frequency(&[video(0, 1, 0, 0)]), UploadFrequency::Irregular);

        let daily: Vec<_> = (0..5).map(|d| video(d, 1, 0, 0)).collect();
        assert_eq!(upload_frequency(&daily), UploadFrequency::Daily);

        let weekly: Vec<_> = (0..5).map(|w| video(w * 7, 1, 0, 0)).collect();
        assert_eq!(upload_frequency(&weekly), UploadFrequency::Weekly);

        let sparse: Vec<_> = (0..3).map(|m| video(m * 60, 1, 0, 0)).collect();
        assert_eq!(upload_frequency(&sparse), UploadFrequency::Irregular);
        assert_eq!(UploadFrequency::EveryFewDays.label(), "Every 2-3 days");
    }

    #[test]
    fn test_view_distribution_and_viral_count() {
        let videos = vec![
            video(0, 2_000_000, 0, 0),
            video(1, 500_000, 0, 0),
            video(2, 50_000, 0, 0),
            video(3, 10_000, 0, 0),
        ];
        let dist = view_distribution(&videos);
        assert_eq!(dist, ViewDistribution { viral: 1, popular: 1, moderate: 1, low: 1 });

        // mean is 640K, so only the 2M video clears 2x the mean
        assert_eq!(viral_video_count(&videos), 1);
        assert_eq!(viral_video_count(&[]), 0);
    }

    #[test]
    fn test_keywords_and_upload_habits() {
        let mut videos = vec![video(0, 1, 0, 0), video(1, 1, 0, 0)];
        videos[1].title = "Async Rust deep dive".to_string();
        let keywords = top_keywords(&videos, 3);
        assert_eq!(keywords[0], "rust");
        assert!(!keywords.contains(&"dive".to_string()) || keywords.len() == 3);

        assert_eq!(average_upload_hour(&videos), 15);
        assert_eq!(average_upload_hour(&[]), 12);
        assert_eq!(best_upload_day(&[]), None);
        // 2024-06-01 was a Saturday
        assert_eq!(best_upload_day(&[video(0, 1, 0, 0)]), Some("Saturday"));
    }

    #[test]
    fn test_performance_score_empty_channel() {
        let metrics = channel_metrics(&[]);
        let score = performance_score(&metrics, 1_000_000);
        assert_eq!(score.overall, 0);
        assert_eq!(score.level, "Needs Work");
    }

    #[test]
    fn test_bigger_channel_scores_higher() {
        // A: 10M views over 5 videos, B: 100K views over 5 videos
        let a: Vec<_> = (0..5).map(|d| video(d * 7, 2_000_000, 60_000, 4_000)).collect();
        let b: Vec<_> = (0..5).map(|d| video(d * 7, 20_000, 600, 40)).collect();

        let score_a = performance_score(&channel_metrics(&a), 50_000);
        let score_b = performance_score(&channel_metrics(&b), 50_000);
        assert!(score_a.overall >= score_b.overall);
        assert_eq!(score_a.views, 20);
        assert_eq!(score_b.views, 12);
        assert!(score_a.overall <= 100);
    }

    #[test]
    fn test_score_components() {
        let videos: Vec<_> = (0..4).map(|d| video(d, 600, 30, 6)).collect();
        let metrics = channel_metrics(&videos);
        let score = performance_score(&metrics, 2_000);

        assert_eq!(score.views, 6);
        assert_eq!(score.subscribers, 4);
        // 6% engagement
        assert_eq!(score.engagement, 14);
        assert_eq!(score.consistency, 20);
        assert_eq!(score.viral_potential, 0);
        assert_eq!(score.overall, 44);
        assert_eq!(score.level, "Average");
    }

    #[test]
    fn test_viral_score_levels() {
        assert_eq!(viral_score(0.0, 0), ViralScore { score: 0, level: "Low" });
        assert_eq!(viral_score(4.0, 1), ViralScore { score: 45, level: "Moderate" });
        assert_eq!(viral_score(5.0, 3), ViralScore { score: 65, level: "Popular" });
        assert_eq!(viral_score(5.0, 2).level, "Moderate");
        assert_eq!(viral_score(5.1, 2), ViralScore { score: 61, level: "Popular" });
        assert_eq!(viral_score(20.0, 10).score, 100);
    }

    #[test]
    fn test_compare_channels() {
        let a: Vec<_> = (0..5).map(|d| video(d * 7, 2_000_000, 60_000, 4_000)).collect();
        let b: Vec<_> = (0..5).map(|d| video(d * 7, 20_000, 600, 40)).collect();

        let comparison = compare_channels((&summary(2_000_000), &a), (&summary(1_000), &b));
        assert_eq!(comparison.winner, "Channel 1");
        assert_eq!(comparison.channel1.view_count, 10_000_000);
        assert_eq!(comparison.channel1.recent_uploads.len(), 5);
        assert!(comparison.insights.iter().any(|i| i.title == "Subscriber Base" && i.better_channel == "Channel 1"));
        assert!(comparison.insights.iter().any(|i| i.title == "View Count Advantage"));
    }

    #[test]
    fn test_compact_number() {
        assert_eq!(compact_number(999), "999");
        assert_eq!(compact_number(1_500), "1.5K");
        assert_eq!(compact_number(2_500_000), "2.5M");
        assert_eq!(round2(3.14159), 3.14);
    }

    #[test]
    fn test_tips_follow_weak_components() {
        let videos: Vec<_> = (0..3).map(|m| video(m * 60, 50, 0, 0)).collect();
        let metrics = channel_metrics(&videos);
        let score = performance_score(&metrics, 10);
        let tips = improvement_tips(&score, &metrics);
        let titles: Vec<_> = tips.iter().map(|t| t.title).collect();
        assert!(titles.contains(&"Improve Thumbnails & Titles"));
        assert!(titles.contains(&"Upload Consistently"));
        assert!(titles.contains(&"Optimal Upload Time"));
    }
}
