// YouTube channel handlers
// Connecting channels, listings, analytics, comparisons and uploads

use crate::analytics::{
    self, ChannelMetrics, Comparison, PerformanceScore, Tip, VideoSample, ViralScore,
};
use crate::error::AppError;
use crate::middleware::auth::auth_middleware;
use crate::models::auth::{Claims, User};
use crate::models::youtube::{ConnectChannelRequest, YouTubeChannel};
use crate::services::{ChannelError, ChannelService};
use crate::youtube_client::{
    self, clamp_max_results, video_samples, VideoItem, VideoResource, VideoSnippet, VideoStatus,
    VideoUpload, YouTubeClient, YouTubeError,
};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{multipart::Multipart, DefaultBodyLimit, Extension, Path, Query},
    http::StatusCode,
    response::{Json, Redirect},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

const DEFAULT_VIDEO_RESULTS: u32 = 50;
const DEFAULT_SEARCH_RESULTS: u32 = 10;
const DASHBOARD_VIDEOS_PER_CHANNEL: u32 = 10;
const DASHBOARD_RECENT_VIDEOS: usize = 5;
const UPLOAD_BODY_LIMIT: usize = 256 * 1024 * 1024;

pub fn youtube_routes() -> Router {
    let upload_routes = Router::new()
        .route("/api/youtube/upload", post(upload_video))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT));

    Router::new()
        .route("/api/youtube/connect/oauth", get(connect_via_oauth))
        .route("/api/youtube/connect", post(connect_channel))
        .route("/api/youtube/channels", get(list_channels))
        .route("/api/youtube/channels/:channel_id", get(get_channel).delete(disconnect_channel))
        .route("/api/youtube/channels/:channel_id/videos", get(list_channel_videos))
        .route("/api/youtube/channels/:channel_id/analytics", get(channel_analytics))
        .route("/api/youtube/channels/:channel_id/refresh-token", post(refresh_channel_token))
        .route("/api/youtube/search", get(search_channels))
        .route("/api/youtube/compare", get(compare_channels))
        .route("/api/youtube/dashboard", get(dashboard))
        .merge(upload_routes)
        .layer(axum::middleware::from_fn(auth_middleware))
}

fn caller_id(claims: &Claims) -> Result<i32, AppError> {
    claims.user_id().ok_or(AppError::Unauthorized("Unauthorized"))
}

fn channel_service(state: &AppState) -> ChannelService<'_> {
    ChannelService::new(&state.db_pool, &state.youtube)
}

/// Uploads of a channel, using the stored playlist id when there is one
async fn fetch_videos(
    youtube: &YouTubeClient,
    channel_id: &str,
    uploads_playlist_id: Option<&str>,
    max_results: u32,
) -> Result<Vec<VideoItem>, YouTubeError> {
    match uploads_playlist_id.filter(|p| !p.is_empty()) {
        Some(playlist) => youtube.get_playlist_videos(playlist, max_results).await,
        None => youtube.get_channel_videos(channel_id, max_results).await,
    }
}

// ============================================================================
// Connect / list / disconnect
// ============================================================================

pub async fn connect_via_oauth() -> Redirect {
    Redirect::to("/auth/youtube")
}

pub async fn connect_channel(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ConnectChannelRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let user_id = caller_id(&claims)?;
    let input = payload
        .identifier()
        .ok_or_else(|| AppError::BadRequest("Channel ID, username, or custom URL is required".to_string()))?;

    let stored = channel_service(&state)
        .connect(user_id, input)
        .await
        .map_err(|e| AppError::channel(e, "Failed to connect YouTube channel"))?;

    let (status, message) = if stored.inserted {
        (StatusCode::CREATED, "YouTube channel connected successfully")
    } else {
        (StatusCode::OK, "YouTube channel updated successfully")
    };

    Ok((status, Json(json!({ "message": message, "channel": stored.channel }))))
}

pub async fn list_channels(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<YouTubeChannel>>, AppError> {
    let channels = channel_service(&state)
        .list(caller_id(&claims)?)
        .await
        .map_err(|e| AppError::channel(e, "Failed to fetch YouTube channels"))?;
    Ok(Json(channels))
}

pub async fn get_channel(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(channel_id): Path<String>,
) -> Result<Json<YouTubeChannel>, AppError> {
    let channel = channel_service(&state)
        .get_with_refresh(caller_id(&claims)?, &channel_id)
        .await
        .map_err(|e| AppError::channel(e, "Failed to fetch YouTube channel"))?;
    Ok(Json(channel))
}

pub async fn disconnect_channel(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(channel_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    channel_service(&state)
        .disconnect(caller_id(&claims)?, &channel_id)
        .await
        .map_err(|e| AppError::channel(e, "Failed to disconnect YouTube channel"))?;
    Ok(Json(json!({ "message": "YouTube channel disconnected successfully" })))
}

/// Exchange the stored refresh token for a fresh access token
pub async fn refresh_channel_token(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(channel_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = caller_id(&claims)?;
    let service = channel_service(&state);
    let channel = service
        .find_owned(user_id, &channel_id)
        .await
        .map_err(|e| AppError::channel(e, "Failed to refresh channel token"))?;

    let refresh_token = match channel.refresh_token.clone().filter(|t| !t.is_empty()) {
        Some(token) => token,
        None => load_user(&state, user_id)
            .await?
            .youtube_refresh_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::BadRequest("No refresh token stored for this channel".to_string()))?,
    };

    let (client_id, client_secret) = state
        .config
        .google_credentials()
        .ok_or(AppError::ServiceUnavailable("Google OAuth not configured"))?;

    let refreshed = youtube_client::refresh_access_token(state.youtube.http(), &refresh_token, client_id, client_secret)
        .await
        .map_err(|e| AppError::youtube(e, "Failed to refresh channel token"))?;

    service
        .replace_access_token(&channel, &refreshed.access_token)
        .await
        .map_err(|e| AppError::channel(e, "Failed to refresh channel token"))?;

    Ok(Json(json!({
        "message": "Access token refreshed",
        "expiresIn": refreshed.expires_in,
    })))
}

async fn load_user(state: &AppState, user_id: i32) -> Result<User, AppError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or(AppError::Unauthorized("Unauthorized"))
}

// ============================================================================
// Listings
// ============================================================================

#[derive(Deserialize)]
pub struct VideosQuery {
    #[serde(rename = "maxResults")]
    pub max_results: Option<String>,
}

pub async fn list_channel_videos(
    Extension(state): Extension<Arc<AppState>>,
    Path(channel_id): Path<String>,
    Query(params): Query<VideosQuery>,
) -> Result<Json<Vec<VideoItem>>, AppError> {
    let max_results = clamp_max_results(params.max_results.as_deref(), DEFAULT_VIDEO_RESULTS);

    let videos = state
        .youtube
        .get_channel_videos(&channel_id, max_results)
        .await
        .map_err(|e| AppError::youtube(e, "Failed to fetch YouTube videos"))?;

    Ok(Json(videos))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    #[serde(rename = "maxResults")]
    pub max_results: Option<String>,
}

pub async fn search_channels(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<youtube_client::ChannelSearchItem>>, AppError> {
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("Query parameter is required".to_string()))?;
    let max_results = clamp_max_results(params.max_results.as_deref(), DEFAULT_SEARCH_RESULTS);

    let results = state
        .youtube
        .search_channels(query, max_results)
        .await
        .map_err(|e| AppError::youtube(e, "Failed to search YouTube channels"))?;

    Ok(Json(results))
}

// ============================================================================
// Analytics
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAnalytics {
    pub channel: YouTubeChannel,
    pub metrics: ChannelMetrics,
    pub performance: PerformanceScore,
    pub viral_videos: usize,
    pub viral_score: ViralScore,
    pub tips: Vec<Tip>,
}

pub async fn channel_analytics(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(channel_id): Path<String>,
) -> Result<Json<ChannelAnalytics>, AppError> {
    let channel = channel_service(&state)
        .get_with_refresh(caller_id(&claims)?, &channel_id)
        .await
        .map_err(|e| AppError::channel(e, "Failed to fetch channel analytics"))?;

    let videos = fetch_videos(
        &state.youtube,
        &channel.channel_id,
        channel.uploads_playlist_id.as_deref(),
        DEFAULT_VIDEO_RESULTS,
    )
    .await
    .map_err(|e| AppError::youtube(e, "Failed to fetch channel analytics"))?;

    Ok(Json(build_channel_analytics(channel, &video_samples(&videos))))
}

fn build_channel_analytics(channel: YouTubeChannel, samples: &[VideoSample]) -> ChannelAnalytics {
    let metrics = analytics::channel_metrics(samples);
    let performance = analytics::performance_score(&metrics, channel.subscriber_count.max(0) as u64);
    let viral_videos = analytics::viral_video_count(samples);
    let viral_score = analytics::viral_score(analytics::round2(metrics.overall_engagement_rate), viral_videos);
    let tips = analytics::improvement_tips(&performance, &metrics);

    ChannelAnalytics {
        channel,
        metrics,
        performance,
        viral_videos,
        viral_score,
        tips,
    }
}

#[derive(Deserialize)]
pub struct CompareQuery {
    pub channel1: Option<String>,
    pub channel2: Option<String>,
}

pub async fn compare_channels(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<CompareQuery>,
) -> Result<Json<Comparison>, AppError> {
    let required = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned);
    let (first, second) = match (required(&params.channel1), required(&params.channel2)) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(AppError::BadRequest("Both channel1 and channel2 are required".to_string())),
    };

    let service = channel_service(&state);
    let (snap1, snap2) = futures::try_join!(service.resolve_raw(&first), service.resolve_raw(&second))
        .map_err(|e| AppError::channel(e, "Failed to compare channels"))?;

    let youtube = &state.youtube;
    let (videos1, videos2) = futures::try_join!(
        fetch_videos(youtube, &snap1.channel_id, snap1.uploads_playlist_id.as_deref(), DEFAULT_VIDEO_RESULTS),
        fetch_videos(youtube, &snap2.channel_id, snap2.uploads_playlist_id.as_deref(), DEFAULT_VIDEO_RESULTS),
    )
    .map_err(|e| AppError::youtube(e, "Failed to compare channels"))?;

    let comparison = analytics::compare_channels(
        (&snap1.summary(), &video_samples(&videos1)),
        (&snap2.summary(), &video_samples(&videos2)),
    );

    tracing::info!(
        "Compared {} vs {}: {}",
        snap1.channel_id,
        snap2.channel_id,
        comparison.winner
    );
    Ok(Json(comparison))
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RecentVideo {
    pub channel_id: String,
    pub channel_title: String,
    #[serde(flatten)]
    pub video: VideoSample,
    pub engagement_rate: f64,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub channel_count: usize,
    pub total_views: i64,
    pub total_subscribers: i64,
    pub total_videos: i64,
    pub top_channel: Option<ChannelSnapshotRef>,
    pub recent_videos: Vec<RecentVideo>,
    pub average_engagement_rate: f64,
}

/// Compact reference to the channel with the most subscribers
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSnapshotRef {
    pub channel_id: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub subscriber_count: i64,
}

pub async fn dashboard(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<DashboardSummary>, AppError> {
    let channels = channel_service(&state)
        .list(caller_id(&claims)?)
        .await
        .map_err(|e| AppError::channel(e, "Failed to load dashboard"))?;

    let youtube = &state.youtube;
    let fetches = channels.iter().map(|channel| async move {
        let result = fetch_videos(
            youtube,
            &channel.channel_id,
            channel.uploads_playlist_id.as_deref(),
            DASHBOARD_VIDEOS_PER_CHANNEL,
        )
        .await;
        (channel, result)
    });

    let mut videos = Vec::new();
    for (channel, result) in futures::future::join_all(fetches).await {
        match result {
            Ok(items) => videos.extend(video_samples(&items).into_iter().map(|video| RecentVideo {
                channel_id: channel.channel_id.clone(),
                channel_title: channel.title.clone(),
                engagement_rate: analytics::round2(analytics::engagement_rate(&video)),
                video,
            })),
            Err(e) => tracing::warn!("Skipping videos for channel {}: {}", channel.channel_id, e),
        }
    }

    Ok(Json(summarize_dashboard(&channels, videos)))
}

fn summarize_dashboard(channels: &[YouTubeChannel], mut videos: Vec<RecentVideo>) -> DashboardSummary {
    let average_engagement_rate = if videos.is_empty() {
        0.0
    } else {
        let samples: Vec<VideoSample> = videos.iter().map(|v| v.video.clone()).collect();
        analytics::round2(analytics::average_engagement_rate(&samples))
    };

    videos.sort_by(|a, b| b.video.published_at.cmp(&a.video.published_at));
    videos.truncate(DASHBOARD_RECENT_VIDEOS);

    let top_channel = channels
        .iter()
        .max_by_key(|c| c.subscriber_count)
        .map(|c| ChannelSnapshotRef {
            channel_id: c.channel_id.clone(),
            title: c.title.clone(),
            thumbnail_url: c.thumbnail_url.clone(),
            subscriber_count: c.subscriber_count,
        });

    DashboardSummary {
        channel_count: channels.len(),
        total_views: channels.iter().map(|c| c.view_count).sum(),
        total_subscribers: channels.iter().map(|c| c.subscriber_count).sum(),
        total_videos: channels.iter().map(|c| c.video_count).sum(),
        top_channel,
        recent_videos: videos,
        average_engagement_rate,
    }
}

// ============================================================================
// Upload
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privacy {
    Public,
    Private,
    Unlisted,
}

impl Privacy {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "" | "public" => Some(Privacy::Public),
            "private" => Some(Privacy::Private),
            "unlisted" => Some(Privacy::Unlisted),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Privacy::Public => "public",
            Privacy::Private => "private",
            Privacy::Unlisted => "unlisted",
        }
    }
}

struct VideoFile {
    bytes: Bytes,
    file_name: String,
    content_type: String,
}

/// Multipart fields as they arrive, validated by `finish`
#[derive(Default)]
struct UploadForm {
    video: Option<VideoFile>,
    title: String,
    description: String,
    privacy: String,
    category_id: String,
    tags: String,
    channel_ids: Vec<String>,
}

#[derive(Debug)]
struct UploadRequest {
    file_name: String,
    content_type: String,
    title: String,
    description: String,
    privacy: Privacy,
    category_id: String,
    tags: Vec<String>,
    channel_ids: Vec<String>,
}

fn split_list(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned)
}

impl UploadForm {
    fn text(&mut self, name: &str, value: String) {
        match name {
            "title" => self.title = value,
            "description" => self.description = value,
            "privacy" | "privacyStatus" => self.privacy = value,
            "categoryId" => self.category_id = value,
            "tags" => self.tags = value,
            "channelIds" | "channelIds[]" | "channelId" => self.channel_ids.extend(split_list(&value)),
            other => tracing::debug!("Ignoring upload field '{}'", other),
        }
    }

    fn finish(self) -> Result<(UploadRequest, Bytes), AppError> {
        let video = self
            .video
            .ok_or_else(|| AppError::BadRequest("Video file is required".to_string()))?;
        if !video.content_type.starts_with("video/") {
            return Err(AppError::BadRequest("Only video files are allowed".to_string()));
        }

        let mut seen = HashSet::new();
        let mut channel_ids = self.channel_ids;
        channel_ids.retain(|id| seen.insert(id.clone()));
        if channel_ids.is_empty() {
            return Err(AppError::BadRequest("Select at least one channel".to_string()));
        }

        let privacy = Privacy::parse(&self.privacy)
            .ok_or_else(|| AppError::BadRequest("Privacy must be public, private, or unlisted".to_string()))?;

        let title = match self.title.trim() {
            "" => std::path::Path::new(&video.file_name)
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|s| !s.is_empty())
                .unwrap_or("Untitled video")
                .to_string(),
            t => t.to_string(),
        };

        let category_id = match self.category_id.trim() {
            "" => "22".to_string(),
            c => c.to_string(),
        };

        let request = UploadRequest {
            file_name: video.file_name,
            content_type: video.content_type,
            title,
            description: self.description,
            privacy,
            category_id,
            tags: split_list(&self.tags).collect(),
            channel_ids,
        };
        Ok((request, video.bytes))
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub channel_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResult {
    fn failed(channel_id: &str, error: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            success: false,
            video_id: None,
            url: None,
            error: Some(error.into()),
        }
    }
}

pub async fn upload_video(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = caller_id(&claims)?;
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "video" {
            let file_name = field.file_name().unwrap_or("video.mp4").to_string();
            let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read video: {}", e)))?;
            form.video = Some(VideoFile {
                bytes,
                file_name,
                content_type,
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Invalid field '{}': {}", name, e)))?;
            form.text(&name, value);
        }
    }

    let (request, bytes) = form.finish()?;
    let user = load_user(&state, user_id).await?;
    let service = channel_service(&state);

    tracing::info!(
        "Uploading '{}' ({} bytes) to {} channel(s) for user {}",
        request.title,
        bytes.len(),
        request.channel_ids.len(),
        user_id
    );

    let mut results = Vec::with_capacity(request.channel_ids.len());
    for channel_id in &request.channel_ids {
        let channel = match service.find_owned(user_id, channel_id).await {
            Ok(channel) => channel,
            Err(ChannelError::NotFound) => {
                results.push(UploadResult::failed(channel_id, "Channel not found"));
                continue;
            }
            Err(e) => return Err(AppError::channel(e, "Failed to upload video")),
        };

        let Some(token) = channel
            .access_token
            .clone()
            .or_else(|| user.youtube_access_token.clone())
            .filter(|t| !t.is_empty())
        else {
            results.push(UploadResult::failed(channel_id, "No YouTube access token. Reconnect the channel via OAuth."));
            continue;
        };

        let upload = VideoUpload {
            bytes: bytes.clone(),
            file_name: request.file_name.clone(),
            content_type: request.content_type.clone(),
            resource: VideoResource {
                snippet: VideoSnippet {
                    title: request.title.clone(),
                    description: request.description.clone(),
                    category_id: request.category_id.clone(),
                    tags: (!request.tags.is_empty()).then(|| request.tags.clone()),
                },
                status: VideoStatus {
                    privacy_status: request.privacy.as_str().to_string(),
                },
            },
        };

        match state.youtube.upload_video(&token, upload).await {
            Ok(uploaded) => results.push(UploadResult {
                channel_id: channel_id.clone(),
                success: true,
                url: Some(format!("https://www.youtube.com/watch?v={}", uploaded.id)),
                video_id: Some(uploaded.id),
                error: None,
            }),
            Err(e) => results.push(UploadResult::failed(channel_id, e.to_string())),
        }
    }

    let uploaded = results.iter().filter(|r| r.success).count();
    Ok(Json(json!({
        "message": format!("Uploaded to {} of {} channel(s)", uploaded, results.len()),
        "results": results,
    })))
}
