// YouTube Data API v3 client for channel lookups, video listings and uploads
// Docs: https://developers.google.com/youtube/v3

use crate::analytics::VideoSample;
use crate::models::youtube::ChannelSnapshot;
use crate::services::channel_service::ChannelDirectory;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/youtube/v3/videos";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Upper bound YouTube accepts for `maxResults` on list calls
pub const MAX_RESULTS_LIMIT: u32 = 50;

#[derive(Error, Debug)]
pub enum YouTubeError {
    #[error("YouTube API key not configured")]
    NotConfigured,
    #[error("YouTube request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("YouTube API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Channel not found")]
    ChannelNotFound,
    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct YouTubeClient {
    client: Client,
    api_key: Option<String>,
}

// ============================================================================
// Channel Structures
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelItem {
    pub id: String,
    pub snippet: ChannelSnippet,
    pub statistics: Option<ChannelStatistics>,
    pub content_details: Option<ChannelContentDetails>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub custom_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Thumbnails {
    pub default: Option<ThumbnailInfo>,
    pub medium: Option<ThumbnailInfo>,
    pub high: Option<ThumbnailInfo>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThumbnailInfo {
    pub url: String,
}

/// YouTube reports counts as decimal strings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatistics {
    pub subscriber_count: Option<String>,
    pub video_count: Option<String>,
    pub view_count: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelContentDetails {
    pub related_playlists: Option<RelatedPlaylists>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelatedPlaylists {
    pub uploads: Option<String>,
}

// ============================================================================
// Video Structures
// ============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub id: String,
    pub snippet: VideoItemSnippet,
    pub content_details: Option<VideoContentDetails>,
    pub statistics: Option<VideoStatistics>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItemSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
    pub thumbnails: Option<Thumbnails>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoContentDetails {
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    pub view_count: Option<String>,
    pub like_count: Option<String>,
    pub comment_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    resource_id: Option<ResourceId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: Option<String>,
}

// ============================================================================
// Search Structures
// ============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChannelSearchItem {
    pub id: ChannelSearchId,
    pub snippet: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSearchId {
    pub kind: Option<String>,
    pub channel_id: Option<String>,
}

// ============================================================================
// Upload Structures
// ============================================================================

#[derive(Debug, Serialize)]
pub struct VideoSnippet {
    pub title: String,
    pub description: String,
    #[serde(rename = "categoryId")]
    pub category_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct VideoStatus {
    #[serde(rename = "privacyStatus")]
    pub privacy_status: String, // "public", "private", "unlisted"
}

#[derive(Debug, Serialize)]
pub struct VideoResource {
    pub snippet: VideoSnippet,
    pub status: VideoStatus,
}

/// File contents plus the metadata sent alongside them
pub struct VideoUpload {
    /// Shared with the other channels of the same upload
    pub bytes: axum::body::Bytes,
    pub file_name: String,
    pub content_type: String,
    pub resource: VideoResource,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoUploadResponse {
    pub id: String,
    pub snippet: VideoResponseSnippet,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoResponseSnippet {
    pub title: String,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
}

// ============================================================================
// Conversions
// ============================================================================

fn parse_count(raw: Option<&String>) -> u64 {
    raw.and_then(|c| c.parse().ok()).unwrap_or(0)
}

impl From<ChannelItem> for ChannelSnapshot {
    fn from(item: ChannelItem) -> Self {
        let stats = item.statistics.as_ref();
        let count = |f: fn(&ChannelStatistics) -> Option<&String>| parse_count(stats.and_then(f)) as i64;

        ChannelSnapshot {
            subscriber_count: count(|s| s.subscriber_count.as_ref()),
            video_count: count(|s| s.video_count.as_ref()),
            view_count: count(|s| s.view_count.as_ref()),
            uploads_playlist_id: item
                .content_details
                .and_then(|c| c.related_playlists)
                .and_then(|p| p.uploads),
            thumbnail_url: item.snippet.thumbnails.and_then(|t| t.default).map(|t| t.url),
            channel_id: item.id,
            title: item.snippet.title,
            description: item.snippet.description,
            custom_url: item.snippet.custom_url,
            published_at: item.snippet.published_at,
        }
    }
}

impl VideoItem {
    /// Numeric view of the video; `None` when YouTube omitted the publish date
    pub fn sample(&self) -> Option<VideoSample> {
        let stats = self.statistics.as_ref();
        Some(VideoSample {
            video_id: self.id.clone(),
            title: self.snippet.title.clone(),
            published_at: self.snippet.published_at?,
            thumbnail_url: self
                .snippet
                .thumbnails
                .as_ref()
                .and_then(|t| t.medium.as_ref().or(t.default.as_ref()))
                .map(|t| t.url.clone()),
            views: parse_count(stats.and_then(|s| s.view_count.as_ref())),
            likes: parse_count(stats.and_then(|s| s.like_count.as_ref())),
            comments: parse_count(stats.and_then(|s| s.comment_count.as_ref())),
        })
    }
}

pub fn video_samples(videos: &[VideoItem]) -> Vec<VideoSample> {
    videos.iter().filter_map(VideoItem::sample).collect()
}

/// Parses a client-supplied `maxResults`: non-numeric falls back to `default`,
/// numbers are clamped to `1..=MAX_RESULTS_LIMIT`.
pub fn clamp_max_results(raw: Option<&str>, default: u32) -> u32 {
    let value = raw
        .and_then(|r| r.trim().parse::<i64>().ok())
        .unwrap_or(default as i64);
    value.clamp(1, MAX_RESULTS_LIMIT as i64) as u32
}

async fn read_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, YouTubeError> {
    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(YouTubeError::Api { status, body });
    }

    Ok(response.json().await?)
}

// ============================================================================
// YouTube Client Implementation
// ============================================================================

impl YouTubeClient {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn http(&self) -> &Client {
        &self.client
    }

    fn key(&self) -> Result<&str, YouTubeError> {
        self.api_key.as_deref().ok_or(YouTubeError::NotConfigured)
    }

    async fn list_channels(&self, filter: (&str, &str)) -> Result<Vec<ChannelItem>, YouTubeError> {
        let request = self.client.get(format!("{}/channels", API_BASE)).query(&[
            ("part", "snippet,statistics,contentDetails"),
            filter,
            ("key", self.key()?),
        ]);
        let response: ListResponse<ChannelItem> = read_json(request).await?;
        Ok(response.items)
    }

    /// Public channel details by canonical id
    pub async fn channel_by_id(&self, channel_id: &str) -> Result<Option<ChannelItem>, YouTubeError> {
        Ok(self.list_channels(("id", channel_id)).await?.into_iter().next())
    }

    /// Public channel details by legacy username
    pub async fn channel_by_username(&self, username: &str) -> Result<Option<ChannelItem>, YouTubeError> {
        Ok(self.list_channels(("forUsername", username)).await?.into_iter().next())
    }

    /// Search for YouTube channels
    pub async fn search_channels(&self, query: &str, max_results: u32) -> Result<Vec<ChannelSearchItem>, YouTubeError> {
        let max_results = max_results.min(MAX_RESULTS_LIMIT).to_string();
        let request = self.client.get(format!("{}/search", API_BASE)).query(&[
            ("part", "snippet"),
            ("q", query),
            ("type", "channel"),
            ("maxResults", max_results.as_str()),
            ("key", self.key()?),
        ]);
        let response: ListResponse<ChannelSearchItem> = read_json(request).await?;
        Ok(response.items)
    }

    /// Most recent uploads with snippet, duration and statistics
    pub async fn get_channel_videos(&self, channel_id: &str, max_results: u32) -> Result<Vec<VideoItem>, YouTubeError> {
        let request = self.client.get(format!("{}/channels", API_BASE)).query(&[
            ("part", "contentDetails"),
            ("id", channel_id),
            ("key", self.key()?),
        ]);
        let response: ListResponse<ChannelItem> = read_json(request).await?;

        let uploads = response
            .items
            .into_iter()
            .next()
            .ok_or(YouTubeError::ChannelNotFound)?
            .content_details
            .and_then(|c| c.related_playlists)
            .and_then(|p| p.uploads)
            .ok_or(YouTubeError::ChannelNotFound)?;

        self.get_playlist_videos(&uploads, max_results).await
    }

    /// One page of a playlist, expanded into full video resources
    pub async fn get_playlist_videos(&self, playlist_id: &str, max_results: u32) -> Result<Vec<VideoItem>, YouTubeError> {
        let max_results = max_results.clamp(1, MAX_RESULTS_LIMIT).to_string();
        let request = self.client.get(format!("{}/playlistItems", API_BASE)).query(&[
            ("part", "snippet"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
            ("key", self.key()?),
        ]);
        let playlist: ListResponse<PlaylistItem> = read_json(request).await?;

        let video_ids: Vec<String> = playlist
            .items
            .into_iter()
            .filter_map(|item| item.snippet.resource_id.and_then(|r| r.video_id))
            .collect();

        if video_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = video_ids.join(",");
        let request = self.client.get(format!("{}/videos", API_BASE)).query(&[
            ("part", "snippet,contentDetails,statistics"),
            ("id", ids.as_str()),
            ("key", self.key()?),
        ]);
        let videos: ListResponse<VideoItem> = read_json(request).await?;
        Ok(videos.items)
    }

    /// Channels owned by the holder of `access_token`
    pub async fn list_my_channels(&self, access_token: &str) -> Result<Vec<ChannelItem>, YouTubeError> {
        let request = self
            .client
            .get(format!("{}/channels", API_BASE))
            .query(&[("part", "snippet,statistics,contentDetails"), ("mine", "true")])
            .header("Authorization", format!("Bearer {}", access_token));
        let response: ListResponse<ChannelItem> = read_json(request).await?;
        Ok(response.items)
    }

    /// Upload video to YouTube
    pub async fn upload_video(&self, access_token: &str, upload: VideoUpload) -> Result<VideoUploadResponse, YouTubeError> {
        let metadata_json = serde_json::to_string(&upload.resource)?;
        let media_len = upload.bytes.len() as u64;

        let form = reqwest::multipart::Form::new()
            .part(
                "snippet",
                reqwest::multipart::Part::text(metadata_json).mime_str("application/json")?,
            )
            .part(
                "media",
                reqwest::multipart::Part::stream_with_length(reqwest::Body::from(upload.bytes), media_len)
                    .file_name(upload.file_name)
                    .mime_str(&upload.content_type)?,
            );

        let request = self
            .client
            .post(UPLOAD_URL)
            .query(&[("part", "snippet,status"), ("uploadType", "multipart")])
            .header("Authorization", format!("Bearer {}", access_token))
            .multipart(form);

        let uploaded: VideoUploadResponse = read_json(request).await.map_err(|e| {
            tracing::error!("YouTube upload failed: {}", e);
            e
        })?;

        tracing::info!("Video uploaded to YouTube: {} (ID: {})", uploaded.snippet.title, uploaded.id);
        Ok(uploaded)
    }
}

#[async_trait]
impl ChannelDirectory for YouTubeClient {
    async fn channel_by_id(&self, channel_id: &str) -> Result<Option<ChannelSnapshot>, YouTubeError> {
        Ok(YouTubeClient::channel_by_id(self, channel_id).await?.map(ChannelSnapshot::from))
    }

    async fn channel_by_username(&self, username: &str) -> Result<Option<ChannelSnapshot>, YouTubeError> {
        Ok(YouTubeClient::channel_by_username(self, username).await?.map(ChannelSnapshot::from))
    }

    async fn search_channel_id(&self, query: &str) -> Result<Option<String>, YouTubeError> {
        let results = self.search_channels(query, 1).await?;
        Ok(results.into_iter().find_map(|item| item.id.channel_id))
    }
}

// ============================================================================
// Google OAuth Helpers
// ============================================================================

/// Build Google OAuth authorization URL
pub fn build_google_oauth_url(client_id: &str, redirect_uri: &str, scopes: &[&str], state: &str) -> String {
    let scope_string = scopes.join(" ");

    // access_type=offline so Google returns a refresh token
    format!(
        "https://accounts.google.com/o/oauth2/v2/auth?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&state={}&prompt=select_account",
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&scope_string),
        urlencoding::encode(state)
    )
}

/// Exchange authorization code for access token
pub async fn exchange_code_for_token(
    client: &Client,
    code: &str,
    client_id: &str,
    client_secret: &str,
    redirect_uri: &str,
) -> Result<GoogleTokenResponse, YouTubeError> {
    let params = json!({
        "code": code,
        "client_id": client_id,
        "client_secret": client_secret,
        "redirect_uri": redirect_uri,
        "grant_type": "authorization_code"
    });

    read_json(client.post(TOKEN_URL).json(&params)).await
}

/// Refresh an expired access token using refresh token
pub async fn refresh_access_token(
    client: &Client,
    refresh_token: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<TokenRefreshResponse, YouTubeError> {
    let params = json!({
        "client_id": client_id,
        "client_secret": client_secret,
        "refresh_token": refresh_token,
        "grant_type": "refresh_token"
    });

    read_json(client.post(TOKEN_URL).json(&params)).await
}

/// Get user info from Google OAuth
pub async fn get_google_user_info(client: &Client, access_token: &str) -> Result<GoogleUserInfo, YouTubeError> {
    let request = client
        .get(USERINFO_URL)
        .header("Authorization", format!("Bearer {}", access_token));
    read_json(request).await
}

#[derive(Debug, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GoogleUserInfo {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    #[serde(default)]
    pub verified_email: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANNEL_JSON: &str = r#"{
        "kind": "youtube#channelListResponse",
        "items": [{
            "id": "UC_x5XG1OV2P6uZZ5FSM9Ttw",
            "snippet": {
                "title": "Google for Developers",
                "description": "Subscribe to join a community of developers",
                "customUrl": "@googledevelopers",
                "publishedAt": "2007-08-23T00:34:43Z",
                "thumbnails": {
                    "default": { "url": "https://yt3.ggpht.com/default.jpg", "width": 88, "height": 88 },
                    "high": { "url": "https://yt3.ggpht.com/high.jpg" }
                }
            },
            "statistics": {
                "viewCount": "250000000",
                "subscriberCount": "2500000",
                "hiddenSubscriberCount": false,
                "videoCount": "6000"
            },
            "contentDetails": { "relatedPlaylists": { "likes": "", "uploads": "UU_x5XG1OV2P6uZZ5FSM9Ttw" } }
        }]
    }"#;

    const VIDEOS_JSON: &str = r#"{
        "items": [
            {
                "id": "abc123",
                "snippet": {
                    "title": "Async Rust in practice",
                    "publishedAt": "2024-05-01T14:00:00Z",
                    "thumbnails": { "medium": { "url": "https://i.ytimg.com/vi/abc123/mqdefault.jpg" } }
                },
                "contentDetails": { "duration": "PT12M3S" },
                "statistics": { "viewCount": "1000", "likeCount": "40" }
            },
            {
                "id": "nodate",
                "snippet": { "title": "Premiere" }
            }
        ]
    }"#;

    #[test]
    fn test_channel_snapshot_conversion() {
        let response: ListResponse<ChannelItem> = serde_json::from_str(CHANNEL_JSON).unwrap();
        let snapshot = ChannelSnapshot::from(response.items.into_iter().next().unwrap());

        assert_eq!(snapshot.channel_id, "UC_x5XG1OV2P6uZZ5FSM9Ttw");
        assert_eq!(snapshot.custom_url.as_deref(), Some("@googledevelopers"));
        assert_eq!(snapshot.subscriber_count, 2_500_000);
        assert_eq!(snapshot.video_count, 6_000);
        assert_eq!(snapshot.view_count, 250_000_000);
        assert_eq!(snapshot.thumbnail_url.as_deref(), Some("https://yt3.ggpht.com/default.jpg"));
        assert_eq!(snapshot.uploads_playlist_id.as_deref(), Some("UU_x5XG1OV2P6uZZ5FSM9Ttw"));
        assert!(snapshot.published_at.is_some());
    }

    #[test]
    fn test_missing_statistics_count_as_zero() {
        let item: ChannelItem = serde_json::from_str(r#"{"id": "UC1", "snippet": {"title": "Bare"}}"#).unwrap();
        let snapshot = ChannelSnapshot::from(item);
        assert_eq!(snapshot.subscriber_count, 0);
        assert_eq!(snapshot.description, "");
        assert!(snapshot.uploads_playlist_id.is_none());
    }

    #[test]
    fn test_video_samples() {
        let response: ListResponse<VideoItem> = serde_json::from_str(VIDEOS_JSON).unwrap();
        let samples = video_samples(&response.items);

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].views, 1000);
        assert_eq!(samples[0].likes, 40);
        assert_eq!(samples[0].comments, 0);
        assert!(samples[0].thumbnail_url.as_deref().unwrap().contains("mqdefault"));
    }

    #[test]
    fn test_empty_list_response() {
        let response: ListResponse<ChannelItem> = serde_json::from_str(r#"{"kind": "youtube#channelListResponse"}"#).unwrap();
        assert!(response.items.is_empty());
    }

    #[test]
    fn test_clamp_max_results() {
        assert_eq!(clamp_max_results(None, 50), 50);
        assert_eq!(clamp_max_results(Some("10"), 50), 10);
        assert_eq!(clamp_max_results(Some("500"), 50), 50);
        assert_eq!(clamp_max_results(Some("0"), 10), 1);
        assert_eq!(clamp_max_results(Some("-3"), 10), 1);
        assert_eq!(clamp_max_results(Some("lots"), 10), 10);
    }

    #[test]
    fn test_oauth_url() {
        let url = build_google_oauth_url(
            "client-id",
            "http://localhost:5000/auth/google/callback",
            &["profile", "email"],
            "abc",
        );
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A5000%2Fauth%2Fgoogle%2Fcallback"));
        assert!(url.contains("scope=profile%20email"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("state=abc"));
    }

    #[tokio::test]
    async fn test_unconfigured_client_rejects_public_lookups() {
        let client = YouTubeClient::new(Client::new(), None);
        assert!(!client.is_configured());
        let err = client.search_channels("rust", 5).await.unwrap_err();
        assert!(matches!(err, YouTubeError::NotConfigured));
    }
}
