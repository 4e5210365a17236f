use crate::analytics::ChannelSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A connected channel as stored in `youtube_channels`
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeChannel {
    pub id: i32,
    pub user_id: i32,
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub custom_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
    pub subscriber_count: i64,
    pub video_count: i64,
    pub view_count: i64,
    pub uploads_playlist_id: Option<String>,
    #[serde(skip_serializing, default)]
    pub access_token: Option<String>,
    #[serde(skip_serializing, default)]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row returned by an upsert; `inserted` is false when an existing record was updated
#[derive(Debug, FromRow)]
pub struct UpsertedChannel {
    #[sqlx(flatten)]
    pub channel: YouTubeChannel,
    pub inserted: bool,
}

/// Public channel facts fetched from the YouTube Data API
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSnapshot {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub custom_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
    pub subscriber_count: i64,
    pub video_count: i64,
    pub view_count: i64,
    pub uploads_playlist_id: Option<String>,
}

/// OAuth tokens attached to a channel on connect
#[derive(Debug, Clone, Default)]
pub struct ChannelTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl ChannelSnapshot {
    pub fn summary(&self) -> ChannelSummary {
        ChannelSummary {
            channel_id: self.channel_id.clone(),
            title: self.title.clone(),
            thumbnail_url: self.thumbnail_url.clone().unwrap_or_default(),
            subscriber_count: self.subscriber_count.max(0) as u64,
            video_count: self.video_count.max(0) as u64,
            published_at: self.published_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectChannelRequest {
    pub channel_id: Option<String>,
    pub username: Option<String>,
    pub custom_url: Option<String>,
    pub input: Option<String>,
}

impl ConnectChannelRequest {
    /// First non-blank identifier the client sent
    pub fn identifier(&self) -> Option<&str> {
        [&self.input, &self.channel_id, &self.username, &self.custom_url]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .map(str::trim)
            .find(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> YouTubeChannel {
        YouTubeChannel {
            id: 1,
            user_id: 7,
            channel_id: "UC_x5XG1OV2P6uZZ5FSM9Ttw".into(),
            title: "Google for Developers".into(),
            description: String::new(),
            custom_url: Some("@googledevelopers".into()),
            published_at: None,
            thumbnail_url: None,
            subscriber_count: 2_500_000,
            video_count: 6_000,
            view_count: 250_000_000,
            uploads_playlist_id: Some("UU_x5XG1OV2P6uZZ5FSM9Ttw".into()),
            access_token: Some("ya29.secret".into()),
            refresh_token: Some("1//refresh".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_tokens_never_serialized() {
        let json = serde_json::to_value(channel()).unwrap();
        assert!(json.get("accessToken").is_none());
        assert!(json.get("refreshToken").is_none());
        assert_eq!(json["channelId"], "UC_x5XG1OV2P6uZZ5FSM9Ttw");
        assert_eq!(json["subscriberCount"], 2_500_000);
    }

    #[test]
    fn test_connect_request_identifier() {
        let req: ConnectChannelRequest =
            serde_json::from_str(r#"{"channelId": "  ", "username": "GoogleDevelopers"}"#).unwrap();
        assert_eq!(req.identifier(), Some("GoogleDevelopers"));

        let empty: ConnectChannelRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.identifier(), None);
    }

    #[test]
    fn test_snapshot_summary_clamps_hidden_counts() {
        let snapshot = ChannelSnapshot {
            channel_id: "UC_x5XG1OV2P6uZZ5FSM9Ttw".into(),
            title: "Google for Developers".into(),
            description: String::new(),
            custom_url: None,
            published_at: None,
            thumbnail_url: None,
            subscriber_count: -1,
            video_count: 6_000,
            view_count: 0,
            uploads_playlist_id: None,
        };

        let summary = snapshot.summary();
        assert_eq!(summary.subscriber_count, 0);
        assert_eq!(summary.video_count, 6_000);
        assert_eq!(summary.thumbnail_url, "");
    }
}
