use super::auth::UserSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: i32,
    pub title: String,
    pub url: String,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Video joined with its owner's name and email
#[derive(Debug, FromRow)]
pub struct VideoWithOwnerRow {
    #[sqlx(flatten)]
    pub video: Video,
    pub owner_name: String,
    pub owner_email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoWithOwner {
    pub id: i32,
    pub title: String,
    pub url: String,
    pub user: UserSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VideoWithOwnerRow> for VideoWithOwner {
    fn from(row: VideoWithOwnerRow) -> Self {
        VideoWithOwner {
            id: row.video.id,
            title: row.video.title,
            url: row.video.url,
            user: UserSummary {
                id: row.video.user_id,
                name: row.owner_name,
                email: row.owner_email,
            },
            created_at: row.video.created_at,
            updated_at: row.video.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoRequest {
    pub title: Option<String>,
    pub url: Option<String>,
    pub user_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub url: Option<String>,
}
