// Persistence for connected channels (youtube_channels table)

use crate::models::youtube::{ChannelSnapshot, ChannelTokens, UpsertedChannel, YouTubeChannel};
use async_trait::async_trait;
use sqlx::PgPool;

#[async_trait]
pub trait ChannelStore: Send + Sync {
    /// Insert or update by `channel_id`. The connecting user becomes the owner.
    async fn upsert(
        &self,
        user_id: i32,
        snapshot: &ChannelSnapshot,
        tokens: &ChannelTokens,
    ) -> Result<UpsertedChannel, sqlx::Error>;

    /// Insert only when no user has stored the channel yet; `None` if it already exists
    async fn insert_new(&self, user_id: i32, snapshot: &ChannelSnapshot) -> Result<Option<YouTubeChannel>, sqlx::Error>;

    async fn find_owned(&self, user_id: i32, channel_id: &str) -> Result<Option<YouTubeChannel>, sqlx::Error>;

    async fn list_for_user(&self, user_id: i32) -> Result<Vec<YouTubeChannel>, sqlx::Error>;

    /// Returns false when the user owns no such channel
    async fn delete_owned(&self, user_id: i32, channel_id: &str) -> Result<bool, sqlx::Error>;

    async fn update_access_token(&self, id: i32, access_token: &str) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl ChannelStore for PgPool {
    async fn upsert(
        &self,
        user_id: i32,
        snapshot: &ChannelSnapshot,
        tokens: &ChannelTokens,
    ) -> Result<UpsertedChannel, sqlx::Error> {
        // Tokens are only carried over when the owner does not change
        let row = sqlx::query_as::<_, UpsertedChannel>(
            r#"
            INSERT INTO youtube_channels (
                user_id, channel_id, title, description, custom_url, published_at,
                thumbnail_url, subscriber_count, video_count, view_count,
                uploads_playlist_id, access_token, refresh_token
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (channel_id) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                custom_url = EXCLUDED.custom_url,
                published_at = EXCLUDED.published_at,
                thumbnail_url = EXCLUDED.thumbnail_url,
                subscriber_count = EXCLUDED.subscriber_count,
                video_count = EXCLUDED.video_count,
                view_count = EXCLUDED.view_count,
                uploads_playlist_id = EXCLUDED.uploads_playlist_id,
                access_token = CASE
                    WHEN youtube_channels.user_id = EXCLUDED.user_id
                    THEN COALESCE(EXCLUDED.access_token, youtube_channels.access_token)
                    ELSE EXCLUDED.access_token
                END,
                refresh_token = CASE
                    WHEN youtube_channels.user_id = EXCLUDED.user_id
                    THEN COALESCE(EXCLUDED.refresh_token, youtube_channels.refresh_token)
                    ELSE EXCLUDED.refresh_token
                END,
                user_id = EXCLUDED.user_id,
                updated_at = NOW()
            RETURNING *, (xmax = 0) AS inserted
            "#,
        )
        .bind(user_id)
        .bind(&snapshot.channel_id)
        .bind(&snapshot.title)
        .bind(&snapshot.description)
        .bind(&snapshot.custom_url)
        .bind(snapshot.published_at)
        .bind(&snapshot.thumbnail_url)
        .bind(snapshot.subscriber_count)
        .bind(snapshot.video_count)
        .bind(snapshot.view_count)
        .bind(&snapshot.uploads_playlist_id)
        .bind(&tokens.access_token)
        .bind(&tokens.refresh_token)
        .fetch_one(self)
        .await?;

        tracing::debug!(
            "Upserted channel {} for user {} (new: {})",
            row.channel.channel_id,
            user_id,
            row.inserted
        );

        Ok(row)
    }

    async fn insert_new(&self, user_id: i32, snapshot: &ChannelSnapshot) -> Result<Option<YouTubeChannel>, sqlx::Error> {
        sqlx::query_as::<_, YouTubeChannel>(
            r#"
            INSERT INTO youtube_channels (
                user_id, channel_id, title, description, custom_url, published_at,
                thumbnail_url, subscriber_count, video_count, view_count, uploads_playlist_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (channel_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&snapshot.channel_id)
        .bind(&snapshot.title)
        .bind(&snapshot.description)
        .bind(&snapshot.custom_url)
        .bind(snapshot.published_at)
        .bind(&snapshot.thumbnail_url)
        .bind(snapshot.subscriber_count)
        .bind(snapshot.video_count)
        .bind(snapshot.view_count)
        .bind(&snapshot.uploads_playlist_id)
        .fetch_optional(self)
        .await
    }

    async fn find_owned(&self, user_id: i32, channel_id: &str) -> Result<Option<YouTubeChannel>, sqlx::Error> {
        sqlx::query_as::<_, YouTubeChannel>(
            "SELECT * FROM youtube_channels WHERE user_id = $1 AND channel_id = $2",
        )
        .bind(user_id)
        .bind(channel_id)
        .fetch_optional(self)
        .await
    }

    async fn list_for_user(&self, user_id: i32) -> Result<Vec<YouTubeChannel>, sqlx::Error> {
        sqlx::query_as::<_, YouTubeChannel>(
            "SELECT * FROM youtube_channels WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self)
        .await
    }

    async fn delete_owned(&self, user_id: i32, channel_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM youtube_channels WHERE user_id = $1 AND channel_id = $2")
            .bind(user_id)
            .bind(channel_id)
            .execute(self)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_access_token(&self, id: i32, access_token: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE youtube_channels SET access_token = $1, updated_at = NOW() WHERE id = $2")
            .bind(access_token)
            .bind(id)
            .execute(self)
            .await?;
        Ok(())
    }
}
