// Channel connect / refresh / disconnect over the YouTube directory and the local store

use super::channel_store::ChannelStore;
use crate::channel_input::ChannelInput;
use crate::models::youtube::{ChannelSnapshot, ChannelTokens, UpsertedChannel, YouTubeChannel};
use crate::youtube_client::YouTubeError;
use async_trait::async_trait;
use thiserror::Error;

/// Read-only channel lookups against YouTube
#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    async fn channel_by_id(&self, channel_id: &str) -> Result<Option<ChannelSnapshot>, YouTubeError>;

    async fn channel_by_username(&self, username: &str) -> Result<Option<ChannelSnapshot>, YouTubeError>;

    /// Id of the best channel search match
    async fn search_channel_id(&self, query: &str) -> Result<Option<String>, YouTubeError>;
}

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Channel not found")]
    NotFound,
    #[error("{0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Store(#[from] sqlx::Error),
    #[error(transparent)]
    YouTube(YouTubeError),
}

#[derive(Clone, Copy)]
enum Strategy {
    ById,
    ByUsername,
    Search,
}

impl ChannelInput {
    /// Lookups to try, in order
    fn strategies(&self) -> &'static [Strategy] {
        match self {
            ChannelInput::Id(_) => &[Strategy::ById, Strategy::Search],
            ChannelInput::Handle(_) => &[Strategy::Search],
            ChannelInput::Username(_) => &[Strategy::ByUsername, Strategy::Search],
        }
    }
}

pub struct ChannelService<'a> {
    store: &'a dyn ChannelStore,
    directory: &'a dyn ChannelDirectory,
}

impl<'a> ChannelService<'a> {
    pub fn new(store: &'a dyn ChannelStore, directory: &'a dyn ChannelDirectory) -> Self {
        Self { store, directory }
    }

    async fn lookup(&self, strategy: Strategy, query: &str) -> Result<Option<ChannelSnapshot>, YouTubeError> {
        match strategy {
            Strategy::ById => self.directory.channel_by_id(query).await,
            Strategy::ByUsername => self.directory.channel_by_username(query).await,
            Strategy::Search => match self.directory.search_channel_id(query).await? {
                Some(id) => self.directory.channel_by_id(&id).await,
                None => Ok(None),
            },
        }
    }

    /// Walks the fallback chain for the input. Lookup errors and empty results
    /// both move on to the next strategy; a missing API key stops the chain.
    pub async fn resolve(&self, input: &ChannelInput) -> Result<ChannelSnapshot, ChannelError> {
        for &strategy in input.strategies() {
            match self.lookup(strategy, input.as_str()).await {
                Ok(Some(snapshot)) => return Ok(snapshot),
                Ok(None) => {}
                Err(YouTubeError::NotConfigured) => return Err(ChannelError::YouTube(YouTubeError::NotConfigured)),
                Err(e) => tracing::warn!("Channel lookup for '{}' failed: {}", input.as_str(), e),
            }
        }

        tracing::info!("No channel matched '{}'", input.as_str());
        Err(ChannelError::NotFound)
    }

    pub async fn resolve_raw(&self, raw: &str) -> Result<ChannelSnapshot, ChannelError> {
        let input = ChannelInput::parse(raw)
            .ok_or_else(|| ChannelError::InvalidInput("Channel ID, username, or custom URL is required".to_string()))?;
        self.resolve(&input).await
    }

    /// Resolve the user's input and store the channel under their account
    pub async fn connect(&self, user_id: i32, raw: &str) -> Result<UpsertedChannel, ChannelError> {
        let snapshot = self.resolve_raw(raw).await?;
        self.store_snapshot(user_id, &snapshot, &ChannelTokens::default()).await
    }

    pub async fn store_snapshot(
        &self,
        user_id: i32,
        snapshot: &ChannelSnapshot,
        tokens: &ChannelTokens,
    ) -> Result<UpsertedChannel, ChannelError> {
        let stored = self.store.upsert(user_id, snapshot, tokens).await?;
        tracing::info!(
            "Channel {} ({}) {} for user {}",
            stored.channel.title,
            stored.channel.channel_id,
            if stored.inserted { "connected" } else { "updated" },
            user_id
        );
        Ok(stored)
    }

    pub async fn list(&self, user_id: i32) -> Result<Vec<YouTubeChannel>, ChannelError> {
        Ok(self.store.list_for_user(user_id).await?)
    }

    /// The user's record for `channel_id`, refreshed from YouTube when possible.
    /// Channels nobody has stored yet are fetched and stored first; a channel
    /// owned by someone else is not found. A failed refresh returns the stored
    /// record unchanged.
    pub async fn get_with_refresh(&self, user_id: i32, channel_id: &str) -> Result<YouTubeChannel, ChannelError> {
        let Some(stored) = self.store.find_owned(user_id, channel_id).await? else {
            let snapshot = match self.directory.channel_by_id(channel_id).await {
                Ok(Some(snapshot)) => snapshot,
                Ok(None) => return Err(ChannelError::NotFound),
                Err(YouTubeError::NotConfigured) => return Err(ChannelError::YouTube(YouTubeError::NotConfigured)),
                Err(e) => {
                    tracing::warn!("Failed to fetch channel {}: {}", channel_id, e);
                    return Err(ChannelError::NotFound);
                }
            };
            // Reads never take a channel away from its owner
            let Some(created) = self.store.insert_new(user_id, &snapshot).await? else {
                tracing::info!("Channel {} belongs to another user", channel_id);
                return Err(ChannelError::NotFound);
            };
            tracing::info!("Channel {} ({}) stored for user {}", created.title, created.channel_id, user_id);
            return Ok(created);
        };

        match self.directory.channel_by_id(channel_id).await {
            Ok(Some(snapshot)) => match self.store.upsert(user_id, &snapshot, &ChannelTokens::default()).await {
                Ok(refreshed) => Ok(refreshed.channel),
                Err(e) => {
                    tracing::warn!("Failed to store refreshed channel {}: {}", channel_id, e);
                    Ok(stored)
                }
            },
            Ok(None) => Ok(stored),
            Err(e) => {
                tracing::warn!("Failed to refresh channel {}, returning stored copy: {}", channel_id, e);
                Ok(stored)
            }
        }
    }

    pub async fn find_owned(&self, user_id: i32, channel_id: &str) -> Result<YouTubeChannel, ChannelError> {
        self.store
            .find_owned(user_id, channel_id)
            .await?
            .ok_or(ChannelError::NotFound)
    }

    pub async fn replace_access_token(&self, channel: &YouTubeChannel, access_token: &str) -> Result<(), ChannelError> {
        self.store.update_access_token(channel.id, access_token).await?;
        tracing::info!("Refreshed access token for channel {}", channel.channel_id);
        Ok(())
    }

    pub async fn disconnect(&self, user_id: i32, channel_id: &str) -> Result<(), ChannelError> {
        if !self.store.delete_owned(user_id, channel_id).await? {
            return Err(ChannelError::NotFound);
        }
        tracing::info!("Channel {} disconnected by user {}", channel_id, user_id);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;

    const RUST_ID: &str = "UCaYhcUwRBNscFNUKTjgPFiA";

    fn directory() -> FakeDirectory {
        let mut dir = FakeDirectory::default();
        dir.by_id.insert(RUST_ID.to_string(), snapshot(RUST_ID, "Rust", 100_000));
        dir.by_username.insert("rustlang".to_string(), RUST_ID.to_string());
        dir.search.insert("@rustvideos".to_string(), RUST_ID.to_string());
        dir.search.insert("Rust Programming".to_string(), RUST_ID.to_string());
        dir
    }

    #[tokio::test]
    async fn test_connect_twice_updates_existing_record() {
        let store = MemoryStore::default();
        let dir = directory();
        let service = ChannelService::new(&store, &dir);

        let first = service.connect(1, RUST_ID).await.unwrap();
        assert!(first.inserted);

        let second = service.connect(1, "https://www.youtube.com/channel/UCaYhcUwRBNscFNUKTjgPFiA").await.unwrap();
        assert!(!second.inserted);
        assert_eq!(second.channel.id, first.channel.id);
        assert_eq!(store.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_connect_by_other_user_transfers_ownership() {
        let store = MemoryStore::default();
        let dir = directory();
        let service = ChannelService::new(&store, &dir);

        service
            .store_snapshot(
                1,
                &snapshot(RUST_ID, "Rust", 100_000),
                &ChannelTokens {
                    access_token: Some("owner-token".into()),
                    refresh_token: None,
                },
            )
            .await
            .unwrap();
        let moved = service.connect(2, RUST_ID).await.unwrap();

        assert_eq!(moved.channel.user_id, 2);
        assert!(moved.channel.access_token.is_none());
        assert!(service.list(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_username_falls_back_to_search() {
        let store = MemoryStore::default();
        let dir = directory();
        let service = ChannelService::new(&store, &dir);

        // no forUsername match, but search finds it
        let snapshot = service.resolve_raw("Rust Programming").await.unwrap();
        assert_eq!(snapshot.channel_id, RUST_ID);

        let by_handle = service.resolve_raw("youtube.com/@rustvideos").await.unwrap();
        assert_eq!(by_handle.channel_id, RUST_ID);

        let by_username = service.resolve_raw("rustlang").await.unwrap();
        assert_eq!(by_username.title, "Rust");
    }

    #[tokio::test]
    async fn test_every_strategy_failing_is_not_found() {
        let store = MemoryStore::default();
        let dir = directory();
        let service = ChannelService::new(&store, &dir);
        let err = service.connect(1, "nobody-at-all").await.unwrap_err();
        assert!(matches!(err, ChannelError::NotFound));

        let failing = FakeDirectory {
            failing: true,
            ..directory()
        };
        let service = ChannelService::new(&store, &failing);
        let err = service.connect(1, RUST_ID).await.unwrap_err();
        assert!(matches!(err, ChannelError::NotFound));
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_input_rejected() {
        let store = MemoryStore::default();
        let dir = directory();
        let service = ChannelService::new(&store, &dir);
        let err = service.connect(1, "   ").await.unwrap_err();
        assert!(matches!(err, ChannelError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_disconnect_requires_ownership() {
        let store = MemoryStore::default();
        let dir = directory();
        let service = ChannelService::new(&store, &dir);
        service.connect(1, RUST_ID).await.unwrap();

        let err = service.disconnect(2, RUST_ID).await.unwrap_err();
        assert!(matches!(err, ChannelError::NotFound));
        assert_eq!(store.rows.lock().unwrap().len(), 1);

        service.disconnect(1, RUST_ID).await.unwrap();
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_with_refresh_updates_snapshot() {
        let store = MemoryStore::default();
        let mut dir = directory();
        ChannelService::new(&store, &dir).connect(1, RUST_ID).await.unwrap();

        let mut renamed = snapshot(RUST_ID, "Rust Language", 150_000);
        renamed.description = "Official channel".into();
        renamed.custom_url = Some("@rustlang".into());
        renamed.thumbnail_url = Some("https://yt3.example/rust.jpg".into());
        renamed.uploads_playlist_id = Some("UUnewplaylist".into());
        dir.by_id.insert(RUST_ID.to_string(), renamed);

        let refreshed = ChannelService::new(&store, &dir).get_with_refresh(1, RUST_ID).await.unwrap();
        assert_eq!(refreshed.subscriber_count, 150_000);
        assert_eq!(refreshed.title, "Rust Language");
        assert_eq!(refreshed.description, "Official channel");
        assert_eq!(refreshed.custom_url.as_deref(), Some("@rustlang"));
        assert_eq!(refreshed.thumbnail_url.as_deref(), Some("https://yt3.example/rust.jpg"));
        assert_eq!(refreshed.uploads_playlist_id.as_deref(), Some("UUnewplaylist"));
    }

    #[tokio::test]
    async fn test_get_with_refresh_falls_back_to_stored_record() {
        let store = MemoryStore::default();
        let dir = directory();
        ChannelService::new(&store, &dir).connect(1, RUST_ID).await.unwrap();

        let failing = FakeDirectory {
            failing: true,
            ..directory()
        };
        let channel = ChannelService::new(&store, &failing).get_with_refresh(1, RUST_ID).await.unwrap();
        assert_eq!(channel.subscriber_count, 100_000);

        // unknown and unreachable
        let err = ChannelService::new(&store, &failing)
            .get_with_refresh(1, "UCmissing")
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::NotFound));
    }

    #[tokio::test]
    async fn test_get_with_refresh_stores_unknown_channel() {
        let store = MemoryStore::default();
        let dir = directory();
        let channel = ChannelService::new(&store, &dir).get_with_refresh(3, RUST_ID).await.unwrap();
        assert_eq!(channel.user_id, 3);
        assert_eq!(store.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_with_refresh_leaves_other_owners_channel_alone() {
        let store = MemoryStore::default();
        let dir = directory();
        let service = ChannelService::new(&store, &dir);
        service
            .store_snapshot(
                1,
                &snapshot(RUST_ID, "Rust", 100_000),
                &ChannelTokens {
                    access_token: Some("owner-token".into()),
                    refresh_token: Some("owner-refresh".into()),
                },
            )
            .await
            .unwrap();

        let err = service.get_with_refresh(2, RUST_ID).await.unwrap_err();
        assert!(matches!(err, ChannelError::NotFound));

        let owned = service.find_owned(1, RUST_ID).await.unwrap();
        assert_eq!(owned.access_token.as_deref(), Some("owner-token"));
        assert_eq!(owned.refresh_token.as_deref(), Some("owner-refresh"));
        assert!(service.list(2).await.unwrap().is_empty());
    }
}
