// src/services/mod.rs
pub mod channel_service;
pub mod channel_store;

pub use channel_service::{ChannelDirectory, ChannelError, ChannelService};
pub use channel_store::ChannelStore;
