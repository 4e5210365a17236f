// lib.rs - exports the modules that have no server dependencies
pub mod analytics;
pub mod channel_input;

pub use analytics::{channel_metrics, compare_channels, performance_score, ChannelMetrics, VideoSample};
pub use channel_input::ChannelInput;
