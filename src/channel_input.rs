// Classifies what a user typed into the "connect channel" box

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CHANNEL_ID: Regex = Regex::new(r"^UC[A-Za-z0-9_-]{22}$").unwrap();
    static ref CHANNEL_URL: Regex =
        Regex::new(r"^(?:https?://)?(?:www\.|m\.)?youtube\.com/channel/([A-Za-z0-9_-]+)").unwrap();
    static ref HANDLE_URL: Regex =
        Regex::new(r"^(?:https?://)?(?:www\.|m\.)?youtube\.com/@([^/?#]+)").unwrap();
    static ref USER_URL: Regex =
        Regex::new(r"^(?:https?://)?(?:www\.|m\.)?youtube\.com/(?:user|c)/([^/?#]+)").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelInput {
    /// Canonical `UC...` channel id
    Id(String),
    /// `@handle`, stored with the leading `@`
    Handle(String),
    /// Legacy username or free text
    Username(String),
}

impl ChannelInput {
    /// Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let input = raw.trim();
        if input.is_empty() {
            return None;
        }

        if let Some(caps) = CHANNEL_URL.captures(input) {
            return Some(ChannelInput::Id(caps[1].to_string()));
        }
        if let Some(caps) = HANDLE_URL.captures(input) {
            return Some(ChannelInput::Handle(format!("@{}", &caps[1])));
        }
        if let Some(caps) = USER_URL.captures(input) {
            return Some(ChannelInput::Username(caps[1].to_string()));
        }

        if input.starts_with('@') {
            return Some(ChannelInput::Handle(input.to_string()));
        }
        if CHANNEL_ID.is_match(input) {
            return Some(ChannelInput::Id(input.to_string()));
        }

        Some(ChannelInput::Username(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            ChannelInput::Id(s) | ChannelInput::Handle(s) | ChannelInput::Username(s) => s,
        }
    }
}
