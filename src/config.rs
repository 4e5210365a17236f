// Runtime configuration loaded from the environment (.env is read by dotenvy in main)

use thiserror::Error;

const DEV_SESSION_SECRET: &str = "development_session_secret";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub frontend_url: String,
    pub backend_url: String,
    pub session_secret: String,
    pub cookie_secure: bool,
    pub youtube_api_key: Option<String>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value: raw })?,
            None => 5000,
        };

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| ConfigError::Invalid { key: "DB_MAX_CONNECTIONS", value: raw })?,
            None => 5,
        };

        let cookie_secure = match get("COOKIE_SECURE").as_deref() {
            Some("true") | Some("1") => true,
            Some("false") | Some("0") | None => false,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "COOKIE_SECURE",
                    value: other.to_string(),
                })
            }
        };

        let session_secret = match get("SESSION_SECRET") {
            Some(secret) => secret,
            None => {
                tracing::warn!("SESSION_SECRET not set, using the development secret");
                DEV_SESSION_SECRET.to_string()
            }
        };

        Ok(Self {
            port,
            database_url,
            db_max_connections,
            frontend_url: trim_url(get("FRONTEND_URL").unwrap_or_else(|| "http://localhost:8080".to_string())),
            backend_url: trim_url(get("BACKEND_URL").unwrap_or_else(|| "http://localhost:5000".to_string())),
            session_secret,
            cookie_secure,
            youtube_api_key: get("YOUTUBE_API_KEY"),
            google_client_id: get("GOOGLE_CLIENT_ID"),
            google_client_secret: get("GOOGLE_CLIENT_SECRET"),
        })
    }

    /// Client id and secret, only when both are configured
    pub fn google_credentials(&self) -> Option<(&str, &str)> {
        match (&self.google_client_id, &self.google_client_secret) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }

    pub fn google_callback_url(&self) -> String {
        format!("{}/auth/google/callback", self.backend_url)
    }

    pub fn youtube_callback_url(&self) -> String {
        format!("{}/auth/youtube/callback", self.backend_url)
    }
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_applied() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/hub")]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.frontend_url, "http://localhost:8080");
        assert_eq!(config.google_callback_url(), "http://localhost:5000/auth/google/callback");
        assert!(!config.cookie_secure);
        assert!(config.youtube_api_key.is_none());
        assert!(config.google_credentials().is_none());
    }

    #[test]
    fn test_database_url_required() {
        let err = config_from(&[("PORT", "8000")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn test_invalid_port_rejected() {
        let err = config_from(&[("DATABASE_URL", "postgres://x"), ("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("YOUTUBE_API_KEY", "  "),
            ("BACKEND_URL", "https://api.example.com/"),
            ("GOOGLE_CLIENT_ID", "id"),
            ("GOOGLE_CLIENT_SECRET", "secret"),
        ])
        .unwrap();
        assert!(config.youtube_api_key.is_none());
        assert_eq!(config.youtube_callback_url(), "https://api.example.com/auth/youtube/callback");
        assert_eq!(config.google_credentials(), Some(("id", "secret")));
    }
}
