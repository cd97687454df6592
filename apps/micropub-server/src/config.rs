//! Application configuration loaded from environment variables.

use std::env;

use url::Url;

/// Default request body limit: 100 MiB.
const DEFAULT_MAX_BODY_SIZE: usize = 100 << 20;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("BASE_URL '{value}' is not a valid absolute URL: {reason}")]
    BaseUrl { value: String, reason: String },
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Root under which entry permalinks and media URLs are minted.
    pub base_url: Url,
    /// Upper bound for buffered request bodies, in bytes.
    pub max_body_size: usize,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let raw_base = env::var("BASE_URL").unwrap_or_else(|_| format!("http://{host}:{port}/"));

        Ok(Self {
            base_url: Self::parse_base_url(&raw_base)?,
            max_body_size: env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_BODY_SIZE),
            host,
            port,
        })
    }

    fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::BaseUrl {
            value: raw.to_string(),
            reason,
        };

        let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(invalid("cannot be used as a base".to_string()));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let url = AppConfig::parse_base_url("https://example.com/blog").unwrap();
        assert_eq!(url.as_str(), "https://example.com/blog/");
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(AppConfig::parse_base_url("example.com").is_err());
        assert!(AppConfig::parse_base_url("mailto:me@example.com").is_err());
    }
}
