use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

use crate::export::DEFAULT_JOSM_PORT;

pub const DEFAULT_MAP_STYLE: &str = "mapbox://styles/mapbox/streets-v9";
pub const DEFAULT_MAP_PADDING: u32 = 20;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_token: Option<String>,
    pub josm_port: u16,
    pub map_style: String,
    pub map_padding: u32,
    /// Ask before saving description edits (deletes always ask)
    pub confirm_updates: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            api_url: env::var("TRACE_API_URL")
                .context("TRACE_API_URL must be set")?
                .trim_end_matches('/')
                .to_string(),
            api_token: env::var("TRACE_API_TOKEN").ok(),
            josm_port: env::var("JOSM_REMOTE_PORT")
                .unwrap_or_else(|_| DEFAULT_JOSM_PORT.to_string())
                .parse()
                .context("JOSM_REMOTE_PORT must be a valid port")?,
            map_style: env::var("MAP_STYLE").unwrap_or_else(|_| DEFAULT_MAP_STYLE.to_string()),
            map_padding: env::var("MAP_PADDING")
                .unwrap_or_else(|_| DEFAULT_MAP_PADDING.to_string())
                .parse()
                .context("MAP_PADDING must be a valid number")?,
            confirm_updates: env::var("CONFIRM_UPDATES")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        })
    }

    /// Defaults around a given API base; used by tests and embedders.
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_token: None,
            josm_port: DEFAULT_JOSM_PORT,
            map_style: DEFAULT_MAP_STYLE.to_string(),
            map_padding: DEFAULT_MAP_PADDING,
            confirm_updates: false,
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" YES "));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn defaults_trim_trailing_slash() {
        let config = Config::with_api_url("https://api.example.org/");
        assert_eq!(config.api_url, "https://api.example.org");
        assert_eq!(config.josm_port, 8111);
        assert_eq!(config.map_padding, 20);
        assert!(!config.confirm_updates);
    }
}
