//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

/// Relay server configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origin for CORS; None allows any origin
    pub client_origin: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:5001".to_string())
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            client_origin: env::var("CLIENT_ORIGIN").ok(),
        })
    }
}

/// Gesture controller configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Base URL of the relay server
    pub relay_url: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Forward preview frames to the relay's /video_frame endpoint
    pub preview_enabled: bool,
}

impl ControllerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let relay_url = env::var("RELAY_URL").unwrap_or_else(|_| "http://localhost:5001".to_string());
        if !relay_url.starts_with("http://") && !relay_url.starts_with("https://") {
            return Err(ConfigError::InvalidRelayUrl);
        }

        Ok(Self {
            relay_url: relay_url.trim_end_matches('/').to_string(),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            preview_enabled: env::var("FRAME_PREVIEW")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("RELAY_URL must be an http(s) URL")]
    InvalidRelayUrl,
}
