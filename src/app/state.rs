//! Application state shared across routes

use std::sync::Arc;

use crate::channels::ChannelStore;
use crate::config::ServerConfig;
use crate::http::preview::PreviewChannel;
use crate::lobby::Lobby;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub channels: Arc<ChannelStore>,
    pub lobby: Arc<Lobby>,
    pub preview: Arc<PreviewChannel>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            channels: Arc::new(ChannelStore::new()),
            lobby: Arc::new(Lobby::new()),
            preview: Arc::new(PreviewChannel::new()),
        }
    }
}
