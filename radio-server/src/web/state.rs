//! Application state for the web layer.

use std::sync::Arc;

use tower_cookies::Key;

use crate::config::ServerConfig;
use crate::store::SqliteStore;

/// Shared application state.
///
/// Contains everything handlers need; built once at startup.
#[derive(Clone)]
pub struct AppState {
    /// Stations, users and favourites
    pub store: Arc<SqliteStore>,

    /// Signs the session cookie
    pub session_key: Key,

    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(store: SqliteStore, session_key: Key, config: ServerConfig) -> Self {
        Self {
            store: Arc::new(store),
            session_key,
            config: Arc::new(config),
        }
    }
}
