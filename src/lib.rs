pub mod api;
pub mod auth;
pub mod config;
pub mod records;
pub mod store;

use auth::TokenService;
use config::Config;
use store::Store;

/// Shared state handed to every request handler.
pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(config: Config, store: Store, tokens: TokenService) -> Self {
        Self {
            config,
            store,
            tokens,
        }
    }
}
