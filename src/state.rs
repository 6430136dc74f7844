//! Shared state handed to every handler.

use crate::{config::AppConfig, services::content_store::ContentStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: ContentStore,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: ContentStore, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}
