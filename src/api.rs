//! HTTP API for the concierge
//!
//! Channel adapters post activities here and relay the returned messages.

mod handlers;
mod types;

pub use handlers::create_router;

use crate::db::Database;
use crate::runtime::RuntimeManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<RuntimeManager>,
}

impl AppState {
    pub fn new(db: Database, reservation_trigger: Option<String>) -> Self {
        Self {
            runtime: Arc::new(RuntimeManager::new(db, reservation_trigger)),
        }
    }
}
