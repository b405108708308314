//! Shared application state for all routes. The module graph is read-only after startup.

use crate::config::ModuleGraph;
use crate::service::RowSource;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn RowSource>,
    pub graph: Arc<ModuleGraph>,
}

impl AppState {
    pub fn new(pool: PgPool, graph: ModuleGraph) -> Self {
        AppState {
            db: Arc::new(pool),
            graph: Arc::new(graph),
        }
    }
}
