//! Module routes: navigation tree and record CRUD under `/modules`.

use crate::handlers::module::navigation;
use crate::handlers::record::{create, delete as delete_handler, list, read, update};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn record_routes(state: AppState) -> Router {
    Router::new()
        .route("/modules", get(navigation))
        .route("/modules/:module_id", get(list).post(create))
        .route(
            "/modules/:module_id/:record_id",
            get(read).put(update).delete(delete_handler),
        )
        .with_state(state)
}
