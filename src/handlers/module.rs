//! Navigation handler: the module tree for menus.

use crate::config::{build_navigation, NavNode};
use crate::state::AppState;
use axum::{extract::State, Json};

pub async fn navigation(State(state): State<AppState>) -> Json<NavNode> {
    Json(build_navigation(&state.graph))
}
