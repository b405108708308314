//! Routers: common (health, readiness, version) and module records.

mod common;
mod record;
pub use common::common_routes;
pub use record::record_routes;
