//! HTTP handlers for module records and navigation.

pub mod module;
pub mod record;
pub use module::navigation;
