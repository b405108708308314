//! Module REST: metadata-driven record access over PostgreSQL.
//!
//! Module metadata (JSON files) is resolved into a [`ModuleGraph`]; the record
//! engine builds parameterized statements from it, materializes rows into
//! [`Record`]s and expands lookups and child sets.

pub mod config;
pub mod error;
pub mod handlers;
pub mod record;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;

pub use config::{build_navigation, load_from_dir, resolve, EntityDescription, ModuleGraph, Settings};
pub use error::{AppError, ConfigError};
pub use record::{FieldValue, LookupRef, RawCell, RawRow, Record, Scalar};
pub use response::{success_many, success_one};
pub use routes::{common_routes, record_routes};
pub use service::{RecordService, RowSource};
pub use sql::Statement;
pub use state::AppState;
