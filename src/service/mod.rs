//! Record engine: statement execution, lookup and child expansion, record access.

mod children;
mod executor;
mod lookup;
mod records;
mod validation;
pub use children::{expand_children, MAX_CHILD_DEPTH};
pub use executor::RowSource;
pub use lookup::{display_column, expand_lookups};
pub use records::RecordService;
pub use validation::RequestValidator;
