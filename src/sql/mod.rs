//! Safe SQL builder: identifiers from config only, values as parameters.

mod builder;
pub mod params;
mod sort;
pub use builder::*;
pub use params::*;
pub use sort::{SortDirection, SortSpec};
