//! Request sort parameters, checked against the module's declared columns before
//! they reach SQL text.

use crate::config::EntityDescription;
use crate::error::AppError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortSpec {
    /// Physical column name, guaranteed to be declared on the module.
    pub column: String,
    pub direction: SortDirection,
}

impl SortSpec {
    /// `sort_by` must name a declared column exactly; `sort_order` must be asc or
    /// desc in any case, and defaults to ascending when empty or absent. An empty
    /// or absent `sort_by` means no requested sort.
    pub fn from_request(
        entity: &EntityDescription,
        sort_by: Option<&str>,
        sort_order: Option<&str>,
    ) -> Result<Option<SortSpec>, AppError> {
        let Some(column) = sort_by.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        if entity.column(column).is_none() {
            return Err(AppError::Validation(format!(
                "cannot sort module '{}' by unknown column '{}'",
                entity.id, column
            )));
        }
        let direction = match sort_order.map(str::trim).unwrap_or("") {
            "" => SortDirection::Asc,
            o if o.eq_ignore_ascii_case("asc") => SortDirection::Asc,
            o if o.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            other => {
                return Err(AppError::Validation(format!(
                    "sortOrder must be asc or desc, got '{}'",
                    other
                )))
            }
        };
        Ok(Some(SortSpec {
            column: column.to_string(),
            direction,
        }))
    }
}
