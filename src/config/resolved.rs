//! Resolved module model: metadata validated and flattened for runtime use.

use crate::config::ValidationRule;
use crate::error::ConfigError;
use serde_json::Value;
use std::collections::HashMap;

/// What a module is backed by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    /// A single physical table.
    Table,
    /// A pre-authored select statement.
    Report,
    /// Same as report; kept distinct because module files name it separately.
    Custom,
    /// Navigation-only container of modules.
    Group,
    /// Top of the navigation tree.
    Root,
}

impl EntityKind {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_lowercase().as_str() {
            "table" => EntityKind::Table,
            "report" => EntityKind::Report,
            "custom" => EntityKind::Custom,
            "group" => EntityKind::Group,
            "root" => EntityKind::Root,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Table => "table",
            EntityKind::Report => "report",
            EntityKind::Custom => "custom",
            EntityKind::Group => "group",
            EntityKind::Root => "root",
        }
    }

    /// Report and custom modules read through their own select statement.
    pub fn is_report(&self) -> bool {
        matches!(self, EntityKind::Report | EntityKind::Custom)
    }
}

/// Declared column value type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueType {
    Integer,
    Number,
    Decimal,
    String,
    Text,
    Boolean,
    Date,
    DateTime,
    Uuid,
    Json,
    Lookup,
    Other(String),
}

impl ValueType {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "integer" | "int" | "bigint" | "serial" => ValueType::Integer,
            "number" | "float" | "double" => ValueType::Number,
            "decimal" | "numeric" | "money" => ValueType::Decimal,
            "string" | "varchar" => ValueType::String,
            "text" => ValueType::Text,
            "boolean" | "bool" => ValueType::Boolean,
            "date" => ValueType::Date,
            "datetime" | "timestamp" | "timestamptz" => ValueType::DateTime,
            "uuid" => ValueType::Uuid,
            "json" | "jsonb" => ValueType::Json,
            "lookup" => ValueType::Lookup,
            _ => ValueType::Other(s.to_string()),
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, ValueType::String | ValueType::Text)
    }

    /// PostgreSQL type used to cast bound parameters for this column. Lookups are
    /// resolved against the target's primary key by the loader.
    pub fn bind_cast(&self) -> Option<&'static str> {
        match self {
            ValueType::Integer => Some("bigint"),
            ValueType::Number | ValueType::Decimal => Some("numeric"),
            ValueType::String | ValueType::Text => Some("text"),
            ValueType::Boolean => Some("boolean"),
            ValueType::Date => Some("date"),
            ValueType::DateTime => Some("timestamptz"),
            ValueType::Uuid => Some("uuid"),
            ValueType::Json => Some("jsonb"),
            ValueType::Lookup | ValueType::Other(_) => None,
        }
    }
}

/// Where a lookup column points.
#[derive(Clone, Debug)]
pub struct LookupSpec {
    pub target_entity_id: String,
    /// Column on the target used as the display name instead of the default choice.
    pub display_field_override: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ColumnDescription {
    pub physical_name: String,
    pub display_name: String,
    pub value_type: ValueType,
    pub is_visible: bool,
    pub is_editable: bool,
    pub is_primary_key: bool,
    pub is_read_only: bool,
    pub default_value: Option<Value>,
    pub lookup: Option<LookupSpec>,
    pub validation: Option<ValidationRule>,
    /// PostgreSQL type name for `$n::type` casts when binding values.
    pub bind_cast: Option<String>,
}

impl ColumnDescription {
    pub fn is_write_eligible(&self) -> bool {
        self.is_editable && !self.is_primary_key && !self.is_read_only
    }
}

/// Submodule: rows of `target_entity_id` whose `foreign_key_column` holds our key.
#[derive(Clone, Debug)]
pub struct ChildLink {
    pub target_entity_id: String,
    pub foreign_key_column: String,
    pub display_name: String,
}

#[derive(Clone, Debug)]
pub struct GroupLink {
    pub target_group_id: String,
    pub display_name: String,
}

#[derive(Clone, Debug)]
pub struct EntityDescription {
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
    pub table_name: Option<String>,
    pub select_statement: Option<String>,
    pub display_field: Option<String>,
    pub columns: Vec<ColumnDescription>,
    pub child_links: Vec<ChildLink>,
    pub group_links: Vec<GroupLink>,
}

impl EntityDescription {
    pub fn primary_key(&self) -> Option<&ColumnDescription> {
        self.columns.iter().find(|c| c.is_primary_key)
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = &ColumnDescription> {
        self.columns.iter().filter(|c| c.is_visible)
    }

    pub fn column(&self, physical_name: &str) -> Option<&ColumnDescription> {
        self.columns.iter().find(|c| c.physical_name == physical_name)
    }

    pub fn lookup_columns(&self) -> impl Iterator<Item = (&ColumnDescription, &LookupSpec)> {
        self.columns
            .iter()
            .filter_map(|c| c.lookup.as_ref().map(|l| (c, l)))
    }
}

/// Read-only registry of every module, built once at startup and shared by reference.
#[derive(Clone, Debug, Default)]
pub struct ModuleGraph {
    modules: Vec<EntityDescription>,
    by_id: HashMap<String, usize>,
}

impl ModuleGraph {
    pub fn new(modules: Vec<EntityDescription>) -> Result<Self, ConfigError> {
        let mut by_id = HashMap::with_capacity(modules.len());
        for (i, m) in modules.iter().enumerate() {
            if by_id.insert(m.id.clone(), i).is_some() {
                return Err(ConfigError::DuplicateModule(m.id.clone()));
            }
        }
        Ok(ModuleGraph { modules, by_id })
    }

    pub fn get(&self, id: &str) -> Option<&EntityDescription> {
        self.by_id.get(id).map(|&i| &self.modules[i])
    }

    /// Modules in load order.
    pub fn modules(&self) -> &[EntityDescription] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
