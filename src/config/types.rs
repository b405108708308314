//! Raw module metadata as it appears in the JSON module files.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub id: String,
    pub name: String,
    /// table, report, custom, group or root.
    #[serde(rename = "type", default = "default_module_type")]
    pub type_: String,
    #[serde(default)]
    pub db_table_name: Option<String>,
    #[serde(default)]
    pub select_query: Option<String>,
    #[serde(default)]
    pub display_field: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
    #[serde(default)]
    pub sub_modules: Vec<SubModuleConfig>,
    /// Only meaningful on the root module: the groups shown in navigation.
    #[serde(default)]
    pub groups: Vec<GroupLinkConfig>,
}

fn default_module_type() -> String {
    "table".into()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    pub db_column_name: String,
    #[serde(rename = "type", default = "default_column_type")]
    pub type_: String,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default = "default_true")]
    pub is_editable: bool,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_read_only: bool,
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,
    #[serde(default)]
    pub lookup_module_id: Option<String>,
    #[serde(default)]
    pub lookup_display_field: Option<String>,
    #[serde(default)]
    pub validation: Option<ValidationRule>,
}

fn default_column_type() -> String {
    "string".into()
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubModuleConfig {
    pub target_module_id: String,
    pub child_foreign_key_field: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupLinkConfig {
    pub target_group_id: String,
    #[serde(default)]
    pub display_name: String,
}

/// Per-column payload rules checked before a create or update.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub allowed: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}
