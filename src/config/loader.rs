//! Load module metadata from a directory of JSON files and resolve it into a `ModuleGraph`.

use crate::config::resolved::{
    ChildLink, ColumnDescription, EntityDescription, EntityKind, GroupLink, LookupSpec, ModuleGraph, ValueType,
};
use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use std::collections::HashMap;
use std::path::Path;

/// Read every `*.json` file in `dir` (sorted by file name); each holds one module.
pub async fn load_from_dir(dir: &Path) -> Result<Vec<ModuleConfig>, ConfigError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", dir.display(), e)))?;
    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ConfigError::Load(e.to_string()))?
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut modules = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
        let module: ModuleConfig =
            serde_json::from_str(&raw).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(module = %module.id, file = %path.display(), "loaded module");
        modules.push(module);
    }
    tracing::info!(count = modules.len(), dir = %dir.display(), "module metadata loaded");
    Ok(modules)
}

/// Build the resolved graph from raw modules (validates first).
pub fn resolve(modules: &[ModuleConfig]) -> Result<ModuleGraph, ConfigError> {
    validate(modules)?;

    let pk_cast_by_module: HashMap<&str, Option<&'static str>> = modules
        .iter()
        .filter_map(|m| {
            m.columns
                .iter()
                .find(|c| c.is_primary_key)
                .map(|pk| (m.id.as_str(), ValueType::parse(&pk.type_).bind_cast()))
        })
        .collect();

    let mut entities = Vec::with_capacity(modules.len());
    for m in modules {
        let kind = EntityKind::parse(&m.type_)
            .ok_or_else(|| ConfigError::Load(format!("module '{}' has unknown type '{}'", m.id, m.type_)))?;
        let columns = m
            .columns
            .iter()
            .map(|c| {
                let value_type = ValueType::parse(&c.type_);
                let lookup = c
                    .lookup_module_id
                    .as_ref()
                    .filter(|id| !id.is_empty())
                    .map(|id| LookupSpec {
                        target_entity_id: id.clone(),
                        display_field_override: c.lookup_display_field.clone().filter(|f| !f.is_empty()),
                    });
                let bind_cast = match &lookup {
                    Some(l) => pk_cast_by_module.get(l.target_entity_id.as_str()).copied().flatten(),
                    None => value_type.bind_cast(),
                };
                ColumnDescription {
                    physical_name: c.db_column_name.clone(),
                    display_name: c.name.clone(),
                    value_type,
                    is_visible: c.is_visible,
                    is_editable: c.is_editable,
                    is_primary_key: c.is_primary_key,
                    is_read_only: c.is_read_only,
                    default_value: c.default_value.clone(),
                    lookup,
                    validation: c.validation.clone(),
                    bind_cast: bind_cast.map(str::to_string),
                }
            })
            .collect();

        entities.push(EntityDescription {
            id: m.id.clone(),
            name: m.name.clone(),
            kind,
            table_name: m.db_table_name.clone().filter(|s| !s.is_empty()),
            select_statement: m.select_query.clone().filter(|s| !s.trim().is_empty()),
            display_field: m.display_field.clone().filter(|s| !s.is_empty()),
            columns,
            child_links: m
                .sub_modules
                .iter()
                .map(|s| ChildLink {
                    target_entity_id: s.target_module_id.clone(),
                    foreign_key_column: s.child_foreign_key_field.clone(),
                    display_name: s.display_name.clone(),
                })
                .collect(),
            group_links: m
                .groups
                .iter()
                .map(|g| GroupLink {
                    target_group_id: g.target_group_id.clone(),
                    display_name: g.display_name.clone(),
                })
                .collect(),
        });
    }

    ModuleGraph::new(entities)
}
