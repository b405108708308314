//! Module metadata validation: structural errors fail the load, dangling references only warn.

use crate::config::{EntityKind, ModuleConfig};
use crate::error::ConfigError;
use std::collections::{HashMap, HashSet};

/// Reject metadata the engine cannot represent at all. Problems that only break
/// individual operations (missing table name, no visible columns, dangling
/// lookups or submodules) are logged and surface when the operation runs.
pub fn validate(modules: &[ModuleConfig]) -> Result<(), ConfigError> {
    let mut ids = HashSet::new();
    for m in modules {
        if !ids.insert(m.id.as_str()) {
            return Err(ConfigError::DuplicateModule(m.id.clone()));
        }
        let kind = EntityKind::parse(&m.type_).ok_or_else(|| {
            ConfigError::Load(format!("module '{}' has unknown type '{}'", m.id, m.type_))
        })?;
        if m.columns.iter().filter(|c| c.is_primary_key).count() > 1 {
            return Err(ConfigError::MultiplePrimaryKeys(m.id.clone()));
        }
        match kind {
            EntityKind::Table => {
                if m.db_table_name.as_deref().unwrap_or("").is_empty() {
                    tracing::warn!(module = %m.id, "table module has no db_table_name; reads and writes will fail");
                }
                if !m.columns.iter().any(|c| c.is_visible) {
                    tracing::warn!(module = %m.id, "table module has no visible columns");
                }
            }
            EntityKind::Report | EntityKind::Custom => {
                if m.select_query.as_deref().unwrap_or("").trim().is_empty() {
                    tracing::warn!(module = %m.id, kind = %kind.as_str(), "module has no select_query");
                }
            }
            EntityKind::Group | EntityKind::Root => {}
        }
    }

    let by_id: HashMap<&str, &ModuleConfig> = modules.iter().map(|m| (m.id.as_str(), m)).collect();
    for m in modules {
        for c in &m.columns {
            let Some(target_id) = c.lookup_module_id.as_deref().filter(|s| !s.is_empty()) else {
                continue;
            };
            match by_id.get(target_id) {
                None => tracing::warn!(module = %m.id, column = %c.db_column_name, target = %target_id, "lookup target module not found"),
                Some(target) if !target.columns.iter().any(|tc| tc.is_primary_key) => {
                    tracing::warn!(module = %m.id, column = %c.db_column_name, target = %target_id, "lookup target has no primary key")
                }
                Some(_) => {}
            }
        }
        for sub in &m.sub_modules {
            if !by_id.contains_key(sub.target_module_id.as_str()) {
                tracing::warn!(module = %m.id, target = %sub.target_module_id, "submodule target module not found");
            }
        }
    }

    if let Some(cycle) = find_child_link_cycle(modules) {
        tracing::warn!(cycle = %cycle.join(" -> "), "cyclic child-link graph; expansion will stop at the depth limit");
    }
    Ok(())
}

/// First cycle in the submodule graph, as the module ids along it.
pub fn find_child_link_cycle(modules: &[ModuleConfig]) -> Option<Vec<String>> {
    let edges: HashMap<&str, Vec<&str>> = modules
        .iter()
        .map(|m| {
            (
                m.id.as_str(),
                m.sub_modules.iter().map(|s| s.target_module_id.as_str()).collect(),
            )
        })
        .collect();

    fn visit<'a>(
        node: &'a str,
        edges: &HashMap<&'a str, Vec<&'a str>>,
        path: &mut Vec<&'a str>,
        done: &mut HashSet<&'a str>,
    ) -> Option<Vec<String>> {
        if let Some(pos) = path.iter().position(|n| *n == node) {
            let mut cycle: Vec<String> = path[pos..].iter().map(|s| s.to_string()).collect();
            cycle.push(node.to_string());
            return Some(cycle);
        }
        if done.contains(node) {
            return None;
        }
        path.push(node);
        for &next in edges.get(node).map(|v| v.as_slice()).unwrap_or(&[]) {
            if let Some(c) = visit(next, edges, path, done) {
                return Some(c);
            }
        }
        path.pop();
        done.insert(node);
        None
    }

    let mut done = HashSet::new();
    for m in modules {
        let mut path = Vec::new();
        if let Some(c) = visit(m.id.as_str(), &edges, &mut path, &mut done) {
            return Some(c);
        }
    }
    None
}
