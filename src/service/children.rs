//! Child-set expansion: attach submodule rows under the parent record, recursively.

use crate::config::{EntityDescription, ModuleGraph};
use crate::error::ConfigError;
use crate::record::{FieldValue, RawRow, Record};
use crate::service::{expand_lookups, RowSource};
use crate::sql::select_children;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

/// Nesting limit for child links; deeper links are treated as a metadata cycle.
pub const MAX_CHILD_DEPTH: usize = 8;

type Expansion<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// For each child link of `entity`, fetch the rows of the target whose foreign key
/// equals `parent_key`, expand their lookups and their own child links, and store
/// them under the target module id. A failing link is logged and left out; the
/// other links are unaffected.
pub fn expand_children<'a>(
    db: &'a dyn RowSource,
    graph: &'a ModuleGraph,
    record: &'a mut Record,
    entity: &'a EntityDescription,
    parent_key: Value,
    depth: usize,
) -> Expansion<'a> {
    Box::pin(async move {
        if entity.child_links.is_empty() {
            return;
        }
        if depth >= MAX_CHILD_DEPTH {
            let err = ConfigError::CyclicChildLinks {
                module: entity.id.clone(),
                depth,
            };
            tracing::warn!(error = %err, "child expansion stopped");
            return;
        }
        for link in &entity.child_links {
            let Some(target) = graph.get(&link.target_entity_id) else {
                tracing::warn!(
                    module = %entity.id,
                    target = %link.target_entity_id,
                    "child module not found"
                );
                continue;
            };
            let stmt = match select_children(target, &link.foreign_key_column, &parent_key) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(module = %entity.id, target = %target.id, error = %e, "child link skipped");
                    continue;
                }
            };
            let rows = match db.fetch_all(&stmt).await {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::warn!(module = %entity.id, target = %target.id, error = %e, "child query failed");
                    continue;
                }
            };
            let mut children: Vec<Record> = rows.into_iter().map(RawRow::into_record).collect();
            expand_lookups(db, graph, &mut children, target).await;
            if let Some(pk) = target.primary_key() {
                for child in children.iter_mut() {
                    if let Some(key) = child.key_value(&pk.physical_name) {
                        expand_children(db, graph, child, target, key, depth + 1).await;
                    }
                }
            }
            record.insert(link.target_entity_id.clone(), FieldValue::Children(children));
        }
    })
}
