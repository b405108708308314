//! Lookup expansion: replace raw foreign-key values with `{id, name}` of the referenced row.

use crate::config::{ColumnDescription, EntityDescription, LookupSpec, ModuleGraph};
use crate::record::{FieldValue, LookupRef, RawRow, Record, Scalar};
use crate::service::RowSource;
use crate::sql::select_lookup;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Column on `target` shown as the lookup name: the configured override, else a
/// string column named `name`, else the first string column that is not the key,
/// else the key itself.
pub fn display_column(target: &EntityDescription, pk: &ColumnDescription, spec: &LookupSpec) -> String {
    if let Some(d) = &spec.display_field_override {
        return d.clone();
    }
    if let Some(c) = target
        .columns
        .iter()
        .find(|c| c.physical_name == "name" && c.value_type.is_string())
    {
        return c.physical_name.clone();
    }
    target
        .columns
        .iter()
        .find(|c| c.value_type.is_string() && !c.is_primary_key)
        .unwrap_or(pk)
        .physical_name
        .clone()
}

/// Distinct non-null raw values of `field`, in first-seen order.
fn distinct_keys(records: &[Record], field: &str) -> Vec<Value> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for rec in records {
        if let Some(FieldValue::Scalar(s)) = rec.get(field) {
            if seen.insert(s.match_key()) {
                keys.push(s.to_json());
            }
        }
    }
    keys
}

/// Expand every lookup column of `entity` across `records`, one query per column.
/// A failed lookup query is logged and leaves that column's raw values in place
/// rather than nulling them, so the key stays visible to the client.
pub async fn expand_lookups(
    db: &dyn RowSource,
    graph: &ModuleGraph,
    records: &mut [Record],
    entity: &EntityDescription,
) {
    if records.is_empty() {
        return;
    }
    for (col, spec) in entity.lookup_columns() {
        let Some(target) = graph.get(&spec.target_entity_id) else {
            tracing::warn!(
                module = %entity.id,
                column = %col.physical_name,
                target = %spec.target_entity_id,
                "lookup target module not found"
            );
            continue;
        };
        let Some(pk) = target.primary_key() else {
            tracing::warn!(module = %entity.id, target = %target.id, "lookup target has no primary key");
            continue;
        };
        let keys = distinct_keys(records, &col.physical_name);
        if keys.is_empty() {
            continue;
        }
        let display = display_column(target, pk, spec);
        let stmt = match select_lookup(target, pk, &display, &keys) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(module = %entity.id, column = %col.physical_name, error = %e, "lookup skipped");
                continue;
            }
        };
        let rows = match db.fetch_all(&stmt).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(module = %entity.id, column = %col.physical_name, error = %e, "lookup query failed");
                continue;
            }
        };

        let mut names: HashMap<String, Option<Scalar>> = HashMap::with_capacity(rows.len());
        for row in rows.into_iter().map(RawRow::into_record) {
            if let Some(FieldValue::Scalar(id)) = row.get(&pk.physical_name) {
                let name = row.get(&display).and_then(FieldValue::as_scalar).cloned();
                names.insert(id.match_key(), name);
            }
        }

        for rec in records.iter_mut() {
            let Some(FieldValue::Scalar(raw)) = rec.get(&col.physical_name) else {
                continue;
            };
            let raw = raw.clone();
            let name = match names.get(&raw.match_key()) {
                Some(name) => name.clone(),
                None => Some(Scalar::Text(format!("ID: {}", raw))),
            };
            rec.insert(col.physical_name.clone(), FieldValue::Lookup(LookupRef { id: raw, name }));
        }
    }
}
