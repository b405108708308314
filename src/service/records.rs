//! Record access: build, execute, materialize and expand, per module kind.

use crate::config::{EntityDescription, EntityKind, ModuleGraph};
use crate::error::AppError;
use crate::record::{RawRow, Record};
use crate::service::{expand_children, expand_lookups, RequestValidator, RowSource};
use crate::sql::{self, SortSpec};
use serde_json::Value;
use std::collections::HashMap;

pub struct RecordService;

impl RecordService {
    /// All rows of a module. Table modules get their lookups expanded and each row's
    /// child sets attached; report and custom modules return their statement's rows as-is.
    pub async fn list(
        db: &dyn RowSource,
        graph: &ModuleGraph,
        entity: &EntityDescription,
        sort_by: Option<&str>,
        sort_order: Option<&str>,
    ) -> Result<Vec<Record>, AppError> {
        ensure_readable(entity)?;
        let sort = SortSpec::from_request(entity, sort_by, sort_order)?;
        let stmt = sql::select(entity, sort.as_ref())?;
        let mut records = Self::fetch(db, entity, &stmt).await?;
        if entity.kind.is_report() {
            return Ok(records);
        }
        expand_lookups(db, graph, &mut records, entity).await;
        if let Some(pk) = entity.primary_key().filter(|_| !entity.child_links.is_empty()) {
            for rec in records.iter_mut() {
                if let Some(key) = rec.key_value(&pk.physical_name) {
                    expand_children(db, graph, rec, entity, key, 0).await;
                }
            }
        }
        Ok(records)
    }

    /// One row by primary key, with lookups and child sets expanded for table modules.
    pub async fn get(
        db: &dyn RowSource,
        graph: &ModuleGraph,
        entity: &EntityDescription,
        key: &Value,
    ) -> Result<Record, AppError> {
        ensure_readable(entity)?;
        let stmt = sql::select_by_key(entity, key)?;
        let mut records = Self::fetch(db, entity, &stmt).await?;
        if records.is_empty() {
            return Err(not_found(entity, key));
        }
        records.truncate(1);
        if !entity.kind.is_report() {
            expand_lookups(db, graph, &mut records, entity).await;
        }
        let mut record = records.remove(0);
        if !entity.kind.is_report() {
            let parent_key = entity
                .primary_key()
                .and_then(|pk| record.key_value(&pk.physical_name))
                .unwrap_or_else(|| key.clone());
            expand_children(db, graph, &mut record, entity, parent_key, 0).await;
        }
        Ok(record)
    }

    /// Insert one row. Returns the new primary key value.
    pub async fn create(
        db: &dyn RowSource,
        entity: &EntityDescription,
        payload: &HashMap<String, Value>,
    ) -> Result<Value, AppError> {
        ensure_writable(entity)?;
        RequestValidator::validate(entity, payload)?;
        let stmt = sql::insert(entity, payload)?;
        let rows = db
            .fetch_all(&stmt)
            .await
            .map_err(|e| AppError::execution(&entity.id, e))?;
        let key = rows
            .into_iter()
            .next()
            .and_then(|row| {
                let column = row.columns.first().cloned()?;
                row.into_record().key_value(&column)
            })
            .unwrap_or(Value::Null);
        tracing::info!(module = %entity.id, key = %key, "record created");
        Ok(key)
    }

    /// Update one row by key with the payload's write-eligible fields.
    pub async fn update(
        db: &dyn RowSource,
        entity: &EntityDescription,
        key: &Value,
        payload: &HashMap<String, Value>,
    ) -> Result<(), AppError> {
        ensure_writable(entity)?;
        RequestValidator::validate_partial(entity, payload)?;
        let stmt = sql::update(entity, key, payload)?;
        let affected = db
            .execute(&stmt)
            .await
            .map_err(|e| AppError::execution(&entity.id, e))?;
        if affected == 0 {
            return Err(not_found(entity, key));
        }
        tracing::info!(module = %entity.id, key = %key, "record updated");
        Ok(())
    }

    /// Delete one row by key.
    pub async fn delete(db: &dyn RowSource, entity: &EntityDescription, key: &Value) -> Result<(), AppError> {
        ensure_writable(entity)?;
        let stmt = sql::delete(entity, key)?;
        let affected = db
            .execute(&stmt)
            .await
            .map_err(|e| AppError::execution(&entity.id, e))?;
        if affected == 0 {
            return Err(not_found(entity, key));
        }
        tracing::info!(module = %entity.id, key = %key, "record deleted");
        Ok(())
    }

    async fn fetch(
        db: &dyn RowSource,
        entity: &EntityDescription,
        stmt: &sql::Statement,
    ) -> Result<Vec<Record>, AppError> {
        let rows = db
            .fetch_all(stmt)
            .await
            .map_err(|e| AppError::execution(&entity.id, e))?;
        Ok(rows.into_iter().map(RawRow::into_record).collect())
    }
}

fn not_found(entity: &EntityDescription, key: &Value) -> AppError {
    AppError::NotFound(format!("record {} in module '{}'", key, entity.id))
}

fn ensure_readable(entity: &EntityDescription) -> Result<(), AppError> {
    match entity.kind {
        EntityKind::Group | EntityKind::Root => Err(AppError::BadRequest(format!(
            "module '{}' is a navigation {} and has no records",
            entity.id,
            entity.kind.as_str()
        ))),
        _ => Ok(()),
    }
}

fn ensure_writable(entity: &EntityDescription) -> Result<(), AppError> {
    if entity.kind != EntityKind::Table {
        return Err(AppError::BadRequest(format!(
            "module '{}' of type '{}' is read-only",
            entity.id,
            entity.kind.as_str()
        )));
    }
    Ok(())
}
