//! Record handlers: list, read, create, update, delete for one module.

use crate::config::{EntityDescription, ValueType};
use crate::error::AppError;
use crate::response::{success_many, success_one, success_one_ok, WriteAck};
use crate::service::RecordService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
}

fn find_module<'a>(state: &'a AppState, module_id: &str) -> Result<&'a EntityDescription, AppError> {
    state
        .graph
        .get(module_id)
        .ok_or_else(|| AppError::NotFound(format!("module '{}'", module_id)))
}

/// Path ids are typed by the primary key column: integers and uuids are checked,
/// everything else passes through as text.
fn parse_key(entity: &EntityDescription, raw: &str) -> Result<Value, AppError> {
    let value_type = entity.primary_key().map(|pk| &pk.value_type);
    Ok(match value_type {
        Some(ValueType::Integer) => {
            let n: i64 = raw
                .parse()
                .map_err(|_| AppError::BadRequest(format!("invalid id '{}'", raw)))?;
            Value::Number(n.into())
        }
        Some(ValueType::Uuid) => {
            let u = uuid::Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("invalid uuid".into()))?;
            Value::String(u.to_string())
        }
        _ => Value::String(raw.to_string()),
    })
}

fn body_to_map(value: Value) -> Result<HashMap<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m.into_iter().collect()),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Path(module_id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let entity = find_module(&state, &module_id)?;
    let records = RecordService::list(
        state.db.as_ref(),
        &state.graph,
        entity,
        params.sort_by.as_deref(),
        params.sort_order.as_deref(),
    )
    .await?;
    Ok(success_many(records))
}

pub async fn read(
    State(state): State<AppState>,
    Path((module_id, record_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let entity = find_module(&state, &module_id)?;
    let key = parse_key(entity, &record_id)?;
    let record = RecordService::get(state.db.as_ref(), &state.graph, entity, &key).await?;
    Ok(success_one_ok(record))
}

pub async fn create(
    State(state): State<AppState>,
    Path(module_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let entity = find_module(&state, &module_id)?;
    let payload = body_to_map(body)?;
    let id = RecordService::create(state.db.as_ref(), entity, &payload).await?;
    Ok(success_one(WriteAck {
        id: Some(id),
        message: format!("{} record created", entity.name),
    }))
}

pub async fn update(
    State(state): State<AppState>,
    Path((module_id, record_id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let entity = find_module(&state, &module_id)?;
    let key = parse_key(entity, &record_id)?;
    let payload = body_to_map(body)?;
    RecordService::update(state.db.as_ref(), entity, &key, &payload).await?;
    Ok(success_one_ok(WriteAck {
        id: None,
        message: format!("{} record updated", entity.name),
    }))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((module_id, record_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let entity = find_module(&state, &module_id)?;
    let key = parse_key(entity, &record_id)?;
    RecordService::delete(state.db.as_ref(), entity, &key).await?;
    Ok(success_one_ok(WriteAck {
        id: None,
        message: format!("{} record deleted", entity.name),
    }))
}
