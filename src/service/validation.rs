//! Request validation from column types and config rules.

use crate::config::{ColumnDescription, EntityDescription, ValidationRule, ValueType};
use crate::error::AppError;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a create body. Required columns must be present and non-null unless
    /// they carry a default.
    pub fn validate(entity: &EntityDescription, body: &HashMap<String, Value>) -> Result<(), AppError> {
        for col in entity.columns.iter().filter(|c| c.is_write_eligible()) {
            let val = body.get(&col.physical_name);
            let required = col.validation.as_ref().and_then(|r| r.required) == Some(true);
            if required && col.default_value.is_none() && val.map_or(true, Value::is_null) {
                return Err(AppError::Validation(format!("{} is required", col.physical_name)));
            }
            if let Some(v) = val {
                validate_field(col, v)?;
            }
        }
        Ok(())
    }

    /// Validate only the fields present in body (for updates). A required column may
    /// be omitted but not set to null.
    pub fn validate_partial(entity: &EntityDescription, body: &HashMap<String, Value>) -> Result<(), AppError> {
        for (name, v) in body {
            let Some(col) = entity.column(name).filter(|c| c.is_write_eligible()) else {
                continue;
            };
            let required = col.validation.as_ref().and_then(|r| r.required) == Some(true);
            if required && v.is_null() {
                return Err(AppError::Validation(format!("{} cannot be null", name)));
            }
            validate_field(col, v)?;
        }
        Ok(())
    }
}

fn validate_field(col: &ColumnDescription, v: &Value) -> Result<(), AppError> {
    if v.is_null() {
        return Ok(());
    }
    validate_type(col, v)?;
    match &col.validation {
        Some(rule) => validate_rule(&col.physical_name, v, rule),
        None => Ok(()),
    }
}

fn type_error(col: &ColumnDescription, expected: &str) -> AppError {
    AppError::Validation(format!("{} must be {}", col.physical_name, expected))
}

/// Values arrive as JSON; numbers may also come as numeric strings from form posts.
fn validate_type(col: &ColumnDescription, v: &Value) -> Result<(), AppError> {
    let s = v.as_str().map(str::trim);
    match col.value_type {
        ValueType::Integer => {
            let ok = v.as_i64().is_some() || s.is_some_and(|s| s.parse::<i64>().is_ok());
            if !ok {
                return Err(type_error(col, "an integer"));
            }
        }
        ValueType::Number | ValueType::Decimal => {
            let ok = v.is_number() || s.is_some_and(|s| s.parse::<f64>().is_ok());
            if !ok {
                return Err(type_error(col, "a number"));
            }
        }
        ValueType::Boolean => {
            if !v.is_boolean() {
                return Err(type_error(col, "true or false"));
            }
        }
        ValueType::Date => {
            let ok = s.is_some_and(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok());
            if !ok {
                return Err(type_error(col, "a date (YYYY-MM-DD)"));
            }
        }
        ValueType::DateTime => {
            let ok = s.is_some_and(|s| {
                chrono::DateTime::parse_from_rfc3339(s).is_ok()
                    || chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
                    || chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").is_ok()
            });
            if !ok {
                return Err(type_error(col, "a timestamp"));
            }
        }
        ValueType::Uuid => {
            if !s.is_some_and(|s| uuid::Uuid::parse_str(s).is_ok()) {
                return Err(type_error(col, "a valid UUID"));
            }
        }
        ValueType::String | ValueType::Text => {
            if v.is_object() || v.is_array() {
                return Err(type_error(col, "text"));
            }
        }
        ValueType::Json | ValueType::Lookup | ValueType::Other(_) => {}
    }
    Ok(())
}

fn validate_rule(col: &str, v: &Value, rule: &ValidationRule) -> Result<(), AppError> {
    if let Some(max) = rule.max_length {
        if let Some(s) = v.as_str() {
            if s.chars().count() > max as usize {
                return Err(AppError::Validation(format!(
                    "{} must be at most {} characters",
                    col, max
                )));
            }
        }
    }
    if let Some(min) = rule.min_length {
        if let Some(s) = v.as_str() {
            if s.chars().count() < min as usize {
                return Err(AppError::Validation(format!(
                    "{} must be at least {} characters",
                    col, min
                )));
            }
        }
    }
    if let Some(ref pattern) = rule.pattern {
        let re = Regex::new(pattern).map_err(|_| AppError::Validation(format!("invalid pattern for {}", col)))?;
        if let Some(s) = v.as_str() {
            if !re.is_match(s) {
                return Err(AppError::Validation(format!("{} does not match required pattern", col)));
            }
        }
    }
    if let Some(ref allowed) = rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            return Err(AppError::Validation(format!(
                "{} must be one of: {:?}",
                col,
                allowed.iter().take(5).collect::<Vec<_>>()
            )));
        }
    }
    let n = v.as_f64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()));
    if let (Some(min), Some(n)) = (rule.minimum, n) {
        if n < min {
            return Err(AppError::Validation(format!("{} must be at least {}", col, min)));
        }
    }
    if let (Some(max), Some(n)) = (rule.maximum, n) {
        if n > max {
            return Err(AppError::Validation(format!("{} must be at most {}", col, max)));
        }
    }
    Ok(())
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(s), Value::String(t)) => s == t,
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}
