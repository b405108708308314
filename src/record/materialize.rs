//! Row materialization: raw driver cells to records.

use super::{FieldValue, Record, Scalar};
use serde_json::Value;
use sqlx::postgres::PgRow;

/// One fetched cell, before it becomes a record value.
#[derive(Clone, Debug, PartialEq)]
pub enum RawCell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(Value),
}

/// A fetched row: the column names the statement actually returned, and their cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawRow {
    pub columns: Vec<String>,
    pub cells: Vec<RawCell>,
}

impl RawRow {
    pub fn new(columns: Vec<String>, cells: Vec<RawCell>) -> Self {
        RawRow { columns, cells }
    }

    pub fn from_pg(row: &PgRow) -> Self {
        use sqlx::{Column, Row};
        let columns: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
        let cells = (0..columns.len()).map(|i| decode_cell(row, i)).collect();
        RawRow { columns, cells }
    }

    pub fn into_record(self) -> Record {
        materialize(&self.columns, self.cells)
    }
}

/// Pair names with cells by position. Byte cells become (lossy) UTF-8 text and
/// nulls stay as explicit nulls.
pub fn materialize(columns: &[String], cells: Vec<RawCell>) -> Record {
    let mut record = Record::new();
    for (name, cell) in columns.iter().zip(cells) {
        record.insert(name.clone(), cell_to_field(cell));
    }
    record
}

fn cell_to_field(cell: RawCell) -> FieldValue {
    match cell {
        RawCell::Null => FieldValue::Null,
        RawCell::Bool(b) => FieldValue::Scalar(Scalar::Bool(b)),
        RawCell::Int(n) => FieldValue::Scalar(Scalar::Int(n)),
        RawCell::Float(f) => FieldValue::Scalar(Scalar::Float(f)),
        RawCell::Text(s) => FieldValue::Scalar(Scalar::Text(s)),
        RawCell::Bytes(b) => FieldValue::Scalar(Scalar::Text(String::from_utf8_lossy(&b).into_owned())),
        RawCell::Json(Value::Null) => FieldValue::Null,
        RawCell::Json(v) => FieldValue::Scalar(Scalar::Json(v)),
    }
}

/// Decode by trying the Rust types PostgreSQL columns map to, most specific first.
fn decode_cell(row: &PgRow, idx: usize) -> RawCell {
    use sqlx::{Row, ValueRef};
    match row.try_get_raw(idx) {
        Ok(raw) if raw.is_null() => return RawCell::Null,
        Ok(_) => {}
        Err(_) => return RawCell::Null,
    }
    if let Ok(n) = row.try_get::<i16, _>(idx) {
        return RawCell::Int(n.into());
    }
    if let Ok(n) = row.try_get::<i32, _>(idx) {
        return RawCell::Int(n.into());
    }
    if let Ok(n) = row.try_get::<i64, _>(idx) {
        return RawCell::Int(n);
    }
    if let Ok(n) = row.try_get::<f32, _>(idx) {
        return RawCell::Float(n.into());
    }
    if let Ok(n) = row.try_get::<f64, _>(idx) {
        return RawCell::Float(n);
    }
    if let Ok(b) = row.try_get::<bool, _>(idx) {
        return RawCell::Bool(b);
    }
    if let Ok(u) = row.try_get::<uuid::Uuid, _>(idx) {
        return RawCell::Text(u.to_string());
    }
    if let Ok(d) = row.try_get::<chrono::DateTime<chrono::Utc>, _>(idx) {
        return RawCell::Text(d.to_rfc3339());
    }
    if let Ok(d) = row.try_get::<chrono::NaiveDateTime, _>(idx) {
        return RawCell::Text(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(d) = row.try_get::<chrono::NaiveDate, _>(idx) {
        return RawCell::Text(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(t) = row.try_get::<chrono::NaiveTime, _>(idx) {
        return RawCell::Text(t.format("%H:%M:%S%.f").to_string());
    }
    if let Ok(d) = row.try_get::<sqlx::types::BigDecimal, _>(idx) {
        return RawCell::Text(d.to_string());
    }
    if let Ok(s) = row.try_get::<String, _>(idx) {
        return RawCell::Text(s);
    }
    if let Ok(j) = row.try_get::<Value, _>(idx) {
        return RawCell::Json(j);
    }
    if let Ok(b) = row.try_get::<Vec<u8>, _>(idx) {
        return RawCell::Bytes(b);
    }
    tracing::debug!(column = idx, "undecodable column type, materialized as null");
    RawCell::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(ns: &[&str]) -> Vec<String> {
        ns.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn pairs_returned_names_positionally() {
        let rec = materialize(
            &names(&["total", "region"]),
            vec![RawCell::Float(12.5), RawCell::Text("north".into())],
        );
        assert_eq!(rec.get("total"), Some(&FieldValue::Scalar(Scalar::Float(12.5))));
        assert_eq!(rec.get("region"), Some(&FieldValue::Scalar(Scalar::Text("north".into()))));
        assert_eq!(rec.len(), 2);
    }

    #[test]
    fn bytes_become_text_and_nulls_are_kept() {
        let rec = materialize(
            &names(&["code", "note", "meta"]),
            vec![RawCell::Bytes(b"AB-1".to_vec()), RawCell::Null, RawCell::Json(Value::Null)],
        );
        assert_eq!(rec.get("code"), Some(&FieldValue::Scalar(Scalar::Text("AB-1".into()))));
        assert_eq!(rec.get("note"), Some(&FieldValue::Null));
        assert_eq!(rec.get("meta"), Some(&FieldValue::Null));
    }

    #[test]
    fn into_record_uses_row_columns() {
        let row = RawRow::new(names(&["id"]), vec![RawCell::Int(9)]);
        let rec = row.into_record();
        assert_eq!(rec.key_value("id"), Some(serde_json::json!(9)));
    }
}
