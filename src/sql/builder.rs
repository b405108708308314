//! Builds parameterized SELECT, INSERT, UPDATE, DELETE from a resolved module.

use crate::config::{ColumnDescription, EntityDescription, ValueType};
use crate::error::{AppError, ConfigError};
use crate::sql::SortSpec;
use serde_json::Value;
use std::collections::HashMap;

/// Quote identifier for PostgreSQL (safe: only from metadata or an allow-listed sort column).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Quote each dot-separated part, so `sales.invoices` stays schema-qualified.
fn quoted_path(s: &str) -> String {
    s.split('.').map(quoted).collect::<Vec<_>>().join(".")
}

fn placeholder(n: u32, cast: Option<&str>) -> String {
    match cast {
        Some(t) => format!("${}::{}", n, t),
        None => format!("${}", n),
    }
}

/// SQL text plus its bound values, in placeholder order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    fn push_param(&mut self, v: Value) -> u32 {
        self.params.push(v);
        self.params.len() as u32
    }
}

fn table_name(entity: &EntityDescription) -> Result<String, ConfigError> {
    entity
        .table_name
        .as_deref()
        .map(quoted_path)
        .ok_or_else(|| ConfigError::NoTableName(entity.id.clone()))
}

fn primary_key(entity: &EntityDescription) -> Result<&ColumnDescription, ConfigError> {
    entity
        .primary_key()
        .ok_or_else(|| ConfigError::NoPrimaryKey(entity.id.clone()))
}

/// Visible columns, each aliased to its own name. Decimal columns are read as text
/// so they materialize without precision loss.
fn projection(entity: &EntityDescription) -> Result<String, ConfigError> {
    let cols: Vec<String> = entity
        .visible_columns()
        .map(|c| {
            let q = quoted(&c.physical_name);
            if c.value_type == ValueType::Decimal {
                format!("{}::text AS {}", q, q)
            } else {
                format!("{} AS {}", q, q)
            }
        })
        .collect();
    if cols.is_empty() {
        return Err(ConfigError::NoVisibleColumns(entity.id.clone()));
    }
    Ok(cols.join(", "))
}

fn report_statement(entity: &EntityDescription) -> Result<&str, ConfigError> {
    entity
        .select_statement
        .as_deref()
        .map(|s| s.trim().trim_end_matches(';').trim_end())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConfigError::NoSelectStatement {
            module: entity.id.clone(),
            kind: entity.kind.as_str().to_string(),
        })
}

fn order_clause(sort: &SortSpec) -> String {
    format!(" ORDER BY {} {}", quoted(&sort.column), sort.direction.as_sql())
}

/// SELECT for a list. Table modules project visible columns and fall back to the
/// display field for ordering; report modules use their statement as-is and only
/// get an ORDER BY when one is requested.
pub fn select(entity: &EntityDescription, sort: Option<&SortSpec>) -> Result<Statement, ConfigError> {
    let mut q = Statement::default();
    if entity.kind.is_report() {
        q.sql = report_statement(entity)?.to_string();
        if let Some(sort) = sort {
            q.sql.push_str(&order_clause(sort));
        }
        return Ok(q);
    }
    let cols = projection(entity)?;
    let table = table_name(entity)?;
    q.sql = format!("SELECT {} FROM {}", cols, table);
    match (sort, entity.display_field.as_deref()) {
        (Some(sort), _) => q.sql.push_str(&order_clause(sort)),
        (None, Some(display)) => q.sql.push_str(&format!(" ORDER BY {} ASC", quoted(display))),
        (None, None) => {}
    }
    Ok(q)
}

/// SELECT one row by primary key. Report modules filter their statement as a subquery.
pub fn select_by_key(entity: &EntityDescription, key: &Value) -> Result<Statement, ConfigError> {
    let mut q = Statement::default();
    let pk = primary_key(entity)?;
    let n = q.push_param(key.clone());
    let ph = placeholder(n, pk.bind_cast.as_deref());
    if entity.kind.is_report() {
        let base = report_statement(entity)?;
        q.sql = format!("SELECT * FROM ({}) AS report WHERE {} = {}", base, quoted(&pk.physical_name), ph);
        return Ok(q);
    }
    let cols = projection(entity)?;
    let table = table_name(entity)?;
    q.sql = format!("SELECT {} FROM {} WHERE {} = {}", cols, table, quoted(&pk.physical_name), ph);
    Ok(q)
}

/// INSERT of write-eligible columns present in the payload, or carrying a default,
/// in declared order. Returns the new primary key.
pub fn insert(entity: &EntityDescription, payload: &HashMap<String, Value>) -> Result<Statement, AppError> {
    let mut q = Statement::default();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in entity.columns.iter().filter(|c| c.is_write_eligible()) {
        let Some(val) = payload.get(&c.physical_name).or(c.default_value.as_ref()) else {
            continue;
        };
        let n = q.push_param(val.clone());
        cols.push(quoted(&c.physical_name));
        placeholders.push(placeholder(n, c.bind_cast.as_deref()));
    }
    if cols.is_empty() {
        return Err(AppError::Validation(format!(
            "no writable fields for module '{}'",
            entity.id
        )));
    }
    let pk = primary_key(entity)?;
    let table = table_name(entity)?;
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        table,
        cols.join(", "),
        placeholders.join(", "),
        quoted(&pk.physical_name)
    );
    Ok(q)
}

/// UPDATE by key: SET only write-eligible columns present in the payload; the key
/// is the last parameter.
pub fn update(
    entity: &EntityDescription,
    key: &Value,
    payload: &HashMap<String, Value>,
) -> Result<Statement, AppError> {
    let pk = primary_key(entity)?;
    let mut q = Statement::default();
    let mut sets = Vec::new();
    for c in entity.columns.iter().filter(|c| c.is_write_eligible()) {
        let Some(val) = payload.get(&c.physical_name) else {
            continue;
        };
        let n = q.push_param(val.clone());
        sets.push(format!("{} = {}", quoted(&c.physical_name), placeholder(n, c.bind_cast.as_deref())));
    }
    if sets.is_empty() {
        return Err(AppError::Validation(format!(
            "no writable fields for module '{}'",
            entity.id
        )));
    }
    let table = table_name(entity)?;
    let n = q.push_param(key.clone());
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        table,
        sets.join(", "),
        quoted(&pk.physical_name),
        placeholder(n, pk.bind_cast.as_deref())
    );
    Ok(q)
}

/// DELETE by key.
pub fn delete(entity: &EntityDescription, key: &Value) -> Result<Statement, ConfigError> {
    let pk = primary_key(entity)?;
    let table = table_name(entity)?;
    let mut q = Statement::default();
    let n = q.push_param(key.clone());
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {}",
        table,
        quoted(&pk.physical_name),
        placeholder(n, pk.bind_cast.as_deref())
    );
    Ok(q)
}

/// SELECT key and display column of `target` for a batch of keys: `WHERE pk IN (...)`.
pub fn select_lookup(
    target: &EntityDescription,
    pk: &ColumnDescription,
    display_column: &str,
    keys: &[Value],
) -> Result<Statement, ConfigError> {
    let table = table_name(target)?;
    let mut q = Statement::default();
    let placeholders: Vec<String> = keys
        .iter()
        .map(|k| {
            let n = q.push_param(k.clone());
            placeholder(n, pk.bind_cast.as_deref())
        })
        .collect();
    let mut cols = vec![format!("{} AS {}", quoted(&pk.physical_name), quoted(&pk.physical_name))];
    if display_column != pk.physical_name {
        cols.push(format!("{} AS {}", quoted(display_column), quoted(display_column)));
    }
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} IN ({})",
        cols.join(", "),
        table,
        quoted(&pk.physical_name),
        placeholders.join(", ")
    );
    Ok(q)
}

/// SELECT the visible columns of `target` rows whose `foreign_key` equals the parent key.
pub fn select_children(
    target: &EntityDescription,
    foreign_key: &str,
    parent_key: &Value,
) -> Result<Statement, ConfigError> {
    let cols = projection(target)?;
    let table = table_name(target)?;
    let cast = target.column(foreign_key).and_then(|c| c.bind_cast.as_deref());
    let mut q = Statement::default();
    let n = q.push_param(parent_key.clone());
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        cols,
        table,
        quoted(foreign_key),
        placeholder(n, cast)
    );
    Ok(q)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, ModuleConfig, ModuleGraph};
    use crate::sql::SortDirection;
    use serde_json::json;

    fn graph() -> ModuleGraph {
        let modules: Vec<ModuleConfig> = serde_json::from_value(json!([
            {
                "id": "customer", "name": "Customers", "db_table_name": "sales.customers", "display_field": "name",
                "columns": [
                    {"name": "ID", "db_column_name": "id", "type": "integer", "is_primary_key": true, "is_editable": false},
                    {"name": "Name", "db_column_name": "name", "type": "string"},
                    {"name": "Secret", "db_column_name": "secret", "type": "string", "is_visible": false},
                    {"name": "Balance", "db_column_name": "balance", "type": "decimal", "is_read_only": true},
                    {"name": "Status", "db_column_name": "status", "type": "string", "default_value": "active"},
                    {"name": "Created", "db_column_name": "created_at", "type": "datetime", "is_editable": false}
                ]
            },
            {
                "id": "sales_report", "name": "Sales", "type": "report",
                "select_query": "SELECT region, SUM(total) AS total FROM invoices GROUP BY region;",
                "columns": [
                    {"name": "Region", "db_column_name": "region", "is_primary_key": true},
                    {"name": "Total", "db_column_name": "total", "type": "decimal"}
                ]
            },
            {"id": "keyless", "name": "Keyless", "db_table_name": "log", "columns": [
                {"name": "Line", "db_column_name": "line"}
            ]},
            {"id": "hidden", "name": "Hidden", "db_table_name": "hidden", "columns": [
                {"name": "Id", "db_column_name": "id", "is_primary_key": true, "is_visible": false}
            ]}
        ]))
        .unwrap();
        resolve(&modules).unwrap()
    }

    fn payload(v: Value) -> HashMap<String, Value> {
        match v {
            Value::Object(m) => m.into_iter().collect(),
            _ => panic!("payload must be an object"),
        }
    }

    #[test]
    fn select_projects_visible_columns_with_display_order() {
        let g = graph();
        let q = select(g.get("customer").unwrap(), None).unwrap();
        assert_eq!(
            q.sql,
            "SELECT \"id\" AS \"id\", \"name\" AS \"name\", \"balance\"::text AS \"balance\", \
             \"status\" AS \"status\", \"created_at\" AS \"created_at\" \
             FROM \"sales\".\"customers\" ORDER BY \"name\" ASC"
        );
        assert!(q.params.is_empty());
    }

    #[test]
    fn requested_sort_overrides_display_field() {
        let g = graph();
        let sort = SortSpec { column: "id".into(), direction: SortDirection::Desc };
        let q = select(g.get("customer").unwrap(), Some(&sort)).unwrap();
        assert!(q.sql.ends_with("FROM \"sales\".\"customers\" ORDER BY \"id\" DESC"));
    }

    #[test]
    fn report_select_is_verbatim_plus_order() {
        let g = graph();
        let report = g.get("sales_report").unwrap();
        let plain = select(report, None).unwrap();
        assert_eq!(plain.sql, "SELECT region, SUM(total) AS total FROM invoices GROUP BY region");
        let sort = SortSpec { column: "total".into(), direction: SortDirection::Asc };
        let sorted = select(report, Some(&sort)).unwrap();
        assert_eq!(
            sorted.sql,
            "SELECT region, SUM(total) AS total FROM invoices GROUP BY region ORDER BY \"total\" ASC"
        );
    }

    #[test]
    fn missing_projection_or_statement_is_config_error() {
        let g = graph();
        assert!(matches!(select(g.get("hidden").unwrap(), None), Err(ConfigError::NoVisibleColumns(_))));
        let mut report = g.get("sales_report").unwrap().clone();
        report.select_statement = None;
        assert!(matches!(select(&report, None), Err(ConfigError::NoSelectStatement { .. })));
    }

    #[test]
    fn select_by_key_binds_one_param() {
        let g = graph();
        let q = select_by_key(g.get("customer").unwrap(), &json!(42)).unwrap();
        assert!(q.sql.ends_with("FROM \"sales\".\"customers\" WHERE \"id\" = $1::bigint"));
        assert_eq!(q.params, vec![json!(42)]);

        let r = select_by_key(g.get("sales_report").unwrap(), &json!("north")).unwrap();
        assert_eq!(
            r.sql,
            "SELECT * FROM (SELECT region, SUM(total) AS total FROM invoices GROUP BY region) AS report \
             WHERE \"region\" = $1::text"
        );
    }

    #[test]
    fn insert_uses_declared_order_and_defaults() {
        let g = graph();
        let q = insert(
            g.get("customer").unwrap(),
            &payload(json!({"status": "vip", "id": 99, "name": "Acme", "balance": 5, "unknown": 1})),
        )
        .unwrap();
        assert_eq!(
            q.sql,
            "INSERT INTO \"sales\".\"customers\" (\"name\", \"status\") \
             VALUES ($1::text, $2::text) RETURNING \"id\""
        );
        assert_eq!(q.params, vec![json!("Acme"), json!("vip")]);

        let defaults_only = insert(g.get("customer").unwrap(), &payload(json!({}))).unwrap();
        assert_eq!(defaults_only.params, vec![json!("active")]);
    }

    #[test]
    fn insert_errors() {
        let g = graph();
        let mut no_default = g.get("customer").unwrap().clone();
        for c in &mut no_default.columns {
            c.default_value = None;
        }
        assert!(matches!(
            insert(&no_default, &payload(json!({"id": 1, "balance": 3}))),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            insert(g.get("keyless").unwrap(), &payload(json!({"line": "x"}))),
            Err(AppError::Config(ConfigError::NoPrimaryKey(_)))
        ));
    }

    #[test]
    fn update_sets_then_key() {
        let g = graph();
        let q = update(
            g.get("customer").unwrap(),
            &json!(7),
            &payload(json!({"status": "closed", "name": "Acme Ltd", "created_at": "2020-01-01"})),
        )
        .unwrap();
        assert_eq!(
            q.sql,
            "UPDATE \"sales\".\"customers\" SET \"name\" = $1::text, \"status\" = $2::text WHERE \"id\" = $3::bigint"
        );
        assert_eq!(q.params, vec![json!("Acme Ltd"), json!("closed"), json!(7)]);
    }

    #[test]
    fn update_ignores_defaults_and_rejects_empty() {
        let g = graph();
        assert!(matches!(
            update(g.get("customer").unwrap(), &json!(7), &payload(json!({"id": 8, "balance": 1}))),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            update(g.get("keyless").unwrap(), &json!(7), &payload(json!({"line": "x"}))),
            Err(AppError::Config(ConfigError::NoPrimaryKey(_)))
        ));
    }

    #[test]
    fn delete_by_key() {
        let g = graph();
        let q = delete(g.get("customer").unwrap(), &json!(3)).unwrap();
        assert_eq!(q.sql, "DELETE FROM \"sales\".\"customers\" WHERE \"id\" = $1::bigint");
        assert_eq!(q.params, vec![json!(3)]);
    }

    #[test]
    fn lookup_batches_keys() {
        let g = graph();
        let target = g.get("customer").unwrap();
        let pk = target.primary_key().unwrap();
        let q = select_lookup(target, pk, "name", &[json!(1), json!(2), json!(3)]).unwrap();
        assert_eq!(
            q.sql,
            "SELECT \"id\" AS \"id\", \"name\" AS \"name\" FROM \"sales\".\"customers\" \
             WHERE \"id\" IN ($1::bigint, $2::bigint, $3::bigint)"
        );
        let only_pk = select_lookup(target, pk, "id", &[json!(1)]).unwrap();
        assert_eq!(
            only_pk.sql,
            "SELECT \"id\" AS \"id\" FROM \"sales\".\"customers\" WHERE \"id\" IN ($1::bigint)"
        );
    }

    #[test]
    fn identifiers_are_escaped() {
        assert_eq!(quoted("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quoted_path("a.b"), "\"a\".\"b\"");
    }
}
