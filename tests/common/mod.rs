//! Shared fixtures: a scripted in-memory `RowSource` and a small sales module graph.

#![allow(dead_code)]

use module_rest::config::{resolve, ModuleConfig, ModuleGraph};
use module_rest::{RawCell, RawRow, RowSource, Statement};
use serde_json::json;
use std::sync::Mutex;

type Script = Box<dyn Fn(&Statement) -> Result<Vec<RawRow>, sqlx::Error> + Send + Sync>;

/// Records every statement and answers reads from a script keyed on the SQL text.
pub struct StubDb {
    script: Script,
    affected: u64,
    log: Mutex<Vec<Statement>>,
}

impl StubDb {
    pub fn new(script: impl Fn(&Statement) -> Result<Vec<RawRow>, sqlx::Error> + Send + Sync + 'static) -> Self {
        StubDb {
            script: Box::new(script),
            affected: 1,
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(|_| Ok(Vec::new()))
    }

    pub fn with_affected(mut self, n: u64) -> Self {
        self.affected = n;
        self
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.log.lock().unwrap().clone()
    }

    pub fn count_matching(&self, needle: &str) -> usize {
        self.statements().iter().filter(|s| s.sql.contains(needle)).count()
    }
}

#[async_trait::async_trait]
impl RowSource for StubDb {
    async fn fetch_all(&self, stmt: &Statement) -> Result<Vec<RawRow>, sqlx::Error> {
        self.log.lock().unwrap().push(stmt.clone());
        (self.script)(stmt)
    }

    async fn execute(&self, stmt: &Statement) -> Result<u64, sqlx::Error> {
        self.log.lock().unwrap().push(stmt.clone());
        Ok(self.affected)
    }
}

pub fn row(cells: Vec<(&str, RawCell)>) -> RawRow {
    let (columns, cells) = cells.into_iter().map(|(c, v)| (c.to_string(), v)).unzip();
    RawRow::new(columns, cells)
}

pub fn int(n: i64) -> RawCell {
    RawCell::Int(n)
}

pub fn text(s: &str) -> RawCell {
    RawCell::Text(s.to_string())
}

pub fn db_error() -> sqlx::Error {
    sqlx::Error::Protocol("connection reset".into())
}

pub fn sales_graph() -> ModuleGraph {
    let modules: Vec<ModuleConfig> = serde_json::from_value(json!([
        {
            "id": "root", "name": "Sales App", "type": "root",
            "groups": [{"target_group_id": "sales", "display_name": "Sales"}]
        },
        {
            "id": "sales", "name": "Sales", "type": "group",
            "sub_modules": [
                {"target_module_id": "customer", "child_foreign_key_field": "", "display_name": "Customers"},
                {"target_module_id": "invoice", "child_foreign_key_field": "", "display_name": "Invoices"}
            ]
        },
        {
            "id": "customer", "name": "Customers", "db_table_name": "customers", "display_field": "name",
            "columns": [
                {"name": "ID", "db_column_name": "id", "type": "integer", "is_primary_key": true, "is_editable": false},
                {"name": "Name", "db_column_name": "name", "type": "string", "validation": {"required": true}},
                {"name": "Secret", "db_column_name": "secret", "type": "string", "is_visible": false}
            ]
        },
        {
            "id": "product", "name": "Products", "db_table_name": "products",
            "columns": [
                {"name": "ID", "db_column_name": "id", "type": "integer", "is_primary_key": true},
                {"name": "Title", "db_column_name": "title", "type": "string"}
            ]
        },
        {
            "id": "invoice", "name": "Invoices", "db_table_name": "invoices",
            "columns": [
                {"name": "ID", "db_column_name": "id", "type": "integer", "is_primary_key": true, "is_editable": false},
                {"name": "Number", "db_column_name": "number", "type": "string"},
                {"name": "Customer", "db_column_name": "customer_id", "type": "lookup", "lookup_module_id": "customer"},
                {"name": "Total", "db_column_name": "total", "type": "decimal", "is_read_only": true},
                {"name": "Note", "db_column_name": "note", "type": "text"},
                {"name": "Status", "db_column_name": "status", "type": "string", "default_value": "open"}
            ],
            "sub_modules": [
                {"target_module_id": "invoice_item", "child_foreign_key_field": "invoice_id", "display_name": "Items"},
                {"target_module_id": "payment", "child_foreign_key_field": "invoice_id", "display_name": "Payments"},
                {"target_module_id": "ghost", "child_foreign_key_field": "invoice_id", "display_name": "Missing"}
            ]
        },
        {
            "id": "invoice_item", "name": "Invoice items", "db_table_name": "invoice_items",
            "columns": [
                {"name": "ID", "db_column_name": "id", "type": "integer", "is_primary_key": true},
                {"name": "Invoice", "db_column_name": "invoice_id", "type": "integer"},
                {"name": "Product", "db_column_name": "product_id", "type": "lookup", "lookup_module_id": "product"},
                {"name": "Qty", "db_column_name": "qty", "type": "integer"}
            ],
            "sub_modules": [
                {"target_module_id": "item_note", "child_foreign_key_field": "item_id", "display_name": "Notes"}
            ]
        },
        {
            "id": "item_note", "name": "Item notes", "db_table_name": "item_notes",
            "columns": [
                {"name": "ID", "db_column_name": "id", "type": "integer", "is_primary_key": true},
                {"name": "Item", "db_column_name": "item_id", "type": "integer"},
                {"name": "Body", "db_column_name": "body", "type": "text"}
            ]
        },
        {
            "id": "payment", "name": "Payments", "db_table_name": "payments",
            "columns": [
                {"name": "ID", "db_column_name": "id", "type": "integer", "is_primary_key": true},
                {"name": "Invoice", "db_column_name": "invoice_id", "type": "integer"},
                {"name": "Amount", "db_column_name": "amount", "type": "decimal"}
            ]
        },
        {
            "id": "node", "name": "Tree nodes", "db_table_name": "nodes",
            "columns": [
                {"name": "ID", "db_column_name": "id", "type": "integer", "is_primary_key": true},
                {"name": "Parent", "db_column_name": "parent_id", "type": "integer"},
                {"name": "Label", "db_column_name": "label", "type": "string"}
            ],
            "sub_modules": [
                {"target_module_id": "node", "child_foreign_key_field": "parent_id", "display_name": "Children"}
            ]
        },
        {
            "id": "sales_report", "name": "Sales by region", "type": "report",
            "select_query": "SELECT region, SUM(total) AS total FROM invoices GROUP BY region;",
            "columns": [
                {"name": "Region", "db_column_name": "region", "is_primary_key": true},
                {"name": "Total", "db_column_name": "total", "type": "decimal"}
            ],
            "sub_modules": [
                {"target_module_id": "invoice", "child_foreign_key_field": "region", "display_name": "Invoices"}
            ]
        }
    ]))
    .expect("fixture modules deserialize");
    resolve(&modules).expect("fixture modules resolve")
}
