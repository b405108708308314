//! Statement execution seam between the record engine and the database.

use crate::record::RawRow;
use crate::sql::{PgBindValue, Statement};
use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgPool, Postgres};

/// Runs built statements. `PgPool` is the production implementation; tests
/// substitute an in-memory source.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Rows with the column names the statement actually returned.
    async fn fetch_all(&self, stmt: &Statement) -> Result<Vec<RawRow>, sqlx::Error>;

    /// Rows affected.
    async fn execute(&self, stmt: &Statement) -> Result<u64, sqlx::Error>;
}

fn bind_all(stmt: &Statement) -> Query<'_, Postgres, PgArguments> {
    let mut query = sqlx::query(&stmt.sql);
    for p in &stmt.params {
        query = query.bind(PgBindValue::from_json(p));
    }
    query
}

#[async_trait]
impl RowSource for PgPool {
    async fn fetch_all(&self, stmt: &Statement) -> Result<Vec<RawRow>, sqlx::Error> {
        tracing::debug!(sql = %stmt.sql, params = ?stmt.params, "query");
        let rows = bind_all(stmt).fetch_all(self).await?;
        Ok(rows.iter().map(RawRow::from_pg).collect())
    }

    async fn execute(&self, stmt: &Statement) -> Result<u64, sqlx::Error> {
        tracing::debug!(sql = %stmt.sql, params = ?stmt.params, "execute");
        let done = bind_all(stmt).execute(self).await?;
        Ok(done.rows_affected())
    }
}
