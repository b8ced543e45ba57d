//! Generic persistence over SQLite.
//!
//! One `Store` serves the whole process. Every operation validates its
//! inputs against the schema registry before any SQL is assembled, acquires
//! its own pooled session, and releases it on every exit path. Identifiers
//! are emitted only from the registry's canonical names; values always
//! travel through bind placeholders.

mod error;
mod filter;
mod schema;
mod value;

pub use error::StoreError;
pub use filter::{Filter, Op, OrderBy, Query};
pub use schema::{ColumnDef, ColumnType, Entity, SchemaRegistry, TableConstraint, TableSchema};
pub use value::SqlValue;

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

/// A decoded row: column name to JSON value.
pub type Record = serde_json::Map<String, Value>;

/// Handle over the SQLite pool and the schema registry.
///
/// Cloning is cheap; the registry is immutable after construction.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
    registry: Arc<SchemaRegistry>,
}

impl Store {
    /// Open the database at `path`, creating the file if missing, and attach
    /// the registry of persistable types.
    pub async fn connect(path: &Path, registry: SchemaRegistry) -> Result<Store, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(StoreError::Connection)?;

        info!(
            path = %path.display(),
            tables = registry.len(),
            "Database connected"
        );

        Ok(Store {
            pool,
            registry: Arc::new(registry),
        })
    }

    /// Create every registered table if absent. Safe to call repeatedly;
    /// existing structures are never dropped or altered.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for table in self.registry.tables() {
            sqlx::query(&table.create_table_sql())
                .execute(&self.pool)
                .await
                .map_err(StoreError::Schema)?;
            debug!(table = table.name(), "Ensured table");
        }
        Ok(())
    }

    /// Insert one record inside its own transaction, returning the generated
    /// row id.
    pub async fn insert<E: Entity>(&self, record: &E) -> Result<i64, StoreError> {
        let table = self.table::<E>()?;
        let values = record.values();

        let mut columns = Vec::new();
        for (column, _) in &values {
            let column = canonical(table, column)?;
            columns.push(format!("\"{column}\""));
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            table.name(),
            columns.join(", "),
            placeholders
        );

        // Dropping the guard on an early return rolls the transaction back.
        let mut tx = self.pool.begin().await.map_err(StoreError::Write)?;
        let mut query = sqlx::query(&sql);
        for (_, value) in &values {
            query = value.bind_to(query);
        }
        let result = query.execute(&mut *tx).await.map_err(StoreError::Write)?;
        tx.commit().await.map_err(StoreError::Write)?;

        let id = result.last_insert_rowid();
        debug!(table = table.name(), id, "Inserted record");
        Ok(id)
    }

    /// Run a validated select, returning plain column-to-value rows in the
    /// order the database yields them (insertion order when unordered).
    pub async fn select<E: Entity>(&self, query: Query) -> Result<Vec<Record>, StoreError> {
        let table = self.table::<E>()?;

        // Validate every referenced column before assembling SQL.
        let mut conditions = Vec::new();
        let mut bindings = Vec::new();
        for filter in &query.filters {
            let column = canonical(table, &filter.column)?;
            conditions.push(format!("\"{}\" {} ?", column, filter.op.sql()));
            bindings.push(filter.bind_value());
        }

        let mut sql = format!("SELECT {} FROM \"{}\"", column_list(table), table.name());
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        if let Some(order) = &query.order {
            let column = canonical(table, &order.column)?;
            let direction = if order.descending { "DESC" } else { "ASC" };
            sql.push_str(&format!(" ORDER BY \"{column}\" {direction}"));
        }

        let mut conn = self.pool.acquire().await.map_err(StoreError::query_fault)?;
        let mut prepared = sqlx::query(&sql);
        for value in &bindings {
            prepared = value.bind_to(prepared);
        }
        let rows = prepared
            .fetch_all(&mut *conn)
            .await
            .map_err(StoreError::query_fault)?;

        debug!(table = table.name(), rows = rows.len(), "Selected records");
        rows.iter().map(|row| decode_row(table, row)).collect()
    }

    /// Update every row matching the exact-equality `matches`, applying
    /// `changes`. Returns the number of rows affected; zero matches is not
    /// an error.
    pub async fn update<E: Entity>(
        &self,
        matches: &[(&str, SqlValue)],
        changes: &[(&str, SqlValue)],
    ) -> Result<u64, StoreError> {
        let table = self.table::<E>()?;
        if changes.is_empty() {
            return Err(StoreError::query(format!(
                "update on \"{}\" has no assignments",
                table.name()
            )));
        }

        let mut assignments = Vec::new();
        for (column, _) in changes {
            let column = canonical(table, column)?;
            assignments.push(format!("\"{column}\" = ?"));
        }
        let conditions = match_conditions(table, matches)?;

        let mut sql = format!(
            "UPDATE \"{}\" SET {}",
            table.name(),
            assignments.join(", ")
        );
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        let mut tx = self.pool.begin().await.map_err(StoreError::Write)?;
        let mut query = sqlx::query(&sql);
        for (_, value) in changes.iter().chain(matches.iter()) {
            query = value.bind_to(query);
        }
        let result = query.execute(&mut *tx).await.map_err(StoreError::Write)?;
        tx.commit().await.map_err(StoreError::Write)?;

        let affected = result.rows_affected();
        debug!(table = table.name(), affected, "Updated records");
        Ok(affected)
    }

    /// Delete every row matching the exact-equality `matches`. Returns the
    /// number of rows removed; zero matches is not an error.
    pub async fn delete<E: Entity>(&self, matches: &[(&str, SqlValue)]) -> Result<u64, StoreError> {
        let table = self.table::<E>()?;
        let conditions = match_conditions(table, matches)?;

        let mut sql = format!("DELETE FROM \"{}\"", table.name());
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        let mut tx = self.pool.begin().await.map_err(StoreError::Write)?;
        let mut query = sqlx::query(&sql);
        for (_, value) in matches {
            query = value.bind_to(query);
        }
        let result = query.execute(&mut *tx).await.map_err(StoreError::Write)?;
        tx.commit().await.map_err(StoreError::Write)?;

        let affected = result.rows_affected();
        debug!(table = table.name(), affected, "Deleted records");
        Ok(affected)
    }

    fn table<E: Entity>(&self) -> Result<&TableSchema, StoreError> {
        self.registry.table(E::TABLE).ok_or_else(|| {
            StoreError::query(format!("table \"{}\" is not registered", E::TABLE))
        })
    }
}

/// Resolve a caller-supplied column name to the schema's declared spelling,
/// failing fast when the attribute does not exist on the entity.
fn canonical(table: &TableSchema, column: &str) -> Result<&'static str, StoreError> {
    table.canonical_column(column).ok_or_else(|| {
        StoreError::query(format!(
            "unknown column \"{}\" on table \"{}\"",
            column,
            table.name()
        ))
    })
}

fn match_conditions(
    table: &TableSchema,
    matches: &[(&str, SqlValue)],
) -> Result<Vec<String>, StoreError> {
    let mut conditions = Vec::new();
    for (column, _) in matches {
        let column = canonical(table, column)?;
        conditions.push(format!("\"{column}\" = ?"));
    }
    Ok(conditions)
}

/// Explicit column list so decoded rows follow the declared schema order
/// even if the physical table has drifted.
fn column_list(table: &TableSchema) -> String {
    let quoted: Vec<String> = table
        .columns()
        .iter()
        .map(|c| format!("\"{}\"", c.name()))
        .collect();
    quoted.join(", ")
}

/// Decode one row into a column-to-JSON mapping using the declared types.
fn decode_row(table: &TableSchema, row: &SqliteRow) -> Result<Record, StoreError> {
    let mut record = Record::new();
    for column in table.columns() {
        let value = match column.ty() {
            ColumnType::Integer => row
                .try_get::<Option<i64>, _>(column.name())
                .map(|v| v.map(Value::from).unwrap_or(Value::Null)),
            ColumnType::Real => row
                .try_get::<Option<f64>, _>(column.name())
                .map(|v| v.map(Value::from).unwrap_or(Value::Null)),
            ColumnType::Text => row
                .try_get::<Option<String>, _>(column.name())
                .map(|v| v.map(Value::from).unwrap_or(Value::Null)),
        }
        .map_err(StoreError::query_fault)?;
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}
