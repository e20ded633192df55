//! A [RemoteStore] backed by a local SQLite database.
//!
//! Mirrors the schema of the hosted backend so the application can run
//! against a file on disk during development and against an in-memory
//! database in tests.

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use rusqlite::{
    Connection, Row as SqlRow, params_from_iter, types::Value as SqlValue, types::ValueRef,
};
use serde_json::{Number, Value};

use crate::database_id::DatabaseId;

use super::{Collection, FilterOp, Query, RemoteStore, Row, StoreError};

const TRANSACTION_COLUMNS: &[&str] = &[
    "id",
    "date",
    "category",
    "item",
    "vendor",
    "amount",
    "from_account",
    "paid_by",
    "created_at",
];

const LOOKUP_COLUMNS: &[&str] = &["id", "name"];

fn columns(collection: Collection) -> &'static [&'static str] {
    match collection {
        Collection::Transactions => TRANSACTION_COLUMNS,
        Collection::Categories | Collection::Accounts | Collection::Payers => LOOKUP_COLUMNS,
    }
}

fn check_column(collection: Collection, column: &str) -> Result<(), StoreError> {
    if columns(collection).contains(&column) {
        Ok(())
    } else {
        Err(StoreError::Request(format!(
            "column \"{column}\" does not exist on {collection}"
        )))
    }
}

/// Stores the collections in SQLite tables of the same name.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Wrap `connection`, creating the tables if they do not exist.
    ///
    /// # Errors
    /// Returns an error if the tables cannot be created.
    pub fn new(connection: Connection) -> Result<Self, rusqlite::Error> {
        create_tables(&connection)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or initialized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, rusqlite::Error> {
        Self::new(Connection::open(path)?)
    }

    /// Create a store backed by a fresh in-memory database.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Self::new(Connection::open_in_memory()?)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            StoreError::Request("could not acquire the database lock".to_owned())
        })
    }
}

/// Create the tables for all collections.
///
/// # Errors
/// Returns an error if a table cannot be created.
pub fn create_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                category TEXT NOT NULL,
                item TEXT NOT NULL,
                vendor TEXT NOT NULL,
                amount REAL NOT NULL,
                from_account TEXT NOT NULL,
                paid_by TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);",
        (),
    )?;

    for table in ["categories", "accounts", "payers"] {
        connection.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE
                    )"
            ),
            (),
        )?;
    }

    Ok(())
}

fn sql_error(error: rusqlite::Error) -> StoreError {
    tracing::error!("SQL error: {error}");
    StoreError::Request(error.to_string())
}

fn map_row(row: &SqlRow, columns: &[&str]) -> Result<Row, rusqlite::Error> {
    let mut map = Row::new();

    for (index, column) in columns.iter().enumerate() {
        let value = match row.get_ref(index)? {
            ValueRef::Null | ValueRef::Blob(_) => Value::Null,
            ValueRef::Integer(integer) => Value::from(integer),
            ValueRef::Real(real) => Number::from_f64(real).map_or(Value::Null, Value::Number),
            ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
        };
        map.insert((*column).to_owned(), value);
    }

    Ok(map)
}

fn to_sql_value(column: &str, value: &Value) -> Result<SqlValue, StoreError> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(boolean) => Ok(SqlValue::Integer(i64::from(*boolean))),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => Ok(SqlValue::Integer(integer)),
            None => number
                .as_f64()
                .map(SqlValue::Real)
                .ok_or_else(|| StoreError::Request(format!("invalid number for \"{column}\""))),
        },
        Value::String(text) => Ok(SqlValue::Text(text.clone())),
        Value::Array(_) | Value::Object(_) => Err(StoreError::Request(format!(
            "unsupported value for \"{column}\""
        ))),
    }
}

#[async_trait]
impl RemoteStore for SqliteStore {
    async fn select(&self, collection: Collection, query: &Query) -> Result<Vec<Row>, StoreError> {
        let columns = columns(collection);
        let mut sql = format!("SELECT {} FROM {collection}", columns.join(", "));
        let mut params = Vec::with_capacity(query.filters.len());

        for (index, filter) in query.filters.iter().enumerate() {
            check_column(collection, filter.column)?;
            let op = match filter.op {
                FilterOp::Gte => ">=",
                FilterOp::Lte => "<=",
                FilterOp::Eq => "=",
            };
            let keyword = if index == 0 { "WHERE" } else { "AND" };
            sql.push_str(&format!(" {keyword} {} {op} ?{}", filter.column, index + 1));
            params.push(filter.value.clone());
        }

        if let Some(order) = query.order {
            check_column(collection, order.column)?;
            let direction = if order.descending { "DESC" } else { "ASC" };
            // Ties keep insertion order, in the requested direction.
            sql.push_str(&format!(
                " ORDER BY {} {direction}, rowid {direction}",
                order.column
            ));
        }

        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let connection = self.lock()?;
        let mut statement = connection.prepare(&sql).map_err(sql_error)?;

        statement
            .query_map(params_from_iter(params.iter()), |row| map_row(row, columns))
            .map_err(sql_error)?
            .map(|row| row.map_err(sql_error))
            .collect()
    }

    async fn insert(
        &self,
        collection: Collection,
        rows: Vec<Row>,
    ) -> Result<Vec<Row>, StoreError> {
        let columns = columns(collection);
        let mut connection = self.lock()?;
        let transaction = connection.transaction().map_err(sql_error)?;
        let mut inserted = Vec::with_capacity(rows.len());

        for row in &rows {
            if row.is_empty() {
                return Err(StoreError::Request(format!(
                    "cannot insert an empty row into {collection}"
                )));
            }

            let mut names = Vec::with_capacity(row.len());
            let mut values = Vec::with_capacity(row.len());
            for (column, value) in row {
                check_column(collection, column)?;
                names.push(column.as_str());
                values.push(to_sql_value(column, value)?);
            }

            let placeholders = (1..=values.len())
                .map(|index| format!("?{index}"))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "INSERT INTO {collection} ({}) VALUES ({placeholders}) RETURNING {}",
                names.join(", "),
                columns.join(", ")
            );

            let stored = transaction
                .prepare(&sql)
                .map_err(sql_error)?
                .query_row(params_from_iter(values.iter()), |row| map_row(row, columns))
                .map_err(sql_error)?;
            inserted.push(stored);
        }

        transaction.commit().map_err(sql_error)?;

        Ok(inserted)
    }

    async fn delete(&self, collection: Collection, id: DatabaseId) -> Result<(), StoreError> {
        let connection = self.lock()?;

        connection
            .execute(
                &format!("DELETE FROM {collection} WHERE id = :id"),
                &[(":id", &id)],
            )
            .map_err(sql_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::store::{Collection, Filter, Order, Query, RemoteStore, Row, StoreError};

    use super::SqliteStore;

    fn row(value: Value) -> Row {
        value.as_object().expect("test rows are objects").clone()
    }

    fn transaction_row(date: &str, category: &str, amount: f64) -> Row {
        row(json!({
            "date": date,
            "category": category,
            "item": "Item",
            "vendor": "Vendor",
            "amount": amount,
            "from_account": "Checking",
            "paid_by": "Alice",
        }))
    }

    #[tokio::test]
    async fn insert_assigns_id_and_created_at() {
        let store = SqliteStore::open_in_memory().unwrap();

        let rows = store
            .insert(
                Collection::Transactions,
                vec![transaction_row("2024-01-15", "Food", 4.5)],
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], 1);
        assert_eq!(rows[0]["amount"], 4.5);
        assert!(rows[0]["created_at"].is_string());
    }

    #[tokio::test]
    async fn select_applies_filters_and_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert(
                Collection::Transactions,
                vec![
                    transaction_row("2023-12-31", "Food", 1.0),
                    transaction_row("2024-01-01", "Food", 2.0),
                    transaction_row("2024-01-20", "Rent", 3.0),
                    transaction_row("2024-01-31", "Food", 4.0),
                    transaction_row("2024-02-01", "Food", 5.0),
                ],
            )
            .await
            .unwrap();

        let rows = store
            .select(
                Collection::Transactions,
                &Query::default()
                    .filter(Filter::gte("date", "2024-01-01"))
                    .filter(Filter::lte("date", "2024-01-31"))
                    .filter(Filter::eq("category", "Food"))
                    .order(Order::descending("date")),
            )
            .await
            .unwrap();

        let dates = rows
            .iter()
            .map(|row| row["date"].as_str().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(dates, ["2024-01-31", "2024-01-01"]);
    }

    #[tokio::test]
    async fn ties_keep_insertion_order_in_requested_direction() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert(
                Collection::Transactions,
                vec![
                    transaction_row("2024-01-01", "A", 1.0),
                    transaction_row("2024-01-01", "B", 2.0),
                    transaction_row("2024-01-01", "C", 3.0),
                ],
            )
            .await
            .unwrap();

        let rows = store
            .select(
                Collection::Transactions,
                &Query::default().order(Order::descending("date")).limit(2),
            )
            .await
            .unwrap();

        let categories = rows
            .iter()
            .map(|row| row["category"].as_str().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(categories, ["C", "B"]);
    }

    #[tokio::test]
    async fn unknown_column_is_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();

        let result = store
            .select(
                Collection::Categories,
                &Query::default().filter(Filter::eq("colour", "red")),
            )
            .await;

        assert!(matches!(result, Err(StoreError::Request(_))));
    }

    #[tokio::test]
    async fn duplicate_lookup_name_is_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert(Collection::Payers, vec![row(json!({ "name": "Alice" }))])
            .await
            .unwrap();

        let result = store
            .insert(Collection::Payers, vec![row(json!({ "name": "Alice" }))])
            .await;

        assert!(matches!(result, Err(StoreError::Request(_))));
        let payers = store
            .select(Collection::Payers, &Query::default())
            .await
            .unwrap();
        assert_eq!(payers.len(), 1);
    }

    #[tokio::test]
    async fn failed_batch_inserts_nothing() {
        let store = SqliteStore::open_in_memory().unwrap();

        let result = store
            .insert(
                Collection::Accounts,
                vec![row(json!({ "name": "Savings" })), row(json!({ "name": "Savings" }))],
            )
            .await;

        assert!(result.is_err());
        let accounts = store
            .select(Collection::Accounts, &Query::default())
            .await
            .unwrap();
        assert!(accounts.is_empty());
    }

    #[tokio::test]
    async fn delete_removes_only_matching_row() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert(
                Collection::Transactions,
                vec![
                    transaction_row("2024-01-01", "A", 1.0),
                    transaction_row("2024-01-02", "B", 2.0),
                ],
            )
            .await
            .unwrap();

        store.delete(Collection::Transactions, 1).await.unwrap();
        store.delete(Collection::Transactions, 42).await.unwrap();

        let rows = store
            .select(Collection::Transactions, &Query::default())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], 2);
    }
}
