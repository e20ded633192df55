//! The contract for talking to the relational backend that holds the
//! consumption records, and its implementations.
//!
//! The backend is treated as a remote service: every call may fail with a
//! [StoreError], and callers must be able to tell a backend that could not be
//! reached apart from one that rejected the request.

mod rest;
mod sqlite;

use std::fmt::Display;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::database_id::DatabaseId;

pub use rest::RestStore;
pub use sqlite::SqliteStore;

/// A single record as exchanged with the backend: a JSON object keyed by
/// column name.
pub type Row = Map<String, Value>;

/// The collections (tables) the application reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Consumption records.
    Transactions,
    /// Distinct category names.
    Categories,
    /// Distinct funding account names.
    Accounts,
    /// Distinct payer names.
    Payers,
}

impl Collection {
    /// The name of the collection on the backend.
    pub fn name(self) -> &'static str {
        match self {
            Collection::Transactions => "transactions",
            Collection::Categories => "categories",
            Collection::Accounts => "accounts",
            Collection::Payers => "payers",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The comparison applied by a [Filter].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Greater than or equal to.
    Gte,
    /// Less than or equal to.
    Lte,
    /// Exact match.
    Eq,
}

/// A condition on a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: &'static str,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    pub fn gte(column: &'static str, value: impl Into<String>) -> Self {
        Self {
            column,
            op: FilterOp::Gte,
            value: value.into(),
        }
    }

    pub fn lte(column: &'static str, value: impl Into<String>) -> Self {
        Self {
            column,
            op: FilterOp::Lte,
            value: value.into(),
        }
    }

    pub fn eq(column: &'static str, value: impl Into<String>) -> Self {
        Self {
            column,
            op: FilterOp::Eq,
            value: value.into(),
        }
    }
}

/// The ordering of the rows returned by a select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub descending: bool,
}

impl Order {
    pub fn ascending(column: &'static str) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub fn descending(column: &'static str) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

/// Describes which rows a select should return.
///
/// All filters must match (logical AND). The default query returns every row
/// in backend order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// The ways a call to the backend can fail.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// The backend could not be reached, e.g. the host is unreachable, the
    /// request timed out or the hosted project is paused.
    #[error("could not reach the store: {0}")]
    Network(String),

    /// The backend was reached but rejected the request, e.g. a bad filter,
    /// a constraint violation or a rejected access key.
    #[error("the store rejected the request: {0}")]
    Request(String),
}

/// A client for the relational backend.
///
/// Implementations must be safe to share between request handlers.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the rows of `collection` matching `query`.
    async fn select(&self, collection: Collection, query: &Query) -> Result<Vec<Row>, StoreError>;

    /// Insert `rows` into `collection` and return them as stored, including
    /// server-assigned columns such as `id` and `created_at`.
    async fn insert(&self, collection: Collection, rows: Vec<Row>)
    -> Result<Vec<Row>, StoreError>;

    /// Delete the row of `collection` with the given `id`.
    ///
    /// Deleting an `id` that does not exist is not an error.
    async fn delete(&self, collection: Collection, id: DatabaseId) -> Result<(), StoreError>;
}
