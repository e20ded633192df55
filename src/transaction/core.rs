//! Defines the core data models for consumption records.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::database_id::TransactionId;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

// ============================================================================
// MODELS
// ============================================================================

/// A recorded consumption, i.e. money spent on an item at a vendor.
///
/// Transactions are created by the store. To record a new one, build a
/// [NewTransaction] and insert it through the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction, assigned by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TransactionId>,
    /// When the transaction happened.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// What kind of spending this was, e.g. "Food".
    pub category: String,
    /// What was bought.
    pub item: String,
    /// Where it was bought.
    pub vendor: String,
    /// How much was spent.
    pub amount: f64,
    /// The account the money came out of.
    pub from_account: String,
    /// Who paid.
    pub paid_by: String,
    /// When the store recorded the transaction.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
}

/// A transaction that has not been saved yet.
///
/// Every text field must be non-empty and `amount` must be finite; the form
/// layer checks this before a `NewTransaction` is handed to the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub category: String,
    pub item: String,
    pub vendor: String,
    pub amount: f64,
    pub from_account: String,
    pub paid_by: String,
}
