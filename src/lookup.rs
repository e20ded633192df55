//! Lookup collections: the distinct categories, accounts and payers that have
//! been used on transactions, offered as suggestions on the entry form.

use serde::{Deserialize, Serialize};

use crate::{database_id::DatabaseId, store::Collection, transaction::NewTransaction};

/// A distinct value previously used for one of the lookup fields.
///
/// Names are unique within their collection. Items are created the first time
/// a value is submitted and are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DatabaseId>,
    pub name: String,
}

impl LookupItem {
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_owned(),
        }
    }
}

/// The three independent lookup collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Category,
    Account,
    Payer,
}

impl LookupKind {
    pub const ALL: [LookupKind; 3] = [LookupKind::Category, LookupKind::Account, LookupKind::Payer];

    /// The store collection holding this kind of lookup item.
    pub fn collection(self) -> Collection {
        match self {
            LookupKind::Category => Collection::Categories,
            LookupKind::Account => Collection::Accounts,
            LookupKind::Payer => Collection::Payers,
        }
    }

    /// The value of the transaction field this lookup mirrors.
    pub fn value_of(self, transaction: &NewTransaction) -> &str {
        match self {
            LookupKind::Category => &transaction.category,
            LookupKind::Account => &transaction.from_account,
            LookupKind::Payer => &transaction.paid_by,
        }
    }

    /// The `id` of the `<datalist>` offering suggestions for this kind.
    pub fn datalist_id(self) -> &'static str {
        match self {
            LookupKind::Category => "category-options",
            LookupKind::Account => "account-options",
            LookupKind::Payer => "payer-options",
        }
    }
}
