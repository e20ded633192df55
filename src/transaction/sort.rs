//! Sorting of transaction lists by a user-selected column.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::Transaction;

/// The transaction fields a list can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Date,
    Category,
    Item,
    Vendor,
    Amount,
    FromAccount,
    PaidBy,
    CreatedAt,
}

type Comparator = fn(&Transaction, &Transaction) -> Ordering;

impl SortField {
    /// The fields shown as table columns, in display order.
    pub const COLUMNS: [SortField; 7] = [
        SortField::Date,
        SortField::Category,
        SortField::Item,
        SortField::Vendor,
        SortField::Amount,
        SortField::FromAccount,
        SortField::PaidBy,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortField::Date => "Date",
            SortField::Category => "Category",
            SortField::Item => "Item",
            SortField::Vendor => "Vendor",
            SortField::Amount => "Amount",
            SortField::FromAccount => "Account",
            SortField::PaidBy => "Paid By",
            SortField::CreatedAt => "Recorded",
        }
    }

    /// The comparison for this field's values.
    ///
    /// Text is compared lexicographically, amounts numerically and dates
    /// chronologically.
    fn comparator(self) -> Comparator {
        match self {
            SortField::Date => |a, b| a.date.cmp(&b.date),
            SortField::Category => |a, b| a.category.cmp(&b.category),
            SortField::Item => |a, b| a.item.cmp(&b.item),
            SortField::Vendor => |a, b| a.vendor.cmp(&b.vendor),
            SortField::Amount => |a, b| a.amount.total_cmp(&b.amount),
            SortField::FromAccount => |a, b| a.from_account.cmp(&b.from_account),
            SortField::PaidBy => |a, b| a.paid_by.cmp(&b.paid_by),
            SortField::CreatedAt => |a, b| a.created_at.cmp(&b.created_at),
        }
    }

    fn is_missing(self, transaction: &Transaction) -> bool {
        match self {
            SortField::CreatedAt => transaction.created_at.is_none(),
            SortField::Date
            | SortField::Category
            | SortField::Item
            | SortField::Vendor
            | SortField::Amount
            | SortField::FromAccount
            | SortField::PaidBy => false,
        }
    }
}

/// The order to sort transactions in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// Sort in order of increasing value.
    #[serde(rename = "asc")]
    Ascending,
    /// Sort in order of decreasing value.
    #[serde(rename = "desc")]
    Descending,
}

/// The column and direction a list is currently sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConfig {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn ascending(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Descending,
        }
    }

    /// The sort to apply when the user selects `field`.
    ///
    /// Selecting the field that is already sorted ascending flips it to
    /// descending. Any other selection sorts `field` ascending.
    pub fn toggle(current: Option<SortConfig>, field: SortField) -> SortConfig {
        match current {
            Some(SortConfig {
                field: current_field,
                direction: SortDirection::Ascending,
            }) if current_field == field => SortConfig::descending(field),
            _ => SortConfig::ascending(field),
        }
    }
}

/// Sort `transactions` in place by `sort`.
///
/// The sort is stable. Transactions without a value for the field (only
/// possible for [SortField::CreatedAt]) go last in either direction.
pub fn sort_transactions(transactions: &mut [Transaction], sort: SortConfig) {
    let field = sort.field;
    let compare = field.comparator();

    transactions.sort_by(|a, b| match (field.is_missing(a), field.is_missing(b)) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match sort.direction {
            SortDirection::Ascending => compare(a, b),
            SortDirection::Descending => compare(a, b).reverse(),
        },
    });
}
