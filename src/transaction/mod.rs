//! Consumption transactions.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the `NewTransaction` candidate for insertion
//! - The entry form and its validation
//! - Sorting and the paginated table shared by the list and search pages
//! - View handlers for recording, listing and deleting transactions

mod core;
mod create_endpoint;
mod delete_endpoint;
mod form;
mod sort;
mod transactions_page;
mod view;

pub use core::{NewTransaction, Transaction};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use transactions_page::{get_transactions_page, reload_endpoint};
pub use view::{ListPage, ListQuery, transactions_table};
