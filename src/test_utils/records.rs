use serde_json::Value;
use time::Date;

use crate::{
    store::{Collection, RemoteStore, SqliteStore},
    transaction::{NewTransaction, Transaction},
};

pub(crate) fn new_transaction(date: Date, category: &str, amount: f64) -> NewTransaction {
    NewTransaction {
        date,
        category: category.to_owned(),
        item: "Coffee".to_owned(),
        vendor: "Cafe X".to_owned(),
        amount,
        from_account: "Checking".to_owned(),
        paid_by: "Alice".to_owned(),
    }
}

pub(crate) fn transaction_with(date: Date, category: &str, amount: f64) -> Transaction {
    let new = new_transaction(date, category, amount);

    Transaction {
        id: None,
        date: new.date,
        category: new.category,
        item: new.item,
        vendor: new.vendor,
        amount: new.amount,
        from_account: new.from_account,
        paid_by: new.paid_by,
        created_at: None,
    }
}

/// Write `transaction` straight to `store`, bypassing the repository.
pub(crate) async fn seed_transaction(
    store: &SqliteStore,
    transaction: NewTransaction,
) -> Transaction {
    let Value::Object(row) = serde_json::to_value(&transaction).unwrap() else {
        panic!("transaction did not serialize to an object");
    };

    let inserted = store
        .insert(Collection::Transactions, vec![row])
        .await
        .expect("could not seed transaction");

    serde_json::from_value(Value::Object(inserted.into_iter().next().unwrap())).unwrap()
}
