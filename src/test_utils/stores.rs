use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{Notify, oneshot};

use crate::{
    database_id::DatabaseId,
    store::{Collection, Query, RemoteStore, Row, SqliteStore, StoreError},
};

/// A store that fails every call while a failure is set, and inserts into
/// the collections given to [FlakyStore::fail_inserts_into].
pub(crate) struct FlakyStore {
    inner: SqliteStore,
    failure: Mutex<Option<StoreError>>,
    insert_failures: Mutex<Vec<(Collection, StoreError)>>,
}

impl FlakyStore {
    pub(crate) fn new(inner: SqliteStore) -> Self {
        Self {
            inner,
            failure: Mutex::new(None),
            insert_failures: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(error: StoreError) -> Self {
        let store = Self::new(SqliteStore::open_in_memory().expect("could not open test store"));
        store.fail_with(error);
        store
    }

    pub(crate) fn fail_with(&self, error: StoreError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub(crate) fn recover(&self) {
        *self.failure.lock().unwrap() = None;
        self.insert_failures.lock().unwrap().clear();
    }

    pub(crate) fn fail_inserts_into(&self, collection: Collection, error: StoreError) {
        self.insert_failures
            .lock()
            .unwrap()
            .push((collection, error));
    }

    fn check(&self) -> Result<(), StoreError> {
        match self.failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteStore for FlakyStore {
    async fn select(&self, collection: Collection, query: &Query) -> Result<Vec<Row>, StoreError> {
        self.check()?;
        self.inner.select(collection, query).await
    }

    async fn insert(
        &self,
        collection: Collection,
        rows: Vec<Row>,
    ) -> Result<Vec<Row>, StoreError> {
        self.check()?;

        let insert_failure = self
            .insert_failures
            .lock()
            .unwrap()
            .iter()
            .find(|(failing, _)| *failing == collection)
            .map(|(_, error)| error.clone());
        if let Some(error) = insert_failure {
            return Err(error);
        }

        self.inner.insert(collection, rows).await
    }

    async fn delete(&self, collection: Collection, id: DatabaseId) -> Result<(), StoreError> {
        self.check()?;
        self.inner.delete(collection, id).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GatedCall {
    Select,
    Insert,
}

/// A store that holds back the response of the first transaction select or
/// insert until the gate is opened.
///
/// `held` is notified once the held call has reached the backend.
pub(crate) struct GatedStore {
    inner: SqliteStore,
    call: GatedCall,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    pub(crate) held: Notify,
}

impl GatedStore {
    pub(crate) fn on_select(inner: SqliteStore, gate: oneshot::Receiver<()>) -> Self {
        Self::new(inner, GatedCall::Select, gate)
    }

    pub(crate) fn on_insert(inner: SqliteStore, gate: oneshot::Receiver<()>) -> Self {
        Self::new(inner, GatedCall::Insert, gate)
    }

    fn new(inner: SqliteStore, call: GatedCall, gate: oneshot::Receiver<()>) -> Self {
        Self {
            inner,
            call,
            gate: Mutex::new(Some(gate)),
            held: Notify::new(),
        }
    }

    async fn wait_if_gated(&self, call: GatedCall, collection: Collection) {
        if call != self.call || collection != Collection::Transactions {
            return;
        }

        let gate = self.gate.lock().unwrap().take();

        if let Some(gate) = gate {
            self.held.notify_one();
            let _ = gate.await;
        }
    }
}

#[async_trait]
impl RemoteStore for GatedStore {
    async fn select(&self, collection: Collection, query: &Query) -> Result<Vec<Row>, StoreError> {
        let rows = self.inner.select(collection, query).await;
        self.wait_if_gated(GatedCall::Select, collection).await;
        rows
    }

    async fn insert(
        &self,
        collection: Collection,
        rows: Vec<Row>,
    ) -> Result<Vec<Row>, StoreError> {
        let rows = self.inner.insert(collection, rows).await;
        self.wait_if_gated(GatedCall::Insert, collection).await;
        rows
    }

    async fn delete(&self, collection: Collection, id: DatabaseId) -> Result<(), StoreError> {
        self.inner.delete(collection, id).await
    }
}
