//! The record repository: the in-memory copy of recent transactions, the
//! lookup collections and the current search result, kept in step with the
//! store.

use std::sync::{
    Arc, RwLock,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    Error,
    database_id::TransactionId,
    lookup::{LookupItem, LookupKind},
    search::{SearchSpec, build_search_query},
    store::{Collection, Order, Query, RemoteStore, Row},
    transaction::{NewTransaction, Transaction},
};

#[derive(Debug, Default)]
struct Cache {
    transactions: Vec<Transaction>,
    categories: Vec<LookupItem>,
    accounts: Vec<LookupItem>,
    payers: Vec<LookupItem>,
    search_spec: Option<SearchSpec>,
    search_results: Option<Vec<Transaction>>,
    load_error: Option<Error>,
    tombstones: Tombstones,
}

impl Cache {
    fn lookups(&self, kind: LookupKind) -> &[LookupItem] {
        match kind {
            LookupKind::Category => &self.categories,
            LookupKind::Account => &self.accounts,
            LookupKind::Payer => &self.payers,
        }
    }
}

/// Deletes made while reads were in flight.
///
/// A read registers when it is issued and, when its rows arrive, drops every
/// record deleted after that point so a stale read cannot bring it back.
#[derive(Debug, Default)]
struct Tombstones {
    sequence: u64,
    deleted: Vec<(u64, TransactionId)>,
    readers: Vec<u64>,
}

impl Tombstones {
    fn begin_read(&mut self) -> u64 {
        self.readers.push(self.sequence);
        self.sequence
    }

    fn record(&mut self, id: TransactionId) {
        self.sequence += 1;

        if !self.readers.is_empty() {
            self.deleted.push((self.sequence, id));
        }
    }

    /// Finish the read that began at `started` and return the ids deleted
    /// since then.
    fn end_read(&mut self, started: u64) -> Vec<TransactionId> {
        let deleted_since = self
            .deleted
            .iter()
            .filter(|(sequence, _)| *sequence > started)
            .map(|(_, id)| *id)
            .collect();

        if let Some(position) = self.readers.iter().position(|reader| *reader == started) {
            self.readers.swap_remove(position);
        }

        match self.readers.iter().min().copied() {
            Some(oldest) => self.deleted.retain(|(sequence, _)| *sequence > oldest),
            None => self.deleted.clear(),
        }

        deleted_since
    }
}

fn drop_deleted(transactions: &mut Vec<Transaction>, deleted: &[TransactionId]) {
    if deleted.is_empty() {
        return;
    }

    transactions.retain(|transaction| {
        transaction.id.is_none_or(|id| !deleted.contains(&id))
    });
}

struct Snapshot {
    transactions: Vec<Transaction>,
    categories: Vec<LookupItem>,
    accounts: Vec<LookupItem>,
    payers: Vec<LookupItem>,
}

/// Clears the in-flight flag when an insert finishes, however it finishes.
struct InsertGuard<'a>(&'a AtomicBool);

impl<'a> InsertGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, Error> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::InsertInProgress)?;

        Ok(Self(flag))
    }
}

impl Drop for InsertGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the cached records and is the only path through which they change.
///
/// Share it between handlers with an [Arc]. The cache lock is never held
/// across a store call.
pub struct Repository {
    store: Arc<dyn RemoteStore>,
    recent_limit: usize,
    cache: RwLock<Cache>,
    load_ticket: AtomicU64,
    insert_in_flight: AtomicBool,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("recent_limit", &self.recent_limit)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Create an empty repository backed by `store`.
    ///
    /// `recent_limit` caps how many of the most recently recorded
    /// transactions [Repository::load] keeps.
    pub fn new(store: Arc<dyn RemoteStore>, recent_limit: usize) -> Self {
        Self {
            store,
            recent_limit,
            cache: RwLock::new(Cache::default()),
            load_ticket: AtomicU64::new(0),
            insert_in_flight: AtomicBool::new(false),
        }
    }

    /// Replace the cached transactions and lookups with fresh copies from
    /// the store.
    ///
    /// On failure the cache is left as it was and the error is kept as the
    /// load error until a later load succeeds. If another load is started
    /// before this one finishes, this one's result is discarded.
    ///
    /// # Errors
    ///
    /// Returns the store error if any of the fetches failed, or
    /// [Error::InvalidRecord] if a row could not be read.
    pub async fn load(&self) -> Result<(), Error> {
        let ticket = self.load_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let started = self.begin_read()?;
        let result = self.fetch_snapshot().await;

        let mut cache = self.cache.write().map_err(|_| Error::LockError)?;
        let deleted = cache.tombstones.end_read(started);

        let latest_ticket = self.load_ticket.load(Ordering::SeqCst);
        if latest_ticket != ticket {
            tracing::debug!(
                "Discarding load #{ticket}, load #{latest_ticket} was started after it"
            );
            return result.map(|_| ());
        }

        match result {
            Ok(mut snapshot) => {
                drop_deleted(&mut snapshot.transactions, &deleted);
                tracing::info!(
                    "Loaded {} transactions, {} categories, {} accounts and {} payers",
                    snapshot.transactions.len(),
                    snapshot.categories.len(),
                    snapshot.accounts.len(),
                    snapshot.payers.len()
                );
                cache.transactions = snapshot.transactions;
                cache.categories = snapshot.categories;
                cache.accounts = snapshot.accounts;
                cache.payers = snapshot.payers;
                cache.load_error = None;
                Ok(())
            }
            Err(error) => {
                tracing::error!("Could not load records: {error}");
                cache.load_error = Some(error.clone());
                Err(error)
            }
        }
    }

    async fn fetch_snapshot(&self) -> Result<Snapshot, Error> {
        let recent = Query::default()
            .order(Order::descending("created_at"))
            .limit(self.recent_limit);
        let by_name = Query::default().order(Order::ascending("name"));

        let (transactions, categories, accounts, payers) = tokio::try_join!(
            self.store.select(Collection::Transactions, &recent),
            self.store.select(Collection::Categories, &by_name),
            self.store.select(Collection::Accounts, &by_name),
            self.store.select(Collection::Payers, &by_name),
        )?;

        Ok(Snapshot {
            transactions: from_rows(transactions)?,
            categories: from_rows(categories)?,
            accounts: from_rows(accounts)?,
            payers: from_rows(payers)?,
        })
    }

    /// Save `candidate`, record any new category, account or payer, and
    /// reload the cache.
    ///
    /// Failing to record a lookup value or to reload afterwards does not fail
    /// the insert: the former is logged, the latter shows up as the load
    /// error.
    ///
    /// # Errors
    ///
    /// - [Error::InsertInProgress] if another insert has not finished yet.
    /// - [Error::Validation] if the amount is not a finite number.
    /// - [Error::Network] or [Error::Request] if the store did not save it.
    pub async fn insert(&self, candidate: NewTransaction) -> Result<Transaction, Error> {
        let _guard = InsertGuard::acquire(&self.insert_in_flight)?;

        if !candidate.amount.is_finite() {
            return Err(Error::Validation(format!(
                "{} is not a valid amount.",
                candidate.amount
            )));
        }

        let row = to_row(&candidate)?;
        let inserted = self
            .store
            .insert(Collection::Transactions, vec![row])
            .await
            .inspect_err(|error| tracing::error!("Could not save transaction: {error}"))?;

        let transaction: Transaction = inserted
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::InvalidRecord("the store did not return the saved transaction".to_owned())
            })
            .and_then(from_row)?;

        tracing::info!(
            "Saved transaction #{} ({} at {})",
            transaction.id.unwrap_or_default(),
            transaction.item,
            transaction.vendor
        );

        self.insert_missing_lookups(&candidate).await;

        if let Err(error) = self.load().await {
            tracing::error!("Saved the transaction but could not reload records: {error}");
        }

        Ok(transaction)
    }

    async fn insert_missing_lookups(&self, transaction: &NewTransaction) {
        for kind in LookupKind::ALL {
            let name = kind.value_of(transaction);

            let is_known = self
                .cache
                .read()
                .map(|cache| cache.lookups(kind).iter().any(|item| item.name == name))
                .unwrap_or(false);

            if is_known {
                continue;
            }

            let result = match to_row(&LookupItem::new(name)) {
                Ok(row) => self
                    .store
                    .insert(kind.collection(), vec![row])
                    .await
                    .map_err(Error::from),
                Err(error) => Err(error),
            };

            match result {
                Ok(_) => tracing::info!("Added \"{name}\" to {}", kind.collection()),
                Err(error) => {
                    tracing::warn!("Could not add \"{name}\" to {}: {error}", kind.collection())
                }
            }
        }
    }

    /// Delete the transaction with `id` and drop it from the cache and the
    /// current search result.
    ///
    /// Deleting an `id` that does not exist succeeds and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns the store error if the delete failed, in which case the cache
    /// is unchanged.
    pub async fn delete(&self, id: TransactionId) -> Result<(), Error> {
        self.store
            .delete(Collection::Transactions, id)
            .await
            .inspect_err(|error| tracing::error!("Could not delete transaction #{id}: {error}"))?;

        let mut cache = self.cache.write().map_err(|_| Error::LockError)?;
        cache.tombstones.record(id);
        cache
            .transactions
            .retain(|transaction| transaction.id != Some(id));
        if let Some(results) = cache.search_results.as_mut() {
            results.retain(|transaction| transaction.id != Some(id));
        }

        tracing::info!("Deleted transaction #{id}");
        Ok(())
    }

    /// Find all transactions matching `spec` and keep them as the current
    /// search result.
    ///
    /// # Errors
    ///
    /// Returns the store error if the search failed, in which case the
    /// previous search result is kept.
    pub async fn search(&self, spec: SearchSpec) -> Result<Vec<Transaction>, Error> {
        let query = build_search_query(&spec);
        let started = self.begin_read()?;
        let rows = self.store.select(Collection::Transactions, &query).await;

        let mut cache = self.cache.write().map_err(|_| Error::LockError)?;
        let deleted = cache.tombstones.end_read(started);
        let rows =
            rows.inspect_err(|error| tracing::error!("Could not search transactions: {error}"))?;
        let mut results: Vec<Transaction> = from_rows(rows)?;
        drop_deleted(&mut results, &deleted);

        tracing::info!("Search for {spec:?} found {} transactions", results.len());

        cache.search_spec = Some(spec);
        cache.search_results = Some(results.clone());

        Ok(results)
    }

    /// The cached transactions, most recently recorded first.
    pub fn transactions(&self) -> Result<Vec<Transaction>, Error> {
        self.read(|cache| cache.transactions.clone())
    }

    /// The cached items of one lookup collection.
    pub fn lookups(&self, kind: LookupKind) -> Result<Vec<LookupItem>, Error> {
        self.read(|cache| cache.lookups(kind).to_vec())
    }

    /// The result of the last successful search, or `None` if no search has
    /// run yet.
    pub fn search_results(&self) -> Result<Option<Vec<Transaction>>, Error> {
        self.read(|cache| cache.search_results.clone())
    }

    /// The criteria of the last successful search.
    pub fn last_search(&self) -> Result<Option<SearchSpec>, Error> {
        self.read(|cache| cache.search_spec.clone())
    }

    /// The error from the last load, if it failed.
    pub fn load_error(&self) -> Result<Option<Error>, Error> {
        self.read(|cache| cache.load_error.clone())
    }

    fn begin_read(&self) -> Result<u64, Error> {
        self.cache
            .write()
            .map(|mut cache| cache.tombstones.begin_read())
            .map_err(|_| Error::LockError)
    }

    fn read<T>(&self, f: impl FnOnce(&Cache) -> T) -> Result<T, Error> {
        self.cache
            .read()
            .map(|cache| f(&cache))
            .map_err(|_| Error::LockError)
    }
}

fn to_row<T: Serialize>(value: &T) -> Result<Row, Error> {
    match serde_json::to_value(value) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(other) => Err(Error::InvalidRecord(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(error) => Err(Error::InvalidRecord(error.to_string())),
    }
}

fn from_row<T: DeserializeOwned>(row: Row) -> Result<T, Error> {
    serde_json::from_value(Value::Object(row))
        .inspect_err(|error| tracing::error!("Could not read row from the store: {error}"))
        .map_err(|error| Error::InvalidRecord(error.to_string()))
}

fn from_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>, Error> {
    rows.into_iter().map(from_row).collect()
}
