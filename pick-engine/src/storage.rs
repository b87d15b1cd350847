//! redb-based storage layer for orders and completion records
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | lookup code | JSON `Order` | Pre-provisioned orders awaiting pick |
//! | `completions` | completion key | JSON `CompletionRecord` | Durable finalize records |
//! | `sequence_counter` | `"completion_seq"` | `u64` | Completion key disambiguation |
//!
//! # Completion Keys
//!
//! `{order_id}:{UTC timestamp, ms precision}:{zero-padded counter}`. The
//! counter is persistent and incremented in the same write transaction as
//! the record insert, so two finalizations within the same millisecond
//! still produce distinct, sortable keys. An existing key is refused with
//! a conflict, never silently overwritten.
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate` by default: once `commit()`
//! returns the record survives power loss, and the database file is always
//! in a consistent state. No other component performs I/O.

use crate::scan::ScanCode;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::error::PickError;
use shared::order::{CompletionRecord, Order};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};

/// Table for stored orders: key = lookup code, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Table for completion records: key = completion key, value = JSON-serialized CompletionRecord
const COMPLETIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("completions");

/// Table for the completion sequence counter: key = "completion_seq", value = u64
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

const COMPLETION_SEQ_KEY: &str = "completion_seq";

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Completion key already exists: {0}")]
    CompletionConflict(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for PickError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Serialization(e) => PickError::Parse(e.to_string()),
            StoreError::OrderNotFound(key) => PickError::NotFound(key),
            StoreError::CompletionConflict(key) => PickError::Conflict(key),
            other => PickError::Io(other.to_string()),
        }
    }
}

/// How a scan code resolved to an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSource {
    /// Decoded from a self-contained payload in the code itself
    Inline,
    /// Retrieved from the `orders` table by lookup key
    Stored,
}

/// An order plus where it came from
#[derive(Debug, Clone)]
pub struct ResolvedOrder {
    pub order: Order,
    pub source: OrderSource,
}

/// Order storage backed by redb
#[derive(Clone)]
pub struct OrderStore {
    db: Arc<Database>,
    /// When set, completion writes fail with a conflict (test fault injection)
    #[cfg(test)]
    fail_completions: Arc<AtomicBool>,
}

impl OrderStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StoreResult<Self> {
        // Create all tables up front and seed the counter
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(COMPLETIONS_TABLE)?;
            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            if seq_table.get(COMPLETION_SEQ_KEY)?.is_none() {
                seq_table.insert(COMPLETION_SEQ_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(db),
            #[cfg(test)]
            fail_completions: Arc::new(AtomicBool::new(false)),
        })
    }

    // ========== Order Operations ==========

    /// Store an order under its own ID so it can be resolved by lookup key
    pub fn put_order(&self, order: &Order) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            let value = serde_json::to_vec(order)?;
            table.insert(order.order_id.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        tracing::debug!(order_id = %order.order_id, "Order stored");
        Ok(())
    }

    /// Get a stored order by lookup key
    pub fn get_order(&self, key: &str) -> StoreResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Resolve a scan code to an order
    ///
    /// A code classified as an inline payload is decoded directly; a
    /// malformed payload is a serialization error, not a lookup miss. Any
    /// other code is treated as a lookup key against the `orders` table.
    pub fn resolve_order(&self, code: &str) -> StoreResult<ResolvedOrder> {
        match ScanCode::classify(code) {
            ScanCode::Inline(payload) => {
                let order: Order = serde_json::from_str(payload)?;
                Ok(ResolvedOrder {
                    order,
                    source: OrderSource::Inline,
                })
            }
            ScanCode::Key(key) => {
                let order = self
                    .get_order(key)?
                    .ok_or_else(|| StoreError::OrderNotFound(key.to_string()))?;
                Ok(ResolvedOrder {
                    order,
                    source: OrderSource::Stored,
                })
            }
        }
    }

    // ========== Completion Operations ==========

    /// Durably store a completion record, returning the derived key
    ///
    /// The sequence counter increments inside the same transaction as the
    /// insert, so a failed commit does not burn a sequence number.
    pub fn store_completion(&self, record: &CompletionRecord) -> StoreResult<String> {
        #[cfg(test)]
        if self.fail_completions.load(Ordering::Relaxed) {
            return Err(StoreError::CompletionConflict(
                record.order.order_id.clone(),
            ));
        }

        let txn = self.db.begin_write()?;
        let key = {
            let mut seq_table = txn.open_table(SEQUENCE_TABLE)?;
            let next = seq_table
                .get(COMPLETION_SEQ_KEY)?
                .map(|guard| guard.value())
                .unwrap_or(0)
                + 1;
            seq_table.insert(COMPLETION_SEQ_KEY, next)?;
            drop(seq_table);

            let key = completion_key(&record.order.order_id, &record.completed_at, next);
            Self::insert_completion(&txn, &key, record)?;
            key
        };
        txn.commit()?;
        tracing::info!(order_id = %record.order.order_id, key = %key, "Completion record stored");
        Ok(key)
    }

    /// Guarded insert: an existing key is a conflict, never an overwrite
    fn insert_completion(
        txn: &WriteTransaction,
        key: &str,
        record: &CompletionRecord,
    ) -> StoreResult<()> {
        let mut table = txn.open_table(COMPLETIONS_TABLE)?;
        if table.get(key)?.is_some() {
            return Err(StoreError::CompletionConflict(key.to_string()));
        }
        let value = serde_json::to_vec(record)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// Store a completion under an explicit key (for conflict testing)
    #[cfg(test)]
    pub fn put_completion_at(&self, key: &str, record: &CompletionRecord) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        Self::insert_completion(&txn, key, record)?;
        txn.commit()?;
        Ok(())
    }

    /// Make subsequent completion writes fail (test fault injection)
    #[cfg(test)]
    pub fn set_fail_completions(&self, enabled: bool) {
        self.fail_completions.store(enabled, Ordering::Relaxed);
    }

    /// Get a completion record by key
    pub fn get_completion(&self, key: &str) -> StoreResult<Option<CompletionRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COMPLETIONS_TABLE)?;
        match table.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All completion records for an order, in key (chronological) order
    pub fn completions_for_order(
        &self,
        order_id: &str,
    ) -> StoreResult<Vec<(String, CompletionRecord)>> {
        let prefix = format!("{order_id}:");
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COMPLETIONS_TABLE)?;

        let mut records = Vec::new();
        for result in table.iter()? {
            let (key, value) = result?;
            if key.value().starts_with(&prefix) {
                let record: CompletionRecord = serde_json::from_slice(value.value())?;
                records.push((key.value().to_string(), record));
            }
        }
        Ok(records)
    }
}

/// Derive a sortable, collision-free completion key
///
/// The counter padding keeps keys lexically sortable up to 10^10
/// completions per database.
fn completion_key(order_id: &str, completed_at: &DateTime<Utc>, seq: u64) -> String {
    format!(
        "{}:{}:{:010}",
        order_id,
        completed_at.format("%Y%m%dT%H%M%S%.3fZ"),
        seq
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::OrderItem;

    fn test_order(order_id: &str) -> Order {
        Order {
            order_id: order_id.to_string(),
            customer: "ACME Corp".to_string(),
            date: "2026-08-29".to_string(),
            items: vec![
                OrderItem {
                    sku: "A".to_string(),
                    name: "Widget".to_string(),
                    quantity: 2,
                    quantity_picked: 0,
                },
                OrderItem {
                    sku: "B".to_string(),
                    name: "Gadget".to_string(),
                    quantity: 1,
                    quantity_picked: 0,
                },
            ],
        }
    }

    #[test]
    fn put_and_get_order() {
        let store = OrderStore::open_in_memory().unwrap();
        let order = test_order("ORD-1");

        store.put_order(&order).unwrap();
        let loaded = store.get_order("ORD-1").unwrap().unwrap();
        assert_eq!(loaded, order);

        assert!(store.get_order("ORD-2").unwrap().is_none());
    }

    #[test]
    fn resolve_inline_payload() {
        let store = OrderStore::open_in_memory().unwrap();
        let order = test_order("ORD-1");
        let payload = serde_json::to_string(&order).unwrap();

        let resolved = store.resolve_order(&payload).unwrap();
        assert_eq!(resolved.source, OrderSource::Inline);
        assert_eq!(resolved.order, order);
    }

    #[test]
    fn resolve_stored_order_by_key() {
        let store = OrderStore::open_in_memory().unwrap();
        let order = test_order("ORD-1");
        store.put_order(&order).unwrap();

        let resolved = store.resolve_order("ORD-1").unwrap();
        assert_eq!(resolved.source, OrderSource::Stored);
        assert_eq!(resolved.order, order);
    }

    #[test]
    fn resolve_unknown_key_is_not_found() {
        let store = OrderStore::open_in_memory().unwrap();
        let err = store.resolve_order("ORD-MISSING").unwrap_err();
        assert!(matches!(err, StoreError::OrderNotFound(key) if key == "ORD-MISSING"));
    }

    #[test]
    fn resolve_malformed_payload_is_parse_error_not_lookup() {
        let store = OrderStore::open_in_memory().unwrap();
        let err = store.resolve_order(r#"{"orderId": oops"#).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));

        let pick_err: PickError = err.into();
        assert!(matches!(pick_err, PickError::Parse(_)));
    }

    #[test]
    fn completion_keys_are_distinct_within_one_timestamp() {
        let store = OrderStore::open_in_memory().unwrap();
        let completed_at = Utc::now();

        // Same order, same instant: the counter must disambiguate
        let record = CompletionRecord {
            order: test_order("ORD-1"),
            completed_at,
        };
        let key_a = store.store_completion(&record).unwrap();
        let key_b = store.store_completion(&record).unwrap();
        assert_ne!(key_a, key_b);

        let records = store.completions_for_order("ORD-1").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].1, record);
        assert_eq!(records[1].1, record);
    }

    #[test]
    fn existing_completion_key_is_refused_not_overwritten() {
        let store = OrderStore::open_in_memory().unwrap();
        let first = CompletionRecord {
            order: test_order("ORD-1"),
            completed_at: Utc::now(),
        };
        let mut second = first.clone();
        second.order.items[0].quantity_picked = 2;

        let key = "ORD-1:20260829T120000.000Z:0000000042";
        store.put_completion_at(key, &first).unwrap();
        let err = store.put_completion_at(key, &second).unwrap_err();
        assert!(matches!(err, StoreError::CompletionConflict(k) if k == key));

        let pick_err: PickError = store.put_completion_at(key, &second).unwrap_err().into();
        assert!(matches!(pick_err, PickError::Conflict(_)));

        // The original record is untouched
        let stored = store.get_completion(key).unwrap().unwrap();
        assert_eq!(stored, first);
    }

    #[test]
    fn completion_round_trips_through_storage() {
        let store = OrderStore::open_in_memory().unwrap();
        let mut order = test_order("ORD-1");
        order.items[0].quantity_picked = 2;

        let record = CompletionRecord {
            order,
            completed_at: Utc::now(),
        };
        let key = store.store_completion(&record).unwrap();
        let loaded = store.get_completion(&key).unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn completion_listing_is_scoped_to_the_order() {
        let store = OrderStore::open_in_memory().unwrap();
        let completed_at = Utc::now();

        for id in ["ORD-1", "ORD-2"] {
            let record = CompletionRecord {
                order: test_order(id),
                completed_at,
            };
            store.store_completion(&record).unwrap();
        }

        let records = store.completions_for_order("ORD-1").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1.order.order_id, "ORD-1");
    }
}
