//! Pick workflow engine
//!
//! A two-state machine around a single active-order slot:
//!
//! - **Idle**: no active order; a scan is an order identifier or payload
//! - **Active**: one order held; a scan is an item SKU
//!
//! Completion is advisory. Reaching full quantities only emits
//! `OrderCompleted`; the order stays active until an explicit
//! [`finalize`](PickEngine::finalize), which may also be called on an
//! incomplete order to record a partial pick.
//!
//! All operations take the slot mutex for their full duration, including
//! the storage calls, which keeps scans and finalizes serialized with
//! respect to each other. The engine itself is synchronous; callers that
//! must not stall a scan source dispatch into it from a worker.

use crate::config::EngineConfig;
use crate::storage::OrderStore;
use chrono::Utc;
use parking_lot::Mutex;
use shared::error::{PickError, PickResult};
use shared::order::event::PickEvent;
use shared::order::{CompletionRecord, Order};
use std::path::Path;
use tokio::sync::broadcast;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Result of a handled scan
///
/// An `Ok` outcome means the scan mutated engine state; rejections are
/// returned as errors and never mutate anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Idle scan resolved an order; the engine is now active
    OrderLoaded { order_id: String },
    /// Active scan incremented one item's picked count
    ItemPicked {
        sku: String,
        item_complete: bool,
        order_complete: bool,
    },
}

/// Result of a finalize call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// Nothing to finalize; explicit no-op, no I/O
    Idle,
    /// Completion record stored under `key`; the engine is now idle
    Stored { key: String },
}

/// Workflow engine owning at most one active order
///
/// The `epoch` field is a unique identifier generated per instance.
/// Observers can use it to detect engine restarts.
pub struct PickEngine {
    store: OrderStore,
    /// Single active-order slot: None = Idle, Some = Active
    active: Mutex<Option<Order>>,
    event_tx: broadcast::Sender<PickEvent>,
    epoch: String,
}

impl std::fmt::Debug for PickEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickEngine")
            .field("store", &"<OrderStore>")
            .field("event_tx", &"<broadcast::Sender>")
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl PickEngine {
    /// Create an engine with a database at the given path
    pub fn new(db_path: impl AsRef<Path>) -> PickResult<Self> {
        let store = OrderStore::open(db_path)?;
        Ok(Self::with_store(store))
    }

    /// Create an engine from environment configuration
    pub fn from_config(config: &EngineConfig) -> PickResult<Self> {
        std::fs::create_dir_all(&config.work_dir)
            .map_err(|e| PickError::Io(e.to_string()))?;
        Self::new(config.db_path())
    }

    /// Create an engine over existing storage
    pub fn with_store(store: OrderStore) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let epoch = uuid::Uuid::new_v4().to_string();
        tracing::info!(epoch = %epoch, "PickEngine started");
        Self {
            store,
            active: Mutex::new(None),
            event_tx,
            epoch,
        }
    }

    /// Subscribe to event broadcasts
    pub fn subscribe(&self) -> broadcast::Receiver<PickEvent> {
        self.event_tx.subscribe()
    }

    /// Engine instance epoch (unique per startup)
    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    /// Get the underlying storage
    pub fn store(&self) -> &OrderStore {
        &self.store
    }

    /// Clone of the active order, if any
    pub fn active_order(&self) -> Option<Order> {
        self.active.lock().clone()
    }

    /// Interpret one scanned code
    ///
    /// Idle: the code resolves to an order (inline payload or stored key)
    /// and the engine becomes active. Active: the code is an item SKU and
    /// the matching item's picked count increments by exactly one.
    ///
    /// Every rejection is also broadcast as `OperationFailed` so observers
    /// can surface it.
    pub fn handle_scan(&self, code: &str) -> PickResult<ScanOutcome> {
        let code = code.trim();
        let mut active = self.active.lock();

        let result = if let Some(order) = active.as_mut() {
            self.pick_item(order, code)
        } else {
            self.load_order(&mut active, code)
        };

        if let Err(err) = &result {
            tracing::warn!(code = %code, error = %err, "Scan rejected");
            let _ = self.event_tx.send(PickEvent::OperationFailed { error: err.clone() });
        }
        result
    }

    /// Snapshot the active order into a durable completion record
    ///
    /// Idle is an explicit no-op. On storage failure the order stays
    /// active so the call can simply be retried; the slot is cleared only
    /// after the record is durably committed. Completion of the order is
    /// not required: partial picks are recorded as-is.
    pub fn finalize(&self) -> PickResult<FinalizeOutcome> {
        let mut active = self.active.lock();
        let Some(order) = active.clone() else {
            tracing::debug!("Finalize requested with no active order");
            return Ok(FinalizeOutcome::Idle);
        };

        let record = CompletionRecord {
            order,
            completed_at: Utc::now(),
        };
        match self.store.store_completion(&record) {
            Ok(key) => {
                tracing::info!(
                    order_id = %record.order.order_id,
                    key = %key,
                    complete = record.order.is_complete(),
                    "Order finalized"
                );
                *active = None;
                Ok(FinalizeOutcome::Stored { key })
            }
            Err(err) => {
                let err = PickError::from(err);
                tracing::error!(order_id = %record.order.order_id, error = %err, "Finalize failed");
                let _ = self.event_tx.send(PickEvent::OperationFailed { error: err.clone() });
                Err(err)
            }
        }
    }

    /// Idle-state scan: resolve and load an order into the slot
    fn load_order(&self, slot: &mut Option<Order>, code: &str) -> PickResult<ScanOutcome> {
        let resolved = self.store.resolve_order(code)?;
        let order = resolved.order;
        tracing::info!(
            order_id = %order.order_id,
            source = ?resolved.source,
            items = order.items.len(),
            "Order loaded"
        );

        let _ = self.event_tx.send(PickEvent::OrderUpdated { order: order.clone() });
        let order_id = order.order_id.clone();
        *slot = Some(order);
        Ok(ScanOutcome::OrderLoaded { order_id })
    }

    /// Active-state scan: guarded increment of the first matching item
    ///
    /// Refusing scans against complete items is the clamp that keeps
    /// `quantity_picked <= quantity`.
    fn pick_item(&self, order: &mut Order, sku: &str) -> PickResult<ScanOutcome> {
        let item = order
            .item_mut(sku)
            .ok_or_else(|| PickError::unknown_sku(sku))?;
        if item.is_complete() {
            return Err(PickError::already_picked(sku));
        }

        item.quantity_picked += 1;
        let item_complete = item.is_complete();
        let order_complete = order.is_complete();
        tracing::info!(order_id = %order.order_id, sku = %sku, "Item picked");

        let _ = self.event_tx.send(PickEvent::OrderUpdated { order: order.clone() });
        if order_complete {
            tracing::info!(order_id = %order.order_id, "All items picked");
            let _ = self.event_tx.send(PickEvent::OrderCompleted { order: order.clone() });
        }

        Ok(ScanOutcome::ItemPicked {
            sku: sku.to_string(),
            item_complete,
            order_complete,
        })
    }
}
