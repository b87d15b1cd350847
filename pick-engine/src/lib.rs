//! Pick workflow engine
//!
//! Scan-interpretation and order-state engine for a single warehouse pick
//! order:
//!
//! - **scan**: classifies a decoded code as inline order payload or lookup key
//! - **storage**: redb-based persistence for stored orders and completion records
//! - **engine**: the state machine that owns the active order
//! - **config**: environment-based configuration
//!
//! # Data Flow
//!
//! 1. An external scan source hands a decoded code string to [`PickEngine::handle_scan`]
//! 2. Idle engine: the code resolves to an order (inline payload or stored lookup)
//! 3. Active engine: the code is a SKU and increments one item's picked count
//! 4. Each mutation is broadcast to subscribers as a [`PickEvent`]
//! 5. [`PickEngine::finalize`] snapshots the order into a durable completion
//!    record and clears the active slot
//!
//! The engine holds at most one active order and serializes all operations
//! on it; rejections never mutate state, so every error leaves the engine
//! exactly where it was.

pub mod config;
pub mod engine;
pub mod scan;
pub mod storage;

// Re-exports
pub use config::EngineConfig;
pub use engine::{FinalizeOutcome, PickEngine, ScanOutcome};
pub use scan::ScanCode;
pub use storage::{OrderSource, OrderStore, ResolvedOrder, StoreError, StoreResult};

// Re-export shared types for convenience
pub use shared::{CompletionRecord, Order, OrderItem, PickError, PickEvent, PickResult};
