//! Shared types for the pick-station workspace
//!
//! Common types used across crates: the order model, completion records,
//! notification events, and error types.
//!
//! This crate is pure data and performs no I/O. All order mutation goes
//! through the workflow engine in `pick-engine`.

pub mod error;
pub mod order;

// Re-exports
pub use error::{PickError, PickResult};
pub use order::{CompletionRecord, Order, OrderItem};
pub use order::event::PickEvent;
pub use serde::{Deserialize, Serialize};
