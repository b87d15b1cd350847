//! Error types for the picking workflow
//!
//! Every failure the engine or storage layer can report maps onto one of
//! these variants, and the same value is forwarded verbatim to observers
//! inside [`PickEvent::OperationFailed`](crate::order::event::PickEvent).
//! The enum is `Clone + Serialize` so it can ride in broadcast events and
//! be rendered by any display layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Workflow error taxonomy
///
/// None of these are fatal: the engine is left in its prior state (Idle or
/// Active, never partially mutated) and the operator can retry the next scan.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "message", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PickError {
    /// A self-contained order payload (or a stored record) failed to decode
    #[error("malformed order payload: {0}")]
    Parse(String),

    /// A lookup key had no stored order behind it
    #[error("no stored order for key '{0}'")]
    NotFound(String),

    /// The scan was understood but rejected by workflow rules
    #[error("{0}")]
    Validation(String),

    /// A completion record already exists under the derived key
    #[error("completion record already exists: {0}")]
    Conflict(String),

    /// Underlying storage failure
    #[error("storage failure: {0}")]
    Io(String),
}

impl PickError {
    /// Scanned SKU does not match any item in the active order
    pub fn unknown_sku(sku: impl Into<String>) -> Self {
        Self::Validation(format!("item '{}' is not in the active order", sku.into()))
    }

    /// Scanned SKU targets an item whose required quantity is already picked
    pub fn already_picked(sku: impl Into<String>) -> Self {
        Self::Validation(format!("item '{}' is already fully picked", sku.into()))
    }

    /// True for rejections the operator can fix by scanning something else
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type PickResult<T> = Result<T, PickError>;
