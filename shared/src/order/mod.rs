//! Pick order model
//!
//! Value types for a single warehouse pick order. Completeness predicates
//! are computed on demand from the current quantities, never cached, so
//! they cannot drift from the data. The model itself does not clamp
//! `quantity_picked`; the engine's guarded increment is the only mutation
//! path and refuses scans against already-complete items.
//!
//! Wire format is JSON with camelCase field names (`orderId`,
//! `quantityPicked`, ...), matching the payload printed on order barcodes.

pub mod event;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of a pick order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Stock-keeping unit, unique within one order in practice
    pub sku: String,
    /// Display name
    pub name: String,
    /// Required units, >= 1
    pub quantity: u32,
    /// Units picked so far; absent on freshly printed payloads
    #[serde(default)]
    pub quantity_picked: u32,
}

impl OrderItem {
    /// Whether the required quantity has been picked
    pub fn is_complete(&self) -> bool {
        self.quantity_picked >= self.quantity
    }

    /// Units still to pick
    pub fn remaining(&self) -> u32 {
        self.quantity.saturating_sub(self.quantity_picked)
    }
}

/// A single pick order
///
/// Identity fields are immutable; only `items` entries are mutated, in
/// place, by the workflow engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Stable order identity, also the lookup key for stored orders
    pub order_id: String,
    /// Customer display name
    pub customer: String,
    /// Opaque display value, never parsed
    pub date: String,
    /// Order-preserving item list, non-empty in practice
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Whether every item has reached its required quantity
    pub fn is_complete(&self) -> bool {
        self.items.iter().all(|item| item.is_complete())
    }

    /// First item matching `sku`, in list order
    pub fn item(&self, sku: &str) -> Option<&OrderItem> {
        self.items.iter().find(|item| item.sku == sku)
    }

    /// Mutable first item matching `sku`, in list order
    pub fn item_mut(&mut self, sku: &str) -> Option<&mut OrderItem> {
        self.items.iter_mut().find(|item| item.sku == sku)
    }
}

/// Durable record of a finalized order
///
/// Snapshot taken at finalize time; written once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub order: Order,
    pub completed_at: DateTime<Utc>,
}
