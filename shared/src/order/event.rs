//! Notification events emitted by the workflow engine
//!
//! Observers (display layers, loggers) subscribe to a broadcast of these.
//! The engine makes no assumption about how, or whether, they are rendered.

use super::Order;
use crate::error::PickError;
use serde::{Deserialize, Serialize};

/// State-change notification
///
/// `OrderCompleted` is advisory: the order stays active until an explicit
/// finalize, so it always follows an `OrderUpdated` for the same scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PickEvent {
    /// The active order was loaded or one of its items was picked
    OrderUpdated { order: Order },
    /// Every item of the active order reached its required quantity
    OrderCompleted { order: Order },
    /// A scan or finalize was rejected; carries the error verbatim
    OperationFailed { error: PickError },
}

impl PickEvent {
    /// Order the event refers to, if any
    pub fn order(&self) -> Option<&Order> {
        match self {
            Self::OrderUpdated { order } | Self::OrderCompleted { order } => Some(order),
            Self::OperationFailed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_tag_with_screaming_snake_case() {
        let event = PickEvent::OperationFailed {
            error: PickError::NotFound("ORD-1".to_string()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "OPERATION_FAILED");
        assert_eq!(json["error"]["kind"], "NOT_FOUND");

        let back: PickEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn failure_events_carry_no_order() {
        let event = PickEvent::OperationFailed {
            error: PickError::Validation("bad scan".to_string()),
        };
        assert!(event.order().is_none());
    }
}
