//! Outbound order-status events
//!
//! Status changes are published on an explicit channel instead of an
//! in-process listener registry, so the notification consumer can live in
//! its own task (or process) and fail without touching the scheduler.
//! Delivery is fire-and-forget.

use crate::logger::{self, LogTag};
use crate::types::OrderStatus;
use tokio::sync::mpsc;

/// Published whenever an order changes status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStatusEvent {
    pub order_id: String,
    /// Chat/account reference of the order's owner, when known.
    pub owner_ref: Option<String>,
    pub status: OrderStatus,
}

/// Sender half handed to the scheduler.
#[derive(Clone)]
pub struct EventBus {
    tx: mpsc::UnboundedSender<OrderStatusEvent>,
}

impl EventBus {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OrderStatusEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Publish an event. A closed channel (no consumer) is logged and
    /// otherwise ignored; notification delivery is not guaranteed.
    pub fn publish(&self, event: OrderStatusEvent) {
        if self.tx.send(event).is_err() {
            logger::warning(LogTag::Events, "Event channel closed, dropping status event");
        }
    }
}
