use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::lifecycle::OrderStatus;

pub const EVENT_BUFFER: usize = 256;

/// Emitted on every successful status transition. Consumers (notifications,
/// observability) subscribe via `AppState::events`; nothing in the core
/// depends on anyone listening.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    pub order_id: Uuid,
    pub from_status: OrderStatus,
    pub to_status: OrderStatus,
    pub timestamp: DateTime<Utc>,
}

/// Fire-and-forget publish. A send error only means there are no
/// subscribers right now, which is fine.
pub fn emit_transition(
    sender: &broadcast::Sender<OrderEvent>,
    order_id: Uuid,
    from_status: OrderStatus,
    to_status: OrderStatus,
    timestamp: DateTime<Utc>,
) {
    let event = OrderEvent {
        order_id,
        from_status,
        to_status,
        timestamp,
    };
    tracing::debug!(
        order_id = %event.order_id,
        from = %event.from_status,
        to = %event.to_status,
        "order transition"
    );
    let _ = sender.send(event);
}
