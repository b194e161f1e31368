use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::order::DeliveryStatus;

/// Broadcast to websocket subscribers whenever the lifecycle moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DeliveryEvent {
    Assigned {
        order_id: Uuid,
        partner_id: Uuid,
        tracking_id: String,
        estimated_delivery_time: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    StatusChanged {
        order_id: Uuid,
        partner_id: Uuid,
        status: DeliveryStatus,
        at: DateTime<Utc>,
    },
}
