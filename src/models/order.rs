use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Delivery progression. Transitions are forward-only and may not skip a
/// step; `NotAssigned -> Assigned` happens only through the assignment
/// engine, never through a plain status update.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum DeliveryStatus {
    NotAssigned,
    Assigned,
    PickedUp,
    OutForDelivery,
    Delivered,
}

impl DeliveryStatus {
    /// The only status this one may advance to, if any.
    pub fn successor(&self) -> Option<DeliveryStatus> {
        match self {
            DeliveryStatus::NotAssigned => Some(DeliveryStatus::Assigned),
            DeliveryStatus::Assigned => Some(DeliveryStatus::PickedUp),
            DeliveryStatus::PickedUp => Some(DeliveryStatus::OutForDelivery),
            DeliveryStatus::OutForDelivery => Some(DeliveryStatus::Delivered),
            DeliveryStatus::Delivered => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self,
            DeliveryStatus::Assigned | DeliveryStatus::PickedUp | DeliveryStatus::OutForDelivery
        )
    }
}

/// Kitchen-side view of the order, mirrored from the delivery progression.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FulfillmentStatus {
    Processing,
    OutForDelivery,
    Delivered,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub items: Vec<OrderItem>,
    pub amount: f64,
    pub fulfillment_status: FulfillmentStatus,
    pub delivery_status: DeliveryStatus,
    pub assigned_partner: Option<Uuid>,
    pub tracking_id: Option<String>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Validating constructor. Orders enter the system unassigned; the
    /// assignment engine is the only writer of the delivery fields.
    pub fn new(items: Vec<OrderItem>, amount: f64) -> Result<Self, AppError> {
        if items.is_empty() {
            return Err(AppError::InvalidInput(
                "order must contain at least one item".to_string(),
            ));
        }

        for item in &items {
            if item.name.trim().is_empty() {
                return Err(AppError::InvalidInput(
                    "item name cannot be empty".to_string(),
                ));
            }
            if item.quantity == 0 {
                return Err(AppError::InvalidInput(
                    "item quantity must be > 0".to_string(),
                ));
            }
        }

        if !amount.is_finite() || amount <= 0.0 {
            return Err(AppError::InvalidInput(
                "amount must be a positive number".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            items,
            amount,
            fulfillment_status: FulfillmentStatus::Processing,
            delivery_status: DeliveryStatus::NotAssigned,
            assigned_partner: None,
            tracking_id: None,
            estimated_delivery_time: None,
            created_at: Utc::now(),
        })
    }
}
