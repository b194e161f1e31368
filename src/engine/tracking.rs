use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::order::{DeliveryStatus, FulfillmentStatus, OrderItem};
use crate::models::partner::{GeoPoint, VehicleType};
use crate::state::AppState;

/// What the customer sees about the partner carrying their order. Contact
/// and vehicle details only; credentials and availability stay internal.
#[derive(Debug, Clone, Serialize)]
pub struct PartnerSnapshot {
    pub name: String,
    pub phone: String,
    pub vehicle_type: VehicleType,
    pub rating: f64,
    pub current_location: Option<GeoPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackingView {
    pub order_id: Uuid,
    pub items: Vec<OrderItem>,
    pub amount: f64,
    pub fulfillment_status: FulfillmentStatus,
    pub delivery_status: DeliveryStatus,
    pub tracking_id: Option<String>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    /// Mirror of the assigned partner's last reported position at the time
    /// of this query; not separately stored.
    pub last_known_location: Option<GeoPoint>,
    pub partner: Option<PartnerSnapshot>,
}

/// Compose order and partner state into a single poll-friendly view.
/// `NotFound` only when the order itself is missing; a dangling partner
/// reference degrades to an order-only view instead of failing.
pub fn track(state: &AppState, order_id: Uuid) -> Result<TrackingView, AppError> {
    let order = state
        .orders
        .get(&order_id)?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    let partner = match order.assigned_partner {
        Some(partner_id) => {
            let found = state.partners.get(&partner_id)?;
            if found.is_none() {
                warn!(
                    order_id = %order_id,
                    partner_id = %partner_id,
                    "assigned partner no longer exists; serving degraded view"
                );
            }
            found
        }
        None => None,
    };

    let last_known_location = partner
        .as_ref()
        .and_then(|partner| partner.current_location);

    Ok(TrackingView {
        order_id: order.id,
        items: order.items,
        amount: order.amount,
        fulfillment_status: order.fulfillment_status,
        delivery_status: order.delivery_status,
        tracking_id: order.tracking_id,
        estimated_delivery_time: order.estimated_delivery_time,
        last_known_location,
        partner: partner.map(|partner| PartnerSnapshot {
            name: partner.name,
            phone: partner.phone,
            vehicle_type: partner.vehicle_type,
            rating: partner.rating,
            current_location: partner.current_location,
        }),
    })
}
