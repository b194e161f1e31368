use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::event::DeliveryEvent;
use crate::models::order::{DeliveryStatus, FulfillmentStatus};
use crate::registry;
use crate::state::AppState;
use crate::store::UpdateOutcome;

/// Fixed estimate handed to the customer at assignment time.
const DELIVERY_ESTIMATE_MINUTES: i64 = 45;

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentReceipt {
    pub order_id: Uuid,
    pub partner_id: Uuid,
    pub tracking_id: String,
    pub estimated_delivery_time: DateTime<Utc>,
}

/// Opaque customer-facing token, unique per assignment and immutable for
/// the lifetime of the order.
fn generate_tracking_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "TRK{}{}",
        now.timestamp_millis(),
        suffix[..9].to_uppercase()
    )
}

/// Bind an available partner to an unassigned order.
///
/// Commit protocol: the partner is claimed first with a conditional write
/// on `is_available`, then the order is claimed with a conditional write on
/// `delivery_status`. If the order claim loses, the partner claim is rolled
/// back before returning, so a failed call leaves no effect behind. Two
/// callers racing for the same partner or the same order resolve to exactly
/// one winner; the loser sees `Conflict` and must retry with fresh state.
pub fn assign(
    state: &AppState,
    order_id: Uuid,
    partner_id: Uuid,
) -> Result<AssignmentReceipt, AppError> {
    if state.orders.get(&order_id)?.is_none() {
        record_assignment(state, "not_found");
        return Err(AppError::NotFound(format!("order {order_id} not found")));
    }

    let claim = state.partners.conditional_update(
        &partner_id,
        |partner| partner.is_available,
        |partner| partner.is_available = false,
    )?;

    match claim {
        UpdateOutcome::Applied => {}
        UpdateOutcome::Missing => {
            record_assignment(state, "not_found");
            return Err(AppError::NotFound(format!(
                "partner {partner_id} not found"
            )));
        }
        UpdateOutcome::Rejected => {
            record_assignment(state, "conflict");
            return Err(AppError::Conflict(format!(
                "partner {partner_id} is not available"
            )));
        }
    }

    let now = Utc::now();
    let tracking_id = generate_tracking_id(now);
    let estimated_delivery_time = now + Duration::minutes(DELIVERY_ESTIMATE_MINUTES);

    let bound = state.orders.conditional_update(
        &order_id,
        |order| order.delivery_status == DeliveryStatus::NotAssigned,
        |order| {
            order.delivery_status = DeliveryStatus::Assigned;
            order.assigned_partner = Some(partner_id);
            order.tracking_id = Some(tracking_id.clone());
            order.estimated_delivery_time = Some(estimated_delivery_time);
        },
    )?;

    match bound {
        UpdateOutcome::Applied => {}
        UpdateOutcome::Missing => {
            release_partner(state, partner_id);
            record_assignment(state, "not_found");
            return Err(AppError::NotFound(format!("order {order_id} not found")));
        }
        UpdateOutcome::Rejected => {
            release_partner(state, partner_id);
            record_assignment(state, "conflict");
            return Err(AppError::Conflict(format!(
                "order {order_id} is already assigned"
            )));
        }
    }

    record_assignment(state, "success");
    state.metrics.active_assignments.inc();

    let _ = state.delivery_events_tx.send(DeliveryEvent::Assigned {
        order_id,
        partner_id,
        tracking_id: tracking_id.clone(),
        estimated_delivery_time,
        at: now,
    });

    info!(
        order_id = %order_id,
        partner_id = %partner_id,
        tracking_id = %tracking_id,
        "order assigned"
    );

    Ok(AssignmentReceipt {
        order_id,
        partner_id,
        tracking_id,
        estimated_delivery_time,
    })
}

/// Advance an order one step along the delivery progression. Only the
/// immediate successor is accepted; `Assigned` is reachable solely through
/// [`assign`]. On the terminal step the bound partner is released and
/// credited, and the conditional write doubles as the guard that keeps
/// that credit from ever running twice for one order.
pub fn advance_status(
    state: &AppState,
    order_id: Uuid,
    new_status: DeliveryStatus,
) -> Result<(), AppError> {
    if matches!(
        new_status,
        DeliveryStatus::NotAssigned | DeliveryStatus::Assigned
    ) {
        return Err(AppError::InvalidTransition(
            "assignment is made through the assignment engine, not a status update".to_string(),
        ));
    }

    let mut bound_partner = None;
    let outcome = state.orders.conditional_update(
        &order_id,
        |order| {
            order.delivery_status.successor() == Some(new_status) && order.assigned_partner.is_some()
        },
        |order| {
            order.delivery_status = new_status;
            order.fulfillment_status = match new_status {
                DeliveryStatus::Delivered => FulfillmentStatus::Delivered,
                _ => FulfillmentStatus::OutForDelivery,
            };
            bound_partner = order.assigned_partner;
        },
    )?;

    match outcome {
        UpdateOutcome::Applied => {}
        UpdateOutcome::Missing => {
            return Err(AppError::NotFound(format!("order {order_id} not found")));
        }
        UpdateOutcome::Rejected => {
            let current = state
                .orders
                .get(&order_id)?
                .map(|order| format!("{:?}", order.delivery_status))
                .unwrap_or_else(|| "unknown".to_string());
            return Err(AppError::InvalidTransition(format!(
                "cannot move order {order_id} from {current} to {new_status:?}"
            )));
        }
    }

    state
        .metrics
        .status_transitions_total
        .with_label_values(&[status_label(new_status)])
        .inc();

    let partner_id = match bound_partner {
        Some(id) => id,
        // The conditional check required a bound partner; unreachable in
        // practice but never worth a panic.
        None => {
            return Err(AppError::Internal(format!(
                "order {order_id} advanced without a bound partner"
            )));
        }
    };

    if new_status == DeliveryStatus::Delivered {
        // Only the caller whose conditional write applied reaches this
        // release-and-credit step, so the partner is credited exactly once
        // per delivered order.
        match registry::credit(state, partner_id) {
            Ok(()) => {
                state.metrics.deliveries_completed_total.inc();
                state.metrics.active_assignments.dec();
            }
            Err(AppError::NotFound(_)) => {
                warn!(
                    order_id = %order_id,
                    partner_id = %partner_id,
                    "delivered order references a missing partner; skipping credit"
                );
            }
            Err(err) => return Err(err),
        }
    }

    let _ = state.delivery_events_tx.send(DeliveryEvent::StatusChanged {
        order_id,
        partner_id,
        status: new_status,
        at: Utc::now(),
    });

    info!(order_id = %order_id, status = ?new_status, "delivery status advanced");

    Ok(())
}

fn release_partner(state: &AppState, partner_id: Uuid) {
    // Compensation for a lost order claim. The partner was claimed by this
    // call, so an unconditional release cannot clobber anyone else's claim.
    let _ = state
        .partners
        .update(&partner_id, |partner| partner.is_available = true);
}

fn record_assignment(state: &AppState, outcome: &str) {
    state
        .metrics
        .assignments_total
        .with_label_values(&[outcome])
        .inc();
}

fn status_label(status: DeliveryStatus) -> &'static str {
    match status {
        DeliveryStatus::NotAssigned => "not_assigned",
        DeliveryStatus::Assigned => "assigned",
        DeliveryStatus::PickedUp => "picked_up",
        DeliveryStatus::OutForDelivery => "out_for_delivery",
        DeliveryStatus::Delivered => "delivered",
    }
}
