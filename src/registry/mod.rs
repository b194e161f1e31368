use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::partner::{GeoPoint, Partner};
use crate::state::AppState;

/// Partner registry operations. Which partner gets an order is a human
/// dispatcher decision made over `list_available`; the registry performs no
/// matching of its own.
pub fn list_available(state: &AppState) -> Result<Vec<Partner>, AppError> {
    Ok(state.partners.find(|partner| partner.is_available)?)
}

pub fn get_by_id(state: &AppState, partner_id: Uuid) -> Result<Partner, AppError> {
    state
        .partners
        .get(&partner_id)?
        .ok_or_else(|| AppError::NotFound(format!("partner {partner_id} not found")))
}

pub fn set_availability(
    state: &AppState,
    partner_id: Uuid,
    available: bool,
) -> Result<(), AppError> {
    let found = state
        .partners
        .update(&partner_id, |partner| partner.is_available = available)?;

    if !found {
        return Err(AppError::NotFound(format!(
            "partner {partner_id} not found"
        )));
    }

    Ok(())
}

/// Release the partner and add one completed delivery. Called exclusively
/// by the assignment engine's terminal-transition step, which is what keeps
/// the counter at exactly one increment per delivered order.
pub fn credit(state: &AppState, partner_id: Uuid) -> Result<(), AppError> {
    let found = state.partners.update(&partner_id, |partner| {
        partner.is_available = true;
        partner.total_deliveries += 1;
    })?;

    if !found {
        return Err(AppError::NotFound(format!(
            "partner {partner_id} not found"
        )));
    }

    Ok(())
}

/// Last-write-wins overwrite of the partner's self-reported position. A
/// partner has exactly one reporting agent, so no ordering is enforced
/// across writes, and coordinates are stored as received.
pub fn report_location(
    state: &AppState,
    partner_id: Uuid,
    location: GeoPoint,
) -> Result<(), AppError> {
    let found = state
        .partners
        .update(&partner_id, |partner| {
            partner.current_location = Some(location)
        })?;

    if !found {
        return Err(AppError::NotFound(format!(
            "partner {partner_id} not found"
        )));
    }

    state.metrics.location_updates_total.inc();
    debug!(partner_id = %partner_id, lat = location.lat, lng = location.lng, "location updated");

    Ok(())
}
