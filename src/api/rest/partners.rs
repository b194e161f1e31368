use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::order::Order;
use crate::models::partner::{GeoPoint, Partner, VehicleType};
use crate::registry;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/partners", post(register_partner).get(list_partners))
        .route("/partners/available", get(list_available_partners))
        .route("/partners/:id", get(get_partner))
        .route("/partners/:id/location", patch(report_location))
        .route("/partners/:id/availability", patch(set_availability))
        .route("/partners/:id/orders", get(active_orders))
}

#[derive(Deserialize)]
pub struct RegisterPartnerRequest {
    pub name: String,
    pub phone: String,
    pub vehicle_type: VehicleType,
    pub vehicle_number: String,
    pub rating: Option<f64>,
}

#[derive(Deserialize)]
pub struct ReportLocationRequest {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Deserialize)]
pub struct SetAvailabilityRequest {
    pub is_available: bool,
}

async fn register_partner(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterPartnerRequest>,
) -> Result<Json<Partner>, AppError> {
    let partner = Partner::new(
        payload.name,
        payload.phone,
        payload.vehicle_type,
        payload.vehicle_number,
        payload.rating.unwrap_or(5.0),
    )?;
    state.partners.insert(partner.id, partner.clone())?;

    Ok(Json(partner))
}

async fn list_partners(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Partner>>, AppError> {
    Ok(Json(state.partners.find(|_| true)?))
}

async fn list_available_partners(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Partner>>, AppError> {
    Ok(Json(registry::list_available(&state)?))
}

async fn get_partner(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Partner>, AppError> {
    Ok(Json(registry::get_by_id(&state, id)?))
}

async fn report_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReportLocationRequest>,
) -> Result<Json<Partner>, AppError> {
    registry::report_location(
        &state,
        id,
        GeoPoint {
            lat: payload.lat,
            lng: payload.lng,
        },
    )?;

    Ok(Json(registry::get_by_id(&state, id)?))
}

async fn set_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetAvailabilityRequest>,
) -> Result<Json<Partner>, AppError> {
    registry::set_availability(&state, id, payload.is_available)?;

    Ok(Json(registry::get_by_id(&state, id)?))
}

/// Orders the partner is currently carrying, for the partner app's work
/// list.
async fn active_orders(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Order>>, AppError> {
    registry::get_by_id(&state, id)?;

    let orders = state.orders.find(|order| {
        order.assigned_partner == Some(id) && order.delivery_status.is_active()
    })?;

    Ok(Json(orders))
}
