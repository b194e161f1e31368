use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::engine::assignment::{self, AssignmentReceipt};
use crate::engine::tracking::{self, TrackingView};
use crate::error::AppError;
use crate::models::order::{DeliveryStatus, Order, OrderItem};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/track", get(track_order))
        .route("/orders/:id/status", patch(advance_status))
        .route("/assignments", post(create_assignment))
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItem>,
    pub amount: f64,
}

#[derive(Deserialize)]
pub struct CreateAssignmentRequest {
    pub order_id: Uuid,
    pub partner_id: Uuid,
}

#[derive(Deserialize)]
pub struct AdvanceStatusRequest {
    pub status: String,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    let order = Order::new(payload.items, payload.amount)?;
    state.orders.insert(order.id, order.clone())?;

    Ok(Json(order))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .get(&id)?
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;

    Ok(Json(order))
}

async fn track_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TrackingView>, AppError> {
    Ok(Json(tracking::track(&state, id)?))
}

async fn create_assignment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateAssignmentRequest>,
) -> Result<Json<AssignmentReceipt>, AppError> {
    let receipt = assignment::assign(&state, payload.order_id, payload.partner_id)?;
    Ok(Json(receipt))
}

async fn advance_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdvanceStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let status = parse_status(&payload.status)?;
    assignment::advance_status(&state, id, status)?;

    Ok(Json(json!({ "ok": true })))
}

fn parse_status(raw: &str) -> Result<DeliveryStatus, AppError> {
    match raw {
        "NotAssigned" => Ok(DeliveryStatus::NotAssigned),
        "Assigned" => Ok(DeliveryStatus::Assigned),
        "PickedUp" => Ok(DeliveryStatus::PickedUp),
        "OutForDelivery" => Ok(DeliveryStatus::OutForDelivery),
        "Delivered" => Ok(DeliveryStatus::Delivered),
        other => Err(AppError::InvalidInput(format!(
            "unknown status: {other}, expected NotAssigned/Assigned/PickedUp/OutForDelivery/Delivered"
        ))),
    }
}
