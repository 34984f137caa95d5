use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::{coordinator, fare};
use crate::error::AppError;
use crate::models::order::{CancelReason, EventKind, LogEvent, Order, OrderStatus, ZoneClass};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/log", get(get_order_log))
        .route("/orders/:id/assign", post(assign_order))
        .route("/orders/:id/status", post(change_order_status))
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub pickup: String,
    pub dropoff: String,
    pub vehicle: String,
    pub distance_km: f64,
    pub duration_minutes: i64,
    pub zone: ZoneClass,
    #[serde(default)]
    pub weight_kg: f64,
    #[serde(default)]
    pub cod_amount: i64,
    #[serde(default)]
    pub weather_is_rainy: bool,
}

#[derive(Deserialize)]
pub struct AssignRequest {
    /// Empty or absent means unassign.
    #[serde(default)]
    pub rider_id: String,
    pub actor: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
    pub reason: Option<CancelReason>,
    pub actor: Option<String>,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    if payload.pickup.trim().is_empty() || payload.dropoff.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "pickup and dropoff cannot be empty".to_string(),
        ));
    }
    if payload.cod_amount < 0 {
        return Err(AppError::InvalidInput(
            "cod_amount cannot be negative".to_string(),
        ));
    }

    let settings = state.settings_snapshot();
    let vehicle = settings
        .tariffs
        .find(&payload.vehicle)
        .ok_or_else(|| AppError::InvalidVehicleClass(payload.vehicle.clone()))?;

    let quote = fare::calculate(
        vehicle,
        payload.distance_km,
        payload.duration_minutes,
        payload.zone,
        payload.weight_kg,
        Utc::now(),
        payload.weather_is_rainy,
        &settings.surcharge,
        &settings.surge,
    )?;

    let order = Order {
        id: Uuid::new_v4(),
        status: OrderStatus::Pending,
        rider_id: None,
        amount: quote.final_price,
        cod_amount: payload.cod_amount,
        cod_fee: fare::cod_fee(payload.cod_amount, &settings.cod),
        vehicle: vehicle.name.clone(),
        pickup: payload.pickup,
        dropoff: payload.dropoff,
        zone: payload.zone,
        distance_km: payload.distance_km,
        duration_minutes: payload.duration_minutes,
        weight_kg: payload.weight_kg,
        cancel_reason: None,
        created_at: Utc::now(),
    };

    state.orders.insert(order.id, order.clone());
    state.append_log(LogEvent {
        order_id: order.id,
        timestamp: Utc::now(),
        text: format!("Order created ({} to {})", order.pickup, order.dropoff),
        actor: "System".to_string(),
        kind: EventKind::Info,
    });
    state.metrics.orders_created_total.inc();

    Ok(Json(order))
}

async fn list_orders(State(state): State<Arc<AppState>>) -> Json<Vec<Order>> {
    let orders = state.orders.iter().map(|entry| entry.value().clone()).collect();
    Json(orders)
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("order {} not found", id)))?;

    Ok(Json(order.value().clone()))
}

async fn get_order_log(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<LogEvent>>, AppError> {
    if !state.orders.contains_key(&id) {
        return Err(AppError::NotFound(format!("order {} not found", id)));
    }

    let events = state
        .order_logs
        .get(&id)
        .map(|entry| entry.value().clone())
        .unwrap_or_default();

    Ok(Json(events))
}

async fn assign_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRequest>,
) -> Result<Json<Order>, AppError> {
    let actor = payload.actor.unwrap_or_else(|| "Dispatcher".to_string());

    let order = if payload.rider_id.trim().is_empty() {
        coordinator::unassign(&state, id, &actor)?
    } else {
        let rider_id = Uuid::parse_str(payload.rider_id.trim()).map_err(|_| {
            AppError::InvalidInput(format!("rider_id is not a valid id: {}", payload.rider_id))
        })?;
        coordinator::assign(&state, id, rider_id, &actor)?
    };

    Ok(Json(order))
}

async fn change_order_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusRequest>,
) -> Result<Json<Order>, AppError> {
    let actor = payload.actor.unwrap_or_else(|| "Dispatcher".to_string());
    let order = coordinator::change_status(&state, id, payload.status, payload.reason, &actor)?;

    Ok(Json(order))
}
