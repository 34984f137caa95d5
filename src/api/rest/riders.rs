use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::rider::{Rider, RiderStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/riders", post(create_rider).get(list_riders))
        .route("/riders/:id/status", patch(update_rider_status))
}

#[derive(Deserialize)]
pub struct CreateRiderRequest {
    pub name: String,
    pub vehicle: String,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: RiderStatus,
}

async fn create_rider(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateRiderRequest>,
) -> Result<Json<Rider>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::InvalidInput("name cannot be empty".to_string()));
    }

    let settings = state.settings_snapshot();
    let vehicle = settings
        .tariffs
        .find(&payload.vehicle)
        .ok_or_else(|| AppError::InvalidVehicleClass(payload.vehicle.clone()))?;

    let rider = Rider {
        id: Uuid::new_v4(),
        name: payload.name,
        vehicle: vehicle.name.clone(),
        status: RiderStatus::Online,
        current_orders: Vec::new(),
        updated_at: Utc::now(),
    };

    state.riders.insert(rider.id, rider.clone());
    Ok(Json(rider))
}

async fn list_riders(State(state): State<Arc<AppState>>) -> Json<Vec<Rider>> {
    let riders = state.riders.iter().map(|entry| entry.value().clone()).collect();
    Json(riders)
}

async fn update_rider_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Rider>, AppError> {
    if payload.status == RiderStatus::OnDelivery {
        return Err(AppError::InvalidInput(
            "OnDelivery is managed by assignment".to_string(),
        ));
    }

    let mut rider = state
        .riders
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("rider {} not found", id)))?;

    if payload.status == RiderStatus::Offline && !rider.current_orders.is_empty() {
        return Err(AppError::Conflict(format!(
            "{} still holds {} order(s)",
            rider.name,
            rider.current_orders.len()
        )));
    }

    rider.status = payload.status;
    rider.updated_at = Utc::now();

    Ok(Json(rider.clone()))
}
