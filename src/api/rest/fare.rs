use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::engine::fare;
use crate::error::AppError;
use crate::models::order::ZoneClass;
use crate::models::quote::FareQuote;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/fare", post(quote_fare))
}

#[derive(Deserialize)]
pub struct FareRequest {
    pub vehicle: String,
    pub distance_km: f64,
    pub duration_minutes: i64,
    pub zone: ZoneClass,
    #[serde(default)]
    pub weight_kg: f64,
    #[serde(default)]
    pub weather_is_rainy: bool,
}

#[derive(Serialize)]
pub struct FareResponse {
    pub price: i64,
    pub quote: FareQuote,
}

async fn quote_fare(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FareRequest>,
) -> Result<Json<FareResponse>, AppError> {
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

    state
        .metrics
        .fare_quotes_total
        .with_label_values(&[&vehicle.name])
        .inc();

    Ok(Json(FareResponse {
        price: quote.final_price,
        quote,
    }))
}
