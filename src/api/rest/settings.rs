use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;
use tracing::info;

use crate::error::AppError;
use crate::models::settings::SystemSettings;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/settings", get(get_settings).post(replace_settings))
}

async fn get_settings(State(state): State<Arc<AppState>>) -> Json<SystemSettings> {
    Json(state.settings_snapshot())
}

/// Replaces the active configuration as one document. There is no partial
/// application: an invalid document leaves the current one untouched.
async fn replace_settings(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SystemSettings>,
) -> Result<Json<SystemSettings>, AppError> {
    payload.validate().map_err(AppError::InvalidInput)?;

    state.replace_settings(payload.clone());
    info!(
        vehicles = payload.tariffs.vehicles.len(),
        "settings replaced"
    );

    Ok(Json(payload))
}
