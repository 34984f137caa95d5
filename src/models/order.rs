use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Geographic relationship between pickup and dropoff, resolved upstream
/// by the address layer. The core never derives this from coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ZoneClass {
    SameArea,
    BridgeCrossing,
    Island,
    OuterLagos,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Assigned,
    PickedUp,
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

/// Carried as metadata on the cancelling transition, not as separate states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CancelReason {
    CustomerCanceled,
    DriverCanceled,
    SupportCanceled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EventKind {
    Info,
    Status,
    Assignment,
    Issue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub order_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub text: String,
    pub actor: String,
    pub kind: EventKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub status: OrderStatus,
    pub rider_id: Option<Uuid>,
    /// Quoted delivery fare in whole naira.
    pub amount: i64,
    pub cod_amount: i64,
    pub cod_fee: i64,
    pub vehicle: String,
    pub pickup: String,
    pub dropoff: String,
    pub zone: ZoneClass,
    pub distance_km: f64,
    pub duration_minutes: i64,
    pub weight_kg: f64,
    pub cancel_reason: Option<CancelReason>,
    pub created_at: DateTime<Utc>,
}
