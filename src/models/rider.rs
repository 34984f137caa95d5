use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RiderStatus {
    Online,
    OnDelivery,
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rider {
    pub id: Uuid,
    pub name: String,
    /// Vehicle class name; must match a row in the active tariff table.
    pub vehicle: String,
    pub status: RiderStatus,
    /// Back-reference cache maintained by the assignment coordinator.
    /// The Order is the source of truth for who is assigned to whom.
    pub current_orders: Vec<Uuid>,
    pub updated_at: DateTime<Utc>,
}
