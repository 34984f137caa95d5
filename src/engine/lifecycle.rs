use crate::error::AppError;
use crate::models::order::{CancelReason, OrderStatus};

/// Legal order-status transitions. `Pending <-> Assigned` moves belong to the
/// assignment coordinator; the rest are operator or rider status changes.
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;

    matches!(
        (from, to),
        (Pending, Assigned)
            | (Assigned, Pending)
            | (Assigned, PickedUp)
            | (PickedUp, InTransit)
            | (InTransit, Delivered)
            | (Pending, Cancelled)
            | (Assigned, Cancelled)
            | (PickedUp, Cancelled)
    )
}

pub fn ensure_transition(from: OrderStatus, to: OrderStatus) -> Result<(), AppError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition(format!("{from:?} -> {to:?}")))
    }
}

/// Human-readable log line for an operator/rider status change.
pub fn describe_transition(to: OrderStatus, reason: Option<CancelReason>) -> String {
    match to {
        OrderStatus::PickedUp => "Parcel picked up".to_string(),
        OrderStatus::InTransit => "Parcel in transit".to_string(),
        OrderStatus::Delivered => "Parcel delivered".to_string(),
        OrderStatus::Cancelled => match reason {
            Some(reason) => format!("Order cancelled ({reason:?})"),
            None => "Order cancelled".to_string(),
        },
        OrderStatus::Pending => "Order pending".to_string(),
        OrderStatus::Assigned => "Order assigned".to_string(),
    }
}
