use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::engine::lifecycle;
use crate::error::AppError;
use crate::models::order::{CancelReason, EventKind, LogEvent, Order, OrderStatus};
use crate::models::rider::RiderStatus;
use crate::state::AppState;

/// Binds a rider to a pending order, enforcing the rider's vehicle-class
/// concurrency cap. Entry guards are always taken order-first, then rider;
/// the capacity check runs under the rider guard, so two dispatchers racing
/// the same rider cannot push it over cap.
pub fn assign(
    state: &AppState,
    order_id: Uuid,
    rider_id: Uuid,
    actor: &str,
) -> Result<Order, AppError> {
    let result = do_assign(state, order_id, rider_id, actor);

    let outcome = if result.is_ok() { "success" } else { "error" };
    state
        .metrics
        .assignments_total
        .with_label_values(&[outcome])
        .inc();

    result
}

fn do_assign(
    state: &AppState,
    order_id: Uuid,
    rider_id: Uuid,
    actor: &str,
) -> Result<Order, AppError> {
    let dispatch = state.settings_snapshot().dispatch;

    let mut order = state
        .orders
        .get_mut(&order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    if let Some(current) = order.rider_id {
        // Retried assign after a network failure; nothing to redo.
        if current == rider_id {
            return Ok(order.clone());
        }
        return Err(AppError::Conflict(format!(
            "order {order_id} is already assigned"
        )));
    }
    if order.status != OrderStatus::Pending {
        return Err(AppError::Conflict(format!(
            "order {order_id} is {:?}, not Pending",
            order.status
        )));
    }

    let mut rider = state
        .riders
        .get_mut(&rider_id)
        .ok_or_else(|| AppError::NotFound(format!("rider {rider_id} not found")))?;

    if rider.status == RiderStatus::Offline {
        return Err(AppError::RiderUnavailable(format!(
            "{} is offline",
            rider.name
        )));
    }
    let cap = dispatch.cap_for(&rider.vehicle);
    if rider.current_orders.len() >= cap {
        return Err(AppError::RiderUnavailable(format!(
            "{} already holds {} order(s)",
            rider.name,
            rider.current_orders.len()
        )));
    }

    order.rider_id = Some(rider_id);
    order.status = OrderStatus::Assigned;

    rider.current_orders.push(order_id);
    if rider.current_orders.len() >= cap {
        rider.status = RiderStatus::OnDelivery;
    }
    rider.updated_at = Utc::now();

    state
        .metrics
        .rider_utilization
        .with_label_values(&[&rider_id.to_string()])
        .set(rider.current_orders.len() as f64 / cap as f64);

    let event = LogEvent {
        order_id,
        timestamp: Utc::now(),
        text: format!("Assigned to {} ({})", rider.name, rider.vehicle),
        actor: actor.to_string(),
        kind: EventKind::Assignment,
    };

    let snapshot = order.clone();
    drop(rider);
    drop(order);

    state.append_log(event);
    info!(order_id = %order_id, rider_id = %rider_id, "order assigned");

    Ok(snapshot)
}

/// Releases an assigned order back to the pending pool. Only orders still in
/// `Assigned` can be released; after pickup the parcel is with the rider and
/// the order must be cancelled instead.
pub fn unassign(state: &AppState, order_id: Uuid, actor: &str) -> Result<Order, AppError> {
    let mut order = state
        .orders
        .get_mut(&order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    let Some(rider_id) = order.rider_id else {
        return Err(AppError::OrderNotAssigned);
    };
    if order.status != OrderStatus::Assigned {
        return Err(AppError::Conflict(format!(
            "cannot unassign order in {:?}",
            order.status
        )));
    }

    order.rider_id = None;
    order.status = OrderStatus::Pending;

    let snapshot = order.clone();
    drop(order);

    release_rider_slot(state, rider_id, order_id);

    state.append_log(LogEvent {
        order_id,
        timestamp: Utc::now(),
        text: "Rider unassigned".to_string(),
        actor: actor.to_string(),
        kind: EventKind::Issue,
    });
    state
        .metrics
        .assignments_total
        .with_label_values(&["unassigned"])
        .inc();
    info!(order_id = %order_id, rider_id = %rider_id, "rider unassigned");

    Ok(snapshot)
}

/// Operator/rider status change along the delivery flow. `Pending` and
/// `Assigned` are reached through assign/unassign, never through here.
pub fn change_status(
    state: &AppState,
    order_id: Uuid,
    to: OrderStatus,
    reason: Option<CancelReason>,
    actor: &str,
) -> Result<Order, AppError> {
    if matches!(to, OrderStatus::Pending | OrderStatus::Assigned) {
        return Err(AppError::InvalidTransition(format!(
            "{to:?} is reached through assignment, not a status change"
        )));
    }

    let mut order = state
        .orders
        .get_mut(&order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    lifecycle::ensure_transition(order.status, to)?;

    let from = order.status;
    order.status = to;
    if to == OrderStatus::Cancelled {
        order.cancel_reason = reason;
    }

    // Terminal states keep the last rider on the order for audit; the
    // rider's capacity slot is released either way.
    let released_rider = if to.is_terminal() { order.rider_id } else { None };

    let snapshot = order.clone();
    drop(order);

    if let Some(rider_id) = released_rider {
        release_rider_slot(state, rider_id, order_id);
    }

    state.append_log(LogEvent {
        order_id,
        timestamp: Utc::now(),
        text: lifecycle::describe_transition(to, reason),
        actor: actor.to_string(),
        kind: EventKind::Status,
    });
    info!(order_id = %order_id, from = ?from, to = ?to, "order status changed");

    Ok(snapshot)
}

fn release_rider_slot(state: &AppState, rider_id: Uuid, order_id: Uuid) {
    let dispatch = state.settings_snapshot().dispatch;

    if let Some(mut rider) = state.riders.get_mut(&rider_id) {
        rider.current_orders.retain(|id| *id != order_id);

        let cap = dispatch.cap_for(&rider.vehicle);
        if rider.status == RiderStatus::OnDelivery && rider.current_orders.len() < cap {
            rider.status = RiderStatus::Online;
        }
        rider.updated_at = Utc::now();

        state
            .metrics
            .rider_utilization
            .with_label_values(&[&rider_id.to_string()])
            .set(rider.current_orders.len() as f64 / cap as f64);
    }
}
