//! Condition management helpers following Kubernetes API conventions

use chrono::{DateTime, Utc};

use crate::crd::Condition;

/// Standard condition statuses
pub const CONDITION_STATUS_TRUE: &str = "True";
pub const CONDITION_STATUS_FALSE: &str = "False";

/// Update or add a condition to the conditions list
///
/// If a condition with the same type exists, it is updated in place and its
/// transition time moves to `now` only when the status changes. Otherwise
/// the condition is added.
pub fn set_condition_at(
    conditions: &mut Vec<Condition>,
    type_: &str,
    status: &str,
    reason: &str,
    message: &str,
    now: DateTime<Utc>,
) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.type_ == type_) {
        // Update transition time only if status changed
        let should_update_time = existing.status != status;

        existing.status = status.to_string();
        existing.reason = reason.to_string();
        existing.message = message.to_string();

        if should_update_time {
            existing.last_transition_time = now.to_rfc3339();
        }
    } else {
        conditions.push(Condition {
            type_: type_.to_string(),
            status: status.to_string(),
            last_transition_time: now.to_rfc3339(),
            reason: reason.to_string(),
            message: message.to_string(),
        });
    }
}

/// Find a condition by type
pub fn find_condition<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

/// Check if a condition is true
pub fn is_condition_true(conditions: &[Condition], type_: &str) -> bool {
    find_condition(conditions, type_)
        .map(|c| c.status == CONDITION_STATUS_TRUE)
        .unwrap_or(false)
}
