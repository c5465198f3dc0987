// src/services/tracking.rs
//
// Order tracking timeline. Display only: nothing here restricts which status
// an admin may write.

use crate::models::order::{OrderStatus, OrderStatusEvent, TrackingStep};

pub const FORWARD_PATH: [OrderStatus; 4] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
];

pub const RETURN_BRANCH: [OrderStatus; 5] = [
    OrderStatus::Cancelled,
    OrderStatus::ReturnRequested,
    OrderStatus::ReturnApproved,
    OrderStatus::Returned,
    OrderStatus::Refunded,
];

/// Forward path always; the cancel/return branch only once any of its
/// statuses shows up in the history or is the current status.
pub fn build_timeline(current: OrderStatus, history: &[OrderStatusEvent]) -> Vec<TrackingStep> {
    let seen = |status: OrderStatus| status == current || history.iter().any(|e| e.status == status);
    let branch_taken = RETURN_BRANCH.iter().any(|s| seen(*s));

    let mut statuses: Vec<OrderStatus> = FORWARD_PATH.to_vec();
    if branch_taken {
        statuses.extend(RETURN_BRANCH);
    }

    statuses
        .into_iter()
        .map(|status| TrackingStep {
            status,
            reached: seen(status),
            current: status == current,
            // history is oldest first
            reached_at: history
                .iter()
                .find(|e| e.status == status)
                .map(|e| e.created_at),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn history(statuses: &[OrderStatus]) -> Vec<OrderStatusEvent> {
        let order_id = Uuid::new_v4();
        let start = Utc::now();
        statuses
            .iter()
            .enumerate()
            .map(|(i, status)| OrderStatusEvent {
                id: Uuid::new_v4(),
                order_id,
                status: *status,
                note: None,
                created_at: start + Duration::minutes(i as i64),
            })
            .collect()
    }

    #[test]
    fn forward_only_when_no_branch_status_seen() {
        let events = history(&[OrderStatus::Pending, OrderStatus::Confirmed, OrderStatus::Shipped]);
        let steps = build_timeline(OrderStatus::Shipped, &events);

        assert_eq!(steps.len(), 4);
        assert!(steps[..3].iter().all(|s| s.reached));
        assert!(!steps[3].reached);
        assert!(steps[2].current);
        assert_eq!(steps[1].reached_at, Some(events[1].created_at));
    }

    #[test]
    fn branch_appears_once_cancelled() {
        let events = history(&[OrderStatus::Pending, OrderStatus::Cancelled]);
        let steps = build_timeline(OrderStatus::Cancelled, &events);

        assert_eq!(steps.len(), 9);
        let cancelled = steps.iter().find(|s| s.status == OrderStatus::Cancelled).unwrap();
        assert!(cancelled.reached && cancelled.current);
        let refunded = steps.iter().find(|s| s.status == OrderStatus::Refunded).unwrap();
        assert!(!refunded.reached);
    }

    #[test]
    fn branch_stays_visible_after_status_moves_on() {
        // A return was requested earlier; current status was later rewritten.
        let events = history(&[
            OrderStatus::Pending,
            OrderStatus::Delivered,
            OrderStatus::ReturnRequested,
            OrderStatus::Delivered,
        ]);
        let steps = build_timeline(OrderStatus::Delivered, &events);

        assert_eq!(steps.len(), 9);
        assert_eq!(
            steps.iter().filter(|s| s.current).count(),
            1
        );
    }

    #[test]
    fn current_status_without_history_still_counts() {
        let steps = build_timeline(OrderStatus::Refunded, &[]);
        assert_eq!(steps.len(), 9);
        assert!(steps.iter().find(|s| s.status == OrderStatus::Refunded).unwrap().reached);
    }
}
