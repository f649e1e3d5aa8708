use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use voyago_core::booking::ServiceKind;
use voyago_core::money::Cents;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundTier {
    Full,
    Half,
    None,
}

/// Cancellation cutoffs in hours before the service starts. A booking
/// cancelled at or beyond `full_hours` refunds everything, at or beyond
/// `half_hours` refunds half, later nothing.
struct PolicyRow {
    full_hours: i64,
    half_hours: Option<i64>,
}

fn policy(kind: ServiceKind) -> PolicyRow {
    match kind {
        ServiceKind::Hotel => PolicyRow {
            full_hours: 48,
            half_hours: Some(24),
        },
        ServiceKind::Car => PolicyRow {
            full_hours: 168,
            half_hours: Some(72),
        },
        ServiceKind::Bus => PolicyRow {
            full_hours: 4,
            half_hours: None,
        },
        ServiceKind::Train => PolicyRow {
            full_hours: 48,
            half_hours: Some(24),
        },
    }
}

pub fn refund_tier(
    kind: ServiceKind,
    service_start: DateTime<Utc>,
    cancelled_at: DateTime<Utc>,
) -> RefundTier {
    let hours_before = (service_start - cancelled_at).num_hours();
    let row = policy(kind);
    if hours_before >= row.full_hours {
        RefundTier::Full
    } else if row.half_hours.is_some_and(|h| hours_before >= h) {
        RefundTier::Half
    } else {
        RefundTier::None
    }
}

/// Refund due on the amount actually paid. Odd cents round in the
/// customer's favour on the half tier.
pub fn refund_amount(
    kind: ServiceKind,
    paid_cents: Cents,
    service_start: DateTime<Utc>,
    cancelled_at: DateTime<Utc>,
) -> Cents {
    match refund_tier(kind, service_start, cancelled_at) {
        RefundTier::Full => paid_cents,
        RefundTier::Half => (paid_cents + 1) / 2,
        RefundTier::None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_hotel_tiers() {
        let start = Utc::now() + Duration::hours(72);
        assert_eq!(
            refund_tier(ServiceKind::Hotel, start, Utc::now()),
            RefundTier::Full
        );
        let start = Utc::now() + Duration::hours(30);
        assert_eq!(
            refund_tier(ServiceKind::Hotel, start, Utc::now()),
            RefundTier::Half
        );
        let start = Utc::now() + Duration::hours(5);
        assert_eq!(
            refund_tier(ServiceKind::Hotel, start, Utc::now()),
            RefundTier::None
        );
    }

    #[test]
    fn test_car_has_week_long_full_window() {
        let start = Utc::now() + Duration::days(8);
        assert_eq!(
            refund_tier(ServiceKind::Car, start, Utc::now()),
            RefundTier::Full
        );
        let start = Utc::now() + Duration::hours(100);
        assert_eq!(
            refund_tier(ServiceKind::Car, start, Utc::now()),
            RefundTier::Half
        );
    }

    #[test]
    fn test_bus_has_no_half_tier() {
        let start = Utc::now() + Duration::hours(5);
        assert_eq!(
            refund_tier(ServiceKind::Bus, start, Utc::now()),
            RefundTier::Full
        );
        let start = Utc::now() + Duration::hours(3);
        assert_eq!(
            refund_tier(ServiceKind::Bus, start, Utc::now()),
            RefundTier::None
        );
    }

    #[test]
    fn test_half_refund_rounds_up() {
        let start = Utc::now() + Duration::hours(30);
        assert_eq!(refund_amount(ServiceKind::Train, 10_001, start, Utc::now()), 5_001);
    }

    #[test]
    fn test_past_service_refunds_nothing() {
        let start = Utc::now() - Duration::hours(1);
        assert_eq!(refund_amount(ServiceKind::Train, 10_000, start, Utc::now()), 0);
    }
}
