use chrono::{DateTime, Utc};
use serde::Serialize;
use voyago_core::booking::Booking;
use voyago_core::money::Cents;
use voyago_core::payment::PaymentMethod;
use voyago_inventory::refund::{refund_amount, refund_tier, RefundTier};

/// Settlement instructions for a cancellation.
#[derive(Debug, Clone, Serialize)]
pub struct RefundPlan {
    pub tier: RefundTier,
    pub refund_cents: Cents,
    pub cancellation_fee_cents: Cents,
    /// Wallet payments refund to the wallet, everything else goes back
    /// through the gateway.
    pub to_wallet: bool,
}

pub fn plan_refund(
    booking: &Booking,
    paid_with: Option<PaymentMethod>,
    cancelled_at: DateTime<Utc>,
) -> RefundPlan {
    let refundable = booking.paid_cents - booking.refunded_cents;
    let tier = refund_tier(booking.service_kind, booking.service_start, cancelled_at);
    let refund = refund_amount(
        booking.service_kind,
        refundable,
        booking.service_start,
        cancelled_at,
    );
    RefundPlan {
        tier,
        refund_cents: refund,
        cancellation_fee_cents: refundable - refund,
        to_wallet: paid_with == Some(PaymentMethod::Wallet),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;
    use voyago_core::booking::{BookingStatus, ServiceKind};
    use voyago_shared::pii::Masked;

    fn booking(kind: ServiceKind, paid: Cents, hours_out: i64) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            reference: "BK-TEST0001".to_string(),
            service_kind: kind,
            service_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            status: BookingStatus::Confirmed,
            contact_email: Masked::new("rider@example.com".to_string()),
            pnr: None,
            unit_count: 1,
            total_cents: paid,
            paid_cents: paid,
            refunded_cents: 0,
            details: serde_json::json!({}),
            service_start: now + Duration::hours(hours_out),
            service_end: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_full_refund_has_no_fee() {
        let b = booking(ServiceKind::Hotel, 20_000, 72);
        let plan = plan_refund(&b, Some(PaymentMethod::Card), Utc::now());
        assert_eq!(plan.tier, RefundTier::Full);
        assert_eq!(plan.refund_cents, 20_000);
        assert_eq!(plan.cancellation_fee_cents, 0);
        assert!(!plan.to_wallet);
    }

    #[test]
    fn test_half_refund_charges_the_rest_as_fee() {
        let b = booking(ServiceKind::Train, 10_000, 30);
        let plan = plan_refund(&b, Some(PaymentMethod::Upi), Utc::now());
        assert_eq!(plan.tier, RefundTier::Half);
        assert_eq!(plan.refund_cents, 5_000);
        assert_eq!(plan.cancellation_fee_cents, 5_000);
    }

    #[test]
    fn test_wallet_payment_refunds_to_wallet() {
        let b = booking(ServiceKind::Bus, 3_000, 10);
        let plan = plan_refund(&b, Some(PaymentMethod::Wallet), Utc::now());
        assert!(plan.to_wallet);
        assert_eq!(plan.refund_cents, 3_000);
    }

    #[test]
    fn test_prior_partial_refund_shrinks_the_base() {
        let mut b = booking(ServiceKind::Hotel, 20_000, 72);
        b.refunded_cents = 5_000;
        let plan = plan_refund(&b, Some(PaymentMethod::Card), Utc::now());
        assert_eq!(plan.refund_cents, 15_000);
    }

    #[test]
    fn test_unpaid_booking_refunds_nothing() {
        let mut b = booking(ServiceKind::Car, 0, 300);
        b.paid_cents = 0;
        let plan = plan_refund(&b, None, Utc::now());
        assert_eq!(plan.refund_cents, 0);
        assert_eq!(plan.cancellation_fee_cents, 0);
    }
}
