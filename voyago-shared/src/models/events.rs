use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingCreatedEvent {
    pub booking_id: Uuid,
    pub booking_reference: String,
    pub service_type: String,
    pub customer_id: String,
    pub total_cents: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingConfirmedEvent {
    pub booking_id: Uuid,
    pub booking_reference: String,
    pub payment_reference: String,
    pub total_cents: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingCancelledEvent {
    pub booking_id: Uuid,
    pub booking_reference: String,
    pub refund_cents: i64,
    pub cancellation_fee_cents: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct SeatBlockedEvent {
    pub service_id: Uuid,
    pub seat_number: String,
    pub session_id: Uuid,
    pub blocked_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct RefundIssuedEvent {
    pub refund_id: Uuid,
    pub booking_id: Uuid,
    pub amount_cents: i64,
    pub method: String,
    pub timestamp: i64,
}
