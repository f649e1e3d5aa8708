use async_trait::async_trait;
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus, BusSeat, HistoryEntry, Passenger, ServiceKind};
use crate::money::Cents;
use crate::payment::{LedgerKind, Payment, PaymentStatus, Refund, Wallet, WalletTransaction};
use crate::search::{
    BusOption, BusSearchRequest, CarOption, CarSearchRequest, HotelOption, HotelSearchRequest,
    TrainOption, TrainSearchRequest,
};

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;

/// Result of an inventory reservation attempt for count-based services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    Reserved,
    Unavailable { available: i32 },
}

/// Result of reserving named seats on a bus trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatReserveOutcome {
    Reserved,
    Conflict { taken: Vec<String> },
}

/// Berth assignments handed back after a train reservation. Passengers
/// beyond confirmed capacity land in RAC or on the waitlist.
#[derive(Debug, Clone)]
pub enum TrainReserveOutcome {
    Allocated { passengers: Vec<Passenger> },
    TrainFull,
}

/// Passengers promoted when a cancellation frees berths.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PromotionReport {
    pub to_confirmed: Vec<Passenger>,
    pub to_rac: Vec<Passenger>,
}

/// Nightly rate card for a room type. Tax is a whole-percent add-on to
/// the stay total.
#[derive(Debug, Clone, Copy)]
pub struct RoomRate {
    pub rate_per_night_cents: Cents,
    pub tax_percent: i64,
}

/// Rate card for one car. The deposit is held, not charged.
#[derive(Debug, Clone, Copy)]
pub struct CarRates {
    pub daily_cents: Cents,
    pub weekly_cents: Cents,
    pub monthly_cents: Cents,
    pub deposit_cents: Cents,
}

/// Static attributes of a train run needed to quote a fare.
#[derive(Debug, Clone)]
pub struct TrainRunInfo {
    pub departure: chrono::DateTime<chrono::Utc>,
    pub arrival: chrono::DateTime<chrono::Utc>,
    pub is_ac: bool,
    pub is_superfast: bool,
    pub distance_km: i64,
    pub fare_per_km_cents: Cents,
    pub reservation_charge_cents: Cents,
    pub superfast_charge_cents: Cents,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ServiceSummary {
    pub service: ServiceKind,
    pub bookings: i64,
    pub revenue_cents: Cents,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DashboardSummary {
    pub total_bookings: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub cancelled: i64,
    pub expired: i64,
    pub gross_revenue_cents: Cents,
    pub refunded_cents: Cents,
    pub by_service: Vec<ServiceSummary>,
}

/// Run-wide quota usage for a journey segment: confirmed berths that
/// overlap the segment, plus RAC and waitlist ticket counts.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct TrainQuotaCounts {
    pub confirmed_overlapping: i64,
    pub rac: i64,
    pub waitlisted: i64,
}

/// Repository trait for availability search across all services
#[async_trait]
pub trait SearchRepository: Send + Sync {
    async fn search_hotels(&self, req: &HotelSearchRequest) -> Result<Vec<HotelOption>, RepoError>;

    async fn search_cars(&self, req: &CarSearchRequest) -> Result<Vec<CarOption>, RepoError>;

    async fn search_buses(&self, req: &BusSearchRequest) -> Result<Vec<BusOption>, RepoError>;

    async fn search_trains(&self, req: &TrainSearchRequest)
        -> Result<Vec<TrainOption>, RepoError>;
}

/// Repository trait for booking persistence and lifecycle
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create_booking(&self, booking: &Booking) -> Result<Uuid, RepoError>;

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, RepoError>;

    async fn get_by_reference(&self, reference: &str) -> Result<Option<Booking>, RepoError>;

    async fn list_bookings(&self, customer_id: Uuid) -> Result<Vec<Booking>, RepoError>;

    /// Compare-and-set status flip. Returns false when the booking is no
    /// longer in `from`, so racing writers cannot apply a transition twice.
    async fn update_status(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<bool, RepoError>;

    async fn update_amounts(
        &self,
        id: Uuid,
        paid_cents: Cents,
        refunded_cents: Cents,
    ) -> Result<(), RepoError>;

    async fn add_history(&self, entry: &HistoryEntry) -> Result<(), RepoError>;

    async fn list_history(&self, booking_id: Uuid) -> Result<Vec<HistoryEntry>, RepoError>;

    /// Pending bookings whose payment window has lapsed, for the expiry sweep.
    async fn list_unpaid_older_than(
        &self,
        cutoff: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<Booking>, RepoError>;

    async fn dashboard_summary(&self) -> Result<DashboardSummary, RepoError>;
}

/// Repository trait for inventory reservation and release. Implementations
/// must take row locks so concurrent requests never oversell.
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn room_rate(&self, room_type_id: Uuid) -> Result<Option<RoomRate>, RepoError>;

    async fn car_rates(&self, car_id: Uuid) -> Result<Option<CarRates>, RepoError>;

    async fn train_run_info(&self, run_id: Uuid) -> Result<Option<TrainRunInfo>, RepoError>;

    /// Quota usage for a segment of a run, for availability checks.
    async fn train_quota_counts(
        &self,
        run_id: Uuid,
        from_seq: i32,
        to_seq: i32,
    ) -> Result<Option<TrainQuotaCounts>, RepoError>;

    async fn reserve_rooms(
        &self,
        room_type_id: Uuid,
        count: i32,
    ) -> Result<ReserveOutcome, RepoError>;

    async fn release_rooms(&self, room_type_id: Uuid, count: i32) -> Result<(), RepoError>;

    async fn reserve_car(
        &self,
        car_id: Uuid,
        booking_id: Uuid,
        from: chrono::DateTime<chrono::Utc>,
        to: chrono::DateTime<chrono::Utc>,
    ) -> Result<ReserveOutcome, RepoError>;

    async fn release_car(&self, booking_id: Uuid) -> Result<(), RepoError>;

    async fn reserve_bus_seats(
        &self,
        trip_id: Uuid,
        booking_id: Uuid,
        seats: &[String],
    ) -> Result<SeatReserveOutcome, RepoError>;

    async fn release_bus_seats(&self, trip_id: Uuid, seats: &[String]) -> Result<(), RepoError>;

    /// Occupied and total seat counts, used by dynamic pricing.
    async fn bus_occupancy(&self, trip_id: Uuid) -> Result<(i32, i32), RepoError>;

    /// The trip's seat map with per-seat occupancy.
    async fn bus_seat_map(&self, trip_id: Uuid) -> Result<Vec<BusSeat>, RepoError>;

    /// Departure time and base fare, the inputs dynamic seat pricing
    /// needs besides occupancy.
    async fn bus_trip_pricing(
        &self,
        trip_id: Uuid,
    ) -> Result<(chrono::DateTime<chrono::Utc>, Cents), RepoError>;

    async fn reserve_train_berths(
        &self,
        run_id: Uuid,
        booking_id: Uuid,
        from_seq: i32,
        to_seq: i32,
        passengers: &[Passenger],
    ) -> Result<TrainReserveOutcome, RepoError>;

    /// Frees this booking's berths and promotes the RAC and waitlist queues.
    async fn release_train_berths(
        &self,
        run_id: Uuid,
        booking_id: Uuid,
    ) -> Result<PromotionReport, RepoError>;
}

/// Repository trait for payment and refund records
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create_payment(&self, payment: &Payment) -> Result<Uuid, RepoError>;

    async fn get_payment(&self, id: Uuid) -> Result<Option<Payment>, RepoError>;

    async fn get_payment_by_reference(&self, reference: &str)
        -> Result<Option<Payment>, RepoError>;

    async fn latest_payment_for_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<Payment>, RepoError>;

    async fn update_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
        gateway_txn: Option<&str>,
    ) -> Result<(), RepoError>;

    async fn create_refund(&self, refund: &Refund) -> Result<Uuid, RepoError>;

    async fn list_refunds(&self, booking_id: Uuid) -> Result<Vec<Refund>, RepoError>;
}

/// Outcome of a wallet debit attempt. Insufficient balance is a normal
/// business result, not a transport error.
#[derive(Debug, Clone)]
pub enum DebitOutcome {
    Debited(Wallet),
    Insufficient { balance_cents: Cents },
}

/// Repository trait for customer wallets and their ledger
#[async_trait]
pub trait WalletRepository: Send + Sync {
    async fn get_or_create(&self, customer_id: Uuid) -> Result<Wallet, RepoError>;

    async fn credit(
        &self,
        customer_id: Uuid,
        amount_cents: Cents,
        reference: &str,
        note: Option<&str>,
    ) -> Result<Wallet, RepoError>;

    async fn try_debit(
        &self,
        customer_id: Uuid,
        amount_cents: Cents,
        reference: &str,
        note: Option<&str>,
    ) -> Result<DebitOutcome, RepoError>;

    async fn list_transactions(
        &self,
        customer_id: Uuid,
        kind: Option<LedgerKind>,
    ) -> Result<Vec<WalletTransaction>, RepoError>;
}
