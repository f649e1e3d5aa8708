use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use voyago_shared::pii::Masked;

use crate::money::Cents;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceKind {
    Hotel,
    Car,
    Bus,
    Train,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Hotel => "HOTEL",
            ServiceKind::Car => "CAR",
            ServiceKind::Bus => "BUS",
            ServiceKind::Train => "TRAIN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "HOTEL" => Some(ServiceKind::Hotel),
            "CAR" => Some(ServiceKind::Car),
            "BUS" => Some(ServiceKind::Bus),
            "TRAIN" => Some(ServiceKind::Train),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Expired,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Expired => "EXPIRED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(BookingStatus::Pending),
            "CONFIRMED" => Some(BookingStatus::Confirmed),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            "EXPIRED" => Some(BookingStatus::Expired),
            _ => None,
        }
    }
}

/// Per-passenger berth state on trains. A booking can be CONFIRMED while
/// individual passengers sit in RAC or on the waitlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Confirmed,
    Rac,
    Waitlisted,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Confirmed => "CONFIRMED",
            TicketStatus::Rac => "RAC",
            TicketStatus::Waitlisted => "WAITLISTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CONFIRMED" => Some(TicketStatus::Confirmed),
            "RAC" => Some(TicketStatus::Rac),
            "WAITLISTED" => Some(TicketStatus::Waitlisted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub reference: String,
    pub service_kind: ServiceKind,
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub status: BookingStatus,
    pub contact_email: Masked<String>,
    /// Present for train and bus bookings only.
    pub pnr: Option<String>,
    pub unit_count: i32,
    pub total_cents: Cents,
    pub paid_cents: Cents,
    pub refunded_cents: Cents,
    /// Service-specific details: seat numbers, room type, passenger list.
    pub details: serde_json::Value,
    pub service_start: DateTime<Utc>,
    pub service_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub from_status: Option<BookingStatus>,
    pub to_status: BookingStatus,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatPosition {
    Window,
    Aisle,
    Sleeper,
    EmergencyExit,
    NearToilet,
}

impl SeatPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatPosition::Window => "WINDOW",
            SeatPosition::Aisle => "AISLE",
            SeatPosition::Sleeper => "SLEEPER",
            SeatPosition::EmergencyExit => "EMERGENCY_EXIT",
            SeatPosition::NearToilet => "NEAR_TOILET",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "WINDOW" => Some(SeatPosition::Window),
            "AISLE" => Some(SeatPosition::Aisle),
            "SLEEPER" => Some(SeatPosition::Sleeper),
            "EMERGENCY_EXIT" => Some(SeatPosition::EmergencyExit),
            "NEAR_TOILET" => Some(SeatPosition::NearToilet),
            _ => None,
        }
    }
}

/// One entry in a bus trip's seat map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusSeat {
    pub number: String,
    pub position: SeatPosition,
    pub taken: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passenger {
    pub name: String,
    pub age: i32,
    /// Assigned berth or seat, absent while RAC or waitlisted.
    pub seat: Option<String>,
    pub ticket_status: TicketStatus,
    /// Queue position for RAC and waitlisted passengers.
    pub queue_position: Option<i32>,
}
