use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Cents;

#[derive(Debug, Deserialize)]
pub struct HotelSearchRequest {
    pub city: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub rooms: u32,
    pub min_star: Option<i16>,
    pub max_rate_cents: Option<Cents>,
}

#[derive(Debug, Serialize)]
pub struct HotelOption {
    pub hotel_id: Uuid,
    pub room_type_id: Uuid,
    pub hotel_name: String,
    pub city: String,
    pub star_rating: i16,
    pub room_type: String,
    pub rooms_available: i32,
    pub rate_per_night_cents: Cents,
}

#[derive(Debug, Deserialize)]
pub struct CarSearchRequest {
    pub city: String,
    pub pick_up: DateTime<Utc>,
    pub drop_off: DateTime<Utc>,
    pub category: Option<String>,
    pub transmission: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CarOption {
    pub car_id: Uuid,
    pub make: String,
    pub model: String,
    pub category: String,
    pub seats: i16,
    pub transmission: String,
    pub daily_rate_cents: Cents,
    pub weekly_rate_cents: Cents,
    pub monthly_rate_cents: Cents,
    pub deposit_cents: Cents,
}

#[derive(Debug, Deserialize)]
pub struct BusSearchRequest {
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct BusOption {
    pub trip_id: Uuid,
    pub operator: String,
    pub bus_type: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub seats_available: i32,
    pub base_fare_cents: Cents,
}

#[derive(Debug, Deserialize)]
pub struct TrainSearchRequest {
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct TrainOption {
    pub run_id: Uuid,
    pub train_number: String,
    pub train_name: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub coach_class: String,
    pub confirmed_available: i32,
    pub rac_available: i32,
    pub waitlist_open: bool,
    pub fare_cents: Cents,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hotel_request_deserializes() {
        let json = r#"
            {
                "city": "Jaipur",
                "check_in": "2026-09-01",
                "check_out": "2026-09-04",
                "rooms": 2
            }
        "#;
        let req: HotelSearchRequest = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(req.city, "Jaipur");
        assert_eq!(req.rooms, 2);
        assert_eq!(req.check_in, NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
    }

    #[test]
    fn train_request_deserializes() {
        let json = r#"
            {
                "origin": "NDLS",
                "destination": "BCT",
                "date": "2026-10-15"
            }
        "#;
        let req: TrainSearchRequest = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(req.origin, "NDLS");
        assert_eq!(req.destination, "BCT");
    }
}
