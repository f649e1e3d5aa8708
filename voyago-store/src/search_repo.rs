use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use voyago_core::repository::{RepoError, SearchRepository};
use voyago_core::search::{
    BusOption, BusSearchRequest, CarOption, CarSearchRequest, HotelOption, HotelSearchRequest,
    TrainOption, TrainSearchRequest,
};
use voyago_inventory::fare::{runs_on, train_fare, TrainFareInputs};
use voyago_inventory::rac::{COACH_CAPACITY, RAC_LIMIT, WAITLIST_LIMIT};

pub struct StoreSearchRepository {
    pool: PgPool,
    service_tax_percent: i64,
}

impl StoreSearchRepository {
    pub fn new(pool: PgPool, service_tax_percent: i64) -> Self {
        Self {
            pool,
            service_tax_percent,
        }
    }
}

#[derive(sqlx::FromRow)]
struct HotelRow {
    hotel_id: Uuid,
    room_type_id: Uuid,
    hotel_name: String,
    city: String,
    star_rating: i16,
    room_type: String,
    rooms_available: i32,
    rate_per_night_cents: i64,
}

#[derive(sqlx::FromRow)]
struct CarRow {
    car_id: Uuid,
    make: String,
    model: String,
    category: String,
    seats: i16,
    transmission: String,
    daily_rate_cents: i64,
    weekly_rate_cents: i64,
    monthly_rate_cents: i64,
    deposit_cents: i64,
}

#[derive(sqlx::FromRow)]
struct BusRow {
    trip_id: Uuid,
    operator: String,
    bus_type: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    seats_available: i32,
    base_fare_cents: i64,
}

#[derive(sqlx::FromRow)]
struct TrainRow {
    run_id: Uuid,
    train_number: String,
    train_name: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    coach_class: String,
    is_ac: bool,
    is_superfast: bool,
    distance_km: i32,
    fare_per_km_cents: i64,
    reservation_charge_cents: i64,
    superfast_charge_cents: i64,
    running_days: i16,
    confirmed_count: i64,
    rac_count: i64,
    waitlist_count: i64,
}

#[async_trait]
impl SearchRepository for StoreSearchRepository {
    async fn search_hotels(&self, req: &HotelSearchRequest) -> Result<Vec<HotelOption>, RepoError> {
        let rows: Vec<HotelRow> = sqlx::query_as(
            r#"
            SELECT h.id AS hotel_id, rt.id AS room_type_id, h.name AS hotel_name, h.city,
                   h.star_rating, rt.name AS room_type, rt.available_rooms AS rooms_available,
                   rt.rate_per_night_cents
            FROM room_types rt
            JOIN hotels h ON h.id = rt.hotel_id
            WHERE h.city ILIKE $1 AND rt.available_rooms >= $2
              AND ($3::smallint IS NULL OR h.star_rating >= $3)
              AND ($4::bigint IS NULL OR rt.rate_per_night_cents <= $4)
            ORDER BY h.star_rating DESC, rt.rate_per_night_cents ASC
            "#,
        )
        .bind(&req.city)
        .bind(req.rooms as i32)
        .bind(req.min_star)
        .bind(req.max_rate_cents)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| HotelOption {
                hotel_id: r.hotel_id,
                room_type_id: r.room_type_id,
                hotel_name: r.hotel_name,
                city: r.city,
                star_rating: r.star_rating,
                room_type: r.room_type,
                rooms_available: r.rooms_available,
                rate_per_night_cents: r.rate_per_night_cents,
            })
            .collect())
    }

    async fn search_cars(&self, req: &CarSearchRequest) -> Result<Vec<CarOption>, RepoError> {
        let rows: Vec<CarRow> = sqlx::query_as(
            r#"
            SELECT c.id AS car_id, c.make, c.model, c.category, c.seats, c.transmission,
                   c.daily_rate_cents, c.weekly_rate_cents, c.monthly_rate_cents, c.deposit_cents
            FROM cars c
            WHERE c.city ILIKE $1 AND c.is_active
              AND NOT EXISTS (
                  SELECT 1 FROM car_rentals r
                  WHERE r.car_id = c.id AND r.starts_at < $3 AND r.ends_at > $2
              )
              AND ($4::text IS NULL OR c.category = $4)
              AND ($5::text IS NULL OR c.transmission = $5)
            ORDER BY c.daily_rate_cents ASC
            "#,
        )
        .bind(&req.city)
        .bind(req.pick_up)
        .bind(req.drop_off)
        .bind(req.category.as_deref())
        .bind(req.transmission.as_deref())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CarOption {
                car_id: r.car_id,
                make: r.make,
                model: r.model,
                category: r.category,
                seats: r.seats,
                transmission: r.transmission,
                daily_rate_cents: r.daily_rate_cents,
                weekly_rate_cents: r.weekly_rate_cents,
                monthly_rate_cents: r.monthly_rate_cents,
                deposit_cents: r.deposit_cents,
            })
            .collect())
    }

    async fn search_buses(&self, req: &BusSearchRequest) -> Result<Vec<BusOption>, RepoError> {
        let rows: Vec<BusRow> = sqlx::query_as(
            r#"
            SELECT t.id AS trip_id, t.operator, t.bus_type, t.departure_time, t.arrival_time,
                   t.seats_available, t.base_fare_cents
            FROM bus_trips t
            WHERE t.origin ILIKE $1 AND t.destination ILIKE $2
              AND t.departure_time::date = $3 AND t.seats_available > 0
            ORDER BY t.departure_time ASC
            "#,
        )
        .bind(&req.origin)
        .bind(&req.destination)
        .bind(req.date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| BusOption {
                trip_id: r.trip_id,
                operator: r.operator,
                bus_type: r.bus_type,
                departure_time: r.departure_time,
                arrival_time: r.arrival_time,
                seats_available: r.seats_available,
                base_fare_cents: r.base_fare_cents,
            })
            .collect())
    }

    async fn search_trains(
        &self,
        req: &TrainSearchRequest,
    ) -> Result<Vec<TrainOption>, RepoError> {
        let rows: Vec<TrainRow> = sqlx::query_as(
            r#"
            SELECT r.id AS run_id, r.train_number, r.train_name, r.departure_time, r.arrival_time,
                   r.coach_class, r.is_ac, r.is_superfast, r.distance_km, r.fare_per_km_cents,
                   r.reservation_charge_cents, r.superfast_charge_cents, r.running_days,
                   (SELECT COUNT(*) FROM train_tickets t
                    WHERE t.run_id = r.id AND t.status = 'CONFIRMED') AS confirmed_count,
                   (SELECT COUNT(*) FROM train_tickets t
                    WHERE t.run_id = r.id AND t.status = 'RAC') AS rac_count,
                   (SELECT COUNT(*) FROM train_tickets t
                    WHERE t.run_id = r.id AND t.status = 'WAITLISTED') AS waitlist_count
            FROM train_runs r
            WHERE r.origin ILIKE $1 AND r.destination ILIKE $2
            ORDER BY r.departure_time ASC
            "#,
        )
        .bind(&req.origin)
        .bind(&req.destination)
        .fetch_all(&self.pool)
        .await?;

        let options = rows
            .into_iter()
            .filter(|r| runs_on(r.running_days as u8, req.date))
            .map(|r| {
                let fare = train_fare(&TrainFareInputs {
                    distance_km: r.distance_km as i64,
                    fare_per_km_cents: r.fare_per_km_cents,
                    reservation_charge_cents: r.reservation_charge_cents,
                    superfast_charge_cents: if r.is_superfast {
                        r.superfast_charge_cents
                    } else {
                        0
                    },
                    is_ac_coach: r.is_ac,
                    is_tatkal: false,
                    service_tax_percent: self.service_tax_percent,
                });
                TrainOption {
                    run_id: r.run_id,
                    train_number: r.train_number,
                    train_name: r.train_name,
                    departure_time: r.departure_time,
                    arrival_time: r.arrival_time,
                    coach_class: r.coach_class,
                    confirmed_available: (COACH_CAPACITY as i64 - r.confirmed_count).max(0) as i32,
                    rac_available: (RAC_LIMIT as i64 - r.rac_count).max(0) as i32,
                    waitlist_open: r.waitlist_count < WAITLIST_LIMIT as i64,
                    fare_cents: fare.total_cents,
                }
            })
            .collect();

        Ok(options)
    }
}
