use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use voyago_core::booking::{BusSeat, Passenger, SeatPosition, TicketStatus};
use voyago_core::repository::{
    CarRates, InventoryRepository, PromotionReport, RepoError, ReserveOutcome, RoomRate,
    SeatReserveOutcome, TrainQuotaCounts, TrainReserveOutcome, TrainRunInfo,
};
use voyago_inventory::rac::{
    allocate, berth_label, free_berth_for_segment, promotion_plan, segments_overlap,
    AllocationError, BerthDecision, QuotaCounts, COACH_CAPACITY,
};

pub struct StoreInventoryRepository {
    pool: PgPool,
}

impl StoreInventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    passenger_name: String,
    age: i32,
    status: String,
    berth_index: Option<i32>,
    queue_position: Option<i32>,
    from_seq: i32,
    to_seq: i32,
}

impl TicketRow {
    fn status(&self) -> Result<TicketStatus, RepoError> {
        TicketStatus::parse(&self.status)
            .ok_or_else(|| format!("unknown ticket status: {}", self.status).into())
    }
}

fn passenger_from(row: &TicketRow, coach: &str) -> Result<Passenger, RepoError> {
    Ok(Passenger {
        name: row.passenger_name.clone(),
        age: row.age,
        seat: row.berth_index.map(|i| berth_label(coach, i)),
        ticket_status: row.status()?,
        queue_position: row.queue_position,
    })
}

#[async_trait]
impl InventoryRepository for StoreInventoryRepository {
    async fn room_rate(&self, room_type_id: Uuid) -> Result<Option<RoomRate>, RepoError> {
        let row: Option<(i64, i16)> =
            sqlx::query_as("SELECT rate_per_night_cents, tax_percent FROM room_types WHERE id = $1")
                .bind(room_type_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(rate, tax)| RoomRate {
            rate_per_night_cents: rate,
            tax_percent: tax as i64,
        }))
    }

    async fn car_rates(&self, car_id: Uuid) -> Result<Option<CarRates>, RepoError> {
        let row: Option<(i64, i64, i64, i64)> = sqlx::query_as(
            "SELECT daily_rate_cents, weekly_rate_cents, monthly_rate_cents, deposit_cents \
             FROM cars WHERE id = $1",
        )
        .bind(car_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(daily, weekly, monthly, deposit)| CarRates {
            daily_cents: daily,
            weekly_cents: weekly,
            monthly_cents: monthly,
            deposit_cents: deposit,
        }))
    }

    async fn train_run_info(&self, run_id: Uuid) -> Result<Option<TrainRunInfo>, RepoError> {
        #[derive(sqlx::FromRow)]
        struct RunRow {
            departure_time: DateTime<Utc>,
            arrival_time: DateTime<Utc>,
            is_ac: bool,
            is_superfast: bool,
            distance_km: i32,
            fare_per_km_cents: i64,
            reservation_charge_cents: i64,
            superfast_charge_cents: i64,
        }

        let row: Option<RunRow> = sqlx::query_as(
            "SELECT departure_time, arrival_time, is_ac, is_superfast, distance_km, \
             fare_per_km_cents, reservation_charge_cents, superfast_charge_cents \
             FROM train_runs WHERE id = $1",
        )
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| TrainRunInfo {
            departure: r.departure_time,
            arrival: r.arrival_time,
            is_ac: r.is_ac,
            is_superfast: r.is_superfast,
            distance_km: r.distance_km as i64,
            fare_per_km_cents: r.fare_per_km_cents,
            reservation_charge_cents: r.reservation_charge_cents,
            superfast_charge_cents: r.superfast_charge_cents,
        }))
    }

    async fn train_quota_counts(
        &self,
        run_id: Uuid,
        from_seq: i32,
        to_seq: i32,
    ) -> Result<Option<TrainQuotaCounts>, RepoError> {
        let exists: Option<(bool,)> =
            sqlx::query_as("SELECT TRUE FROM train_runs WHERE id = $1")
                .bind(run_id)
                .fetch_optional(&self.pool)
                .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let tickets: Vec<TicketRow> = sqlx::query_as(
            "SELECT id, passenger_name, age, status, berth_index, queue_position, from_seq, to_seq \
             FROM train_tickets WHERE run_id = $1",
        )
        .bind(run_id)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = TrainQuotaCounts {
            confirmed_overlapping: 0,
            rac: 0,
            waitlisted: 0,
        };
        for t in &tickets {
            match t.status()? {
                TicketStatus::Confirmed => {
                    if segments_overlap(t.from_seq, t.to_seq, from_seq, to_seq) {
                        counts.confirmed_overlapping += 1;
                    }
                }
                TicketStatus::Rac => counts.rac += 1,
                TicketStatus::Waitlisted => counts.waitlisted += 1,
            }
        }
        Ok(Some(counts))
    }

    async fn reserve_rooms(
        &self,
        room_type_id: Uuid,
        count: i32,
    ) -> Result<ReserveOutcome, RepoError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(i32,)> =
            sqlx::query_as("SELECT available_rooms FROM room_types WHERE id = $1 FOR UPDATE")
                .bind(room_type_id)
                .fetch_optional(&mut *tx)
                .await?;
        let available = match row {
            Some((available,)) => available,
            None => return Err(format!("room type not found: {}", room_type_id).into()),
        };

        if available < count {
            tx.rollback().await?;
            return Ok(ReserveOutcome::Unavailable { available });
        }

        sqlx::query("UPDATE room_types SET available_rooms = available_rooms - $1 WHERE id = $2")
            .bind(count)
            .bind(room_type_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(ReserveOutcome::Reserved)
    }

    async fn release_rooms(&self, room_type_id: Uuid, count: i32) -> Result<(), RepoError> {
        // Never release past the physical room count.
        sqlx::query(
            "UPDATE room_types SET available_rooms = LEAST(available_rooms + $1, total_rooms) \
             WHERE id = $2",
        )
        .bind(count)
        .bind(room_type_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reserve_car(
        &self,
        car_id: Uuid,
        booking_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<ReserveOutcome, RepoError> {
        let mut tx = self.pool.begin().await?;

        // Lock the car row so concurrent reservations for the same car
        // serialize their overlap checks.
        let row: Option<(bool,)> =
            sqlx::query_as("SELECT is_active FROM cars WHERE id = $1 FOR UPDATE")
                .bind(car_id)
                .fetch_optional(&mut *tx)
                .await?;
        match row {
            Some((true,)) => {}
            Some((false,)) => {
                tx.rollback().await?;
                return Ok(ReserveOutcome::Unavailable { available: 0 });
            }
            None => return Err(format!("car not found: {}", car_id).into()),
        }

        let (overlaps,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM car_rentals WHERE car_id = $1 AND starts_at < $3 AND ends_at > $2",
        )
        .bind(car_id)
        .bind(from)
        .bind(to)
        .fetch_one(&mut *tx)
        .await?;

        if overlaps > 0 {
            tx.rollback().await?;
            return Ok(ReserveOutcome::Unavailable { available: 0 });
        }

        sqlx::query(
            "INSERT INTO car_rentals (id, car_id, booking_id, starts_at, ends_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(car_id)
        .bind(booking_id)
        .bind(from)
        .bind(to)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ReserveOutcome::Reserved)
    }

    async fn release_car(&self, booking_id: Uuid) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM car_rentals WHERE booking_id = $1")
            .bind(booking_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn reserve_bus_seats(
        &self,
        trip_id: Uuid,
        booking_id: Uuid,
        seats: &[String],
    ) -> Result<SeatReserveOutcome, RepoError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(i32,)> =
            sqlx::query_as("SELECT seats_available FROM bus_trips WHERE id = $1 FOR UPDATE")
                .bind(trip_id)
                .fetch_optional(&mut *tx)
                .await?;
        if row.is_none() {
            return Err(format!("bus trip not found: {}", trip_id).into());
        }

        let taken: Vec<(String,)> = sqlx::query_as(
            "SELECT seat_number FROM bus_seat_bookings \
             WHERE trip_id = $1 AND seat_number = ANY($2)",
        )
        .bind(trip_id)
        .bind(seats)
        .fetch_all(&mut *tx)
        .await?;

        if !taken.is_empty() {
            tx.rollback().await?;
            return Ok(SeatReserveOutcome::Conflict {
                taken: taken.into_iter().map(|(s,)| s).collect(),
            });
        }

        for seat in seats {
            sqlx::query(
                "INSERT INTO bus_seat_bookings (id, trip_id, booking_id, seat_number) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4())
            .bind(trip_id)
            .bind(booking_id)
            .bind(seat)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE bus_trips SET seats_available = seats_available - $1 WHERE id = $2")
            .bind(seats.len() as i32)
            .bind(trip_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(SeatReserveOutcome::Reserved)
    }

    async fn release_bus_seats(&self, trip_id: Uuid, seats: &[String]) -> Result<(), RepoError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "DELETE FROM bus_seat_bookings WHERE trip_id = $1 AND seat_number = ANY($2)",
        )
        .bind(trip_id)
        .bind(seats)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE bus_trips SET seats_available = LEAST(seats_available + $1, total_seats) \
             WHERE id = $2",
        )
        .bind(result.rows_affected() as i32)
        .bind(trip_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn bus_occupancy(&self, trip_id: Uuid) -> Result<(i32, i32), RepoError> {
        let (available, total): (i32, i32) =
            sqlx::query_as("SELECT seats_available, total_seats FROM bus_trips WHERE id = $1")
                .bind(trip_id)
                .fetch_one(&self.pool)
                .await?;
        Ok((total - available, total))
    }

    async fn bus_seat_map(&self, trip_id: Uuid) -> Result<Vec<BusSeat>, RepoError> {
        let rows: Vec<(String, String, bool)> = sqlx::query_as(
            r#"
            SELECT s.seat_number, s.position,
                   EXISTS (SELECT 1 FROM bus_seat_bookings b
                           WHERE b.trip_id = s.trip_id AND b.seat_number = s.seat_number) AS taken
            FROM bus_seats s
            WHERE s.trip_id = $1
            ORDER BY s.seat_number
            "#,
        )
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(number, position, taken)| {
                Ok(BusSeat {
                    position: SeatPosition::parse(&position)
                        .ok_or_else(|| format!("unknown seat position: {}", position))?,
                    number,
                    taken,
                })
            })
            .collect()
    }

    async fn bus_trip_pricing(
        &self,
        trip_id: Uuid,
    ) -> Result<(DateTime<Utc>, i64), RepoError> {
        let row: (DateTime<Utc>, i64) =
            sqlx::query_as("SELECT departure_time, base_fare_cents FROM bus_trips WHERE id = $1")
                .bind(trip_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(row)
    }

    async fn reserve_train_berths(
        &self,
        run_id: Uuid,
        booking_id: Uuid,
        from_seq: i32,
        to_seq: i32,
        passengers: &[Passenger],
    ) -> Result<TrainReserveOutcome, RepoError> {
        let mut tx = self.pool.begin().await?;

        // The run row is the lock for all berth accounting on this run.
        let row: Option<(String,)> =
            sqlx::query_as("SELECT coach_code FROM train_runs WHERE id = $1 FOR UPDATE")
                .bind(run_id)
                .fetch_optional(&mut *tx)
                .await?;
        let coach = match row {
            Some((coach,)) => coach,
            None => return Err(format!("train run not found: {}", run_id).into()),
        };

        let tickets: Vec<TicketRow> = sqlx::query_as(
            "SELECT id, passenger_name, age, status, berth_index, queue_position, from_seq, to_seq \
             FROM train_tickets WHERE run_id = $1",
        )
        .bind(run_id)
        .fetch_all(&mut *tx)
        .await?;

        // Confirmed berths only block journeys whose segments overlap.
        // RAC and waitlist queues are run-wide.
        let mut taken_berths = Vec::new();
        let mut rac_count = 0;
        let mut waitlist_count = 0;
        for t in &tickets {
            match t.status()? {
                TicketStatus::Confirmed => {
                    if segments_overlap(t.from_seq, t.to_seq, from_seq, to_seq) {
                        if let Some(b) = t.berth_index {
                            taken_berths.push(b);
                        }
                    }
                }
                TicketStatus::Rac => rac_count += 1,
                TicketStatus::Waitlisted => waitlist_count += 1,
            }
        }

        let counts = QuotaCounts {
            confirmed: taken_berths.len() as i32,
            rac: rac_count,
            waitlisted: waitlist_count,
        };
        let decisions = match allocate(&counts, passengers.len()) {
            Ok(d) => d,
            Err(AllocationError::TrainFull) => {
                tx.rollback().await?;
                return Ok(TrainReserveOutcome::TrainFull);
            }
        };

        let mut free_berths =
            (1..=COACH_CAPACITY).filter(|b| !taken_berths.contains(b));

        let mut allocated = Vec::with_capacity(passengers.len());
        for (passenger, decision) in passengers.iter().zip(decisions) {
            let (status, berth, position) = match decision {
                BerthDecision::Confirmed(_) => {
                    let berth = free_berths
                        .next()
                        .ok_or("berth ledger out of sync with quota counts")?;
                    (TicketStatus::Confirmed, Some(berth), None)
                }
                BerthDecision::Rac(pos) => (TicketStatus::Rac, None, Some(pos)),
                BerthDecision::Waitlisted(pos) => (TicketStatus::Waitlisted, None, Some(pos)),
            };

            sqlx::query(
                r#"
                INSERT INTO train_tickets (id, run_id, booking_id, passenger_name, age, status,
                    berth_index, queue_position, from_seq, to_seq)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(run_id)
            .bind(booking_id)
            .bind(&passenger.name)
            .bind(passenger.age)
            .bind(status.as_str())
            .bind(berth)
            .bind(position)
            .bind(from_seq)
            .bind(to_seq)
            .execute(&mut *tx)
            .await?;

            allocated.push(Passenger {
                name: passenger.name.clone(),
                age: passenger.age,
                seat: berth.map(|b| berth_label(&coach, b)),
                ticket_status: status,
                queue_position: position,
            });
        }

        tx.commit().await?;
        Ok(TrainReserveOutcome::Allocated {
            passengers: allocated,
        })
    }

    async fn release_train_berths(
        &self,
        run_id: Uuid,
        booking_id: Uuid,
    ) -> Result<PromotionReport, RepoError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(String,)> =
            sqlx::query_as("SELECT coach_code FROM train_runs WHERE id = $1 FOR UPDATE")
                .bind(run_id)
                .fetch_optional(&mut *tx)
                .await?;
        let coach = match row {
            Some((coach,)) => coach,
            None => return Err(format!("train run not found: {}", run_id).into()),
        };

        let cancelled: Vec<TicketRow> = sqlx::query_as(
            "SELECT id, passenger_name, age, status, berth_index, queue_position, from_seq, to_seq \
             FROM train_tickets WHERE run_id = $1 AND booking_id = $2",
        )
        .bind(run_id)
        .bind(booking_id)
        .fetch_all(&mut *tx)
        .await?;

        if cancelled.is_empty() {
            tx.commit().await?;
            return Ok(PromotionReport::default());
        }

        let mut freed_confirmed = 0;
        let mut freed_rac = 0;
        for t in &cancelled {
            match t.status()? {
                TicketStatus::Confirmed => freed_confirmed += 1,
                TicketStatus::Rac => freed_rac += 1,
                TicketStatus::Waitlisted => {}
            }
        }

        sqlx::query("DELETE FROM train_tickets WHERE run_id = $1 AND booking_id = $2")
            .bind(run_id)
            .bind(booking_id)
            .execute(&mut *tx)
            .await?;

        let remaining: Vec<TicketRow> = sqlx::query_as(
            "SELECT id, passenger_name, age, status, berth_index, queue_position, from_seq, to_seq \
             FROM train_tickets WHERE run_id = $1 ORDER BY queue_position ASC NULLS LAST",
        )
        .bind(run_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut confirmed_berths = Vec::new();
        let mut rac_queue = Vec::new();
        let mut waitlist_queue = Vec::new();
        for t in remaining {
            match t.status()? {
                TicketStatus::Confirmed => {
                    if let Some(b) = t.berth_index {
                        confirmed_berths.push((b, t.from_seq, t.to_seq));
                    }
                }
                TicketStatus::Rac => rac_queue.push(t),
                TicketStatus::Waitlisted => waitlist_queue.push(t),
            }
        }

        let plan = promotion_plan(
            freed_confirmed,
            freed_rac,
            rac_queue.len() as i32,
            waitlist_queue.len() as i32,
        );

        let mut report = PromotionReport::default();

        // Oldest RAC passengers take the freed berths. A passenger whose
        // journey overlaps every berth stays in RAC; the freed berth may
        // sit entirely on a disjoint segment.
        let mut promoted = 0;
        let mut kept_rac = Vec::new();
        for ticket in rac_queue.drain(..) {
            if promoted >= plan.rac_to_confirmed {
                kept_rac.push(ticket);
                continue;
            }
            let berth =
                match free_berth_for_segment(&confirmed_berths, ticket.from_seq, ticket.to_seq) {
                    Some(berth) => berth,
                    None => {
                        kept_rac.push(ticket);
                        continue;
                    }
                };
            confirmed_berths.push((berth, ticket.from_seq, ticket.to_seq));
            promoted += 1;

            sqlx::query(
                "UPDATE train_tickets SET status = 'CONFIRMED', berth_index = $1, \
                 queue_position = NULL WHERE id = $2",
            )
            .bind(berth)
            .bind(ticket.id)
            .execute(&mut *tx)
            .await?;

            report.to_confirmed.push(Passenger {
                name: ticket.passenger_name.clone(),
                age: ticket.age,
                seat: Some(berth_label(&coach, berth)),
                ticket_status: TicketStatus::Confirmed,
                queue_position: None,
            });
        }
        let mut rac_queue = kept_rac;

        // Oldest waitlisted passengers move into the RAC slots actually
        // vacated, then both queues renumber from the front.
        let open_rac = (freed_rac + promoted).min(waitlist_queue.len() as i32);
        for ticket in waitlist_queue.drain(..open_rac as usize) {
            sqlx::query("UPDATE train_tickets SET status = 'RAC' WHERE id = $1")
                .bind(ticket.id)
                .execute(&mut *tx)
                .await?;
            rac_queue.push(ticket);
        }

        for (i, ticket) in rac_queue.iter().enumerate() {
            let position = (i + 1) as i32;
            sqlx::query("UPDATE train_tickets SET queue_position = $1 WHERE id = $2")
                .bind(position)
                .bind(ticket.id)
                .execute(&mut *tx)
                .await?;
            if ticket.status == "WAITLISTED" {
                let mut passenger = passenger_from(ticket, &coach)?;
                passenger.ticket_status = TicketStatus::Rac;
                passenger.queue_position = Some(position);
                report.to_rac.push(passenger);
            }
        }

        for (i, ticket) in waitlist_queue.iter().enumerate() {
            sqlx::query("UPDATE train_tickets SET queue_position = $1 WHERE id = $2")
                .bind((i + 1) as i32)
                .bind(ticket.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(report)
    }
}
