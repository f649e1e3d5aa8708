use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use voyago_booking::{check_transition, lifecycle, plan_refund};
use voyago_core::booking::{Booking, BookingStatus, BusSeat, Passenger, ServiceKind, TicketStatus};
use voyago_core::money::Cents;
use voyago_core::payment::{PaymentStatus, Refund};
use voyago_core::repository::{
    PromotionReport, ReserveOutcome, SeatReserveOutcome, TrainReserveOutcome,
};
use voyago_inventory::allocation::{pick_seats, SeatError, SeatRequest};
use voyago_inventory::fare::{tatkal_window_open, train_fare, TrainFareInputs};
use voyago_inventory::pricing::{BusPricingConfig, BusPricingEngine};
use voyago_inventory::rental::{rental_cost, stay_cost, RentalRates};
use voyago_shared::models::events::{
    BookingCancelledEvent, BookingCreatedEvent, RefundIssuedEvent,
};
use voyago_shared::pii::Masked;
use voyago_shared::refs;

use crate::middleware::auth::CustomerClaims;
use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub contact_email: String,
    #[serde(flatten)]
    pub service: ServiceSelection,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "service", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceSelection {
    Hotel {
        room_type_id: Uuid,
        check_in: NaiveDate,
        check_out: NaiveDate,
        rooms: u32,
    },
    Car {
        car_id: Uuid,
        pick_up: DateTime<Utc>,
        drop_off: DateTime<Utc>,
    },
    Bus {
        trip_id: Uuid,
        /// Explicit seat numbers, or omit and set `seat_count` to let
        /// the allocator choose.
        seats: Option<Vec<String>>,
        seat_count: Option<usize>,
        /// Checkout session that blocked the seats, if any. Its blocks
        /// are dropped once the seats are reserved for real.
        session_id: Option<Uuid>,
    },
    Train {
        run_id: Uuid,
        from_seq: i32,
        to_seq: i32,
        passengers: Vec<PassengerRequest>,
        #[serde(default)]
        tatkal: bool,
    },
}

#[derive(Debug, Deserialize)]
pub struct PassengerRequest {
    pub name: String,
    pub age: i32,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub reference: String,
    pub service: ServiceKind,
    pub status: BookingStatus,
    pub pnr: Option<String>,
    pub unit_count: i32,
    pub total_cents: Cents,
    pub paid_cents: Cents,
    pub refunded_cents: Cents,
    pub details: serde_json::Value,
    pub service_start: DateTime<Utc>,
    pub service_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            reference: b.reference,
            service: b.service_kind,
            status: b.status,
            pnr: b.pnr,
            unit_count: b.unit_count,
            total_cents: b.total_cents,
            paid_cents: b.paid_cents,
            refunded_cents: b.refunded_cents,
            details: b.details,
            service_start: b.service_start,
            service_end: b.service_end,
            created_at: b.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CancellationResponse {
    pub booking_id: Uuid,
    pub status: BookingStatus,
    pub refund_cents: Cents,
    pub cancellation_fee_cents: Cents,
    pub refund_reference: Option<String>,
    /// Train cancellations promote waiting passengers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotions: Option<PromotionReport>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking).get(list_bookings))
        .route("/v1/bookings/{id}", get(get_booking))
        .route("/v1/bookings/{id}/history", get(booking_history))
        .route("/v1/bookings/{id}/cancel", post(cancel_booking))
}

struct ReservedService {
    service_kind: ServiceKind,
    service_id: Uuid,
    unit_count: i32,
    total_cents: Cents,
    pnr: Option<String>,
    details: serde_json::Value,
    service_start: DateTime<Utc>,
    service_end: Option<DateTime<Utc>>,
}

/// Free seats held in Redis by a checkout session other than the
/// caller's. These must not be offered or booked while the block lives.
fn foreign_blocked_seats(
    seats: &[BusSeat],
    owners: &[Option<Uuid>],
    session_id: Option<Uuid>,
) -> Vec<String> {
    seats
        .iter()
        .zip(owners)
        .filter(|(seat, owner)| {
            !seat.taken && matches!(owner, Some(o) if Some(*o) != session_id)
        })
        .map(|(seat, _)| seat.number.clone())
        .collect()
}

fn seat_error_to_app(err: SeatError) -> AppError {
    match err {
        SeatError::SeatsTaken(taken) => {
            AppError::ConflictError(format!("Seats already taken: {}", taken.join(", ")))
        }
        SeatError::NotEnoughSeats {
            requested,
            available,
        } => AppError::ConflictError(format!(
            "Only {} seats left, {} requested",
            available, requested
        )),
        other => AppError::ValidationError(other.to_string()),
    }
}

async fn reserve_service(
    state: &AppState,
    booking_id: Uuid,
    service: &ServiceSelection,
) -> Result<ReservedService, AppError> {
    match service {
        ServiceSelection::Hotel {
            room_type_id,
            check_in,
            check_out,
            rooms,
        } => {
            let nights = (*check_out - *check_in).num_days();
            if nights <= 0 {
                return Err(AppError::ValidationError(
                    "check_out must be after check_in".to_string(),
                ));
            }
            if *rooms == 0 {
                return Err(AppError::ValidationError(
                    "rooms must be at least 1".to_string(),
                ));
            }

            let rate = state
                .inventory
                .room_rate(*room_type_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFoundError(format!("Room type {} not found", room_type_id))
                })?;

            match state
                .inventory
                .reserve_rooms(*room_type_id, *rooms as i32)
                .await?
            {
                ReserveOutcome::Reserved => {}
                ReserveOutcome::Unavailable { available } => {
                    return Err(AppError::ConflictError(format!(
                        "Only {} rooms available",
                        available
                    )));
                }
            }
            state.redis.invalidate_availability(*room_type_id).await.ok();

            Ok(ReservedService {
                service_kind: ServiceKind::Hotel,
                service_id: *room_type_id,
                unit_count: *rooms as i32,
                total_cents: stay_cost(
                    rate.rate_per_night_cents,
                    nights,
                    *rooms as i64,
                    rate.tax_percent,
                ),
                pnr: None,
                details: serde_json::json!({
                    "check_in": check_in,
                    "check_out": check_out,
                    "nights": nights,
                    "rooms": rooms,
                    "tax_percent": rate.tax_percent,
                }),
                service_start: check_in.and_time(chrono::NaiveTime::MIN).and_utc(),
                service_end: Some(check_out.and_time(chrono::NaiveTime::MIN).and_utc()),
            })
        }
        ServiceSelection::Car {
            car_id,
            pick_up,
            drop_off,
        } => {
            if drop_off <= pick_up {
                return Err(AppError::ValidationError(
                    "drop_off must be after pick_up".to_string(),
                ));
            }

            let car = state.inventory.car_rates(*car_id).await?.ok_or_else(|| {
                AppError::NotFoundError(format!("Car {} not found", car_id))
            })?;

            match state
                .inventory
                .reserve_car(*car_id, booking_id, *pick_up, *drop_off)
                .await?
            {
                ReserveOutcome::Reserved => {}
                ReserveOutcome::Unavailable { .. } => {
                    return Err(AppError::ConflictError(
                        "Car is not available for those dates".to_string(),
                    ));
                }
            }

            // Partial days bill as full days.
            let seconds = (*drop_off - *pick_up).num_seconds();
            let days = (seconds + 86_399) / 86_400;
            let rates = RentalRates {
                daily_cents: car.daily_cents,
                weekly_cents: car.weekly_cents,
                monthly_cents: car.monthly_cents,
            };

            Ok(ReservedService {
                service_kind: ServiceKind::Car,
                service_id: *car_id,
                unit_count: 1,
                total_cents: rental_cost(&rates, days),
                pnr: None,
                // The deposit is held against the rental, not charged.
                details: serde_json::json!({
                    "rental_days": days,
                    "deposit_held_cents": car.deposit_cents,
                }),
                service_start: *pick_up,
                service_end: Some(*drop_off),
            })
        }
        ServiceSelection::Bus {
            trip_id,
            seats,
            seat_count,
            session_id,
        } => {
            let request = match (seats, seat_count) {
                (Some(numbers), _) if !numbers.is_empty() => SeatRequest::Specific(numbers.clone()),
                (_, Some(count)) if *count > 0 => SeatRequest::Auto(*count),
                _ => {
                    return Err(AppError::ValidationError(
                        "Provide seats or a positive seat_count".to_string(),
                    ));
                }
            };

            let mut map = state.inventory.bus_seat_map(*trip_id).await?;
            if map.is_empty() {
                return Err(AppError::NotFoundError(format!(
                    "Bus trip {} not found",
                    trip_id
                )));
            }

            // A seat blocked by another checkout session counts as taken
            // until its block expires. Redis being down skips the check.
            let numbers: Vec<String> = map.iter().map(|s| s.number.clone()).collect();
            let owners = state
                .redis
                .seat_block_owners(*trip_id, &numbers)
                .await
                .unwrap_or_default();
            let blocked = foreign_blocked_seats(&map, &owners, *session_id);
            if let SeatRequest::Specific(wanted) = &request {
                let held: Vec<String> = wanted
                    .iter()
                    .filter(|w| blocked.contains(*w))
                    .cloned()
                    .collect();
                if !held.is_empty() {
                    return Err(AppError::ConflictError(format!(
                        "Seats blocked by another session: {}",
                        held.join(", ")
                    )));
                }
            }
            for seat in map.iter_mut() {
                if blocked.contains(&seat.number) {
                    seat.taken = true;
                }
            }

            let picked = pick_seats(&map, &request).map_err(seat_error_to_app)?;

            let (departure, base_fare) = state.inventory.bus_trip_pricing(*trip_id).await?;
            let (occupied, total) = state.inventory.bus_occupancy(*trip_id).await?;
            let engine = BusPricingEngine::new(BusPricingConfig::default());
            let now = Utc::now();
            let total_cents: Cents = picked
                .iter()
                .map(|number| {
                    let position = map
                        .iter()
                        .find(|s| &s.number == number)
                        .map(|s| s.position)
                        .unwrap_or(voyago_core::booking::SeatPosition::Aisle);
                    engine.seat_fare(base_fare, position, occupied, total, departure, now)
                })
                .sum();

            match state
                .inventory
                .reserve_bus_seats(*trip_id, booking_id, &picked)
                .await?
            {
                SeatReserveOutcome::Reserved => {}
                SeatReserveOutcome::Conflict { taken } => {
                    return Err(AppError::ConflictError(format!(
                        "Seats already taken: {}",
                        taken.join(", ")
                    )));
                }
            }
            if let Some(session) = session_id {
                for seat in &picked {
                    state
                        .redis
                        .release_seat_block(*trip_id, seat, *session)
                        .await
                        .ok();
                }
            }
            state.redis.invalidate_availability(*trip_id).await.ok();

            Ok(ReservedService {
                service_kind: ServiceKind::Bus,
                service_id: *trip_id,
                unit_count: picked.len() as i32,
                total_cents,
                pnr: Some(refs::pnr_number()),
                details: serde_json::json!({ "seats": picked }),
                service_start: departure,
                service_end: None,
            })
        }
        ServiceSelection::Train {
            run_id,
            from_seq,
            to_seq,
            passengers,
            tatkal,
        } => {
            if passengers.is_empty() {
                return Err(AppError::ValidationError(
                    "At least one passenger is required".to_string(),
                ));
            }
            if from_seq >= to_seq {
                return Err(AppError::ValidationError(
                    "to_seq must be after from_seq".to_string(),
                ));
            }

            let run = state
                .inventory
                .train_run_info(*run_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFoundError(format!("Train run {} not found", run_id))
                })?;

            let now = Utc::now();
            if *tatkal && !tatkal_window_open(run.is_ac, run.departure, now) {
                return Err(AppError::ValidationError(
                    "Tatkal window is not open for this run".to_string(),
                ));
            }

            let fare = train_fare(&TrainFareInputs {
                distance_km: run.distance_km,
                fare_per_km_cents: run.fare_per_km_cents,
                reservation_charge_cents: run.reservation_charge_cents,
                superfast_charge_cents: if run.is_superfast {
                    run.superfast_charge_cents
                } else {
                    0
                },
                is_ac_coach: run.is_ac,
                is_tatkal: *tatkal,
                service_tax_percent: state.rules.service_tax_percent,
            });

            let requested: Vec<Passenger> = passengers
                .iter()
                .map(|p| Passenger {
                    name: p.name.clone(),
                    age: p.age,
                    seat: None,
                    ticket_status: TicketStatus::Waitlisted,
                    queue_position: None,
                })
                .collect();

            let allocated = match state
                .inventory
                .reserve_train_berths(*run_id, booking_id, *from_seq, *to_seq, &requested)
                .await?
            {
                TrainReserveOutcome::Allocated { passengers } => passengers,
                TrainReserveOutcome::TrainFull => {
                    return Err(AppError::ConflictError(
                        "Train is fully booked including the waitlist".to_string(),
                    ));
                }
            };
            state.redis.invalidate_availability(*run_id).await.ok();

            Ok(ReservedService {
                service_kind: ServiceKind::Train,
                service_id: *run_id,
                unit_count: allocated.len() as i32,
                total_cents: fare.total_cents * allocated.len() as i64,
                pnr: Some(refs::pnr_number()),
                details: serde_json::json!({
                    "from_seq": from_seq,
                    "to_seq": to_seq,
                    "tatkal": tatkal,
                    "fare_breakdown": fare,
                    "passengers": allocated,
                }),
                service_start: run.departure,
                service_end: Some(run.arrival),
            })
        }
    }
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let customer_id = claims.customer_id()?;
    if !req.contact_email.contains('@') {
        return Err(AppError::ValidationError(
            "contact_email is not a valid email address".to_string(),
        ));
    }

    let booking_id = Uuid::new_v4();
    let reserved = reserve_service(&state, booking_id, &req.service).await?;

    let now = Utc::now();
    let booking = Booking {
        id: booking_id,
        reference: refs::booking_reference(),
        service_kind: reserved.service_kind,
        service_id: reserved.service_id,
        customer_id,
        status: BookingStatus::Pending,
        contact_email: Masked::new(req.contact_email),
        pnr: reserved.pnr,
        unit_count: reserved.unit_count,
        total_cents: reserved.total_cents,
        paid_cents: 0,
        refunded_cents: 0,
        details: reserved.details,
        service_start: reserved.service_start,
        service_end: reserved.service_end,
        created_at: now,
        updated_at: now,
    };

    if let Err(e) = state.bookings.create_booking(&booking).await {
        // Give the inventory back if persisting the booking failed.
        tracing::error!("Booking insert failed, releasing inventory: {}", e);
        release_inventory(&state, &booking).await.ok();
        return Err(e.into());
    }

    state
        .bookings
        .add_history(&lifecycle::history_entry(
            &booking,
            BookingStatus::Pending,
            Some("Booking created, awaiting payment".to_string()),
        ))
        .await?;

    let event = BookingCreatedEvent {
        booking_id: booking.id,
        booking_reference: booking.reference.clone(),
        service_type: booking.service_kind.as_str().to_string(),
        customer_id: customer_id.to_string(),
        total_cents: booking.total_cents,
        timestamp: now.timestamp(),
    };
    if let Err(e) = state
        .kafka
        .publish(
            "booking.created",
            &booking.id.to_string(),
            &serde_json::to_string(&event)?,
        )
        .await
    {
        tracing::warn!("Failed to publish booking created event: {}", e);
    }

    Ok((StatusCode::CREATED, Json(booking.into())))
}

async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let customer_id = claims.customer_id()?;
    let bookings = state.bookings.list_bookings(customer_id).await?;
    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

async fn fetch_owned_booking(
    state: &AppState,
    id: Uuid,
    claims: &CustomerClaims,
) -> Result<Booking, AppError> {
    let booking = state
        .bookings
        .get_booking(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Booking {} not found", id)))?;
    if booking.customer_id != claims.customer_id()? {
        return Err(AppError::AuthorizationError(
            "Booking belongs to another customer".to_string(),
        ));
    }
    Ok(booking)
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = fetch_owned_booking(&state, id, &claims).await?;
    Ok(Json(booking.into()))
}

async fn booking_history(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<voyago_core::booking::HistoryEntry>>, AppError> {
    fetch_owned_booking(&state, id, &claims).await?;
    let history = state.bookings.list_history(id).await?;
    Ok(Json(history))
}

/// Gives a booking's inventory back. Train releases also report queue
/// promotions.
pub(crate) async fn release_inventory(
    state: &AppState,
    booking: &Booking,
) -> Result<Option<PromotionReport>, AppError> {
    let report = match booking.service_kind {
        ServiceKind::Hotel => {
            state
                .inventory
                .release_rooms(booking.service_id, booking.unit_count)
                .await?;
            None
        }
        ServiceKind::Car => {
            state.inventory.release_car(booking.id).await?;
            None
        }
        ServiceKind::Bus => {
            let seats: Vec<String> = booking.details["seats"]
                .as_array()
                .map(|a| {
                    a.iter()
                        .filter_map(|v| v.as_str().map(String::from))
                        .collect()
                })
                .unwrap_or_default();
            if !seats.is_empty() {
                state
                    .inventory
                    .release_bus_seats(booking.service_id, &seats)
                    .await?;
            }
            None
        }
        ServiceKind::Train => Some(
            state
                .inventory
                .release_train_berths(booking.service_id, booking.id)
                .await?,
        ),
    };
    state
        .redis
        .invalidate_availability(booking.service_id)
        .await
        .ok();
    Ok(report)
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<CancellationResponse>, AppError> {
    let booking = fetch_owned_booking(&state, id, &claims).await?;

    check_transition(booking.status, BookingStatus::Cancelled)
        .map_err(|e| AppError::ConflictError(e.to_string()))?;

    let payment = state.payments.latest_payment_for_booking(booking.id).await?;
    let paid_with = payment
        .as_ref()
        .filter(|p| p.status == PaymentStatus::Succeeded)
        .map(|p| p.method);
    let now = Utc::now();
    let plan = plan_refund(&booking, paid_with, now);

    // Flip the status first. The compare-and-set loses to a concurrent
    // cancel, payment, or expiry sweep, and a lost flip means the
    // inventory release below never runs twice for one booking.
    let flipped = state
        .bookings
        .update_status(booking.id, booking.status, BookingStatus::Cancelled)
        .await?;
    if !flipped {
        return Err(AppError::ConflictError(
            "Booking changed state, reload and retry".to_string(),
        ));
    }

    let promotions = release_inventory(&state, &booking).await?;

    let mut refund_reference = None;
    if plan.refund_cents > 0 {
        let payment = payment
            .as_ref()
            .ok_or_else(|| AppError::InternalServerError("Paid booking has no payment".into()))?;

        let reference = refs::refund_reference();
        let refund = Refund {
            id: Uuid::new_v4(),
            payment_id: payment.id,
            booking_id: booking.id,
            reference: reference.clone(),
            amount_cents: plan.refund_cents,
            status: PaymentStatus::Succeeded,
            created_at: now,
        };

        if plan.to_wallet {
            state
                .wallets
                .credit(
                    booking.customer_id,
                    plan.refund_cents,
                    &reference,
                    Some(&format!("Refund for booking {}", booking.reference)),
                )
                .await?;
        } else {
            state
                .gateway
                .refund(&payment.reference, plan.refund_cents)
                .await?;
        }

        state.payments.create_refund(&refund).await?;
        if plan.refund_cents == payment.amount_cents {
            state
                .payments
                .update_payment_status(payment.id, PaymentStatus::Refunded, None)
                .await?;
        }
        state
            .bookings
            .update_amounts(
                booking.id,
                booking.paid_cents,
                booking.refunded_cents + plan.refund_cents,
            )
            .await?;

        let refund_event = RefundIssuedEvent {
            refund_id: refund.id,
            booking_id: booking.id,
            amount_cents: plan.refund_cents,
            method: if plan.to_wallet {
                "WALLET".to_string()
            } else {
                payment.method.as_str().to_string()
            },
            timestamp: now.timestamp(),
        };
        if let Err(e) = state
            .kafka
            .publish(
                "refund.issued",
                &booking.id.to_string(),
                &serde_json::to_string(&refund_event)?,
            )
            .await
        {
            tracing::warn!("Failed to publish refund issued event: {}", e);
        }

        refund_reference = Some(reference);
    }

    state
        .bookings
        .add_history(&lifecycle::history_entry(
            &booking,
            BookingStatus::Cancelled,
            Some(format!(
                "Cancelled by customer, refund {} cents, fee {} cents",
                plan.refund_cents, plan.cancellation_fee_cents
            )),
        ))
        .await?;

    let event = BookingCancelledEvent {
        booking_id: booking.id,
        booking_reference: booking.reference.clone(),
        refund_cents: plan.refund_cents,
        cancellation_fee_cents: plan.cancellation_fee_cents,
        timestamp: now.timestamp(),
    };
    if let Err(e) = state
        .kafka
        .publish(
            "booking.cancelled",
            &booking.id.to_string(),
            &serde_json::to_string(&event)?,
        )
        .await
    {
        tracing::warn!("Failed to publish booking cancelled event: {}", e);
    }

    Ok(Json(CancellationResponse {
        booking_id: booking.id,
        status: BookingStatus::Cancelled,
        refund_cents: plan.refund_cents,
        cancellation_fee_cents: plan.cancellation_fee_cents,
        refund_reference,
        promotions,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use voyago_core::booking::SeatPosition;

    fn seat(number: &str, taken: bool) -> BusSeat {
        BusSeat {
            number: number.to_string(),
            position: SeatPosition::Aisle,
            taken,
        }
    }

    #[test]
    fn test_foreign_blocks_exclude_own_session() {
        let mine = Uuid::new_v4();
        let other = Uuid::new_v4();
        let seats = vec![seat("1A", false), seat("1B", false), seat("1C", false)];
        let owners = vec![Some(other), Some(mine), None];

        let blocked = foreign_blocked_seats(&seats, &owners, Some(mine));
        assert_eq!(blocked, vec!["1A".to_string()]);
    }

    #[test]
    fn test_anonymous_booking_sees_every_block() {
        let other = Uuid::new_v4();
        let seats = vec![seat("1A", false), seat("1B", false)];
        let owners = vec![Some(other), None];

        let blocked = foreign_blocked_seats(&seats, &owners, None);
        assert_eq!(blocked, vec!["1A".to_string()]);
    }

    #[test]
    fn test_booked_seats_are_not_reported_as_blocked() {
        // A stale block on an already-sold seat adds nothing.
        let other = Uuid::new_v4();
        let seats = vec![seat("1A", true)];
        let owners = vec![Some(other)];

        assert!(foreign_blocked_seats(&seats, &owners, None).is_empty());
    }
}
