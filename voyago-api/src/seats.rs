use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use voyago_core::booking::SeatPosition;
use voyago_core::money::Cents;
use voyago_inventory::pricing::{BusPricingConfig, BusPricingEngine};
use voyago_shared::models::events::SeatBlockedEvent;

use crate::middleware::auth::CustomerClaims;
use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize)]
struct SeatMapEntry {
    seat_number: String,
    position: SeatPosition,
    taken: bool,
    /// Held by another checkout session; frees itself when the block
    /// expires.
    blocked: bool,
    fare_cents: Cents,
}

#[derive(Debug, Deserialize)]
struct SeatBlockRequest {
    seat_number: String,
    session_id: Uuid,
}

#[derive(Debug, Serialize)]
struct SeatBlockResponse {
    status: String,
    expires_in_seconds: u64,
}

/// Browsing routes, no customer token needed.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/buses/{trip_id}/seats", get(seat_map))
        .route("/v1/buses/{trip_id}/availability", get(bus_availability))
}

/// Checkout routes, mounted behind customer auth.
pub fn block_routes() -> Router<AppState> {
    Router::new().route("/v1/buses/{trip_id}/seats/block", post(block_seat))
}

#[derive(Debug, Serialize)]
struct BusAvailability {
    trip_id: Uuid,
    seats_available: i32,
}

/// Free-seat count for a trip, served from the Redis availability cache
/// when warm. Reservations and releases invalidate the cached count.
async fn bus_availability(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<BusAvailability>, AppError> {
    if let Ok(Some(cached)) = state.redis.get_availability(trip_id).await {
        return Ok(Json(BusAvailability {
            trip_id,
            seats_available: cached,
        }));
    }

    let (occupied, total) = state.inventory.bus_occupancy(trip_id).await?;
    let available = total - occupied;
    if let Err(e) = state
        .redis
        .set_availability(trip_id, available, state.rules.seat_block_seconds)
        .await
    {
        tracing::warn!("Failed to cache availability for {}: {}", trip_id, e);
    }

    Ok(Json(BusAvailability {
        trip_id,
        seats_available: available,
    }))
}

/// Seat map for a trip with each seat individually priced.
async fn seat_map(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Vec<SeatMapEntry>>, AppError> {
    let seats = state.inventory.bus_seat_map(trip_id).await?;
    if seats.is_empty() {
        return Err(AppError::NotFoundError(format!(
            "No seat map for trip {}",
            trip_id
        )));
    }

    let (departure, base_fare) = state.inventory.bus_trip_pricing(trip_id).await?;
    let (occupied, total) = state.inventory.bus_occupancy(trip_id).await?;
    let engine = BusPricingEngine::new(BusPricingConfig::default());
    let now = Utc::now();

    let numbers: Vec<String> = seats.iter().map(|s| s.number.clone()).collect();
    let owners = state
        .redis
        .seat_block_owners(trip_id, &numbers)
        .await
        .unwrap_or_default();

    let entries = seats
        .into_iter()
        .enumerate()
        .map(|(i, s)| SeatMapEntry {
            fare_cents: engine.seat_fare(base_fare, s.position, occupied, total, departure, now),
            blocked: !s.taken && owners.get(i).map_or(false, |o| o.is_some()),
            seat_number: s.number,
            position: s.position,
            taken: s.taken,
        })
        .collect();

    Ok(Json(entries))
}

/// Takes a short-lived block on a seat while the customer checks out.
/// The block expires on its own if the booking never completes.
async fn block_seat(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
    Extension(_claims): Extension<CustomerClaims>,
    Json(req): Json<SeatBlockRequest>,
) -> Result<Json<SeatBlockResponse>, AppError> {
    let seats = state.inventory.bus_seat_map(trip_id).await?;
    let seat = seats
        .iter()
        .find(|s| s.number == req.seat_number)
        .ok_or_else(|| {
            AppError::ValidationError(format!("Seat {} does not exist", req.seat_number))
        })?;
    if seat.taken {
        return Err(AppError::ConflictError(format!(
            "Seat {} is already booked",
            req.seat_number
        )));
    }

    let blocked = state
        .redis
        .block_seat(
            trip_id,
            &req.seat_number,
            req.session_id,
            state.rules.seat_block_seconds,
        )
        .await?;

    if !blocked {
        return Err(AppError::ConflictError(format!(
            "Seat {} is blocked by another session",
            req.seat_number
        )));
    }

    let event = SeatBlockedEvent {
        service_id: trip_id,
        seat_number: req.seat_number.clone(),
        session_id: req.session_id,
        blocked_at: Utc::now().timestamp(),
    };
    if let Err(e) = state
        .kafka
        .publish("seat.blocked", &trip_id.to_string(), &serde_json::to_string(&event)?)
        .await
    {
        tracing::warn!("Failed to publish seat block event: {}", e);
    }

    Ok(Json(SeatBlockResponse {
        status: "BLOCKED".to_string(),
        expires_in_seconds: state.rules.seat_block_seconds,
    }))
}
