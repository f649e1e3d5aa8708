use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use voyago_core::search::{
    BusOption, BusSearchRequest, CarOption, CarSearchRequest, HotelOption, HotelSearchRequest,
    TrainOption, TrainSearchRequest,
};
use voyago_inventory::rac::{COACH_CAPACITY, RAC_LIMIT, WAITLIST_LIMIT};

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/search/hotels", get(search_hotels))
        .route("/v1/search/cars", get(search_cars))
        .route("/v1/search/buses", get(search_buses))
        .route("/v1/search/trains", get(search_trains))
        .route("/v1/trains/{run_id}/availability", get(train_availability))
}

async fn search_hotels(
    State(state): State<AppState>,
    Query(req): Query<HotelSearchRequest>,
) -> Result<Json<Vec<HotelOption>>, AppError> {
    if req.check_out <= req.check_in {
        return Err(AppError::ValidationError(
            "check_out must be after check_in".to_string(),
        ));
    }
    if req.rooms == 0 {
        return Err(AppError::ValidationError(
            "rooms must be at least 1".to_string(),
        ));
    }
    let options = state.search.search_hotels(&req).await?;
    Ok(Json(options))
}

async fn search_cars(
    State(state): State<AppState>,
    Query(req): Query<CarSearchRequest>,
) -> Result<Json<Vec<CarOption>>, AppError> {
    if req.drop_off <= req.pick_up {
        return Err(AppError::ValidationError(
            "drop_off must be after pick_up".to_string(),
        ));
    }
    let options = state.search.search_cars(&req).await?;
    Ok(Json(options))
}

async fn search_buses(
    State(state): State<AppState>,
    Query(req): Query<BusSearchRequest>,
) -> Result<Json<Vec<BusOption>>, AppError> {
    let options = state.search.search_buses(&req).await?;
    Ok(Json(options))
}

async fn search_trains(
    State(state): State<AppState>,
    Query(req): Query<TrainSearchRequest>,
) -> Result<Json<Vec<TrainOption>>, AppError> {
    let options = state.search.search_trains(&req).await?;
    Ok(Json(options))
}

#[derive(Debug, Deserialize)]
struct SegmentQuery {
    from_seq: Option<i32>,
    to_seq: Option<i32>,
}

#[derive(Debug, Serialize)]
struct TrainAvailability {
    run_id: Uuid,
    confirmed_available: i32,
    rac_available: i32,
    waitlist_position_next: Option<i32>,
}

/// Berth availability for a run, segment-aware when from_seq/to_seq are
/// given, otherwise run-wide.
async fn train_availability(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
    Query(segment): Query<SegmentQuery>,
) -> Result<Json<TrainAvailability>, AppError> {
    let from_seq = segment.from_seq.unwrap_or(i32::MIN);
    let to_seq = segment.to_seq.unwrap_or(i32::MAX);
    if from_seq >= to_seq {
        return Err(AppError::ValidationError(
            "to_seq must be after from_seq".to_string(),
        ));
    }

    let counts = state
        .inventory
        .train_quota_counts(run_id, from_seq, to_seq)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Train run {} not found", run_id)))?;

    let waitlist_position_next = if counts.waitlisted < WAITLIST_LIMIT as i64 {
        Some(counts.waitlisted as i32 + 1)
    } else {
        None
    };

    Ok(Json(TrainAvailability {
        run_id,
        confirmed_available: (COACH_CAPACITY as i64 - counts.confirmed_overlapping).max(0) as i32,
        rac_available: (RAC_LIMIT as i64 - counts.rac).max(0) as i32,
        waitlist_position_next,
    }))
}
