use chrono::{Duration, Utc};
use tracing::{error, info};

use voyago_booking::lifecycle;
use voyago_core::booking::{Booking, BookingStatus};

use crate::bookings::release_inventory;
use crate::state::AppState;

/// Background sweep that expires pending bookings whose payment window
/// has lapsed and gives their inventory back.
pub async fn run_expiry_sweep(state: AppState) {
    let mut ticker =
        tokio::time::interval(std::time::Duration::from_secs(state.rules.expiry_sweep_seconds));
    loop {
        ticker.tick().await;
        if let Err(e) = sweep_once(&state).await {
            error!("Expiry sweep failed: {}", e);
        }
    }
}

async fn sweep_once(state: &AppState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cutoff = Utc::now() - Duration::minutes(state.rules.payment_window_minutes);
    let stale = state.bookings.list_unpaid_older_than(cutoff).await?;
    for booking in stale {
        if let Err(e) = expire_booking(state, &booking).await {
            error!("Failed to expire booking {}: {}", booking.id, e);
        }
    }
    Ok(())
}

async fn expire_booking(
    state: &AppState,
    booking: &Booking,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // The booking may have been paid or cancelled since the sweep query
    // ran. Losing the flip means the inventory is not ours to release.
    let flipped = state
        .bookings
        .update_status(booking.id, BookingStatus::Pending, BookingStatus::Expired)
        .await?;
    if !flipped {
        return Ok(());
    }
    release_inventory(state, booking)
        .await
        .map_err(|e| format!("inventory release failed: {:?}", e))?;
    state
        .bookings
        .add_history(&lifecycle::history_entry(
            booking,
            BookingStatus::Expired,
            Some("Payment window lapsed".to_string()),
        ))
        .await?;
    info!(
        "Expired booking {} ({}), inventory released",
        booking.reference, booking.id
    );
    Ok(())
}
