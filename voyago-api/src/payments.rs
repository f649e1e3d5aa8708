use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use voyago_booking::{check_transition, lifecycle};
use voyago_core::booking::BookingStatus;
use voyago_core::money::Cents;
use voyago_core::payment::{
    ChargeRequest, LedgerKind, Payment, PaymentMethod, PaymentStatus, Wallet, WalletTransaction,
};
use voyago_core::repository::DebitOutcome;
use voyago_shared::models::events::BookingConfirmedEvent;
use voyago_shared::refs;

use crate::bookings::release_inventory;
use crate::middleware::auth::CustomerClaims;
use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct PayRequest {
    pub method: PaymentMethod,
}

#[derive(Debug, Serialize)]
pub struct PayResponse {
    pub booking_id: Uuid,
    pub booking_status: BookingStatus,
    pub payment_reference: String,
    pub payment_status: PaymentStatus,
    pub amount_cents: Cents,
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub payment_reference: String,
    pub status: PaymentStatus,
    pub gateway_txn: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopUpRequest {
    pub amount_cents: Cents,
}

#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    pub kind: Option<LedgerKind>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings/{id}/pay", post(pay_booking))
        .route("/v1/wallet", get(get_wallet))
        .route("/v1/wallet/topup", post(top_up_wallet))
        .route("/v1/wallet/transactions", get(wallet_transactions))
}

pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/v1/webhooks/payment", post(payment_webhook))
}

async fn pay_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
    Json(req): Json<PayRequest>,
) -> Result<Json<PayResponse>, AppError> {
    let booking = state
        .bookings
        .get_booking(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Booking {} not found", id)))?;
    let customer_id = claims.customer_id()?;
    if booking.customer_id != customer_id {
        return Err(AppError::AuthorizationError(
            "Booking belongs to another customer".to_string(),
        ));
    }
    if booking.status != BookingStatus::Pending {
        return Err(AppError::ConflictError(format!(
            "Booking is {}, only pending bookings can be paid",
            booking.status.as_str()
        )));
    }

    // The expiry sweep may not have caught this booking yet.
    let window = chrono::Duration::minutes(state.rules.payment_window_minutes);
    if Utc::now() > booking.created_at + window {
        return Err(AppError::ConflictError(
            "Payment window has lapsed for this booking".to_string(),
        ));
    }

    let amount = booking.total_cents - booking.paid_cents;
    if amount <= 0 {
        return Err(AppError::ConflictError(
            "Booking is already fully paid".to_string(),
        ));
    }

    let reference = refs::payment_reference();
    let status = match req.method {
        PaymentMethod::Wallet => {
            match state
                .wallets
                .try_debit(
                    customer_id,
                    amount,
                    &reference,
                    Some(&format!("Payment for booking {}", booking.reference)),
                )
                .await?
            {
                DebitOutcome::Debited(_) => PaymentStatus::Succeeded,
                DebitOutcome::Insufficient { balance_cents } => {
                    return Err(AppError::PaymentRequired(format!(
                        "Wallet balance {} cents is below the {} cents due",
                        balance_cents, amount
                    )));
                }
            }
        }
        method => {
            state
                .gateway
                .charge(&ChargeRequest {
                    booking_id: booking.id,
                    reference: reference.clone(),
                    amount_cents: amount,
                    method,
                })
                .await?
        }
    };

    let now = Utc::now();
    let payment = Payment {
        id: Uuid::new_v4(),
        booking_id: booking.id,
        reference: reference.clone(),
        method: req.method,
        amount_cents: amount,
        status,
        gateway_txn: None,
        created_at: now,
        updated_at: now,
    };
    state.payments.create_payment(&payment).await?;

    if status != PaymentStatus::Succeeded {
        return Err(AppError::PaymentRequired(
            "Payment was declined by the gateway".to_string(),
        ));
    }

    confirm_booking(&state, booking.id, &reference).await?;

    Ok(Json(PayResponse {
        booking_id: booking.id,
        booking_status: BookingStatus::Confirmed,
        payment_reference: reference,
        payment_status: status,
        amount_cents: amount,
    }))
}

/// Marks a pending booking confirmed after a successful payment and
/// publishes the confirmation event.
async fn confirm_booking(
    state: &AppState,
    booking_id: Uuid,
    payment_reference: &str,
) -> Result<(), AppError> {
    let booking = state
        .bookings
        .get_booking(booking_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Booking {} not found", booking_id)))?;

    check_transition(booking.status, BookingStatus::Confirmed)
        .map_err(|e| AppError::ConflictError(e.to_string()))?;

    // Only one writer wins the pending->confirmed flip; a booking the
    // expiry sweep just took must not come back as confirmed.
    let flipped = state
        .bookings
        .update_status(booking.id, BookingStatus::Pending, BookingStatus::Confirmed)
        .await?;
    if !flipped {
        return Err(AppError::ConflictError(
            "Booking is no longer pending".to_string(),
        ));
    }

    state
        .bookings
        .update_amounts(booking.id, booking.total_cents, booking.refunded_cents)
        .await?;
    state
        .bookings
        .add_history(&lifecycle::history_entry(
            &booking,
            BookingStatus::Confirmed,
            Some(format!("Payment {} received", payment_reference)),
        ))
        .await?;

    let event = BookingConfirmedEvent {
        booking_id: booking.id,
        booking_reference: booking.reference.clone(),
        payment_reference: payment_reference.to_string(),
        total_cents: booking.total_cents,
        timestamp: Utc::now().timestamp(),
    };
    if let Err(e) = state
        .kafka
        .publish(
            "booking.confirmed",
            &booking.id.to_string(),
            &serde_json::to_string(&event)?,
        )
        .await
    {
        tracing::warn!("Failed to publish booking confirmed event: {}", e);
    }
    Ok(())
}

pub fn verify_webhook_signature(
    secret: &str,
    body: &[u8],
    signature_hex: &str,
) -> Result<(), AppError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::InternalServerError("Invalid webhook secret".to_string()))?;
    mac.update(body);
    let expected = hex::decode(signature_hex)
        .map_err(|_| AppError::AuthenticationError("Malformed webhook signature".to_string()))?;
    mac.verify_slice(&expected)
        .map_err(|_| AppError::AuthenticationError("Webhook signature mismatch".to_string()))
}

/// Gateway callback with the final status of an asynchronous payment.
/// The body is authenticated with an HMAC-SHA256 signature header.
async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let signature = headers
        .get("X-Webhook-Signature")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            AppError::AuthenticationError("Missing X-Webhook-Signature header".to_string())
        })?;
    verify_webhook_signature(&state.rules.webhook_secret, &body, signature)?;

    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| AppError::ValidationError(format!("Invalid webhook payload: {}", e)))?;

    let payment = state
        .payments
        .get_payment_by_reference(&payload.payment_reference)
        .await?
        .ok_or_else(|| {
            AppError::NotFoundError(format!(
                "Payment {} not found",
                payload.payment_reference
            ))
        })?;

    state
        .payments
        .update_payment_status(payment.id, payload.status, payload.gateway_txn.as_deref())
        .await?;

    if payload.status == PaymentStatus::Succeeded {
        let booking = state
            .bookings
            .get_booking(payment.booking_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFoundError(format!("Booking {} not found", payment.booking_id))
            })?;
        // Late success for a booking that already moved on is recorded
        // on the payment but does not resurrect the booking.
        if booking.status == BookingStatus::Pending {
            confirm_booking(&state, booking.id, &payment.reference).await?;
        }
    } else if payload.status == PaymentStatus::Failed {
        let booking = state
            .bookings
            .get_booking(payment.booking_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFoundError(format!("Booking {} not found", payment.booking_id))
            })?;
        // Cancel before releasing: if another writer moved the booking
        // first, its inventory is no longer ours to free.
        let flipped = state
            .bookings
            .update_status(booking.id, BookingStatus::Pending, BookingStatus::Cancelled)
            .await?;
        if flipped {
            release_inventory(&state, &booking).await?;
            state
                .bookings
                .add_history(&lifecycle::history_entry(
                    &booking,
                    BookingStatus::Cancelled,
                    Some(format!("Payment {} failed at the gateway", payment.reference)),
                ))
                .await?;
        }
    }

    Ok(Json(serde_json::json!({ "received": true })))
}

async fn get_wallet(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
) -> Result<Json<Wallet>, AppError> {
    let wallet = state.wallets.get_or_create(claims.customer_id()?).await?;
    Ok(Json(wallet))
}

async fn top_up_wallet(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Json(req): Json<TopUpRequest>,
) -> Result<Json<Wallet>, AppError> {
    if req.amount_cents <= 0 {
        return Err(AppError::ValidationError(
            "amount_cents must be positive".to_string(),
        ));
    }
    let wallet = state
        .wallets
        .credit(
            claims.customer_id()?,
            req.amount_cents,
            &refs::transaction_reference(),
            Some("Wallet top-up"),
        )
        .await?;
    Ok(Json(wallet))
}

async fn wallet_transactions(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Query(query): Query<LedgerQuery>,
) -> Result<Json<Vec<WalletTransaction>>, AppError> {
    let entries = state
        .wallets
        .list_transactions(claims.customer_id()?, query.kind)
        .await?;
    Ok(Json(entries))
}
