use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info};

use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::models::{BookingError, CheckoutEvent, CheckoutRequest, RateRequest};
use crate::services::checkout::verify_signature;
use crate::BookingState;

fn map_error(error: BookingError) -> AppError {
    let message = error.to_string();
    match error {
        BookingError::PractitionerNotFound
        | BookingError::PatientNotFound
        | BookingError::AppointmentNotFound => AppError::NotFound(message),
        BookingError::SlotTaken => AppError::Conflict(message),
        BookingError::AlreadyRated | BookingError::TooEarly | BookingError::InvalidRating => {
            AppError::Validation(message)
        }
        BookingError::InvalidWindow(_) => AppError::BadRequest(message),
        BookingError::InvalidSignature(_) => AppError::SignatureRejected(message),
        BookingError::MeetingProvider(_) | BookingError::PaymentProvider(_) => {
            AppError::Upstream(message)
        }
        BookingError::Store(_) => AppError::Store(message),
    }
}

pub async fn create_checkout_session(
    State(state): State<BookingState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state
        .checkout
        .create_session(request)
        .await
        .map_err(map_error)?;
    Ok(Json(response))
}

/// Payment provider webhook. The body must be the raw bytes that were
/// signed, so this handler consumes `Bytes` rather than `Json`.
///
/// Once the signature checks out the endpoint always acknowledges with 200:
/// the provider retries on anything else, and a failed confirmation after a
/// settled payment is a reconciliation incident, not a transport error.
pub async fn webhook(
    State(state): State<BookingState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::SignatureRejected("missing Stripe-Signature header".to_string()))?;

    verify_signature(
        &body,
        signature,
        &state.config.stripe_webhook_secret,
        Utc::now(),
    )
    .map_err(map_error)?;

    let event: CheckoutEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Malformed event payload: {}", e)))?;

    // Marked before confirming so a redelivery racing a slow confirmation
    // cannot book the slot twice.
    if !state.seen_events.mark_seen(&event.id) {
        info!("Ignoring replayed payment event {}", event.id);
        return Ok(Json(json!({ "received": true })));
    }

    if event.event_type == "checkout.session.completed"
        && event.data.object.payment_status == "paid"
    {
        match event.data.object.metadata {
            Some(metadata) => {
                if let Err(e) = state.coordinator.confirm_booking(&metadata).await {
                    // Reconciliation incident: the money moved but the
                    // booking did not. Operators chase this from the log.
                    error!(
                        "Payment event {} settled but confirmation failed: {}",
                        event.id, e
                    );
                }
            }
            None => error!("Payment event {} has no booking metadata", event.id),
        }
    }

    Ok(Json(json!({ "received": true })))
}

pub async fn appointments_made(
    State(state): State<BookingState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let appointments = state
        .coordinator
        .appointments_made(&user.id)
        .await
        .map_err(map_error)?;
    Ok(Json(json!({ "appointmentsMade": appointments })))
}

pub async fn cancel_for_patient(
    State(state): State<BookingState>,
    Extension(user): Extension<AuthUser>,
    Path((user_id, appointment_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    if user.id != user_id {
        return Err(AppError::Auth(
            "Cannot cancel another account's appointment".to_string(),
        ));
    }

    state
        .coordinator
        .cancel_by_patient(&user_id, &appointment_id)
        .await
        .map_err(map_error)?;
    Ok(Json(json!({ "message": "Appointment cancelled successfully" })))
}

pub async fn cancel_for_practitioner(
    State(state): State<BookingState>,
    Extension(user): Extension<AuthUser>,
    Path((appointment_id, reason)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    state
        .coordinator
        .cancel_by_practitioner(&user.id, &appointment_id, &reason)
        .await
        .map_err(map_error)?;
    Ok(Json(json!({ "message": "Appointment cancelled successfully" })))
}

pub async fn rate_doctor(
    State(state): State<BookingState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<RateRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .coordinator
        .rate(
            &user.id,
            &request.doctor_id,
            &request.appointment_id,
            request.rating,
        )
        .await
        .map_err(map_error)?;
    Ok(Json(json!({ "message": "Rating submitted successfully" })))
}
