use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;

use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::BookingState;

pub fn router(state: BookingState) -> Router {
    let protected = Router::new()
        .route("/appointmentsMade", get(handlers::appointments_made))
        .route(
            "/appointmentsCancel/{userId}/{appointmentId}",
            delete(handlers::cancel_for_patient),
        )
        .route(
            "/appointmentsCancelForPractitioner/{appointmentId}/{reason}",
            delete(handlers::cancel_for_practitioner),
        )
        .route("/rateDoctor", post(handlers::rate_doctor))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    // Checkout runs before the buyer has a session; the webhook
    // authenticates through its signature instead of a bearer token.
    let public = Router::new()
        .route(
            "/create-checkout-session",
            post(handlers::create_checkout_session),
        )
        .route("/webhook", post(handlers::webhook));

    public.merge(protected).with_state(state)
}
