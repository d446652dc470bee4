use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::AuthState;

/// Credential routes. All public: registration, login and the token-redeem
/// flows authenticate through their own tokens, not a bearer session.
pub fn router(state: AuthState) -> Router {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/verify/{token}", get(handlers::verify_email))
        .route("/forgotPassword", post(handlers::forgot_password))
        .route("/resetPassword/{token}", post(handlers::reset_password))
        .route("/keys", post(handlers::mint_signup_key))
        .with_state(state)
}
