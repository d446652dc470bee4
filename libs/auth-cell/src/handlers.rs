use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect};
use axum::Json;
use serde_json::json;
use shared_models::error::AppError;

use crate::models::{
    AuthError, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
};
use crate::services::credentials::CredentialsService;
use crate::AuthState;

fn map_error(error: AuthError) -> AppError {
    let message = error.to_string();
    match error {
        AuthError::Validation(_) => AppError::Validation(message),
        AuthError::DuplicateAccount => AppError::Conflict(message),
        AuthError::InvalidKey | AuthError::InvalidToken => AppError::BadRequest(message),
        AuthError::InvalidCredentials => AppError::Auth(message),
        AuthError::AccountNotFound => AppError::NotFound(message),
        AuthError::Hash(_) | AuthError::Token(_) => AppError::Internal(message),
        AuthError::Store(_) => AppError::Store(message),
    }
}

fn service(state: &AuthState) -> CredentialsService {
    CredentialsService::new(state.config.clone(), state.store.clone(), state.notifier.clone())
}

pub async fn register(
    State(state): State<AuthState>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = service(&state).register(request).await.map_err(map_error)?;
    Ok(Json(response))
}

pub async fn login(
    State(state): State<AuthState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = service(&state).login(request).await.map_err(map_error)?;
    Ok(Json(response))
}

/// Lands here from the link in the verification email; on success the
/// browser is bounced to the web client.
pub async fn verify_email(
    State(state): State<AuthState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    service(&state).verify_email(&token).await.map_err(map_error)?;
    Ok(Redirect::to(&format!("{}/login#success", state.config.web_url)))
}

pub async fn forgot_password(
    State(state): State<AuthState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    service(&state)
        .forgot_password(&request.email)
        .await
        .map_err(map_error)?;
    Ok(Json(json!({ "message": "Password reset email sent" })))
}

pub async fn reset_password(
    State(state): State<AuthState>,
    Path(token): Path<String>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    service(&state)
        .reset_password(&token, &request.password)
        .await
        .map_err(map_error)?;
    Ok(Json(json!({ "message": "Password changed successfully" })))
}

pub async fn mint_signup_key(
    State(state): State<AuthState>,
) -> Result<impl IntoResponse, AppError> {
    let response = service(&state).mint_signup_key().await.map_err(map_error)?;
    Ok(Json(response))
}
