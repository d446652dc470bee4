use serde::{Deserialize, Serialize};
use shared_store::StoreError;
use thiserror::Error;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Single-use signup key; presence makes this a practitioner registration.
    #[serde(default)]
    pub practitioner_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub token: String,
    #[serde(rename = "accountId")]
    pub account_id: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub name: String,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignupKeyResponse {
    pub key: String,
    pub url: String,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("An account with this email already exists")]
    DuplicateAccount,

    #[error("Invalid signup key")]
    InvalidKey,

    #[error("Wrong email address or password")]
    InvalidCredentials,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Token issuance failed: {0}")]
    Token(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
