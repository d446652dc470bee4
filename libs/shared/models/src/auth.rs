use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

/// Claims carried by every bearer token this service issues. `sub` is the
/// account id; `purpose` distinguishes session tokens from the short-lived
/// email-verification tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub purpose: Option<String>,
    pub exp: Option<u64>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

pub const TOKEN_PURPOSE_SESSION: &str = "session";
pub const TOKEN_PURPOSE_VERIFY_EMAIL: &str = "verify_email";
