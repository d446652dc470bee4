use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use shared_models::auth::{AuthUser, JwtClaims, JwtHeader};

type HmacSha256 = Hmac<Sha256>;

/// Issue a signed HS256 bearer token for an account. `purpose` tags what the
/// token is good for (session vs. email verification).
pub fn issue_token(
    account_id: &str,
    email: Option<&str>,
    role: Option<&str>,
    purpose: &str,
    ttl: Duration,
    jwt_secret: &str,
) -> Result<String, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let now = Utc::now();
    let header = JwtHeader {
        alg: "HS256".to_string(),
        typ: "JWT".to_string(),
    };
    let claims = JwtClaims {
        sub: account_id.to_string(),
        email: email.map(str::to_string),
        role: role.map(str::to_string),
        purpose: Some(purpose.to_string()),
        exp: Some((now + ttl).timestamp() as u64),
        iat: Some(now.timestamp() as u64),
    };

    let header_json =
        serde_json::to_vec(&header).map_err(|e| format!("Failed to encode header: {}", e))?;
    let claims_json =
        serde_json::to_vec(&claims).map_err(|e| format!("Failed to encode claims: {}", e))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(claims_json)
    );

    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", signing_input, signature))
}

/// Verify a token's signature and expiry and return the authenticated user.
pub fn validate_token(token: &str, jwt_secret: &str) -> Result<AuthUser, String> {
    let claims = validate_claims(token, jwt_secret)?;

    let user = AuthUser {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
    };

    debug!("Token validated successfully for account: {}", user.id);
    Ok(user)
}

/// Verify a token and return the raw claims (used by the email-verification
/// flow, which needs the `purpose` claim).
pub fn validate_claims(token: &str, jwt_secret: &str) -> Result<JwtClaims, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let signing_input = format!("{}.{}", header_b64, claims_b64);

    let mut mac = match HmacSha256::new_from_slice(jwt_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return Err("Failed to create HMAC".to_string()),
    };
    mac.update(signing_input.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    let claims_json = match URL_SAFE_NO_PAD.decode(claims_b64) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    let claims: JwtClaims = match serde_json::from_str(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        }
    };

    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp() as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err("Token expired".to_string());
        }
    }

    Ok(claims)
}
