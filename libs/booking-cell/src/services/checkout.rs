use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::Sha256;
use std::sync::Mutex;
use tracing::{debug, error, info};

use shared_config::AppConfig;
use shared_store::AccountStore;

use crate::models::{BookingError, CheckoutRequest, CheckoutResponse, StripeSession};
use crate::services::pricing;

type HmacSha256 = Hmac<Sha256>;

/// Webhook timestamps older than this are rejected as replays.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Creates hosted payment sessions. Nothing is persisted here: the booking
/// details ride along as session metadata and come back on the webhook once
/// the payment settles.
pub struct CheckoutService {
    client: Client,
    config: Arc<AppConfig>,
    store: Arc<dyn AccountStore>,
}

impl CheckoutService {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn AccountStore>) -> Self {
        Self {
            client: Client::new(),
            config,
            store,
        }
    }

    pub async fn create_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutResponse, BookingError> {
        if !self.config.is_payments_configured() {
            return Err(BookingError::PaymentProvider(
                "payment provider not configured".to_string(),
            ));
        }
        let practitioner = self
            .store
            .find_practitioner(&request.doctor_id)
            .await?
            .ok_or(BookingError::PractitionerNotFound)?;

        let start = parse_timestamp(&request.start)?;
        let end = parse_timestamp(&request.end)?;
        let amount = pricing::quote(start, end, &practitioner.rates)?;

        let params = [
            ("mode", "payment".to_string()),
            ("payment_method_types[0]", "card".to_string()),
            ("line_items[0][price_data][currency]", "eur".to_string()),
            (
                "line_items[0][price_data][product_data][name]",
                "Appointment".to_string(),
            ),
            ("line_items[0][price_data][unit_amount]", amount.to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            (
                "success_url",
                format!("{}/successPay", self.config.web_url),
            ),
            ("cancel_url", format!("{}/cancelPay", self.config.web_url)),
            ("locale", "lt".to_string()),
            ("metadata[userId]", request.user_id),
            ("metadata[doctorId]", request.doctor_id),
            ("metadata[start]", request.start),
            ("metadata[end]", request.end),
            ("metadata[notes]", request.notes),
            ("metadata[value]", amount.to_string()),
        ];

        let url = format!("{}/v1/checkout/sessions", self.config.stripe_api_base_url);
        debug!("Creating checkout session for {} minor units", amount);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.stripe_secret_key, Some(""))
            .form(&params)
            .send()
            .await
            .map_err(|e| BookingError::PaymentProvider(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BookingError::PaymentProvider(e.to_string()))?;

        if !status.is_success() {
            error!("Checkout session creation failed: {} - {}", status, body);
            return Err(BookingError::PaymentProvider(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let session: StripeSession = serde_json::from_str(&body)
            .map_err(|e| BookingError::PaymentProvider(format!("Malformed response: {}", e)))?;

        info!("Created checkout session {}", session.id);
        Ok(CheckoutResponse {
            session_id: session.id,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, BookingError> {
    raw.parse::<DateTime<Utc>>()
        .map_err(|_| BookingError::InvalidWindow(format!("unparseable timestamp: {}", raw)))
}

/// Verify a `Stripe-Signature` header against the raw request body.
///
/// The header carries `t=<unix>,v1=<hex hmac>`; the signed payload is
/// `"{t}.{body}"`. The timestamp must be within the tolerance window and the
/// comparison is constant time via the HMAC verifier.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<(), BookingError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<Vec<u8>> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = value.parse().ok();
            }
            Some(("v1", value)) => {
                if let Some(bytes) = decode_hex(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| BookingError::InvalidSignature("missing timestamp".to_string()))?;
    if signatures.is_empty() {
        return Err(BookingError::InvalidSignature(
            "missing v1 signature".to_string(),
        ));
    }

    if (now.timestamp() - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(BookingError::InvalidSignature(
            "timestamp outside tolerance".to_string(),
        ));
    }

    for signature in &signatures {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| BookingError::InvalidSignature("bad secret".to_string()))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        if mac.verify_slice(signature).is_ok() {
            return Ok(());
        }
    }

    Err(BookingError::InvalidSignature(
        "no matching signature".to_string(),
    ))
}

/// Sign a payload the way the provider does. Test helper, also usable for
/// local webhook replay tooling.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let hex: String = mac
        .finalize()
        .into_bytes()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect();
    format!("t={},v1={}", timestamp, hex)
}

fn decode_hex(value: &str) -> Option<Vec<u8>> {
    if value.len() % 2 != 0 {
        return None;
    }
    (0..value.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&value[i..i + 2], 16).ok())
        .collect()
}

/// Remembers payment event ids so a redelivered webhook cannot confirm the
/// same booking twice. Bounded; the oldest ids fall out first.
pub struct EventDedupe {
    inner: Mutex<DedupeInner>,
    capacity: usize,
}

struct DedupeInner {
    seen: HashSet<String>,
    order: VecDeque<String>,
}

impl Default for EventDedupe {
    fn default() -> Self {
        Self::with_capacity(1024)
    }
}

impl EventDedupe {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(DedupeInner {
                seen: HashSet::new(),
                order: VecDeque::new(),
            }),
            capacity,
        }
    }

    /// Record an event id. Returns false when the id was already present.
    pub fn mark_seen(&self, event_id: &str) -> bool {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !inner.seen.insert(event_id.to_string()) {
            return false;
        }
        inner.order.push_back(event_id.to_string());
        if inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.seen.remove(&oldest);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";

    #[test]
    fn signed_payload_verifies() {
        let payload = br#"{"id":"evt_1"}"#;
        let now = Utc::now();
        let header = sign_payload(payload, SECRET, now.timestamp());
        assert!(verify_signature(payload, &header, SECRET, now).is_ok());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let now = Utc::now();
        let header = sign_payload(br#"{"id":"evt_1"}"#, SECRET, now.timestamp());
        assert!(verify_signature(br#"{"id":"evt_2"}"#, &header, SECRET, now).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let payload = br#"{"id":"evt_1"}"#;
        let now = Utc::now();
        let header = sign_payload(payload, "whsec_other", now.timestamp());
        assert!(verify_signature(payload, &header, SECRET, now).is_err());
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let payload = br#"{"id":"evt_1"}"#;
        let now = Utc::now();
        let stale = now.timestamp() - SIGNATURE_TOLERANCE_SECS - 1;
        let header = sign_payload(payload, SECRET, stale);
        assert!(verify_signature(payload, &header, SECRET, now).is_err());
    }

    #[test]
    fn malformed_headers_are_rejected() {
        let now = Utc::now();
        for header in ["", "t=abc,v1=zz", "v1=00ff", "t=123"] {
            assert!(verify_signature(b"{}", header, SECRET, now).is_err(), "{header}");
        }
    }

    #[test]
    fn dedupe_reports_replays() {
        let dedupe = EventDedupe::default();
        assert!(dedupe.mark_seen("evt_1"));
        assert!(!dedupe.mark_seen("evt_1"));
        assert!(dedupe.mark_seen("evt_2"));
    }

    #[test]
    fn dedupe_evicts_oldest_beyond_capacity() {
        let dedupe = EventDedupe::with_capacity(2);
        assert!(dedupe.mark_seen("evt_1"));
        assert!(dedupe.mark_seen("evt_2"));
        assert!(dedupe.mark_seen("evt_3"));
        // evt_1 has been evicted and would be processed again.
        assert!(dedupe.mark_seen("evt_1"));
        assert!(!dedupe.mark_seen("evt_3"));
    }
}
