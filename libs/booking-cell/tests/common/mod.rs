#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notification_cell::NotificationGateway;
use shared_config::AppConfig;
use shared_store::memory::MemoryStore;
use shared_store::records::{PatientRecord, PractitionerRecord, RateTable};
use shared_store::AccountStore;

#[derive(Debug, Clone, PartialEq)]
pub enum SentMail {
    BookingToPractitioner(String),
    BookingToPatient(String),
    Cancellation { to: String, reason: String },
}

/// Captures outbound notifications instead of delivering them.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentMail>>,
}

#[async_trait]
impl NotificationGateway for RecordingMailer {
    async fn send_verification(&self, _to: &str, _verify_url: &str) {}

    async fn send_password_reset(&self, _to: &str, _reset_url: &str) {}

    async fn send_booking_confirmation(
        &self,
        practitioner_email: &str,
        patient_email: &str,
        _start: &str,
        _notes: &str,
    ) {
        let mut sent = self.sent.lock().await;
        sent.push(SentMail::BookingToPractitioner(practitioner_email.to_string()));
        sent.push(SentMail::BookingToPatient(patient_email.to_string()));
    }

    async fn send_cancellation(&self, to: &str, reason: &str) {
        self.sent.lock().await.push(SentMail::Cancellation {
            to: to.to_string(),
            reason: reason.to_string(),
        });
    }
}

pub fn test_config(meeting_url: &str, stripe_url: &str) -> Arc<AppConfig> {
    Arc::new(AppConfig {
        jwt_secret: "test-secret".to_string(),
        stripe_secret_key: "sk_test_x".to_string(),
        stripe_webhook_secret: "whsec_test".to_string(),
        stripe_api_base_url: stripe_url.to_string(),
        meeting_api_key: "meet-key".to_string(),
        meeting_api_base_url: meeting_url.to_string(),
        web_url: "https://clinic.test".to_string(),
        ..AppConfig::default()
    })
}

/// Stub the meeting provider: room creation succeeds `expected` times.
pub async fn mock_meeting_provider(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/meetings"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "meetingId": "meet-1",
            "roomUrl": "https://meet.example/room-1",
        })))
        .expect(expected)
        .mount(server)
        .await;
}

pub async fn mock_meeting_deletion(server: &MockServer) {
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}

pub async fn seed_accounts(store: &MemoryStore) -> (String, String) {
    let practitioner_id = "d00000000000000000000001".to_string();
    let patient_id = "p00000000000000000000001".to_string();

    let mut practitioner = PractitionerRecord::new(
        practitioner_id.clone(),
        "Dr Seed".to_string(),
        "doctor@clinic.test".to_string(),
        "hash".to_string(),
        "tok".to_string(),
    );
    practitioner.rates = RateTable {
        quarter: 1000,
        half: 2000,
        three_quarter: 3000,
        hour: 4000,
    };
    store.create_practitioner(practitioner).await.unwrap();

    store
        .create_patient(PatientRecord::new(
            patient_id.clone(),
            "Pat Seed".to_string(),
            "patient@clinic.test".to_string(),
            "hash".to_string(),
            "tok".to_string(),
        ))
        .await
        .unwrap();

    (practitioner_id, patient_id)
}

pub fn slot(hours_from_now: i64, minutes: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc::now() + Duration::hours(hours_from_now);
    (start, start + Duration::minutes(minutes))
}
