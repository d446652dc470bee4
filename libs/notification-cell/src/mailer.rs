use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use shared_config::AppConfig;
use tracing::{error, info, warn};

use crate::templates;

/// One-way notification seam. Implementations deliver on a best-effort
/// basis: a failed send is logged by the implementation and never surfaces
/// to the caller, so a mail outage cannot fail a booking that has already
/// been paid for.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn send_verification(&self, to: &str, verify_url: &str);
    async fn send_password_reset(&self, to: &str, reset_url: &str);
    async fn send_booking_confirmation(
        &self,
        practitioner_email: &str,
        patient_email: &str,
        start: &str,
        notes: &str,
    );
    async fn send_cancellation(&self, to: &str, reason: &str);
}

#[derive(Serialize)]
struct MailPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// Delivers mail through an HTTP transactional-mail API.
pub struct HttpMailer {
    config: Arc<AppConfig>,
    client: reqwest::Client,
}

impl HttpMailer {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn deliver(&self, to: &str, subject: &str, html: &str) {
        if !self.config.is_mail_configured() {
            warn!("Mail transport not configured, dropping email to {}", to);
            return;
        }

        let payload = MailPayload {
            from: &self.config.mail_from,
            to,
            subject,
            html,
        };

        let result = self
            .client
            .post(&self.config.mail_api_url)
            .header("Authorization", format!("Bearer {}", self.config.mail_api_key))
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                info!("Sent email '{}' to {}", subject, to);
            }
            Ok(response) => {
                error!(
                    "Mail API rejected email '{}' to {}: HTTP {}",
                    subject,
                    to,
                    response.status()
                );
            }
            Err(e) => {
                error!("Failed to reach mail API for email to {}: {}", to, e);
            }
        }
    }
}

#[async_trait]
impl NotificationGateway for HttpMailer {
    async fn send_verification(&self, to: &str, verify_url: &str) {
        let html = templates::verification(verify_url);
        self.deliver(to, "Verify your email address", &html).await;
    }

    async fn send_password_reset(&self, to: &str, reset_url: &str) {
        let html = templates::password_reset(reset_url);
        self.deliver(to, "Password reset", &html).await;
    }

    async fn send_booking_confirmation(
        &self,
        practitioner_email: &str,
        patient_email: &str,
        start: &str,
        notes: &str,
    ) {
        let practitioner_html = templates::booking_for_practitioner(start, notes);
        self.deliver(practitioner_email, "New consultation booked", &practitioner_html)
            .await;

        let patient_html = templates::booking_for_patient(start, notes);
        self.deliver(patient_email, "Your consultation is confirmed", &patient_html)
            .await;
    }

    async fn send_cancellation(&self, to: &str, reason: &str) {
        let html = templates::cancellation(reason);
        self.deliver(to, "Your consultation was cancelled", &html)
            .await;
    }
}
