use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use shared_config::AppConfig;

use crate::models::BookingError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateMeetingRequest<'a> {
    title: &'a str,
    end_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub meeting_id: String,
    pub room_url: String,
}

/// Client for the video meeting provider's REST API. One room per
/// appointment, deleted again on cancellation.
pub struct MeetingClient {
    client: Client,
    api_key: String,
    base_url: String,
    configured: bool,
}

impl MeetingClient {
    pub fn new(config: &Arc<AppConfig>) -> Self {
        Self {
            client: Client::new(),
            api_key: config.meeting_api_key.clone(),
            base_url: config.meeting_api_base_url.clone(),
            configured: config.is_meetings_configured(),
        }
    }

    /// POST /meetings
    pub async fn create_meeting(
        &self,
        title: &str,
        end_date: DateTime<Utc>,
    ) -> Result<Meeting, BookingError> {
        if !self.configured {
            return Err(BookingError::MeetingProvider(
                "meeting provider not configured".to_string(),
            ));
        }
        let url = format!("{}/meetings", self.base_url);
        debug!("Provisioning meeting room via {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&CreateMeetingRequest { title, end_date })
            .send()
            .await
            .map_err(|e| BookingError::MeetingProvider(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BookingError::MeetingProvider(e.to_string()))?;

        if !status.is_success() {
            error!("Meeting provisioning failed: {} - {}", status, body);
            return Err(BookingError::MeetingProvider(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let meeting: Meeting = serde_json::from_str(&body)
            .map_err(|e| BookingError::MeetingProvider(format!("Malformed response: {}", e)))?;

        info!("Provisioned meeting room {}", meeting.meeting_id);
        Ok(meeting)
    }

    /// DELETE /meetings/{id}. Cancellation proceeds even when this fails,
    /// so the caller only ever logs the error.
    pub async fn delete_meeting(&self, meeting_id: &str) -> Result<(), BookingError> {
        let url = format!("{}/meetings/{}", self.base_url, meeting_id);

        let response = self
            .client
            .delete(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| BookingError::MeetingProvider(e.to_string()))?;

        if !response.status().is_success() {
            warn!(
                "Meeting {} deprovisioning returned HTTP {}",
                meeting_id,
                response.status()
            );
            return Err(BookingError::MeetingProvider(format!(
                "HTTP {}",
                response.status()
            )));
        }

        info!("Deprovisioned meeting room {}", meeting_id);
        Ok(())
    }
}
