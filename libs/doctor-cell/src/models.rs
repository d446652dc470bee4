use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_store::records::{
    BusyInterval, HourWindow, PractitionerAppointment, PractitionerRecord, RateTable,
};
use shared_store::StoreError;
use thiserror::Error;

/// Public directory card, the only shape the search endpoints expose.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorCard {
    pub user_id: String,
    pub name: String,
    pub profile_photo: String,
    pub help_options: Vec<String>,
    pub language_options: Vec<String>,
    pub rates: RateTable,
    pub average_rating: f64,
}

impl From<&PractitionerRecord> for DoctorCard {
    fn from(record: &PractitionerRecord) -> Self {
        Self {
            user_id: record.account_id.clone(),
            name: record.display_name.clone(),
            profile_photo: record.profile_photo.clone(),
            help_options: record.help_options.clone(),
            language_options: record.language_options.clone(),
            rates: record.rates.clone(),
            average_rating: record.average_rating,
        }
    }
}

/// Filter block carried in the `sortBy` query parameter as a JSON string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SortCriteria {
    pub language_options: Vec<String>,
    pub help_options: Vec<String>,
    pub appointment_length: Vec<i64>,
    pub price: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SortedDoctorsQuery {
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

/// Practitioner profile, public.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PractitionerProfile {
    pub user_id: String,
    pub name: String,
    pub description: String,
    pub profile_photo: String,
    pub help_options: Vec<String>,
    pub language_options: Vec<String>,
    pub rates: RateTable,
    pub average_rating: f64,
    pub workday_hours: HourWindow,
    pub weekend_hours: HourWindow,
    pub email: String,
    pub phone_number: String,
}

/// Patient profile, visible to the owner only.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    pub user_id: String,
    pub name: String,
    pub description: String,
    pub profile_photo: String,
    pub language_options: Vec<String>,
}

/// Redacted slot for anonymous availability lookups. Carries no notes, no
/// counterparty, no meeting link.
#[derive(Debug, Serialize)]
pub struct OccupiedSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AppointmentView {
    Full(Vec<PractitionerAppointment>),
    Redacted(Vec<OccupiedSlot>),
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub appointments: AppointmentView,
    pub busy: Vec<BusyInterval>,
}

#[derive(Debug, Deserialize)]
pub struct BusyRequest {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Error, Debug)]
pub enum DoctorError {
    #[error("User not found")]
    NotFound,

    #[error("Invalid sort criteria")]
    InvalidSortCriteria,

    #[error("Invalid sort order")]
    InvalidSortOrder,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
