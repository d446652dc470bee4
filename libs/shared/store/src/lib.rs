pub mod memory;
pub mod records;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use records::{
    Account, BusyInterval, PatientAppointment, PatientRecord, PractitionerAppointment,
    PractitionerRecord, ProfileUpdate, RatingRecord,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Account not found")]
    NotFound,

    #[error("An account with this email already exists")]
    DuplicateEmail,
}

/// Document-store seam. The coordinator and the cells only ever talk to this
/// trait; the engine behind it is injected at construction.
///
/// The two appointment projections of one logical booking are written and
/// removed through single operations so an implementation can make the dual
/// write atomic (the in-memory store holds every document under one lock; a
/// database-backed store would use its transaction primitive).
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn create_patient(&self, record: PatientRecord) -> Result<(), StoreError>;
    async fn create_practitioner(&self, record: PractitionerRecord) -> Result<(), StoreError>;

    async fn find_account_by_id(&self, account_id: &str) -> Result<Option<Account>, StoreError>;
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
    async fn find_account_by_reset_token(&self, token: &str)
        -> Result<Option<Account>, StoreError>;
    async fn find_patient(&self, account_id: &str) -> Result<Option<PatientRecord>, StoreError>;
    async fn find_practitioner(
        &self,
        account_id: &str,
    ) -> Result<Option<PractitionerRecord>, StoreError>;

    async fn mark_verified(&self, account_id: &str) -> Result<(), StoreError>;
    async fn set_reset_token(
        &self,
        account_id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
    /// Replace the password hash and clear any outstanding reset token.
    async fn reset_password(&self, account_id: &str, password_hash: &str)
        -> Result<(), StoreError>;

    async fn update_profile(&self, account_id: &str, update: ProfileUpdate)
        -> Result<(), StoreError>;
    async fn push_busy_interval(
        &self,
        practitioner_id: &str,
        interval: BusyInterval,
    ) -> Result<(), StoreError>;

    async fn list_practitioners(&self) -> Result<Vec<PractitionerRecord>, StoreError>;

    /// Append both projections of a confirmed booking in one atomic step.
    async fn insert_appointment(
        &self,
        practitioner_id: &str,
        practitioner_row: PractitionerAppointment,
        patient_id: &str,
        patient_row: PatientAppointment,
    ) -> Result<(), StoreError>;

    /// Remove a booking from both lists. Each side's removal is idempotent:
    /// a projection that is already gone is not an error.
    async fn remove_appointment(
        &self,
        practitioner_id: &str,
        patient_id: &str,
        appointment_id: &str,
    ) -> Result<(), StoreError>;

    /// Append a rating and return every rating recorded for that
    /// practitioner, the appended one included.
    async fn append_rating(&self, rating: RatingRecord) -> Result<Vec<RatingRecord>, StoreError>;
    async fn set_average_rating(&self, practitioner_id: &str, average: f64)
        -> Result<(), StoreError>;
    async fn set_patient_appointment_rating(
        &self,
        patient_id: &str,
        appointment_id: &str,
        value: u8,
    ) -> Result<(), StoreError>;

    async fn create_signup_key(&self, key: &str) -> Result<(), StoreError>;
    /// Claim a single-use practitioner signup key. Returns false if the key
    /// is unknown or already claimed.
    async fn claim_signup_key(&self, key: &str, account_id: &str) -> Result<bool, StoreError>;
}
