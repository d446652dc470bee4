use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::records::{
    Account, BusyInterval, PatientAppointment, PatientRecord, PractitionerAppointment,
    PractitionerRecord, ProfileUpdate, RatingRecord,
};
use crate::{AccountStore, StoreError};

#[derive(Default)]
struct Inner {
    patients: HashMap<String, PatientRecord>,
    practitioners: HashMap<String, PractitionerRecord>,
    ratings: Vec<RatingRecord>,
    /// key -> claiming account id once used
    signup_keys: HashMap<String, Option<String>>,
}

/// In-memory document store. Every document lives under one lock, so the
/// dual-projection appointment writes are atomic by construction.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn account_by_id(&self, account_id: &str) -> Option<Account> {
        if let Some(p) = self.patients.get(account_id) {
            return Some(Account::Patient(p.clone()));
        }
        self.practitioners
            .get(account_id)
            .map(|p| Account::Practitioner(p.clone()))
    }

    fn email_taken(&self, email: &str) -> bool {
        self.patients.values().any(|p| p.email == email)
            || self.practitioners.values().any(|p| p.email == email)
    }

    /// Apply a closure to whichever record holds this account id.
    fn with_account(
        &mut self,
        account_id: &str,
        patient_op: impl FnOnce(&mut PatientRecord),
        practitioner_op: impl FnOnce(&mut PractitionerRecord),
    ) -> Result<(), StoreError> {
        if let Some(p) = self.patients.get_mut(account_id) {
            patient_op(p);
            return Ok(());
        }
        if let Some(p) = self.practitioners.get_mut(account_id) {
            practitioner_op(p);
            return Ok(());
        }
        Err(StoreError::NotFound)
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_patient(&self, record: PatientRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.email_taken(&record.email) {
            return Err(StoreError::DuplicateEmail);
        }
        inner.patients.insert(record.account_id.clone(), record);
        Ok(())
    }

    async fn create_practitioner(&self, record: PractitionerRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.email_taken(&record.email) {
            return Err(StoreError::DuplicateEmail);
        }
        inner
            .practitioners
            .insert(record.account_id.clone(), record);
        Ok(())
    }

    async fn find_account_by_id(&self, account_id: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.inner.read().await.account_by_id(account_id))
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let inner = self.inner.read().await;
        if let Some(p) = inner.patients.values().find(|p| p.email == email) {
            return Ok(Some(Account::Patient(p.clone())));
        }
        Ok(inner
            .practitioners
            .values()
            .find(|p| p.email == email)
            .map(|p| Account::Practitioner(p.clone())))
    }

    async fn find_account_by_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<Account>, StoreError> {
        let inner = self.inner.read().await;
        if let Some(p) = inner
            .patients
            .values()
            .find(|p| p.reset_token.as_deref() == Some(token))
        {
            return Ok(Some(Account::Patient(p.clone())));
        }
        Ok(inner
            .practitioners
            .values()
            .find(|p| p.reset_token.as_deref() == Some(token))
            .map(|p| Account::Practitioner(p.clone())))
    }

    async fn find_patient(&self, account_id: &str) -> Result<Option<PatientRecord>, StoreError> {
        Ok(self.inner.read().await.patients.get(account_id).cloned())
    }

    async fn find_practitioner(
        &self,
        account_id: &str,
    ) -> Result<Option<PractitionerRecord>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .practitioners
            .get(account_id)
            .cloned())
    }

    async fn mark_verified(&self, account_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.with_account(
            account_id,
            |p| {
                p.verified = true;
                p.verification_token = None;
            },
            |p| {
                p.verified = true;
                p.verification_token = None;
            },
        )
    }

    async fn set_reset_token(
        &self,
        account_id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.with_account(
            account_id,
            |p| {
                p.reset_token = Some(token.to_string());
                p.reset_token_expires_at = Some(expires_at);
            },
            |p| {
                p.reset_token = Some(token.to_string());
                p.reset_token_expires_at = Some(expires_at);
            },
        )
    }

    async fn reset_password(
        &self,
        account_id: &str,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.with_account(
            account_id,
            |p| {
                p.password_hash = password_hash.to_string();
                p.reset_token = None;
                p.reset_token_expires_at = None;
            },
            |p| {
                p.password_hash = password_hash.to_string();
                p.reset_token = None;
                p.reset_token_expires_at = None;
            },
        )
    }

    async fn update_profile(
        &self,
        account_id: &str,
        update: ProfileUpdate,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(p) = inner.patients.get_mut(account_id) {
            if let Some(name) = update.name {
                p.display_name = name;
            }
            if let Some(description) = update.description {
                p.description = description;
            }
            if let Some(photo) = update.profile_photo {
                p.profile_photo = photo;
            }
            if let Some(languages) = update.language_options {
                p.language_options = languages;
            }
            return Ok(());
        }
        if let Some(p) = inner.practitioners.get_mut(account_id) {
            if let Some(name) = update.name {
                p.display_name = name;
            }
            if let Some(description) = update.description {
                p.description = description;
            }
            if let Some(photo) = update.profile_photo {
                p.profile_photo = photo;
            }
            if let Some(help) = update.help_options {
                p.help_options = help;
            }
            if let Some(languages) = update.language_options {
                p.language_options = languages;
            }
            if let Some(rates) = update.rates {
                p.rates = rates;
            }
            if let Some(window) = update.workday_hours {
                p.workday_hours = window;
            }
            if let Some(window) = update.weekend_hours {
                p.weekend_hours = window;
            }
            if let Some(phone) = update.phone_number {
                p.phone_number = phone;
            }
            return Ok(());
        }
        Err(StoreError::NotFound)
    }

    async fn push_busy_interval(
        &self,
        practitioner_id: &str,
        interval: BusyInterval,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .practitioners
            .get_mut(practitioner_id)
            .ok_or(StoreError::NotFound)?;
        record.busy.push(interval);
        Ok(())
    }

    async fn list_practitioners(&self) -> Result<Vec<PractitionerRecord>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .practitioners
            .values()
            .cloned()
            .collect())
    }

    async fn insert_appointment(
        &self,
        practitioner_id: &str,
        practitioner_row: PractitionerAppointment,
        patient_id: &str,
        patient_row: PatientAppointment,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.practitioners.contains_key(practitioner_id) || !inner.patients.contains_key(patient_id) {
            return Err(StoreError::NotFound);
        }
        // Both membership checks passed under the same lock, so neither
        // push below can leave a half-written booking behind.
        if let Some(p) = inner.practitioners.get_mut(practitioner_id) {
            p.appointments.push(practitioner_row);
        }
        if let Some(p) = inner.patients.get_mut(patient_id) {
            p.appointments_made.push(patient_row);
        }
        Ok(())
    }

    async fn remove_appointment(
        &self,
        practitioner_id: &str,
        patient_id: &str,
        appointment_id: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(p) = inner.practitioners.get_mut(practitioner_id) {
            p.appointments
                .retain(|a| a.appointment_id != appointment_id);
        }
        if let Some(p) = inner.patients.get_mut(patient_id) {
            p.appointments_made
                .retain(|a| a.appointment_id != appointment_id);
        }
        Ok(())
    }

    async fn append_rating(&self, rating: RatingRecord) -> Result<Vec<RatingRecord>, StoreError> {
        let mut inner = self.inner.write().await;
        let practitioner_id = rating.practitioner_id.clone();
        inner.ratings.push(rating);
        Ok(inner
            .ratings
            .iter()
            .filter(|r| r.practitioner_id == practitioner_id)
            .cloned()
            .collect())
    }

    async fn set_average_rating(
        &self,
        practitioner_id: &str,
        average: f64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .practitioners
            .get_mut(practitioner_id)
            .ok_or(StoreError::NotFound)?;
        record.average_rating = average;
        Ok(())
    }

    async fn set_patient_appointment_rating(
        &self,
        patient_id: &str,
        appointment_id: &str,
        value: u8,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let patient = inner
            .patients
            .get_mut(patient_id)
            .ok_or(StoreError::NotFound)?;
        let row = patient
            .appointments_made
            .iter_mut()
            .find(|a| a.appointment_id == appointment_id)
            .ok_or(StoreError::NotFound)?;
        row.rating = value;
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn create_signup_key(&self, key: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.signup_keys.entry(key.to_string()).or_insert(None);
        Ok(())
    }

    async fn claim_signup_key(&self, key: &str, account_id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.signup_keys.get_mut(key) {
            Some(slot @ None) => {
                *slot = Some(account_id.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn patient(id: &str, email: &str) -> PatientRecord {
        PatientRecord::new(
            id.to_string(),
            "Test Patient".to_string(),
            email.to_string(),
            "hash".to_string(),
            "verify-token".to_string(),
        )
    }

    fn practitioner(id: &str, email: &str) -> PractitionerRecord {
        PractitionerRecord::new(
            id.to_string(),
            "Dr Test".to_string(),
            email.to_string(),
            "hash".to_string(),
            "verify-token".to_string(),
        )
    }

    fn booking_rows(
        appointment_id: &str,
        practitioner_id: &str,
        patient_id: &str,
    ) -> (PractitionerAppointment, PatientAppointment) {
        let now = Utc::now();
        let start = now + Duration::hours(24);
        let end = start + Duration::minutes(30);
        (
            PractitionerAppointment {
                appointment_id: appointment_id.to_string(),
                created_at: now,
                updated_at: now,
                notes: String::new(),
                start,
                end,
                meeting_id: "m1".to_string(),
                appointment_url: "https://meet.example/m1".to_string(),
                patient_id: patient_id.to_string(),
                price: 2000,
            },
            PatientAppointment {
                appointment_id: appointment_id.to_string(),
                created_at: now,
                updated_at: now,
                notes: String::new(),
                start,
                end,
                meeting_id: "m1".to_string(),
                appointment_url: "https://meet.example/m1".to_string(),
                practitioner_id: practitioner_id.to_string(),
                practitioner_name: "Dr Test".to_string(),
                rating: 0,
            },
        )
    }

    #[tokio::test]
    async fn duplicate_email_rejected_across_roles() {
        let store = MemoryStore::new();
        store
            .create_patient(patient("p1", "same@example.com"))
            .await
            .unwrap();
        let err = store
            .create_practitioner(practitioner("d1", "same@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicateEmail);
    }

    #[tokio::test]
    async fn insert_appointment_writes_both_projections() {
        let store = MemoryStore::new();
        store
            .create_patient(patient("p1", "p@example.com"))
            .await
            .unwrap();
        store
            .create_practitioner(practitioner("d1", "d@example.com"))
            .await
            .unwrap();

        let (doc_row, pat_row) = booking_rows("a1", "d1", "p1");
        store
            .insert_appointment("d1", doc_row, "p1", pat_row)
            .await
            .unwrap();

        let doctor = store.find_practitioner("d1").await.unwrap().unwrap();
        let patient = store.find_patient("p1").await.unwrap().unwrap();
        assert_eq!(doctor.appointments.len(), 1);
        assert_eq!(patient.appointments_made.len(), 1);
        assert_eq!(doctor.appointments[0].appointment_id, "a1");
        assert_eq!(patient.appointments_made[0].appointment_id, "a1");
    }

    #[tokio::test]
    async fn insert_appointment_with_missing_side_writes_nothing() {
        let store = MemoryStore::new();
        store
            .create_practitioner(practitioner("d1", "d@example.com"))
            .await
            .unwrap();

        let (doc_row, pat_row) = booking_rows("a1", "d1", "ghost");
        let err = store
            .insert_appointment("d1", doc_row, "ghost", pat_row)
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound);

        let doctor = store.find_practitioner("d1").await.unwrap().unwrap();
        assert!(doctor.appointments.is_empty());
    }

    #[tokio::test]
    async fn remove_appointment_is_idempotent() {
        let store = MemoryStore::new();
        store
            .create_patient(patient("p1", "p@example.com"))
            .await
            .unwrap();
        store
            .create_practitioner(practitioner("d1", "d@example.com"))
            .await
            .unwrap();
        let (doc_row, pat_row) = booking_rows("a1", "d1", "p1");
        store
            .insert_appointment("d1", doc_row, "p1", pat_row)
            .await
            .unwrap();

        store.remove_appointment("d1", "p1", "a1").await.unwrap();
        store.remove_appointment("d1", "p1", "a1").await.unwrap();

        let doctor = store.find_practitioner("d1").await.unwrap().unwrap();
        let patient = store.find_patient("p1").await.unwrap().unwrap();
        assert!(doctor.appointments.is_empty());
        assert!(patient.appointments_made.is_empty());
    }

    #[tokio::test]
    async fn signup_key_claimed_once() {
        let store = MemoryStore::new();
        store.create_signup_key("12345678").await.unwrap();
        assert!(store.claim_signup_key("12345678", "d1").await.unwrap());
        assert!(!store.claim_signup_key("12345678", "d2").await.unwrap());
        assert!(!store.claim_signup_key("unknown", "d1").await.unwrap());
    }

    #[tokio::test]
    async fn append_rating_returns_practitioner_scope_only() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .append_rating(RatingRecord {
                practitioner_id: "d1".to_string(),
                patient_id: "p1".to_string(),
                value: 4,
                created_at: now,
            })
            .await
            .unwrap();
        store
            .append_rating(RatingRecord {
                practitioner_id: "d2".to_string(),
                patient_id: "p1".to_string(),
                value: 1,
                created_at: now,
            })
            .await
            .unwrap();
        let ratings = store
            .append_rating(RatingRecord {
                practitioner_id: "d1".to_string(),
                patient_id: "p2".to_string(),
                value: 5,
                created_at: now,
            })
            .await
            .unwrap();
        assert_eq!(ratings.len(), 2);
        assert!(ratings.iter().all(|r| r.practitioner_id == "d1"));
    }
}
