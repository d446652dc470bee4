use std::sync::Arc;

use shared_store::records::BusyInterval;
use shared_store::AccountStore;

use crate::models::{AppointmentView, AvailabilityResponse, DoctorError, OccupiedSlot};

pub struct AvailabilityService {
    store: Arc<dyn AccountStore>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// A practitioner's calendar. The owner gets the full rows; anyone else
    /// only learns which slots are occupied, never by whom or why.
    pub async fn calendar(
        &self,
        practitioner_id: &str,
        viewer_id: Option<&str>,
    ) -> Result<AvailabilityResponse, DoctorError> {
        let record = self
            .store
            .find_practitioner(practitioner_id)
            .await?
            .ok_or(DoctorError::NotFound)?;

        let appointments = if viewer_id == Some(practitioner_id) {
            AppointmentView::Full(record.appointments)
        } else {
            AppointmentView::Redacted(
                record
                    .appointments
                    .iter()
                    .map(|a| OccupiedSlot {
                        start: a.start,
                        end: a.end,
                    })
                    .collect(),
            )
        };

        Ok(AvailabilityResponse {
            appointments,
            busy: record.busy,
        })
    }

    pub async fn declare_busy(
        &self,
        practitioner_id: &str,
        interval: BusyInterval,
    ) -> Result<(), DoctorError> {
        self.store
            .push_busy_interval(practitioner_id, interval)
            .await
            .map_err(|e| match e {
                shared_store::StoreError::NotFound => DoctorError::NotFound,
                other => DoctorError::Store(other),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use shared_store::memory::MemoryStore;
    use shared_store::records::{
        PatientAppointment, PatientRecord, PractitionerAppointment, PractitionerRecord,
    };

    async fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .create_practitioner(PractitionerRecord::new(
                "d1".to_string(),
                "Dr One".to_string(),
                "d1@clinic.test".to_string(),
                "hash".to_string(),
                "tok".to_string(),
            ))
            .await
            .unwrap();
        store
            .create_patient(PatientRecord::new(
                "p1".to_string(),
                "Pat".to_string(),
                "p1@clinic.test".to_string(),
                "hash".to_string(),
                "tok".to_string(),
            ))
            .await
            .unwrap();

        let now = Utc::now();
        let start = now + Duration::hours(2);
        let end = start + Duration::minutes(30);
        store
            .insert_appointment(
                "d1",
                PractitionerAppointment {
                    appointment_id: "a1".to_string(),
                    created_at: now,
                    updated_at: now,
                    notes: "private notes".to_string(),
                    start,
                    end,
                    meeting_id: "m1".to_string(),
                    appointment_url: "https://meet.example/m1".to_string(),
                    patient_id: "p1".to_string(),
                    price: 2000,
                },
                "p1",
                PatientAppointment {
                    appointment_id: "a1".to_string(),
                    created_at: now,
                    updated_at: now,
                    notes: "private notes".to_string(),
                    start,
                    end,
                    meeting_id: "m1".to_string(),
                    appointment_url: "https://meet.example/m1".to_string(),
                    practitioner_id: "d1".to_string(),
                    practitioner_name: "Dr One".to_string(),
                    rating: 0,
                },
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn owner_sees_full_rows() {
        let service = AvailabilityService::new(seeded_store().await);
        let response = service.calendar("d1", Some("d1")).await.unwrap();
        match response.appointments {
            AppointmentView::Full(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].patient_id, "p1");
            }
            AppointmentView::Redacted(_) => panic!("owner should see full rows"),
        }
    }

    #[tokio::test]
    async fn strangers_see_occupied_slots_only() {
        let service = AvailabilityService::new(seeded_store().await);

        for viewer in [None, Some("p1"), Some("d2")] {
            let response = service.calendar("d1", viewer).await.unwrap();
            match response.appointments {
                AppointmentView::Redacted(slots) => {
                    assert_eq!(slots.len(), 1);
                    let json = serde_json::to_string(&slots).unwrap();
                    assert!(!json.contains("private notes"));
                    assert!(!json.contains("p1"));
                }
                AppointmentView::Full(_) => panic!("non-owner must not see full rows"),
            }
        }
    }

    #[tokio::test]
    async fn unknown_practitioner_is_not_found() {
        let service = AvailabilityService::new(seeded_store().await);
        assert!(matches!(
            service.calendar("ghost", None).await,
            Err(DoctorError::NotFound)
        ));
    }

    #[tokio::test]
    async fn busy_interval_shows_up_in_calendar() {
        let store = seeded_store().await;
        let service = AvailabilityService::new(store);
        let start = Utc::now() + Duration::days(1);
        service
            .declare_busy(
                "d1",
                BusyInterval {
                    start,
                    end: start + Duration::hours(3),
                },
            )
            .await
            .unwrap();

        let response = service.calendar("d1", None).await.unwrap();
        assert_eq!(response.busy.len(), 1);
    }
}
