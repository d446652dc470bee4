use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use notification_cell::NotificationGateway;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use shared_store::records::{PatientAppointment, PatientRecord, PractitionerAppointment};
use shared_store::AccountStore;
use shared_utils::ids::generate_id;

use crate::models::{BookingError, BookingMetadata};
use crate::services::meeting::MeetingClient;

/// Drives a booking through `Priced -> Confirmed -> {Cancelled | Rated}`.
///
/// Confirmations for the same practitioner are serialized through a
/// per-practitioner mutex so the overlap check and the projection insert
/// act as one step; two racing payments for the same slot settle into one
/// booking and one conflict.
pub struct LifecycleCoordinator {
    store: Arc<dyn AccountStore>,
    meetings: MeetingClient,
    notifier: Arc<dyn NotificationGateway>,
    confirm_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LifecycleCoordinator {
    pub fn new(
        store: Arc<dyn AccountStore>,
        meetings: MeetingClient,
        notifier: Arc<dyn NotificationGateway>,
    ) -> Self {
        Self {
            store,
            meetings,
            notifier,
            confirm_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn practitioner_lock(&self, practitioner_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.confirm_locks.lock().await;
        locks
            .entry(practitioner_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop a practitioner's lock entry once nobody holds it. Clones are
    /// only handed out under the map lock, so the strong count cannot rise
    /// while it is checked here.
    async fn release_practitioner_lock(&self, practitioner_id: &str) {
        let mut locks = self.confirm_locks.lock().await;
        if let Some(entry) = locks.get(practitioner_id) {
            if Arc::strong_count(entry) == 1 {
                locks.remove(practitioner_id);
            }
        }
    }

    /// Lock entries currently tracked; idle entries are pruned, so this
    /// only counts practitioners with a confirmation in flight.
    pub async fn tracked_confirm_locks(&self) -> usize {
        self.confirm_locks.lock().await.len()
    }

    /// Turn a settled payment into a confirmed appointment.
    ///
    /// Ordering is deliberate: the meeting room exists before any row is
    /// written, both projections are written in one store operation, and
    /// notifications go out only after the booking is durable. A mail
    /// failure never unwinds a paid booking.
    pub async fn confirm_booking(
        &self,
        metadata: &BookingMetadata,
    ) -> Result<String, BookingError> {
        let start = parse_timestamp(&metadata.start)?;
        let end = parse_timestamp(&metadata.end)?;
        if end <= start {
            return Err(BookingError::InvalidWindow(
                "appointment must end after it starts".to_string(),
            ));
        }
        let price: i64 = metadata
            .value
            .parse()
            .map_err(|_| BookingError::InvalidWindow("unparseable price".to_string()))?;

        let patient = self
            .store
            .find_patient(&metadata.user_id)
            .await?
            .ok_or(BookingError::PatientNotFound)?;

        let lock = self.practitioner_lock(&metadata.doctor_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.confirm_exclusive(metadata, start, end, price, &patient)
                .await
        };
        drop(lock);
        self.release_practitioner_lock(&metadata.doctor_id).await;
        result
    }

    /// The serialized half of confirmation. Runs with the practitioner's
    /// lock held.
    async fn confirm_exclusive(
        &self,
        metadata: &BookingMetadata,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        price: i64,
        patient: &PatientRecord,
    ) -> Result<String, BookingError> {
        // Loaded under the lock so the overlap check sees every booking a
        // concurrent confirmation may have just written.
        let practitioner = self
            .store
            .find_practitioner(&metadata.doctor_id)
            .await?
            .ok_or(BookingError::PractitionerNotFound)?;

        let appointment_overlap = practitioner
            .appointments
            .iter()
            .any(|a| overlaps(start, end, a.start, a.end));
        let busy_overlap = practitioner
            .busy
            .iter()
            .any(|b| overlaps(start, end, b.start, b.end));
        if appointment_overlap || busy_overlap {
            warn!(
                "Rejected overlapping confirmation for practitioner {} at {}",
                metadata.doctor_id, metadata.start
            );
            return Err(BookingError::SlotTaken);
        }

        let meeting = self.meetings.create_meeting("Appointment", end).await?;

        let appointment_id = generate_id();
        let now = Utc::now();
        let practitioner_row = PractitionerAppointment {
            appointment_id: appointment_id.clone(),
            created_at: now,
            updated_at: now,
            notes: metadata.notes.clone(),
            start,
            end,
            meeting_id: meeting.meeting_id.clone(),
            appointment_url: meeting.room_url.clone(),
            patient_id: patient.account_id.clone(),
            price,
        };
        let patient_row = PatientAppointment {
            appointment_id: appointment_id.clone(),
            created_at: now,
            updated_at: now,
            notes: metadata.notes.clone(),
            start,
            end,
            meeting_id: meeting.meeting_id.clone(),
            appointment_url: meeting.room_url,
            practitioner_id: practitioner.account_id.clone(),
            practitioner_name: practitioner.display_name.clone(),
            rating: 0,
        };

        self.store
            .insert_appointment(
                &practitioner.account_id,
                practitioner_row,
                &patient.account_id,
                patient_row,
            )
            .await?;

        info!(
            "Confirmed appointment {} for practitioner {} and patient {}",
            appointment_id, practitioner.account_id, patient.account_id
        );

        self.notifier
            .send_booking_confirmation(
                &practitioner.email,
                &patient.email,
                &metadata.start,
                &metadata.notes,
            )
            .await;

        Ok(appointment_id)
    }

    /// Patient-side cancellation. The appointment must be in the caller's
    /// own list; removal from both projections is atomic and idempotent.
    pub async fn cancel_by_patient(
        &self,
        patient_id: &str,
        appointment_id: &str,
    ) -> Result<(), BookingError> {
        let patient = self
            .store
            .find_patient(patient_id)
            .await?
            .ok_or(BookingError::PatientNotFound)?;

        let row = patient
            .appointments_made
            .iter()
            .find(|a| a.appointment_id == appointment_id)
            .ok_or(BookingError::AppointmentNotFound)?;

        self.deprovision_meeting(&row.meeting_id).await;

        self.store
            .remove_appointment(&row.practitioner_id, patient_id, appointment_id)
            .await?;

        info!("Patient {} cancelled appointment {}", patient_id, appointment_id);
        Ok(())
    }

    /// Practitioner-side cancellation; the patient is told why.
    pub async fn cancel_by_practitioner(
        &self,
        practitioner_id: &str,
        appointment_id: &str,
        reason: &str,
    ) -> Result<(), BookingError> {
        let practitioner = self
            .store
            .find_practitioner(practitioner_id)
            .await?
            .ok_or(BookingError::PractitionerNotFound)?;

        let row = practitioner
            .appointments
            .iter()
            .find(|a| a.appointment_id == appointment_id)
            .ok_or(BookingError::AppointmentNotFound)?;
        let patient_id = row.patient_id.clone();

        self.deprovision_meeting(&row.meeting_id).await;

        self.store
            .remove_appointment(practitioner_id, &patient_id, appointment_id)
            .await?;

        info!(
            "Practitioner {} cancelled appointment {}: {}",
            practitioner_id, appointment_id, reason
        );

        match self.store.find_patient(&patient_id).await? {
            Some(patient) => {
                self.notifier.send_cancellation(&patient.email, reason).await;
            }
            None => warn!(
                "No patient {} to notify about cancelled appointment {}",
                patient_id, appointment_id
            ),
        }

        Ok(())
    }

    /// Record a write-once rating for a finished appointment and refresh
    /// the practitioner's average. The rated practitioner is the one on the
    /// appointment; a claim naming anyone else is rejected.
    pub async fn rate(
        &self,
        patient_id: &str,
        claimed_practitioner_id: &str,
        appointment_id: &str,
        value: u8,
    ) -> Result<f64, BookingError> {
        if !(1..=5).contains(&value) {
            return Err(BookingError::InvalidRating);
        }

        let patient = self
            .store
            .find_patient(patient_id)
            .await?
            .ok_or(BookingError::PatientNotFound)?;

        let row = patient
            .appointments_made
            .iter()
            .find(|a| a.appointment_id == appointment_id)
            .ok_or(BookingError::AppointmentNotFound)?;

        if row.practitioner_id != claimed_practitioner_id {
            return Err(BookingError::AppointmentNotFound);
        }
        if row.rating != 0 {
            return Err(BookingError::AlreadyRated);
        }
        if !ratable(row.end, Utc::now()) {
            return Err(BookingError::TooEarly);
        }

        let practitioner_id = row.practitioner_id.clone();
        let ratings = self
            .store
            .append_rating(shared_store::records::RatingRecord {
                practitioner_id: practitioner_id.clone(),
                patient_id: patient_id.to_string(),
                value,
                created_at: Utc::now(),
            })
            .await?;

        let average =
            ratings.iter().map(|r| r.value as f64).sum::<f64>() / ratings.len() as f64;

        self.store
            .set_average_rating(&practitioner_id, average)
            .await?;
        self.store
            .set_patient_appointment_rating(patient_id, appointment_id, value)
            .await?;

        info!(
            "Appointment {} rated {}; practitioner {} average is now {}",
            appointment_id, value, practitioner_id, average
        );
        Ok(average)
    }

    /// Patient's own bookings, soonest first.
    pub async fn appointments_made(
        &self,
        patient_id: &str,
    ) -> Result<Vec<PatientAppointment>, BookingError> {
        let patient = self
            .store
            .find_patient(patient_id)
            .await?
            .ok_or(BookingError::PatientNotFound)?;

        let mut appointments = patient.appointments_made;
        appointments.sort_by_key(|a| a.start);
        Ok(appointments)
    }

    async fn deprovision_meeting(&self, meeting_id: &str) {
        if let Err(e) = self.meetings.delete_meeting(meeting_id).await {
            error!(
                "Failed to deprovision meeting {}, continuing with cancellation: {}",
                meeting_id, e
            );
        }
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, BookingError> {
    raw.parse::<DateTime<Utc>>()
        .map_err(|_| BookingError::InvalidWindow(format!("unparseable timestamp: {}", raw)))
}

fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// An appointment can be rated strictly after it ends.
fn ratable(end: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    end < now
}
