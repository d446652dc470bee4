use serde::{Deserialize, Serialize};
use shared_store::StoreError;
use thiserror::Error;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub user_id: String,
    pub doctor_id: String,
    /// RFC 3339 timestamps. Carried as strings so they round-trip through
    /// the payment provider's metadata unchanged.
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeSession {
    pub id: String,
}

/// The slice of a Stripe event the webhook cares about.
#[derive(Debug, Deserialize)]
pub struct CheckoutEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: CheckoutEventData,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutEventData {
    pub object: CheckoutSessionObject,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutSessionObject {
    #[serde(default)]
    pub payment_status: String,
    pub metadata: Option<BookingMetadata>,
}

/// Booking details echoed back by the payment provider. Everything the
/// confirmation step knows about the booking comes from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingMetadata {
    pub user_id: String,
    pub doctor_id: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub notes: String,
    /// Agreed price in minor units, stringly typed by the provider.
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    pub doctor_id: String,
    pub appointment_id: String,
    pub rating: u8,
}

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Doctor not found")]
    PractitionerNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("The requested slot is already taken")]
    SlotTaken,

    #[error("Already rated")]
    AlreadyRated,

    #[error("Cannot rate before the appointment has ended")]
    TooEarly,

    #[error("Invalid appointment window: {0}")]
    InvalidWindow(String),

    #[error("Rating must be between 1 and 5")]
    InvalidRating,

    #[error("Webhook signature rejected: {0}")]
    InvalidSignature(String),

    #[error("Meeting provider error: {0}")]
    MeetingProvider(String),

    #[error("Payment provider error: {0}")]
    PaymentProvider(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
