use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==============================================================================
// ACCOUNTS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Patient,
    Practitioner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Practitioner => "practitioner",
        }
    }
}

/// Billable appointment lengths in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationBucket {
    #[serde(rename = "15")]
    Quarter,
    #[serde(rename = "30")]
    Half,
    #[serde(rename = "45")]
    ThreeQuarter,
    #[serde(rename = "60")]
    Hour,
}

impl DurationBucket {
    pub fn from_minutes(minutes: i64) -> Option<Self> {
        match minutes {
            15 => Some(DurationBucket::Quarter),
            30 => Some(DurationBucket::Half),
            45 => Some(DurationBucket::ThreeQuarter),
            60 => Some(DurationBucket::Hour),
            _ => None,
        }
    }

    pub fn minutes(&self) -> i64 {
        match self {
            DurationBucket::Quarter => 15,
            DurationBucket::Half => 30,
            DurationBucket::ThreeQuarter => 45,
            DurationBucket::Hour => 60,
        }
    }
}

/// Per-practitioner price table, amounts in minor currency units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    #[serde(rename = "15")]
    pub quarter: i64,
    #[serde(rename = "30")]
    pub half: i64,
    #[serde(rename = "45")]
    pub three_quarter: i64,
    #[serde(rename = "60")]
    pub hour: i64,
}

impl RateTable {
    pub fn rate(&self, bucket: DurationBucket) -> i64 {
        match bucket {
            DurationBucket::Quarter => self.quarter,
            DurationBucket::Half => self.half,
            DurationBucket::ThreeQuarter => self.three_quarter,
            DurationBucket::Hour => self.hour,
        }
    }
}

/// Working window as hours of day, `from` inclusive, `to` exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HourWindow {
    pub from: u8,
    pub to: u8,
}

impl HourWindow {
    pub fn is_zeroed(&self) -> bool {
        self.from == 0 && self.to == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    pub account_id: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub description: String,
    pub profile_photo: String,
    pub verified: bool,
    pub verification_token: Option<String>,
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub language_options: Vec<String>,
    pub appointments_made: Vec<PatientAppointment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PractitionerRecord {
    pub account_id: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub description: String,
    pub profile_photo: String,
    pub phone_number: String,
    pub verified: bool,
    pub verification_token: Option<String>,
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub help_options: Vec<String>,
    pub language_options: Vec<String>,
    pub rates: RateTable,
    pub workday_hours: HourWindow,
    pub weekend_hours: HourWindow,
    pub busy: Vec<BusyInterval>,
    pub average_rating: f64,
    pub appointments: Vec<PractitionerAppointment>,
}

impl PatientRecord {
    pub fn new(account_id: String, display_name: String, email: String, password_hash: String,
               verification_token: String) -> Self {
        Self {
            account_id,
            email,
            password_hash,
            display_name,
            description: String::new(),
            profile_photo: String::new(),
            verified: false,
            verification_token: Some(verification_token),
            reset_token: None,
            reset_token_expires_at: None,
            language_options: Vec::new(),
            appointments_made: Vec::new(),
        }
    }
}

impl PractitionerRecord {
    pub fn new(account_id: String, display_name: String, email: String, password_hash: String,
               verification_token: String) -> Self {
        Self {
            account_id,
            email,
            password_hash,
            display_name,
            description: String::new(),
            profile_photo: String::new(),
            phone_number: String::new(),
            verified: false,
            verification_token: Some(verification_token),
            reset_token: None,
            reset_token_expires_at: None,
            help_options: Vec::new(),
            language_options: Vec::new(),
            rates: RateTable::default(),
            workday_hours: HourWindow { from: 9, to: 17 },
            weekend_hours: HourWindow::default(),
            busy: Vec::new(),
            average_rating: 0.0,
            appointments: Vec::new(),
        }
    }
}

/// One account, resolved with its role in a single lookup.
#[derive(Debug, Clone)]
pub enum Account {
    Patient(PatientRecord),
    Practitioner(PractitionerRecord),
}

impl Account {
    pub fn account_id(&self) -> &str {
        match self {
            Account::Patient(p) => &p.account_id,
            Account::Practitioner(p) => &p.account_id,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Account::Patient(p) => &p.email,
            Account::Practitioner(p) => &p.email,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Account::Patient(p) => &p.display_name,
            Account::Practitioner(p) => &p.display_name,
        }
    }

    pub fn password_hash(&self) -> &str {
        match self {
            Account::Patient(p) => &p.password_hash,
            Account::Practitioner(p) => &p.password_hash,
        }
    }

    pub fn reset_token_expires_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Account::Patient(p) => p.reset_token_expires_at,
            Account::Practitioner(p) => p.reset_token_expires_at,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Account::Patient(_) => Role::Patient,
            Account::Practitioner(_) => Role::Practitioner,
        }
    }
}

/// Partial profile edit; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub profile_photo: Option<String>,
    pub help_options: Option<Vec<String>>,
    pub language_options: Option<Vec<String>>,
    pub rates: Option<RateTable>,
    pub workday_hours: Option<HourWindow>,
    pub weekend_hours: Option<HourWindow>,
    pub phone_number: Option<String>,
}

// ==============================================================================
// APPOINTMENT PROJECTIONS
// ==============================================================================

/// Practitioner-side projection of a booking. Carries the paying patient and
/// the agreed price; never exposed to third parties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PractitionerAppointment {
    pub appointment_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub notes: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub meeting_id: String,
    pub appointment_url: String,
    pub patient_id: String,
    /// Minor currency units.
    pub price: i64,
}

/// Patient-side projection. Carries the counterparty practitioner and the
/// write-once rating (0 = unrated).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientAppointment {
    pub appointment_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub notes: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub meeting_id: String,
    pub appointment_url: String,
    pub practitioner_id: String,
    pub practitioner_name: String,
    pub rating: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingRecord {
    pub practitioner_id: String,
    pub patient_id: String,
    pub value: u8,
    pub created_at: DateTime<Utc>,
}
