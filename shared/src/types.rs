use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClinicError;

// ========== USER ==========
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Receptionist,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Receptionist => "receptionist",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A clinic user without credentials. This is the shape held by the session
/// and written to durable storage.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(flatten)]
    pub profile: Profile,
}

impl User {
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn as_doctor(&self) -> Option<&DoctorProfile> {
        match &self.profile {
            Profile::Doctor(doctor) => Some(doctor),
            _ => None,
        }
    }
}

/// Role-specific attributes, discriminated by the `role` field.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Profile {
    Patient(PatientProfile),
    Doctor(DoctorProfile),
    Receptionist(ReceptionistProfile),
}

impl Profile {
    pub fn role(&self) -> Role {
        match self {
            Profile::Patient(_) => Role::Patient,
            Profile::Doctor(_) => Role::Doctor,
            Profile::Receptionist(_) => Role::Receptionist,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    pub date_of_birth: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoctorProfile {
    pub specialty: String,
    pub license_number: String,
    pub years_of_experience: u32,
    #[serde(default)]
    pub availability: Vec<TimeSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReceptionistProfile {
    pub department: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: String,
    pub day_of_week: u8, // 0-6 (Sunday-Saturday)
    pub start_time: String, // HH:mm
    pub end_time: String,
    pub is_available: bool,
}

/// A fixture user record, credentials included.
#[derive(Debug, Deserialize, Clone)]
pub struct Account {
    #[serde(flatten)]
    pub user: User,
    pub password: String,
}

impl Account {
    pub fn matches(&self, email: &str, password: &str) -> bool {
        self.user.email == email && self.password == password
    }

    pub fn into_user(self) -> User {
        self.user
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(flatten)]
    pub profile: Profile,
}

// ========== APPOINTMENT ==========
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = ClinicError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value.trim())
            .ok_or_else(|| ClinicError::UnknownStatus(value.to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub date: String, // yyyy-MM-dd
    pub time: String, // HH:mm
    pub status: AppointmentStatus,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    pub patient_id: String,
    pub doctor_id: String,
    pub date: String,
    pub time: String,
    pub reason: String,
}

// ========== FIXTURES ==========
#[derive(Debug, Deserialize)]
pub struct UsersFixture {
    #[serde(default)]
    pub patients: Vec<Account>,
    #[serde(default)]
    pub doctors: Vec<Account>,
    #[serde(default)]
    pub receptionists: Vec<Account>,
}

impl UsersFixture {
    /// All role groups in one list: patients, then doctors, then receptionists.
    pub fn into_accounts(self) -> Vec<Account> {
        let mut accounts = self.patients;
        accounts.extend(self.doctors);
        accounts.extend(self.receptionists);
        accounts
    }
}

#[derive(Debug, Deserialize)]
pub struct AppointmentsFixture {
    pub appointments: Vec<Appointment>,
}
