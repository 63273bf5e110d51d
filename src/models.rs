//! Data model: accounts, role profiles, emergency contacts and their public views

use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;
use uuid::Uuid;

use crate::utils::password_utils::PWHash;
use crate::utils::validation::{EmailInput, Username};

/// Role of an account. An account holds at most one.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    Patient,
}

/// Unique account identifier. Role profiles are keyed by the same value.
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, Display,
)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique emergency contact identifier
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, Display,
)]
#[serde(transparent)]
pub struct EmergencyContactId(Uuid);

impl EmergencyContactId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EmergencyContactId {
    fn default() -> Self {
        Self::new()
    }
}

/// Base identity of a person using the portal.
///
/// `is_doctor` and `is_patient` are only ever set by the registration
/// transaction, which sets exactly one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: Username,
    pub email: EmailInput,
    pub password: PWHash,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub is_doctor: bool,
    pub is_patient: bool,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub date_joined: DateTime<Utc>,
}

impl Account {
    pub fn new(username: Username, email: EmailInput, password: PWHash) -> Self {
        Self {
            id: AccountId::new(),
            username,
            email,
            password,
            first_name: None,
            last_name: None,
            is_active: true,
            is_doctor: false,
            is_patient: false,
            birth_date: None,
            gender: None,
            date_joined: Utc::now(),
        }
    }

    /// The role the flags designate, if any
    pub fn role(&self) -> Option<Role> {
        match (self.is_doctor, self.is_patient) {
            (true, false) => Some(Role::Doctor),
            (false, true) => Some(Role::Patient),
            _ => None,
        }
    }

    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id,
            username: self.username.to_string(),
            email: self.email.to_string(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            birth_date: self.birth_date,
            gender: self.gender.clone(),
            is_doctor: self.is_doctor,
            is_patient: self.is_patient,
        }
    }
}

/// ABO group with rhesus factor
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
pub enum BloodType {
    #[serde(rename = "A+")]
    #[display("A+")]
    APositive,
    #[serde(rename = "A-")]
    #[display("A-")]
    ANegative,
    #[serde(rename = "B+")]
    #[display("B+")]
    BPositive,
    #[serde(rename = "B-")]
    #[display("B-")]
    BNegative,
    #[serde(rename = "AB+")]
    #[display("AB+")]
    ABPositive,
    #[serde(rename = "AB-")]
    #[display("AB-")]
    ABNegative,
    #[serde(rename = "O+")]
    #[display("O+")]
    OPositive,
    #[serde(rename = "O-")]
    #[display("O-")]
    ONegative,
}

/// Self-assessed general health
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
pub enum GeneralHealth {
    Poor,
    Fair,
    Good,
    #[serde(rename = "Very Good")]
    #[display("Very Good")]
    VeryGood,
    Excellent,
}

/// Time since the last routine checkup
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
pub enum Checkup {
    #[serde(rename = "Within the past year", alias = "within past year")]
    #[display("Within the past year")]
    WithinPastYear,
    #[serde(rename = "Within the past 2 years", alias = "within past 2 years")]
    #[display("Within the past 2 years")]
    WithinPast2Years,
    #[serde(rename = "Within the past 5 years", alias = "within past 5 years")]
    #[display("Within the past 5 years")]
    WithinPast5Years,
    #[serde(rename = "5 or more years ago", alias = "5+ years ago")]
    #[display("5 or more years ago")]
    FiveOrMoreYearsAgo,
    #[serde(alias = "never")]
    Never,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub speciality: Option<String>,
    pub background: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub hospital: Option<String>,
}

/// Patient record, including the lifestyle and history answers the risk
/// score is computed from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub emergency_contact: Option<EmergencyContactId>,
    pub height: Option<i32>,
    pub weight: Option<i32>,
    pub blood_type: Option<BloodType>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    pub general_health: Option<GeneralHealth>,
    pub checkup: Option<Checkup>,
    pub exercise: bool,
    pub heart_disease: bool,
    pub skin_cancer: bool,
    pub other_cancer: bool,
    pub depression: bool,
    pub diabetes: bool,
    pub arthritis: bool,
    pub sex: Option<String>,
    pub age: Option<u32>,
    pub bmi: Option<f64>,
    pub smoking_history: bool,
    pub alcohol_consumption: Option<f64>,
    pub fruit_consumption: Option<f64>,
    pub green_vegetable_consumption: Option<f64>,
    pub fried_potato_consumption: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub id: EmergencyContactId,
    pub name: String,
    pub phone_number: String,
    pub relationship: String,
}

/// One edge of the doctor-patient association
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CareLink {
    pub doctor: AccountId,
    pub patient: AccountId,
}

/// Public part of an account, never carrying the password hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountView {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub is_doctor: bool,
    pub is_patient: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorView {
    pub user: AccountView,
    #[serde(flatten)]
    pub profile: DoctorProfile,
    pub patients: Vec<AccountId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientView {
    pub user: AccountView,
    #[serde(flatten)]
    pub profile: PatientProfile,
    pub emergency_contact_details: Option<EmergencyContact>,
    pub doctors: Vec<AccountId>,
}

/// A caller's own role profile
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RoleProfile {
    Doctor(DoctorView),
    Patient(PatientView),
}
