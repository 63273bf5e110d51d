//! Own-profile reads and allow-listed field updates.
//!
//! Each role has a fixed table mapping a field name to a typed setter. A
//! submitted name absent from the table is ignored; a present one is
//! parsed and validated before anything is written.

use chrono::NaiveDate;
use log::info;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use strum::IntoEnumIterator;

use super::{Service, ServiceError};
use crate::db::Database;
use crate::models::{
    Account, BloodType, Checkup, DoctorProfile, DoctorView, EmergencyContact,
    EmergencyContactId, GeneralHealth, PatientProfile, PatientView, Role, RoleProfile,
};
use crate::utils::validation::{
    TextInput, MAX_CONTENT_LENGTH, MAX_GENDER_LENGTH, MAX_HOSPITAL_LENGTH, MAX_NAME_LENGTH,
    MAX_PHONE_LENGTH,
};

type Setter<P> = fn(&mut Account, &mut P, &Value) -> Result<(), String>;

/// One allow-listed field and how to write it
pub struct FieldSetter<P> {
    pub name: &'static str,
    apply: Setter<P>,
}

macro_rules! account_field {
    ($name:literal, $field:ident, $parse:expr) => {
        FieldSetter {
            name: $name,
            apply: |account, _, value| {
                account.$field = $parse(value)?;
                Ok(())
            },
        }
    };
}

macro_rules! profile_field {
    ($name:literal, $field:ident, $parse:expr) => {
        FieldSetter {
            name: $name,
            apply: |_, profile, value| {
                profile.$field = $parse(value)?;
                Ok(())
            },
        }
    };
}

pub static DOCTOR_FIELDS: &[FieldSetter<DoctorProfile>] = &[
    account_field!("first_name", first_name, |v| text(v, MAX_NAME_LENGTH)),
    account_field!("last_name", last_name, |v| text(v, MAX_NAME_LENGTH)),
    account_field!("birth_date", birth_date, date),
    account_field!("gender", gender, |v| text(v, MAX_GENDER_LENGTH)),
    profile_field!("speciality", speciality, |v| text(v, MAX_NAME_LENGTH)),
    profile_field!("background", background, long_text),
    profile_field!("start_date", start_date, date),
    profile_field!("hospital", hospital, |v| text(v, MAX_HOSPITAL_LENGTH)),
];

pub static PATIENT_FIELDS: &[FieldSetter<PatientProfile>] = &[
    account_field!("first_name", first_name, |v| text(v, MAX_NAME_LENGTH)),
    account_field!("last_name", last_name, |v| text(v, MAX_NAME_LENGTH)),
    account_field!("birth_date", birth_date, date),
    account_field!("gender", gender, |v| text(v, MAX_GENDER_LENGTH)),
    profile_field!("height", height, positive_int),
    profile_field!("weight", weight, positive_int),
    profile_field!("blood_type", blood_type, category::<BloodType>),
    profile_field!("allergies", allergies, long_text),
    profile_field!("medications", medications, long_text),
    profile_field!("emergency_contact", emergency_contact, contact_id),
    profile_field!("general_health", general_health, category::<GeneralHealth>),
    profile_field!("checkup", checkup, category::<Checkup>),
    profile_field!("exercise", exercise, flag),
    profile_field!("heart_disease", heart_disease, flag),
    profile_field!("skin_cancer", skin_cancer, flag),
    profile_field!("other_cancer", other_cancer, flag),
    profile_field!("depression", depression, flag),
    profile_field!("diabetes", diabetes, flag),
    profile_field!("arthritis", arthritis, flag),
    profile_field!("sex", sex, |v| text(v, MAX_GENDER_LENGTH)),
    profile_field!("age", age, age),
    profile_field!("bmi", bmi, bmi),
    profile_field!("smoking_history", smoking_history, flag),
    profile_field!("alcohol_consumption", alcohol_consumption, amount),
    profile_field!("fruit_consumption", fruit_consumption, amount),
    profile_field!("green_vegetable_consumption", green_vegetable_consumption, amount),
    profile_field!("fried_potato_consumption", fried_potato_consumption, amount),
];

/// Null or blank clears the field
fn text(value: &Value, max_length: usize) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => TextInput::with_max_length(s, max_length)
            .map(|t| Some(t.into_inner()))
            .map_err(|e| format!("{e:#}")),
        _ => Err("Not a valid string.".into()),
    }
}

fn long_text(value: &Value) -> Result<Option<String>, String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => TextInput::new_long_form(s)
            .map(|t| Some(t.into_inner()))
            .map_err(|e| format!("{e:#}")),
        other => text(other, MAX_CONTENT_LENGTH),
    }
}

fn date(value: &Value) -> Result<Option<NaiveDate>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| "Date has wrong format. Use YYYY-MM-DD.".into()),
        _ => Err("Date has wrong format. Use YYYY-MM-DD.".into()),
    }
}

fn positive_int(value: &Value) -> Result<Option<i32>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .filter(|n| *n > 0)
            .and_then(|n| i32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| "Ensure this value is a positive integer.".into()),
        _ => Err("A valid integer is required.".into()),
    }
}

fn age(value: &Value) -> Result<Option<u32>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .filter(|n| *n <= 130)
            .map(|n| Some(n as u32))
            .ok_or_else(|| "Ensure this value is an age between 0 and 130.".into()),
        _ => Err("A valid integer is required.".into()),
    }
}

fn bmi(value: &Value) -> Result<Option<f64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .filter(|bmi| *bmi > 0.0 && *bmi < 200.0)
            .map(Some)
            .ok_or_else(|| "Ensure this value is a plausible BMI.".into()),
        _ => Err("A valid number is required.".into()),
    }
}

/// Consumption scores: any non-negative number
fn amount(value: &Value) -> Result<Option<f64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .filter(|amount| amount.is_finite() && *amount >= 0.0)
            .map(Some)
            .ok_or_else(|| "Ensure this value is greater than or equal to 0.".into()),
        _ => Err("A valid number is required.".into()),
    }
}

fn flag(value: &Value) -> Result<bool, String> {
    value
        .as_bool()
        .ok_or_else(|| "Must be a valid boolean.".into())
}

fn category<T>(value: &Value) -> Result<Option<T>, String>
where
    T: DeserializeOwned + IntoEnumIterator + std::fmt::Display,
{
    if value.is_null() {
        return Ok(None);
    }
    T::deserialize(value).map(Some).map_err(|_| {
        let choices: Vec<String> = T::iter().map(|c| format!("\"{c}\"")).collect();
        format!("{value} is not a valid choice. Expected one of {}.", choices.join(", "))
    })
}

fn contact_id(value: &Value) -> Result<Option<EmergencyContactId>, String> {
    if value.is_null() {
        return Ok(None);
    }
    EmergencyContactId::deserialize(value)
        .map(Some)
        .map_err(|_| "Invalid emergency contact id.".into())
}

/// Applies every allow-listed field present in `fields`, in table order
fn apply_fields<P>(
    table: &[FieldSetter<P>],
    account: &mut Account,
    profile: &mut P,
    fields: &Map<String, Value>,
) -> Result<(), ServiceError> {
    for setter in table {
        if let Some(value) = fields.get(setter.name) {
            (setter.apply)(account, profile, value)
                .map_err(|e| ServiceError::Validation(format!("{}: {e}", setter.name)))?;
        }
    }
    Ok(())
}

pub(crate) fn doctor_view(db: &Database, account: &Account) -> Result<DoctorView, ServiceError> {
    let profile = db
        .doctor(account.id)
        .ok_or_else(|| ServiceError::NotFound("Doctor profile not found.".into()))?;

    Ok(DoctorView {
        user: account.view(),
        profile: profile.clone(),
        patients: db.patients_of(account.id).collect(),
    })
}

pub(crate) fn patient_view(db: &Database, account: &Account) -> Result<PatientView, ServiceError> {
    let profile = db
        .patient(account.id)
        .ok_or_else(|| ServiceError::NotFound("Patient profile not found.".into()))?;

    Ok(PatientView {
        user: account.view(),
        profile: profile.clone(),
        emergency_contact_details: profile
            .emergency_contact
            .and_then(|id| db.emergency_contact(id))
            .cloned(),
        doctors: db.doctors_of(account.id).collect(),
    })
}

/// Fields of a new emergency contact, or a partial update of one
#[derive(Debug, Default, Deserialize)]
pub struct ContactForm {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub relationship: Option<String>,
}

fn contact_name(value: &str, field: &str) -> Result<String, ServiceError> {
    TextInput::with_max_length(value, MAX_NAME_LENGTH)
        .map(TextInput::into_inner)
        .map_err(|e| ServiceError::Validation(format!("{field}: {e:#}")))
}

fn phone_number(value: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    let digits = trimmed.chars().filter(char::is_ascii_digit).count();
    let allowed = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' '));

    if !allowed || digits < 4 || trimmed.len() > MAX_PHONE_LENGTH {
        return Err(ServiceError::Validation(
            "phone_number: Enter a valid phone number.".into(),
        ));
    }
    Ok(trimmed.to_string())
}

impl Service {
    /// The caller's own role profile
    pub async fn my_profile(&self, account: &Account) -> Result<RoleProfile, ServiceError> {
        let db = self.store.read().await;
        match account.role() {
            Some(Role::Doctor) => doctor_view(&db, account).map(RoleProfile::Doctor),
            Some(Role::Patient) => patient_view(&db, account).map(RoleProfile::Patient),
            None => Err(ServiceError::NotFound("No profile for this account.".into())),
        }
    }

    pub async fn doctor_profile(&self, account: &Account) -> Result<DoctorView, ServiceError> {
        doctor_view(&*self.store.read().await, account)
    }

    pub async fn patient_profile(&self, account: &Account) -> Result<PatientView, ServiceError> {
        patient_view(&*self.store.read().await, account)
    }

    pub async fn update_doctor(
        &self,
        account: &Account,
        fields: &Map<String, Value>,
    ) -> Result<DoctorView, ServiceError> {
        let view = self
            .store
            .transaction(|db| {
                let mut stored = db.get_account(account.id)?.clone();
                let mut profile = db
                    .doctor(account.id)
                    .cloned()
                    .ok_or_else(|| ServiceError::NotFound("Doctor profile not found.".into()))?;

                apply_fields(DOCTOR_FIELDS, &mut stored, &mut profile, fields)?;

                db.store_doctor(stored.id, profile);
                let view = doctor_view(db, &stored)?;
                db.store_account(stored);
                Ok::<_, ServiceError>(view)
            })
            .await?;

        info!("Doctor {} updated their profile", view.user.username);
        Ok(view)
    }

    pub async fn update_patient(
        &self,
        account: &Account,
        fields: &Map<String, Value>,
    ) -> Result<PatientView, ServiceError> {
        let view = self
            .store
            .transaction(|db| {
                let mut stored = db.get_account(account.id)?.clone();
                let mut profile = db
                    .patient(account.id)
                    .cloned()
                    .ok_or_else(|| ServiceError::NotFound("Patient profile not found.".into()))?;

                apply_fields(PATIENT_FIELDS, &mut stored, &mut profile, fields)?;

                if let Some(id) = profile.emergency_contact {
                    if db.emergency_contact(id).is_none() {
                        return Err(ServiceError::NotFound(format!(
                            "Emergency contact {id} not found."
                        )));
                    }
                }

                db.store_patient(stored.id, profile);
                let view = patient_view(db, &stored)?;
                db.store_account(stored);
                Ok::<_, ServiceError>(view)
            })
            .await?;

        info!("Patient {} updated their profile", view.user.username);
        Ok(view)
    }

    /// Creates an emergency contact and links it to the caller's profile
    pub async fn create_emergency_contact(
        &self,
        account: &Account,
        form: ContactForm,
    ) -> Result<EmergencyContact, ServiceError> {
        let contact = EmergencyContact {
            id: EmergencyContactId::new(),
            name: contact_name(&form.name.ok_or_else(|| ServiceError::required("name"))?, "name")?,
            phone_number: phone_number(
                &form
                    .phone_number
                    .ok_or_else(|| ServiceError::required("phone_number"))?,
            )?,
            relationship: contact_name(
                &form
                    .relationship
                    .ok_or_else(|| ServiceError::required("relationship"))?,
                "relationship",
            )?,
        };

        self.store
            .transaction(|db| {
                let profile = db
                    .patient_mut(account.id)
                    .ok_or_else(|| ServiceError::NotFound("Patient profile not found.".into()))?;
                profile.emergency_contact = Some(contact.id);
                db.store_emergency_contact(contact.clone());
                Ok::<_, ServiceError>(())
            })
            .await?;

        Ok(contact)
    }

    /// Edits the contact linked to the caller's profile
    pub async fn update_emergency_contact(
        &self,
        account: &Account,
        form: ContactForm,
    ) -> Result<EmergencyContact, ServiceError> {
        let name = form.name.as_deref().map(|n| contact_name(n, "name")).transpose()?;
        let phone = form.phone_number.as_deref().map(phone_number).transpose()?;
        let relationship = form
            .relationship
            .as_deref()
            .map(|r| contact_name(r, "relationship"))
            .transpose()?;

        self.store
            .transaction(|db| {
                let id = db
                    .patient(account.id)
                    .and_then(|p| p.emergency_contact)
                    .ok_or_else(|| ServiceError::NotFound("No emergency contact on file.".into()))?;
                let contact = db
                    .emergency_contact_mut(id)
                    .ok_or_else(|| ServiceError::NotFound("No emergency contact on file.".into()))?;

                if let Some(name) = name {
                    contact.name = name;
                }
                if let Some(phone) = phone {
                    contact.phone_number = phone;
                }
                if let Some(relationship) = relationship {
                    contact.relationship = relationship;
                }
                Ok::<_, ServiceError>(contact.clone())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fields must be an object"),
        }
    }

    #[tokio::test]
    async fn test_my_profile_matches_role() {
        let service = testing::service().await;
        let doctor = testing::register(&service, Role::Doctor, "dr_house").await;
        let patient = testing::register(&service, Role::Patient, "ana_pop").await;

        let doctor_account = testing::account(&service, &doctor).await;
        let patient_account = testing::account(&service, &patient).await;

        assert!(matches!(
            service.my_profile(&doctor_account).await.unwrap(),
            RoleProfile::Doctor(_)
        ));
        assert!(matches!(
            service.my_profile(&patient_account).await.unwrap(),
            RoleProfile::Patient(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_profile_row_is_not_found() {
        let service = testing::service().await;
        let doctor = testing::register(&service, Role::Doctor, "dr_house").await;
        let mut account = testing::account(&service, &doctor).await;

        // Flag flipped by hand: no patient row exists behind it
        account.is_doctor = false;
        account.is_patient = true;
        assert!(matches!(
            service.my_profile(&account).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_changes_exactly_one_field() {
        let service = testing::service().await;
        let patient = testing::register(&service, Role::Patient, "ana_pop").await;
        let account = testing::account(&service, &patient).await;

        service
            .update_patient(&account, &fields(json!({"height": 170, "allergies": "Pollen"})))
            .await
            .unwrap();
        let before = service.patient_profile(&account).await.unwrap();

        let after = service
            .update_patient(&account, &fields(json!({"weight": 64})))
            .await
            .unwrap();

        assert_eq!(after.profile.weight, Some(64));
        let mut expected = before.clone();
        expected.profile.weight = Some(64);
        assert_eq!(after, expected, "Only the weight may change");
    }

    #[tokio::test]
    async fn test_update_routes_common_fields_to_account() {
        let service = testing::service().await;
        let doctor = testing::register(&service, Role::Doctor, "dr_house").await;
        let account = testing::account(&service, &doctor).await;

        let view = service
            .update_doctor(
                &account,
                &fields(json!({
                    "first_name": "Gregory",
                    "birth_date": "1959-06-11",
                    "speciality": "Diagnostics",
                    "hospital": "Princeton-Plainsboro"
                })),
            )
            .await
            .unwrap();

        assert_eq!(view.user.first_name.as_deref(), Some("Gregory"));
        assert_eq!(view.user.birth_date, NaiveDate::from_ymd_opt(1959, 6, 11));
        assert_eq!(view.profile.speciality.as_deref(), Some("Diagnostics"));

        let stored = testing::account(&service, &doctor).await;
        assert_eq!(stored.first_name.as_deref(), Some("Gregory"));
    }

    #[tokio::test]
    async fn test_unknown_fields_are_a_noop() {
        let service = testing::service().await;
        let doctor = testing::register(&service, Role::Doctor, "dr_house").await;
        let account = testing::account(&service, &doctor).await;
        let before = service.doctor_profile(&account).await.unwrap();

        let after = service
            .update_doctor(
                &account,
                &fields(json!({"is_patient": true, "password": "x", "patients": [], "height": 3})),
            )
            .await
            .unwrap();

        assert_eq!(before, after);
        assert!(!testing::account(&service, &doctor).await.is_patient);
    }

    #[tokio::test]
    async fn test_invalid_value_writes_nothing() {
        let service = testing::service().await;
        let patient = testing::register(&service, Role::Patient, "ana_pop").await;
        let account = testing::account(&service, &patient).await;

        let cases = vec![
            json!({"height": -3}),
            json!({"weight": 0}),
            json!({"height": "tall"}),
            json!({"blood_type": "C+"}),
            json!({"checkup": "yesterday"}),
            json!({"birth_date": "11/06/1959"}),
            json!({"exercise": "yes"}),
            json!({"alcohol_consumption": -1.0}),
            json!({"first_name": "<b>Ana</b>"}),
        ];

        for case in cases {
            // Paired with a valid field that must not be written either
            let mut update = fields(case.clone());
            update.entry("last_name").or_insert(json!("Pop"));

            let result = service.update_patient(&account, &update).await;
            assert!(
                matches!(result, Err(ServiceError::Validation(_))),
                "Invalid update {case} was accepted"
            );
            let stored = testing::account(&service, &patient).await;
            assert_eq!(stored.last_name, None, "Rejected update {case} left a partial write");
        }
    }

    #[tokio::test]
    async fn test_clinical_fields_round_into_profile() {
        let service = testing::service().await;
        let patient = testing::register(&service, Role::Patient, "ana_pop").await;
        let account = testing::account(&service, &patient).await;

        let view = service
            .update_patient(
                &account,
                &fields(json!({
                    "general_health": "Very Good",
                    "checkup": "within past 2 years",
                    "exercise": true,
                    "age": 47,
                    "bmi": 23.4,
                    "blood_type": "O-",
                    "sex": "Female"
                })),
            )
            .await
            .unwrap();

        assert_eq!(view.profile.general_health, Some(GeneralHealth::VeryGood));
        assert_eq!(view.profile.checkup, Some(Checkup::WithinPast2Years));
        assert_eq!(view.profile.blood_type, Some(BloodType::ONegative));
        assert!(view.profile.exercise);
        assert_eq!(view.profile.age, Some(47));
    }

    #[tokio::test]
    async fn test_emergency_contact_lifecycle() {
        let service = testing::service().await;
        let patient = testing::register(&service, Role::Patient, "ana_pop").await;
        let account = testing::account(&service, &patient).await;

        assert!(matches!(
            service.update_emergency_contact(&account, ContactForm::default()).await,
            Err(ServiceError::NotFound(_))
        ));

        let contact = service
            .create_emergency_contact(
                &account,
                ContactForm {
                    name: Some("Ion Pop".into()),
                    phone_number: Some("+40 721 000 111".into()),
                    relationship: Some("Brother".into()),
                },
            )
            .await
            .unwrap();

        let updated = service
            .update_emergency_contact(
                &account,
                ContactForm {
                    relationship: Some("Spouse".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.id, contact.id);
        assert_eq!(updated.name, "Ion Pop");
        assert_eq!(updated.relationship, "Spouse");

        let view = service.patient_profile(&account).await.unwrap();
        assert_eq!(view.profile.emergency_contact, Some(contact.id));
        assert_eq!(view.emergency_contact_details, Some(updated));
    }

    #[tokio::test]
    async fn test_emergency_contact_field_must_exist() {
        let service = testing::service().await;
        let patient = testing::register(&service, Role::Patient, "ana_pop").await;
        let account = testing::account(&service, &patient).await;

        let result = service
            .update_patient(
                &account,
                &fields(json!({"emergency_contact": EmergencyContactId::new()})),
            )
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn test_phone_number_validation() {
        assert!(phone_number("+40 (721) 000-111").is_ok());
        assert!(phone_number("call me").is_err());
        assert!(phone_number("12").is_err());
        assert!(phone_number("+40 721 000 111 222 333").is_err());
    }
}
