//! Doctor-patient links and roster listings

use log::info;
use serde::Serialize;

use super::profiles::{doctor_view, patient_view};
use super::{Service, ServiceError};
use crate::db::Database;
use crate::models::{Account, AccountId, DoctorView, PatientView};

#[derive(Debug, Serialize)]
pub struct LinkOutcome {
    pub message: String,
    pub doctor_id: AccountId,
    pub patient_id: AccountId,
}

/// Resolves a username to an account holding the profile checked by `has_profile`
fn counterpart<'a>(
    db: &'a Database,
    username: &str,
    has_profile: impl Fn(&Database, AccountId) -> bool,
    missing: &str,
) -> Result<&'a Account, ServiceError> {
    db.lookup_username(username.trim())
        .filter(|account| has_profile(db, account.id))
        .ok_or_else(|| ServiceError::NotFound(missing.into()))
}

impl Service {
    /// Called by a patient: adds the named doctor to their care team
    pub async fn link_doctor_to_patient(
        &self,
        patient: &Account,
        doctor_username: &str,
    ) -> Result<LinkOutcome, ServiceError> {
        self.store
            .transaction(|db| {
                let doctor = counterpart(
                    db,
                    doctor_username,
                    |db, id| db.doctor(id).is_some(),
                    "No doctor matches the given username.",
                )?
                .clone();
                link(db, &doctor, patient)
            })
            .await
    }

    /// Called by a doctor: adds the named patient to their roster
    pub async fn link_patient_to_doctor(
        &self,
        doctor: &Account,
        patient_username: &str,
    ) -> Result<LinkOutcome, ServiceError> {
        self.store
            .transaction(|db| {
                let patient = counterpart(
                    db,
                    patient_username,
                    |db, id| db.patient(id).is_some(),
                    "No patient matches the given username.",
                )?
                .clone();
                link(db, doctor, &patient)
            })
            .await
    }

    pub async fn list_my_doctors(&self, patient: &Account) -> Result<Vec<DoctorView>, ServiceError> {
        let db = self.store.read().await;
        db.doctors_of(patient.id)
            .map(|id| doctor_view(&db, db.get_account(id)?))
            .collect()
    }

    pub async fn list_my_patients(&self, doctor: &Account) -> Result<Vec<PatientView>, ServiceError> {
        let db = self.store.read().await;
        db.patients_of(doctor.id)
            .map(|id| patient_view(&db, db.get_account(id)?))
            .collect()
    }

    /// Every patient on file, whatever their links
    pub async fn list_all_patients(&self, _doctor: &Account) -> Result<Vec<PatientView>, ServiceError> {
        let db = self.store.read().await;
        db.list_patients()
            .map(|(id, _)| patient_view(&db, db.get_account(id)?))
            .collect()
    }
}

fn link(db: &mut Database, doctor: &Account, patient: &Account) -> Result<LinkOutcome, ServiceError> {
    if !db.link(doctor.id, patient.id) {
        info!("{} and {} were already linked", doctor.username, patient.username);
    }

    Ok(LinkOutcome {
        message: format!(
            "Doctor '{}' added to patient '{}' successfully.",
            doctor.username, patient.username
        ),
        doctor_id: doctor.id,
        patient_id: patient.id,
    })
}
