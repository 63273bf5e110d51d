//! In-memory tables with JSON persistence.
//!
//! Every write goes through [`Store::transaction`]: the closure works on a
//! staged copy of the tables, which replaces the live copy (and is flushed
//! to disk) only if the closure succeeds.

use crate::models::{
    Account, AccountId, CareLink, DoctorProfile, EmergencyContact, EmergencyContactId,
    PatientProfile,
};
use crate::utils::password_utils::generate_token;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeSet, HashMap},
    fs::File,
    io::{self, ErrorKind::NotFound},
    path::PathBuf,
};
use thiserror::Error;
use tokio::fs;
use tokio::sync::{RwLock, RwLockReadGuard};

#[derive(Serialize, Deserialize, Default, Clone)]
pub struct Database {
    accounts: HashMap<AccountId, Account>,
    doctors: HashMap<AccountId, DoctorProfile>,
    patients: HashMap<AccountId, PatientProfile>,
    emergency_contacts: HashMap<EmergencyContactId, EmergencyContact>,
    care_links: BTreeSet<CareLink>,
    tokens: HashMap<String, AccountId>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid account ID: {0}")]
    InvalidAccountId(AccountId),
    #[error("Storage I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl Database {
    pub fn get_account(&self, id: AccountId) -> Result<&Account, StoreError> {
        self.accounts.get(&id).ok_or(StoreError::InvalidAccountId(id))
    }

    pub fn lookup_username(&self, name: &str) -> Option<&Account> {
        self.accounts
            .values()
            .find(|account| account.username.as_ref() == name)
    }

    pub fn lookup_email(&self, email: &str) -> Option<&Account> {
        self.accounts
            .values()
            .find(|account| account.email.as_str() == email)
    }

    pub fn store_account(&mut self, account: Account) {
        self.accounts.insert(account.id, account);
    }

    pub fn doctor(&self, id: AccountId) -> Option<&DoctorProfile> {
        self.doctors.get(&id)
    }

    pub fn store_doctor(&mut self, owner: AccountId, profile: DoctorProfile) {
        self.doctors.insert(owner, profile);
    }

    pub fn patient(&self, id: AccountId) -> Option<&PatientProfile> {
        self.patients.get(&id)
    }

    pub fn patient_mut(&mut self, id: AccountId) -> Option<&mut PatientProfile> {
        self.patients.get_mut(&id)
    }

    pub fn store_patient(&mut self, owner: AccountId, profile: PatientProfile) {
        self.patients.insert(owner, profile);
    }

    /// Every patient profile with its owner, in no particular order
    pub fn list_patients(&self) -> impl Iterator<Item = (AccountId, &PatientProfile)> + '_ {
        self.patients.iter().map(|(id, profile)| (*id, profile))
    }

    pub fn emergency_contact(&self, id: EmergencyContactId) -> Option<&EmergencyContact> {
        self.emergency_contacts.get(&id)
    }

    pub fn emergency_contact_mut(&mut self, id: EmergencyContactId) -> Option<&mut EmergencyContact> {
        self.emergency_contacts.get_mut(&id)
    }

    pub fn store_emergency_contact(&mut self, contact: EmergencyContact) {
        self.emergency_contacts.insert(contact.id, contact);
    }

    /// Adds the edge; both sides of the relation see it at once.
    /// Returns false if it already existed.
    pub fn link(&mut self, doctor: AccountId, patient: AccountId) -> bool {
        self.care_links.insert(CareLink { doctor, patient })
    }

    pub fn doctors_of(&self, patient: AccountId) -> impl Iterator<Item = AccountId> + '_ {
        self.care_links
            .iter()
            .filter(move |link| link.patient == patient)
            .map(|link| link.doctor)
    }

    pub fn patients_of(&self, doctor: AccountId) -> impl Iterator<Item = AccountId> + '_ {
        self.care_links
            .iter()
            .filter(move |link| link.doctor == doctor)
            .map(|link| link.patient)
    }

    pub fn account_for_token(&self, token: &str) -> Option<&Account> {
        let id = self.tokens.get(token)?;
        self.accounts.get(id)
    }

    pub fn token_of(&self, account: AccountId) -> Option<&str> {
        self.tokens
            .iter()
            .find(|(_, owner)| **owner == account)
            .map(|(token, _)| token.as_str())
    }

    /// Returns the account's token, minting one if it has none
    pub fn issue_token(&mut self, account: AccountId) -> String {
        if let Some(token) = self.token_of(account) {
            return token.to_string();
        }
        let token = generate_token();
        self.tokens.insert(token.clone(), account);
        token
    }

    pub fn revoke_token(&mut self, token: &str) -> Option<AccountId> {
        self.tokens.remove(token)
    }
}

/// Shared handle on the tables
pub struct Store {
    path: Option<PathBuf>,
    db: RwLock<Database>,
}

impl Store {
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        match File::open(&path) {
            Ok(f) => {
                let db: Database = serde_json::from_reader(f)?;
                info!("Loaded {} accounts from {}", db.accounts.len(), path.display());
                Ok(Self {
                    path: Some(path),
                    db: RwLock::new(db),
                })
            }

            // Missing file, start from an empty database
            Err(not_found) if not_found.kind() == NotFound => {
                info!("DB file not found, creating new empty DB");
                let store = Self {
                    path: Some(path),
                    db: RwLock::new(Database::default()),
                };

                // Fail at startup rather than on the first write
                store.flush(&Database::default()).await?;
                Ok(store)
            }

            Err(other) => Err(other.into()),
        }
    }

    /// A store that never touches the disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            db: RwLock::new(Database::default()),
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Database> {
        self.db.read().await
    }

    /// Runs `f` against a staged copy of the tables and commits it on success.
    /// On error nothing is written.
    pub async fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Database) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut live = self.db.write().await;
        let mut staged = live.clone();

        let output = f(&mut staged)?;

        self.flush(&staged).await?;
        *live = staged;
        Ok(output)
    }

    /// Called with the write lock held, so flushes land in commit order
    async fn flush(&self, db: &Database) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let encoded = serde_json::to_vec_pretty(db)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write aside then rename, so a crash never leaves half a file
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, encoded).await?;
        fs::rename(&staging, path).await?;
        Ok(())
    }
}
