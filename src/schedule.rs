//! Medication schedule store.
//!
//! Owns the four operations on medications: create, list by owner,
//! mark one slot taken, delete. Every operation takes the caller's
//! `OwnerId` explicitly; a medication owned by someone else behaves
//! exactly like one that does not exist.
//!
//! Each call opens its own SQLite connection. `mark_slot_taken` reads
//! and writes inside a single `IMMEDIATE` transaction, and slots live in
//! their own rows, so concurrent marks on one medication never clobber
//! each other.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveTime, SubsecRound, Utc};
use rusqlite::{Connection, TransactionBehavior};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::enums::Frequency;
use crate::models::{Medication, OwnerId, ReminderSettings, TimeSlot};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Medication not found")]
    NotFound,

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Unvalidated creation input, as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMedication {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub frequency: String,
    #[serde(default)]
    pub times: Vec<String>,
    #[serde(default)]
    pub start_date: String,
    pub end_date: Option<String>,
    pub instructions: Option<String>,
    pub reminders: Option<ReminderSettings>,
}

impl NewMedication {
    /// Validate the raw fields and build a fresh entity for `owner`.
    pub fn into_medication(self, owner: &OwnerId) -> Result<Medication, StoreError> {
        let name = required_text("name", &self.name)?;
        let dosage = required_text("dosage", &self.dosage)?;
        let frequency: Frequency = self.frequency.trim().parse().map_err(|_| {
            StoreError::Validation(format!(
                "frequency must be one of once, twice, thrice, weekly, as_needed (got {:?})",
                self.frequency
            ))
        })?;

        if self.times.is_empty() {
            return Err(StoreError::Validation("times must contain at least one entry".into()));
        }
        let schedule = self
            .times
            .iter()
            .map(|raw| parse_time_of_day(raw).map(TimeSlot::pending))
            .collect::<Result<Vec<_>, _>>()?;

        if self.start_date.trim().is_empty() {
            return Err(StoreError::Validation("startDate is required".into()));
        }
        let start_date = parse_date("startDate", &self.start_date)?;
        let end_date = match self.end_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_date("endDate", raw)?),
        };

        Ok(Medication {
            id: Uuid::new_v4(),
            owner_id: owner.clone(),
            name,
            dosage,
            frequency,
            schedule,
            start_date,
            end_date,
            instructions: self.instructions.filter(|s| !s.trim().is_empty()),
            reminders: self.reminders.unwrap_or_default(),
            // stored with microsecond precision
            created_at: Utc::now().trunc_subsecs(6),
        })
    }
}

fn required_text(field: &str, value: &str) -> Result<String, StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(StoreError::Validation(format!("{field} is required")))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Accepts `HH:MM` and `HH:MM:SS`.
fn parse_time_of_day(raw: &str) -> Result<NaiveTime, StoreError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| StoreError::Validation(format!("invalid time of day: {raw:?}")))
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (date part kept).
fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, StoreError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| StoreError::Validation(format!("{field} is not a valid date: {raw:?}")))
}

/// Durable medication store backed by a SQLite file.
#[derive(Debug, Clone)]
pub struct ScheduleStore {
    db_path: PathBuf,
}

impl ScheduleStore {
    /// Open (and migrate) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        db::open_database(&db_path)?;
        tracing::info!(path = %db_path.display(), "Medication store ready");
        Ok(Self { db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        db::open_database(&self.db_path).map_err(StoreError::from)
    }

    /// Validate `input` and persist a new medication for `owner`.
    pub fn create(&self, owner: &OwnerId, input: NewMedication) -> Result<Medication, StoreError> {
        let med = input.into_medication(owner)?;

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        db::insert_medication(&tx, &med)?;
        tx.commit()?;

        tracing::debug!(medication_id = %med.id, %owner, slots = med.schedule.len(), "Medication created");
        Ok(med)
    }

    /// All medications owned by `owner`, oldest first.
    pub fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<Medication>, StoreError> {
        let conn = self.connect()?;
        Ok(db::get_medications_by_owner(&conn, owner)?)
    }

    /// Mark one schedule slot as taken.
    ///
    /// Ownership is checked first. After that, a missing index or one
    /// outside the schedule is ignored and the medication comes back
    /// unchanged. Marking a slot that is already taken is a no-op.
    pub fn mark_slot_taken(
        &self,
        owner: &OwnerId,
        medication_id: &Uuid,
        slot_index: Option<i64>,
    ) -> Result<Medication, StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut med = db::get_owned_medication(&tx, owner, medication_id)?
            .ok_or(StoreError::NotFound)?;

        let Some(position) = slot_index.and_then(|index| med.slot_position(index)) else {
            tracing::debug!(%medication_id, ?slot_index, slots = med.schedule.len(), "Slot index out of range, ignoring");
            return Ok(med);
        };

        if med.schedule[position].mark_taken() && db::set_slot_taken(&tx, medication_id, position)? > 0 {
            tx.commit()?;
            tracing::debug!(%medication_id, position, "Slot marked taken");
        }
        Ok(med)
    }

    /// Permanently remove a medication and its schedule.
    pub fn delete(&self, owner: &OwnerId, medication_id: &Uuid) -> Result<(), StoreError> {
        let conn = self.connect()?;
        if !db::delete_owned_medication(&conn, owner, medication_id)? {
            return Err(StoreError::NotFound);
        }
        tracing::debug!(%medication_id, %owner, "Medication deleted");
        Ok(())
    }
}
