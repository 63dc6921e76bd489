use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Frequency;

/// Identifier of the authenticated user who owns a medication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Wrap a raw identifier. Returns `None` for blank input.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One scheduled time of day for taking a medication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub time_of_day: NaiveTime,
    pub taken: bool,
}

impl TimeSlot {
    pub fn pending(time_of_day: NaiveTime) -> Self {
        Self {
            time_of_day,
            taken: false,
        }
    }

    /// Pending → Taken. Returns `true` only on an actual transition;
    /// `Taken` is terminal.
    pub fn mark_taken(&mut self) -> bool {
        let changed = !self.taken;
        self.taken = true;
        changed
    }
}

/// Reminder toggles. Stored with the medication; nothing acts on them here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    pub enabled: bool,
    pub notification: bool,
    pub alarm: bool,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            notification: true,
            alarm: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub name: String,
    pub dosage: String,
    pub frequency: Frequency,
    pub schedule: Vec<TimeSlot>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub instructions: Option<String>,
    pub reminders: ReminderSettings,
    pub created_at: DateTime<Utc>,
}

impl Medication {
    /// Resolve a caller-supplied slot index. Negative and past-the-end
    /// indices yield `None`.
    pub fn slot_position(&self, slot_index: i64) -> Option<usize> {
        usize::try_from(slot_index)
            .ok()
            .filter(|&pos| pos < self.schedule.len())
    }
}
