//! Shared types for the REST layer: request context and the JSON
//! projection of a medication.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::IdentityProvider;
use crate::models::enums::Frequency;
use crate::models::{Medication, OwnerId, ReminderSettings, TimeSlot};
use crate::schedule::ScheduleStore;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<ScheduleStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl ApiContext {
    pub fn new(store: ScheduleStore, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            store: Arc::new(store),
            identity,
        }
    }
}

/// Authenticated caller, injected into request extensions by the auth
/// middleware.
#[derive(Debug, Clone)]
pub struct OwnerContext {
    pub owner_id: OwnerId,
}

// ═══════════════════════════════════════════════════════════
// Wire types
// ═══════════════════════════════════════════════════════════

/// Body of `PATCH /medications/:id/taken`.
///
/// `timeIndex` is kept raw: a missing or non-integer value is not a 400,
/// it reaches the store as "no index" and is ignored there.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TakeSlotRequest {
    #[serde(default)]
    pub time_index: Option<serde_json::Value>,
}

impl TakeSlotRequest {
    /// Integral numbers (including `1.0`) map to an index; anything else is `None`.
    pub fn slot_index(&self) -> Option<i64> {
        let serde_json::Value::Number(number) = self.time_index.as_ref()? else {
            return None;
        };
        number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotView {
    pub time: String,
    pub taken: bool,
}

impl From<&TimeSlot> for SlotView {
    fn from(slot: &TimeSlot) -> Self {
        Self {
            time: format_time_of_day(slot.time_of_day),
            taken: slot.taken,
        }
    }
}

/// External JSON shape of a medication. The owner id stays server-side.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationView {
    pub id: Uuid,
    pub name: String,
    pub dosage: String,
    pub frequency: Frequency,
    pub times: Vec<SlotView>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub instructions: Option<String>,
    pub reminders: ReminderSettings,
    pub created_at: DateTime<Utc>,
}

impl From<&Medication> for MedicationView {
    fn from(med: &Medication) -> Self {
        Self {
            id: med.id,
            name: med.name.clone(),
            dosage: med.dosage.clone(),
            frequency: med.frequency,
            times: med.schedule.iter().map(SlotView::from).collect(),
            start_date: med.start_date,
            end_date: med.end_date,
            instructions: med.instructions.clone(),
            reminders: med.reminders,
            created_at: med.created_at,
        }
    }
}

impl From<Medication> for MedicationView {
    fn from(med: Medication) -> Self {
        Self::from(&med)
    }
}

/// `HH:MM`, or `HH:MM:SS` when seconds are set.
fn format_time_of_day(time: NaiveTime) -> String {
    if time.second() == 0 {
        time.format("%H:%M").to_string()
    } else {
        time.format("%H:%M:%S").to_string()
    }
}
