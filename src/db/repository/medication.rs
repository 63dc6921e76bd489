use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Insert a medication and all of its slots. Callers wrap this in a
/// transaction so the row and its schedule land together.
pub fn insert_medication(conn: &Connection, med: &Medication) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medications (id, owner_id, name, dosage, frequency, start_date, end_date,
         instructions, reminders_enabled, notification_enabled, alarm_enabled, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            med.id.to_string(),
            med.owner_id.as_str(),
            med.name,
            med.dosage,
            med.frequency.as_str(),
            med.start_date.format(DATE_FORMAT).to_string(),
            med.end_date.map(|d| d.format(DATE_FORMAT).to_string()),
            med.instructions,
            med.reminders.enabled as i32,
            med.reminders.notification as i32,
            med.reminders.alarm as i32,
            med.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        ],
    )?;

    let mut stmt = conn.prepare(
        "INSERT INTO medication_slots (medication_id, position, time_of_day, taken)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (position, slot) in med.schedule.iter().enumerate() {
        stmt.execute(params![
            med.id.to_string(),
            position as i64,
            slot.time_of_day.format(TIME_FORMAT).to_string(),
            slot.taken as i32,
        ])?;
    }
    Ok(())
}

/// Fetch a medication only if `owner` owns it. A foreign medication and a
/// missing one both come back as `None`.
pub fn get_owned_medication(
    conn: &Connection,
    owner: &OwnerId,
    id: &Uuid,
) -> Result<Option<Medication>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, owner_id, name, dosage, frequency, start_date, end_date, instructions,
             reminders_enabled, notification_enabled, alarm_enabled, created_at
             FROM medications WHERE id = ?1 AND owner_id = ?2",
            params![id.to_string(), owner.as_str()],
            medication_row_from_rusqlite,
        )
        .optional()?;

    let Some(row) = row else {
        return Ok(None);
    };
    let slots = get_slots(conn, id)?;
    medication_from_row(row, slots).map(Some)
}

/// All medications belonging to `owner`, in insertion order.
pub fn get_medications_by_owner(
    conn: &Connection,
    owner: &OwnerId,
) -> Result<Vec<Medication>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, name, dosage, frequency, start_date, end_date, instructions,
         reminders_enabled, notification_enabled, alarm_enabled, created_at
         FROM medications WHERE owner_id = ?1 ORDER BY rowid",
    )?;
    let rows = stmt
        .query_map(params![owner.as_str()], medication_row_from_rusqlite)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut slots = get_slots_by_owner(conn, owner)?;

    rows.into_iter()
        .map(|row| {
            let schedule = slots.remove(&row.id).unwrap_or_default();
            medication_from_row(row, schedule)
        })
        .collect()
}

/// Flip one slot to taken. Returns the number of rows that changed, which
/// is 0 when the slot was already taken.
pub fn set_slot_taken(
    conn: &Connection,
    medication_id: &Uuid,
    position: usize,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE medication_slots SET taken = 1
         WHERE medication_id = ?1 AND position = ?2 AND taken = 0",
        params![medication_id.to_string(), position as i64],
    )?;
    Ok(changed)
}

/// Delete a medication owned by `owner`. Slots go with it via cascade.
/// Returns `false` when nothing matched.
pub fn delete_owned_medication(
    conn: &Connection,
    owner: &OwnerId,
    id: &Uuid,
) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM medications WHERE id = ?1 AND owner_id = ?2",
        params![id.to_string(), owner.as_str()],
    )?;
    Ok(deleted > 0)
}

fn get_slots(conn: &Connection, medication_id: &Uuid) -> Result<Vec<TimeSlot>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT time_of_day, taken FROM medication_slots
         WHERE medication_id = ?1 ORDER BY position",
    )?;
    let rows = stmt.query_map(params![medication_id.to_string()], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i32>(1)?))
    })?;

    let mut slots = Vec::new();
    for row in rows {
        let (time, taken) = row?;
        slots.push(slot_from_parts(&time, taken)?);
    }
    Ok(slots)
}

fn get_slots_by_owner(
    conn: &Connection,
    owner: &OwnerId,
) -> Result<HashMap<String, Vec<TimeSlot>>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT s.medication_id, s.time_of_day, s.taken
         FROM medication_slots s JOIN medications m ON m.id = s.medication_id
         WHERE m.owner_id = ?1 ORDER BY s.medication_id, s.position",
    )?;
    let rows = stmt.query_map(params![owner.as_str()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i32>(2)?,
        ))
    })?;

    let mut grouped: HashMap<String, Vec<TimeSlot>> = HashMap::new();
    for row in rows {
        let (med_id, time, taken) = row?;
        grouped
            .entry(med_id)
            .or_default()
            .push(slot_from_parts(&time, taken)?);
    }
    Ok(grouped)
}

fn slot_from_parts(time: &str, taken: i32) -> Result<TimeSlot, DatabaseError> {
    let time_of_day = NaiveTime::parse_from_str(time, TIME_FORMAT)
        .map_err(|e| DatabaseError::CorruptRow(format!("bad slot time {time}: {e}")))?;
    Ok(TimeSlot {
        time_of_day,
        taken: taken != 0,
    })
}

// Internal row type for Medication mapping
struct MedicationRow {
    id: String,
    owner_id: String,
    name: String,
    dosage: String,
    frequency: String,
    start_date: String,
    end_date: Option<String>,
    instructions: Option<String>,
    reminders_enabled: i32,
    notification_enabled: i32,
    alarm_enabled: i32,
    created_at: String,
}

fn medication_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<MedicationRow, rusqlite::Error> {
    Ok(MedicationRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        dosage: row.get(3)?,
        frequency: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
        instructions: row.get(7)?,
        reminders_enabled: row.get(8)?,
        notification_enabled: row.get(9)?,
        alarm_enabled: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn medication_from_row(
    row: MedicationRow,
    schedule: Vec<TimeSlot>,
) -> Result<Medication, DatabaseError> {
    let parse_date = |s: &str| {
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map_err(|e| DatabaseError::CorruptRow(format!("bad date {s}: {e}")))
    };

    Ok(Medication {
        id: Uuid::parse_str(&row.id).map_err(|e| DatabaseError::CorruptRow(e.to_string()))?,
        owner_id: OwnerId::new(row.owner_id)
            .ok_or_else(|| DatabaseError::CorruptRow("blank owner_id".into()))?,
        name: row.name,
        dosage: row.dosage,
        frequency: Frequency::from_str(&row.frequency)?,
        schedule,
        start_date: parse_date(&row.start_date)?,
        end_date: row.end_date.as_deref().map(parse_date).transpose()?,
        instructions: row.instructions,
        reminders: ReminderSettings {
            enabled: row.reminders_enabled != 0,
            notification: row.notification_enabled != 0,
            alarm: row.alarm_enabled != 0,
        },
        created_at: DateTime::parse_from_rfc3339(&row.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| DatabaseError::CorruptRow(e.to_string()))?,
    })
}
