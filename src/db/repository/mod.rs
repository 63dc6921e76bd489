//! Repository layer: entity-scoped database operations.
//!
//! Functions take a borrowed `Connection` so callers decide the
//! transaction boundary. A `Transaction` derefs to `Connection`.

mod medication;

pub use medication::*;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use rusqlite::Connection;
    use uuid::Uuid;

    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::*;
    use crate::models::*;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn owner(raw: &str) -> OwnerId {
        OwnerId::new(raw).unwrap()
    }

    fn make_medication(conn: &Connection, owner_id: &OwnerId, times: &[&str]) -> Medication {
        let med = Medication {
            id: Uuid::new_v4(),
            owner_id: owner_id.clone(),
            name: "Aspirin".into(),
            dosage: "500mg".into(),
            frequency: Frequency::Twice,
            schedule: times
                .iter()
                .map(|t| TimeSlot::pending(NaiveTime::parse_from_str(t, "%H:%M").unwrap()))
                .collect(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: Some(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()),
            instructions: Some("With food".into()),
            reminders: ReminderSettings {
                enabled: true,
                notification: false,
                alarm: true,
            },
            created_at: Utc::now(),
        };
        insert_medication(conn, &med).unwrap();
        med
    }

    #[test]
    fn medication_insert_and_retrieve() {
        let conn = test_db();
        let alice = owner("alice");
        let med = make_medication(&conn, &alice, &["08:00", "20:00"]);

        let loaded = get_owned_medication(&conn, &alice, &med.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Aspirin");
        assert_eq!(loaded.frequency, Frequency::Twice);
        assert_eq!(loaded.schedule.len(), 2);
        assert_eq!(loaded.schedule[1].time_of_day, NaiveTime::from_hms_opt(20, 0, 0).unwrap());
        assert_eq!(loaded.end_date, med.end_date);
        assert_eq!(loaded.instructions.as_deref(), Some("With food"));
        assert!(!loaded.reminders.notification);
        assert_eq!(loaded.created_at.timestamp_micros(), med.created_at.timestamp_micros());
    }

    #[test]
    fn foreign_owner_sees_nothing() {
        let conn = test_db();
        let med = make_medication(&conn, &owner("alice"), &["08:00"]);
        let found = get_owned_medication(&conn, &owner("bob"), &med.id).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn list_by_owner_keeps_insertion_order_and_isolation() {
        let conn = test_db();
        let alice = owner("alice");
        let first = make_medication(&conn, &alice, &["08:00"]);
        make_medication(&conn, &owner("bob"), &["09:00"]);
        let second = make_medication(&conn, &alice, &["07:00", "12:00", "19:00"]);

        let meds = get_medications_by_owner(&conn, &alice).unwrap();
        assert_eq!(meds.len(), 2);
        assert_eq!(meds[0].id, first.id);
        assert_eq!(meds[1].id, second.id);
        assert_eq!(meds[1].schedule.len(), 3);
        assert_eq!(meds[1].schedule[0].time_of_day, NaiveTime::from_hms_opt(7, 0, 0).unwrap());
    }

    #[test]
    fn set_slot_taken_reports_transitions() {
        let conn = test_db();
        let alice = owner("alice");
        let med = make_medication(&conn, &alice, &["08:00", "20:00"]);

        assert_eq!(set_slot_taken(&conn, &med.id, 1).unwrap(), 1);
        assert_eq!(set_slot_taken(&conn, &med.id, 1).unwrap(), 0);

        let loaded = get_owned_medication(&conn, &alice, &med.id).unwrap().unwrap();
        assert!(!loaded.schedule[0].taken);
        assert!(loaded.schedule[1].taken);
    }

    #[test]
    fn delete_cascades_slots() {
        let conn = test_db();
        let alice = owner("alice");
        let med = make_medication(&conn, &alice, &["08:00", "20:00"]);

        assert!(!delete_owned_medication(&conn, &owner("bob"), &med.id).unwrap());
        assert!(delete_owned_medication(&conn, &alice, &med.id).unwrap());
        assert!(!delete_owned_medication(&conn, &alice, &med.id).unwrap());

        let slots: i64 = conn
            .query_row("SELECT COUNT(*) FROM medication_slots", [], |row| row.get(0))
            .unwrap();
        assert_eq!(slots, 0);
    }

    #[test]
    fn corrupt_frequency_surfaces_as_error() {
        let conn = test_db();
        let alice = owner("alice");
        let med = make_medication(&conn, &alice, &["08:00"]);
        conn.execute_batch("PRAGMA ignore_check_constraints = ON;").unwrap();
        conn.execute(
            "UPDATE medications SET frequency = 'hourly' WHERE id = ?1",
            [med.id.to_string()],
        )
        .unwrap();

        let err = get_owned_medication(&conn, &alice, &med.id).unwrap_err();
        assert!(matches!(err, crate::db::DatabaseError::InvalidEnum { .. }));
    }
}
