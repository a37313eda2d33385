use super::shared::{map_schedule_row, serialize_alarms, serialize_exceptions, SCHEDULE_COLUMNS};
use super::ScheduleService;
use crate::error::{ScheduleError, ScheduleResult};
use crate::models::schedule::Schedule;
use super::recurrence::Instances;
use chrono::{DateTime, Local, NaiveDate};
use rusqlite::{self, params};

impl<'a> ScheduleService<'a> {
    /// Create a new schedule in the database.
    pub fn create(&self, mut schedule: Schedule) -> ScheduleResult<Schedule> {
        schedule.validate()?;
        self.ensure_type_exists(schedule.type_id)?;

        let now = Local::now();
        let exceptions_json = serialize_exceptions(schedule.recurrence.exceptions())?;
        let alarms_json = serialize_alarms(&schedule.alarms)?;

        self.conn.execute(
            "INSERT INTO schedules (
                type_id, title, description, location, start_datetime, end_datetime,
                is_all_day, is_lunar, recurrence_rule, recurrence_exceptions, alarms,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
            params![
                schedule.type_id,
                schedule.title.trim(),
                schedule.description,
                schedule.location,
                schedule.start.to_rfc3339(),
                schedule.end.to_rfc3339(),
                schedule.all_day as i32,
                schedule.lunar as i32,
                schedule.recurrence.to_rrule(),
                exceptions_json,
                alarms_json,
                now.to_rfc3339(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        schedule.id = Some(id);
        schedule.title = schedule.title.trim().to_string();
        schedule.created_at = Some(now);
        schedule.updated_at = Some(now);

        log::info!("Created schedule {} '{}'", id, schedule.title);
        Ok(schedule)
    }

    /// Retrieve a schedule by ID.
    pub fn get(&self, id: i64) -> ScheduleResult<Option<Schedule>> {
        let result = self.conn.query_row(
            &format!("SELECT {} FROM schedules s WHERE s.id = ?1", SCHEDULE_COLUMNS),
            [id],
            map_schedule_row,
        );

        match result {
            Ok(schedule) => Ok(Some(schedule)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Retrieve a schedule by ID, failing with `NotFound` when absent.
    pub fn require(&self, id: i64) -> ScheduleResult<Schedule> {
        self.get(id)?
            .ok_or_else(|| ScheduleError::not_found("schedule", id))
    }

    /// Update an existing schedule.
    pub fn update(&self, schedule: &Schedule) -> ScheduleResult<()> {
        let id = schedule
            .id
            .ok_or_else(|| ScheduleError::Validation("Schedule ID is required for update".into()))?;
        schedule.validate()?;
        self.ensure_type_exists(schedule.type_id)?;

        let exceptions_json = serialize_exceptions(schedule.recurrence.exceptions())?;
        let alarms_json = serialize_alarms(&schedule.alarms)?;
        let rows_affected = self.conn.execute(
            "UPDATE schedules SET
                type_id = ?1, title = ?2, description = ?3, location = ?4,
                start_datetime = ?5, end_datetime = ?6, is_all_day = ?7, is_lunar = ?8,
                recurrence_rule = ?9, recurrence_exceptions = ?10, alarms = ?11,
                updated_at = ?12
             WHERE id = ?13",
            params![
                schedule.type_id,
                schedule.title.trim(),
                schedule.description,
                schedule.location,
                schedule.start.to_rfc3339(),
                schedule.end.to_rfc3339(),
                schedule.all_day as i32,
                schedule.lunar as i32,
                schedule.recurrence.to_rrule(),
                exceptions_json,
                alarms_json,
                Local::now().to_rfc3339(),
                id,
            ],
        )?;

        if rows_affected == 0 {
            return Err(ScheduleError::not_found("schedule", id));
        }

        Ok(())
    }

    /// Delete a schedule (the whole series) by ID.
    pub fn delete(&self, id: i64) -> ScheduleResult<()> {
        let rows_affected = self.conn.execute("DELETE FROM schedules WHERE id = ?1", [id])?;

        if rows_affected == 0 {
            return Err(ScheduleError::not_found("schedule", id));
        }

        log::info!("Deleted schedule {}", id);
        Ok(())
    }

    /// Remove one instance of a recurring schedule by recording an exception.
    pub fn delete_occurrence(&self, id: i64, occurrence_start: DateTime<Local>) -> ScheduleResult<()> {
        let mut schedule = self.require(id)?;

        if !schedule.is_recurring() {
            return Err(ScheduleError::InvalidRecurrence(format!(
                "schedule {} is not recurring; delete it instead",
                id
            )));
        }

        // Already excluded: nothing left to delete on that day
        if schedule.recurrence.is_excluded(occurrence_start) {
            return Ok(());
        }
        if !has_instance_on(&schedule, occurrence_start.date_naive()) {
            log::warn!("Schedule {} has no occurrence on {}", id, occurrence_start.date_naive());
            return Err(ScheduleError::not_found("occurrence", id));
        }

        schedule.recurrence.add_exception(occurrence_start);
        self.update(&schedule)?;
        log::info!("Excluded {} from schedule {}", occurrence_start, id);

        Ok(())
    }

    fn ensure_type_exists(&self, type_id: i64) -> ScheduleResult<()> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM schedule_types WHERE id = ?1",
            [type_id],
            |row| row.get(0),
        )?;

        if count == 0 {
            return Err(ScheduleError::not_found("schedule type", type_id));
        }
        Ok(())
    }
}

/// Whether the series has a live instance starting on `date`.
fn has_instance_on(schedule: &Schedule, date: NaiveDate) -> bool {
    let mut instances = Instances::new(schedule);
    if let Some(before) = date.pred_opt() {
        instances.skip_to(before);
    }

    instances
        .map(|(_, start)| start.date_naive())
        .take_while(|day| *day <= date)
        .any(|day| day == date)
}
