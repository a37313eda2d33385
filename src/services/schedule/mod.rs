//! Schedule service entry point.
//! Provides database-backed operations and recurrence expansion helpers
//! organized across focused submodules.

use rusqlite::Connection;

pub mod crud;
pub mod queries;
pub mod recurrence;
pub(crate) mod shared;

/// Service for managing schedules stored in SQLite.
pub struct ScheduleService<'a> {
    pub(crate) conn: &'a Connection,
}

impl<'a> ScheduleService<'a> {
    /// Create a new ScheduleService with a database connection
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ScheduleError, ScheduleResult};
    use crate::models::alarm::Alarm;
    use crate::models::query::{DateRange, QueryParams};
    use crate::models::recurrence::{RecurrenceKind, RecurrenceRule};
    use crate::models::schedule::Schedule;
    use crate::services::account::AccountService;
    use crate::services::database::Database;
    use crate::services::schedule_type::ScheduleTypeService;
    use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};
    use pretty_assertions::assert_eq;

    struct Fixture {
        db: Database,
        account_id: i64,
        type_id: i64,
    }

    fn setup_test_db() -> Fixture {
        let db = Database::in_memory().unwrap();
        db.initialize_schema().unwrap();
        let account_id = AccountService::new(db.connection())
            .ensure_local()
            .unwrap()
            .id
            .unwrap();
        let type_id = ScheduleTypeService::new(db.connection())
            .list_for_account(account_id)
            .unwrap()[0]
            .id
            .unwrap();
        Fixture { db, account_id, type_id }
    }

    fn at(m: u32, d: u32, h: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, m, d, h, 0, 0).unwrap()
    }

    fn sample_schedule(type_id: i64) -> Schedule {
        Schedule::new(type_id, "Test Schedule", at(6, 3, 9), at(6, 3, 10)).unwrap()
    }

    #[test]
    fn test_create_schedule() {
        let f = setup_test_db();
        let service = ScheduleService::new(f.db.connection());

        let created = service.create(sample_schedule(f.type_id)).unwrap();
        assert!(created.id.is_some());
        assert_eq!(created.title, "Test Schedule");
        assert!(created.created_at.is_some());
        assert!(created.updated_at.is_some());
    }

    #[test]
    fn test_create_requires_existing_type() {
        let f = setup_test_db();
        let service = ScheduleService::new(f.db.connection());

        let result = service.create(sample_schedule(999));
        assert!(matches!(
            result,
            Err(ScheduleError::NotFound { entity: "schedule type", id: 999 })
        ));
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let f = setup_test_db();
        let service = ScheduleService::new(f.db.connection());

        let schedule = Schedule::builder()
            .type_id(f.type_id)
            .title("Mid-autumn dinner")
            .description("Family")
            .location("Home")
            .start(at(9, 17, 18))
            .end(at(9, 17, 21))
            .lunar(true)
            .recurrence(
                RecurrenceRule::new(RecurrenceKind::LunarYearly)
                    .count(5)
                    .with_exceptions([at(9, 17, 18)]),
            )
            .alarm(Alarm::Day1Before)
            .alarm(Alarm::Hour1Before)
            .build()
            .unwrap();

        let created = service.create(schedule).unwrap();
        let found = service.get(created.id.unwrap()).unwrap().unwrap();
        assert_eq!(found.description.as_deref(), Some("Family"));
        assert_eq!(found.location.as_deref(), Some("Home"));
        assert_eq!(found.start, at(9, 17, 18));
        assert_eq!(found.end, at(9, 17, 21));
        assert!(found.lunar);
        assert_eq!(found.recurrence.kind, RecurrenceKind::LunarYearly);
        assert_eq!(found.recurrence.max_count(), Some(5));
        assert_eq!(found.recurrence.exceptions(), &[at(9, 17, 18)]);
        assert_eq!(found.alarms, vec![Alarm::Day1Before, Alarm::Hour1Before]);
    }

    #[test]
    fn test_get_nonexistent_schedule() {
        let f = setup_test_db();
        let service = ScheduleService::new(f.db.connection());

        assert!(service.get(999).unwrap().is_none());
        assert!(matches!(service.require(999), Err(ScheduleError::NotFound { .. })));
    }

    #[test]
    fn test_update_schedule() {
        let f = setup_test_db();
        let service = ScheduleService::new(f.db.connection());

        let mut schedule = service.create(sample_schedule(f.type_id)).unwrap();
        schedule.title = "Updated Title".to_string();
        schedule.end = schedule.start + Duration::hours(2);
        service.update(&schedule).unwrap();

        let updated = service.get(schedule.id.unwrap()).unwrap().unwrap();
        assert_eq!(updated.title, "Updated Title");
        assert_eq!(updated.duration(), Duration::hours(2));
    }

    #[test]
    fn test_update_rejects_bad_input() {
        let f = setup_test_db();
        let service = ScheduleService::new(f.db.connection());

        let mut missing = sample_schedule(f.type_id);
        missing.id = Some(999);
        assert!(matches!(service.update(&missing), Err(ScheduleError::NotFound { .. })));

        let mut inverted = service.create(sample_schedule(f.type_id)).unwrap();
        inverted.end = inverted.start - Duration::hours(1);
        assert!(matches!(service.update(&inverted), Err(ScheduleError::InvalidRange(_))));
    }

    #[test]
    fn test_delete_schedule() {
        let f = setup_test_db();
        let service = ScheduleService::new(f.db.connection());

        let id = service.create(sample_schedule(f.type_id)).unwrap().id.unwrap();
        service.delete(id).unwrap();
        assert!(service.get(id).unwrap().is_none());
        assert!(matches!(service.delete(id), Err(ScheduleError::NotFound { .. })));
    }

    #[test]
    fn test_delete_occurrence_adds_exception() {
        let f = setup_test_db();
        let service = ScheduleService::new(f.db.connection());

        let mut daily = sample_schedule(f.type_id);
        daily.recurrence = RecurrenceRule::new(RecurrenceKind::Daily);
        let id = service.create(daily).unwrap().id.unwrap();

        service.delete_occurrence(id, at(6, 5, 9)).unwrap();

        let day = service
            .day(f.account_id, NaiveDate::from_ymd_opt(2024, 6, 5).unwrap())
            .unwrap();
        assert!(day.is_empty());
        let next = service
            .day(f.account_id, NaiveDate::from_ymd_opt(2024, 6, 6).unwrap())
            .unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].sequence, 4);
    }

    #[test]
    fn test_delete_occurrence_of_single_schedule() {
        let f = setup_test_db();
        let service = ScheduleService::new(f.db.connection());

        let id = service.create(sample_schedule(f.type_id)).unwrap().id.unwrap();
        let result = service.delete_occurrence(id, at(6, 3, 9));
        assert!(matches!(result, Err(ScheduleError::InvalidRecurrence(_))));
    }

    #[test]
    fn test_delete_occurrence_off_the_series() {
        let f = setup_test_db();
        let service = ScheduleService::new(f.db.connection());

        // Mondays at 09:00
        let mut weekly = sample_schedule(f.type_id);
        weekly.recurrence = RecurrenceRule::new(RecurrenceKind::Weekly);
        let id = service.create(weekly).unwrap().id.unwrap();

        let tuesday = service.delete_occurrence(id, at(6, 11, 9));
        assert!(matches!(
            tuesday,
            Err(ScheduleError::NotFound { entity: "occurrence", .. })
        ));
        assert!(service.require(id).unwrap().recurrence.exceptions().is_empty());

        service.delete_occurrence(id, at(6, 10, 9)).unwrap();
        // Repeating the same deletion is harmless
        service.delete_occurrence(id, at(6, 10, 9)).unwrap();
        assert_eq!(service.require(id).unwrap().recurrence.exceptions(), &[at(6, 10, 9)]);
    }

    #[test]
    fn test_delete_occurrence_beyond_count() {
        let f = setup_test_db();
        let service = ScheduleService::new(f.db.connection());

        let mut daily = sample_schedule(f.type_id);
        daily.recurrence = RecurrenceRule::new(RecurrenceKind::Daily).count(3);
        let id = service.create(daily).unwrap().id.unwrap();

        assert!(matches!(
            service.delete_occurrence(id, at(6, 6, 9)),
            Err(ScheduleError::NotFound { .. })
        ));
        service.delete_occurrence(id, at(6, 5, 9)).unwrap();
    }

    #[test]
    fn test_hidden_types_excluded_from_account_queries() {
        let f = setup_test_db();
        let service = ScheduleService::new(f.db.connection());
        service.create(sample_schedule(f.type_id)).unwrap();

        let range = DateRange::new(at(6, 1, 0), at(7, 1, 0)).unwrap();
        assert_eq!(service.schedule_map(f.account_id, &range).unwrap().len(), 1);

        ScheduleTypeService::new(f.db.connection())
            .set_visibility(f.type_id, false)
            .unwrap();
        assert!(service.schedule_map(f.account_id, &range).unwrap().is_empty());
        assert_eq!(service.list_for_account(f.account_id).unwrap().len(), 1);
    }

    #[test]
    fn test_account_level_queries() {
        let f = setup_test_db();
        let service = ScheduleService::new(f.db.connection());

        let mut weekly = sample_schedule(f.type_id);
        weekly.title = "Piano lesson".into();
        weekly.recurrence = RecurrenceRule::new(RecurrenceKind::Weekly).count(4);
        service.create(weekly).unwrap();

        let params = QueryParams::new(at(6, 1, 0), at(7, 1, 0)).keyword("piano");
        let map = service.query(f.account_id, &params).unwrap();
        assert_eq!(map.values().flatten().count(), 4);

        let found = service.search(f.account_id, "LESSON", at(6, 15, 0), 6).unwrap();
        assert_eq!(found.len(), 4);

        let next = service.upcoming(f.account_id, at(6, 12, 0), 10).unwrap();
        let starts: Vec<DateTime<Local>> = next.iter().map(|o| o.start()).collect();
        assert_eq!(starts, vec![at(6, 17, 9), at(6, 24, 9)]);
    }

    #[test]
    fn test_unknown_account_is_not_found() {
        let f = setup_test_db();
        let service = ScheduleService::new(f.db.connection());
        let range = DateRange::new(at(6, 1, 0), at(7, 1, 0)).unwrap();
        let missing = f.account_id + 100;

        let not_found = |result: ScheduleResult<usize>| {
            matches!(result, Err(ScheduleError::NotFound { entity: "account", .. }))
        };
        assert!(not_found(service.schedule_map(missing, &range).map(|m| m.len())));
        assert!(not_found(
            service
                .day(missing, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap())
                .map(|d| d.len())
        ));
        assert!(not_found(
            service
                .query(missing, &QueryParams::new(at(6, 1, 0), at(7, 1, 0)))
                .map(|m| m.len())
        ));
        assert!(not_found(service.search(missing, "test", at(6, 15, 0), 6).map(|m| m.len())));
        assert!(not_found(service.upcoming(missing, at(6, 1, 0), 5).map(|v| v.len())));
        assert!(not_found(service.list_for_account(missing).map(|v| v.len())));

        // An existing account with nothing in it is simply empty
        assert!(service.schedule_map(f.account_id, &range).unwrap().is_empty());
    }

    #[test]
    fn test_list_by_type_orders_by_start() {
        let f = setup_test_db();
        let service = ScheduleService::new(f.db.connection());

        let later = Schedule::new(f.type_id, "Later", at(6, 9, 9), at(6, 9, 10)).unwrap();
        let earlier = Schedule::new(f.type_id, "Earlier", at(6, 2, 9), at(6, 2, 10)).unwrap();
        service.create(later).unwrap();
        service.create(earlier).unwrap();

        let titles: Vec<String> = service
            .list_by_type(f.type_id)
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["Earlier", "Later"]);
        assert_eq!(service.list_all().unwrap().len(), 2);
    }
}
