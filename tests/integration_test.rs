// Integration tests
// Exercise the store, the query engine and iCalendar round trips together

mod fixtures;

use chrono::Duration;
use pretty_assertions::assert_eq;
use rust_schedule::models::alarm::Alarm;
use rust_schedule::models::query::{DateRange, QueryParams};
use rust_schedule::models::recurrence::{RecurrenceKind, RecurrenceRule};
use rust_schedule::models::schedule::Schedule;
use rust_schedule::models::schedule_type::ScheduleType;
use rust_schedule::models::settings::Settings;
use rust_schedule::services::account::AccountService;
use rust_schedule::services::icalendar::ICalendarService;
use rust_schedule::services::reminder;
use rust_schedule::services::schedule::ScheduleService;
use rust_schedule::services::schedule_type::ScheduleTypeService;
use rust_schedule::services::settings::SettingsService;
use rust_schedule::utils::lunar;
use rust_schedule::ScheduleError;

use fixtures::dates::{at, day, midnight};
use fixtures::{schedules, TestStore};

#[test]
fn test_local_account_is_seeded_once() {
    let store = TestStore::new();
    let accounts = AccountService::new(store.db.connection());

    // Second call must not duplicate the account or its types
    accounts.ensure_local().unwrap();
    assert_eq!(accounts.list().unwrap().len(), 1);

    let names: Vec<String> = ScheduleTypeService::new(store.db.connection())
        .list_for_account(store.account_id)
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["Work", "Life", "Other", "Festival"]);
}

#[test]
fn test_deleting_type_removes_its_schedules() {
    let store = TestStore::new();
    let conn = store.db.connection();
    let types = ScheduleTypeService::new(conn);
    let schedules_service = ScheduleService::new(conn);

    let hobby = types
        .create(ScheduleType::new(store.account_id, "Hobby", "#F59E0B"))
        .unwrap();
    let hobby_id = hobby.id.unwrap();
    let work_id = store.type_id("Work");

    schedules_service
        .create(schedules::meeting(hobby_id, "Climbing", 2024, 6, 3))
        .unwrap();
    schedules_service
        .create(schedules::meeting(hobby_id, "Pottery", 2024, 6, 4))
        .unwrap();
    schedules_service
        .create(schedules::meeting(work_id, "Review", 2024, 6, 4))
        .unwrap();

    assert_eq!(types.delete(hobby_id).unwrap(), 2);
    assert!(types.get(hobby_id).unwrap().is_none());

    let left = schedules_service.list_for_account(store.account_id).unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].title, "Review");
}

#[test]
fn test_system_types_are_protected() {
    let store = TestStore::new();
    let types = ScheduleTypeService::new(store.db.connection());
    let work_id = store.type_id("Work");

    assert!(matches!(types.delete(work_id), Err(ScheduleError::PermissionDenied(_))));
    assert!(matches!(
        types.rename(work_id, "Job"),
        Err(ScheduleError::PermissionDenied(_))
    ));

    types.recolor(work_id, "#000000").unwrap();
    types.set_visibility(work_id, false).unwrap();
    let work = types.get(work_id).unwrap().unwrap();
    assert_eq!(work.color, "#000000");
    assert!(!work.visible);
}

#[test]
fn test_type_limit_includes_system_types() {
    let store = TestStore::new();
    let types = ScheduleTypeService::with_limit(store.db.connection(), 6);

    types
        .create(ScheduleType::new(store.account_id, "A", "#111111"))
        .unwrap();
    types
        .create(ScheduleType::new(store.account_id, "B", "#222222"))
        .unwrap();

    let result = types.create(ScheduleType::new(store.account_id, "C", "#333333"));
    assert!(matches!(
        result,
        Err(ScheduleError::CapacityExceeded { limit: 6, .. })
    ));
}

#[test]
fn test_union_account_lifecycle() {
    let store = TestStore::new();
    let conn = store.db.connection();
    let accounts = AccountService::new(conn);

    let union = accounts.add_union_account("Shared").unwrap();
    let union_id = union.id.unwrap();
    assert!(matches!(
        accounts.add_union_account("Another"),
        Err(ScheduleError::CapacityExceeded { .. })
    ));

    let shared = ScheduleTypeService::new(conn)
        .create(ScheduleType::new(union_id, "Team", "#0EA5E9"))
        .unwrap();
    ScheduleService::new(conn)
        .create(schedules::meeting(shared.id.unwrap(), "Sync", 2024, 6, 3))
        .unwrap();

    assert!(matches!(
        accounts.remove_account(store.account_id),
        Err(ScheduleError::PermissionDenied(_))
    ));
    assert_eq!(accounts.remove_account(union_id).unwrap(), 1);
    assert!(accounts.get(union_id).unwrap().is_none());
    assert!(ScheduleTypeService::new(conn).get(shared.id.unwrap()).unwrap().is_none());
}

#[test]
fn test_range_query_over_stored_schedules() {
    let store = TestStore::new();
    let service = ScheduleService::new(store.db.connection());
    let work_id = store.type_id("Work");

    service
        .create(schedules::daily(work_id, "Standup", at(2024, 6, 3, 9)))
        .unwrap();
    service
        .create(schedules::meeting(work_id, "Planning", 2024, 6, 5))
        .unwrap();

    let range = DateRange::new(midnight(2024, 6, 3), midnight(2024, 6, 6)).unwrap();
    let map = service.schedule_map(store.account_id, &range).unwrap();

    let days: Vec<_> = map.keys().copied().collect();
    assert_eq!(days, vec![day(2024, 6, 3), day(2024, 6, 4), day(2024, 6, 5)]);
    let titles: Vec<&str> = map[&day(2024, 6, 5)]
        .iter()
        .map(|o| o.schedule.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Standup", "Planning"]);
}

#[test]
fn test_hidden_types_drop_out_of_queries() {
    let store = TestStore::new();
    let conn = store.db.connection();
    let service = ScheduleService::new(conn);
    let life_id = store.type_id("Life");

    service
        .create(schedules::meeting(life_id, "Dentist", 2024, 6, 3))
        .unwrap();
    ScheduleTypeService::new(conn)
        .set_visibility(life_id, false)
        .unwrap();

    let found = service.day(store.account_id, day(2024, 6, 3)).unwrap();
    assert!(found.is_empty());
    assert_eq!(service.list_for_account(store.account_id).unwrap().len(), 1);
}

#[test]
fn test_top_and_keyword_filters() {
    let store = TestStore::new();
    let service = ScheduleService::new(store.db.connection());
    let work_id = store.type_id("Work");

    service
        .create(schedules::daily(work_id, "Standup", at(2024, 6, 3, 9)))
        .unwrap();
    service
        .create(schedules::meeting(work_id, "Budget review", 2024, 6, 4))
        .unwrap();

    let params = QueryParams::new(midnight(2024, 6, 1), midnight(2024, 7, 1)).top(3);
    let map = service.query(store.account_id, &params).unwrap();
    let total: usize = map.values().map(Vec::len).sum();
    assert_eq!(total, 3);

    let params = QueryParams::new(midnight(2024, 6, 1), midnight(2024, 7, 1)).keyword("budget");
    let map = service.query(store.account_id, &params).unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map[&day(2024, 6, 4)][0].schedule.title, "Budget review");
}

#[test]
fn test_search_and_upcoming() {
    let store = TestStore::new();
    let service = ScheduleService::new(store.db.connection());
    let life_id = store.type_id("Life");

    service
        .create(schedules::repeating(
            life_id,
            "Gym",
            at(2024, 1, 1, 7),
            RecurrenceRule::new(RecurrenceKind::Weekly).count(53),
        ))
        .unwrap();

    let found = service
        .search(store.account_id, "gym", at(2024, 6, 1, 12), 1)
        .unwrap();
    let hits: usize = found.values().map(Vec::len).sum();
    // Mondays at 07:00 from 2024-05-06 through 2024-07-01
    assert_eq!(hits, 9);

    let next = service
        .upcoming(store.account_id, at(2024, 12, 20, 0), 5)
        .unwrap();
    assert_eq!(next.len(), 2);
    assert_eq!(next[0].start(), at(2024, 12, 23, 7));
    assert_eq!(next[0].sequence, 52);
    assert_eq!(next[1].sequence, 53);
}

#[test]
fn test_lunar_yearly_follows_the_moon() {
    let store = TestStore::new();
    let service = ScheduleService::new(store.db.connection());
    let festival_id = store.type_id("Festival");

    service
        .create(schedules::repeating(
            festival_id,
            "Mid-autumn",
            at(2024, 9, 17, 19),
            RecurrenceRule::new(RecurrenceKind::LunarYearly),
        ))
        .unwrap();

    let range = DateRange::new(midnight(2024, 1, 1), midnight(2027, 1, 1)).unwrap();
    let map = service.schedule_map(store.account_id, &range).unwrap();
    let days: Vec<_> = map.keys().copied().collect();
    assert_eq!(days, vec![day(2024, 9, 17), day(2025, 10, 6), day(2026, 9, 25)]);

    let info = lunar::day_info(day(2025, 10, 6)).unwrap();
    assert_eq!((info.lunar.month, info.lunar.day), (8, 15));
}

#[test]
fn test_ics_export_then_import_into_another_type() {
    let store = TestStore::new();
    let conn = store.db.connection();
    let service = ScheduleService::new(conn);
    let work_id = store.type_id("Work");
    let other_id = store.type_id("Other");

    let standup = Schedule::builder()
        .type_id(work_id)
        .title("Standup; daily, short")
        .description("Line one\nLine two")
        .start(at(2024, 6, 3, 9))
        .end(at(2024, 6, 3, 9) + Duration::minutes(15))
        .recurrence(
            RecurrenceRule::new(RecurrenceKind::Weekdays)
                .count(10)
                .with_exceptions([at(2024, 6, 5, 9)]),
        )
        .alarm(Alarm::Minutes15Before)
        .build()
        .unwrap();
    let holiday = Schedule::builder()
        .type_id(work_id)
        .title("Offsite")
        .start(midnight(2024, 6, 20))
        .end(midnight(2024, 6, 21))
        .all_day(true)
        .alarm(Alarm::DayBeforeAt9)
        .build()
        .unwrap();
    service.create(standup).unwrap();
    service.create(holiday).unwrap();

    let ical = ICalendarService::new();
    let exported = service.list_for_account(store.account_id).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.ics");
    ical.export_to_file(&exported, &path).unwrap();

    let imported = ical.import_from_file(&path, other_id).unwrap();
    assert_eq!(imported.len(), 2);
    for schedule in imported {
        service.create(schedule).unwrap();
    }

    let copies = service.list_by_type(other_id).unwrap();
    let standup = copies.iter().find(|s| s.title.starts_with("Standup")).unwrap();
    assert_eq!(standup.title, "Standup; daily, short");
    assert_eq!(standup.description.as_deref(), Some("Line one\nLine two"));
    assert_eq!(standup.recurrence.kind, RecurrenceKind::Weekdays);
    assert_eq!(standup.recurrence.max_count(), Some(10));
    assert_eq!(standup.recurrence.exceptions(), &[at(2024, 6, 5, 9)]);
    assert_eq!(standup.alarms, vec![Alarm::Minutes15Before]);

    let offsite = copies.iter().find(|s| s.title == "Offsite").unwrap();
    assert!(offsite.all_day);
    assert_eq!(offsite.start.date_naive(), day(2024, 6, 20));
    assert_eq!(offsite.end.date_naive(), day(2024, 6, 21));
    assert_eq!(offsite.alarms, vec![Alarm::DayBeforeAt9]);
}

#[test]
fn test_unsupported_rrule_fails_import() {
    let ics = "BEGIN:VCALENDAR\r\n\
               BEGIN:VEVENT\r\n\
               SUMMARY:Hourly ping\r\n\
               DTSTART:20240603T090000\r\n\
               RRULE:FREQ=HOURLY\r\n\
               END:VEVENT\r\n\
               END:VCALENDAR\r\n";

    let err = ICalendarService::new().import_schedules(ics, 1).unwrap_err();
    assert!(format!("{:#}", err).contains("Hourly ping"));
}

#[test]
fn test_reminders_for_stored_schedules() {
    let store = TestStore::new();
    let service = ScheduleService::new(store.db.connection());
    let work_id = store.type_id("Work");

    let review = Schedule::builder()
        .type_id(work_id)
        .title("Review")
        .start(at(2024, 6, 4, 14))
        .end(at(2024, 6, 4, 15))
        .alarm(Alarm::Hour1Before)
        .alarm(Alarm::Day1Before)
        .build()
        .unwrap();
    service.create(review).unwrap();

    let schedules = service.list_visible_for_account(store.account_id).unwrap();
    let window = DateRange::new(at(2024, 6, 4, 0), at(2024, 6, 5, 0)).unwrap();
    let fired = reminder::reminders(&schedules, &window);

    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].fire_at, at(2024, 6, 4, 13));
    assert_eq!(fired[0].occurrence_start, at(2024, 6, 4, 14));
}

#[test]
fn test_query_params_json_round_trip() {
    let params = QueryParams::new(midnight(2024, 6, 1), midnight(2024, 7, 1))
        .keyword("moon")
        .kind(RecurrenceKind::LunarMonthly);

    let json = params.to_json().unwrap();
    assert!(json.contains("\"queryRRule\":6"));
    assert_eq!(QueryParams::from_json(&json).unwrap(), params);
}

#[test]
fn test_settings_persist_between_loads() {
    let dir = tempfile::tempdir().unwrap();
    let service = SettingsService::new(dir.path().join("config.toml"));

    let settings = Settings {
        database_path: Some(dir.path().join("schedule.db")),
        upcoming_count: 25,
        ..Settings::default()
    };
    service.save(&settings).unwrap();

    let loaded = SettingsService::new(service.path()).load().unwrap();
    assert_eq!(loaded, settings);
}
