mod common;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rstest::rstest;
use tutorsync_scheduler::cadence::RecurringSchedule;

use common::at;

fn daily_at_eight(timezone: Tz) -> RecurringSchedule {
    RecurringSchedule::parse("0 0 8 * * *", timezone).unwrap()
}

#[rstest]
#[case::before_fire_time(at(2024, 1, 1, 6, 0), at(2024, 1, 1, 8, 0))]
#[case::exactly_at_fire_time(at(2024, 1, 1, 8, 0), at(2024, 1, 2, 8, 0))]
#[case::after_fire_time(at(2024, 1, 1, 9, 0), at(2024, 1, 2, 8, 0))]
#[case::year_end(at(2023, 12, 31, 23, 0), at(2024, 1, 1, 8, 0))]
fn test_daily_expression(#[case] now: DateTime<Utc>, #[case] expected: DateTime<Utc>) {
    assert_eq!(daily_at_eight(Tz::UTC).next_slot_after(now), Some(expected));
}

#[test]
fn test_twice_daily_expression() {
    let schedule = RecurringSchedule::parse("0 5 0,12 * * *", Tz::UTC).unwrap();

    assert_eq!(schedule.next_slot_after(at(2024, 1, 1, 6, 0)), Some(at(2024, 1, 1, 12, 5)));
    assert_eq!(schedule.next_slot_after(at(2024, 1, 1, 12, 5)), Some(at(2024, 1, 2, 0, 5)));
}

#[test]
fn test_expression_is_evaluated_in_local_time() {
    let schedule = daily_at_eight(Tz::Europe__Berlin);

    // CET in winter, CEST in summer
    assert_eq!(schedule.next_slot_after(at(2024, 1, 10, 0, 0)), Some(at(2024, 1, 10, 7, 0)));
    assert_eq!(schedule.next_slot_after(at(2024, 7, 10, 0, 0)), Some(at(2024, 7, 10, 6, 0)));
}

#[test]
fn test_expression_without_future_matches_has_no_next_run() {
    let schedule = RecurringSchedule::parse("0 0 0 1 1 * 2020", Tz::UTC).unwrap();
    let mut rng = StdRng::seed_from_u64(1);

    assert_eq!(schedule.next_slot_after(at(2024, 1, 1, 0, 0)), None);
    assert_eq!(schedule.next_run_after(at(2024, 1, 1, 0, 0), &mut rng), None);
}

#[test]
fn test_interval_phrases_are_not_expressions() {
    let err = RecurringSchedule::parse("every 36 hours", Tz::UTC).unwrap_err();

    assert!(err.to_string().contains("every 36 hours"));
}

#[test]
fn test_expression_is_trimmed() {
    let schedule = RecurringSchedule::parse("  0 5 0 * * *\n", Tz::UTC).unwrap();

    assert_eq!(schedule.expression(), "0 5 0 * * *");
}

#[test]
fn test_jitter_stays_within_bound() {
    let schedule = daily_at_eight(Tz::UTC).with_jitter(Duration::seconds(90));
    let mut rng = StdRng::seed_from_u64(7);
    let slot = at(2024, 1, 1, 8, 0);

    for _ in 0..50 {
        let next = schedule.next_run_after(at(2024, 1, 1, 6, 0), &mut rng).unwrap();
        assert!(next >= slot);
        assert!(next <= slot + Duration::seconds(90));
    }
}

#[test]
fn test_negative_jitter_is_ignored() {
    let schedule = daily_at_eight(Tz::UTC).with_jitter(Duration::seconds(-30));
    let mut rng = StdRng::seed_from_u64(7);

    assert_eq!(schedule.jitter, Duration::zero());
    assert_eq!(
        schedule.next_run_after(at(2024, 1, 1, 6, 0), &mut rng),
        Some(at(2024, 1, 1, 8, 0))
    );
}
