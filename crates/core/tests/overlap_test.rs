use chrono::NaiveTime;
use rstest::rstest;
use tutorsync_core::overlap::{first_overlap, has_overlap, TimeRange};

fn range(start: &str, end: &str) -> TimeRange {
    TimeRange::new(
        NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
        NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
    )
}

#[rstest]
#[case(("09:00", "10:00"), ("09:30", "10:30"), true)]
#[case(("09:00", "10:00"), ("10:00", "11:00"), false)]
#[case(("10:00", "11:00"), ("09:00", "10:00"), false)]
#[case(("09:00", "12:00"), ("10:00", "11:00"), true)]
#[case(("10:00", "11:00"), ("09:00", "12:00"), true)]
#[case(("09:00", "10:00"), ("09:00", "10:00"), true)]
#[case(("08:00", "08:30"), ("14:00", "15:00"), false)]
fn test_overlap_is_half_open(
    #[case] a: (&str, &str),
    #[case] b: (&str, &str),
    #[case] expected: bool,
) {
    let a = range(a.0, a.1);
    let b = range(b.0, b.1);

    assert_eq!(a.overlaps(&b), expected);
    assert_eq!(b.overlaps(&a), expected);
    assert_eq!(has_overlap(a, [b]), expected);
}

#[test]
fn test_has_overlap_with_no_existing_ranges() {
    assert!(!has_overlap(range("09:00", "10:00"), Vec::new()));
}

#[test]
fn test_first_overlap_returns_the_clashing_range() {
    let existing = vec![
        range("08:00", "09:00"),
        range("09:45", "10:15"),
        range("09:50", "11:00"),
    ];

    assert_eq!(
        first_overlap(range("09:00", "10:00"), existing),
        Some(range("09:45", "10:15"))
    );
}
