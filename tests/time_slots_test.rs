use chrono::NaiveTime;
use fitgrid::grid::{OperationalDays, SlotCatalog};
use fitgrid::models::{OperationalHours, Weekday};

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
}

#[test]
fn hourly_slots_span_the_business_day() {
    let catalog = SlotCatalog::new(t(9, 0), t(12, 0), 60);
    assert_eq!(catalog.labels(), &["9:00 AM", "10:00 AM", "11:00 AM"]);
}

#[test]
fn labels_cross_noon_and_midnight_hours() {
    let catalog = SlotCatalog::new(t(11, 0), t(14, 0), 60);
    assert_eq!(catalog.labels(), &["11:00 AM", "12:00 PM", "1:00 PM"]);

    let early = SlotCatalog::new(t(0, 0), t(1, 0), 30);
    assert_eq!(early.labels(), &["12:00 AM", "12:30 AM"]);
}

#[test]
fn final_partial_slot_is_dropped() {
    // 9:00-10:30 with 60-minute slots: the 10:00 slot would run past
    // closing, so only 9:00 remains.
    let catalog = SlotCatalog::new(t(9, 0), t(10, 30), 60);
    assert_eq!(catalog.labels(), &["9:00 AM"]);
}

#[test]
fn inverted_or_empty_hours_yield_no_slots() {
    assert!(SlotCatalog::new(t(17, 0), t(9, 0), 60).is_empty());
    assert!(SlotCatalog::new(t(9, 0), t(9, 0), 60).is_empty());
    assert!(SlotCatalog::new(t(9, 0), t(17, 0), 0).is_empty());
}

#[test]
fn catalog_from_stored_hours() {
    let hours = OperationalHours {
        opening_time: "08:30".to_string(),
        closing_time: "10:00".to_string(),
        slot_duration_minutes: 45,
    };
    let catalog = SlotCatalog::from_hours(&hours).expect("valid hours");
    assert_eq!(catalog.labels(), &["8:30 AM", "9:15 AM"]);

    let bad = OperationalHours {
        opening_time: "late".to_string(),
        closing_time: "10:00".to_string(),
        slot_duration_minutes: 45,
    };
    assert!(SlotCatalog::from_hours(&bad).is_err());
}

#[test]
fn toggling_operational_days_flips_membership() {
    let mut days = OperationalDays::from_days([Weekday::Mon, Weekday::Wed]);
    assert!(days.is_operational(Weekday::Mon));
    assert!(!days.is_operational(Weekday::Tues));

    days.toggle(Weekday::Tues);
    assert!(days.is_operational(Weekday::Tues));

    days.toggle(Weekday::Mon);
    assert!(!days.is_operational(Weekday::Mon));
}

#[test]
fn snapshot_is_ordered_by_grid_column() {
    let days = OperationalDays::from_days([Weekday::Sun, Weekday::Mon, Weekday::Fri]);
    assert_eq!(
        days.snapshot(),
        vec![Weekday::Mon, Weekday::Fri, Weekday::Sun]
    );
}
