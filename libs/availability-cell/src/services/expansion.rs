// libs/availability-cell/src/services/expansion.rs
use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate, NaiveTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{
    DateRange, DayOfWeek, RecurringScheduleEntry, SlotCandidate, SlotGranularity, SlotKey,
};

/// Slices `[start, end)` into back-to-back intervals of `granularity`.
///
/// An interval is only produced when it ends at or before `end`, so a trailing
/// remainder shorter than the granularity is dropped. Intervals that would run
/// past midnight are dropped as well.
pub fn slice_window(
    start: NaiveTime,
    end: NaiveTime,
    granularity: SlotGranularity,
) -> Vec<(NaiveTime, NaiveTime)> {
    let step = granularity.as_duration();
    let mut slices = Vec::new();
    let mut current = start;

    while current < end {
        let (next, wrapped_seconds) = current.overflowing_add_signed(step);
        if wrapped_seconds != 0 || next > end {
            break;
        }
        slices.push((current, next));
        current = next;
    }

    slices
}

/// Expands recurring weekly schedules into concrete slots for every date in
/// `range`, skipping `holidays`.
///
/// The result is sorted by `(doctor_id, slot_date, start_time)` and contains
/// at most one candidate per key, so overlapping entries that produce the
/// same start time collapse into a single slot.
pub fn expand_slots(
    schedules: &[RecurringScheduleEntry],
    range: &DateRange,
    granularity: SlotGranularity,
    holidays: &BTreeSet<NaiveDate>,
) -> Vec<SlotCandidate> {
    let mut by_day: HashMap<DayOfWeek, Vec<&RecurringScheduleEntry>> = HashMap::new();
    for entry in schedules {
        if entry.start_time >= entry.end_time {
            warn!(
                "Skipping malformed schedule {} for doctor {}: {} >= {}",
                entry.id, entry.doctor_id, entry.start_time, entry.end_time
            );
            continue;
        }
        by_day.entry(entry.day_of_week).or_default().push(entry);
    }

    let mut candidates: BTreeMap<SlotKey, SlotCandidate> = BTreeMap::new();

    for date in range.days() {
        if holidays.contains(&date) {
            debug!("Skipping holiday {}", date);
            continue;
        }

        let Some(entries) = by_day.get(&DayOfWeek::from(date.weekday())) else {
            continue;
        };

        for entry in entries {
            for (start_time, end_time) in slice_window(entry.start_time, entry.end_time, granularity) {
                let candidate = SlotCandidate {
                    doctor_id: entry.doctor_id,
                    slot_date: date,
                    start_time,
                    end_time,
                };
                candidates.entry(candidate.key()).or_insert(candidate);
            }
        }
    }

    debug!(
        "Expanded {} schedules into {} slots for {} to {}",
        schedules.len(),
        candidates.len(),
        range.start(),
        range.end()
    );

    candidates.into_values().collect()
}

/// Groups schedule entries per doctor so each doctor can be expanded and
/// persisted independently.
pub fn group_by_doctor(
    schedules: Vec<RecurringScheduleEntry>,
) -> BTreeMap<Uuid, Vec<RecurringScheduleEntry>> {
    let mut grouped: BTreeMap<Uuid, Vec<RecurringScheduleEntry>> = BTreeMap::new();
    for entry in schedules {
        grouped.entry(entry.doctor_id).or_default().push(entry);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn entry(doctor_id: Uuid, day: DayOfWeek, start: NaiveTime, end: NaiveTime) -> RecurringScheduleEntry {
        RecurringScheduleEntry {
            id: Uuid::new_v4(),
            doctor_id,
            day_of_week: day,
            start_time: start,
            end_time: end,
        }
    }

    // 2030-01-07 is a Monday.
    fn monday() -> NaiveDate {
        d(2030, 1, 7)
    }

    #[test]
    fn test_trailing_remainder_is_dropped() {
        let slices = slice_window(t(9, 0), t(10, 15), SlotGranularity::default());

        assert_eq!(slices, vec![(t(9, 0), t(9, 30)), (t(9, 30), t(10, 0))]);
    }

    #[test]
    fn test_slice_count_is_floor_of_window_over_granularity() {
        let cases = [
            (t(8, 0), t(12, 0), 30, 8),
            (t(8, 0), t(12, 10), 45, 5),
            (t(13, 0), t(13, 59), 60, 0),
            (t(0, 0), t(23, 59), 60, 23),
            (t(9, 0), t(9, 7), 1, 7),
        ];

        for (start, end, minutes, expected) in cases {
            let granularity = SlotGranularity::from_minutes(minutes).unwrap();
            let slices = slice_window(start, end, granularity);

            assert_eq!(slices.len(), expected, "{}-{} @ {}", start, end, minutes);
            for (index, (slot_start, slot_end)) in slices.iter().enumerate() {
                assert_eq!(*slot_end - *slot_start, granularity.as_duration());
                if index > 0 {
                    assert_eq!(slices[index - 1].1, *slot_start, "slices must be contiguous");
                }
            }
        }
    }

    #[test]
    fn test_empty_window_yields_nothing() {
        assert!(slice_window(t(9, 0), t(9, 0), SlotGranularity::default()).is_empty());
        assert!(slice_window(t(10, 0), t(9, 0), SlotGranularity::default()).is_empty());
    }

    #[test]
    fn test_slice_never_wraps_past_midnight() {
        let granularity = SlotGranularity::from_minutes(90).unwrap();
        let slices = slice_window(t(22, 0), NaiveTime::from_hms_opt(23, 59, 59).unwrap(), granularity);

        assert_eq!(slices, vec![(t(22, 0), t(23, 30))]);
    }

    #[test]
    fn test_monday_only_schedule_over_a_week_hits_one_date() {
        let doctor = Uuid::new_v4();
        let schedules = vec![entry(doctor, DayOfWeek::Monday, t(9, 0), t(10, 15))];
        let range = DateRange::new(monday() - Duration::days(3), monday() + Duration::days(3)).unwrap();

        let slots = expand_slots(&schedules, &range, SlotGranularity::default(), &BTreeSet::new());

        assert_eq!(slots.len(), 2);
        assert!(slots.iter().all(|slot| slot.slot_date == monday()));
        assert_eq!(slots[0].start_time, t(9, 0));
        assert_eq!(slots[1].end_time, t(10, 0));
    }

    #[test]
    fn test_duplicate_entries_collapse() {
        let doctor = Uuid::new_v4();
        let schedules = vec![
            entry(doctor, DayOfWeek::Monday, t(9, 0), t(11, 0)),
            entry(doctor, DayOfWeek::Monday, t(9, 0), t(11, 0)),
            entry(doctor, DayOfWeek::Monday, t(10, 0), t(12, 0)),
        ];
        let range = DateRange::new(monday(), monday()).unwrap();

        let slots = expand_slots(&schedules, &range, SlotGranularity::default(), &BTreeSet::new());

        let starts: Vec<NaiveTime> = slots.iter().map(|slot| slot.start_time).collect();
        assert_eq!(starts, vec![t(9, 0), t(9, 30), t(10, 0), t(10, 30), t(11, 0), t(11, 30)]);
    }

    #[test]
    fn test_output_sorted_and_keys_unique() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let schedules = vec![
            entry(second, DayOfWeek::Tuesday, t(14, 0), t(15, 0)),
            entry(first, DayOfWeek::Monday, t(9, 0), t(10, 0)),
            entry(first, DayOfWeek::Tuesday, t(8, 0), t(9, 0)),
        ];
        let range = DateRange::new(monday(), monday() + Duration::days(13)).unwrap();

        let slots = expand_slots(&schedules, &range, SlotGranularity::default(), &BTreeSet::new());

        let keys: Vec<SlotKey> = slots.iter().map(SlotCandidate::key).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(keys, sorted);
        assert_eq!(slots.len(), 12);
    }

    #[test]
    fn test_holidays_are_skipped() {
        let doctor = Uuid::new_v4();
        let schedules = vec![entry(doctor, DayOfWeek::Monday, t(9, 0), t(10, 0))];
        let range = DateRange::new(monday(), monday() + Duration::days(7)).unwrap();
        let holidays: BTreeSet<NaiveDate> = [monday()].into_iter().collect();

        let slots = expand_slots(&schedules, &range, SlotGranularity::default(), &holidays);

        assert_eq!(slots.len(), 2);
        assert!(slots.iter().all(|slot| slot.slot_date == monday() + Duration::days(7)));
    }

    #[test]
    fn test_overlapping_ranges_yield_the_same_slot_set() {
        let doctor = Uuid::new_v4();
        let schedules = vec![
            entry(doctor, DayOfWeek::Monday, t(9, 0), t(12, 0)),
            entry(doctor, DayOfWeek::Wednesday, t(13, 0), t(15, 0)),
        ];
        let granularity = SlotGranularity::default();
        let none = BTreeSet::new();

        let whole = DateRange::new(monday(), monday() + Duration::days(9)).unwrap();
        let first = DateRange::new(monday(), monday() + Duration::days(5)).unwrap();
        let second = DateRange::new(monday() + Duration::days(2), monday() + Duration::days(9)).unwrap();

        let expected: BTreeSet<SlotKey> = expand_slots(&schedules, &whole, granularity, &none)
            .iter()
            .map(SlotCandidate::key)
            .collect();
        let merged: BTreeSet<SlotKey> = expand_slots(&schedules, &first, granularity, &none)
            .into_iter()
            .chain(expand_slots(&schedules, &second, granularity, &none))
            .map(|slot| slot.key())
            .collect();

        assert_eq!(merged, expected);
    }

    #[test]
    fn test_group_by_doctor() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let grouped = group_by_doctor(vec![
            entry(first, DayOfWeek::Monday, t(9, 0), t(10, 0)),
            entry(second, DayOfWeek::Monday, t(9, 0), t(10, 0)),
            entry(first, DayOfWeek::Friday, t(9, 0), t(10, 0)),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&first].len(), 2);
        assert_eq!(grouped[&second].len(), 1);
    }
}
