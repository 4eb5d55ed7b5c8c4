use std::collections::BTreeSet;
use std::ops::Range;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

pub type Day = u32;

/// The enumerated and classified days of a single target month (§4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calendar {
    pub year: u16,
    pub month: u8,
    pub days: Vec<Day>,
    pub sundays: BTreeSet<Day>,
    pub saturdays: BTreeSet<Day>,
    pub special_saturdays: BTreeSet<Day>,
    pub weekdays: BTreeSet<Day>,
    /// Maximal day-ranges, each terminated at a Saturday or at the last
    /// day of the month. `weeks[i]` is a half-open `Range<Day>` usable to
    /// slice `days`.
    pub weeks: Vec<Range<Day>>,
    /// True iff day 1 of the month is not a Sunday, i.e. the first week
    /// partition shares days with the previous month's last week.
    pub cross_month_first_week: bool,
}

impl Calendar {
    pub fn new(year: u16, month: u8, saturday_is_special: bool) -> Self {
        let n = days_in_month(year, month);
        let days: Vec<Day> = (1..=n).collect();

        let mut sundays = BTreeSet::new();
        let mut saturdays = BTreeSet::new();
        for &d in &days {
            match weekday_of(year, month, d) {
                Weekday::Sun => {
                    sundays.insert(d);
                }
                Weekday::Sat => {
                    saturdays.insert(d);
                }
                _ => {}
            }
        }

        let special_saturdays = if saturday_is_special {
            saturdays.clone()
        } else {
            BTreeSet::new()
        };

        let weekdays: BTreeSet<Day> = days
            .iter()
            .copied()
            .filter(|d| !sundays.contains(d) && !special_saturdays.contains(d))
            .collect();

        let weeks = partition_weeks(&days, &saturdays);

        let first_day_weekday = weekday_of(year, month, 1);
        let cross_month_first_week = first_day_weekday != Weekday::Sun;

        Self {
            year,
            month,
            days,
            sundays,
            saturdays,
            special_saturdays,
            weekdays,
            weeks,
            cross_month_first_week,
        }
    }

    pub fn num_days(&self) -> Day {
        self.days.len() as Day
    }

    pub fn week_of(&self, day: Day) -> Option<usize> {
        self.weeks
            .iter()
            .position(|range| range.contains(&day))
    }

    pub fn is_weekend_target_day(&self, day: Day) -> bool {
        self.sundays.contains(&day) || self.special_saturdays.contains(&day)
    }
}

fn days_in_month(year: u16, month: u8) -> Day {
    let next_month_first = if month == 12 {
        NaiveDate::from_ymd_opt(year as i32 + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year as i32, month as u32 + 1, 1)
    }
    .expect("valid year/month");
    let this_month_first =
        NaiveDate::from_ymd_opt(year as i32, month as u32, 1).expect("valid year/month");
    (next_month_first - this_month_first).num_days() as Day
}

fn weekday_of(year: u16, month: u8, day: Day) -> Weekday {
    NaiveDate::from_ymd_opt(year as i32, month as u32, day)
        .expect("day within month")
        .weekday()
}

/// Split `days` into maximal runs, each ending at a Saturday or at the
/// final day of the month.
fn partition_weeks(days: &[Day], saturdays: &BTreeSet<Day>) -> Vec<Range<Day>> {
    let mut weeks = Vec::new();
    let mut start = days[0];
    for &d in days {
        if saturdays.contains(&d) || d == *days.last().unwrap() {
            weeks.push(start..(d + 1));
            start = d + 1;
        }
    }
    weeks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn february_2024_is_a_leap_month_of_29_days() {
        let cal = Calendar::new(2024, 2, true);
        assert_eq!(cal.num_days(), 29);
    }

    #[test]
    fn weekdays_excludes_sundays_and_special_saturdays() {
        let cal = Calendar::new(2024, 1, true);
        for d in &cal.sundays {
            assert!(!cal.weekdays.contains(d));
        }
        for d in &cal.special_saturdays {
            assert!(!cal.weekdays.contains(d));
        }
    }

    #[test]
    fn saturdays_are_not_special_when_disabled() {
        let cal = Calendar::new(2024, 1, false);
        assert!(cal.special_saturdays.is_empty());
        assert!(!cal.saturdays.is_empty());
        for d in &cal.saturdays {
            assert!(cal.weekdays.contains(d));
        }
    }

    #[test]
    fn weeks_partition_the_full_month_with_no_gaps() {
        let cal = Calendar::new(2024, 1, true);
        let mut covered: Vec<Day> = cal.weeks.iter().flat_map(|r| r.clone()).collect();
        covered.sort_unstable();
        assert_eq!(covered, cal.days);
    }

    #[test]
    fn every_week_except_possibly_the_last_ends_on_a_saturday() {
        let cal = Calendar::new(2024, 1, true);
        let last_week_idx = cal.weeks.len() - 1;
        for (idx, week) in cal.weeks.iter().enumerate() {
            let last_day_of_week = week.end - 1;
            if idx != last_week_idx {
                assert!(cal.saturdays.contains(&last_day_of_week));
            }
        }
    }

    #[test]
    fn cross_month_first_week_true_when_month_does_not_start_sunday() {
        // January 1 2024 is a Monday.
        let cal = Calendar::new(2024, 1, true);
        assert!(cal.cross_month_first_week);
    }

    #[test]
    fn cross_month_first_week_false_when_month_starts_sunday() {
        // September 1 2024 is a Sunday.
        let cal = Calendar::new(2024, 9, true);
        assert!(!cal.cross_month_first_week);
    }
}
