//! C7 Violation Reporter: walks every rule in §4.4 against the final,
//! frozen assignment and emits a structured record wherever the
//! deviation is nonzero. Purely additive — it never touches the
//! assignment it reads.

use std::collections::HashMap;

use crate::assignment::Assignment;
use crate::calendar::{Calendar, Day};
use crate::config::{DayType, EventUnits, RuleConfig, Targets};
use crate::requests::{RequestWarning, ResolvedRequests};
use crate::staff::{Profession, RoleTag, Staff, StaffId};
use crate::taxonomy::SymbolTaxonomy;

/// (rule-id, staff or `-`, day or `-`, highlighted days, detail) — §3.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub rule: &'static str,
    pub staff: Option<StaffId>,
    pub day: Option<Day>,
    pub highlighted_days: Vec<Day>,
    pub detail: String,
}

impl Violation {
    fn new(rule: &'static str, detail: impl Into<String>) -> Self {
        Self {
            rule,
            staff: None,
            day: None,
            highlighted_days: Vec::new(),
            detail: detail.into(),
        }
    }

    fn with_staff(mut self, staff: StaffId) -> Self {
        self.staff = Some(staff);
        self
    }

    fn with_day(mut self, day: Day) -> Self {
        self.day = Some(day);
        self
    }

    fn with_highlighted(mut self, days: Vec<Day>) -> Self {
        self.highlighted_days = days;
        self
    }
}

pub struct ViolationReporter<'a> {
    pub staff: &'a [Staff],
    pub calendar: &'a Calendar,
    pub requests: &'a ResolvedRequests,
    pub taxonomy: &'a SymbolTaxonomy,
    pub config: &'a RuleConfig,
    pub targets: &'a Targets,
    pub event_units: &'a EventUnits,
    pub previous_last_week_holidays: &'a HashMap<StaffId, f32>,
}

impl<'a> ViolationReporter<'a> {
    pub fn report(&self, assignment: &Assignment) -> Vec<Violation> {
        let mut violations = Vec::new();
        violations.extend(self.e1_part_time_fix(assignment));
        violations.extend(self.p1_monthly_holiday_target(assignment));
        violations.extend(self.p2_strict_leave(assignment));
        violations.extend(self.p3_manager_presence(assignment));
        violations.extend(self.p4_weekend_caps(assignment));
        violations.extend(self.p5_sunday_second_step(assignment));
        violations.extend(self.p6_weak_leave(assignment));
        violations.extend(self.p7_weekly_rest(assignment));
        violations.extend(self.p8_weekend_headcount(assignment));
        violations.extend(self.p9_outpatient_coabsence(assignment));
        violations.extend(self.p10_recovery_ward_coverage(assignment));
        violations.extend(self.p11_workload_leveling(assignment));
        violations.extend(self.p12_consecutive_cap(assignment));
        violations.extend(self.warnings());
        violations
    }

    fn e1_part_time_fix(&self, assignment: &Assignment) -> Vec<Violation> {
        let mut out = Vec::new();
        for (idx, staff) in self.staff.iter().enumerate() {
            if !staff.is_part_time() {
                continue;
            }
            for &day in &self.calendar.days {
                let Some(behavior) = self.requests.role_of(idx, day).and_then(|r| self.taxonomy.behavior(r)) else {
                    continue;
                };
                let expected = if behavior.is_strict_holiday() {
                    Some(false)
                } else if behavior.is_strict_work() {
                    Some(true)
                } else {
                    None
                };
                if let Some(expected) = expected {
                    if assignment.get(idx, day) != expected {
                        out.push(
                            Violation::new("E1", format!("part-time fix broken: expected {expected}"))
                                .with_staff(staff.id.clone())
                                .with_day(day),
                        );
                    }
                }
            }
        }
        out
    }

    fn p1_monthly_holiday_target(&self, assignment: &Assignment) -> Vec<Violation> {
        let mut out = Vec::new();
        for (idx, staff) in self.staff.iter().enumerate() {
            if staff.is_part_time() {
                continue;
            }
            let mut excluded_count = 0i32;
            let mut half_count = 0i32;
            for &day in &self.calendar.days {
                let Some(behavior) = self.requests.role_of(idx, day).and_then(|r| self.taxonomy.behavior(r)) else {
                    continue;
                };
                if behavior.excluded_from_monthly_count {
                    excluded_count += 1;
                }
                if behavior.is_half_holiday() {
                    half_count += 1;
                }
            }
            let full_holidays =
                self.calendar.days.iter().filter(|&&d| !assignment.get(idx, d)).count() as i32;
            let value = 2 * (full_holidays - excluded_count) + half_count;
            let deviation = (value - 18).abs();
            if deviation != 0 {
                out.push(
                    Violation::new("H1", format!("monthly holiday value {value}, target 18 (off by {deviation})"))
                        .with_staff(staff.id.clone()),
                );
            }
        }
        out
    }

    fn p2_strict_leave(&self, assignment: &Assignment) -> Vec<Violation> {
        let mut out = Vec::new();
        for (idx, staff) in self.staff.iter().enumerate() {
            if staff.is_part_time() {
                continue;
            }
            for &day in &self.calendar.days {
                let Some(behavior) = self.requests.role_of(idx, day).and_then(|r| self.taxonomy.behavior(r)) else {
                    continue;
                };
                if !behavior.strict {
                    continue;
                }
                let broken = if behavior.is_strict_holiday() {
                    assignment.get(idx, day)
                } else {
                    !assignment.get(idx, day)
                };
                if broken {
                    out.push(
                        Violation::new("H2", "strict request not honored")
                            .with_staff(staff.id.clone())
                            .with_day(day),
                    );
                }
            }
        }
        out
    }

    fn p3_manager_presence(&self, assignment: &Assignment) -> Vec<Violation> {
        let mut out = Vec::new();
        let managers: Vec<usize> = self
            .staff
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_manager)
            .map(|(idx, _)| idx)
            .collect();
        for &day in &self.calendar.days {
            let present = managers.iter().any(|&idx| assignment.get(idx, day));
            if !present {
                out.push(Violation::new("H3", "no manager assigned").with_day(day));
            }
        }
        out
    }

    fn p4_weekend_caps(&self, assignment: &Assignment) -> Vec<Violation> {
        let mut out = Vec::new();
        for (idx, staff) in self.staff.iter().enumerate() {
            if staff.is_part_time() {
                continue;
            }
            let caps = staff.weekend_caps;
            let sunday_count =
                self.calendar.sundays.iter().filter(|&&d| assignment.get(idx, d)).count() as i32;
            let special_saturday_count = self
                .calendar
                .special_saturdays
                .iter()
                .filter(|&&d| assignment.get(idx, d))
                .count() as i32;

            if let Some(cap) = caps.weekend_cap {
                let actual = sunday_count + special_saturday_count;
                if actual - cap as i32 > 0 {
                    out.push(
                        Violation::new(
                            "H5",
                            format!("combined weekend cap: configured {cap}, actual {actual}"),
                        )
                        .with_staff(staff.id.clone()),
                    );
                }
                continue;
            }
            if let Some(cap) = caps.sunday_cap {
                if sunday_count - cap as i32 > 0 {
                    out.push(
                        Violation::new(
                            "H5",
                            format!("sunday cap: configured {cap}, actual {sunday_count}"),
                        )
                        .with_staff(staff.id.clone()),
                    );
                }
            }
            if let Some(cap) = caps.saturday_cap {
                if special_saturday_count - cap as i32 > 0 {
                    out.push(
                        Violation::new(
                            "H5",
                            format!("saturday cap: configured {cap}, actual {special_saturday_count}"),
                        )
                        .with_staff(staff.id.clone()),
                    );
                }
            }
        }
        out
    }

    fn p5_sunday_second_step(&self, assignment: &Assignment) -> Vec<Violation> {
        let mut out = Vec::new();
        for (idx, staff) in self.staff.iter().enumerate() {
            if staff.is_part_time() {
                continue;
            }
            let Some(cap) = staff.weekend_caps.sunday_cap else {
                continue;
            };
            if cap < 3 {
                continue;
            }
            let sunday_count =
                self.calendar.sundays.iter().filter(|&&d| assignment.get(idx, d)).count() as i32;
            let over = sunday_count - 2;
            if over > 0 {
                out.push(
                    Violation::new("S0b", format!("used {sunday_count} sundays, past the discouraged floor of 2"))
                        .with_staff(staff.id.clone()),
                );
            }
        }
        out
    }

    fn p6_weak_leave(&self, assignment: &Assignment) -> Vec<Violation> {
        let mut out = Vec::new();
        for (idx, staff) in self.staff.iter().enumerate() {
            for &day in &self.calendar.days {
                let Some(behavior) = self.requests.role_of(idx, day).and_then(|r| self.taxonomy.behavior(r)) else {
                    continue;
                };
                if behavior.is_weak_holiday() && assignment.get(idx, day) {
                    out.push(
                        Violation::new("S4", "weak holiday request overridden to work")
                            .with_staff(staff.id.clone())
                            .with_day(day),
                    );
                }
            }
        }
        out
    }

    fn p7_weekly_rest(&self, assignment: &Assignment) -> Vec<Violation> {
        let mut out = Vec::new();
        for (w_idx, week) in self.calendar.weeks.iter().enumerate() {
            let week_days: Vec<Day> = week.clone().collect();
            let is_cross_month_first_week = w_idx == 0 && self.calendar.cross_month_first_week;

            for (idx, staff) in self.staff.iter().enumerate() {
                if staff.is_part_time() {
                    continue;
                }
                let full_requests_in_week = week_days
                    .iter()
                    .filter(|&&d| {
                        self.requests
                            .role_of(idx, d)
                            .and_then(|r| self.taxonomy.behavior(r))
                            .is_some_and(|b| b.is_full_holiday())
                    })
                    .count();
                if full_requests_in_week >= 3 {
                    continue;
                }

                let full_holidays = week_days.iter().filter(|&&d| !assignment.get(idx, d)).count() as i32;
                let half_worked = week_days
                    .iter()
                    .filter(|&&d| {
                        assignment.get(idx, d)
                            && self
                                .requests
                                .role_of(idx, d)
                                .and_then(|r| self.taxonomy.behavior(r))
                                .is_some_and(|b| b.is_half_holiday())
                    })
                    .count() as i32;
                let mut value = 2 * full_holidays + half_worked;

                let threshold = if is_cross_month_first_week {
                    let carry = self
                        .previous_last_week_holidays
                        .get(&staff.id)
                        .copied()
                        .unwrap_or(0.0);
                    value += (2.0 * carry).round() as i32;
                    3
                } else if week_days.len() == 7 {
                    3
                } else {
                    1
                };

                if value < threshold {
                    out.push(
                        Violation::new("S0", format!("week value {value} below threshold {threshold}"))
                            .with_staff(staff.id.clone())
                            .with_highlighted(week_days.clone()),
                    );
                }
            }
        }
        out
    }

    fn p8_weekend_headcount(&self, assignment: &Assignment) -> Vec<Violation> {
        let mut out = Vec::new();
        out.extend(self.p8_for_days(assignment, &self.calendar.sundays.iter().copied().collect::<Vec<_>>(), DayType::Sunday));
        out.extend(self.p8_for_days(
            assignment,
            &self.calendar.special_saturdays.iter().copied().collect::<Vec<_>>(),
            DayType::SpecialSaturday,
        ));
        out
    }

    fn p8_for_days(&self, assignment: &Assignment, days: &[Day], day_type: DayType) -> Vec<Violation> {
        let mut out = Vec::new();
        let targets = self.targets.for_day_type(day_type);
        let tolerance = self.config.p8_weekend_headcount.tolerance;

        let by_profession = |profession: Profession| -> Vec<usize> {
            self.staff
                .iter()
                .enumerate()
                .filter(|(_, s)| s.profession == profession)
                .map(|(idx, _)| idx)
                .collect()
        };
        let pt = by_profession(Profession::Pt);
        let ot = by_profession(Profession::Ot);
        let st = by_profession(Profession::St);

        for &day in days {
            let n_pt = pt.iter().filter(|&&idx| assignment.get(idx, day)).count() as i32;
            let n_ot = ot.iter().filter(|&&idx| assignment.get(idx, day)).count() as i32;
            let n_st = st.iter().filter(|&&idx| assignment.get(idx, day)).count() as i32;

            let combined_dev = (n_pt + n_ot - (targets.pt + targets.ot)).abs();
            if combined_dev != 0 {
                out.push(
                    Violation::new("S1a", format!("PT+OT headcount {}, target {} (off by {combined_dev})", n_pt + n_ot, targets.pt + targets.ot))
                        .with_day(day),
                );
            }
            let pt_dev = (n_pt - targets.pt).abs() - tolerance;
            if pt_dev > 0 {
                out.push(Violation::new("S1b", format!("PT headcount {n_pt}, target {} +/- {tolerance}", targets.pt)).with_day(day));
            }
            let ot_dev = (n_ot - targets.ot).abs() - tolerance;
            if ot_dev > 0 {
                out.push(Violation::new("S1b", format!("OT headcount {n_ot}, target {} +/- {tolerance}", targets.ot)).with_day(day));
            }
            let st_dev = (n_st - targets.st).abs();
            if st_dev != 0 {
                out.push(Violation::new("S1c", format!("ST headcount {n_st}, target {}", targets.st)).with_day(day));
            }
        }
        out
    }

    fn p9_outpatient_coabsence(&self, assignment: &Assignment) -> Vec<Violation> {
        let mut out = Vec::new();
        let outpatient_pt: Vec<usize> = self
            .staff
            .iter()
            .enumerate()
            .filter(|(_, s)| s.role_tag == Some(RoleTag::OutpatientPt))
            .map(|(idx, _)| idx)
            .collect();
        if outpatient_pt.is_empty() {
            return out;
        }
        for &day in &self.calendar.days {
            let off_count = outpatient_pt.iter().filter(|&&idx| !assignment.get(idx, day)).count() as i32;
            if off_count > 1 {
                out.push(Violation::new("S3", format!("{off_count} outpatient PT off together")).with_day(day));
            }
        }
        out
    }

    fn p10_recovery_ward_coverage(&self, assignment: &Assignment) -> Vec<Violation> {
        let mut out = Vec::new();
        let pt: Vec<usize> = self
            .staff
            .iter()
            .enumerate()
            .filter(|(_, s)| s.role_tag == Some(RoleTag::RecoveryWardPt))
            .map(|(idx, _)| idx)
            .collect();
        let ot: Vec<usize> = self
            .staff
            .iter()
            .enumerate()
            .filter(|(_, s)| s.role_tag == Some(RoleTag::RecoveryWardOt))
            .map(|(idx, _)| idx)
            .collect();
        if pt.is_empty() && ot.is_empty() {
            return out;
        }
        for &day in &self.calendar.days {
            let pt_present = pt.iter().any(|&idx| assignment.get(idx, day));
            let ot_present = ot.iter().any(|&idx| assignment.get(idx, day));
            if !pt.is_empty() && !pt_present {
                out.push(Violation::new("S5", "no recovery-ward PT assigned").with_day(day));
            }
            if !ot.is_empty() && !ot_present {
                out.push(Violation::new("S5", "no recovery-ward OT assigned").with_day(day));
            }
            if !pt_present && !ot_present {
                out.push(Violation::new("S5", "neither recovery-ward PT nor OT assigned (hard constraint breach)").with_day(day));
            }
        }
        out
    }

    /// P11 (S6) — re-derives each profession's apportioned event load and
    /// target residual exactly as `rules::workload_leveling::build` does,
    /// then reports every weekday whose delivered-units deviation from
    /// that target is nonzero.
    fn p11_workload_leveling(&self, assignment: &Assignment) -> Vec<Violation> {
        let mut out = Vec::new();
        let weekdays: Vec<Day> = self.calendar.weekdays.iter().copied().collect();
        if weekdays.is_empty() {
            return out;
        }

        let members_of = |profession: Profession| -> Vec<usize> {
            self.staff
                .iter()
                .enumerate()
                .filter(|(_, s)| s.profession == profession)
                .map(|(idx, _)| idx)
                .collect()
        };

        let monthly_capacity = |member_indices: &[usize]| -> f32 {
            member_indices
                .iter()
                .map(|&idx| {
                    let staff = &self.staff[idx];
                    let holiday_weekdays = weekdays
                        .iter()
                        .filter(|&&d| {
                            self.requests
                                .role_of(idx, d)
                                .and_then(|r| self.taxonomy.behavior(r))
                                .is_some_and(|b| b.is_holiday)
                        })
                        .count();
                    let r_s = holiday_weekdays as f32 / weekdays.len() as f32;
                    staff.daily_unit_capacity as f32 * (1.0 - r_s)
                })
                .sum()
        };

        let members: HashMap<Profession, Vec<usize>> =
            Profession::ALL.iter().map(|&p| (p, members_of(p))).collect();
        let capacities: HashMap<Profession, f32> =
            Profession::ALL.iter().map(|&p| (p, monthly_capacity(&members[&p]))).collect();
        let total_capacity: f32 = capacities.values().sum();

        let weekday_sum = |map: &HashMap<Day, i32>| -> f32 { weekdays.iter().map(|d| *map.get(d).unwrap_or(&0) as f32).sum() };
        let total_event_units_all = weekday_sum(&self.event_units.all);

        for &profession in &Profession::ALL {
            let member_indices = &members[&profession];
            if member_indices.is_empty() {
                continue;
            }
            let capacity = capacities[&profession];
            let ratio = if total_capacity > 0.0 { capacity / total_capacity } else { 0.0 };

            let event_units_for_profession = match profession {
                Profession::Pt => &self.event_units.pt,
                Profession::Ot => &self.event_units.ot,
                Profession::St => &self.event_units.st,
            };
            let total_event_units_job = weekday_sum(event_units_for_profession);
            let total_event_units = total_event_units_job + ratio * total_event_units_all;
            let avg_residual = (capacity - total_event_units) / weekdays.len() as f32;

            for &day in &weekdays {
                let delivered: i32 = member_indices
                    .iter()
                    .filter(|&&idx| assignment.get(idx, day))
                    .map(|&idx| (self.staff[idx].daily_unit_capacity as f32 * self.requests.coef_of(idx, day).as_f32()).round() as i32)
                    .sum();

                let event_for_day = event_units_for_profession.get(&day).copied().unwrap_or(0) as f32
                    + ratio * self.event_units.all.get(&day).copied().unwrap_or(0) as f32;
                let residual = delivered - event_for_day.round() as i32;
                let deviation = residual - avg_residual.round() as i32;

                if deviation != 0 {
                    out.push(
                        Violation::new("S6", format!("{profession} delivered {delivered} units, residual {deviation} off its monthly average"))
                            .with_day(day),
                    );
                }
            }
        }
        out
    }

    fn p12_consecutive_cap(&self, assignment: &Assignment) -> Vec<Violation> {
        const WINDOW: Day = 6;
        let mut out = Vec::new();
        let num_days = self.calendar.num_days();
        if num_days < WINDOW {
            return out;
        }
        for (idx, staff) in self.staff.iter().enumerate() {
            if staff.is_part_time() {
                continue;
            }
            for start in 1..=(num_days - WINDOW + 1) {
                let window: Vec<Day> = (start..start + WINDOW).collect();
                if window.iter().all(|&d| assignment.get(idx, d)) {
                    out.push(
                        Violation::new("S7", "six consecutive workdays")
                            .with_staff(staff.id.clone())
                            .with_highlighted(window),
                    );
                }
            }
        }
        out
    }

    fn warnings(&self) -> Vec<Violation> {
        self.requests
            .warnings
            .iter()
            .map(|w| match w {
                RequestWarning::UnknownInputSymbol { staff, day, symbol } => {
                    Violation::new("WARN", format!("unknown input symbol '{symbol}' ignored"))
                        .with_staff(staff.clone())
                        .with_day(*day)
                }
                RequestWarning::UnknownStaff { staff } => {
                    Violation::new("WARN", "request row references unknown staff, dropped").with_staff(staff.clone())
                }
            })
            .collect()
    }
}
