//! C6 Local-Search Improver (spec §4.5): after C5 produces a feasible
//! assignment, hill-climb a cheap secondary objective — the population
//! standard deviation of per-weekday headcount, per profession — by
//! swapping a staff's peak-day shift for a trough-day shift within the
//! same week, so long as the swap never regresses an invariant C4
//! already enforced.
//!
//! This mirrors the rule modules' habit of recomputing a rule's formula
//! directly against a concrete assignment rather than against `LinearExpr`
//! (there is no model here — C6 runs after the solver, on plain data).

use std::collections::HashMap;

use crate::assignment::Assignment;
use crate::calendar::{Calendar, Day};
use crate::config::ImproverConfig;
use crate::requests::ResolvedRequests;
use crate::staff::{Profession, Staff, StaffId};
use crate::taxonomy::SymbolTaxonomy;

const CONSECUTIVE_WINDOW: Day = 6;
const FULL_WEEK_THRESHOLD: i32 = 3;
const SHORT_WEEK_THRESHOLD: i32 = 1;

/// One committed peak→trough swap, kept for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub staff_idx: usize,
    pub peak_day: Day,
    pub trough_day: Day,
}

pub struct Improver<'a> {
    pub staff: &'a [Staff],
    pub calendar: &'a Calendar,
    pub requests: &'a ResolvedRequests,
    pub taxonomy: &'a SymbolTaxonomy,
    pub improver_config: &'a ImproverConfig,
    pub previous_last_week_holidays: &'a HashMap<StaffId, f32>,
}

impl<'a> Improver<'a> {
    /// Runs the bounded hill-climb in place, returning every committed
    /// move in the order it was applied.
    pub fn improve(&self, assignment: &mut Assignment) -> Vec<Move> {
        let mut moves = Vec::new();
        let mut best = self.secondary_score(assignment);

        for _ in 0..self.improver_config.max_outer_iterations {
            let mut committed_this_iteration = false;

            for (w_idx, week) in self.calendar.weeks.clone().into_iter().enumerate() {
                let week_weekdays: Vec<Day> = week
                    .clone()
                    .filter(|d| self.calendar.weekdays.contains(d))
                    .collect();
                if week_weekdays.len() < 2 {
                    continue;
                }

                for &profession in &Profession::ALL {
                    let members: Vec<usize> = self
                        .staff
                        .iter()
                        .enumerate()
                        .filter(|(_, s)| s.profession == profession)
                        .map(|(idx, _)| idx)
                        .collect();
                    if members.is_empty() {
                        continue;
                    }

                    let counts: Vec<(Day, usize)> = week_weekdays
                        .iter()
                        .map(|&d| (d, members.iter().filter(|&&s| assignment.get(s, d)).count()))
                        .collect();
                    let &(d_max, max_count) = counts.iter().max_by_key(|&&(_, c)| c).unwrap();
                    let &(d_min, min_count) = counts.iter().min_by_key(|&&(_, c)| c).unwrap();
                    if max_count <= min_count + 1 {
                        continue;
                    }

                    for &s in &members {
                        if !assignment.get(s, d_max) || assignment.get(s, d_min) {
                            continue;
                        }
                        if self.staff[s].is_part_time() {
                            continue;
                        }
                        let trough_is_weak = self
                            .requests
                            .role_of(s, d_min)
                            .and_then(|r| self.taxonomy.behavior(r))
                            .is_some_and(|b| b.is_weak_holiday());
                        let trough_has_no_role = self.requests.role_of(s, d_min).is_none();
                        if !(trough_has_no_role || trough_is_weak) {
                            continue;
                        }
                        let peak_is_strict_work = self
                            .requests
                            .role_of(s, d_max)
                            .and_then(|r| self.taxonomy.behavior(r))
                            .is_some_and(|b| b.is_strict_work());
                        if peak_is_strict_work {
                            continue;
                        }

                        assignment.set(s, d_max, false);
                        assignment.set(s, d_min, true);

                        if !self.move_is_safe(assignment, s, w_idx, &week, d_max, d_min) {
                            assignment.set(s, d_max, true);
                            assignment.set(s, d_min, false);
                            continue;
                        }

                        let move_cost = if trough_is_weak { self.improver_config.w_tri } else { 0 };
                        let trial_score = self.secondary_score(assignment);

                        if trial_score + move_cost < best {
                            best = trial_score;
                            moves.push(Move {
                                staff_idx: s,
                                peak_day: d_max,
                                trough_day: d_min,
                            });
                            committed_this_iteration = true;
                            break;
                        } else {
                            assignment.set(s, d_max, true);
                            assignment.set(s, d_min, false);
                        }
                    }
                }
            }

            if !committed_this_iteration {
                break;
            }
        }

        moves
    }

    /// Population standard deviation of per-weekday headcount, summed
    /// over professions (spec §4.5 "secondary objective (cheap)").
    fn secondary_score(&self, assignment: &Assignment) -> f64 {
        let weekdays: Vec<Day> = self.calendar.weekdays.iter().copied().collect();
        if weekdays.is_empty() {
            return 0.0;
        }

        Profession::ALL
            .iter()
            .map(|&profession| {
                let members: Vec<usize> = self
                    .staff
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.profession == profession)
                    .map(|(idx, _)| idx)
                    .collect();
                if members.is_empty() {
                    return 0.0;
                }
                let counts: Vec<f64> = weekdays
                    .iter()
                    .map(|&d| members.iter().filter(|&&s| assignment.get(s, d)).count() as f64)
                    .collect();
                population_stddev(&counts)
            })
            .sum()
    }

    /// `move_is_safe` (spec §4.5): the tentative swap has already been
    /// applied to `assignment`; this returns whether it may stand. The
    /// trough day only ever gains coverage, so only the peak day's
    /// manager/recovery-ward presence needs re-checking.
    fn move_is_safe(
        &self,
        assignment: &Assignment,
        s: usize,
        week_idx: usize,
        week: &std::ops::Range<Day>,
        peak_day: Day,
        _trough_day: Day,
    ) -> bool {
        let staff = &self.staff[s];
        if staff.is_part_time() {
            return false;
        }

        if staff.is_manager {
            let any_manager_on_peak = self
                .staff
                .iter()
                .enumerate()
                .any(|(idx, st)| st.is_manager && assignment.get(idx, peak_day));
            if !any_manager_on_peak {
                return false;
            }
        }

        if staff.role_tag == Some(crate::staff::RoleTag::RecoveryWardPt) {
            let any_pt_on_peak = self.staff.iter().enumerate().any(|(idx, st)| {
                st.role_tag == Some(crate::staff::RoleTag::RecoveryWardPt) && assignment.get(idx, peak_day)
            });
            if !any_pt_on_peak {
                return false;
            }
        }
        if staff.role_tag == Some(crate::staff::RoleTag::RecoveryWardOt) {
            let any_ot_on_peak = self.staff.iter().enumerate().any(|(idx, st)| {
                st.role_tag == Some(crate::staff::RoleTag::RecoveryWardOt) && assignment.get(idx, peak_day)
            });
            if !any_ot_on_peak {
                return false;
            }
        }

        if !self.weekly_rest_still_met(assignment, s, week_idx, week) {
            return false;
        }

        if self.has_six_day_run(assignment, s) {
            return false;
        }

        true
    }

    /// Re-evaluates P7's threshold for `s` in the touched week, honoring
    /// the same "fewer than three full-day requests" exemption the rule
    /// itself applies, and the cross-month carry-in for the first week.
    fn weekly_rest_still_met(
        &self,
        assignment: &Assignment,
        s: usize,
        week_idx: usize,
        week: &std::ops::Range<Day>,
    ) -> bool {
        let week_days: Vec<Day> = week.clone().collect();

        let full_requests_in_week = week_days
            .iter()
            .filter(|&&d| {
                self.requests
                    .role_of(s, d)
                    .and_then(|r| self.taxonomy.behavior(r))
                    .is_some_and(|b| b.is_full_holiday())
            })
            .count();
        if full_requests_in_week >= 3 {
            return true;
        }

        let full_holidays = week_days.iter().filter(|&&d| !assignment.get(s, d)).count() as i32;
        let half_worked = week_days
            .iter()
            .filter(|&&d| {
                assignment.get(s, d)
                    && self
                        .requests
                        .role_of(s, d)
                        .and_then(|r| self.taxonomy.behavior(r))
                        .is_some_and(|b| b.is_half_holiday())
            })
            .count() as i32;
        let mut value = 2 * full_holidays + half_worked;

        let is_cross_month_first_week = week_idx == 0 && self.calendar.cross_month_first_week;
        let threshold = if is_cross_month_first_week {
            let carry = self
                .previous_last_week_holidays
                .get(&self.staff[s].id)
                .copied()
                .unwrap_or(0.0);
            value += (2.0 * carry).round() as i32;
            FULL_WEEK_THRESHOLD
        } else if week_days.len() == 7 {
            FULL_WEEK_THRESHOLD
        } else {
            SHORT_WEEK_THRESHOLD
        };

        value >= threshold
    }

    fn has_six_day_run(&self, assignment: &Assignment, s: usize) -> bool {
        let num_days = self.calendar.num_days();
        if num_days < CONSECUTIVE_WINDOW {
            return false;
        }
        for start in 1..=(num_days - CONSECUTIVE_WINDOW + 1) {
            if (start..start + CONSECUTIVE_WINDOW).all(|d| assignment.get(s, d)) {
                return true;
            }
        }
        false
    }
}

fn population_stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::requests::{resolve_requests, RawRequestTable};
    use crate::staff::{EmploymentKind, Profession as Prof, RoleTag, StaffId, WeekendCaps};
    use crate::taxonomy::{Behavior, Coefficient, RoleId, SymbolTaxonomy, HOLIDAY_DEFAULT, WORK_DEFAULT};

    fn taxonomy() -> SymbolTaxonomy {
        let mut input_to_role = HashMap::new();
        input_to_role.insert("x".to_string(), RoleId::from("strict_holiday"));
        input_to_role.insert("tri".to_string(), RoleId::from("weak_holiday"));

        let mut behaviors = HashMap::new();
        behaviors.insert(
            RoleId::from(HOLIDAY_DEFAULT),
            Behavior {
                is_holiday: true,
                strict: false,
                coef: Coefficient::Zero,
                output_symbol: "-".into(),
                excluded_from_monthly_count: false,
            },
        );
        behaviors.insert(
            RoleId::from(WORK_DEFAULT),
            Behavior {
                is_holiday: false,
                strict: false,
                coef: Coefficient::Full,
                output_symbol: "".into(),
                excluded_from_monthly_count: false,
            },
        );
        behaviors.insert(
            RoleId::from("strict_holiday"),
            Behavior {
                is_holiday: true,
                strict: true,
                coef: Coefficient::Zero,
                output_symbol: "X".into(),
                excluded_from_monthly_count: false,
            },
        );
        behaviors.insert(
            RoleId::from("weak_holiday"),
            Behavior {
                is_holiday: true,
                strict: false,
                coef: Coefficient::Zero,
                output_symbol: "△".into(),
                excluded_from_monthly_count: false,
            },
        );
        SymbolTaxonomy::new(input_to_role, behaviors).unwrap()
    }

    fn staff(id: &str, profession: Prof, capacity: u32) -> Staff {
        Staff {
            id: StaffId::from(id),
            display_name: id.to_string(),
            profession,
            daily_unit_capacity: capacity,
            employment_kind: EmploymentKind::Regular,
            is_manager: false,
            role_tag: None,
            weekend_caps: WeekendCaps::default(),
        }
    }

    #[test]
    fn population_stddev_of_uniform_counts_is_zero() {
        assert_eq!(population_stddev(&[3.0, 3.0, 3.0]), 0.0);
    }

    #[test]
    fn population_stddev_matches_hand_computation() {
        // mean=2, variance=((1-2)^2+(3-2)^2)/2=1, stddev=1
        assert_eq!(population_stddev(&[1.0, 3.0]), 1.0);
    }

    #[test]
    fn improver_levels_a_three_pt_three_weekday_imbalance() {
        let cal = Calendar::new(2024, 1, true); // Jan 2024: Mon start
        let staff_vec = vec![
            staff("P1", Prof::Pt, 18),
            staff("P2", Prof::Pt, 18),
            staff("P3", Prof::Pt, 18),
        ];
        let tax = taxonomy();
        let requests = resolve_requests(&staff_vec, &RawRequestTable::new(), &tax);
        let improver_config = ImproverConfig::default();
        let prev = HashMap::new();

        let mut assignment = Assignment::new(3, cal.num_days());
        let first_week = cal.weeks[0].clone();
        let week_weekdays: Vec<Day> = first_week.filter(|d| cal.weekdays.contains(d)).collect();
        assert!(week_weekdays.len() >= 2);

        // Pile everyone onto the first weekday, leave the rest empty.
        let peak = week_weekdays[0];
        for s in 0..3 {
            assignment.set(s, peak, true);
        }

        let improver = Improver {
            staff: &staff_vec,
            calendar: &cal,
            requests: &requests,
            taxonomy: &tax,
            improver_config: &improver_config,
            previous_last_week_holidays: &prev,
        };

        let before = improver.secondary_score(&assignment);
        let moves = improver.improve(&mut assignment);
        let after = improver.secondary_score(&assignment);

        assert!(after <= before);
        assert!(!moves.is_empty());
    }

    #[test]
    fn move_is_rejected_when_it_would_strand_the_only_manager() {
        let cal = Calendar::new(2024, 1, true);
        let mut manager = staff("M1", Prof::Pt, 18);
        manager.is_manager = true;
        let staff_vec = vec![manager, staff("P2", Prof::Pt, 18)];
        let tax = taxonomy();
        let requests = resolve_requests(&staff_vec, &RawRequestTable::new(), &tax);
        let improver_config = ImproverConfig::default();
        let prev = HashMap::new();

        let mut assignment = Assignment::new(2, cal.num_days());
        let first_week = cal.weeks[0].clone();
        let week_weekdays: Vec<Day> = first_week.filter(|d| cal.weekdays.contains(d)).collect();
        let peak = week_weekdays[0];
        let trough = week_weekdays[1];
        assignment.set(0, peak, true); // only manager works the peak day

        let improver = Improver {
            staff: &staff_vec,
            calendar: &cal,
            requests: &requests,
            taxonomy: &tax,
            improver_config: &improver_config,
            previous_last_week_holidays: &prev,
        };

        assignment.set(0, peak, false);
        assignment.set(0, trough, true);
        assert!(!improver.move_is_safe(&assignment, 0, 0, &first_week, peak, trough));
    }

    #[test]
    fn six_day_run_after_swap_is_rejected() {
        let cal = Calendar::new(2024, 1, true);
        let staff_vec = vec![staff("P1", Prof::Pt, 18)];
        let tax = taxonomy();
        let requests = resolve_requests(&staff_vec, &RawRequestTable::new(), &tax);
        let improver_config = ImproverConfig::default();
        let prev = HashMap::new();

        let mut assignment = Assignment::new(1, cal.num_days());
        for d in 2..=6 {
            assignment.set(0, d, true);
        }
        // Day 1 would complete a 6-day run 1..=6 once swapped on.
        assignment.set(0, 7, true);

        let improver = Improver {
            staff: &staff_vec,
            calendar: &cal,
            requests: &requests,
            taxonomy: &tax,
            improver_config: &improver_config,
            previous_last_week_holidays: &prev,
        };

        assignment.set(0, 7, false);
        assignment.set(0, 1, true);
        let week0 = cal.weeks[0].clone();
        assert!(improver.has_six_day_run(&assignment, 0));
        assert!(!improver.move_is_safe(&assignment, 0, 0, &week0, 7, 1));
    }
}
