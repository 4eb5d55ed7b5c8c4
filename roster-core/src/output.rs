//! C8 Output Assembler: turns the final assignment into the output
//! symbol grid plus the daily summary aggregates. Purely a read over
//! C1-C3's immutable views and the frozen `Assignment` — no model, no
//! mutation.

use std::collections::HashMap;

use crate::assignment::Assignment;
use crate::calendar::{Calendar, Day};
use crate::requests::ResolvedRequests;
use crate::staff::{Profession, RoleTag, Staff, StaffId};
use crate::taxonomy::SymbolTaxonomy;

/// `(staff_idx, day) -> output symbol`, plus the per-staff holiday
/// tally over the final week, carried forward into next month's
/// `previous_last_week_holidays` input.
#[derive(Debug, Clone, Default)]
pub struct ScheduleGrid {
    symbols: HashMap<(usize, Day), String>,
    pub last_week_holidays: HashMap<StaffId, f32>,
}

impl ScheduleGrid {
    pub fn symbol_of(&self, staff_idx: usize, day: Day) -> &str {
        self.symbols
            .get(&(staff_idx, day))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// One day's aggregates. Unit fields are `None` on non-weekdays (§4.7:
/// "non-weekdays leave unit fields undefined").
#[derive(Debug, Clone)]
pub struct DailySummary {
    pub day: Day,
    pub total_headcount: f32,
    pub headcount_by_profession: HashMap<Profession, f32>,
    pub manager_headcount: f32,
    pub headcount_by_role_tag: HashMap<RoleTag, f32>,
    pub delivered_units_by_profession: Option<HashMap<Profession, f32>>,
}

pub struct OutputAssembler<'a> {
    pub staff: &'a [Staff],
    pub calendar: &'a Calendar,
    pub requests: &'a ResolvedRequests,
    pub taxonomy: &'a SymbolTaxonomy,
}

impl<'a> OutputAssembler<'a> {
    pub fn schedule_grid(&self, assignment: &Assignment) -> ScheduleGrid {
        let mut grid = ScheduleGrid::default();

        for (idx, _) in self.staff.iter().enumerate() {
            for &day in &self.calendar.days {
                let working = assignment.get(idx, day);
                let role = self.requests.role_of(idx, day);
                let symbol = self.taxonomy.output_symbol_of(role, working);
                grid.symbols.insert((idx, day), symbol);
            }
        }

        for (idx, staff) in self.staff.iter().enumerate() {
            let Some(last_week) = self.calendar.weeks.last() else {
                continue;
            };
            let mut tally = 0.0f32;
            for day in last_week.clone() {
                if !assignment.get(idx, day) {
                    tally += 1.0;
                    continue;
                }
                if let Some(behavior) = self.requests.role_of(idx, day).and_then(|r| self.taxonomy.behavior(r)) {
                    if behavior.is_half_holiday() {
                        tally += 1.0 - behavior.coef.as_f32();
                    }
                }
            }
            grid.last_week_holidays.insert(staff.id.clone(), tally);
        }

        grid
    }

    pub fn daily_summary(&self, assignment: &Assignment) -> Vec<DailySummary> {
        let weight_of = |idx: usize, day: Day| -> f32 {
            if !assignment.get(idx, day) {
                return 0.0;
            }
            self.requests
                .role_of(idx, day)
                .and_then(|r| self.taxonomy.behavior(r))
                .map(|b| b.coef.as_f32())
                .unwrap_or(1.0)
        };

        self.calendar
            .days
            .iter()
            .map(|&day| {
                let mut total_headcount = 0.0f32;
                let mut headcount_by_profession: HashMap<Profession, f32> = HashMap::new();
                let mut manager_headcount = 0.0f32;
                let mut headcount_by_role_tag: HashMap<RoleTag, f32> = HashMap::new();
                let mut units_by_profession: HashMap<Profession, f32> = HashMap::new();

                let is_weekday = self.calendar.weekdays.contains(&day);

                for (idx, staff) in self.staff.iter().enumerate() {
                    let w = weight_of(idx, day);
                    if w == 0.0 {
                        continue;
                    }
                    total_headcount += w;
                    *headcount_by_profession.entry(staff.profession).or_insert(0.0) += w;
                    if staff.is_manager {
                        manager_headcount += w;
                    }
                    if let Some(tag) = staff.role_tag {
                        *headcount_by_role_tag.entry(tag).or_insert(0.0) += w;
                    }
                    if is_weekday {
                        *units_by_profession.entry(staff.profession).or_insert(0.0) +=
                            staff.daily_unit_capacity as f32 * w;
                    }
                }

                DailySummary {
                    day,
                    total_headcount,
                    headcount_by_profession,
                    manager_headcount,
                    headcount_by_role_tag,
                    delivered_units_by_profession: is_weekday.then_some(units_by_profession),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap as Map;

    use super::*;
    use crate::requests::{resolve_requests, RawRequestTable};
    use crate::staff::{EmploymentKind, WeekendCaps};
    use crate::taxonomy::{Behavior, Coefficient, RoleId, SymbolTaxonomy, HOLIDAY_DEFAULT, WORK_DEFAULT};

    fn taxonomy() -> SymbolTaxonomy {
        let mut input_to_role = Map::new();
        input_to_role.insert("h".to_string(), RoleId::from("half_holiday"));

        let mut behaviors = Map::new();
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
            RoleId::from("half_holiday"),
            Behavior {
                is_holiday: true,
                strict: false,
                coef: Coefficient::Half,
                output_symbol: "h".into(),
                excluded_from_monthly_count: false,
            },
        );
        SymbolTaxonomy::new(input_to_role, behaviors).unwrap()
    }

    fn staff(id: &str, profession: Profession) -> Staff {
        Staff {
            id: StaffId::from(id),
            display_name: id.to_string(),
            profession,
            daily_unit_capacity: 18,
            employment_kind: EmploymentKind::Regular,
            is_manager: false,
            role_tag: None,
            weekend_caps: WeekendCaps::default(),
        }
    }

    #[test]
    fn working_day_with_no_role_renders_work_default_symbol() {
        let cal = Calendar::new(2024, 1, true);
        let staff_vec = vec![staff("S1", Profession::Pt)];
        let tax = taxonomy();
        let requests = resolve_requests(&staff_vec, &RawRequestTable::new(), &tax);
        let mut assignment = Assignment::new(1, cal.num_days());
        assignment.set(0, 2, true);

        let assembler = OutputAssembler {
            staff: &staff_vec,
            calendar: &cal,
            requests: &requests,
            taxonomy: &tax,
        };
        let grid = assembler.schedule_grid(&assignment);
        assert_eq!(grid.symbol_of(0, 2), "");
    }

    #[test]
    fn off_day_with_no_role_renders_holiday_default_symbol() {
        let cal = Calendar::new(2024, 1, true);
        let staff_vec = vec![staff("S1", Profession::Pt)];
        let tax = taxonomy();
        let requests = resolve_requests(&staff_vec, &RawRequestTable::new(), &tax);
        let assignment = Assignment::new(1, cal.num_days());

        let assembler = OutputAssembler {
            staff: &staff_vec,
            calendar: &cal,
            requests: &requests,
            taxonomy: &tax,
        };
        let grid = assembler.schedule_grid(&assignment);
        assert_eq!(grid.symbol_of(0, 1), "-");
    }

    #[test]
    fn half_holiday_worked_contributes_half_headcount_and_half_units() {
        let cal = Calendar::new(2024, 1, true);
        let staff_vec = vec![staff("S1", Profession::Pt)];
        let tax = taxonomy();
        let mut raw: RawRequestTable = Map::new();
        raw.insert(StaffId::from("S1"), Map::from([(2, "h".to_string())]));
        let requests = resolve_requests(&staff_vec, &raw, &tax);
        let mut assignment = Assignment::new(1, cal.num_days());
        assignment.set(0, 2, true); // day 2 (Tue) is a weekday

        let assembler = OutputAssembler {
            staff: &staff_vec,
            calendar: &cal,
            requests: &requests,
            taxonomy: &tax,
        };
        let summary = assembler.daily_summary(&assignment);
        let day2 = summary.iter().find(|s| s.day == 2).unwrap();
        assert_eq!(day2.total_headcount, 0.5);
        assert_eq!(
            *day2.delivered_units_by_profession.as_ref().unwrap().get(&Profession::Pt).unwrap(),
            9.0
        );
    }

    #[test]
    fn half_holiday_worked_on_final_week_day_contributes_half_to_last_week_holidays() {
        let cal = Calendar::new(2024, 1, true); // last week ends day 31
        let staff_vec = vec![staff("S1", Profession::Pt)];
        let tax = taxonomy();
        let last_day = *cal.weeks.last().unwrap().clone().last().unwrap();
        let mut raw: RawRequestTable = Map::new();
        raw.insert(StaffId::from("S1"), Map::from([(last_day, "h".to_string())]));
        let requests = resolve_requests(&staff_vec, &raw, &tax);
        let mut assignment = Assignment::new(1, cal.num_days());
        assignment.set(0, last_day, true);

        let assembler = OutputAssembler {
            staff: &staff_vec,
            calendar: &cal,
            requests: &requests,
            taxonomy: &tax,
        };
        let grid = assembler.schedule_grid(&assignment);
        assert_eq!(*grid.last_week_holidays.get(&StaffId::from("S1")).unwrap(), 0.5);
    }
}
