//! P11 (S6) — Per-profession workload leveling: each profession's daily
//! delivered units, adjusted for its apportioned share of shared event
//! load, should track its own monthly average residual rather than
//! swinging day to day.

use std::collections::HashMap;

use crate::calendar::Day;
use crate::model::LinearExpr;
use crate::rules::{minimize_abs_deviation, RuleContext};
use crate::staff::Profession;

pub fn build(ctx: &RuleContext, model: &mut dyn crate::model::SolverModel) {
    let switch = &ctx.config.p11_workload_leveling;
    if !switch.enabled {
        return;
    }
    let weight = switch.active_weight();
    if weight == 0 {
        return;
    }

    let weekdays: Vec<Day> = ctx.calendar.weekdays.iter().copied().collect();
    if weekdays.is_empty() {
        return;
    }

    let members: HashMap<Profession, Vec<usize>> = {
        let mut map: HashMap<Profession, Vec<usize>> = HashMap::new();
        for (idx, staff) in ctx.staff.iter().enumerate() {
            map.entry(staff.profession).or_default().push(idx);
        }
        map
    };

    let monthly_capacity = |profession: Profession| -> f32 {
        members
            .get(&profession)
            .into_iter()
            .flatten()
            .map(|&idx| {
                let staff = &ctx.staff[idx];
                let holiday_weekdays = weekdays
                    .iter()
                    .filter(|&&d| {
                        ctx.requests
                            .role_of(idx, d)
                            .and_then(|r| ctx.taxonomy.behavior(r))
                            .is_some_and(|b| b.is_holiday)
                    })
                    .count();
                let r_s = holiday_weekdays as f32 / weekdays.len() as f32;
                staff.daily_unit_capacity as f32 * (1.0 - r_s)
            })
            .sum()
    };

    let capacities: HashMap<Profession, f32> =
        Profession::ALL.iter().map(|&p| (p, monthly_capacity(p))).collect();
    let total_capacity: f32 = capacities.values().sum();

    let weekday_sum = |map: &HashMap<Day, i32>| -> f32 { weekdays.iter().map(|d| *map.get(d).unwrap_or(&0) as f32).sum() };
    let total_event_units_all = weekday_sum(&ctx.event_units.all);

    for &profession in &Profession::ALL {
        let Some(member_indices) = members.get(&profession) else {
            continue;
        };
        if member_indices.is_empty() {
            continue;
        }
        let capacity = capacities[&profession];
        let ratio = if total_capacity > 0.0 { capacity / total_capacity } else { 0.0 };

        let event_units_for_profession = match profession {
            Profession::Pt => &ctx.event_units.pt,
            Profession::Ot => &ctx.event_units.ot,
            Profession::St => &ctx.event_units.st,
        };
        let total_event_units_job = weekday_sum(event_units_for_profession);
        let total_event_units = total_event_units_job + ratio * total_event_units_all;
        let avg_residual = (capacity - total_event_units) / weekdays.len() as f32;

        for &day in &weekdays {
            let delivered = member_indices.iter().fold(LinearExpr::new(), |acc, &idx| {
                let coeff = (ctx.staff[idx].daily_unit_capacity as f32 * ctx.requests.coef_of(idx, day).as_f32()).round()
                    as i32;
                acc.term(coeff, ctx.x(idx, day))
            });

            let event_for_day = event_units_for_profession.get(&day).copied().unwrap_or(0) as f32
                + ratio * ctx.event_units.all.get(&day).copied().unwrap_or(0) as f32;
            let target = event_for_day.round() as i32 + avg_residual.round() as i32;

            minimize_abs_deviation(model, delivered, target, weight);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap as Map;

    use super::*;
    use crate::calendar::Calendar;
    use crate::config::{EventUnits, RuleConfig, Targets};
    use crate::model::MockSolverModel;
    use crate::requests::resolve_requests;
    use crate::staff::{EmploymentKind, StaffId, WeekendCaps};
    use crate::taxonomy::{Behavior, Coefficient, SymbolTaxonomy, HOLIDAY_DEFAULT, WORK_DEFAULT};

    fn taxonomy() -> SymbolTaxonomy {
        let mut behaviors = Map::new();
        behaviors.insert(
            crate::taxonomy::RoleId::from(HOLIDAY_DEFAULT),
            Behavior {
                is_holiday: true,
                strict: false,
                coef: Coefficient::Zero,
                output_symbol: "-".into(),
                excluded_from_monthly_count: false,
            },
        );
        behaviors.insert(
            crate::taxonomy::RoleId::from(WORK_DEFAULT),
            Behavior {
                is_holiday: false,
                strict: false,
                coef: Coefficient::Full,
                output_symbol: "".into(),
                excluded_from_monthly_count: false,
            },
        );
        SymbolTaxonomy::new(Map::new(), behaviors).unwrap()
    }

    fn staff(profession: Profession) -> crate::staff::Staff {
        crate::staff::Staff {
            id: StaffId::from("S1"),
            display_name: "S1".into(),
            profession,
            daily_unit_capacity: 18,
            employment_kind: EmploymentKind::Regular,
            is_manager: false,
            role_tag: None,
            weekend_caps: WeekendCaps::default(),
        }
    }

    #[test]
    fn disabled_switch_posts_nothing() {
        let cal = Calendar::new(2024, 1, true);
        let staff_vec = vec![staff(Profession::Pt)];
        let tax = taxonomy();
        let requests = resolve_requests(&staff_vec, &Map::new(), &tax);
        let mut config = RuleConfig::default();
        config.p11_workload_leveling.enabled = false;
        let targets = Targets::default();
        let event_units = EventUnits::default();
        let prev = Map::new();

        let mut mock = MockSolverModel::new();
        let x = vec![vec![crate::model::VarId(0); cal.num_days() as usize + 1]];
        let ctx = RuleContext {
            staff: &staff_vec,
            calendar: &cal,
            requests: &requests,
            taxonomy: &tax,
            config: &config,
            targets: &targets,
            event_units: &event_units,
            x: &x,
            previous_last_week_holidays: &prev,
        };

        build(&ctx, &mut mock);
    }

    #[test]
    fn single_profession_with_no_event_load_posts_one_deviation_per_weekday() {
        let cal = Calendar::new(2024, 1, true);
        let staff_vec = vec![staff(Profession::Pt)];
        let tax = taxonomy();
        let requests = resolve_requests(&staff_vec, &Map::new(), &tax);
        let config = RuleConfig::default();
        let targets = Targets::default();
        let event_units = EventUnits::default();
        let prev = Map::new();

        let num_weekdays = cal.weekdays.len();
        let mut mock = MockSolverModel::new();
        mock.expect_add_abs_eq().times(num_weekdays).returning(|_| crate::model::VarId(9999));
        mock.expect_minimize().times(num_weekdays).return_const(());

        let mut x = vec![vec![crate::model::VarId(0); cal.num_days() as usize + 1]];
        for d in &cal.days {
            x[0][*d as usize] = crate::model::VarId(1000 + *d as usize);
        }

        let ctx = RuleContext {
            staff: &staff_vec,
            calendar: &cal,
            requests: &requests,
            taxonomy: &tax,
            config: &config,
            targets: &targets,
            event_units: &event_units,
            x: &x,
            previous_last_week_holidays: &prev,
        };

        build(&ctx, &mut mock);
    }
}
