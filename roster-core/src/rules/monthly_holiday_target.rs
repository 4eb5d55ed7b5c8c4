//! P1 (H1) — Monthly holiday target: a regular staff's off-days, weighted
//! two points per full holiday and one point per half holiday, should land
//! on the department's nine-full-day-equivalent target.

use crate::model::{LinearExpr, SolverModel};
use crate::rules::{minimize_abs_deviation, RuleContext};

const MONTHLY_TARGET_VALUE: i32 = 18;

pub fn build(ctx: &RuleContext, model: &mut dyn SolverModel) {
    let weight = ctx.config.p1_monthly_holiday_target.weight;
    if weight == 0 {
        return;
    }

    for (idx, staff) in ctx.staff.iter().enumerate() {
        if staff.is_part_time() {
            continue;
        }

        let mut excluded_count = 0;
        let mut half_count = 0;
        for &day in &ctx.calendar.days {
            let Some(role) = ctx.requests.role_of(idx, day) else {
                continue;
            };
            let Some(behavior) = ctx.taxonomy.behavior(role) else {
                continue;
            };
            if behavior.excluded_from_monthly_count {
                excluded_count += 1;
            }
            if behavior.is_half_holiday() {
                half_count += 1;
            }
        }

        // FH = Σ_d (1 - x[s,d]), expressed as (num_days - Σ x[s,d]).
        let full_holidays = LinearExpr::constant(ctx.calendar.num_days() as i32)
            - LinearExpr::sum(ctx.calendar.days.iter().map(|&d| ctx.x(idx, d)));
        // value = 2*(FH - NC) + HH
        let value = full_holidays.scaled(2).plus_constant(-2 * excluded_count + half_count);

        minimize_abs_deviation(model, value, MONTHLY_TARGET_VALUE, weight);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::calendar::Calendar;
    use crate::config::{EventUnits, RuleConfig, Targets};
    use crate::model::MockSolverModel;
    use crate::requests::resolve_requests;
    use crate::staff::{EmploymentKind, Profession, StaffId, WeekendCaps};
    use crate::taxonomy::{Behavior, Coefficient, SymbolTaxonomy, HOLIDAY_DEFAULT, WORK_DEFAULT};

    fn taxonomy() -> SymbolTaxonomy {
        let mut behaviors = HashMap::new();
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
        SymbolTaxonomy::new(HashMap::new(), behaviors).unwrap()
    }

    fn regular_staff() -> crate::staff::Staff {
        crate::staff::Staff {
            id: StaffId::from("R1"),
            display_name: "R1".into(),
            profession: Profession::Pt,
            daily_unit_capacity: 18,
            employment_kind: EmploymentKind::Regular,
            is_manager: false,
            role_tag: None,
            weekend_caps: WeekendCaps::default(),
        }
    }

    #[test]
    fn weight_zero_posts_nothing() {
        let cal = Calendar::new(2024, 1, true);
        let staff = vec![regular_staff()];
        let tax = taxonomy();
        let requests = resolve_requests(&staff, &HashMap::new(), &tax);
        let targets = Targets::default();
        let event_units = EventUnits::default();
        let mut config = RuleConfig::default();
        config.p1_monthly_holiday_target.weight = 0;
        let prev = HashMap::new();

        let mut mock = MockSolverModel::new();
        // No expectations set: any call would panic as unexpected.

        let x = vec![vec![crate::model::VarId(0); cal.num_days() as usize + 1]];
        let ctx = RuleContext {
            staff: &staff,
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
