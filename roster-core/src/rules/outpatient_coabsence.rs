//! P9 (S3) — Outpatient co-absence: at most one outpatient-PT staff
//! should be off on any given day; a second or further absence is
//! penalized.

use crate::model::LinearExpr;
use crate::rules::{minimize_positive_part, RuleContext};
use crate::staff::RoleTag;

pub fn build(ctx: &RuleContext, model: &mut dyn crate::model::SolverModel) {
    let weight = ctx.config.p9_outpatient_coabsence.weight;
    if weight == 0 {
        return;
    }

    let outpatient_pt: Vec<usize> = ctx
        .staff
        .iter()
        .enumerate()
        .filter(|(_, s)| s.role_tag == Some(RoleTag::OutpatientPt))
        .map(|(idx, _)| idx)
        .collect();
    if outpatient_pt.is_empty() {
        return;
    }

    for &day in &ctx.calendar.days {
        let off_count = LinearExpr::constant(outpatient_pt.len() as i32)
            - LinearExpr::sum(outpatient_pt.iter().map(|&idx| ctx.x(idx, day)));
        let over = off_count.plus_constant(-1);
        minimize_positive_part(model, over, (outpatient_pt.len() as i32 - 1).max(0), weight);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::calendar::Calendar;
    use crate::config::{EventUnits, RuleConfig, Targets};
    use crate::model::{ConstraintId, MockSolverModel, VarId};
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

    fn outpatient_staff() -> crate::staff::Staff {
        crate::staff::Staff {
            id: StaffId::from("S1"),
            display_name: "S1".into(),
            profession: Profession::Pt,
            daily_unit_capacity: 18,
            employment_kind: EmploymentKind::Regular,
            is_manager: false,
            role_tag: Some(RoleTag::OutpatientPt),
            weekend_caps: WeekendCaps::default(),
        }
    }

    #[test]
    fn no_outpatient_pt_on_staff_posts_nothing() {
        let cal = Calendar::new(2024, 1, true);
        let mut staff = outpatient_staff();
        staff.role_tag = None;
        let staff_vec = vec![staff];
        let tax = taxonomy();
        let requests = resolve_requests(&staff_vec, &HashMap::new(), &tax);
        let targets = Targets::default();
        let event_units = EventUnits::default();
        let config = RuleConfig::default();
        let prev = HashMap::new();

        let mut mock = MockSolverModel::new();
        let x = vec![vec![VarId(0); cal.num_days() as usize + 1]];
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
    fn one_positive_part_posted_per_day_for_a_single_outpatient_pt() {
        let cal = Calendar::new(2024, 1, true);
        let staff_vec = vec![outpatient_staff()];
        let tax = taxonomy();
        let requests = resolve_requests(&staff_vec, &HashMap::new(), &tax);
        let targets = Targets::default();
        let event_units = EventUnits::default();
        let config = RuleConfig::default();
        let prev = HashMap::new();

        let num_days = cal.num_days() as usize;
        let mut mock = MockSolverModel::new();
        mock.expect_new_int().times(num_days).returning(|lo, hi| {
            assert_eq!(lo, 0);
            VarId(hi as usize + 9000)
        });
        mock.expect_add_linear_le().times(num_days).returning(|_| ConstraintId(0));
        mock.expect_minimize().times(num_days).return_const(());

        let mut x = vec![vec![VarId(0); cal.num_days() as usize + 1]];
        for d in &cal.days {
            x[0][*d as usize] = VarId(1000 + *d as usize);
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
