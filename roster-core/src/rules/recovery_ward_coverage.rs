//! P10 (S5) — Recovery-ward coverage: every day needs at least one
//! recovery-ward PT or OT present (hard, `build_hard`); having neither a
//! PT nor an OT individually is additionally soft-penalized
//! (`build_soft`), so the two halves can diverge once the department
//! cares which profession covers a given day.

use crate::model::{LinearExpr, SolverModel};
use crate::rules::{reify_below_threshold, RuleContext};
use crate::staff::RoleTag;

fn recovery_ward_pt(ctx: &RuleContext) -> Vec<usize> {
    ctx.staff
        .iter()
        .enumerate()
        .filter(|(_, s)| s.role_tag == Some(RoleTag::RecoveryWardPt))
        .map(|(idx, _)| idx)
        .collect()
}

fn recovery_ward_ot(ctx: &RuleContext) -> Vec<usize> {
    ctx.staff
        .iter()
        .enumerate()
        .filter(|(_, s)| s.role_tag == Some(RoleTag::RecoveryWardOt))
        .map(|(idx, _)| idx)
        .collect()
}

pub fn build_hard(ctx: &RuleContext, model: &mut dyn SolverModel) {
    let pt = recovery_ward_pt(ctx);
    let ot = recovery_ward_ot(ctx);
    if pt.is_empty() && ot.is_empty() {
        return;
    }

    for &day in &ctx.calendar.days {
        let present = LinearExpr::sum(pt.iter().chain(ot.iter()).map(|&idx| ctx.x(idx, day)));
        // present >= 1  <=>  1 - present <= 0
        model.add_linear_le(present.scaled(-1).plus_constant(1));
    }
}

pub fn build_soft(ctx: &RuleContext, model: &mut dyn SolverModel) {
    let weight = ctx.config.p10_recovery_ward_coverage.weight;
    if weight == 0 {
        return;
    }

    let pt = recovery_ward_pt(ctx);
    let ot = recovery_ward_ot(ctx);

    for &day in &ctx.calendar.days {
        if !pt.is_empty() {
            let present = LinearExpr::sum(pt.iter().map(|&idx| ctx.x(idx, day)));
            let (no_pt, _) = reify_below_threshold(model, present, 1);
            model.minimize(LinearExpr::new().term(weight, no_pt));
        }
        if !ot.is_empty() {
            let present = LinearExpr::sum(ot.iter().map(|&idx| ctx.x(idx, day)));
            let (no_ot, _) = reify_below_threshold(model, present, 1);
            model.minimize(LinearExpr::new().term(weight, no_ot));
        }
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

    fn recovery_ward_staff() -> crate::staff::Staff {
        crate::staff::Staff {
            id: StaffId::from("S1"),
            display_name: "S1".into(),
            profession: Profession::Pt,
            daily_unit_capacity: 18,
            employment_kind: EmploymentKind::Regular,
            is_manager: false,
            role_tag: Some(RoleTag::RecoveryWardPt),
            weekend_caps: WeekendCaps::default(),
        }
    }

    #[test]
    fn hard_constraint_posted_once_per_day() {
        let cal = Calendar::new(2024, 1, true);
        let staff_vec = vec![recovery_ward_staff()];
        let tax = taxonomy();
        let requests = resolve_requests(&staff_vec, &HashMap::new(), &tax);
        let targets = Targets::default();
        let event_units = EventUnits::default();
        let config = RuleConfig::default();
        let prev = HashMap::new();

        let num_days = cal.num_days() as usize;
        let mut mock = MockSolverModel::new();
        mock.expect_add_linear_le().times(num_days).returning(|_| ConstraintId(0));

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

        build_hard(&ctx, &mut mock);
    }
}
