//! P8 (S1a/S1b/S1c) — Weekend headcount targets: on Sundays and special
//! Saturdays, the assigned headcount per profession should track the
//! department's configured targets, combined for PT+OT and individually
//! for ST, with a tolerance band around the PT/OT individual targets.

use crate::config::DayType;
use crate::model::{LinearExpr, SolverModel};
use crate::rules::{minimize_abs_deviation, minimize_positive_part, RuleContext};
use crate::staff::Profession;

pub fn build(ctx: &RuleContext, model: &mut dyn SolverModel) {
    let switch = &ctx.config.p8_weekend_headcount;
    if !switch.enabled {
        return;
    }

    build_for_days(ctx, model, &ctx.calendar.sundays.iter().copied().collect::<Vec<_>>(), DayType::Sunday);
    build_for_days(
        ctx,
        model,
        &ctx.calendar.special_saturdays.iter().copied().collect::<Vec<_>>(),
        DayType::SpecialSaturday,
    );
}

fn build_for_days(ctx: &RuleContext, model: &mut dyn SolverModel, days: &[crate::calendar::Day], day_type: DayType) {
    let switch = &ctx.config.p8_weekend_headcount;
    let targets = ctx.targets.for_day_type(day_type);

    let staff_by_profession = |profession: Profession| -> Vec<usize> {
        ctx.staff
            .iter()
            .enumerate()
            .filter(|(_, s)| s.profession == profession)
            .map(|(idx, _)| idx)
            .collect()
    };
    let pt = staff_by_profession(Profession::Pt);
    let ot = staff_by_profession(Profession::Ot);
    let st = staff_by_profession(Profession::St);

    for &day in days {
        let n_pt = LinearExpr::sum(pt.iter().map(|&idx| ctx.x(idx, day)));
        let n_ot = LinearExpr::sum(ot.iter().map(|&idx| ctx.x(idx, day)));
        let n_st = LinearExpr::sum(st.iter().map(|&idx| ctx.x(idx, day)));

        if switch.weight_combined_pt_ot != 0 {
            let combined = n_pt.clone() + n_ot.clone();
            minimize_abs_deviation(model, combined, targets.pt + targets.ot, switch.weight_combined_pt_ot);
        }
        if switch.weight_pt_ot_individual != 0 {
            let pt_over = n_pt.clone().plus_constant(-targets.pt - switch.tolerance);
            minimize_positive_part(model, pt_over, pt.len() as i32, switch.weight_pt_ot_individual);
            let pt_under = n_pt.clone().scaled(-1).plus_constant(targets.pt - switch.tolerance);
            minimize_positive_part(model, pt_under, pt.len() as i32, switch.weight_pt_ot_individual);

            let ot_over = n_ot.clone().plus_constant(-targets.ot - switch.tolerance);
            minimize_positive_part(model, ot_over, ot.len() as i32, switch.weight_pt_ot_individual);
            let ot_under = n_ot.clone().scaled(-1).plus_constant(targets.ot - switch.tolerance);
            minimize_positive_part(model, ot_under, ot.len() as i32, switch.weight_pt_ot_individual);
        }
        if switch.weight_st != 0 {
            minimize_abs_deviation(model, n_st, targets.st, switch.weight_st);
        }
    }
}
