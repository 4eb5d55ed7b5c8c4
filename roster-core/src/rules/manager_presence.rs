//! P3 (H3) — Manager presence: every day should have at least one staff
//! member bearing a managerial title assigned.

use crate::model::{LinearExpr, SolverModel};
use crate::rules::{reify_below_threshold, RuleContext};

pub fn build(ctx: &RuleContext, model: &mut dyn SolverModel) {
    let weight = ctx.config.p3_manager_presence.weight;
    if weight == 0 {
        return;
    }

    let managers: Vec<usize> = ctx
        .staff
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_manager)
        .map(|(idx, _)| idx)
        .collect();
    if managers.is_empty() {
        return;
    }

    for &day in &ctx.calendar.days {
        let present = LinearExpr::sum(managers.iter().map(|&idx| ctx.x(idx, day)));
        let (no_manager, _at_least_one) = reify_below_threshold(model, present, 1);
        model.minimize(LinearExpr::new().term(weight, no_manager));
    }
}
