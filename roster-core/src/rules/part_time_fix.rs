//! E1 — Part-time fix: a part-time staff's strict requests are enforced
//! verbatim; everything else is left free for the solver to decide.

use crate::model::{LinearExpr, SolverModel};
use crate::rules::RuleContext;

pub fn build(ctx: &RuleContext, model: &mut dyn SolverModel) {
    for (idx, staff) in ctx.staff.iter().enumerate() {
        if !staff.is_part_time() {
            continue;
        }
        for &day in &ctx.calendar.days {
            let Some(role) = ctx.requests.role_of(idx, day) else {
                continue;
            };
            let Some(behavior) = ctx.taxonomy.behavior(role) else {
                continue;
            };
            let x = ctx.x(idx, day);
            if behavior.is_strict_holiday() {
                model.add_linear_eq(LinearExpr::new().term(1, x));
            } else if behavior.is_strict_work() {
                model.add_linear_eq(LinearExpr::new().term(1, x).plus_constant(-1));
            }
        }
    }
}
