//! P6 (S4) — Weak leave respect: a weak-holiday request (one the
//! department may override) is still honored with a soft penalty when
//! the solver assigns the staff to work it anyway.

use crate::model::{LinearExpr, SolverModel};
use crate::rules::RuleContext;

pub fn build(ctx: &RuleContext, model: &mut dyn SolverModel) {
    let weight = ctx.config.p6_weak_leave.weight;
    if weight == 0 {
        return;
    }

    for (idx, _staff) in ctx.staff.iter().enumerate() {
        for &day in &ctx.calendar.days {
            let Some(role) = ctx.requests.role_of(idx, day) else {
                continue;
            };
            let Some(behavior) = ctx.taxonomy.behavior(role) else {
                continue;
            };
            if !behavior.is_weak_holiday() {
                continue;
            }
            let x = ctx.x(idx, day);
            model.minimize(LinearExpr::new().term(weight, x));
        }
    }
}
