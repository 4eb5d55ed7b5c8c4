//! P2 (H2) — Strict leave respect: a regular staff's strict-role requests
//! (absolute requests the department promises to honor) are not enforced,
//! but departing from one is penalized.

use crate::model::{LinearExpr, SolverModel};
use crate::rules::RuleContext;

pub fn build(ctx: &RuleContext, model: &mut dyn SolverModel) {
    let weight = ctx.config.p2_strict_leave.weight;
    if weight == 0 {
        return;
    }

    for (idx, staff) in ctx.staff.iter().enumerate() {
        if staff.is_part_time() {
            // Part-time staff's strict requests are already enforced by E1.
            continue;
        }
        for &day in &ctx.calendar.days {
            let Some(role) = ctx.requests.role_of(idx, day) else {
                continue;
            };
            let Some(behavior) = ctx.taxonomy.behavior(role) else {
                continue;
            };
            if !behavior.strict {
                continue;
            }
            let x = ctx.x(idx, day);
            let penalty = if behavior.is_strict_holiday() {
                LinearExpr::new().term(1, x)
            } else {
                LinearExpr::new().term(-1, x).plus_constant(1)
            };
            model.minimize(penalty.scaled(weight));
        }
    }
}
