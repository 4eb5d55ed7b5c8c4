//! P4 (H5) — Weekend caps: a regular staff's configured ceiling on Sunday
//! and special-Saturday work is a soft cap, not a hard one.
//!
//! P5 (S0b) — Sunday second-step discouragement: staff with generous
//! Sunday headroom (`sunday_cap >= 3`) are still nudged away from using
//! more than two of their Sundays, reserving the rest for when other
//! rules genuinely need it.

use crate::model::{LinearExpr, SolverModel};
use crate::rules::{minimize_positive_part, RuleContext};

pub fn build_caps(ctx: &RuleContext, model: &mut dyn SolverModel) {
    let weight = ctx.config.p4_weekend_caps.weight;
    if weight == 0 {
        return;
    }

    let num_sundays = ctx.calendar.sundays.len() as i32;
    let num_special_saturdays = ctx.calendar.special_saturdays.len() as i32;

    for (idx, staff) in ctx.staff.iter().enumerate() {
        if staff.is_part_time() {
            continue;
        }
        let caps = staff.weekend_caps;

        if let Some(cap) = caps.weekend_cap {
            let days = ctx.calendar.sundays.iter().chain(ctx.calendar.special_saturdays.iter());
            let value = LinearExpr::sum(days.map(|&d| ctx.x(idx, d))).plus_constant(-(cap as i32));
            minimize_positive_part(model, value, num_sundays + num_special_saturdays, weight);
            continue;
        }

        if let Some(cap) = caps.sunday_cap {
            let value = LinearExpr::sum(ctx.calendar.sundays.iter().map(|&d| ctx.x(idx, d))).plus_constant(-(cap as i32));
            minimize_positive_part(model, value, num_sundays, weight);
        }
        if let Some(cap) = caps.saturday_cap {
            let value =
                LinearExpr::sum(ctx.calendar.special_saturdays.iter().map(|&d| ctx.x(idx, d))).plus_constant(-(cap as i32));
            minimize_positive_part(model, value, num_special_saturdays, weight);
        }
    }
}

pub fn build_sunday_second_step(ctx: &RuleContext, model: &mut dyn SolverModel) {
    let weight = ctx.config.p5_sunday_second_step.weight;
    if weight == 0 {
        return;
    }

    let num_sundays = ctx.calendar.sundays.len() as i32;

    for (idx, staff) in ctx.staff.iter().enumerate() {
        if staff.is_part_time() {
            continue;
        }
        let Some(cap) = staff.weekend_caps.sunday_cap else {
            continue;
        };
        if cap < 3 {
            continue;
        }
        let value = LinearExpr::sum(ctx.calendar.sundays.iter().map(|&d| ctx.x(idx, d))).plus_constant(-2);
        minimize_positive_part(model, value, num_sundays, weight);
    }
}
