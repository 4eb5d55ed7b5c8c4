//! P12 (S7) — Consecutive-workday cap: a regular staff should not work
//! all six days of any 6-day sliding window in the month.

use crate::calendar::Day;
use crate::model::{LinearExpr, SolverModel};
use crate::rules::{reify_below_threshold, RuleContext};

const WINDOW: Day = 6;

pub fn build(ctx: &RuleContext, model: &mut dyn SolverModel) {
    let weight = ctx.config.p12_consecutive_workday_cap.weight;
    if weight == 0 {
        return;
    }

    let num_days = ctx.calendar.num_days();
    if num_days < WINDOW {
        return;
    }

    for (idx, staff) in ctx.staff.iter().enumerate() {
        if staff.is_part_time() {
            continue;
        }
        for start in 1..=(num_days - WINDOW + 1) {
            let window: Vec<Day> = (start..start + WINDOW).collect();
            let worked = LinearExpr::sum(window.iter().map(|&d| ctx.x(idx, d)));
            // "all six days worked" <=> not(worked < 6), i.e. at_least_six.
            let (_below, all_worked) = reify_below_threshold(model, worked, WINDOW as i32);
            model.minimize(LinearExpr::new().term(weight, all_worked));
        }
    }
}
