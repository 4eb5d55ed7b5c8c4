//! P7 (S0/S0b... here S0 for full weeks, S2 for short weeks) — Weekly
//! rest: a regular staff with fewer than three full-day leave requests in
//! a week should still accumulate a minimum holiday value across that
//! week. The first week of a month that doesn't start on a Sunday
//! carries in the previous month's last-week holiday count.

use crate::calendar::Day;
use crate::model::{LinearExpr, SolverModel};
use crate::rules::{reify_below_threshold, RuleContext};

const FULL_WEEK_THRESHOLD: i32 = 3;
const SHORT_WEEK_THRESHOLD: i32 = 1;

pub fn build(ctx: &RuleContext, model: &mut dyn SolverModel) {
    if ctx.config.p7_weekly_rest.weight_full_week == 0 && ctx.config.p7_weekly_rest.weight_short_week == 0 {
        return;
    }

    for (w_idx, week) in ctx.calendar.weeks.iter().enumerate() {
        let week_days: Vec<Day> = week.clone().collect();
        let is_cross_month_first_week = w_idx == 0 && ctx.calendar.cross_month_first_week;

        for (idx, staff) in ctx.staff.iter().enumerate() {
            if staff.is_part_time() {
                continue;
            }

            let full_requests_in_week = week_days
                .iter()
                .filter(|&&d| {
                    ctx.requests
                        .role_of(idx, d)
                        .and_then(|r| ctx.taxonomy.behavior(r))
                        .is_some_and(|b| b.is_full_holiday())
                })
                .count();
            if full_requests_in_week >= 3 {
                continue;
            }

            let full_holidays = LinearExpr::constant(week_days.len() as i32)
                - LinearExpr::sum(week_days.iter().map(|&d| ctx.x(idx, d)));
            let half_worked = LinearExpr::sum(week_days.iter().filter_map(|&d| {
                let half = ctx
                    .requests
                    .role_of(idx, d)
                    .and_then(|r| ctx.taxonomy.behavior(r))
                    .is_some_and(|b| b.is_half_holiday());
                half.then(|| ctx.x(idx, d))
            }));
            let mut value = full_holidays.scaled(2) + half_worked;

            let (threshold, weight) = if is_cross_month_first_week {
                let carry = ctx
                    .previous_last_week_holidays
                    .get(&staff.id)
                    .copied()
                    .unwrap_or(0.0);
                value = value.plus_constant((2.0 * carry).round() as i32);
                (FULL_WEEK_THRESHOLD, ctx.config.p7_weekly_rest.weight_full_week)
            } else if week_days.len() == 7 {
                (FULL_WEEK_THRESHOLD, ctx.config.p7_weekly_rest.weight_full_week)
            } else {
                (SHORT_WEEK_THRESHOLD, ctx.config.p7_weekly_rest.weight_short_week)
            };

            if weight == 0 {
                continue;
            }
            let (below, _) = reify_below_threshold(model, value, threshold);
            model.minimize(LinearExpr::new().term(weight, below));
        }
    }
}
