//! C4 Rule Engine: assembles the decision variables `x[s,d]`, the
//! hard/enforced constraints, and the weighted soft-penalty terms that
//! together form the CP model's objective (spec §4.4).
//!
//! Each rule lives in its own module, mirroring the one-rule-per-file
//! layout the teacher uses under `domain/rules/`. Unlike the teacher's
//! `Rule::validate` (which accepts or rejects one candidate assignment),
//! each rule here *builds into* the model: it posts whatever hard
//! constraints it needs and folds its weighted penalty into the
//! objective via repeated `SolverModel::minimize` calls.

mod consecutive_cap;
mod manager_presence;
mod monthly_holiday_target;
mod outpatient_coabsence;
mod part_time_fix;
mod recovery_ward_coverage;
mod strict_leave;
mod weak_leave;
mod weekend_caps;
mod weekend_headcount;
mod weekly_rest;
mod workload_leveling;

use std::collections::HashMap;

use crate::calendar::Calendar;
use crate::config::{EventUnits, RuleConfig, Targets};
use crate::model::{LinearExpr, SolverModel, VarId};
use crate::requests::ResolvedRequests;
use crate::staff::{Staff, StaffId};
use crate::taxonomy::SymbolTaxonomy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleId {
    E1,
    P1,
    P2,
    P3,
    P4,
    P5,
    P6,
    P7,
    P8,
    P9,
    P10,
    P11,
    P12,
}

impl RuleId {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleId::E1 => "E1",
            RuleId::P1 => "H1",
            RuleId::P2 => "H2",
            RuleId::P3 => "H3",
            RuleId::P4 => "H5",
            RuleId::P5 => "S0b",
            RuleId::P6 => "S4",
            RuleId::P7 => "S0",
            RuleId::P8 => "S1",
            RuleId::P9 => "S3",
            RuleId::P10 => "S5",
            RuleId::P11 => "S6",
            RuleId::P12 => "S7",
        }
    }
}

/// Everything a rule module needs to read in order to build its slice
/// of the model. All fields are immutable views (§3: "C1-C3 produce
/// immutable views consumed by C4-C8").
pub struct RuleContext<'a> {
    pub staff: &'a [Staff],
    pub calendar: &'a Calendar,
    pub requests: &'a ResolvedRequests,
    pub taxonomy: &'a SymbolTaxonomy,
    pub config: &'a RuleConfig,
    pub targets: &'a Targets,
    pub event_units: &'a EventUnits,
    /// `x[staff_idx][day]` decision variables, `day` 1-indexed (index 0
    /// unused, mirroring `Assignment`'s layout).
    pub x: &'a Vec<Vec<VarId>>,
    pub previous_last_week_holidays: &'a HashMap<StaffId, f32>,
}

impl<'a> RuleContext<'a> {
    pub fn x(&self, staff_idx: usize, day: crate::calendar::Day) -> VarId {
        self.x[staff_idx][day as usize]
    }
}

/// Build the `x[s,d]` boolean variable matrix. Every rule in this module
/// indexes into the same matrix, so it is assembled once, up front.
pub fn new_assignment_vars(staff_count: usize, calendar: &Calendar, model: &mut dyn SolverModel) -> Vec<Vec<VarId>> {
    let mut x = Vec::with_capacity(staff_count);
    for _ in 0..staff_count {
        let mut row = Vec::with_capacity(calendar.num_days() as usize + 1);
        row.push(VarId(usize::MAX)); // day 0 padding, never read
        for _ in calendar.days.iter() {
            row.push(model.new_bool());
        }
        x.push(row);
    }
    x
}

/// Runs every enabled rule, in the fixed definition order below, against
/// the model. Hard constraints are posted directly by each rule;
/// weighted soft penalties are folded into the objective via
/// `SolverModel::minimize`.
pub fn build_model(ctx: &RuleContext, model: &mut dyn SolverModel) {
    if ctx.config.e1_part_time_fix_enabled {
        part_time_fix::build(ctx, model);
    }
    if ctx.config.p1_monthly_holiday_target.enabled {
        monthly_holiday_target::build(ctx, model);
    }
    if ctx.config.p2_strict_leave.enabled {
        strict_leave::build(ctx, model);
    }
    if ctx.config.p3_manager_presence.enabled {
        manager_presence::build(ctx, model);
    }
    if ctx.config.p4_weekend_caps.enabled {
        weekend_caps::build_caps(ctx, model);
    }
    if ctx.config.p5_sunday_second_step.enabled {
        weekend_caps::build_sunday_second_step(ctx, model);
    }
    if ctx.config.p6_weak_leave.enabled {
        weak_leave::build(ctx, model);
    }
    if ctx.config.p7_weekly_rest.enabled {
        weekly_rest::build(ctx, model);
    }
    if ctx.config.p8_weekend_headcount.enabled {
        weekend_headcount::build(ctx, model);
    }
    if ctx.config.p9_outpatient_coabsence.enabled {
        outpatient_coabsence::build(ctx, model);
    }
    // P10's hard half (at least one recovery-ward PT or OT daily) is
    // always enforced regardless of the soft-penalty switch, per spec
    // §4.4: "enforce as hard ... Both halves behave independently for
    // the penalty but the union is a hard constraint."
    recovery_ward_coverage::build_hard(ctx, model);
    if ctx.config.p10_recovery_ward_coverage.enabled {
        recovery_ward_coverage::build_soft(ctx, model);
    }
    if ctx.config.p11_workload_leveling.enabled {
        workload_leveling::build(ctx, model);
    }
    if ctx.config.p12_consecutive_workday_cap.enabled {
        consecutive_cap::build(ctx, model);
    }
}

/// Shared helper: the deviation `|value - target|`, folded into the
/// objective with `weight` via an absolute-value auxiliary variable.
pub(crate) fn minimize_abs_deviation(
    model: &mut dyn SolverModel,
    value: LinearExpr,
    target: i32,
    weight: i32,
) {
    if weight == 0 {
        return;
    }
    let dev = model.add_abs_eq(value.plus_constant(-target));
    model.minimize(LinearExpr::new().term(weight, dev));
}

/// Shared helper: `max(0, value)`, folded into the objective with
/// `weight` via a non-negative auxiliary variable bounded above by
/// `upper_bound` (a caller-supplied, conservative cap on `value`).
pub(crate) fn minimize_positive_part(
    model: &mut dyn SolverModel,
    value: LinearExpr,
    upper_bound: i32,
    weight: i32,
) {
    if weight == 0 {
        return;
    }
    let over = model.new_int(0, upper_bound.max(0));
    model.add_linear_le(value.term(-1, over));
    model.minimize(LinearExpr::new().term(weight, over));
}

/// Reifies `value < threshold` into a pair of complementary booleans
/// `(below, at_least)`, exactly one of which is true in any solution.
/// Mirrors the `NewBoolVar` + `OnlyEnforceIf`/`OnlyEnforceIf(.Not())`
/// pattern the original prototype uses for its threshold penalties.
pub(crate) fn reify_below_threshold(model: &mut dyn SolverModel, value: LinearExpr, threshold: i32) -> (VarId, VarId) {
    let below = model.new_bool();
    let at_least = model.new_bool();
    model.add_linear_eq(LinearExpr::new().term(1, below).term(1, at_least).plus_constant(-1));

    let c_below = model.add_linear_le(value.clone().plus_constant(-(threshold - 1)));
    let c_at_least = model.add_linear_le(value.scaled(-1).plus_constant(threshold));
    model.only_enforce_if(c_below, below);
    model.only_enforce_if(c_at_least, at_least);

    (below, at_least)
}
