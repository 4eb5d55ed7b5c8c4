//! The rehabilitation department's monthly roster engine — the
//! shift-optimization core described in the project specification.
//!
//! This crate is a synchronous, in-process library (spec §5): a solve is
//! one blocking call from a fully-formed [`SolveRequest`] to a
//! [`SolveReport`]. It owns no persistence and no presentation; external
//! collaborators (spreadsheet I/O, a settings store, an HTTP boundary)
//! sit outside this crate entirely (spec §1, §6).
//!
//! The pipeline, in dependency order (spec §2):
//!
//! C1 [`calendar`] → C2 [`taxonomy`] → C3 [`requests`] → C4 [`rules`] →
//! C5 [`solver`] → C6 [`improver`] → C7 [`violations`] → C8 [`output`].
//!
//! [`solve`] wires all eight together; callers who only need one stage
//! (e.g. a test harness exercising the rule engine against a
//! `MockSolverModel`) can reach the component modules directly.

pub mod assignment;
pub mod calendar;
pub mod config;
pub mod error;
pub mod improver;
pub mod model;
pub mod output;
pub mod requests;
pub mod rules;
pub mod solver;
pub mod staff;
pub mod taxonomy;
pub mod violations;

use std::collections::HashMap;
use std::time::Duration;

use tracing::{info, info_span};

use crate::assignment::Assignment;
use crate::calendar::Calendar;
use crate::config::{EventUnits, ImproverConfig, RuleConfig, Targets};
use crate::error::{RosterError, RosterResult};
use crate::improver::{Improver, Move};
use crate::model::{SolveStatus, SolverModel};
use crate::output::{DailySummary, OutputAssembler, ScheduleGrid};
use crate::requests::{resolve_requests, RawRequestTable};
use crate::rules::{build_model, new_assignment_vars, RuleContext};
use crate::solver::SelenModel;
use crate::staff::{Staff, StaffId};
use crate::taxonomy::SymbolTaxonomy;
use crate::violations::{Violation, ViolationReporter};

/// The solver's time budget (spec §4.4 "Solver contract (C5)": "Time
/// budget: 60 s wall-clock").
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(60);
/// The deterministic seed the driver falls back to when a caller doesn't
/// override it (spec §4.4: "The driver sets a deterministic seed;
/// callers may override for reproducibility").
pub const DEFAULT_SEED: u64 = 0;

/// Everything a solve needs (spec §6 "Inputs (all required per solve)").
pub struct SolveRequest {
    pub year: u16,
    pub month: u8,
    pub staff_table: Vec<Staff>,
    pub request_table: RawRequestTable,
    pub symbol_settings: SymbolTaxonomy,
    pub rule_config: RuleConfig,
    pub improver_config: ImproverConfig,
    pub targets: Targets,
    pub event_units: EventUnits,
    pub saturday_is_special: bool,
    pub previous_last_week_holidays: HashMap<StaffId, f32>,
    pub time_limit: Duration,
    pub seed: u64,
}

impl SolveRequest {
    /// Convenience constructor using the spec's default time budget and
    /// seed (§4.4); callers needing reproducible-but-different runs set
    /// `time_limit`/`seed` directly on the returned value.
    pub fn new(
        year: u16,
        month: u8,
        staff_table: Vec<Staff>,
        request_table: RawRequestTable,
        symbol_settings: SymbolTaxonomy,
        rule_config: RuleConfig,
        targets: Targets,
        event_units: EventUnits,
        saturday_is_special: bool,
    ) -> Self {
        Self {
            year,
            month,
            staff_table,
            request_table,
            symbol_settings,
            rule_config,
            improver_config: ImproverConfig::default(),
            targets,
            event_units,
            saturday_is_special,
            previous_last_week_holidays: HashMap::new(),
            time_limit: DEFAULT_TIME_BUDGET,
            seed: DEFAULT_SEED,
        }
    }
}

/// Mirrors the CP solver's own status (spec §6 `status`); `Infeasible`
/// never actually reaches a caller of [`solve`] because that path returns
/// `Err(RosterError::InfeasibleModel)` instead (spec §7), but the variant
/// is kept so `SolveStatus` and `ReportStatus` stay in lockstep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    Optimal,
    Feasible,
}

impl ReportStatus {
    fn from_solve_status(status: SolveStatus) -> Option<Self> {
        match status {
            SolveStatus::Optimal => Some(ReportStatus::Optimal),
            SolveStatus::Feasible => Some(ReportStatus::Feasible),
            SolveStatus::Infeasible | SolveStatus::Unknown => None,
        }
    }
}

/// Everything a solve produces (spec §6 "Outputs").
pub struct SolveReport {
    pub status: ReportStatus,
    pub assignment: Assignment,
    pub schedule_grid: ScheduleGrid,
    pub daily_summary: Vec<DailySummary>,
    pub violations: Vec<Violation>,
    pub objective_value: i64,
    /// Every peak→trough swap C6 committed, in application order. Not
    /// part of spec §6's output list verbatim, but useful for callers
    /// auditing what the improver changed; diagnostic only.
    pub improver_moves: Vec<Move>,
}

/// Runs the full C1-C8 pipeline once, synchronously (spec §5: "single-
/// threaded, synchronous... a bounded computation that returns a result
/// or a fatal status").
///
/// # Errors
/// [`RosterError::Configuration`] if a rule weight is negative (symbol
/// taxonomy validity is already enforced by [`SymbolTaxonomy::new`] at
/// construction, spec §7: "ConfigurationError aborts before model
/// assembly"). [`RosterError::InfeasibleModel`] if the solver returns
/// INFEASIBLE or UNKNOWN within the time budget — in that case neither
/// the improver nor the reporter runs (spec §7).
pub fn solve(request: SolveRequest) -> RosterResult<SolveReport> {
    request.rule_config.validate()?;
    request.symbol_settings.validate()?;

    let calendar_span = info_span!("calendar", year = request.year, month = request.month);
    let calendar = calendar_span
        .in_scope(|| Calendar::new(request.year, request.month, request.saturday_is_special));

    let requests_span = info_span!("requests", staff = request.staff_table.len());
    let resolved_requests = requests_span.in_scope(|| {
        resolve_requests(&request.staff_table, &request.request_table, &request.symbol_settings)
    });
    if !resolved_requests.warnings.is_empty() {
        info!(count = resolved_requests.warnings.len(), "requests carried non-fatal warnings");
    }

    let mut model = SelenModel::new();
    let rule_engine_span = info_span!("rule_engine");
    let x = rule_engine_span.in_scope(|| {
        let x = new_assignment_vars(request.staff_table.len(), &calendar, &mut model);
        let ctx = RuleContext {
            staff: &request.staff_table,
            calendar: &calendar,
            requests: &resolved_requests,
            taxonomy: &request.symbol_settings,
            config: &request.rule_config,
            targets: &request.targets,
            event_units: &request.event_units,
            x: &x,
            previous_last_week_holidays: &request.previous_last_week_holidays,
        };
        build_model(&ctx, &mut model);
        x
    });

    let solver_span = info_span!("solver", time_limit_secs = request.time_limit.as_secs(), seed = request.seed);
    let outcome = solver_span.in_scope(|| model.solve(request.time_limit, request.seed));

    let Some(report_status) = ReportStatus::from_solve_status(outcome.status) else {
        return Err(RosterError::InfeasibleModel);
    };
    let solution = outcome
        .solution
        .expect("a feasible/optimal status always carries a solution");
    let objective_value = outcome.objective_value.unwrap_or(0);

    let mut assignment = Assignment::new(request.staff_table.len(), calendar.num_days());
    for (staff_idx, _) in request.staff_table.iter().enumerate() {
        for &day in &calendar.days {
            assignment.set(staff_idx, day, solution.bool_value(x[staff_idx][day as usize]));
        }
    }

    let improver_span = info_span!("improver");
    let improver_moves = improver_span.in_scope(|| {
        let improver = Improver {
            staff: &request.staff_table,
            calendar: &calendar,
            requests: &resolved_requests,
            taxonomy: &request.symbol_settings,
            improver_config: &request.improver_config,
            previous_last_week_holidays: &request.previous_last_week_holidays,
        };
        improver.improve(&mut assignment)
    });
    info!(moves = improver_moves.len(), "local-search improver finished");

    let reporter_span = info_span!("violation_reporter");
    let violations = reporter_span.in_scope(|| {
        let reporter = ViolationReporter {
            staff: &request.staff_table,
            calendar: &calendar,
            requests: &resolved_requests,
            taxonomy: &request.symbol_settings,
            config: &request.rule_config,
            targets: &request.targets,
            event_units: &request.event_units,
            previous_last_week_holidays: &request.previous_last_week_holidays,
        };
        reporter.report(&assignment)
    });

    let output_span = info_span!("output_assembler");
    let (schedule_grid, daily_summary) = output_span.in_scope(|| {
        let assembler = OutputAssembler {
            staff: &request.staff_table,
            calendar: &calendar,
            requests: &resolved_requests,
            taxonomy: &request.symbol_settings,
        };
        (assembler.schedule_grid(&assignment), assembler.daily_summary(&assignment))
    });

    Ok(SolveReport {
        status: report_status,
        assignment,
        schedule_grid,
        daily_summary,
        violations,
        objective_value,
        improver_moves,
    })
}
