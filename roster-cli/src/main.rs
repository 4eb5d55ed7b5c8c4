//! Thin, synchronous CLI front-end over `roster-core`: reads a solve
//! request as JSON, runs the pipeline once, and writes the report as
//! JSON. No persistence, no wire protocol — a process boundary only,
//! the way the spec (§6) scopes every other boundary out of the core.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roster_core::config::{EventUnits, ImproverConfig, RuleConfig, Targets};
use roster_core::requests::RawRequestTable;
use roster_core::staff::{Profession, RoleTag, Staff, StaffId};
use roster_core::taxonomy::SymbolTaxonomy;
use roster_core::{ReportStatus, SolveRequest};

#[derive(Parser)]
#[command(name = "roster-cli", about = "rehabilitation staff roster engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one solve against a JSON request file and print the report.
    Solve {
        /// Path to a JSON-encoded solve request (see `SolveInput`).
        #[arg(long)]
        input: PathBuf,
        /// Where to write the JSON report; stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roster_core=info,roster_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Solve { input, output } => run_solve(&input, output.as_deref()),
    }
}

/// Everything a solve request needs, deserialized straight off the wire
/// (spec §6 "Inputs"). Fields with sensible catalog/struct defaults are
/// optional so a caller can omit anything it doesn't want to override.
#[derive(Deserialize)]
struct SolveInput {
    year: u16,
    month: u8,
    staff_table: Vec<Staff>,
    #[serde(default)]
    request_table: RawRequestTable,
    symbol_settings: SymbolTaxonomy,
    #[serde(default)]
    rule_config: RuleConfig,
    #[serde(default)]
    improver_config: ImproverConfig,
    #[serde(default)]
    targets: Targets,
    #[serde(default)]
    event_units: EventUnits,
    #[serde(default)]
    saturday_is_special: bool,
    #[serde(default)]
    previous_last_week_holidays: HashMap<StaffId, f32>,
    #[serde(default = "default_time_limit_secs")]
    time_limit_secs: u64,
    #[serde(default)]
    seed: u64,
}

fn default_time_limit_secs() -> u64 {
    roster_core::DEFAULT_TIME_BUDGET.as_secs()
}

fn run_solve(input_path: &std::path::Path, output_path: Option<&std::path::Path>) -> anyhow::Result<()> {
    tracing::info!(path = %input_path.display(), "reading solve request");
    let raw = fs::read_to_string(input_path)?;
    let input: SolveInput = serde_json::from_str(&raw)?;

    let request = SolveRequest {
        year: input.year,
        month: input.month,
        staff_table: input.staff_table,
        request_table: input.request_table,
        symbol_settings: input.symbol_settings,
        rule_config: input.rule_config,
        improver_config: input.improver_config,
        targets: input.targets,
        event_units: input.event_units,
        saturday_is_special: input.saturday_is_special,
        previous_last_week_holidays: input.previous_last_week_holidays,
        time_limit: std::time::Duration::from_secs(input.time_limit_secs),
        seed: input.seed,
    };

    let staff_ids: Vec<StaffId> = request.staff_table.iter().map(|s| s.id.clone()).collect();
    let num_days = roster_core::calendar::Calendar::new(request.year, request.month, request.saturday_is_special).num_days();

    let report = roster_core::solve(request)?;
    tracing::info!(
        status = ?report.status,
        violations = report.violations.len(),
        objective_value = report.objective_value,
        "solve finished"
    );

    let view = ReportView::from_report(&report, &staff_ids, num_days);
    let json = serde_json::to_string_pretty(&view)?;

    match output_path {
        Some(path) => {
            fs::write(path, json)?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => println!("{json}"),
    }

    Ok(())
}

#[derive(Serialize)]
struct ReportView {
    status: String,
    objective_value: i64,
    schedule_grid: Vec<StaffScheduleView>,
    daily_summary: Vec<DailySummaryView>,
    violations: Vec<ViolationView>,
}

impl ReportView {
    fn from_report(report: &roster_core::SolveReport, staff_ids: &[StaffId], num_days: roster_core::calendar::Day) -> Self {
        let status = match report.status {
            ReportStatus::Optimal => "OPTIMAL",
            ReportStatus::Feasible => "FEASIBLE",
        }
        .to_string();

        let schedule_grid = staff_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| StaffScheduleView {
                staff: id.to_string(),
                symbols: (1..=num_days).map(|day| report.schedule_grid.symbol_of(idx, day).to_string()).collect(),
            })
            .collect();

        let daily_summary = report.daily_summary.iter().map(DailySummaryView::from_domain).collect();

        let violations = report
            .violations
            .iter()
            .map(|v| ViolationView {
                rule: v.rule.to_string(),
                staff: v.staff.as_ref().map(|s| s.to_string()),
                day: v.day,
                highlighted_days: v.highlighted_days.clone(),
                detail: v.detail.clone(),
            })
            .collect();

        Self {
            status,
            objective_value: report.objective_value,
            schedule_grid,
            daily_summary,
            violations,
        }
    }
}

#[derive(Serialize)]
struct StaffScheduleView {
    staff: String,
    symbols: Vec<String>,
}

#[derive(Serialize)]
struct DailySummaryView {
    day: roster_core::calendar::Day,
    total_headcount: f32,
    headcount_by_profession: HashMap<Profession, f32>,
    manager_headcount: f32,
    headcount_by_role_tag: HashMap<RoleTag, f32>,
    delivered_units_by_profession: Option<HashMap<Profession, f32>>,
}

impl DailySummaryView {
    fn from_domain(summary: &roster_core::output::DailySummary) -> Self {
        Self {
            day: summary.day,
            total_headcount: summary.total_headcount,
            headcount_by_profession: summary.headcount_by_profession.clone(),
            manager_headcount: summary.manager_headcount,
            headcount_by_role_tag: summary.headcount_by_role_tag.clone(),
            delivered_units_by_profession: summary.delivered_units_by_profession.clone(),
        }
    }
}

#[derive(Serialize)]
struct ViolationView {
    rule: String,
    staff: Option<String>,
    day: Option<roster_core::calendar::Day>,
    highlighted_days: Vec<roster_core::calendar::Day>,
    detail: String,
}
