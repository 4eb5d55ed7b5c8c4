//! Rule enable/weight configuration (spec §9 design note: "expose rules
//! as an enumerated catalog keyed by rule-id with fields `{enabled,
//! weight, extras...}`"), plus the weekend headcount targets and
//! event-unit workloads that feed P8/P11.
//!
//! Programmatic construction (`RuleConfig::default()` then field
//! assignment) is the primary path for library callers. `RuleConfig::load`
//! layers TOML files and `APP__`-prefixed environment variables on top,
//! the way the teacher's `infrastructure::config::Settings::new` does.

use std::collections::HashMap;

use ::config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use shared::DomainError;

use crate::calendar::Day;
use crate::staff::Profession;

/// A single rule's on/off switch and weight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RuleSwitch {
    pub enabled: bool,
    pub weight: i32,
}

impl RuleSwitch {
    pub const fn new(weight: i32) -> Self {
        Self {
            enabled: true,
            weight,
        }
    }
}

/// P8's two independent weekend-headcount weights plus the PT/OT
/// tolerance band.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeekendHeadcountSwitch {
    pub enabled: bool,
    pub weight_combined_pt_ot: i32,
    pub weight_pt_ot_individual: i32,
    pub weight_st: i32,
    pub tolerance: i32,
}

/// P7's two weights: full 7-day weeks vs. the short first/last week.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeeklyRestSwitch {
    pub enabled: bool,
    pub weight_full_week: i32,
    pub weight_short_week: i32,
}

/// P11's standard and "heavy" leveling weights. `use_heavy` is a single
/// department-wide toggle (not a per-profession choice) mirroring the
/// original prototype's `high_flat_penalty` checkbox.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorkloadLevelingSwitch {
    pub enabled: bool,
    pub weight: i32,
    pub weight_heavy: i32,
    pub use_heavy: bool,
}

impl WorkloadLevelingSwitch {
    pub fn active_weight(&self) -> i32 {
        if self.use_heavy {
            self.weight_heavy
        } else {
            self.weight
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RuleConfig {
    /// E1 has no weight (it is enforced, not penalized) but can still be
    /// switched off entirely for scenarios with no part-time staff.
    pub e1_part_time_fix_enabled: bool,
    pub p1_monthly_holiday_target: RuleSwitch,
    pub p2_strict_leave: RuleSwitch,
    pub p3_manager_presence: RuleSwitch,
    pub p4_weekend_caps: RuleSwitch,
    pub p5_sunday_second_step: RuleSwitch,
    pub p6_weak_leave: RuleSwitch,
    pub p7_weekly_rest: WeeklyRestSwitch,
    pub p8_weekend_headcount: WeekendHeadcountSwitch,
    pub p9_outpatient_coabsence: RuleSwitch,
    pub p10_recovery_ward_coverage: RuleSwitch,
    pub p11_workload_leveling: WorkloadLevelingSwitch,
    pub p12_consecutive_workday_cap: RuleSwitch,
}

impl Default for RuleConfig {
    /// Defaults mirror the weights the original prototype ships as its
    /// UI defaults (`original_source/reha-shift-proto3.py`).
    fn default() -> Self {
        Self {
            e1_part_time_fix_enabled: true,
            p1_monthly_holiday_target: RuleSwitch::new(1000),
            p2_strict_leave: RuleSwitch::new(1000),
            p3_manager_presence: RuleSwitch::new(1000),
            p4_weekend_caps: RuleSwitch::new(1000),
            p5_sunday_second_step: RuleSwitch::new(50),
            p6_weak_leave: RuleSwitch::new(8),
            p7_weekly_rest: WeeklyRestSwitch {
                enabled: true,
                weight_full_week: 200,
                weight_short_week: 25,
            },
            p8_weekend_headcount: WeekendHeadcountSwitch {
                enabled: true,
                weight_combined_pt_ot: 50,
                weight_pt_ot_individual: 40,
                weight_st: 60,
                tolerance: 1,
            },
            p9_outpatient_coabsence: RuleSwitch::new(10),
            p10_recovery_ward_coverage: RuleSwitch::new(5),
            p11_workload_leveling: WorkloadLevelingSwitch {
                enabled: true,
                weight: 2,
                weight_heavy: 4,
                use_heavy: false,
            },
            p12_consecutive_workday_cap: RuleSwitch::new(50),
        }
    }
}

impl RuleConfig {
    /// Layers `config/default.toml`, `config/{RUN_ENV}.toml` and
    /// `APP__`-prefixed environment variables over the struct defaults,
    /// the way `infrastructure::config::Settings::new` does in the
    /// teacher repo.
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// §7 ConfigurationError: "rule weight negative". Every weight this
    /// catalog carries is a penalty multiplier; a negative one would
    /// invert a rule from a penalty into a reward.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut negative = Vec::new();
        let mut check = |name: &'static str, weight: i32| {
            if weight < 0 {
                negative.push(name);
            }
        };
        check("p1_monthly_holiday_target", self.p1_monthly_holiday_target.weight);
        check("p2_strict_leave", self.p2_strict_leave.weight);
        check("p3_manager_presence", self.p3_manager_presence.weight);
        check("p4_weekend_caps", self.p4_weekend_caps.weight);
        check("p5_sunday_second_step", self.p5_sunday_second_step.weight);
        check("p6_weak_leave", self.p6_weak_leave.weight);
        check("p7_weekly_rest.weight_full_week", self.p7_weekly_rest.weight_full_week);
        check("p7_weekly_rest.weight_short_week", self.p7_weekly_rest.weight_short_week);
        check("p8_weekend_headcount.weight_combined_pt_ot", self.p8_weekend_headcount.weight_combined_pt_ot);
        check("p8_weekend_headcount.weight_pt_ot_individual", self.p8_weekend_headcount.weight_pt_ot_individual);
        check("p8_weekend_headcount.weight_st", self.p8_weekend_headcount.weight_st);
        check("p9_outpatient_coabsence", self.p9_outpatient_coabsence.weight);
        check("p10_recovery_ward_coverage", self.p10_recovery_ward_coverage.weight);
        check("p11_workload_leveling.weight", self.p11_workload_leveling.weight);
        check("p11_workload_leveling.weight_heavy", self.p11_workload_leveling.weight_heavy);
        check("p12_consecutive_workday_cap", self.p12_consecutive_workday_cap.weight);

        if negative.is_empty() {
            Ok(())
        } else {
            Err(DomainError::InvalidInput(format!(
                "rule weights must be non-negative, but found negative weights on: {}",
                negative.join(", ")
            )))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayType {
    Sunday,
    SpecialSaturday,
}

/// Weekend headcount targets per profession, keyed by day type (§6
/// `targets`).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ProfessionTargets {
    pub pt: i32,
    pub ot: i32,
    pub st: i32,
}

impl ProfessionTargets {
    pub fn for_profession(&self, profession: Profession) -> i32 {
        match profession {
            Profession::Pt => self.pt,
            Profession::Ot => self.ot,
            Profession::St => self.st,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Targets {
    pub sunday: ProfessionTargets,
    pub special_saturday: ProfessionTargets,
}

impl Targets {
    pub fn for_day_type(&self, day_type: DayType) -> &ProfessionTargets {
        match day_type {
            DayType::Sunday => &self.sunday,
            DayType::SpecialSaturday => &self.special_saturday,
        }
    }
}

/// Per-weekday event unit load, per scope (§6 `event_units`). Sundays
/// carry no weekday workload and entries on them are ignored (§6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventUnits {
    pub all: HashMap<Day, i32>,
    pub pt: HashMap<Day, i32>,
    pub ot: HashMap<Day, i32>,
    pub st: HashMap<Day, i32>,
}

impl EventUnits {
    pub fn for_profession(&self, profession: Profession, day: Day) -> i32 {
        let map = match profession {
            Profession::Pt => &self.pt,
            Profession::Ot => &self.ot,
            Profession::St => &self.st,
        };
        map.get(&day).copied().unwrap_or(0)
    }

    pub fn all_scope(&self, day: Day) -> i32 {
        self.all.get(&day).copied().unwrap_or(0)
    }
}

/// C6 Local-Search Improver tuning (spec §4.5): `w_tri` deters moves that
/// discard a weak-holiday request at the trough day, and
/// `max_outer_iterations` bounds the hill-climb (spec default: 100).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ImproverConfig {
    pub w_tri: i32,
    pub max_outer_iterations: usize,
}

impl Default for ImproverConfig {
    fn default() -> Self {
        Self {
            w_tri: 15,
            max_outer_iterations: 100,
        }
    }
}
