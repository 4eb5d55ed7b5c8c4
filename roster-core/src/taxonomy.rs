use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use shared::DomainError;

/// A configured role identifier (e.g. `"paid_leave"`, `"strict_work"`).
/// Open-ended: the department configures its own set of roles through
/// `symbol_settings`. Only the two sentinel ids below are reserved.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub String);

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Default off-day output, used when `x[s,d]=0` and no role is present.
pub const HOLIDAY_DEFAULT: &str = "HOLIDAY_DEFAULT";
/// Default working-day output, used when `x[s,d]=1` and no role is present.
pub const WORK_DEFAULT: &str = "WORK_DEFAULT";
/// Rendered when a weak-holiday request was overridden to a working day.
pub const WORK_FROM_WEAK: &str = "WORK_FROM_WEAK";

/// The work-coefficient fraction of a full day's work a role delivers.
/// Closed to the four values the department's rule set recognizes
/// (§4.2): a half day is distinguished from a 70%-reduced day, both are
/// distinguished from a full day, and `Zero` marks a full holiday.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Coefficient {
    Zero,
    Half,
    SevenTenths,
    Full,
}

impl Coefficient {
    pub fn as_f32(self) -> f32 {
        match self {
            Coefficient::Zero => 0.0,
            Coefficient::Half => 0.5,
            Coefficient::SevenTenths => 0.7,
            Coefficient::Full => 1.0,
        }
    }

    pub fn from_f32(value: f32) -> Result<Self, DomainError> {
        const EPS: f32 = 1e-6;
        if (value - 0.0).abs() < EPS {
            Ok(Coefficient::Zero)
        } else if (value - 0.5).abs() < EPS {
            Ok(Coefficient::Half)
        } else if (value - 0.7).abs() < EPS {
            Ok(Coefficient::SevenTenths)
        } else if (value - 1.0).abs() < EPS {
            Ok(Coefficient::Full)
        } else {
            Err(DomainError::InvalidInput(format!(
                "work coefficient {value} is not one of {{0, 0.5, 0.7, 1.0}}"
            )))
        }
    }

    pub fn is_full_or_zero(self) -> bool {
        matches!(self, Coefficient::Zero | Coefficient::Full)
    }

    pub fn is_half(self) -> bool {
        matches!(self, Coefficient::Half | Coefficient::SevenTenths)
    }
}

/// How a configured role behaves once resolved (§4.2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Behavior {
    pub is_holiday: bool,
    pub strict: bool,
    pub coef: Coefficient,
    pub output_symbol: String,
    /// Roles in {paid, special, summer leave} that reduce the monthly
    /// holidays target in P1 (the "NC" term).
    pub excluded_from_monthly_count: bool,
}

impl Behavior {
    pub fn is_strict_holiday(&self) -> bool {
        self.is_holiday && self.strict
    }

    pub fn is_weak_holiday(&self) -> bool {
        self.is_holiday && !self.strict
    }

    pub fn is_strict_work(&self) -> bool {
        !self.is_holiday && self.strict
    }

    pub fn is_full_holiday(&self) -> bool {
        self.is_holiday && matches!(self.coef, Coefficient::Zero)
    }

    pub fn is_half_holiday(&self) -> bool {
        self.is_holiday && self.coef.is_half()
    }
}

/// Input-symbol -> role and role -> behavior resolution (§4.2).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolTaxonomy {
    input_to_role: HashMap<String, RoleId>,
    behaviors: HashMap<RoleId, Behavior>,
}

impl SymbolTaxonomy {
    pub fn new(
        input_to_role: HashMap<String, RoleId>,
        behaviors: HashMap<RoleId, Behavior>,
    ) -> Result<Self, DomainError> {
        if !behaviors.contains_key(&RoleId::from(HOLIDAY_DEFAULT)) {
            return Err(DomainError::InvalidInput(
                "symbol taxonomy is missing the reserved HOLIDAY_DEFAULT role".into(),
            ));
        }
        if !behaviors.contains_key(&RoleId::from(WORK_DEFAULT)) {
            return Err(DomainError::InvalidInput(
                "symbol taxonomy is missing the reserved WORK_DEFAULT role".into(),
            ));
        }
        Ok(Self {
            input_to_role,
            behaviors,
        })
    }

    /// Re-checks the two reserved roles are present. `new` already
    /// enforces this; `validate` exists so a taxonomy built by
    /// deserializing untrusted JSON (bypassing `new`) can be checked the
    /// same way before a solve (§7: "ConfigurationError aborts before
    /// model assembly").
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.behaviors.contains_key(&RoleId::from(HOLIDAY_DEFAULT)) {
            return Err(DomainError::InvalidInput(
                "symbol taxonomy is missing the reserved HOLIDAY_DEFAULT role".into(),
            ));
        }
        if !self.behaviors.contains_key(&RoleId::from(WORK_DEFAULT)) {
            return Err(DomainError::InvalidInput(
                "symbol taxonomy is missing the reserved WORK_DEFAULT role".into(),
            ));
        }
        Ok(())
    }

    /// `resolve(input_symbol) -> role | ⊥`. Unknown symbols resolve to
    /// `None`; the caller drops the cell (§4.2, §7 RequestIgnored).
    pub fn resolve(&self, input_symbol: &str) -> Option<&RoleId> {
        self.input_to_role.get(input_symbol)
    }

    pub fn behavior(&self, role: &RoleId) -> Option<&Behavior> {
        self.behaviors.get(role)
    }

    pub fn holiday_default(&self) -> &Behavior {
        self.behaviors
            .get(&RoleId::from(HOLIDAY_DEFAULT))
            .expect("validated present at construction")
    }

    pub fn work_default(&self) -> &Behavior {
        self.behaviors
            .get(&RoleId::from(WORK_DEFAULT))
            .expect("validated present at construction")
    }

    pub fn output_symbol_of(&self, role: Option<&RoleId>, working: bool) -> String {
        match (role, working) {
            (Some(r), false) => self
                .behavior(r)
                .map(|b| b.output_symbol.clone())
                .unwrap_or_else(|| self.holiday_default().output_symbol.clone()),
            (None, false) => self.holiday_default().output_symbol.clone(),
            (Some(r), true) => {
                let behavior = self.behavior(r);
                match behavior {
                    Some(b) if b.is_weak_holiday() => WORK_FROM_WEAK.to_string(),
                    Some(b) => b.output_symbol.clone(),
                    None => self.work_default().output_symbol.clone(),
                }
            }
            (None, true) => self.work_default().output_symbol.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_taxonomy() -> SymbolTaxonomy {
        let mut input_to_role = HashMap::new();
        input_to_role.insert("x".to_string(), RoleId::from("strict_holiday"));
        input_to_role.insert("triangle".to_string(), RoleId::from("weak_holiday"));

        let mut behaviors = HashMap::new();
        behaviors.insert(
            RoleId::from(HOLIDAY_DEFAULT),
            Behavior {
                is_holiday: true,
                strict: false,
                coef: Coefficient::Zero,
                output_symbol: "-".into(),
                excluded_from_monthly_count: false,
            },
        );
        behaviors.insert(
            RoleId::from(WORK_DEFAULT),
            Behavior {
                is_holiday: false,
                strict: false,
                coef: Coefficient::Full,
                output_symbol: "".into(),
                excluded_from_monthly_count: false,
            },
        );
        behaviors.insert(
            RoleId::from("strict_holiday"),
            Behavior {
                is_holiday: true,
                strict: true,
                coef: Coefficient::Zero,
                output_symbol: "X".into(),
                excluded_from_monthly_count: false,
            },
        );
        behaviors.insert(
            RoleId::from("weak_holiday"),
            Behavior {
                is_holiday: true,
                strict: false,
                coef: Coefficient::Zero,
                output_symbol: "△".into(),
                excluded_from_monthly_count: false,
            },
        );

        SymbolTaxonomy::new(input_to_role, behaviors).unwrap()
    }

    #[test]
    fn unknown_input_symbol_resolves_to_none() {
        let tax = sample_taxonomy();
        assert!(tax.resolve("???").is_none());
    }

    #[test]
    fn construction_fails_without_reserved_roles() {
        let behaviors = HashMap::new();
        let err = SymbolTaxonomy::new(HashMap::new(), behaviors);
        assert!(err.is_err());
    }

    #[test]
    fn validate_accepts_a_taxonomy_built_through_new() {
        assert!(sample_taxonomy().validate().is_ok());
    }

    #[test]
    fn validate_rejects_a_taxonomy_missing_reserved_roles() {
        // Simulates a taxonomy that arrived by deserializing untrusted
        // JSON rather than through `new`.
        let tax = SymbolTaxonomy::default();
        assert!(tax.validate().is_err());
    }

    #[test]
    fn weak_holiday_overridden_to_work_renders_work_from_weak() {
        let tax = sample_taxonomy();
        let role = tax.resolve("triangle").unwrap().clone();
        assert_eq!(tax.output_symbol_of(Some(&role), true), WORK_FROM_WEAK);
    }

    #[test]
    fn strict_holiday_off_day_renders_its_own_output_symbol() {
        let tax = sample_taxonomy();
        let role = tax.resolve("x").unwrap().clone();
        assert_eq!(tax.output_symbol_of(Some(&role), false), "X");
    }

    #[test]
    fn no_role_working_day_renders_work_default() {
        let tax = sample_taxonomy();
        assert_eq!(tax.output_symbol_of(None, true), "");
    }
}
