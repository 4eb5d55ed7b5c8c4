use std::fmt;

use serde::{Deserialize, Serialize};

/// Staff identifier as carried on spreadsheet rows and request tables.
///
/// Wrapped rather than a bare `String` so the rule engine and request
/// resolver can't accidentally compare a staff id against a day label or
/// an input symbol.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffId(pub String);

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StaffId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for StaffId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One of the three rehabilitation professions this department staffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Profession {
    Pt,
    Ot,
    St,
}

impl Profession {
    pub const ALL: [Profession; 3] = [Profession::Pt, Profession::Ot, Profession::St];
}

impl fmt::Display for Profession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Profession::Pt => "PT",
            Profession::Ot => "OT",
            Profession::St => "ST",
        };
        write!(f, "{s}")
    }
}

/// Whether weekend caps and monthly-target rules apply in full (regular)
/// or whether the E1 fixed-assignment shortcut applies instead (part-time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentKind {
    Regular,
    PartTime,
}

/// A staff's fixed specialty assignment, consumed by P9 and P10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleTag {
    RecoveryWardPt,
    RecoveryWardOt,
    OutpatientPt,
    CommunityCare,
}

/// Per-staff weekend ceilings consumed by P4/P5. Any field may be absent;
/// absence means "no cap configured for this axis".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekendCaps {
    pub sunday_cap: Option<u32>,
    pub saturday_cap: Option<u32>,
    pub weekend_cap: Option<u32>,
}

/// A read-only staff record. Staff entities never change during a solve
/// (§3: "Staff entities are read-only throughout a solve").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    pub id: StaffId,
    pub display_name: String,
    pub profession: Profession,
    /// Nominal work volume for a full working day.
    pub daily_unit_capacity: u32,
    pub employment_kind: EmploymentKind,
    /// Presence of a managerial title, consumed by P3 and the improver's
    /// `move_is_safe` check.
    pub is_manager: bool,
    pub role_tag: Option<RoleTag>,
    pub weekend_caps: WeekendCaps,
}

impl Staff {
    pub fn is_part_time(&self) -> bool {
        self.employment_kind == EmploymentKind::PartTime
    }
}
