//! Top-level error composing the two fatal kinds spec §7 names, built the
//! way the teacher's `shared::error::DomainError` is: a `thiserror` enum,
//! one variant per kind, propagated with `?` rather than swallowed.

use thiserror::Error;

use shared::DomainError;

#[derive(Debug, Error)]
pub enum RosterError {
    /// Required field missing from `staff_table`, taxonomy missing a
    /// reserved role, or a negative rule weight. Aborts before model
    /// assembly (§7: "ConfigurationError aborts before model assembly").
    #[error("configuration error: {0}")]
    Configuration(#[from] DomainError),

    /// The solver returned INFEASIBLE or UNKNOWN within the time budget.
    /// Aborts after solving; the improver and reporter never run (§7).
    #[error("solve produced no assignment: model is infeasible or its status could not be determined within the time budget")]
    InfeasibleModel,
}

pub type RosterResult<T> = Result<T, RosterError>;
