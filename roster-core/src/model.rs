//! The CP abstraction layer C4 (Rule Engine) builds against and C5
//! (Solver Driver) implements.
//!
//! Design note (spec §9): "treat the constraint solver as a black-box
//! collaborator exposing operations `new_bool`, `new_int(lo, hi)`,
//! `add_linear_eq`, `add_linear_le`, `add_abs_eq`, `only_enforce_if`,
//! `minimize`, `solve(time_limit, seed)`. The core neither mentions nor
//! assumes any specific implementation." `SolverModel` is that
//! black box; `crate::solver::SelenModel` is its one production
//! implementation, and tests stand in a `mockall`-generated mock so the
//! rule engine (C4) can be exercised without invoking a real solve.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Handle to a decision variable. Opaque outside this module and
/// `solver.rs` — the rule engine only ever threads these through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarId(pub usize);

/// Handle to a previously-added constraint, used to make it conditional
/// via `only_enforce_if`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstraintId(pub usize);

/// A weighted sum of variables plus a constant: `Σ coeff·var + constant`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    pub terms: Vec<(i32, VarId)>,
    pub constant: i32,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(c: i32) -> Self {
        Self {
            terms: Vec::new(),
            constant: c,
        }
    }

    pub fn term(mut self, coeff: i32, var: VarId) -> Self {
        self.terms.push((coeff, var));
        self
    }

    pub fn plus_constant(mut self, c: i32) -> Self {
        self.constant += c;
        self
    }

    /// Unweighted sum of `vars`.
    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (1, v)).collect(),
            constant: 0,
        }
    }

    pub fn scaled(mut self, k: i32) -> Self {
        for (coeff, _) in self.terms.iter_mut() {
            *coeff *= k;
        }
        self.constant *= k;
        self
    }

    /// Evaluates the expression against a found solution. Used to report
    /// the objective value (spec §6 `objective_value`) without requiring
    /// the black-box solver to expose its own objective accessor.
    pub fn eval(&self, values: &std::collections::HashMap<VarId, i32>) -> i64 {
        let mut total = self.constant as i64;
        for &(coeff, var) in &self.terms {
            total += coeff as i64 * *values.get(&var).expect("solution covers every registered variable") as i64;
        }
        total
    }
}

impl std::ops::Add for LinearExpr {
    type Output = LinearExpr;
    fn add(mut self, rhs: LinearExpr) -> LinearExpr {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
        self
    }
}

impl std::ops::Sub for LinearExpr {
    type Output = LinearExpr;
    fn sub(self, rhs: LinearExpr) -> LinearExpr {
        self + rhs.scaled(-1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    Unknown,
}

impl SolveStatus {
    pub fn has_assignment(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

/// A found assignment of values to every variable registered with the
/// model up to the point `solve` was called.
#[derive(Debug, Clone, Default)]
pub struct Solution {
    values: std::collections::HashMap<VarId, i32>,
}

impl Solution {
    pub fn new(values: std::collections::HashMap<VarId, i32>) -> Self {
        Self { values }
    }

    pub fn value(&self, var: VarId) -> i32 {
        *self
            .values
            .get(&var)
            .expect("solution queried for a variable that was never registered")
    }

    pub fn bool_value(&self, var: VarId) -> bool {
        self.value(var) != 0
    }
}

#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub solution: Option<Solution>,
    /// The objective's value at `solution`, non-negative per spec §6.
    /// `None` when no solution was found.
    pub objective_value: Option<i64>,
}

/// The black-box constraint solver collaborator (spec §9 design note).
#[cfg_attr(test, mockall::automock)]
pub trait SolverModel {
    fn new_bool(&mut self) -> VarId;
    fn new_int(&mut self, lo: i32, hi: i32) -> VarId;
    /// Posts `expr == 0`.
    fn add_linear_eq(&mut self, expr: LinearExpr) -> ConstraintId;
    /// Posts `expr <= 0`.
    fn add_linear_le(&mut self, expr: LinearExpr) -> ConstraintId;
    /// Introduces and returns a fresh variable constrained to `|inner|`.
    fn add_abs_eq(&mut self, inner: LinearExpr) -> VarId;
    /// Makes a previously-added constraint conditional on `condition`
    /// being true; the constraint is dropped (always satisfied) when
    /// `condition` is false.
    fn only_enforce_if(&mut self, constraint: ConstraintId, condition: VarId);
    /// Accumulates `expr` into the objective to minimize. May be called
    /// more than once; contributions add up.
    fn minimize(&mut self, expr: LinearExpr);
    fn solve(&mut self, time_limit: Duration, seed: u64) -> SolveOutcome;
}
