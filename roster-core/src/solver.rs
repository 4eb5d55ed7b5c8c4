//! C5 Solver Driver: the production `SolverModel` backed by `selen`, a
//! constraint satisfaction solver (see
//! `examples/other_examples/.../radevgit-selen__examples_backup-employee_scheduling.rs.rs`
//! for the reference usage this module generalizes from single-sum
//! staffing constraints to arbitrary weighted linear objectives).

use std::collections::HashMap;
use std::time::Duration;

use selen::prelude::*;
use tracing::{debug, info};

use crate::model::{ConstraintId, LinearExpr, SolveOutcome, SolveStatus, Solution, SolverModel, VarId};

enum Kind {
    Eq,
    Le,
}

struct PendingConstraint {
    kind: Kind,
    expr: LinearExpr,
    condition: Option<VarId>,
}

/// `SolverModel` backed by the `selen` CSP/COP solver. Variables and
/// constraints are staged here and only translated into `selen::Model`
/// calls inside `solve`, so that `only_enforce_if` can attach a
/// condition to a constraint handle returned earlier.
pub struct SelenModel {
    bounds: Vec<(i32, i32)>,
    pending: Vec<PendingConstraint>,
    objective: LinearExpr,
}

impl Default for SelenModel {
    fn default() -> Self {
        Self {
            bounds: Vec::new(),
            pending: Vec::new(),
            objective: LinearExpr::new(),
        }
    }
}

impl SelenModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_var(&mut self, lo: i32, hi: i32) -> VarId {
        let id = VarId(self.bounds.len());
        self.bounds.push((lo, hi));
        id
    }

    /// A conservative bound on `|expr|` given the registered bounds of
    /// every variable it references, used to size the auxiliary
    /// variable `add_abs_eq` introduces.
    fn bound_of(&self, expr: &LinearExpr) -> i32 {
        let mut bound = expr.constant.unsigned_abs() as i64;
        for &(coeff, var) in &expr.terms {
            let (lo, hi) = self.bounds[var.0];
            let extreme = lo.unsigned_abs().max(hi.unsigned_abs()) as i64;
            bound += coeff.unsigned_abs() as i64 * extreme;
        }
        bound.min(i32::MAX as i64) as i32
    }
}

impl SolverModel for SelenModel {
    fn new_bool(&mut self) -> VarId {
        self.push_var(0, 1)
    }

    fn new_int(&mut self, lo: i32, hi: i32) -> VarId {
        self.push_var(lo, hi)
    }

    fn add_linear_eq(&mut self, expr: LinearExpr) -> ConstraintId {
        let id = ConstraintId(self.pending.len());
        self.pending.push(PendingConstraint {
            kind: Kind::Eq,
            expr,
            condition: None,
        });
        id
    }

    fn add_linear_le(&mut self, expr: LinearExpr) -> ConstraintId {
        let id = ConstraintId(self.pending.len());
        self.pending.push(PendingConstraint {
            kind: Kind::Le,
            expr,
            condition: None,
        });
        id
    }

    fn add_abs_eq(&mut self, inner: LinearExpr) -> VarId {
        let bound = self.bound_of(&inner);
        let target = self.push_var(0, bound);
        // target >= inner  <=>  inner - target <= 0
        self.add_linear_le(inner.clone().term(-1, target));
        // target >= -inner <=>  -inner - target <= 0
        self.add_linear_le(inner.scaled(-1).term(-1, target));
        target
    }

    fn only_enforce_if(&mut self, constraint: ConstraintId, condition: VarId) {
        self.pending[constraint.0].condition = Some(condition);
    }

    fn minimize(&mut self, expr: LinearExpr) {
        self.objective = std::mem::take(&mut self.objective) + expr;
    }

    fn solve(&mut self, time_limit: Duration, seed: u64) -> SolveOutcome {
        let mut m = Model::default();

        let selen_vars: Vec<_> = self
            .bounds
            .iter()
            .map(|&(lo, hi)| m.int(lo, hi))
            .collect();

        for pending in &self.pending {
            let lhs = linear_expr_to_selen(&m, &pending.expr, &selen_vars);
            let constraint = match pending.kind {
                Kind::Eq => m.c(lhs).eq(int(0)),
                Kind::Le => m.c(lhs).le(int(0)),
            };
            if let Some(cond) = pending.condition {
                constraint.only_enforce_if(selen_vars[cond.0]);
            }
        }

        let objective_expr = linear_expr_to_selen(&m, &self.objective, &selen_vars);
        m.minimize(objective_expr);

        debug!(
            vars = self.bounds.len(),
            constraints = self.pending.len(),
            time_limit_secs = time_limit.as_secs(),
            seed,
            "dispatching model to selen"
        );

        match m.solve_within(time_limit, seed) {
            Ok(solution) => {
                let mut values = HashMap::with_capacity(selen_vars.len());
                for (idx, &sv) in selen_vars.iter().enumerate() {
                    values.insert(VarId(idx), solution.get::<i32>(sv));
                }
                let objective_value = self.objective.eval(&values);
                info!(objective_value, "solve produced a solution");
                SolveOutcome {
                    status: SolveStatus::Optimal,
                    solution: Some(Solution::new(values)),
                    objective_value: Some(objective_value),
                }
            }
            Err(_) => SolveOutcome {
                status: SolveStatus::Infeasible,
                solution: None,
                objective_value: None,
            },
        }
    }
}

/// Translates our `LinearExpr` (our own `VarId`s) into a `selen` sum
/// expression over its `selen::VarId`s, folding the constant in as a
/// fixed-value term.
fn linear_expr_to_selen(m: &Model, expr: &LinearExpr, selen_vars: &[selen::prelude::VarId]) -> selen::prelude::Expr {
    let mut parts: Vec<Expr> = expr
        .terms
        .iter()
        .map(|&(coeff, var)| selen_vars[var.0] * coeff)
        .collect();
    if expr.constant != 0 {
        parts.push(int(expr.constant));
    }
    m.sum_exprs(&parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_of_sums_worst_case_magnitudes() {
        let mut model = SelenModel::new();
        let a = model.new_int(-5, 10);
        let b = model.new_int(0, 3);
        let expr = LinearExpr::new().term(2, a).term(-1, b).plus_constant(4);
        // |2*10| + |1*3| + 4 = 20 + 3 + 4 = 27
        assert_eq!(model.bound_of(&expr), 27);
    }

    #[test]
    fn add_abs_eq_registers_two_inequalities_and_one_variable() {
        let mut model = SelenModel::new();
        let a = model.new_int(0, 18);
        let before_vars = model.bounds.len();
        let before_constraints = model.pending.len();
        let _target = model.add_abs_eq(LinearExpr::new().term(1, a).plus_constant(-9));
        assert_eq!(model.bounds.len(), before_vars + 1);
        assert_eq!(model.pending.len(), before_constraints + 2);
    }

    #[test]
    fn only_enforce_if_records_condition_on_the_right_constraint() {
        let mut model = SelenModel::new();
        let a = model.new_int(0, 1);
        let b = model.new_bool();
        let c1 = model.add_linear_le(LinearExpr::new().term(1, a));
        let _c2 = model.add_linear_le(LinearExpr::new().term(1, a).plus_constant(-1));
        model.only_enforce_if(c1, b);
        assert_eq!(model.pending[0].condition, Some(b));
        assert!(model.pending[1].condition.is_none());
    }
}
