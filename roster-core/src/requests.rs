use std::collections::HashMap;

use tracing::warn;

use crate::calendar::Day;
use crate::staff::{Staff, StaffId};
use crate::taxonomy::{Coefficient, RoleId, SymbolTaxonomy};

/// Raw request cells as handed in at the boundary (§6):
/// `staff_id -> (day -> input_symbol)`.
pub type RawRequestTable = HashMap<StaffId, HashMap<Day, String>>;

/// A non-fatal note raised while resolving requests (§7 `RequestIgnored`).
#[derive(Debug, Clone, PartialEq)]
pub enum RequestWarning {
    UnknownInputSymbol { staff: StaffId, day: Day, symbol: String },
    UnknownStaff { staff: StaffId },
}

/// Sparse `(staff_idx, day) -> role` and `(staff_idx, day) -> coefficient`
/// maps, indexed by staff position in the roster rather than by string id,
/// so the rule engine never does a per-cell string lookup (design note §9).
#[derive(Debug, Clone, Default)]
pub struct ResolvedRequests {
    roles: HashMap<(usize, Day), RoleId>,
    coefficients: HashMap<(usize, Day), Coefficient>,
    pub warnings: Vec<RequestWarning>,
}

impl ResolvedRequests {
    pub fn role_of(&self, staff_idx: usize, day: Day) -> Option<&RoleId> {
        self.roles.get(&(staff_idx, day))
    }

    /// `coef_of(s,d)`: the role's coefficient if a role is present, else
    /// 1.0 — "plain working day if assigned to work" (§4.3).
    pub fn coef_of(&self, staff_idx: usize, day: Day) -> Coefficient {
        self.coefficients
            .get(&(staff_idx, day))
            .copied()
            .unwrap_or(Coefficient::Full)
    }
}

/// Build the per-(staff,day) role and coefficient maps from raw request
/// cells and the symbol taxonomy (C3).
///
/// A staff id present in `raw` but absent from `staff_order` is silently
/// dropped from the resolved maps (the core never fabricates staff) and
/// recorded as a `RequestWarning::UnknownStaff`.
pub fn resolve_requests(
    staff_order: &[Staff],
    raw: &RawRequestTable,
    taxonomy: &SymbolTaxonomy,
) -> ResolvedRequests {
    let mut index_of: HashMap<&StaffId, usize> = HashMap::new();
    for (idx, s) in staff_order.iter().enumerate() {
        index_of.insert(&s.id, idx);
    }

    let mut resolved = ResolvedRequests::default();

    for (staff_id, by_day) in raw {
        let Some(&staff_idx) = index_of.get(staff_id) else {
            warn!(staff = %staff_id, "request table references unknown staff id; dropping row");
            resolved
                .warnings
                .push(RequestWarning::UnknownStaff { staff: staff_id.clone() });
            continue;
        };

        for (&day, input_symbol) in by_day {
            match taxonomy.resolve(input_symbol) {
                Some(role) => {
                    let behavior = taxonomy
                        .behavior(role)
                        .expect("resolver only returns roles present in the taxonomy");
                    resolved.roles.insert((staff_idx, day), role.clone());
                    resolved.coefficients.insert((staff_idx, day), behavior.coef);
                }
                None => {
                    warn!(
                        staff = %staff_id, day, symbol = %input_symbol,
                        "unknown input symbol; ignoring cell"
                    );
                    resolved.warnings.push(RequestWarning::UnknownInputSymbol {
                        staff: staff_id.clone(),
                        day,
                        symbol: input_symbol.clone(),
                    });
                }
            }
        }
    }

    resolved
}
