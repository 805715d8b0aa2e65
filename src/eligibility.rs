/*!
eligibility - The eligibility analyzer, component B (§4.B). Pure,
read-only, produces only debug-level diagnostics on rejection — this
module never allocates a KDS buffer or touches the accelerator.
*/

use crate::discovery::Bridge;
use crate::expr::{Expr, FunctionId};
use crate::registry::OpcodeRegistry;

/// Decide whether every aggregate expression in `exprs` is eligible for
/// the accelerated path (§4.B).
///
/// An empty expression list is ineligible. If the bridge is disabled, the
/// result is always ineligible (silent — §4.A's "no-op... without
/// touching the tunables or allocating memory").
pub fn check(bridge: &Bridge, exprs: &[Expr]) -> bool {
    let Some(api) = bridge.api() else {
        return false;
    };
    if exprs.is_empty() {
        return false;
    }
    exprs.iter().all(|e| node_eligible(e, api))
}

fn node_eligible(expr: &Expr, registry: &dyn OpcodeRegistry) -> bool {
    match expr {
        Expr::Constant | Expr::Column(_) => true,
        Expr::Function { id, args } => {
            if !function_supported(*id, registry) {
                tracing::debug!(function = id.0, "rejecting: function not registered");
                return false;
            }
            args.iter().all(|a| node_eligible(a, registry))
        }
        Expr::Aggregate { args, filter, .. } => {
            let args_ok = args.iter().all(|a| node_eligible(a, registry));
            let filter_ok = filter
                .as_ref()
                .is_none_or(|f| node_eligible(f, registry));
            args_ok && filter_ok
        }
    }
}

fn function_supported(id: FunctionId, registry: &dyn OpcodeRegistry) -> bool {
    registry.opcode_of(id) > 0
}
