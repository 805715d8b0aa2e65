/*!
cost - The cost model (§4.C): estimate accelerator cost for a batch and
auto-calibrate transfer/launch constants from the first real dispatch.

The model never picks a path itself (§4.C: "The host picks the path based
on its cost-model comparison; the bridge exposes numbers, not decisions").
`estimate` is pure given its inputs and the current tunable/calibration
state; `Calibration::record` is the only mutation, and it happens at most
once per process (§3, §8 property 6).
*/

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::discovery::Bridge;
use crate::expr::Expr;
use crate::registry::OpcodeRegistry;

const ORDER: Ordering = Ordering::Relaxed;

/// A conservative default favoring the CPU path when nothing else is known
/// (§4.C: "default transfer cost favors CPU"). Dominates the estimate for
/// small batches, so a batch has to bring enough rows to amortize it
/// before the accelerator looks cheaper than the CPU reference cost of
/// `nrows * opcode_cost_sum`.
pub const DEFAULT_TRANSFER_COST_PER_BYTE: f64 = 0.05;
/// Conservative default launch overhead, in the same cost units as
/// `compute_cost`/`transfer_cost`.
pub const DEFAULT_LAUNCH_OVERHEAD: f64 = 50_000.0;
/// Conservative parallelism fallback when the accelerator's `parallelism`
/// entry point is unavailable or returns a non-positive value.
pub const DEFAULT_PARALLELISM: f64 = 1.0;

/// Process-wide, write-once-after-first-dispatch calibration state (§3).
#[derive(Debug, Default)]
pub struct Calibration {
    calibrated: AtomicBool,
    transfer: AtomicU64,
    launch: AtomicU64,
}

impl Calibration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrated.load(ORDER)
    }

    pub fn transfer_cost_per_byte(&self) -> f64 {
        f64::from_bits(self.transfer.load(ORDER))
    }

    pub fn launch_overhead(&self) -> f64 {
        f64::from_bits(self.launch.load(ORDER))
    }

    /// Record the result of the first successful accelerator dispatch.
    /// Monotone: a second call is a no-op (§4.C: "Calibration is monotone:
    /// it happens at most once per process").
    ///
    /// `estimated_compute` is the `compute_cost` term the estimator would
    /// have produced for that same dispatch, used to back out the launch
    /// overhead from the observed wall-clock time.
    pub fn record(&self, bytes_transferred: u64, elapsed_us: u64, estimated_compute: f64) {
        if self
            .calibrated
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        let elapsed = elapsed_us as f64;
        let bytes = bytes_transferred.max(1) as f64;
        let transfer = elapsed / bytes;
        let launch = (elapsed - estimated_compute).max(1.0);
        self.transfer.store(transfer.to_bits(), ORDER);
        self.launch.store(launch.to_bits(), ORDER);
    }
}

/// The breakdown returned by `estimate`. `valid == false` means every other
/// field is meaningless — the caller must not compare `total` across an
/// invalid estimate (§4.C's short-circuits).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CostEstimate {
    pub valid: bool,
    pub total: f64,
    pub transfer: f64,
    pub launch: f64,
    pub compute: f64,
}

impl CostEstimate {
    const INVALID: CostEstimate = CostEstimate {
        valid: false,
        total: 0.0,
        transfer: 0.0,
        launch: 0.0,
        compute: 0.0,
    };
}

/// Sum of `cost(opcode(fn))` over every function/operator application node
/// in `exprs`, descending into aggregate argument and filter expressions
/// but never charging for the aggregate wrapper itself (§4.C).
pub fn opcode_cost_sum(exprs: &[Expr], registry: &dyn OpcodeRegistry) -> f64 {
    exprs.iter().map(|e| node_cost(e, registry)).sum()
}

fn node_cost(expr: &Expr, registry: &dyn OpcodeRegistry) -> f64 {
    match expr {
        Expr::Constant | Expr::Column(_) => 0.0,
        Expr::Function { id, args } => {
            let opcode = registry.opcode_of(*id);
            let own = if opcode > 0 { registry.cost_of(opcode) } else { 0.0 };
            own + args.iter().map(|a| node_cost(a, registry)).sum::<f64>()
        }
        Expr::Aggregate { args, filter, .. } => {
            let mut total: f64 = args.iter().map(|a| node_cost(a, registry)).sum();
            if let Some(f) = filter {
                total += node_cost(f, registry);
            }
            total
        }
    }
}

fn effective_transfer_cost(bridge: &Bridge) -> f64 {
    let explicit = bridge.tunables().transfer_cost_per_byte();
    if explicit > 0.0 {
        return explicit;
    }
    if bridge.calibration().is_calibrated() {
        let calibrated = bridge.calibration().transfer_cost_per_byte();
        if calibrated > 0.0 {
            return calibrated;
        }
    }
    DEFAULT_TRANSFER_COST_PER_BYTE
}

fn effective_launch_overhead(bridge: &Bridge) -> f64 {
    let explicit = bridge.tunables().launch_overhead();
    if explicit > 0.0 {
        return explicit;
    }
    if bridge.calibration().is_calibrated() {
        let calibrated = bridge.calibration().launch_overhead();
        if calibrated > 0.0 {
            return calibrated;
        }
    }
    DEFAULT_LAUNCH_OVERHEAD
}

fn effective_parallelism(bridge: &Bridge) -> f64 {
    match bridge.api() {
        Some(api) => {
            // SAFETY: resolved by `discovery` with the `ParallelismFn`
            // signature; takes no arguments.
            let value = unsafe { (api.parallelism)() };
            if value > 0 {
                value as f64
            } else {
                DEFAULT_PARALLELISM
            }
        }
        None => DEFAULT_PARALLELISM,
    }
}

/// Estimate the cost of running `exprs` against `nrows` rows of
/// `row_width`-byte rows on the accelerator (§4.C).
///
/// Returns an invalid estimate if the bridge is disabled, `nrows <= 0`,
/// `min_batch_rows` is set and `nrows` is below it, or every aggregate
/// argument is opcode-cost-free (nothing for the accelerator to do).
pub fn estimate(
    bridge: &Bridge,
    exprs: &[Expr],
    nrows: i64,
    row_width: u32,
) -> CostEstimate {
    let Some(api) = bridge.api() else {
        return CostEstimate::INVALID;
    };
    if nrows <= 0 {
        return CostEstimate::INVALID;
    }
    let min_batch_rows = bridge.tunables().min_batch_rows();
    if min_batch_rows > 0 && (nrows as u64) < min_batch_rows as u64 {
        return CostEstimate::INVALID;
    }

    let opcode_cost_sum = opcode_cost_sum(exprs, api);
    if opcode_cost_sum <= 0.0 {
        return CostEstimate::INVALID;
    }

    let nrows = nrows as f64;
    let row_width = row_width as f64;

    let transfer_bytes = nrows * row_width * 2.0;
    let transfer = transfer_bytes * effective_transfer_cost(bridge);
    let launch = effective_launch_overhead(bridge);
    let compute = nrows * opcode_cost_sum / effective_parallelism(bridge);
    let total = transfer + launch + compute;

    CostEstimate {
        valid: true,
        total,
        transfer,
        launch,
        compute,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::test_support::FakeSymbols;
    use crate::expr::Expr;

    fn favorable_exprs() -> Vec<Expr> {
        vec![Expr::aggregate(
            1,
            vec![Expr::function(7, vec![Expr::Column(0)])],
            None,
        )]
    }

    #[test]
    fn disabled_bridge_is_invalid() {
        let bridge = Bridge::disabled();
        let est = estimate(&bridge, &favorable_exprs(), 1_000, 64);
        assert!(!est.valid);
    }

    #[test]
    fn non_positive_nrows_is_invalid() {
        let bridge = Bridge::init(&FakeSymbols::fully_present());
        assert!(!estimate(&bridge, &favorable_exprs(), 0, 64).valid);
        assert!(!estimate(&bridge, &favorable_exprs(), -5, 64).valid);
    }

    #[test]
    fn zero_opcode_cost_sum_is_invalid() {
        let bridge = Bridge::init(&FakeSymbols::fully_present());
        // Only constants/columns: opcode_cost_sum == 0.
        let exprs = vec![Expr::aggregate(1, vec![Expr::Column(0)], None)];
        assert!(!estimate(&bridge, &exprs, 10_000, 64).valid);
    }

    #[test]
    fn min_batch_rows_gate() {
        let bridge = Bridge::init(&FakeSymbols::fully_present());
        bridge.tunables().set_min_batch_rows(5_000);
        assert!(!estimate(&bridge, &favorable_exprs(), 4_999, 64).valid);
        assert!(estimate(&bridge, &favorable_exprs(), 5_000, 64).valid);
    }

    #[test]
    fn cost_is_monotone_in_rows_and_width() {
        let bridge = Bridge::init(&FakeSymbols::fully_present());
        let exprs = favorable_exprs();
        let small = estimate(&bridge, &exprs, 1_000, 64);
        let more_rows = estimate(&bridge, &exprs, 2_000, 64);
        let wider = estimate(&bridge, &exprs, 1_000, 128);
        assert!(more_rows.total >= small.total);
        assert!(wider.total >= small.total);
    }

    #[test]
    fn calibration_changes_effective_transfer_cost() {
        let bridge = Bridge::init(&FakeSymbols::fully_present());
        let exprs = favorable_exprs();
        let before = estimate(&bridge, &exprs, 10_000, 64);
        assert_eq!(
            effective_transfer_cost(&bridge),
            DEFAULT_TRANSFER_COST_PER_BYTE
        );

        bridge.calibration().record(1_000_000, 1_000, 0.0);
        assert_eq!(bridge.calibration().transfer_cost_per_byte(), 1e-3);

        let after = estimate(&bridge, &exprs, 10_000, 64);
        let ratio = 1e-3 / DEFAULT_TRANSFER_COST_PER_BYTE;
        assert!((after.transfer - before.transfer * ratio).abs() < 1e-9);
    }

    #[test]
    fn calibration_is_idempotent() {
        let calib = Calibration::new();
        calib.record(1_000_000, 1_000, 0.0);
        let first = calib.transfer_cost_per_byte();
        calib.record(2, 9_999_999, 0.0);
        assert_eq!(calib.transfer_cost_per_byte(), first);
    }
}
