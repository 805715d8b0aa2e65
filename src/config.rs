/*!
config - The three host-configurable tunables (§4.A, §6) and the
diagnostic status record.

The host configuration subsystem owns registration and live updates; this
module only owns storage and read access. Because tunables can be updated
concurrently with cost estimation from another thread in the host (§5:
"Tunables are managed by the host configuration subsystem... the cost
model reads their current values on each call"), storage is a handful of
atomics rather than a plain struct, so a read never blocks on a concurrent
write.
*/

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

const ORDER: Ordering = Ordering::Relaxed;

/// Live-updatable tunables. `0.0`/`0` is the "defer to calibration or a
/// conservative default" sentinel for every field (§4.A, §6).
#[derive(Debug, Default)]
pub struct Tunables {
    transfer_cost_per_byte: AtomicU64,
    launch_overhead: AtomicU64,
    min_batch_rows: AtomicU32,
}

impl Tunables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transfer_cost_per_byte(&self) -> f64 {
        f64::from_bits(self.transfer_cost_per_byte.load(ORDER))
    }

    pub fn set_transfer_cost_per_byte(&self, value: f64) {
        self.transfer_cost_per_byte.store(value.to_bits(), ORDER);
    }

    pub fn launch_overhead(&self) -> f64 {
        f64::from_bits(self.launch_overhead.load(ORDER))
    }

    pub fn set_launch_overhead(&self, value: f64) {
        self.launch_overhead.store(value.to_bits(), ORDER);
    }

    pub fn min_batch_rows(&self) -> u32 {
        self.min_batch_rows.load(ORDER)
    }

    pub fn set_min_batch_rows(&self, value: u32) {
        self.min_batch_rows.store(value, ORDER);
    }
}

/// Snapshot returned by the nullary diagnostic query (§6).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub enabled: bool,
    pub accelerator_detected: bool,
    pub host_detected: bool,
    pub transfer_cost_per_byte: f64,
    pub launch_overhead: f64,
    pub min_batch_rows: u32,
}
