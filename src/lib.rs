#![doc = r#"
kdsbridge - Arrow→KDS accelerator bridge.

This crate is the bridge layer between a time-series aggregation engine
that produces decompressed Arrow batches and a heterogeneous execution
engine that consumes a different columnar binary layout ("KDS") to run
compiled per-row kernels on an accelerator. For each incoming batch it
decides whether the accelerator is cheaper than the CPU path, transcodes
eligible batches into KDS, dispatches them, folds results back into the
aggregation engine's partial-aggregate form, and transparently falls back
to CPU on any failure.

Modules:
- expr: the aggregate expression tree (function/aggregate applications,
  constants, column references) consumed by the eligibility analyzer and
  cost model.
- registry: the accelerator's four entry points (§6) and the
  `OpcodeRegistry` trait `eligibility`/`cost` consult.
- discovery: runtime discovery — resolves the four accelerator entry
  points and the host sentinel symbol, and owns the resulting `Bridge`
  capability record.
- eligibility: the eligibility analyzer (component B).
- cost: the cost model and calibration state (component C).
- kds: the Arrow→KDS transcoder (component D) and its reverse, result
  decoding.
- arrow: the external Arrow-batch input model (column descriptors,
  arrays, batches).
- dispatch: the dispatcher (component E) — the policy wrapper that ties
  B, C, D, and the accelerator's `submit` entry point together.
- config: host-configurable tunables and the diagnostic status record.
- error: the crate's fallible-operation error type.

If the bridge cannot resolve the accelerator's four entry points and the
host sentinel at `Bridge::init` time, every public operation degrades to a
silent no-op (§4.A): no warning, no per-row overhead, no allocation.
"#]

pub mod arrow;
pub mod config;
pub mod cost;
pub mod discovery;
pub mod dispatch;
pub mod eligibility;
pub mod error;
pub mod expr;
pub mod kds;
pub mod registry;

pub use discovery::Bridge;
pub use dispatch::{CpuGroupingPolicy, DispatchResult, GroupingPolicyWrapper, PartialAggregate, PathLabel};
pub use error::BridgeError;
