//! Shared fixtures for the scenario and property tests: a toggleable
//! `SymbolSource` standing in for the accelerator runtime, and a couple of
//! small Arrow batch builders. Mirrors the crate's own `src/test_utils`-style
//! convention of de-duplicating fixture construction across test files.

use kdsbridge::discovery::SymbolSource;
use kdsbridge::registry::{FuncOpcodeFn, OpcodeCostFn, ParallelismFn, SubmitFn};

pub unsafe extern "C" fn submit_ok(_: *const u8, _: usize, _: *mut u8, _: *mut usize) -> i32 {
    0
}

pub unsafe extern "C" fn submit_fails(_: *const u8, _: usize, _: *mut u8, _: *mut usize) -> i32 {
    -1
}

pub unsafe extern "C" fn func_opcode_all_supported(function: i64) -> i32 {
    if function > 0 { 1 } else { 0 }
}

pub unsafe extern "C" fn func_opcode_none_supported(_function: i64) -> i32 {
    0
}

pub unsafe extern "C" fn opcode_cost_20(_opcode: i32) -> f64 {
    20.0
}

pub unsafe extern "C" fn parallelism_1024() -> i32 {
    1024
}

/// A `SymbolSource` whose five probes are each independently toggleable.
pub struct ScenarioSymbols {
    pub submit: Option<SubmitFn>,
    pub func_opcode: Option<FuncOpcodeFn>,
    pub opcode_cost: Option<OpcodeCostFn>,
    pub parallelism: Option<ParallelismFn>,
    pub host_sentinel: bool,
}

impl ScenarioSymbols {
    /// A fully-resolved accelerator: `submit` succeeds, every positive
    /// function id maps to opcode 1 at cost 20.0, parallelism is 1024.
    pub fn healthy() -> Self {
        ScenarioSymbols {
            submit: Some(submit_ok),
            func_opcode: Some(func_opcode_all_supported),
            opcode_cost: Some(opcode_cost_20),
            parallelism: Some(parallelism_1024),
            host_sentinel: true,
        }
    }

    /// S1: every symbol resolves, but the opcode registry is empty.
    pub fn empty_registry() -> Self {
        ScenarioSymbols {
            func_opcode: Some(func_opcode_none_supported),
            ..Self::healthy()
        }
    }

    /// S5: the accelerator is present but `submit` always fails.
    pub fn failing_submit() -> Self {
        ScenarioSymbols {
            submit: Some(submit_fails),
            ..Self::healthy()
        }
    }
}

impl SymbolSource for ScenarioSymbols {
    fn resolve_submit(&self) -> Option<SubmitFn> {
        self.submit
    }
    fn resolve_func_opcode(&self) -> Option<FuncOpcodeFn> {
        self.func_opcode
    }
    fn resolve_opcode_cost(&self) -> Option<OpcodeCostFn> {
        self.opcode_cost
    }
    fn resolve_parallelism(&self) -> Option<ParallelismFn> {
        self.parallelism
    }
    fn resolve_host_sentinel(&self) -> bool {
        self.host_sentinel
    }
}

pub fn wkb_point(x: f64, y: f64, z: f64) -> Vec<u8> {
    let mut v = vec![1u8]; // byte order: little-endian
    v.extend_from_slice(&1u32.to_le_bytes()); // WKB point type
    v.extend_from_slice(&x.to_le_bytes());
    v.extend_from_slice(&y.to_le_bytes());
    v.extend_from_slice(&z.to_le_bytes());
    v
}

pub fn i32_bytes(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}
