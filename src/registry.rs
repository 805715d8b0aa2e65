/*!
registry - The accelerator's four entry points (§6) and the opcode
registry lookups two of them provide.

The accelerator runtime is never linked against directly; it is treated as
a suite of four function pointers resolved by late binding (`discovery`).
This module defines their signatures and a small `OpcodeRegistry` trait
that `eligibility` and `cost` consult, so that those two components never
touch raw function pointers or `unsafe` themselves — only `AcceleratorApi`
(here) and `discovery::resolve` deal with the FFI boundary; every other
module sees a safe trait instead of raw pointers.
*/

use crate::expr::FunctionId;

/// `(kds_ptr, kds_len, result_ptr, result_len_inout) -> int`. Zero means ok.
pub type SubmitFn =
    unsafe extern "C" fn(*const u8, usize, *mut u8, *mut usize) -> i32;
/// `(function_identity) -> int`. `> 0` is a supported opcode, `0` unsupported.
pub type FuncOpcodeFn = unsafe extern "C" fn(i64) -> i32;
/// `(opcode) -> double`. Per-row cost weight, `>= 0`.
pub type OpcodeCostFn = unsafe extern "C" fn(i32) -> f64;
/// `() -> int`. Effective parallel width of the accelerator, `> 0`.
pub type ParallelismFn = unsafe extern "C" fn() -> i32;

/// The four resolved accelerator entry points. Constructed only by
/// `discovery`; every field is populated or the bridge never builds one of
/// these (§3's "once true, the four function pointers are non-null for the
/// process lifetime").
#[derive(Copy, Clone)]
pub struct AcceleratorApi {
    pub submit: SubmitFn,
    pub func_opcode: FuncOpcodeFn,
    pub opcode_cost: OpcodeCostFn,
    pub parallelism: ParallelismFn,
}

/// An opcode, as returned by `func_opcode`. `0` means unsupported.
pub type Opcode = i32;

/// Read-only access to the accelerator's opcode registry, consumed by
/// `eligibility` and `cost`. The bridge never mutates this mapping (§3).
pub trait OpcodeRegistry {
    /// Resolve a function identity to an opcode. `0` (or `None`) means
    /// unsupported.
    fn opcode_of(&self, function: FunctionId) -> Opcode;
    /// Per-row cost weight of a (already-known-supported) opcode.
    fn cost_of(&self, opcode: Opcode) -> f64;
}

impl OpcodeRegistry for AcceleratorApi {
    fn opcode_of(&self, function: FunctionId) -> Opcode {
        // SAFETY: `func_opcode` was resolved from the process symbol table
        // by `discovery` and matches `FuncOpcodeFn`'s signature by contract
        // with the accelerator runtime (§6). The call performs no aliasing
        // of Rust-owned memory; it takes a plain integer and returns one.
        unsafe { (self.func_opcode)(function.0) }
    }

    fn cost_of(&self, opcode: Opcode) -> f64 {
        // SAFETY: see `opcode_of`.
        unsafe { (self.opcode_cost)(opcode) }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::collections::HashMap;

    /// An in-process stand-in for `AcceleratorApi` used throughout the unit
    /// tests of `eligibility` and `cost`, so those modules can be exercised
    /// without a real accelerator runtime or `unsafe` function pointers.
    #[derive(Default, Clone)]
    pub struct MockRegistry {
        pub opcodes: HashMap<i64, Opcode>,
        pub costs: HashMap<Opcode, f64>,
    }

    impl MockRegistry {
        pub fn with(mut self, function: i64, opcode: Opcode, cost: f64) -> Self {
            self.opcodes.insert(function, opcode);
            self.costs.insert(opcode, cost);
            self
        }
    }

    impl OpcodeRegistry for MockRegistry {
        fn opcode_of(&self, function: FunctionId) -> Opcode {
            *self.opcodes.get(&function.0).unwrap_or(&0)
        }

        fn cost_of(&self, opcode: Opcode) -> f64 {
            *self.costs.get(&opcode).unwrap_or(&0.0)
        }
    }
}
