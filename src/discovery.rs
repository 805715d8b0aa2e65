/*!
discovery - Runtime discovery (§4.A): resolve the accelerator's four entry
points and the host sentinel symbol from the process image at load time,
and hold the resulting capability record for the rest of the bridge.

Design
======
Exactly one `Bridge` per process, built once via `Bridge::init`. Two
process-wide facts are decided here and never revisited (§3, §5, §9):

  * `enabled` — true iff all four accelerator symbols *and* the host
    sentinel resolved. Write-once.
  * the four function pointers themselves, bundled as `registry::AcceleratorApi`.

If `enabled` is false, every public operation of `eligibility`, `cost`,
`kds`, and `dispatch` is a no-op (§4.A) — enforced by those modules each
checking `Bridge::enabled()` or `Bridge::api()` first, not by this module.

Symbol resolution itself is abstracted behind `SymbolSource`: a small,
injectable interface so the rest of the crate, and all of its tests, never
depend on a real process symbol table. `ProcessSymbolSource` is the
production implementation, built on `libloading::Library::this()`.
*/

use libloading::Library;

use crate::config::{Diagnostic, Tunables};
use crate::cost::Calibration;
use crate::registry::{AcceleratorApi, FuncOpcodeFn, OpcodeCostFn, ParallelismFn, SubmitFn};

/// The well-known names the bridge looks up in the process symbol table.
pub mod symbol_names {
    pub const SUBMIT: &[u8] = b"kds_accel_submit\0";
    pub const FUNC_OPCODE: &[u8] = b"kds_accel_func_opcode\0";
    pub const OPCODE_COST: &[u8] = b"kds_accel_opcode_cost\0";
    pub const PARALLELISM: &[u8] = b"kds_accel_parallelism\0";
    pub const HOST_SENTINEL: &[u8] = b"kds_host_aggregation_engine_loaded\0";
}

/// Abstracts "resolve a named entry point from wherever the accelerator
/// and host engine live." Implemented for production by
/// `ProcessSymbolSource`; implemented for tests by small closures/structs
/// that simulate a present or absent accelerator without linking one in.
pub trait SymbolSource {
    fn resolve_submit(&self) -> Option<SubmitFn>;
    fn resolve_func_opcode(&self) -> Option<FuncOpcodeFn>;
    fn resolve_opcode_cost(&self) -> Option<OpcodeCostFn>;
    fn resolve_parallelism(&self) -> Option<ParallelismFn>;
    fn resolve_host_sentinel(&self) -> bool;
}

/// Resolves symbols out of the already-loaded process image, matching
/// §4.A(ii)/(iii)'s "flat process symbol table" and "single sentinel
/// symbol" language.
pub struct ProcessSymbolSource {
    library: Library,
}

impl ProcessSymbolSource {
    /// # Safety
    /// Loads a handle to the calling process's own image. Safe as long as
    /// the symbols this module looks up, if present, truly have the
    /// signatures declared in `registry` — a contract owned by whichever
    /// accelerator runtime links itself into the process, not by this
    /// crate.
    pub unsafe fn new() -> std::io::Result<Self> {
        let library = unsafe { Library::this() };
        Ok(Self { library })
    }

    fn get<T: Copy>(&self, name: &[u8]) -> Option<T> {
        unsafe { self.library.get::<T>(name).ok().map(|sym| *sym) }
    }
}

impl SymbolSource for ProcessSymbolSource {
    fn resolve_submit(&self) -> Option<SubmitFn> {
        self.get(symbol_names::SUBMIT)
    }

    fn resolve_func_opcode(&self) -> Option<FuncOpcodeFn> {
        self.get(symbol_names::FUNC_OPCODE)
    }

    fn resolve_opcode_cost(&self) -> Option<OpcodeCostFn> {
        self.get(symbol_names::OPCODE_COST)
    }

    fn resolve_parallelism(&self) -> Option<ParallelismFn> {
        self.get(symbol_names::PARALLELISM)
    }

    fn resolve_host_sentinel(&self) -> bool {
        // Presence is all that matters; the symbol's value is irrelevant.
        unsafe { self.library.get::<*const ()>(symbol_names::HOST_SENTINEL).is_ok() }
    }
}

/// The bridge's process-wide capability record (§9: "a single capability
/// record holding all four pointers, initialized atomically"). Every
/// public operation elsewhere in the crate takes a `&Bridge` and starts by
/// consulting `enabled`/`api`.
pub struct Bridge {
    api: Option<AcceleratorApi>,
    accelerator_detected: bool,
    host_detected: bool,
    tunables: Tunables,
    calibration: Calibration,
}

impl Bridge {
    /// Resolve all five symbols exactly once and decide `enabled` for the
    /// lifetime of the process. Never panics, never logs above debug —
    /// §4.A(iv) is silent by design.
    pub fn init(symbols: &dyn SymbolSource) -> Self {
        let submit = symbols.resolve_submit();
        let func_opcode = symbols.resolve_func_opcode();
        let opcode_cost = symbols.resolve_opcode_cost();
        let parallelism = symbols.resolve_parallelism();
        let host_detected = symbols.resolve_host_sentinel();

        let api = match (submit, func_opcode, opcode_cost, parallelism) {
            (Some(submit), Some(func_opcode), Some(opcode_cost), Some(parallelism)) => {
                Some(AcceleratorApi {
                    submit,
                    func_opcode,
                    opcode_cost,
                    parallelism,
                })
            }
            _ => None,
        };
        let accelerator_detected = api.is_some();

        Bridge {
            api: if host_detected { api } else { None },
            accelerator_detected,
            host_detected,
            tunables: Tunables::new(),
            calibration: Calibration::new(),
        }
    }

    /// A bridge that never has an accelerator, for embedding in tests and
    /// for hosts that want the no-op behavior without probing symbols.
    pub fn disabled() -> Self {
        Bridge {
            api: None,
            accelerator_detected: false,
            host_detected: false,
            tunables: Tunables::new(),
            calibration: Calibration::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.api.is_some()
    }

    pub fn api(&self) -> Option<&AcceleratorApi> {
        self.api.as_ref()
    }

    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic {
            enabled: self.enabled(),
            accelerator_detected: self.accelerator_detected,
            host_detected: self.host_detected,
            transfer_cost_per_byte: self.tunables.transfer_cost_per_byte(),
            launch_overhead: self.tunables.launch_overhead(),
            min_batch_rows: self.tunables.min_batch_rows(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A `SymbolSource` whose four accelerator symbols and host sentinel
    /// are each independently toggleable, for exercising every corner of
    /// `Bridge::init` without touching a real process image.
    pub struct FakeSymbols {
        pub submit: Option<SubmitFn>,
        pub func_opcode: Option<FuncOpcodeFn>,
        pub opcode_cost: Option<OpcodeCostFn>,
        pub parallelism: Option<ParallelismFn>,
        pub host_sentinel: bool,
    }

    unsafe extern "C" fn stub_submit(_: *const u8, _: usize, _: *mut u8, _: *mut usize) -> i32 {
        0
    }
    unsafe extern "C" fn stub_func_opcode(function: i64) -> i32 {
        if function > 0 { 1 } else { 0 }
    }
    unsafe extern "C" fn stub_opcode_cost(_: i32) -> f64 {
        1.0
    }
    unsafe extern "C" fn stub_parallelism() -> i32 {
        32
    }

    impl FakeSymbols {
        pub fn fully_present() -> Self {
            FakeSymbols {
                submit: Some(stub_submit),
                func_opcode: Some(stub_func_opcode),
                opcode_cost: Some(stub_opcode_cost),
                parallelism: Some(stub_parallelism),
                host_sentinel: true,
            }
        }

        pub fn absent() -> Self {
            FakeSymbols {
                submit: None,
                func_opcode: None,
                opcode_cost: None,
                parallelism: None,
                host_sentinel: false,
            }
        }

        pub fn with_submit(mut self, f: SubmitFn) -> Self {
            self.submit = Some(f);
            self
        }
    }

    impl SymbolSource for FakeSymbols {
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
}

#[cfg(test)]
mod tests {
    use super::test_support::FakeSymbols;
    use super::*;

    #[test]
    fn enabled_requires_all_four_and_host() {
        let bridge = Bridge::init(&FakeSymbols::fully_present());
        assert!(bridge.enabled());
    }

    #[test]
    fn missing_any_symbol_disables() {
        let mut syms = FakeSymbols::fully_present();
        syms.parallelism = None;
        let bridge = Bridge::init(&syms);
        assert!(!bridge.enabled());
    }

    #[test]
    fn missing_host_sentinel_disables_even_with_all_four() {
        let mut syms = FakeSymbols::fully_present();
        syms.host_sentinel = false;
        let bridge = Bridge::init(&syms);
        assert!(!bridge.enabled());
    }

    #[test]
    fn disabled_bridge_has_no_api() {
        let bridge = Bridge::init(&FakeSymbols::absent());
        assert!(bridge.api().is_none());
    }

    #[test]
    fn diagnostic_reflects_detection_flags() {
        let bridge = Bridge::init(&FakeSymbols::fully_present());
        let d = bridge.diagnostic();
        assert!(d.enabled);
        assert!(d.accelerator_detected);
        assert!(d.host_detected);
    }
}
