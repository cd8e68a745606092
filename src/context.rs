// ABOUTME: The six registries, active integer width, and error ring bundled into one owned value

use crate::error::ErrorKind;
use crate::intmask::IntWidth;
use crate::registry::{lock_ordered, UserFunctionRegistry, VariableRegistry};
use crate::{error::ErrorAccumulator, scientific, integer};
use num_complex::Complex64;
use std::f64::consts::{E, PI};
use std::sync::Mutex;

/// Owns every piece of mutable state a caller's parses/evaluations touch:
/// the scientific and integer variable/user-function registries, the
/// process-wide answer variables (`ans`, stored as ordinary registry
/// entries rather than separate cells — see `scientific::compiler`), the
/// active integer width, and the shared error ring (§5 "shared resources").
pub struct Context {
    pub sci_vars: VariableRegistry<Complex64>,
    pub sci_funcs: UserFunctionRegistry,
    pub int_vars: VariableRegistry<i64>,
    pub int_funcs: UserFunctionRegistry,
    width: Mutex<IntWidth>,
    pub errors: ErrorAccumulator,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        let sci_vars = VariableRegistry::new(&["pi", "e", "i", "c"]);
        sci_vars.seed_constant("pi", Complex64::new(PI, 0.0));
        sci_vars.seed_constant("e", Complex64::new(E, 0.0));
        sci_vars.seed_constant("i", Complex64::new(0.0, 1.0));
        sci_vars.seed_constant("c", Complex64::new(299_792_458.0, 0.0));
        sci_vars.set("ans", Complex64::new(0.0, 0.0)).expect("ans is not a constant");

        let int_vars = VariableRegistry::new(&[]);
        int_vars.set("ans", 0i64).expect("ans is not a constant");

        Self {
            sci_vars,
            sci_funcs: UserFunctionRegistry::new(),
            int_vars,
            int_funcs: UserFunctionRegistry::new(),
            width: Mutex::new(IntWidth::default()),
            errors: ErrorAccumulator::new(),
        }
    }

    pub fn int_width(&self) -> IntWidth {
        *self.width.lock().unwrap()
    }

    /// §5 "changing the active width acquires both the integer evaluator
    /// lock and (transitively) the user-function lock" — modeled here by
    /// taking the ordered function+variable lock before swapping the width,
    /// so no concurrent integer evaluation observes a torn mask.
    pub fn set_int_mask(&self, bits: u8) -> Result<(), ErrorKind> {
        let new_width = IntWidth::new(bits).ok_or(ErrorKind::IntTooLarge)?;
        let _guard = lock_ordered(&self.int_funcs, &self.int_vars);
        *self.width.lock().unwrap() = new_width;
        Ok(())
    }

    pub fn get_int_mask(&self) -> u8 {
        self.int_width().bits() as u8
    }

    pub fn sci_ctx(&self) -> scientific::compiler::CompileCtx<'_> {
        scientific::compiler::CompileCtx {
            vars: &self.sci_vars,
            funcs: &self.sci_funcs,
        }
    }

    pub fn int_ctx(&self) -> integer::compiler::CompileCtx<'_> {
        integer::compiler::CompileCtx {
            vars: &self.int_vars,
            funcs: &self.int_funcs,
        }
    }

    /// Define or redefine a user function, rejecting a name that already
    /// names a variable (§4.13 "variable-name shadowing of function" is
    /// rejected the other direction too).
    pub fn set_sci_ufunction(&self, name: &str, labels: Vec<String>, body: String) -> Result<(), ErrorKind> {
        if self.sci_vars.get(name).is_some() {
            return Err(ErrorKind::FunctionShadowsExisting(name.to_string()));
        }
        self.sci_funcs.define(name, labels, body)
    }

    pub fn set_int_ufunction(&self, name: &str, labels: Vec<String>, body: String) -> Result<(), ErrorKind> {
        if self.int_vars.get(name).is_some() {
            return Err(ErrorKind::FunctionShadowsExisting(name.to_string()));
        }
        self.int_funcs.define(name, labels, body)
    }
}
