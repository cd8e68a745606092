// ABOUTME: Entry point for the built-in function tables (populated at link time via inventory)

pub mod extended_integer;
pub mod extended_scientific;
pub mod registry;
pub mod unary_complex;
pub mod unary_real;

use crate::error::ErrorKind;
use crate::intmask::IntWidth;
use num_complex::Complex64;

pub fn unary_real_exists(name: &str) -> bool {
    registry::find_unary_real(name).is_some()
}

pub fn unary_complex_exists(name: &str) -> bool {
    registry::find_unary_complex(name).is_some()
}

/// True for any name handled as an extended scientific call, whether
/// through the value-only table or the specially dispatched
/// `integrate`/`der` pair (see `builtins::extended_scientific`).
pub fn extended_scientific_exists(name: &str) -> bool {
    matches!(name, "integrate" | "der") || registry::find_extended_scientific(name).is_some()
}

/// True for any name handled as an extended integer call, whether through
/// the value-only table or the specially dispatched `dotted`.
pub fn extended_integer_exists(name: &str) -> bool {
    name == "dotted" || registry::find_extended_integer(name).is_some()
}

pub fn call_unary_real(name: &str, x: f64) -> Option<Result<f64, ErrorKind>> {
    registry::find_unary_real(name).map(|f| f(x))
}

pub fn call_unary_complex(name: &str, z: Complex64) -> Option<Result<Complex64, ErrorKind>> {
    registry::find_unary_complex(name).map(|f| f(z))
}

pub fn call_extended_scientific(name: &str, args: &[Complex64]) -> Option<Result<Complex64, ErrorKind>> {
    registry::find_extended_scientific(name).map(|f| f(args))
}

pub fn call_extended_integer(name: &str, args: &[i64], width: IntWidth) -> Option<Result<i64, ErrorKind>> {
    registry::find_extended_integer(name).map(|f| f(args, width))
}
