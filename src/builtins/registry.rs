// ABOUTME: inventory-collected, read-only built-in function tables

use crate::error::ErrorKind;
use num_complex::Complex64;

pub type UnaryRealFn = fn(f64) -> Result<f64, ErrorKind>;
pub type UnaryComplexFn = fn(Complex64) -> Result<Complex64, ErrorKind>;
pub type ExtendedScientificFn = fn(&[Complex64]) -> Result<Complex64, ErrorKind>;
pub type ExtendedIntegerFn = fn(&[i64], crate::intmask::IntWidth) -> Result<i64, ErrorKind>;

pub struct UnaryRealEntry {
    pub name: &'static str,
    pub func: UnaryRealFn,
}
inventory::collect!(UnaryRealEntry);

pub struct UnaryComplexEntry {
    pub name: &'static str,
    pub func: UnaryComplexFn,
}
inventory::collect!(UnaryComplexEntry);

pub struct ExtendedScientificEntry {
    pub name: &'static str,
    pub func: ExtendedScientificFn,
}
inventory::collect!(ExtendedScientificEntry);

pub struct ExtendedIntegerEntry {
    pub name: &'static str,
    pub func: ExtendedIntegerFn,
}
inventory::collect!(ExtendedIntegerEntry);

pub fn find_unary_real(name: &str) -> Option<UnaryRealFn> {
    inventory::iter::<UnaryRealEntry>
        .into_iter()
        .find(|e| e.name == name)
        .map(|e| e.func)
}

pub fn find_unary_complex(name: &str) -> Option<UnaryComplexFn> {
    inventory::iter::<UnaryComplexEntry>
        .into_iter()
        .find(|e| e.name == name)
        .map(|e| e.func)
}

pub fn find_extended_scientific(name: &str) -> Option<ExtendedScientificFn> {
    inventory::iter::<ExtendedScientificEntry>
        .into_iter()
        .find(|e| e.name == name)
        .map(|e| e.func)
}

pub fn find_extended_integer(name: &str) -> Option<ExtendedIntegerFn> {
    inventory::iter::<ExtendedIntegerEntry>
        .into_iter()
        .find(|e| e.name == name)
        .map(|e| e.func)
}
