// ABOUTME: Built-in complex-valued unary functions, the upgrade target for real-unary failures

use crate::error::ErrorKind;
use calcweave_macros::builtin;
use num_complex::Complex64;

fn checked(z: Complex64) -> Result<Complex64, ErrorKind> {
    if z.re.is_nan() || z.im.is_nan() {
        Err(ErrorKind::MathError)
    } else {
        Ok(z)
    }
}

#[builtin(kind = "unary_complex", name = "sqrt")]
pub fn complex_sqrt(z: Complex64) -> Result<Complex64, ErrorKind> {
    checked(z.sqrt())
}

#[builtin(kind = "unary_complex", name = "abs")]
pub fn complex_abs(z: Complex64) -> Result<Complex64, ErrorKind> {
    checked(Complex64::new(z.norm(), 0.0))
}

#[builtin(kind = "unary_complex", name = "exp")]
pub fn complex_exp(z: Complex64) -> Result<Complex64, ErrorKind> {
    checked(z.exp())
}

#[builtin(kind = "unary_complex", name = "ln")]
pub fn complex_ln(z: Complex64) -> Result<Complex64, ErrorKind> {
    checked(z.ln())
}

#[builtin(kind = "unary_complex", name = "sin")]
pub fn complex_sin(z: Complex64) -> Result<Complex64, ErrorKind> {
    checked(z.sin())
}

#[builtin(kind = "unary_complex", name = "cos")]
pub fn complex_cos(z: Complex64) -> Result<Complex64, ErrorKind> {
    checked(z.cos())
}

#[builtin(kind = "unary_complex", name = "tan")]
pub fn complex_tan(z: Complex64) -> Result<Complex64, ErrorKind> {
    checked(z.tan())
}
