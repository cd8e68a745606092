// ABOUTME: Built-in real-valued unary functions (§10 supplemented scientific functions)

use crate::error::ErrorKind;
use calcweave_macros::builtin;

fn checked(x: f64) -> Result<f64, ErrorKind> {
    if x.is_nan() {
        Err(ErrorKind::MathError)
    } else {
        Ok(x)
    }
}

#[builtin(kind = "unary_real", name = "sqrt")]
pub fn real_sqrt(x: f64) -> Result<f64, ErrorKind> {
    checked(x.sqrt())
}

#[builtin(kind = "unary_real", name = "abs")]
pub fn real_abs(x: f64) -> Result<f64, ErrorKind> {
    checked(x.abs())
}

#[builtin(kind = "unary_real", name = "exp")]
pub fn real_exp(x: f64) -> Result<f64, ErrorKind> {
    checked(x.exp())
}

#[builtin(kind = "unary_real", name = "ln")]
pub fn real_ln(x: f64) -> Result<f64, ErrorKind> {
    checked(x.ln())
}

#[builtin(kind = "unary_real", name = "log10")]
pub fn real_log10(x: f64) -> Result<f64, ErrorKind> {
    checked(x.log10())
}

#[builtin(kind = "unary_real", name = "log2")]
pub fn real_log2(x: f64) -> Result<f64, ErrorKind> {
    checked(x.log2())
}

#[builtin(kind = "unary_real", name = "sin")]
pub fn real_sin(x: f64) -> Result<f64, ErrorKind> {
    checked(x.sin())
}

#[builtin(kind = "unary_real", name = "cos")]
pub fn real_cos(x: f64) -> Result<f64, ErrorKind> {
    checked(x.cos())
}

// Design Notes §9 flags a source file computing `tan` as `sin`; this
// implementation is the actual tangent (regression test in `tests/`).
#[builtin(kind = "unary_real", name = "tan")]
pub fn real_tan(x: f64) -> Result<f64, ErrorKind> {
    checked(x.tan())
}

#[builtin(kind = "unary_real", name = "asin")]
pub fn real_asin(x: f64) -> Result<f64, ErrorKind> {
    checked(x.asin())
}

#[builtin(kind = "unary_real", name = "acos")]
pub fn real_acos(x: f64) -> Result<f64, ErrorKind> {
    checked(x.acos())
}

#[builtin(kind = "unary_real", name = "atan")]
pub fn real_atan(x: f64) -> Result<f64, ErrorKind> {
    checked(x.atan())
}

#[builtin(kind = "unary_real", name = "sinh")]
pub fn real_sinh(x: f64) -> Result<f64, ErrorKind> {
    checked(x.sinh())
}

#[builtin(kind = "unary_real", name = "cosh")]
pub fn real_cosh(x: f64) -> Result<f64, ErrorKind> {
    checked(x.cosh())
}

#[builtin(kind = "unary_real", name = "tanh")]
pub fn real_tanh(x: f64) -> Result<f64, ErrorKind> {
    checked(x.tanh())
}

#[builtin(kind = "unary_real", name = "floor")]
pub fn real_floor(x: f64) -> Result<f64, ErrorKind> {
    checked(x.floor())
}

#[builtin(kind = "unary_real", name = "ceil")]
pub fn real_ceil(x: f64) -> Result<f64, ErrorKind> {
    checked(x.ceil())
}

#[builtin(kind = "unary_real", name = "round")]
pub fn real_round(x: f64) -> Result<f64, ErrorKind> {
    checked(x.round())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tan_is_not_sin() {
        let x = 0.7_f64;
        assert_ne!(real_tan(x).unwrap(), real_sin(x).unwrap());
        assert!((real_tan(x).unwrap() - x.tan()).abs() < 1e-12);
    }

    #[test]
    fn sqrt_of_negative_is_nan_not_panic() {
        assert_eq!(real_sqrt(-1.0), Err(ErrorKind::MathError));
    }
}
