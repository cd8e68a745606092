// ABOUTME: Built-in variadic scientific functions taking already-evaluated complex arguments
//
// `integrate`/`der` need to repeatedly evaluate their first argument's
// *expression* at many sample points, not just its one evaluated value, so
// they are dispatched specially in `scientific::eval` instead of through
// this value-only table (see DESIGN.md).

use crate::error::ErrorKind;
use calcweave_macros::builtin;
use num_complex::Complex64;

#[builtin(kind = "extended_scientific", name = "avg")]
pub fn avg(args: &[Complex64]) -> Result<Complex64, ErrorKind> {
    if args.is_empty() {
        return Err(ErrorKind::TooFewArguments("avg".to_string()));
    }
    let sum: Complex64 = args.iter().copied().sum();
    Ok(sum / Complex64::new(args.len() as f64, 0.0))
}
