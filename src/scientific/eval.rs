// ABOUTME: Scientific-domain evaluator: deepest-first subexpression walk with precomputed threading

use crate::builtins;
use crate::error::ErrorKind;
use crate::scientific::compiler::{compile, CompileCtx, CompileOptions};
use crate::scientific::ir::{Expr, FuncType};
use num_complex::Complex64;

const INTEGRATION_STEPS: usize = 1000;
const DERIVATIVE_STEP: f64 = 1e-5;

fn check_nan(v: Complex64) -> Result<Complex64, ErrorKind> {
    if v.re.is_nan() || v.im.is_nan() {
        Err(ErrorKind::MathError)
    } else {
        Ok(v)
    }
}

fn integer_pow(base: Complex64, exp: i64) -> Complex64 {
    if exp == 0 {
        return Complex64::new(1.0, 0.0);
    }
    let negative = exp < 0;
    let mut n = exp.unsigned_abs();
    let mut result = Complex64::new(1.0, 0.0);
    let mut b = base;
    while n > 0 {
        if n & 1 == 1 {
            result *= b;
        }
        b *= b;
        n >>= 1;
    }
    if negative {
        Complex64::new(1.0, 0.0) / result
    } else {
        result
    }
}

/// §4.10 operator semantics.
fn apply_op(op: char, l: Complex64, r: Complex64) -> Result<Complex64, ErrorKind> {
    match op {
        '+' => check_nan(l + r),
        '-' => check_nan(l - r),
        '*' => check_nan(l * r),
        '/' => {
            if r == Complex64::new(0.0, 0.0) {
                Err(ErrorKind::DivisionByZero)
            } else {
                check_nan(l / r)
            }
        }
        '%' => {
            if l.im != 0.0 || r.im != 0.0 {
                Err(ErrorKind::ModuloComplexNotSupported)
            } else if r.re == 0.0 {
                Err(ErrorKind::ModuloZero)
            } else {
                check_nan(Complex64::new(l.re % r.re, 0.0))
            }
        }
        '^' => {
            if r.im == 0.0 && r.re.fract() == 0.0 {
                check_nan(integer_pow(l, r.re as i64))
            } else {
                check_nan(l.powc(r))
            }
        }
        _ => Err(ErrorKind::SyntaxError),
    }
}

fn run_node_chain(expr: &mut Expr, si: usize) -> Result<Complex64, ErrorKind> {
    let mut current = expr.subexprs[si].start_node;
    let mut last_value = Complex64::new(0.0, 0.0);
    while let Some(ni) = current {
        let node = &expr.subexprs[si].nodes[ni];
        let (op, l, r, target, next) = (node.op, node.left, node.right, node.result, node.next);
        let value = apply_op(op, l, r)?;
        last_value = value;
        if let Some(t) = target {
            expr.write(t, value);
        }
        current = next;
    }
    Ok(last_value)
}

fn apply_unary(expr: &mut Expr, si: usize, value: Complex64) -> Result<Complex64, ErrorKind> {
    let func_type = expr.subexprs[si].func_type.clone();
    match func_type {
        FuncType::None | FuncType::Extended { .. } | FuncType::User { .. } => Ok(value),
        FuncType::RealUnary(name) => {
            if value.im == 0.0 {
                match builtins::call_unary_real(&name, value.re) {
                    Some(Ok(r)) => Ok(Complex64::new(r, 0.0)),
                    Some(Err(ErrorKind::MathError)) | None if expr.complex_enabled => {
                        upgrade_to_complex(expr, si, &name, value)
                    }
                    Some(Err(e)) => Err(e),
                    None => Err(ErrorKind::UndefinedFunction(name)),
                }
            } else if expr.complex_enabled {
                upgrade_to_complex(expr, si, &name, value)
            } else {
                Err(ErrorKind::ComplexDisabled)
            }
        }
        FuncType::ComplexUnary(name) => builtins::call_unary_complex(&name, value)
            .unwrap_or(Err(ErrorKind::UndefinedFunction(name))),
    }
}

fn upgrade_to_complex(
    expr: &mut Expr,
    si: usize,
    name: &str,
    value: Complex64,
) -> Result<Complex64, ErrorKind> {
    match builtins::call_unary_complex(name, value) {
        Some(Ok(z)) => {
            expr.subexprs[si].func_type = FuncType::ComplexUnary(name.to_string());
            Ok(z)
        }
        Some(Err(e)) => Err(e),
        None => Err(ErrorKind::MathError),
    }
}

fn nested_options(expr: &Expr) -> CompileOptions {
    CompileOptions {
        enable_cmplx: expr.complex_enabled,
        enable_unk: !expr.labels.is_empty(),
        labels: expr.labels.clone(),
    }
}

fn eval_span(expr: &Expr, start: usize, end: usize, ctx: &CompileCtx<'_>) -> Result<Complex64, ErrorKind> {
    let chars: Vec<char> = expr.source.chars().collect();
    let text: String = chars[start..end].iter().collect();
    let mut sub = compile(&text, &nested_options(expr), ctx)?;
    evaluate(&mut sub, ctx)
}

fn eval_span_with_label(
    expr: &Expr,
    start: usize,
    end: usize,
    label_value: Complex64,
    ctx: &CompileCtx<'_>,
) -> Result<Complex64, ErrorKind> {
    let chars: Vec<char> = expr.source.chars().collect();
    let text: String = chars[start..end].iter().collect();
    let opts = CompileOptions {
        enable_cmplx: expr.complex_enabled,
        enable_unk: true,
        labels: vec!["x".to_string()],
    };
    let mut sub = compile(&text, &opts, ctx)?;
    set_labels(&mut sub, &[label_value]);
    evaluate(&mut sub, ctx)
}

/// Overwrite every label-bound operand slot with its corresponding value
/// (§4.6 label resolution / §3 "re-evaluated cheaply").
pub fn set_labels(expr: &mut Expr, values: &[Complex64]) {
    let refs = expr.label_refs.clone();
    for r in refs {
        if let Some(&v) = values.get(r.label_id as usize) {
            let value = if r.negative { -v } else { v };
            expr.write(r.target, value);
        }
    }
}

fn eval_extended(name: &str, args: &[(usize, usize)], expr: &Expr, ctx: &CompileCtx<'_>) -> Result<Complex64, ErrorKind> {
    match name {
        "integrate" => {
            if args.len() != 3 {
                return Err(if args.len() < 3 {
                    ErrorKind::TooFewArguments("integrate".to_string())
                } else {
                    ErrorKind::TooManyArguments("integrate".to_string())
                });
            }
            let a = eval_span(expr, args[1].0, args[1].1, ctx)?.re;
            let b = eval_span(expr, args[2].0, args[2].1, ctx)?.re;
            simpson_integrate(expr, args[0], a, b, ctx)
        }
        "der" => {
            if args.len() != 2 {
                return Err(if args.len() < 2 {
                    ErrorKind::TooFewArguments("der".to_string())
                } else {
                    ErrorKind::TooManyArguments("der".to_string())
                });
            }
            let x0 = eval_span(expr, args[1].0, args[1].1, ctx)?.re;
            let plus = eval_span_with_label(expr, args[0].0, args[0].1, Complex64::new(x0 + DERIVATIVE_STEP, 0.0), ctx)?;
            let minus = eval_span_with_label(expr, args[0].0, args[0].1, Complex64::new(x0 - DERIVATIVE_STEP, 0.0), ctx)?;
            check_nan((plus - minus) / Complex64::new(2.0 * DERIVATIVE_STEP, 0.0))
        }
        _ => {
            let mut values = Vec::with_capacity(args.len());
            for &(s, e) in args {
                values.push(eval_span(expr, s, e, ctx)?);
            }
            builtins::call_extended_scientific(name, &values)
                .unwrap_or(Err(ErrorKind::UndefinedFunction(name.to_string())))
        }
    }
}

fn simpson_integrate(
    expr: &Expr,
    f_span: (usize, usize),
    a: f64,
    b: f64,
    ctx: &CompileCtx<'_>,
) -> Result<Complex64, ErrorKind> {
    let n = INTEGRATION_STEPS;
    let h = (b - a) / n as f64;
    let f = |x: f64| -> Result<f64, ErrorKind> {
        Ok(eval_span_with_label(expr, f_span.0, f_span.1, Complex64::new(x, 0.0), ctx)?.re)
    };
    let mut sum = f(a)? + f(b)?;
    for i in 1..n {
        let x = a + i as f64 * h;
        let coeff = if i % 2 == 0 { 2.0 } else { 4.0 };
        sum += coeff * f(x)?;
    }
    check_nan(Complex64::new(sum * h / 3.0, 0.0))
}

fn eval_user_call(
    name: &str,
    args: &[(usize, usize)],
    expr: &Expr,
    ctx: &CompileCtx<'_>,
) -> Result<Complex64, ErrorKind> {
    let func = ctx.funcs.get(name).ok_or_else(|| ErrorKind::UndefinedFunction(name.to_string()))?;
    if args.len() < func.labels.len() {
        return Err(ErrorKind::TooFewArguments(name.to_string()));
    }
    if args.len() > func.labels.len() {
        return Err(ErrorKind::TooManyArguments(name.to_string()));
    }
    let mut values = Vec::with_capacity(args.len());
    for &(s, e) in args {
        values.push(eval_span(expr, s, e, ctx)?);
    }
    let opts = CompileOptions {
        enable_cmplx: expr.complex_enabled,
        enable_unk: true,
        labels: func.labels.clone(),
    };
    let mut callee = compile(&func.body, &opts, ctx)?;
    set_labels(&mut callee, &values);
    evaluate(&mut callee, ctx)
}

/// §4.10: evaluate every subexpression in storage order (already
/// deepest-first), writing the outermost's value into `expr.answer`.
pub fn evaluate(expr: &mut Expr, ctx: &CompileCtx<'_>) -> Result<Complex64, ErrorKind> {
    let outermost = expr.index_of_outermost();
    for si in 0..expr.subexprs.len() {
        let func_type = expr.subexprs[si].func_type.clone();
        let value = match func_type {
            FuncType::Extended { ref name, ref args } => eval_extended(name, args, expr, ctx)?,
            FuncType::User { ref name, ref args } => eval_user_call(name, args, expr, ctx)?,
            FuncType::None | FuncType::RealUnary(_) | FuncType::ComplexUnary(_) => {
                let raw = run_node_chain(expr, si)?;
                apply_unary(expr, si, raw)?
            }
        };

        let target = expr.subexprs[si].result;
        if si == outermost {
            expr.answer = value;
        } else if let Some(t) = target {
            expr.write(t, value);
        } else {
            expr.answer = value;
        }
    }
    Ok(expr.answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{UserFunctionRegistry, VariableRegistry};

    fn ctx<'a>(vars: &'a VariableRegistry<Complex64>, funcs: &'a UserFunctionRegistry) -> CompileCtx<'a> {
        CompileCtx { vars, funcs }
    }

    fn run(src: &str) -> Complex64 {
        let vars = VariableRegistry::new(&[]);
        let funcs = UserFunctionRegistry::new();
        let c = ctx(&vars, &funcs);
        let mut expr = compile(src, &CompileOptions::default(), &c).unwrap();
        evaluate(&mut expr, &c).unwrap()
    }

    #[test]
    fn precedence_simple() {
        assert_eq!(run("1+2*3"), Complex64::new(7.0, 0.0));
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(run("(1+2)*(3+4)"), Complex64::new(21.0, 0.0));
    }

    #[test]
    fn sqrt_negative_upgrades_to_complex() {
        let z = run("sqrt(-1)");
        assert!((z.re - 0.0).abs() < 1e-9);
        assert!((z.im - 1.0).abs() < 1e-9);
    }

    #[test]
    fn left_to_right_power_chain() {
        // §8 scenario: "2^2^3" under left-to-right threading = (2^2)^3 = 64
        assert_eq!(run("2^2^3"), Complex64::new(64.0, 0.0));
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(run("10-3-2"), Complex64::new(5.0, 0.0));
    }

    #[test]
    fn division_by_zero_is_fatal() {
        let vars = VariableRegistry::new(&[]);
        let funcs = UserFunctionRegistry::new();
        let c = ctx(&vars, &funcs);
        let mut expr = compile("1/0", &CompileOptions::default(), &c).unwrap();
        assert_eq!(evaluate(&mut expr, &c), Err(ErrorKind::DivisionByZero));
    }

    #[test]
    fn avg_of_four() {
        assert_eq!(run("avg(1,2,3,4)"), Complex64::new(2.5, 0.0));
    }

    #[test]
    fn derivative_of_square_at_three() {
        let z = run("der(x^2,3)");
        assert!((z.re - 6.0).abs() < 1e-3);
    }

    #[test]
    fn deep_copy_evaluates_identically() {
        let vars = VariableRegistry::new(&[]);
        let funcs = UserFunctionRegistry::new();
        let c = ctx(&vars, &funcs);
        let mut expr = compile("(1+2)*(3+4)", &CompileOptions::default(), &c).unwrap();
        let mut copy = crate::scientific::compiler::duplicate(&expr);
        let a = evaluate(&mut expr, &c).unwrap();
        let b = evaluate(&mut copy, &c).unwrap();
        assert_eq!(a, b);
    }
}
