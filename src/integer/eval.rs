// ABOUTME: Integer-domain evaluator: deepest-first subexpression walk, masked after every node

use crate::builtins;
use crate::error::ErrorKind;
use crate::intmask::{mask_and_extend, IntWidth};
use crate::integer::compiler::{compile, CompileCtx, CompileOptions};
use crate::integer::ir::{Expr, FuncType};

/// §4.11 operator semantics: standard arithmetic plus bitwise `& ^ |`. Every
/// result is masked to the active width immediately (§4's "post-operation
/// value is masked to width bits before storage").
fn apply_op(op: char, l: i64, r: i64, width: IntWidth) -> Result<i64, ErrorKind> {
    let raw = match op {
        '+' => l.wrapping_add(r),
        '-' => l.wrapping_sub(r),
        '*' => l.wrapping_mul(r),
        '/' => {
            if r == 0 {
                return Err(ErrorKind::DivisionByZero);
            }
            l.wrapping_div(r)
        }
        '%' => {
            if r == 0 {
                return Err(ErrorKind::ModuloZero);
            }
            l.wrapping_rem(r)
        }
        '&' => l & r,
        '^' => l ^ r,
        '|' => l | r,
        _ => return Err(ErrorKind::SyntaxError),
    };
    Ok(mask_and_extend(raw, width))
}

fn run_node_chain(expr: &mut Expr, si: usize, width: IntWidth) -> Result<i64, ErrorKind> {
    let mut current = expr.subexprs[si].start_node;
    let mut last_value = 0i64;
    while let Some(ni) = current {
        let node = &expr.subexprs[si].nodes[ni];
        let (op, l, r, target, next) = (node.op, node.left, node.right, node.result, node.next);
        let value = apply_op(op, l, r, width)?;
        last_value = value;
        if let Some(t) = target {
            expr.write(t, value);
        }
        current = next;
    }
    Ok(last_value)
}

/// Overwrite every label-bound operand slot with its corresponding value.
pub fn set_labels(expr: &mut Expr, values: &[i64]) {
    let refs = expr.label_refs.clone();
    for r in refs {
        if let Some(&v) = values.get(r.label_id as usize) {
            let value = if r.negative { -v } else { v };
            expr.write(r.target, value);
        }
    }
}

fn raw_span(expr: &Expr, start: usize, end: usize) -> String {
    let chars: Vec<char> = expr.source.chars().collect();
    chars[start..end].iter().collect()
}

fn eval_span(expr: &Expr, start: usize, end: usize, width: IntWidth, ctx: &CompileCtx<'_>) -> Result<i64, ErrorKind> {
    let opts = CompileOptions {
        labels: expr.labels.clone(),
        width,
    };
    let mut sub = compile(&raw_span(expr, start, end), &opts, ctx)?;
    evaluate(&mut sub, width, ctx)
}

fn eval_extended(
    name: &str,
    args: &[(usize, usize)],
    expr: &Expr,
    width: IntWidth,
    ctx: &CompileCtx<'_>,
) -> Result<i64, ErrorKind> {
    if name == "dotted" {
        if args.len() != 1 {
            return Err(if args.is_empty() {
                ErrorKind::TooFewArguments("dotted".to_string())
            } else {
                ErrorKind::TooManyArguments("dotted".to_string())
            });
        }
        let text = raw_span(expr, args[0].0, args[0].1);
        return builtins::extended_integer::dotted_from_str(&text, width);
    }

    let mut values = Vec::with_capacity(args.len());
    for &(s, e) in args {
        values.push(eval_span(expr, s, e, width, ctx)?);
    }
    builtins::call_extended_integer(name, &values, width)
        .unwrap_or(Err(ErrorKind::UndefinedFunction(name.to_string())))
}

fn eval_user_call(
    name: &str,
    args: &[(usize, usize)],
    expr: &Expr,
    width: IntWidth,
    ctx: &CompileCtx<'_>,
) -> Result<i64, ErrorKind> {
    let func = ctx.funcs.get(name).ok_or_else(|| ErrorKind::UndefinedFunction(name.to_string()))?;
    if args.len() < func.labels.len() {
        return Err(ErrorKind::TooFewArguments(name.to_string()));
    }
    if args.len() > func.labels.len() {
        return Err(ErrorKind::TooManyArguments(name.to_string()));
    }
    let mut values = Vec::with_capacity(args.len());
    for &(s, e) in args {
        values.push(eval_span(expr, s, e, width, ctx)?);
    }
    let opts = CompileOptions {
        labels: func.labels.clone(),
        width,
    };
    let mut callee = compile(&func.body, &opts, ctx)?;
    set_labels(&mut callee, &values);
    evaluate(&mut callee, width, ctx)
}

/// §4.11: evaluate every subexpression in storage order (already
/// deepest-first), writing the outermost's value into `expr.answer`.
pub fn evaluate(expr: &mut Expr, width: IntWidth, ctx: &CompileCtx<'_>) -> Result<i64, ErrorKind> {
    let outermost = expr.index_of_outermost();
    for si in 0..expr.subexprs.len() {
        let func_type = expr.subexprs[si].func_type.clone();
        let value = match func_type {
            FuncType::Extended { ref name, ref args } => eval_extended(name, args, expr, width, ctx)?,
            FuncType::User { ref name, ref args } => eval_user_call(name, args, expr, width, ctx)?,
            FuncType::None => run_node_chain(expr, si, width)?,
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

    fn ctx<'a>(vars: &'a VariableRegistry<i64>, funcs: &'a UserFunctionRegistry) -> CompileCtx<'a> {
        CompileCtx { vars, funcs }
    }

    fn run_width(src: &str, width: IntWidth) -> i64 {
        let vars = VariableRegistry::new(&[]);
        let funcs = UserFunctionRegistry::new();
        let c = ctx(&vars, &funcs);
        let opts = CompileOptions {
            labels: Vec::new(),
            width,
        };
        let mut expr = compile(src, &opts, &c).unwrap();
        evaluate(&mut expr, width, &c).unwrap()
    }

    fn run(src: &str) -> i64 {
        run_width(src, IntWidth::default())
    }

    #[test]
    fn precedence_simple() {
        assert_eq!(run("1+2*3"), 7);
    }

    #[test]
    fn overflow_wraps_at_width_8() {
        // §8 concrete scenario: width 8, "0xFF+1" -> 0 (masked)
        assert_eq!(run_width("0xFF+1", IntWidth::new(8).unwrap()), 0);
    }

    #[test]
    fn division_by_zero_is_fatal() {
        let vars = VariableRegistry::new(&[]);
        let funcs = UserFunctionRegistry::new();
        let c = ctx(&vars, &funcs);
        let mut expr = compile("1/0", &CompileOptions::default(), &c).unwrap();
        assert_eq!(
            evaluate(&mut expr, IntWidth::default(), &c),
            Err(ErrorKind::DivisionByZero)
        );
    }

    #[test]
    fn bitwise_and_or_xor() {
        assert_eq!(run("6&3"), 2);
        assert_eq!(run("6|1"), 7);
        assert_eq!(run("6^3"), 5);
    }

    #[test]
    fn sra_sign_extends_through_extended_call() {
        assert_eq!(run_width("sra(0x80,1)", IntWidth::new(8).unwrap()) as u8, 0xC0);
    }

    #[test]
    fn dotted_parses_without_evaluating_arithmetic() {
        let result = run_width("dotted(192.168.1.1)", IntWidth::new(32).unwrap());
        assert_eq!(result as u32, 0xC0A80101);
    }

    #[test]
    fn deep_copy_evaluates_identically() {
        let vars = VariableRegistry::new(&[]);
        let funcs = UserFunctionRegistry::new();
        let c = ctx(&vars, &funcs);
        let mut expr = compile("(1+2)*(3+4)", &CompileOptions::default(), &c).unwrap();
        let mut copy = crate::integer::compiler::duplicate(&expr);
        let a = evaluate(&mut expr, IntWidth::default(), &c).unwrap();
        let b = evaluate(&mut copy, IntWidth::default(), &c).unwrap();
        assert_eq!(a, b);
    }
}
