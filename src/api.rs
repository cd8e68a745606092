// ABOUTME: Public entry points (§6): solve/parse/evaluate, registry mutators, error queries

use crate::context::Context;
use crate::error::{ErrorKind, ErrorRecord};
use crate::integer;
use crate::intmask::IntWidth;
use crate::options::{facility, flags, Severity};
use crate::scientific;
use num_complex::Complex64;
use std::sync::OnceLock;

static DEFAULT_CONTEXT: OnceLock<Context> = OnceLock::new();

/// The process-wide default `Context` backing the convenience top-level
/// functions below. Library users who need independent state (tests, or
/// multiple isolated sessions in one process) should build their own
/// `Context` and call the `_with` variants instead.
pub fn default_context() -> &'static Context {
    DEFAULT_CONTEXT.get_or_init(Context::new)
}

fn record(facility: u32, kind: ErrorKind, source: &str) -> ErrorRecord {
    ErrorRecord {
        facility,
        severity: Severity::Fatal,
        kind,
        column: None,
        source: Some(source.to_string()),
    }
}

/// §6 `parse`: compile `expr` against the scientific domain into a reusable
/// `Expr`, with `ENABLE_UNK` honored from `options` and `labels` supplying
/// the label names.
pub fn parse(ctx: &Context, expr: &str, options: u32, labels: &[String]) -> Result<scientific::ir::Expr, ErrorKind> {
    let opts = scientific::compiler::CompileOptions {
        enable_cmplx: options & flags::ENABLE_CMPLX != 0,
        enable_unk: options & flags::ENABLE_UNK != 0,
        labels: labels.to_vec(),
    };
    scientific::compiler::compile(expr, &opts, &ctx.sci_ctx()).map_err(|e| {
        ctx.errors.push(record(facility::PARSER, e.clone(), expr));
        e
    })
}

/// §6 `parse_int`: as `parse`, but for the integer domain at the context's
/// currently active width.
pub fn parse_int(ctx: &Context, expr: &str, options: u32, labels: &[String]) -> Result<integer::ir::Expr, ErrorKind> {
    let opts = integer::compiler::CompileOptions {
        labels: labels.to_vec(),
        width: ctx.int_width(),
    };
    // The integer domain has no `ENABLE_CMPLX` counterpart and treats label
    // binding as active whenever `labels` is non-empty, so `options` carries
    // no integer-specific bits today; kept for call-site symmetry with
    // `parse`.
    let _ = options;
    integer::compiler::compile(expr, &opts, &ctx.int_ctx()).map_err(|e| {
        ctx.errors.push(record(facility::INT_PARSER, e.clone(), expr));
        e
    })
}

/// §6 `evaluate`: evaluate an already-compiled scientific `Expr`, writing
/// back to its assignment target if it has one.
pub fn evaluate(ctx: &Context, expr: &mut scientific::ir::Expr) -> Result<Complex64, ErrorKind> {
    let result = scientific::eval::evaluate(expr, &ctx.sci_ctx());
    match &result {
        Ok(value) => {
            if let Some(name) = &expr.assign_target {
                let _ = ctx.sci_vars.set(name, *value);
            }
        }
        Err(e) => ctx.errors.push(record(facility::EVALUATOR, e.clone(), &expr.source)),
    }
    result
}

pub fn evaluate_int(ctx: &Context, expr: &mut integer::ir::Expr) -> Result<i64, ErrorKind> {
    let width = ctx.int_width();
    let result = integer::eval::evaluate(expr, width, &ctx.int_ctx());
    match &result {
        Ok(value) => {
            if let Some(name) = &expr.assign_target {
                let _ = ctx.int_vars.set(name, *value);
            }
        }
        Err(e) => ctx.errors.push(record(facility::INT_EVALUATOR, e.clone(), &expr.source)),
    }
    result
}

pub fn set_labels_values(expr: &mut scientific::ir::Expr, values: &[Complex64]) {
    scientific::eval::set_labels(expr, values);
}

pub fn set_labels_values_int(expr: &mut integer::ir::Expr, values: &[i64]) {
    integer::eval::set_labels(expr, values);
}

/// §6 `solve`: parse and evaluate on the process-wide default `Context`'s
/// scientific domain. The caller selects the domain by which entry point
/// they call — `solve`/`solve_e` always take the scientific (`Complex64`)
/// path, `int_solve`/`int_solve_e` always take the integer (`i64`) path;
/// there is no content-based auto-detection between the two.
pub fn solve(expr: &str) -> Result<Complex64, ErrorKind> {
    solve_e(expr, flags::ENABLE_CMPLX | flags::PRINT_ERRORS, &[])
}

pub fn solve_e(expr: &str, options: u32, labels: &[String]) -> Result<Complex64, ErrorKind> {
    let ctx = default_context();
    let result = parse(ctx, expr, options, labels).and_then(|mut e| evaluate(ctx, &mut e));
    if let Ok(value) = result {
        let _ = ctx.sci_vars.set("ans", value);
    }
    // §6 "by default, solve/int_solve print then clear all facility errors
    // before returning"; solve_e only prints when the caller opted in with
    // PRINT_ERRORS, but always clears so the ring doesn't leak across calls
    // sharing the default context.
    if options & flags::PRINT_ERRORS != 0 {
        ctx.errors.print_and_clear(facility::PARSER | facility::EVALUATOR);
    } else {
        ctx.errors.clear(facility::PARSER | facility::EVALUATOR);
    }
    result
}

pub fn int_solve(expr: &str) -> Result<i64, ErrorKind> {
    int_solve_e(expr, flags::PRINT_ERRORS, &[])
}

pub fn int_solve_e(expr: &str, options: u32, labels: &[String]) -> Result<i64, ErrorKind> {
    let ctx = default_context();
    let result = parse_int(ctx, expr, options, labels).and_then(|mut e| evaluate_int(ctx, &mut e));
    if let Ok(value) = result {
        let _ = ctx.int_vars.set("ans", value);
    }
    if options & flags::PRINT_ERRORS != 0 {
        ctx.errors.print_and_clear(facility::INT_PARSER | facility::INT_EVALUATOR);
    } else {
        ctx.errors.clear(facility::INT_PARSER | facility::INT_EVALUATOR);
    }
    result
}

pub fn set_var(ctx: &Context, name: &str, value: Complex64, is_constant: bool) -> Result<(), ErrorKind> {
    if ctx.sci_funcs.contains(name) {
        return Err(ErrorKind::VariableShadowsFunction(name.to_string()));
    }
    ctx.sci_vars.set(name, value)?;
    if is_constant {
        ctx.sci_vars.seed_constant(name, value);
    }
    Ok(())
}

pub fn get_var(ctx: &Context, name: &str) -> Option<Complex64> {
    ctx.sci_vars.get(name)
}

pub fn remove_var(ctx: &Context, name: &str) -> Result<(), ErrorKind> {
    ctx.sci_vars.remove(name)
}

pub fn set_int_var(ctx: &Context, name: &str, value: i64, is_constant: bool) -> Result<(), ErrorKind> {
    if ctx.int_funcs.contains(name) {
        return Err(ErrorKind::VariableShadowsFunction(name.to_string()));
    }
    ctx.int_vars.set(name, value)?;
    if is_constant {
        ctx.int_vars.seed_constant(name, value);
    }
    Ok(())
}

pub fn get_int_var(ctx: &Context, name: &str) -> Option<i64> {
    ctx.int_vars.get(name)
}

pub fn remove_int_var(ctx: &Context, name: &str) -> Result<(), ErrorKind> {
    ctx.int_vars.remove(name)
}

pub fn set_ufunction(ctx: &Context, name: &str, arg_names_csv: &str, body: &str) -> Result<(), ErrorKind> {
    let labels = parse_csv_names(arg_names_csv)?;
    ctx.set_sci_ufunction(name, labels, body.to_string())
}

pub fn remove_ufunction(ctx: &Context, name: &str) -> bool {
    ctx.sci_funcs.remove(name)
}

pub fn set_int_ufunction(ctx: &Context, name: &str, arg_names_csv: &str, body: &str) -> Result<(), ErrorKind> {
    let labels = parse_csv_names(arg_names_csv)?;
    ctx.set_int_ufunction(name, labels, body.to_string())
}

pub fn remove_int_ufunction(ctx: &Context, name: &str) -> bool {
    ctx.int_funcs.remove(name)
}

fn parse_csv_names(csv: &str) -> Result<Vec<String>, ErrorKind> {
    if csv.trim().is_empty() {
        return Ok(Vec::new());
    }
    let names: Vec<String> = csv.split(',').map(|s| s.trim().to_string()).collect();
    let mut seen = std::collections::HashSet::new();
    for n in &names {
        if !seen.insert(n.as_str()) {
            return Err(ErrorKind::LabelsNotUnique);
        }
    }
    if names.len() > 64 {
        return Err(ErrorKind::TooManyLabels);
    }
    Ok(names)
}

pub fn set_int_mask(ctx: &Context, width: u8) -> Result<(), ErrorKind> {
    ctx.set_int_mask(width)
}

pub fn get_int_mask(ctx: &Context) -> u8 {
    ctx.get_int_mask()
}

pub fn print_errors(ctx: &Context, facilities: u32) {
    ctx.errors.print_and_clear(facilities);
}

pub fn clear_errors(ctx: &Context, facilities: u32) {
    ctx.errors.clear(facilities);
}

pub fn get_error_count(ctx: &Context, facilities: u32, severity: Option<Severity>) -> usize {
    ctx.errors.count(facilities, severity)
}

pub fn find_error(ctx: &Context, facilities: u32, needle: &str) -> Option<ErrorRecord> {
    ctx.errors.find(facilities, needle)
}

/// Valid widths accepted by `set_int_mask` (§6 "width ∈ {1,2,4,8,16,32,64}").
pub fn valid_widths() -> &'static [u8] {
    &crate::intmask::VALID_WIDTHS
}

pub const fn default_width() -> u8 {
    32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solve_evaluates_simple_expression() {
        let result = solve("1+2*3").unwrap();
        assert_eq!(result, Complex64::new(7.0, 0.0));
    }

    #[test]
    fn int_solve_masks_to_active_width() {
        let ctx = Context::new();
        ctx.set_int_mask(8).unwrap();
        let mut expr = parse_int(&ctx, "0xFF+1", 0, &[]).unwrap();
        assert_eq!(evaluate_int(&ctx, &mut expr).unwrap(), 0);
    }

    #[test]
    fn set_var_then_solve_sees_it() {
        let ctx = Context::new();
        set_var(&ctx, "x", Complex64::new(5.0, 0.0), false).unwrap();
        let mut expr = parse(&ctx, "x*2", 0, &[]).unwrap();
        assert_eq!(evaluate(&ctx, &mut expr).unwrap(), Complex64::new(10.0, 0.0));
    }

    #[test]
    fn set_ufunction_then_parse_resolves_call() {
        let ctx = Context::new();
        set_ufunction(&ctx, "double", "x", "x*2").unwrap();
        let mut expr = parse(&ctx, "double(21)", 0, &[]).unwrap();
        assert_eq!(evaluate(&ctx, &mut expr).unwrap(), Complex64::new(42.0, 0.0));
    }

    #[test]
    fn error_ring_records_undefined_variable() {
        let ctx = Context::new();
        let err = parse(&ctx, "q+1", 0, &[]).unwrap_err();
        assert_eq!(err, ErrorKind::UndefinedVariable("q".to_string()));
        assert_eq!(get_error_count(&ctx, facility::PARSER, None), 1);
    }
}
