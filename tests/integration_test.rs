// ABOUTME: Comprehensive integration tests verifying all features work together

use calcweave::context::Context;
use calcweave::error::ErrorKind;
use calcweave::{evaluate, evaluate_int, parse, parse_int, set_int_ufunction, set_int_var, set_ufunction, set_var};
use num_complex::Complex64;

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

fn solve_sci(ctx: &Context, expr: &str) -> Result<Complex64, ErrorKind> {
    let mut e = parse(ctx, expr, calcweave::options::flags::ENABLE_CMPLX, &[])?;
    evaluate(ctx, &mut e)
}

fn solve_int(ctx: &Context, expr: &str) -> Result<i64, ErrorKind> {
    let mut e = parse_int(ctx, expr, 0, &[])?;
    evaluate_int(ctx, &mut e)
}

#[test]
fn test_precedence_and_parens() {
    let ctx = Context::new();
    assert_eq!(solve_sci(&ctx, "2+3*4").unwrap(), c(14.0, 0.0));
    assert_eq!(solve_sci(&ctx, "(2+3)*4").unwrap(), c(20.0, 0.0));
    assert_eq!(solve_sci(&ctx, "2^3^2").unwrap(), c(64.0, 0.0));
}

#[test]
fn test_left_associative_subtraction() {
    let ctx = Context::new();
    assert_eq!(solve_sci(&ctx, "10-3-2").unwrap(), c(5.0, 0.0));
}

#[test]
fn test_builtin_constants() {
    let ctx = Context::new();
    let result = solve_sci(&ctx, "sqrt(-1)").unwrap();
    assert!((result.re).abs() < 1e-9);
    assert!((result.im - 1.0).abs() < 1e-9);

    let light_speed = solve_sci(&ctx, "c").unwrap();
    assert_eq!(light_speed, c(299_792_458.0, 0.0));
    assert!(set_var(&ctx, "c", c(1.0, 0.0), false).is_err());
}

#[test]
fn test_variable_definition_and_reuse() {
    let ctx = Context::new();
    set_var(&ctx, "x", c(5.0, 0.0), false).unwrap();
    assert_eq!(solve_sci(&ctx, "x*x+1").unwrap(), c(26.0, 0.0));

    // update x, re-evaluate
    set_var(&ctx, "x", c(10.0, 0.0), false).unwrap();
    assert_eq!(solve_sci(&ctx, "x*x+1").unwrap(), c(101.0, 0.0));
}

#[test]
fn test_assignment_writes_back_to_variable() {
    let ctx = Context::new();
    let mut expr = parse(&ctx, "y=3+4", 0, &[]).unwrap();
    assert_eq!(evaluate(&ctx, &mut expr).unwrap(), c(7.0, 0.0));
    assert_eq!(solve_sci(&ctx, "y*2").unwrap(), c(14.0, 0.0));
}

#[test]
fn test_user_function_definition_and_call() {
    let ctx = Context::new();
    set_ufunction(&ctx, "square", "x", "x*x").unwrap();
    assert_eq!(solve_sci(&ctx, "square(6)").unwrap(), c(36.0, 0.0));

    set_ufunction(&ctx, "hypot2", "a,b", "a*a+b*b").unwrap();
    assert_eq!(solve_sci(&ctx, "hypot2(3,4)").unwrap(), c(25.0, 0.0));
}

#[test]
fn test_user_function_rejects_self_reference() {
    let ctx = Context::new();
    let err = set_ufunction(&ctx, "loop", "x", "loop(x)+1").unwrap_err();
    assert_eq!(err, ErrorKind::SelfReference("loop".to_string()));
}

#[test]
fn test_user_function_rejects_mutual_cycle() {
    let ctx = Context::new();
    set_ufunction(&ctx, "f", "x", "g(x)+1").unwrap();
    let err = set_ufunction(&ctx, "g", "x", "f(x)+1").unwrap_err();
    assert_eq!(err, ErrorKind::CircularReference("g".to_string()));
}

#[test]
fn test_extended_call_avg() {
    let ctx = Context::new();
    assert_eq!(solve_sci(&ctx, "avg(2,4,6,8)").unwrap(), c(5.0, 0.0));
}

#[test]
fn test_integrate_and_derivative() {
    let ctx = Context::new();
    // integral of x over [0, 2] is 2
    let result = solve_sci(&ctx, "integrate(x,0,2)").unwrap();
    assert!((result.re - 2.0).abs() < 1e-3);

    // derivative of x^2 at 3 is 6
    let result = solve_sci(&ctx, "der(x^2,3)").unwrap();
    assert!((result.re - 6.0).abs() < 1e-2);
}

#[test]
fn test_division_and_modulo_by_zero_are_fatal() {
    let ctx = Context::new();
    assert_eq!(solve_sci(&ctx, "1/0").unwrap_err(), ErrorKind::DivisionByZero);
    assert_eq!(solve_sci(&ctx, "1%0").unwrap_err(), ErrorKind::ModuloZero);
}

#[test]
fn test_integer_precedence_and_masking() {
    let ctx = Context::new();
    assert_eq!(solve_int(&ctx, "2+3*4").unwrap(), 14);

    ctx.set_int_mask(8).unwrap();
    assert_eq!(solve_int(&ctx, "0xFF+1").unwrap(), 0);
    assert_eq!(solve_int(&ctx, "0x7F+1").unwrap(), -128);
}

#[test]
fn test_integer_bitwise_operators() {
    let ctx = Context::new();
    ctx.set_int_mask(8).unwrap();
    assert_eq!(solve_int(&ctx, "0x0F&0xF0").unwrap(), 0);
    assert_eq!(solve_int(&ctx, "0x0F|0xF0").unwrap(), -1);
    assert_eq!(solve_int(&ctx, "0xFF^0x0F").unwrap(), 0xF0u8 as i8 as i64);
}

#[test]
fn test_integer_has_no_infix_power() {
    // integer domain's `^` is bitwise xor, never exponentiation
    let ctx = Context::new();
    assert_eq!(solve_int(&ctx, "2^3").unwrap(), 1);
}

#[test]
fn test_extended_integer_shift_and_rotate() {
    let ctx = Context::new();
    ctx.set_int_mask(8).unwrap();
    assert_eq!(solve_int(&ctx, "sra(0x80,1)").unwrap(), 0xC0u8 as i8 as i64);
    assert_eq!(solve_int(&ctx, "sl(1,4)").unwrap(), 16);
}

#[test]
fn test_dotted_parses_ipv4_without_arithmetic() {
    let ctx = Context::new();
    ctx.set_int_mask(32).unwrap();
    assert_eq!(solve_int(&ctx, "dotted(192.168.1.1)").unwrap(), 0xC0A80101u32 as i32 as i64);
}

#[test]
fn test_integer_user_function() {
    let ctx = Context::new();
    set_int_ufunction(&ctx, "double", "x", "x*2").unwrap();
    assert_eq!(solve_int(&ctx, "double(21)").unwrap(), 42);
}

#[test]
fn test_int_var_shadowing_rules() {
    let ctx = Context::new();
    set_int_var(&ctx, "n", 10, false).unwrap();
    assert_eq!(solve_int(&ctx, "n*n").unwrap(), 100);

    set_int_ufunction(&ctx, "tripled", "x", "x*3").unwrap();
    let err = set_int_var(&ctx, "tripled", 1, false).unwrap_err();
    assert_eq!(err, ErrorKind::VariableShadowsFunction("tripled".to_string()));
}

#[test]
fn test_parenthesis_balance_errors() {
    let ctx = Context::new();
    assert_eq!(parse(&ctx, "(1+2", 0, &[]).unwrap_err(), ErrorKind::ParenthesisNotClosed);
    assert_eq!(parse(&ctx, "1+2)", 0, &[]).unwrap_err(), ErrorKind::ParenthesisNotOpen);
}

#[test]
fn test_undefined_variable_and_function_errors() {
    let ctx = Context::new();
    assert_eq!(
        parse(&ctx, "q+1", 0, &[]).unwrap_err(),
        ErrorKind::UndefinedVariable("q".to_string())
    );
    assert_eq!(
        parse(&ctx, "frobnicate(1)", 0, &[]).unwrap_err(),
        ErrorKind::UndefinedFunction("frobnicate".to_string())
    );
}

#[test]
fn test_error_ring_records_and_clears() {
    let ctx = Context::new();
    let _ = parse(&ctx, "q+1", 0, &[]);
    let _ = parse(&ctx, "r+1", 0, &[]);
    assert_eq!(
        calcweave::get_error_count(&ctx, calcweave::options::facility::PARSER, None),
        2
    );
    calcweave::clear_errors(&ctx, calcweave::options::facility::PARSER);
    assert_eq!(
        calcweave::get_error_count(&ctx, calcweave::options::facility::PARSER, None),
        0
    );
}

#[test]
fn test_error_ring_is_bounded() {
    let ctx = Context::new();
    for i in 0..20 {
        let _ = parse(&ctx, &format!("undefined_{i}+1"), 0, &[]);
    }
    assert_eq!(
        calcweave::get_error_count(&ctx, calcweave::options::facility::PARSER, None),
        calcweave::error::EH_MAX_ERRORS
    );
}

#[test]
fn test_deep_copy_evaluates_identically() {
    let ctx = Context::new();
    let expr = parse(&ctx, "1+2*3-4/2", 0, &[]).unwrap();
    let mut original = expr.clone();
    let mut duplicate = calcweave::scientific::compiler::duplicate(&expr);
    assert_eq!(evaluate(&ctx, &mut original), evaluate(&ctx, &mut duplicate));
}

#[test]
fn test_scientific_and_hex_literals() {
    let ctx = Context::new();
    assert_eq!(solve_sci(&ctx, "1.5e2").unwrap(), c(150.0, 0.0));

    let mut expr = parse_int(&ctx, "0x1F", 0, &[]).unwrap();
    assert_eq!(evaluate_int(&ctx, &mut expr).unwrap(), 31);

    let mut expr = parse_int(&ctx, "0o17", 0, &[]).unwrap();
    assert_eq!(evaluate_int(&ctx, &mut expr).unwrap(), 15);

    let mut expr = parse_int(&ctx, "0b1010", 0, &[]).unwrap();
    assert_eq!(evaluate_int(&ctx, &mut expr).unwrap(), 10);
}
