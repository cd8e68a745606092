// ABOUTME: Tests for shared-Context thread safety and the hierarchical lock order

use calcweave::context::Context;
use calcweave::registry::lock_ordered;
use calcweave::{evaluate, int_solve, int_solve_e, parse, set_int_var, set_var, solve, solve_e};
use num_complex::Complex64;
use serial_test::serial;
use std::sync::Arc;
use std::thread;

#[test]
fn test_concurrent_reads_of_shared_variable() {
    let ctx = Arc::new(Context::new());
    set_var(&ctx, "x", Complex64::new(7.0, 0.0), false).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ctx = ctx.clone();
            thread::spawn(move || {
                let mut expr = parse(&ctx, "x*x", 0, &[]).unwrap();
                evaluate(&ctx, &mut expr).unwrap()
            })
        })
        .collect();

    for h in handles {
        assert_eq!(h.join().unwrap(), Complex64::new(49.0, 0.0));
    }
}

#[test]
fn test_concurrent_writers_each_see_their_own_variable() {
    let ctx = Arc::new(Context::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let ctx = ctx.clone();
            thread::spawn(move || {
                let name = format!("v{i}");
                set_int_var(&ctx, &name, i, false).unwrap();
                let mut expr = parse_int_helper(&ctx, &format!("{name}*2"));
                calcweave::evaluate_int(&ctx, &mut expr).unwrap()
            })
        })
        .collect();

    for (i, h) in handles.into_iter().enumerate() {
        assert_eq!(h.join().unwrap(), i as i64 * 2);
    }
}

fn parse_int_helper(ctx: &Context, expr: &str) -> calcweave::integer::ir::Expr {
    calcweave::parse_int(ctx, expr, 0, &[]).unwrap()
}

#[test]
fn test_lock_ordered_exposes_both_tables_under_contention() {
    let ctx = Arc::new(Context::new());
    set_int_var(&ctx, "base", 1, false).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let ctx = ctx.clone();
            thread::spawn(move || {
                let name = format!("f{i}");
                ctx.set_int_ufunction(&name, vec!["x".to_string()], "x+base".to_string())
                    .unwrap();
                let mut locked = lock_ordered(&ctx.int_funcs, &ctx.int_vars);
                assert!(locked.functions().contains_key(&name));
                assert!(locked.variables().contains_key("base"));
                locked.variables_mut().insert(format!("seen_by_{name}"), 1);
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    for i in 0..4 {
        assert!(calcweave::get_int_var(&ctx, &format!("seen_by_f{i}")).is_some());
    }
}

#[test]
fn test_set_int_mask_is_serialized_against_concurrent_solves() {
    let ctx = Arc::new(Context::new());
    ctx.set_int_mask(8).unwrap();

    let mask_thread = {
        let ctx = ctx.clone();
        thread::spawn(move || {
            for _ in 0..50 {
                ctx.set_int_mask(8).unwrap();
                ctx.set_int_mask(16).unwrap();
            }
        })
    };

    let solve_thread = {
        let ctx = ctx.clone();
        thread::spawn(move || {
            for _ in 0..50 {
                let mut expr = parse_int_helper(&ctx, "1+1");
                assert_eq!(calcweave::evaluate_int(&ctx, &mut expr).unwrap(), 2);
            }
        })
    };

    mask_thread.join().unwrap();
    solve_thread.join().unwrap();
}

// The default process-wide context is a shared global, so tests exercising
// `solve`/`int_solve` (rather than a locally constructed `Context`) must run
// serially to avoid clobbering each other's `ans` and error ring.

#[test]
#[serial]
fn test_solve_seeds_ans_on_default_context() {
    solve("6*7").unwrap();
    assert_eq!(solve("ans+1").unwrap(), Complex64::new(43.0, 0.0));
}

#[test]
#[serial]
fn test_int_solve_seeds_ans_on_default_context() {
    int_solve("6*7").unwrap();
    assert_eq!(int_solve("ans+1").unwrap(), 43);
}

#[test]
#[serial]
fn test_solve_e_clears_error_ring_without_print_flag() {
    let ctx = calcweave::default_context();
    calcweave::clear_errors(ctx, calcweave::options::facility::ALL);

    let err = solve_e("undefined_var+1", 0, &[]).unwrap_err();
    assert_eq!(err, calcweave::error::ErrorKind::UndefinedVariable("undefined_var".to_string()));
    assert_eq!(calcweave::get_error_count(ctx, calcweave::options::facility::PARSER, None), 0);
}

#[test]
#[serial]
fn test_int_solve_e_respects_active_width_on_default_context() {
    let ctx = calcweave::default_context();
    ctx.set_int_mask(8).unwrap();
    assert_eq!(int_solve_e("0xFF+1", 0, &[]).unwrap(), 0);
    ctx.set_int_mask(calcweave::default_width()).unwrap();
}
