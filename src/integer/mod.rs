// ABOUTME: Integer (fixed-width two's-complement) expression domain: compiler, IR, evaluator

pub mod compiler;
pub mod eval;
pub mod ir;
