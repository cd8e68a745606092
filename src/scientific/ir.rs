// ABOUTME: Compiled-expression data model for the scientific (complex) domain

use crate::threading::Side;
use num_complex::Complex64;

/// An arena-relative replacement for the original pointer-based "address of
/// an operand slot": which subexpression, which node within it, which side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandRef {
    pub subexpr: usize,
    pub node: usize,
    pub side: Side,
}

/// A label reference populated once at compile time and rewritten on every
/// `set_labels_values` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledOperand {
    pub target: OperandRef,
    pub label_id: u8,
    pub negative: bool,
}

/// Which real/complex unary table (or none/extended/user) a subexpression
/// dispatches to.
#[derive(Debug, Clone, PartialEq)]
pub enum FuncType {
    None,
    RealUnary(String),
    ComplexUnary(String),
    Extended { name: String, args: Vec<(usize, usize)> },
    User { name: String, args: Vec<(usize, usize)> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpNode {
    pub op: char,
    pub position: usize,
    pub index: usize,
    pub priority: u8,
    pub left: Complex64,
    pub right: Complex64,
    /// Where this node's computed value is written once it fires. `None`
    /// only for the thread tail of the outermost subexpression, which
    /// writes to `Expr::answer` instead.
    pub result: Option<OperandRef>,
    /// Next node in evaluation-order thread, within the same subexpression.
    pub next: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subexpr {
    pub depth: usize,
    pub subexpr_start: usize,
    pub solve_start: usize,
    pub solve_end: usize,
    pub nodes: Vec<OpNode>,
    pub start_node: Option<usize>,
    /// Where this subexpression's final value flows once computed. `None`
    /// for the outermost subexpression, whose value is the answer.
    pub result: Option<OperandRef>,
    pub func_type: FuncType,
}

/// A compiled scientific expression: the normalized source, its
/// deepest-first-ordered subexpressions, label metadata, and the answer
/// cell threading eventually writes into.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub source: String,
    pub subexprs: Vec<Subexpr>,
    pub labels: Vec<String>,
    pub label_refs: Vec<LabeledOperand>,
    pub answer: Complex64,
    pub complex_enabled: bool,
    /// Set when the normalized source was `name=body`; the assignment
    /// target to write back to after evaluation.
    pub assign_target: Option<String>,
}

impl Expr {
    pub fn index_of_outermost(&self) -> usize {
        self.subexprs.len() - 1
    }

    pub fn read(&self, r: OperandRef) -> Complex64 {
        let node = &self.subexprs[r.subexpr].nodes[r.node];
        match r.side {
            Side::Left => node.left,
            Side::Right => node.right,
        }
    }

    pub fn write(&mut self, r: OperandRef, value: Complex64) {
        let node = &mut self.subexprs[r.subexpr].nodes[r.node];
        match r.side {
            Side::Left => node.left = value,
            Side::Right => node.right = value,
        }
    }
}

/// Scientific operator precedence (§4.5): `^` highest, `*`/`/`/`%` next,
/// `+`/`-` lowest.
pub fn priority(op: char) -> u8 {
    match op {
        '^' => 3,
        '*' | '/' | '%' => 2,
        '+' | '-' => 1,
        _ => 0,
    }
}

pub const OPERATORS: &[char] = &['+', '-', '*', '/', '%', '^'];
