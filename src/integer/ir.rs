// ABOUTME: Compiled-expression data model for the integer (fixed-width two's-complement) domain

use crate::threading::Side;

/// An arena-relative replacement for the original pointer-based "address of
/// an operand slot": which subexpression, which node within it, which side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandRef {
    pub subexpr: usize,
    pub node: usize,
    pub side: Side,
}

/// A label reference populated once at compile time and rewritten on every
/// `set_labels` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabeledOperand {
    pub target: OperandRef,
    pub label_id: u8,
    pub negative: bool,
}

/// Which extended/user-function table (or none) a subexpression dispatches
/// to. There is no real/complex-unary split in this domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FuncType {
    None,
    Extended { name: String, args: Vec<(usize, usize)> },
    User { name: String, args: Vec<(usize, usize)> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpNode {
    pub op: char,
    pub position: usize,
    pub index: usize,
    pub priority: u8,
    pub left: i64,
    pub right: i64,
    /// Where this node's computed value is written once it fires. `None`
    /// only for the thread tail of the outermost subexpression, which
    /// writes to `Expr::answer` instead.
    pub result: Option<OperandRef>,
    /// Next node in evaluation-order thread, within the same subexpression.
    pub next: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
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

/// A compiled integer expression: the normalized source, its
/// deepest-first-ordered subexpressions, label metadata, and the answer
/// cell. Values are masked to the active width immediately after every node
/// fires; sign extension is applied wherever a masked value is read back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub source: String,
    pub subexprs: Vec<Subexpr>,
    pub labels: Vec<String>,
    pub label_refs: Vec<LabeledOperand>,
    pub answer: i64,
    /// Set when the normalized source was `name=body`; the assignment
    /// target to write back to after evaluation.
    pub assign_target: Option<String>,
}

impl Expr {
    pub fn index_of_outermost(&self) -> usize {
        self.subexprs.len() - 1
    }

    pub fn read(&self, r: OperandRef) -> i64 {
        let node = &self.subexprs[r.subexpr].nodes[r.node];
        match r.side {
            Side::Left => node.left,
            Side::Right => node.right,
        }
    }

    pub fn write(&mut self, r: OperandRef, value: i64) {
        let node = &mut self.subexprs[r.subexpr].nodes[r.node];
        match r.side {
            Side::Left => node.left = value,
            Side::Right => node.right = value,
        }
    }
}

/// Integer operator precedence (§4.5). Shift/rotate are reserved to
/// extended-function names (`sl`, `sr`, `sra`, `rl`, `rr`) rather than infix
/// tokens, and `^` is bitwise xor in this domain, not exponentiation —
/// the power table entry in the distilled precedence list collides with the
/// bitwise-operator list and is resolved in favor of the latter (see
/// DESIGN.md).
pub fn priority(op: char) -> u8 {
    match op {
        '*' | '/' | '%' => 5,
        '+' | '-' => 4,
        '&' => 3,
        '^' => 2,
        '|' => 1,
        _ => 0,
    }
}

pub const OPERATORS: &[char] = &['+', '-', '*', '/', '%', '&', '^', '|'];
