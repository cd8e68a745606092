// ABOUTME: Scientific-domain compiler pipeline: discovery, indexing, binding, threading, wiring

use crate::builtins;
use crate::error::ErrorKind;
use crate::lexer::{self, is_name_start, scan_number, NumberScan, ParenMap};
use crate::registry::{UserFunctionRegistry, VariableRegistry};
use crate::scientific::ir::{priority, Expr, FuncType, OpNode, OperandRef, Subexpr};
use crate::threading::{self, Side};
use num_complex::Complex64;
use std::collections::HashMap;

pub struct CompileOptions {
    pub enable_cmplx: bool,
    pub enable_unk: bool,
    pub labels: Vec<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            enable_cmplx: true,
            enable_unk: false,
            labels: Vec::new(),
        }
    }
}

pub struct CompileCtx<'a> {
    pub vars: &'a VariableRegistry<Complex64>,
    pub funcs: &'a UserFunctionRegistry,
}

/// Top-level entry: normalize, split an assignment target if present, verify
/// parenthesis balance, then build the full compiled form (§4.1-§4.9).
pub fn compile(raw: &str, opts: &CompileOptions, ctx: &CompileCtx<'_>) -> Result<Expr, ErrorKind> {
    if raw.is_empty() {
        return Err(ErrorKind::EmptyInput);
    }
    let stripped = lexer::strip_whitespace(raw);
    let normalized = lexer::collapse_signs(&stripped);
    if !normalized.is_ascii() {
        return Err(ErrorKind::SyntaxError);
    }

    let (assign_target, body) = split_assignment(&normalized)?;
    if body.is_empty() {
        return Err(ErrorKind::EmptyInput);
    }

    let chars: Vec<char> = body.chars().collect();
    let paren_map = ParenMap::build(&chars).map_err(|(kind, _col)| kind)?;

    let (mut subexprs, starts) = discover(&chars, &paren_map, ctx)?;
    for s in &mut subexprs {
        if matches!(s.func_type, FuncType::None) || is_unary_bound(&s.func_type) {
            index_and_bind_operators(s, &chars, &paren_map)?;
        }
    }

    let mut expr = Expr {
        source: body.clone(),
        subexprs,
        labels: opts.labels.clone(),
        label_refs: Vec::new(),
        answer: Complex64::new(0.0, 0.0),
        complex_enabled: opts.enable_cmplx,
        assign_target,
    };

    build_nodes(&mut expr, &starts, opts, ctx)?;
    wire_all(&mut expr);
    Ok(expr)
}

fn is_unary_bound(ft: &FuncType) -> bool {
    matches!(ft, FuncType::RealUnary(_) | FuncType::ComplexUnary(_))
}

/// Split `name=value` at a top-level `=`, validating the name and rejecting
/// multiple assignments (§4.1).
fn split_assignment(s: &str) -> Result<(Option<String>, String), ErrorKind> {
    let chars: Vec<char> = s.chars().collect();
    let mut depth = 0i32;
    let mut eq_pos = None;
    for (i, &c) in chars.iter().enumerate() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            '=' if depth == 0 => {
                if eq_pos.is_some() {
                    return Err(ErrorKind::MultipleAssignment);
                }
                eq_pos = Some(i);
            }
            _ => {}
        }
    }
    match eq_pos {
        None => Ok((None, s.to_string())),
        Some(pos) => {
            let name: String = chars[..pos].iter().collect();
            let value: String = chars[pos + 1..].iter().collect();
            if name.is_empty() || !is_legal_name(&name) {
                return Err(ErrorKind::InvalidName);
            }
            if value.is_empty() {
                return Err(ErrorKind::MissingAssignmentValue);
            }
            Ok((Some(name), value))
        }
    }
}

fn is_legal_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_name_start(c) => {}
        _ => return false,
    }
    chars.all(crate::lexer::is_name_continue)
}

struct DiscoveredMeta {
    open: usize,
}

/// §4.2: discover one `Subexpr` per `(`, classify its call kind, then append
/// the synthetic whole-expression subexpression.
fn discover(
    chars: &[char],
    paren_map: &ParenMap,
    ctx: &CompileCtx<'_>,
) -> Result<(Vec<Subexpr>, HashMap<usize, usize>), ErrorKind> {
    let mut raw: Vec<(Subexpr, DiscoveredMeta)> = Vec::new();
    let mut depth = 0usize;

    let mut i = 0usize;
    while i < chars.len() {
        if chars[i] == '(' {
            let close = paren_map.close_of(i).expect("validated paren map");
            let this_depth = depth + 1;
            depth += 1;

            let name_span = lexer::name_before(chars, i);
            let (subexpr_start, func_type, solve_start, solve_end) = if let Some((ns, ne)) =
                name_span
            {
                let name: String = chars[ns..ne].iter().collect();
                if ctx.funcs.contains(&name) {
                    // Arity mismatches are reported at call time (§4.10),
                    // not during discovery.
                    let args = lexer::split_args(chars, i + 1, close);
                    (ns, FuncType::User { name, args }, i + 1, close.saturating_sub(1))
                } else if builtins::extended_scientific_exists(&name) {
                    let args = lexer::split_args(chars, i + 1, close);
                    (
                        ns,
                        FuncType::Extended { name, args },
                        i + 1,
                        close.saturating_sub(1),
                    )
                } else if builtins::unary_real_exists(&name) {
                    (ns, FuncType::RealUnary(name), i + 1, close.saturating_sub(1))
                } else if builtins::unary_complex_exists(&name) {
                    (ns, FuncType::ComplexUnary(name), i + 1, close.saturating_sub(1))
                } else {
                    return Err(ErrorKind::UndefinedFunction(name));
                }
            } else {
                (i, FuncType::None, i + 1, close.saturating_sub(1))
            };

            if close == i + 1 && !matches!(func_type, FuncType::Extended { .. } | FuncType::User { .. })
            {
                return Err(ErrorKind::EmptyParentheses);
            }

            raw.push((
                Subexpr {
                    depth: this_depth,
                    subexpr_start,
                    solve_start,
                    solve_end,
                    nodes: Vec::new(),
                    start_node: None,
                    result: None,
                    func_type,
                },
                DiscoveredMeta { open: i },
            ));
            i += 1;
        } else if chars[i] == ')' {
            depth = depth.saturating_sub(1);
            i += 1;
        } else {
            i += 1;
        }
    }

    let last = chars.len().saturating_sub(1);
    raw.push((
        Subexpr {
            depth: 0,
            subexpr_start: 0,
            solve_start: 0,
            solve_end: last,
            nodes: Vec::new(),
            start_node: None,
            result: None,
            func_type: FuncType::None,
        },
        DiscoveredMeta {
            open: usize::MAX, // the synthetic whole-expression has no '(' of its own
        },
    ));

    raw.sort_by(|a, b| b.0.depth.cmp(&a.0.depth));

    let mut starts = HashMap::new();
    let mut subexprs = Vec::with_capacity(raw.len());
    for (idx, (s, meta)) in raw.into_iter().enumerate() {
        if meta.open != usize::MAX {
            starts.insert(s.subexpr_start, idx);
        }
        subexprs.push(s);
    }
    log::debug!("discovered {} subexpression(s)", subexprs.len());
    Ok((subexprs, starts))
}

struct OperatorHit {
    pos: usize,
    op: char,
}

/// §4.3: record top-level operator positions within `[solve_start,
/// solve_end]`, skipping nested parenthesis interiors and numeric literals.
fn index_and_bind_operators(
    s: &mut Subexpr,
    chars: &[char],
    paren_map: &ParenMap,
) -> Result<(), ErrorKind> {
    if s.solve_start > s.solve_end {
        return Ok(());
    }
    let mut hits = Vec::new();
    let mut i = s.solve_start;
    let mut last_was_operator = false;
    let ascii: String = chars.iter().collect();

    while i <= s.solve_end {
        let c = chars[i];
        if c == '(' {
            let close = paren_map.close_of(i).ok_or(ErrorKind::ParenthesisNotClosed)?;
            i = close + 1;
            last_was_operator = false;
            continue;
        }
        if is_name_start(c) {
            i = lexer::name_end(chars, i);
            last_was_operator = false;
            continue;
        }
        if c.is_ascii_digit() {
            let scan: NumberScan = scan_number(&ascii[i..], true).ok_or(ErrorKind::SyntaxError)?;
            i += scan.len.max(1);
            last_was_operator = false;
            continue;
        }
        if c == '+' || c == '-' {
            if last_was_operator {
                i += 1;
                continue;
            }
            hits.push(OperatorHit { pos: i, op: c });
            last_was_operator = true;
            i += 1;
            continue;
        }
        if lexer::is_name_continue(c) {
            i += 1;
            continue;
        }
        if "*/%^".contains(c) {
            hits.push(OperatorHit { pos: i, op: c });
            last_was_operator = true;
            i += 1;
            continue;
        }
        i += 1;
    }

    s.nodes = hits
        .into_iter()
        .enumerate()
        .map(|(idx, h)| OpNode {
            op: h.op,
            position: h.pos,
            index: idx,
            priority: priority(h.op),
            left: Complex64::new(0.0, 0.0),
            right: Complex64::new(0.0, 0.0),
            result: None,
            next: None,
        })
        .collect();
    Ok(())
}

enum Resolved {
    Value(Complex64),
    SubexprLink(usize),
    Label(u8, bool),
}

#[allow(clippy::too_many_arguments)]
fn resolve_operand(
    text_start: usize,
    text_end: usize,
    chars: &[char],
    starts: &HashMap<usize, usize>,
    opts: &CompileOptions,
    ctx: &CompileCtx<'_>,
) -> Result<Resolved, ErrorKind> {
    if text_start >= text_end {
        return Err(ErrorKind::MissingRightOperand);
    }
    if let Some(&idx) = starts.get(&text_start) {
        return Ok(Resolved::SubexprLink(idx));
    }

    let (negative, body_start) = match chars[text_start] {
        '-' => (true, text_start + 1),
        '+' => (false, text_start + 1),
        _ => (false, text_start),
    };
    if body_start >= text_end {
        return Err(ErrorKind::SyntaxError);
    }
    let text: String = chars[body_start..text_end].iter().collect();

    if let Some(scan) = scan_number(&text, true) {
        if scan.len == text.len() {
            let mut v = literal_value(&scan)?;
            if negative {
                v = -v;
            }
            return Ok(Resolved::Value(v));
        }
    }

    if opts.enable_unk {
        if let Some(id) = opts.labels.iter().position(|l| l == &text) {
            if id >= 64 {
                return Err(ErrorKind::TooManyLabels);
            }
            return Ok(Resolved::Label(id as u8, negative));
        }
    }

    // "ans" is resolved the same way as any other variable: `api::solve`
    // seeds the live answer value into the registry under that name before
    // each compile (§3 "`ans` follows the same [inlining] rule").
    match ctx.vars.get(&text) {
        Some(v) => Ok(Resolved::Value(if negative { -v } else { v })),
        None => Err(ErrorKind::UndefinedVariable(text)),
    }
}

fn literal_value(scan: &NumberScan) -> Result<Complex64, ErrorKind> {
    let magnitude = match scan.base {
        10 => {
            let mantissa: f64 = scan.mantissa.parse().map_err(|_| ErrorKind::SyntaxError)?;
            match scan.exponent {
                Some(e) => mantissa * 10f64.powi(e),
                None => mantissa,
            }
        }
        base => {
            let as_int = u64::from_str_radix(&scan.mantissa, base).map_err(|_| ErrorKind::SyntaxError)?;
            as_int as f64
        }
    };
    Ok(if scan.imaginary {
        Complex64::new(0.0, magnitude)
    } else {
        Complex64::new(magnitude, 0.0)
    })
}

/// §4.5-4.6: assign operand values/links into each node's left/right slot.
fn build_nodes(
    expr: &mut Expr,
    starts: &HashMap<usize, usize>,
    opts: &CompileOptions,
    ctx: &CompileCtx<'_>,
) -> Result<(), ErrorKind> {
    let chars: Vec<char> = expr.source.chars().collect();
    let n_subexprs = expr.subexprs.len();

    for si in 0..n_subexprs {
        let (solve_start, solve_end, n_nodes) = {
            let s = &expr.subexprs[si];
            (s.solve_start, s.solve_end, s.nodes.len())
        };
        if matches!(
            expr.subexprs[si].func_type,
            FuncType::Extended { .. } | FuncType::User { .. }
        ) {
            continue;
        }
        if n_nodes == 0 {
            if solve_start > solve_end {
                return Err(ErrorKind::EmptyParentheses);
            }
            let resolved = resolve_operand(solve_start, solve_end + 1, &chars, starts, opts, ctx)?;
            let node = OpNode {
                op: '+',
                position: solve_start,
                index: 0,
                priority: priority('+'),
                left: Complex64::new(0.0, 0.0),
                right: Complex64::new(0.0, 0.0),
                result: None,
                next: None,
            };
            expr.subexprs[si].nodes.push(node);
            apply_resolved(expr, si, 0, Side::Right, resolved)?;
            continue;
        }

        let positions: Vec<usize> = expr.subexprs[si].nodes.iter().map(|n| n.position).collect();
        let leading_sign = positions[0] == solve_start;
        if leading_sign {
            // A different leading operator (e.g. "*2+3") is a syntax error;
            // only "+"/"-" may open a subexpression with an implicit zero.
            let leading_op = expr.subexprs[si].nodes[0].op;
            if leading_op != '+' && leading_op != '-' {
                return Err(ErrorKind::SyntaxError);
            }
            expr.subexprs[si].nodes[0].left = Complex64::new(0.0, 0.0);
        } else {
            let resolved = resolve_operand(solve_start, positions[0], &chars, starts, opts, ctx)?;
            apply_resolved(expr, si, 0, Side::Left, resolved)?;
        }

        for k in 1..n_nodes {
            let gap_start = positions[k - 1] + 1;
            let gap_end = positions[k];
            let prio_prev = expr.subexprs[si].nodes[k - 1].priority;
            let prio_cur = expr.subexprs[si].nodes[k].priority;
            let resolved = resolve_operand(gap_start, gap_end, &chars, starts, opts, ctx)?;
            if prio_prev >= prio_cur {
                apply_resolved(expr, si, k - 1, Side::Right, resolved)?;
            } else {
                apply_resolved(expr, si, k, Side::Left, resolved)?;
            }
        }

        let last_gap_start = positions[n_nodes - 1] + 1;
        let resolved = resolve_operand(last_gap_start, solve_end + 1, &chars, starts, opts, ctx)?;
        apply_resolved(expr, si, n_nodes - 1, Side::Right, resolved)?;
    }
    Ok(())
}

fn apply_resolved(
    expr: &mut Expr,
    subexpr: usize,
    node: usize,
    side: Side,
    resolved: Resolved,
) -> Result<(), ErrorKind> {
    match resolved {
        Resolved::Value(v) => {
            let n = &mut expr.subexprs[subexpr].nodes[node];
            match side {
                Side::Left => n.left = v,
                Side::Right => n.right = v,
            }
        }
        Resolved::SubexprLink(target_idx) => {
            expr.subexprs[target_idx].result = Some(OperandRef { subexpr, node, side });
        }
        Resolved::Label(id, negative) => {
            expr.label_refs.push(crate::scientific::ir::LabeledOperand {
                target: OperandRef { subexpr, node, side },
                label_id: id,
                negative,
            });
        }
    }
    Ok(())
}

/// §4.7-4.8: thread each subexpression's nodes and wire internal/external
/// result targets.
fn wire_all(expr: &mut Expr) {
    let outermost = expr.index_of_outermost();
    for si in 0..expr.subexprs.len() {
        if matches!(
            expr.subexprs[si].func_type,
            FuncType::Extended { .. } | FuncType::User { .. }
        ) {
            continue;
        }
        let priorities: Vec<u8> = expr.subexprs[si].nodes.iter().map(|n| n.priority).collect();
        let wiring = threading::wire(&priorities);
        expr.subexprs[si].start_node = wiring.start_node;
        for (node_idx, next) in wiring.next.into_iter().enumerate() {
            expr.subexprs[si].nodes[node_idx].next = next;
        }
        for (node_idx, target) in wiring.result.into_iter().enumerate() {
            expr.subexprs[si].nodes[node_idx].result = match target {
                Some((n, side)) => Some(OperandRef {
                    subexpr: si,
                    node: n,
                    side,
                }),
                None => {
                    // Thread tail: write to the subexpression's own external
                    // target, or the answer cell when this is the outermost.
                    if si == outermost {
                        None
                    } else {
                        expr.subexprs[si].result
                    }
                }
            };
        }
    }
}

/// §4.9: structural deep copy. Arena indices need no fix-up since they are
/// relative to the (copied) arrays, not to addresses.
pub fn duplicate(expr: &Expr) -> Expr {
    log::debug!("duplicating compiled expression '{}'", expr.source);
    expr.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::facility;

    fn ctx_with(vars: &VariableRegistry<Complex64>, funcs: &UserFunctionRegistry) -> CompileCtx<'_> {
        CompileCtx { vars, funcs }
    }

    #[test]
    fn compiles_simple_precedence_chain() {
        let vars = VariableRegistry::new(&[]);
        let funcs = UserFunctionRegistry::new();
        let ctx = ctx_with(&vars, &funcs);
        let expr = compile("1+2*3", &CompileOptions::default(), &ctx).unwrap();
        let outer = expr.index_of_outermost();
        assert_eq!(expr.subexprs[outer].nodes.len(), 2);
        let _ = facility::GENERAL;
    }

    #[test]
    fn rejects_unmatched_parenthesis() {
        let vars = VariableRegistry::new(&[]);
        let funcs = UserFunctionRegistry::new();
        let ctx = ctx_with(&vars, &funcs);
        let err = compile("(1+2", &CompileOptions::default(), &ctx).unwrap_err();
        assert_eq!(err, ErrorKind::ParenthesisNotClosed);
    }

    #[test]
    fn rejects_non_sign_leading_operator() {
        let vars = VariableRegistry::new(&[]);
        let funcs = UserFunctionRegistry::new();
        let ctx = ctx_with(&vars, &funcs);
        let err = compile("(*2+3)", &CompileOptions::default(), &ctx).unwrap_err();
        assert_eq!(err, ErrorKind::SyntaxError);
        let err = compile("(^2+3)", &CompileOptions::default(), &ctx).unwrap_err();
        assert_eq!(err, ErrorKind::SyntaxError);
    }

    #[test]
    fn rejects_empty_parens() {
        let vars = VariableRegistry::new(&[]);
        let funcs = UserFunctionRegistry::new();
        let ctx = ctx_with(&vars, &funcs);
        let err = compile("()", &CompileOptions::default(), &ctx).unwrap_err();
        assert_eq!(err, ErrorKind::EmptyParentheses);
    }

    #[test]
    fn splits_assignment_target() {
        let vars = VariableRegistry::new(&[]);
        let funcs = UserFunctionRegistry::new();
        let ctx = ctx_with(&vars, &funcs);
        let expr = compile("x=5", &CompileOptions::default(), &ctx).unwrap();
        assert_eq!(expr.assign_target.as_deref(), Some("x"));
    }

    #[test]
    fn duplicate_is_structurally_equal() {
        let vars = VariableRegistry::new(&[]);
        let funcs = UserFunctionRegistry::new();
        let ctx = ctx_with(&vars, &funcs);
        let expr = compile("(1+2)*(3+4)", &CompileOptions::default(), &ctx).unwrap();
        let copy = duplicate(&expr);
        assert_eq!(expr, copy);
    }
}
