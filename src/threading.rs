// ABOUTME: Domain-agnostic evaluation-order threading and result-pointer wiring (§4.7-4.8)

/// Which operand slot of a node a within-subexpression wiring target names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// The computed thread (`next` chain plus `start_node`) and per-node result
/// wiring for one subexpression's node array, given only each node's
/// priority. Nodes are assumed to be indexed in the textual order their
/// operators were discovered in (§4.5 "allocated contiguously").
#[derive(Debug, Clone)]
pub struct Wiring {
    pub start_node: Option<usize>,
    pub next: Vec<Option<usize>>,
    /// `Some((node, side))` when this node's computed value feeds another
    /// node in the same subexpression; `None` marks the thread tail, whose
    /// value is this subexpression's own result (written externally).
    pub result: Vec<Option<(usize, Side)>>,
}

/// Build the thread order and result wiring for `priorities`, one entry per
/// node, in textual/creation order.
pub fn wire(priorities: &[u8]) -> Wiring {
    let n = priorities.len();
    if n == 0 {
        return Wiring {
            start_node: None,
            next: Vec::new(),
            result: Vec::new(),
        };
    }

    // §4.7: chain nodes of the same (maximum-first) priority class in
    // textual order, highest priority class first.
    let mut by_priority: Vec<usize> = (0..n).collect();
    by_priority.sort_by(|&a, &b| priorities[b].cmp(&priorities[a]).then(a.cmp(&b)));
    let mut next = vec![None; n];
    for w in by_priority.windows(2) {
        next[w[0]] = Some(w[1]);
    }
    let start_node = by_priority.first().copied();

    // §4.8: for each node, find L (nearest earlier node of strictly lower
    // priority) and R (nearest later node of priority <= this node's).
    let mut result = vec![None; n];
    for i in 0..n {
        let l = (0..i).rev().find(|&j| priorities[j] < priorities[i]);
        let r = (i + 1..n).find(|&j| priorities[j] <= priorities[i]);
        result[i] = match (l, r) {
            (None, None) => None,
            (None, Some(r)) => Some((r, Side::Left)),
            (Some(l), None) => Some((l, Side::Right)),
            (Some(l), Some(r)) => {
                if priorities[l] >= priorities[r] {
                    Some((l, Side::Right))
                } else {
                    Some((r, Side::Left))
                }
            }
        };
    }

    log::debug!("threaded {n} node(s), start={start_node:?}");
    Wiring {
        start_node,
        next,
        result,
    }
}
