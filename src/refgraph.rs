// ABOUTME: Word-boundary textual reference scanning and cycle detection for user functions

use crate::error::ErrorKind;
use crate::lexer::{is_name_continue, is_name_start};
use std::collections::{HashMap, HashSet, VecDeque};

/// True if `body` contains `name` as a whole identifier — not as a
/// substring of some longer name (e.g. `"sin"` must not match inside
/// `"sinh"`). Resolved per the open question on indirect circular
/// references: membership is determined by scanning the stored source
/// text for name-boundary occurrences, not by re-parsing into an AST.
pub fn references(body: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let chars: Vec<char> = body.chars().collect();
    let needle: Vec<char> = name.chars().collect();
    let mut i = 0;
    while i + needle.len() <= chars.len() {
        if chars[i..i + needle.len()] == needle[..] {
            let before_ok = i == 0 || !is_name_continue(chars[i - 1]);
            let after_idx = i + needle.len();
            let after_ok = after_idx == chars.len() || !is_name_continue(chars[after_idx]);
            if before_ok && after_ok && is_name_start(needle[0]) {
                return true;
            }
        }
        i += 1;
    }
    false
}

/// Every user-function name referenced by `body` that also appears as a key
/// in `known`, used to build the reference graph's outgoing edges without
/// scanning `body` once per candidate name on every lookup.
fn referenced_known<'a>(body: &str, known: &'a HashMap<String, String>) -> Vec<&'a str> {
    known
        .keys()
        .filter(|name| references(body, name))
        .map(|s| s.as_str())
        .collect()
}

/// Check whether defining/redefining `target` with `new_body` would
/// introduce a self-reference or a cycle through the existing function
/// table `defs` (name -> body, not including `target`'s new body).
///
/// A direct self-reference is reported as `SelfReference`; any longer cycle
/// is reported as `CircularReference`.
pub fn would_create_cycle(
    defs: &HashMap<String, String>,
    target: &str,
    new_body: &str,
) -> Result<(), ErrorKind> {
    if references(new_body, target) {
        return Err(ErrorKind::SelfReference(target.to_string()));
    }

    // BFS over the reference graph starting from names `new_body` calls,
    // using the *existing* bodies for everyone but `target`. If we ever
    // reach `target`, defining it this way would close a cycle.
    let mut queue: VecDeque<String> = referenced_known(new_body, defs)
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    let mut visited: HashSet<String> = HashSet::new();

    while let Some(name) = queue.pop_front() {
        if !visited.insert(name.clone()) {
            continue;
        }
        // `target` is deliberately absent from `defs` (it's being redefined),
        // so a path back to it only shows up as a textual reference inside a
        // visited body, never as a reachable map key.
        let Some(body) = defs.get(&name) else {
            continue;
        };
        if references(body, target) {
            return Err(ErrorKind::CircularReference(target.to_string()));
        }
        for next in referenced_known(body, defs) {
            if !visited.contains(next) {
                queue.push_back(next.to_string());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_match_does_not_hit_substrings() {
        assert!(!references("sinh(x)", "sin"));
        assert!(references("sin(x) + 1", "sin"));
    }

    #[test]
    fn detects_direct_self_reference() {
        let defs = HashMap::new();
        let err = would_create_cycle(&defs, "f", "f(x) + 1").unwrap_err();
        assert_eq!(err, ErrorKind::SelfReference("f".to_string()));
    }

    #[test]
    fn detects_indirect_cycle() {
        let mut defs = HashMap::new();
        defs.insert("g".to_string(), "h(x) * 2".to_string());
        defs.insert("h".to_string(), "x + 1".to_string());
        // defining f(x) = g(x) is fine on its own...
        assert!(would_create_cycle(&defs, "f", "g(x)").is_ok());
        defs.insert("f".to_string(), "g(x)".to_string());
        // ...but if h is redefined to call f, that would close the cycle
        let err = would_create_cycle(&defs, "h", "f(x)").unwrap_err();
        assert!(matches!(err, ErrorKind::CircularReference(ref s) if s == "h"));
    }

    #[test]
    fn unrelated_functions_do_not_conflict() {
        let mut defs = HashMap::new();
        defs.insert("g".to_string(), "x * 2".to_string());
        assert!(would_create_cycle(&defs, "f", "g(x) + 1").is_ok());
    }
}
