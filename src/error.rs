// ABOUTME: Error taxonomy and the bounded, mutex-guarded error accumulator

use crate::options::{facility, Severity};
use std::collections::VecDeque;
use std::sync::Mutex;
use thiserror::Error;

/// Maximum number of error records the ring holds per `ErrorAccumulator`
/// before the oldest record is dropped (FIFO).
pub const EH_MAX_ERRORS: usize = 10;

/// Maximum number of characters shown on either side of the error column
/// when rendering a snippet (§6 "up to 50-character expression snippet").
const SNIPPET_WIDTH: usize = 50;

/// The error taxonomy shared by both domains' parser and evaluator.
///
/// Variants map 1:1 onto the kinds enumerated in the expression compiler
/// specification (§7); this is not a generic "parse error" grab-bag.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    // ---- Input-shape ----
    #[error("empty input")]
    EmptyInput,
    #[error("expression too long")]
    ExpressionTooLong,
    #[error("unmatched '('")]
    ParenthesisNotClosed,
    #[error("unmatched ')'")]
    ParenthesisNotOpen,
    #[error("empty parentheses")]
    EmptyParentheses,
    #[error("operator is missing its right operand")]
    MissingRightOperand,
    #[error("multiple '=' in expression")]
    MultipleAssignment,
    #[error("missing expression after '='")]
    MissingAssignmentValue,

    // ---- Lexical ----
    #[error("syntax error")]
    SyntaxError,
    #[error("invalid name")]
    InvalidName,
    #[error("illegal name '{0}'")]
    IllegalName(String),

    // ---- Semantic-binding ----
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),
    #[error("undefined function '{0}'")]
    UndefinedFunction(String),
    #[error("function name '{0}' shadows a built-in or variable")]
    FunctionShadowsExisting(String),
    #[error("variable name '{0}' shadows a function")]
    VariableShadowsFunction(String),
    #[error("'{0}' is a constant and cannot be overwritten")]
    OverwriteConstant(String),
    #[error("function '{0}' references itself")]
    SelfReference(String),
    #[error("function '{0}' participates in a circular reference")]
    CircularReference(String),

    // ---- Arithmetic ----
    #[error("division by zero")]
    DivisionByZero,
    #[error("modulo by zero")]
    ModuloZero,
    #[error("modulo does not support complex operands")]
    ModuloComplexNotSupported,
    #[error("complex operation attempted while complex mode is disabled")]
    ComplexDisabled,
    #[error("math error")]
    MathError,

    // ---- Integer-specific ----
    #[error("integer literal overflows 64 bits")]
    IntegerOverflow,
    #[error("integer literal too large for the active width")]
    IntTooLarge,
    #[error("shift amount too large for the active width")]
    ShiftTooLarge,
    #[error("shift amount is negative")]
    ShiftAmountNegative,
    #[error("rotation amount is negative")]
    RotationNegative,
    #[error("bit index out of range")]
    BitOutOfRange,
    #[error("not a valid IPv4 address")]
    InvalidIpv4,
    #[error("not a valid dot-decimal value")]
    InvalidDotDecimal,
    #[error("IPv4 size out of range")]
    InvalidIpv4Size,
    #[error("IPv4 prefix out of range")]
    InvalidIpv4Prefix,

    // ---- Extended-function ----
    #[error("too few arguments to '{0}'")]
    TooFewArguments(String),
    #[error("too many arguments to '{0}'")]
    TooManyArguments(String),
    #[error("labels are not unique")]
    LabelsNotUnique,
    #[error("too many labels (max 64)")]
    TooManyLabels,
    #[error("extended function '{0}' reported failure")]
    ExtendedFunctionFailed(String),
    #[error("undefined behavior in the given interval")]
    UndefinedBehaviorInInterval,
}

/// One accumulated error record.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    pub facility: u32,
    pub severity: Severity,
    pub kind: ErrorKind,
    /// Source column the error was detected at, when known.
    pub column: Option<usize>,
    /// The expression being compiled/evaluated, kept only for snippet
    /// rendering; `None` when no source string applies (e.g. a registry
    /// operation error).
    pub source: Option<String>,
}

impl ErrorRecord {
    /// Render the `facility tag, message, snippet, caret` format from §6.
    pub fn render(&self) -> String {
        let mut out = format!("[{}] {}", facility_name(self.facility), self.kind);
        if let (Some(col), Some(src)) = (self.column, &self.source) {
            out.push('\n');
            out.push_str(&render_snippet(src, col));
        }
        out
    }
}

fn facility_name(f: u32) -> &'static str {
    match f {
        facility::GENERAL => "general",
        facility::PARSER => "parser",
        facility::EVALUATOR => "evaluator",
        facility::INT_PARSER => "int-parser",
        facility::INT_EVALUATOR => "int-evaluator",
        facility::MATRIX => "matrix",
        _ => "unknown",
    }
}

fn render_snippet(src: &str, column: usize) -> String {
    let chars: Vec<char> = src.chars().collect();
    let half = SNIPPET_WIDTH / 2;
    let start = column.saturating_sub(half);
    let end = (column + half).min(chars.len());

    let mut snippet = String::new();
    if start > 0 {
        snippet.push_str("...");
    }
    snippet.push_str(&chars[start..end].iter().collect::<String>());
    if end < chars.len() {
        snippet.push_str("...");
    }

    let caret_offset = (column - start) + if start > 0 { 3 } else { 0 };
    let caret_line = format!("{}^", " ".repeat(caret_offset));
    format!("{snippet}\n{caret_line}")
}

/// A bounded, FIFO error ring guarded by a single mutex (§7 "error-database
/// lock"). Oldest record is dropped once the ring reaches `EH_MAX_ERRORS`.
#[derive(Default)]
pub struct ErrorAccumulator {
    records: Mutex<VecDeque<ErrorRecord>>,
}

impl ErrorAccumulator {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(EH_MAX_ERRORS)),
        }
    }

    /// Push a new record, dropping the oldest if the ring is full.
    pub fn push(&self, record: ErrorRecord) {
        let mut records = self.records.lock().unwrap();
        if records.len() == EH_MAX_ERRORS {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Print every record matching `facilities` to stderr, in insertion
    /// order, then remove them from the ring.
    pub fn print_and_clear(&self, facilities: u32) {
        let mut records = self.records.lock().unwrap();
        records.retain(|r| {
            let matches = r.facility & facilities != 0;
            if matches {
                eprintln!("{}", r.render());
            }
            !matches
        });
    }

    /// Remove every record matching `facilities` without printing.
    pub fn clear(&self, facilities: u32) {
        let mut records = self.records.lock().unwrap();
        records.retain(|r| r.facility & facilities == 0);
    }

    /// Count records matching `facilities` (and, optionally, a severity).
    pub fn count(&self, facilities: u32, severity: Option<Severity>) -> usize {
        let records = self.records.lock().unwrap();
        records
            .iter()
            .filter(|r| r.facility & facilities != 0)
            .filter(|r| match severity {
                Some(s) => r.severity == s,
                None => true,
            })
            .count()
    }

    /// Find the first record matching `facilities` whose rendered message
    /// contains `needle`.
    pub fn find(&self, facilities: u32, needle: &str) -> Option<ErrorRecord> {
        let records = self.records.lock().unwrap();
        records
            .iter()
            .find(|r| r.facility & facilities != 0 && r.kind.to_string().contains(needle))
            .cloned()
    }

    /// Snapshot every record currently in the ring, oldest first.
    pub fn snapshot(&self) -> Vec<ErrorRecord> {
        self.records.lock().unwrap().iter().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(kind: ErrorKind) -> ErrorRecord {
        ErrorRecord {
            facility: facility::PARSER,
            severity: Severity::Fatal,
            kind,
            column: None,
            source: None,
        }
    }

    #[test]
    fn ring_bound_drops_oldest() {
        let acc = ErrorAccumulator::new();
        for i in 0..(EH_MAX_ERRORS + 5) {
            acc.push(rec(ErrorKind::UndefinedVariable(format!("v{i}"))));
        }
        let snap = acc.snapshot();
        assert_eq!(snap.len(), EH_MAX_ERRORS);
        // the oldest 5 records should have been evicted
        assert!(matches!(&snap[0].kind, ErrorKind::UndefinedVariable(s) if s == "v5"));
    }

    #[test]
    fn clear_only_matching_facility() {
        let acc = ErrorAccumulator::new();
        acc.push(rec(ErrorKind::DivisionByZero));
        let mut other = rec(ErrorKind::MathError);
        other.facility = facility::EVALUATOR;
        acc.push(other);

        acc.clear(facility::PARSER);
        let snap = acc.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].facility, facility::EVALUATOR);
    }

    #[test]
    fn snippet_truncates_with_ellipses() {
        let long_expr = "x".repeat(200);
        let snippet = render_snippet(&long_expr, 150);
        assert!(snippet.starts_with("..."));
        assert!(snippet.contains("..."));
    }

    #[test]
    fn count_filters_by_severity() {
        let acc = ErrorAccumulator::new();
        acc.push(rec(ErrorKind::DivisionByZero));
        assert_eq!(acc.count(facility::PARSER, Some(Severity::Fatal)), 1);
        assert_eq!(acc.count(facility::PARSER, Some(Severity::NonFatal)), 0);
    }
}
