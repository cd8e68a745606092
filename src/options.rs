// ABOUTME: Bitmask flags shared by the parser and evaluator entry points

/// A facility tag identifying which subsystem produced an error record.
///
/// Stored as a bitmask so callers can query/clear several facilities in one
/// call (`print_errors`, `clear_errors`, `get_error_count`).
pub mod facility {
    pub const GENERAL: u32 = 1 << 0;
    pub const PARSER: u32 = 1 << 1;
    pub const EVALUATOR: u32 = 1 << 2;
    pub const INT_PARSER: u32 = 1 << 3;
    pub const INT_EVALUATOR: u32 = 1 << 4;
    pub const MATRIX: u32 = 1 << 5;

    pub const ALL: u32 = GENERAL | PARSER | EVALUATOR | INT_PARSER | INT_EVALUATOR | MATRIX;
}

/// Severity of an accumulated error record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Halts the current parse/evaluation and propagates a sentinel.
    Fatal,
    /// Accumulated but does not stop compilation/evaluation.
    NonFatal,
}

/// Option flags recognized by `solve_e`/`int_solve_e`/`parse`/`parse_int`.
pub mod flags {
    /// Allow the scientific parser to promote real subexpressions to
    /// complex ones (§4.13 state transition `real-unary -> complex-unary`).
    pub const ENABLE_CMPLX: u32 = 1 << 0;
    /// Enable label binding: unresolved names fall back to a label slot
    /// instead of an undefined-variable error (used when compiling a
    /// user-function body).
    pub const ENABLE_UNK: u32 = 1 << 1;
    /// Skip acquiring the parser/evaluator locks (caller already holds them,
    /// or is single-threaded and wants to avoid the overhead).
    pub const NO_LOCK: u32 = 1 << 2;
    /// Print accumulated errors to stderr before returning, rather than
    /// leaving them for the caller to inspect via the error query API.
    pub const PRINT_ERRORS: u32 = 1 << 3;
}
