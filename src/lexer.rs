// ABOUTME: Shared lexical utilities used by both the scientific and integer parsers

use crate::error::ErrorKind;
use nom::character::complete::{digit1, hex_digit1, oct_digit1, one_of};
use nom::combinator::recognize;
use nom::multi::many1;
use nom::IResult;
use std::collections::HashMap;

/// A legal identifier starts with a letter or `_` (§6 "Name rules").
pub fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Remaining identifier characters are letters, digits, or `_`.
pub fn is_name_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Strip all whitespace from the input (§4.1 "Input is copied and whitespace
/// removed").
pub fn strip_whitespace(input: &str) -> String {
    input.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Fold consecutive `+`/`-` runs into a single sign: an odd count of `-`
/// collapses to `-`, an even count (or none) collapses to `+` (§4.1).
/// Leaves every other character untouched.
pub fn collapse_signs(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '+' || c == '-' {
            let mut negatives = 0usize;
            let mut j = i;
            while j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                if chars[j] == '-' {
                    negatives += 1;
                }
                j += 1;
            }
            out.push(if negatives % 2 == 1 { '-' } else { '+' });
            i = j;
        } else {
            out.push(c);
            i += 1;
        }
    }
    out
}

/// Scan forward from `start` (which must point at a name-start character)
/// to the index just past the last name-continue character.
pub fn name_end(chars: &[char], start: usize) -> usize {
    let mut i = start + 1;
    while i < chars.len() && is_name_continue(chars[i]) {
        i += 1;
    }
    i
}

/// Given the index of a character that immediately follows a possible name
/// (e.g. the position of an opening `(`), scan backward to find the name's
/// start. Returns `None` if the character directly before `idx` is not part
/// of a name.
pub fn name_before(chars: &[char], idx: usize) -> Option<(usize, usize)> {
    if idx == 0 {
        return None;
    }
    let mut start = idx;
    while start > 0 && is_name_continue(chars[start - 1]) {
        start -= 1;
    }
    if start == idx || !is_name_start(chars[start]) {
        return None;
    }
    Some((start, idx))
}

/// Bidirectional map between matching `(`/`)` indices, built in one linear
/// pass with a stack (§4.2, invariant in §3: "for every `(` there is exactly
/// one matching `)`").
#[derive(Debug, Default, Clone)]
pub struct ParenMap {
    open_to_close: HashMap<usize, usize>,
    close_to_open: HashMap<usize, usize>,
}

impl ParenMap {
    pub fn build(chars: &[char]) -> Result<Self, (ErrorKind, usize)> {
        let mut map = ParenMap::default();
        let mut stack = Vec::new();
        for (i, &c) in chars.iter().enumerate() {
            match c {
                '(' => stack.push(i),
                ')' => match stack.pop() {
                    Some(open) => {
                        map.open_to_close.insert(open, i);
                        map.close_to_open.insert(i, open);
                    }
                    None => return Err((ErrorKind::ParenthesisNotOpen, i)),
                },
                _ => {}
            }
        }
        if let Some(&unmatched) = stack.first() {
            return Err((ErrorKind::ParenthesisNotClosed, unmatched));
        }
        Ok(map)
    }

    pub fn close_of(&self, open: usize) -> Option<usize> {
        self.open_to_close.get(&open).copied()
    }

    pub fn open_of(&self, close: usize) -> Option<usize> {
        self.close_to_open.get(&close).copied()
    }
}

/// Split the comma-separated argument list spanning `[start, end)` into the
/// `(start, end)` span of each argument, respecting nested parentheses
/// (§4.2 "pre-split its comma-separated arguments"). An empty span yields
/// zero arguments, not one empty argument.
pub fn split_args(chars: &[char], start: usize, end: usize) -> Vec<(usize, usize)> {
    if start >= end {
        return Vec::new();
    }
    let mut spans = Vec::new();
    let mut depth = 0i32;
    let mut arg_start = start;
    let mut i = start;
    while i < end {
        match chars[i] {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                spans.push((arg_start, i));
                arg_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    spans.push((arg_start, end));
    spans
}

/// The components of a scanned numeric literal, base-agnostic. Domain code
/// (`scientific`/`integer`) interprets `mantissa`/`exponent` into the
/// concrete value type.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberScan {
    /// Number of source characters consumed, including any `i` suffix.
    pub len: usize,
    pub base: u32,
    /// Digit text, base-prefix stripped, with `.` preserved for decimal
    /// fractions.
    pub mantissa: String,
    /// Decimal exponent, base 10 only (`e`/`E` literals).
    pub exponent: Option<i32>,
    /// Whether a trailing `i` marked this literal as imaginary.
    pub imaginary: bool,
}

fn digits_for_base(input: &str, base: u32) -> IResult<&str, &str> {
    match base {
        16 => hex_digit1(input),
        8 => oct_digit1(input),
        2 => recognize(many1(one_of("01")))(input),
        _ => digit1(input),
    }
}

/// Scan a numeric literal starting exactly at `s`. No leading sign is
/// consumed here — sign handling belongs to operand binding (§4.6), not the
/// literal scanner. When `allow_imaginary` is false (integer domain) a
/// trailing `i` is never consumed.
pub fn scan_number(s: &str, allow_imaginary: bool) -> Option<NumberScan> {
    let (base, prefix_len, rest) = if let Some(r) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (16, 2, r)
    } else if let Some(r) = s.strip_prefix("0o").or_else(|| s.strip_prefix("0O")) {
        (8, 2, r)
    } else if let Some(r) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        (2, 2, r)
    } else {
        (10, 0, s)
    };

    let (rest, int_part) = digits_for_base(rest, base).ok()?;
    let mut mantissa = int_part.to_string();
    let mut consumed = prefix_len + int_part.len();
    let mut cursor = rest;

    // Optional fractional part — decimal only.
    if base == 10 {
        if let Some(after_dot) = cursor.strip_prefix('.') {
            if let Ok((rest2, frac)) = digit1::<_, nom::error::Error<&str>>(after_dot) {
                mantissa.push('.');
                mantissa.push_str(frac);
                consumed += 1 + frac.len();
                cursor = rest2;
            }
        }
    }

    let mut exponent = None;
    if base == 10 {
        if let Some(after_e) = cursor.strip_prefix('e').or_else(|| cursor.strip_prefix('E')) {
            let (after_sign, neg) = if let Some(r) = after_e.strip_prefix('-') {
                (r, true)
            } else if let Some(r) = after_e.strip_prefix('+') {
                (r, false)
            } else {
                (after_e, false)
            };
            if let Ok((rest3, exp_digits)) = digit1::<_, nom::error::Error<&str>>(after_sign) {
                let mut value: i32 = exp_digits.parse().ok()?;
                if neg {
                    value = -value;
                }
                exponent = Some(value);
                let sign_len = after_e.len() - after_sign.len();
                consumed += 1 + sign_len + exp_digits.len();
                cursor = rest3;
            }
        }
    }

    let mut imaginary = false;
    if allow_imaginary {
        if let Some(_rest4) = cursor.strip_prefix('i') {
            imaginary = true;
            consumed += 1;
        }
    }

    Some(NumberScan {
        len: consumed,
        base,
        mantissa,
        exponent,
        imaginary,
    })
}
