//! Variable and answer resolution.
//!
//! Before an expression is handed to the evaluator, two substitution passes run over it:
//! the answer keyword is replaced with the most recent numeric result, and identifiers
//! bound by assignment statements in the history are replaced with their bound text.
//! Both passes are pure functions of `(text, history)` and are invoked on every
//! keystroke (live preview) as well as at commit time.
//!
//! Token matching deliberately avoids regex replacement: occurrences are located by an
//! explicit scan that checks the neighboring characters for identifier boundaries, so the
//! matching semantics are exactly "not adjacent to a letter, digit, or underscore".

use crate::history::Equation;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// The reserved token referring to the most recent numeric result (case-insensitive).
pub const ANSWER_KEYWORD: &str = "ans";

/// Substitution passes stop after this many full re-scans, so circular bindings
/// terminate instead of looping. A cycle is not an error: whatever textual form remains
/// is sent onward.
const MAX_SUBSTITUTION_PASSES: usize = 10;

fn assignment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z][A-Za-z0-9_]*)\s*=\s*(\S.*?)\s*$")
            .expect("assignment pattern compiles")
    })
}

fn numeric_literal_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?[0-9]+(?:\.[0-9]+)?$").expect("numeric literal pattern compiles")
    })
}

fn is_word_char(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

/// Parse `identifier = expression`, returning the identifier and the bound text.
///
/// The answer keyword is never a valid assignable identifier, even when the text
/// superficially matches the pattern.
pub fn parse_assignment(text: &str) -> Option<(&str, &str)> {
    let caps = assignment_regex().captures(text)?;
    let ident = caps.get(1)?.as_str();
    if ident.eq_ignore_ascii_case(ANSWER_KEYWORD) {
        return None;
    }
    Some((ident, caps.get(2)?.as_str()))
}

/// Returns `true` if `text` is exactly `identifier = numeric-literal`.
///
/// Only this bare form short-circuits evaluation at commit time (the assignment is
/// recorded with an empty result); assignments to larger expressions are still sent to
/// the evaluator after resolution.
pub fn is_literal_assignment(text: &str) -> bool {
    parse_assignment(text).is_some_and(|(_, value)| numeric_literal_regex().is_match(value))
}

/// The most recent numeric result in `history`, scanning backward and skipping
/// non-numeric or unparsable results. Defaults to `0` when none exists.
pub fn latest_answer(history: &[Equation]) -> f64 {
    history
        .iter()
        .rev()
        .find_map(|eq| eq.result.as_number())
        .unwrap_or(0.0)
}

/// Fold history assignments into an identifier → bound-text map.
///
/// Later entries overwrite earlier bindings for the same identifier. The map is
/// recomputed from the full history on every resolution pass; there is no cache to
/// invalidate.
pub fn assignment_map(history: &[Equation]) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for eq in history {
        if let Some((ident, value)) = parse_assignment(&eq.text) {
            map.insert(ident.to_string(), value.to_string());
        }
    }
    map
}

/// Replace every whole-token occurrence of `token` in `text` with `replacement`.
///
/// A token boundary is a neighbor that is not a letter, digit, or underscore.
fn replace_whole_token(
    text: &str,
    token: &str,
    replacement: &str,
    ignore_ascii_case: bool,
) -> String {
    if token.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    let mut rest = text;

    while !rest.is_empty() {
        let head = rest.get(..token.len());
        let matched = head.is_some_and(|head| {
            if ignore_ascii_case {
                head.eq_ignore_ascii_case(token)
            } else {
                head == token
            }
        });

        if matched && !prev.is_some_and(is_word_char) {
            let after = rest[token.len()..].chars().next();
            if !after.is_some_and(is_word_char) {
                out.push_str(replacement);
                rest = &rest[token.len()..];
                prev = replacement.chars().next_back().or(prev);
                continue;
            }
        }

        let Some(ch) = rest.chars().next() else {
            break;
        };
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
        prev = Some(ch);
    }

    out
}

/// Decimal text of an answer value (`f64` display prints integral values without a
/// fractional part).
fn number_text(value: f64) -> String {
    value.to_string()
}

/// Fully resolve `text` against `history`: substitute the answer keyword, then
/// iteratively substitute bound identifiers until the text settles or the pass cap is
/// reached.
pub fn resolve(text: &str, history: &[Equation]) -> String {
    let answer = number_text(latest_answer(history));
    let mut resolved = replace_whole_token(text, ANSWER_KEYWORD, &answer, true);

    let bindings = assignment_map(history);
    if bindings.is_empty() {
        return resolved;
    }

    for _ in 0..MAX_SUBSTITUTION_PASSES {
        let mut changed = false;
        for (ident, value) in &bindings {
            let next = replace_whole_token(&resolved, ident, value, false);
            if next != resolved {
                resolved = next;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::EquationResult;

    fn entry(text: &str, result: EquationResult) -> Equation {
        Equation::new(text, result)
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("a = 5"), Some(("a", "5")));
        assert_eq!(parse_assignment("  x2 =-3.5 "), Some(("x2", "-3.5")));
        assert_eq!(parse_assignment("b = a+1"), Some(("b", "a+1")));
        assert_eq!(parse_assignment("x^{2} = 4"), None);
        assert_eq!(parse_assignment("= 5"), None);
        assert_eq!(parse_assignment("a ="), None);
        // The answer keyword is never assignable, whatever the case.
        assert_eq!(parse_assignment("ans = 5"), None);
        assert_eq!(parse_assignment("Ans = 5"), None);
    }

    #[test]
    fn test_is_literal_assignment() {
        assert!(is_literal_assignment("a = 5"));
        assert!(is_literal_assignment("a = -0.25"));
        assert!(!is_literal_assignment("a = b"));
        assert!(!is_literal_assignment("a = 1+1"));
        assert!(!is_literal_assignment("a + 5"));
    }

    #[test]
    fn test_latest_answer_skips_non_numeric() {
        let history = vec![
            entry("2+3", EquationResult::Number(5.0)),
            entry("1/0", EquationResult::error()),
            entry("1+2", EquationResult::Text("3".to_string())),
        ];
        assert_eq!(latest_answer(&history), 3.0);
        assert_eq!(latest_answer(&[]), 0.0);
    }

    #[test]
    fn test_resolve_answer_keyword() {
        let history = vec![
            entry("2+3", EquationResult::Number(5.0)),
            entry("oops", EquationResult::error()),
            entry("1+2", EquationResult::Number(3.0)),
        ];
        assert_eq!(resolve("ans+1", &history), "3+1");
        // Case-insensitive, whole-token only.
        assert_eq!(resolve("ANS+ans", &history), "3+3");
        assert_eq!(resolve("answer", &history), "answer");
        assert_eq!(resolve("hans", &history), "hans");
    }

    #[test]
    fn test_resolve_defaults_answer_to_zero() {
        assert_eq!(resolve("ans*2", &[]), "0*2");
    }

    #[test]
    fn test_resolve_variable_chain() {
        let history = vec![
            entry("a=2", EquationResult::Empty),
            entry("b=a+1", EquationResult::Number(3.0)),
        ];
        assert_eq!(resolve("b*2", &history), "2+1*2");
    }

    #[test]
    fn test_resolve_later_binding_wins() {
        let history = vec![
            entry("a=2", EquationResult::Empty),
            entry("a=7", EquationResult::Empty),
        ];
        assert_eq!(resolve("a+a", &history), "7+7");
    }

    #[test]
    fn test_resolve_identifiers_are_case_sensitive() {
        let history = vec![entry("a=2", EquationResult::Empty)];
        assert_eq!(resolve("A+a", &history), "A+2");
    }

    #[test]
    fn test_resolve_circular_bindings_terminate() {
        let history = vec![
            entry("a=b", EquationResult::error()),
            entry("b=a", EquationResult::error()),
        ];
        // Ten passes leave one of the identifiers in place; no panic, no hang.
        let resolved = resolve("a", &history);
        assert!(resolved == "a" || resolved == "b");
    }

    #[test]
    fn test_resolve_does_not_touch_substrings() {
        let history = vec![entry("a=2", EquationResult::Empty)];
        assert_eq!(resolve("ab+a_1+a", &history), "ab+a_1+2");
    }
}
