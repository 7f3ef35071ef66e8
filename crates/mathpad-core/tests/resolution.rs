use mathpad_core::{Equation, EquationResult, resolve};
use pretty_assertions::assert_eq;

fn entry(text: &str, result: EquationResult) -> Equation {
    Equation::new(text, result)
}

#[test]
fn test_answer_is_most_recent_numeric_result() {
    let history = vec![
        entry("2+3", EquationResult::Number(5.0)),
        entry("1/0", EquationResult::Text("Error".to_string())),
        entry("1+2", EquationResult::Number(3.0)),
    ];
    assert_eq!(resolve::resolve("ans+1", &history), "3+1");
}

#[test]
fn test_answer_skips_unparsable_text_results() {
    let history = vec![
        entry("2+3", EquationResult::Number(5.0)),
        entry("x", EquationResult::Text("undefined variable".to_string())),
    ];
    assert_eq!(resolve::resolve("ans*2", &history), "5*2");
}

#[test]
fn test_answer_accepts_numeric_text_results() {
    let history = vec![entry("6/2", EquationResult::Text("3".to_string()))];
    assert_eq!(resolve::resolve("ans", &history), "3");
}

#[test]
fn test_answer_defaults_to_zero() {
    assert_eq!(resolve::resolve("ans+ans", &[]), "0+0");

    let history = vec![entry("a=1", EquationResult::Empty)];
    assert_eq!(resolve::resolve("ans", &history), "0");
}

#[test]
fn test_answer_matching_is_whole_token_and_case_insensitive() {
    let history = vec![entry("1+1", EquationResult::Number(2.0))];
    assert_eq!(resolve::resolve("ANS+Ans", &history), "2+2");
    // Identifier-boundary matching, not substring matching.
    assert_eq!(resolve::resolve("answer+ans_1+hans", &history), "answer+ans_1+hans");
}

#[test]
fn test_variable_chain_resolves_transitively() {
    let history = vec![
        entry("a=2", EquationResult::Empty),
        entry("b=a+1", EquationResult::Number(3.0)),
    ];
    assert_eq!(resolve::resolve("b*2", &history), "2+1*2");
}

#[test]
fn test_later_assignment_overwrites_earlier() {
    let history = vec![
        entry("a=1", EquationResult::Empty),
        entry("a=9", EquationResult::Empty),
    ];
    assert_eq!(resolve::resolve("a", &history), "9");
}

#[test]
fn test_circular_bindings_stop_at_pass_cap() {
    let history = vec![
        entry("a=b+1", EquationResult::Text("Error".to_string())),
        entry("b=a+1", EquationResult::Text("Error".to_string())),
    ];
    // Not an error: resolution stops after the cap with identifiers remaining.
    let resolved = resolve::resolve("a", &history);
    assert!(resolved.contains("+1"));
    assert!(resolved.contains('a') || resolved.contains('b'));
}

#[test]
fn test_answer_keyword_is_never_bound() {
    let history = vec![
        // `ans=7` is not an assignment, so commit evaluated it (and failed).
        entry("ans=7", EquationResult::Text("Error".to_string())),
        entry("1+1", EquationResult::Number(2.0)),
    ];
    // `ans` resolves from results, not from the superficial assignment.
    assert_eq!(resolve::resolve("ans", &history), "2");
    assert!(resolve::assignment_map(&history).is_empty());
}

#[test]
fn test_assignment_and_answer_compose() {
    let history = vec![
        entry("a=2", EquationResult::Empty),
        entry("a+1", EquationResult::Number(3.0)),
    ];
    assert_eq!(resolve::resolve("ans+a", &history), "3+2");
}
