//! Session walkthrough example
//!
//! Drives an `EditorSession` through a typical editing exchange with a canned
//! evaluator: smart insertion, commit, answer continuation, and recall.

use mathpad_core::{EditorSession, EvalOutcome, Key, PlainText};

fn main() {
    // A stand-in for the external evaluator service.
    let mut evaluator = |expr: &str| match expr {
        "2+2" => EvalOutcome::Number(4.0),
        "4\\cdot3" => EvalOutcome::Number(12.0),
        _ => EvalOutcome::Error,
    };

    let mut session = EditorSession::new();

    println!("=== Editor session walkthrough ===\n");

    println!("1. Typing \"2+2\":");
    for ch in "2+2".chars() {
        session.key_input(Key::Char(ch), &mut evaluator);
    }
    println!("  buffer: {:?}, cursor: {}", session.text(), session.cursor());

    println!("\n2. Committing with Enter:");
    session.key_input(Key::Enter, &mut evaluator);
    for eq in session.history() {
        println!("  {} => {:?}", eq.text, eq.result);
    }

    println!("\n3. A leading `*` continues from the last answer:");
    session.key_input(Key::Char('*'), &mut evaluator);
    session.key_input(Key::Char('3'), &mut evaluator);
    println!("  buffer: {:?}", session.text());

    let request = session.preview_request();
    println!("  preview expression: {:?}", request.expression);
    let outcome = evaluator(&request.expression);
    session.complete_preview(request.epoch, outcome);
    println!("  preview value: {:?}", session.preview());

    println!("\n4. Smart insertion tracks its scaffolding:");
    session.key_input(Key::Enter, &mut evaluator);
    session.key_input(Key::Char('x'), &mut evaluator);
    session.key_input(Key::Char('^'), &mut evaluator);
    session.key_input(Key::Char('2'), &mut evaluator);
    println!("  buffer: {:?}", session.text());
    println!("  tracked ranges: {:?}", session.ranges().ranges());

    println!("\n5. One backspace undoes the whole exponent scaffold:");
    session.set_selection(5, 5);
    session.key_input(Key::Backspace, &mut evaluator);
    println!("  buffer: {:?}", session.text());

    println!("\n6. Backspacing an empty buffer recalls the last equation:");
    session.key_input(Key::Backspace, &mut evaluator);
    session.key_input(Key::Backspace, &mut evaluator);
    println!("  buffer: {:?}", session.text());

    println!("\n7. History as seen by a typesetting collaborator:");
    for line in session.typeset_history(&PlainText) {
        println!("  {line}");
    }
}
