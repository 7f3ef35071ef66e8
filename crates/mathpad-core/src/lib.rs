#![warn(missing_docs)]
//! Mathpad Core - Headless Math Input Engine
//!
//! # Overview
//!
//! `mathpad-core` is the editing engine behind an interactive math notation pad. It owns a
//! single-line expression buffer, auto-inserts paired and structural syntax (parentheses,
//! braces, exponent/subscript scaffolding, fraction templates), tracks which spans were
//! machine-inserted so one backspace can undo them atomically, and resolves variables and
//! the "last answer" token before an expression is handed to an external evaluator.
//!
//! It does not typeset, evaluate, or persist anything itself: typesetting and evaluation
//! are collaborator seams ([`Typesetter`], [`Evaluator`]), and the equation history lives
//! in process memory for the session.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  EditorSession (state machine & dispatch)   │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Smart Insertion (triggers, fractions)      │  ← Keystroke interpretation
//! ├─────────────────────────────────────────────┤
//! │  Resolution (answer token + variables)      │  ← Substitution engine
//! ├─────────────────────────────────────────────┤
//! │  Range Tracking (autocompleted spans)       │  ← Atomic undo bookkeeping
//! ├─────────────────────────────────────────────┤
//! │  Input Buffer (text + UTF-16 selection)     │  ← Host surface contract
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use mathpad_core::{EditorSession, EvalOutcome, Key};
//!
//! // Any `FnMut(&str) -> EvalOutcome` works as an evaluator.
//! let mut evaluator = |expr: &str| match expr {
//!     "2+2" => EvalOutcome::Number(4.0),
//!     _ => EvalOutcome::Error,
//! };
//!
//! let mut session = EditorSession::new();
//! for ch in "2+2".chars() {
//!     session.key_input(Key::Char(ch), &mut evaluator);
//! }
//! session.key_input(Key::Enter, &mut evaluator);
//!
//! assert_eq!(session.history()[0].text, "2+2");
//!
//! // The next expression can continue from the answer:
//! session.key_input(Key::Char('+'), &mut evaluator);
//! assert_eq!(session.text(), "ans+");
//! assert_eq!(session.preview_request().expression, "4+");
//! ```
//!
//! # Module Description
//!
//! - [`session`] - The editor session state machine and keystroke dispatch
//! - [`insert`] - Trigger handling, the smart-fraction rule, atomic scaffold deletion
//! - [`resolve`] - Answer-token and variable substitution
//! - [`ranges`] - Autocomplete range tracking under buffer edits
//! - [`buffer`] - The host text-input surface (text + UTF-16 selection)
//! - [`history`] - Committed equations and their results
//! - [`eval`] - The external-evaluator seam
//! - [`render`] - The typesetting seam
//!
//! # Offsets
//!
//! All public offsets are UTF-16 code units, matching the selection addressing of host
//! text inputs. Conversions to and from the internal UTF-8 storage are handled inside the
//! buffer layer.

pub mod buffer;
pub mod eval;
pub mod history;
pub mod insert;
pub mod ranges;
pub mod render;
pub mod resolve;
pub mod session;
mod text;

pub use buffer::InputBuffer;
pub use eval::{EvalOutcome, Evaluator};
pub use history::{Equation, EquationResult};
pub use ranges::{RangeKind, RangeSet, TrackedRange};
pub use render::{PlainText, Typesetter};
pub use resolve::ANSWER_KEYWORD;
pub use session::{EditorSession, Key, PreviewRequest, SessionState};
