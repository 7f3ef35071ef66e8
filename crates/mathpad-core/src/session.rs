//! The editor session: a single-threaded state machine tying the buffer, the tracked
//! ranges, and the equation history together.
//!
//! # Overview
//!
//! A session is either **Idle** (empty buffer, N committed equations) or **Editing**
//! (non-empty buffer, zero or more tracked ranges). Keystrokes run to completion before
//! the next one is processed; there is no interleaving of edits. Side effects that must
//! observe the post-mutation buffer (cursor placement after a splice, the backslash
//! completion check) are queued as deferred tasks and drained FIFO once the handler's
//! mutation has been applied.
//!
//! The only asynchronous collaborator is the external evaluator. Commits call it
//! synchronously, so results are appended in submission order. Live previews are
//! split-phase instead: [`EditorSession::preview_request`] captures the current epoch
//! alongside the resolved expression, and [`EditorSession::complete_preview`] drops any
//! response whose epoch is no longer current. Nothing is cancelled on the wire; only
//! the local application of a stale response is suppressed.
//!
//! # Example
//!
//! ```rust
//! use mathpad_core::{EditorSession, EvalOutcome, Key};
//!
//! let mut evaluator = |_expr: &str| EvalOutcome::Number(4.0);
//! let mut session = EditorSession::new();
//!
//! for ch in "2+2".chars() {
//!     session.key_input(Key::Char(ch), &mut evaluator);
//! }
//! session.key_input(Key::Enter, &mut evaluator);
//!
//! assert_eq!(session.history().len(), 1);
//! assert_eq!(session.history()[0].text, "2+2");
//! ```

use crate::buffer::InputBuffer;
use crate::eval::{EvalOutcome, Evaluator};
use crate::history::{Equation, EquationResult};
use crate::insert;
use crate::ranges::{RangeKind, RangeSet};
use crate::render::Typesetter;
use crate::resolve;
use std::collections::VecDeque;

/// A keystroke delivered by the host surface.
///
/// Cursor movement and other navigation keys are handled natively by the host, which
/// reports the resulting selection through [`EditorSession::set_selection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character.
    Char(char),
    /// Backspace.
    Backspace,
    /// Submit the current buffer.
    Enter,
}

/// The coarse session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Empty buffer; the next keystroke starts a new expression.
    Idle,
    /// Non-empty buffer being edited.
    Editing,
}

/// A live-preview evaluation request captured at a specific buffer state.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRequest {
    /// The buffer epoch this request was captured at.
    pub epoch: u64,
    /// The fully resolved expression to evaluate.
    pub expression: String,
}

/// Post-mutation continuations, drained FIFO after each handler's splice is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeferredTask {
    SetCursor(usize),
    FracCompletion,
}

/// The owned editing session.
///
/// Owns the buffer, the tracked ranges, and the equation history, with exclusive
/// mutation rights; every component operation receives this state explicitly rather
/// than reaching for it ambiently.
#[derive(Debug, Default)]
pub struct EditorSession {
    buffer: InputBuffer,
    ranges: RangeSet,
    history: Vec<Equation>,
    deferred: VecDeque<DeferredTask>,
    epoch: u64,
    preview: Option<EvalOutcome>,
}

impl EditorSession {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session seeded with committed equations (session restore).
    pub fn with_history(history: Vec<Equation>) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    /// The coarse state: Idle with an empty buffer, Editing otherwise.
    pub fn state(&self) -> SessionState {
        if self.buffer.is_empty() {
            SessionState::Idle
        } else {
            SessionState::Editing
        }
    }

    /// The current buffer text.
    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    /// The current selection in UTF-16 code units.
    pub fn selection(&self) -> (usize, usize) {
        self.buffer.selection()
    }

    /// The collapsed cursor position.
    pub fn cursor(&self) -> usize {
        self.buffer.cursor()
    }

    /// Report a host-side selection change (mouse, arrow keys).
    pub fn set_selection(&mut self, start: usize, end: usize) {
        self.buffer.set_selection(start, end);
    }

    /// The tracked autocomplete ranges.
    pub fn ranges(&self) -> &RangeSet {
        &self.ranges
    }

    /// The committed equation history, oldest first.
    pub fn history(&self) -> &[Equation] {
        &self.history
    }

    /// The most recently applied (non-stale) preview outcome.
    pub fn preview(&self) -> Option<&EvalOutcome> {
        self.preview.as_ref()
    }

    /// The current buffer epoch, bumped on every content change.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Process one keystroke to completion, then drain deferred tasks.
    pub fn key_input(&mut self, key: Key, evaluator: &mut dyn Evaluator) {
        match key {
            Key::Char(ch) => self.handle_char(ch),
            Key::Backspace => self.handle_backspace(),
            Key::Enter => self.submit(evaluator),
        }
        self.drain_deferred();
    }

    fn handle_char(&mut self, ch: char) {
        // An empty buffer treats a leading operator as a continuation of the last
        // answer: `+` becomes `ans+`, and `/` a fraction with `ans` as numerator.
        if self.buffer.is_empty() {
            match ch {
                '+' | '-' | '*' => {
                    self.buffer.replace_range(0, 0, resolve::ANSWER_KEYWORD);
                    self.buffer.set_cursor(3);
                    self.changed();
                }
                '/' => {
                    let target = insert::insert_at_cursor(
                        &mut self.buffer,
                        &mut self.ranges,
                        "\\frac{ans}{}",
                        11,
                        Some(RangeKind::Frac),
                    );
                    self.deferred.push_back(DeferredTask::SetCursor(target));
                    self.changed();
                    return;
                }
                _ => {}
            }
        }

        if let Some(target) = insert::apply_trigger(&mut self.buffer, &mut self.ranges, ch) {
            self.deferred.push_back(DeferredTask::SetCursor(target));
            self.changed();
            return;
        }

        self.insert_literal(ch);
        // The fraction-command completion check must observe the buffer after the
        // keystroke has landed, so it runs from the deferred queue once the splice is
        // applied. It fires only when the characters left of the cursor spell out the
        // complete command name.
        self.deferred.push_back(DeferredTask::FracCompletion);
    }

    fn insert_literal(&mut self, ch: char) {
        let (sel_start, sel_end) = self.buffer.selection();
        if sel_end > sel_start {
            self.buffer.replace_range(sel_start, sel_end, "");
            self.ranges.delete_span(sel_start, sel_end);
        }

        let mut encoded = [0u8; 4];
        let len = self
            .buffer
            .replace_range(sel_start, sel_start, ch.encode_utf8(&mut encoded));
        self.ranges.shift(sel_start, len as isize);
        self.buffer.set_cursor(sel_start + len);
        self.changed();
    }

    fn handle_backspace(&mut self) {
        let (sel_start, sel_end) = self.buffer.selection();

        if sel_end > sel_start {
            self.buffer.replace_range(sel_start, sel_end, "");
            self.ranges.delete_span(sel_start, sel_end);
            self.buffer.set_cursor(sel_start);
            self.changed();
            return;
        }

        if let Some(target) = insert::atomic_backspace(&mut self.buffer, &mut self.ranges) {
            self.deferred.push_back(DeferredTask::SetCursor(target));
            self.changed();
            return;
        }

        if self.buffer.is_empty() {
            self.recall_last();
            return;
        }

        if let Some(ch) = self.buffer.char_before_cursor() {
            let len = ch.len_utf16();
            let cursor = self.buffer.cursor();
            self.buffer.replace_range(cursor - len, cursor, "");
            self.ranges.delete_span(cursor - len, cursor);
            self.buffer.set_cursor(cursor - len);
            self.changed();
        }
    }

    /// Pop the most recent equation back into the buffer for editing.
    ///
    /// Restores the raw, pre-substitution text, truncating history (and its
    /// index-correlated results) by one. Ranges from the previous buffer are invalid
    /// for the restored text and are cleared.
    fn recall_last(&mut self) {
        let Some(last) = self.history.pop() else {
            return;
        };
        self.buffer.set_text(last.text);
        self.ranges.clear();
        self.changed();
    }

    /// Load a history entry into the buffer without truncating history.
    ///
    /// Returns `false` if `index` is out of bounds. This is an external buffer
    /// mutation, so all tracked ranges are cleared.
    pub fn load_equation(&mut self, index: usize) -> bool {
        let Some(eq) = self.history.get(index) else {
            return false;
        };
        self.buffer.set_text(eq.text.clone());
        self.ranges.clear();
        self.changed();
        true
    }

    /// Commit the current buffer: resolve, evaluate, append to history, reset.
    ///
    /// A buffer that is exactly `identifier = numeric-literal` is recorded with an
    /// empty placeholder result instead of being evaluated. Evaluation is synchronous,
    /// so a new commit cannot start before the prior result was appended and history
    /// order always matches submission order.
    fn submit(&mut self, evaluator: &mut dyn Evaluator) {
        let trimmed = self.buffer.text().trim().to_string();
        if trimmed.is_empty() {
            return;
        }

        let result = if resolve::is_literal_assignment(&trimmed) {
            EquationResult::Empty
        } else {
            let resolved = resolve::resolve(&trimmed, &self.history);
            evaluator.evaluate(&resolved).into()
        };

        self.history.push(Equation::new(trimmed, result));
        self.buffer.set_text("");
        self.ranges.clear();
        self.changed();
    }

    /// Capture a live-preview request for the current buffer.
    ///
    /// The expression is fully resolved against the history; the epoch identifies the
    /// buffer state the request was computed from.
    pub fn preview_request(&self) -> PreviewRequest {
        PreviewRequest {
            epoch: self.epoch,
            expression: resolve::resolve(self.buffer.text(), &self.history),
        }
    }

    /// Apply a preview response if it is still current.
    ///
    /// Returns `false` (and discards the outcome) when the buffer has changed since
    /// the request was captured.
    pub fn complete_preview(&mut self, epoch: u64, outcome: EvalOutcome) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.preview = Some(outcome);
        true
    }

    /// Typeset the raw text of every history entry.
    pub fn typeset_history(&self, typesetter: &dyn Typesetter) -> Vec<String> {
        self.history
            .iter()
            .map(|eq| typesetter.typeset(&eq.text))
            .collect()
    }

    /// Typeset the raw buffer text.
    pub fn typeset_buffer(&self, typesetter: &dyn Typesetter) -> String {
        typesetter.typeset(self.buffer.text())
    }

    fn changed(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    fn drain_deferred(&mut self) {
        while let Some(task) = self.deferred.pop_front() {
            match task {
                DeferredTask::SetCursor(position) => self.buffer.set_cursor(position),
                DeferredTask::FracCompletion => {
                    if let Some(target) =
                        insert::complete_frac_braces(&mut self.buffer, &mut self.ranges)
                    {
                        self.buffer.set_cursor(target);
                        self.changed();
                    }
                }
            }
        }
    }
}
