//! Smart insertion: trigger handling, the context-sensitive fraction rule, and atomic
//! scaffold deletion.
//!
//! Each operation takes the buffer and range set explicitly and returns the cursor
//! target for the host to apply as a post-mutation step (the session defers cursor
//! placement until after the splice is observable, mirroring how a text-input host only
//! accepts a selection once the new value has rendered).

use crate::buffer::InputBuffer;
use crate::ranges::{RangeKind, RangeSet};
use crate::text;

/// The multiplication token spliced in for `*`.
pub const TIMES_TOKEN: &str = "\\cdot";

/// The command name the deferred backslash check completes with brace pairs.
const FRAC_COMMAND: &str = "\\frac";

/// Characters that bound a movable operand run for the smart-fraction rule.
fn is_operand_delimiter(ch: char) -> bool {
    matches!(
        ch,
        '+' | '-' | '*' | '/' | '^' | '_' | '(' | ')' | '{' | '}' | '=' | ',' | ' '
    )
}

/// Splice `inserted` over the active selection, rebase tracked ranges, and optionally
/// register the new span. Returns the cursor target, `cursor_offset` code units past
/// the insertion point.
pub fn insert_at_cursor(
    buffer: &mut InputBuffer,
    ranges: &mut RangeSet,
    inserted: &str,
    cursor_offset: usize,
    kind: Option<RangeKind>,
) -> usize {
    let (sel_start, sel_end) = buffer.selection();
    if sel_end > sel_start {
        buffer.replace_range(sel_start, sel_end, "");
        ranges.delete_span(sel_start, sel_end);
    }

    let len = buffer.replace_range(sel_start, sel_start, inserted);
    ranges.shift(sel_start, len as isize);
    if let Some(kind) = kind {
        ranges.register(sel_start, sel_start + len, kind);
    }

    sel_start + cursor_offset
}

/// Apply a trigger keystroke. Returns the cursor target, or `None` if `ch` is not a
/// trigger and should be inserted verbatim by the caller.
pub fn apply_trigger(buffer: &mut InputBuffer, ranges: &mut RangeSet, ch: char) -> Option<usize> {
    let target = match ch {
        '(' => insert_at_cursor(buffer, ranges, "()", 1, Some(RangeKind::Paren)),
        '{' => insert_at_cursor(buffer, ranges, "{}", 1, Some(RangeKind::Brace)),
        '^' => insert_at_cursor(buffer, ranges, "^{}", 2, Some(RangeKind::Sup)),
        '_' => insert_at_cursor(buffer, ranges, "_{}", 2, Some(RangeKind::Sub)),
        '*' => insert_at_cursor(
            buffer,
            ranges,
            TIMES_TOKEN,
            text::utf16_len(TIMES_TOKEN),
            Some(RangeKind::Times),
        ),
        '/' => smart_fraction(buffer, ranges),
        _ => return None,
    };
    Some(target)
}

/// Start offset of the maximal movable operand run ending at `cursor`.
///
/// The run stops at operand delimiters and never crosses an escape-sequence boundary: a
/// run glued to a `\` is the tail of a command name, not a movable operand, and yields
/// an empty run.
fn operand_run_start(buffer: &InputBuffer, cursor: usize) -> usize {
    let mut start = cursor;
    loop {
        let Some(ch) = text::char_before(buffer.text(), start) else {
            break;
        };
        if is_operand_delimiter(ch) {
            break;
        }
        if ch == '\\' {
            return cursor;
        }
        start -= ch.len_utf16();
    }
    if text::char_before(buffer.text(), start) == Some('\\') {
        return cursor;
    }
    start
}

/// The smart-fraction rule for `/`.
///
/// The maximal movable operand run left of the cursor is excised and re-spliced as the
/// numerator of a fresh `\frac{..}{}`, with the cursor placed just before the closing
/// brace of the empty denominator. Tracked ranges the run overlaps are rebased, not
/// destroyed. With no eligible run, falls back to an empty `\frac{}{}` template with
/// the cursor inside the numerator.
pub fn smart_fraction(buffer: &mut InputBuffer, ranges: &mut RangeSet) -> usize {
    let (sel_start, sel_end) = buffer.selection();
    if sel_end > sel_start {
        buffer.replace_range(sel_start, sel_end, "");
        ranges.delete_span(sel_start, sel_end);
        buffer.set_cursor(sel_start);
    }

    let cursor = sel_start;
    let run_start = operand_run_start(buffer, cursor);
    if run_start == cursor {
        return insert_at_cursor(buffer, ranges, "\\frac{}{}", 6, Some(RangeKind::Frac));
    }

    let run = buffer.slice(run_start, cursor).to_string();
    let frac = format!("\\frac{{{run}}}{{}}");
    let frac_len = text::utf16_len(&frac);
    let run_len = cursor - run_start;

    buffer.replace_range(run_start, cursor, &frac);
    ranges.shift(run_start, frac_len as isize - run_len as isize);
    ranges.register(run_start, run_start + frac_len, RangeKind::Frac);

    // Just before the closing brace of the denominator.
    run_start + frac_len - 1
}

/// The deferred command-completion check: once a typed `\frac` has fully landed left
/// of the cursor, splice in its two empty brace pairs, cursor inside the first pair.
///
/// This reads the buffer state after the keystroke was applied; it is a post-condition
/// check, not a pre-insertion decision. Only the fraction command is completed.
pub fn complete_frac_braces(buffer: &mut InputBuffer, ranges: &mut RangeSet) -> Option<usize> {
    let cursor = buffer.cursor();
    let command_len = text::utf16_len(FRAC_COMMAND);
    if cursor < command_len || buffer.slice(cursor - command_len, cursor) != FRAC_COMMAND {
        return None;
    }
    Some(insert_at_cursor(
        buffer,
        ranges,
        "{}{}",
        1,
        Some(RangeKind::FracBraces),
    ))
}

/// Atomic scaffold deletion: when the cursor sits exactly at the end of a tracked
/// range, delete the whole span in one splice and rebase the remaining ranges.
///
/// Returns the cursor target (the deleted range's start), or `None` when there is an
/// active selection or no range ends at the cursor, in which case backspace falls
/// through to its default behavior.
pub fn atomic_backspace(buffer: &mut InputBuffer, ranges: &mut RangeSet) -> Option<usize> {
    let (sel_start, sel_end) = buffer.selection();
    if sel_start != sel_end {
        return None;
    }
    let found = ranges.find_closing(sel_start)?;
    buffer.replace_range(found.start, found.end, "");
    ranges.remove(found);
    Some(found.start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranges::TrackedRange;

    fn editing(text: &str, cursor: usize) -> (InputBuffer, RangeSet) {
        let mut buffer = InputBuffer::from_text(text);
        buffer.set_cursor(cursor);
        (buffer, RangeSet::new())
    }

    #[test]
    fn test_paren_trigger() {
        let (mut buffer, mut ranges) = editing("", 0);
        let cursor = apply_trigger(&mut buffer, &mut ranges, '(');
        assert_eq!(buffer.text(), "()");
        assert_eq!(cursor, Some(1));
        assert_eq!(ranges.ranges(), &[TrackedRange::new(0, 2, RangeKind::Paren)]);
    }

    #[test]
    fn test_sup_trigger_mid_buffer() {
        let (mut buffer, mut ranges) = editing("x", 1);
        let cursor = apply_trigger(&mut buffer, &mut ranges, '^');
        assert_eq!(buffer.text(), "x^{}");
        assert_eq!(cursor, Some(3));
        assert_eq!(ranges.ranges(), &[TrackedRange::new(1, 4, RangeKind::Sup)]);
    }

    #[test]
    fn test_times_trigger_places_cursor_after_token() {
        let (mut buffer, mut ranges) = editing("2", 1);
        let cursor = apply_trigger(&mut buffer, &mut ranges, '*');
        assert_eq!(buffer.text(), "2\\cdot");
        assert_eq!(cursor, Some(6));
        assert_eq!(ranges.ranges(), &[TrackedRange::new(1, 6, RangeKind::Times)]);
    }

    #[test]
    fn test_trigger_replaces_selection() {
        let (mut buffer, mut ranges) = editing("abc", 0);
        buffer.set_selection(1, 3);
        let cursor = apply_trigger(&mut buffer, &mut ranges, '{');
        assert_eq!(buffer.text(), "a{}");
        assert_eq!(cursor, Some(2));
    }

    #[test]
    fn test_non_trigger_returns_none() {
        let (mut buffer, mut ranges) = editing("", 0);
        assert_eq!(apply_trigger(&mut buffer, &mut ranges, 'x'), None);
        assert_eq!(buffer.text(), "");
    }

    #[test]
    fn test_smart_fraction_pulls_trailing_run() {
        let (mut buffer, mut ranges) = editing("12", 2);
        let cursor = smart_fraction(&mut buffer, &mut ranges);
        assert_eq!(buffer.text(), "\\frac{12}{}");
        // Just before the denominator's closing brace.
        assert_eq!(cursor, 10);
        assert_eq!(ranges.ranges(), &[TrackedRange::new(0, 11, RangeKind::Frac)]);
    }

    #[test]
    fn test_smart_fraction_run_bounded_by_operator() {
        let (mut buffer, mut ranges) = editing("1+2", 3);
        let cursor = smart_fraction(&mut buffer, &mut ranges);
        assert_eq!(buffer.text(), "1+\\frac{2}{}");
        assert_eq!(cursor, 11);
        assert_eq!(ranges.ranges(), &[TrackedRange::new(2, 12, RangeKind::Frac)]);
    }

    #[test]
    fn test_smart_fraction_falls_back_on_empty_run() {
        let (mut buffer, mut ranges) = editing("x^{2}", 5);
        let cursor = smart_fraction(&mut buffer, &mut ranges);
        assert_eq!(buffer.text(), "x^{2}\\frac{}{}");
        // Inside the numerator braces.
        assert_eq!(cursor, 11);
    }

    #[test]
    fn test_smart_fraction_does_not_tear_commands() {
        let (mut buffer, mut ranges) = editing("\\cdot", 5);
        let cursor = smart_fraction(&mut buffer, &mut ranges);
        assert_eq!(buffer.text(), "\\cdot\\frac{}{}");
        assert_eq!(cursor, 11);
    }

    #[test]
    fn test_smart_fraction_rebases_overlapped_range() {
        let (mut buffer, mut ranges) = editing("12", 2);
        // Pretend the "2" was machine-inserted.
        ranges.register(1, 2, RangeKind::Command);
        smart_fraction(&mut buffer, &mut ranges);
        // The old range was shifted (start >= run start moves by the length delta),
        // not destroyed.
        assert_eq!(ranges.len(), 2);
    }

    #[test]
    fn test_complete_frac_braces_after_command() {
        let (mut buffer, mut ranges) = editing("\\frac", 5);
        let cursor = complete_frac_braces(&mut buffer, &mut ranges);
        assert_eq!(buffer.text(), "\\frac{}{}");
        assert_eq!(cursor, Some(6));
        assert_eq!(
            ranges.ranges(),
            &[TrackedRange::new(5, 9, RangeKind::FracBraces)]
        );
    }

    #[test]
    fn test_complete_frac_braces_requires_command() {
        let (mut buffer, mut ranges) = editing("\\franc", 6);
        assert_eq!(complete_frac_braces(&mut buffer, &mut ranges), None);
        let (mut buffer, mut ranges) = editing("\\fr", 3);
        assert_eq!(complete_frac_braces(&mut buffer, &mut ranges), None);
    }

    #[test]
    fn test_atomic_backspace_deletes_whole_range() {
        let (mut buffer, mut ranges) = editing("x^{2}", 5);
        ranges.register(1, 5, RangeKind::Sup);
        let cursor = atomic_backspace(&mut buffer, &mut ranges);
        assert_eq!(buffer.text(), "x");
        assert_eq!(cursor, Some(1));
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_atomic_backspace_ignores_selection_and_misses() {
        let (mut buffer, mut ranges) = editing("x^{2}", 5);
        ranges.register(1, 5, RangeKind::Sup);

        buffer.set_selection(0, 2);
        assert_eq!(atomic_backspace(&mut buffer, &mut ranges), None);

        buffer.set_cursor(3);
        assert_eq!(atomic_backspace(&mut buffer, &mut ranges), None);
        assert_eq!(buffer.text(), "x^{2}");
    }
}
