//! Autocomplete range tracking.
//!
//! Every piece of scaffolding the insertion engine splices into the buffer (paired
//! delimiters, exponent/subscript braces, fraction templates) is recorded as a
//! [`TrackedRange`] so a single backspace at its right edge can undo it atomically.
//! The set is kept consistent under arbitrary buffer edits expressed as
//! `(position, inserted length, deleted length)`.
//!
//! All offsets are UTF-16 code units, matching the host text-input's selection
//! addressing.

/// The kind of scaffolding a tracked range was created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    /// A `()` pair.
    Paren,
    /// A `{}` pair.
    Brace,
    /// An exponent template `^{}`.
    Sup,
    /// A subscript template `_{}`.
    Sub,
    /// A fraction template `\frac{..}{}`.
    Frac,
    /// The `{}{}` brace pairs completed after a typed `\frac`.
    FracBraces,
    /// The multiplication token.
    Times,
    /// Any other machine-inserted identifier or command text.
    Command,
}

/// One machine-inserted contiguous span in the current buffer.
///
/// Invariants: `start <= end`, both bounds within `[0, len(buffer)]`, and ranges in a
/// [`RangeSet`] never overlap. A range is created atomically with the splice that produced
/// its text and destroyed by an atomic backspace at its right boundary, by commit, or by a
/// history load (which clears the whole set).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedRange {
    /// Start offset (UTF-16 code units, inclusive).
    pub start: usize,
    /// End offset (UTF-16 code units, exclusive).
    pub end: usize,
    /// What the span was inserted for.
    pub kind: RangeKind,
}

impl TrackedRange {
    /// Create a new tracked range.
    pub fn new(start: usize, end: usize, kind: RangeKind) -> Self {
        Self { start, end, kind }
    }

    /// Length of the span in UTF-16 code units.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the span is empty.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// The set of autocompleted spans over the current buffer, sorted by start offset.
#[derive(Debug, Clone, Default)]
pub struct RangeSet {
    ranges: Vec<TrackedRange>,
}

impl RangeSet {
    /// Create an empty range set.
    pub fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Rebase every range for an edit at `from` that changed the buffer length by `delta`.
    ///
    /// An edit at or before a range's start shifts the whole range; an edit inside a range
    /// (including exactly at its end) extends it; an edit strictly after a range leaves it
    /// untouched. Callers apply this after every splice, before registering any new range.
    pub fn shift(&mut self, from: usize, delta: isize) {
        if delta == 0 {
            return;
        }
        let apply = |offset: usize| {
            if delta >= 0 {
                offset + delta as usize
            } else {
                offset.saturating_sub(delta.unsigned_abs())
            }
        };
        for range in &mut self.ranges {
            if range.start >= from {
                range.start = apply(range.start);
                range.end = apply(range.end);
            } else if range.end >= from {
                range.end = apply(range.end);
            }
        }
    }

    /// Record a freshly inserted machine span.
    ///
    /// The caller guarantees the span does not overlap an existing range: only
    /// machine-generated text is registered, and it is spliced into previously unselected,
    /// newly created buffer positions.
    pub fn register(&mut self, start: usize, end: usize, kind: RangeKind) {
        let range = TrackedRange::new(start, end, kind);
        let pos = self
            .ranges
            .binary_search_by_key(&range.start, |r| r.start)
            .unwrap_or_else(|pos| pos);
        self.ranges.insert(pos, range);
    }

    /// The range whose end sits exactly at `position`, if any.
    ///
    /// Used to detect "cursor immediately after a complete autocompleted unit" for the
    /// atomic-delete rule.
    pub fn find_closing(&self, position: usize) -> Option<TrackedRange> {
        self.ranges.iter().find(|r| r.end == position).copied()
    }

    /// Remove one range after its text has been deleted from the buffer.
    ///
    /// Every range starting after the removed one moves left by the removed length,
    /// preserving relative order. Returns `false` if the range was not in the set.
    pub fn remove(&mut self, range: TrackedRange) -> bool {
        let Some(pos) = self.ranges.iter().position(|r| *r == range) else {
            return false;
        };
        self.ranges.remove(pos);
        let delta = range.len();
        for r in &mut self.ranges {
            if r.start > range.start {
                r.start -= delta;
                r.end -= delta;
            }
        }
        true
    }

    /// Rebase the set for a direct deletion of `[start, end)` (selection removal or a
    /// plain single-character backspace).
    ///
    /// Ranges after the span move left, ranges swallowed by the span are dropped, and
    /// ranges straddling either boundary shrink to the surviving text.
    pub fn delete_span(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let delta = end - start;
        self.ranges.retain_mut(|range| {
            if range.end <= start {
                // Entirely before the deletion.
                true
            } else if range.start >= end {
                range.start -= delta;
                range.end -= delta;
                true
            } else if range.start >= start && range.end <= end {
                // Swallowed by the deletion.
                false
            } else if range.start < start && range.end > end {
                range.end -= delta;
                true
            } else if range.start < start {
                range.end = start;
                true
            } else {
                range.start = start;
                range.end -= delta;
                true
            }
        });
    }

    /// Drop every range (commit, or an external buffer mutation such as a history load).
    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Number of tracked ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Returns `true` if no ranges are tracked.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// All tracked ranges, sorted by start offset.
    pub fn ranges(&self) -> &[TrackedRange] {
        &self.ranges
    }
}
