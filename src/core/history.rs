use super::text::{TextBuffer, TextUnit};

/// One reversible edit, or an explicit undo-group separator.
///
/// `Write.data` starts empty: while the written text still lives in the
/// buffer there is nothing to save. `undo` captures the removed units into it
/// so `redo` can re-insert them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEntry {
    Write {
        lb: usize,
        ub: usize,
        data: Vec<TextUnit>,
    },
    Erase {
        lb: usize,
        ub: usize,
        data: Vec<TextUnit>,
    },
    Break,
}

/// Ordered edit log with a cursor partitioning it into an undoable head
/// (`..cursor`) and a redoable tail (`cursor..`). Any new edit recorded after
/// an undo discards the redoable tail.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
    cursor: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if there is anything before the cursor to undo.
    pub fn can_undo(&self) -> bool {
        self.entries[..self.cursor]
            .iter()
            .any(|e| !matches!(e, HistoryEntry::Break))
    }

    /// True if there is anything at or after the cursor to redo.
    pub fn can_redo(&self) -> bool {
        self.entries[self.cursor..]
            .iter()
            .any(|e| !matches!(e, HistoryEntry::Break))
    }

    fn truncate_redo(&mut self) {
        self.entries.truncate(self.cursor);
    }

    /// Record that `[lb, ub)` was just written into the buffer. A write
    /// contiguous with the top entry (starting exactly where it ends) extends
    /// it instead of creating a new entry, so a typed run coalesces into one
    /// undo step until a Break or a non-contiguous edit intervenes.
    pub fn record_write(&mut self, lb: usize, ub: usize) {
        self.truncate_redo();

        if let Some(HistoryEntry::Write { ub: top_ub, .. }) = self.entries.last_mut() {
            if *top_ub == lb {
                *top_ub = ub;
                return;
            }
        }

        self.entries.push(HistoryEntry::Write {
            lb,
            ub,
            data: Vec::new(),
        });
        self.cursor = self.entries.len();
    }

    /// Record that `[lb, ub)` was just erased; `data` holds the removed units.
    /// An erase ending exactly where the top erase begins (deleting leftward,
    /// the backspace pattern) merges into it.
    pub fn record_erase(&mut self, lb: usize, ub: usize, data: Vec<TextUnit>) {
        self.truncate_redo();

        if let Some(HistoryEntry::Erase {
            lb: top_lb,
            data: top_data,
            ..
        }) = self.entries.last_mut()
        {
            if *top_lb == ub {
                *top_lb = lb;
                top_data.splice(0..0, data);
                return;
            }
        }

        self.entries.push(HistoryEntry::Erase { lb, ub, data });
        self.cursor = self.entries.len();
    }

    /// Push an explicit boundary so unrelated edits stop coalescing.
    pub fn break_group(&mut self) {
        self.truncate_redo();
        if matches!(self.entries.last(), Some(HistoryEntry::Break)) {
            return;
        }
        self.entries.push(HistoryEntry::Break);
        self.cursor = self.entries.len();
    }

    /// Revert the most recent edit before the cursor, mutating `buffer`.
    /// Returns the offset the caret should move to, or None when there is
    /// nothing to undo.
    pub fn undo(&mut self, buffer: &mut TextBuffer) -> Option<usize> {
        while self.cursor > 0 && matches!(self.entries[self.cursor - 1], HistoryEntry::Break) {
            self.cursor -= 1;
        }
        if self.cursor == 0 {
            return None;
        }

        self.cursor -= 1;
        match &mut self.entries[self.cursor] {
            HistoryEntry::Write { lb, ub, data } => {
                *data = buffer.substring(*lb, *ub).units().to_vec();
                buffer.erase(*lb, *ub);
                Some(*lb)
            }
            HistoryEntry::Erase { lb, data, .. } => {
                buffer.insert(*lb, data);
                Some(*lb + data.len())
            }
            HistoryEntry::Break => unreachable!(),
        }
    }

    /// Re-apply the edit at the cursor, mutating `buffer`. Mirror image of
    /// `undo`: Write entries are re-inserted, Erase entries re-erased.
    pub fn redo(&mut self, buffer: &mut TextBuffer) -> Option<usize> {
        while self.cursor < self.entries.len()
            && matches!(self.entries[self.cursor], HistoryEntry::Break)
        {
            self.cursor += 1;
        }
        if self.cursor >= self.entries.len() {
            return None;
        }

        let caret = match &self.entries[self.cursor] {
            HistoryEntry::Write { lb, data, .. } => {
                buffer.insert(*lb, data);
                *lb + data.len()
            }
            HistoryEntry::Erase { lb, ub, .. } => {
                buffer.erase(*lb, *ub);
                *lb
            }
            HistoryEntry::Break => unreachable!(),
        };
        self.cursor += 1;
        Some(caret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(s: &str) -> Vec<TextUnit> {
        TextBuffer::from_str(s).units().to_vec()
    }

    #[test]
    fn test_write_coalescing() {
        let mut h = History::new();
        // Typing "abc" one character at a time at increasing offsets.
        h.record_write(0, 1);
        h.record_write(1, 2);
        h.record_write(2, 3);
        assert_eq!(h.len(), 1);

        // A non-contiguous write starts a new entry.
        h.record_write(10, 11);
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_break_stops_coalescing() {
        let mut h = History::new();
        h.record_write(0, 1);
        h.break_group();
        h.record_write(1, 2);
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn test_erase_coalesces_leftward() {
        let mut h = History::new();
        // Backspacing "cba" from offset 3 down to 0.
        h.record_erase(2, 3, units("c"));
        h.record_erase(1, 2, units("b"));
        h.record_erase(0, 1, units("a"));
        assert_eq!(h.len(), 1);
        match &h.entries[0] {
            HistoryEntry::Erase { lb, ub, data } => {
                assert_eq!((*lb, *ub), (0, 3));
                assert_eq!(data, &units("abc"));
            }
            other => panic!("expected erase entry, got {other:?}"),
        }
    }

    #[test]
    fn test_undo_write_restores_buffer() {
        let mut buf = TextBuffer::from_str("hello");
        let mut h = History::new();
        buf.insert(2, &units("X"));
        h.record_write(2, 3);
        assert_eq!(buf.to_string(), "heXllo");

        let caret = h.undo(&mut buf);
        assert_eq!(buf.to_string(), "hello");
        assert_eq!(caret, Some(2));
    }

    #[test]
    fn test_undo_redo_inverse() {
        let mut buf = TextBuffer::new();
        let mut h = History::new();

        buf.insert(0, &units("abc"));
        h.record_write(0, 3);
        h.break_group();
        buf.insert(3, &units("def"));
        h.record_write(3, 6);
        h.break_group();
        let removed = buf.substring(1, 3).units().to_vec();
        buf.erase(1, 3);
        h.record_erase(1, 3, removed);
        assert_eq!(buf.to_string(), "adef");
        let after = buf.clone();

        while h.undo(&mut buf).is_some() {}
        assert!(buf.is_empty());

        while h.redo(&mut buf).is_some() {}
        assert_eq!(buf, after);
    }

    #[test]
    fn test_undo_empty_is_noop() {
        let mut buf = TextBuffer::from_str("x");
        let mut h = History::new();
        assert_eq!(h.undo(&mut buf), None);
        assert_eq!(h.redo(&mut buf), None);
        assert!(!h.can_undo());
        assert!(!h.can_redo());
    }

    #[test]
    fn test_new_edit_discards_redo_tail() {
        let mut buf = TextBuffer::new();
        let mut h = History::new();

        buf.insert(0, &units("one"));
        h.record_write(0, 3);
        h.undo(&mut buf);
        assert!(h.can_redo());

        buf.insert(0, &units("two"));
        h.record_write(0, 3);
        assert!(!h.can_redo());
        assert_eq!(h.len(), 1);
    }
}
