use std::fs;
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};

use unicode_width::UnicodeWidthChar;

use super::history::History;
use super::text::{TextBuffer, TextUnit};

/// A frame couples one text buffer to its view state: scroll offset, caret,
/// the column preserved across vertical motion, a dirty flag and the undo
/// history. It is the unit of "open file" in the editor.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub buffer: TextBuffer,
    /// Path the buffer was loaded from / saves to. None is a scratch buffer.
    pub source: Option<PathBuf>,
    /// First visible buffer offset.
    pub start: usize,
    /// Caret offset into the buffer.
    pub cursor: usize,
    /// Tab-expanded visual column to restore after vertical cursor motion.
    pub saved_col: usize,
    pub dirty: bool,
    pub history: History,
}

impl Frame {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_str(text: &str) -> Self {
        Self {
            buffer: TextBuffer::from_str(text),
            ..Self::default()
        }
    }

    /// Load a frame from a file. Malformed byte sequences degrade to
    /// replacement units (keeping their raw bytes); only I/O failures error.
    pub fn from_file(path: &Path) -> Result<Self, io::Error> {
        let bytes = fs::read(path)?;
        Ok(Self {
            buffer: TextBuffer::from_bytes(&bytes),
            source: Some(path.to_path_buf()),
            ..Self::default()
        })
    }

    /// Display name for the title bar (file name or "(scratch)").
    pub fn display_name(&self) -> String {
        self.source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(scratch)".to_string())
    }

    /// Insert `units` at `at`, recording history and marking dirty. All
    /// editing goes through this or `erase`; the raw buffer is not
    /// history-aware.
    pub fn write(&mut self, units: &[TextUnit], at: usize) {
        if at > self.buffer.len() || units.is_empty() {
            return;
        }
        self.buffer.insert(at, units);
        self.history.record_write(at, at + units.len());
        self.dirty = true;
    }

    pub fn write_unit(&mut self, unit: TextUnit, at: usize) {
        self.write(&[unit], at);
    }

    pub fn write_str(&mut self, text: &str, at: usize) {
        self.write(TextBuffer::from_str(text).units(), at);
    }

    /// Erase the half-open range `[lb, ub)`, recording history and marking
    /// dirty.
    pub fn erase(&mut self, lb: usize, ub: usize) {
        if lb >= ub || ub > self.buffer.len() {
            return;
        }
        let removed = self.buffer.substring(lb, ub).units().to_vec();
        self.buffer.erase(lb, ub);
        self.history.record_erase(lb, ub, removed);
        self.dirty = true;
    }

    /// Undo the most recent edit. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(&mut self.buffer) {
            Some(caret) => {
                self.cursor = caret.min(self.buffer.len());
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Re-apply the most recently undone edit.
    pub fn redo(&mut self) -> bool {
        match self.history.redo(&mut self.buffer) {
            Some(caret) => {
                self.cursor = caret.min(self.buffer.len());
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Stop the next edit from coalescing with the previous one.
    pub fn break_history(&mut self) {
        self.history.break_group();
    }

    /// Offset of the first unit of the line containing `at`.
    pub fn line_start(&self, at: usize) -> usize {
        let mut i = at.min(self.buffer.len());
        while i > 0 && self.buffer.codepoint(i - 1) != '\n' as u32 {
            i -= 1;
        }
        i
    }

    /// Offset of the newline terminating the line containing `at` (or end of
    /// buffer).
    pub fn line_end(&self, at: usize) -> usize {
        let mut i = at.min(self.buffer.len());
        while i < self.buffer.len() && self.buffer.codepoint(i) != '\n' as u32 {
            i += 1;
        }
        i
    }

    /// Tab-expanded visual column of `at` within its line.
    pub fn visual_col(&self, at: usize, tab_size: usize) -> usize {
        let mut col = 0;
        for i in self.line_start(at)..at.min(self.buffer.len()) {
            col += self.unit_width(i, col, tab_size);
        }
        col
    }

    /// Remember the cursor's visual column for later vertical motion.
    pub fn save_cursor(&mut self, tab_size: usize) {
        self.saved_col = self.visual_col(self.cursor, tab_size);
    }

    /// Place the cursor on its current line at the saved visual column (or
    /// the line end, whichever comes first).
    pub fn load_cursor(&mut self, tab_size: usize) {
        let mut i = self.line_start(self.cursor);
        let mut col = 0;
        while i < self.buffer.len() && self.buffer.codepoint(i) != '\n' as u32 {
            let w = self.unit_width(i, col, tab_size);
            if col + w > self.saved_col {
                break;
            }
            col += w;
            i += 1;
        }
        self.cursor = i;
    }

    /// Cell width of the unit at `i` when drawn at visual column `col`.
    fn unit_width(&self, i: usize, col: usize, tab_size: usize) -> usize {
        let tab = tab_size.max(1);
        match self.buffer.get(i) {
            Some(u) if u.codepoint == '\t' as u32 => tab - col % tab,
            Some(u) => u.to_char().width().unwrap_or(1).max(1),
            None => 1,
        }
    }

    /// Offset starting the visual row after the one beginning at `from`,
    /// wrapping at `width` columns.
    fn next_row_start(&self, from: usize, width: usize, tab_size: usize) -> usize {
        let width = width.max(1);
        let mut i = from;
        let mut col = 0;
        while i < self.buffer.len() {
            if self.buffer.codepoint(i) == '\n' as u32 {
                return i + 1;
            }
            let w = self.unit_width(i, col, tab_size);
            if col + w > width && col > 0 {
                return i;
            }
            col += w;
            i += 1;
        }
        self.buffer.len()
    }

    /// Recompute `start` so the cursor's visual row fits inside a `width` x
    /// `height` viewport. Upward motion past the top snaps to the cursor's
    /// line start; otherwise the window walks forward one wrapped row at a
    /// time until the cursor is inside it.
    pub fn compute_bounds(&mut self, width: usize, height: usize, tab_size: usize) {
        let height = height.max(1);
        if self.cursor < self.start {
            self.start = self.line_start(self.cursor);
            return;
        }

        loop {
            let mut row = 0;
            let mut i = self.start;
            while i <= self.cursor && row < height {
                let next = self.next_row_start(i, width, tab_size);
                if self.cursor < next || (self.cursor == next && next == self.buffer.len()) {
                    return; // cursor is on row `row`, which is visible
                }
                i = next;
                row += 1;
            }
            // Cursor below the viewport: scroll down one visual row.
            self.start = self.next_row_start(self.start, width, tab_size);
        }
    }

    /// Insert indentation at `at`: a literal tab, or spaces up to the next
    /// tab stop, per configuration. Returns the offset just past the insert.
    pub fn tabulate(&mut self, at: usize, tab_size: usize, tab_spaces: bool) -> usize {
        if tab_spaces {
            let tab = tab_size.max(1);
            let n = tab - self.visual_col(at, tab) % tab;
            let spaces: Vec<TextUnit> = (0..n).map(|_| TextUnit::from_char(' ')).collect();
            self.write(&spaces, at);
            at + n
        } else {
            self.write_unit(TextUnit::from_char('\t'), at);
            at + 1
        }
    }

    /// Write the buffer back to its source path. The error string is shown in
    /// the status bar; a failure partway through may have truncated the file,
    /// so that message warns about possible data loss.
    pub fn save(&mut self) -> Result<(), String> {
        let Some(path) = self.source.clone() else {
            return Err("Cannot save frame with no source".to_string());
        };

        let mut file = fs::File::create(&path)
            .map_err(|e| format!("Failed to open {} for writing: {e}", path.display()))?;
        file.write_all(&self.buffer.to_bytes()).map_err(|e| {
            format!(
                "Failed to write {}, take care not to lose data: {e}",
                path.display()
            )
        })?;

        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_sets_dirty_and_history() {
        let mut f = Frame::from_str("hello");
        assert!(!f.dirty);
        f.write_str("X", 2);
        assert_eq!(f.buffer.to_string(), "heXllo");
        assert!(f.dirty);
        assert_eq!(f.history.len(), 1);
    }

    #[test]
    fn test_undo_insert_scenario() {
        // Buffer "hello", insert "X" at 2, undo -> "hello" with cursor at 2.
        let mut f = Frame::from_str("hello");
        f.write_str("X", 2);
        f.cursor = 3;
        assert!(f.undo());
        assert_eq!(f.buffer.to_string(), "hello");
        assert_eq!(f.cursor, 2);
        assert!(f.redo());
        assert_eq!(f.buffer.to_string(), "heXllo");
    }

    #[test]
    fn test_erase_then_undo_restores() {
        let mut f = Frame::from_str("abc\ndef");
        f.erase(0, 4);
        assert_eq!(f.buffer.to_string(), "def");
        assert!(f.undo());
        assert_eq!(f.buffer.to_string(), "abc\ndef");
    }

    #[test]
    fn test_line_bounds() {
        let f = Frame::from_str("abc\ndef\nghi");
        assert_eq!(f.line_start(5), 4);
        assert_eq!(f.line_end(5), 7);
        assert_eq!(f.line_start(0), 0);
        assert_eq!(f.line_end(9), 11);
    }

    #[test]
    fn test_visual_col_expands_tabs() {
        let f = Frame::from_str("\tx");
        assert_eq!(f.visual_col(0, 4), 0);
        assert_eq!(f.visual_col(1, 4), 4);
        assert_eq!(f.visual_col(2, 4), 5);
    }

    #[test]
    fn test_saved_column_across_vertical_motion() {
        let mut f = Frame::from_str("long line\nab\nlonger line");
        f.cursor = 7; // column 7 of the first line
        f.save_cursor(4);

        f.cursor = 10; // start of "ab"
        f.load_cursor(4);
        assert_eq!(f.cursor, 12); // clamped to end of "ab"

        f.cursor = 13; // start of "longer line"
        f.load_cursor(4);
        assert_eq!(f.cursor, 20); // back at column 7
    }

    #[test]
    fn test_tabulate_spaces() {
        let mut f = Frame::from_str("ab");
        let after = f.tabulate(2, 4, true);
        assert_eq!(f.buffer.to_string(), "ab  ");
        assert_eq!(after, 4);
    }

    #[test]
    fn test_tabulate_literal_tab() {
        let mut f = Frame::from_str("");
        let after = f.tabulate(0, 4, false);
        assert_eq!(f.buffer.to_string(), "\t");
        assert_eq!(after, 1);
    }

    #[test]
    fn test_compute_bounds_scrolls_down_and_snaps_up() {
        let mut f = Frame::from_str("a\nb\nc\nd\ne\nf\n");
        f.cursor = 10; // line "f"
        f.compute_bounds(10, 3, 4);
        assert!(f.start > 0);
        let start_after_down = f.start;
        assert!(f.cursor >= start_after_down);

        f.cursor = 0;
        f.compute_bounds(10, 3, 4);
        assert_eq!(f.start, 0);
    }

    #[test]
    fn test_compute_bounds_wraps_long_lines() {
        let mut f = Frame::from_str("abcdefghij");
        f.cursor = 9;
        // 4 columns x 2 rows: offset 9 sits on visual row 2, so start must move.
        f.compute_bounds(4, 2, 4);
        assert!(f.start >= 4);
    }

    #[test]
    fn test_save_without_source_fails() {
        let mut f = Frame::from_str("text");
        assert!(f.save().is_err());
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, b"one\ntwo\n").unwrap();

        let mut f = Frame::from_file(&path).unwrap();
        f.write_str("X", 0);
        assert!(f.dirty);
        f.save().unwrap();
        assert!(!f.dirty);
        assert_eq!(fs::read(&path).unwrap(), b"Xone\ntwo\n");
    }
}
