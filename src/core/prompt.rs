use super::text::{TextBuffer, TextUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptStatus {
    /// Still collecting input.
    #[default]
    None,
    /// Cancelled (exit bind, or "no" on a confirm).
    Fail,
    /// Submitted (newline, or "yes" on a confirm).
    Success,
}

/// State for the modal bottom-bar prompt. The label lives in `data` in front
/// of the editable region so rendering is one string; `start` marks where
/// user input begins and motion/deletion never crosses it.
#[derive(Debug, Clone, Default)]
pub struct Prompt {
    pub data: TextBuffer,
    pub start: usize,
    pub cursor: usize,
    pub status: PromptStatus,
    /// True while a prompt loop is running; the renderer shows the prompt
    /// line instead of the status message.
    pub active: bool,
}

impl Prompt {
    /// Start a prompt with the given label. Input begins after the label.
    pub fn begin(&mut self, label: &str) {
        self.data = TextBuffer::from_str(label);
        self.start = self.data.len();
        self.cursor = self.data.len();
        self.status = PromptStatus::None;
        self.active = true;
    }

    pub fn end(&mut self) {
        self.active = false;
    }

    pub fn write_unit(&mut self, unit: TextUnit, at: usize) {
        self.data.insert_unit(at, unit);
    }

    pub fn write_str(&mut self, text: &str, at: usize) {
        self.data.insert(at, TextBuffer::from_str(text).units());
    }

    pub fn erase(&mut self, lb: usize, ub: usize) {
        self.data.erase(lb, ub);
    }

    /// The collected input with the label stripped.
    pub fn response(&self) -> TextBuffer {
        self.data.substring(self.start, self.data.len())
    }

    pub fn move_left(&mut self) {
        if self.cursor > self.start {
            self.cursor -= 1;
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.data.len() {
            self.cursor += 1;
        }
    }

    pub fn move_start(&mut self) {
        self.cursor = self.start;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.data.len();
    }

    /// Jump left over one run of non-word then word characters.
    pub fn move_word_left(&mut self) {
        let mut i = self.cursor;
        while i > self.start && !self.data.get(i - 1).is_some_and(|u| u.is_alnum()) {
            i -= 1;
        }
        while i > self.start && self.data.get(i - 1).is_some_and(|u| u.is_alnum()) {
            i -= 1;
        }
        self.cursor = i;
    }

    /// Jump right over one run of non-word then word characters.
    pub fn move_word_right(&mut self) {
        let mut i = self.cursor;
        let len = self.data.len();
        while i < len && !self.data.get(i).is_some_and(|u| u.is_alnum()) {
            i += 1;
        }
        while i < len && self.data.get(i).is_some_and(|u| u.is_alnum()) {
            i += 1;
        }
        self.cursor = i;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_places_cursor_after_label() {
        let mut p = Prompt::default();
        p.begin("Search: ");
        assert_eq!(p.start, 8);
        assert_eq!(p.cursor, 8);
        assert_eq!(p.status, PromptStatus::None);
        assert!(p.response().is_empty());
    }

    #[test]
    fn test_response_strips_label() {
        let mut p = Prompt::default();
        p.begin("Open: ");
        p.write_str("foo.c", p.cursor);
        assert_eq!(p.response().to_string(), "foo.c");
    }

    #[test]
    fn test_motion_clamped_to_input_region() {
        let mut p = Prompt::default();
        p.begin("> ");
        p.write_str("ab", p.cursor);
        p.cursor = p.data.len();

        p.move_left();
        p.move_left();
        p.move_left(); // clamped at start
        assert_eq!(p.cursor, p.start);
        p.move_end();
        assert_eq!(p.cursor, p.data.len());
        p.move_start();
        assert_eq!(p.cursor, p.start);
    }

    #[test]
    fn test_word_motion() {
        let mut p = Prompt::default();
        p.begin(": ");
        p.write_str("foo bar", p.cursor);
        p.move_end();

        p.move_word_left();
        assert_eq!(p.data.substring(p.cursor, p.data.len()).to_string(), "bar");
        p.move_word_left();
        assert_eq!(p.cursor, p.start);
        p.move_word_right();
        assert_eq!(
            p.data.substring(p.start, p.cursor).to_string(),
            "foo"
        );
    }
}
