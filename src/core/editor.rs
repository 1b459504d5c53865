use std::path::Path;

use crate::config::Config;
use crate::render::{self, Surface};

use super::binds::{self, Command};
use super::frame::Frame;
use super::input::{InputEngine, KeyOutcome, KeySource};
use super::prompt::Prompt;
use super::text::{TextBuffer, TextUnit, REPLACEMENT};

/// Upper bound on simultaneously open frames.
pub const MAX_FRAMES: usize = 8;

pub const GREETER_TEXT: &str = "\n\
    \x20 framed\n\
    \n\
    A modal terminal text editor.\n\
    \n\
    \x20 C-h  help\n\
    \x20 i    write mode\n\
    \x20 C-s  save\n\
    \x20 C-x C-c  quit\n";

pub const HELP_TEXT: &str = "framed help\n\
    \n\
    Base mode:\n\
    \x20 h l k j        move left / right / up / down\n\
    \x20 a e            line start / end\n\
    \x20 b f            word left / right\n\
    \x20 i              enter write mode (C-g leaves)\n\
    \x20 u / C-r        undo / redo\n\
    \x20 / ?            search forward / backward\n\
    \x20 v c d          paste, copy line, cut line\n\
    \x20 q c / q d      copy / cut N lines\n\
    \x20 g              goto line\n\
    \x20 z              center view on cursor\n\
    \x20 n p            next / previous frame\n\
    \x20 m              promote frame to master\n\
    \x20 C-n C-k        new / kill frame\n\
    \x20 C-s C-f        save / open file\n\
    \x20 F3 F4          record / execute macro\n\
    \x20 C-x C-c        quit\n";

/// The injected I/O collaborators: a drawing surface and a key source. Passed
/// through dispatch so prompt sub-loops can keep rendering and reading.
pub struct Io<'a> {
    pub surface: &'a mut dyn Surface,
    pub keys: &'a mut dyn KeySource,
}

/// Process-wide editor state: the frame collection, focus, clipboard and the
/// input engine. Constructed once at startup from the CLI file list.
pub struct Editor {
    pub frames: Vec<Frame>,
    pub focused: usize,
    /// One shared clipboard; the last cut/copy wins.
    pub clipboard: TextBuffer,
    pub running: bool,
    /// Whether unbound printable keys echo into the focused frame.
    pub write_input: bool,
    pub input: InputEngine<Command>,
    pub prompt: Prompt,
    /// Status bar content: mode name, informational notes, error reports.
    pub message: String,
    pub config: Config,
}

impl Editor {
    pub fn new(config: Config) -> Self {
        Self {
            frames: vec![Frame::from_str(GREETER_TEXT)],
            focused: 0,
            clipboard: TextBuffer::new(),
            running: false,
            write_input: false,
            input: InputEngine::new(),
            prompt: Prompt::default(),
            message: String::new(),
            config,
        }
    }

    /// Open frames for the CLI file list. Any failure is fatal at startup, so
    /// this errors instead of degrading to a status message.
    pub fn with_files(config: Config, paths: &[impl AsRef<Path>]) -> Result<Self, String> {
        let mut editor = Self::new(config);
        if paths.is_empty() {
            return Ok(editor);
        }

        editor.frames.clear();
        for path in paths {
            let path = path.as_ref();
            if editor.frames.len() >= MAX_FRAMES {
                return Err(format!("Cannot open more than {MAX_FRAMES} files"));
            }
            let frame = Frame::from_file(path)
                .map_err(|e| format!("Failed to open {}: {e}", path.display()))?;
            editor.frames.push(frame);
        }
        Ok(editor)
    }

    pub fn frame(&self) -> &Frame {
        &self.frames[self.focused]
    }

    pub fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frames[self.focused]
    }

    pub fn info(&mut self, msg: impl Into<String>) {
        self.message = msg.into();
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.message = format!("Error: {}", msg.into());
    }

    /// The blocking read / dispatch / render loop. Returns when a quit action
    /// clears `running`.
    pub fn run(&mut self, io: &mut Io) {
        binds::install_base(self);
        self.running = true;
        while self.running {
            render::render_editor(self, io.surface);
            io.surface.present();

            match self.input.read_key(io.keys) {
                KeyOutcome::Command(cmd) => binds::dispatch(self, cmd, io),
                KeyOutcome::Pending => {}
                KeyOutcome::Literal(unit) => {
                    if self.write_input && is_writable(unit) {
                        self.echo(unit);
                    }
                }
            }
        }
    }

    /// Insert one literal key into the focused frame at the cursor.
    pub fn echo(&mut self, unit: TextUnit) {
        let tab = self.config.settings.tab_size;
        let frame = &mut self.frames[self.focused];
        let at = frame.cursor;
        frame.write_unit(unit, at);
        frame.cursor += 1;
        frame.save_cursor(tab);
    }

    /// Open `path` in a new frame (or focus an already-open one). Recoverable:
    /// failures become status messages at the call site.
    pub fn open_path(&mut self, path: &Path) -> Result<(), String> {
        // Duplicate check by canonical path, so "./a" and "a" collide.
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        for (i, frame) in self.frames.iter().enumerate() {
            let Some(existing) = frame.source.as_ref() else {
                continue;
            };
            let existing = existing
                .canonicalize()
                .unwrap_or_else(|_| existing.to_path_buf());
            if existing == canonical {
                self.focused = i;
                self.info(format!("{} is already open", path.display()));
                return Ok(());
            }
        }

        if self.frames.len() >= MAX_FRAMES {
            return Err(format!(
                "Cannot open more than {MAX_FRAMES} frames, kill some with C-k"
            ));
        }

        let frame = if path.exists() {
            Frame::from_file(path).map_err(|e| format!("Failed to open {}: {e}", path.display()))?
        } else {
            let mut frame = Frame::empty();
            frame.source = Some(path.to_path_buf());
            self.info(format!("{} [new file]", path.display()));
            frame
        };

        self.frames.push(frame);
        self.focused = self.frames.len() - 1;
        Ok(())
    }

    /// Destroy the frame at `idx`. The last frame is replaced by an empty
    /// scratch frame rather than leaving the editor frameless.
    pub fn destroy_frame(&mut self, idx: usize) {
        if idx >= self.frames.len() {
            return;
        }
        if self.frames.len() == 1 {
            self.frames[0] = Frame::empty();
            self.focused = 0;
            return;
        }
        self.frames.remove(idx);
        if self.focused > 0 && self.focused >= idx {
            self.focused -= 1;
        }
    }
}

/// Keys the write-mode echo accepts. The sentinel and control keys are not
/// text; a literal tab is.
pub fn is_writable(unit: TextUnit) -> bool {
    (unit.codepoint == '\t' as u32 || unit.is_print()) && unit.codepoint != REPLACEMENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::ScriptedKeys;
    use crate::render::MemorySurface;

    fn scripted(script: Vec<TextUnit>) -> (Editor, MemorySurface, ScriptedKeys) {
        let editor = Editor::new(Config::default());
        let surface = MemorySurface::new(80, 24);
        (editor, surface, ScriptedKeys::from_units(script))
    }

    fn keys(text: &str) -> Vec<TextUnit> {
        text.chars().map(TextUnit::from_char).collect()
    }

    fn ctrl(ch: char) -> TextUnit {
        TextUnit::from_char(((ch as u8) - b'a' + 1) as char)
    }

    fn quit_chord() -> Vec<TextUnit> {
        vec![ctrl('x'), ctrl('c')]
    }

    // Quit plus the "yes" answer to the unsaved-changes confirm.
    fn quit_dirty() -> Vec<TextUnit> {
        vec![ctrl('x'), ctrl('c'), TextUnit::from_char('y')]
    }

    fn fresh_frame(editor: &mut Editor, text: &str) {
        editor.frames[0] = Frame::from_str(text);
    }

    #[test]
    fn test_run_quits_on_quit_chord() {
        let (mut editor, mut surface, mut keys) = scripted(quit_chord());
        fresh_frame(&mut editor, "");
        let mut io = Io {
            surface: &mut surface,
            keys: &mut keys,
        };
        editor.run(&mut io);
        assert!(!editor.running);
    }

    #[test]
    fn test_write_mode_echoes_and_coalesces() {
        let mut script = keys("i");
        script.extend(keys("hello"));
        script.push(ctrl('g'));
        script.extend(quit_dirty());

        let (mut editor, mut surface, mut keys) = scripted(script);
        fresh_frame(&mut editor, "");
        let mut io = Io {
            surface: &mut surface,
            keys: &mut keys,
        };
        editor.run(&mut io);

        assert_eq!(editor.frame().buffer.to_string(), "hello");
        assert_eq!(editor.frame().cursor, 5);
        // Five contiguous writes coalesce into a single history entry
        // (plus the break recorded on leaving write mode).
        assert_eq!(editor.frame().history.len(), 2);
    }

    #[test]
    fn test_undo_key_reverts_typed_text() {
        let mut script = keys("i");
        script.extend(keys("xyz"));
        script.push(ctrl('g'));
        script.extend(keys("u"));
        script.extend(quit_dirty());

        let (mut editor, mut surface, mut keys) = scripted(script);
        fresh_frame(&mut editor, "");
        let mut io = Io {
            surface: &mut surface,
            keys: &mut keys,
        };
        editor.run(&mut io);

        assert_eq!(editor.frame().buffer.to_string(), "");
        assert_eq!(editor.frame().cursor, 0);
    }

    #[test]
    fn test_undo_empty_reports_info() {
        let mut script = keys("u");
        script.extend(quit_chord());
        let (mut editor, mut surface, mut keys) = scripted(script);
        fresh_frame(&mut editor, "");
        let mut io = Io {
            surface: &mut surface,
            keys: &mut keys,
        };
        editor.run(&mut io);
        assert_eq!(editor.message, "Nothing to undo");
    }

    #[test]
    fn test_cut_line_scenario() {
        // "abc\ndef\nghi", cursor in "def": cut removes [4,8), clipboard "def".
        let mut script = keys("d");
        script.extend(quit_dirty());
        let (mut editor, mut surface, mut keys) = scripted(script);
        fresh_frame(&mut editor, "abc\ndef\nghi");
        editor.frames[0].cursor = 5;
        let mut io = Io {
            surface: &mut surface,
            keys: &mut keys,
        };
        editor.run(&mut io);

        assert_eq!(editor.frame().buffer.to_string(), "abc\nghi");
        assert_eq!(editor.clipboard.to_string(), "def");
        assert_eq!(editor.frame().cursor, 4);
    }

    #[test]
    fn test_paste_inserts_clipboard() {
        let mut script = keys("v");
        script.extend(quit_dirty());
        let (mut editor, mut surface, mut keys) = scripted(script);
        fresh_frame(&mut editor, "ab");
        editor.clipboard = TextBuffer::from_str("XY");
        editor.frames[0].cursor = 1;
        let mut io = Io {
            surface: &mut surface,
            keys: &mut keys,
        };
        editor.run(&mut io);
        assert_eq!(editor.frame().buffer.to_string(), "aXYb");
        assert_eq!(editor.frame().cursor, 3);
    }

    #[test]
    fn test_macro_replay_fidelity() {
        // F3, type "ab" in write mode, leave, F4: the macro tape is
        // [i a b C-g F4...]; execution replays everything but its final key,
        // reproducing the same buffer mutation as the live keystrokes.
        let f3 = vec![
            TextUnit::from_char('\u{1b}'),
            TextUnit::from_char('O'),
            TextUnit::from_char('R'),
        ];
        let f4 = vec![
            TextUnit::from_char('\u{1b}'),
            TextUnit::from_char('O'),
            TextUnit::from_char('S'),
        ];

        let mut script = f3.clone();
        script.extend(keys("iab"));
        script.push(ctrl('g'));
        script.extend(f4.clone()); // stop recording
        script.extend(f4.clone()); // execute
        script.extend(quit_dirty());

        let (mut editor, mut surface, mut keys) = scripted(script);
        fresh_frame(&mut editor, "");
        let mut io = Io {
            surface: &mut surface,
            keys: &mut keys,
        };
        editor.run(&mut io);

        // Live typing produced "ab"; the replay produced it again.
        assert_eq!(editor.frame().buffer.to_string(), "abab");
    }

    #[test]
    fn test_quit_with_dirty_frame_asks_confirmation() {
        let mut script = quit_chord();
        script.extend(keys("n")); // refuse
        script.extend(keys("c")); // something harmless (copy line)
        script.extend(quit_chord());
        script.extend(keys("y")); // accept

        let (mut editor, mut surface, mut keys) = scripted(script);
        fresh_frame(&mut editor, "text");
        editor.frames[0].dirty = true;
        let mut io = Io {
            surface: &mut surface,
            keys: &mut keys,
        };
        editor.run(&mut io);
        assert!(!editor.running);
    }

    #[test]
    fn test_open_path_duplicate_focuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "x").unwrap();

        let mut editor = Editor::new(Config::default());
        editor.open_path(&path).unwrap();
        assert_eq!(editor.frames.len(), 2);
        let opened = editor.focused;

        editor.focused = 0;
        editor.open_path(&path).unwrap();
        assert_eq!(editor.frames.len(), 2);
        assert_eq!(editor.focused, opened);
    }

    #[test]
    fn test_destroy_last_frame_leaves_scratch() {
        let mut editor = Editor::new(Config::default());
        editor.destroy_frame(0);
        assert_eq!(editor.frames.len(), 1);
        assert!(editor.frame().buffer.is_empty());
        assert!(editor.frame().source.is_none());
    }

    #[test]
    fn test_with_files_rejects_missing() {
        let err = Editor::with_files(Config::default(), &["/definitely/not/here.txt"]);
        assert!(err.is_err());
    }
}
