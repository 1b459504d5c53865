//! Terminal backend: a `Surface` over ratatui/crossterm and a blocking
//! `KeySource` that folds key events down to the byte-oriented key units the
//! input engine consumes.

use std::collections::VecDeque;
use std::io::{self, Stdout};

use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::style::Color as RColor;
use ratatui::Terminal;

use crate::config::Color;
use crate::core::input::KeySource;
use crate::core::text::TextUnit;
use crate::render::Surface;

pub struct TerminalSurface {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    cells: Vec<(char, Color)>,
    w: usize,
    h: usize,
}

impl TerminalSurface {
    /// Put the terminal in raw mode on the alternate screen and wrap it.
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        // The cursor is painted as an inverted cell, not the hardware cursor.
        terminal.hide_cursor()?;

        let size = terminal.size()?;
        let (w, h) = (size.width as usize, size.height as usize);
        Ok(Self {
            terminal,
            cells: vec![(' ', Color::new(0, 0)); w * h],
            w,
            h,
        })
    }

    /// Leave the alternate screen and give the shell its terminal back. Safe
    /// to call on the way out of a panic.
    pub fn restore(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }

    fn sync_size(&mut self) {
        let Ok(size) = self.terminal.size() else {
            return;
        };
        let (w, h) = (size.width as usize, size.height as usize);
        if (w, h) != (self.w, self.h) {
            self.w = w;
            self.h = h;
            self.cells = vec![(' ', Color::new(0, 0)); w * h];
        }
    }
}

impl Surface for TerminalSurface {
    fn size(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    fn put(&mut self, x: usize, y: usize, ch: char, color: Color) {
        if x < self.w && y < self.h {
            self.cells[y * self.w + x] = (ch, color);
        }
    }

    fn get(&self, x: usize, y: usize) -> Option<(char, Color)> {
        (x < self.w && y < self.h).then(|| self.cells[y * self.w + x])
    }

    fn present(&mut self) {
        let (w, h) = (self.w, self.h);
        let cells = &self.cells;
        let _ = self.terminal.draw(|frame| {
            let buf = frame.buffer_mut();
            for y in 0..h {
                for x in 0..w {
                    let (ch, color) = cells[y * w + x];
                    if let Some(cell) = buf.cell_mut((x as u16, y as u16)) {
                        cell.set_char(ch)
                            .set_fg(RColor::Indexed(color.fg))
                            .set_bg(RColor::Indexed(color.bg));
                    }
                }
            }
        });
        // Pick up a resize for the next paint; the resize event itself only
        // triggers the repaint.
        self.sync_size();
    }
}

/// Blocking key reader. Multi-unit keys (Alt chords, function keys) are
/// queued and returned one unit at a time so they look like the escape
/// sequences the bind tables are written against.
#[derive(Debug, Default)]
pub struct TerminalKeys {
    pending: VecDeque<TextUnit>,
}

impl TerminalKeys {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeySource for TerminalKeys {
    fn read(&mut self) -> TextUnit {
        loop {
            if let Some(unit) = self.pending.pop_front() {
                return unit;
            }
            match event::read() {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                    if let Some(units) = translate_key(key) {
                        self.pending.extend(units);
                    }
                }
                Ok(Event::Resize(..)) => return TextUnit::sentinel(),
                Ok(_) => {}
                Err(_) => return TextUnit::sentinel(),
            }
        }
    }
}

/// Map a key event to the unit sequence it stands for: control characters
/// for Ctrl chords, ESC prefixes for Alt, xterm `ESC O letter` for F1-F4.
fn translate_key(key: KeyEvent) -> Option<Vec<TextUnit>> {
    let esc = TextUnit::from_char('\u{1b}');
    let base = match key.code {
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let c = c.to_ascii_lowercase();
            if !c.is_ascii_lowercase() {
                return None;
            }
            vec![TextUnit::from_char((c as u8 - b'a' + 1) as char)]
        }
        KeyCode::Char(c) => vec![TextUnit::from_char(c)],
        KeyCode::Enter => vec![TextUnit::from_char('\r')],
        KeyCode::Tab => vec![TextUnit::from_char('\t')],
        KeyCode::Backspace => vec![TextUnit::from_char('\u{7f}')],
        KeyCode::Esc => vec![esc],
        KeyCode::F(n @ 1..=4) => {
            vec![esc, TextUnit::from_char('O'), TextUnit::from_char((b'O' + n as u8) as char)]
        }
        _ => return None,
    };

    if key.modifiers.contains(KeyModifiers::ALT) && key.code != KeyCode::Esc {
        let mut units = vec![esc];
        units.extend(base);
        Some(units)
    } else {
        Some(base)
    }
}
