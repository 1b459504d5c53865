//! Cell-grid rendering. The editor paints onto a `Surface`, which the
//! terminal backend flushes on `present`; tests swap in an in-memory grid.

use unicode_width::UnicodeWidthChar;

use crate::config::{Color, Config, Settings, Theme};
use crate::core::editor::Editor;
use crate::core::frame::Frame;
use crate::core::highlight::{find_highlight, HighlightKind};

/// A grid of colored cells. `put` outside the grid is a no-op so painting
/// code does not bounds-check every write.
pub trait Surface {
    /// (width, height) in cells.
    fn size(&self) -> (usize, usize);
    fn put(&mut self, x: usize, y: usize, ch: char, color: Color);
    fn get(&self, x: usize, y: usize) -> Option<(char, Color)>;
    /// Flush the grid to the output device.
    fn present(&mut self);

    fn fill(&mut self, x: usize, y: usize, w: usize, h: usize, ch: char, color: Color) {
        for row in y..y.saturating_add(h) {
            for col in x..x.saturating_add(w) {
                self.put(col, row, ch, color);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

/// Master/stack tiling: frame 0 takes the left `master_numer/master_denom`
/// of the width and full height, the rest split the right column evenly.
/// A single frame takes everything. The bottom row is reserved for the bar.
pub fn arrange_frame(
    idx: usize,
    count: usize,
    width: usize,
    height: usize,
    settings: &Settings,
) -> Rect {
    let height = height.saturating_sub(1);
    if count <= 1 {
        return Rect {
            x: 0,
            y: 0,
            w: width,
            h: height,
        };
    }

    let denom = settings.master_denom.max(1) as usize;
    let numer = (settings.master_numer as usize).min(denom);
    let master_w = (width * numer / denom).min(width.saturating_sub(1)).max(1.min(width));

    if idx == 0 {
        return Rect {
            x: 0,
            y: 0,
            w: master_w,
            h: height,
        };
    }

    let stack = count - 1;
    let each = (height / stack).max(1);
    let y = (each * (idx - 1)).min(height);
    let h = if idx == count - 1 {
        height.saturating_sub(y)
    } else {
        each.min(height.saturating_sub(y))
    };
    Rect {
        x: master_w,
        y,
        w: width.saturating_sub(master_w),
        h,
    }
}

/// Columns taken by the line-number gutter: padding either side of the
/// widest line number.
pub fn gutter_width(frame: &Frame, settings: &Settings) -> usize {
    let lines = 1 + (0..frame.buffer.len())
        .filter(|&i| frame.buffer.codepoint(i) == '\n' as u32)
        .count();
    let mut digits = 1;
    let mut n = lines;
    while n >= 10 {
        digits += 1;
        n /= 10;
    }
    settings.left_gutter + digits + settings.right_gutter
}

fn kind_color(kind: HighlightKind, theme: &Theme) -> Color {
    match kind {
        HighlightKind::Plain => theme.normal,
        HighlightKind::Comment => theme.comment,
        HighlightKind::Macro => theme.macro_,
        HighlightKind::Special => theme.special,
        HighlightKind::Keyword => theme.keyword,
        HighlightKind::Primitive => theme.primitive,
        HighlightKind::Type => theme.type_,
        HighlightKind::Emphasis => theme.emphasis,
        HighlightKind::String => theme.string,
        HighlightKind::Number => theme.number,
    }
}

/// Paint every frame and the bottom bar. Recomputes each frame's scroll
/// window for its current rectangle first, so a resize is just a repaint.
pub fn render_editor(ed: &mut Editor, surface: &mut dyn Surface) {
    let (w, h) = surface.size();
    if w == 0 || h == 0 {
        return;
    }
    surface.fill(0, 0, w, h, ' ', ed.config.theme.normal);

    let count = ed.frames.len();
    for i in 0..count {
        let rect = arrange_frame(i, count, w, h, &ed.config.settings);
        let frame = &mut ed.frames[i];
        render_frame(frame, &ed.config, i == ed.focused, rect, surface);
    }

    render_bar(ed, surface);
}

fn render_frame(
    frame: &mut Frame,
    config: &Config,
    active: bool,
    rect: Rect,
    surface: &mut dyn Surface,
) {
    if rect.w == 0 || rect.h == 0 {
        return;
    }
    let settings = &config.settings;
    let theme = &config.theme;
    let tab = settings.tab_size.max(1);

    let title_color = if active {
        theme.active_title
    } else {
        theme.frame_title
    };
    surface.fill(rect.x, rect.y, rect.w, 1, ' ', title_color);
    let mut name = frame.display_name();
    if frame.dirty {
        name.push('*');
    }
    for (i, ch) in name.chars().enumerate() {
        if i >= rect.w {
            break;
        }
        surface.put(rect.x + i, rect.y, ch, title_color);
    }

    let text_h = rect.h - 1;
    if text_h == 0 {
        return;
    }
    let gutter = gutter_width(frame, settings);
    let text_w = rect.w.saturating_sub(gutter).max(1);
    let text_x = rect.x + gutter.min(rect.w);
    frame.compute_bounds(text_w, text_h, tab);

    surface.fill(rect.x, rect.y + 1, rect.w, text_h, ' ', theme.normal);
    for &margin in &settings.margins {
        let col = gutter + margin;
        if col < rect.w {
            surface.fill(rect.x + col, rect.y + 1, 1, text_h, ' ', theme.margin);
        }
    }

    let len = frame.buffer.len();
    let mut line_no = 1 + (0..frame.start)
        .filter(|&i| frame.buffer.codepoint(i) == '\n' as u32)
        .count();
    let digits = gutter - settings.left_gutter - settings.right_gutter;

    let mut region = find_highlight(frame, &config.langs, frame.start);
    let mut i = frame.start;
    let mut row = 0;
    let mut col = 0;
    // Wrapped continuation rows get no line number.
    let mut line_head = frame.line_start(frame.start) == frame.start;

    while row < text_h {
        if line_head {
            let number = format!("{line_no:>digits$}");
            for (k, ch) in number.chars().enumerate() {
                surface.put(
                    rect.x + settings.left_gutter + k,
                    rect.y + 1 + row,
                    ch,
                    theme.line_number,
                );
            }
            line_head = false;
        }

        if i >= len {
            break;
        }
        if i >= region.ub {
            region = find_highlight(frame, &config.langs, i);
        }

        let Some(unit) = frame.buffer.get(i) else {
            break;
        };
        let cp = unit.codepoint;
        let under_cursor = active && i == frame.cursor;

        if cp == '\n' as u32 {
            if under_cursor {
                surface.put(text_x + col, rect.y + 1 + row, ' ', theme.cursor);
            }
            row += 1;
            col = 0;
            line_no += 1;
            line_head = true;
            i += 1;
            continue;
        }

        let width = if cp == '\t' as u32 {
            tab - col % tab
        } else {
            unit.to_char().width().unwrap_or(1).max(1)
        };
        if col + width > text_w && col > 0 {
            row += 1;
            col = 0;
            if row >= text_h {
                break;
            }
        }

        let mut color = if i >= region.lb && i < region.ub {
            kind_color(region.kind, theme)
        } else {
            theme.normal
        };
        if under_cursor {
            color = theme.cursor;
        }

        if cp == '\t' as u32 {
            for k in 0..width {
                surface.put(text_x + col + k, rect.y + 1 + row, ' ', color);
            }
        } else {
            surface.put(text_x + col, rect.y + 1 + row, unit.to_char(), color);
        }
        col += width;
        i += 1;
    }

    // Cursor sitting at end of buffer.
    if active && frame.cursor == len && row < text_h {
        surface.put(text_x + col, rect.y + 1 + row, ' ', theme.cursor);
    }
}

fn render_bar(ed: &Editor, surface: &mut dyn Surface) {
    let (w, h) = surface.size();
    if h == 0 {
        return;
    }
    let y = h - 1;
    let theme = &ed.config.theme;
    surface.fill(0, y, w, 1, ' ', theme.bar);

    let text = if ed.prompt.active {
        ed.prompt.data.to_string()
    } else {
        ed.message.clone()
    };
    let mut col = 0;
    for ch in text.chars() {
        if col >= w {
            break;
        }
        surface.put(col, y, ch, theme.bar);
        col += ch.width().unwrap_or(1).max(1);
    }

    if ed.prompt.active {
        let mut cursor_col = 0;
        for i in 0..ed.prompt.cursor.min(ed.prompt.data.len()) {
            let ch = ed.prompt.data.get(i).map(|u| u.to_char()).unwrap_or(' ');
            cursor_col += ch.width().unwrap_or(1).max(1);
        }
        if cursor_col < w {
            let ch = ed
                .prompt
                .data
                .get(ed.prompt.cursor)
                .map(|u| u.to_char())
                .unwrap_or(' ');
            surface.put(cursor_col, y, ch, theme.cursor);
        }
    }
}

/// In-memory surface for tests (and anything headless).
#[derive(Debug, Clone)]
pub struct MemorySurface {
    w: usize,
    h: usize,
    cells: Vec<(char, Color)>,
    pub presented: usize,
}

impl MemorySurface {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            cells: vec![(' ', Color::new(0, 0)); w * h],
            presented: 0,
        }
    }

    /// The characters of row `y` as a string, trailing spaces kept.
    pub fn row_text(&self, y: usize) -> String {
        (0..self.w).map(|x| self.cells[y * self.w + x].0).collect()
    }
}

impl Surface for MemorySurface {
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
        self.presented += 1;
    }
}
