use std::fs;
use std::path::Path;

use crate::render;

use super::editor::{is_writable, Editor, Io, HELP_TEXT, MAX_FRAMES};
use super::frame::Frame;
use super::input::KeyOutcome;
use super::prompt::PromptStatus;
use super::text::{TextBuffer, TextUnit};

/// Every action a key chord can trigger. Dispatch is a plain match; adding an
/// action means adding a variant, a bind and an arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    MoveStart,
    MoveEnd,
    WordLeft,
    WordRight,
    WriteMode,
    ExitWrite,
    DeleteFront,
    DeleteBack,
    DeleteWord,
    Newline,
    Tabulate,
    PairParen,
    PairBracket,
    PairBrace,
    PairQuote,
    Quit,
    Undo,
    Redo,
    NextFrame,
    PreviousFrame,
    NewFrame,
    KillFrame,
    Save,
    Focus,
    OpenFile,
    Search,
    ReverseSearch,
    Paste,
    CopyLine,
    CutLine,
    CopyLines,
    CutLines,
    Zoom,
    Goto,
    RecordMacro,
    ExecuteMacro,
    Help,
    PromptFail,
    PromptSuccess,
    PromptLeft,
    PromptRight,
    PromptStart,
    PromptEnd,
    PromptWordLeft,
    PromptWordRight,
    PromptDeleteFront,
    PromptDeleteBack,
    PromptDeleteWord,
    PromptPairParen,
    PromptPairBracket,
    PromptPairBrace,
    PromptPairQuote,
    Complete,
}

fn key(ch: char) -> TextUnit {
    TextUnit::from_char(ch)
}

fn ctrl(ch: char) -> TextUnit {
    TextUnit::from_char(((ch as u8) - b'a' + 1) as char)
}

fn esc() -> TextUnit {
    TextUnit::from_char('\u{1b}')
}

fn del() -> TextUnit {
    TextUnit::from_char('\u{7f}')
}

fn chord(text: &str) -> Vec<TextUnit> {
    text.chars().map(TextUnit::from_char).collect()
}

fn meta(ch: char) -> Vec<TextUnit> {
    vec![esc(), key(ch)]
}

/// xterm-style function key sequence: ESC O P/Q/R/S for F1..F4.
fn fn_key(n: u8) -> Vec<TextUnit> {
    vec![esc(), key('O'), key((b'O' + n) as char)]
}

pub fn install_base(ed: &mut Editor) {
    let input = &mut ed.input;
    input.unbind_all();
    input.bind(chord("h"), Command::MoveLeft);
    input.bind(chord("l"), Command::MoveRight);
    input.bind(chord("k"), Command::MoveUp);
    input.bind(chord("j"), Command::MoveDown);
    input.bind(chord("a"), Command::MoveStart);
    input.bind(chord("e"), Command::MoveEnd);
    input.bind(chord("b"), Command::WordLeft);
    input.bind(chord("f"), Command::WordRight);
    input.bind(chord("i"), Command::WriteMode);
    input.bind(chord("u"), Command::Undo);
    input.bind(vec![ctrl('r')], Command::Redo);
    input.bind(chord("n"), Command::NextFrame);
    input.bind(chord("p"), Command::PreviousFrame);
    input.bind(chord("m"), Command::Focus);
    input.bind(chord("v"), Command::Paste);
    input.bind(chord("c"), Command::CopyLine);
    input.bind(chord("d"), Command::CutLine);
    input.bind(chord("qc"), Command::CopyLines);
    input.bind(chord("qd"), Command::CutLines);
    input.bind(chord("z"), Command::Zoom);
    input.bind(chord("g"), Command::Goto);
    input.bind(chord("/"), Command::Search);
    input.bind(chord("?"), Command::ReverseSearch);
    input.bind(vec![ctrl('x'), ctrl('c')], Command::Quit);
    input.bind(vec![ctrl('n')], Command::NewFrame);
    input.bind(vec![ctrl('k')], Command::KillFrame);
    input.bind(vec![ctrl('s')], Command::Save);
    input.bind(vec![ctrl('f')], Command::OpenFile);
    input.bind(vec![ctrl('h')], Command::Help);
    input.bind(fn_key(3), Command::RecordMacro);
    input.bind(fn_key(4), Command::ExecuteMacro);
    input.organize();
    ed.write_input = false;
    ed.message = "Base".to_string();
}

pub fn install_write(ed: &mut Editor) {
    let input = &mut ed.input;
    input.unbind_all();
    input.bind(vec![ctrl('g')], Command::ExitWrite);
    input.bind(vec![ctrl('d')], Command::DeleteFront);
    input.bind(vec![del()], Command::DeleteBack);
    input.bind(vec![esc(), del()], Command::DeleteWord);
    input.bind(vec![key('\r')], Command::Newline);
    input.bind(vec![key('\t')], Command::Tabulate);
    input.bind(chord("("), Command::PairParen);
    input.bind(chord("["), Command::PairBracket);
    input.bind(chord("{"), Command::PairBrace);
    input.bind(chord("\""), Command::PairQuote);
    input.bind(fn_key(3), Command::RecordMacro);
    input.bind(fn_key(4), Command::ExecuteMacro);
    input.organize();
    ed.write_input = true;
    ed.message = "Write".to_string();
}

fn install_prompt_common(ed: &mut Editor) {
    let input = &mut ed.input;
    input.unbind_all();
    input.bind(vec![ctrl('g')], Command::PromptFail);
    input.bind(vec![key('\r')], Command::PromptSuccess);
    input.bind(vec![ctrl('b')], Command::PromptLeft);
    input.bind(vec![ctrl('f')], Command::PromptRight);
    input.bind(vec![ctrl('a')], Command::PromptStart);
    input.bind(vec![ctrl('e')], Command::PromptEnd);
    input.bind(meta('b'), Command::PromptWordLeft);
    input.bind(meta('f'), Command::PromptWordRight);
    input.bind(vec![ctrl('d')], Command::PromptDeleteFront);
    input.bind(vec![del()], Command::PromptDeleteBack);
    input.bind(vec![esc(), del()], Command::PromptDeleteWord);
    ed.write_input = false;
}

pub fn install_prompt(ed: &mut Editor) {
    install_prompt_common(ed);
    let input = &mut ed.input;
    input.bind(chord("("), Command::PromptPairParen);
    input.bind(chord("["), Command::PromptPairBracket);
    input.bind(chord("{"), Command::PromptPairBrace);
    input.bind(chord("\""), Command::PromptPairQuote);
    input.organize();
}

pub fn install_path_prompt(ed: &mut Editor) {
    install_prompt_common(ed);
    ed.input.bind(vec![key('\t')], Command::Complete);
    ed.input.organize();
}

pub fn install_number_prompt(ed: &mut Editor) {
    install_prompt_common(ed);
    ed.input.organize();
}

pub fn install_confirm(ed: &mut Editor) {
    let input = &mut ed.input;
    input.unbind_all();
    input.bind(chord("y"), Command::PromptSuccess);
    input.bind(chord("n"), Command::PromptFail);
    input.bind(vec![ctrl('g')], Command::PromptFail);
    input.organize();
    ed.write_input = false;
}

pub fn dispatch(ed: &mut Editor, cmd: Command, io: &mut Io) {
    match cmd {
        Command::MoveLeft => move_left(ed),
        Command::MoveRight => move_right(ed),
        Command::MoveUp => move_up(ed),
        Command::MoveDown => move_down(ed),
        Command::MoveStart => move_start(ed),
        Command::MoveEnd => move_end(ed),
        Command::WordLeft => word_left(ed),
        Command::WordRight => word_right(ed),
        Command::WriteMode => install_write(ed),
        Command::ExitWrite => {
            ed.frame_mut().break_history();
            install_base(ed);
        }
        Command::DeleteFront => delete_front(ed),
        Command::DeleteBack => delete_back(ed),
        Command::DeleteWord => delete_word(ed),
        Command::Newline => insert_text(ed, "\n", 1),
        Command::Tabulate => tabulate(ed),
        Command::PairParen => insert_text(ed, "()", 1),
        Command::PairBracket => insert_text(ed, "[]", 1),
        Command::PairBrace => insert_text(ed, "{}", 1),
        Command::PairQuote => insert_text(ed, "\"\"", 1),
        Command::Quit => quit(ed, io),
        Command::Undo => undo(ed),
        Command::Redo => redo(ed),
        Command::NextFrame => cycle_frame(ed, 1),
        Command::PreviousFrame => cycle_frame(ed, -1),
        Command::NewFrame => new_frame(ed),
        Command::KillFrame => kill_frame(ed, io),
        Command::Save => save(ed, io),
        Command::Focus => focus(ed),
        Command::OpenFile => open_file(ed, io),
        Command::Search => search(ed, io, false),
        Command::ReverseSearch => search(ed, io, true),
        Command::Paste => paste(ed),
        Command::CopyLine => copy_lines(ed, 1, false),
        Command::CutLine => copy_lines(ed, 1, true),
        Command::CopyLines => copy_lines_prompted(ed, io, false),
        Command::CutLines => copy_lines_prompted(ed, io, true),
        Command::Zoom => zoom(ed, io),
        Command::Goto => goto(ed, io),
        Command::RecordMacro => record_macro(ed),
        Command::ExecuteMacro => execute_macro(ed),
        Command::Help => help(ed),
        Command::PromptFail => ed.prompt.status = PromptStatus::Fail,
        Command::PromptSuccess => ed.prompt.status = PromptStatus::Success,
        Command::PromptLeft => ed.prompt.move_left(),
        Command::PromptRight => ed.prompt.move_right(),
        Command::PromptStart => ed.prompt.move_start(),
        Command::PromptEnd => ed.prompt.move_end(),
        Command::PromptWordLeft => ed.prompt.move_word_left(),
        Command::PromptWordRight => ed.prompt.move_word_right(),
        Command::PromptDeleteFront => prompt_delete_front(ed),
        Command::PromptDeleteBack => prompt_delete_back(ed),
        Command::PromptDeleteWord => prompt_delete_word(ed),
        Command::PromptPairParen => prompt_insert(ed, "()"),
        Command::PromptPairBracket => prompt_insert(ed, "[]"),
        Command::PromptPairBrace => prompt_insert(ed, "{}"),
        Command::PromptPairQuote => prompt_insert(ed, "\"\""),
        Command::Complete => complete_path(ed),
    }
}

// Frame motion. Every motion refreshes the saved visual column except the
// vertical ones, which restore it.

fn move_left(ed: &mut Editor) {
    let tab = ed.config.settings.tab_size;
    let f = ed.frame_mut();
    if f.cursor > 0 {
        f.cursor -= 1;
    }
    f.save_cursor(tab);
}

fn move_right(ed: &mut Editor) {
    let tab = ed.config.settings.tab_size;
    let f = ed.frame_mut();
    if f.cursor < f.buffer.len() {
        f.cursor += 1;
    }
    f.save_cursor(tab);
}

fn move_up(ed: &mut Editor) {
    let tab = ed.config.settings.tab_size;
    let f = ed.frame_mut();
    if f.cursor > 0 {
        f.cursor -= 1;
    }
    // Walk back onto the previous line's newline, then restore the column.
    while f.cursor > 0 && f.buffer.codepoint(f.cursor) != '\n' as u32 {
        f.cursor -= 1;
    }
    f.load_cursor(tab);
}

fn move_down(ed: &mut Editor) {
    let tab = ed.config.settings.tab_size;
    let f = ed.frame_mut();
    let len = f.buffer.len();
    while f.cursor < len && f.buffer.codepoint(f.cursor) != '\n' as u32 {
        f.cursor += 1;
    }
    if f.cursor < len {
        f.cursor += 1;
    }
    f.load_cursor(tab);
}

fn move_start(ed: &mut Editor) {
    let tab = ed.config.settings.tab_size;
    let f = ed.frame_mut();
    f.cursor = f.line_start(f.cursor);
    f.save_cursor(tab);
}

fn move_end(ed: &mut Editor) {
    let tab = ed.config.settings.tab_size;
    let f = ed.frame_mut();
    f.cursor = f.line_end(f.cursor);
    f.save_cursor(tab);
}

/// Offset of the start of the word run ending before `at`.
fn word_left_target(f: &Frame, at: usize) -> usize {
    let mut i = at.min(f.buffer.len());
    while i > 0 && !f.buffer.get(i - 1).is_some_and(|u| u.is_alnum()) {
        i -= 1;
    }
    while i > 0 && f.buffer.get(i - 1).is_some_and(|u| u.is_alnum()) {
        i -= 1;
    }
    i
}

fn word_left(ed: &mut Editor) {
    let tab = ed.config.settings.tab_size;
    let f = ed.frame_mut();
    f.cursor = word_left_target(f, f.cursor);
    f.save_cursor(tab);
}

fn word_right(ed: &mut Editor) {
    let tab = ed.config.settings.tab_size;
    let f = ed.frame_mut();
    let len = f.buffer.len();
    let mut i = f.cursor;
    while i < len && !f.buffer.get(i).is_some_and(|u| u.is_alnum()) {
        i += 1;
    }
    while i < len && f.buffer.get(i).is_some_and(|u| u.is_alnum()) {
        i += 1;
    }
    f.cursor = i;
    f.save_cursor(tab);
}

// Editing.

/// Insert `text` at the cursor and advance it by `advance` units. Pair
/// inserts advance one, leaving the cursor between the delimiters.
fn insert_text(ed: &mut Editor, text: &str, advance: usize) {
    let tab = ed.config.settings.tab_size;
    let f = ed.frame_mut();
    let at = f.cursor;
    f.write_str(text, at);
    f.cursor += advance;
    f.save_cursor(tab);
}

fn tabulate(ed: &mut Editor) {
    let (tab, spaces) = (ed.config.settings.tab_size, ed.config.settings.tab_spaces);
    let f = ed.frame_mut();
    let at = f.cursor;
    f.cursor = f.tabulate(at, tab, spaces);
    f.save_cursor(tab);
}

fn delete_front(ed: &mut Editor) {
    let f = ed.frame_mut();
    let at = f.cursor;
    if at < f.buffer.len() {
        f.erase(at, at + 1);
    }
}

fn delete_back(ed: &mut Editor) {
    let tab = ed.config.settings.tab_size;
    let f = ed.frame_mut();
    if f.cursor > 0 {
        let at = f.cursor;
        f.erase(at - 1, at);
        f.cursor -= 1;
        f.save_cursor(tab);
    }
}

fn delete_word(ed: &mut Editor) {
    let tab = ed.config.settings.tab_size;
    let f = ed.frame_mut();
    let lb = word_left_target(f, f.cursor);
    if lb < f.cursor {
        let ub = f.cursor;
        f.erase(lb, ub);
        f.cursor = lb;
        f.save_cursor(tab);
    }
}

fn undo(ed: &mut Editor) {
    let tab = ed.config.settings.tab_size;
    if ed.frame_mut().undo() {
        ed.frame_mut().save_cursor(tab);
        ed.info("Undo");
    } else {
        ed.info("Nothing to undo");
    }
}

fn redo(ed: &mut Editor) {
    let tab = ed.config.settings.tab_size;
    if ed.frame_mut().redo() {
        ed.frame_mut().save_cursor(tab);
        ed.info("Redo");
    } else {
        ed.info("Nothing to redo");
    }
}

// Frame management.

fn quit(ed: &mut Editor, io: &mut Io) {
    if ed.frames.iter().any(|f| f.dirty)
        && !run_confirm(ed, io, "Frames have unsaved changes, quit anyway? (y/n) ")
    {
        return;
    }
    ed.running = false;
}

fn cycle_frame(ed: &mut Editor, dir: isize) {
    let count = ed.frames.len();
    ed.focused = (ed.focused as isize + dir).rem_euclid(count as isize) as usize;
    let name = ed.frame().display_name();
    ed.info(name);
}

fn new_frame(ed: &mut Editor) {
    if ed.frames.len() >= MAX_FRAMES {
        ed.error(format!("Cannot open more than {MAX_FRAMES} frames"));
        return;
    }
    ed.frames.push(Frame::empty());
    ed.focused = ed.frames.len() - 1;
}

fn kill_frame(ed: &mut Editor, io: &mut Io) {
    if ed.frame().dirty && !run_confirm(ed, io, "Frame has unsaved changes, kill anyway? (y/n) ") {
        return;
    }
    ed.destroy_frame(ed.focused);
}

fn save(ed: &mut Editor, io: &mut Io) {
    if ed.frame().source.is_none() {
        let Some(resp) = run_prompt(ed, io, "Save as: ", PromptKind::Path) else {
            return;
        };
        let path = resp.to_string();
        if path.is_empty() {
            return;
        }
        ed.frame_mut().source = Some(path.into());
    }
    match ed.frame_mut().save() {
        Ok(()) => {
            let name = ed.frame().display_name();
            ed.info(format!("Wrote {name}"));
        }
        Err(e) => ed.error(e),
    }
}

/// Promote the focused frame to the master slot.
fn focus(ed: &mut Editor) {
    ed.frames.swap(0, ed.focused);
    ed.focused = 0;
}

fn open_file(ed: &mut Editor, io: &mut Io) {
    let Some(resp) = run_prompt(ed, io, "Open file: ", PromptKind::Path) else {
        return;
    };
    let path = resp.to_string();
    if path.is_empty() {
        return;
    }
    if let Err(e) = ed.open_path(Path::new(&path)) {
        ed.error(e);
    }
}

fn help(ed: &mut Editor) {
    if ed.frames.len() >= MAX_FRAMES {
        ed.error(format!("Cannot open more than {MAX_FRAMES} frames"));
        return;
    }
    ed.frames.push(Frame::from_str(HELP_TEXT));
    ed.focused = ed.frames.len() - 1;
}

// Clipboard.

fn paste(ed: &mut Editor) {
    if ed.clipboard.is_empty() {
        ed.info("Clipboard is empty");
        return;
    }
    let tab = ed.config.settings.tab_size;
    let units = ed.clipboard.units().to_vec();
    let f = ed.frame_mut();
    let at = f.cursor;
    f.write(&units, at);
    f.cursor += units.len();
    f.save_cursor(tab);
}

/// The `count` whole lines containing the cursor. Returns the content range
/// (no trailing newline) and the erase bound (with it).
fn line_block(f: &Frame, count: usize) -> (usize, usize, usize) {
    let lb = f.line_start(f.cursor);
    let mut end = f.line_end(f.cursor);
    for _ in 1..count {
        if end >= f.buffer.len() {
            break;
        }
        end = f.line_end(end + 1);
    }
    let erase_ub = if end < f.buffer.len() { end + 1 } else { end };
    (lb, end, erase_ub)
}

fn copy_lines(ed: &mut Editor, count: usize, cut: bool) {
    if count == 0 {
        return;
    }
    let tab = ed.config.settings.tab_size;
    let (lb, content_ub, erase_ub) = line_block(ed.frame(), count);
    ed.clipboard = ed.frame().buffer.substring(lb, content_ub);
    if cut {
        let f = ed.frame_mut();
        f.erase(lb, erase_ub);
        f.cursor = lb.min(f.buffer.len());
        f.save_cursor(tab);
        ed.info(if count == 1 {
            "Cut line".to_string()
        } else {
            format!("Cut {count} lines")
        });
    } else {
        ed.info(if count == 1 {
            "Copied line".to_string()
        } else {
            format!("Copied {count} lines")
        });
    }
}

fn copy_lines_prompted(ed: &mut Editor, io: &mut Io, cut: bool) {
    let label = if cut {
        "Cut how many lines: "
    } else {
        "Copy how many lines: "
    };
    let Some(n) = run_number(ed, io, label) else {
        return;
    };
    copy_lines(ed, n, cut);
}

// View.

fn zoom(ed: &mut Editor, io: &mut Io) {
    let (w, h) = io.surface.size();
    if w == 0 || h < 2 {
        return;
    }
    let rect = render::arrange_frame(ed.focused, ed.frames.len(), w, h, &ed.config.settings);
    let gutter = render::gutter_width(ed.frame(), &ed.config.settings);
    let tab = ed.config.settings.tab_size;
    let text_w = rect.w.saturating_sub(gutter).max(1);
    let text_h = rect.h.saturating_sub(1).max(1);
    let f = ed.frame_mut();
    // Rebuild the window with half the height so the cursor lands in the
    // upper half, which centers it once the full height is drawn.
    f.start = 0;
    f.compute_bounds(text_w, (text_h / 2).max(1), tab);
}

fn goto(ed: &mut Editor, io: &mut Io) {
    let Some(line) = run_number(ed, io, "Goto line: ") else {
        return;
    };
    if line == 0 {
        return;
    }
    let tab = ed.config.settings.tab_size;
    let f = ed.frame_mut();
    f.cursor = 0;
    for _ in 1..line {
        let end = f.line_end(f.cursor);
        if end >= f.buffer.len() {
            break;
        }
        f.cursor = end + 1;
    }
    f.save_cursor(tab);
}

// Search.

fn search(ed: &mut Editor, io: &mut Io, reverse: bool) {
    let label = if reverse {
        "Search backward: "
    } else {
        "Search: "
    };
    let Some(needle) = run_prompt(ed, io, label, PromptKind::Text) else {
        return;
    };
    let found = if reverse {
        search_backward(ed, &needle)
    } else {
        search_forward(ed, &needle)
    };
    if !found {
        ed.info("Didn't find search string");
    }
}

fn search_forward(ed: &mut Editor, needle: &TextBuffer) -> bool {
    let tab = ed.config.settings.tab_size;
    let f = ed.frame_mut();
    let n = needle.len();
    let len = f.buffer.len();
    if n == 0 || n > len {
        return false;
    }
    let mut i = f.cursor + 1;
    while i + n <= len {
        let mut j = 0;
        while j < n && f.buffer.codepoint(i + j) == needle.codepoint(j) {
            j += 1;
        }
        if j == n {
            f.cursor = i;
            f.save_cursor(tab);
            return true;
        }
        i += 1;
    }
    false
}

fn search_backward(ed: &mut Editor, needle: &TextBuffer) -> bool {
    let tab = ed.config.settings.tab_size;
    let f = ed.frame_mut();
    let n = needle.len();
    let len = f.buffer.len();
    if n == 0 || n > len || f.cursor == 0 {
        return false;
    }
    // Candidate matches end strictly before the cursor so repeated searches
    // keep moving.
    let mut i = (f.cursor - 1).min(len - n);
    loop {
        let mut j = 0;
        while j < n && f.buffer.codepoint(i + j) == needle.codepoint(j) {
            j += 1;
        }
        if j == n {
            f.cursor = i;
            f.save_cursor(tab);
            return true;
        }
        if i == 0 {
            return false;
        }
        i -= 1;
    }
}

// Macros.

fn record_macro(ed: &mut Editor) {
    if ed.input.is_recording() {
        ed.info("Already recording");
    } else {
        ed.input.record_macro();
        ed.info("Recording macro");
    }
}

fn execute_macro(ed: &mut Editor) {
    if ed.input.is_recording() {
        ed.input.stop_recording();
        ed.info("Macro recorded");
    } else {
        ed.input.execute_macro();
        ed.info("Executing macro");
    }
}

// Prompt actions.

fn prompt_insert(ed: &mut Editor, pair: &str) {
    let at = ed.prompt.cursor;
    ed.prompt.write_str(pair, at);
    ed.prompt.cursor += 1;
}

fn prompt_delete_front(ed: &mut Editor) {
    let at = ed.prompt.cursor;
    if at < ed.prompt.data.len() {
        ed.prompt.erase(at, at + 1);
    }
}

fn prompt_delete_back(ed: &mut Editor) {
    let at = ed.prompt.cursor;
    if at > ed.prompt.start {
        ed.prompt.erase(at - 1, at);
        ed.prompt.cursor -= 1;
    }
}

fn prompt_delete_word(ed: &mut Editor) {
    let ub = ed.prompt.cursor;
    ed.prompt.move_word_left();
    let lb = ed.prompt.cursor;
    if lb < ub {
        ed.prompt.erase(lb, ub);
    }
}

/// Filename completion for path prompts: extend the input by the longest
/// common prefix of the directory entries matching it; a unique directory
/// match also gains its trailing slash.
fn complete_path(ed: &mut Editor) {
    let partial = ed.prompt.response().to_string();
    let (dir, stem) = match partial.rfind('/') {
        Some(i) => (&partial[..=i], &partial[i + 1..]),
        None => ("./", partial.as_str()),
    };

    let Ok(entries) = fs::read_dir(if dir.is_empty() { "./" } else { dir }) else {
        return;
    };
    let mut matches: Vec<(String, bool)> = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(stem) {
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            matches.push((name, is_dir));
        }
    }
    if matches.is_empty() {
        return;
    }

    let mut common = matches[0].0.clone();
    for (name, _) in &matches[1..] {
        let shared = common
            .chars()
            .zip(name.chars())
            .take_while(|(a, b)| a == b)
            .count();
        common.truncate(common.char_indices().nth(shared).map_or(common.len(), |(i, _)| i));
    }

    let mut extension = common[stem.len()..].to_string();
    if matches.len() == 1 && matches[0].1 {
        extension.push('/');
    }
    if !extension.is_empty() {
        let at = ed.prompt.data.len();
        ed.prompt.write_str(&extension, at);
        ed.prompt.cursor = ed.prompt.data.len();
    }
}

// Prompt sub-loops. These block inside dispatch, reusing the same render and
// read cycle as the main loop, and tear down to base mode when done.

enum PromptKind {
    Text,
    Path,
    Confirm,
    Number,
}

fn run_prompt(ed: &mut Editor, io: &mut Io, label: &str, kind: PromptKind) -> Option<TextBuffer> {
    match kind {
        PromptKind::Text => install_prompt(ed),
        PromptKind::Path => install_path_prompt(ed),
        PromptKind::Number => install_number_prompt(ed),
        PromptKind::Confirm => install_confirm(ed),
    }
    ed.prompt.begin(label);

    while ed.prompt.status == PromptStatus::None {
        render::render_editor(ed, io.surface);
        io.surface.present();
        match ed.input.read_key(io.keys) {
            KeyOutcome::Command(cmd) => dispatch(ed, cmd, io),
            KeyOutcome::Pending => {}
            KeyOutcome::Literal(unit) => {
                let accept = match kind {
                    PromptKind::Confirm => false,
                    PromptKind::Number => unit.to_char().is_ascii_digit(),
                    _ => is_writable(unit) && unit.codepoint != '\t' as u32,
                };
                if accept {
                    let at = ed.prompt.cursor;
                    ed.prompt.write_unit(unit, at);
                    ed.prompt.cursor += 1;
                }
            }
        }
    }

    let status = ed.prompt.status;
    let response = ed.prompt.response();
    ed.prompt.end();
    install_base(ed);
    (status == PromptStatus::Success).then_some(response)
}

fn run_confirm(ed: &mut Editor, io: &mut Io, label: &str) -> bool {
    run_prompt(ed, io, label, PromptKind::Confirm).is_some()
}

fn run_number(ed: &mut Editor, io: &mut Io, label: &str) -> Option<usize> {
    let resp = run_prompt(ed, io, label, PromptKind::Number)?.to_string();
    match resp.parse::<usize>() {
        Ok(n) => Some(n),
        Err(_) => {
            ed.error(format!("Not a number: {resp}"));
            None
        }
    }
}
