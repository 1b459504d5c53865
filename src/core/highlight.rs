use std::path::Path;

use crate::config::{LangWords, Languages};

use super::frame::Frame;
use super::text::TextBuffer;

/// Language mode, picked from the source file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    C,
    Cpp,
    Sh,
    Js,
}

impl Lang {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "c" => Some(Self::C),
            "h" | "hh" | "hpp" | "hxx" | "cc" | "cpp" | "cxx" | "c++" => Some(Self::Cpp),
            "sh" | "bash" | "zsh" => Some(Self::Sh),
            "js" | "mjs" | "cjs" | "jsx" => Some(Self::Js),
            _ => None,
        }
    }

    fn line_comment(self) -> &'static str {
        match self {
            Self::C | Self::Cpp | Self::Js => "//",
            Self::Sh => "#",
        }
    }

    fn block_comment(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::C | Self::Cpp | Self::Js => Some(("/*", "*/")),
            Self::Sh => None,
        }
    }

    /// True when `#` at the start of a line opens a preprocessor directive.
    fn has_preprocessor(self) -> bool {
        matches!(self, Self::C | Self::Cpp)
    }

    fn special_chars(self) -> &'static str {
        match self {
            Self::C | Self::Cpp => "+-*/%=<>!&|^~?:;,.()[]{}",
            Self::Sh => "$=|&;<>()[]{}!",
            Self::Js => "+-*/%=<>!&|^~?:;,.()[]{}",
        }
    }

    fn quote_chars(self) -> &'static str {
        match self {
            Self::C | Self::Cpp => "\"'",
            Self::Sh => "\"'",
            Self::Js => "\"'`",
        }
    }

    fn words(self, langs: &Languages) -> &LangWords {
        match self {
            Self::C => &langs.c,
            Self::Cpp => &langs.cpp,
            Self::Sh => &langs.sh,
            Self::Js => &langs.js,
        }
    }
}

/// What a highlighted region should be painted as. The renderer maps this to
/// a theme color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightKind {
    Plain,
    Comment,
    Macro,
    Special,
    Keyword,
    Primitive,
    Type,
    Emphasis,
    String,
    Number,
}

/// A half-open highlighted span. Regions are re-derived on every paint by
/// rescanning from an offset; they are never cached, since any edit would
/// invalidate them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub lb: usize,
    pub ub: usize,
    pub kind: HighlightKind,
}

impl Region {
    fn empty(at: usize) -> Self {
        Self {
            lb: at,
            ub: at,
            kind: HighlightKind::Plain,
        }
    }
}

/// Find the next highlighted region at or after `from`. Frames with no source
/// path get no highlighting: the empty end-of-buffer region is returned and
/// the render loop paints everything plain. Callers walk the buffer by
/// re-invoking with the previous region's upper bound.
pub fn find_highlight(frame: &Frame, langs: &Languages, from: usize) -> Region {
    let lang = match frame.source.as_deref().and_then(Lang::from_path) {
        Some(lang) => lang,
        None => return Region::empty(frame.buffer.len()),
    };
    scan(&frame.buffer, lang, lang.words(langs), from)
}

fn scan(buf: &TextBuffer, lang: Lang, words: &LangWords, from: usize) -> Region {
    let len = buf.len();
    let mut i = from;

    while i < len {
        let ch = char_at(buf, i);

        if matches_str(buf, i, lang.line_comment()) {
            return Region {
                lb: i,
                ub: line_end(buf, i),
                kind: HighlightKind::Comment,
            };
        }

        if let Some((open, close)) = lang.block_comment() {
            if matches_str(buf, i, open) {
                let mut j = i + open.chars().count();
                while j < len && !matches_str(buf, j, close) {
                    j += 1;
                }
                let ub = if j < len {
                    j + close.chars().count()
                } else {
                    len
                };
                return Region {
                    lb: i,
                    ub,
                    kind: HighlightKind::Comment,
                };
            }
        }

        if ch.is_ascii_digit() && !is_word_char(prev_char(buf, i)) {
            let mut j = i + 1;
            while j < len {
                let c = char_at(buf, j);
                if c.is_alphanumeric() || c == '.' || c == '_' {
                    j += 1;
                } else {
                    break;
                }
            }
            return Region {
                lb: i,
                ub: j,
                kind: HighlightKind::Number,
            };
        }

        if lang.has_preprocessor() && ch == '#' && at_line_start(buf, i) {
            return Region {
                lb: i,
                ub: line_end(buf, i),
                kind: HighlightKind::Macro,
            };
        }

        if lang.special_chars().contains(ch) {
            let mut j = i + 1;
            while j < len && lang.special_chars().contains(char_at(buf, j)) {
                j += 1;
            }
            return Region {
                lb: i,
                ub: j,
                kind: HighlightKind::Special,
            };
        }

        if is_word_initial(ch) {
            let mut j = i + 1;
            while j < len && is_word_char(char_at(buf, j)) {
                j += 1;
            }
            if let Some(kind) = classify_word(buf, i, j, lang, words) {
                return Region {
                    lb: i,
                    ub: j,
                    kind,
                };
            }
            i = j;
            continue;
        }

        if lang.quote_chars().contains(ch) {
            let mut j = i + 1;
            while j < len {
                let c = char_at(buf, j);
                if c == '\\' {
                    j += 2;
                    continue;
                }
                if c == ch {
                    j += 1;
                    break;
                }
                j += 1;
            }
            return Region {
                lb: i,
                ub: j.min(len),
                kind: HighlightKind::String,
            };
        }

        i += 1;
    }

    Region::empty(len)
}

/// Word sub-category heuristics, in priority order. None means the word is
/// plain and the scan continues past it.
fn classify_word(
    buf: &TextBuffer,
    lb: usize,
    ub: usize,
    lang: Lang,
    words: &LangWords,
) -> Option<HighlightKind> {
    let word: String = (lb..ub).map(|i| char_at(buf, i)).collect();

    if words.keywords.iter().any(|k| k == &word) {
        return Some(HighlightKind::Keyword);
    }
    if words.primitives.iter().any(|p| p == &word) {
        return Some(HighlightKind::Primitive);
    }
    if word.ends_with("_t") {
        return Some(HighlightKind::Type);
    }
    if word.chars().any(|c| c.is_uppercase()) && !word.chars().any(|c| c.is_lowercase()) {
        return Some(HighlightKind::Macro);
    }
    if followed_by_call(buf, ub, lang) {
        return Some(HighlightKind::Emphasis);
    }
    if word.chars().next().is_some_and(|c| c.is_uppercase()) {
        return Some(HighlightKind::Type);
    }

    None
}

/// Is the word ending at `from` followed by `(`? Skips whitespace, and for
/// C++ a balanced `<...>` template-argument span.
fn followed_by_call(buf: &TextBuffer, from: usize, lang: Lang) -> bool {
    let mut i = from;
    let len = buf.len();

    if lang == Lang::Cpp && i < len && char_at(buf, i) == '<' {
        let mut depth = 1;
        i += 1;
        while i < len && depth > 0 {
            match char_at(buf, i) {
                '<' => depth += 1,
                '>' => depth -= 1,
                // A template argument list does not span lines in practice;
                // bail rather than scan the whole buffer.
                '\n' | ';' => return false,
                _ => {}
            }
            i += 1;
        }
        if depth > 0 {
            return false;
        }
    }

    while i < len && char_at(buf, i).is_whitespace() && char_at(buf, i) != '\n' {
        i += 1;
    }
    i < len && char_at(buf, i) == '('
}

fn char_at(buf: &TextBuffer, i: usize) -> char {
    buf.get(i).map_or('\0', |u| u.to_char())
}

fn prev_char(buf: &TextBuffer, i: usize) -> char {
    if i == 0 {
        '\0'
    } else {
        char_at(buf, i - 1)
    }
}

fn is_word_initial(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn matches_str(buf: &TextBuffer, at: usize, needle: &str) -> bool {
    let mut i = at;
    for ch in needle.chars() {
        if char_at(buf, i) != ch {
            return false;
        }
        i += 1;
    }
    true
}

fn line_end(buf: &TextBuffer, at: usize) -> usize {
    let mut i = at;
    while i < buf.len() && char_at(buf, i) != '\n' {
        i += 1;
    }
    i
}

fn at_line_start(buf: &TextBuffer, at: usize) -> bool {
    at == 0 || char_at(buf, at - 1) == '\n'
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn c_frame(text: &str) -> Frame {
        let mut f = Frame::from_str(text);
        f.source = Some(PathBuf::from("test.c"));
        f
    }

    fn cpp_frame(text: &str) -> Frame {
        let mut f = Frame::from_str(text);
        f.source = Some(PathBuf::from("test.cc"));
        f
    }

    #[test]
    fn test_no_source_no_highlight() {
        let f = Frame::from_str("if (x) {}");
        let langs = Languages::default();
        let r = find_highlight(&f, &langs, 0);
        assert_eq!(r.lb, f.buffer.len());
        assert_eq!(r.ub, f.buffer.len());
        assert_eq!(r.kind, HighlightKind::Plain);
    }

    #[test]
    fn test_keyword_scenario() {
        // C mode with keywords ["if", "else"]: "if(x)" from 0 -> [0,2) keyword.
        let f = c_frame("if(x)");
        let mut langs = Languages::default();
        langs.c.keywords = vec!["if".to_string(), "else".to_string()];
        let r = find_highlight(&f, &langs, 0);
        assert_eq!((r.lb, r.ub), (0, 2));
        assert_eq!(r.kind, HighlightKind::Keyword);
    }

    #[test]
    fn test_walk_forward_from_upper_bound() {
        let f = c_frame("int x = 10;");
        let langs = Languages::default();
        let first = find_highlight(&f, &langs, 0);
        assert_eq!(first.kind, HighlightKind::Primitive);
        assert_eq!((first.lb, first.ub), (0, 3));

        let second = find_highlight(&f, &langs, first.ub);
        assert_eq!(second.kind, HighlightKind::Special); // '='
        let third = find_highlight(&f, &langs, second.ub);
        assert_eq!(third.kind, HighlightKind::Number);
        assert_eq!((third.lb, third.ub), (8, 10));
    }

    #[test]
    fn test_line_comment_to_eol() {
        let f = c_frame("x = 1; // trailing\ny");
        let langs = Languages::default();
        let r = find_highlight(&f, &langs, 7);
        assert_eq!(r.kind, HighlightKind::Comment);
        assert_eq!(r.lb, 7);
        assert_eq!(char_at(&f.buffer, r.ub), '\n');
    }

    #[test]
    fn test_block_comment_spans_lines() {
        let f = c_frame("/* a\nb */ x");
        let langs = Languages::default();
        let r = find_highlight(&f, &langs, 0);
        assert_eq!(r.kind, HighlightKind::Comment);
        assert_eq!((r.lb, r.ub), (0, 9));
    }

    #[test]
    fn test_unterminated_block_comment_to_end() {
        let f = c_frame("/* open");
        let langs = Languages::default();
        let r = find_highlight(&f, &langs, 0);
        assert_eq!(r.kind, HighlightKind::Comment);
        assert_eq!(r.ub, f.buffer.len());
    }

    #[test]
    fn test_preprocessor_line() {
        let f = c_frame("#include <stdio.h>\nint x;");
        let langs = Languages::default();
        let r = find_highlight(&f, &langs, 0);
        assert_eq!(r.kind, HighlightKind::Macro);
        assert_eq!((r.lb, r.ub), (0, 18));
    }

    #[test]
    fn test_shell_hash_is_comment_not_preprocessor() {
        let mut f = Frame::from_str("# comment\nls");
        f.source = Some(PathBuf::from("run.sh"));
        let langs = Languages::default();
        let r = find_highlight(&f, &langs, 0);
        assert_eq!(r.kind, HighlightKind::Comment);
    }

    #[test]
    fn test_string_with_escape() {
        let f = c_frame(r#"x = "a\"b";"#);
        let langs = Languages::default();
        let r = find_highlight(&f, &langs, 4);
        assert_eq!(r.kind, HighlightKind::String);
        assert_eq!((r.lb, r.ub), (4, 10));
    }

    #[test]
    fn test_trailing_t_is_type() {
        let f = c_frame("size_t n;");
        let langs = Languages::default();
        let r = find_highlight(&f, &langs, 0);
        assert_eq!(r.kind, HighlightKind::Type);
        assert_eq!((r.lb, r.ub), (0, 6));
    }

    #[test]
    fn test_all_uppercase_is_macro() {
        let f = c_frame("MAX_LEN + 1");
        let langs = Languages::default();
        let r = find_highlight(&f, &langs, 0);
        assert_eq!(r.kind, HighlightKind::Macro);
        assert_eq!((r.lb, r.ub), (0, 7));
    }

    #[test]
    fn test_call_is_emphasis() {
        let f = c_frame("foo (1)");
        let langs = Languages::default();
        let r = find_highlight(&f, &langs, 0);
        assert_eq!(r.kind, HighlightKind::Emphasis);
        assert_eq!((r.lb, r.ub), (0, 3));
    }

    #[test]
    fn test_cpp_template_call_is_emphasis() {
        let f = cpp_frame("make<pair<a, b>>(x)");
        let langs = Languages::default();
        let r = find_highlight(&f, &langs, 0);
        assert_eq!(r.kind, HighlightKind::Emphasis);
        assert_eq!((r.lb, r.ub), (0, 4));
    }

    #[test]
    fn test_c_angle_bracket_is_not_template() {
        // In C mode "a<b" must not make `a` a call even if a '(' follows.
        let f = c_frame("a<b (x)");
        let langs = Languages::default();
        let r = find_highlight(&f, &langs, 0);
        // 'a' is plain, so the first region is the '<' special run.
        assert_eq!(r.kind, HighlightKind::Special);
        assert_eq!(r.lb, 1);
    }

    #[test]
    fn test_leading_uppercase_is_type() {
        let f = c_frame("Widget w;");
        let langs = Languages::default();
        let r = find_highlight(&f, &langs, 0);
        assert_eq!(r.kind, HighlightKind::Type);
        assert_eq!((r.lb, r.ub), (0, 6));
    }

    #[test]
    fn test_plain_word_skipped() {
        let f = c_frame("abc def = 1");
        let langs = Languages::default();
        let r = find_highlight(&f, &langs, 0);
        // Both words are plain; the first region is the '='.
        assert_eq!(r.kind, HighlightKind::Special);
        assert_eq!(r.lb, 8);
    }

    #[test]
    fn test_digits_inside_word_not_number() {
        let f = c_frame("abc123 9x");
        let langs = Languages::default();
        let r = find_highlight(&f, &langs, 0);
        assert_eq!(r.kind, HighlightKind::Number);
        assert_eq!(r.lb, 7);
    }
}
