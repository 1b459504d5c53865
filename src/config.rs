use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A 256-color foreground/background pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub fg: u8,
    pub bg: u8,
}

impl Color {
    pub const fn new(fg: u8, bg: u8) -> Self {
        Self { fg, bg }
    }
}

/// Layout and editing options, loaded from `editor.json`.
///
/// When adding a field: give it `#[serde(default = "...")]`, a default
/// function, and add it to the `Default` impl. `Config::load` rewrites the
/// file after loading, so existing installs pick the new field up with its
/// default value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Fraction of the screen width given to the master frame: numer/denom.
    #[serde(default = "default_master_numer")]
    pub master_numer: u32,
    #[serde(default = "default_master_denom")]
    pub master_denom: u32,

    /// Blank columns left and right of the line-number gutter.
    #[serde(default = "default_left_gutter")]
    pub left_gutter: usize,
    #[serde(default = "default_right_gutter")]
    pub right_gutter: usize,

    /// Columns to draw margin indicators at (e.g. [80]).
    #[serde(default = "default_margins")]
    pub margins: Vec<usize>,

    /// Width of a tab stop.
    #[serde(default = "default_tab_size")]
    pub tab_size: usize,

    /// Insert spaces up to the next tab stop instead of a literal tab.
    #[serde(default = "default_tab_spaces")]
    pub tab_spaces: bool,
}

fn default_master_numer() -> u32 {
    3
}

fn default_master_denom() -> u32 {
    5
}

fn default_left_gutter() -> usize {
    1
}

fn default_right_gutter() -> usize {
    1
}

fn default_margins() -> Vec<usize> {
    vec![80]
}

fn default_tab_size() -> usize {
    4
}

fn default_tab_spaces() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            master_numer: default_master_numer(),
            master_denom: default_master_denom(),
            left_gutter: default_left_gutter(),
            right_gutter: default_right_gutter(),
            margins: default_margins(),
            tab_size: default_tab_size(),
            tab_spaces: default_tab_spaces(),
        }
    }
}

/// Color theme, loaded from `theme.json`. Defaults are a gruvbox-ish dark
/// palette on the 256-color cube.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_normal")]
    pub normal: Color,
    #[serde(default = "default_bar")]
    pub bar: Color,
    #[serde(default = "default_frame_title")]
    pub frame_title: Color,
    #[serde(default = "default_active_title")]
    pub active_title: Color,
    #[serde(default = "default_line_number")]
    pub line_number: Color,
    #[serde(default = "default_margin")]
    pub margin: Color,
    #[serde(default = "default_cursor")]
    pub cursor: Color,
    #[serde(default = "default_comment")]
    pub comment: Color,
    #[serde(default = "default_macro")]
    pub macro_: Color,
    #[serde(default = "default_special")]
    pub special: Color,
    #[serde(default = "default_keyword")]
    pub keyword: Color,
    #[serde(default = "default_primitive")]
    pub primitive: Color,
    #[serde(default = "default_type")]
    pub type_: Color,
    #[serde(default = "default_emphasis")]
    pub emphasis: Color,
    #[serde(default = "default_string")]
    pub string: Color,
    #[serde(default = "default_number")]
    pub number: Color,
}

fn default_normal() -> Color {
    Color::new(223, 235)
}

fn default_bar() -> Color {
    Color::new(235, 246)
}

fn default_frame_title() -> Color {
    Color::new(246, 237)
}

fn default_active_title() -> Color {
    Color::new(235, 214)
}

fn default_line_number() -> Color {
    Color::new(245, 234)
}

fn default_margin() -> Color {
    Color::new(245, 236)
}

fn default_cursor() -> Color {
    Color::new(235, 223)
}

fn default_comment() -> Color {
    Color::new(245, 235)
}

fn default_macro() -> Color {
    Color::new(142, 235)
}

fn default_special() -> Color {
    Color::new(208, 235)
}

fn default_keyword() -> Color {
    Color::new(167, 235)
}

fn default_primitive() -> Color {
    Color::new(132, 235)
}

fn default_type() -> Color {
    Color::new(214, 235)
}

fn default_emphasis() -> Color {
    Color::new(109, 235)
}

fn default_string() -> Color {
    Color::new(106, 235)
}

fn default_number() -> Color {
    Color::new(175, 235)
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            normal: default_normal(),
            bar: default_bar(),
            frame_title: default_frame_title(),
            active_title: default_active_title(),
            line_number: default_line_number(),
            margin: default_margin(),
            cursor: default_cursor(),
            comment: default_comment(),
            macro_: default_macro(),
            special: default_special(),
            keyword: default_keyword(),
            primitive: default_primitive(),
            type_: default_type(),
            emphasis: default_emphasis(),
            string: default_string(),
            number: default_number(),
        }
    }
}

/// Keyword and primitive-type word lists for one language mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LangWords {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub primitives: Vec<String>,
}

impl LangWords {
    fn new(keywords: &[&str], primitives: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            primitives: primitives.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Per-language word lists, loaded from `lang.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Languages {
    #[serde(default = "default_c_words")]
    pub c: LangWords,
    #[serde(default = "default_cpp_words")]
    pub cpp: LangWords,
    #[serde(default = "default_sh_words")]
    pub sh: LangWords,
    #[serde(default = "default_js_words")]
    pub js: LangWords,
}

fn default_c_words() -> LangWords {
    LangWords::new(
        &[
            "break", "case", "const", "continue", "default", "do", "else", "enum", "extern",
            "for", "goto", "if", "inline", "return", "sizeof", "static", "struct", "switch",
            "typedef", "union", "volatile", "while",
        ],
        &[
            "char", "double", "float", "int", "long", "short", "signed", "unsigned", "void",
            "bool",
        ],
    )
}

fn default_cpp_words() -> LangWords {
    let mut words = default_c_words();
    for kw in [
        "catch",
        "class",
        "constexpr",
        "delete",
        "final",
        "namespace",
        "new",
        "noexcept",
        "nullptr",
        "operator",
        "override",
        "private",
        "protected",
        "public",
        "template",
        "this",
        "throw",
        "try",
        "typename",
        "using",
        "virtual",
    ] {
        words.keywords.push(kw.to_string());
    }
    words.primitives.push("auto".to_string());
    words.primitives.push("wchar_t".to_string());
    words
}

fn default_sh_words() -> LangWords {
    LangWords::new(
        &[
            "case", "do", "done", "elif", "else", "esac", "fi", "for", "function", "if", "in",
            "return", "then", "until", "while",
        ],
        &["declare", "export", "local", "readonly"],
    )
}

fn default_js_words() -> LangWords {
    LangWords::new(
        &[
            "async", "await", "break", "case", "catch", "class", "continue", "default",
            "delete", "do", "else", "export", "extends", "finally", "for", "function", "if",
            "import", "in", "instanceof", "new", "of", "return", "switch", "throw", "try",
            "typeof", "while", "yield",
        ],
        &["const", "let", "var", "null", "undefined", "true", "false"],
    )
}

impl Default for Languages {
    fn default() -> Self {
        Languages {
            c: default_c_words(),
            cpp: default_cpp_words(),
            sh: default_sh_words(),
            js: default_js_words(),
        }
    }
}

/// Everything loaded at startup.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings: Settings,
    pub theme: Theme,
    pub langs: Languages,
}

impl Config {
    /// Default config directory: `~/.config/framed`.
    pub fn default_dir() -> PathBuf {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_default()
            .join(".config")
            .join("framed")
    }

    /// Load all three config files from `dir`. A missing file is created from
    /// defaults; a file that exists but fails to parse is an error, which the
    /// caller treats as fatal. Every file is written back after loading so
    /// fields added in newer versions get persisted with their defaults.
    pub fn load(dir: &Path) -> Result<Self, String> {
        fs::create_dir_all(dir)
            .map_err(|e| format!("Cannot create config directory {}: {e}", dir.display()))?;

        Ok(Config {
            settings: load_file(&dir.join("editor.json"))?,
            theme: load_file(&dir.join("theme.json"))?,
            langs: load_file(&dir.join("lang.json"))?,
        })
    }
}

fn load_file<T>(path: &Path) -> Result<T, String>
where
    T: Default + Serialize + for<'de> Deserialize<'de>,
{
    let value = match fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text)
            .map_err(|e| format!("Malformed config {}: {e}", path.display()))?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => T::default(),
        Err(e) => return Err(format!("Cannot read config {}: {e}", path.display())),
    };

    // Best effort: persist defaults for anything the file was missing.
    if let Ok(text) = serde_json::to_string_pretty(&value) {
        let _ = fs::write(path, text);
    }

    Ok(value)
}
