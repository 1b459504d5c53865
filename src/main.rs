use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use framed_core::config::Config;
use framed_core::core::editor::{Editor, Io};
use framed_core::tui::{TerminalKeys, TerminalSurface};

#[derive(Parser, Debug)]
#[command(name = "framed", version, about = "A modal terminal text editor")]
struct Args {
    /// Create listed files that do not exist yet
    #[arg(short = 'c', long)]
    create: bool,

    /// Configuration directory (defaults to ~/.config/framed)
    #[arg(short = 'o', long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Files to open, one frame each
    files: Vec<PathBuf>,
}

#[cfg(unix)]
fn file_id(path: &Path) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    fs::metadata(path).ok().map(|m| (m.dev(), m.ino()))
}

#[cfg(not(unix))]
fn file_id(_path: &Path) -> Option<(u64, u64)> {
    None
}

/// Reject the same file given twice, comparing by filesystem identity so
/// hard links and differing spellings of one path are caught too.
fn check_duplicates(files: &[PathBuf]) -> Result<(), String> {
    for (i, a) in files.iter().enumerate() {
        for b in &files[i + 1..] {
            let same = match (file_id(a), file_id(b)) {
                (Some(x), Some(y)) => x == y,
                _ => a == b,
            };
            if same {
                return Err(format!("{} given more than once", a.display()));
            }
        }
    }
    Ok(())
}

fn run() -> Result<(), String> {
    let args = Args::parse();

    check_duplicates(&args.files)?;

    if args.create {
        for path in &args.files {
            if !path.exists() {
                fs::write(path, b"")
                    .map_err(|e| format!("Failed to create {}: {e}", path.display()))?;
            }
        }
    }

    let dir = args.config_dir.unwrap_or_else(Config::default_dir);
    let config = Config::load(&dir)?;
    let mut editor = Editor::with_files(config, &args.files)?;

    let mut surface =
        TerminalSurface::new().map_err(|e| format!("Failed to set up terminal: {e}"))?;
    let mut keys = TerminalKeys::new();
    {
        let mut io = Io {
            surface: &mut surface,
            keys: &mut keys,
        };
        editor.run(&mut io);
    }
    surface.restore();
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("framed: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_paths_rejected() {
        let files = vec![PathBuf::from("/no/such/a"), PathBuf::from("/no/such/a")];
        assert!(check_duplicates(&files).is_err());
    }

    #[test]
    fn test_hard_identity_detected_through_different_spellings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        fs::write(&path, "x").unwrap();
        let alias = dir.path().join(".").join("f.txt");
        assert!(check_duplicates(&[path, alias]).is_err());
    }

    #[test]
    fn test_distinct_files_pass() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "").unwrap();
        fs::write(&b, "").unwrap();
        assert!(check_duplicates(&[a, b]).is_ok());
    }
}
