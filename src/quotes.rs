//! Quote normalization for `.tex` sources.
//!
//! Typographic quotes are folded to ASCII first, then every `"…"` pair becomes
//! a TeX ``…'' pair. Changed files keep a `.bak` copy of the original.
use crate::cli::FixQuotesArgs;
use crate::config::WORKSPACE_DIR_REL;
use crate::util::{collect_files_filtered, display_path};
use anyhow::{Context, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

struct QuotePatterns {
    smart_double: Regex,
    smart_single: Regex,
    double_pair: Regex,
}

fn patterns() -> &'static QuotePatterns {
    static PATTERNS: OnceLock<QuotePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| QuotePatterns {
        smart_double: Regex::new("[\u{201C}\u{201D}\u{201E}\u{201F}]")
            .expect("regex for typographic double quotes"),
        smart_single: Regex::new("[\u{2018}\u{2019}\u{201A}\u{201B}]")
            .expect("regex for typographic single quotes"),
        double_pair: Regex::new(r#"(?s)"(.*?)""#).expect("regex for straight quote pairs"),
    })
}

/// Rewrite quotes in `text` to TeX conventions.
pub fn normalize_text(text: &str) -> String {
    let patterns = patterns();
    let text = patterns.smart_double.replace_all(text, "\"");
    let text = patterns.smart_single.replace_all(&text, "'");
    patterns
        .double_pair
        .replace_all(&text, "``${1}''")
        .into_owned()
}

/// Normalize one file in place, backing up the original. Returns whether it
/// changed.
pub fn process_file(path: &Path) -> Result<bool> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let normalized = normalize_text(&text);
    if normalized == text {
        return Ok(false);
    }
    let backup = backup_path(path);
    fs::write(&backup, text.as_bytes()).with_context(|| format!("write {}", backup.display()))?;
    fs::write(path, normalized.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(true)
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

/// Every `.tex` file under `root`, skipping `.git` and the build workspace.
pub fn find_tex_files(root: &Path) -> Result<Vec<PathBuf>> {
    let workspace = root.join(WORKSPACE_DIR_REL);
    let git_dir = root.join(".git");
    let files = collect_files_filtered(root, &|dir| dir == workspace || dir == git_dir)?;
    Ok(files
        .into_iter()
        .filter(|path| path.extension().is_some_and(|ext| ext == "tex"))
        .collect())
}

/// `thesis-build fix-quotes`.
pub fn run_fix_quotes(args: &FixQuotesArgs) -> Result<()> {
    let root = match &args.root {
        Some(root) => root.clone(),
        None => env::current_dir().context("resolve current directory")?,
    };
    let root = root
        .canonicalize()
        .with_context(|| format!("resolve root {}", root.display()))?;
    tracing::debug!(root = %root.display(), "scanning for .tex files");

    let mut modified = Vec::new();
    for file in find_tex_files(&root)? {
        match process_file(&file) {
            Ok(true) => modified.push(display_path(&file, Some(&root))),
            Ok(false) => {}
            Err(err) => eprintln!("Error processing {}: {err:#}", file.display()),
        }
    }

    if modified.is_empty() {
        println!("No changes made.");
    } else {
        println!("Modified files:");
        for path in modified {
            println!(" - {path}");
        }
    }
    Ok(())
}
