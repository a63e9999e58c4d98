//! Markdown export of the repository tree and file contents.
//!
//! Files come from `git ls-files` so ignored paths stay out; without git the
//! filesystem is walked and the root `.gitignore` is applied with glob
//! matching.
use crate::cli::ExportArgs;
use crate::util::collect_files_filtered;
use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Missing paths listed individually before summarizing the rest.
const MAX_MISSING_LISTED: usize = 20;
/// Below this share of printable bytes a file counts as binary.
const PRINTABLE_RATIO_THRESHOLD: f64 = 0.7;

/// `thesis-build export`.
pub fn run_export(args: &ExportArgs) -> Result<()> {
    let root = match &args.root {
        Some(root) => {
            let root = root
                .canonicalize()
                .with_context(|| format!("resolve root {}", root.display()))?;
            eprintln!("Using provided root: {}", root.display());
            root
        }
        None => repo_root()?,
    };
    let output_path = root.join(&args.output);
    let files = gather_repo_files(&root)?;
    let markdown = create_markdown(&root, &files, &output_path);
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(&output_path, markdown.as_bytes())
        .with_context(|| format!("write {}", output_path.display()))?;
    println!("Markdown written to {}", output_path.display());
    Ok(())
}

/// The git toplevel of the current directory, or the directory itself.
fn repo_root() -> Result<PathBuf> {
    let cwd = env::current_dir().context("resolve current directory")?;
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .current_dir(&cwd)
        .stderr(Stdio::null())
        .output();
    match output {
        Ok(output) if output.status.success() => {
            let text = String::from_utf8_lossy(&output.stdout);
            Ok(PathBuf::from(text.trim()))
        }
        _ => Ok(cwd),
    }
}

/// Repository files, preferring git's view and falling back to a walk.
pub fn gather_repo_files(root: &Path) -> Result<Vec<PathBuf>> {
    let output = Command::new("git")
        .args(["ls-files", "--exclude-standard", "--others", "--cached"])
        .current_dir(root)
        .stderr(Stdio::null())
        .output();
    let output = match output {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            eprintln!(
                "Notice: git ls-files failed ({}). Falling back to filesystem walk.",
                output.status
            );
            return gather_files_by_walk(root);
        }
        Err(err) => {
            eprintln!("Notice: git unavailable ({err}). Falling back to filesystem walk.");
            return gather_files_by_walk(root);
        }
    };

    let text = String::from_utf8_lossy(&output.stdout);
    let mut resolved = Vec::new();
    let mut missing = Vec::new();
    for rel in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let full = root.join(rel);
        if full.exists() {
            resolved.push(full);
        } else {
            missing.push(rel.to_string());
        }
    }
    if !missing.is_empty() {
        tracing::warn!(count = missing.len(), "git reported paths missing on disk");
        eprintln!("Warning: git reported paths that do not exist on disk. They will be skipped:");
        for rel in missing.iter().take(MAX_MISSING_LISTED) {
            eprintln!("  - {rel}");
        }
        if missing.len() > MAX_MISSING_LISTED {
            eprintln!("  ...and {} more", missing.len() - MAX_MISSING_LISTED);
        }
    }
    resolved.sort();
    Ok(resolved)
}

/// One `.gitignore` line.
#[derive(Debug)]
pub enum IgnorePattern {
    /// `name/`: anything whose relative path starts with `name`.
    Directory(String),
    /// Glob tested against the relative path and the file name.
    Glob(GlobMatcher),
}

impl IgnorePattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        if let Some(dir) = pattern.strip_suffix('/') {
            return Ok(IgnorePattern::Directory(dir.to_string()));
        }
        Ok(IgnorePattern::Glob(compile_glob(pattern)?))
    }

    pub fn matches(&self, rel: &str, file_name: &str) -> bool {
        match self {
            IgnorePattern::Directory(dir) => rel.starts_with(dir.as_str()),
            IgnorePattern::Glob(glob) => glob.is_match(rel) || glob.is_match(file_name),
        }
    }
}

/// Compile a `.gitignore` glob; `*` may cross directory separators.
pub fn compile_glob(pattern: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(false)
        .build()
        .with_context(|| format!("invalid ignore pattern {pattern:?}"))?;
    Ok(glob.compile_matcher())
}

/// Patterns from the root `.gitignore`, skipping comments and blanks.
/// Unparseable patterns are dropped.
pub fn load_gitignore_patterns(root: &Path) -> Vec<IgnorePattern> {
    let Ok(text) = fs::read_to_string(root.join(".gitignore")) else {
        return Vec::new();
    };
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| match IgnorePattern::parse(line) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                tracing::debug!(%err, "skipping .gitignore pattern");
                None
            }
        })
        .collect()
}

/// Every file under `root` not matched by the root `.gitignore`.
pub fn gather_files_by_walk(root: &Path) -> Result<Vec<PathBuf>> {
    let patterns = load_gitignore_patterns(root);
    let git_dir = root.join(".git");
    let files = collect_files_filtered(root, &|dir| dir == git_dir)?;
    Ok(files
        .into_iter()
        .filter(|path| {
            let rel = relative_posix(path, root);
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            !patterns
                .iter()
                .any(|pattern| pattern.matches(&rel, &file_name))
        })
        .collect())
}

fn relative_posix(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Nested directory tree built from relative file paths.
#[derive(Debug, Default)]
pub struct TreeNode {
    dirs: BTreeMap<String, TreeNode>,
    files: Vec<String>,
}

impl TreeNode {
    pub fn from_paths(paths: &[PathBuf], root: &Path) -> Self {
        let mut tree = TreeNode::default();
        for path in paths {
            let rel = relative_posix(path, root);
            let mut parts: Vec<&str> = rel.split('/').collect();
            let Some(file) = parts.pop() else {
                continue;
            };
            let mut cursor = &mut tree;
            for part in parts {
                cursor = cursor.dirs.entry(part.to_string()).or_default();
            }
            cursor.files.push(file.to_string());
        }
        tree
    }

    /// Directories first, then files, each sorted.
    pub fn render(&self, prefix: &str) -> Vec<String> {
        let mut files = self.files.clone();
        files.sort();
        let entries: Vec<(&str, Option<&TreeNode>)> = self
            .dirs
            .iter()
            .map(|(name, node)| (name.as_str(), Some(node)))
            .chain(files.iter().map(|name| (name.as_str(), None)))
            .collect();

        let mut lines = Vec::new();
        for (index, (name, node)) in entries.iter().enumerate() {
            let last = index + 1 == entries.len();
            let connector = if last { "└──" } else { "├──" };
            lines.push(format!("{prefix}{connector} {name}"));
            if let Some(node) = node {
                let next_prefix = if last {
                    format!("{prefix}    ")
                } else {
                    format!("{prefix}│   ")
                };
                lines.extend(node.render(&next_prefix));
            }
        }
        lines
    }
}

/// Heuristic: a NUL byte, or too few printable bytes.
pub fn detect_binary(data: &[u8]) -> bool {
    if data.is_empty() {
        return false;
    }
    if data.contains(&0) {
        return true;
    }
    let printable = data
        .iter()
        .filter(|&&byte| matches!(byte, 7..=10 | 12 | 13 | 27 | 0x20..=0x7E))
        .count();
    (printable as f64 / data.len() as f64) < PRINTABLE_RATIO_THRESHOLD
}

/// File body as it should appear inside a fenced block.
pub fn read_file_for_markdown(path: &Path) -> String {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return "[missing file: skipped]".to_string();
        }
        Err(err) => return format!("[error reading file: {err}]"),
    };
    if detect_binary(&data) {
        return format!("[binary file omitted – {} bytes]", data.len());
    }
    String::from_utf8_lossy(&data).trim_end().to_string()
}

/// Assemble the full Markdown document.
pub fn create_markdown(root: &Path, files: &[PathBuf], output_path: &Path) -> String {
    let files: Vec<PathBuf> = files
        .iter()
        .filter(|path| path.as_path() != output_path)
        .cloned()
        .collect();
    let root_name = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());

    let mut lines = vec![
        format!("# {root_name}"),
        String::new(),
        "Generated by thesis-build export.".to_string(),
        String::new(),
        "## Structure".to_string(),
        String::new(),
        "```".to_string(),
        ".".to_string(),
    ];
    lines.extend(TreeNode::from_paths(&files, root).render(""));
    lines.push("```".to_string());
    lines.push(String::new());

    lines.push("## File contents".to_string());
    lines.push(String::new());
    let mut sorted = files;
    sorted.sort();
    for path in &sorted {
        let rel = relative_posix(path, root);
        let fence_lang = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_else(|| "text".to_string());
        lines.push(format!("### `{rel}`"));
        lines.push(String::new());
        lines.push(format!("```{fence_lang}"));
        lines.push(read_file_for_markdown(path));
        lines.push("```".to_string());
        lines.push(String::new());
    }
    lines.join("\n")
}

#[cfg(test)]
#[path = "export_tests.rs"]
mod tests;
