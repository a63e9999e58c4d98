use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

pub fn display_path(path: &Path, base: Option<&Path>) -> String {
    if let Some(base) = base {
        if let Ok(relative) = path.strip_prefix(base) {
            return relative.display().to_string();
        }
    }
    path.display().to_string()
}

/// Render argv the way a shell user would type it.
pub fn format_command_line(program: &str, args: &[String]) -> String {
    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push(program);
    argv.extend(args.iter().map(String::as_str));
    shell_words::join(argv)
}

#[cfg(test)]
pub fn collect_files_recursive(root: &Path) -> Result<Vec<PathBuf>> {
    collect_files_filtered(root, &|_| false)
}

/// Walk `root` and return every regular file, sorted, skipping any
/// directory for which `skip_dir` returns true. Links to directories are
/// not followed.
pub fn collect_files_filtered(
    root: &Path,
    skip_dir: &dyn Fn(&Path) -> bool,
) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Ok(Vec::new());
    }
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !(entry.file_type().is_dir() && skip_dir(entry.path()))
        });
    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("walk {}", root.display()))?;
        if is_file_entry(&entry) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// A regular file, or a link that resolves to one.
pub fn is_file_entry(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())
}
