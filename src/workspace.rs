//! Build workspace preparation and source staging.
//!
//! The workspace is disposable: every run deletes it, recreates it empty, and
//! copies the allowlisted sources in. Nothing here ever writes outside it.
use crate::config::BuildConfig;
use crate::error::PipelineError;
use crate::paths::ProjectPaths;
use anyhow::{anyhow, Context, Result};
use crate::util::is_file_entry;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One allowlist entry resolved against the project root and workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedPath {
    pub source: PathBuf,
    pub dest: PathBuf,
    /// Missing required entries fail the run; missing optional ones are skipped.
    pub required: bool,
}

/// The fixed allowlist: main document, then chapters, styles, and bibliography.
pub fn staged_paths(config: &BuildConfig) -> Vec<StagedPath> {
    let project = ProjectPaths::new(config);
    let workspace = project.workspace();
    let layout = &config.layout;
    vec![
        StagedPath {
            source: project.main_document(),
            dest: workspace.join(&layout.main_document),
            required: true,
        },
        StagedPath {
            source: project.chapters_dir(),
            dest: workspace.join(&layout.chapters_dir),
            required: false,
        },
        StagedPath {
            source: project.styles_dir(),
            dest: workspace.join(&layout.styles_dir),
            required: false,
        },
        StagedPath {
            source: project.bibliography_dir(),
            dest: workspace.join(&layout.bibliography_dir),
            required: false,
        },
    ]
}

/// Remove the workspace and everything in it; a missing workspace is fine.
pub fn clean_workspace(workspace: &Path) -> Result<()> {
    remove_path(workspace).with_context(|| format!("clean workspace {}", workspace.display()))
}

/// Recreate the (now empty) workspace directory.
pub fn create_workspace(workspace: &Path) -> Result<()> {
    fs::create_dir_all(workspace)
        .with_context(|| format!("create workspace {}", workspace.display()))
}

/// Outcome of staging one allowlist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Copied(PathBuf),
    Absent(PathBuf),
}

/// Copy each present allowlist entry into the workspace.
///
/// A missing required entry fails with [`PipelineError::MissingSource`];
/// missing optional ones come back as [`StageOutcome::Absent`].
pub fn stage_sources(staged: &[StagedPath]) -> Result<Vec<StageOutcome>> {
    let mut outcomes = Vec::with_capacity(staged.len());
    for entry in staged {
        if !entry.source.exists() {
            if entry.required {
                return Err(PipelineError::MissingSource(entry.source.clone()).into());
            }
            tracing::debug!(source = %entry.source.display(), "optional source absent");
            outcomes.push(StageOutcome::Absent(entry.source.clone()));
            continue;
        }
        replace_path(&entry.source, &entry.dest)?;
        tracing::debug!(
            source = %entry.source.display(),
            dest = %entry.dest.display(),
            "staged"
        );
        outcomes.push(StageOutcome::Copied(entry.dest.clone()));
    }
    Ok(outcomes)
}

/// Copy `source` to a sibling temp path, then swap it in for `dest`.
fn replace_path(source: &Path, dest: &Path) -> Result<()> {
    let parent = dest
        .parent()
        .ok_or_else(|| anyhow!("staging destination {} has no parent", dest.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    let file_name = dest
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("staged");
    let tmp_path = parent.join(format!(".{file_name}.tmp"));
    remove_path(&tmp_path)?;
    copy_recursive(source, &tmp_path)
        .with_context(|| format!("stage {}", source.display()))?;
    remove_path(dest)?;
    fs::rename(&tmp_path, dest).with_context(|| format!("stage {}", dest.display()))?;
    Ok(())
}

/// Remove a file or directory tree; a missing path is not an error.
fn remove_path(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => {
            fs::remove_dir_all(path).with_context(|| format!("remove {}", path.display()))
        }
        Ok(_) => fs::remove_file(path).with_context(|| format!("remove {}", path.display())),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("stat {}", path.display())),
    }
}

/// Recursively copy a file or directory tree.
///
/// Links to files are copied by content; links to directories are not entered.
fn copy_recursive(source: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.with_context(|| format!("walk {}", source.display()))?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .with_context(|| format!("{} escapes {}", entry.path().display(), source.display()))?;
        let target = if rel.as_os_str().is_empty() {
            dest.to_path_buf()
        } else {
            dest.join(rel)
        };
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).with_context(|| format!("create {}", target.display()))?;
        } else if is_file_entry(&entry) {
            fs::copy(entry.path(), &target).with_context(|| {
                format!("copy {} to {}", entry.path().display(), target.display())
            })?;
        } else {
            tracing::debug!(path = %entry.path().display(), "not staging link");
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
