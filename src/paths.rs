//! Typed paths into the project root and the build workspace.
//!
//! Path construction lives here so staging, the artifact checks, and the
//! report all agree on where things are.
use crate::config::BuildConfig;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Source locations inside the project root.
#[derive(Debug, Clone)]
pub struct ProjectPaths<'a> {
    config: &'a BuildConfig,
}

impl<'a> ProjectPaths<'a> {
    pub fn new(config: &'a BuildConfig) -> Self {
        Self { config }
    }

    /// Return the project root.
    pub fn root(&self) -> &Path {
        &self.config.project_root
    }

    /// Return the main document path.
    pub fn main_document(&self) -> PathBuf {
        self.root().join(&self.config.layout.main_document)
    }

    /// Return the `chapters/` directory path.
    pub fn chapters_dir(&self) -> PathBuf {
        self.root().join(&self.config.layout.chapters_dir)
    }

    /// Return the `styles/` directory path.
    pub fn styles_dir(&self) -> PathBuf {
        self.root().join(&self.config.layout.styles_dir)
    }

    /// Return the `bibliography/` directory path.
    pub fn bibliography_dir(&self) -> PathBuf {
        self.root().join(&self.config.layout.bibliography_dir)
    }

    /// Return the build workspace path.
    pub fn workspace(&self) -> PathBuf {
        self.config.workspace()
    }
}

/// Artifacts the toolchain leaves in the workspace for one job name.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    root: PathBuf,
    job_name: String,
}

impl WorkspacePaths {
    pub fn new(root: PathBuf, job_name: String) -> Self {
        Self { root, job_name }
    }

    pub fn for_config(config: &BuildConfig) -> Result<Self> {
        Ok(Self::new(config.workspace(), config.layout.job_name()?))
    }

    /// Same job name, different workspace root (e.g. the canonical one).
    pub fn with_root(&self, root: PathBuf) -> Self {
        Self::new(root, self.job_name.clone())
    }

    /// Rendered document.
    pub fn pdf_path(&self) -> PathBuf {
        self.artifact("pdf")
    }

    /// Macro processor log.
    pub fn log_path(&self) -> PathBuf {
        self.artifact("log")
    }

    fn artifact(&self, extension: &str) -> PathBuf {
        self.root.join(format!("{}.{extension}", self.job_name))
    }
}
