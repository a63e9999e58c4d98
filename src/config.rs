//! Build configuration.
//!
//! The layout of a thesis project is fixed; only the toolchain program names
//! can be overridden through an optional `thesis-build.json` in the project
//! root. Everything the pipeline needs is gathered into [`BuildConfig`] up
//! front so nothing downstream reads the process working directory.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const CONFIG_FILE_NAME: &str = "thesis-build.json";

pub const MAIN_DOCUMENT_REL: &str = "main.tex";
pub const CHAPTERS_DIR_REL: &str = "chapters";
pub const STYLES_DIR_REL: &str = "styles";
pub const BIBLIOGRAPHY_DIR_REL: &str = "bibliography";
pub const WORKSPACE_DIR_REL: &str = "build";

pub const DEFAULT_DRIVER: &str = "latexmk";
pub const DEFAULT_ENGINE: &str = "pdflatex";
pub const DEFAULT_BIBLIOGRAPHY_TOOL: &str = "bibtex";

/// Relative names of the project entries the pipeline knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub main_document: PathBuf,
    pub chapters_dir: PathBuf,
    pub styles_dir: PathBuf,
    pub bibliography_dir: PathBuf,
    pub workspace_dir: PathBuf,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            main_document: PathBuf::from(MAIN_DOCUMENT_REL),
            chapters_dir: PathBuf::from(CHAPTERS_DIR_REL),
            styles_dir: PathBuf::from(STYLES_DIR_REL),
            bibliography_dir: PathBuf::from(BIBLIOGRAPHY_DIR_REL),
            workspace_dir: PathBuf::from(WORKSPACE_DIR_REL),
        }
    }
}

impl ProjectLayout {
    /// Main document file name without its extension (`main` for `main.tex`).
    pub fn job_name(&self) -> Result<String> {
        self.main_document
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                anyhow!(
                    "main document {} has no usable file stem",
                    self.main_document.display()
                )
            })
    }

    /// Main document path as handed to the toolchain, relative to the workspace.
    pub fn main_document_arg(&self) -> Result<String> {
        self.main_document
            .to_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("main document path is not valid UTF-8"))
    }
}

/// External program names for both strategies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolchainConfig {
    /// Unified multi-pass driver.
    #[serde(default = "default_driver")]
    pub driver: String,
    /// Macro processor used by the manual fallback.
    #[serde(default = "default_engine")]
    pub engine: String,
    /// Bibliography processor used by the manual fallback.
    #[serde(default = "default_bibliography_tool")]
    pub bibliography: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            engine: default_engine(),
            bibliography: default_bibliography_tool(),
        }
    }
}

fn default_driver() -> String {
    DEFAULT_DRIVER.to_string()
}

fn default_engine() -> String {
    DEFAULT_ENGINE.to_string()
}

fn default_bibliography_tool() -> String {
    DEFAULT_BIBLIOGRAPHY_TOOL.to_string()
}

/// On-disk shape of `thesis-build.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub schema_version: u32,
    #[serde(default)]
    pub toolchain: ToolchainConfig,
}

/// Everything the build pipeline needs, resolved against one project root.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub project_root: PathBuf,
    pub layout: ProjectLayout,
    pub toolchain: ToolchainConfig,
}

impl BuildConfig {
    /// Default configuration for a project root, without reading any file.
    pub fn for_root(project_root: PathBuf) -> Self {
        Self {
            project_root,
            layout: ProjectLayout::default(),
            toolchain: ToolchainConfig::default(),
        }
    }

    /// Load the configuration for a project root, applying `thesis-build.json`
    /// when present.
    pub fn load(project_root: &Path) -> Result<Self> {
        let project_root = project_root
            .canonicalize()
            .with_context(|| format!("resolve project root {}", project_root.display()))?;
        let mut config = Self::for_root(project_root);
        if let Some(file) = load_config_file(&config.project_root)? {
            validate_config(&file)?;
            config.toolchain = file.toolchain;
        }
        Ok(config)
    }

    /// Absolute path of the build workspace.
    pub fn workspace(&self) -> PathBuf {
        self.project_root.join(&self.layout.workspace_dir)
    }
}

/// Read `thesis-build.json` if it exists.
pub fn load_config_file(project_root: &Path) -> Result<Option<ConfigFile>> {
    let path = project_root.join(CONFIG_FILE_NAME);
    if !path.is_file() {
        return Ok(None);
    }
    let bytes = fs::read(&path).with_context(|| format!("read config {}", path.display()))?;
    let file: ConfigFile =
        serde_json::from_slice(&bytes).with_context(|| format!("parse {}", path.display()))?;
    Ok(Some(file))
}

/// Validate schema version and program names.
pub fn validate_config(file: &ConfigFile) -> Result<()> {
    if file.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported {CONFIG_FILE_NAME} schema_version {}",
            file.schema_version
        ));
    }
    validate_program(&file.toolchain.driver, "toolchain.driver")?;
    validate_program(&file.toolchain.engine, "toolchain.engine")?;
    validate_program(&file.toolchain.bibliography, "toolchain.bibliography")?;
    Ok(())
}

/// Reject paths that would escape the project root.
pub fn validate_relative_path(path: &Path, label: &str) -> Result<()> {
    if path.as_os_str().is_empty() || path.is_absolute() || has_parent_components(path) {
        return Err(anyhow!(
            "{label} must be a relative path without '..' (got {})",
            path.display()
        ));
    }
    Ok(())
}

fn validate_program(program: &str, label: &str) -> Result<()> {
    let trimmed = program.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("{label} must be non-empty"));
    }
    if trimmed != program || program.contains(char::is_whitespace) {
        return Err(anyhow!(
            "{label} must be a bare program name without arguments (got {program:?})"
        ));
    }
    if Path::new(program).components().count() != 1 {
        return Err(anyhow!(
            "{label} must be looked up on PATH, not given as a path (got {program:?})"
        ));
    }
    Ok(())
}

fn has_parent_components(path: &Path) -> bool {
    path.components()
        .any(|component| matches!(component, Component::ParentDir))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
