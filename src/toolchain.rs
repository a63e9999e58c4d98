//! Toolchain strategies and the ordered steps each one runs.
//!
//! Two strategies exist: a unified driver that iterates passes on its own, and
//! a manual fallback of three macro passes with a bibliography pass that only
//! runs when the first pass recorded citations.
use crate::config::{ProjectLayout, ToolchainConfig};
use crate::report::BuildState;
use crate::util::format_command_line;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Flags shared by every macro-processing invocation.
const NONSTOP_FLAG: &str = "-interaction=nonstopmode";
const FILE_LINE_ERROR_FLAG: &str = "-file-line-error";
const PDF_FLAG: &str = "-pdf";

/// Markers the macro processor writes to the cross-reference file when the
/// document cites anything.
const CITATION_MARKERS: [&str; 2] = ["\\citation{", "\\bibdata{"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// One run of the multi-pass driver.
    Unified,
    /// Macro pass, optional bibliography pass, two more macro passes.
    Manual,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Unified => f.write_str("unified"),
            Strategy::Manual => f.write_str("manual"),
        }
    }
}

/// Answers whether a program can be found on the command search path.
pub trait ToolProbe {
    fn is_available(&self, program: &str) -> bool;
}

/// Probe backed by a `PATH` lookup.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathProbe;

impl ToolProbe for PathProbe {
    fn is_available(&self, program: &str) -> bool {
        match which::which(program) {
            Ok(path) => {
                tracing::debug!(program, path = %path.display(), "found on PATH");
                true
            }
            Err(_) => false,
        }
    }
}

/// A single external command, run with the workspace as its cwd.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub description: String,
}

impl Invocation {
    pub fn new(program: &str, args: &[&str], description: impl Into<String>) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
            description: description.into(),
        }
    }

    pub fn command_line(&self) -> String {
        format_command_line(&self.program, &self.args)
    }
}

/// Predicate over a workspace file, evaluated between pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCheck {
    /// Path relative to the workspace.
    pub artifact: PathBuf,
    /// Substrings of which at least one must appear; empty means "exists".
    pub markers: Vec<String>,
}

impl ArtifactCheck {
    /// The cross-reference file exists and records citations.
    pub fn citations_recorded(aux_rel: PathBuf) -> Self {
        Self {
            artifact: aux_rel,
            markers: CITATION_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn evaluate(&self, workspace: &Path) -> Result<CheckOutcome> {
        let path = workspace.join(&self.artifact);
        if !path.is_file() {
            return Ok(CheckOutcome::Missing);
        }
        if self.markers.is_empty() {
            return Ok(CheckOutcome::Holds);
        }
        let bytes = fs::read(&path).with_context(|| format!("read {}", path.display()))?;
        let text = String::from_utf8_lossy(&bytes);
        if self.markers.iter().any(|marker| text.contains(marker.as_str())) {
            Ok(CheckOutcome::Holds)
        } else {
            Ok(CheckOutcome::NoMarkers)
        }
    }
}

/// Result of evaluating an [`ArtifactCheck`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Holds,
    /// The artifact was never written.
    Missing,
    /// The artifact exists but carries none of the markers.
    NoMarkers,
}

/// One entry of a strategy's ordered plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Run {
        state: BuildState,
        invocation: Invocation,
    },
    WhenArtifact {
        state: BuildState,
        check: ArtifactCheck,
        invocation: Invocation,
    },
}

impl Step {
    pub fn state(&self) -> BuildState {
        match self {
            Step::Run { state, .. } | Step::WhenArtifact { state, .. } => *state,
        }
    }

    pub fn invocation(&self) -> &Invocation {
        match self {
            Step::Run { invocation, .. } | Step::WhenArtifact { invocation, .. } => invocation,
        }
    }
}

/// Pick the unified driver when it is on `PATH`, else the manual fallback.
pub fn select_strategy(toolchain: &ToolchainConfig, probe: &dyn ToolProbe) -> Strategy {
    if probe.is_available(&toolchain.driver) {
        Strategy::Unified
    } else {
        tracing::info!(
            driver = %toolchain.driver,
            "unified driver not found, using manual pass sequence"
        );
        Strategy::Manual
    }
}

/// The fixed, ordered steps for a strategy.
pub fn plan_steps(
    strategy: Strategy,
    toolchain: &ToolchainConfig,
    layout: &ProjectLayout,
) -> Result<Vec<Step>> {
    let document = layout.main_document_arg()?;
    let steps = match strategy {
        Strategy::Unified => vec![Step::Run {
            state: BuildState::UnifiedRun,
            invocation: Invocation::new(
                &toolchain.driver,
                &[PDF_FLAG, NONSTOP_FLAG, FILE_LINE_ERROR_FLAG, document.as_str()],
                "unified build",
            ),
        }],
        Strategy::Manual => {
            let job_name = layout.job_name()?;
            let macro_pass = |pass: u8| {
                Invocation::new(
                    &toolchain.engine,
                    &[NONSTOP_FLAG, FILE_LINE_ERROR_FLAG, document.as_str()],
                    format!("macro pass {pass}"),
                )
            };
            vec![
                Step::Run {
                    state: BuildState::ManualPass1,
                    invocation: macro_pass(1),
                },
                Step::WhenArtifact {
                    state: BuildState::Bibtex,
                    check: ArtifactCheck::citations_recorded(PathBuf::from(format!(
                        "{job_name}.aux"
                    ))),
                    invocation: Invocation::new(
                        &toolchain.bibliography,
                        &[job_name.as_str()],
                        "bibliography processing",
                    ),
                },
                Step::Run {
                    state: BuildState::ManualPass2,
                    invocation: macro_pass(2),
                },
                Step::Run {
                    state: BuildState::ManualPass3,
                    invocation: macro_pass(3),
                },
            ]
        }
    };
    Ok(steps)
}
