//! Build states and the summary of a finished run.
use crate::toolchain::Strategy;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Pipeline states, in the order a run moves through them.
///
/// No state is re-entered; `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    Init,
    WorkspaceCleaned,
    WorkspaceCreated,
    SourcesStaged,
    StrategySelected,
    UnifiedRun,
    ManualPass1,
    Bibtex,
    ManualPass2,
    ManualPass3,
    Done,
    Failed,
}

impl BuildState {
    pub fn is_terminal(self) -> bool {
        matches!(self, BuildState::Done | BuildState::Failed)
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildState::Init => "INIT",
            BuildState::WorkspaceCleaned => "WORKSPACE_CLEANED",
            BuildState::WorkspaceCreated => "WORKSPACE_CREATED",
            BuildState::SourcesStaged => "SOURCES_STAGED",
            BuildState::StrategySelected => "STRATEGY_SELECTED",
            BuildState::UnifiedRun => "UNIFIED_RUN",
            BuildState::ManualPass1 => "MANUAL_PASS_1",
            BuildState::Bibtex => "BIBTEX",
            BuildState::ManualPass2 => "MANUAL_PASS_2",
            BuildState::ManualPass3 => "MANUAL_PASS_3",
            BuildState::Done => "DONE",
            BuildState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// One executed invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub state: BuildState,
    pub description: String,
    pub command: String,
    pub exit_code: Option<i32>,
}

/// A conditional invocation whose artifact check did not hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedStep {
    pub state: BuildState,
    pub description: String,
    pub reason: String,
}

/// Summary of a successful build, printed with `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub project_root: PathBuf,
    pub workspace: PathBuf,
    pub artifact: PathBuf,
    /// Macro processor log, for diagnosing warnings.
    pub log: PathBuf,
    pub strategy: Strategy,
    pub staged: Vec<PathBuf>,
    /// Optional sources that were not present in the project root.
    pub absent: Vec<PathBuf>,
    pub steps: Vec<StepRecord>,
    pub skipped: Vec<SkippedStep>,
    /// Every state visited, starting at `Init`.
    pub states: Vec<BuildState>,
}

impl BuildReport {
    pub fn final_state(&self) -> BuildState {
        self.states.last().copied().unwrap_or(BuildState::Init)
    }
}
