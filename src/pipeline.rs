//! The build pipeline: reset the workspace, stage sources, run the toolchain.
//!
//! A run is strictly linear and fail-fast. The first non-zero exit aborts it
//! and the partially built workspace is left on disk for inspection; the next
//! run deletes it anyway.
use crate::cli::BuildArgs;
use crate::config::{validate_relative_path, BuildConfig};
use crate::error::PipelineError;
use crate::paths::WorkspacePaths;
use crate::report::{BuildReport, BuildState, SkippedStep, StepRecord};
use crate::runner::{CommandRunner, SystemRunner};
use crate::toolchain::{
    plan_steps, select_strategy, CheckOutcome, PathProbe, Step, Strategy, ToolProbe,
};
use crate::util::display_path;
use crate::workspace::{
    clean_workspace, create_workspace, stage_sources, staged_paths, StageOutcome, StagedPath,
};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Everything a run needs, resolved before the filesystem is touched.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub project_root: PathBuf,
    pub workspace: PathBuf,
    pub staged: Vec<StagedPath>,
    pub strategy: Strategy,
    pub steps: Vec<Step>,
    pub artifacts: WorkspacePaths,
}

impl BuildPlan {
    /// Validate the layout, probe for the unified driver, and lay out steps.
    pub fn resolve(config: &BuildConfig, probe: &dyn ToolProbe) -> Result<Self> {
        let layout = &config.layout;
        validate_relative_path(&layout.main_document, "main document")?;
        validate_relative_path(&layout.chapters_dir, "chapters directory")?;
        validate_relative_path(&layout.styles_dir, "styles directory")?;
        validate_relative_path(&layout.bibliography_dir, "bibliography directory")?;
        validate_relative_path(&layout.workspace_dir, "workspace")?;

        let workspace = config.workspace();
        let staged = staged_paths(config);
        check_workspace_isolation(&config.project_root, &workspace, &staged)?;

        let strategy = select_strategy(&config.toolchain, probe);
        let steps = plan_steps(strategy, &config.toolchain, layout)?;
        Ok(Self {
            project_root: config.project_root.clone(),
            workspace,
            staged,
            strategy,
            steps,
            artifacts: WorkspacePaths::for_config(config)?,
        })
    }
}

/// The workspace gets deleted, so it must not hold the root or any source.
fn check_workspace_isolation(root: &Path, workspace: &Path, staged: &[StagedPath]) -> Result<()> {
    let unsafe_workspace = |reason: String| PipelineError::UnsafeWorkspace {
        workspace: workspace.to_path_buf(),
        reason,
    };
    if root.starts_with(workspace) {
        return Err(unsafe_workspace("it contains the project root".to_string()).into());
    }
    for entry in staged {
        if entry.source.starts_with(workspace) || workspace.starts_with(&entry.source) {
            return Err(unsafe_workspace(format!(
                "it overlaps the staged source {}",
                entry.source.display()
            ))
            .into());
        }
    }
    Ok(())
}

/// Records each state transition and logs it.
struct StateLog {
    states: Vec<BuildState>,
}

impl StateLog {
    fn new() -> Self {
        tracing::debug!(state = %BuildState::Init, "build state");
        Self {
            states: vec![BuildState::Init],
        }
    }

    fn enter(&mut self, state: BuildState) {
        debug_assert!(
            !self.states.iter().any(|visited| visited.is_terminal()),
            "{state} entered after a terminal state"
        );
        tracing::debug!(%state, "build state");
        self.states.push(state);
    }
}

/// Execute a resolved plan with the given runner.
pub fn execute(plan: &BuildPlan, runner: &mut dyn CommandRunner) -> Result<BuildReport> {
    let mut log = StateLog::new();
    match run_states(plan, runner, &mut log) {
        Ok(report) => Ok(report),
        Err(err) => {
            log.enter(BuildState::Failed);
            Err(err)
        }
    }
}

fn run_states(
    plan: &BuildPlan,
    runner: &mut dyn CommandRunner,
    log: &mut StateLog,
) -> Result<BuildReport> {
    clean_workspace(&plan.workspace)?;
    log.enter(BuildState::WorkspaceCleaned);
    create_workspace(&plan.workspace)?;
    log.enter(BuildState::WorkspaceCreated);

    let mut staged = Vec::new();
    let mut absent = Vec::new();
    for outcome in stage_sources(&plan.staged)? {
        match outcome {
            StageOutcome::Copied(dest) => staged.push(dest),
            StageOutcome::Absent(source) => absent.push(source),
        }
    }
    log.enter(BuildState::SourcesStaged);
    tracing::info!(
        workspace = %plan.workspace.display(),
        staged = staged.len(),
        absent = absent.len(),
        "workspace prepared"
    );

    log.enter(BuildState::StrategySelected);
    tracing::info!(strategy = %plan.strategy, "toolchain strategy");

    let mut steps = Vec::new();
    let mut skipped = Vec::new();
    for step in &plan.steps {
        if let Step::WhenArtifact { check, .. } = step {
            let artifact = check.artifact.display();
            let reason = match check.evaluate(&plan.workspace)? {
                CheckOutcome::Holds => None,
                CheckOutcome::Missing => Some(format!("{artifact} was not written")),
                CheckOutcome::NoMarkers => Some(format!("{artifact} does not record citations")),
            };
            if let Some(reason) = reason {
                tracing::info!(step = %step.invocation().description, %reason, "skipping step");
                skipped.push(SkippedStep {
                    state: step.state(),
                    description: step.invocation().description.clone(),
                    reason,
                });
                continue;
            }
        }
        log.enter(step.state());
        steps.push(run_step(step, &plan.workspace, runner)?);
    }

    let workspace = plan
        .workspace
        .canonicalize()
        .with_context(|| format!("resolve workspace {}", plan.workspace.display()))?;
    let artifacts = plan.artifacts.with_root(workspace.clone());
    log.enter(BuildState::Done);
    Ok(BuildReport {
        project_root: plan.project_root.clone(),
        workspace,
        artifact: artifacts.pdf_path(),
        log: artifacts.log_path(),
        strategy: plan.strategy,
        staged,
        absent,
        steps,
        skipped,
        states: log.states.clone(),
    })
}

fn run_step(step: &Step, workspace: &Path, runner: &mut dyn CommandRunner) -> Result<StepRecord> {
    let invocation = step.invocation();
    let command = invocation.command_line();
    tracing::info!(step = %invocation.description, %command, "running");
    let outcome = runner
        .run(invocation, workspace)
        .with_context(|| format!("{} (`{command}`)", invocation.description))?;
    if !outcome.success() {
        return Err(PipelineError::StepFailed {
            description: invocation.description.clone(),
            command,
            code: outcome.code,
        }
        .into());
    }
    Ok(StepRecord {
        state: step.state(),
        description: invocation.description.clone(),
        command,
        exit_code: outcome.code,
    })
}

/// `thesis-build build`: run the pipeline for a project root.
pub fn run_build(args: &BuildArgs) -> Result<()> {
    let root = match &args.root {
        Some(root) => root.clone(),
        None => env::current_dir().context("resolve current directory")?,
    };
    let config = BuildConfig::load(&root)?;
    let plan = BuildPlan::resolve(&config, &PathProbe)?;
    let report = execute(&plan, &mut SystemRunner)?;
    tracing::debug!(state = %report.final_state(), steps = report.steps.len(), "build finished");

    if args.json {
        let text = serde_json::to_string_pretty(&report).context("serialize build report")?;
        println!("{text}");
    } else {
        println!("Build finished ({} strategy).", report.strategy);
        println!("Workspace: {}", report.workspace.display());
        println!(
            "Output: {}",
            display_path(&report.artifact, Some(&report.project_root))
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
