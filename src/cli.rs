//! CLI argument parsing for the thesis build.
//!
//! Running the binary with no arguments is the same as `build` in the current
//! directory; the other subcommands are authoring helpers.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default output path for `export`, relative to the project root.
pub const DEFAULT_EXPORT_OUTPUT: &str = "codebase.md";

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "thesis-build",
    version,
    about = "Build the thesis PDF in an isolated workspace",
    after_help = "Commands:\n  build        Stage sources into build/ and run the TeX toolchain (default)\n  fix-quotes   Normalize quotation marks in .tex sources\n  export       Dump the repository tree and contents to Markdown\n\nExamples:\n  thesis-build\n  thesis-build build --root ~/thesis --json\n  thesis-build fix-quotes\n  thesis-build export --output codebase.md"
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl RootArgs {
    /// Resolve the command to run, falling back to a plain build.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or_else(|| Command::Build(BuildArgs::default()))
    }

    /// Whether debug logging was requested on the chosen command.
    pub fn verbose(&self) -> bool {
        matches!(&self.command, Some(Command::Build(args)) if args.verbose)
    }
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Build(BuildArgs),
    FixQuotes(FixQuotesArgs),
    Export(ExportArgs),
}

/// Build command inputs.
#[derive(Parser, Debug, Default)]
#[command(about = "Stage sources into the build workspace and run the toolchain")]
pub struct BuildArgs {
    /// Project root containing main.tex (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Print the build report as JSON on success
    #[arg(long)]
    pub json: bool,

    /// Emit debug logging for each pipeline state
    #[arg(long, short)]
    pub verbose: bool,
}

/// Quote normalization inputs.
#[derive(Parser, Debug)]
#[command(about = "Rewrite straight and typographic quotes as TeX quote pairs")]
pub struct FixQuotesArgs {
    /// Project root to scan for .tex files (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
}

/// Export command inputs.
#[derive(Parser, Debug)]
#[command(about = "Write the repository tree and file contents to a Markdown file")]
pub struct ExportArgs {
    /// Repository root (defaults to the git toplevel, then the current directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Output path relative to the root
    #[arg(long, value_name = "PATH", default_value = DEFAULT_EXPORT_OUTPUT)]
    pub output: PathBuf,
}
