//! Pipeline failures callers need to tell apart.
//!
//! Everything else travels as plain `anyhow` context; these variants are
//! carried inside `anyhow::Error` and recovered with `downcast_ref`.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("missing required source {}", .0.display())]
    MissingSource(PathBuf),

    #[error("{description} failed: `{command}` exited with {}", describe_code(.code))]
    StepFailed {
        description: String,
        command: String,
        code: Option<i32>,
    },

    #[error("refusing to use workspace {}: {reason}", .workspace.display())]
    UnsafeWorkspace { workspace: PathBuf, reason: String },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_failure_names_command_and_code() {
        let err = PipelineError::StepFailed {
            description: "bibliography processing".to_string(),
            command: "bibtex main".to_string(),
            code: Some(2),
        };
        assert_eq!(
            err.to_string(),
            "bibliography processing failed: `bibtex main` exited with exit code 2"
        );
    }

    #[test]
    fn signal_termination_has_no_code() {
        let err = PipelineError::StepFailed {
            description: "macro pass 1".to_string(),
            command: "pdflatex main.tex".to_string(),
            code: None,
        };
        assert!(err.to_string().contains("terminated by signal"));
    }
}
