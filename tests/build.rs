//! End-to-end runs of `thesis-build` against fake toolchains.
#![cfg(unix)]

mod common;

use common::{stderr, stdout, ThesisFixture};
use std::fs;

#[test]
fn no_arguments_builds_with_manual_passes_when_driver_is_missing() {
    let fixture = ThesisFixture::minimal_thesis();
    fixture.install_engine(false, 0);
    fixture.install_tool("bibtex", "", 0);

    let output = fixture.run(&[]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let calls = fixture.tool_calls();
    assert_eq!(calls.len(), 3, "{calls:?}");
    for call in &calls {
        assert_eq!(
            call,
            "pdflatex -interaction=nonstopmode -file-line-error main.tex"
        );
    }
    let out = stdout(&output);
    assert!(out.contains("manual strategy"), "{out}");
    assert!(
        out.contains(&format!("Workspace: {}", fixture.workspace().display())),
        "{out}"
    );
    assert!(fixture.workspace().join("main.pdf").is_file());
    assert!(fixture.workspace().join("chapters/intro.tex").is_file());
    assert!(!fixture.workspace().join("styles").exists());
}

#[test]
fn citations_trigger_bibliography_pass() {
    let fixture = ThesisFixture::minimal_thesis();
    fixture.write("bibliography/refs.bib", "@book{knuth84, title={TeX}}\n");
    fixture.install_engine(true, 0);
    fixture.install_tool("bibtex", "", 0);

    let output = fixture.run(&["build"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let programs: Vec<String> = fixture
        .tool_calls()
        .iter()
        .map(|call| call.split_whitespace().next().unwrap_or_default().to_string())
        .collect();
    assert_eq!(programs, vec!["pdflatex", "bibtex", "pdflatex", "pdflatex"]);
    assert_eq!(fixture.tool_calls()[1], "bibtex main");
    assert!(fixture.workspace().join("bibliography/refs.bib").is_file());
}

#[test]
fn unified_driver_is_preferred_and_reported_as_json() {
    let fixture = ThesisFixture::minimal_thesis();
    fixture.install_tool("latexmk", "printf '%%PDF' > main.pdf", 0);
    fixture.install_engine(true, 0);

    let output = fixture.run(&["build", "--json"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        fixture.tool_calls(),
        vec!["latexmk -pdf -interaction=nonstopmode -file-line-error main.tex"]
    );
    let report: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("report is JSON");
    assert_eq!(report["strategy"], "unified");
    assert_eq!(
        report["states"].as_array().and_then(|states| states.last()),
        Some(&serde_json::json!("done"))
    );
    assert_eq!(
        report["artifact"],
        fixture.workspace().join("main.pdf").display().to_string()
    );
}

#[test]
fn failing_step_stops_the_run_and_keeps_the_workspace() {
    let fixture = ThesisFixture::minimal_thesis();
    fixture.install_engine(true, 0);
    fixture.install_tool("bibtex", "", 2);

    let output = fixture.run(&[]);

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("bibliography processing failed"), "{err}");
    assert!(err.contains("`bibtex main`"), "{err}");
    assert!(err.contains("exit code 2"), "{err}");
    assert_eq!(fixture.tool_calls().len(), 2);
    assert!(fixture.workspace().join("main.aux").is_file());
}

#[test]
fn missing_main_document_fails_before_running_tools() {
    let fixture = ThesisFixture::new();
    fixture.write("chapters/intro.tex", "\\chapter{Intro}\n");
    fixture.install_engine(false, 0);

    let output = fixture.run(&[]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("missing required source"));
    assert!(fixture.tool_calls().is_empty());
}

#[test]
fn rebuild_discards_previous_workspace_contents() {
    let fixture = ThesisFixture::minimal_thesis();
    fixture.write("styles/thesis.sty", "\\ProvidesPackage{thesis}\n");
    fixture.install_engine(false, 0);

    assert!(fixture.run(&[]).status.success());
    fs::remove_dir_all(fixture.root.join("styles")).expect("remove styles");
    fixture.write("chapters/intro.tex", "\\chapter{Introduction, revised}\n");

    let output = fixture.run(&["build", "--root", fixture.root.to_str().expect("utf-8")]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(!fixture.workspace().join("styles").exists());
    assert_eq!(
        fs::read_to_string(fixture.workspace().join("chapters/intro.tex")).expect("read"),
        "\\chapter{Introduction, revised}\n"
    );
    assert_eq!(
        fixture.read("chapters/intro.tex"),
        "\\chapter{Introduction, revised}\n"
    );
}

#[test]
fn config_file_swaps_the_engine() {
    let fixture = ThesisFixture::minimal_thesis();
    fixture.write(
        "thesis-build.json",
        r#"{"schema_version": 1, "toolchain": {"engine": "xelatex"}}"#,
    );
    fixture.install_tool("xelatex", "", 0);

    let output = fixture.run(&[]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let calls = fixture.tool_calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|call| call.starts_with("xelatex ")));
}
