//! Shared test infrastructure for integration tests.
//!
//! A fixture is a scratch thesis project plus a directory of fake toolchain
//! scripts. The binary runs with `PATH` pointing only at those scripts, so
//! which strategy gets picked is decided by which scripts exist.
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub struct ThesisFixture {
    _temp_dir: TempDir,
    pub root: PathBuf,
    pub bin_dir: PathBuf,
    pub tool_log: PathBuf,
}

impl ThesisFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let base = temp_dir.path().canonicalize().expect("canonical temp dir");
        let root = base.join("thesis");
        let bin_dir = base.join("fake-bin");
        fs::create_dir_all(&root).expect("create project root");
        fs::create_dir_all(&bin_dir).expect("create fake bin dir");
        Self {
            _temp_dir: temp_dir,
            root,
            bin_dir,
            tool_log: base.join("tools.log"),
        }
    }

    /// Main document plus one chapter.
    pub fn minimal_thesis() -> Self {
        let fixture = Self::new();
        fixture.write("main.tex", "\\documentclass{report}\n\\input{chapters/intro}\n");
        fixture.write("chapters/intro.tex", "\\chapter{Intro}\n");
        fixture
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directory");
        }
        fs::write(&path, contents.as_bytes()).expect("write file");
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.root.join(rel)).expect("read file")
    }

    pub fn workspace(&self) -> PathBuf {
        self.root.join("build")
    }

    /// Install a fake tool that logs its argv, runs `body`, and exits with `code`.
    pub fn install_tool(&self, name: &str, body: &str, code: i32) {
        let path = self.bin_dir.join(name);
        let script = format!(
            "#!/bin/sh\necho \"{name} $*\" >> '{log}'\n{body}\nexit {code}\n",
            log = self.tool_log.display()
        );
        fs::write(&path, script.as_bytes()).expect("write fake tool");
        let mut perms = fs::metadata(&path).expect("stat fake tool").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("chmod fake tool");
    }

    /// Fake macro processor: writes the PDF and a cross-reference file.
    pub fn install_engine(&self, cites: bool, code: i32) {
        let aux = if cites {
            "printf '\\\\relax\\n\\\\citation{knuth84}\\n' > main.aux"
        } else {
            "printf '\\\\relax\\n' > main.aux"
        };
        self.install_tool("pdflatex", &format!("{aux}\nprintf '%%PDF' > main.pdf"), code);
    }

    /// Lines written by the fake tools, in invocation order.
    pub fn tool_calls(&self) -> Vec<String> {
        match fs::read_to_string(&self.tool_log) {
            Ok(text) => text.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.run_in(&self.root, args)
    }

    pub fn run_in(&self, cwd: &Path, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_thesis-build"))
            .args(args)
            .current_dir(cwd)
            .env("PATH", &self.bin_dir)
            .env_remove("THESIS_BUILD_LOG")
            .output()
            .expect("run thesis-build")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
