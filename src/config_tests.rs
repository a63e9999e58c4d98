use super::*;

fn write_config(root: &Path, contents: &str) {
    fs::write(root.join(CONFIG_FILE_NAME), contents.as_bytes()).expect("write config");
}

#[test]
fn missing_config_file_uses_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = BuildConfig::load(dir.path()).expect("load config");
    assert_eq!(config.toolchain, ToolchainConfig::default());
    assert_eq!(config.layout, ProjectLayout::default());
    assert_eq!(
        config.workspace(),
        dir.path().canonicalize().expect("canonical").join("build")
    );
}

#[test]
fn config_file_overrides_toolchain_programs() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_config(
        dir.path(),
        r#"{"schema_version": 1, "toolchain": {"engine": "xelatex", "bibliography": "biber"}}"#,
    );
    let config = BuildConfig::load(dir.path()).expect("load config");
    assert_eq!(config.toolchain.driver, DEFAULT_DRIVER);
    assert_eq!(config.toolchain.engine, "xelatex");
    assert_eq!(config.toolchain.bibliography, "biber");
}

#[test]
fn rejects_unknown_schema_version() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_config(dir.path(), r#"{"schema_version": 7}"#);
    let err = BuildConfig::load(dir.path()).expect_err("schema mismatch");
    assert!(err.to_string().contains("schema_version 7"), "{err:#}");
}

#[test]
fn rejects_unknown_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_config(
        dir.path(),
        r#"{"schema_version": 1, "workspace": "elsewhere"}"#,
    );
    assert!(BuildConfig::load(dir.path()).is_err());
}

#[test]
fn rejects_program_with_arguments_or_path() {
    let with_args = ConfigFile {
        schema_version: CONFIG_SCHEMA_VERSION,
        toolchain: ToolchainConfig {
            engine: "pdflatex -shell-escape".to_string(),
            ..ToolchainConfig::default()
        },
    };
    let err = validate_config(&with_args).expect_err("arguments rejected");
    assert!(err.to_string().contains("toolchain.engine"), "{err:#}");

    let with_path = ConfigFile {
        schema_version: CONFIG_SCHEMA_VERSION,
        toolchain: ToolchainConfig {
            driver: "/usr/bin/latexmk".to_string(),
            ..ToolchainConfig::default()
        },
    };
    assert!(validate_config(&with_path).is_err());

    let empty = ConfigFile {
        schema_version: CONFIG_SCHEMA_VERSION,
        toolchain: ToolchainConfig {
            bibliography: "  ".to_string(),
            ..ToolchainConfig::default()
        },
    };
    assert!(validate_config(&empty).is_err());
}

#[test]
fn relative_path_validation() {
    assert!(validate_relative_path(Path::new("build"), "workspace").is_ok());
    assert!(validate_relative_path(Path::new("out/build"), "workspace").is_ok());
    assert!(validate_relative_path(Path::new("../build"), "workspace").is_err());
    assert!(validate_relative_path(Path::new("/tmp/build"), "workspace").is_err());
    assert!(validate_relative_path(Path::new(""), "workspace").is_err());
}

#[test]
fn job_name_strips_extension() {
    let layout = ProjectLayout::default();
    assert_eq!(layout.job_name().expect("job name"), "main");
    assert_eq!(layout.main_document_arg().expect("arg"), "main.tex");
}
