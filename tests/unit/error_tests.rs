//! Unit tests for `AppError` display format and exit code mapping.

use session_provisioner::errors::FAILURE_EXIT_CODE;
use session_provisioner::AppError;

#[test]
fn display_uses_kind_prefix() {
    assert_eq!(AppError::Format("bad".into()).to_string(), "format: bad");
    assert_eq!(AppError::Fetch("down".into()).to_string(), "fetch: down");
    assert_eq!(AppError::Filesystem("full".into()).to_string(), "filesystem: full");
    assert_eq!(AppError::Config("x".into()).to_string(), "config: x");
    assert_eq!(AppError::Io("eof".into()).to_string(), "io: eof");
    assert_eq!(AppError::Lock("held".into()).to_string(), "lock: held");
}

#[test]
fn process_display_names_command_and_code() {
    let err = AppError::Process {
        command: "npm install".into(),
        code: Some(127),
    };
    assert_eq!(err.to_string(), "process: `npm install` exited with code 127");

    let err = AppError::Process {
        command: "npm start".into(),
        code: None,
    };
    assert!(err.to_string().contains("without an exit code"));
}

#[test]
fn process_error_propagates_child_exit_code() {
    let err = AppError::Process {
        command: "npm install".into(),
        code: Some(42),
    };
    assert_eq!(err.exit_code(), 42);
}

#[test]
fn process_error_without_code_exits_one() {
    let err = AppError::Process {
        command: "npm start".into(),
        code: None,
    };
    assert_eq!(err.exit_code(), FAILURE_EXIT_CODE);
}

#[test]
fn non_process_errors_exit_one() {
    for err in [
        AppError::Fetch("x".into()),
        AppError::Filesystem("x".into()),
        AppError::Io("x".into()),
        AppError::Lock("x".into()),
    ] {
        assert_eq!(err.exit_code(), 1, "{err}");
    }
}

#[test]
fn implements_std_error() {
    let err: Box<dyn std::error::Error> = Box::new(AppError::Fetch("x".into()));
    assert_eq!(err.to_string(), "fetch: x");
}

#[test]
fn toml_errors_convert_to_config() {
    let toml_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
    let err: AppError = toml_err.into();
    assert!(err.to_string().starts_with("config: invalid config:"));
}
