use mock_dispatch::{logging, Mock, MockConfig, MockError, Value};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_file_config_drives_mock_behavior() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[behavior]\nthrow_when_not_setup = true\ncall_base_class = true").unwrap();

    let mock = Mock::with_config("Repo", MockConfig::load(file.path()).unwrap());
    assert!(matches!(
        mock.invoke_method("Find", vec![Value::from(1)]),
        Err(MockError::NotSetup { .. })
    ));
    assert!(mock.config().behavior.call_base_class);
}

#[test]
fn test_broken_config_falls_back_to_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[behavior\nthrow_when_not_setup = ").unwrap();

    assert!(matches!(
        MockConfig::load(file.path()),
        Err(MockError::Config(_))
    ));
    let config = MockConfig::load_or_default(file.path());
    assert!(!config.is_strict());
}

#[test]
fn test_logging_init_is_idempotent() {
    logging::init("debug", false);
    logging::init("trace", true);

    let mock = Mock::new("Logged");
    mock.invoke_method("Ping", vec![]).unwrap();
    assert_eq!(mock.ledger().len(), 1);
}
