use loader::{load_rules, Severity};
use std::fs;
use tempfile::tempdir;

#[test]
fn parses_severities_case_insensitively() {
    assert_eq!("info".parse::<Severity>().unwrap(), Severity::Info);
    assert_eq!("WARNING".parse::<Severity>().unwrap(), Severity::Warning);
    assert_eq!("Error".parse::<Severity>().unwrap(), Severity::Error);
    assert!("critical".parse::<Severity>().is_err());
}

#[test]
fn severities_are_ordered() {
    assert!(Severity::Info < Severity::Warning);
    assert!(Severity::Warning < Severity::Error);
}

#[test]
fn rejects_unknown_severity() -> anyhow::Result<()> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("rules.yaml"),
        r#"rules:
- id: test.rule
  languages: [python]
  pattern: foo()
  message: test
  severity: UNKNOWN
"#,
    )?;
    let err = load_rules(dir.path()).unwrap_err();
    assert!(err.to_string().contains("unknown severity"));
    Ok(())
}

#[test]
fn default_severity_is_warning() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let file = dir.path().join("rules.yaml");
    fs::write(
        &file,
        r#"rules:
- id: test.rule
  languages: [python]
  pattern: foo()
  message: test
"#,
    )?;
    let rs = load_rules(&file)?;
    assert_eq!(rs.rules()[0].severity, Severity::Warning);
    Ok(())
}

#[test]
fn severity_serializes_uppercase() {
    let sev: Severity = serde_yaml::from_str("ERROR").unwrap();
    assert_eq!(sev, Severity::Error);
    assert_eq!(sev.to_string(), "ERROR");
    assert_eq!(sev.as_str(), "error");
}
