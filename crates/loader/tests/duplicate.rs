use loader::{load_rules, RuleCompilationError};
use std::fs;
use tempfile::tempdir;

#[test]
fn rejects_duplicate_ids() -> anyhow::Result<()> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("rules.yaml"),
        r#"rules:
- id: dup.rule
  languages: [python]
  pattern: foo()
  message: a
- id: dup.rule
  languages: [python]
  pattern: bar()
  message: b
"#,
    )?;
    let err = load_rules(dir.path()).unwrap_err();
    assert!(err.to_string().to_lowercase().contains("duplicate"));
    Ok(())
}

#[test]
fn rejects_duplicate_ids_across_files() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let rule = r#"rules:
- id: shared
  languages: [python]
  pattern: eval($X)
  message: eval
"#;
    fs::write(dir.path().join("a.yaml"), rule)?;
    fs::create_dir(dir.path().join("nested"))?;
    fs::write(dir.path().join("nested/b.yml"), rule)?;
    let err = load_rules(dir.path()).unwrap_err();
    assert!(matches!(err, RuleCompilationError::DuplicateId(id) if id == "shared"));
    Ok(())
}
