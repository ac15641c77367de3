use assert_cmd::prelude::*;
use predicates::str::contains;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

const RULE: &str = r#"rules:
  - id: os-system
    pattern: os.system(...)
    message: os.system call
    languages: [python]
    severity: WARNING
"#;

fn write_rules(dir: &Path) -> std::io::Result<std::path::PathBuf> {
    let rules_dir = dir.join("rules");
    fs::create_dir_all(&rules_dir)?;
    fs::write(rules_dir.join("rule.yaml"), RULE)?;
    Ok(rules_dir)
}

fn sastgate() -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("sastgate")?;
    cmd.env_remove("RUST_LOG").arg("--quiet");
    Ok(cmd)
}

#[test]
fn clean_scan_exits_zero() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let rules = write_rules(tmp.path())?;
    fs::write(tmp.path().join("app.py"), "print('hi')\n")?;

    sastgate()?
        .arg("--rules")
        .arg(&rules)
        .arg(tmp.path().join("app.py"))
        .assert()
        .code(0);
    Ok(())
}

#[test]
fn findings_at_threshold_exit_one() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let rules = write_rules(tmp.path())?;
    let src = tmp.path().join("src");
    fs::create_dir(&src)?;
    fs::write(src.join("app.py"), "import os\nos.system(cmd)\n")?;

    sastgate()?
        .arg("--rules")
        .arg(&rules)
        .arg(&src)
        .assert()
        .code(1)
        .stdout(contains("os-system"));

    sastgate()?
        .arg("--rules")
        .arg(&rules)
        .arg("--severity-threshold")
        .arg("error")
        .arg(&src)
        .assert()
        .code(0);

    sastgate()?
        .arg("--rules")
        .arg(&rules)
        .arg("--no-fail-on-finding")
        .arg(&src)
        .assert()
        .code(0);
    Ok(())
}

#[test]
fn unparsable_file_does_not_change_exit_code() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let rules = write_rules(tmp.path())?;
    let src = tmp.path().join("src");
    fs::create_dir(&src)?;
    for i in 0..9 {
        fs::write(src.join(format!("ok_{i}.py")), "print('fine')\n")?;
    }
    fs::write(src.join("broken.py"), "def broken(:\n")?;

    let output = sastgate()?
        .arg("--rules")
        .arg(&rules)
        .arg("--format")
        .arg("json")
        .arg(&src)
        .output()?;
    assert_eq!(output.status.code(), Some(0));
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(doc["errors"].as_array().unwrap().len(), 1);
    assert_eq!(doc["errors"][0]["severity"], "WARNING");
    assert_eq!(doc["summary"]["files_scanned"], 9);
    Ok(())
}

#[test]
fn scan_errors_exit_two() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let rules = write_rules(tmp.path())?;
    fs::write(tmp.path().join("notes.txt"), "nothing to scan\n")?;

    sastgate()?
        .arg("--rules")
        .arg(&rules)
        .arg(tmp.path().join("notes.txt"))
        .assert()
        .code(2)
        .stderr(contains("no files matched"));

    sastgate()?
        .arg("--rules")
        .arg(tmp.path().join("missing-rules"))
        .arg(tmp.path())
        .assert()
        .code(2)
        .stderr(contains("failed to load rules"));

    let bad = tmp.path().join("bad.yaml");
    fs::write(&bad, "rules:\n  - id: broken\n    languages: [python]\n    message: m\n    pattern: foo(\n")?;
    sastgate()?
        .arg("--rules")
        .arg(&bad)
        .arg(tmp.path())
        .assert()
        .code(2);

    sastgate()?.arg(tmp.path()).assert().code(2).stderr(contains("no rules given"));
    Ok(())
}

#[test]
fn invalid_format_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    sastgate()?
        .arg("--rules")
        .arg("rules")
        .arg("--format")
        .arg("xml")
        .arg(".")
        .assert()
        .code(2)
        .stderr(contains("unknown output format"));
    Ok(())
}

#[test]
fn threshold_removes_lower_findings_from_the_report() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let rules = write_rules(tmp.path())?;
    fs::write(
        rules.join("eval.yaml"),
        "rules:\n  - id: python-eval\n    pattern: eval(...)\n    message: eval call\n    languages: [python]\n    severity: ERROR\n",
    )?;
    let app = tmp.path().join("app.py");
    fs::write(&app, "import os\nos.system(cmd)\neval(data)\n")?;

    let output = sastgate()?
        .arg("--rules")
        .arg(&rules)
        .arg("--severity-threshold")
        .arg("error")
        .arg("--format")
        .arg("json")
        .arg(&app)
        .output()?;
    assert_eq!(output.status.code(), Some(1));
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let findings = doc["findings"].as_array().ok_or("findings missing")?;
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0]["rule_id"], "python-eval");
    assert_eq!(doc["summary"]["findings"], 1);
    assert_eq!(doc["summary"]["warning"], 0);
    Ok(())
}
