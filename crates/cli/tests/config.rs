use assert_cmd::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn config_file_supplies_rules_and_format() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let rules = tmp.path().join("rules");
    fs::create_dir(&rules)?;
    fs::write(
        rules.join("eval.yaml"),
        r#"rules:
  - id: py-eval
    pattern: eval($CODE)
    message: eval of $CODE
    languages: [python]
    severity: INFO
"#,
    )?;
    fs::write(tmp.path().join("app.py"), "eval(payload)\n")?;
    let config = tmp.path().join("sastgate.toml");
    fs::write(
        &config,
        "rules = \"rules\"\noutput_format = \"json\"\nseverityThreshold = \"warning\"\ntimeoutSeconds = 60\n",
    )?;

    let output = Command::cargo_bin("sastgate")?
        .env_remove("RUST_LOG")
        .arg("--quiet")
        .arg("--config")
        .arg(&config)
        .arg(tmp.path().join("app.py"))
        .output()?;
    // The only finding is INFO, below the configured threshold.
    assert_eq!(output.status.code(), Some(0));
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(doc["findings"][0]["message"], "eval of payload");

    Command::cargo_bin("sastgate")?
        .env_remove("RUST_LOG")
        .arg("--quiet")
        .arg("--config")
        .arg(&config)
        .arg("--severity-threshold")
        .arg("info")
        .arg(tmp.path().join("app.py"))
        .assert()
        .code(1);
    Ok(())
}

#[test]
fn unknown_config_keys_exit_two() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempdir()?;
    let config = tmp.path().join("sastgate.toml");
    fs::write(&config, "rules = \"rules\"\nverbose = true\n")?;
    Command::cargo_bin("sastgate")?
        .env_remove("RUST_LOG")
        .arg("--quiet")
        .arg("--config")
        .arg(&config)
        .arg(tmp.path())
        .assert()
        .code(2);
    Ok(())
}
