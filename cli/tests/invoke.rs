use pretty_assertions::assert_eq;
use std::path::Path;
use std::process::Command;

fn uitrack(root: &Path, tool: &str, params: &str) -> (bool, serde_json::Value) {
    let output = Command::new(env!("CARGO_BIN_EXE_uitrack"))
        .arg("--root")
        .arg(root)
        .arg("--compact")
        .arg(tool)
        .arg(params)
        .env_remove("UITRACK_ROOT")
        .output()
        .expect("failed to run uitrack");

    let stdout = String::from_utf8(output.stdout).expect("stdout is not UTF-8");
    let value = serde_json::from_str(stdout.trim()).expect("stdout is not JSON");
    (output.status.success(), value)
}

#[test]
fn drives_a_run_from_the_command_line() {
    let tempdir = tempfile::tempdir().expect("failed to create temp dir");
    let root = tempdir.path().join("project");

    let (ok, init) = uitrack(&root, "init_project", "{}");
    assert!(ok);
    assert_eq!(init["created"], true);

    let (ok, _) = uitrack(
        &root,
        "create_scenario",
        r#"{"slug": "login", "title": "Login", "steps": [{"id": "01", "title": "Open"}, {"id": "02", "title": "Submit"}]}"#,
    );
    assert!(ok);

    let (ok, started) = uitrack(&root, "start_run", r#"{"scenarioSlug": "login"}"#);
    assert!(ok);
    assert_eq!(started["runNumber"], 1);
    let run_id = started["runId"].as_str().unwrap().to_string();

    let (ok, step) = uitrack(
        &root,
        "complete_step",
        &format!(r#"{{"runId": "{run_id}", "stepId": "01", "status": "pass", "duration": 250}}"#),
    );
    assert!(ok);
    assert_eq!(step["nextStepId"], "02");

    let (ok, done) = uitrack(
        &root,
        "complete_run",
        &format!(r#"{{"runId": "{run_id}", "status": "pass", "duration": 800}}"#),
    );
    assert!(ok);
    assert_eq!(done["stats"]["totalRuns"], 1);
    assert_eq!(done["stats"]["avgDuration"], 800);

    let (ok, again) = uitrack(
        &root,
        "complete_run",
        &format!(r#"{{"runId": "{run_id}", "status": "pass", "duration": 800}}"#),
    );
    assert!(!ok);
    assert_eq!(again["error"]["kind"], "RunAlreadyCompleted");
}

#[test]
fn reports_uninitialized_projects() {
    let tempdir = tempfile::tempdir().expect("failed to create temp dir");

    let (ok, response) = uitrack(
        &tempdir.path().join("nowhere"),
        "start_run",
        r#"{"scenarioSlug": "login"}"#,
    );

    assert!(!ok);
    assert_eq!(response["error"]["kind"], "NotInitialized");
}

#[test]
fn rejects_invalid_parameters() {
    let tempdir = tempfile::tempdir().expect("failed to create temp dir");

    let (ok, response) = uitrack(tempdir.path(), "start_run", r#"{"slug": "login"}"#);

    assert!(!ok);
    assert_eq!(response["error"]["kind"], "ValidationError");
}
