use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "nightwatch-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_nightwatch-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("survive-night"));
}

#[test]
fn cli_smoke_run_writes_json_report() {
    let exe = env!("CARGO_BIN_EXE_nightwatch-tester");
    let output_path = temp_path("run");
    let output = Command::new(exe)
        .args([
            "--report",
            "json",
            "--scenarios",
            "smoke",
            "--nights",
            "1,2",
            "--iterations",
            "1",
            "--seeds",
            "1",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Nightwatch Automated Tester"));

    let content = std::fs::read_to_string(output_path).expect("read output");
    let results: serde_json::Value = serde_json::from_str(&content).expect("json report");
    let runs = results.as_array().expect("array of results");
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|r| r["passed"] == true));
}

#[test]
fn cli_rejects_bad_nights() {
    let exe = env!("CARGO_BIN_EXE_nightwatch-tester");
    let output = Command::new(exe)
        .args(["--nights", "9", "--iterations", "1"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
}
