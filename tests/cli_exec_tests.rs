//! End-to-end tests for `ecmatrix exec` commands.

mod fixtures;
use fixtures::*;

fn exec(config_path: &std::path::PathBuf, tokens: &[&str]) -> std::process::Output {
    ecmatrix_command(config_path)
        .args(["exec", "--no-color"])
        .args(tokens)
        .output()
        .expect("Failed to execute command")
}

// ============================================================================
// Calibration Start Tests
// ============================================================================

#[test]
fn test_exec_calibration_start_renders_progress() {
    let config = test_config(vec![device("adc0")]);
    let (config_path, _temp) = create_temp_config_file(&config);

    let output = exec(&config_path, &["ec", "adc0", "calibration", "start"]);

    assert_eq!(
        output.status.code(),
        Some(0),
        "Calibration should succeed. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let expected = "Low value sampling begins. Please do not press any keys\n\
                    ******\n\
                    High value sampling begins. Please slowly press each key in sequence, releasing once an asterisk appears\n\
                    ******\n\
                    Calibration complete!\n";
    assert_eq!(stdout, expected);
}

#[test]
fn test_exec_calibration_start_failure_reports_code() {
    let mut failing = device("adc0");
    failing.calibration_error = Some(-5);
    let config = test_config(vec![failing]);
    let (config_path, _temp) = create_temp_config_file(&config);

    let output = exec(&config_path, &["ec", "adc0", "calibration", "start"]);

    assert_ne!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Failed to start calibration (-5)"),
        "stdout: {stdout}"
    );
    assert!(!stdout.contains("Calibration complete!"));
}

#[test]
fn test_exec_calibration_start_most_negative_fault_code() {
    let mut failing = device("adc0");
    failing.calibration_error = Some(i32::MIN);
    let config = test_config(vec![failing]);
    let (config_path, _temp) = create_temp_config_file(&config);

    let output = exec(&config_path, &["ec", "adc0", "calibration", "start"]);

    assert_eq!(
        output.status.code(),
        Some(3),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Failed to start calibration (-2147483648)"),
        "stdout: {stdout}"
    );
}

// ============================================================================
// Save / Load Tests
// ============================================================================

#[test]
fn test_exec_calibration_load_stored_calibration() {
    let mut stored = device("adc0");
    stored.has_stored_calibration = true;
    let config = test_config(vec![stored]);
    let (config_path, _temp) = create_temp_config_file(&config);

    let output = exec(&config_path, &["ec", "adc0", "calibration", "load"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
    assert!(!String::from_utf8_lossy(&output.stderr).contains("Error"));
}

#[test]
fn test_exec_calibration_load_empty_store_fails() {
    let config = test_config(vec![device("adc0")]);
    let (config_path, _temp) = create_temp_config_file(&config);

    let output = exec(&config_path, &["ec", "adc0", "calibration", "load"]);

    assert_eq!(output.status.code(), Some(3));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Failed to initiate load calibration (-2)"));
}

#[test]
fn test_exec_calibration_save_storage_fault() {
    let mut faulty = device("adc0");
    faulty.storage_error = Some(-28);
    let config = test_config(vec![faulty]);
    let (config_path, _temp) = create_temp_config_file(&config);

    let output = exec(&config_path, &["ec", "adc0", "calibration", "save"]);

    assert_eq!(output.status.code(), Some(3));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Failed to initiate save calibration (-28)"));
}

#[test]
fn test_exec_settings_commands_absent_when_disabled() {
    let mut config = test_config(vec![device("adc0")]);
    config.features.settings = false;
    let (config_path, _temp) = create_temp_config_file(&config);

    let output = exec(&config_path, &["ec", "adc0", "calibration", "save"]);

    assert_eq!(output.status.code(), Some(3));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("unknown parameter: save"));
}

// ============================================================================
// Scan Rate Tests
// ============================================================================

#[test]
fn test_exec_scan_rate() {
    let mut timed = device("adc0");
    timed.max_scan_duration_ns = 1_000_000;
    let config = test_config(vec![timed]);
    let (config_path, _temp) = create_temp_config_file(&config);

    let output = exec(&config_path, &["ec", "adc0", "scan_rate"]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Matrix scan rate: 1000Hz\n"
    );
}

#[test]
fn test_exec_scan_rate_unknown_is_silent() {
    let config = test_config(vec![device("adc0")]);
    let (config_path, _temp) = create_temp_config_file(&config);

    let output = exec(&config_path, &["ec", "adc0", "scan_rate"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
}

// ============================================================================
// Resolver Tests
// ============================================================================

#[test]
fn test_exec_unknown_device() {
    let config = test_config(vec![device("adc0")]);
    let (config_path, _temp) = create_temp_config_file(&config);

    let output = exec(&config_path, &["ec", "adc1", "scan_rate"]);

    assert_eq!(output.status.code(), Some(3));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ec: unknown parameter: adc1"));
}

#[test]
fn test_exec_selects_second_device() {
    let mut right = device("right");
    right.max_scan_duration_ns = 250_000;
    let config = test_config(vec![device("left"), right]);
    let (config_path, _temp) = create_temp_config_file(&config);

    let output = exec(&config_path, &["ec", "right", "scan_rate"]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Matrix scan rate: 4000Hz\n"
    );
}

#[test]
fn test_exec_invalid_config() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        "[[devices]]\nname = \"adc0\"\n\n[[devices]]\nname = \"adc0\"\n",
    )
    .unwrap();

    let output = exec(&config_path, &["ec", "adc0", "scan_rate"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("duplicate device name 'adc0'"), "stderr: {stderr}");
}
