//! Integration tests for synkbot
//!
//! These tests run the real subprocess runner against a fake synkctl shell
//! script, so no inverter or language model is required.

use serde_json::json;
use std::time::{Duration, Instant};
use synkbot::config::{Config, ConfigError, LogLevel};
use synkbot::errors::{DeviceError, LlmError};
use synkbot::synkctl::{CommandRunner, DeviceId, SynkctlClient, SynkctlRunner};
use synkbot::tools::{ToolError, ToolOutcome, ToolRegistry};

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
            [default]
            log_level = "WARN"

            [synkctl]
            command = "/opt/synk/bin/synkctl"
            timeout = "5s"

            [llm]
            endpoint = "http://ollama.lan:11434"
            model = "qwen3:8b"
            history_limit = 10
            system_prompt = "Be brief."
        "#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.default.log_level, LogLevel::Warn);
    assert_eq!(config.synkctl.command, "/opt/synk/bin/synkctl");
    assert_eq!(config.synkctl.timeout, Duration::from_secs(5));
    assert_eq!(config.llm.endpoint, "http://ollama.lan:11434");
    assert_eq!(config.llm.model, "qwen3:8b");
    assert_eq!(config.llm.history_limit, 10);
    assert_eq!(config.llm.system_prompt.as_deref(), Some("Be brief."));
}

#[test]
fn test_config_file_not_found() {
    let err = Config::from_file("/definitely/not/here/config.toml").unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));
    assert!(err.to_string().contains("/definitely/not/here/config.toml"));
}

#[test]
fn test_config_validation_error() {
    let err = Config::from_toml("[llm]\nmodel = \"  \"\n").unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}

// ============================================================================
// Error Type Tests
// ============================================================================

#[test]
fn test_device_error_display() {
    let error = DeviceError::CommandFailed("Error: not logged in".to_string());
    assert_eq!(error.to_string(), "Error: not logged in");

    let error = DeviceError::MissingField("bmsSoc");
    assert!(error.to_string().contains("bmsSoc"));

    let error = DeviceError::Timeout {
        command: "synkctl battery get --short".to_string(),
        timeout: Duration::from_secs(30),
    };
    let error_string = error.to_string();
    assert!(error_string.contains("synkctl battery get --short"));
    assert!(error_string.contains("30s"));
}

#[test]
fn test_llm_error_display() {
    let error = LlmError::Status {
        status: 404,
        body: "model not found".to_string(),
    };
    let error_string = error.to_string();
    assert!(error_string.contains("404"));
    assert!(error_string.contains("model not found"));
}

#[test]
fn test_error_types_implement_std_error() {
    let device_err = DeviceError::MissingField("pac");
    let _: &dyn std::error::Error = &device_err;

    let llm_err = LlmError::TooManyToolRounds(8);
    let _: &dyn std::error::Error = &llm_err;

    let tool_err = ToolError::from(device_err);
    let _: &dyn std::error::Error = &tool_err;
}

// ============================================================================
// Subprocess Tests (fake synkctl)
// ============================================================================

#[cfg(unix)]
mod subprocess {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    // Writing and executing scripts concurrently can fail with ETXTBSY
    static SERIAL: Mutex<()> = Mutex::new(());

    const FAKE_SYNKCTL: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/calls.log"
case "$1 $2" in
"battery get") echo '{"bmsSoc":76,"bmsVolt":52.1,"voltage":52.0,"temp":21.5,"power":-1800,"current":-34.6}' ;;
"grid get") echo '{"pac":-250,"acRealyStatus":1,"fac":50.01}' ;;
"input get") echo '{"pac":3120,"pvIV":[]}' ;;
"plant get") echo '{"id":1,"name":"Home","totalPower":5.5}' ;;
"load get") echo 'Error: session expired' >&2; echo 'Please log in again' >&2; exit 3 ;;
"inverter settings") echo '{"battery-capacity":"20","essential-only":"on","grid-charge":"off"}' ;;
"inverter details") echo '{"ratePower":5000,"pac":3120}' ;;
"inverter update") exit 0 ;;
*) echo "unknown command: $*" >&2; exit 64 ;;
esac
"#;

    fn write_script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("synkctl");
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn calls(dir: &Path) -> Vec<String> {
        std::fs::read_to_string(dir.join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn client(script: &Path) -> SynkctlClient {
        SynkctlClient::new(SynkctlRunner::new(
            script.to_string_lossy(),
            Duration::from_secs(10),
        ))
    }

    #[test]
    fn test_runner_captures_output() {
        let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), FAKE_SYNKCTL);

        let runner = SynkctlRunner::new(script.to_string_lossy(), Duration::from_secs(10));
        let output = runner
            .run(&["plant".to_string(), "get".to_string()])
            .unwrap();
        assert!(output.success);
        assert_eq!(output.code, Some(0));
        assert!(output.stdout.contains("\"totalPower\":5.5"));
        assert!(output.stderr.is_empty());
    }

    #[test]
    fn test_battery_state_from_process() {
        let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), FAKE_SYNKCTL);

        let battery = client(&script).battery_state(DeviceId::new(2304071234)).unwrap();
        assert_eq!(battery.bms_soc, 76);
        assert!(battery.is_charging);
        assert_eq!(battery.power.power, 1800);
        assert_eq!(calls(dir.path()), vec!["battery get --short -i 2304071234"]);
    }

    #[test]
    fn test_failure_reports_first_stderr_line() {
        let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), FAKE_SYNKCTL);

        let err = client(&script).load_state(DeviceId::DEFAULT).unwrap_err();
        assert!(matches!(err, DeviceError::CommandFailed(_)));
        assert_eq!(err.to_string(), "Error: session expired");
    }

    #[test]
    fn test_composite_stops_at_failing_query() {
        let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), FAKE_SYNKCTL);

        // load fails, so battery and grid are never queried
        let err = client(&script)
            .inverter_settings(DeviceId::DEFAULT)
            .unwrap_err();
        assert_eq!(err.to_string(), "Error: session expired");
        assert_eq!(
            calls(dir.path()),
            vec!["inverter settings", "inverter details", "load get --short"]
        );
    }

    #[test]
    fn test_registry_against_process() {
        let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), FAKE_SYNKCTL);
        let registry = ToolRegistry::new(client(&script));

        assert_eq!(
            registry.call("input_state", &json!({})),
            ToolOutcome::Ok(json!({"power": 3120, "peakPower": 5500}))
        );
        assert_eq!(
            registry.call("grid_state", &json!({"inverter_serial_number": "0"})),
            ToolOutcome::Ok(json!({"power": -250, "isUp": true}))
        );
        assert_eq!(
            registry.call("load_state", &json!({})),
            ToolOutcome::Error(ToolError::new("Error: session expired"))
        );
        assert_eq!(
            registry.call(
                "inverter_update",
                &json!({"inverter_serial_number": 5, "minimum_battery_soc": 15, "grid_charge": true})
            ),
            ToolOutcome::Ok(json!({"applied": {"minimumBatterySoc": 15, "gridCharge": true}}))
        );

        assert_eq!(
            calls(dir.path()),
            vec![
                "input get --short",
                "plant get",
                "grid get --short",
                "load get --short",
                "inverter update -i 5 --battery-capacity 15 --grid-charge on",
            ]
        );
    }

    #[test]
    fn test_timeout_kills_process() {
        let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "#!/bin/sh\nexec sleep 30\n");

        let runner = SynkctlRunner::new(script.to_string_lossy(), Duration::from_millis(200));
        let started = Instant::now();
        let err = runner.run(&["battery".to_string()]).unwrap_err();

        assert!(matches!(err, DeviceError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_timeout_covers_inherited_output_pipes() {
        let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        // The background sleep keeps stdout open after the script itself exits
        let script = write_script(
            dir.path(),
            "#!/bin/sh\nsleep 5 &\necho '{\"pac\":1,\"acRealyStatus\":1}'\nexit 0\n",
        );

        let client = SynkctlClient::new(SynkctlRunner::new(
            script.to_string_lossy(),
            Duration::from_millis(500),
        ));
        let started = Instant::now();
        let err = client.grid_state(DeviceId::DEFAULT).unwrap_err();

        assert!(matches!(err, DeviceError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn test_timeout_reaches_tool_outcome() {
        let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "#!/bin/sh\nexec sleep 30\n");

        let registry = ToolRegistry::new(SynkctlClient::new(SynkctlRunner::new(
            script.to_string_lossy(),
            Duration::from_millis(200),
        )));
        let started = Instant::now();
        let outcome = registry.call("battery_state", &json!({"inverter_serial_number": 9}));

        match &outcome {
            ToolOutcome::Error(error) => {
                assert!(error.message.contains("did not finish within 200ms"));
                assert!(error.message.contains("battery get --short -i 9"));
            }
            other => panic!("expected an error outcome, got {:?}", other),
        }
        assert!(outcome.to_json().starts_with(r#"{"error":{"message":"#));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_malformed_output_is_an_error() {
        let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "#!/bin/sh\necho 'Logged in as demo'\n");

        let err = client(&script).grid_state(DeviceId::DEFAULT).unwrap_err();
        assert!(matches!(err, DeviceError::MalformedResponse { .. }));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let runner = SynkctlRunner::new("/nonexistent/bin/synkctl", Duration::from_secs(1));
        let err = runner.run(&["battery".to_string()]).unwrap_err();
        assert!(matches!(err, DeviceError::Spawn { .. }));
        assert!(err.to_string().contains("/nonexistent/bin/synkctl"));
    }
}
