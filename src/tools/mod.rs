//! Tool registry
//!
//! The fixed catalog of operations the conversation layer may call. Each
//! tool routes to one [`SynkctlClient`] operation and wraps the result in a
//! [`ToolOutcome`].

pub mod args;
pub mod definitions;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::DeviceError;
use crate::synkctl::{CommandRunner, SynkctlClient, SynkctlRunner};
use args::{DeviceArgs, UpdateArgs};
pub use definitions::ToolDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    BatteryState,
    GridState,
    InputState,
    InverterSettings,
    InverterUpdate,
    LoadState,
}

impl ToolName {
    pub const ALL: [ToolName; 6] = [
        ToolName::BatteryState,
        ToolName::GridState,
        ToolName::InputState,
        ToolName::InverterSettings,
        ToolName::InverterUpdate,
        ToolName::LoadState,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::BatteryState => "battery_state",
            ToolName::GridState => "grid_state",
            ToolName::InputState => "input_state",
            ToolName::InverterSettings => "inverter_settings",
            ToolName::InverterUpdate => "inverter_update",
            ToolName::LoadState => "load_state",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .iter()
            .copied()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| ToolError::new(format!("Unknown tool: {}", s)))
    }
}

/// A failed operation. The action that produced it should not be retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ToolError {
    /// The reason for the error
    pub message: String,
}

impl ToolError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<DeviceError> for ToolError {
    fn from(error: DeviceError) -> Self {
        Self::new(error.to_string())
    }
}

/// Result of a tool call as handed back to the language model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolOutcome {
    Ok(Value),
    Error(ToolError),
}

impl ToolOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ToolOutcome::Ok(_))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"error":{{"message":"Failed to serialize tool result: {}"}}}}"#, e)
        })
    }
}

impl From<Result<Value, ToolError>> for ToolOutcome {
    fn from(result: Result<Value, ToolError>) -> Self {
        match result {
            Ok(value) => ToolOutcome::Ok(value),
            Err(error) => ToolOutcome::Error(error),
        }
    }
}

fn record<T: Serialize>(result: Result<T, DeviceError>) -> Result<Value, ToolError> {
    let record = result?;
    serde_json::to_value(record)
        .map_err(|e| ToolError::new(format!("Failed to serialize record: {}", e)))
}

/// Catalog of callable tools backed by a synkctl client
#[derive(Debug)]
pub struct ToolRegistry<R = SynkctlRunner> {
    client: SynkctlClient<R>,
}

impl<R: CommandRunner> ToolRegistry<R> {
    pub fn new(client: SynkctlClient<R>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &SynkctlClient<R> {
        &self.client
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        definitions::all()
    }

    /// Calls a tool by name. Never fails; errors become [`ToolOutcome::Error`].
    pub fn call(&self, name: &str, arguments: &Value) -> ToolOutcome {
        info!("Tool call {} {}", name, arguments);
        let outcome = ToolOutcome::from(
            name.parse::<ToolName>()
                .and_then(|tool| self.dispatch(tool, arguments)),
        );
        if let ToolOutcome::Error(error) = &outcome {
            warn!("Tool {} failed: {}", name, error);
        }
        outcome
    }

    pub fn dispatch(&self, tool: ToolName, arguments: &Value) -> Result<Value, ToolError> {
        let invalid =
            |reason: String| ToolError::new(format!("Invalid arguments for {}: {}", tool, reason));

        let device = || {
            args::parse::<DeviceArgs>(arguments)
                .map(|args| args.device())
                .map_err(invalid)
        };

        match tool {
            ToolName::BatteryState => record(self.client.battery_state(device()?)),
            ToolName::GridState => record(self.client.grid_state(device()?)),
            ToolName::InputState => record(self.client.input_state(device()?)),
            ToolName::InverterSettings => record(self.client.inverter_settings(device()?)),
            ToolName::LoadState => record(self.client.load_state(device()?)),
            ToolName::InverterUpdate => {
                let args: UpdateArgs = args::parse(arguments).map_err(invalid)?;
                let settings = args.settings().map_err(invalid)?;
                record(self.client.inverter_update(args.device(), settings))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synkctl::client::tests::MockRunner;
    use crate::synkctl::Subcommand;
    use serde_json::json;

    fn registry(runner: MockRunner) -> ToolRegistry<MockRunner> {
        ToolRegistry::new(SynkctlClient::new(runner))
    }

    #[test]
    fn test_tool_name_round_trip() {
        for tool in ToolName::ALL {
            assert_eq!(tool.as_str().parse::<ToolName>().unwrap(), tool);
        }
        assert!("solar_state".parse::<ToolName>().is_err());
    }

    #[test]
    fn test_battery_state_outcome() {
        let registry = registry(MockRunner::new().with_inverter());
        let outcome = registry.call("battery_state", &json!({}));
        assert_eq!(
            outcome,
            ToolOutcome::Ok(json!({
                "bmsSoc": 94,
                "bmsVolt": 53.2,
                "voltage": 53.3,
                "isCharging": false,
                "temp": 23.9,
                "power": {"power": 61, "direction": "flowing from the battery"}
            }))
        );
    }

    #[test]
    fn test_device_failure_becomes_error_record() {
        let registry = registry(MockRunner::new().fail(Subcommand::Grid, "Error: unauthorized\ntrace"));
        let outcome = registry.call("grid_state", &json!({"inverter_serial_number": 12}));
        assert_eq!(outcome, ToolOutcome::Error(ToolError::new("Error: unauthorized")));
        assert_eq!(
            outcome.to_json(),
            r#"{"error":{"message":"Error: unauthorized"}}"#
        );
    }

    #[test]
    fn test_unknown_tool() {
        let registry = registry(MockRunner::new());
        let outcome = registry.call("reboot_inverter", &json!({}));
        assert_eq!(
            outcome,
            ToolOutcome::Error(ToolError::new("Unknown tool: reboot_inverter"))
        );
        assert!(registry.client().runner().calls().is_empty());
    }

    #[test]
    fn test_invalid_arguments() {
        let registry = registry(MockRunner::new().with_inverter());
        let outcome = registry.call("load_state", &json!({"inverter_serial_number": "abc"}));
        assert!(!outcome.is_ok());
        assert!(registry.client().runner().calls().is_empty());
    }

    #[test]
    fn test_inverter_update_dispatch() {
        let registry = registry(MockRunner::new().with_inverter());
        let outcome = registry.call(
            "inverter_update",
            &json!({"inverter_serial_number": 7, "essential_only": false}),
        );
        assert_eq!(
            outcome,
            ToolOutcome::Ok(json!({"applied": {"essentialOnly": false}}))
        );
        assert_eq!(
            registry.client().runner().calls(),
            vec![vec!["inverter", "update", "-i", "7", "--essential-only", "off"]]
        );
    }

    #[test]
    fn test_inverter_update_without_settings() {
        let registry = registry(MockRunner::new().with_inverter());
        let outcome = registry.call("inverter_update", &Value::Null);
        assert_eq!(outcome, ToolOutcome::Ok(json!({"applied": {}})));
        assert_eq!(
            registry.client().runner().calls(),
            vec![vec!["inverter", "update"]]
        );
    }

    #[test]
    fn test_inverter_update_rejects_bad_soc() {
        let registry = registry(MockRunner::new().with_inverter());
        let outcome = registry.call("inverter_update", &json!({"minimum_battery_soc": 101}));
        assert!(!outcome.is_ok());
        assert!(registry.client().runner().calls().is_empty());
    }

    #[test]
    fn test_input_and_load_outcomes() {
        let registry = registry(MockRunner::new().with_inverter());
        assert_eq!(
            registry.call("input_state", &json!({})),
            ToolOutcome::Ok(json!({"power": 2480, "peakPower": 5500}))
        );
        assert_eq!(
            registry.call("load_state", &json!({})),
            ToolOutcome::Ok(json!({"power": 700}))
        );
    }

    #[test]
    fn test_records_match_declared_output() {
        let registry = registry(MockRunner::new().with_inverter());
        for tool in ToolName::ALL {
            let record = match registry.call(tool.as_str(), &json!({"grid_charge": true})) {
                ToolOutcome::Ok(record) => record,
                ToolOutcome::Error(e) => panic!("{} failed: {}", tool, e),
            };
            let schema = definitions::record_schema(tool);
            let mut declared: Vec<&str> = schema["required"]
                .as_array()
                .unwrap()
                .iter()
                .map(|key| key.as_str().unwrap())
                .collect();
            let mut actual: Vec<&str> = record.as_object().unwrap().keys().map(String::as_str).collect();
            declared.sort_unstable();
            actual.sort_unstable();
            assert_eq!(declared, actual, "{}", tool);
        }
    }
}
