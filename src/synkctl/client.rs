//! synkctl client
//!
//! High-level interface to the inverter-control utility. Each operation runs
//! one or more synkctl sub-commands and normalizes their JSON output.

use serde_json::Value;
use tracing::{debug, warn};

use super::command::{switch_value, DeviceId, Subcommand};
use super::normalize::{self, InverterSources};
use super::runner::{CommandOutput, CommandRunner, SynkctlRunner};
use super::types::*;
use crate::config::SynkctlConfig;
use crate::errors::DeviceError;

/// First line of synkctl's diagnostic output
fn first_line(text: &str) -> &str {
    text.split('\n').next().unwrap_or("").trim_end_matches('\r')
}

/// Arguments for the settings present in `update`
fn update_args(update: &InverterSettingsUpdate) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(soc) = update.minimum_battery_soc {
        args.push("--battery-capacity".to_string());
        args.push(soc.to_string());
    }
    if let Some(essential_only) = update.essential_only {
        args.push("--essential-only".to_string());
        args.push(switch_value(essential_only).to_string());
    }
    if let Some(grid_charge) = update.grid_charge {
        args.push("--grid-charge".to_string());
        args.push(switch_value(grid_charge).to_string());
    }
    args
}

/// synkctl client wrapper
#[derive(Debug, Clone)]
pub struct SynkctlClient<R = SynkctlRunner> {
    runner: R,
}

impl SynkctlClient<SynkctlRunner> {
    pub fn from_config(config: &SynkctlConfig) -> Self {
        Self::new(SynkctlRunner::from_config(config))
    }
}

impl<R: CommandRunner> SynkctlClient<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Runs a sub-command and checks its exit status
    fn execute(
        &self,
        subcommand: Subcommand,
        device: DeviceId,
        extra: &[String],
    ) -> Result<CommandOutput, DeviceError> {
        let args = subcommand.command_line(device, extra);
        let output = self.runner.run(&args)?;

        if !output.success {
            let line = first_line(&output.stderr);
            warn!(
                "synkctl {} failed for inverter {} (exit code {:?}): {}",
                subcommand, device, output.code, line
            );
            let message = if line.is_empty() {
                match output.code {
                    Some(code) => format!("synkctl {} exited with status {}", subcommand, code),
                    None => format!("synkctl {} was terminated by a signal", subcommand),
                }
            } else {
                line.to_string()
            };
            return Err(DeviceError::CommandFailed(message));
        }

        Ok(output)
    }

    /// Runs a read sub-command and parses its JSON output
    fn query(&self, subcommand: Subcommand, device: DeviceId) -> Result<Value, DeviceError> {
        let output = self.execute(subcommand, device, &[])?;

        let value: Value =
            serde_json::from_str(&output.stdout).map_err(|e| DeviceError::MalformedResponse {
                command: subcommand.to_string(),
                reason: e.to_string(),
            })?;

        if !value.is_object() {
            return Err(DeviceError::MalformedResponse {
                command: subcommand.to_string(),
                reason: "expected a JSON object".to_string(),
            });
        }

        debug!("synkctl {} -> {}", subcommand, value);
        Ok(value)
    }

    /// Battery state of charge, temperature, voltages and power flow
    pub fn battery_state(&self, device: DeviceId) -> Result<Battery, DeviceError> {
        let raw = self.query(Subcommand::Battery, device)?;
        normalize::battery(&raw)
    }

    /// Grid power and relay status
    pub fn grid_state(&self, device: DeviceId) -> Result<Grid, DeviceError> {
        let raw = self.query(Subcommand::Grid, device)?;
        normalize::grid(&raw)
    }

    /// Input power and the plant's rated peak power
    pub fn input_state(&self, device: DeviceId) -> Result<Input, DeviceError> {
        let input = self.query(Subcommand::Input, device)?;
        let plant = self.query(Subcommand::Plant, device)?;
        normalize::input(&input, &plant)
    }

    /// Power consumed by the load
    pub fn load_state(&self, device: DeviceId) -> Result<Load, DeviceError> {
        let raw = self.query(Subcommand::Load, device)?;
        normalize::load(&raw)
    }

    /// Inverter settings and current power flows.
    ///
    /// Queries settings, details, load, battery and grid in that order and
    /// stops at the first failure.
    pub fn inverter_settings(&self, device: DeviceId) -> Result<Inverter, DeviceError> {
        let settings = self.query(Subcommand::InverterSettings, device)?;
        let details = self.query(Subcommand::InverterDetails, device)?;
        let load = self.query(Subcommand::Load, device)?;
        let battery = self.query(Subcommand::Battery, device)?;
        let grid = self.query(Subcommand::Grid, device)?;

        normalize::inverter(InverterSources {
            settings: &settings,
            details: &details,
            load: &load,
            battery: &battery,
            grid: &grid,
        })
    }

    /// Applies the settings present in `update`; absent settings are left as they are.
    ///
    /// An empty update still runs `inverter update` without setting flags.
    pub fn inverter_update(
        &self,
        device: DeviceId,
        update: InverterSettingsUpdate,
    ) -> Result<UpdateReceipt, DeviceError> {
        if let Some(soc) = update.minimum_battery_soc {
            if soc > 100 {
                return Err(DeviceError::InvalidArgument(format!(
                    "minimum battery state of charge must be between 0 and 100, got {}",
                    soc
                )));
            }
        }

        self.execute(Subcommand::InverterUpdate, device, &update_args(&update))?;
        Ok(UpdateReceipt { applied: update })
    }
}
