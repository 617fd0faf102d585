//! Normalized inverter records
//!
//! Records are built fresh for every call and serialized with the field
//! names the language model sees.

use serde::{Deserialize, Serialize};

/// Which way power flows through the battery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerDirection {
    #[serde(rename = "flowing into the battery")]
    IntoBattery,
    #[serde(rename = "flowing from the battery")]
    FromBattery,
}

/// Battery power as magnitude plus explicit direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Power {
    /// W, never negative
    pub power: u64,
    pub direction: PowerDirection,
}

impl Power {
    /// Converts synkctl's signed battery power (negative = charging).
    ///
    /// Zero is reported as flowing from the battery.
    pub fn from_signed(watts: i64) -> Self {
        let direction = if watts < 0 {
            PowerDirection::IntoBattery
        } else {
            PowerDirection::FromBattery
        };
        Self {
            power: watts.unsigned_abs(),
            direction,
        }
    }

    pub fn is_charging(&self) -> bool {
        self.direction == PowerDirection::IntoBattery
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Battery {
    pub bms_soc: i64,   // %
    pub bms_volt: f64,  // V (BMS)
    pub voltage: f64,   // V (inverter)
    pub is_charging: bool,
    pub temp: f64,      // °C
    pub power: Power,
}

impl Battery {
    pub fn new(bms_soc: i64, bms_volt: f64, voltage: f64, temp: f64, power: Power) -> Self {
        Self {
            bms_soc,
            bms_volt,
            voltage,
            is_charging: power.is_charging(),
            temp,
            power,
        }
    }
}

/// Grid connection. `power` keeps synkctl's sign convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    pub power: i64, // W
    pub is_up: bool,
}

/// Input source, e.g. solar panels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    pub power: i64,      // W
    pub peak_power: i64, // W
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Load {
    pub power: i64, // W
}

/// Inverter settings together with the current power flows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inverter {
    pub rated_power: i64,  // W
    pub load_power: i64,   // W
    pub battery_power: Power,
    pub input_power: i64,  // W
    pub grid_power: i64,   // W
    #[serde(rename = "batteryMinimumSoCLimit")]
    pub battery_minimum_soc_limit: i64, // %
    pub power_essential_only: bool,
    pub grid_charge: bool,
}

/// Settings to change. `None` leaves the device value untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InverterSettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_battery_soc: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub essential_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_charge: Option<bool>,
}

impl InverterSettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.minimum_battery_soc.is_none()
            && self.essential_only.is_none()
            && self.grid_charge.is_none()
    }
}

/// Confirmation that synkctl accepted an update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReceipt {
    pub applied: InverterSettingsUpdate,
}
