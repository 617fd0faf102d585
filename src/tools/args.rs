//! Tool arguments as sent by the language model
//!
//! Models are loose with types, so numbers and booleans are also accepted
//! as strings. Missing, null and empty values mean "not provided".

use serde::de::{Deserializer, Error as _};
use serde::Deserialize;
use serde_json::Value;

use crate::synkctl::{DeviceId, InverterSettingsUpdate};

fn loose_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a non-negative integer, got {}", n))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected a non-negative integer, got {:?}", s))),
        Some(other) => Err(D::Error::custom(format!(
            "expected a non-negative integer, got {}",
            other
        ))),
    }
}

fn loose_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" | "on" | "yes" => Ok(Some(true)),
            "false" | "off" | "no" => Ok(Some(false)),
            _ => Err(D::Error::custom(format!("expected a boolean, got {:?}", s))),
        },
        Some(other) => Err(D::Error::custom(format!("expected a boolean, got {}", other))),
    }
}

/// Arguments of the read tools
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct DeviceArgs {
    #[serde(default, deserialize_with = "loose_u64")]
    pub inverter_serial_number: Option<u64>,
}

impl DeviceArgs {
    pub fn device(&self) -> DeviceId {
        DeviceId::from(self.inverter_serial_number)
    }
}

/// Arguments of `inverter_update`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateArgs {
    #[serde(default, deserialize_with = "loose_u64")]
    pub inverter_serial_number: Option<u64>,
    #[serde(default, deserialize_with = "loose_u64")]
    pub minimum_battery_soc: Option<u64>,
    #[serde(default, deserialize_with = "loose_bool")]
    pub essential_only: Option<bool>,
    #[serde(default, deserialize_with = "loose_bool")]
    pub grid_charge: Option<bool>,
}

impl UpdateArgs {
    pub fn device(&self) -> DeviceId {
        DeviceId::from(self.inverter_serial_number)
    }

    pub fn settings(&self) -> Result<InverterSettingsUpdate, String> {
        let minimum_battery_soc = match self.minimum_battery_soc {
            Some(soc) if soc <= 100 => Some(soc as u8),
            Some(soc) => {
                return Err(format!(
                    "minimum_battery_soc must be between 0 and 100, got {}",
                    soc
                ))
            }
            None => None,
        };

        Ok(InverterSettingsUpdate {
            minimum_battery_soc,
            essential_only: self.essential_only,
            grid_charge: self.grid_charge,
        })
    }
}

/// Parses tool arguments; `null` counts as an empty object
pub fn parse<T: for<'de> Deserialize<'de> + Default>(arguments: &Value) -> Result<T, String> {
    match arguments {
        Value::Null => Ok(T::default()),
        Value::String(s) if s.trim().is_empty() => Ok(T::default()),
        // Some models send the arguments object JSON-encoded
        Value::String(s) => serde_json::from_str(s).map_err(|e| e.to_string()),
        other => T::deserialize(other).map_err(|e| e.to_string()),
    }
}
