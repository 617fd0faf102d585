//! Raw synkctl field names and typed extraction
//!
//! Only the fields listed here are read from synkctl output. A listed field
//! that is missing or has the wrong shape is an error, so schema drift in
//! synkctl fails loudly instead of silently dropping data.

use serde_json::Value;

use crate::errors::DeviceError;

/// `battery get --short`
pub mod battery {
    pub const SOC: &str = "bmsSoc";
    pub const BMS_VOLTAGE: &str = "bmsVolt";
    pub const VOLTAGE: &str = "voltage";
    pub const TEMPERATURE: &str = "temp";
    /// Negative while charging, positive while discharging
    pub const POWER: &str = "power";
}

/// `grid get --short`
pub mod grid {
    pub const POWER: &str = "pac";
    // Spelled this way by synkctl
    pub const RELAY_STATUS: &str = "acRealyStatus";
}

/// `input get --short`
pub mod input {
    pub const POWER: &str = "pac";
}

/// `plant get`
pub mod plant {
    /// Rated plant capacity in kW
    pub const TOTAL_POWER: &str = "totalPower";
}

/// `load get --short`
pub mod load {
    pub const TOTAL_POWER: &str = "totalPower";
}

/// `inverter settings`
pub mod settings {
    pub const BATTERY_CAPACITY: &str = "battery-capacity";
    pub const ESSENTIAL_ONLY: &str = "essential-only";
    pub const GRID_CHARGE: &str = "grid-charge";
}

/// `inverter details`
pub mod details {
    pub const RATED_POWER: &str = "ratePower";
    pub const INPUT_POWER: &str = "pac";
}

fn find<'a>(data: &'a Value, field: &'static str) -> Result<&'a Value, DeviceError> {
    match data.get(field) {
        Some(Value::Null) | None => Err(DeviceError::MissingField(field)),
        Some(value) => Ok(value),
    }
}

/// Reads a number. Numeric strings are accepted as well.
pub fn get_number(data: &Value, field: &'static str) -> Result<f64, DeviceError> {
    let invalid = DeviceError::InvalidField {
        field,
        expected: "a number",
    };
    let number = match find(data, field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(invalid),
    }
}

/// Reads a whole number; fractional values are rounded to the nearest integer
pub fn get_integer(data: &Value, field: &'static str) -> Result<i64, DeviceError> {
    if let Some(n) = find(data, field)?.as_i64() {
        return Ok(n);
    }
    let n = get_number(data, field)?;
    if n < i64::MIN as f64 || n > i64::MAX as f64 {
        return Err(DeviceError::InvalidField {
            field,
            expected: "an integer",
        });
    }
    Ok(n.round() as i64)
}

/// Reads an `"on"`/`"off"` switch
pub fn get_switch(data: &Value, field: &'static str) -> Result<bool, DeviceError> {
    match find(data, field)?.as_str().map(str::trim) {
        Some(s) if s.eq_ignore_ascii_case("on") => Ok(true),
        Some(s) if s.eq_ignore_ascii_case("off") => Ok(false),
        _ => Err(DeviceError::InvalidField {
            field,
            expected: "\"on\" or \"off\"",
        }),
    }
}
