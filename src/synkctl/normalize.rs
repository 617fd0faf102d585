//! Conversion of raw synkctl JSON into records

use serde_json::Value;

use super::fields::{self, get_integer, get_number, get_switch};
use super::types::*;
use crate::errors::DeviceError;

/// Relay status reported while the grid is connected
const RELAY_UP: i64 = 1;

/// Plant capacity is reported in kW
const WATTS_PER_KILOWATT: f64 = 1000.0;

pub fn battery(raw: &Value) -> Result<Battery, DeviceError> {
    let soc = get_integer(raw, fields::battery::SOC)?;
    if !(0..=100).contains(&soc) {
        return Err(DeviceError::InvalidField {
            field: fields::battery::SOC,
            expected: "a percentage between 0 and 100",
        });
    }

    Ok(Battery::new(
        soc,
        get_number(raw, fields::battery::BMS_VOLTAGE)?,
        get_number(raw, fields::battery::VOLTAGE)?,
        get_number(raw, fields::battery::TEMPERATURE)?,
        Power::from_signed(get_integer(raw, fields::battery::POWER)?),
    ))
}

pub fn grid(raw: &Value) -> Result<Grid, DeviceError> {
    Ok(Grid {
        power: get_integer(raw, fields::grid::POWER)?,
        is_up: get_integer(raw, fields::grid::RELAY_STATUS)? == RELAY_UP,
    })
}

/// `input` comes from `input get`, `plant` from `plant get`
pub fn input(input: &Value, plant: &Value) -> Result<Input, DeviceError> {
    let peak_kw = get_number(plant, fields::plant::TOTAL_POWER)?;

    Ok(Input {
        power: get_integer(input, fields::input::POWER)?,
        peak_power: (peak_kw * WATTS_PER_KILOWATT).round() as i64,
    })
}

pub fn load(raw: &Value) -> Result<Load, DeviceError> {
    Ok(Load {
        power: get_integer(raw, fields::load::TOTAL_POWER)?,
    })
}

/// Raw responses that make up an [`Inverter`] record
#[derive(Debug, Clone, Copy)]
pub struct InverterSources<'a> {
    pub settings: &'a Value,
    pub details: &'a Value,
    pub load: &'a Value,
    pub battery: &'a Value,
    pub grid: &'a Value,
}

pub fn inverter(sources: InverterSources<'_>) -> Result<Inverter, DeviceError> {
    Ok(Inverter {
        rated_power: get_integer(sources.details, fields::details::RATED_POWER)?,
        load_power: get_integer(sources.load, fields::load::TOTAL_POWER)?,
        battery_power: Power::from_signed(get_integer(sources.battery, fields::battery::POWER)?),
        input_power: get_integer(sources.details, fields::details::INPUT_POWER)?,
        grid_power: get_integer(sources.grid, fields::grid::POWER)?,
        battery_minimum_soc_limit: get_integer(
            sources.settings,
            fields::settings::BATTERY_CAPACITY,
        )?,
        power_essential_only: get_switch(sources.settings, fields::settings::ESSENTIAL_ONLY)?,
        grid_charge: get_switch(sources.settings, fields::settings::GRID_CHARGE)?,
    })
}
