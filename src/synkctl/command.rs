//! synkctl command-line construction

use std::fmt;
use std::num::NonZeroU64;

/// Flag that selects a specific inverter
pub const DEVICE_FLAG: &str = "-i";

/// Inverter selector. Absent or zero means the default inverter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DeviceId(Option<NonZeroU64>);

impl DeviceId {
    /// The inverter synkctl is configured to use when no selector is given
    pub const DEFAULT: DeviceId = DeviceId(None);

    pub fn new(serial: u64) -> Self {
        Self(NonZeroU64::new(serial))
    }

    pub fn is_default(&self) -> bool {
        self.0.is_none()
    }

    /// Arguments appended to every command, empty for the default inverter
    pub fn selector_args(&self) -> Vec<String> {
        match self.0 {
            Some(serial) => vec![DEVICE_FLAG.to_string(), serial.to_string()],
            None => Vec::new(),
        }
    }
}

impl From<u64> for DeviceId {
    fn from(serial: u64) -> Self {
        Self::new(serial)
    }
}

impl From<Option<u64>> for DeviceId {
    fn from(serial: Option<u64>) -> Self {
        serial.map(Self::new).unwrap_or_default()
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(serial) => write!(f, "{}", serial),
            None => write!(f, "default"),
        }
    }
}

/// The synkctl sub-commands used by synkbot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subcommand {
    Battery,
    Grid,
    Input,
    Plant,
    Load,
    InverterSettings,
    InverterDetails,
    InverterUpdate,
}

impl Subcommand {
    pub fn args(&self) -> &'static [&'static str] {
        match self {
            Subcommand::Battery => &["battery", "get", "--short"],
            Subcommand::Grid => &["grid", "get", "--short"],
            Subcommand::Input => &["input", "get", "--short"],
            Subcommand::Plant => &["plant", "get"],
            Subcommand::Load => &["load", "get", "--short"],
            Subcommand::InverterSettings => &["inverter", "settings"],
            Subcommand::InverterDetails => &["inverter", "details"],
            Subcommand::InverterUpdate => &["inverter", "update"],
        }
    }

    /// Full argument vector: sub-command, device selector, then extra flags
    pub fn command_line(&self, device: DeviceId, extra: &[String]) -> Vec<String> {
        let mut args: Vec<String> = self.args().iter().map(|a| a.to_string()).collect();
        args.extend(device.selector_args());
        args.extend(extra.iter().cloned());
        args
    }
}

impl fmt::Display for Subcommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.args().join(" "))
    }
}

/// Maps a boolean setting onto synkctl's switch syntax
pub fn switch_value(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}
