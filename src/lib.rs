pub mod cipher;
mod client;
mod command;
mod device;
mod diff;
mod error;
mod finder;
mod logger;
pub mod protocol;
mod status;
pub mod temperature;
mod transport;
mod types;

pub use client::{AirConClient, AirConClientBuilder};
pub use command::{CommandParams, Outcome, SkipReason};
pub use device::Device;
pub use diff::{FieldChange, diff_snapshots, has_changed};
pub use error::{Error, Result};
pub use finder::{DeviceFinder, DeviceRegistry};
pub use logger::MessageLogMode;
pub use status::{StatusHistory, StatusSnapshot};
pub use temperature::TargetTemperature;
pub use transport::{Transport, open_socket};
pub use types::*;

/// Builders for each command's parameter set, validated the way the device
/// firmware expects.
pub mod commands {
    pub use crate::command::{
        air, dry, fan_speed, health, light, mode, power, power_save, swing_vertical, turbo,
    };
}
