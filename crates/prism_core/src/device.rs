//! Audio Device Enumeration

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::Device;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Type of audio device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceType {
    Input,
    Output,
}

/// Descriptive entry for one audio device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioDevice {
    /// Human-readable device name (also used to select it)
    pub name: String,

    /// Whether this is an input or output device
    pub device_type: DeviceType,

    /// Whether this is the system default device
    pub is_default: bool,
}

impl AudioDevice {
    /// Enumerate all available audio devices
    pub fn enumerate_all() -> EngineResult<Vec<AudioDevice>> {
        let host = cpal::default_host();
        let mut devices = Vec::new();

        let default_input_name = host.default_input_device().and_then(|d| d.name().ok());
        let default_output_name = host.default_output_device().and_then(|d| d.name().ok());

        if let Ok(input_devices) = host.input_devices() {
            for device in input_devices {
                if let Ok(name) = device.name() {
                    devices.push(AudioDevice {
                        is_default: Some(name.as_str()) == default_input_name.as_deref(),
                        name,
                        device_type: DeviceType::Input,
                    });
                }
            }
        }

        if let Ok(output_devices) = host.output_devices() {
            for device in output_devices {
                if let Ok(name) = device.name() {
                    devices.push(AudioDevice {
                        is_default: Some(name.as_str()) == default_output_name.as_deref(),
                        name,
                        device_type: DeviceType::Output,
                    });
                }
            }
        }

        if devices.is_empty() {
            return Err(EngineError::NoDevicesFound);
        }

        Ok(devices)
    }
}

/// Resolve an input device by name, or the system default
pub fn find_input_device(name: Option<&str>) -> EngineResult<Device> {
    let host = cpal::default_host();
    match name {
        Some(wanted) => host
            .input_devices()
            .map_err(|e| EngineError::StreamBuildError(e.to_string()))?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| EngineError::DeviceNotFound(wanted.to_string())),
        None => host
            .default_input_device()
            .ok_or(EngineError::NoDevicesFound),
    }
}

/// Resolve an output device by name, or the system default
pub fn find_output_device(name: Option<&str>) -> EngineResult<Device> {
    let host = cpal::default_host();
    match name {
        Some(wanted) => host
            .output_devices()
            .map_err(|e| EngineError::StreamBuildError(e.to_string()))?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| EngineError::DeviceNotFound(wanted.to_string())),
        None => host
            .default_output_device()
            .ok_or(EngineError::NoDevicesFound),
    }
}
