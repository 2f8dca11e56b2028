//! The persisted device record: Wi-Fi credentials, brightness, power state.
//!
//! The router only ever touches `brightness` and `power_state`; the
//! credentials ride along untouched through read-modify-write.

use serde::{Deserialize, Serialize};

pub const WIFI_SSID_MAX_LEN: usize = 32;
pub const WIFI_PASSWORD_MAX_LEN: usize = 64;

/// Brightness applied when nothing has been stored yet.
pub const DEFAULT_BRIGHTNESS: u8 = 128;

/// Stored power byte written on first boot.
pub const DEFAULT_POWER_STATE: u8 = 1;

/// How the output treats a stored power byte. Any non-zero value means on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Off,
    On,
}

impl From<u8> for PowerState {
    fn from(value: u8) -> Self {
        if value == 0 {
            PowerState::Off
        } else {
            PowerState::On
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub wifi_ssid: String,
    pub wifi_password: String,
    pub brightness: u8,
    /// Raw byte as last received; GetConfig echoes it back unchanged.
    pub power_state: u8,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: String::new(),
            wifi_password: String::new(),
            brightness: DEFAULT_BRIGHTNESS,
            power_state: DEFAULT_POWER_STATE,
        }
    }
}

impl DeviceConfig {
    pub fn power(&self) -> PowerState {
        PowerState::from(self.power_state)
    }

    /// True if the stored credentials fit the station driver's fixed fields.
    pub fn credentials_fit(&self) -> bool {
        self.wifi_ssid.len() <= WIFI_SSID_MAX_LEN
            && self.wifi_password.len() <= WIFI_PASSWORD_MAX_LEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_first_boot() {
        let config = DeviceConfig::default();
        assert_eq!(config.brightness, 128);
        assert_eq!(config.power(), PowerState::On);
        assert!(config.wifi_ssid.is_empty());
    }

    #[test]
    fn power_state_wire_mapping() {
        assert_eq!(PowerState::from(0), PowerState::Off);
        assert_eq!(PowerState::from(1), PowerState::On);
        assert_eq!(PowerState::from(0xff), PowerState::On);
    }

    #[test]
    fn raw_power_byte_is_preserved() {
        let config = DeviceConfig {
            power_state: 2,
            ..DeviceConfig::default()
        };
        assert_eq!(config.power(), PowerState::On);
        let text = serde_json::to_string(&config).unwrap();
        let back: DeviceConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back.power_state, 2);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: DeviceConfig = serde_json::from_str(r#"{"brightness": 7}"#).unwrap();
        assert_eq!(config.brightness, 7);
        assert_eq!(config.power_state, DEFAULT_POWER_STATE);
    }

    #[test]
    fn oversized_ssid_does_not_fit() {
        let config = DeviceConfig {
            wifi_ssid: "x".repeat(WIFI_SSID_MAX_LEN + 1),
            ..DeviceConfig::default()
        };
        assert!(!config.credentials_fit());
    }
}
