use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct DevicesResponse {
    #[serde(default)]
    pub devices: Vec<Device>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Device {
    /// Resource name, e.g. `devices/12345`.
    pub name: String,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    pub serial_number: String,
    pub registration_key: String,
    pub firmware_available: String,
    pub firmware_installed: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub last_config: Option<LastConfig>,
    pub hc_mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LastConfig {
    pub name: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub sentio: Option<Sentio>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Sentio {
    pub title: String,
    pub title_personalized: String,
    pub rooms: Vec<SentioRoom>,
    pub outdoor_temperature_sensors: Vec<OutdoorTemperatureSensor>,
    pub hc_mode: String,
    pub automatic_hc_mode: String,
    pub available_hc_modes: Vec<String>,
    pub standby_mode: String,
    pub vacation_settings: VacationSettings,
    pub quiet_settings: QuietSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct OutdoorTemperatureSensor {
    pub id: String,
    pub outdoor_temperature: f64,
}

/// A room as reported in a device's last configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SentioRoom {
    pub id: String,
    pub title: String,
    pub title_personalized: String,
    pub air_temperature: f64,
    pub humidity: f64,
    pub setpoint_temperature: f64,
    pub min_setpoint_temperature: f64,
    pub max_setpoint_temperature: f64,
    pub vacation_mode: String,
    pub lock_mode: String,
    pub temperature_state: String,
    pub temperature_presets: Vec<TemperaturePreset>,
    pub system_modes: Vec<SystemMode>,
    pub dehumidification_presets: Vec<DehumidificationPreset>,
    pub dehumidifier_state: String,
    pub weekly_schedule: WeeklySchedule,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TemperaturePreset {
    #[serde(rename = "type")]
    pub preset_type: String,
    pub hc_mode: String,
    pub setpoint_temperature: f64,
    pub min_setpoint_temperature: f64,
    pub max_setpoint_temperature: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemMode {
    #[serde(rename = "type")]
    pub mode_type: String,
    pub hc_mode: String,
    pub setpoint_temperature: f64,
    pub min_setpoint_temperature: f64,
    pub max_setpoint_temperature: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DehumidificationPreset {
    pub hc_mode: String,
    pub setpoint: f64,
    pub min_humidity_setpoint: f64,
    pub max_humidity_setpoint: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct WeeklySchedule {
    pub default_preset_type: String,
    pub schedule_mode: String,
    pub intervals: Vec<Interval>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Interval {
    pub day: String,
    pub preset_timeframes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct VacationSettings {
    pub vacation_mode: String,
    pub vacation_mode_until: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct QuietSettings {
    pub mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    /// Unique location code, used to select rooms.
    pub ulc: String,
    pub registration: String,
    pub serial_number: i64,
    pub attributes: LocationAttributes,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationAttributes {
    pub mode: String,
    pub vacation_on: bool,
    pub outdoor: Outdoor,
    pub dst: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Outdoor {
    pub temperature: f64,
}

/// A room as listed by the rooms endpoint of a location.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Room {
    pub name: String,
    pub thermo: String,
    pub dryer: String,
    pub temp_desired: f64,
    pub temp_current: f64,
}

#[derive(Debug, Serialize)]
pub struct GetDeviceRequest<'a> {
    pub name: &'a str,
}

impl Device {
    /// Human readable title: the personalised one when set.
    pub fn title(&self) -> &str {
        let sentio = self.last_config.as_ref().and_then(|c| c.sentio.as_ref());
        match sentio {
            Some(s) if !s.title_personalized.is_empty() => &s.title_personalized,
            Some(s) if !s.title.is_empty() => &s.title,
            _ => &self.name,
        }
    }

    pub fn has_firmware_update(&self) -> bool {
        !self.firmware_available.is_empty()
            && !self.firmware_installed.is_empty()
            && self.firmware_available != self.firmware_installed
    }

    pub fn rooms(&self) -> &[SentioRoom] {
        self.last_config
            .as_ref()
            .and_then(|c| c.sentio.as_ref())
            .map(|s| s.rooms.as_slice())
            .unwrap_or(&[])
    }
}

impl SentioRoom {
    pub fn title(&self) -> &str {
        if self.title_personalized.is_empty() {
            &self.title
        } else {
            &self.title_personalized
        }
    }
}
