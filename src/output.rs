use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use tabled::{Table, Tabled};

use crate::types::{Device, Location, Room};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Text,
}

/// A command result that can be rendered in every output format.
pub trait Report {
    type Data: Serialize + ?Sized;

    fn data(&self) -> &Self::Data;

    fn table(&self) -> String;

    fn text(&self) -> String {
        self.table()
    }
}

/// Writes command results and messages in the selected format.
pub struct Feedback<W: Write = io::Stdout> {
    out: W,
    format: OutputFormat,
}

impl Feedback<io::Stdout> {
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(io::stdout(), format)
    }
}

impl<W: Write> Feedback<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    pub fn println(&mut self, message: impl std::fmt::Display) -> io::Result<()> {
        writeln!(self.out, "{}", message)
    }

    pub fn print_result<R: Report>(&mut self, report: &R) -> anyhow::Result<()> {
        let mut rendered = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report.data())?,
            OutputFormat::Table => report.table(),
            OutputFormat::Text => report.text(),
        };
        if !rendered.ends_with('\n') {
            rendered.push('\n');
        }

        self.out.write_all(rendered.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn format_time(time: Option<chrono::DateTime<chrono::Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Serial Number")]
    serial: String,
    #[tabled(rename = "Firmware Available")]
    firmware_available: String,
    #[tabled(rename = "Firmware Installed")]
    firmware_installed: String,
    #[tabled(rename = "Type")]
    device_type: String,
    #[tabled(rename = "Last Heartbeat")]
    last_heartbeat: String,
}

impl From<&Device> for DeviceRow {
    fn from(device: &Device) -> Self {
        Self {
            name: device.name.clone(),
            serial: device.serial_number.clone(),
            firmware_available: device.firmware_available.clone(),
            firmware_installed: device.firmware_installed.clone(),
            device_type: device.device_type.clone(),
            last_heartbeat: format_time(device.last_heartbeat),
        }
    }
}

pub struct DevicesReport {
    pub devices: Vec<Device>,
}

impl Report for DevicesReport {
    type Data = [Device];

    fn data(&self) -> &[Device] {
        &self.devices
    }

    fn table(&self) -> String {
        let rows: Vec<DeviceRow> = self.devices.iter().map(DeviceRow::from).collect();
        Table::new(rows).to_string()
    }
}

#[derive(Tabled)]
struct SentioRoomRow {
    #[tabled(rename = "Room")]
    title: String,
    #[tabled(rename = "Air")]
    air: String,
    #[tabled(rename = "Setpoint")]
    setpoint: String,
    #[tabled(rename = "Humidity")]
    humidity: String,
    #[tabled(rename = "State")]
    state: String,
}

pub struct DeviceReport {
    pub device: Device,
}

impl Report for DeviceReport {
    type Data = Device;

    fn data(&self) -> &Device {
        &self.device
    }

    fn table(&self) -> String {
        let mut out = Table::new([DeviceRow::from(&self.device)]).to_string();

        let rooms: Vec<SentioRoomRow> = self
            .device
            .rooms()
            .iter()
            .map(|room| SentioRoomRow {
                title: room.title().to_string(),
                air: format!("{:.1}", room.air_temperature),
                setpoint: format!("{:.1}", room.setpoint_temperature),
                humidity: format!("{:.0}%", room.humidity),
                state: room.temperature_state.clone(),
            })
            .collect();
        if !rooms.is_empty() {
            out.push('\n');
            out.push_str(&Table::new(rooms).to_string());
        }
        out
    }

    fn text(&self) -> String {
        let device = &self.device;
        let mut out = format!("{} ({})\n", device.title(), device.serial_number);
        out.push_str(&format!("  Type: {}\n", device.device_type));
        out.push_str(&format!("  Firmware: {}", device.firmware_installed));
        if device.has_firmware_update() {
            out.push_str(&format!(" (update available: {})", device.firmware_available));
        }
        out.push('\n');
        for room in device.rooms() {
            out.push_str(&format!(
                "  {}: {:.1}°C (setpoint {:.1}°C)\n",
                room.title(),
                room.air_temperature,
                room.setpoint_temperature
            ));
        }
        out
    }
}

#[derive(Tabled)]
struct LocationRow {
    #[tabled(rename = "Ulc")]
    ulc: String,
    #[tabled(rename = "Registration")]
    registration: String,
    #[tabled(rename = "Serial Number")]
    serial: i64,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Vacation On")]
    vacation_on: bool,
    #[tabled(rename = "Outdoor Temperature")]
    outdoor: String,
    #[tabled(rename = "DST")]
    dst: bool,
}

pub struct LocationsReport {
    pub locations: Vec<Location>,
}

impl Report for LocationsReport {
    type Data = [Location];

    fn data(&self) -> &[Location] {
        &self.locations
    }

    fn table(&self) -> String {
        let rows: Vec<LocationRow> = self
            .locations
            .iter()
            .map(|l| LocationRow {
                ulc: l.ulc.clone(),
                registration: l.registration.clone(),
                serial: l.serial_number,
                mode: l.attributes.mode.clone(),
                vacation_on: l.attributes.vacation_on,
                outdoor: format!("{:.1}", l.attributes.outdoor.temperature),
                dst: l.attributes.dst,
            })
            .collect();
        Table::new(rows).to_string()
    }
}

#[derive(Tabled)]
struct RoomRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Thermo")]
    thermo: String,
    #[tabled(rename = "Dryer")]
    dryer: String,
    #[tabled(rename = "TempDesired")]
    temp_desired: String,
    #[tabled(rename = "TempCurrent")]
    temp_current: String,
}

pub struct RoomsReport {
    pub rooms: Vec<Room>,
}

impl Report for RoomsReport {
    type Data = [Room];

    fn data(&self) -> &[Room] {
        &self.rooms
    }

    fn table(&self) -> String {
        let rows: Vec<RoomRow> = self
            .rooms
            .iter()
            .map(|r| RoomRow {
                name: r.name.clone(),
                thermo: r.thermo.clone(),
                dryer: r.dryer.clone(),
                temp_desired: format!("{:.1}", r.temp_desired),
                temp_current: format!("{:.1}", r.temp_current),
            })
            .collect();
        Table::new(rows).to_string()
    }

    fn text(&self) -> String {
        self.rooms
            .iter()
            .map(|r| format!("{}: {:.1} (desired {:.1})\n", r.name, r.temp_current, r.temp_desired))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<R: Report>(format: OutputFormat, report: &R) -> String {
        let mut feedback = Feedback::new(Vec::new(), format);
        feedback.print_result(report).unwrap();
        String::from_utf8(feedback.into_inner()).unwrap()
    }

    fn rooms() -> RoomsReport {
        RoomsReport {
            rooms: vec![Room {
                name: "Living".to_string(),
                thermo: "ok".to_string(),
                dryer: "off".to_string(),
                temp_desired: 21.0,
                temp_current: 20.54,
            }],
        }
    }

    #[test]
    fn test_table_output_has_headers() {
        let out = render(OutputFormat::Table, &rooms());
        assert!(out.contains("Name"));
        assert!(out.contains("TempDesired"));
        assert!(out.contains("Living"));
        assert!(out.contains("20.5"));
    }

    #[test]
    fn test_json_output_is_the_data() {
        let out = render(OutputFormat::Json, &rooms());
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["name"], "Living");
        assert_eq!(value[0]["tempDesired"], 21.0);
    }

    #[test]
    fn test_text_output() {
        let out = render(OutputFormat::Text, &rooms());
        assert_eq!(out, "Living: 20.5 (desired 21.0)\n");
    }

    #[test]
    fn test_devices_table() {
        let report = DevicesReport {
            devices: vec![Device {
                name: "devices/1".to_string(),
                serial_number: "12345678901234".to_string(),
                device_type: "TYPE_SENTIO_CCU".to_string(),
                ..Default::default()
            }],
        };
        let out = render(OutputFormat::Table, &report);
        for header in ["Name", "Serial Number", "Firmware Available", "Type", "Last Heartbeat"] {
            assert!(out.contains(header), "missing header {}", header);
        }
        assert!(out.contains("12345678901234"));
    }

    #[test]
    fn test_output_format_parses_lowercase() {
        let format: OutputFormat = serde_yaml::from_str("json").unwrap();
        assert_eq!(format, OutputFormat::Json);
    }
}
