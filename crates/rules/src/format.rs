use airgate_core::Device;
use chrono::{DateTime, Local};

use crate::channel::Channel;

/// Timestamp layout of the trailing `DATE:` field.
const DATE_FORMAT: &str = "%Y-%m-%d,%H:%M:%S";

/// Render one device's recognized readings as the compact line protocol.
///
/// Channels appear in [`Channel::ORDERED`] order (only those present), each
/// as `KEY:VALUE`, followed by exactly one `DATE:` field carrying the
/// caller-supplied local timestamp. When the same channel repeats, the first
/// reading wins.
///
/// Returns `None` when no reading maps to a recognized channel; the caller
/// must skip publishing for this device (and only this device).
pub fn format_payload(device: &Device, now: DateTime<Local>) -> Option<String> {
    let mut values: [Option<String>; Channel::ORDERED.len()] = Default::default();
    for reading in &device.readings {
        let Some(channel) = Channel::from_raw(&reading.name) else {
            continue;
        };
        let slot = &mut values[channel as usize];
        if slot.is_none() {
            *slot = Some(reading.value_text());
        }
    }

    let mut parts: Vec<String> = Vec::with_capacity(values.len() + 1);
    for channel in Channel::ORDERED {
        if let Some(value) = values[channel as usize].take() {
            parts.push(format!("{}:{}", channel.key(), value));
        }
    }
    if parts.is_empty() {
        return None;
    }

    parts.push(format!("DATE:{}", now.format(DATE_FORMAT)));
    Some(parts.join(","))
}

#[cfg(test)]
mod tests {
    use airgate_core::SensorReading;
    use chrono::TimeZone;

    use super::*;

    fn at_test_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 2, 13, 20, 45, 28).unwrap()
    }

    fn device_with(readings: Vec<SensorReading>) -> Device {
        let mut device = Device::new("Sensor-A", "SN123");
        device.readings = readings;
        device
    }

    #[test]
    fn formats_in_fixed_channel_order() {
        // Readings arrive out of order; the payload must not.
        let device = device_with(vec![
            SensorReading::new("Humidity (%)", 40),
            SensorReading::new("PM10 (ug/m3)", 30),
            SensorReading::new("PM2.5 (ug/m3)", 12),
            SensorReading::new("Temperature (C)", 25),
        ]);
        assert_eq!(
            format_payload(&device, at_test_time()).unwrap(),
            "PM25:12,PM10:30,TEMP:25,HUM:40,DATE:2025-02-13,20:45:28"
        );
    }

    #[test]
    fn omits_missing_channels() {
        let device = device_with(vec![
            SensorReading::new("PM2.5 (ug/m3)", 12),
            SensorReading::new("Temperature (C)", 25),
        ]);
        assert_eq!(
            format_payload(&device, at_test_time()).unwrap(),
            "PM25:12,TEMP:25,DATE:2025-02-13,20:45:28"
        );
    }

    #[test]
    fn drops_unrecognized_readings() {
        let device = device_with(vec![
            SensorReading::new("CO2 (ppm)", 800),
            SensorReading::new("PM2.5 (ug/m3)", 12),
            SensorReading::new("Noise (dB)", 45),
        ]);
        assert_eq!(
            format_payload(&device, at_test_time()).unwrap(),
            "PM25:12,DATE:2025-02-13,20:45:28"
        );
    }

    #[test]
    fn no_recognized_channels_yields_no_payload() {
        let device = device_with(vec![SensorReading::new("CO2 (ppm)", 800)]);
        assert_eq!(format_payload(&device, at_test_time()), None);

        let empty = device_with(Vec::new());
        assert_eq!(format_payload(&empty, at_test_time()), None);
    }

    #[test]
    fn first_reading_wins_on_duplicate_channels() {
        let device = device_with(vec![
            SensorReading::new("Temp (C)", 25),
            SensorReading::new("Temperature (C)", 99),
        ]);
        assert_eq!(
            format_payload(&device, at_test_time()).unwrap(),
            "TEMP:25,DATE:2025-02-13,20:45:28"
        );
    }

    #[test]
    fn exactly_one_date_field() {
        let device = device_with(vec![SensorReading::new("PM2.5", 1)]);
        let payload = format_payload(&device, at_test_time()).unwrap();
        assert_eq!(payload.matches("DATE:").count(), 1);
        assert!(payload.ends_with("DATE:2025-02-13,20:45:28"));
    }
}
