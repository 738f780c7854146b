use serde::{Deserialize, Serialize};

/// A single telemetry reading reported by a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    /// Raw channel name as reported by the API, e.g. `"PM2.5 (ug/m3)"`.
    #[serde(rename = "sensorname", default)]
    pub name: String,

    /// Reading value. The API reports numbers for live channels but is not
    /// strict about it, so the raw JSON scalar is kept as-is.
    #[serde(rename = "sensorvalue", default)]
    pub value: serde_json::Value,
}

impl SensorReading {
    pub fn new(name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Render the value the way it appeared on the wire: strings lose their
    /// quotes, everything else keeps its JSON form.
    pub fn value_text(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// One device from the upstream account. Valid for a single fetch cycle,
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "devicename", default)]
    pub name: String,

    /// The API is inconsistent about the casing of the serial field.
    #[serde(rename = "serialno", alias = "serialNo", default)]
    pub serial: String,

    /// Live readings, in the order the API reported them.
    #[serde(rename = "realtime", default)]
    pub readings: Vec<SensorReading>,
}

impl Device {
    pub fn new(name: impl Into<String>, serial: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            serial: serial.into(),
            readings: Vec::new(),
        }
    }

    /// Short identity used in audit details, e.g. `"Sensor-A (SN123)"`.
    pub fn ident(&self) -> String {
        format!("{} ({})", self.name, self.serial)
    }
}
