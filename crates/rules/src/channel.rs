/// Telemetry channels the formatter recognizes, in emission order.
///
/// Anything a device reports outside this set is dropped silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Pm25,
    Pm10,
    Temp,
    Hum,
}

impl Channel {
    /// Fixed emission order, independent of the order readings arrive in.
    pub const ORDERED: [Self; 4] = [Self::Pm25, Self::Pm10, Self::Temp, Self::Hum];

    /// Key used for this channel in the line protocol.
    pub fn key(self) -> &'static str {
        match self {
            Self::Pm25 => "PM25",
            Self::Pm10 => "PM10",
            Self::Temp => "TEMP",
            Self::Hum => "HUM",
        }
    }

    /// Normalize a raw sensor name: text before the first `(`, trimmed,
    /// upper-cased. `"Temp (cel)"` becomes `"TEMP"`.
    pub fn normalize(raw: &str) -> String {
        raw.split('(').next().unwrap_or_default().trim().to_uppercase()
    }

    /// Map an already-normalized sensor name to a recognized channel.
    pub fn from_normalized(name: &str) -> Option<Self> {
        match name {
            "PM2.5" | "PM25" => Some(Self::Pm25),
            "PM10" => Some(Self::Pm10),
            "TEMPERATURE" | "TEMP" => Some(Self::Temp),
            "HUMIDITY" | "HUM" => Some(Self::Hum),
            _ => None,
        }
    }

    /// Normalize and map a raw sensor name in one step.
    pub fn from_raw(raw: &str) -> Option<Self> {
        Self::from_normalized(&Self::normalize(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_unit_and_case() {
        assert_eq!(Channel::normalize("PM2.5 (ug/m3)"), "PM2.5");
        assert_eq!(Channel::normalize("Temp(cel)"), "TEMP");
        assert_eq!(Channel::normalize("  Humidity "), "HUMIDITY");
        assert_eq!(Channel::normalize("(just units)"), "");
    }

    #[test]
    fn aliases_resolve_to_one_channel() {
        assert_eq!(Channel::from_raw("PM2.5 (ug/m3)"), Some(Channel::Pm25));
        assert_eq!(Channel::from_raw("PM25"), Some(Channel::Pm25));
        assert_eq!(Channel::from_raw("PM10 (ug/m3)"), Some(Channel::Pm10));
        assert_eq!(Channel::from_raw("Temperature (C)"), Some(Channel::Temp));
        assert_eq!(Channel::from_raw("Temp (C)"), Some(Channel::Temp));
        assert_eq!(Channel::from_raw("Humidity (%)"), Some(Channel::Hum));
        assert_eq!(Channel::from_raw("Hum"), Some(Channel::Hum));
    }

    #[test]
    fn unknown_channels_are_dropped() {
        assert_eq!(Channel::from_raw("CO2 (ppm)"), None);
        assert_eq!(Channel::from_raw("Noise (dB)"), None);
        assert_eq!(Channel::from_raw(""), None);
    }

    #[test]
    fn matching_is_case_normalized_but_exact() {
        // Substrings of an alias are not an alias.
        assert_eq!(Channel::from_raw("PM2"), None);
        assert_eq!(Channel::from_raw("TEMPER"), None);
    }
}
