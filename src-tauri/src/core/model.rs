//! Domain types shared by the reconciler, the session and the frontend bridge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::proximity::Proximity;

/// A device the account is entitled to track, as reported by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    /// Matching key. Usually the tracker's hardware address.
    pub name: String,
    /// Human-facing name chosen by the owner.
    pub alias: String,
    /// Last position report, unix seconds. `0` from the server means unknown.
    pub last_update: Option<i64>,
    /// Raw battery reading.
    pub battery: Option<u32>,
    pub map_link: Option<Url>,
    pub settings_link: Option<Url>,
}

impl RegistryEntry {
    /// Creates an entry with no metadata.
    pub fn new(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
            last_update: None,
            battery: None,
            map_link: None,
            settings_link: None,
        }
    }

    /// Time of the last position report, if the server knows one.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
            .filter(|secs| *secs > 0)
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    pub fn battery_level(&self) -> BatteryLevel {
        BatteryLevel::from_reading(self.battery)
    }
}

/// One BLE advertisement observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSighting {
    /// Hardware identifier, stable per physical device.
    pub id: String,
    pub advertised_name: Option<String>,
    /// Received signal strength in dBm.
    pub signal_strength: i16,
}

impl ScanSighting {
    pub fn new(id: impl Into<String>, advertised_name: Option<String>, signal_strength: i16) -> Self {
        Self {
            id: id.into(),
            advertised_name,
            signal_strength,
        }
    }
}

/// A registry entry paired with the sighting that matched it, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayEntry {
    #[serde(flatten)]
    pub entry: RegistryEntry,
    pub hardware_id: Option<String>,
    pub advertised_name: Option<String>,
    pub signal_strength: Option<i16>,
    pub proximity: Option<Proximity>,
    /// List color for the proximity band.
    pub distance_color: Option<&'static str>,
    /// Bar meter shown next to "Distance:".
    pub distance_meter: Option<String>,
    pub battery_level: BatteryLevel,
    /// Local-time label for `last_update`, e.g. `"24.12 um 18:05"`.
    pub last_update_label: Option<String>,
}

impl DisplayEntry {
    pub fn new(entry: RegistryEntry, sighting: Option<&ScanSighting>) -> Self {
        let signal_strength = sighting.map(|s| s.signal_strength);
        let battery_level = entry.battery_level();
        let last_update_label = entry.last_update().map(format_last_update);
        let proximity = signal_strength.map(Proximity::from_rssi);
        Self {
            hardware_id: sighting.map(|s| s.id.clone()),
            advertised_name: sighting.and_then(|s| s.advertised_name.clone()),
            signal_strength,
            proximity,
            distance_color: proximity.map(|p| p.band.color()),
            distance_meter: proximity.map(|p| p.meter()),
            battery_level,
            last_update_label,
            entry,
        }
    }

    pub fn is_in_range(&self) -> bool {
        self.signal_strength.is_some()
    }
}

/// Battery bucket used to pick one of the five battery icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "level")]
pub enum BatteryLevel {
    Level(u8),
    Unknown,
}

impl BatteryLevel {
    /// The tracker reports hundreds; `100..=599` maps onto levels 1 to 5.
    pub fn from_reading(reading: Option<u32>) -> Self {
        match reading.map(|r| r / 100) {
            Some(index @ 1..=5) => Self::Level(index as u8),
            _ => Self::Unknown,
        }
    }
}

/// Formats a report time the way the device list shows it.
pub fn format_last_update(at: DateTime<Utc>) -> String {
    at.with_timezone(&chrono::Local)
        .format("%d.%m um %H:%M")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_last_update_means_unknown() {
        let mut entry = RegistryEntry::new("abc", "Keke1");
        entry.last_update = Some(0);
        assert_eq!(entry.last_update(), None);

        entry.last_update = Some(1_700_000_000);
        assert_eq!(entry.last_update().map(|t| t.timestamp()), Some(1_700_000_000));
    }

    #[test]
    fn battery_reading_maps_to_icon_level() {
        assert_eq!(BatteryLevel::from_reading(None), BatteryLevel::Unknown);
        assert_eq!(BatteryLevel::from_reading(Some(99)), BatteryLevel::Unknown);
        assert_eq!(BatteryLevel::from_reading(Some(100)), BatteryLevel::Level(1));
        assert_eq!(BatteryLevel::from_reading(Some(350)), BatteryLevel::Level(3));
        assert_eq!(BatteryLevel::from_reading(Some(599)), BatteryLevel::Level(5));
        assert_eq!(BatteryLevel::from_reading(Some(600)), BatteryLevel::Unknown);
    }

    #[test]
    fn unmatched_display_entry_has_no_signal_fields() {
        let display = DisplayEntry::new(RegistryEntry::new("abc", "Keke1"), None);
        assert!(!display.is_in_range());
        assert_eq!(display.hardware_id, None);
        assert_eq!(display.proximity, None);
        assert_eq!(display.distance_color, None);
        assert_eq!(display.distance_meter, None);
    }

    #[test]
    fn matched_entry_carries_distance_rendering() {
        let sighting = ScanSighting::new("abc", None, -60);
        let display = DisplayEntry::new(RegistryEntry::new("abc", "Keke1"), Some(&sighting));

        let json = serde_json::to_value(&display).unwrap();
        assert_eq!(json["alias"], "Keke1");
        assert_eq!(json["distanceColor"], "green");
        assert_eq!(json["distanceMeter"], "ooooooooo");
        assert_eq!(json["proximity"]["band"], "near");
    }

    #[test]
    fn label_uses_day_month_and_clock() {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let label = format_last_update(at);
        assert_eq!(label.len(), "14.11 um 22:13".len());
        assert!(label.contains(" um "));
    }
}
