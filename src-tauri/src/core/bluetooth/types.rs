//! Turning raw advertisements into sightings.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::model::ScanSighting;

// Matches AA:BB:CC:DD:EE:FF as well as BlueZ's dev_AA_BB_CC_DD_EE_FF.
static MAC_ADDRESS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)([0-9a-f]{2}[:_-]){5}[0-9a-f]{2}").ok());

/// Stable hardware id for a platform device id.
///
/// Uses the MAC address when the platform id contains one, so that it can
/// be compared with registry names. Otherwise (e.g. macOS UUIDs) the
/// platform id is kept as is.
pub fn hardware_id(platform_id: &str) -> String {
    extract_mac_address(platform_id).unwrap_or_else(|| platform_id.trim().to_string())
}

fn extract_mac_address(platform_id: &str) -> Option<String> {
    let re = MAC_ADDRESS.as_ref()?;
    re.find_iter(platform_id)
        .last()
        .map(|m| m.as_str().replace(['_', '-'], ":").to_uppercase())
}

/// Builds a sighting from one advertisement.
///
/// Advertisements without a signal reading, or weaker than `min_rssi`,
/// produce nothing. The advertised local name wins over the cached device
/// name; blank names count as no name.
pub fn sighting_from_advertisement(
    platform_id: &str,
    local_name: Option<String>,
    device_name: Option<String>,
    rssi: Option<i16>,
    min_rssi: Option<i16>,
) -> Option<ScanSighting> {
    let rssi = rssi?;
    if min_rssi.is_some_and(|min| rssi < min) {
        return None;
    }
    let advertised_name = local_name
        .filter(|n| !n.trim().is_empty())
        .or_else(|| device_name.filter(|n| !n.trim().is_empty()));
    Some(ScanSighting::new(hardware_id(platform_id), advertised_name, rssi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bluez_path_yields_mac() {
        assert_eq!(
            hardware_id("/org/bluez/hci0/dev_c4_7c_8d_6a_12_3f"),
            "C4:7C:8D:6A:12:3F"
        );
    }

    #[test]
    fn plain_mac_is_normalised() {
        assert_eq!(hardware_id("aa-bb-cc-dd-ee-ff"), "AA:BB:CC:DD:EE:FF");
        assert_eq!(hardware_id("AA:BB:CC:DD:EE:FF"), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn uuid_ids_are_kept() {
        let id = "8E0F2C3A-1B4D-4C5E-9F60-7A8B9C0D1E2F";
        assert_eq!(hardware_id(id), id);
    }

    #[test]
    fn advertisement_without_rssi_is_skipped() {
        assert!(sighting_from_advertisement("id", Some("Keke".into()), None, None, None).is_none());
    }

    #[test]
    fn weak_advertisement_is_filtered() {
        assert!(sighting_from_advertisement("id", None, None, Some(-95), Some(-90)).is_none());
        assert!(sighting_from_advertisement("id", None, None, Some(-90), Some(-90)).is_some());
    }

    #[test]
    fn local_name_preferred_over_device_name() {
        let s = sighting_from_advertisement(
            "id",
            Some("Keke-Adv".into()),
            Some("Keke-Cached".into()),
            Some(-60),
            None,
        )
        .unwrap();
        assert_eq!(s.advertised_name.as_deref(), Some("Keke-Adv"));

        let s = sighting_from_advertisement("id", Some(" ".into()), Some("Keke-Cached".into()), Some(-60), None)
            .unwrap();
        assert_eq!(s.advertised_name.as_deref(), Some("Keke-Cached"));
    }
}
