//! Wire formats of the Keke backend and their conversion into domain types.
//!
//! The backend is loose about JSON types: numbers arrive as strings, missing
//! values arrive as `""`, `"0"` or `null`. Everything here decodes leniently
//! and leaves interpretation to the domain layer.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use url::Url;

use crate::core::model::RegistryEntry;

/// Opaque session token issued by the login endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    /// Returns `None` for blank input.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// One element of the `devices.php` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireDevice {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub alias: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub lastupdate: Option<i64>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub batt: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub maplink: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub setlink: String,
}

impl From<WireDevice> for RegistryEntry {
    fn from(device: WireDevice) -> Self {
        Self {
            name: device.name,
            alias: device.alias,
            last_update: device.lastupdate,
            battery: device.batt,
            map_link: parse_link(&device.maplink),
            settings_link: parse_link(&device.setlink),
        }
    }
}

fn parse_link(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Url::parse(raw).ok()
}

/// Interprets the body of `usercheck.php`.
///
/// A successful login answers with the token, either as a JSON string or as
/// bare text. Rejected credentials answer with `false`.
pub(crate) fn parse_login_body(body: &str) -> Option<AuthToken> {
    let body = body.trim();
    match serde_json::from_str::<Value>(body) {
        Ok(Value::String(token)) => AuthToken::new(token),
        Ok(Value::Number(n)) => AuthToken::new(n.to_string()),
        Ok(_) => None,
        Err(_) if body.eq_ignore_ascii_case("false") => None,
        Err(_) => AuthToken::new(body),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number_from(Value::deserialize(deserializer)?))
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number_from(Value::deserialize(deserializer)?).and_then(|n| u32::try_from(n).ok()))
}

fn number_from(value: Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.floor() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.floor() as i64))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> RegistryEntry {
        serde_json::from_value::<WireDevice>(value).unwrap().into()
    }

    #[test]
    fn decodes_full_device() {
        let entry = decode(json!({
            "name": "AA:BB:CC:DD:EE:FF",
            "alias": "Bike",
            "lastupdate": 1700000000,
            "batt": 420,
            "maplink": "https://www.kekefinder.de/map.php?id=1",
            "setlink": "https://www.kekefinder.de/setup.php?id=1"
        }));

        assert_eq!(entry.name, "AA:BB:CC:DD:EE:FF");
        assert_eq!(entry.alias, "Bike");
        assert_eq!(entry.last_update, Some(1_700_000_000));
        assert_eq!(entry.battery, Some(420));
        assert_eq!(
            entry.map_link.as_ref().map(Url::as_str),
            Some("https://www.kekefinder.de/map.php?id=1")
        );
        assert!(entry.settings_link.is_some());
    }

    #[test]
    fn numbers_sent_as_strings_are_accepted() {
        let entry = decode(json!({
            "name": "abc",
            "alias": "Keke1",
            "lastupdate": "1700000000",
            "batt": " 310 "
        }));
        assert_eq!(entry.last_update, Some(1_700_000_000));
        assert_eq!(entry.battery, Some(310));
    }

    #[test]
    fn missing_and_junk_fields_become_absent() {
        let entry = decode(json!({
            "name": "abc",
            "lastupdate": "",
            "batt": null,
            "maplink": "",
            "setlink": "not a url"
        }));
        assert_eq!(entry.alias, "");
        assert_eq!(entry.last_update, None);
        assert_eq!(entry.battery, None);
        assert_eq!(entry.map_link, None);
        assert_eq!(entry.settings_link, None);
    }

    #[test]
    fn negative_battery_is_dropped() {
        let entry = decode(json!({ "name": "abc", "alias": "x", "batt": -5 }));
        assert_eq!(entry.battery, None);
    }

    #[test]
    fn login_body_variants() {
        assert_eq!(parse_login_body("\"tok-123\"").as_ref().map(AuthToken::as_str), Some("tok-123"));
        assert_eq!(parse_login_body("tok-raw\n").as_ref().map(AuthToken::as_str), Some("tok-raw"));
        assert_eq!(parse_login_body("4711").as_ref().map(AuthToken::as_str), Some("4711"));
        assert!(parse_login_body("false").is_none());
        assert!(parse_login_body("").is_none());
        assert!(parse_login_body("\"  \"").is_none());
        assert!(parse_login_body("null").is_none());
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = AuthToken::new("secret").unwrap();
        assert_eq!(format!("{token:?}"), "AuthToken(***)");
    }
}
