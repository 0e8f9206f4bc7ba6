//! Value types shared by the adapters, the config layer and the bridge core.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;

/// One of the two bridged platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    A,
    B,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::A, Platform::B];

    /// The platform on the other side of the bridge.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A platform-native identifier: a 64-bit snowflake or an opaque string.
///
/// Canonical digit-only strings that fit in a `u64` normalize to [`NativeId::Int`],
/// so `"123"` read from a mention token and `123` read from a config table
/// compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum NativeId {
    Int(u64),
    Text(String),
}

impl NativeId {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Text(_) => None,
        }
    }
}

impl From<u64> for NativeId {
    fn from(value: u64) -> Self {
        Self::Int(value)
    }
}

impl From<String> for NativeId {
    /// Only canonical decimal strings become [`NativeId::Int`]; `"007"` stays
    /// text so it prints back unchanged.
    fn from(value: String) -> Self {
        if !value.is_empty()
            && value.bytes().all(|b| b.is_ascii_digit())
            && let Ok(n) = value.parse::<u64>()
            && n.to_string() == value
        {
            return Self::Int(n);
        }
        Self::Text(value)
    }
}

impl From<&str> for NativeId {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl FromStr for NativeId {
    type Err = Error;

    /// Strict parse used on untrusted input: rejects empty ids and ids with
    /// whitespace, which no supported platform issues.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::InvalidId {
                value: s.to_string(),
                reason: "empty",
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(Error::InvalidId {
                value: s.to_string(),
                reason: "contains whitespace",
            });
        }
        Ok(Self::from(s))
    }
}

impl<'de> Deserialize<'de> for NativeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Self::Int(n),
            Raw::Text(s) => Self::from(s),
        })
    }
}

impl fmt::Display for NativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Reference to the channel a message lives in (name or native channel id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelRef(pub String);

impl ChannelRef {
    pub fn new(channel: impl Into<String>) -> Self {
        Self(channel.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a message used for history and lock lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandleKey {
    pub platform: Platform,
    pub id: NativeId,
}

impl fmt::Display for HandleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.platform, self.id)
    }
}

/// Opaque handle to a message on one platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHandle {
    pub platform: Platform,
    pub id: NativeId,
    pub channel: ChannelRef,
}

impl MessageHandle {
    pub fn new(platform: Platform, id: impl Into<NativeId>, channel: impl Into<String>) -> Self {
        Self {
            platform,
            id: id.into(),
            channel: ChannelRef::new(channel),
        }
    }

    pub fn key(&self) -> HandleKey {
        HandleKey {
            platform: self.platform,
            id: self.id.clone(),
        }
    }
}

/// A user as seen by one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: NativeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
}

impl UserRef {
    pub fn new(id: impl Into<NativeId>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            is_bot: false,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Name used in attribution prefixes; falls back to the raw id.
    pub fn label(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_strings_normalize_to_int() {
        assert_eq!(NativeId::from("123456789012345678"), NativeId::Int(123_456_789_012_345_678));
        assert_eq!(NativeId::from("U01ABCDEF"), NativeId::Text("U01ABCDEF".into()));
        // Slack timestamps keep their textual form.
        assert_eq!(
            NativeId::from("1700000000.000100"),
            NativeId::Text("1700000000.000100".into())
        );
    }

    #[test]
    fn leading_zeros_keep_text_form() {
        assert_eq!(NativeId::from("007"), NativeId::Text("007".into()));
        assert_eq!(NativeId::from("007").to_string(), "007");
        assert_ne!(NativeId::from("007"), NativeId::from("7"));
        assert_eq!(NativeId::from("0"), NativeId::Int(0));
        assert_eq!(NativeId::from("00"), NativeId::Text("00".into()));

        let from_json: NativeId = serde_json::from_str("\"007\"").unwrap();
        assert_eq!(from_json, NativeId::Text("007".into()));
    }

    #[test]
    fn deserialize_normalizes_both_forms() {
        let from_int: NativeId = serde_json::from_str("42").unwrap();
        let from_str: NativeId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(from_int, from_str);
    }

    #[test]
    fn strict_parse_rejects_empty_and_whitespace() {
        assert!("".parse::<NativeId>().is_err());
        assert!("U1 23".parse::<NativeId>().is_err());
        assert_eq!("U123".parse::<NativeId>().unwrap(), NativeId::Text("U123".into()));
    }

    #[test]
    fn other_platform() {
        assert_eq!(Platform::A.other(), Platform::B);
        assert_eq!(Platform::B.other(), Platform::A);
    }

    #[test]
    fn user_label_falls_back_to_id() {
        assert_eq!(UserRef::new("U1").label(), "U1");
        assert_eq!(UserRef::new("U1").with_name("randy").label(), "randy");
    }
}
