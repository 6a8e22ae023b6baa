//! Normalized records returned by the Magio core.
//!
//! Upstream JSON never leaks past `services::magio::types`; every public
//! operation hands out the plain data shapes defined here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Stream quality profile (p5 is the highest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    P1,
    P2,
    P3,
    P4,
    P5,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::P1 => "p1",
            Quality::P2 => "p2",
            Quality::P3 => "p3",
            Quality::P4 => "p4",
            Quality::P5 => "p5",
        }
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "p1" => Ok(Quality::P1),
            "p2" => Ok(Quality::P2),
            "p3" => Ok(Quality::P3),
            "p4" => Ok(Quality::P4),
            "p5" => Ok(Quality::P5),
            other => Err(format!("unknown quality profile: {}", other)),
        }
    }
}

/// Access/refresh token pair plus expiry and device identity,
/// persisted as one unit per language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBundle {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Token valid until this epoch second
    #[serde(default)]
    pub expires: i64,
    pub device_id: String,
}

impl TokenBundle {
    /// Fresh bundle with no tokens and a newly generated device id
    pub fn empty() -> Self {
        Self {
            access_token: None,
            refresh_token: None,
            expires: 0,
            device_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// True when the access token is still usable at `now + margin_secs`
    pub fn valid_at(&self, now: i64, margin_secs: i64) -> bool {
        self.access_token.is_some() && self.expires > now + margin_secs
    }
}

/// Live channel snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: i64,
    pub name: String,
    pub original_name: String,
    pub logo: String,
    pub group: String,
    pub has_archive: bool,
}

/// One EPG entry, timestamps in epoch seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub schedule_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub start_time: i64,
    pub end_time: i64,
    /// end_time - start_time, whole seconds
    pub duration: i64,
    pub category: String,
    pub year: Option<i64>,
    pub episode: Option<i64>,
    pub images: Vec<String>,
}

/// EPG grouped per channel id
pub type EpgByChannel = HashMap<i64, Vec<Program>>;

/// Resolved playable stream plus the headers the player must replay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub url: String,
    pub headers: HashMap<String, String>,
    pub content_type: String,
    pub is_live: bool,
}

/// Registered device kind as reported by upstream groupings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Current,
    Mobile,
    Stb,
}

/// Registered device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    pub is_this_device: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_round_trip() {
        for s in ["p1", "p2", "p3", "p4", "p5"] {
            assert_eq!(Quality::from_str(s).unwrap().as_str(), s);
        }
        assert!(Quality::from_str("p6").is_err());
    }

    #[test]
    fn empty_bundle_is_never_valid() {
        let bundle = TokenBundle::empty();
        assert!(!bundle.valid_at(0, 60));
        assert!(!bundle.device_id.is_empty());
    }

    #[test]
    fn bundle_validity_margin() {
        let bundle = TokenBundle {
            access_token: Some("tok".into()),
            refresh_token: None,
            expires: 1_000,
            device_id: "d".into(),
        };
        assert!(bundle.valid_at(900, 60));
        assert!(!bundle.valid_at(940, 60));
        assert!(!bundle.valid_at(1_001, 60));
    }
}
