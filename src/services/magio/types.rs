//! Magio API wire types.
//!
//! Upstream JSON is inconsistent about optional fields and about the
//! `success` flag (auth and stream responses omit it on failure paths,
//! listing responses omit it on success paths). Every field upstream is
//! known to drop carries `#[serde(default)]`, and the defaulting policy
//! lives here so schema drift stops at this layer.

use crate::models::Program;
use serde::Deserialize;

fn default_true() -> bool {
    true
}

// ============================================================================
// Authentication
// ============================================================================

/// Token payload shared by init, login and refresh responses
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPayload {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in milliseconds
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Response of /v2/auth/init, /v2/auth/login and /v2/auth/tokens.
/// `success` defaults to false: a missing flag on auth is a rejection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub token: Option<TokenPayload>,
    #[serde(default)]
    pub error_message: Option<String>,
}

// ============================================================================
// Channels & categories
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryChannelRef {
    pub channel_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub channels: Vec<CategoryChannelRef>,
}

/// Response of /home/categories
#[derive(Debug, Clone, Deserialize)]
pub struct CategoriesResponse {
    #[serde(default)]
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPayload {
    pub channel_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub original_name: String,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub has_archive: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelItem {
    pub channel: ChannelPayload,
}

/// Response of /v2/television/channels.
/// Here a missing `success` means success.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub items: Vec<ChannelItem>,
    #[serde(default)]
    pub error_message: Option<String>,
}

// ============================================================================
// Stream URL
// ============================================================================

/// Response of /v2/television/stream-url
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamUrlResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

// ============================================================================
// EPG
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgramCategory {
    #[serde(default)]
    pub desc: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramValue {
    #[serde(default)]
    pub creation_year: Option<i64>,
    #[serde(default)]
    pub episode_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub program_category: ProgramCategory,
    #[serde(default)]
    pub program_value: ProgramValue,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpgProgram {
    #[serde(default)]
    pub schedule_id: Option<i64>,
    /// Epoch milliseconds
    #[serde(rename = "startTimeUTC")]
    pub start_time_utc: i64,
    /// Epoch milliseconds
    #[serde(rename = "endTimeUTC")]
    pub end_time_utc: i64,
    #[serde(default)]
    pub program: ProgramInfo,
}

impl EpgProgram {
    /// Start of the aired slot in epoch seconds
    pub fn start_secs(&self) -> i64 {
        self.start_time_utc / 1000
    }

    /// End of the aired slot in epoch seconds
    pub fn end_secs(&self) -> i64 {
        self.end_time_utc / 1000
    }

    /// Convert to the normalized record; duration is whole seconds
    pub fn normalize(&self) -> Program {
        let start_time = self.start_secs();
        let end_time = self.end_secs();
        Program {
            schedule_id: self.schedule_id,
            title: self.program.title.clone(),
            description: self.program.description.clone(),
            start_time,
            end_time,
            duration: end_time - start_time,
            category: self.program.program_category.desc.clone(),
            year: self.program.program_value.creation_year,
            episode: self.program.program_value.episode_id,
            images: self.program.images.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EpgChannelRef {
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EpgItem {
    #[serde(default)]
    pub channel: Option<EpgChannelRef>,
    #[serde(default)]
    pub programs: Vec<EpgProgram>,
}

/// Response of /v2/television/epg.
/// Like the channel list, a missing `success` means success.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpgResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub items: Vec<EpgItem>,
    #[serde(default)]
    pub error_message: Option<String>,
}

// ============================================================================
// Devices
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct DevicePayload {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// Response of /v2/home/my-devices
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicesResponse {
    #[serde(default)]
    pub this_device: Option<DevicePayload>,
    #[serde(default)]
    pub small_screen_devices: Vec<DevicePayload>,
    #[serde(default)]
    pub stb_and_big_screen_devices: Vec<DevicePayload>,
}

/// Response of /home/deleteDevice
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDeviceResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_success_defaults_to_false() {
        let resp: AuthResponse = serde_json::from_str(r#"{"errorMessage":"bad creds"}"#).unwrap();
        assert!(!resp.success);
        assert_eq!(resp.error_message.as_deref(), Some("bad creds"));
    }

    #[test]
    fn channels_success_defaults_to_true() {
        let resp: ChannelsResponse = serde_json::from_str(r#"{"items":[]}"#).unwrap();
        assert!(resp.success);
    }

    #[test]
    fn epg_program_normalizes_ms_to_whole_seconds() {
        let raw = r#"{
            "scheduleId": 42,
            "startTimeUTC": 1700000000500,
            "endTimeUTC": 1700003600500,
            "program": {
                "title": "News",
                "description": "Evening news",
                "programCategory": {"desc": "news"},
                "programValue": {"creationYear": 2023, "episodeId": 7},
                "images": ["http://img/1.jpg"]
            }
        }"#;
        let program: EpgProgram = serde_json::from_str(raw).unwrap();
        let normalized = program.normalize();
        assert_eq!(normalized.schedule_id, Some(42));
        assert_eq!(normalized.start_time, 1_700_000_000);
        assert_eq!(normalized.end_time, 1_700_003_600);
        assert_eq!(normalized.duration, 3600);
        assert_eq!(normalized.year, Some(2023));
        assert_eq!(normalized.episode, Some(7));
        assert_eq!(normalized.images, vec!["http://img/1.jpg".to_string()]);
    }

    #[test]
    fn epg_duration_non_negative_for_well_formed_input() {
        let raw = r#"{"startTimeUTC": 1700000000000, "endTimeUTC": 1700000000000}"#;
        let program: EpgProgram = serde_json::from_str(raw).unwrap();
        assert_eq!(program.normalize().duration, 0);
    }

    #[test]
    fn devices_response_tolerates_missing_groups() {
        let resp: DevicesResponse =
            serde_json::from_str(r#"{"thisDevice":{"id":1,"name":"stb"}}"#).unwrap();
        assert!(resp.this_device.is_some());
        assert!(resp.small_screen_devices.is_empty());
        assert!(resp.stb_and_big_screen_devices.is_empty());
    }
}
