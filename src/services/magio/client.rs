//! Upstream metadata operations.
//!
//! Every operation first runs `ensure_authenticated()` and returns its
//! designated empty sentinel (`None`, empty `Vec`, `false`) when the session
//! cannot be established or the upstream call fails. The `Result`-returning
//! internals carry the real failure for logging.

use super::resolver;
use super::session::{MagioSession, STREAM_TIMEOUT};
use super::types::*;
use super::MagioError;
use crate::models::{Channel, Device, DeviceKind, EpgByChannel, StreamDescriptor};
use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Single EPG page; no multi-page follow-up
const EPG_PAGE_SIZE: u32 = 1000;
/// Narrow window used for catch-up schedule lookups
const CATCHUP_LOOKUP_LIMIT: u32 = 10;
/// Category applied to channels missing from the category map
const DEFAULT_GROUP: &str = "Ostatní";

/// Day-aligned UTC window: `days_back` days ago at 00:00:00 through
/// `days_forward` days ahead at 23:59:59
fn epg_window(now: DateTime<Utc>, days_back: i64, days_forward: i64) -> (String, String) {
    let start = (now - chrono::Duration::days(days_back))
        .format("%Y-%m-%dT00:00:00.000Z")
        .to_string();
    let end = (now + chrono::Duration::days(days_forward))
        .format("%Y-%m-%dT23:59:59.000Z")
        .to_string();
    (start, end)
}

/// Literal second-resolution UTC timestamp in the upstream filter dialect
fn filter_timestamp(ts: i64) -> String {
    match Utc.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%dT%H:%M:%S.000Z").to_string(),
        None => String::new(),
    }
}

fn epg_filter_single(channel_id: i64, start: &str, end: &str) -> String {
    format!(
        "channel.id=={} and startTime=ge={} and endTime=le={}",
        channel_id, start, end
    )
}

fn epg_filter_many(channel_ids: &[i64], start: &str, end: &str) -> String {
    let ids = channel_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "channel.id=in=({}) and startTime=ge={} and endTime=le={}",
        ids, start, end
    )
}

/// Schedule id of the first program in upstream order whose slot overlaps
/// `[start, end]` (`program.start <= end && program.end >= start`)
fn find_overlapping_schedule(items: &[EpgItem], start: i64, end: i64) -> Option<i64> {
    items
        .iter()
        .flat_map(|item| item.programs.iter())
        .find(|p| p.start_secs() <= end && p.end_secs() >= start)
        .and_then(|p| p.schedule_id)
}

impl MagioSession {
    /// Bearer-authenticated GET against the upstream API
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        stream_call: bool,
    ) -> Result<T, MagioError> {
        let token = self.access_token().await.ok_or(MagioError::Auth)?;

        let mut request = self
            .http
            .get(format!("{}{}", self.cfg.base_url, path))
            .query(query)
            .header("Host", self.cfg.host())
            .header("User-Agent", &self.cfg.user_agent)
            .bearer_auth(token);

        // stream-url lookups get the short timeout plus browser-ish headers
        if stream_call {
            request = request
                .timeout(STREAM_TIMEOUT)
                .header("Accept", "*/*")
                .header("Referer", self.cfg.referer());
        }

        Ok(request.send().await?.json().await?)
    }

    // ========================================================================
    // Channels
    // ========================================================================

    /// Channel list in upstream order, joined with the category map
    pub async fn list_channels(&self) -> Vec<Channel> {
        if !self.ensure_authenticated().await {
            return Vec::new();
        }
        match self.fetch_channels().await {
            Ok(channels) => channels,
            Err(e) => {
                tracing::error!("Failed to fetch channels: {}", e);
                Vec::new()
            }
        }
    }

    async fn fetch_channels(&self) -> Result<Vec<Channel>, MagioError> {
        let categories: CategoriesResponse = self
            .get_json(
                "/home/categories",
                &[("language", self.cfg.language.clone())],
                false,
            )
            .await?;

        let mut category_by_channel: HashMap<i64, String> = HashMap::new();
        for category in categories.categories {
            for channel in category.channels {
                category_by_channel.insert(channel.channel_id, category.name.clone());
            }
        }

        let channels: ChannelsResponse = self
            .get_json(
                "/v2/television/channels",
                &[
                    ("list", "LIVE".to_string()),
                    ("queryScope", "LIVE".to_string()),
                ],
                false,
            )
            .await?;

        if !channels.success {
            return Err(MagioError::rejected(channels.error_message));
        }

        Ok(channels
            .items
            .into_iter()
            .map(|item| {
                let c = item.channel;
                let group = category_by_channel
                    .get(&c.channel_id)
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_GROUP.to_string());
                Channel {
                    id: c.channel_id,
                    name: c.name,
                    original_name: c.original_name,
                    logo: c.logo_url,
                    group,
                    has_archive: c.has_archive,
                }
            })
            .collect())
    }

    // ========================================================================
    // Stream resolution
    // ========================================================================

    /// Playable live stream URL and headers for a channel
    pub async fn resolve_live_stream(&self, channel_id: i64) -> Option<StreamDescriptor> {
        if !self.ensure_authenticated().await {
            return None;
        }
        let params = [
            ("service", "LIVE".to_string()),
            ("name", self.cfg.device_name.clone()),
            ("devtype", self.cfg.device_type.clone()),
            ("id", channel_id.to_string()),
            ("prof", self.cfg.quality.as_str().to_string()),
            ("ecid", String::new()),
            ("drm", "verimatrix".to_string()),
            ("start", "LIVE".to_string()),
            ("end", "END".to_string()),
            ("device", "OTT_STB".to_string()),
        ];
        match self.resolve_stream(&params, true).await {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                tracing::error!("Failed to resolve live stream for channel {}: {}", channel_id, e);
                None
            }
        }
    }

    /// Catch-up stream for a specific aired schedule
    pub async fn resolve_catchup_by_schedule(&self, schedule_id: i64) -> Option<StreamDescriptor> {
        if !self.ensure_authenticated().await {
            return None;
        }
        let params = [
            ("service", "ARCHIVE".to_string()),
            ("name", self.cfg.device_name.clone()),
            ("devtype", self.cfg.device_type.clone()),
            ("id", schedule_id.to_string()),
            ("prof", self.cfg.quality.as_str().to_string()),
            ("ecid", String::new()),
            ("drm", "widevine".to_string()),
        ];
        match self.resolve_stream(&params, false).await {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                tracing::error!(
                    "Failed to resolve catchup stream for schedule {}: {}",
                    schedule_id,
                    e
                );
                None
            }
        }
    }

    async fn resolve_stream(
        &self,
        params: &[(&str, String)],
        is_live: bool,
    ) -> Result<StreamDescriptor, MagioError> {
        let response: StreamUrlResponse = self
            .get_json("/v2/television/stream-url", params, true)
            .await?;

        if !response.success {
            return Err(MagioError::rejected(response.error_message));
        }
        let url = response
            .url
            .ok_or_else(|| MagioError::Malformed("stream-url response without url".into()))?;

        resolver::resolve(self, &url, is_live).await
    }

    // ========================================================================
    // EPG
    // ========================================================================

    /// EPG for one channel or, with `channel_id` None, for the whole lineup
    pub async fn fetch_epg(
        &self,
        channel_id: Option<i64>,
        days_back: i64,
        days_forward: i64,
    ) -> Option<EpgByChannel> {
        if !self.ensure_authenticated().await {
            return None;
        }

        let (start, end) = epg_window(Utc::now(), days_back, days_forward);
        let filter = match channel_id {
            Some(id) => epg_filter_single(id, &start, &end),
            None => {
                // scope by the full resolved channel set; its failure aborts
                let channels = self.list_channels().await;
                if channels.is_empty() {
                    return None;
                }
                let ids: Vec<i64> = channels.iter().map(|c| c.id).collect();
                epg_filter_many(&ids, &start, &end)
            }
        };

        match self.query_epg(filter, EPG_PAGE_SIZE).await {
            Ok(response) => {
                let mut epg: EpgByChannel = HashMap::new();
                for item in response.items {
                    let Some(id) = item.channel.as_ref().and_then(|c| c.id) else {
                        continue;
                    };
                    let programs = epg.entry(id).or_default();
                    programs.extend(item.programs.iter().map(EpgProgram::normalize));
                }
                Some(epg)
            }
            Err(e) => {
                tracing::error!("Failed to fetch EPG: {}", e);
                None
            }
        }
    }

    async fn query_epg(&self, filter: String, limit: u32) -> Result<EpgResponse, MagioError> {
        let response: EpgResponse = self
            .get_json(
                "/v2/television/epg",
                &[
                    ("filter", filter),
                    ("limit", limit.to_string()),
                    ("offset", "0".to_string()),
                    ("lang", self.cfg.language.to_uppercase()),
                ],
                false,
            )
            .await?;

        if !response.success {
            return Err(MagioError::rejected(response.error_message));
        }
        Ok(response)
    }

    /// Locate the program overlapping `[start, end]` on a channel and
    /// resolve its catch-up stream. No overlapping program is a lookup miss,
    /// not an error.
    pub async fn resolve_catchup_by_time(
        &self,
        channel_id: i64,
        start: i64,
        end: i64,
    ) -> Option<StreamDescriptor> {
        if !self.ensure_authenticated().await {
            return None;
        }

        match self.find_catchup_schedule(channel_id, start, end).await {
            Ok(schedule_id) => self.resolve_catchup_by_schedule(schedule_id).await,
            Err(MagioError::NotFound) => {
                tracing::info!(
                    "No program overlapping {}-{} on channel {}",
                    start,
                    end,
                    channel_id
                );
                None
            }
            Err(e) => {
                tracing::error!("EPG lookup for catchup failed: {}", e);
                None
            }
        }
    }

    async fn find_catchup_schedule(
        &self,
        channel_id: i64,
        start: i64,
        end: i64,
    ) -> Result<i64, MagioError> {
        let filter = epg_filter_single(channel_id, &filter_timestamp(start), &filter_timestamp(end));
        let response = self.query_epg(filter, CATCHUP_LOOKUP_LIMIT).await?;
        find_overlapping_schedule(&response.items, start, end).ok_or(MagioError::NotFound)
    }

    // ========================================================================
    // Devices
    // ========================================================================

    /// Registered devices: this device first, then mobile, then STB/TV
    pub async fn list_devices(&self) -> Vec<Device> {
        if !self.ensure_authenticated().await {
            return Vec::new();
        }

        let response: DevicesResponse = match self.get_json("/v2/home/my-devices", &[], false).await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Failed to fetch devices: {}", e);
                return Vec::new();
            }
        };

        let mut devices = Vec::new();
        if let Some(d) = response.this_device {
            devices.push(Device {
                id: d.id,
                name: d.name,
                kind: DeviceKind::Current,
                is_this_device: true,
            });
        }
        for d in response.small_screen_devices {
            devices.push(Device {
                id: d.id,
                name: d.name,
                kind: DeviceKind::Mobile,
                is_this_device: false,
            });
        }
        for d in response.stb_and_big_screen_devices {
            devices.push(Device {
                id: d.id,
                name: d.name,
                kind: DeviceKind::Stb,
                is_this_device: false,
            });
        }
        devices
    }

    /// Remove a registered device. Callers invalidate any cached device list.
    pub async fn delete_device(&self, device_id: i64) -> bool {
        if !self.ensure_authenticated().await {
            return false;
        }

        let response: Result<DeleteDeviceResponse, MagioError> = self
            .get_json("/home/deleteDevice", &[("id", device_id.to_string())], false)
            .await;

        match response {
            Ok(r) if r.success => {
                tracing::info!("Device {} deleted", device_id);
                true
            }
            Ok(r) => {
                tracing::error!(
                    "Failed to delete device {}: {}",
                    device_id,
                    r.error_message.unwrap_or_else(|| "unknown error".into())
                );
                false
            }
            Err(e) => {
                tracing::error!("Failed to delete device {}: {}", device_id, e);
                false
            }
        }
    }
}
