//! Live-channel message unions.
//!
//! One JSON object per message; the `type` field selects the variant.

use serde::{Deserialize, Serialize};

use crate::config::{DbscanConfig, FilterConfig, Sink};
use crate::model::{ClusterItem, Sensor, SensorId, SensorPatch, WorldMask};

#[cfg(test)]
#[path = "message_test.rs"]
mod message_test;

/// `publishers` block of a sensor snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Publishers {
    #[serde(default)]
    pub sinks: Vec<Sink>,
}

/// Messages pushed by the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "clusters-lite")]
    ClustersLite {
        #[serde(default)]
        seq: u64,
        #[serde(default)]
        t: i64,
        #[serde(default)]
        items: Vec<ClusterItem>,
    },
    #[serde(rename = "raw-lite")]
    RawLite {
        #[serde(default)]
        seq: u64,
        #[serde(default)]
        t: i64,
        #[serde(default)]
        xy: Vec<f32>,
        #[serde(default)]
        sid: Vec<i32>,
    },
    #[serde(rename = "filtered-lite")]
    FilteredLite {
        #[serde(default)]
        seq: Option<u64>,
        #[serde(default)]
        t: Option<i64>,
        #[serde(default)]
        xy: Vec<f32>,
        #[serde(default)]
        sid: Vec<i32>,
    },
    #[serde(rename = "sensor.snapshot")]
    SensorSnapshot {
        #[serde(default)]
        sensors: Vec<Sensor>,
        #[serde(default)]
        publishers: Option<Publishers>,
        #[serde(default)]
        filter_config: Option<FilterConfig>,
        #[serde(default)]
        world_mask: Option<WorldMask>,
    },
    #[serde(rename = "sensor.updated")]
    SensorUpdated {
        sensor: Sensor,
        #[serde(rename = "clientId", default)]
        client_id: Option<String>,
    },
    #[serde(rename = "filter.config")]
    FilterConfig { config: FilterConfig },
    #[serde(rename = "filter.updated")]
    FilterUpdated { config: FilterConfig },
    #[serde(rename = "dbscan.config")]
    DbscanConfig { config: DbscanConfig },
    #[serde(rename = "dbscan.updated")]
    DbscanUpdated { config: DbscanConfig },
    #[serde(rename = "world.updated")]
    WorldUpdated { world_mask: WorldMask },
    #[serde(rename = "ok")]
    Ok {
        #[serde(rename = "ref", default)]
        reference: Option<String>,
        #[serde(default)]
        sensor: Option<Sensor>,
    },
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        message: String,
    },
}

impl ServerMessage {
    /// Every `type` string this union accepts.
    pub const KINDS: [&'static str; 12] = [
        "clusters-lite",
        "raw-lite",
        "filtered-lite",
        "sensor.snapshot",
        "sensor.updated",
        "filter.config",
        "filter.updated",
        "dbscan.config",
        "dbscan.updated",
        "world.updated",
        "ok",
        "error",
    ];

    /// The wire `type` string of this message.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ClustersLite { .. } => "clusters-lite",
            Self::RawLite { .. } => "raw-lite",
            Self::FilteredLite { .. } => "filtered-lite",
            Self::SensorSnapshot { .. } => "sensor.snapshot",
            Self::SensorUpdated { .. } => "sensor.updated",
            Self::FilterConfig { .. } => "filter.config",
            Self::FilterUpdated { .. } => "filter.updated",
            Self::DbscanConfig { .. } => "dbscan.config",
            Self::DbscanUpdated { .. } => "dbscan.updated",
            Self::WorldUpdated { .. } => "world.updated",
            Self::Ok { .. } => "ok",
            Self::Error { .. } => "error",
        }
    }
}

/// `patch` body of a `world.update` message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPatch {
    pub world_mask: WorldMask,
}

/// Messages sent to the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "sensor.requestSnapshot")]
    RequestSnapshot,
    #[serde(rename = "sensor.update")]
    SensorUpdate {
        id: SensorId,
        patch: SensorPatch,
        #[serde(rename = "clientId", default, skip_serializing_if = "Option::is_none")]
        client_id: Option<String>,
    },
    #[serde(rename = "sensor.enable")]
    SensorEnable { id: SensorId, enabled: bool },
    #[serde(rename = "filter.requestConfig")]
    RequestFilterConfig,
    #[serde(rename = "filter.update")]
    FilterUpdate { config: FilterConfig },
    #[serde(rename = "dbscan.requestConfig")]
    RequestDbscanConfig,
    #[serde(rename = "dbscan.update")]
    DbscanUpdate { config: DbscanConfig },
    #[serde(rename = "world.update")]
    WorldUpdate { patch: WorldPatch },
}

impl ClientMessage {
    #[must_use]
    pub fn world_update(world_mask: WorldMask) -> Self {
        Self::WorldUpdate { patch: WorldPatch { world_mask } }
    }

    /// The wire `type` string of this message.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RequestSnapshot => "sensor.requestSnapshot",
            Self::SensorUpdate { .. } => "sensor.update",
            Self::SensorEnable { .. } => "sensor.enable",
            Self::RequestFilterConfig => "filter.requestConfig",
            Self::FilterUpdate { .. } => "filter.update",
            Self::RequestDbscanConfig => "dbscan.requestConfig",
            Self::DbscanUpdate { .. } => "dbscan.update",
            Self::WorldUpdate { .. } => "world.update",
        }
    }
}
