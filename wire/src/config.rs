//! Filter, DBSCAN and sink parameter records.
//!
//! These mirror the hub's JSON 1:1. Every struct is `#[serde(default)]` so a
//! partial document from an older hub still decodes, with missing fields
//! taking the hub's factory defaults.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

// =============================================================================
// FILTERS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Neighborhood {
    pub enabled: bool,
    pub k: u32,
    pub r_base: f64,
    pub r_scale: f64,
}

impl Default for Neighborhood {
    fn default() -> Self {
        Self { enabled: true, k: 5, r_base: 0.05, r_scale: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpikeRemoval {
    pub enabled: bool,
    pub dr_threshold: f64,
    pub window_size: u32,
}

impl Default for SpikeRemoval {
    fn default() -> Self {
        Self { enabled: true, dr_threshold: 0.3, window_size: 3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierRemoval {
    pub enabled: bool,
    pub median_window: u32,
    pub outlier_threshold: f64,
}

impl Default for OutlierRemoval {
    fn default() -> Self {
        Self { enabled: true, median_window: 5, outlier_threshold: 2.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntensityFilter {
    pub enabled: bool,
    pub min_intensity: f64,
    pub min_reliability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsolationRemoval {
    pub enabled: bool,
    pub min_cluster_size: u32,
    pub isolation_radius: f64,
}

impl Default for IsolationRemoval {
    fn default() -> Self {
        Self { enabled: true, min_cluster_size: 3, isolation_radius: 0.1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostIsolationRemoval {
    pub enabled: bool,
    pub min_points_size: u32,
    pub isolation_radius: f64,
    pub required_neighbors: u32,
}

impl Default for PostIsolationRemoval {
    fn default() -> Self {
        Self {
            enabled: true,
            min_points_size: 3,
            isolation_radius: 0.2,
            required_neighbors: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prefilter {
    pub enabled: bool,
    pub neighborhood: Neighborhood,
    pub spike_removal: SpikeRemoval,
    pub outlier_removal: OutlierRemoval,
    pub intensity_filter: IntensityFilter,
    pub isolation_removal: IsolationRemoval,
}

impl Default for Prefilter {
    fn default() -> Self {
        Self {
            enabled: true,
            neighborhood: Neighborhood::default(),
            spike_removal: SpikeRemoval::default(),
            outlier_removal: OutlierRemoval::default(),
            intensity_filter: IntensityFilter::default(),
            isolation_removal: IsolationRemoval::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Postfilter {
    pub enabled: bool,
    pub isolation_removal: PostIsolationRemoval,
}

impl Default for Postfilter {
    fn default() -> Self {
        Self { enabled: true, isolation_removal: PostIsolationRemoval::default() }
    }
}

/// Point filter pipeline parameters (before and after clustering).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub prefilter: Prefilter,
    pub postfilter: Postfilter,
}

// =============================================================================
// DBSCAN
// =============================================================================

/// Range-adaptive DBSCAN parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbscanConfig {
    pub eps_norm: f64,
    #[serde(rename = "minPts")]
    pub min_pts: u32,
    pub k_scale: f64,
    pub h_min: f64,
    pub h_max: f64,
    #[serde(rename = "R_max")]
    pub r_max: u32,
    #[serde(rename = "M_max")]
    pub m_max: u32,
}

impl Default for DbscanConfig {
    fn default() -> Self {
        Self {
            eps_norm: 2.5,
            min_pts: 5,
            k_scale: 1.0,
            h_min: 0.01,
            h_max: 0.2,
            r_max: 5,
            m_max: 600,
        }
    }
}

// =============================================================================
// SINKS
// =============================================================================

/// Stable sink identity.
///
/// Hubs that predate stable ids only report an array `index`; in that case
/// the index is used as the id so addressing still works, with the known
/// caveat that it shifts when another client deletes an earlier sink.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct SinkId(pub String);

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SinkId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Int(u64),
        }
        Ok(match Repr::deserialize(deserializer)? {
            Repr::Text(text) => Self(text),
            Repr::Int(n) => Self(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkEncoding {
    #[default]
    Msgpack,
    Json,
}

/// Transport-specific sink settings, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkKind {
    Nng {
        #[serde(default)]
        encoding: SinkEncoding,
    },
    Osc {
        #[serde(default)]
        in_bundle: bool,
        #[serde(default = "default_fragment_size")]
        bundle_fragment_size: u32,
    },
}

fn default_fragment_size() -> u32 {
    1024
}

fn default_topic() -> String {
    String::from("clusters")
}

fn default_enabled() -> bool {
    true
}

/// One cluster publisher configured on the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sink {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SinkId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(flatten)]
    pub kind: SinkKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default)]
    pub rate_limit: u32,
}

impl Sink {
    /// Factory defaults for a new sink of the given transport.
    #[must_use]
    pub fn template(osc: bool) -> Self {
        let (kind, url) = if osc {
            (
                SinkKind::Osc { in_bundle: false, bundle_fragment_size: default_fragment_size() },
                "osc://localhost:8000",
            )
        } else {
            (SinkKind::Nng { encoding: SinkEncoding::Msgpack }, "tcp://localhost:5555")
        };
        Self {
            id: None,
            index: None,
            kind,
            enabled: true,
            url: url.to_owned(),
            topic: default_topic(),
            rate_limit: 30,
        }
    }

    /// Address used for REST calls: stable id first, list position otherwise.
    #[must_use]
    pub fn address(&self, position: usize) -> SinkId {
        if let Some(id) = &self.id {
            return id.clone();
        }
        let index = self.index.map_or(position, |i| i as usize);
        SinkId(index.to_string())
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            SinkKind::Nng { .. } => "nng",
            SinkKind::Osc { .. } => "osc",
        }
    }
}
