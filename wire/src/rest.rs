//! REST paths and request/response bodies under `/api/v1`.
//!
//! Paths are built here so the browser client and the CLI address the hub
//! identically. Path segments taken from user data are percent-encoded.

use serde::{Deserialize, Serialize};

use crate::config::SinkId;
use crate::model::{SensorId, SensorMode};

#[cfg(test)]
#[path = "rest_test.rs"]
mod rest_test;

pub const API_PREFIX: &str = "/api/v1";

/// Default endpoint offered when creating a sensor.
pub const DEFAULT_SENSOR_HOST: &str = "192.168.1.10";
pub const DEFAULT_SENSOR_PORT: u16 = 10940;

/// Sensor driver types the hub accepts on create.
pub const SENSOR_TYPES: [&str; 2] = ["hokuyo_urg_eth", "unknown"];

/// Percent-encode one path segment (RFC 3986 unreserved set kept as-is).
#[must_use]
pub fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

#[must_use]
pub fn sensors_path() -> String {
    format!("{API_PREFIX}/sensors")
}

#[must_use]
pub fn sensor_path(id: &SensorId) -> String {
    format!("{API_PREFIX}/sensors/{}", encode_segment(id.as_str()))
}

#[must_use]
pub fn sinks_path() -> String {
    format!("{API_PREFIX}/sinks")
}

#[must_use]
pub fn sink_path(id: &SinkId) -> String {
    format!("{API_PREFIX}/sinks/{}", encode_segment(&id.0))
}

#[must_use]
pub fn filters_path() -> String {
    format!("{API_PREFIX}/filters")
}

#[must_use]
pub fn dbscan_path() -> String {
    format!("{API_PREFIX}/dbscan")
}

#[must_use]
pub fn snapshot_path() -> String {
    format!("{API_PREFIX}/snapshot")
}

/// Config-file operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOp {
    List,
    Save,
    Load,
    Export,
    Import,
}

#[must_use]
pub fn configs_path(op: ConfigOp) -> String {
    let tail = match op {
        ConfigOp::List => "list",
        ConfigOp::Save => "save",
        ConfigOp::Load => "load",
        ConfigOp::Export => "export",
        ConfigOp::Import => "import",
    };
    format!("{API_PREFIX}/configs/{tail}")
}

/// `POST /sensors` body. The endpoint travels as `"host:port"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSensor {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub endpoint: String,
    pub mode: SensorMode,
    pub enabled: bool,
}

impl NewSensor {
    /// Normalise form input: unknown driver types become `unknown`, a blank
    /// host or zero port falls back to the factory endpoint, and a blank
    /// name is omitted.
    #[must_use]
    pub fn from_form(kind: &str, name: &str, host: &str, port: u16, mode: SensorMode, enabled: bool) -> Self {
        let kind = if SENSOR_TYPES.contains(&kind) { kind } else { "unknown" };
        let host = if host.trim().is_empty() { DEFAULT_SENSOR_HOST } else { host.trim() };
        let port = if port == 0 { DEFAULT_SENSOR_PORT } else { port };
        let name = name.trim();
        Self {
            kind: kind.to_owned(),
            name: (!name.is_empty()).then(|| name.to_owned()),
            endpoint: format!("{host}:{port}"),
            mode,
            enabled,
        }
    }
}

/// `POST /configs/save` and `/configs/load` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigName {
    pub name: String,
}

impl ConfigName {
    /// Strip a trailing `.yaml` / `.yml` (any case); blank names become `default`.
    #[must_use]
    pub fn normalized(name: &str) -> Self {
        let trimmed = name.trim();
        let lower = trimmed.to_ascii_lowercase();
        let stem = if lower.ends_with(".yaml") {
            &trimmed[..trimmed.len() - 5]
        } else if lower.ends_with(".yml") {
            &trimmed[..trimmed.len() - 4]
        } else {
            trimmed
        };
        let stem = if stem.is_empty() { "default" } else { stem };
        Self { name: stem.to_owned() }
    }
}

/// One entry of `GET /configs/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub name: String,
}

/// `GET /configs/list` arrives either as a bare array or as `{files: [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ConfigList {
    Bare(Vec<ConfigFile>),
    Wrapped {
        #[serde(default)]
        files: Vec<ConfigFile>,
    },
}

impl ConfigList {
    #[must_use]
    pub fn into_files(self) -> Vec<ConfigFile> {
        match self {
            Self::Bare(files) | Self::Wrapped { files } => files,
        }
    }
}

/// Resolve a user choice against the listed files: a 1-based number or a
/// case-insensitive name.
#[must_use]
pub fn resolve_config_choice<'a>(files: &'a [ConfigFile], choice: &str) -> Option<&'a ConfigFile> {
    let choice = choice.trim();
    if let Ok(n) = choice.parse::<usize>() {
        if (1..=files.len()).contains(&n) {
            return files.get(n - 1);
        }
    }
    files.iter().find(|file| file.name.eq_ignore_ascii_case(choice))
}

/// User-facing text for a non-2xx response: the body's `message`, else its
/// `error`, else `HTTP <status>`.
#[must_use]
pub fn error_message(status: u16, body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["message", "error"]
                .iter()
                .find_map(|key| v.get(key).and_then(serde_json::Value::as_str).filter(|s| !s.is_empty()))
        })
        .map_or_else(|| format!("HTTP {status}"), str::to_owned)
}
