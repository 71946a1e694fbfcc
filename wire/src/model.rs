//! Sensor, point-cloud and region-of-interest records.
//!
//! Inbound payloads are tolerant: sensor ids may arrive as strings or
//! integers, endpoints as `"host:port"` or `{host, port}`, and mask bounds
//! under several legacy field names. Everything is normalised here so the
//! rest of the client only ever sees one shape.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;

// =============================================================================
// SENSOR IDENTITY
// =============================================================================

/// Server-assigned configuration id of a sensor.
///
/// This is the only sensor identity the client uses. Slot position inside a
/// snapshot is a rendering detail.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SensorId(String);

impl SensorId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SensorId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SensorId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Serialize for SensorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Text(String),
    Int(i64),
}

impl<'de> Deserialize<'de> for SensorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match IdRepr::deserialize(deserializer)? {
            IdRepr::Text(text) => Self(text),
            IdRepr::Int(n) => Self(n.to_string()),
        })
    }
}

// =============================================================================
// POSE / ENDPOINT / MODE / MASK
// =============================================================================

/// Sensor mounting pose in world meters and degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pose {
    pub tx: f32,
    pub ty: f32,
    pub theta_deg: f32,
}

impl Pose {
    #[must_use]
    pub fn translated(self, dx: f32, dy: f32) -> Self {
        Self { tx: self.tx + dx, ty: self.ty + dy, ..self }
    }

    #[must_use]
    pub fn rotated(self, delta_deg: f32) -> Self {
        Self { theta_deg: self.theta_deg + delta_deg, ..self }
    }
}

/// Network endpoint of a sensor head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Parse `"host:port"`. A missing or unparsable port becomes `0`.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match text.split_once(':') {
            Some((host, port)) => Self {
                host: host.to_owned(),
                port: port.trim().parse().unwrap_or(0),
            },
            None => Self { host: text.to_owned(), port: 0 },
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EndpointRepr {
    Text(String),
    Pair {
        #[serde(default)]
        host: String,
        #[serde(default)]
        port: u16,
    },
}

impl<'de> Deserialize<'de> for Endpoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match EndpointRepr::deserialize(deserializer)? {
            EndpointRepr::Text(text) => Self::parse(&text),
            EndpointRepr::Pair { host, port } => Self { host, port },
        })
    }
}

/// Scan mode of a Hokuyo head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SensorMode {
    /// Distance and intensity.
    #[default]
    ME,
    /// Distance only.
    MD,
}

impl SensorMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ME => "ME",
            Self::MD => "MD",
        }
    }

    /// Parse a form value; anything unrecognised falls back to `ME`.
    #[must_use]
    pub fn parse_lenient(text: &str) -> Self {
        if text.trim().eq_ignore_ascii_case("MD") { Self::MD } else { Self::ME }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AngleMask {
    #[serde(default, alias = "min")]
    pub min_deg: f32,
    #[serde(default, alias = "max")]
    pub max_deg: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RangeMask {
    #[serde(default, alias = "min_m", alias = "min")]
    pub near_m: f32,
    #[serde(default, alias = "max_m", alias = "max")]
    pub far_m: f32,
}

/// Optional angular and range limits applied on the sensor head.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorMask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<AngleMask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeMask>,
}

// =============================================================================
// SENSOR
// =============================================================================

fn default_enabled() -> bool {
    true
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolRepr {
        Bool(bool),
        Int(i64),
    }
    Ok(Option::<BoolRepr>::deserialize(deserializer)?.map(|repr| match repr {
        BoolRepr::Bool(b) => b,
        BoolRepr::Int(n) => n != 0,
    }))
}

fn skip_step_at_least_one<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(Option::<u32>::deserialize(deserializer)?.map(|step| step.max(1)))
}

/// One configured sensor head, as the hub reports it.
///
/// Treated as an immutable value: edits build a new `Sensor` and replace the
/// stored entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: SensorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<u32>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub pose: Pose,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Endpoint>,
    #[serde(default)]
    pub mode: SensorMode,
    #[serde(default, deserialize_with = "lenient_bool", skip_serializing_if = "Option::is_none")]
    pub ignore_checksum_error: Option<bool>,
    #[serde(default, deserialize_with = "skip_step_at_least_one", skip_serializing_if = "Option::is_none")]
    pub skip_step: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<SensorMask>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Sensor {
    #[must_use]
    pub fn new(id: impl Into<SensorId>) -> Self {
        Self {
            id: id.into(),
            slot: None,
            enabled: true,
            pose: Pose::default(),
            endpoint: None,
            mode: SensorMode::ME,
            ignore_checksum_error: None,
            skip_step: None,
            mask: None,
            kind: None,
            name: None,
        }
    }

    #[must_use]
    pub fn with_pose(&self, pose: Pose) -> Self {
        Self { pose, ..self.clone() }
    }

    #[must_use]
    pub fn with_enabled(&self, enabled: bool) -> Self {
        Self { enabled, ..self.clone() }
    }

    /// Text drawn next to the sensor glyph.
    #[must_use]
    pub fn label(&self) -> String {
        if !self.id.is_empty() {
            return self.id.to_string();
        }
        format!("slot{}", self.slot.unwrap_or(0))
    }
}

/// Partial sensor update carried by `sensor.update` and REST `PATCH`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose: Option<Pose>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Endpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<SensorMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_checksum_error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_step: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<SensorMask>,
}

impl SensorPatch {
    #[must_use]
    pub fn pose(pose: Pose) -> Self {
        Self { pose: Some(pose), ..Self::default() }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch to a sensor value, producing the updated value.
    #[must_use]
    pub fn apply(&self, sensor: &Sensor) -> Sensor {
        let mut next = sensor.clone();
        if let Some(pose) = self.pose {
            next.pose = pose;
        }
        if let Some(enabled) = self.enabled {
            next.enabled = enabled;
        }
        if let Some(endpoint) = &self.endpoint {
            next.endpoint = Some(endpoint.clone());
        }
        if let Some(mode) = self.mode {
            next.mode = mode;
        }
        if let Some(flag) = self.ignore_checksum_error {
            next.ignore_checksum_error = Some(flag);
        }
        if let Some(step) = self.skip_step {
            next.skip_step = Some(step.max(1));
        }
        if let Some(mask) = self.mask {
            next.mask = Some(mask);
        }
        next
    }
}

// =============================================================================
// POINTS / CLUSTERS
// =============================================================================

/// Flat point cloud with an optional parallel sensor tag per point.
///
/// `sid` is either empty (tag unknown) or exactly one tag per `(x, y)` pair.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointSet {
    #[serde(default)]
    pub xy: Vec<f32>,
    #[serde(default)]
    pub sid: Vec<i32>,
}

impl PointSet {
    /// Build a point set, dropping a dangling odd coordinate and any tag
    /// list whose length does not match the point count.
    #[must_use]
    pub fn new(mut xy: Vec<f32>, mut sid: Vec<i32>) -> Self {
        if xy.len() % 2 == 1 {
            xy.pop();
        }
        if !sid.is_empty() && sid.len() != xy.len() / 2 {
            sid.clear();
        }
        Self { xy, sid }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.xy.len() / 2
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.xy.len() < 2
    }

    #[must_use]
    pub fn point(&self, index: usize) -> (f32, f32) {
        (self.xy[index * 2], self.xy[index * 2 + 1])
    }

    /// Sensor tag of a point; `0` when tags are unknown.
    #[must_use]
    pub fn tag(&self, index: usize) -> i32 {
        self.sid.get(index).copied().unwrap_or(0)
    }

    /// Iterate `(x, y, tag)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (f32, f32, i32)> + '_ {
        self.xy
            .chunks_exact(2)
            .enumerate()
            .map(|(i, pair)| (pair[0], pair[1], self.tag(i)))
    }

    /// Copy the points selected by `keep`, preserving tags when present.
    #[must_use]
    pub fn filtered(&self, mut keep: impl FnMut(usize, f32, f32) -> bool) -> Self {
        let tagged = !self.sid.is_empty();
        let mut xy = Vec::new();
        let mut sid = Vec::new();
        for (i, pair) in self.xy.chunks_exact(2).enumerate() {
            if keep(i, pair[0], pair[1]) {
                xy.extend_from_slice(pair);
                if tagged {
                    sid.push(self.sid[i]);
                }
            }
        }
        Self { xy, sid }
    }
}

/// One server-computed cluster: centre plus axis-aligned bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterItem {
    pub cx: f32,
    pub cy: f32,
    pub minx: f32,
    pub miny: f32,
    pub maxx: f32,
    pub maxy: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_mask: Option<u32>,
}

impl ClusterItem {
    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        (self.cx, self.cy)
    }

    /// `(min_x, min_y, max_x, max_y)`.
    #[must_use]
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        (self.minx, self.miny, self.maxx, self.maxy)
    }
}

// =============================================================================
// WORLD MASK
// =============================================================================

/// Whether a polygon admits or rejects points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoiKind {
    Include,
    Exclude,
}

impl RoiKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Include => "include",
            Self::Exclude => "exclude",
        }
    }
}

/// Closed polygon in world meters. The closing edge is implicit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon(pub Vec<[f32; 2]>);

impl Polygon {
    /// Minimum vertex count of a persistable polygon.
    pub const MIN_VERTICES: usize = 3;

    #[must_use]
    pub fn vertices(&self) -> &[[f32; 2]] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.0.len() >= Self::MIN_VERTICES
    }
}

/// Include and exclude regions, serialized as `{includes, excludes}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldMask {
    #[serde(rename = "includes", default)]
    pub include: Vec<Polygon>,
    #[serde(rename = "excludes", default)]
    pub exclude: Vec<Polygon>,
}

impl WorldMask {
    #[must_use]
    pub fn polygons(&self, kind: RoiKind) -> &[Polygon] {
        match kind {
            RoiKind::Include => &self.include,
            RoiKind::Exclude => &self.exclude,
        }
    }

    pub fn polygons_mut(&mut self, kind: RoiKind) -> &mut Vec<Polygon> {
        match kind {
            RoiKind::Include => &mut self.include,
            RoiKind::Exclude => &mut self.exclude,
        }
    }

    #[must_use]
    pub fn polygon(&self, kind: RoiKind, index: usize) -> Option<&Polygon> {
        self.polygons(kind).get(index)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Drop polygons that cannot enclose an area. Returns how many were removed.
    pub fn retain_valid(&mut self) -> usize {
        let before = self.include.len() + self.exclude.len();
        self.include.retain(Polygon::is_valid);
        self.exclude.retain(Polygon::is_valid);
        before - self.include.len() - self.exclude.len()
    }
}
