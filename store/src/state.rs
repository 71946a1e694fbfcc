//! Typed keys and values held by the [`Store`](crate::Store).
//!
//! DESIGN
//! ======
//! Each key has exactly one value variant. Large collections (point sets,
//! clusters, the sensor map) are behind `Rc` so reads are cheap clones and a
//! reader keeps a stable snapshot even if a newer frame replaces the entry.

use std::collections::BTreeMap;
use std::rc::Rc;

use wire::{ClusterItem, DbscanConfig, FilterConfig, PointSet, RoiKind, Sensor, SensorId, Sink, WorldMask};

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

/// Sensors keyed by configuration id.
pub type SensorMap = BTreeMap<SensorId, Sensor>;

// =============================================================================
// CONNECTION
// =============================================================================

/// Lifecycle of the live channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Closing,
    #[default]
    Disconnected,
    Error,
}

impl ConnectionState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closing => "closing",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
        }
    }
}

/// Running counters for the stats panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionStats {
    pub connections: u32,
    pub disconnections: u32,
    pub errors: u32,
}

// =============================================================================
// FRAME
// =============================================================================

/// Age above which the stats display warns.
pub const STALE_WARN_MS: f64 = 1000.0;
/// Age above which the stats display reports an error.
pub const STALE_ERROR_MS: f64 = 3000.0;

/// Freshness class of the most recent frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    Fresh,
    Warn,
    Stale,
}

/// Metadata of the most recent point or cluster frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInfo {
    pub seq: u64,
    /// Hub clock, nanoseconds.
    pub source_ts: i64,
    /// Local clock, milliseconds.
    pub received_at: f64,
}

impl FrameInfo {
    #[must_use]
    pub fn age_ms(&self, now_ms: f64) -> f64 {
        (now_ms - self.received_at).max(0.0)
    }

    #[must_use]
    pub fn staleness(&self, now_ms: f64) -> Staleness {
        let age = self.age_ms(now_ms);
        if age > STALE_ERROR_MS {
            Staleness::Stale
        } else if age > STALE_WARN_MS {
            Staleness::Warn
        } else {
            Staleness::Fresh
        }
    }
}

// =============================================================================
// VIEW
// =============================================================================

/// Pan offset in screen pixels and zoom in pixels per meter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub pan_x: f64,
    pub pan_y: f64,
    pub scale: f64,
}

impl Viewport {
    pub const MIN_SCALE: f64 = 10.0;
    pub const MAX_SCALE: f64 = 200.0;
    pub const DEFAULT_SCALE: f64 = 120.0;
    pub const RESET_SCALE: f64 = 60.0;

    /// Viewport restored by double-click.
    #[must_use]
    pub fn reset() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, scale: Self::RESET_SCALE }
    }

    #[must_use]
    pub fn clamp_scale(scale: f64) -> f64 {
        scale.clamp(Self::MIN_SCALE, Self::MAX_SCALE)
    }

    #[must_use]
    pub fn panned(self, dx: f64, dy: f64) -> Self {
        Self { pan_x: self.pan_x + dx, pan_y: self.pan_y + dy, ..self }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, scale: Self::DEFAULT_SCALE }
    }
}

/// What the pointer and the Delete/Insert keys act on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Sensor(SensorId),
    Roi { kind: RoiKind, index: usize },
    Vertex { kind: RoiKind, roi: usize, vertex: usize },
}

impl Selection {
    /// The polygon addressed by a ROI or vertex selection.
    #[must_use]
    pub fn roi(&self) -> Option<(RoiKind, usize)> {
        match self {
            Self::Roi { kind, index } => Some((*kind, *index)),
            Self::Vertex { kind, roi, .. } => Some((*kind, *roi)),
            Self::None | Self::Sensor(_) => None,
        }
    }

    #[must_use]
    pub fn sensor(&self) -> Option<&SensorId> {
        match self {
            Self::Sensor(id) => Some(id),
            _ => None,
        }
    }
}

/// Polygon-creation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoiEditMode {
    #[default]
    None,
    Create(RoiKind),
}

// =============================================================================
// FEEDBACK
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient toast.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    pub expires_at: f64,
}

/// Which side panel an inline message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Sensors,
    Filters,
    Dbscan,
    Sinks,
    Configs,
    Roi,
}

/// Inline panel message.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelMessage {
    pub panel: Panel,
    pub text: String,
    pub is_error: bool,
    pub expires_at: f64,
}

// =============================================================================
// KEYS / VALUES
// =============================================================================

/// Every observable slot of client state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    ConnectionStatus,
    ConnectionStats,
    LinkError,
    LastReceive,
    Frame,
    Fps,
    RawPoints,
    FilteredPoints,
    ClusterItems,
    Sensors,
    Sinks,
    WorldMask,
    FilterConfig,
    DbscanConfig,
    Viewport,
    Selection,
    RoiEditMode,
    RoiPoints,
    ShowRaw,
    ShowFiltered,
    PerSensorColor,
    PerformanceMode,
    MaxPointsToRender,
    TargetFps,
    Notice,
    PanelMessage,
}

impl StateKey {
    pub const ALL: [StateKey; 26] = [
        Self::ConnectionStatus,
        Self::ConnectionStats,
        Self::LinkError,
        Self::LastReceive,
        Self::Frame,
        Self::Fps,
        Self::RawPoints,
        Self::FilteredPoints,
        Self::ClusterItems,
        Self::Sensors,
        Self::Sinks,
        Self::WorldMask,
        Self::FilterConfig,
        Self::DbscanConfig,
        Self::Viewport,
        Self::Selection,
        Self::RoiEditMode,
        Self::RoiPoints,
        Self::ShowRaw,
        Self::ShowFiltered,
        Self::PerSensorColor,
        Self::PerformanceMode,
        Self::MaxPointsToRender,
        Self::TargetFps,
        Self::Notice,
        Self::PanelMessage,
    ];
}

/// A value for one [`StateKey`].
#[derive(Debug, Clone, PartialEq)]
pub enum StateValue {
    ConnectionStatus(ConnectionState),
    ConnectionStats(ConnectionStats),
    LinkError(Option<String>),
    LastReceive(f64),
    Frame(FrameInfo),
    Fps(f64),
    RawPoints(Rc<PointSet>),
    FilteredPoints(Rc<PointSet>),
    ClusterItems(Rc<Vec<ClusterItem>>),
    Sensors(Rc<SensorMap>),
    Sinks(Rc<Vec<Sink>>),
    WorldMask(WorldMask),
    FilterConfig(FilterConfig),
    DbscanConfig(DbscanConfig),
    Viewport(Viewport),
    Selection(Selection),
    RoiEditMode(RoiEditMode),
    RoiPoints(Vec<[f32; 2]>),
    ShowRaw(bool),
    ShowFiltered(bool),
    PerSensorColor(bool),
    PerformanceMode(bool),
    MaxPointsToRender(usize),
    TargetFps(u32),
    Notice(Option<Notice>),
    PanelMessage(Option<PanelMessage>),
}

impl StateValue {
    /// The key this value belongs under.
    #[must_use]
    pub fn key(&self) -> StateKey {
        match self {
            Self::ConnectionStatus(_) => StateKey::ConnectionStatus,
            Self::ConnectionStats(_) => StateKey::ConnectionStats,
            Self::LinkError(_) => StateKey::LinkError,
            Self::LastReceive(_) => StateKey::LastReceive,
            Self::Frame(_) => StateKey::Frame,
            Self::Fps(_) => StateKey::Fps,
            Self::RawPoints(_) => StateKey::RawPoints,
            Self::FilteredPoints(_) => StateKey::FilteredPoints,
            Self::ClusterItems(_) => StateKey::ClusterItems,
            Self::Sensors(_) => StateKey::Sensors,
            Self::Sinks(_) => StateKey::Sinks,
            Self::WorldMask(_) => StateKey::WorldMask,
            Self::FilterConfig(_) => StateKey::FilterConfig,
            Self::DbscanConfig(_) => StateKey::DbscanConfig,
            Self::Viewport(_) => StateKey::Viewport,
            Self::Selection(_) => StateKey::Selection,
            Self::RoiEditMode(_) => StateKey::RoiEditMode,
            Self::RoiPoints(_) => StateKey::RoiPoints,
            Self::ShowRaw(_) => StateKey::ShowRaw,
            Self::ShowFiltered(_) => StateKey::ShowFiltered,
            Self::PerSensorColor(_) => StateKey::PerSensorColor,
            Self::PerformanceMode(_) => StateKey::PerformanceMode,
            Self::MaxPointsToRender(_) => StateKey::MaxPointsToRender,
            Self::TargetFps(_) => StateKey::TargetFps,
            Self::Notice(_) => StateKey::Notice,
            Self::PanelMessage(_) => StateKey::PanelMessage,
        }
    }

    /// Initial value of a key.
    #[must_use]
    pub fn default_for(key: StateKey) -> Self {
        match key {
            StateKey::ConnectionStatus => Self::ConnectionStatus(ConnectionState::Disconnected),
            StateKey::ConnectionStats => Self::ConnectionStats(ConnectionStats::default()),
            StateKey::LinkError => Self::LinkError(None),
            StateKey::LastReceive => Self::LastReceive(0.0),
            StateKey::Frame => Self::Frame(FrameInfo::default()),
            StateKey::Fps => Self::Fps(0.0),
            StateKey::RawPoints => Self::RawPoints(Rc::default()),
            StateKey::FilteredPoints => Self::FilteredPoints(Rc::default()),
            StateKey::ClusterItems => Self::ClusterItems(Rc::default()),
            StateKey::Sensors => Self::Sensors(Rc::default()),
            StateKey::Sinks => Self::Sinks(Rc::default()),
            StateKey::WorldMask => Self::WorldMask(WorldMask::default()),
            StateKey::FilterConfig => Self::FilterConfig(FilterConfig::default()),
            StateKey::DbscanConfig => Self::DbscanConfig(DbscanConfig::default()),
            StateKey::Viewport => Self::Viewport(Viewport::default()),
            StateKey::Selection => Self::Selection(Selection::None),
            StateKey::RoiEditMode => Self::RoiEditMode(RoiEditMode::None),
            StateKey::RoiPoints => Self::RoiPoints(Vec::new()),
            StateKey::ShowRaw => Self::ShowRaw(true),
            StateKey::ShowFiltered => Self::ShowFiltered(true),
            StateKey::PerSensorColor => Self::PerSensorColor(false),
            StateKey::PerformanceMode => Self::PerformanceMode(false),
            StateKey::MaxPointsToRender => Self::MaxPointsToRender(10_000),
            StateKey::TargetFps => Self::TargetFps(60),
            StateKey::Notice => Self::Notice(None),
            StateKey::PanelMessage => Self::PanelMessage(None),
        }
    }
}
