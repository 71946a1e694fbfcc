//! Client tunables: endpoints, reconnect policy, debounce and message lifetimes.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

// ── Endpoints ──────────────────────────────────────────────────

pub const DEFAULT_LIVE_PATH: &str = "/ws/live";
pub const DEFAULT_API_BASE: &str = wire::rest::API_PREFIX;

// ── Reconnect ──────────────────────────────────────────────────

pub const DEFAULT_RECONNECT_BASE_MS: u32 = 1000;
pub const DEFAULT_RECONNECT_CAP_MS: u32 = 30_000;
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 10;
/// Pause between a manual `reconnect()` and the fresh dial.
pub const DEFAULT_RECONNECT_GRACE_MS: u32 = 100;

// ── REST ───────────────────────────────────────────────────────

pub const DEFAULT_REQUEST_TIMEOUT_MS: u32 = 10_000;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

// ── Debounce ───────────────────────────────────────────────────

pub const DEFAULT_POSE_DEBOUNCE_MS: u32 = 300;
pub const DEFAULT_FORM_DEBOUNCE_MS: u32 = 500;

// ── Feedback ───────────────────────────────────────────────────

pub const DEFAULT_NOTICE_MS: f64 = 2500.0;
pub const DEFAULT_PANEL_MESSAGE_MS: f64 = 2000.0;
pub const DEFAULT_STATS_REFRESH_MS: u32 = 1000;

/// Runtime configuration for one page session.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub live_path: String,
    pub api_base: String,
    pub reconnect_base_ms: u32,
    pub reconnect_cap_ms: u32,
    pub max_reconnect_attempts: u32,
    pub reconnect_grace_ms: u32,
    pub request_timeout_ms: u32,
    pub retry_attempts: u32,
    pub pose_debounce_ms: u32,
    pub form_debounce_ms: u32,
    pub notice_ms: f64,
    pub panel_message_ms: f64,
    pub stats_refresh_ms: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            live_path: DEFAULT_LIVE_PATH.to_owned(),
            api_base: DEFAULT_API_BASE.to_owned(),
            reconnect_base_ms: DEFAULT_RECONNECT_BASE_MS,
            reconnect_cap_ms: DEFAULT_RECONNECT_CAP_MS,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_grace_ms: DEFAULT_RECONNECT_GRACE_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            pose_debounce_ms: DEFAULT_POSE_DEBOUNCE_MS,
            form_debounce_ms: DEFAULT_FORM_DEBOUNCE_MS,
            notice_ms: DEFAULT_NOTICE_MS,
            panel_message_ms: DEFAULT_PANEL_MESSAGE_MS,
            stats_refresh_ms: DEFAULT_STATS_REFRESH_MS,
        }
    }
}

impl ClientConfig {
    /// Live-channel URL for a page served from `protocol` (`"https:"`) and
    /// `host` (`"hub.local:8080"`).
    #[must_use]
    pub fn live_url(&self, protocol: &str, host: &str) -> String {
        let scheme = if protocol.starts_with("https") { "wss" } else { "ws" };
        format!("{scheme}://{host}{}", self.live_path)
    }
}
