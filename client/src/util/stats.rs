//! Status-bar text derived from the store.

#[cfg(test)]
#[path = "stats_test.rs"]
mod stats_test;

use store::{ConnectionState, Staleness, Store};

/// Text for each status-bar field plus the age highlight class.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub connection: String,
    pub frame: String,
    pub age: String,
    pub age_class: &'static str,
    pub fps: String,
    pub counters: String,
}

#[must_use]
pub fn connection_label(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Connecting => "connecting...",
        ConnectionState::Closing => "closing...",
        other => other.as_str(),
    }
}

#[must_use]
pub fn age_class(staleness: Staleness) -> &'static str {
    match staleness {
        Staleness::Fresh => "",
        Staleness::Warn => "warn",
        Staleness::Stale => "error",
    }
}

/// Build the status line as of `now_ms`.
#[must_use]
pub fn status_line(store: &Store, now_ms: f64) -> StatusLine {
    let frame = store.frame();
    let (age, class) = if frame.received_at > 0.0 {
        (format!("age={:.1}s", frame.age_ms(now_ms) / 1000.0), age_class(frame.staleness(now_ms)))
    } else {
        (String::from("age=--"), "")
    };
    let stats = store.connection_stats();
    StatusLine {
        connection: connection_label(store.connection_status()).to_owned(),
        frame: format!(
            "seq={} clusters={} points={}",
            frame.seq,
            store.cluster_items().len(),
            store.raw_points().len()
        ),
        age,
        age_class: class,
        fps: format!("fps={:.0}", store.fps()),
        counters: format!(
            "conn={} disc={} err={}",
            stats.connections, stats.disconnections, stats.errors
        ),
    }
}
