//! Live-channel transport: connection lifecycle, reconnect policy, outbound
//! sends and inbound dispatch.
//!
//! SYSTEM CONTEXT
//! ==============
//! `Transport` is I/O-free. A socket driver (`net::socket` in the browser,
//! the `cli` watch loop natively) owns the actual connection and reports
//! events: `begin_connect`, `on_open`, `on_message`, `on_error`,
//! `on_close`. Outbound text goes through the unbounded channel handed over
//! in `on_open`; dropping that sender is how the transport closes a link.
//!
//! ERROR HANDLING
//! ==============
//! Malformed inbound text is logged and dropped. A failing handler is logged
//! and the remaining handlers still run. `send` returns `false` instead of
//! failing when no link is open; nothing is queued or retried.
//!
//! DESIGN
//! ======
//! Messages are processed one at a time in arrival order. Built-in dispatch
//! writes the store first, then registered handlers for the message's
//! `type` run in registration order, so handlers observe the updated store.

#[path = "transport_dispatch.rs"]
mod transport_dispatch;

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::StreamExt;
use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender};
use futures::future::{Either, select};

use store::{ConnectionState, NoticeLevel, StateValue, Store};
use wire::{ClientMessage, DbscanConfig, FilterConfig, SensorId, SensorPatch, ServerMessage, WorldMask};

use super::fps::FpsTracker;
use crate::config::ClientConfig;
use crate::util::notice;

/// Callback for one inbound message kind.
pub type Handler = dyn Fn(&ServerMessage) -> Result<(), String>;

/// What the socket driver should do after a link closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPlan {
    /// Dial again after this many milliseconds.
    After(u32),
    /// Manually disconnected; wait for `reconnect()`.
    Stop,
    /// Attempts exhausted; wait for `reconnect()`.
    GiveUp,
}

/// Retry delay for the `attempt`-th consecutive reconnect (1-based):
/// `min(base * 2^(attempt-1), cap)`.
#[must_use]
pub fn backoff_delay(attempt: u32, base_ms: u32, cap_ms: u32) -> u32 {
    let exponent = attempt.max(1) - 1;
    let factor = 1_u32.checked_shl(exponent).unwrap_or(u32::MAX);
    base_ms.saturating_mul(factor).min(cap_ms)
}

struct LinkState {
    state: ConnectionState,
    outbox: Option<UnboundedSender<String>>,
    attempts: u32,
    manual: bool,
    forced: bool,
    waker: Option<UnboundedSender<()>>,
    fps: FpsTracker,
}

/// One duplex connection at a time plus the inbound dispatch table.
pub struct Transport {
    store: Rc<Store>,
    config: ClientConfig,
    link: RefCell<LinkState>,
    handlers: RefCell<HashMap<String, Vec<Rc<Handler>>>>,
}

impl Transport {
    #[must_use]
    pub fn new(store: Rc<Store>, config: ClientConfig) -> Self {
        Self {
            store,
            config,
            link: RefCell::new(LinkState {
                state: ConnectionState::Disconnected,
                outbox: None,
                attempts: 0,
                manual: false,
                forced: false,
                waker: None,
                fps: FpsTracker::new(),
            }),
            handlers: RefCell::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Rc<Store> {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.link.borrow().state
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        let link = self.link.borrow();
        link.state == ConnectionState::Connected && link.outbox.is_some()
    }

    /// Consecutive reconnect attempts since the last successful open.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.link.borrow().attempts
    }

    /// Channel the socket driver listens on between links. `disconnect()` and
    /// `reconnect()` signal it so a backoff wait can be cut short.
    pub fn set_waker(&self, waker: UnboundedSender<()>) {
        self.link.borrow_mut().waker = Some(waker);
    }

    // --- Lifecycle ---

    /// Start dialing. Returns `false` (and does nothing) when a link is
    /// already connecting or open, or after a manual `disconnect()`.
    pub fn begin_connect(&self) -> bool {
        {
            let mut link = self.link.borrow_mut();
            if link.manual || matches!(link.state, ConnectionState::Connecting | ConnectionState::Connected) {
                return false;
            }
            link.state = ConnectionState::Connecting;
        }
        self.store.set(StateValue::ConnectionStatus(ConnectionState::Connecting));
        true
    }

    /// The link is up: reset the retry counter and ask for the three snapshots.
    ///
    /// A dial that completes after `disconnect()` is refused: the outbox is
    /// dropped at once so the driver closes the socket.
    pub fn on_open(&self, outbox: UnboundedSender<String>, now_ms: f64) {
        {
            let mut link = self.link.borrow_mut();
            if link.manual {
                drop(outbox);
                log::info!("dial completed after manual disconnect; closing");
                return;
            }
            link.state = ConnectionState::Connected;
            link.outbox = Some(outbox);
            link.attempts = 0;
            link.forced = false;
            link.fps.reset();
        }
        let mut stats = self.store.connection_stats();
        stats.connections += 1;
        self.store.update([
            StateValue::ConnectionStatus(ConnectionState::Connected),
            StateValue::ConnectionStats(stats),
            StateValue::LinkError(None),
            StateValue::LastReceive(now_ms),
        ]);
        log::info!("live channel open");

        self.request_snapshot();
        self.request_filter_config();
        self.request_dbscan_config();
    }

    /// Process one inbound text message.
    pub fn on_message(&self, text: &str, now_ms: f64) {
        self.store.set(StateValue::LastReceive(now_ms));
        let message = match wire::decode_message(text) {
            Ok(message) => message,
            Err(err) => {
                log::warn!("dropping inbound message: {err}");
                return;
            }
        };
        self.dispatch(&message, now_ms);
    }

    /// Apply a decoded message: built-in store writes, then handlers.
    pub fn dispatch(&self, message: &ServerMessage, now_ms: f64) {
        transport_dispatch::apply(self, message, now_ms);

        let handlers: Vec<Rc<Handler>> = self
            .handlers
            .borrow()
            .get(message.kind())
            .map(|list| list.iter().map(Rc::clone).collect())
            .unwrap_or_default();
        for handler in handlers {
            if let Err(err) = handler(message) {
                log::warn!("handler for {} failed: {err}", message.kind());
            }
        }
    }

    pub fn on_error(&self, detail: &str) {
        log::warn!("live channel error: {detail}");
        self.link.borrow_mut().state = ConnectionState::Error;
        let mut stats = self.store.connection_stats();
        stats.errors += 1;
        self.store.update([
            StateValue::ConnectionStatus(ConnectionState::Error),
            StateValue::ConnectionStats(stats),
            StateValue::LinkError(Some(detail.to_owned())),
        ]);
    }

    /// The link is gone. Decide whether and when to dial again.
    pub fn on_close(&self, now_ms: f64) -> ReconnectPlan {
        let (was_open, plan) = {
            let mut link = self.link.borrow_mut();
            let was_open = link.outbox.take().is_some();
            link.state = ConnectionState::Disconnected;
            let plan = if link.forced {
                link.forced = false;
                ReconnectPlan::After(self.config.reconnect_grace_ms)
            } else if link.manual {
                ReconnectPlan::Stop
            } else if link.attempts < self.config.max_reconnect_attempts {
                link.attempts += 1;
                ReconnectPlan::After(backoff_delay(
                    link.attempts,
                    self.config.reconnect_base_ms,
                    self.config.reconnect_cap_ms,
                ))
            } else {
                ReconnectPlan::GiveUp
            };
            (was_open, plan)
        };

        let mut values = vec![StateValue::ConnectionStatus(ConnectionState::Disconnected)];
        if was_open {
            let mut stats = self.store.connection_stats();
            stats.disconnections += 1;
            values.push(StateValue::ConnectionStats(stats));
        }
        self.store.update(values);

        match plan {
            ReconnectPlan::After(ms) => log::info!("live channel closed; retrying in {ms} ms"),
            ReconnectPlan::Stop => log::info!("live channel closed"),
            ReconnectPlan::GiveUp => {
                let text = format!(
                    "Connection lost. Gave up after {} attempts.",
                    self.config.max_reconnect_attempts
                );
                self.store.set(StateValue::LinkError(Some(text.clone())));
                notice::notify(&self.store, NoticeLevel::Error, text, now_ms);
            }
        }
        plan
    }

    /// Close the link and suppress retries until `reconnect()`. A pending
    /// backoff wait is cancelled; an in-flight dial is closed on open.
    pub fn disconnect(&self) {
        let mut link = self.link.borrow_mut();
        link.manual = true;
        link.forced = false;
        let closing = link.outbox.take().is_some() || link.state == ConnectionState::Connecting;
        if closing {
            link.state = ConnectionState::Closing;
            drop(link);
            self.store.set(StateValue::ConnectionStatus(ConnectionState::Closing));
        } else {
            Self::wake(&link);
        }
    }

    /// Reset the retry counter and dial again after the grace delay: an open
    /// link is closed first, a pending backoff wait is cut short.
    pub fn reconnect(&self) {
        let mut link = self.link.borrow_mut();
        link.manual = false;
        link.attempts = 0;
        if link.outbox.take().is_some() {
            link.forced = true;
        } else if matches!(link.state, ConnectionState::Disconnected | ConnectionState::Error) {
            Self::wake(&link);
        }
    }

    /// The driver was woken while waiting between links. Decide the new wait.
    pub fn on_wake(&self) -> ReconnectPlan {
        if self.link.borrow().manual {
            ReconnectPlan::Stop
        } else {
            ReconnectPlan::After(self.config.reconnect_grace_ms)
        }
    }

    /// Wait out `plan` before the next dial. `sleep(ms)` is the driver's
    /// timer; a signal on `wake` re-plans through [`Transport::on_wake`].
    /// Returns `false` once the waker channel is closed.
    pub async fn wait_to_redial<S, F>(&self, mut plan: ReconnectPlan, wake: &mut UnboundedReceiver<()>, sleep: S) -> bool
    where
        S: Fn(u32) -> F,
        F: Future<Output = ()>,
    {
        loop {
            let signal = match plan {
                ReconnectPlan::After(ms) => match select(Box::pin(sleep(ms)), wake.next()).await {
                    Either::Left(((), _)) => return true,
                    Either::Right((signal, _)) => signal,
                },
                ReconnectPlan::Stop | ReconnectPlan::GiveUp => wake.next().await,
            };
            if signal.is_none() {
                log::debug!("socket driver released");
                return false;
            }
            plan = self.on_wake();
        }
    }

    fn wake(link: &LinkState) {
        if let Some(waker) = &link.waker {
            if waker.unbounded_send(()).is_err() {
                log::warn!("no socket driver is listening");
            }
        }
    }

    // --- Outbound ---

    /// Serialize and queue one message. `false` means not delivered.
    pub fn send(&self, message: &ClientMessage) -> bool {
        let link = self.link.borrow();
        let sent = match (&link.state, &link.outbox) {
            (ConnectionState::Connected, Some(outbox)) => outbox.unbounded_send(wire::encode_message(message)).is_ok(),
            _ => false,
        };
        if !sent {
            log::debug!("not connected; dropped {}", message.kind());
        }
        sent
    }

    pub fn request_snapshot(&self) -> bool {
        self.send(&ClientMessage::RequestSnapshot)
    }

    pub fn request_filter_config(&self) -> bool {
        self.send(&ClientMessage::RequestFilterConfig)
    }

    pub fn request_dbscan_config(&self) -> bool {
        self.send(&ClientMessage::RequestDbscanConfig)
    }

    /// Send a sensor patch tagged with this client's id for echo suppression.
    pub fn update_sensor(&self, id: &SensorId, patch: SensorPatch) -> bool {
        self.send(&ClientMessage::SensorUpdate {
            id: id.clone(),
            patch,
            client_id: Some(self.store.client_id().to_owned()),
        })
    }

    pub fn enable_sensor(&self, id: &SensorId, enabled: bool) -> bool {
        self.send(&ClientMessage::SensorEnable { id: id.clone(), enabled })
    }

    pub fn update_filter(&self, config: FilterConfig) -> bool {
        self.send(&ClientMessage::FilterUpdate { config })
    }

    pub fn update_dbscan(&self, config: DbscanConfig) -> bool {
        self.send(&ClientMessage::DbscanUpdate { config })
    }

    pub fn update_world(&self, mask: WorldMask) -> bool {
        self.send(&ClientMessage::world_update(mask))
    }

    // --- Handlers ---

    /// Add a handler for one message `type`. Handlers for the same type run
    /// in registration order.
    pub fn register_handler(&self, kind: &str, handler: Rc<Handler>) {
        self.handlers.borrow_mut().entry(kind.to_owned()).or_default().push(handler);
    }

    /// Remove a handler previously registered under `kind`. Returns whether
    /// it was found.
    pub fn unregister_handler(&self, kind: &str, handler: &Rc<Handler>) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let Some(list) = handlers.get_mut(kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|h| !Rc::ptr_eq(h, handler));
        before != list.len()
    }

    #[must_use]
    pub fn handler_count(&self, kind: &str) -> usize {
        self.handlers.borrow().get(kind).map_or(0, Vec::len)
    }

    fn record_frame(&self, now_ms: f64) -> f64 {
        self.link.borrow_mut().fps.record(now_ms)
    }
}
