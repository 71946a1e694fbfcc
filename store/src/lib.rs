//! Reactive state container shared by the transport, the canvas engine and
//! the feature panels.
//!
//! SYSTEM CONTEXT
//! ==============
//! The browser client runs on one thread. A single `Rc<Store>` is created at
//! boot and handed to every component; nothing reaches state any other way.
//! Writes are synchronous and notify subscribers of the written key before
//! returning.
//!
//! ERROR HANDLING
//! ==============
//! Subscribers return `Result<(), String>`. A failing subscriber is logged
//! and the remaining subscribers of that key still run.
//!
//! DESIGN
//! ======
//! Callbacks are invoked with no internal borrow held, so a subscriber may
//! freely read, write or subscribe from inside its callback.

pub mod state;

#[cfg(test)]
#[path = "lib_test.rs"]
mod lib_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

pub use state::{
    ConnectionState, ConnectionStats, FrameInfo, Notice, NoticeLevel, Panel, PanelMessage, RoiEditMode, STALE_ERROR_MS,
    STALE_WARN_MS, Selection, SensorMap, Staleness, StateKey, StateValue, Viewport,
};

use wire::{ClusterItem, DbscanConfig, FilterConfig, PointSet, Sensor, SensorId, Sink, WorldMask};

/// Subscriber callback: `(new, old, key)`.
pub type Callback = dyn Fn(&StateValue, &StateValue, StateKey) -> Result<(), String>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    by_key: HashMap<StateKey, Vec<(u64, Rc<Callback>)>>,
}

/// Disposer returned by [`Store::subscribe`].
///
/// Dropping it unsubscribes. Call [`Subscription::forget`] to keep the
/// callback registered for the life of the store.
#[must_use = "dropping a Subscription unsubscribes it immediately"]
pub struct Subscription {
    registry: Weak<RefCell<Registry>>,
    key: StateKey,
    id: u64,
    armed: bool,
}

impl Subscription {
    pub fn unsubscribe(self) {}

    pub fn forget(mut self) {
        self.armed = false;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.borrow_mut();
        if let Some(list) = registry.by_key.get_mut(&self.key) {
            list.retain(|(id, _)| *id != self.id);
            if list.is_empty() {
                registry.by_key.remove(&self.key);
            }
        }
    }
}

macro_rules! typed_get {
    ($($(#[$meta:meta])* $name:ident => $variant:ident : $ty:ty;)*) => {
        $(
            $(#[$meta])*
            #[must_use]
            pub fn $name(&self) -> $ty {
                match self.get(StateKey::$variant) {
                    StateValue::$variant(value) => value,
                    _ => <$ty>::default(),
                }
            }
        )*
    };
}

/// Process-wide client state.
pub struct Store {
    client_id: String,
    values: RefCell<HashMap<StateKey, StateValue>>,
    registry: Rc<RefCell<Registry>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Fresh store with a random `client_<uuid>` id and default values.
    #[must_use]
    pub fn new() -> Self {
        Self::with_client_id(format!("client_{}", uuid::Uuid::new_v4().simple()))
    }

    #[must_use]
    pub fn with_client_id(client_id: impl Into<String>) -> Self {
        let values = StateKey::ALL
            .iter()
            .map(|key| (*key, StateValue::default_for(*key)))
            .collect();
        Self {
            client_id: client_id.into(),
            values: RefCell::new(values),
            registry: Rc::new(RefCell::new(Registry::default())),
        }
    }

    /// Id attached to this client's own updates for echo suppression.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    // --- Generic access ---

    #[must_use]
    pub fn get(&self, key: StateKey) -> StateValue {
        self.values
            .borrow()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| StateValue::default_for(key))
    }

    /// Replace one value and notify its subscribers.
    pub fn set(&self, value: StateValue) {
        self.write(value, true);
    }

    /// Replace one value without notifying.
    pub fn set_silent(&self, value: StateValue) {
        self.write(value, false);
    }

    /// Apply several writes, then notify each affected key once.
    ///
    /// Subscribers observe the complete batch. A key written twice in one
    /// batch notifies once with the last value and the pre-batch old value.
    pub fn update(&self, values: impl IntoIterator<Item = StateValue>) {
        let changed = self.write_batch(values);
        for (key, old) in changed {
            let new = self.get(key);
            self.notify(key, &new, &old);
        }
    }

    /// Apply several writes without notifying.
    pub fn update_silent(&self, values: impl IntoIterator<Item = StateValue>) {
        self.write_batch(values);
    }

    /// Register a callback for one key.
    ///
    /// Subscribing is legal for any key at any time; the callback fires on
    /// the next write.
    pub fn subscribe(
        &self,
        key: StateKey,
        callback: impl Fn(&StateValue, &StateValue, StateKey) -> Result<(), String> + 'static,
    ) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.by_key.entry(key).or_default().push((id, Rc::new(callback)));
        Subscription { registry: Rc::downgrade(&self.registry), key, id, armed: true }
    }

    /// Number of live subscribers for a key.
    #[must_use]
    pub fn subscriber_count(&self, key: StateKey) -> usize {
        self.registry.borrow().by_key.get(&key).map_or(0, Vec::len)
    }

    fn write(&self, value: StateValue, notify: bool) {
        let key = value.key();
        let old = self
            .values
            .borrow_mut()
            .insert(key, value.clone())
            .unwrap_or_else(|| StateValue::default_for(key));
        if notify {
            self.notify(key, &value, &old);
        }
    }

    fn write_batch(&self, values: impl IntoIterator<Item = StateValue>) -> Vec<(StateKey, StateValue)> {
        let mut changed: Vec<(StateKey, StateValue)> = Vec::new();
        let mut map = self.values.borrow_mut();
        for value in values {
            let key = value.key();
            let old = map.insert(key, value).unwrap_or_else(|| StateValue::default_for(key));
            if !changed.iter().any(|(k, _)| *k == key) {
                changed.push((key, old));
            }
        }
        changed
    }

    fn notify(&self, key: StateKey, new: &StateValue, old: &StateValue) {
        let callbacks: Vec<Rc<Callback>> = self
            .registry
            .borrow()
            .by_key
            .get(&key)
            .map(|list| list.iter().map(|(_, cb)| Rc::clone(cb)).collect())
            .unwrap_or_default();
        for callback in callbacks {
            if let Err(error) = callback(new, old, key) {
                log::warn!("subscriber for {key:?} failed: {error}");
            }
        }
    }

    // --- Typed reads ---

    typed_get! {
        connection_status => ConnectionStatus: ConnectionState;
        connection_stats => ConnectionStats: ConnectionStats;
        link_error => LinkError: Option<String>;
        last_receive => LastReceive: f64;
        frame => Frame: FrameInfo;
        fps => Fps: f64;
        raw_points => RawPoints: Rc<PointSet>;
        filtered_points => FilteredPoints: Rc<PointSet>;
        cluster_items => ClusterItems: Rc<Vec<ClusterItem>>;
        /// Current sensor map snapshot.
        sensors => Sensors: Rc<SensorMap>;
        sinks => Sinks: Rc<Vec<Sink>>;
        world_mask => WorldMask: WorldMask;
        filter_config => FilterConfig: FilterConfig;
        dbscan_config => DbscanConfig: DbscanConfig;
        viewport => Viewport: Viewport;
        selection => Selection: Selection;
        roi_edit_mode => RoiEditMode: RoiEditMode;
        roi_points => RoiPoints: Vec<[f32; 2]>;
        show_raw => ShowRaw: bool;
        show_filtered => ShowFiltered: bool;
        per_sensor_color => PerSensorColor: bool;
        performance_mode => PerformanceMode: bool;
        max_points_to_render => MaxPointsToRender: usize;
        target_fps => TargetFps: u32;
        notice => Notice: Option<Notice>;
        panel_message => PanelMessage: Option<PanelMessage>;
    }

    /// Sequence number of the most recent frame.
    #[must_use]
    pub fn last_seq(&self) -> u64 {
        self.frame().seq
    }

    // --- Sensors ---
    //
    // Sensors are immutable values. Every mutation builds a new map and
    // writes it under `Sensors`, so subscribers always see a fresh value.

    #[must_use]
    pub fn get_sensor(&self, id: &SensorId) -> Option<Sensor> {
        self.sensors().get(id).cloned()
    }

    /// Insert or replace a sensor.
    pub fn set_sensor(&self, sensor: Sensor) {
        self.mutate_sensors(|map| {
            map.insert(sensor.id.clone(), sensor);
        });
    }

    /// Replace a sensor with `edit(current)`. Returns `false` if absent.
    pub fn update_sensor(&self, id: &SensorId, edit: impl FnOnce(&Sensor) -> Sensor) -> bool {
        let Some(current) = self.get_sensor(id) else {
            return false;
        };
        self.set_sensor(edit(&current));
        true
    }

    pub fn remove_sensor(&self, id: &SensorId) -> Option<Sensor> {
        if !self.sensors().contains_key(id) {
            return None;
        }
        self.mutate_sensors(|map| map.remove(id))
    }

    pub fn clear_sensors(&self) {
        self.mutate_sensors(SensorMap::clear);
    }

    /// Replace the whole map in one notification.
    pub fn replace_sensors(&self, sensors: impl IntoIterator<Item = Sensor>) {
        let map: SensorMap = sensors.into_iter().map(|s| (s.id.clone(), s)).collect();
        self.set(StateValue::Sensors(Rc::new(map)));
    }

    fn mutate_sensors<R>(&self, edit: impl FnOnce(&mut SensorMap) -> R) -> R {
        let mut next = (*self.sensors()).clone();
        let out = edit(&mut next);
        self.set(StateValue::Sensors(Rc::new(next)));
        out
    }
}
