//! Event timeline: named monotonic timestamps for one measured build.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::clock;

/// Fixed timeline keys, always present in the serialized event map.
pub const BOOTSTRAP_TIME: &str = "bootstrapTime";
pub const INSTANCE_TIME: &str = "instanceTime";
pub const START: &str = "start";
pub const STOP: &str = "stop";

/// Ordered record of named timestamps relative to process start.
///
/// `bootstrap_time` and `instance_time` are captured at construction;
/// `start` and `stop` stay zero until written. Named points live in an
/// explicit map so the serialization contract stays closed: four fixed
/// keys plus whatever the caller inserted, flattened to name -> millis.
///
/// The timeline records values only. Sequencing rules (start before stop,
/// stop before flush) are enforced by the owning session.
#[derive(Debug, Clone)]
pub struct EventTimeline {
    bootstrap_time: f64,
    instance_time: f64,
    start: f64,
    stop: f64,
    points: BTreeMap<String, f64>,
}

impl EventTimeline {
    pub fn new() -> Self {
        Self {
            bootstrap_time: clock::mark_bootstrap(),
            instance_time: clock::monotonic_millis(),
            start: 0.0,
            stop: 0.0,
            points: BTreeMap::new(),
        }
    }

    pub fn bootstrap_time(&self) -> f64 {
        self.bootstrap_time
    }

    pub fn instance_time(&self) -> f64 {
        self.instance_time
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn stop(&self) -> f64 {
        self.stop
    }

    pub fn set_start(&mut self, at: f64) {
        self.start = at;
    }

    pub fn set_stop(&mut self, at: f64) {
        self.stop = at;
    }

    /// Record a named data point. Reinserting a name overwrites it.
    pub fn insert(&mut self, name: impl Into<String>, at: f64) {
        self.points.insert(name.into(), at);
    }

    pub fn points(&self) -> &BTreeMap<String, f64> {
        &self.points
    }

    /// Flatten to the wire shape: a single JSON object mapping every
    /// event name to its millisecond timestamp.
    pub fn to_event_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(BOOTSTRAP_TIME.to_string(), Value::from(self.bootstrap_time));
        map.insert(INSTANCE_TIME.to_string(), Value::from(self.instance_time));
        map.insert(START.to_string(), Value::from(self.start));
        map.insert(STOP.to_string(), Value::from(self.stop));
        for (name, at) in &self.points {
            map.insert(name.clone(), Value::from(*at));
        }
        map
    }
}

impl Default for EventTimeline {
    fn default() -> Self {
        Self::new()
    }
}
