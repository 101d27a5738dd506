pub mod key;
pub mod loader;

pub use self::key::{DataWindow, WindowKey};
pub use self::loader::{LoadError, LoadedFixtures, load_fixtures};

use serde_json::Value;
use std::collections::HashMap;

/// Everything captured for one query fingerprint: the opaque query
/// definition, the result descriptor, the recorded data-view windows, and
/// the scenarios backed by this recording.
#[derive(Debug, Clone)]
pub struct RecordingEntry {
    /// Opaque content-hash identity of the canonical query.
    pub fingerprint: String,
    /// Opaque query descriptor; never interpreted by the store.
    pub definition: Value,
    /// Opaque result-metadata descriptor.
    pub execution_result: Value,
    /// Per-dimension result totals extracted from `execution_result`,
    /// normalized to `[rows, columns]` at load time.
    pub totals: [usize; 2],
    /// Captured data-view payloads keyed by structured window key.
    pub data_views: HashMap<WindowKey, Value>,
    /// Scenarios backed by this fingerprint, in declared order; the
    /// position in this list is the scenario's stable ordinal.
    pub scenarios: Vec<ScenarioDescriptor>,
}

impl RecordingEntry {
    /// Captured window keys in a stable sorted order.
    pub fn window_keys(&self) -> Vec<WindowKey> {
        let mut keys: Vec<WindowKey> = self.data_views.keys().copied().collect();
        keys.sort();
        keys
    }
}

/// One named presentational test case backed by a recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioDescriptor {
    /// Component family, e.g. "BarChart".
    pub family: String,
    /// Scenario name, unique within the family.
    pub name: String,
    /// Declared default window, if the capture tool recorded one.
    pub default_window: Option<WindowKey>,
}

/// Resolution of a (family, scenario name) pair: the backing fingerprint
/// plus the scenario's stable zero-based ordinal within that recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioRef {
    pub fingerprint: String,
    pub scenario_index: usize,
}

/// Fully materialized scenario payload: the recording's definition and
/// result descriptor plus the resolved data-view window.
#[derive(Debug, Clone)]
pub struct MaterializedScenario {
    pub definition: Value,
    pub execution_result: Value,
    pub data_view: Value,
    pub scenario_index: usize,
}

/// One insight artifact: a visualization definition independent of any
/// execution fingerprint.
#[derive(Debug, Clone)]
pub struct InsightRecord {
    pub family: String,
    pub name: String,
    pub artifact: Value,
}
