pub mod insights;
pub mod metadata;
pub mod recordings;
pub mod scenarios;
pub mod window;

use crate::fixture::key::WindowKey;
use crate::fixture::loader::{LoadError, LoadedFixtures, load_fixtures};
use crate::fixture::{MaterializedScenario, RecordingEntry, ScenarioRef};
use self::insights::InsightIndex;
use self::metadata::MetadataCatalogs;
use self::recordings::RecordingIndex;
use self::scenarios::ScenarioIndex;
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Lookup-time failure taxonomy. Every kind is a test-authoring or
/// fixture-regeneration bug, never a transient condition: nothing is
/// retried or recovered, and there is no partial-success mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Fingerprint absent from the loaded set.
    RecordingNotFound { fingerprint: String },
    /// The window is within result bounds but was not captured and
    /// cannot be derived by slicing any captured view.
    WindowUnavailable { fingerprint: String, window: String },
    /// The window exceeds the recorded result totals.
    WindowOutOfRange {
        fingerprint: String,
        window: String,
        totals: [usize; 2],
    },
    ScenarioNotFound { family: String, name: String },
    InsightNotFound { family: String, name: String },
    /// A materialize call omitted the window and the recording has
    /// several partial windows with no declared default.
    AmbiguousDefaultWindow {
        fingerprint: String,
        windows: Vec<String>,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RecordingNotFound { fingerprint } => {
                write!(f, "no recording captured for fingerprint '{fingerprint}'")
            }
            Self::WindowUnavailable {
                fingerprint,
                window,
            } => write!(
                f,
                "window '{window}' of recording '{fingerprint}' was not captured and no captured view contains it"
            ),
            Self::WindowOutOfRange {
                fingerprint,
                window,
                totals,
            } => write!(
                f,
                "window '{window}' exceeds the {}x{} result of recording '{fingerprint}'",
                totals[0], totals[1]
            ),
            Self::ScenarioNotFound { family, name } => {
                write!(f, "no scenario '{name}' recorded for family '{family}'")
            }
            Self::InsightNotFound { family, name } => {
                write!(f, "no insight '{name}' recorded for family '{family}'")
            }
            Self::AmbiguousDefaultWindow {
                fingerprint,
                windows,
            } => write!(
                f,
                "recording '{fingerprint}' has no default window; pass one of {windows:?} explicitly"
            ),
        }
    }
}

impl std::error::Error for StoreError {}

/// One containment-audit finding from [`RecordingStore::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainmentViolation {
    pub fingerprint: String,
    pub window: String,
    pub detail: String,
}

/// The deterministic mock-execution fixture store: one explicit,
/// immutable registry built once from on-disk fixtures.
///
/// Every method is a pure synchronous lookup over state frozen at load
/// time; concurrent readers need no locking because nothing is ever
/// written after construction.
#[derive(Debug, Clone)]
pub struct RecordingStore {
    recordings: RecordingIndex,
    scenarios: ScenarioIndex,
    insights: InsightIndex,
    metadata: MetadataCatalogs,
}

impl RecordingStore {
    /// Load a fixture root eagerly and build every index.
    pub fn load(root: &Path) -> Result<Self, LoadError> {
        Self::from_fixtures(load_fixtures(root)?)
    }

    /// Build a store from already-loaded fixtures. Index invariants
    /// (scenario and insight uniqueness) are validated here.
    pub fn from_fixtures(fixtures: LoadedFixtures) -> Result<Self, LoadError> {
        let scenarios = ScenarioIndex::build(&fixtures.entries)?;
        let insights = InsightIndex::build(fixtures.insights)?;
        let recordings = RecordingIndex::new(fixtures.entries);

        Ok(Self {
            recordings,
            scenarios,
            insights,
            metadata: fixtures.metadata,
        })
    }

    /// Resolve a fingerprint to its recording.
    pub fn get_execution(&self, fingerprint: &str) -> Result<&RecordingEntry, StoreError> {
        self.recordings.get(fingerprint)
    }

    /// Resolve a requested window against a recording's captured views.
    pub fn get_data_view(
        &self,
        fingerprint: &str,
        window: &WindowKey,
    ) -> Result<Value, StoreError> {
        let entry = self.recordings.get(fingerprint)?;
        window::resolve_data_view(entry, window)
    }

    /// Resolve a (family, scenario name) pair to its backing recording
    /// and ordinal.
    pub fn resolve_scenario(&self, family: &str, name: &str) -> Result<ScenarioRef, StoreError> {
        self.scenarios.resolve(family, name).cloned()
    }

    /// Materialize a scenario's full payload, optionally overriding the
    /// window.
    pub fn materialize_scenario(
        &self,
        family: &str,
        name: &str,
        window: Option<&WindowKey>,
    ) -> Result<MaterializedScenario, StoreError> {
        self.scenarios
            .materialize(&self.recordings, family, name, window)
    }

    /// Resolve a (family, insight name) pair to its visualization
    /// definition artifact.
    pub fn get_insight(&self, family: &str, name: &str) -> Result<&Value, StoreError> {
        self.insights.get(family, name)
    }

    /// The opaque metadata catalogs.
    pub fn metadata(&self) -> &MetadataCatalogs {
        &self.metadata
    }

    /// All loaded fingerprints, sorted.
    pub fn fingerprints(&self) -> Vec<&str> {
        self.recordings.fingerprints()
    }

    /// All (family, scenario name) pairs, sorted.
    pub fn scenarios(&self) -> Vec<(&str, &str)> {
        self.scenarios.names()
    }

    /// All (family, insight name) pairs, sorted.
    pub fn insights(&self) -> Vec<(&str, &str)> {
        self.insights.names()
    }

    /// Audit the capture tool's content-level invariant: slicing `all`
    /// at any partial window's bounds must reproduce that window's
    /// stored `data` exactly. The invariant is owed upstream, so
    /// violations are reported rather than failing the load.
    pub fn verify(&self) -> Vec<ContainmentViolation> {
        let mut violations = Vec::new();

        for entry in self.recordings.iter() {
            let Some(all_payload) = entry.data_views.get(&WindowKey::All) else {
                continue;
            };
            let all_bounds = window::cached_bounds(&WindowKey::All, entry.totals);

            for (key, payload) in &entry.data_views {
                if *key == WindowKey::All {
                    continue;
                }
                let bounds = window::cached_bounds(key, entry.totals);
                let sliced = window::slice_payload(all_payload, &all_bounds, &bounds);
                if sliced.get("data") != payload.get("data") {
                    violations.push(ContainmentViolation {
                        fingerprint: entry.fingerprint.clone(),
                        window: key.to_string(),
                        detail: "slicing 'all' does not reproduce the stored window".to_owned(),
                    });
                }
            }
        }

        violations.sort_by(|a, b| (&a.fingerprint, &a.window).cmp(&(&b.fingerprint, &b.window)));
        violations
    }
}
