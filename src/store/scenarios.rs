use crate::fixture::key::WindowKey;
use crate::fixture::loader::LoadError;
use crate::fixture::{MaterializedScenario, RecordingEntry, ScenarioDescriptor, ScenarioRef};
use crate::store::recordings::RecordingIndex;
use crate::store::window::resolve_data_view;
use crate::store::StoreError;
use std::collections::HashMap;

/// Index from (component family, scenario name) to the backing recording.
///
/// Several scenario names may legitimately share one fingerprint (the
/// same query reused across presentational variants); the scenario
/// ordinal is the only thing that distinguishes them and is threaded
/// through every resolution.
#[derive(Debug, Clone)]
pub struct ScenarioIndex {
    refs: HashMap<(String, String), ScenarioRef>,
}

impl ScenarioIndex {
    /// Build the index from loaded recordings, rejecting any (family,
    /// name) pair declared by more than one scenario anywhere in the
    /// store.
    pub fn build(entries: &[RecordingEntry]) -> Result<Self, LoadError> {
        let mut refs = HashMap::new();
        for entry in entries {
            for (scenario_index, scenario) in entry.scenarios.iter().enumerate() {
                let key = (scenario.family.clone(), scenario.name.clone());
                let scenario_ref = ScenarioRef {
                    fingerprint: entry.fingerprint.clone(),
                    scenario_index,
                };
                if refs.insert(key, scenario_ref).is_some() {
                    return Err(LoadError::DuplicateScenario {
                        family: scenario.family.clone(),
                        name: scenario.name.clone(),
                    });
                }
            }
        }
        Ok(Self { refs })
    }

    pub fn resolve(&self, family: &str, name: &str) -> Result<&ScenarioRef, StoreError> {
        self.refs
            .get(&(family.to_owned(), name.to_owned()))
            .ok_or_else(|| StoreError::ScenarioNotFound {
                family: family.to_owned(),
                name: name.to_owned(),
            })
    }

    /// Materialize the full payload for a scenario: definition, result
    /// descriptor, and the data view chosen by the caller's override, the
    /// scenario's declared default, or the entry's implied default.
    pub fn materialize(
        &self,
        recordings: &RecordingIndex,
        family: &str,
        name: &str,
        window_override: Option<&WindowKey>,
    ) -> Result<MaterializedScenario, StoreError> {
        let scenario_ref = self.resolve(family, name)?;
        let entry = recordings.get(&scenario_ref.fingerprint)?;
        let scenario = &entry.scenarios[scenario_ref.scenario_index];

        let window = match window_override {
            Some(window) => *window,
            None => default_window(entry, scenario)?,
        };
        let data_view = resolve_data_view(entry, &window)?;

        Ok(MaterializedScenario {
            definition: entry.definition.clone(),
            execution_result: entry.execution_result.clone(),
            data_view,
            scenario_index: scenario_ref.scenario_index,
        })
    }

    /// All (family, name) pairs in a stable sorted order.
    pub fn names(&self) -> Vec<(&str, &str)> {
        let mut names: Vec<(&str, &str)> = self
            .refs
            .keys()
            .map(|(family, name)| (family.as_str(), name.as_str()))
            .collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

/// Default-window rule: the scenario's declared window, else `all` when
/// captured, else the entry's only window. Multiple partial windows with
/// no declaration are refused rather than guessed.
fn default_window(
    entry: &RecordingEntry,
    scenario: &ScenarioDescriptor,
) -> Result<WindowKey, StoreError> {
    if let Some(window) = scenario.default_window {
        return Ok(window);
    }
    if entry.data_views.contains_key(&WindowKey::All) {
        return Ok(WindowKey::All);
    }

    let keys = entry.window_keys();
    match keys.as_slice() {
        [only] => Ok(*only),
        _ => Err(StoreError::AmbiguousDefaultWindow {
            fingerprint: entry.fingerprint.clone(),
            windows: keys.iter().map(WindowKey::to_string).collect(),
        }),
    }
}
