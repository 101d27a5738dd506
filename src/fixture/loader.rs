use crate::fixture::key::WindowKey;
use crate::fixture::{InsightRecord, RecordingEntry, ScenarioDescriptor};
use crate::store::metadata::MetadataCatalogs;
use crate::store::window::cached_bounds;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Everything read from one fixture root, before index construction.
#[derive(Debug, Clone)]
pub struct LoadedFixtures {
    pub entries: Vec<RecordingEntry>,
    pub insights: Vec<InsightRecord>,
    pub metadata: MetadataCatalogs,
}

/// Load-time failure taxonomy. Every variant is a fixture-authoring or
/// regeneration defect; loading fails on the first one found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    Io {
        path: PathBuf,
        detail: String,
    },
    Json {
        path: PathBuf,
        detail: String,
    },
    MissingArtifact {
        fingerprint: String,
        artifact: String,
    },
    BadWindowKey {
        fingerprint: String,
        file_name: String,
        detail: String,
    },
    BadResultTotals {
        fingerprint: String,
        detail: String,
    },
    BadDataView {
        fingerprint: String,
        window: String,
        detail: String,
    },
    BadDefaultWindow {
        fingerprint: String,
        window: String,
        detail: String,
    },
    BadInsight {
        path: PathBuf,
        detail: String,
    },
    DuplicateScenario {
        family: String,
        name: String,
    },
    DuplicateInsight {
        family: String,
        name: String,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, detail } => {
                write!(f, "failed reading '{}': {detail}", path.display())
            }
            Self::Json { path, detail } => {
                write!(f, "malformed JSON in '{}': {detail}", path.display())
            }
            Self::MissingArtifact {
                fingerprint,
                artifact,
            } => write!(
                f,
                "recording '{fingerprint}' is missing required artifact '{artifact}'"
            ),
            Self::BadWindowKey {
                fingerprint,
                file_name,
                detail,
            } => write!(
                f,
                "recording '{fingerprint}' has unparseable data view file '{file_name}': {detail}"
            ),
            Self::BadResultTotals {
                fingerprint,
                detail,
            } => write!(
                f,
                "recording '{fingerprint}' has invalid result totals: {detail}"
            ),
            Self::BadDataView {
                fingerprint,
                window,
                detail,
            } => write!(
                f,
                "recording '{fingerprint}' data view '{window}' is malformed: {detail}"
            ),
            Self::BadDefaultWindow {
                fingerprint,
                window,
                detail,
            } => write!(
                f,
                "recording '{fingerprint}' declares default window '{window}': {detail}"
            ),
            Self::BadInsight { path, detail } => {
                write!(f, "invalid insight artifact '{}': {detail}", path.display())
            }
            Self::DuplicateScenario { family, name } => write!(
                f,
                "scenario '{family}/{name}' is declared by more than one recording"
            ),
            Self::DuplicateInsight { family, name } => {
                write!(f, "insight '{family}/{name}' is declared more than once")
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// Raw scenario descriptor as written by the capture tool.
#[derive(Debug, Clone, Deserialize)]
struct RawScenario {
    family: String,
    name: String,
    #[serde(default)]
    window: Option<String>,
}

/// Enumerate a fixture root and load every artifact into memory.
///
/// Fails fast on the first defect; a store is either completely loaded or
/// not loaded at all.
pub fn load_fixtures(root: &Path) -> Result<LoadedFixtures, LoadError> {
    let mut entries = load_executions(&root.join("executions"))?;
    entries.sort_by(|a, b| a.fingerprint.cmp(&b.fingerprint));

    let insights = load_insights(root)?;
    let metadata = load_metadata(&root.join("metadata"))?;

    Ok(LoadedFixtures {
        entries,
        insights,
        metadata,
    })
}

fn load_executions(executions_dir: &Path) -> Result<Vec<RecordingEntry>, LoadError> {
    if !executions_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for dir_entry in read_dir(executions_dir)? {
        let path = dir_entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(fingerprint) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        entries.push(load_execution_dir(fingerprint, &path)?);
    }

    Ok(entries)
}

fn load_execution_dir(fingerprint: &str, dir: &Path) -> Result<RecordingEntry, LoadError> {
    let definition = read_required_json(fingerprint, dir, "definition.json")?;
    let execution_result = read_required_json(fingerprint, dir, "executionResult.json")?;
    let totals = extract_totals(fingerprint, &execution_result)?;

    let mut data_views = HashMap::new();
    for dir_entry in read_dir(dir)? {
        let path = dir_entry.path();
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let Some(stem) = file_name.strip_suffix(".json") else {
            continue;
        };
        if !stem.starts_with("dataView_") {
            continue;
        }

        let key = WindowKey::from_file_stem(stem).map_err(|detail| LoadError::BadWindowKey {
            fingerprint: fingerprint.to_owned(),
            file_name: file_name.to_owned(),
            detail,
        })?;
        let payload = read_json(&path)?;
        validate_data_view(fingerprint, &key, totals, &payload)?;
        data_views.insert(key, payload);
    }

    if data_views.is_empty() {
        return Err(LoadError::MissingArtifact {
            fingerprint: fingerprint.to_owned(),
            artifact: "dataView_*.json".to_owned(),
        });
    }

    let scenarios = load_scenarios(fingerprint, dir, &data_views)?;

    Ok(RecordingEntry {
        fingerprint: fingerprint.to_owned(),
        definition,
        execution_result,
        totals,
        data_views,
        scenarios,
    })
}

fn load_scenarios(
    fingerprint: &str,
    dir: &Path,
    data_views: &HashMap<WindowKey, Value>,
) -> Result<Vec<ScenarioDescriptor>, LoadError> {
    let path = dir.join("scenarios.json");
    if !path.is_file() {
        return Ok(Vec::new());
    }

    let raw = read_json(&path)?;
    let raw_scenarios: Vec<RawScenario> =
        serde_json::from_value(raw).map_err(|error| LoadError::Json {
            path: path.clone(),
            detail: error.to_string(),
        })?;

    let mut scenarios = Vec::with_capacity(raw_scenarios.len());
    for raw_scenario in raw_scenarios {
        let default_window = match raw_scenario.window.as_deref() {
            None => None,
            Some(spec) => {
                let key = WindowKey::parse(spec).map_err(|detail| LoadError::BadDefaultWindow {
                    fingerprint: fingerprint.to_owned(),
                    window: spec.to_owned(),
                    detail,
                })?;
                if !data_views.contains_key(&key) {
                    return Err(LoadError::BadDefaultWindow {
                        fingerprint: fingerprint.to_owned(),
                        window: spec.to_owned(),
                        detail: "no such view was captured".to_owned(),
                    });
                }
                Some(key)
            }
        };
        scenarios.push(ScenarioDescriptor {
            family: raw_scenario.family,
            name: raw_scenario.name,
            default_window,
        });
    }

    Ok(scenarios)
}

/// The result descriptor is opaque except for its per-dimension totals,
/// accepted at `paging.total` either top-level or under an
/// `executionResult` wrapper. One-dimensional totals are normalized to
/// `[n, 1]` so the window selector is uniformly two-dimensional.
fn extract_totals(fingerprint: &str, execution_result: &Value) -> Result<[usize; 2], LoadError> {
    let totals_value = execution_result
        .pointer("/paging/total")
        .or_else(|| execution_result.pointer("/executionResult/paging/total"))
        .ok_or_else(|| LoadError::BadResultTotals {
            fingerprint: fingerprint.to_owned(),
            detail: "no 'paging.total' array".to_owned(),
        })?;

    let totals_array = totals_value
        .as_array()
        .ok_or_else(|| LoadError::BadResultTotals {
            fingerprint: fingerprint.to_owned(),
            detail: "'paging.total' is not an array".to_owned(),
        })?;

    let mut totals = Vec::with_capacity(totals_array.len());
    for value in totals_array {
        let total = value
            .as_u64()
            .ok_or_else(|| LoadError::BadResultTotals {
                fingerprint: fingerprint.to_owned(),
                detail: format!("non-integer total {value}"),
            })?;
        totals.push(total as usize);
    }

    match totals.as_slice() {
        [rows] => Ok([*rows, 1]),
        [rows, columns] => Ok([*rows, *columns]),
        other => Err(LoadError::BadResultTotals {
            fingerprint: fingerprint.to_owned(),
            detail: format!("expected 1 or 2 dimensions, got {}", other.len()),
        }),
    }
}

/// A data-view payload must be an object whose `data` array has exactly
/// the row count implied by its window key, so lookup-time slicing can
/// never index out of bounds.
fn validate_data_view(
    fingerprint: &str,
    key: &WindowKey,
    totals: [usize; 2],
    payload: &Value,
) -> Result<(), LoadError> {
    let object = payload
        .as_object()
        .ok_or_else(|| LoadError::BadDataView {
            fingerprint: fingerprint.to_owned(),
            window: key.to_string(),
            detail: "payload is not a JSON object".to_owned(),
        })?;

    let rows = object
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| LoadError::BadDataView {
            fingerprint: fingerprint.to_owned(),
            window: key.to_string(),
            detail: "payload has no 'data' array".to_owned(),
        })?;

    let bounds = cached_bounds(key, totals);
    if rows.len() != bounds.size[0] {
        return Err(LoadError::BadDataView {
            fingerprint: fingerprint.to_owned(),
            window: key.to_string(),
            detail: format!(
                "'data' has {} rows, window covers {}",
                rows.len(),
                bounds.size[0]
            ),
        });
    }

    Ok(())
}

fn load_insights(root: &Path) -> Result<Vec<InsightRecord>, LoadError> {
    let mut insights = Vec::new();
    for dir_entry in read_dir(root)? {
        let path = dir_entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(dir_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let Some(captures) = insight_dir_pattern().captures(dir_name) else {
            continue;
        };
        let family = captures[1].to_owned();

        let artifact_path = path.join("obj.json");
        if !artifact_path.is_file() {
            return Err(LoadError::BadInsight {
                path: artifact_path,
                detail: "missing obj.json".to_owned(),
            });
        }
        let artifact = read_json(&artifact_path)?;
        let name = insight_name(&artifact).ok_or_else(|| LoadError::BadInsight {
            path: artifact_path,
            detail: "artifact carries no 'insight.title' or 'title'".to_owned(),
        })?;

        insights.push(InsightRecord {
            family,
            name,
            artifact,
        });
    }

    insights.sort_by(|a, b| (&a.family, &a.name).cmp(&(&b.family, &b.name)));
    Ok(insights)
}

fn insight_name(artifact: &Value) -> Option<String> {
    artifact
        .pointer("/insight/title")
        .or_else(|| artifact.get("title"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

fn insight_dir_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9_-]+)\.([0-9a-f]+)$").expect("insight dir pattern is valid")
    })
}

fn load_metadata(metadata_dir: &Path) -> Result<MetadataCatalogs, LoadError> {
    Ok(MetadataCatalogs {
        catalog: load_catalog_map(&metadata_dir.join("catalog.json"))?,
        vis_classes: load_catalog_map(&metadata_dir.join("visClasses.json"))?,
        display_forms: load_catalog_map(&metadata_dir.join("displayForms.json"))?,
        dashboards: load_catalog_map(&metadata_dir.join("dashboards.json"))?,
    })
}

/// A metadata catalog file is an id -> artifact object; a missing file is
/// an empty catalog, a malformed one is a load error.
fn load_catalog_map(path: &Path) -> Result<HashMap<String, Value>, LoadError> {
    if !path.is_file() {
        return Ok(HashMap::new());
    }
    let value = read_json(path)?;
    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(LoadError::Json {
            path: path.to_path_buf(),
            detail: "metadata catalog is not a JSON object".to_owned(),
        }),
    }
}

fn read_required_json(fingerprint: &str, dir: &Path, artifact: &str) -> Result<Value, LoadError> {
    let path = dir.join(artifact);
    if !path.is_file() {
        return Err(LoadError::MissingArtifact {
            fingerprint: fingerprint.to_owned(),
            artifact: artifact.to_owned(),
        });
    }
    read_json(&path)
}

fn read_json(path: &Path) -> Result<Value, LoadError> {
    let content = fs::read_to_string(path).map_err(|error| LoadError::Io {
        path: path.to_path_buf(),
        detail: error.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|error| LoadError::Json {
        path: path.to_path_buf(),
        detail: error.to_string(),
    })
}

fn read_dir(dir: &Path) -> Result<Vec<fs::DirEntry>, LoadError> {
    let reader = fs::read_dir(dir).map_err(|error| LoadError::Io {
        path: dir.to_path_buf(),
        detail: error.to_string(),
    })?;

    let mut dir_entries = Vec::new();
    for dir_entry in reader {
        dir_entries.push(dir_entry.map_err(|error| LoadError::Io {
            path: dir.to_path_buf(),
            detail: error.to_string(),
        })?);
    }
    Ok(dir_entries)
}
