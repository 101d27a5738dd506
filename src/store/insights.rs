use crate::fixture::InsightRecord;
use crate::fixture::loader::LoadError;
use crate::store::StoreError;
use serde_json::Value;
use std::collections::HashMap;

/// Flat catalog from (component family, insight name) to a visualization
/// definition artifact. Independent of fingerprints and windowing; a
/// lookup either returns the artifact verbatim or fails.
#[derive(Debug, Clone)]
pub struct InsightIndex {
    artifacts: HashMap<(String, String), Value>,
}

impl InsightIndex {
    pub fn build(insights: Vec<InsightRecord>) -> Result<Self, LoadError> {
        let mut artifacts = HashMap::new();
        for insight in insights {
            let key = (insight.family.clone(), insight.name.clone());
            if artifacts.insert(key, insight.artifact).is_some() {
                return Err(LoadError::DuplicateInsight {
                    family: insight.family,
                    name: insight.name,
                });
            }
        }
        Ok(Self { artifacts })
    }

    pub fn get(&self, family: &str, name: &str) -> Result<&Value, StoreError> {
        self.artifacts
            .get(&(family.to_owned(), name.to_owned()))
            .ok_or_else(|| StoreError::InsightNotFound {
                family: family.to_owned(),
                name: name.to_owned(),
            })
    }

    /// All (family, name) pairs in a stable sorted order.
    pub fn names(&self) -> Vec<(&str, &str)> {
        let mut names: Vec<(&str, &str)> = self
            .artifacts
            .keys()
            .map(|(family, name)| (family.as_str(), name.as_str()))
            .collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}
