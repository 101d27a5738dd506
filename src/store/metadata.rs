use serde_json::Value;
use std::collections::HashMap;

/// Opaque metadata catalogs consumed verbatim by tests: workspace
/// catalog, visualization classes, display forms, and dashboards. Direct
/// id lookup only; no resolution algorithm.
#[derive(Debug, Clone, Default)]
pub struct MetadataCatalogs {
    pub catalog: HashMap<String, Value>,
    pub vis_classes: HashMap<String, Value>,
    pub display_forms: HashMap<String, Value>,
    pub dashboards: HashMap<String, Value>,
}

impl MetadataCatalogs {
    pub fn catalog_item(&self, id: &str) -> Option<&Value> {
        self.catalog.get(id)
    }

    pub fn vis_class(&self, id: &str) -> Option<&Value> {
        self.vis_classes.get(id)
    }

    pub fn display_form(&self, id: &str) -> Option<&Value> {
        self.display_forms.get(id)
    }

    pub fn dashboard(&self, id: &str) -> Option<&Value> {
        self.dashboards.get(id)
    }
}
