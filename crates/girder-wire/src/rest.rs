use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Directory,
}

/// One entry in a workspace directory listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceItem {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceListing {
    #[serde(default)]
    pub items: Vec<WorkspaceItem>,
}

/// Structured error body every file-store endpoint returns on non-success
/// status. The message is relayed verbatim to the invoking panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
}

/// `GET /api/models` response: the selectable models plus the default
/// per-role assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelCatalog {
    #[serde(default)]
    pub available_models: Vec<ModelInfo>,
    #[serde(default)]
    pub default_models: BTreeMap<String, String>,
}

/// `GET /api/tools` response. Tool descriptors are opaque to the client;
/// they are only surfaced in the plan editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCatalog {
    #[serde(default)]
    pub tools: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listing_parses_item_kinds() {
        let raw = json!({"items": [
            {"name": "notes.md", "type": "file"},
            {"name": "data", "type": "directory"},
        ]});
        let listing: WorkspaceListing = serde_json::from_value(raw).unwrap();
        assert_eq!(listing.items[0].kind, ItemKind::File);
        assert_eq!(listing.items[1].kind, ItemKind::Directory);
    }

    #[test]
    fn model_catalog_tolerates_missing_fields() {
        let catalog: ModelCatalog = serde_json::from_value(json!({})).unwrap();
        assert!(catalog.available_models.is_empty());
        assert!(catalog.default_models.is_empty());
    }
}
