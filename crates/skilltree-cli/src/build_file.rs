// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! On-disk build documents and catalog loading.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use skilltree_core::{Catalog, Item, ItemId, TreeEditingState, TreeProperties};
use tracing::debug;

/// One build: tree configuration, editing state and the items it socketed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildFile {
    /// Tree selection and budget.
    pub tree: TreeProperties,
    /// History, cursor and socket assignments.
    #[serde(default)]
    pub editing: TreeEditingState,
    /// Items referenced by `editing.jewels`.
    #[serde(default)]
    pub items: BTreeMap<ItemId, Item>,
}

impl BuildFile {
    /// Reads a build document.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading build {}", path.display()))?;
        let build: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing build {}", path.display()))?;
        debug!(
            path = %path.display(),
            steps = build.editing.history.len(),
            items = build.items.len(),
            "loaded build"
        );
        Ok(build)
    }

    /// Writes the document back as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut text = serde_json::to_string_pretty(self).context("encoding build")?;
        text.push('\n');
        fs::write(path, text).with_context(|| format!("writing build {}", path.display()))
    }
}

/// Reads and decodes a catalog file.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    let catalog = Catalog::from_json(&text)
        .with_context(|| format!("parsing catalog {}", path.display()))?;
    debug!(path = %path.display(), versions = catalog.trees.len(), "loaded catalog");
    Ok(catalog)
}
