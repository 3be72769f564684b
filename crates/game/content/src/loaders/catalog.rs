//! Item catalog loader.

use std::path::Path;
use std::str::FromStr;

use catch_core::{Catalog, Item, ItemCategory};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// One catalog entry as written in `items.ron`.
///
/// Names are an ordered list of `(lang, name)` pairs; the order is the
/// matching order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSpec {
    pub key: String,
    pub category: String,
    pub names: Vec<(String, String)>,
}

impl ItemSpec {
    pub fn into_item(self) -> LoadResult<Item> {
        let category = ItemCategory::from_str(self.category.trim()).map_err(|_| {
            anyhow::anyhow!("Unknown category `{}` for item `{}`", self.category, self.key)
        })?;
        Item::new(self.key.trim(), category, self.names).map_err(anyhow::Error::from)
    }
}

/// Item catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub items: Vec<ItemSpec>,
}

/// Loader for the item catalog from RON files.
pub struct CatalogLoader;

impl CatalogLoader {
    /// Load and validate the catalog from a RON file.
    pub fn load(path: &Path) -> LoadResult<Catalog> {
        let content = read_file(path)?;
        let catalog = Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Invalid catalog {}: {}", path.display(), e))?;
        tracing::info!(items = catalog.len(), path = %path.display(), "loaded item catalog");
        Ok(catalog)
    }

    pub fn parse(content: &str) -> LoadResult<Catalog> {
        let file: CatalogFile = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse item catalog RON: {}", e))?;

        let items = file
            .items
            .into_iter()
            .map(ItemSpec::into_item)
            .collect::<LoadResult<Vec<_>>>()?;

        Ok(Catalog::from_items(items)?)
    }
}
