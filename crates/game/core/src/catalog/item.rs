use super::{CatalogError, ItemCategory};
use crate::ids::ItemKey;

/// Language used for display when an item has a name in it.
pub const DEFAULT_LANG: &str = "en";

/// One display name of an item in one language.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalizedName {
    lang: String,
    name: String,
    folded: String,
}

impl LocalizedName {
    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lowercased form used for matching.
    pub fn folded(&self) -> &str {
        &self.folded
    }
}

/// Immutable catalog entry.
///
/// Names keep the order they were declared in; matching walks them in that
/// order, so the first declared name wins when several would match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    key: ItemKey,
    category: ItemCategory,
    names: Vec<LocalizedName>,
}

impl Item {
    /// Builds an item, dropping blank names. At least one name must remain.
    pub fn new<I, L, N>(
        key: impl Into<ItemKey>,
        category: ItemCategory,
        names: I,
    ) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (L, N)>,
        L: Into<String>,
        N: Into<String>,
    {
        let key = key.into();
        if key.as_str().trim().is_empty() {
            return Err(CatalogError::EmptyKey);
        }

        let names: Vec<LocalizedName> = names
            .into_iter()
            .filter_map(|(lang, name)| {
                let name: String = name.into();
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    return None;
                }
                Some(LocalizedName {
                    lang: lang.into(),
                    folded: trimmed.to_lowercase(),
                    name: trimmed.to_owned(),
                })
            })
            .collect();

        if names.is_empty() {
            return Err(CatalogError::NoNames { key });
        }

        Ok(Self {
            key,
            category,
            names,
        })
    }

    pub fn key(&self) -> &ItemKey {
        &self.key
    }

    pub fn category(&self) -> ItemCategory {
        self.category
    }

    pub fn names(&self) -> &[LocalizedName] {
        &self.names
    }

    /// Name in `lang`, if the item has one.
    pub fn name_in(&self, lang: &str) -> Option<&str> {
        self.names
            .iter()
            .find(|n| n.lang == lang)
            .map(|n| n.name.as_str())
    }

    /// Name shown in inventories: the English name, else the first one.
    pub fn display_name(&self) -> &str {
        self.name_in(DEFAULT_LANG)
            .unwrap_or_else(|| self.names[0].name.as_str())
    }

    /// Case-insensitive substring match against every name, in order.
    ///
    /// Returns the first name whose lowercase form occurs in `text`.
    pub fn exact_match(&self, text: &str) -> Option<&str> {
        let text = text.to_lowercase();
        self.names
            .iter()
            .find(|n| text.contains(n.folded.as_str()))
            .map(|n| n.name.as_str())
    }
}
