//! Static item catalog.
//!
//! The catalog is built once at startup and never mutated afterwards. Items
//! are shared as `Arc<Item>` so the engine can hand them out without copying.
mod category;
mod item;

pub use category::{CategoryGroup, ItemCategory};
pub use item::{DEFAULT_LANG, Item, LocalizedName};

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::ids::ItemKey;

/// Errors raised while assembling a catalog.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog has no items")]
    Empty,

    #[error("item key is empty")]
    EmptyKey,

    #[error("duplicate item key `{key}`")]
    DuplicateKey { key: ItemKey },

    #[error("item `{key}` has no display name")]
    NoNames { key: ItemKey },
}

/// Closed, non-empty mapping of item key to item.
#[derive(Clone, Debug)]
pub struct Catalog {
    items: Vec<Arc<Item>>,
    index: HashMap<ItemKey, usize>,
}

impl Catalog {
    /// Builds a catalog, preserving the given order.
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Result<Self, CatalogError> {
        let mut list = Vec::new();
        let mut index = HashMap::new();

        for item in items {
            if index.contains_key(item.key()) {
                return Err(CatalogError::DuplicateKey {
                    key: item.key().clone(),
                });
            }
            index.insert(item.key().clone(), list.len());
            list.push(Arc::new(item));
        }

        if list.is_empty() {
            return Err(CatalogError::Empty);
        }

        Ok(Self { items: list, index })
    }

    pub fn get(&self, key: &str) -> Option<&Arc<Item>> {
        self.index.get(key).map(|&i| &self.items[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Arc<Item>] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Item>> {
        self.items.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ItemKey> {
        self.items.iter().map(|item| item.key())
    }

    /// How much of the catalog an owner holds.
    ///
    /// Keys unknown to the catalog are ignored.
    pub fn completion<'a, I>(&self, owned: I) -> Completion
    where
        I: IntoIterator<Item = &'a str>,
    {
        let owned: BTreeSet<&str> = owned.into_iter().filter(|k| self.contains(k)).collect();
        Completion::new(owned.len(), self.len())
    }

    /// Catalog keys the owner does not hold yet, sorted.
    pub fn remaining<'a, I>(&self, owned: I) -> Vec<ItemKey>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let owned: BTreeSet<&str> = owned.into_iter().collect();
        let mut keys: Vec<ItemKey> = self
            .keys()
            .filter(|k| !owned.contains(k.as_str()))
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Items whose category belongs to `group`, in catalog order.
    pub fn filter_group(&self, group: CategoryGroup) -> impl Iterator<Item = &Arc<Item>> {
        self.items
            .iter()
            .filter(move |item| group.contains(item.category()))
    }
}

/// Collection progress summary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Completion {
    pub owned: usize,
    pub total: usize,
    /// Percentage rounded to two decimals.
    pub percent: f64,
}

impl Completion {
    fn new(owned: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0.0
        } else {
            (owned as f64 / total as f64 * 10_000.0).round() / 100.0
        };
        Self {
            owned,
            total,
            percent,
        }
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({:.2}%)", self.owned, self.total, self.percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(key: &str, category: ItemCategory, name: &str) -> Item {
        Item::new(key, category, [("en", name)]).unwrap()
    }

    fn sample() -> Catalog {
        Catalog::from_items([
            item("pi", ItemCategory::Constants, "pi"),
            item("sin", ItemCategory::Functions, "sine"),
            item("alpha", ItemCategory::SmallGreek, "alpha"),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_empty_and_duplicates() {
        assert_eq!(
            Catalog::from_items(Vec::<Item>::new()).unwrap_err(),
            CatalogError::Empty
        );
        let err = Catalog::from_items([
            item("pi", ItemCategory::Constants, "pi"),
            item("pi", ItemCategory::Constants, "tau"),
        ])
        .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateKey { key: "pi".into() });
    }

    #[test]
    fn lookup_by_key() {
        let catalog = sample();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("sin").unwrap().display_name(), "sine");
        assert!(catalog.get("cos").is_none());
    }

    #[test]
    fn completion_ignores_unknown_keys() {
        let catalog = sample();
        let completion = catalog.completion(["pi", "sin", "bogus"]);
        assert_eq!(completion.owned, 2);
        assert_eq!(completion.total, 3);
        assert_eq!(completion.percent, 66.67);
    }

    #[test]
    fn remaining_is_sorted() {
        let catalog = sample();
        let remaining = catalog.remaining(["sin"]);
        assert_eq!(remaining, vec![ItemKey::from("alpha"), ItemKey::from("pi")]);
    }

    #[test]
    fn filter_by_group() {
        let catalog = sample();
        let greek: Vec<_> = catalog
            .filter_group(CategoryGroup::Greek)
            .map(|i| i.key().as_str())
            .collect();
        assert_eq!(greek, ["alpha"]);
        assert_eq!(catalog.filter_group(CategoryGroup::All).count(), 3);
    }
}
