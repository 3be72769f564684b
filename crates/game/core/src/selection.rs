//! Drop selection over the catalog.
use std::collections::HashSet;
use std::sync::Arc;

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;

use crate::catalog::{Catalog, Item};
use crate::ids::ItemKey;

/// Weight of an item the owner does not hold yet.
pub const NEW_ITEM_WEIGHT: u32 = 10;
/// Weight of an item the owner already holds.
pub const OWNED_ITEM_WEIGHT: u32 = 1;

/// Uniform pick over every catalog item.
pub fn pick_uniform<R: Rng + ?Sized>(catalog: &Catalog, rng: &mut R) -> Arc<Item> {
    // Catalogs are never empty, so `choose` always yields.
    catalog
        .items()
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| Arc::clone(&catalog.items()[0]))
}

/// Weighted pick favoring items missing from `owned`.
///
/// Falls back to a uniform pick once the owner holds every catalog key.
pub fn pick_favoring_new<R: Rng + ?Sized>(
    catalog: &Catalog,
    owned: &HashSet<ItemKey>,
    rng: &mut R,
) -> Arc<Item> {
    let owned_in_catalog = catalog.keys().filter(|k| owned.contains(*k)).count();
    if owned_in_catalog >= catalog.len() {
        return pick_uniform(catalog, rng);
    }

    let weights = catalog.iter().map(|item| {
        if owned.contains(item.key()) {
            OWNED_ITEM_WEIGHT
        } else {
            NEW_ITEM_WEIGHT
        }
    });

    match WeightedIndex::new(weights) {
        Ok(dist) => Arc::clone(&catalog.items()[dist.sample(rng)]),
        Err(_) => pick_uniform(catalog, rng),
    }
}
