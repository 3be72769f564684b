//! Content loaders for the item catalog and game configuration.
//!
//! Content lives in a directory holding `items.ron` (the catalog) and an
//! optional `config.toml` (game tunables). Loaders turn these files into
//! catch-core types; nothing here is consulted after startup.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{CatalogLoader, ConfigLoader, ContentFactory, ItemSpec, LoadResult};
