//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod competitor;
pub mod master_product;
pub mod tag;
pub mod tag_index;
pub mod vendor;
pub mod wishlist;

use anyhow::{Context, Result};

/// Encode a list column as JSON text
pub(crate) fn encode_list(list: &[String]) -> Result<String> {
    serde_json::to_string(list).context("Failed to encode list column")
}

/// Decode a JSON text column into a list
pub(crate) fn decode_list(raw: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw).context("Failed to decode list column")
}

pub use competitor::{CompetitorRepository, SqlxCompetitorRepository};
pub use master_product::{MasterProductRepository, SqlxMasterProductRepository};
pub use tag::{is_unique_violation, SqlxTagRepository, TagRepository, TagSearch};
pub use tag_index::{SqlxTagIndexRepository, TagIndexRepository};
pub use vendor::{SqlxVendorRepository, VendorRepository};
pub use wishlist::{SqlxWishlistRepository, WishlistRepository};
