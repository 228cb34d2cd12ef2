//! Data models
//!
//! Database entities and shared value types for the IntelHub backend:
//! tags and their assignments, plus the four tagged entity kinds
//! (competitors, vendors, wishlist items, master products).

mod competitor;
mod master_product;
mod tag;
mod vendor;
mod wishlist;

pub use competitor::{Competitor, CompetitorPriority, PrimaryPlatform};
pub use master_product::MasterProduct;
pub use tag::{
    EntityType, Tag, TagCategory, TagCategoryCount, TagMergeResult, TagStatus,
    TagSummary, TagUsage,
};
pub use vendor::Vendor;
pub use wishlist::{WishlistItem, WishlistPriority, WishlistStatus};
