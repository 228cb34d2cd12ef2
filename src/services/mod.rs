//! Services layer - Business logic
//!
//! This module contains all business logic services for the IntelHub system.
//! Services are responsible for:
//! - Implementing business rules
//! - Coordinating between repositories and the tag index
//! - Handling validation and error cases

pub mod competitor;
pub mod master_product;
pub mod tag;
pub mod vendor;
pub mod wishlist;

pub use competitor::{
    CompetitorService, CompetitorServiceError, CreateCompetitorInput, UpdateCompetitorInput,
};
pub use master_product::{
    CreateMasterProductInput, MasterProductService, MasterProductServiceError,
    UpdateMasterProductInput,
};
pub use tag::{slugify, CreateTagInput, EntityStores, TagService, TagServiceError, UpdateTagInput};
pub use vendor::{CreateVendorInput, UpdateVendorInput, VendorService, VendorServiceError};
pub use wishlist::{
    CreateWishlistInput, UpdateWishlistInput, WishlistFilter, WishlistService,
    WishlistServiceError,
};
