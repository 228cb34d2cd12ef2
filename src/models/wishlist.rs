//! Wishlist model
//!
//! Wishlist items track products to source, from idea through procurement.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sourcing pipeline status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WishlistStatus {
    #[default]
    Planned,
    Sourcing,
    Ordered,
    Procured,
    Abandoned,
}

impl WishlistStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WishlistStatus::Planned => "planned",
            WishlistStatus::Sourcing => "sourcing",
            WishlistStatus::Ordered => "ordered",
            WishlistStatus::Procured => "procured",
            WishlistStatus::Abandoned => "abandoned",
        }
    }
}

impl FromStr for WishlistStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planned" => Ok(WishlistStatus::Planned),
            "sourcing" => Ok(WishlistStatus::Sourcing),
            "ordered" => Ok(WishlistStatus::Ordered),
            "procured" => Ok(WishlistStatus::Procured),
            "abandoned" => Ok(WishlistStatus::Abandoned),
            other => Err(format!("unknown wishlist status: {}", other)),
        }
    }
}

impl fmt::Display for WishlistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sourcing priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WishlistPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl WishlistPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            WishlistPriority::Low => "low",
            WishlistPriority::Medium => "medium",
            WishlistPriority::High => "high",
        }
    }
}

impl FromStr for WishlistPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(WishlistPriority::Low),
            "medium" => Ok(WishlistPriority::Medium),
            "high" => Ok(WishlistPriority::High),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

/// Wishlist item entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WishlistItem {
    pub wish_id: String,
    pub title: String,
    pub description: Option<String>,
    pub reference_urls: Vec<String>,
    pub images: Vec<String>,
    pub source_platforms: Vec<String>,
    /// Business names of linked competitors
    pub competitors: Vec<String>,
    pub vendor_id: Option<String>,
    pub master_product_id: Option<String>,
    pub status: WishlistStatus,
    pub price_target: Option<f64>,
    /// Only set while status is `procured`
    pub price_actual: Option<f64>,
    /// Resolved tag slugs
    pub tags: Vec<String>,
    pub priority: WishlistPriority,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WishlistItem {
    pub fn new(title: String) -> Self {
        let now = Utc::now();
        Self {
            wish_id: Uuid::new_v4().to_string(),
            title,
            description: None,
            reference_urls: Vec::new(),
            images: Vec::new(),
            source_platforms: Vec::new(),
            competitors: Vec::new(),
            vendor_id: None,
            master_product_id: None,
            status: WishlistStatus::Planned,
            price_target: None,
            price_actual: None,
            tags: Vec::new(),
            priority: WishlistPriority::Medium,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}
