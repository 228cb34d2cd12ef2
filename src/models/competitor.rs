//! Competitor model
//!
//! Competitors are tracked storefronts, keyed by business name.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sales platform a competitor primarily operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimaryPlatform {
    Shopify,
    Woocommerce,
    Amazon,
    Etsy,
    Custom,
}

impl PrimaryPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimaryPlatform::Shopify => "shopify",
            PrimaryPlatform::Woocommerce => "woocommerce",
            PrimaryPlatform::Amazon => "amazon",
            PrimaryPlatform::Etsy => "etsy",
            PrimaryPlatform::Custom => "custom",
        }
    }
}

impl FromStr for PrimaryPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shopify" => Ok(PrimaryPlatform::Shopify),
            "woocommerce" => Ok(PrimaryPlatform::Woocommerce),
            "amazon" => Ok(PrimaryPlatform::Amazon),
            "etsy" => Ok(PrimaryPlatform::Etsy),
            "custom" => Ok(PrimaryPlatform::Custom),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

impl fmt::Display for PrimaryPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracking priority for a competitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompetitorPriority {
    Low,
    #[default]
    Med,
    High,
}

impl CompetitorPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompetitorPriority::Low => "low",
            CompetitorPriority::Med => "med",
            CompetitorPriority::High => "high",
        }
    }
}

impl FromStr for CompetitorPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(CompetitorPriority::Low),
            "med" => Ok(CompetitorPriority::Med),
            "high" => Ok(CompetitorPriority::High),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

/// Competitor entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Competitor {
    /// Unique business name, doubles as the entity key
    pub business_name: String,
    pub website_url: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    /// Free-form product categories (not tag slugs)
    pub categories: Vec<String>,
    pub price_range: Option<String>,
    pub instagram_handle: Option<String>,
    pub instagram_followers: Option<i64>,
    pub primary_platform: Option<PrimaryPlatform>,
    /// 0-100 composite intel score
    pub intel_score: Option<i64>,
    pub priority: CompetitorPriority,
    pub watchlist: bool,
    pub notes: Option<String>,
    /// Resolved tag slugs
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Competitor {
    pub fn new(business_name: String) -> Self {
        let now = Utc::now();
        Self {
            business_name,
            website_url: None,
            country: None,
            city: None,
            categories: Vec::new(),
            price_range: None,
            instagram_handle: None,
            instagram_followers: None,
            primary_platform: None,
            intel_score: None,
            priority: CompetitorPriority::Med,
            watchlist: false,
            notes: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
