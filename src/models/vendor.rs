//! Vendor model
//!
//! Vendors are sourcing partners, keyed by a generated UUID. Names are
//! unique case-insensitively; phone numbers are normalized to their last
//! ten digits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Vendor entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vendor {
    pub vendor_id: String,
    pub name: String,
    pub website_url: Option<String>,
    pub whatsapp_link: Option<String>,
    pub email: Option<String>,
    /// Normalized 10-digit phone number
    pub phone: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub catalog_urls: Vec<String>,
    pub lead_time_days: Option<i64>,
    /// Minimum order quantity
    pub moq_units: Option<i64>,
    pub payment_terms: Option<String>,
    /// 1-5 rating
    pub rating: Option<i64>,
    /// Resolved tag slugs
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vendor {
    pub fn new(name: String) -> Self {
        let now = Utc::now();
        Self {
            vendor_id: Uuid::new_v4().to_string(),
            name,
            website_url: None,
            whatsapp_link: None,
            email: None,
            phone: None,
            city: None,
            country: None,
            catalog_urls: Vec::new(),
            lead_time_days: None,
            moq_units: None,
            payment_terms: None,
            rating: None,
            tags: Vec::new(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_new_generates_id() {
        let a = Vendor::new("Gem Source".to_string());
        let b = Vendor::new("Gem Source".to_string());
        assert_ne!(a.vendor_id, b.vendor_id);
        assert_eq!(a.name, "Gem Source");
        assert!(a.tags.is_empty());
    }
}
