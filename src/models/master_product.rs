//! Master product model
//!
//! Master products are the internal catalog entries wishlist items get
//! promoted into once sourced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Master product entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MasterProduct {
    pub product_id: String,
    pub name: String,
    pub description: Option<String>,
    pub product_type: Option<String>,
    pub metal: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MasterProduct {
    pub fn new(name: String) -> Self {
        let now = Utc::now();
        Self {
            product_id: Uuid::new_v4().to_string(),
            name,
            description: None,
            product_type: None,
            metal: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_master_product_new() {
        let product = MasterProduct::new("Kundan choker".to_string());
        assert_eq!(product.name, "Kundan choker");
        assert!(!product.product_id.is_empty());
    }
}
