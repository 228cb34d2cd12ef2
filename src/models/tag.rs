//! Tag model
//!
//! Tags are the shared vocabulary across competitors, vendors, wishlist
//! items and master products. A tag is identified by its immutable slug;
//! the display name, category and status are editable, and any number of
//! aliases can point at the same slug.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Curated tag category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TagCategory {
    Material,
    Motif,
    Style,
    Occasion,
    Color,
    Technique,
    Region,
    Trend,
    PriceBand,
    #[default]
    Other,
}

impl TagCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagCategory::Material => "material",
            TagCategory::Motif => "motif",
            TagCategory::Style => "style",
            TagCategory::Occasion => "occasion",
            TagCategory::Color => "color",
            TagCategory::Technique => "technique",
            TagCategory::Region => "region",
            TagCategory::Trend => "trend",
            TagCategory::PriceBand => "price-band",
            TagCategory::Other => "other",
        }
    }
}

impl FromStr for TagCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "material" => Ok(TagCategory::Material),
            "motif" => Ok(TagCategory::Motif),
            "style" => Ok(TagCategory::Style),
            "occasion" => Ok(TagCategory::Occasion),
            "color" => Ok(TagCategory::Color),
            "technique" => Ok(TagCategory::Technique),
            "region" => Ok(TagCategory::Region),
            "trend" => Ok(TagCategory::Trend),
            "price-band" => Ok(TagCategory::PriceBand),
            "other" => Ok(TagCategory::Other),
            other => Err(format!("unknown tag category: {}", other)),
        }
    }
}

impl fmt::Display for TagCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag lifecycle status.
///
/// Auto-created tags start as `draft` until an operator promotes them.
/// `deprecated` tags are hidden from suggestions but keep their history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TagStatus {
    #[default]
    Draft,
    Active,
    Deprecated,
}

impl TagStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagStatus::Draft => "draft",
            TagStatus::Active => "active",
            TagStatus::Deprecated => "deprecated",
        }
    }
}

impl FromStr for TagStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(TagStatus::Draft),
            "active" => Ok(TagStatus::Active),
            "deprecated" => Ok(TagStatus::Deprecated),
            other => Err(format!("unknown tag status: {}", other)),
        }
    }
}

impl fmt::Display for TagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of entity a tag can be assigned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityType {
    Competitor,
    Vendor,
    Wishlist,
    MasterProduct,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Competitor => "competitor",
            EntityType::Vendor => "vendor",
            EntityType::Wishlist => "wishlist",
            EntityType::MasterProduct => "master-product",
        }
    }

}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "competitor" => Ok(EntityType::Competitor),
            "vendor" => Ok(EntityType::Vendor),
            "wishlist" => Ok(EntityType::Wishlist),
            "master-product" => Ok(EntityType::MasterProduct),
            other => Err(format!("unknown entity type: {}", other)),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    /// Immutable, URL-friendly identifier
    pub slug: String,
    /// Editable display name
    pub display_name: String,
    /// Curated category
    pub category: TagCategory,
    /// Lifecycle status
    pub status: TagStatus,
    /// Alternative spellings that resolve to this tag
    pub aliases: Vec<String>,
    /// Optional free-form description
    pub description: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Tag {
    /// Create a new draft tag with the given slug and display name.
    pub fn new(slug: String, display_name: String) -> Self {
        let now = Utc::now();
        Self {
            slug,
            display_name,
            category: TagCategory::Other,
            status: TagStatus::Draft,
            aliases: Vec::new(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Tag with its assignment count, for listings and suggestions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagSummary {
    /// The tag itself
    #[serde(flatten)]
    pub tag: Tag,
    /// Number of entities the tag is assigned to
    pub usage_count: i64,
}

impl TagSummary {
    pub fn new(tag: Tag, usage_count: i64) -> Self {
        Self { tag, usage_count }
    }
}

/// Usage-count row for the stats endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TagUsage {
    pub slug: String,
    pub display_name: String,
    pub count: i64,
}

/// Distinct-tag count per category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TagCategoryCount {
    pub category: TagCategory,
    pub count: i64,
}

/// Outcome of merging one tag into another
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagMergeResult {
    /// The surviving tag, after absorbing the source
    pub target: Tag,
    /// Slug of the removed source tag
    pub source: String,
    /// Entities rewritten per entity type
    pub updated_counts: BTreeMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_new_defaults() {
        let tag = Tag::new("oxidised-silver".to_string(), "Oxidised Silver".to_string());

        assert_eq!(tag.slug, "oxidised-silver");
        assert_eq!(tag.display_name, "Oxidised Silver");
        assert_eq!(tag.category, TagCategory::Other);
        assert_eq!(tag.status, TagStatus::Draft);
        assert!(tag.aliases.is_empty());
    }

    #[test]
    fn test_category_roundtrip() {
        for s in [
            "material",
            "motif",
            "style",
            "occasion",
            "color",
            "technique",
            "region",
            "trend",
            "price-band",
            "other",
        ] {
            let category: TagCategory = s.parse().unwrap();
            assert_eq!(category.as_str(), s);
        }
        assert!("gemstone".parse::<TagCategory>().is_err());
    }

    #[test]
    fn test_entity_type_serde_kebab_case() {
        let json = serde_json::to_string(&EntityType::MasterProduct).unwrap();
        assert_eq!(json, "\"master-product\"");
        let parsed: EntityType = serde_json::from_str("\"master-product\"").unwrap();
        assert_eq!(parsed, EntityType::MasterProduct);
    }

    #[test]
    fn test_tag_summary_flattens_tag() {
        let tag = Tag::new("enamel".to_string(), "Enamel".to_string());
        let summary = TagSummary::new(tag, 7);
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["slug"], "enamel");
        assert_eq!(value["usage_count"], 7);
    }
}
