use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use super::Product;

/// Which question a recommendation list answers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendationType {
    /// Similar products from the same category
    Related,
    /// Complementary products bought together with the source
    CrossSell,
    /// Pricier alternatives in the same category
    Upsell,
}

impl RecommendationType {
    /// All types, in the order they are returned when none are requested
    pub const ALL: [RecommendationType; 3] = [
        RecommendationType::Related,
        RecommendationType::CrossSell,
        RecommendationType::Upsell,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationType::Related => "related",
            RecommendationType::CrossSell => "cross-sell",
            RecommendationType::Upsell => "upsell",
        }
    }

    /// The signal a list of this type is built from
    pub fn source(&self) -> RecommendationSource {
        match self {
            RecommendationType::Related => RecommendationSource::Category,
            RecommendationType::CrossSell => RecommendationSource::CoPurchase,
            RecommendationType::Upsell => RecommendationSource::PriceTier,
        }
    }
}

impl Display for RecommendationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecommendationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "related" => Ok(RecommendationType::Related),
            "cross-sell" | "cross_sell" | "crosssell" => Ok(RecommendationType::CrossSell),
            "upsell" => Ok(RecommendationType::Upsell),
            other => Err(format!("unknown recommendation type: {}", other)),
        }
    }
}

/// Provenance label attached to each recommendation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Category,
    CoPurchase,
    PriceTier,
}

/// A scored candidate product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub product: Product,
    pub score: f64,
    pub source: RecommendationSource,
    #[serde(rename = "type")]
    pub kind: RecommendationType,
}
