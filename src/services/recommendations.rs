use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{CoPurchase, Product, Recommendation, RecommendationType},
    services::catalog::ProductCatalog,
};

pub const DEFAULT_LIMIT: usize = 4;
pub const MAX_LIMIT: usize = 20;

const RELATED_CATEGORY_WEIGHT: f64 = 0.4;
const RELATED_TAG_WEIGHT: f64 = 0.6;

const UPSELL_TAG_WEIGHT: f64 = 0.5;
const UPSELL_PRICE_WEIGHT: f64 = 0.5;

const CROSS_SELL_FREQUENCY_WEIGHT: f64 = 0.8;
const CROSS_SELL_COMPLEMENT_WEIGHT: f64 = 0.2;

/// What to recommend and how much of it
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationOptions {
    /// Requested types, in output order
    pub types: Vec<RecommendationType>,
    /// Maximum results per type
    pub limit: usize,
    pub exclude_product_ids: Vec<Uuid>,
}

impl Default for RecommendationOptions {
    fn default() -> Self {
        Self {
            types: RecommendationType::ALL.to_vec(),
            limit: DEFAULT_LIMIT,
            exclude_product_ids: Vec::new(),
        }
    }
}

impl RecommendationOptions {
    /// Drops duplicate types, falls back to all types and clamps the limit
    pub fn normalized(mut self) -> Self {
        let mut seen = HashSet::new();
        self.types.retain(|kind| seen.insert(*kind));
        if self.types.is_empty() {
            self.types = RecommendationType::ALL.to_vec();
        }
        self.limit = self.limit.min(MAX_LIMIT);
        self.exclude_product_ids.sort();
        self.exclude_product_ids.dedup();
        self
    }
}

/// Ranked recommendations and whether every lookup behind them succeeded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub recommendations: Vec<Recommendation>,
    /// False when the source product was missing or a lookup failed.
    /// Incomplete sets are served but never cached.
    pub complete: bool,
}

impl RecommendationSet {
    fn incomplete() -> Self {
        Self {
            recommendations: Vec::new(),
            complete: false,
        }
    }
}

/// Scores catalog products against a source product
///
/// Recommendations are supplementary content, so the engine never fails:
/// a missing source yields nothing and a failing lookup only drops the
/// affected type. Either case marks the set incomplete.
#[derive(Clone)]
pub struct RecommendationEngine {
    catalog: Arc<dyn ProductCatalog>,
}

impl RecommendationEngine {
    pub fn new(catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { catalog }
    }

    /// Builds the ranked lists for every requested type, in request order
    pub async fn recommend(
        &self,
        product_id: Uuid,
        options: &RecommendationOptions,
    ) -> RecommendationSet {
        let source = match self.catalog.get_product(product_id).await {
            Ok(Some(product)) => product,
            Ok(None) => {
                tracing::debug!(product_id = %product_id, "Source product not found");
                return RecommendationSet::incomplete();
            }
            Err(e) => {
                tracing::warn!(product_id = %product_id, error = %e, "Source product lookup failed");
                return RecommendationSet::incomplete();
            }
        };

        let mut exclude = options.exclude_product_ids.clone();
        exclude.push(source.id);

        let mut results = Vec::new();
        let mut complete = true;

        for kind in &options.types {
            match self.scored_candidates(&source, *kind, &exclude).await {
                Ok(candidates) => {
                    let ranked = rank_candidates(&source, *kind, candidates, options);
                    tracing::debug!(
                        product_id = %product_id,
                        kind = %kind,
                        count = ranked.len(),
                        "Ranked recommendations"
                    );
                    results.extend(ranked);
                }
                Err(e) => {
                    complete = false;
                    tracing::warn!(
                        product_id = %product_id,
                        kind = %kind,
                        error = %e,
                        "Candidate lookup failed, skipping recommendation type"
                    );
                }
            }
        }

        RecommendationSet {
            recommendations: results,
            complete,
        }
    }

    /// Fetches the whole candidate pool for one type and scores it
    ///
    /// Pools are not truncated before scoring, so a highly scored product is
    /// never lost behind cheaper or excluded ones.
    async fn scored_candidates(
        &self,
        source: &Product,
        kind: RecommendationType,
        exclude: &[Uuid],
    ) -> AppResult<Vec<(Product, f64)>> {
        let scored = match kind {
            RecommendationType::Related => self
                .catalog
                .products_in_category(&source.category, exclude)
                .await?
                .into_iter()
                .map(|candidate| {
                    let score = related_score(source, &candidate);
                    (candidate, score)
                })
                .collect(),
            RecommendationType::Upsell => self
                .catalog
                .products_priced_above(&source.category, source.price_cents, exclude)
                .await?
                .into_iter()
                .filter_map(|candidate| {
                    upsell_score(source, &candidate).map(|score| (candidate, score))
                })
                .collect(),
            RecommendationType::CrossSell => {
                let pool = self.catalog.co_purchased(source.id, exclude).await?;
                cross_sell_scores(source, pool)
            }
        };

        Ok(scored)
    }
}

/// Filters, deduplicates, orders and truncates a scored pool
///
/// Ordering is score descending with ties broken by product id ascending, so
/// the same pool always produces the same list.
pub fn rank_candidates(
    source: &Product,
    kind: RecommendationType,
    candidates: Vec<(Product, f64)>,
    options: &RecommendationOptions,
) -> Vec<Recommendation> {
    let excluded: HashSet<Uuid> = options.exclude_product_ids.iter().copied().collect();

    let mut best: HashMap<Uuid, (Product, f64)> = HashMap::new();
    for (product, score) in candidates {
        if product.id == source.id || excluded.contains(&product.id) || !product.is_active {
            continue;
        }
        let score = round_score(score);
        let improves = best
            .get(&product.id)
            .map_or(true, |(_, existing)| score > *existing);
        if improves {
            best.insert(product.id, (product, score));
        }
    }

    let mut ranked: Vec<(Product, f64)> = best.into_values().collect();
    ranked.sort_by(|(a, a_score), (b, b_score)| {
        b_score.total_cmp(a_score).then_with(|| a.id.cmp(&b.id))
    });
    ranked.truncate(options.limit);

    ranked
        .into_iter()
        .map(|(product, score)| Recommendation {
            product,
            score,
            source: kind.source(),
            kind,
        })
        .collect()
}

/// Similarity within a category: a base for the shared category plus tag overlap
pub fn related_score(source: &Product, candidate: &Product) -> f64 {
    let category = if source.category.eq_ignore_ascii_case(&candidate.category) {
        RELATED_CATEGORY_WEIGHT
    } else {
        0.0
    };
    category + RELATED_TAG_WEIGHT * tag_similarity(&source.tags, &candidate.tags)
}

/// Favours similar products one small price step above the source
///
/// Returns `None` for candidates that are not strictly pricier.
pub fn upsell_score(source: &Product, candidate: &Product) -> Option<f64> {
    if candidate.price_cents <= source.price_cents {
        return None;
    }
    let proximity = if source.price_cents > 0 {
        source.price_cents as f64 / candidate.price_cents as f64
    } else {
        0.0
    };
    Some(
        UPSELL_TAG_WEIGHT * tag_similarity(&source.tags, &candidate.tags)
            + UPSELL_PRICE_WEIGHT * proximity,
    )
}

/// Scores co-purchased products by relative frequency, preferring other categories
pub fn cross_sell_scores(source: &Product, pool: Vec<CoPurchase>) -> Vec<(Product, f64)> {
    let max_times = pool.iter().map(|c| c.times).max().unwrap_or(0);
    if max_times <= 0 {
        return Vec::new();
    }

    pool.into_iter()
        .filter(|c| c.times > 0)
        .map(|c| {
            let frequency = c.times as f64 / max_times as f64;
            let complement = if source.category.eq_ignore_ascii_case(&c.product.category) {
                0.0
            } else {
                1.0
            };
            let score = CROSS_SELL_FREQUENCY_WEIGHT * frequency
                + CROSS_SELL_COMPLEMENT_WEIGHT * complement;
            (c.product, score)
        })
        .collect()
}

/// Jaccard index over case-insensitive tag sets; 0 when both are empty
pub fn tag_similarity(a: &[String], b: &[String]) -> f64 {
    let a: HashSet<String> = a.iter().map(|t| t.to_lowercase()).collect();
    let b: HashSet<String> = b.iter().map(|t| t.to_lowercase()).collect();

    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

fn round_score(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}
