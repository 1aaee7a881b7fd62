//! Descriptive statistics over scraped records
//!
//! Everything here is computed from the records alone: price distribution,
//! rating groups, review volume, categories and a few ranked lists. The
//! placeholder record emitted when a site yields nothing is not a product
//! and is left out of every statistic.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::product::TrendingProduct;
use crate::infrastructure::config::AnalysisConfig;
use crate::infrastructure::product_repository::ProductRepository;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("no products available for analysis")]
    NoProducts,

    #[error("need at least two sites for comparison, got {given}")]
    TooFewSites { given: usize },

    #[error("not enough stored data for comparison ({with_data} site(s) with data)")]
    InsufficientData { with_data: usize },
}

/// Star rating bucket. The first bucket is closed on both ends, the others
/// are right-closed: `[0,2]`, `(2,3]`, `(3,4]`, `(4,5]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RatingGroup {
    #[serde(rename = "0-2 ★")]
    UpToTwo,
    #[serde(rename = "2-3 ★")]
    TwoToThree,
    #[serde(rename = "3-4 ★")]
    ThreeToFour,
    #[serde(rename = "4-5 ★")]
    FourToFive,
}

impl RatingGroup {
    pub const ALL: [RatingGroup; 4] = [
        RatingGroup::UpToTwo,
        RatingGroup::TwoToThree,
        RatingGroup::ThreeToFour,
        RatingGroup::FourToFive,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RatingGroup::UpToTwo => "0-2 ★",
            RatingGroup::TwoToThree => "2-3 ★",
            RatingGroup::ThreeToFour => "3-4 ★",
            RatingGroup::FourToFive => "4-5 ★",
        }
    }

    /// `None` for ratings outside `0..=5`.
    pub fn of(rating: f64) -> Option<Self> {
        match rating {
            r if (0.0..=2.0).contains(&r) => Some(RatingGroup::UpToTwo),
            r if r > 2.0 && r <= 3.0 => Some(RatingGroup::TwoToThree),
            r if r > 3.0 && r <= 4.0 => Some(RatingGroup::ThreeToFour),
            r if r > 4.0 && r <= 5.0 => Some(RatingGroup::FourToFive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceStats {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation; absent with a single price
    pub std_dev: Option<f64>,
    /// 25th, 50th and 75th percentiles, linearly interpolated
    pub quartiles: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingStats {
    pub mean: f64,
    pub median: f64,
    /// Count per group, in group order
    pub distribution: Vec<(RatingGroup, usize)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewStats {
    pub total: u64,
    pub mean: f64,
    pub median: f64,
    pub max: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub distinct: usize,
    /// Most common first; ties in name order
    pub distribution: Vec<(String, usize)>,
}

/// Price bands derived from the quartiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRanges {
    pub budget: (f64, f64),
    pub mid_range: (f64, f64),
    pub premium: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopEntry {
    pub title: String,
    pub price: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
    pub value_score: Option<f64>,
}

impl TopEntry {
    fn from_product(product: &TrendingProduct) -> Self {
        Self {
            title: product.title.clone(),
            price: product.price.clone(),
            rating: product.rating,
            review_count: product.review_count,
            value_score: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopProducts {
    pub highest_rated: Vec<TopEntry>,
    pub most_reviewed: Vec<TopEntry>,
    /// High rating at a low price, scored by
    /// `rating percentile * (1 - price percentile)`
    pub best_value: Vec<TopEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeRange {
    pub first: DateTime<Utc>,
    pub last: DateTime<Utc>,
    pub unique_dates: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub product_count: usize,
    pub source: String,
    pub analysis_time: DateTime<Utc>,
    pub price: Option<PriceStats>,
    pub rating: Option<RatingStats>,
    pub reviews: Option<ReviewStats>,
    pub categories: Option<CategoryStats>,
    pub price_ranges: Option<PriceRanges>,
    pub top_products: TopProducts,
    /// Only present when the records span more than one calendar date
    pub time_range: Option<TimeRange>,
}

/// Per-site row of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteMetrics {
    pub site: String,
    pub product_count: usize,
    pub mean_price: Option<f64>,
    pub median_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub mean_rating: Option<f64>,
    pub median_rating: Option<f64>,
}

impl SiteMetrics {
    fn from_report(site: &str, report: &AnalysisReport) -> Self {
        Self {
            site: site.to_string(),
            product_count: report.product_count,
            mean_price: report.price.as_ref().map(|p| p.mean),
            median_price: report.price.as_ref().map(|p| p.median),
            min_price: report.price.as_ref().map(|p| p.min),
            max_price: report.price.as_ref().map(|p| p.max),
            mean_rating: report.rating.as_ref().map(|r| r.mean),
            median_rating: report.rating.as_ref().map(|r| r.median),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteComparison {
    pub generated_at: DateTime<Utc>,
    /// Sites with data, in the order they were requested
    pub metrics: Vec<SiteMetrics>,
    /// Requested sites without stored data
    pub missing: Vec<String>,
    pub insights: Vec<String>,
}

pub struct ProductAnalyzer {
    repository: ProductRepository,
    config: AnalysisConfig,
}

impl ProductAnalyzer {
    pub fn new(repository: ProductRepository, config: AnalysisConfig) -> Self {
        info!("ProductAnalyzer initialized");
        Self { repository, config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze the most recent stored run of `site`.
    pub fn analyze_latest(&self, site: &str) -> anyhow::Result<AnalysisReport> {
        let products = self.repository.load_latest_products(site)?;
        Ok(self.analyze_products(&products, Some(site))?)
    }

    pub fn analyze_products(
        &self,
        products: &[TrendingProduct],
        site: Option<&str>,
    ) -> Result<AnalysisReport, AnalysisError> {
        let products: Vec<&TrendingProduct> =
            products.iter().filter(|p| !p.is_not_found()).collect();
        if products.is_empty() {
            warn!("No products available for analysis");
            return Err(AnalysisError::NoProducts);
        }
        info!("Analyzing {} products", products.len());

        let source = site
            .map(str::to_string)
            .unwrap_or_else(|| products[0].source.clone());

        let prices: Vec<f64> = products.iter().filter_map(|p| p.numeric_price()).collect();
        let ratings: Vec<f64> = products.iter().filter_map(|p| p.rating).collect();
        let reviews: Vec<u64> = products.iter().filter_map(|p| p.review_count).collect();

        let price = price_stats(&prices);
        let price_ranges = price.as_ref().map(|p| PriceRanges {
            budget: (0.0, p.quartiles[0]),
            mid_range: (p.quartiles[0], p.quartiles[2]),
            premium: (p.quartiles[2], p.max),
        });

        let report = AnalysisReport {
            product_count: products.len(),
            source,
            analysis_time: Utc::now(),
            price,
            rating: rating_stats(&ratings),
            reviews: review_stats(&reviews),
            categories: category_stats(&products),
            price_ranges,
            top_products: self.top_products(&products),
            time_range: time_range(&products),
        };

        debug!(
            priced = prices.len(),
            rated = ratings.len(),
            "Analysis complete"
        );
        Ok(report)
    }

    fn top_products(&self, products: &[&TrendingProduct]) -> TopProducts {
        let n = self.config.top_n;

        let mut rated: Vec<&TrendingProduct> =
            products.iter().copied().filter(|p| p.rating.is_some()).collect();
        rated.sort_by(|a, b| b.rating.unwrap_or(0.0).total_cmp(&a.rating.unwrap_or(0.0)));

        let mut reviewed: Vec<&TrendingProduct> = products
            .iter()
            .copied()
            .filter(|p| p.review_count.is_some())
            .collect();
        reviewed.sort_by_key(|p| std::cmp::Reverse(p.review_count.unwrap_or(0)));

        TopProducts {
            highest_rated: rated.into_iter().take(n).map(TopEntry::from_product).collect(),
            most_reviewed: reviewed.into_iter().take(n).map(TopEntry::from_product).collect(),
            best_value: best_value(products, n),
        }
    }

    /// Human-readable summary lines for a report.
    pub fn generate_insights(&self, report: &AnalysisReport) -> Vec<String> {
        let currency = self.config.currency_symbol.as_str();
        let mut insights = vec![format!(
            "Analysis based on {} products from {}.",
            report.product_count, report.source
        )];

        if let Some(price) = &report.price {
            insights.push(format!("Average product price is {currency}{:.2}.", price.mean));
            if price.max > price.min {
                insights.push(format!(
                    "Price range spans {currency}{:.2} to {currency}{:.2}.",
                    price.min, price.max
                ));
            }
        }

        if let Some(rating) = &report.rating {
            insights.push(format!("Average product rating is {:.1}/5.0 stars.", rating.mean));
            if let Some((group, _)) = most_common(&rating.distribution) {
                insights.push(format!("Most products fall in the {} rating range.", group.label()));
            }
        }

        if let Some(reviews) = &report.reviews {
            if reviews.total > 0 {
                insights.push(format!(
                    "Products have accumulated a total of {} reviews.",
                    reviews.total
                ));
                insights.push(format!("Products average {:.0} reviews each.", reviews.mean));
            }
        }

        if let Some(categories) = &report.categories {
            insights.push(format!(
                "Products span {} different categories.",
                categories.distinct
            ));
            if let Some((name, count)) = categories.distribution.first() {
                insights.push(format!(
                    "The most common category is '{name}' with {count} products."
                ));
            }
        }

        if let Some(top) = report.top_products.best_value.first() {
            insights.push(format!(
                "Best value for money: '{}' with a {:.1} rating.",
                top.title,
                top.rating.unwrap_or(0.0)
            ));
        }

        if let Some(ranges) = &report.price_ranges {
            let (low, high) = ranges.mid_range;
            if high > low {
                insights.push(format!(
                    "Recommended mid-range products fall between {currency}{low:.2} and {currency}{high:.2}."
                ));
            }
        }

        info!("Generated {} insights", insights.len());
        insights
    }

    /// Compare the latest stored run of each site.
    pub fn compare_sites(&self, sites: &[&str]) -> Result<SiteComparison, AnalysisError> {
        if sites.len() < 2 {
            warn!("Need at least two sites for comparison");
            return Err(AnalysisError::TooFewSites { given: sites.len() });
        }
        info!("Comparing data across {} sites", sites.len());

        let mut metrics = Vec::new();
        let mut missing = Vec::new();
        for &site in sites {
            let products = match self.repository.load_latest_products(site) {
                Ok(products) => products,
                Err(e) => {
                    warn!("Could not load stored results for {}: {:#}", site, e);
                    Vec::new()
                }
            };

            match self.analyze_products(&products, Some(site)) {
                Ok(report) => metrics.push(SiteMetrics::from_report(site, &report)),
                Err(_) => {
                    warn!("No products found for site: {}", site);
                    missing.push(site.to_string());
                }
            }
        }

        if metrics.len() < 2 {
            return Err(AnalysisError::InsufficientData {
                with_data: metrics.len(),
            });
        }

        let insights = self.comparison_insights(&metrics);
        Ok(SiteComparison {
            generated_at: Utc::now(),
            metrics,
            missing,
            insights,
        })
    }

    fn comparison_insights(&self, metrics: &[SiteMetrics]) -> Vec<String> {
        let currency = self.config.currency_symbol.as_str();
        let mut insights = Vec::new();

        if let Some(top) = max_by_first(metrics.iter().map(|m| (m, m.product_count as f64))) {
            insights.push(format!("{} has the most products ({}).", top.site, top.product_count));
        }

        let prices: Vec<(&SiteMetrics, f64)> = metrics
            .iter()
            .filter_map(|m| m.mean_price.map(|p| (m, p)))
            .collect();
        if prices.len() >= 2 {
            if let Some((low, price)) = min_by_first(prices.iter().copied()) {
                insights.push(format!(
                    "{} has the lowest average price ({currency}{price:.2}).",
                    low.site
                ));
            }
            if let Some((high, price)) = max_pair(prices.iter().copied()) {
                insights.push(format!(
                    "{} has the highest average price ({currency}{price:.2}).",
                    high.site
                ));
            }
        }

        let ratings: Vec<(&SiteMetrics, f64)> = metrics
            .iter()
            .filter_map(|m| m.mean_rating.map(|r| (m, r)))
            .collect();
        if ratings.len() >= 2 {
            if let Some((high, rating)) = max_pair(ratings.iter().copied()) {
                insights.push(format!(
                    "{} has the highest average rating ({rating:.1}/5.0).",
                    high.site
                ));
            }
            if let Some((low, rating)) = min_by_first(ratings.iter().copied()) {
                insights.push(format!(
                    "{} has the lowest average rating ({rating:.1}/5.0).",
                    low.site
                ));
            }
        }

        insights
    }
}

fn max_pair<'a>(
    items: impl Iterator<Item = (&'a SiteMetrics, f64)>,
) -> Option<(&'a SiteMetrics, f64)> {
    items.fold(None, |best, (m, v)| match best {
        Some((_, b)) if b >= v => best,
        _ => Some((m, v)),
    })
}

fn max_by_first<'a>(items: impl Iterator<Item = (&'a SiteMetrics, f64)>) -> Option<&'a SiteMetrics> {
    max_pair(items).map(|(m, _)| m)
}

fn min_by_first<'a>(
    items: impl Iterator<Item = (&'a SiteMetrics, f64)>,
) -> Option<(&'a SiteMetrics, f64)> {
    items.fold(None, |best, (m, v)| match best {
        Some((_, b)) if b <= v => best,
        _ => Some((m, v)),
    })
}

/// First entry with the highest count; `None` when every count is zero.
fn most_common<T: Copy>(distribution: &[(T, usize)]) -> Option<(T, usize)> {
    distribution
        .iter()
        .copied()
        .fold(None, |best, (key, count)| match best {
            Some((_, b)) if b >= count => best,
            _ if count == 0 => best,
            _ => Some((key, count)),
        })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Linear interpolation between closest ranks; `sorted` must be non-empty.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

fn price_stats(prices: &[f64]) -> Option<PriceStats> {
    if prices.is_empty() {
        return None;
    }
    let sorted = sorted(prices);
    Some(PriceStats {
        mean: mean(prices),
        median: quantile(&sorted, 0.5),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        std_dev: sample_std_dev(prices),
        quartiles: [
            quantile(&sorted, 0.25),
            quantile(&sorted, 0.5),
            quantile(&sorted, 0.75),
        ],
    })
}

fn rating_stats(ratings: &[f64]) -> Option<RatingStats> {
    if ratings.is_empty() {
        return None;
    }
    let distribution = RatingGroup::ALL
        .iter()
        .map(|&group| {
            let count = ratings
                .iter()
                .filter(|&&r| RatingGroup::of(r) == Some(group))
                .count();
            (group, count)
        })
        .collect();

    Some(RatingStats {
        mean: mean(ratings),
        median: quantile(&sorted(ratings), 0.5),
        distribution,
    })
}

fn review_stats(reviews: &[u64]) -> Option<ReviewStats> {
    let max = reviews.iter().copied().max()?;
    let as_f64: Vec<f64> = reviews.iter().map(|&r| r as f64).collect();
    Some(ReviewStats {
        total: reviews.iter().sum(),
        mean: mean(&as_f64),
        median: quantile(&sorted(&as_f64), 0.5),
        max,
    })
}

fn category_stats(products: &[&TrendingProduct]) -> Option<CategoryStats> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for category in products.iter().filter_map(|p| p.category.as_deref()) {
        *counts.entry(category).or_default() += 1;
    }
    if counts.is_empty() {
        return None;
    }

    let mut distribution: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    distribution.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    Some(CategoryStats {
        distinct: distribution.len(),
        distribution,
    })
}

/// Fractional ranks in `(0, 1]`; tied values share their average rank.
fn percentile_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let mut end = start;
        while end + 1 < n && values[order[end + 1]] == values[order[start]] {
            end += 1;
        }
        let average_rank = (start + end) as f64 / 2.0 + 1.0;
        for &index in &order[start..=end] {
            ranks[index] = average_rank / n as f64;
        }
        start = end + 1;
    }
    ranks
}

fn best_value(products: &[&TrendingProduct], n: usize) -> Vec<TopEntry> {
    let candidates: Vec<(&TrendingProduct, f64, f64)> = products
        .iter()
        .filter_map(|p| Some((*p, p.rating?, p.numeric_price()?)))
        .collect();
    if candidates.is_empty() {
        return Vec::new();
    }

    let ratings: Vec<f64> = candidates.iter().map(|c| c.1).collect();
    let prices: Vec<f64> = candidates.iter().map(|c| c.2).collect();
    let rating_pct = percentile_ranks(&ratings);
    let price_pct = percentile_ranks(&prices);

    let mut scored: Vec<(&TrendingProduct, f64)> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| (c.0, rating_pct[i] * (1.0 - price_pct[i])))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    scored
        .into_iter()
        .take(n)
        .map(|(product, score)| TopEntry {
            value_score: Some(score),
            ..TopEntry::from_product(product)
        })
        .collect()
}

fn time_range(products: &[&TrendingProduct]) -> Option<TimeRange> {
    let times: Vec<DateTime<Utc>> = products.iter().map(|p| p.extracted_at()).collect();
    let unique_dates = times
        .iter()
        .map(|t| t.date_naive())
        .collect::<BTreeSet<_>>()
        .len();
    if unique_dates < 2 {
        return None;
    }
    Some(TimeRange {
        first: times.iter().copied().min()?,
        last: times.iter().copied().max()?,
        unique_dates,
    })
}

/// Base-10 logarithm of a review count, with counts below one clipped to one.
pub fn log_review_count(count: u64) -> f64 {
    (count.max(1) as f64).log10()
}
