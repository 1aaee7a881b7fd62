//! SVG charts for a batch of scraped records
//!
//! Charts are plain SVG documents written next to the stored results, so
//! they need nothing beyond a browser to view. A chart whose input has no
//! usable values is skipped rather than drawn empty.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use super::analysis::{log_review_count, RatingGroup};
use crate::domain::product::TrendingProduct;
use crate::infrastructure::config::AnalysisConfig;
use crate::utils::truncate_text;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 500.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 90.0;
const MAX_CATEGORIES: usize = 10;
const BAR_COLOR: &str = "#4c72b0";
const MEAN_COLOR: &str = "#c44e52";
const MEDIAN_COLOR: &str = "#55a868";

/// Minimal SVG document builder with a fixed plot area.
struct Svg {
    body: String,
}

impl Svg {
    fn new(title: &str) -> Self {
        let mut svg = Self {
            body: String::new(),
        };
        svg.text(WIDTH / 2.0, 28.0, title, "middle", 18.0);
        svg.axes();
        svg
    }

    fn plot_width() -> f64 {
        WIDTH - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn plot_height() -> f64 {
        HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
    }

    fn baseline() -> f64 {
        HEIGHT - MARGIN_BOTTOM
    }

    fn axes(&mut self) {
        let bottom = Self::baseline();
        self.line(MARGIN_LEFT, MARGIN_TOP, MARGIN_LEFT, bottom, "#333", None);
        self.line(MARGIN_LEFT, bottom, WIDTH - MARGIN_RIGHT, bottom, "#333", None);
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str) {
        let _ = writeln!(
            self.body,
            r#"<rect x="{x:.1}" y="{y:.1}" width="{w:.1}" height="{h:.1}" fill="{fill}"/>"#
        );
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str, dash: Option<&str>) {
        let dash = dash
            .map(|d| format!(r#" stroke-dasharray="{d}""#))
            .unwrap_or_default();
        let _ = writeln!(
            self.body,
            r#"<line x1="{x1:.1}" y1="{y1:.1}" x2="{x2:.1}" y2="{y2:.1}" stroke="{stroke}" stroke-width="1.5"{dash}/>"#
        );
    }

    fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: &str) {
        let _ = writeln!(
            self.body,
            r#"<circle cx="{cx:.1}" cy="{cy:.1}" r="{r:.1}" fill="{fill}" fill-opacity="0.6"/>"#
        );
    }

    fn text(&mut self, x: f64, y: f64, content: &str, anchor: &str, size: f64) {
        let _ = writeln!(
            self.body,
            r#"<text x="{x:.1}" y="{y:.1}" text-anchor="{anchor}" font-size="{size}" font-family="sans-serif">{}</text>"#,
            escape(content)
        );
    }

    fn rotated_text(&mut self, x: f64, y: f64, content: &str) {
        let _ = writeln!(
            self.body,
            r#"<text x="{x:.1}" y="{y:.1}" text-anchor="end" font-size="11" font-family="sans-serif" transform="rotate(-35 {x:.1} {y:.1})">{}</text>"#,
            escape(content)
        );
    }

    fn x_label(&mut self, label: &str) {
        self.text(WIDTH / 2.0, HEIGHT - 12.0, label, "middle", 13.0);
    }

    fn y_label(&mut self, label: &str) {
        let _ = writeln!(
            self.body,
            r#"<text x="18" y="{y:.1}" text-anchor="middle" font-size="13" font-family="sans-serif" transform="rotate(-90 18 {y:.1})">{}</text>"#,
            escape(label),
            y = MARGIN_TOP + Self::plot_height() / 2.0,
        );
    }

    fn finish(self) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">
<rect width="100%" height="100%" fill="white"/>
{}</svg>
"#,
            self.body
        )
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Bar chart of `(label, value)` pairs scaled to the tallest bar.
fn bar_chart(title: &str, x_label: &str, y_label: &str, bars: &[(String, f64)]) -> String {
    let mut svg = Svg::new(title);
    let max = bars.iter().map(|b| b.1).fold(0.0, f64::max).max(1.0);
    let slot = Svg::plot_width() / bars.len().max(1) as f64;

    for (i, (label, value)) in bars.iter().enumerate() {
        let height = value / max * Svg::plot_height();
        let x = MARGIN_LEFT + slot * i as f64;
        svg.rect(x + slot * 0.1, Svg::baseline() - height, slot * 0.8, height, BAR_COLOR);
        svg.text(x + slot / 2.0, Svg::baseline() - height - 5.0, &format!("{value}"), "middle", 11.0);
        svg.rotated_text(x + slot / 2.0, Svg::baseline() + 15.0, label);
    }

    svg.x_label(x_label);
    svg.y_label(y_label);
    svg.finish()
}

/// Equal-width bin counts over `[min, max]`; the last bin is closed.
pub fn histogram(values: &[f64], bins: usize) -> (f64, f64, Vec<usize>) {
    let bins = bins.max(1);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (low, high) = if max > min { (min, max) } else { (min - 0.5, min + 0.5) };
    let width = (high - low) / bins as f64;

    let mut counts = vec![0; bins];
    for &value in values {
        let index = (((value - low) / width).floor() as usize).min(bins - 1);
        counts[index] += 1;
    }
    (low, high, counts)
}

pub struct ChartRenderer {
    output_dir: PathBuf,
    currency: String,
    bins: usize,
}

impl ChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>, config: &AnalysisConfig) -> Self {
        Self {
            output_dir: output_dir.into(),
            currency: config.currency_symbol.clone(),
            bins: config.histogram_bins,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn write(&self, name: &str, site: &str, svg: String) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Failed to create chart directory {:?}", self.output_dir))?;
        let path = self.output_dir.join(format!("{name}_{site}.svg"));
        fs::write(&path, svg).with_context(|| format!("Failed to write chart {:?}", path))?;
        info!("Saved chart to {:?}", path);
        Ok(path)
    }

    /// Histogram of numeric prices with mean and median markers.
    pub fn price_distribution(&self, products: &[TrendingProduct], site: &str) -> Result<Option<PathBuf>> {
        let mut prices: Vec<f64> = products.iter().filter_map(TrendingProduct::numeric_price).collect();
        if prices.is_empty() {
            warn!("No price data available for price distribution chart");
            return Ok(None);
        }
        prices.sort_by(f64::total_cmp);

        let (low, high, counts) = histogram(&prices, self.bins);
        let tallest = counts.iter().copied().max().unwrap_or(1).max(1) as f64;
        let bin_width = Svg::plot_width() / counts.len() as f64;
        let x_of = |value: f64| MARGIN_LEFT + (value - low) / (high - low) * Svg::plot_width();

        let mut svg = Svg::new(&format!("Price Distribution - {site}"));
        for (i, &count) in counts.iter().enumerate() {
            let height = count as f64 / tallest * Svg::plot_height();
            let x = MARGIN_LEFT + bin_width * i as f64;
            svg.rect(x + 1.0, Svg::baseline() - height, bin_width - 2.0, height, BAR_COLOR);
        }

        let mean = prices.iter().sum::<f64>() / prices.len() as f64;
        let mid = prices.len() / 2;
        let median = if prices.len() % 2 == 0 {
            (prices[mid - 1] + prices[mid]) / 2.0
        } else {
            prices[mid]
        };
        let currency = self.currency.as_str();
        let markers = [
            (mean, MEAN_COLOR, "Mean", 12.0),
            (median, MEDIAN_COLOR, "Median", 28.0),
        ];
        for (value, color, label, offset) in markers {
            let x = x_of(value);
            svg.line(x, MARGIN_TOP, x, Svg::baseline(), color, Some("6 4"));
            svg.text(
                x + 4.0,
                MARGIN_TOP + offset,
                &format!("{label}: {currency}{value:.2}"),
                "start",
                11.0,
            );
        }

        svg.text(MARGIN_LEFT, Svg::baseline() + 18.0, &format!("{currency}{low:.0}"), "middle", 11.0);
        svg.text(WIDTH - MARGIN_RIGHT, Svg::baseline() + 18.0, &format!("{currency}{high:.0}"), "middle", 11.0);
        svg.x_label(&format!("Price ({currency})"));
        svg.y_label("Number of Products");

        self.write("price_distribution", site, svg.finish()).map(Some)
    }

    /// Product count per rating group.
    pub fn rating_distribution(&self, products: &[TrendingProduct], site: &str) -> Result<Option<PathBuf>> {
        let groups: Vec<RatingGroup> = products
            .iter()
            .filter_map(|p| p.rating.and_then(RatingGroup::of))
            .collect();
        if groups.is_empty() {
            warn!("No rating data available for rating chart");
            return Ok(None);
        }

        let bars: Vec<(String, f64)> = RatingGroup::ALL
            .iter()
            .map(|&group| {
                let count = groups.iter().filter(|&&g| g == group).count();
                (group.label().to_string(), count as f64)
            })
            .collect();

        let svg = bar_chart(
            &format!("Rating Distribution - {site}"),
            "Rating Group",
            "Number of Products",
            &bars,
        );
        self.write("rating_distribution", site, svg).map(Some)
    }

    /// Price against rating; marker size grows with log review count.
    pub fn price_rating_scatter(&self, products: &[TrendingProduct], site: &str) -> Result<Option<PathBuf>> {
        let points: Vec<(f64, f64, u64)> = products
            .iter()
            .filter_map(|p| Some((p.numeric_price()?, p.rating?, p.review_count.unwrap_or(0))))
            .collect();
        if points.is_empty() {
            warn!("Insufficient data for price vs rating scatter plot");
            return Ok(None);
        }

        let max_price = points.iter().map(|p| p.0).fold(0.0, f64::max).max(1.0);
        let mut svg = Svg::new(&format!("Price vs. Rating - {site}"));
        for &(price, rating, reviews) in &points {
            let x = MARGIN_LEFT + price / max_price * Svg::plot_width();
            let y = Svg::baseline() - rating.clamp(0.0, 5.0) / 5.0 * Svg::plot_height();
            svg.circle(x, y, 3.0 + 2.0 * log_review_count(reviews), BAR_COLOR);
        }

        for star in 0..=5 {
            let y = Svg::baseline() - f64::from(star) / 5.0 * Svg::plot_height();
            svg.text(MARGIN_LEFT - 8.0, y + 4.0, &star.to_string(), "end", 11.0);
        }
        let currency = self.currency.as_str();
        svg.text(WIDTH - MARGIN_RIGHT, Svg::baseline() + 18.0, &format!("{currency}{max_price:.0}"), "middle", 11.0);
        svg.x_label(&format!("Price ({currency})"));
        svg.y_label("Rating (stars)");

        self.write("price_rating_scatter", site, svg.finish()).map(Some)
    }

    /// The ten most common categories.
    pub fn category_distribution(&self, products: &[TrendingProduct], site: &str) -> Result<Option<PathBuf>> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for category in products.iter().filter_map(|p| p.category.as_deref()) {
            match counts.iter_mut().find(|(name, _)| name == category) {
                Some(entry) => entry.1 += 1,
                None => counts.push((category.to_string(), 1)),
            }
        }
        if counts.is_empty() {
            warn!("No category data available for category chart");
            return Ok(None);
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let bars: Vec<(String, f64)> = counts
            .into_iter()
            .take(MAX_CATEGORIES)
            .map(|(name, count)| (truncate_text(&name, 24), count as f64))
            .collect();

        let svg = bar_chart(
            &format!("Category Distribution - {site}"),
            "Category",
            "Number of Products",
            &bars,
        );
        self.write("category_distribution", site, svg).map(Some)
    }

    /// Render every chart that has data; failures are logged and skipped.
    pub fn generate_all_charts(&self, products: &[TrendingProduct], site: &str) -> Vec<PathBuf> {
        let products: Vec<TrendingProduct> = products
            .iter()
            .filter(|p| !p.is_not_found())
            .cloned()
            .collect();

        let results = [
            ("price distribution", self.price_distribution(&products, site)),
            ("rating distribution", self.rating_distribution(&products, site)),
            ("price vs rating", self.price_rating_scatter(&products, site)),
            ("category distribution", self.category_distribution(&products, site)),
        ];

        let mut written = Vec::new();
        for (chart, result) in results {
            match result {
                Ok(Some(path)) => written.push(path),
                Ok(None) => {}
                Err(e) => error!("Failed to render {} chart: {:#}", chart, e),
            }
        }

        info!("Generated {} charts for {}", written.len(), site);
        written
    }
}
