//! File-based storage of scrape results
//!
//! Each run is one pretty-printed JSON array named
//! `{site}_trending_{YYYYmmdd_HHMMSS}.json` inside the data directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::product::TrendingProduct;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const FILE_MARKER: &str = "_trending_";

#[derive(Debug, Clone)]
pub struct ProductRepository {
    data_dir: PathBuf,
}

/// Flat row written by [`ProductRepository::export_to_csv`].
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    rank: u32,
    title: &'a str,
    url: &'a str,
    price: Option<&'a str>,
    numeric_price: Option<f64>,
    rating: Option<f64>,
    review_count: Option<u64>,
    image_url: Option<&'a str>,
    category: Option<&'a str>,
    availability: Option<&'a str>,
    description: Option<&'a str>,
    features: String,
    seller: Option<&'a str>,
    discount_percentage: Option<u32>,
    source: &'a str,
    extracted_at: String,
}

impl<'a> From<&'a TrendingProduct> for CsvRow<'a> {
    fn from(p: &'a TrendingProduct) -> Self {
        Self {
            rank: p.rank,
            title: &p.title,
            url: &p.url,
            price: p.price.as_deref(),
            numeric_price: p.numeric_price(),
            rating: p.rating,
            review_count: p.review_count,
            image_url: p.image_url.as_deref(),
            category: p.category.as_deref(),
            availability: p.availability.as_deref(),
            description: p.description.as_deref(),
            features: p.features.join("; "),
            seller: p.seller.as_deref(),
            discount_percentage: p.discount_percentage,
            source: &p.source,
            extracted_at: p.extracted_at().to_rfc3339(),
        }
    }
}

impl ProductRepository {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Write one run's records; returns the file written.
    pub fn save_products(&self, products: &[TrendingProduct], site: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", self.data_dir))?;

        let file_name = format!(
            "{site}{FILE_MARKER}{}.json",
            Local::now().format(TIMESTAMP_FORMAT)
        );
        let path = self.data_dir.join(file_name);

        let json = serde_json::to_string_pretty(products).context("Failed to serialize products")?;
        fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))?;

        info!("Saved {} products to {:?}", products.len(), path);
        Ok(path)
    }

    pub fn load_products(&self, path: &Path) -> Result<Vec<TrendingProduct>> {
        let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let products: Vec<TrendingProduct> =
            serde_json::from_str(&raw).with_context(|| format!("Malformed product file {:?}", path))?;
        debug!("Loaded {} products from {:?}", products.len(), path);
        Ok(products)
    }

    /// Result files, optionally restricted to one site, with their mtimes.
    fn result_files(&self, site: Option<&str>) -> Result<Vec<(PathBuf, SystemTime)>> {
        if !self.data_dir.exists() {
            return Ok(Vec::new());
        }

        let prefix = site.map(|s| format!("{s}{FILE_MARKER}"));
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.data_dir)
            .with_context(|| format!("Failed to list {:?}", self.data_dir))?
        {
            let entry = entry?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let matches = name.ends_with(".json")
                && match &prefix {
                    Some(prefix) => name.starts_with(prefix.as_str()),
                    None => name.contains(FILE_MARKER),
                };
            if !matches || !path.is_file() {
                continue;
            }

            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((path, modified));
        }

        Ok(files)
    }

    /// Most recently modified result file of `site`; the timestamp in the
    /// name breaks ties.
    pub fn get_latest_file(&self, site: &str) -> Result<Option<PathBuf>> {
        let latest = self
            .result_files(Some(site))?
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
            .map(|(path, _)| path);
        Ok(latest)
    }

    /// Records of the latest run, or an empty list when nothing is stored.
    pub fn load_latest_products(&self, site: &str) -> Result<Vec<TrendingProduct>> {
        match self.get_latest_file(site)? {
            Some(path) => self.load_products(&path),
            None => {
                warn!("No stored results for {}", site);
                Ok(Vec::new())
            }
        }
    }

    /// Every stored run (of one site, or all sites) concatenated in file name
    /// order. Unreadable files are skipped.
    pub fn load_and_combine_all(&self, site: Option<&str>) -> Result<Vec<TrendingProduct>> {
        let mut files = self.result_files(site)?;
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let mut combined = Vec::new();
        for (path, _) in files {
            match self.load_products(&path) {
                Ok(products) => combined.extend(products),
                Err(e) => warn!("Skipping {:?}: {:#}", path, e),
            }
        }
        Ok(combined)
    }

    /// Write records as CSV; defaults to `products_export_{ts}.csv` in the
    /// data directory.
    pub fn export_to_csv(&self, products: &[TrendingProduct], path: Option<&Path>) -> Result<PathBuf> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                fs::create_dir_all(&self.data_dir)
                    .with_context(|| format!("Failed to create data directory {:?}", self.data_dir))?;
                self.data_dir.join(format!(
                    "products_export_{}.csv",
                    Local::now().format(TIMESTAMP_FORMAT)
                ))
            }
        };

        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Failed to create CSV file {:?}", path))?;
        for product in products {
            writer.serialize(CsvRow::from(product))?;
        }
        writer.flush()?;

        info!("Exported {} products to {:?}", products.len(), path);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(title: &str, rank: u32) -> TrendingProduct {
        let mut product = TrendingProduct::new(title, format!("https://www.daraz.np/products/{rank}"), "daraz.np", rank);
        product.price = Some("Rs. 1,250".into());
        product.features = vec!["Waterproof body".into(), "Two year warranty".into()];
        product
    }

    #[test]
    fn save_then_load_latest() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ProductRepository::new(dir.path());

        let path = repo.save_products(&[sample("Kettle", 1), sample("Iron", 2)], "daraz_np").unwrap();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("daraz_np_trending_"));
        assert!(name.ends_with(".json"));

        let loaded = repo.load_latest_products("daraz_np").unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].title, "Iron");
        assert!(repo.load_latest_products("amazon_in").unwrap().is_empty());
    }

    #[test]
    fn latest_file_and_combination() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ProductRepository::new(dir.path());

        let older = dir.path().join("daraz_np_trending_20240101_000000.json");
        let newer = dir.path().join("daraz_np_trending_20240102_000000.json");
        let other = dir.path().join("amazon_in_trending_20240103_000000.json");
        fs::write(dir.path().join("daraz_np_trending_00000000_broken.json"), "{not json").unwrap();
        fs::write(&older, serde_json::to_string(&[sample("Old", 1)]).unwrap()).unwrap();
        fs::write(&newer, serde_json::to_string(&[sample("New", 1)]).unwrap()).unwrap();
        fs::write(&other, serde_json::to_string(&[sample("Other", 1)]).unwrap()).unwrap();

        assert_eq!(repo.get_latest_file("daraz_np").unwrap().as_deref(), Some(newer.as_path()));

        let daraz = repo.load_and_combine_all(Some("daraz_np")).unwrap();
        assert_eq!(daraz.iter().map(|p| p.title.as_str()).collect::<Vec<_>>(), vec!["Old", "New"]);
        assert_eq!(repo.load_and_combine_all(None).unwrap().len(), 3);
    }

    #[test]
    fn csv_export_flattens_features() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ProductRepository::new(dir.path());
        let out = dir.path().join("out.csv");

        repo.export_to_csv(&[sample("Kettle", 1)], Some(&out)).unwrap();

        let mut reader = csv::Reader::from_path(&out).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "rank");
        let row = reader.records().next().unwrap().unwrap();
        let features_idx = headers.iter().position(|h| h == "features").unwrap();
        assert_eq!(&row[features_idx], "Waterproof body; Two year warranty");
        let price_idx = headers.iter().position(|h| h == "numeric_price").unwrap();
        assert_eq!(&row[price_idx], "1250.0");
    }

    #[test]
    fn missing_directory_is_empty_not_error() {
        let repo = ProductRepository::new("/nonexistent/trending-scraper-test");
        assert!(repo.get_latest_file("amazon_in").unwrap().is_none());
        assert!(repo.load_and_combine_all(None).unwrap().is_empty());
    }
}
