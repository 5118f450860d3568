//! Catalog filtering engine: search text, category chips and price buckets
//! over an in-memory commission listing.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use lumi_core::{Category, CategoryFilter, CommissionListing, PriceBucket};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const CRATE_NAME: &str = "lumi-catalog";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub search_text: String,
    #[serde(default)]
    pub category: CategoryFilter,
    #[serde(default)]
    pub price_bucket: PriceBucket,
}

impl CatalogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<CategoryFilter>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_price_bucket(mut self, bucket: PriceBucket) -> Self {
        self.price_bucket = bucket;
        self
    }

    /// Builds a query from untyped tags (chip ids, query-string values).
    pub fn from_tags(search_text: &str, category: &str, price_bucket: &str) -> Self {
        Self {
            search_text: search_text.to_string(),
            category: CategoryFilter::from_tag(category),
            price_bucket: PriceBucket::from_tag(price_bucket),
        }
    }

    /// Trimmed, lower-cased needle; `None` when the search box is blank.
    fn needle(&self) -> Option<String> {
        let needle = self.search_text.trim().to_lowercase();
        (!needle.is_empty()).then_some(needle)
    }

    fn admits(&self, listing: &CommissionListing, needle: Option<&str>) -> bool {
        if !self.category.admits(listing.category) {
            return false;
        }
        if !self.price_bucket.admits(listing.price) {
            return false;
        }
        match needle {
            None => true,
            Some(needle) => {
                listing.title.to_lowercase().contains(needle)
                    || listing.description.to_lowercase().contains(needle)
            }
        }
    }
}

/// Returns the listings that pass the category, price and text predicates, in
/// their original order.
pub fn filter_commissions(listings: &[CommissionListing], query: &CatalogQuery) -> Vec<CommissionListing> {
    let needle = query.needle();
    listings
        .iter()
        .filter(|listing| query.admits(listing, needle.as_deref()))
        .cloned()
        .collect()
}

pub fn results_count(listings: &[CommissionListing], query: &CatalogQuery) -> usize {
    let needle = query.needle();
    listings
        .iter()
        .filter(|listing| query.admits(listing, needle.as_deref()))
        .count()
}

/// One entry of the category strip shown above the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryChip {
    pub filter: CategoryFilter,
    pub title: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
}

pub fn category_catalog() -> Vec<CategoryChip> {
    let mut chips = vec![CategoryChip {
        filter: CategoryFilter::All,
        title: "All Commissions",
        icon: "🧾",
        description: "Browse everything",
    }];
    chips.extend(Category::ALL.into_iter().map(|category| CategoryChip {
        filter: CategoryFilter::Only(category),
        title: category.title(),
        icon: category.icon(),
        description: category.blurb(),
    }));
    chips
}

/// Staged edits of the "Filter & Sort" sheet. Nothing reaches the query until
/// [`CatalogView::apply_filter_sheet`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSheet {
    pub price_bucket: PriceBucket,
    /// `None` is the sheet's "any" state: applying keeps the active category.
    pub category: Option<CategoryFilter>,
}

impl FilterSheet {
    pub fn select_price(&mut self, bucket: PriceBucket) {
        self.price_bucket = bucket;
    }

    /// Tapping the already-selected chip returns the sheet to "any".
    pub fn toggle_category(&mut self, category: CategoryFilter) {
        if self.category.as_ref() == Some(&category) {
            self.category = None;
        } else {
            self.category = Some(category);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Listing screen state: the listings, the live query and the derived
/// visible subset, recomputed on every input change.
#[derive(Debug, Clone)]
pub struct CatalogView {
    listings: Vec<CommissionListing>,
    query: CatalogQuery,
    visible: Vec<CommissionListing>,
}

impl CatalogView {
    pub fn new(listings: Vec<CommissionListing>) -> Self {
        Self::with_query(listings, CatalogQuery::default())
    }

    pub fn with_query(listings: Vec<CommissionListing>, query: CatalogQuery) -> Self {
        let mut view = Self {
            listings,
            query,
            visible: Vec::new(),
        };
        view.recompute();
        view
    }

    pub fn listings(&self) -> &[CommissionListing] {
        &self.listings
    }

    pub fn query(&self) -> &CatalogQuery {
        &self.query
    }

    pub fn visible(&self) -> &[CommissionListing] {
        &self.visible
    }

    pub fn results_count(&self) -> usize {
        self.visible.len()
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.query.search_text = text.into();
        self.recompute();
    }

    pub fn clear_search(&mut self) {
        self.set_search_text(String::new());
    }

    pub fn select_category(&mut self, category: CategoryFilter) {
        self.query.category = category;
        self.recompute();
    }

    pub fn open_filter_sheet(&self) -> FilterSheet {
        FilterSheet {
            price_bucket: self.query.price_bucket.clone(),
            category: None,
        }
    }

    pub fn apply_filter_sheet(&mut self, sheet: FilterSheet) {
        self.query.price_bucket = sheet.price_bucket;
        if let Some(category) = sheet.category {
            self.query.category = category;
        }
        self.recompute();
    }

    fn recompute(&mut self) {
        self.visible = filter_commissions(&self.listings, &self.query);
        debug!(
            category = self.query.category.as_tag(),
            price_bucket = self.query.price_bucket.as_tag(),
            search = %self.query.search_text.trim(),
            results = self.visible.len(),
            "catalog recomputed"
        );
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ListingFile {
    listings: Vec<CommissionListing>,
}

/// Reads a listing file (`.yaml`/`.yml` as YAML, anything else as JSON) of the
/// form `{ listings: [...] }`.
pub fn load_listings(path: impl AsRef<Path>) -> Result<Vec<CommissionListing>> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    );
    let file: ListingFile = if is_yaml {
        serde_yaml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?
    } else {
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?
    };
    check_listings(&file.listings).with_context(|| format!("validating {}", path.display()))?;
    debug!(path = %path.display(), listings = file.listings.len(), "loaded listings");
    Ok(file.listings)
}

fn check_listings(listings: &[CommissionListing]) -> Result<()> {
    let mut seen = HashSet::with_capacity(listings.len());
    for listing in listings {
        ensure!(seen.insert(listing.id.as_str()), "duplicate listing id {}", listing.id);
        ensure!(!listing.title.trim().is_empty(), "listing {} has an empty title", listing.id);
        ensure!(
            listing.price.is_finite() && listing.price >= 0.0,
            "listing {} has invalid price {}",
            listing.id,
            listing.price
        );
    }
    Ok(())
}
