//! Core domain model for the Lumivana commission storefront.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const CRATE_NAME: &str = "lumi-core";

/// Upper bound (inclusive) of the "low" price bucket.
pub const LOW_MAX: f64 = 40.0;
/// Lower bound (inclusive) of the "mid" price bucket.
pub const MID_MIN: f64 = 41.0;
/// Upper bound (inclusive) of the "mid" price bucket.
pub const MID_MAX: f64 = 100.0;
/// Lower bound (inclusive) of the "high" price bucket.
pub const HIGH_MIN: f64 = 101.0;

/// Opaque handle to an image: a URL or a platform-local identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ImageRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Creative,
    Academic,
    Writing,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Creative, Category::Academic, Category::Writing];

    pub fn as_tag(self) -> &'static str {
        match self {
            Category::Creative => "creative",
            Category::Academic => "academic",
            Category::Writing => "writing",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_tag() == tag)
    }

    pub fn title(self) -> &'static str {
        match self {
            Category::Creative => "Creative / Art",
            Category::Academic => "Academic",
            Category::Writing => "Writing / Editing",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Category::Creative => "🎨",
            Category::Academic => "📚",
            Category::Writing => "✍️",
        }
    }

    pub fn blurb(self) -> &'static str {
        match self {
            Category::Creative => "Design & illustration",
            Category::Academic => "Reports & research",
            Category::Writing => "Copy & editing",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_tag())
    }
}

/// Category selection of a catalog query.
///
/// Tags that name no known category are kept as `Unrecognized` and match no
/// listing instead of failing the query.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
    Unrecognized(String),
}

impl CategoryFilter {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "all" => CategoryFilter::All,
            other => Category::from_tag(other)
                .map(CategoryFilter::Only)
                .unwrap_or_else(|| CategoryFilter::Unrecognized(other.to_string())),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Only(category) => category.as_tag(),
            CategoryFilter::Unrecognized(tag) => tag,
        }
    }

    pub fn admits(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => *wanted == category,
            CategoryFilter::Unrecognized(_) => false,
        }
    }
}

impl From<String> for CategoryFilter {
    fn from(value: String) -> Self {
        Self::from_tag(&value)
    }
}

impl From<CategoryFilter> for String {
    fn from(value: CategoryFilter) -> Self {
        value.as_tag().to_string()
    }
}

impl From<Category> for CategoryFilter {
    fn from(value: Category) -> Self {
        CategoryFilter::Only(value)
    }
}

/// Coarse price range. Boundaries are the fixed `LOW_MAX`..`HIGH_MIN` constants.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PriceBucket {
    #[default]
    Any,
    Low,
    Mid,
    High,
    Unrecognized(String),
}

impl PriceBucket {
    /// Buckets offered as chips in the filter sheet, in display order.
    pub const CHOICES: [PriceBucket; 4] = [
        PriceBucket::Any,
        PriceBucket::Low,
        PriceBucket::Mid,
        PriceBucket::High,
    ];

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "any" => PriceBucket::Any,
            "low" => PriceBucket::Low,
            "mid" => PriceBucket::Mid,
            "high" => PriceBucket::High,
            other => PriceBucket::Unrecognized(other.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            PriceBucket::Any => "any",
            PriceBucket::Low => "low",
            PriceBucket::Mid => "mid",
            PriceBucket::High => "high",
            PriceBucket::Unrecognized(tag) => tag,
        }
    }

    pub fn label(&self) -> String {
        match self {
            PriceBucket::Any => "Any".to_string(),
            PriceBucket::Low => format!("≤ ₱{LOW_MAX:.0}"),
            PriceBucket::Mid => format!("₱{MID_MIN:.0} - ₱{MID_MAX:.0}"),
            PriceBucket::High => format!("₱{HIGH_MIN:.0}+"),
            PriceBucket::Unrecognized(tag) => tag.clone(),
        }
    }

    /// Whether `price` lies inside this bucket.
    ///
    /// Prices strictly between `LOW_MAX` and `MID_MIN` (or `MID_MAX` and
    /// `HIGH_MIN`) fall in no bucket and only pass `Any`.
    pub fn admits(&self, price: f64) -> bool {
        match self {
            PriceBucket::Any => true,
            PriceBucket::Low => price <= LOW_MAX,
            PriceBucket::Mid => (MID_MIN..=MID_MAX).contains(&price),
            PriceBucket::High => price >= HIGH_MIN,
            PriceBucket::Unrecognized(_) => false,
        }
    }
}

impl From<String> for PriceBucket {
    fn from(value: String) -> Self {
        Self::from_tag(&value)
    }
}

impl From<PriceBucket> for String {
    fn from(value: PriceBucket) -> Self {
        value.as_tag().to_string()
    }
}

/// One purchasable commission offering as supplied by the listing source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionListing {
    pub id: String,
    pub title: String,
    pub category: Category,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub image: ImageRef,
}

impl CommissionListing {
    pub fn display_price(&self) -> String {
        format_price(self.price)
    }
}

/// Peso price with two decimals, e.g. `₱45.00`.
pub fn format_price(price: f64) -> String {
    format!("₱{price:.2}")
}

/// Which of the two form screens a draft session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionIntent {
    Request,
    Offer,
}

impl SubmissionIntent {
    pub fn add_photo_title(self) -> &'static str {
        match self {
            SubmissionIntent::Request => "Add Reference Photo",
            SubmissionIntent::Offer => "Add Product Photo",
        }
    }

    pub fn sent_title(self) -> &'static str {
        match self {
            SubmissionIntent::Request => "Request Sent!",
            SubmissionIntent::Offer => "Offer Sent!",
        }
    }

    pub fn sent_message(self) -> &'static str {
        match self {
            SubmissionIntent::Request => "Your commission request has been submitted.",
            SubmissionIntent::Offer => "Commission offer submitted successfully.",
        }
    }

    pub fn cancel_prompt(self) -> &'static str {
        match self {
            SubmissionIntent::Request => "Do you want to cancel this commission request?",
            SubmissionIntent::Offer => "Cancel this commission offer?",
        }
    }
}

impl fmt::Display for SubmissionIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionIntent::Request => f.write_str("request"),
            SubmissionIntent::Offer => f.write_str("offer"),
        }
    }
}
