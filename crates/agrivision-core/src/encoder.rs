//! Category encoders
//!
//! Maps the closed sets of soil types, crop types, and fertilizer names to
//! small integer codes and one-hot vectors. Classes are sorted byte-wise so a
//! class's code is its position in the sorted list, which is the column order
//! the model was trained against.

use crate::error::{Error, Result};
use std::sync::{Arc, OnceLock};

/// Soil types accepted by the model
pub const SOIL_TYPES: &[&str] = &["Sandy", "Loamy", "Black", "Red", "Clayey"];

/// Crop types accepted by the model
pub const CROP_TYPES: &[&str] = &[
    "Maize",
    "Sugarcane",
    "Cotton",
    "Tobacco",
    "Paddy",
    "Barley",
    "Wheat",
    "Millets",
    "Oil Seeds",
    "Pulses",
    "Ground Nuts",
    "Rice",
    "Pomegranate",
    "Coffee",
    "Watermelon",
    "Kidneybeans",
    "Orange",
];

/// Fertilizer names the model can predict
pub const FERTILIZER_NAMES: &[&str] = &[
    "10-10-10",
    "10-26-26",
    "14-14-14",
    "14-35-14",
    "15-15-15",
    "17-17-17",
    "20-20",
    "28-28",
    "DAP",
    "Potassium chloride",
    "Potassium sulfate",
    "Superphosphate",
    "TSP",
    "Urea",
];

/// Number of numeric scalars leading the feature vector (N, P, K, temperature, humidity)
pub const NUMERIC_FEATURES: usize = 5;

/// A closed, ordered set of category strings
#[derive(Debug, Clone)]
pub struct CategoryEncoder {
    field: &'static str,
    classes: Vec<String>,
}

impl CategoryEncoder {
    /// Build an encoder from a list of categories.
    ///
    /// Duplicates are dropped and the remaining classes sorted, so the input
    /// order does not affect the resulting codes.
    pub fn fit<I, S>(field: &'static str, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classes: Vec<String> = categories.into_iter().map(Into::into).collect();
        classes.sort();
        classes.dedup();

        Self { field, classes }
    }

    /// Name of the request field this encoder covers
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Sorted classes
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the encoder has no classes
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Check whether a category belongs to the set (exact, case-sensitive)
    pub fn contains(&self, category: &str) -> bool {
        self.position(category).is_some()
    }

    /// Integer code of a category
    pub fn encode(&self, category: &str) -> Result<usize> {
        self.position(category).ok_or_else(|| Error::UnknownCategory {
            field: self.field,
            value: category.to_string(),
        })
    }

    /// Category for an integer code
    pub fn decode(&self, index: usize) -> Result<&str> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or(Error::UnknownClass {
                field: self.field,
                index,
                classes: self.classes.len(),
            })
    }

    /// One-hot vector for a category, columns in code order
    pub fn one_hot(&self, category: &str) -> Result<Vec<f32>> {
        let code = self.encode(category)?;
        let mut vector = vec![0.0; self.classes.len()];
        vector[code] = 1.0;
        Ok(vector)
    }

    fn position(&self, category: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(category))
            .ok()
    }
}

/// The encoders used by the fertilizer model
#[derive(Debug, Clone)]
pub struct EncoderTable {
    /// Soil type encoder
    pub soil: CategoryEncoder,

    /// Crop type encoder
    pub crop: CategoryEncoder,

    /// Fertilizer name encoder (model output classes)
    pub fertilizer: CategoryEncoder,
}

impl EncoderTable {
    /// Build the table from the hard-coded category lists
    pub fn standard() -> Self {
        let table = Self {
            soil: CategoryEncoder::fit("soil_type", SOIL_TYPES.iter().copied()),
            crop: CategoryEncoder::fit("crop_type", CROP_TYPES.iter().copied()),
            fertilizer: CategoryEncoder::fit("fertilizer", FERTILIZER_NAMES.iter().copied()),
        };

        tracing::debug!(
            soil = table.soil.len(),
            crop = table.crop.len(),
            fertilizer = table.fertilizer.len(),
            "Built encoder table"
        );

        table
    }

    /// Process-wide table, built on first use
    pub fn shared() -> Arc<Self> {
        static TABLE: OnceLock<Arc<EncoderTable>> = OnceLock::new();
        TABLE.get_or_init(|| Arc::new(Self::standard())).clone()
    }

    /// Length of the assembled feature vector
    pub fn feature_len(&self) -> usize {
        NUMERIC_FEATURES + self.soil.len() + self.crop.len()
    }

    /// Number of model output classes
    pub fn class_count(&self) -> usize {
        self.fertilizer.len()
    }
}

impl Default for EncoderTable {
    fn default() -> Self {
        Self::standard()
    }
}
