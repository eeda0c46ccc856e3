//! Feature vector assembly

use crate::encoder::EncoderTable;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Soil, crop, and nutrient measurements for one prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilizerInput {
    /// Nitrogen
    #[serde(rename = "N")]
    pub n: f64,

    /// Phosphorous
    #[serde(rename = "P")]
    pub p: f64,

    /// Potassium
    #[serde(rename = "K")]
    pub k: f64,

    pub temperature: f64,

    pub humidity: f64,

    pub soil_type: String,

    pub crop_type: String,
}

impl FertilizerInput {
    fn numeric(&self) -> [(&'static str, f64); 5] {
        [
            ("N", self.n),
            ("P", self.p),
            ("K", self.k),
            ("temperature", self.temperature),
            ("humidity", self.humidity),
        ]
    }
}

/// Fixed-length model input, shape `[1, len]`
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tensor shape the model expects (batch of one)
    pub fn shape(&self) -> (usize, usize) {
        (1, self.0.len())
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Concatenates the numeric measurements with the soil and crop one-hot vectors
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    encoders: Arc<EncoderTable>,
}

impl FeatureAssembler {
    pub fn new(encoders: Arc<EncoderTable>) -> Self {
        Self { encoders }
    }

    pub fn encoders(&self) -> &EncoderTable {
        &self.encoders
    }

    /// Layout: `[N, P, K, temperature, humidity, soil one-hot.., crop one-hot..]`
    pub fn assemble(&self, input: &FertilizerInput) -> Result<FeatureVector> {
        let mut values = Vec::with_capacity(self.encoders.feature_len());

        for (field, value) in input.numeric() {
            // Values past f32::MAX become infinite after narrowing
            let narrowed = value as f32;
            if !narrowed.is_finite() {
                return Err(Error::invalid_input(format!(
                    "{} must be a finite number within f32 range, got {}",
                    field, value
                )));
            }
            values.push(narrowed);
        }

        values.extend(self.encoders.soil.one_hot(&input.soil_type)?);
        values.extend(self.encoders.crop.one_hot(&input.crop_type)?);

        debug_assert_eq!(values.len(), self.encoders.feature_len());
        Ok(FeatureVector(values))
    }
}

impl Default for FeatureAssembler {
    fn default() -> Self {
        Self::new(EncoderTable::shared())
    }
}
