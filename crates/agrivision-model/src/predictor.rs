//! Fertilizer prediction: feature assembly, inference, and class decoding

use crate::model::InferenceModel;
use agrivision_core::{EncoderTable, Error, FeatureAssembler, FertilizerInput, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Result of one prediction
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    /// Recommended fertilizer name
    pub fertilizer: String,

    /// Winning class index
    pub class_index: usize,

    /// Probability of the winning class
    pub confidence: f32,

    /// Inference latency in microseconds
    pub latency_us: u64,
}

/// Index of the largest value.
///
/// Ties resolve to the lowest index and NaN never wins. Returns `None` when
/// the slice is empty or holds only NaN.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Runs the request-to-prediction pipeline against one model
#[derive(Clone)]
pub struct FertilizerPredictor {
    model: Arc<dyn InferenceModel>,
    assembler: FeatureAssembler,
    encoders: Arc<EncoderTable>,
}

impl FertilizerPredictor {
    /// Create a predictor, checking the model's tensor contract against the encoders
    pub fn new(model: Arc<dyn InferenceModel>, encoders: Arc<EncoderTable>) -> Result<Self> {
        if model.input_len() != encoders.feature_len() {
            return Err(Error::model(format!(
                "model {} takes {} inputs but the feature vector has {}",
                model.name(),
                model.input_len(),
                encoders.feature_len()
            )));
        }
        if model.output_len() != encoders.class_count() {
            return Err(Error::model(format!(
                "model {} produces {} outputs but there are {} fertilizer classes",
                model.name(),
                model.output_len(),
                encoders.class_count()
            )));
        }

        Ok(Self {
            model,
            assembler: FeatureAssembler::new(encoders.clone()),
            encoders,
        })
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn encoders(&self) -> &EncoderTable {
        &self.encoders
    }

    /// Predict the fertilizer for one set of measurements
    pub async fn predict(&self, input: &FertilizerInput) -> Result<Prediction> {
        let features = self.assembler.assemble(input)?;

        let start = Instant::now();
        let probabilities = self.model.infer(&features).await?;
        let latency_us = start.elapsed().as_micros() as u64;

        if probabilities.len() != self.encoders.class_count() {
            return Err(Error::model(format!(
                "expected {} class probabilities, got {}",
                self.encoders.class_count(),
                probabilities.len()
            )));
        }

        let class_index = argmax(&probabilities)
            .ok_or_else(|| Error::model("model returned no usable probabilities"))?;
        let fertilizer = self.encoders.fertilizer.decode(class_index)?.to_string();

        debug!(
            model = self.model.name(),
            class_index,
            fertilizer = %fertilizer,
            latency_us,
            "Prediction complete"
        );

        Ok(Prediction {
            fertilizer,
            class_index,
            confidence: probabilities[class_index],
            latency_us,
        })
    }
}

impl std::fmt::Debug for FertilizerPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FertilizerPredictor")
            .field("model", &self.model.name())
            .finish()
    }
}
