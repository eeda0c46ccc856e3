//! Inference model trait

use agrivision_core::{Error, FeatureVector, Result};
use async_trait::async_trait;

/// Trait for an opaque classification artifact with a fixed tensor contract
#[async_trait]
pub trait InferenceModel: Send + Sync {
    /// Run one forward pass, returning the class probability vector
    async fn infer(&self, input: &FeatureVector) -> Result<Vec<f32>>;

    /// Get the model name
    fn name(&self) -> &str;

    /// Length of the input vector the model accepts
    fn input_len(&self) -> usize;

    /// Length of the probability vector the model returns
    fn output_len(&self) -> usize;

    /// Reject inputs that do not match the model's input contract
    fn check_input(&self, input: &FeatureVector) -> Result<()> {
        if input.len() != self.input_len() {
            return Err(Error::model(format!(
                "{} expects {} input features, got {}",
                self.name(),
                self.input_len(),
                input.len()
            )));
        }
        Ok(())
    }
}

/// Activation applied to the final layer output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputActivation {
    /// Final layer emits logits; normalize with softmax
    #[default]
    Softmax,
    /// Final layer already emits probabilities
    None,
}
