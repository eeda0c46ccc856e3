//! Feed-forward network executed with Candle
//!
//! The artifact is a SafeTensors file holding `layers.{i}.weight` (`[out, in]`)
//! and `layers.{i}.bias` (`[out]`) for contiguous `i` starting at 0. Hidden
//! layers use ReLU; the final layer goes through the configured output
//! activation.

use crate::model::{InferenceModel, OutputActivation};
use agrivision_core::{Error, FeatureVector, Result};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{Linear, Module};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

pub(crate) fn candle_err(context: &str) -> impl Fn(candle_core::Error) -> Error + '_ {
    move |e| Error::model(format!("{}: {}", context, e))
}

/// Dense classifier network
pub struct DenseNetwork {
    name: String,
    layers: Vec<Linear>,
    device: Device,
    activation: OutputActivation,
    input_len: usize,
    output_len: usize,
}

impl std::fmt::Debug for DenseNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DenseNetwork")
            .field("name", &self.name)
            .field("layers", &self.layers.len())
            .field("input_len", &self.input_len)
            .field("output_len", &self.output_len)
            .field("activation", &self.activation)
            .finish()
    }
}

impl DenseNetwork {
    /// Load a network from a SafeTensors file
    pub fn load(
        path: impl AsRef<Path>,
        device: &Device,
        activation: OutputActivation,
    ) -> Result<Self> {
        let path = path.as_ref();
        let tensors = candle_core::safetensors::load(path, device)
            .map_err(candle_err("Failed to load SafeTensors"))?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("model")
            .to_string();

        Self::from_tensors(name, tensors, device, activation)
    }

    /// Build a network from named weight tensors
    pub fn from_tensors(
        name: impl Into<String>,
        mut tensors: HashMap<String, Tensor>,
        device: &Device,
        activation: OutputActivation,
    ) -> Result<Self> {
        let mut layers = Vec::new();
        let mut input_len = 0;
        let mut prev_out: Option<usize> = None;

        for i in 0.. {
            let weight_key = format!("layers.{}.weight", i);
            let Some(weight) = tensors.remove(&weight_key) else {
                break;
            };
            let bias_key = format!("layers.{}.bias", i);
            let bias = tensors
                .remove(&bias_key)
                .ok_or_else(|| Error::model(format!("missing tensor {}", bias_key)))?;

            let weight = weight
                .to_dtype(DType::F32)
                .map_err(candle_err("weight dtype"))?;
            let bias = bias.to_dtype(DType::F32).map_err(candle_err("bias dtype"))?;

            let (out_dim, in_dim) = weight
                .dims2()
                .map_err(|_| Error::model(format!("{} must be 2-D, got {:?}", weight_key, weight.dims())))?;
            let bias_dim = bias
                .dims1()
                .map_err(|_| Error::model(format!("{} must be 1-D, got {:?}", bias_key, bias.dims())))?;

            if bias_dim != out_dim {
                return Err(Error::model(format!(
                    "{} has {} entries but layer {} has {} outputs",
                    bias_key, bias_dim, i, out_dim
                )));
            }

            match prev_out {
                None => input_len = in_dim,
                Some(prev) if prev != in_dim => {
                    return Err(Error::model(format!(
                        "layer {} expects {} inputs but layer {} produces {}",
                        i,
                        in_dim,
                        i - 1,
                        prev
                    )));
                }
                Some(_) => {}
            }
            prev_out = Some(out_dim);

            debug!(layer = i, in_dim, out_dim, "Loaded dense layer");
            layers.push(Linear::new(weight, Some(bias)));
        }

        let output_len = prev_out.ok_or_else(|| Error::model("artifact contains no layers"))?;

        if !tensors.is_empty() {
            let mut extra: Vec<_> = tensors.keys().cloned().collect();
            extra.sort();
            return Err(Error::model(format!("unexpected tensors in artifact: {}", extra.join(", "))));
        }

        Ok(Self {
            name: name.into(),
            layers,
            device: device.clone(),
            activation,
            input_len,
            output_len,
        })
    }

    /// Number of layers
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    fn forward(&self, input: &[f32]) -> candle_core::Result<Vec<f32>> {
        let mut xs = Tensor::from_slice(input, (1, input.len()), &self.device)?;

        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            xs = layer.forward(&xs)?;
            if i < last {
                xs = xs.relu()?;
            }
        }

        if self.activation == OutputActivation::Softmax {
            xs = candle_nn::ops::softmax(&xs, D::Minus1)?;
        }

        xs.squeeze(0)?.to_vec1::<f32>()
    }
}

#[async_trait]
impl InferenceModel for DenseNetwork {
    async fn infer(&self, input: &FeatureVector) -> Result<Vec<f32>> {
        self.check_input(input)?;
        self.forward(input.as_slice())
            .map_err(candle_err("Forward pass failed"))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn input_len(&self) -> usize {
        self.input_len
    }

    fn output_len(&self) -> usize {
        self.output_len
    }
}
