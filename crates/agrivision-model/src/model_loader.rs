//! Model loading for the Candle-based fertilizer classifier

use crate::dense::{candle_err, DenseNetwork};
use crate::model::OutputActivation;
use agrivision_core::{Error, Result};
use candle_core::Device;
use hf_hub::{api::sync::Api, Repo, RepoType};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

/// Configuration for loading the model artifact
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Source of the model
    pub source: ModelSource,

    /// Device to run inference on
    pub device: DeviceType,

    /// Activation applied to the final layer
    pub output_activation: OutputActivation,
}

/// Source location for model weights
#[derive(Debug, Clone)]
pub enum ModelSource {
    /// Load from local file system
    LocalPath(PathBuf),

    /// Download from Hugging Face Hub
    HuggingFace {
        repo_id: String,
        revision: Option<String>,
        filename: String,
    },
}

/// Device type for inference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeviceType {
    /// CPU inference (always available)
    #[default]
    Cpu,
    /// CUDA GPU inference (if available)
    Cuda(usize), // GPU index
    /// Metal (Apple Silicon)
    Metal(usize),
}

impl FromStr for DeviceType {
    type Err = Error;

    /// Parses `cpu`, `cuda`, `cuda:N`, `metal`, `metal:N`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        let (kind, index) = match s.split_once(':') {
            Some((kind, idx)) => {
                let idx = idx
                    .parse::<usize>()
                    .map_err(|_| Error::config(format!("invalid device index in '{}'", s)))?;
                (kind.to_string(), idx)
            }
            None => (s.clone(), 0),
        };

        match kind.as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" => Ok(Self::Cuda(index)),
            "metal" => Ok(Self::Metal(index)),
            _ => Err(Error::config(format!("unknown device '{}'", s))),
        }
    }
}

impl TryFrom<String> for DeviceType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DeviceType> for String {
    fn from(device: DeviceType) -> Self {
        match device {
            DeviceType::Cpu => "cpu".to_string(),
            DeviceType::Cuda(idx) => format!("cuda:{}", idx),
            DeviceType::Metal(idx) => format!("metal:{}", idx),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            source: ModelSource::LocalPath(PathBuf::from("model.safetensors")),
            device: DeviceType::Cpu,
            output_activation: OutputActivation::Softmax,
        }
    }
}

impl ModelConfig {
    /// Create a new model configuration from local path
    pub fn from_local(path: impl Into<PathBuf>) -> Self {
        Self {
            source: ModelSource::LocalPath(path.into()),
            ..Default::default()
        }
    }

    /// Create a new model configuration from Hugging Face
    pub fn from_hf(repo_id: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            source: ModelSource::HuggingFace {
                repo_id: repo_id.into(),
                revision: None,
                filename: filename.into(),
            },
            ..Default::default()
        }
    }

    /// Set device
    pub fn with_device(mut self, device: DeviceType) -> Self {
        self.device = device;
        self
    }

    /// Set the final layer activation
    pub fn with_output_activation(mut self, activation: OutputActivation) -> Self {
        self.output_activation = activation;
        self
    }

    /// Set Hugging Face revision
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        if let ModelSource::HuggingFace { repo_id, filename, .. } = self.source {
            self.source = ModelSource::HuggingFace {
                repo_id,
                revision: Some(revision.into()),
                filename,
            };
        }
        self
    }

    /// Load the network described by this configuration
    pub fn load(&self) -> Result<DenseNetwork> {
        let weights_path = resolve_model_path(&self.source)?;
        let device = create_device(self.device)?;

        info!("Loading model weights from {:?}", weights_path);
        let network = DenseNetwork::load(&weights_path, &device, self.output_activation)?;
        info!(
            "Loaded model with {} layers ({} inputs, {} outputs)",
            network.depth(),
            crate::InferenceModel::input_len(&network),
            crate::InferenceModel::output_len(&network)
        );

        Ok(network)
    }
}

/// Resolve model path from source
fn resolve_model_path(source: &ModelSource) -> Result<PathBuf> {
    match source {
        ModelSource::LocalPath(path) => {
            if !path.exists() {
                return Err(Error::config(format!("Model file not found: {:?}", path)));
            }
            Ok(path.clone())
        }
        ModelSource::HuggingFace {
            repo_id,
            revision,
            filename,
        } => {
            let api = Api::new()
                .map_err(|e| Error::config(format!("Failed to initialize HF API: {}", e)))?;

            let repo = api.repo(Repo::with_revision(
                repo_id.clone(),
                RepoType::Model,
                revision.clone().unwrap_or_else(|| "main".to_string()),
            ));

            repo.get(filename)
                .map_err(|e| Error::config(format!("Failed to download model from HF: {}", e)))
        }
    }
}

/// Create Candle device from device type
fn create_device(device_type: DeviceType) -> Result<Device> {
    match device_type {
        DeviceType::Cpu => Ok(Device::Cpu),
        DeviceType::Cuda(idx) => Device::new_cuda(idx).map_err(candle_err("Failed to create CUDA device")),
        DeviceType::Metal(idx) => Device::new_metal(idx).map_err(candle_err("Failed to create Metal device")),
    }
}
