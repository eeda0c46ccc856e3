//! Agrivision Model
//!
//! Fertilizer classification on top of a pre-trained feed-forward network.
//!
//! The model is an opaque artifact with a fixed contract: 27 `f32` features in
//! (five measurements followed by the soil and crop one-hot blocks), 14 class
//! probabilities out. Inference runs on CPU by default through Candle.

pub mod dense;
pub mod model;
pub mod model_loader;
pub mod predictor;

pub use dense::DenseNetwork;
pub use model::{InferenceModel, OutputActivation};
pub use model_loader::{DeviceType, ModelConfig, ModelSource};
pub use predictor::{argmax, FertilizerPredictor, Prediction};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::model::InferenceModel;
    pub use crate::model_loader::{DeviceType, ModelConfig, ModelSource};
    pub use crate::predictor::{FertilizerPredictor, Prediction};
}
