//! Agrivision Core
//!
//! Types and utilities shared across the Agrivision fertilizer API.
//!
//! This crate provides:
//! - Error types and result handling
//! - The encoder table mapping soil, crop, and fertilizer categories to codes
//! - Feature vector assembly for the fertilizer model

pub mod encoder;
pub mod error;
pub mod features;

pub use encoder::{CategoryEncoder, EncoderTable, CROP_TYPES, FERTILIZER_NAMES, SOIL_TYPES};
pub use error::{Error, Result};
pub use features::{FeatureAssembler, FeatureVector, FertilizerInput};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::encoder::{CategoryEncoder, EncoderTable};
    pub use crate::error::{Error, Result};
    pub use crate::features::{FeatureAssembler, FeatureVector, FertilizerInput};
}
