//! Client surface for the Kube-Guard AI endpoints.
//!
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod core;
pub mod error_classification;
pub mod normalize;
mod validation;

pub use builder::OpsClientBuilder;
pub use core::{OpsClient, Resolution};
pub use normalize::{inspect_shape, ResponseShape};
