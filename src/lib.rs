//! BigMart sales: feature engineering, training and inference

pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod types;

pub use config::Settings;
pub use error::{Error, Result};
pub use models::{FitMetrics, LinearModel, ModelTrainer, Predictor};
pub use pipeline::Mode;
pub use preprocessing::FeatureTransformer;
pub use types::{Column, Table, Value};
