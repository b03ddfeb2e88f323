//! Regression model, training and inference

pub mod linear;
pub mod predictor;
pub mod trainer;

pub use linear::{LinearModel, OrdinaryLeastSquares};
pub use predictor::Predictor;
pub use trainer::{FitMetrics, ModelTrainer};
