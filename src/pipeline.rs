//! Train and test runs as sequences of file-to-file stages

use std::fmt;
use std::path::Path;

use crate::config::Settings;
use crate::error::Result;
use crate::io::{read_table, write_table};
use crate::models::{LinearModel, ModelTrainer, Predictor};
use crate::preprocessing::FeatureTransformer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Test,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Train => write!(f, "train"),
            Mode::Test => write!(f, "test"),
        }
    }
}

/// Raw table in, prepared table out.
pub fn run_feature_engineering(
    input: &Path,
    output: &Path,
    transformer: &FeatureTransformer,
) -> Result<()> {
    tracing::info!("Feature engineering: {} -> {}", input.display(), output.display());
    let raw = read_table(input)?;
    let prepared = transformer.transform(&raw)?;
    write_table(output, &prepared)
}

/// Prepared table in, model file out.
pub fn run_training(prepared: &Path, model_path: &Path) -> Result<LinearModel> {
    tracing::info!("Training: {} -> {}", prepared.display(), model_path.display());
    let table = read_table(prepared)?;
    let model = ModelTrainer::new().fit(&table)?;
    model.save(model_path)?;
    Ok(model)
}

/// Prepared table and model in, predictions table out.
pub fn run_prediction(prepared: &Path, model_path: &Path, output: &Path) -> Result<()> {
    tracing::info!(
        "Prediction: {} with {} -> {}",
        prepared.display(),
        model_path.display(),
        output.display()
    );
    let predictor = Predictor::new(LinearModel::load(model_path)?);
    let table = read_table(prepared)?;
    let predictions = predictor.predict(&table)?;
    write_table(output, &predictions)
}

/// Runs every stage of `mode`, stopping at the first failure.
pub fn run(mode: Mode, settings: &Settings) -> Result<()> {
    tracing::info!("Starting {mode} run");
    match mode {
        Mode::Train => {
            run_feature_engineering(
                &settings.train_input,
                &settings.train_prepared,
                &FeatureTransformer::new(),
            )?;
            run_training(&settings.train_prepared, &settings.model_path)?;
        }
        Mode::Test => {
            // Test data is encoded with the categories the model was trained on.
            let model = LinearModel::load(&settings.model_path)?;
            let transformer = FeatureTransformer::with_outlet_types(model.outlet_type_vocabulary());
            run_feature_engineering(&settings.test_input, &settings.test_prepared, &transformer)?;
            run_prediction(&settings.test_prepared, &settings.model_path, &settings.predictions)?;
        }
    }
    tracing::info!("Finished {mode} run");
    Ok(())
}
