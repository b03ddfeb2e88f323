//! Model training on prepared tables

use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use ndarray::{Array1, Array2};

use crate::error::{Error, Result};
use crate::models::linear::{LinearModel, OrdinaryLeastSquares};
use crate::types::columns::ITEM_OUTLET_SALES;
use crate::types::{Table, Value};

/// In-sample goodness of fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitMetrics {
    pub rmse: f64,
    pub r2: f64,
}

impl FitMetrics {
    pub fn compute(predicted: &Array1<f64>, actual: &Array1<f64>) -> Self {
        let n = actual.len().max(1) as f64;
        let ss_res: f64 = predicted
            .iter()
            .zip(actual.iter())
            .map(|(p, a)| (a - p).powi(2))
            .sum();
        let mean = actual.mean().unwrap_or(0.0);
        let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

        // A constant target is either fitted perfectly or not explained at all.
        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };
        Self {
            rmse: (ss_res / n).sqrt(),
            r2,
        }
    }
}

/// Fits the regression on every row of a prepared table; there is no
/// validation split.
#[derive(Debug, Clone, Default)]
pub struct ModelTrainer {
    params: OrdinaryLeastSquares,
}

impl ModelTrainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&self, prepared: &Table) -> Result<LinearModel> {
        let (model, metrics) = self.fit_with_metrics(prepared)?;
        tracing::info!(
            "Linear model trained on {} rows. RMSE: {:.2}, R2: {:.4}",
            prepared.n_rows(),
            metrics.rmse,
            metrics.r2
        );
        Ok(model)
    }

    pub fn fit_with_metrics(&self, prepared: &Table) -> Result<(LinearModel, FitMetrics)> {
        let targets = target_vector(prepared)?;
        let names = feature_names(prepared);
        let records = feature_matrix(prepared, &names)?;
        tracing::info!(
            "Fitting on {} rows x {} features",
            records.nrows(),
            records.ncols()
        );

        let dataset = Dataset::new(records, targets).with_feature_names(names);
        let model = self.params.fit(&dataset)?;
        let predicted = model.predict(&dataset.records);
        let metrics = FitMetrics::compute(&predicted, &dataset.targets);
        Ok((model, metrics))
    }
}

/// Every column except the target, in table order.
pub fn feature_names(table: &Table) -> Vec<&str> {
    table
        .column_names()
        .into_iter()
        .filter(|name| *name != ITEM_OUTLET_SALES)
        .collect()
}

/// Numeric matrix of the named columns; text or missing cells are a model error.
pub fn feature_matrix(table: &Table, names: &[&str]) -> Result<Array2<f64>> {
    let mut records = Array2::zeros((table.n_rows(), names.len()));
    for (j, name) in names.iter().enumerate() {
        let column = table.require(name)?;
        for (i, value) in column.values.iter().enumerate() {
            records[[i, j]] = match value {
                Value::Int(_) | Value::Float(_) => value.as_f64().unwrap_or_default(),
                Value::Null => {
                    return Err(Error::Model(format!(
                        "feature `{name}` has a missing value at row {}",
                        i + 1
                    )))
                }
                Value::Text(text) => {
                    return Err(Error::Model(format!(
                        "feature `{name}` is not numeric (row {}: `{text}`)",
                        i + 1
                    )))
                }
            };
        }
    }
    Ok(records)
}

pub fn target_vector(table: &Table) -> Result<Array1<f64>> {
    let column = table.require(ITEM_OUTLET_SALES)?;
    column
        .values
        .iter()
        .enumerate()
        .map(|(i, value)| match value {
            Value::Null => Err(Error::Model(format!(
                "target `{ITEM_OUTLET_SALES}` is missing at row {}",
                i + 1
            ))),
            Value::Text(text) => Err(Error::Model(format!(
                "target `{ITEM_OUTLET_SALES}` is not numeric (row {}: `{text}`)",
                i + 1
            ))),
            number => Ok(number.as_f64().unwrap_or_default()),
        })
        .collect()
}
