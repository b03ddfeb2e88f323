//! Inference on prepared tables

use crate::error::{Error, Result};
use crate::models::linear::LinearModel;
use crate::models::trainer::{feature_matrix, feature_names};
use crate::types::columns::ITEM_OUTLET_SALES;
use crate::types::{Column, Table, Value};

pub struct Predictor {
    model: LinearModel,
}

impl Predictor {
    pub fn new(model: LinearModel) -> Self {
        Self { model }
    }

    /// Feature columns in model order, followed by the predicted target.
    pub fn predict(&self, prepared: &Table) -> Result<Table> {
        let mut features = self.align(prepared)?;
        let records = feature_matrix(&features, &features.column_names())?;
        let predicted = self.model.try_predict(&records)?;

        features.push_column(Column::new(
            ITEM_OUTLET_SALES,
            predicted.iter().map(|p| Value::Float(*p)).collect(),
        ))?;
        tracing::info!("Predicted sales for {} rows", features.n_rows());
        Ok(features)
    }

    /// Drops the target and orders the remaining columns the way the model
    /// was fitted. Missing or unknown columns are an error.
    fn align(&self, prepared: &Table) -> Result<Table> {
        let present = feature_names(prepared);
        let expected: Vec<&str> = self.model.feature_names().iter().map(String::as_str).collect();

        let missing: Vec<&str> = expected
            .iter()
            .copied()
            .filter(|name| !present.contains(name))
            .collect();
        let unexpected: Vec<&str> = present
            .iter()
            .copied()
            .filter(|name| !expected.contains(name))
            .collect();
        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(Error::Model(format!(
                "feature columns do not match the model: missing {missing:?}, unexpected {unexpected:?}"
            )));
        }

        if present != expected {
            tracing::warn!("Feature columns are reordered to match the model");
        }
        prepared.select(&expected)
    }
}
