//! Ordinary least squares regression

#![allow(non_snake_case)]

use std::fs;
use std::path::Path;

use linfa::traits::{Fit, PredictInplace};
use linfa::DatasetBase;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::io::write_atomic;
use crate::types::columns::OUTLET_TYPE_PREFIX;

/// A pivot below this fraction of its column's squared norm marks the column
/// as a linear combination of the ones before it.
const RANK_TOLERANCE: f64 = 1e-9;

/// Least squares with an intercept, solved through the normal equations on
/// centered data.
///
/// Linearly dependent columns (the one-hot indicators always are, together
/// with the intercept) get a zero coefficient. The fitted values are the same
/// as with any other least squares solution.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrdinaryLeastSquares;

/// Fitted linear model, serializable without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    feature_names: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl Fit<Array2<f64>, Array1<f64>, Error> for OrdinaryLeastSquares {
    type Object = LinearModel;

    fn fit(&self, dataset: &DatasetBase<Array2<f64>, Array1<f64>>) -> Result<LinearModel> {
        let X = &dataset.records;
        let y = &dataset.targets;
        let (n_samples, n_features) = X.dim();
        if n_samples == 0 {
            return Err(Error::Model("cannot fit on an empty table".to_string()));
        }

        let x_mean = X
            .mean_axis(Axis(0))
            .ok_or_else(|| Error::Model("failed to compute feature means".to_string()))?;
        let y_mean = y
            .mean()
            .ok_or_else(|| Error::Model("failed to compute target mean".to_string()))?;

        let X_centered = X - &x_mean;
        let y_centered = y - y_mean;

        // X^T X and X^T y
        let xtx = X_centered.t().dot(&X_centered);
        let xty = X_centered.t().dot(&y_centered);

        let (weights, dependent) = solve_normal_equations(xtx, xty);
        let feature_names = dataset.feature_names();
        if !dependent.is_empty() {
            let names: Vec<&str> = dependent.iter().map(|&j| feature_names[j].as_str()).collect();
            tracing::warn!(
                "{} of {} features are linearly dependent and get no weight: {:?}",
                dependent.len(),
                n_features,
                names
            );
        }

        let intercept = y_mean - x_mean.dot(&weights);
        if !intercept.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(Error::Model(
                "least squares produced non-finite coefficients".to_string(),
            ));
        }

        Ok(LinearModel {
            feature_names,
            coefficients: weights.to_vec(),
            intercept,
        })
    }
}

/// Gaussian elimination on a symmetric positive semi-definite system.
///
/// Returns the solution and the indices of the columns found dependent,
/// whose unknowns are fixed at zero.
fn solve_normal_equations(mut A: Array2<f64>, mut b: Array1<f64>) -> (Array1<f64>, Vec<usize>) {
    let n = b.len();
    let norms: Vec<f64> = A.diag().to_vec();
    let mut dependent = vec![false; n];

    // Forward elimination
    for k in 0..n {
        let pivot = A[[k, k]];
        if pivot <= RANK_TOLERANCE * norms[k] {
            dependent[k] = true;
            continue;
        }
        for i in (k + 1)..n {
            let factor = A[[i, k]] / pivot;
            if factor == 0.0 {
                continue;
            }
            for j in k..n {
                A[[i, j]] -= factor * A[[k, j]];
            }
            b[i] -= factor * b[k];
        }
    }

    // Back substitution
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        if dependent[i] {
            continue;
        }
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum -= A[[i, j]] * x[j];
        }
        x[i] = sum / A[[i, i]];
    }

    let dependent = dependent
        .iter()
        .enumerate()
        .filter_map(|(j, d)| d.then_some(j))
        .collect();
    (x, dependent)
}

impl LinearModel {
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    /// `Outlet_Type` categories the model was trained with, in column order.
    pub fn outlet_type_vocabulary(&self) -> Vec<String> {
        self.feature_names
            .iter()
            .filter_map(|name| name.strip_prefix(OUTLET_TYPE_PREFIX))
            .map(str::to_string)
            .collect()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| Error::Model(format!("failed to serialize model: {e}")))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let model: LinearModel = serde_json::from_slice(bytes)
            .map_err(|e| Error::Model(format!("failed to deserialize model: {e}")))?;
        if model.coefficients.len() != model.feature_names.len() {
            return Err(Error::Model(format!(
                "model has {} coefficients for {} features",
                model.coefficients.len(),
                model.feature_names.len()
            )));
        }
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, &self.to_bytes()?)?;
        tracing::info!("Model saved to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
        let model = Self::from_bytes(&bytes)?;
        tracing::info!(
            "Model loaded from {} ({} features)",
            path.display(),
            model.n_features()
        );
        Ok(model)
    }
}

impl LinearModel {
    /// Predictions for `x`, or a model error when its width differs from the model's.
    pub fn try_predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.coefficients.len() {
            return Err(Error::Model(format!(
                "expected {} feature columns, got {}",
                self.coefficients.len(),
                x.ncols()
            )));
        }
        Ok(x.dot(&ArrayView1::from(self.coefficients.as_slice())) + self.intercept)
    }
}

/// A matrix of the wrong width yields NaN predictions; use
/// [`LinearModel::try_predict`] to get the error instead.
impl PredictInplace<Array2<f64>, Array1<f64>> for LinearModel {
    fn predict_inplace(&self, x: &Array2<f64>, y: &mut Array1<f64>) {
        *y = self.try_predict(x).unwrap_or_else(|e| {
            tracing::error!("{e}");
            Array1::from_elem(x.nrows(), f64::NAN)
        });
    }

    fn default_target(&self, x: &Array2<f64>) -> Array1<f64> {
        Array1::zeros(x.nrows())
    }
}
