//! Quantile discretization

/// Quantile at `q` with linear interpolation between order statistics.
/// `sorted` must be ascending and non-empty.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Equal-frequency bucketing fitted on the distribution it is applied to.
///
/// Buckets are right-closed `(edge[i-1], edge[i]]` with the minimum included in
/// the first one, so a value equal to an edge falls to the lower bucket.
/// Repeated edges collapse: values never land in an empty interval.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileBuckets {
    inner_edges: Vec<f64>,
}

impl QuantileBuckets {
    pub fn fit(values: &[f64], n_buckets: usize) -> Self {
        if values.is_empty() || n_buckets < 2 {
            return Self {
                inner_edges: Vec::new(),
            };
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let inner_edges = (1..n_buckets)
            .map(|i| quantile(&sorted, i as f64 / n_buckets as f64))
            .collect();
        Self { inner_edges }
    }

    pub fn inner_edges(&self) -> &[f64] {
        &self.inner_edges
    }

    /// 1-based bucket label.
    pub fn bucket(&self, value: f64) -> i64 {
        1 + self.inner_edges.iter().filter(|edge| value > **edge).count() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quantile_interpolates_linearly() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(quantile(&sorted, 0.25), 1.75);
        assert_relative_eq!(quantile(&sorted, 0.5), 2.5);
        assert_relative_eq!(quantile(&sorted, 0.75), 3.25);
        assert_relative_eq!(quantile(&sorted, 1.0), 4.0);
    }

    #[test]
    fn quartiles_split_evenly() {
        let values: Vec<f64> = (1..=8).map(f64::from).collect();
        let buckets = QuantileBuckets::fit(&values, 4);
        let labels: Vec<i64> = values.iter().map(|v| buckets.bucket(*v)).collect();
        assert_eq!(labels, vec![1, 1, 2, 2, 3, 3, 4, 4]);
    }

    #[test]
    fn value_on_an_edge_falls_to_the_lower_bucket() {
        // Quartile edges of 1..=5 are exactly 2, 3 and 4.
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let buckets = QuantileBuckets::fit(&values, 4);
        assert_eq!(buckets.inner_edges(), &[2.0, 3.0, 4.0]);
        assert_eq!(buckets.bucket(2.0), 1);
        assert_eq!(buckets.bucket(3.0), 2);
        assert_eq!(buckets.bucket(4.0), 3);
        assert_eq!(buckets.bucket(5.0), 4);
    }

    #[test]
    fn constant_input_lands_in_the_first_bucket() {
        let buckets = QuantileBuckets::fit(&[7.0; 5], 4);
        assert_eq!(buckets.bucket(7.0), 1);
    }

    #[test]
    fn order_of_input_does_not_matter() {
        let a = QuantileBuckets::fit(&[4.0, 1.0, 3.0, 2.0], 4);
        let b = QuantileBuckets::fit(&[1.0, 2.0, 3.0, 4.0], 4);
        assert_eq!(a, b);
    }
}
