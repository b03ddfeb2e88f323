//! Data preprocessing

pub mod discretization;
pub mod encoding;
pub mod feature_engineering;

pub use discretization::QuantileBuckets;
pub use encoding::OneHotEncoder;
pub use feature_engineering::{FeatureTransformer, REFERENCE_YEAR};
