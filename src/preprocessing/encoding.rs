//! Categorical lookup tables and encoders

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::types::{Column, Value};

/// Fat content of items for which it is meaningless.
pub const FAT_CONTENT_NOT_APPLICABLE: &str = "NA";

/// Item types whose fat content is suppressed before regrouping.
pub const NON_EDIBLE_ITEM_TYPES: [&str; 5] = [
    "Household",
    "Health and Hygiene",
    "Hard Drinks",
    "Soft Drinks",
    "Fruits and Vegetables",
];

pub const NON_PERISHABLE: &str = "Non perishable";

pub const OUTLET_SIZE_CODES: [(&str, i64); 3] = [("Small", 0), ("Medium", 1), ("High", 2)];

pub const LOCATION_TYPE_CODES: [(&str, i64); 3] = [("Tier 3", 0), ("Tier 2", 1), ("Tier 1", 2)];

/// Unifies the spellings of the fat content labels.
pub fn normalize_fat_content(label: &str) -> &str {
    match label {
        "low fat" | "LF" => "Low Fat",
        "reg" => "Regular",
        other => other,
    }
}

/// Coarse group of an item type, `None` for types outside the table.
pub fn item_type_group(item_type: &str) -> Option<&'static str> {
    let group = match item_type {
        "Others" | "Health and Hygiene" | "Household" => NON_PERISHABLE,
        "Seafood" | "Meat" => "Meats",
        "Baking Goods" | "Frozen Foods" | "Canned" | "Snack Foods" => "Processed Foods",
        "Breads" | "Breakfast" => "Starchy Foods",
        "Soft Drinks" | "Hard Drinks" | "Dairy" => "Drinks",
        _ => return None,
    };
    Some(group)
}

/// Replaces labels with their codes in place.
///
/// Integers that already are one of the codes are kept, so encoding an
/// encoded column is a no-op. `row_ids` label rows in errors.
pub fn encode_ordinal(column: &mut Column, codes: &[(&str, i64)], row_ids: &[usize]) -> Result<()> {
    for (idx, value) in column.values.iter_mut().enumerate() {
        let code = match &*value {
            Value::Text(label) => codes
                .iter()
                .find(|(name, _)| name == label)
                .map(|(_, code)| *code),
            Value::Int(code) if codes.iter().any(|(_, c)| c == code) => Some(*code),
            _ => None,
        };
        match code {
            Some(code) => *value = Value::Int(code),
            None => {
                return Err(Error::Value {
                    column: column.name.clone(),
                    row: row_ids.get(idx).copied().unwrap_or(idx + 1),
                    value: if value.is_null() {
                        "<null>".to_string()
                    } else {
                        value.to_string()
                    },
                })
            }
        }
    }
    Ok(())
}

/// Sorted distinct non-null values of a column.
pub fn observed_categories(column: &Column) -> Vec<String> {
    column
        .values
        .iter()
        .filter_map(Value::key)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Indicator encoding of a categorical column.
#[derive(Debug, Clone, Default)]
pub struct OneHotEncoder {
    vocabulary: Option<Vec<String>>,
}

impl OneHotEncoder {
    /// Categories are whatever the encoded column contains.
    pub fn observed() -> Self {
        Self { vocabulary: None }
    }

    /// Categories are fixed; anything else is an error.
    pub fn frozen(vocabulary: Vec<String>) -> Self {
        Self {
            vocabulary: Some(vocabulary),
        }
    }

    pub fn vocabulary(&self) -> Option<&[String]> {
        self.vocabulary.as_deref()
    }

    /// One `<prefix><category>` column of 0/1 per category. Null rows are all zeros.
    pub fn encode(&self, column: &Column, prefix: &str, row_ids: &[usize]) -> Result<Vec<Column>> {
        let categories = match &self.vocabulary {
            Some(vocabulary) => vocabulary.clone(),
            None => observed_categories(column),
        };

        let mut indicators: Vec<Column> = categories
            .iter()
            .map(|category| {
                Column::new(format!("{prefix}{category}"), vec![Value::Int(0); column.len()])
            })
            .collect();

        for (idx, value) in column.values.iter().enumerate() {
            let Some(key) = value.key() else { continue };
            match categories.iter().position(|c| *c == key) {
                Some(pos) => indicators[pos].values[idx] = Value::Int(1),
                None => {
                    return Err(Error::Value {
                        column: column.name.clone(),
                        row: row_ids.get(idx).copied().unwrap_or(idx + 1),
                        value: key,
                    })
                }
            }
        }
        Ok(indicators)
    }
}
