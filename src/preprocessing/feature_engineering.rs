//! Feature engineering for the BigMart sales tables
//!
//! Turns a raw record table into the numeric table the regression is fitted
//! on. The steps run in a fixed order: later ones rely on the labels the
//! earlier ones normalized.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::preprocessing::discretization::QuantileBuckets;
use crate::preprocessing::encoding::{
    self, OneHotEncoder, FAT_CONTENT_NOT_APPLICABLE, LOCATION_TYPE_CODES, NON_EDIBLE_ITEM_TYPES,
    NON_PERISHABLE, OUTLET_SIZE_CODES,
};
use crate::types::columns::*;
use crate::types::{Column, Table, Value};

/// Year outlet ages are measured from. Fixed so reruns reproduce the same table.
pub const REFERENCE_YEAR: i64 = 2020;

/// Number of price tiers `Item_MRP` is cut into.
pub const PRICE_TIERS: usize = 4;

/// Outlet size assigned to every row of an outlet with an unknown size.
pub const DEFAULT_OUTLET_SIZE: &str = "Small";

/// Columns that only exist before the transformation.
const RAW_ONLY: [&str; 5] = [
    ITEM_IDENTIFIER,
    ITEM_FAT_CONTENT,
    ITEM_TYPE,
    OUTLET_IDENTIFIER,
    OUTLET_TYPE,
];

/// Columns that survive the transformation in encoded form.
const DERIVED: [&str; 5] = [
    ITEM_WEIGHT,
    ITEM_MRP,
    OUTLET_ESTABLISHMENT_YEAR,
    OUTLET_SIZE,
    OUTLET_LOCATION_TYPE,
];

#[derive(Debug, Clone, Default)]
pub struct FeatureTransformer {
    outlet_types: OneHotEncoder,
}

impl FeatureTransformer {
    /// Indicator columns follow the `Outlet_Type` values of each input.
    pub fn new() -> Self {
        Self {
            outlet_types: OneHotEncoder::observed(),
        }
    }

    /// Indicator columns are exactly `Outlet_Type_<v>` for each `v` in `vocabulary`.
    pub fn with_outlet_types(vocabulary: Vec<String>) -> Self {
        Self {
            outlet_types: OneHotEncoder::frozen(vocabulary),
        }
    }

    pub fn outlet_type_vocabulary(&self) -> Option<&[String]> {
        self.outlet_types.vocabulary()
    }

    pub fn transform(&self, raw: &Table) -> Result<Table> {
        if is_prepared(raw) {
            tracing::info!("Table is already prepared, only normalizing the target column");
            let mut table = raw.clone();
            place_target_last(&mut table)?;
            return Ok(table);
        }
        for name in RAW {
            raw.require(name)?;
        }

        let mut table = raw.clone();
        // 1-based data row numbers of the input, kept aligned through row drops.
        let mut row_ids: Vec<usize> = (1..=table.n_rows()).collect();

        tracing::info!("Converting establishment year to outlet age");
        outlet_age(&mut table, &row_ids)?;

        tracing::info!("Unifying '{}' labels", ITEM_FAT_CONTENT);
        normalize_fat_labels(&mut table)?;

        tracing::info!("Imputing missing item weights");
        impute_item_weight(&mut table, &mut row_ids)?;

        tracing::info!("Imputing missing outlet sizes");
        impute_outlet_size(&mut table)?;

        tracing::info!("Suppressing fat content of non-edible item types");
        suppress_fat_content(&mut table, |t| NON_EDIBLE_ITEM_TYPES.contains(&t))?;

        tracing::info!("Grouping '{}' into coarse categories", ITEM_TYPE);
        group_item_types(&mut table)?;

        tracing::info!("Suppressing fat content of '{}' items", NON_PERISHABLE);
        suppress_fat_content(&mut table, |t| t == NON_PERISHABLE)?;

        tracing::info!("Bucketing item prices into {} tiers", PRICE_TIERS);
        bucket_prices(&mut table, &row_ids)?;

        tracing::info!("Dropping '{}' and '{}'", ITEM_TYPE, ITEM_FAT_CONTENT);
        table.drop_column(ITEM_TYPE);
        table.drop_column(ITEM_FAT_CONTENT);

        tracing::info!("Encoding ordinal columns");
        encoding::encode_ordinal(table.require_mut(OUTLET_SIZE)?, &OUTLET_SIZE_CODES, &row_ids)?;
        encoding::encode_ordinal(
            table.require_mut(OUTLET_LOCATION_TYPE)?,
            &LOCATION_TYPE_CODES,
            &row_ids,
        )?;

        tracing::info!("One-hot encoding '{}'", OUTLET_TYPE);
        let outlet_type = table
            .drop_column(OUTLET_TYPE)
            .ok_or_else(|| Error::missing_column(OUTLET_TYPE))?;
        for indicator in self
            .outlet_types
            .encode(&outlet_type, OUTLET_TYPE_PREFIX, &row_ids)?
        {
            table.push_column(indicator)?;
        }

        tracing::info!("Dropping '{}' and '{}'", ITEM_IDENTIFIER, OUTLET_IDENTIFIER);
        table.drop_column(ITEM_IDENTIFIER);
        table.drop_column(OUTLET_IDENTIFIER);

        place_target_last(&mut table)?;
        tracing::info!(
            "Table transformed: rows={}, columns={}",
            table.n_rows(),
            table.n_cols()
        );
        Ok(table)
    }
}

/// No raw-only column left and every derived column present in encoded form.
pub fn is_prepared(table: &Table) -> bool {
    let int_in = |name: &str, range: std::ops::RangeInclusive<i64>| {
        table.column(name).is_some_and(|c| {
            c.values
                .iter()
                .all(|v| matches!(v, Value::Int(code) if range.contains(code)))
        })
    };
    let numeric = |name: &str| {
        table.column(name).is_some_and(|c| {
            c.values
                .iter()
                .all(|v| matches!(v, Value::Int(_) | Value::Float(_)))
        })
    };

    RAW_ONLY.iter().all(|c| !table.has_column(c))
        && DERIVED.iter().all(|c| table.has_column(c))
        && int_in(ITEM_MRP, 1..=PRICE_TIERS as i64)
        && int_in(OUTLET_SIZE, 0..=2)
        && int_in(OUTLET_LOCATION_TYPE, 0..=2)
        && numeric(ITEM_WEIGHT)
        && numeric(OUTLET_ESTABLISHMENT_YEAR)
}

fn numeric(value: &Value, column: &str, row: usize) -> Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Text(text) => Err(Error::parse(
            format!("row {row}, column `{column}`"),
            format!("expected a number, found `{text}`"),
        )),
        other => Ok(other.as_f64()),
    }
}

fn outlet_age(table: &mut Table, row_ids: &[usize]) -> Result<()> {
    let column = table.require_mut(OUTLET_ESTABLISHMENT_YEAR)?;
    for (value, row) in column.values.iter_mut().zip(row_ids) {
        *value = match &*value {
            Value::Int(year) => Value::Int(REFERENCE_YEAR - year),
            Value::Float(year) => Value::Float(REFERENCE_YEAR as f64 - year),
            Value::Null => {
                return Err(Error::parse(
                    format!("row {row}, column `{OUTLET_ESTABLISHMENT_YEAR}`"),
                    "missing establishment year",
                ))
            }
            Value::Text(text) => {
                return Err(Error::parse(
                    format!("row {row}, column `{OUTLET_ESTABLISHMENT_YEAR}`"),
                    format!("expected a year, found `{text}`"),
                ))
            }
        };
    }
    Ok(())
}

fn normalize_fat_labels(table: &mut Table) -> Result<()> {
    for value in table.require_mut(ITEM_FAT_CONTENT)?.values.iter_mut() {
        if let Value::Text(label) = value {
            let normalized = encoding::normalize_fat_content(label).to_string();
            if normalized != *label {
                *label = normalized;
            }
        }
    }
    Ok(())
}

/// Most frequent value; ties go to the smallest.
fn mode(mut values: Vec<f64>) -> Option<f64> {
    values.sort_by(f64::total_cmp);
    let mut best: Option<(f64, usize)> = None;
    let mut start = 0;
    while start < values.len() {
        let end = start
            + values[start..]
                .iter()
                .take_while(|v| **v == values[start])
                .count();
        if best.map_or(true, |(_, count)| end - start > count) {
            best = Some((values[start], end - start));
        }
        start = end;
    }
    best.map(|(value, _)| value)
}

/// Fills unknown weights with the mode of the known weights of the same
/// product, then drops the rows still unknown.
fn impute_item_weight(table: &mut Table, row_ids: &mut Vec<usize>) -> Result<()> {
    let ids: Vec<Option<String>> = table
        .require(ITEM_IDENTIFIER)?
        .values
        .iter()
        .map(Value::key)
        .collect();
    let weights: Vec<Option<f64>> = table
        .require(ITEM_WEIGHT)?
        .values
        .iter()
        .zip(row_ids.iter())
        .map(|(v, row)| numeric(v, ITEM_WEIGHT, *row))
        .collect::<Result<_>>()?;

    let mut known: HashMap<&str, Vec<f64>> = HashMap::new();
    for (id, weight) in ids.iter().zip(&weights) {
        if let (Some(id), Some(weight)) = (id, weight) {
            known.entry(id.as_str()).or_default().push(*weight);
        }
    }
    let modes: HashMap<&str, f64> = known
        .into_iter()
        .filter_map(|(id, ws)| mode(ws).map(|m| (id, m)))
        .collect();

    let column = table.require_mut(ITEM_WEIGHT)?;
    let mut filled = 0;
    for ((value, weight), id) in column.values.iter_mut().zip(&weights).zip(&ids) {
        *value = match weight {
            Some(w) => Value::Float(*w),
            None => match id.as_deref().and_then(|id| modes.get(id)) {
                Some(m) => {
                    filled += 1;
                    tracing::debug!("Item {:?}: weight imputed as {}", id, m);
                    Value::Float(*m)
                }
                None => Value::Null,
            },
        };
    }

    let keep: Vec<bool> = column.values.iter().map(|v| !v.is_null()).collect();
    let dropped = keep.iter().filter(|k| !**k).count();
    table.retain_rows(&keep);
    let mut keep_iter = keep.iter();
    row_ids.retain(|_| *keep_iter.next().unwrap_or(&false));

    tracing::info!(
        "Weights imputed: {}, rows dropped without any known weight: {}",
        filled,
        dropped
    );
    Ok(())
}

/// Every outlet with at least one unknown size becomes a small outlet, on all
/// of its rows.
fn impute_outlet_size(table: &mut Table) -> Result<()> {
    let ids: Vec<Option<String>> = table
        .require(OUTLET_IDENTIFIER)?
        .values
        .iter()
        .map(Value::key)
        .collect();
    let sizes = table.require_mut(OUTLET_SIZE)?;

    let affected: HashSet<&Option<String>> = ids
        .iter()
        .zip(&sizes.values)
        .filter(|(_, size)| size.is_null())
        .map(|(id, _)| id)
        .collect();
    for outlet in &affected {
        tracing::debug!("Outlet {:?}: size set to {}", outlet, DEFAULT_OUTLET_SIZE);
    }

    for (value, id) in sizes.values.iter_mut().zip(&ids) {
        if affected.contains(id) {
            *value = Value::from(DEFAULT_OUTLET_SIZE);
        }
    }
    Ok(())
}

fn suppress_fat_content(table: &mut Table, item_type: impl Fn(&str) -> bool) -> Result<()> {
    let mask: Vec<bool> = table
        .require(ITEM_TYPE)?
        .values
        .iter()
        .map(|v| v.as_str().is_some_and(&item_type))
        .collect();
    let fat = table.require_mut(ITEM_FAT_CONTENT)?;
    for (value, suppress) in fat.values.iter_mut().zip(mask) {
        if suppress {
            *value = Value::from(FAT_CONTENT_NOT_APPLICABLE);
        }
    }
    Ok(())
}

fn group_item_types(table: &mut Table) -> Result<()> {
    for value in table.require_mut(ITEM_TYPE)?.values.iter_mut() {
        if let Some(group) = value.as_str().and_then(encoding::item_type_group) {
            *value = Value::from(group);
        }
    }
    Ok(())
}

fn bucket_prices(table: &mut Table, row_ids: &[usize]) -> Result<()> {
    let column = table.require_mut(ITEM_MRP)?;
    let prices = column
        .values
        .iter()
        .zip(row_ids)
        .map(|(v, row)| {
            numeric(v, ITEM_MRP, *row)?.ok_or_else(|| {
                Error::parse(format!("row {row}, column `{ITEM_MRP}`"), "missing price")
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    let buckets = QuantileBuckets::fit(&prices, PRICE_TIERS);
    tracing::debug!("Price tier edges: {:?}", buckets.inner_edges());
    column.values = prices
        .into_iter()
        .map(|price| Value::Int(buckets.bucket(price)))
        .collect();
    Ok(())
}

/// Target last; an all-null target is appended when the input had none.
fn place_target_last(table: &mut Table) -> Result<()> {
    if !table.move_to_end(ITEM_OUTLET_SALES) {
        tracing::info!("Adding empty '{}' column", ITEM_OUTLET_SALES);
        let n_rows = table.n_rows();
        table.push_column(Column::new(ITEM_OUTLET_SALES, vec![Value::Null; n_rows]))?;
    }
    Ok(())
}
