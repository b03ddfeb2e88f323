//! Tabular data types shared by every stage

use std::fmt;

use crate::error::{Error, Result};

/// Column names of the BigMart schema.
pub mod columns {
    pub const ITEM_IDENTIFIER: &str = "Item_Identifier";
    pub const ITEM_WEIGHT: &str = "Item_Weight";
    pub const ITEM_FAT_CONTENT: &str = "Item_Fat_Content";
    pub const ITEM_TYPE: &str = "Item_Type";
    pub const ITEM_MRP: &str = "Item_MRP";
    pub const OUTLET_IDENTIFIER: &str = "Outlet_Identifier";
    pub const OUTLET_ESTABLISHMENT_YEAR: &str = "Outlet_Establishment_Year";
    pub const OUTLET_SIZE: &str = "Outlet_Size";
    pub const OUTLET_LOCATION_TYPE: &str = "Outlet_Location_Type";
    pub const OUTLET_TYPE: &str = "Outlet_Type";
    pub const ITEM_OUTLET_SALES: &str = "Item_Outlet_Sales";

    /// Prefix of the one-hot indicator columns derived from `Outlet_Type`.
    pub const OUTLET_TYPE_PREFIX: &str = "Outlet_Type_";

    /// Every column a raw table must carry (the target is optional).
    pub const RAW: [&str; 10] = [
        ITEM_IDENTIFIER,
        ITEM_WEIGHT,
        ITEM_FAT_CONTENT,
        ITEM_TYPE,
        ITEM_MRP,
        OUTLET_IDENTIFIER,
        OUTLET_ESTABLISHMENT_YEAR,
        OUTLET_SIZE,
        OUTLET_LOCATION_TYPE,
        OUTLET_TYPE,
    ];
}

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Grouping key: the rendered value, `None` for nulls.
    pub fn key(&self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }
}

/// Record table: ordered, uniquely named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let mut table = Self {
            columns: Vec::with_capacity(columns.len()),
            n_rows: columns.first().map_or(0, Column::len),
        };
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn require(&self, name: &str) -> Result<&Column> {
        self.column(name).ok_or_else(|| Error::missing_column(name))
    }

    pub fn require_mut(&mut self, name: &str) -> Result<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::missing_column(name))
    }

    /// Appends a column; its length must match the table's row count.
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if self.has_column(&column.name) {
            return Err(Error::Schema(format!("duplicate column `{}`", column.name)));
        }
        if self.columns.is_empty() {
            self.n_rows = column.len();
        } else if column.len() != self.n_rows {
            return Err(Error::Schema(format!(
                "column `{}` has {} values, table has {} rows",
                column.name,
                column.len(),
                self.n_rows
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn drop_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.position(name)?;
        Some(self.columns.remove(idx))
    }

    /// Moves `name` to the last position. Returns `false` if it is absent.
    pub fn move_to_end(&mut self, name: &str) -> bool {
        match self.drop_column(name) {
            Some(column) => {
                self.columns.push(column);
                true
            }
            None => false,
        }
    }

    /// Keeps the rows whose mask entry is `true`.
    pub fn retain_rows(&mut self, mask: &[bool]) {
        debug_assert_eq!(mask.len(), self.n_rows);
        for column in &mut self.columns {
            let mut keep = mask.iter();
            column.values.retain(|_| *keep.next().unwrap_or(&false));
        }
        self.n_rows = mask.iter().filter(|k| **k).count();
    }

    /// New table holding the named columns in the given order.
    pub fn select(&self, names: &[&str]) -> Result<Table> {
        let columns = names
            .iter()
            .map(|name| self.require(name).cloned())
            .collect::<Result<Vec<_>>>()?;
        let mut table = Table::from_columns(columns)?;
        table.n_rows = self.n_rows;
        Ok(table)
    }

    pub fn row(&self, idx: usize) -> Vec<&Value> {
        self.columns.iter().map(|c| &c.values[idx]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_columns(vec![
            Column::new("a", vec![1i64.into(), 2i64.into(), 3i64.into()]),
            Column::new("b", vec!["x".into(), Value::Null, "z".into()]),
        ])
        .unwrap()
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let err = Table::from_columns(vec![
            Column::new("a", vec![Value::Null]),
            Column::new("b", vec![]),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn duplicate_columns_are_rejected() {
        let mut table = sample();
        assert!(table.push_column(Column::new("a", vec![Value::Null; 3])).is_err());
    }

    #[test]
    fn retain_rows_filters_every_column() {
        let mut table = sample();
        table.retain_rows(&[true, false, true]);
        assert_eq!(table.n_rows(), 2);
        assert_eq!(
            table.column("b").unwrap().values,
            vec![Value::from("x"), Value::from("z")]
        );
    }

    #[test]
    fn move_to_end_reorders() {
        let mut table = sample();
        assert!(table.move_to_end("a"));
        assert_eq!(table.column_names(), vec!["b", "a"]);
        assert!(!table.move_to_end("missing"));
    }

    #[test]
    fn select_keeps_row_count_and_order() {
        let table = sample().select(&["b", "a"]).unwrap();
        assert_eq!(table.column_names(), vec!["b", "a"]);
        assert_eq!(table.n_rows(), 3);
        assert!(sample().select(&["c"]).is_err());
    }

    #[test]
    fn values_render_for_output() {
        assert_eq!(Value::Float(12.5).to_string(), "12.5");
        assert_eq!(Value::Int(21).to_string(), "21");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Null.key(), None);
        assert_eq!(Value::from(Some(1.5)), Value::Float(1.5));
    }
}
