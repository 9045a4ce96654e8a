//! Metadata rows returned by the content backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::MetadataError;

/// Column names of the photo index.
pub mod columns {
    pub const TITLE: &str = "title";
    pub const DISPLAY_NAME: &str = "_display_name";
    pub const MIME_TYPE: &str = "mime_type";
    pub const DATE_TAKEN: &str = "datetaken";
    pub const DATE_MODIFIED: &str = "date_modified";
    pub const DATE_ADDED: &str = "date_added";
    pub const ORIENTATION: &str = "orientation";
    pub const DATA: &str = "_data";
    pub const SIZE: &str = "_size";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

/// One row of column values.
///
/// Numeric getters read `NULL` as zero, matching how row stores hand out
/// unset numeric columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<String, Value>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, column: &str, value: Value) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: Value) {
        self.0.insert(column.to_string(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy every column of `other` into this row.
    pub fn merge(&mut self, other: Row) {
        self.0.extend(other.0);
    }

    /// Restrict the row to `columns`.
    ///
    /// # Errors
    ///
    /// `MissingColumn` for the first requested column the row lacks.
    pub fn project(&self, columns: &[&str]) -> Result<Row, MetadataError> {
        let mut projected = Row::new();
        for &column in columns {
            let value = self
                .get(column)
                .ok_or_else(|| MetadataError::MissingColumn(column.to_string()))?;
            projected.insert(column, value.clone());
        }
        Ok(projected)
    }

    fn require(&self, column: &str) -> Result<&Value, MetadataError> {
        self.get(column)
            .ok_or_else(|| MetadataError::MissingColumn(column.to_string()))
    }

    pub fn get_i64(&self, column: &str) -> Result<i64, MetadataError> {
        match self.require(column)? {
            Value::Null => Ok(0),
            Value::Integer(v) => Ok(*v),
            Value::Real(v) => Ok(*v as i64),
            Value::Text(s) => s.trim().parse().map_err(|_| MetadataError::TypeMismatch {
                column: column.to_string(),
                expected: "an integer",
            }),
        }
    }

    pub fn get_f64(&self, column: &str) -> Result<f64, MetadataError> {
        match self.require(column)? {
            Value::Null => Ok(0.0),
            Value::Integer(v) => Ok(*v as f64),
            Value::Real(v) => Ok(*v),
            Value::Text(s) => s.trim().parse().map_err(|_| MetadataError::TypeMismatch {
                column: column.to_string(),
                expected: "a number",
            }),
        }
    }

    /// Text value of `column`. `NULL` is a type mismatch.
    pub fn get_text(&self, column: &str) -> Result<&str, MetadataError> {
        match self.require(column)? {
            Value::Text(s) => Ok(s),
            _ => Err(MetadataError::TypeMismatch {
                column: column.to_string(),
                expected: "text",
            }),
        }
    }
}

impl FromIterator<(&'static str, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (&'static str, Value)>>(iter: I) -> Self {
        Row(iter
            .into_iter()
            .map(|(column, value)| (column.to_string(), value))
            .collect())
    }
}
