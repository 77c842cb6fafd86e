use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::errors::ProvisionError;

/// A single row returned by the gateway, columns keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowData {
    pub columns: HashMap<String, ColumnValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnValue {
    Text(String),
    Int(i32),
    BigInt(i64),
    Boolean(bool),
    List(Vec<ColumnValue>),
    Set(Vec<ColumnValue>),
    Map(HashMap<String, ColumnValue>),
    Null,
}

impl ColumnValue {
    pub fn text(value: impl Into<String>) -> Self {
        ColumnValue::Text(value.into())
    }

    pub fn text_set<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnValue::Set(values.into_iter().map(|v| ColumnValue::Text(v.into())).collect())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnValue::Text(_) => "text",
            ColumnValue::Int(_) => "int",
            ColumnValue::BigInt(_) => "bigint",
            ColumnValue::Boolean(_) => "boolean",
            ColumnValue::List(_) => "list",
            ColumnValue::Set(_) => "set",
            ColumnValue::Map(_) => "map",
            ColumnValue::Null => "null",
        }
    }
}

impl RowData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: ColumnValue) -> Self {
        self.columns.insert(column.to_string(), value);
        self
    }

    fn column(&self, column: &str) -> Result<&ColumnValue, ProvisionError> {
        self.columns
            .get(column)
            .ok_or_else(|| ProvisionError::InvalidMetadata(format!("missing column {}", column)))
    }

    fn mismatch(column: &str, expected: &str, found: &ColumnValue) -> ProvisionError {
        ProvisionError::InvalidMetadata(format!(
            "column {} is {}, expected {}",
            column,
            found.type_name(),
            expected
        ))
    }

    pub fn text(&self, column: &str) -> Result<String, ProvisionError> {
        match self.column(column)? {
            ColumnValue::Text(value) => Ok(value.clone()),
            other => Err(Self::mismatch(column, "text", other)),
        }
    }

    pub fn boolean(&self, column: &str) -> Result<bool, ProvisionError> {
        match self.column(column)? {
            ColumnValue::Boolean(value) => Ok(*value),
            other => Err(Self::mismatch(column, "boolean", other)),
        }
    }

    /// Reads a `set<text>` column. Empty collections are stored as null.
    pub fn text_set(&self, column: &str) -> Result<BTreeSet<String>, ProvisionError> {
        match self.columns.get(column) {
            None | Some(ColumnValue::Null) => Ok(BTreeSet::new()),
            Some(ColumnValue::Set(items)) | Some(ColumnValue::List(items)) => items
                .iter()
                .map(|item| match item {
                    ColumnValue::Text(value) => Ok(value.clone()),
                    other => Err(Self::mismatch(column, "set<text>", other)),
                })
                .collect(),
            Some(other) => Err(Self::mismatch(column, "set<text>", other)),
        }
    }

    pub fn text_map(&self, column: &str) -> Result<BTreeMap<String, String>, ProvisionError> {
        match self.columns.get(column) {
            None | Some(ColumnValue::Null) => Ok(BTreeMap::new()),
            Some(ColumnValue::Map(entries)) => entries
                .iter()
                .map(|(key, value)| match value {
                    ColumnValue::Text(text) => Ok((key.clone(), text.clone())),
                    other => Err(Self::mismatch(column, "map<text, text>", other)),
                })
                .collect(),
            Some(other) => Err(Self::mismatch(column, "map<text, text>", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyLevel {
    Any,
    One,
    Two,
    Three,
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    LocalOne,
}

impl From<ConsistencyLevel> for scylla::statement::Consistency {
    fn from(level: ConsistencyLevel) -> Self {
        use scylla::statement::Consistency;

        match level {
            ConsistencyLevel::Any => Consistency::Any,
            ConsistencyLevel::One => Consistency::One,
            ConsistencyLevel::Two => Consistency::Two,
            ConsistencyLevel::Three => Consistency::Three,
            ConsistencyLevel::Quorum => Consistency::Quorum,
            ConsistencyLevel::All => Consistency::All,
            ConsistencyLevel::LocalQuorum => Consistency::LocalQuorum,
            ConsistencyLevel::EachQuorum => Consistency::EachQuorum,
            ConsistencyLevel::LocalOne => Consistency::LocalOne,
        }
    }
}
