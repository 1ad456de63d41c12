//! In-memory string table used between fetch and upload.
//!
//! Census responses are arrays of rows whose first row holds the field
//! labels. [`Table`] keeps those labels separately from the body and
//! supports the handful of reshaping steps the pipeline needs: tagging
//! rows with a constant column, stacking tables, renaming labels and
//! CSV (de)serialization.

use csv::{ReaderBuilder, Terminator, WriterBuilder};
use serde_json::Value;

use crate::error::EtlError;

/// Ordered mapping from a raw column label to a readable one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameMap(Vec<(String, String)>);

impl RenameMap {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns the new label for `from`, if one is mapped.
    pub fn get(&self, from: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == from)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Column labels plus rows of string cells. Every row is as wide as
/// `columns`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Builds a table from labels and rows, rejecting ragged rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, String> {
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns.len())
        {
            return Err(format!(
                "row {} has {} cells but the header has {}",
                idx + 1,
                row.len(),
                columns.len()
            ));
        }
        Ok(Self { columns, rows })
    }

    /// Promotes the first row of a Census-style array of rows to labels.
    ///
    /// Strings are kept verbatim, `null` becomes an empty cell and other
    /// scalars use their JSON text.
    pub fn from_json_rows(raw: Vec<Vec<Value>>) -> Result<Self, String> {
        let mut rows = raw
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect::<Vec<String>>());
        let columns: Vec<String> = rows
            .next()
            .ok_or_else(|| "response contains no header row".to_string())?;
        Self::new(columns, rows.collect())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of the column labelled `name`, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// Appends a column holding `value` on every row.
    pub fn with_constant_column(mut self, name: &str, value: &str) -> Self {
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(value.to_string());
        }
        self
    }

    /// Stacks tables in order. Labels must match the first table's exactly.
    pub fn concat(tables: Vec<Table>) -> Result<Table, EtlError> {
        let mut iter = tables.into_iter();
        let mut combined = iter.next().ok_or(EtlError::EmptyInput)?;

        for table in iter {
            if table.columns != combined.columns {
                return Err(EtlError::SchemaMismatch {
                    expected: combined.columns,
                    found: table.columns,
                });
            }
            combined.rows.extend(table.rows);
        }

        Ok(combined)
    }

    /// Replaces labels found in `map`; rows are untouched.
    pub fn rename(mut self, map: &RenameMap) -> Self {
        for label in &mut self.columns {
            if let Some(new) = map.get(label) {
                *label = new.to_string();
            }
        }
        self
    }

    /// Serializes as CSV: header row, one record per row, CRLF terminated.
    pub fn to_csv(&self) -> Result<Vec<u8>, EtlError> {
        let mut writer = WriterBuilder::new()
            .terminator(Terminator::CRLF)
            .from_writer(Vec::new());

        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }

        writer
            .into_inner()
            .map_err(|e| EtlError::Csv(e.into_error().into()))
    }

    /// Parses CSV produced by [`Table::to_csv`].
    pub fn from_csv(bytes: &[u8]) -> Result<Table, EtlError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes);

        let columns = reader.headers()?.iter().map(str::to_string).collect();
        let rows = reader
            .records()
            .map(|r| r.map(|rec| rec.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<Vec<String>>, _>>()?;

        Ok(Table { columns, rows })
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
