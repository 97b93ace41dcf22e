//! Column-oriented JSON result file
//!
//! The file holds one object mapping each column name to its values, the
//! same shape [`load_requirements`](crate::requirements::load_requirements)
//! accepts, so results can be fed back in.

use casegen_application::{ResultSink, SinkError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct JsonColumnSink {
    path: PathBuf,
}

impl JsonColumnSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Every column must have as many rows as the first one.
fn check_columns(columns: &BTreeMap<String, Vec<String>>) -> Result<usize, SinkError> {
    let mut iter = columns.values();
    let expected = iter.next().map_or(0, Vec::len);
    for (column, values) in columns {
        if values.len() != expected {
            return Err(SinkError::RaggedColumns {
                column: column.clone(),
                found: values.len(),
                expected,
            });
        }
    }
    Ok(expected)
}

impl ResultSink for JsonColumnSink {
    fn write(&self, columns: &BTreeMap<String, Vec<String>>) -> Result<PathBuf, SinkError> {
        let rows = check_columns(columns)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(columns)
            .map_err(|e| SinkError::Serialization(e.to_string()))?;
        std::fs::write(&self.path, json)?;

        info!(path = %self.path.display(), rows, columns = columns.len(), "Results written");
        Ok(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> BTreeMap<String, Vec<String>> {
        BTreeMap::from([
            ("id_US".to_string(), vec!["PRJ-1".to_string(), "PRJ-2".to_string()]),
            ("Test Cases".to_string(), vec!["[]".to_string(), "Error: timeout".to_string()]),
        ])
    }

    #[test]
    fn test_write_columns() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonColumnSink::new(dir.path().join("out").join("results.json"));

        let path = sink.write(&columns()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["id_US"][1], "PRJ-2");
        assert_eq!(json["Test Cases"][1], "Error: timeout");
    }

    #[test]
    fn test_ragged_columns_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonColumnSink::new(dir.path().join("results.json"));
        let mut columns = columns();
        columns.insert("Title".to_string(), vec!["Login".to_string()]);

        match sink.write(&columns) {
            Err(SinkError::RaggedColumns { column, found, expected }) => {
                assert_eq!(column, "Title");
                assert_eq!(found, 1);
                assert_eq!(expected, 2);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(!sink.path().exists());
    }
}
