//! Loads requirement records from a JSON file.
//!
//! Two layouts are accepted:
//!
//! - a list of records: `[{"id": "PRJ-1", "title": "...", ...}, ...]`
//! - columns, as exported from a requirement sheet:
//!   `{"US_ID": ["PRJ-1", ...], "Titre": ["...", ...], ...}`
//!
//! Column headers are matched through the aliases on
//! [`RequirementRecord`]. A list wrapped as `{"requirements": [...]}` is
//! accepted too.

use casegen_domain::RequirementRecord;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RequirementsError {
    #[error("Cannot read requirements file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid requirements JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported requirements layout: {0}")]
    Layout(String),
}

pub fn load_requirements(path: &Path) -> Result<Vec<RequirementRecord>, RequirementsError> {
    let content = std::fs::read_to_string(path).map_err(|source| RequirementsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_requirements(&content)
}

pub fn parse_requirements(content: &str) -> Result<Vec<RequirementRecord>, RequirementsError> {
    match serde_json::from_str::<Value>(content)? {
        Value::Array(items) => records_from_list(items),
        Value::Object(mut map) => match map.remove("requirements") {
            Some(Value::Array(items)) => records_from_list(items),
            Some(_) => Err(RequirementsError::Layout(
                "\"requirements\" must be a list".to_string(),
            )),
            None => records_from_columns(map),
        },
        other => Err(RequirementsError::Layout(format!(
            "expected a list or an object, found {}",
            type_name(&other)
        ))),
    }
}

fn records_from_list(items: Vec<Value>) -> Result<Vec<RequirementRecord>, RequirementsError> {
    items
        .into_iter()
        .map(|item| serde_json::from_value(normalize(item)).map_err(RequirementsError::from))
        .collect()
}

fn records_from_columns(
    map: Map<String, Value>,
) -> Result<Vec<RequirementRecord>, RequirementsError> {
    let mut columns = Vec::with_capacity(map.len());
    let mut rows = 0;
    for (name, value) in map {
        let Value::Array(values) = value else {
            return Err(RequirementsError::Layout(format!(
                "column \"{name}\" is not a list"
            )));
        };
        rows = rows.max(values.len());
        columns.push((name, values));
    }

    (0..rows)
        .map(|i| {
            let row: Map<String, Value> = columns
                .iter()
                .filter_map(|(name, values)| values.get(i).map(|v| (name.clone(), v.clone())))
                .collect();
            serde_json::from_value(normalize(Value::Object(row))).map_err(RequirementsError::from)
        })
        .collect()
}

/// Sheet exports carry numbers and nulls in text columns.
fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter_map(|(k, v)| match v {
                    Value::Null => None,
                    Value::String(_) => Some((k, v)),
                    other => Some((k, Value::String(other.to_string()))),
                })
                .collect(),
        ),
        other => other,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
