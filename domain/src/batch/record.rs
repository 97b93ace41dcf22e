//! Requirement records, the unit of work of a batch.

use crate::agent::entities::TaskContext;
use crate::config::OutputFormat;
use serde::{Deserialize, Serialize};

/// One requirement to generate test cases for.
///
/// Field names also accept the column headers of imported requirement
/// sheets (`US_ID`, `Titre`, ...). Missing fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequirementRecord {
    #[serde(alias = "US_ID", alias = "id_US")]
    pub id: Option<String>,
    #[serde(alias = "Titre", alias = "Title")]
    pub title: String,
    #[serde(alias = "Description")]
    pub description: String,
    #[serde(alias = "Règles de gestion", alias = "Business Rules")]
    pub business_rules: String,
    #[serde(alias = "Critères d'acceptance", alias = "Acceptance Criteria")]
    pub acceptance_criteria: String,
    #[serde(alias = "Paramètres", alias = "Parameters")]
    pub parameters: String,
}

impl RequirementRecord {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_business_rules(mut self, rules: impl Into<String>) -> Self {
        self.business_rules = rules.into();
        self
    }

    pub fn with_acceptance_criteria(mut self, criteria: impl Into<String>) -> Self {
        self.acceptance_criteria = criteria.into();
        self
    }

    pub fn with_parameters(mut self, parameters: impl Into<String>) -> Self {
        self.parameters = parameters.into();
        self
    }

    /// Identifier, or `no_id_<index>` when the record has none.
    pub fn id_or_index(&self, index: usize) -> String {
        match self.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("no_id_{index}"),
        }
    }

    /// Title and description joined, the text agents work from.
    pub fn requirement_text(&self) -> String {
        format!("{} {}", self.title.trim(), self.description.trim())
            .trim()
            .to_string()
    }

    /// Task context for this record. Parameters are kept only for
    /// formats that use them.
    pub fn task_context(&self, format: OutputFormat, project_id: &str) -> TaskContext {
        let parameters = if format.uses_parameters() {
            self.parameters.clone()
        } else {
            String::new()
        };
        TaskContext::new(self.requirement_text())
            .with_acceptance_criteria(self.acceptance_criteria.clone())
            .with_business_rules(self.business_rules.clone())
            .with_parameters(parameters)
            .with_project_id(project_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let record: RequirementRecord = serde_json::from_str(r#"{"title": "Login"}"#).unwrap();
        assert_eq!(record.title, "Login");
        assert_eq!(record.description, "");
        assert_eq!(record.id, None);
        assert_eq!(record.id_or_index(3), "no_id_3");
    }

    #[test]
    fn test_sheet_headers_accepted() {
        let record: RequirementRecord = serde_json::from_str(
            r#"{"US_ID": "PRJ-12", "Titre": "Login", "Description": "As a user...",
                "Règles de gestion": "RG1", "Critères d'acceptance": "CA1"}"#,
        )
        .unwrap();
        assert_eq!(record.id_or_index(0), "PRJ-12");
        assert_eq!(record.business_rules, "RG1");
        assert_eq!(record.acceptance_criteria, "CA1");
        assert_eq!(record.requirement_text(), "Login As a user...");
    }

    #[test]
    fn test_blank_id_falls_back() {
        let record = RequirementRecord::new("t", "d").with_id("  ");
        assert_eq!(record.id_or_index(7), "no_id_7");
    }

    #[test]
    fn test_parameters_only_for_parameterized_format() {
        let record = RequirementRecord::new("t", "d").with_parameters("amount=10");
        let plain = record.task_context(OutputFormat::GherkinPlain, "PRJ");
        assert!(plain.parameters.is_empty());
        let param = record.task_context(OutputFormat::GherkinParameterized, "PRJ");
        assert_eq!(param.parameters, "amount=10");
        assert_eq!(param.project_id, "PRJ");
    }
}
