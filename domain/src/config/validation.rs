//! Configuration issues reported while loading settings.
//!
//! Issues never abort loading: the offending value falls back to its
//! default and the issue is surfaced to the user.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: a default was used instead.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A string field holds a value outside its known set.
    InvalidEnumValue {
        field: String,
        value: String,
        valid_values: Vec<String>,
    },
    /// A model field is empty.
    EmptyModelName { field: String },
    /// A turn, round or worker budget is zero.
    ZeroBudget { field: String },
    /// The critique score threshold is outside 0-10.
    ThresholdOutOfRange { value: String },
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Check turn and round budgets, reporting every zero.
pub fn check_budgets(budgets: &[(&str, usize)]) -> Vec<ConfigIssue> {
    budgets
        .iter()
        .filter(|(_, value)| *value == 0)
        .map(|(field, _)| {
            ConfigIssue::error(
                ConfigIssueCode::ZeroBudget {
                    field: field.to_string(),
                },
                format!("{field}: must be at least 1"),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_budgets() {
        let issues = check_budgets(&[
            ("generation.context_max_turns", 4),
            ("generation.critique_rounds", 0),
        ]);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_error());
        assert_eq!(
            issues[0].code,
            ConfigIssueCode::ZeroBudget {
                field: "generation.critique_rounds".to_string()
            }
        );
    }

    #[test]
    fn test_warning_constructor() {
        let issue = ConfigIssue::warning(
            ConfigIssueCode::EmptyModelName {
                field: "models.critic".to_string(),
            },
            "models.critic: empty, using default",
        );
        assert_eq!(issue.severity, Severity::Warning);
        assert!(!issue.is_error());
    }
}
