//! Test-case output format value object

use serde::{Deserialize, Serialize};

/// Format the generator is asked to write test cases in.
///
/// Each format carries an example embedded into the generator's
/// instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Gherkin scenarios without data parameters (default)
    GherkinPlain,
    /// Gherkin scenarios with `<parameter>` placeholders
    GherkinParameterized,
    /// Numbered natural-language steps
    NaturalLanguage,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::GherkinPlain
    }
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [
        OutputFormat::GherkinPlain,
        OutputFormat::GherkinParameterized,
        OutputFormat::NaturalLanguage,
    ];

    /// Stable identifier used in config files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::GherkinPlain => "gherkin-plain",
            OutputFormat::GherkinParameterized => "gherkin-parameterized",
            OutputFormat::NaturalLanguage => "natural-language",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OutputFormat::GherkinPlain => "Gherkin without parameters",
            OutputFormat::GherkinParameterized => "Gherkin with parameters",
            OutputFormat::NaturalLanguage => "Natural language",
        }
    }

    /// Whether requirement parameters are passed to the generator.
    pub fn uses_parameters(&self) -> bool {
        matches!(self, OutputFormat::GherkinParameterized)
    }

    /// Look a format up by identifier or display name (case-insensitive).
    ///
    /// Also accepts the labels used by existing requirement exports
    /// ("Gherkin sans paramètres", ...).
    pub fn parse(name: &str) -> Option<Self> {
        let needle = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|f| {
            needle == f.as_str()
                || needle == f.display_name().to_lowercase()
                || needle == f.legacy_label().to_lowercase()
        })
    }

    /// Like [`parse`](Self::parse) but unknown names fall back to the default.
    pub fn from_name_or_default(name: &str) -> Self {
        Self::parse(name).unwrap_or_default()
    }

    fn legacy_label(&self) -> &'static str {
        match self {
            OutputFormat::GherkinPlain => "Gherkin sans paramètres",
            OutputFormat::GherkinParameterized => "Gherkin avec paramètres",
            OutputFormat::NaturalLanguage => "Format language naturel",
        }
    }

    /// Example scenario shown to the generator.
    pub fn example(&self) -> &'static str {
        match self {
            OutputFormat::GherkinPlain => {
                r#"Requirement: Create my account - sign in to the application
Scenario 1: Passing case - successful sign-in
[Precondition]: The beneficiary already has an account
Given the beneficiary is on the home page,
and they enter a correct email and a correct password,
When they click the 'Sign in' button
Then they are authenticated and redirected to the Home page of their account."#
            }
            OutputFormat::GherkinParameterized => {
                r#"Requirement: Create my account - sign in to the application
Scenario 1: Passing case - successful sign-in
Given the data set of <user>
AND the beneficiary already has an account
AND the beneficiary is on the home page,
AND they enter the email <email> and the password <password>,
WHEN they click the 'Sign in' button
THEN they are authenticated and redirected to the Home page of their account.
AND the return code is <code>"#
            }
            OutputFormat::NaturalLanguage => {
                r#"Requirement: Sign in to the system
Scenario 1: Successful sign-in
Preconditions: The user already has an account
Actions:
1- I am on the login page
2- I enter my email address in a valid format
3- I enter my password of at least 8 characters
4- I see a sign-in success message
5- I am taken to the Home page.
Expected result: I am on the Home page."#
            }
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
