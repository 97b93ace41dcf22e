//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for casegen
#[derive(Parser, Debug)]
#[command(name = "casegen")]
#[command(author, version, about = "Multi-agent test case generation from requirements")]
#[command(long_about = r#"
casegen turns requirements into test cases with a team of LLM agents.

Each requirement goes through two conversations:
1. Context assembly: a planner steers retrieval and synthesis agents
   until a generation prompt is assembled
2. Critique: a generator drafts test cases, critics review them
   for a fixed number of rounds

Configuration files are loaded from (in priority order):
1. CASEGEN_* environment variables (e.g. CASEGEN_GENERATION__CRITIQUE_ROUNDS=5)
2. --config <path>     Explicit config file
3. ./casegen.toml      Project-level config
4. ~/.config/casegen/config.toml   Global config

Example:
  casegen requirements.json --project BANK
  casegen stories.json --format gherkin-parameterized --rounds 5 --jobs 4
  casegen stories.json --accessibility -vv
"#)]
pub struct Cli {
    /// JSON file with the requirements to process
    #[arg(value_name = "REQUIREMENTS_FILE", required_unless_present = "show_config")]
    pub requirements: Option<PathBuf>,

    /// Project id selecting the knowledge index
    #[arg(short, long, value_name = "ID")]
    pub project: Option<String>,

    /// Output format of the generated test cases
    #[arg(short, long, value_name = "NAME")]
    pub format: Option<String>,

    /// Number of critique rounds
    #[arg(long, value_name = "N")]
    pub rounds: Option<usize>,

    /// Turn budget of the context assembly conversation
    #[arg(long, value_name = "N")]
    pub context_turns: Option<usize>,

    /// Requirements processed concurrently
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Add the accessibility expert to the critique team
    #[arg(long)]
    pub accessibility: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Directory for results, history and transcripts
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Also write diagnostic logs to daily files in this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_full_invocation() {
        let cli = Cli::parse_from([
            "casegen",
            "stories.json",
            "--project",
            "BANK",
            "--format",
            "natural-language",
            "--rounds",
            "5",
            "--jobs",
            "2",
            "--accessibility",
            "-vv",
        ]);
        assert_eq!(cli.requirements, Some(PathBuf::from("stories.json")));
        assert_eq!(cli.project.as_deref(), Some("BANK"));
        assert_eq!(cli.rounds, Some(5));
        assert_eq!(cli.jobs, Some(2));
        assert!(cli.accessibility);
        assert_eq!(cli.verbose, 2);
        assert!(cli.context_turns.is_none());
    }

    #[test]
    fn test_requirements_file_is_required() {
        assert!(Cli::try_parse_from(["casegen"]).is_err());
        let cli = Cli::try_parse_from(["casegen", "--show-config"]).unwrap();
        assert!(cli.show_config);
    }
}
