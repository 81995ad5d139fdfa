//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Subtrans CLI - Translate a content subtree into a new language
///
/// Walks every location below a parent node and creates, for each content
/// item, a new translation copied from a reference language.
#[derive(Parser, Debug)]
#[command(
    name = "subtrans",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "SUBTRANS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate a subtree into a given language, based on a reference language
    TranslateSubtree(TranslateSubtreeArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the translate-subtree command
#[derive(Parser, Debug, Clone)]
pub struct TranslateSubtreeArgs {
    /// The subtree's parent node (location) id
    #[arg(value_name = "PARENT_NODE_ID")]
    pub parent_node_id: u64,

    /// The language used as base, e.g. eng-GB
    #[arg(value_name = "REFERENCE_LANGUAGE")]
    pub reference_language: String,

    /// The new language, e.g. fre-FR
    #[arg(value_name = "TARGET_LANGUAGE")]
    pub target_language: String,

    /// If an object is already translated, do not modify it
    #[arg(long)]
    pub escape_translated: bool,

    /// Repository snapshot file
    #[arg(short, long, env = "SUBTRANS_REPOSITORY", value_name = "PATH")]
    pub repository: Option<PathBuf>,

    /// Prefix prepended to reference image ids when re-linking images
    #[arg(long, env = "SUBTRANS_IMAGE_BASE_PATH", value_name = "PATH")]
    pub image_base_path: Option<String>,

    /// Do not collect locations deeper than this below the parent node
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Id of the user the repository is accessed as
    #[arg(long, value_name = "ID")]
    pub user_id: Option<u64>,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable line report
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_translate_subtree_arguments() {
        let cli = Cli::parse_from([
            "subtrans",
            "translate-subtree",
            "2",
            "eng-GB",
            "fre-FR",
            "--escape-translated",
            "--max-depth",
            "3",
        ]);

        match cli.command {
            Commands::TranslateSubtree(args) => {
                assert_eq!(args.parent_node_id, 2);
                assert_eq!(args.reference_language, "eng-GB");
                assert_eq!(args.target_language, "fre-FR");
                assert!(args.escape_translated);
                assert_eq!(args.max_depth, Some(3));
                assert_eq!(args.user_id, None);
            }
            other => panic!("Unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parent_node_id_must_be_numeric() {
        let result = Cli::try_parse_from(["subtrans", "translate-subtree", "root", "eng-GB", "fre-FR"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbosity_level() {
        let cli = Cli::parse_from(["subtrans", "-vv", "completions", "bash"]);
        assert_eq!(cli.verbosity_level(), 2);

        let quiet = Cli::parse_from(["subtrans", "--quiet", "completions", "bash"]);
        assert_eq!(quiet.verbosity_level(), 0);
    }

    #[test]
    fn test_global_output_format() {
        let cli = Cli::parse_from([
            "subtrans",
            "translate-subtree",
            "2",
            "eng-GB",
            "fre-FR",
            "-o",
            "json-pretty",
        ]);
        assert_eq!(cli.output, OutputFormat::JsonPretty);
    }
}
