//! CLI command definitions for lithops-config
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::config::ConfigOverrides;
use crate::format::OutputFormat;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;

/// View produced by the `extract` subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    Storage,
    Localhost,
    Serverless,
    Standalone,
}

/// Resolve and inspect lithops configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file used as the explicit document (bypasses discovery)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override a field: section.key=value (repeatable)
    #[arg(short = 's', long = "set", value_name = "SECTION.KEY=VALUE", value_parser = parse_assignment, global = true)]
    pub overrides: Vec<Assignment>,

    /// Output format: yaml or json
    #[arg(short, long, default_value = "yaml", value_parser = parse_format, global = true)]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the fully resolved configuration (default if no subcommand given)
    Show,

    /// Print one consumer view of the resolved configuration
    Extract {
        #[arg(value_enum)]
        view: View,
    },

    /// Print which configuration source would be used
    Which,

    /// List the registered backends by category
    Backends,
}

/// One `--set` override.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub section: String,
    pub key: String,
    pub value: Value,
}

/// Parse `section.key=value`. The value is read as a YAML scalar, so numbers
/// and booleans keep their type.
pub fn parse_assignment(s: &str) -> Result<Assignment, String> {
    let (path, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected SECTION.KEY=VALUE, got '{}'", s))?;
    let (section, key) = path
        .split_once('.')
        .filter(|(section, key)| !section.is_empty() && !key.is_empty())
        .ok_or_else(|| format!("expected SECTION.KEY before '=', got '{}'", path))?;

    let value = match serde_yaml::from_str::<Value>(raw) {
        Ok(Value::Null) | Err(_) => Value::String(raw.to_string()),
        Ok(value) => value,
    };

    Ok(Assignment {
        section: section.to_string(),
        key: key.to_string(),
        value,
    })
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    OutputFormat::from_str(s).ok_or_else(|| format!("unknown format '{}' (expected yaml or json)", s))
}

/// Collect `--set` assignments into overrides.
///
/// Fails on the first assignment that targets a section overrides cannot reach.
pub fn build_overrides(assignments: &[Assignment]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::new();
    for a in assignments {
        if !overrides.set(&a.section, a.key.clone(), a.value.clone()) {
            return Err(format!(
                "cannot override section '{}' (expected lithops, localhost, serverless or standalone)",
                a.section
            ));
        }
    }
    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_assignment_types() {
        let a = parse_assignment("standalone.soft_dismantle_timeout=30").unwrap();
        assert_eq!(a.section, "standalone");
        assert_eq!(a.key, "soft_dismantle_timeout");
        assert_eq!(a.value, json!(30));

        let a = parse_assignment("standalone.auto_dismantle=false").unwrap();
        assert_eq!(a.value, json!(false));

        let a = parse_assignment("lithops.storage_bucket=my-bucket").unwrap();
        assert_eq!(a.value, json!("my-bucket"));

        let a = parse_assignment("lithops.storage_region=").unwrap();
        assert_eq!(a.value, json!(""));
    }

    #[test]
    fn test_parse_assignment_rejects_malformed() {
        assert!(parse_assignment("lithops.mode").is_err());
        assert!(parse_assignment("mode=localhost").is_err());
        assert!(parse_assignment(".mode=localhost").is_err());
    }

    #[test]
    fn test_build_overrides() {
        let assignments = vec![
            parse_assignment("lithops.mode=standalone").unwrap(),
            parse_assignment("standalone.backend=vm").unwrap(),
        ];
        let overrides = build_overrides(&assignments).unwrap();
        assert_eq!(overrides.lithops.unwrap()["mode"], json!("standalone"));
        assert_eq!(overrides.standalone.unwrap()["backend"], json!("vm"));

        let bad = vec![parse_assignment("aws_s3.region_name=us-east-1").unwrap()];
        assert!(build_overrides(&bad).is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::parse_from([
            "lithops-config",
            "--set",
            "lithops.mode=localhost",
            "-f",
            "json",
            "extract",
            "storage",
        ]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.overrides.len(), 1);
        assert!(matches!(
            cli.command,
            Some(Command::Extract {
                view: View::Storage
            })
        ));
    }
}
