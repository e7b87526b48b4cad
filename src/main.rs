//! lithops-config
//!
//! Resolves the effective lithops configuration and prints it, or one of the
//! views handed to storage and compute clients.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use lithops_config::backends::BackendCategory;
use lithops_config::cli::{Cli, Command, View, build_overrides};
use lithops_config::config::{ConfigResolver, load_config_file};
use lithops_config::logging::{LogTarget, init_logging};
use std::path::Path;
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LogTarget::parse(&cli.log), cli.verbose)?;

    let resolver = ConfigResolver::new();
    let format = cli.format;

    match cli.command.unwrap_or(Command::Show) {
        Command::Which => {
            let (source, path) = resolver.sources().which(cli.config.is_some());
            match path.as_deref().or(cli.config.as_deref().map(Path::new)) {
                Some(path) => println!("{} ({})", path.display(), source),
                None => println!("{}", source),
            }
            Ok(())
        }
        Command::Backends => {
            for category in BackendCategory::ALL {
                println!("{}: {}", category, resolver.registry().ids(category).join(", "));
            }
            Ok(())
        }
        Command::Show => {
            let resolved = resolve(&resolver, cli.config.as_deref(), &cli.overrides)?;
            debug!(source = %resolved.source(), "Configuration resolved");
            print!("{}", format.render(resolved.config())?);
            Ok(())
        }
        Command::Extract { view } => {
            let resolved = resolve(&resolver, cli.config.as_deref(), &cli.overrides)?;
            let section = match view {
                View::Storage => resolved.storage_config(),
                View::Localhost => resolved.localhost_config(),
                View::Serverless => resolved.serverless_config(),
                View::Standalone => resolved.standalone_config(),
            }?;
            print!("{}", format.render(&section)?);
            Ok(())
        }
    }
}

fn resolve(
    resolver: &ConfigResolver,
    config_path: Option<&str>,
    assignments: &[lithops_config::cli::Assignment],
) -> Result<lithops_config::config::ResolvedConfig> {
    let overrides = build_overrides(assignments).map_err(|e| anyhow!(e))?;
    let explicit = config_path
        .map(|path| load_config_file(Path::new(path)))
        .transpose()
        .context("failed to load --config file")?;

    let resolved = resolver
        .resolve(explicit, &overrides)
        .context("failed to resolve configuration")?;

    for deprecation in resolved.deprecations() {
        eprintln!("Warning: {}", deprecation);
    }
    Ok(resolved)
}
