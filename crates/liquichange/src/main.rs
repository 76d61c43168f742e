//! liquichange CLI
//!
//! Renders JSON changelog definitions to Liquibase XML.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use liquichange::prelude::*;

/// Liquibase changelogs, built in Rust.
#[derive(Parser)]
#[command(name = "liquichange")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a changelog definition to XML.
    Render {
        /// JSON changelog definition.
        input: PathBuf,

        /// Output file (stdout if not specified).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Text encoding of the document.
        #[arg(short, long, env = "LIQUICHANGE_ENCODING", default_value = "UTF-8")]
        encoding: Encoding,

        /// Spaces per indentation level.
        #[arg(long, default_value_t = 2, conflicts_with = "compact")]
        indent: usize,

        /// Write the document body on a single line.
        #[arg(long)]
        compact: bool,
    },

    /// Validate a changelog definition and report duplicate changeset ids.
    Check {
        /// JSON changelog definition.
        input: PathBuf,
    },
}

fn load(path: &Path) -> anyhow::Result<Changelog> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read definition '{}'", path.display()))?;
    let changelog = Changelog::from_json(&json)?;
    debug!(
        path = %path.display(),
        changesets = changelog.count_changesets(),
        "Loaded definition"
    );
    Ok(changelog)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging; stdout is reserved for the document
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Render {
            input,
            output,
            encoding,
            indent,
            compact,
        } => {
            let changelog = load(&input)?;
            let options = RenderOptions::new().encoding(encoding);
            let options = if compact {
                options.compact()
            } else {
                options.indent(indent)
            };

            match output {
                Some(path) => changelog.save_with_options(&path, &options)?,
                None => changelog.write_to(std::io::stdout().lock(), &options)?,
            }
        }

        Commands::Check { input } => {
            let changelog = load(&input)?;
            let mut problems = 0;

            println!("\nChangesets:");
            println!("{:-<60}", "");
            for changeset in changelog.changesets() {
                match changeset.validate() {
                    Ok(()) => println!(
                        " [OK] {}/{} ({} changes)",
                        changeset.id(),
                        changeset.author(),
                        changeset.changes().len()
                    ),
                    Err(e) => {
                        problems += 1;
                        println!(" [!!] {}/{}: {}", changeset.id(), changeset.author(), e);
                    }
                }
            }
            println!();

            for (id, author) in changelog.duplicate_changeset_ids() {
                problems += 1;
                println!("Duplicate changeset id: {}/{}", id, author);
            }

            if problems > 0 {
                bail!("{} problem(s) found in '{}'", problems, input.display());
            }
            info!(
                "{} changesets in '{}' are valid.",
                changelog.count_changesets(),
                input.display()
            );
        }
    }

    Ok(())
}
