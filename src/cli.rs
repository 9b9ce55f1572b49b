use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::{Config, OutputFormat};
use crate::graph::Snapshot;
use crate::output::{export_report, export_secure_report, print_secure_summary, print_summary};
use crate::report::SecureReport;
use crate::secure::{PluginRegistry, PreviewCipher, SecurePropertyResolver};
use crate::validation::validate_graph;

#[derive(Parser)]
#[command(name = "lineage")]
#[command(author, version, about = "Fetch artifact dependency checker", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./lineage.toml and friends)
    #[arg(short, long, global = true, env = "LINEAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every fetch task in a configuration snapshot
    Validate {
        /// Snapshot file (TOML, JSON or YAML)
        snapshot: PathBuf,
    },
    /// List the plain-text values secure plugin settings would encrypt
    Secure {
        snapshot: PathBuf,

        /// Plugin metadata file declaring which fetch settings are secure
        #[arg(long)]
        plugins: Option<PathBuf>,
    },
}

impl Cli {
    /// Runs the selected command. Returns `false` when validation found
    /// invalid fetch tasks.
    pub fn execute(&self) -> Result<bool> {
        let config = Config::load(self.config.as_deref())?;
        let format = self.format.unwrap_or(config.output.format);
        let pretty = self.pretty || config.output.pretty;

        match &self.command {
            Commands::Validate { snapshot } => self.execute_validate(snapshot, format, pretty),
            Commands::Secure { snapshot, plugins } => {
                let plugins = plugins.as_deref().or(config.plugins.metadata_file.as_deref());
                self.execute_secure(snapshot, plugins, format, pretty)?;
                Ok(true)
            }
        }
    }

    fn execute_validate(&self, snapshot: &Path, format: OutputFormat, pretty: bool) -> Result<bool> {
        info!("Validating fetch tasks in {}", snapshot.display());

        let graph = Snapshot::load(snapshot)?.into_graph()?;
        let report = validate_graph(&graph);

        if self.output.is_none() && format == OutputFormat::Summary {
            print_summary(&report);
        } else {
            self.emit(|output| export_report(&report, format, pretty, output))?;
        }

        Ok(report.is_valid())
    }

    fn execute_secure(
        &self,
        snapshot: &Path,
        plugins: Option<&Path>,
        format: OutputFormat,
        pretty: bool,
    ) -> Result<()> {
        info!("Resolving secure properties in {}", snapshot.display());

        let graph = Snapshot::load(snapshot)?.into_graph()?;
        let registry = match plugins {
            Some(path) => PluginRegistry::load(path)?,
            None => {
                warn!("No plugin metadata configured; no setting will be treated as secure");
                PluginRegistry::new()
            }
        };

        let resolver = SecurePropertyResolver::new(&registry, PreviewCipher);
        let secured = resolver.encrypt_graph(&graph)?;
        let report = SecureReport::new(secured.secured);

        if self.output.is_none() && format == OutputFormat::Summary {
            print_secure_summary(&report);
            Ok(())
        } else {
            self.emit(|output| export_secure_report(&report, format, pretty, output))
        }
    }

    fn emit(&self, write: impl FnOnce(&mut dyn Write) -> Result<()>) -> Result<()> {
        if let Some(output_path) = &self.output {
            let mut file = File::create(output_path)
                .with_context(|| format!("Failed to create output file: {}", output_path.display()))?;
            write(&mut file)?;
            info!("Report written to: {}", output_path.display());
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write(&mut handle)?;
        }
        Ok(())
    }
}
