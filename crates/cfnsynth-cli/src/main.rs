use anyhow::{bail, Context};
use cfnsynth::app::{build_stack, open_writer, template_file_name};
use cfnsynth::config::AppConfig;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cfnsynth")]
#[command(about = "CloudFormation template synthesizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Synthesizes the app and writes its template and manifest.
    Synth {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Validate and report without writing files.
        #[arg(long)]
        dry_run: bool,
    },
    /// Checks the app for validation errors.
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct Manifest {
    version: &'static str,
    synthesized_at: String,
    stacks: Vec<ManifestStack>,
}

#[derive(Debug, Serialize)]
struct ManifestStack {
    name: String,
    template: String,
    resources: usize,
    bytes: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Synth {
            config,
            output,
            dry_run,
        } => {
            let mut loaded = load(&config)?;
            if let Some(dir) = output {
                loaded.output.dir = dir.to_string_lossy().to_string();
            }

            let stack = build_stack(&loaded)?;
            let template = stack.synthesize()?;

            if dry_run {
                println!(
                    "stack {} is valid: {} resource(s), {} output(s)",
                    stack.name(),
                    template.resources.len(),
                    template.outputs.len()
                );
                return Ok(());
            }

            let mut writer = open_writer(&loaded.output)
                .with_context(|| format!("failed to open output dir {}", loaded.output.dir))?;
            let bytes = writer.write_template(stack.name(), &template)?;
            writer.close()?;

            let manifest = Manifest {
                version: env!("CARGO_PKG_VERSION"),
                synthesized_at: Utc::now().to_rfc3339(),
                stacks: vec![ManifestStack {
                    name: stack.name().to_string(),
                    template: template_file_name(&loaded.output, stack.name()),
                    resources: template.resources.len(),
                    bytes,
                }],
            };
            let manifest_path = Path::new(&loaded.output.dir).join("manifest.json");
            fs::write(&manifest_path, serde_json::to_vec_pretty(&manifest)?)
                .with_context(|| format!("failed to write {}", manifest_path.display()))?;
            info!(path = %manifest_path.display(), "wrote manifest");
        }
        Commands::Validate { config } => {
            let loaded = load(&config)?;
            let stack = build_stack(&loaded)?;
            match stack.synthesize() {
                Ok(template) => println!(
                    "stack {} is valid: {} resource(s)",
                    stack.name(),
                    template.resources.len()
                ),
                Err(err) if !err.validation_errors().is_empty() => {
                    let count = err.validation_errors().len();
                    for error in err.validation_errors() {
                        println!("{error}");
                    }
                    warn!(stack = %stack.name(), errors = count, "validation failed");
                    bail!("{count} validation error(s)");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    Ok(())
}

/// `RUST_LOG` when set and valid, otherwise `info`.
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn load(path: &Path) -> anyhow::Result<AppConfig> {
    AppConfig::from_path(path).with_context(|| format!("failed to load {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_filter_honours_rust_log_level() {
        std::env::set_var("RUST_LOG", "debug");
        assert_eq!(log_filter().to_string(), "debug");

        std::env::remove_var("RUST_LOG");
        assert_eq!(log_filter().to_string(), "info");
    }
}
