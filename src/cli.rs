use std::path::{Path, PathBuf};

mod assemble;
mod config;
mod init;
mod merge;
mod terminal;

use clap::ArgAction;
use reqstool::{Config, domain::CONFIG_FILE_NAME};

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the root of the project
    #[arg(short = 'C', long, default_value = ".", global = true)]
    root: PathBuf,

    /// Configuration file [default: <ROOT>/reqstool.toml]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let config_path = self
            .config
            .unwrap_or_else(|| self.root.join(CONFIG_FILE_NAME));

        self.command
            .unwrap_or_default()
            .run(&self.root, &config_path)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Merge annotations and assemble the archive (default)
    Assemble(assemble::Command),

    /// Merge annotations only
    Merge(merge::Command),

    /// Write a default configuration file
    Init(init::Command),

    /// Show the effective configuration
    Config(config::Command),
}

impl Default for Command {
    fn default() -> Self {
        Self::Assemble(assemble::Command::default())
    }
}

impl Command {
    fn run(self, root: &Path, config_path: &Path) -> anyhow::Result<()> {
        match self {
            Self::Assemble(command) => command.run(root, config_path)?,
            Self::Merge(command) => command.run(root, config_path)?,
            Self::Init(command) => command.run(config_path)?,
            Self::Config(command) => command.run(root, config_path)?,
        }
        Ok(())
    }
}

/// Command line overrides of configuration values.
#[derive(Debug, Default, clap::Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct Overrides {
    /// Project name, naming the archive's top-level directory
    #[arg(long)]
    project_name: Option<String>,

    /// Project version, written to the manifest
    #[arg(long)]
    project_version: Option<String>,

    /// Directory holding the dataset files
    #[arg(long, value_name = "DIR")]
    dataset_path: Option<PathBuf>,

    /// Directory the annotations and archive are written to
    #[arg(long, value_name = "DIR")]
    output_directory: Option<PathBuf>,

    /// Test result glob pattern, relative to the root (repeatable; replaces
    /// the configured patterns)
    #[arg(long = "test-results", value_name = "GLOB")]
    test_results: Vec<String>,

    /// Skip the whole run
    #[arg(long)]
    skip: bool,

    /// Merge annotations but do not assemble the archive
    #[arg(long)]
    skip_assemble: bool,

    /// Do not attach the archive for publishing
    #[arg(long)]
    skip_attach: bool,

    /// Keep test result directories inside the archive
    #[arg(long)]
    preserve_test_result_paths: bool,
}

impl Overrides {
    fn apply(self, config: &mut Config) {
        if let Some(name) = self.project_name {
            config.project_name = Some(name);
        }
        if let Some(version) = self.project_version {
            config.project_version = version;
        }
        if let Some(path) = self.dataset_path {
            config.dataset_path = path;
        }
        if let Some(path) = self.output_directory {
            config.output_directory = path;
        }
        if !self.test_results.is_empty() {
            config.test_results = self.test_results;
        }
        config.skip |= self.skip;
        config.skip_assemble_zip_artifact |= self.skip_assemble;
        config.skip_attach_zip_artifact |= self.skip_attach;
        config.preserve_test_result_paths |= self.preserve_test_result_paths;
    }
}

/// Loads the configuration file (if any) and applies the overrides.
fn load_config(config_path: &Path, overrides: Overrides) -> anyhow::Result<Config> {
    let mut config = Config::load_or_default(config_path)?;
    overrides.apply(&mut config);
    Ok(config)
}
