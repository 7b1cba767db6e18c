use std::path::Path;

use tracing::instrument;

use super::{Overrides, load_config};

#[derive(Debug, clap::Parser)]
/// Show the effective configuration
///
/// Prints the configuration file merged with any command line overrides, as
/// TOML. Values not set in the file show their defaults.
pub struct Command {
    #[command(flatten)]
    overrides: Overrides,
}

impl Command {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path, config_path: &Path) -> anyhow::Result<()> {
        let mut config = load_config(config_path, self.overrides)?;
        if config.project_name.is_none() {
            config.project_name = Some(config.project_name(root));
        }
        print!("{}", toml::to_string_pretty(&config)?);
        Ok(())
    }
}
