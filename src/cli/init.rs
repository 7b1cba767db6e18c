use std::path::Path;

use reqstool::Config;
use tracing::instrument;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Project name to record in the configuration
    #[arg(long)]
    project_name: Option<String>,
}

impl Command {
    #[instrument]
    pub fn run(self, config_path: &Path) -> anyhow::Result<()> {
        if config_path.exists() {
            anyhow::bail!("Configuration already exists at {}", config_path.display());
        }

        let config = Config {
            project_name: self.project_name,
            ..Config::default()
        };
        config.save(config_path)?;

        println!("Created {}", config_path.display());
        println!();
        println!("Next steps:");
        println!(
            "  Add your requirements to {}/requirements.yml",
            config.dataset_path.display()
        );
        println!("  reqstool assemble");

        Ok(())
    }
}
