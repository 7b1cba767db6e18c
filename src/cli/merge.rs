use std::path::Path;

use tracing::instrument;

use super::{Overrides, load_config, terminal::Tone};

#[derive(Debug, clap::Parser)]
pub struct Command {
    #[command(flatten)]
    pub(super) overrides: Overrides,
}

impl Command {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path, config_path: &Path) -> anyhow::Result<()> {
        let config = load_config(config_path, self.overrides)?;
        if config.skip {
            println!("{}", Tone::Dim.paint("Skipped"));
            return Ok(());
        }

        let annotations = reqstool::task::merge_annotations(root, &config)?;
        println!(
            "{} {}",
            Tone::Success.paint("Merged annotations into"),
            annotations.display()
        );
        Ok(())
    }
}
