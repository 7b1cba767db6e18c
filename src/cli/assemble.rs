use std::path::Path;

use reqstool::{Outcome, task};
use tracing::instrument;

use super::{Overrides, load_config, terminal::Tone};

#[derive(Debug, Default, clap::Parser)]
#[command(about = "Merge annotations and assemble the reqstool archive")]
pub struct Command {
    #[command(flatten)]
    overrides: Overrides,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Command {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path, config_path: &Path) -> anyhow::Result<()> {
        let config = load_config(config_path, self.overrides)?;
        let outcome = task::run(root, &config)?;

        match self.output {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }
            OutputFormat::Table => Self::output_table(&outcome),
        }
        Ok(())
    }

    fn output_table(outcome: &Outcome) {
        match outcome {
            Outcome::Skipped => println!("{}", Tone::Dim.paint("Skipped")),
            Outcome::Merged { annotations } => {
                println!(
                    "{} {}",
                    Tone::Success.paint("Merged annotations into"),
                    annotations.display()
                );
                println!("{}", Tone::Dim.paint("Archive assembly skipped"));
            }
            Outcome::Assembled {
                annotations,
                report,
                attach,
            } => {
                println!(
                    "{} {}",
                    Tone::Success.paint("Merged annotations into"),
                    annotations.display()
                );
                println!(
                    "{} {} ({} entries, {} test results)",
                    Tone::Success.paint("Assembled"),
                    report.archive.display(),
                    report.entries.len(),
                    report.test_results
                );
                for entry in &report.entries {
                    println!("  {}", Tone::Info.paint(entry));
                }
                if report.test_results == 0 {
                    println!(
                        "{}",
                        Tone::Warning.paint("No test results matched the configured patterns")
                    );
                }
                if !attach {
                    println!("{}", Tone::Dim.paint("Archive will not be attached"));
                }
            }
        }
    }
}
