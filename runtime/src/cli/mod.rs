//! CLI subcommand implementations for the salesrank binary.

pub mod doctor;
pub mod extract_cmd;
pub mod output;
pub mod progress;
pub mod scrape_cmd;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "salesrank", version)]
#[command(about = "Scrape monthly vehicle sales rankings into a spreadsheet")]
pub struct Cli {
    /// Machine-readable JSON on stdout.
    #[arg(long, global = true)]
    pub json: bool,
    /// Suppress progress and summaries.
    #[arg(long, short, global = true)]
    pub quiet: bool,
    /// Debug logging.
    #[arg(long, short, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scrape a range of months and export the aggregate (default)
    Scrape(scrape_cmd::ScrapeArgs),
    /// Run an extractor on a saved HTML page
    Extract(extract_cmd::ExtractArgs),
    /// Check that a Chromium executable is available
    Doctor,
}

impl Cli {
    /// Publish the global flags to the environment read by [`output`].
    pub fn export_flags(&self) {
        for (set, var) in [
            (self.json, output::JSON_ENV),
            (self.quiet, output::QUIET_ENV),
        ] {
            if set {
                std::env::set_var(var, "1");
            }
        }
    }

    pub async fn dispatch(self) -> anyhow::Result<()> {
        match self.command {
            None => scrape_cmd::run(scrape_cmd::ScrapeArgs::default()).await,
            Some(Commands::Scrape(args)) => scrape_cmd::run(args).await,
            Some(Commands::Extract(args)) => extract_cmd::run(args).await,
            Some(Commands::Doctor) => doctor::run().await,
        }
    }
}
