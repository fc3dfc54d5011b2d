use clap::Parser;
use salesrank::cli::Cli;
use tracing_subscriber::EnvFilter;

fn init_tracing(cli: &Cli) {
    let default = if cli.verbose {
        "salesrank=debug"
    } else if cli.quiet {
        "salesrank=warn"
    } else {
        "salesrank=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    // Set before the runtime starts any worker threads.
    cli.export_flags();
    init_tracing(&cli);

    let result = tokio::runtime::Runtime::new()
        .map_err(anyhow::Error::from)
        .and_then(|rt| rt.block_on(cli.dispatch()));

    if let Err(e) = result {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}
