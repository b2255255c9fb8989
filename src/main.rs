use anyhow::Context;
use clap::Parser;
use eto_processor::cli::{run, Cli};
use eto_processor::utils::init_tracing;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet, cli.log_file.as_deref())
        .context("failed to initialise logging")?;

    run(cli).context("eto-processor failed")
}
