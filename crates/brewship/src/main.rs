mod cli;
mod commands;
mod tracing;

use crate::cli::Cli;
use crate::tracing::{TracingConfig, init_tracing};
use clap::Parser;

fn main() {
    let cli = Cli::parse();

    if let Err(error) = run(cli) {
        #[allow(clippy::print_stderr)]
        {
            eprintln!("{error:?}");
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> miette::Result<()> {
    init_tracing(TracingConfig {
        format: cli.log_format,
        level: cli.level.into(),
        ..Default::default()
    })?;

    let output = commands::execute(cli.command)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{output}");
    }
    Ok(())
}
