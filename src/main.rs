use clap::Parser;
use label_improver::cli::commands::{cmd_analyze, cmd_probe};
use label_improver::cli::config::{Cli, Commands, load_config};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Analyze {
            url,
            output_dir,
            settle_ms,
            max_attempts,
        } => {
            cmd_analyze(
                &url,
                output_dir.as_deref(),
                settle_ms,
                max_attempts,
                cli.model.as_deref(),
                &config,
            )?;
        }
        Commands::Probe { requests, models } => {
            let models = match cli.model {
                Some(m) => vec![m],
                None => models,
            };
            cmd_probe(&models, requests, &config)?;
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays the human-readable summary.
/// `RUST_LOG` overrides the -v count.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
