mod capture;
mod cli;
mod commands;
mod error;
mod output;

use clap::{Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use meshmap_config::Config;

use crate::cli::{Cli, ColorMode, Command, GlobalOpts};
use crate::commands::{Context, util};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let global = &cli.global;
    match cli.command {
        // Config commands never touch a capture
        Command::Config(args) => commands::config_cmd::handle(args, global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "meshmap", &mut std::io::stdout());
            Ok(())
        }

        // Everything else reads the config first
        Command::Replay(args) => commands::replay::handle(args, &build_context(global)?).await,
        Command::Nodes(args) => commands::nodes::handle(args, &build_context(global)?),
        Command::Messages(args) => commands::messages::handle(args, &build_context(global)?),
        Command::Overlay(args) => commands::overlay::handle(args, &build_context(global)?),
        Command::Camera(args) => commands::camera::handle(args, &build_context(global)?),
        Command::Classify(args) => commands::classify::handle(&args, &build_context(global)?),
    }
}

/// Merge the config file with CLI flags. Flags win.
fn build_context(global: &GlobalOpts) -> Result<Context, CliError> {
    let path = util::config_file(global);
    debug!(config = %path.display(), "loading config");
    let cfg: Config = meshmap_config::load_config_from(&path)?;
    let mesh = cfg.to_mesh_config()?;

    let format = match global.output {
        Some(format) => format,
        None => parse_default(&cfg.defaults.output, "defaults.output")?,
    };
    let color = match global.color {
        Some(mode) => mode,
        None => parse_default::<ColorMode>(&cfg.defaults.color, "defaults.color")?,
    };

    Ok(Context {
        output: format,
        color: output::should_color(color),
        quiet: global.quiet,
        mesh,
    })
}

fn parse_default<T: ValueEnum>(value: &str, field: &str) -> Result<T, CliError> {
    T::from_str(value, true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}
