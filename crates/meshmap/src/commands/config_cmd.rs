//! Config subcommand handlers.

use meshmap_config::{self as config, Config};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = util::config_file(global);

    match args.command {
        ConfigCommand::Show => {
            let cfg = config::load_config_from(&path)?;
            // Table view is the TOML itself.
            let rendered = toml::to_string_pretty(&cfg)?;
            let out = output::render_single(
                global.output.unwrap_or(OutputFormat::Table),
                &cfg,
                |_| rendered.clone(),
                |_| path.display().to_string(),
            )?;
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            config::save_config_to(&Config::default(), &path)?;
            if !global.quiet {
                eprintln!("Config written to {}", path.display());
            }
            Ok(())
        }
    }
}
