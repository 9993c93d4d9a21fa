//! Config subcommand handlers.

use std::collections::HashMap;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

/// Copy of `cfg` with stored passwords masked.
fn redacted(cfg: &Config) -> Config {
    let profiles: HashMap<String, Profile> = cfg
        .profiles
        .iter()
        .map(|(name, p)| {
            (
                name.clone(),
                Profile {
                    url: p.url.clone(),
                    password: p.password.as_ref().map(|_| REDACTED.into()),
                    password_env: p.password_env.clone(),
                    password_is_hash: p.password_is_hash,
                    timeout: p.timeout,
                    polling_interval: p.polling_interval,
                },
            )
        })
        .collect();

    Config {
        default_profile: cfg.default_profile.clone(),
        defaults: sprinkly_config::Defaults {
            output: cfg.defaults.output.clone(),
            color: cfg.defaults.color.clone(),
            timeout: cfg.defaults.timeout,
            polling_interval: cfg.defaults.polling_interval,
        },
        profiles,
    }
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config()?);
            let toml = toml::to_string_pretty(&cfg)?;
            let out = output::render_single(
                &global.output,
                &cfg,
                |_| toml.trim_end().to_owned(),
                |c| config::active_profile_name(global, c),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
