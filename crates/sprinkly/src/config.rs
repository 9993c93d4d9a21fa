//! CLI configuration: thin wrapper around `sprinkly_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--url, --password, --timeout) on top of the selected profile.

use std::time::Duration;

use sprinkly_core::ClientConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use sprinkly_config::{Config, Profile, config_path, load_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `ClientConfig` from the config file, the active profile and
/// CLI overrides. Flags win over profile values, profile values over
/// `[defaults]`.
pub fn build_client_config(global: &GlobalOpts, cfg: &Config) -> Result<ClientConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);
    let profile = cfg.profiles.get(&profile_name);

    if profile.is_none() && global.profile.is_some() {
        let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
        available.sort_unstable();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    }

    // 1. URL (flag > env > profile)
    let url_str = global
        .url
        .as_deref()
        .or(profile.map(|p| p.url.as_str()))
        .ok_or_else(|| CliError::NoConfig {
            path: config_path().display().to_string(),
        })?;
    let url: url::Url = url_str.parse().map_err(|_| CliError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {url_str}"),
    })?;

    // 2. Password (flag > profile credential chain)
    let password = match (&global.password, profile) {
        (Some(plain), _) => sprinkly_config::password_from(plain, false)?,
        (None, Some(profile)) => sprinkly_config::resolve_password(profile, &profile_name)?,
        (None, None) => {
            return Err(CliError::NoCredentials {
                profile: profile_name,
            });
        }
    };

    // 3. Timing
    let timeout = global
        .timeout
        .or(profile.and_then(|p| p.timeout))
        .unwrap_or(cfg.defaults.timeout);
    let polling_interval = profile
        .and_then(|p| p.polling_interval)
        .unwrap_or(cfg.defaults.polling_interval);

    let mut config = ClientConfig::new(url, password);
    config.timeout = Duration::from_secs(timeout);
    config.polling_interval = Duration::from_secs(polling_interval);
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["sprinkly"];
        argv.extend_from_slice(args);
        argv.push("status");
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with_garden() -> Config {
        let mut cfg = Config {
            default_profile: Some("garden".into()),
            ..Config::default()
        };
        cfg.profiles.insert(
            "garden".into(),
            Profile {
                url: "http://192.168.1.20:8080".into(),
                password: Some("a6d82bced638de3def1e9bbb4983225c".into()),
                password_is_hash: true,
                timeout: Some(12),
                ..Profile::default()
            },
        );
        cfg
    }

    #[test]
    fn flags_override_the_profile() {
        let cfg = config_with_garden();
        let opts = global(&["--url", "http://10.0.0.9", "--password", "opendoor", "--timeout", "3"]);

        let config = build_client_config(&opts, &cfg).unwrap();

        assert_eq!(config.url.as_str(), "http://10.0.0.9/");
        assert_eq!(config.password, sprinkly_core::DevicePassword::from_plain("opendoor"));
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn profile_values_beat_defaults() {
        let cfg = config_with_garden();
        let opts = GlobalOpts {
            url: None,
            password: None,
            timeout: None,
            ..global(&[])
        };

        let config = build_client_config(&opts, &cfg).unwrap();

        assert_eq!(config.url.as_str(), "http://192.168.1.20:8080/");
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert_eq!(config.polling_interval, Duration::from_secs(30));
    }

    #[test]
    fn unknown_explicit_profile_lists_the_known_ones() {
        let cfg = config_with_garden();
        let opts = GlobalOpts {
            profile: Some("shed".into()),
            ..global(&[])
        };

        match build_client_config(&opts, &cfg).unwrap_err() {
            CliError::ProfileNotFound { name, available } => {
                assert_eq!(name, "shed");
                assert_eq!(available, "garden");
            }
            other => panic!("expected ProfileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn no_profile_and_no_url_is_reported() {
        let opts = GlobalOpts {
            profile: None,
            url: None,
            ..global(&[])
        };
        let err = build_client_config(&opts, &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }
}
