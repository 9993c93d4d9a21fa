//! Command handlers, one module per command group.

pub mod config_cmd;
pub mod controller;
pub mod stations;
pub mod status;
pub mod watch;

use sprinkly_core::{Client, ClientConfig};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a device command over a fresh connection.
///
/// Periodic refresh is disabled: one-shot commands read the state from
/// the initial pass.
pub async fn dispatch(
    cmd: Command,
    mut config: ClientConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Command::Watch(args) = cmd {
        config.polling_interval = args.interval;
        return watch::handle(config, global).await;
    }

    config.polling_interval = std::time::Duration::ZERO;
    let client = Client::new(config)?;
    client.connect().await?;

    let result = match cmd {
        Command::Status => status::handle(&client, global),
        Command::Stations(args) => stations::handle(&client, args, global).await,
        Command::Enable => controller::set_enabled(&client, true, global).await,
        Command::Disable => controller::set_enabled(&client, false, global).await,
        Command::RainDelay(args) => controller::rain_delay(&client, args, global).await,
        // Handled before a connection is made
        Command::Watch(_) | Command::Config(_) | Command::Completions(_) => Ok(()),
    };

    client.disconnect().await;
    result
}
