//! Controller-wide writes: operation enable and rain delay.

use sprinkly_core::Client;

use crate::cli::{GlobalOpts, RainDelayArgs};
use crate::error::CliError;

pub async fn set_enabled(client: &Client, enabled: bool, global: &GlobalOpts) -> Result<(), CliError> {
    client.set_enabled(enabled).await?;
    if !global.quiet {
        eprintln!(
            "Controller operation {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }
    Ok(())
}

pub async fn rain_delay(
    client: &Client,
    args: RainDelayArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    client.controller().set_rain_delay(args.hours).await?;
    if !global.quiet {
        if args.hours == 0 {
            eprintln!("Rain delay cleared");
        } else {
            eprintln!("Rain delay set for {} hour(s)", args.hours);
        }
    }
    Ok(())
}
