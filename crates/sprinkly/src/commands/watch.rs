//! Watch command: keep the client connected and redraw the status
//! after every background refresh interval until Ctrl-C.

use std::io::{self, IsTerminal};

use sprinkly_core::{Client, ClientConfig};
use tracing::debug;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::status;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub async fn handle(config: ClientConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let interval = config.polling_interval;
    let client = Client::new(config)?;
    client.connect().await?;

    let redraw = matches!(global.output, OutputFormat::Table) && io::stdout().is_terminal();
    let result = loop {
        let out = match status::render(&client.snapshot(), global) {
            Ok(out) => out,
            Err(e) => break Err(e),
        };
        if redraw {
            print!("{CLEAR_SCREEN}");
        }
        output::print_output(&out, global.quiet);

        tokio::select! {
            biased;
            signal = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                break signal.map_err(CliError::from);
            }
            () = tokio::time::sleep(interval) => {}
        }
    };

    client.disconnect().await;
    result
}
