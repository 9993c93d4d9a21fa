//! Station command handlers.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tabled::Tabled;

use sprinkly_core::{Client, Station, StationSnapshot};

use crate::cli::{GlobalOpts, StationsArgs, StationsCommand};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct StationRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Disabled")]
    disabled: String,
    #[tabled(rename = "Remaining")]
    remaining: String,
    #[tabled(rename = "Ends")]
    ends: String,
}

impl StationRow {
    fn new(s: &StationSnapshot, color: bool) -> Self {
        Self {
            index: s.index,
            name: s.name.clone().unwrap_or_default(),
            state: output::state_label(s.in_use, "running", "idle", color),
            disabled: output::flag_label(s.disabled, "disabled", color),
            remaining: format_remaining(s.remaining_seconds),
            ends: format_end_time(s.watering_end_time),
        }
    }
}

fn format_remaining(seconds: i64) -> String {
    match u64::try_from(seconds) {
        Ok(secs) if secs > 0 => humantime::format_duration(Duration::from_secs(secs)).to_string(),
        _ => "-".into(),
    }
}

fn format_end_time(epoch: i64) -> String {
    if epoch == 0 {
        return "-".into();
    }
    DateTime::from_timestamp(epoch, 0).map_or_else(
        || "-".into(),
        |t| t.with_timezone(&Local).format("%H:%M:%S").to_string(),
    )
}

/// Render the roster as a table.
pub(crate) fn table(stations: &[StationSnapshot], color: bool) -> String {
    let rows: Vec<StationRow> = stations.iter().map(|s| StationRow::new(s, color)).collect();
    output::render_table(&rows)
}

// ── Lookup ──────────────────────────────────────────────────────────

/// Resolve a station by index, then by exact name.
fn resolve(client: &Client, identifier: &str) -> Result<Arc<Station>, CliError> {
    let controller = client.controller();
    identifier
        .parse::<usize>()
        .ok()
        .and_then(|index| controller.station_by_index(index))
        .or_else(|| controller.station_by_name(identifier))
        .ok_or_else(|| CliError::station_not_found(identifier))
}

fn label(station: &Station) -> String {
    station.name().map_or_else(
        || format!("station {}", station.index()),
        |name| format!("'{name}' ({})", station.index()),
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: &Client,
    args: StationsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        StationsCommand::List => {
            let snap = client.snapshot().stations;
            let color = output::should_color(&global.color);
            let out = output::render_list(
                &global.output,
                &snap,
                |s| StationRow::new(s, color),
                |s| s.name.clone().unwrap_or_else(|| s.index.to_string()),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StationsCommand::Start { station, duration } => {
            let station = resolve(client, &station)?;
            client.controller().start_station(&station, duration).await?;
            if !global.quiet {
                eprintln!(
                    "Started {} for {}",
                    label(&station),
                    humantime::format_duration(Duration::from_secs(duration.into()))
                );
            }
            Ok(())
        }

        StationsCommand::Stop { station } => {
            let station = resolve(client, &station)?;
            client.controller().stop_station(&station).await?;
            if !global.quiet {
                eprintln!("Stopped {}", label(&station));
            }
            Ok(())
        }

        StationsCommand::Enable { station } => {
            let station = resolve(client, &station)?;
            station.set_disabled(false).await?;
            if !global.quiet {
                eprintln!("Enabled {}", label(&station));
            }
            Ok(())
        }

        StationsCommand::Disable { station } => {
            let station = resolve(client, &station)?;
            station.set_disabled(true).await?;
            if !global.quiet {
                eprintln!("Disabled {}", label(&station));
            }
            Ok(())
        }
    }
}
