//! Status command: controller summary plus the station roster.

use std::fmt::Write as _;

use chrono::DateTime;
use sprinkly_core::{Client, ControllerSnapshot};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::stations;

pub fn handle(client: &Client, global: &GlobalOpts) -> Result<(), CliError> {
    let snapshot = client.snapshot();
    let out = render(&snapshot, global)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub(crate) fn render(snapshot: &ControllerSnapshot, global: &GlobalOpts) -> Result<String, CliError> {
    let color = output::should_color(&global.color);
    output::render_single(
        &global.output,
        snapshot,
        |s| detail(s, color),
        |s| String::from(if s.enabled { "enabled" } else { "disabled" }),
    )
}

fn detail(snapshot: &ControllerSnapshot, color: bool) -> String {
    let firmware = snapshot
        .firmware
        .map_or_else(|| "unknown".into(), |f| f.to_string());
    let device_time = DateTime::from_timestamp(snapshot.device_time, 0)
        .map_or_else(String::new, |t| t.format("%Y-%m-%d %H:%M:%S").to_string());

    let mut out = String::new();
    let _ = writeln!(out, "Firmware:    {firmware}");
    let _ = writeln!(out, "Device time: {device_time}");
    let _ = writeln!(
        out,
        "Operation:   {}",
        output::state_label(snapshot.enabled, "enabled", "disabled", color)
    );
    let _ = writeln!(
        out,
        "Rain delay:  {}",
        output::flag_label(snapshot.rain_delay_active, "active", color)
    );
    let _ = writeln!(
        out,
        "Watering:    {}",
        output::state_label(snapshot.any_station_active, "yes", "no", color)
    );
    out.push_str(&stations::table(&snapshot.stations, color));
    out
}
