// In src/main.rs

//! `display-modes` - lists the displays the installed driver reports.
//!
//! Usage: `display-modes [--json] [--try WIDTHxHEIGHT[@HZ]]`
//!
//! With `--try`, the primary display is switched to the best matching mode
//! and immediately restored, exercising the full change/restore path.

use display_modes::registry;
use display_modes::Device;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};

/// A mode request parsed from `WIDTHxHEIGHT[@HZ]`.
#[derive(Debug, PartialEq)]
struct ModeRequest {
    width: i32,
    height: i32,
    refresh_rate: f32,
}

fn parse_mode_request(text: &str) -> Result<ModeRequest> {
    let (size, rate) = match text.split_once('@') {
        Some((size, rate)) => (size, Some(rate.trim_end_matches("Hz"))),
        None => (text, None),
    };
    let (width, height) = size
        .split_once('x')
        .ok_or_else(|| anyhow!("Expected WIDTHxHEIGHT, got '{}'", text))?;
    Ok(ModeRequest {
        width: width.parse().context("Invalid width")?,
        height: height.parse().context("Invalid height")?,
        refresh_rate: rate
            .map(str::parse::<f32>)
            .transpose()
            .context("Invalid refresh rate")?
            .unwrap_or(0.0),
    })
}

fn print_device(index: usize, device: &Device) {
    println!("#{} {} [{}] at {}", index, device.id(), device, device.bounds());
    for mode in device.available_resolutions() {
        let marker = if mode == device.current_resolution() { "*" } else { " " };
        println!("    {} {} ({})", marker, mode, mode.aspect_ratio());
    }
}

fn try_mode(request: &ModeRequest) -> Result<()> {
    let mut device = registry::global()
        .primary_device()
        .context("Failed to query the primary display")?
        .ok_or_else(|| anyhow!("No primary display"))?;

    let applied = device
        .change_resolution_to(request.width, request.height, 0, request.refresh_rate)
        .with_context(|| format!("Failed to switch {}", device.id()))?;
    match applied {
        Some(mode) => {
            println!("Switched {} to {}", device.id(), mode);
            device
                .restore_resolution()
                .with_context(|| format!("Failed to restore {}", device.id()))?;
            println!("Restored {} to {}", device.id(), device.current_resolution());
        }
        None => warn!("No mode of {} matches {:?}", device.id(), request),
    }
    Ok(())
}

/// Main entry point for the `display-modes` tool.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let mut json = false;
    let mut request = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--try" => {
                let value = args.next().ok_or_else(|| anyhow!("--try needs a mode"))?;
                request = Some(parse_mode_request(&value)?);
            }
            other => return Err(anyhow!("Unknown argument '{}'", other)),
        }
    }

    let devices = registry::global()
        .devices()
        .context("Failed to enumerate displays")?;
    info!("Found {} display(s)", devices.len());

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&devices).context("Failed to serialize displays")?
        );
    } else {
        for (index, device) in devices.iter().enumerate() {
            print_device(index, device);
        }
    }

    if let Some(request) = request {
        try_mode(&request)?;
    }
    Ok(())
}
