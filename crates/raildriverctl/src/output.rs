//! Output formatting for CLI responses

use anyhow::Error;
use colored::Colorize;
use raildriver_calibration::CalibrationData;
use raildriver_engine::{DeviceSnapshot, InputEvent, NormalizedValue};
use raildriver_hid_common::HidDeviceInfo;
use serde::Serialize;
use serde_json::json;
use std::path::Path;

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format output as JSON: {e}"),
    }
}

pub fn print_error_json(error: &Error) {
    print_json(&json!({
        "success": false,
        "error": {
            "message": error.to_string(),
        }
    }));
}

pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

/// Plain confirmation for commands with no other output.
pub fn print_success(message: &str, json: bool) {
    if json {
        print_json(&json!({ "success": true, "message": message }));
    } else {
        println!("{} {}", "✓".green(), message);
    }
}

pub fn print_device_list(devices: &[HidDeviceInfo], json: bool) {
    if json {
        let devices: Vec<_> = devices
            .iter()
            .map(|d| {
                json!({
                    "vendor_id": format!("0x{:04X}", d.vendor_id),
                    "product_id": format!("0x{:04X}", d.product_id),
                    "name": d.display_name(),
                    "serial_number": d.serial_number,
                    "path": d.path,
                })
            })
            .collect();
        print_json(&json!({ "success": true, "devices": devices }));
        return;
    }

    if devices.is_empty() {
        println!("{}", "No RailDriver found".yellow());
        return;
    }
    println!("{}", "Attached panels:".bold());
    for d in devices {
        println!(
            "  {} {} ({:04X}:{:04X}) {}",
            "●".green(),
            d.display_name().bold(),
            d.vendor_id,
            d.product_id,
            d.path.dimmed()
        );
    }
}

/// One line per dispatched change.
pub fn print_event(event: &InputEvent, json: bool) {
    let changed: Vec<&str> = event.changed.iter_names().map(|(name, _)| name).collect();
    if json {
        match serde_json::to_string(&json!({
            "changed": changed,
            "snapshot": &*event.snapshot,
        })) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("Failed to format event as JSON: {e}"),
        }
        return;
    }

    let s = &event.snapshot;
    println!(
        "{} {}",
        format!("[{}]", changed.join(" ")).cyan(),
        snapshot_line(s)
    );
}

fn snapshot_line(s: &DeviceSnapshot) -> String {
    format!(
        "rev {} ({:?}) thr {} brk {} ind {} side {:3} wip {} lts {} top {:#06x} bot {:#06x} ud {:#x} dpad {:#x} aux {:#05x}",
        value(s.reverser),
        s.reverser_position,
        value(s.throttle),
        value(s.train_brake),
        value(s.independent_brake),
        s.independent_brake_side,
        value(s.wiper),
        value(s.lights),
        s.top_row.bits(),
        s.bottom_row.bits(),
        s.up_down.bits(),
        s.dpad.bits(),
        s.aux.bits(),
    )
}

fn value(v: NormalizedValue) -> String {
    format!("{:+.2}/{:3}", v.processed, v.raw)
}

pub fn print_calibration(data: &CalibrationData, path: &Path, stored: bool, json: bool) {
    if json {
        print_json(&json!({
            "success": true,
            "path": path,
            "stored": stored,
            "calibration": data,
        }));
        return;
    }

    let origin = if stored { "stored" } else { "defaults" };
    println!("{} {} ({})", "Calibration:".bold(), path.display(), origin);
    let r = &data.reverser;
    println!(
        "  reverser          reverse {:3}  neutral {:3}  forward {:3}",
        r.pos_reverse, r.pos_neutral, r.pos_forward
    );
    let t = &data.throttle;
    println!(
        "  throttle          max {:3} min {:3}  brake max {:3} min {:3}",
        t.max_throttle, t.min_throttle, t.max_brake, t.min_brake
    );
    let b = &data.train_brake;
    println!(
        "  train brake       min {:3}  max {:3}  emergency {:3}",
        b.brake_min, b.brake_max, b.brake_emg
    );
    let i = &data.independent_brake;
    println!(
        "  independent brake min {:3}  max {:3}",
        i.brake_min, i.brake_max
    );
    for (name, t) in [("wiper", &data.wiper), ("lights", &data.lights)] {
        println!(
            "  {name:<17} min {:3}  middle {:3}  max {:3}",
            t.min, t.middle, t.max
        );
    }
}

pub fn print_characters(known: &str, unsupported: &str, json: bool) {
    if json {
        print_json(&json!({
            "success": true,
            "characters": known,
            "unsupported_letters": unsupported,
        }));
        return;
    }
    println!("{} {}", "Displayable:".bold(), known);
    println!("{} {}", "Letters shown blank:".bold(), unsupported);
}
