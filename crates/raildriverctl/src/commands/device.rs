//! Device listing and speaker control

use anyhow::{Context, Result};
use hidapi::HidApi;
use raildriver_engine::EngineConfig;
use raildriver_hid_common::list_devices;
use raildriver_protocol::PIE_VENDOR_ID;

use crate::commands::{SpeakerState, open_device};
use crate::error::CliError;
use crate::output;

pub fn list(json: bool) -> Result<()> {
    let api = HidApi::new().context("Failed to initialise HID API")?;
    let devices = list_devices(&api, PIE_VENDOR_ID);
    output::print_device_list(&devices, json);
    Ok(())
}

pub fn speaker(config: EngineConfig, state: SpeakerState, json: bool) -> Result<()> {
    let rd = open_device(config)?;
    let on = state == SpeakerState::On;
    rd.set_speaker(on)
        .map_err(CliError::from)
        .context("Failed to switch speaker")?;
    output::print_success(if on { "Speaker on" } else { "Speaker off" }, json);
    Ok(())
}
