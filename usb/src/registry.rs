// The registry is rebuilt on every call, nothing about attached strips is remembered between
// enumerations.
use crate::device;
use crate::device::base::{FullPowerStrip, PowerStripCommands, PowerStripDevice};
use crate::devices::{PRODUCT_IDS, VID_SISPM};
use crate::error::ConnectError;
use log::debug;
use sispm_types::Identity;

/// How a caller picks one strip out of the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelector {
    Index(usize),
    Identity(Identity),
}

/// Opens every attached power strip, ordered by product ID and then by bus discovery order.
/// No attached strips is an empty list, not an error.
pub fn enumerate() -> Result<Vec<Box<dyn FullPowerStrip>>, ConnectError> {
    open_devices(device::find_devices()?, device::from_device)
}

pub fn open_devices<F>(
    candidates: Vec<PowerStripDevice>,
    mut attach: F,
) -> Result<Vec<Box<dyn FullPowerStrip>>, ConnectError>
where
    F: FnMut(PowerStripDevice) -> Result<Box<dyn FullPowerStrip>, ConnectError>,
{
    let mut devices = Vec::new();
    for candidate in matching_devices(candidates) {
        devices.push(attach(candidate)?);
    }
    debug!("Found {} power strip(s)", devices.len());
    Ok(devices)
}

pub(crate) fn matching_devices(candidates: Vec<PowerStripDevice>) -> Vec<PowerStripDevice> {
    let mut found = Vec::new();
    for product_id in PRODUCT_IDS {
        found.extend(
            candidates
                .iter()
                .filter(|d| d.vendor_id == VID_SISPM && d.product_id == product_id)
                .cloned(),
        );
    }
    found
}

/// Resolves a selector to a position in `devices`. Without a selector, a lone strip is picked
/// implicitly.
pub fn select_device(
    devices: &mut [Box<dyn FullPowerStrip>],
    selector: Option<&DeviceSelector>,
) -> Result<usize, ConnectError> {
    if devices.is_empty() {
        return Err(ConnectError::DeviceNotFound);
    }

    match selector {
        None if devices.len() == 1 => Ok(0),
        None => Err(ConnectError::AmbiguousDevice(devices.len())),
        Some(DeviceSelector::Index(index)) if *index < devices.len() => Ok(*index),
        Some(DeviceSelector::Index(index)) => Err(ConnectError::UnknownDeviceIndex(*index)),
        Some(DeviceSelector::Identity(wanted)) => {
            for (index, device) in devices.iter_mut().enumerate() {
                if device.get_identity()?.as_ref() == Some(wanted) {
                    return Ok(index);
                }
            }
            Err(ConnectError::UnknownDeviceIdentity(wanted.to_string()))
        }
    }
}
