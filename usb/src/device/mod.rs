use crate::device::base::{AttachPowerStrip, FullPowerStrip, PowerStripDevice};
use crate::error::ConnectError;

pub mod base;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// libusb is available on every platform these strips are used on, there's no vendor driver to
// go through.
mod libusb;
use crate::device::libusb::device;

pub fn find_devices() -> Result<Vec<PowerStripDevice>, rusb::Error> {
    device::find_devices()
}

pub fn from_device(device: PowerStripDevice) -> Result<Box<dyn FullPowerStrip>, ConnectError> {
    device::SisPmUSB::from_device(device)
}
