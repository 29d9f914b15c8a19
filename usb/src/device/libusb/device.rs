use crate::commands::TRANSFER_TIMEOUT;
use crate::device::base::{
    AttachPowerStrip, ExecutablePowerStrip, FullPowerStrip, PowerStripCommands, PowerStripDevice,
};
use crate::devices::Profile;
use crate::error::ConnectError;
use crate::registry::matching_devices;
use log::{debug, info, warn};
use rusb::{Device, DeviceHandle, Direction, GlobalContext, Recipient, RequestType};
use std::time::Duration;

const INTERFACE: u8 = 0;
const CONFIGURATION: u8 = 1;

pub struct SisPmUSB {
    handle: DeviceHandle<GlobalContext>,
    device: PowerStripDevice,
    profile: Profile,
    timeout: Duration,
    interface_claimed: bool,
}

impl SisPmUSB {
    fn find_device(device: &PowerStripDevice) -> Result<Device<GlobalContext>, ConnectError> {
        for usb_device in rusb::devices()?.iter() {
            if usb_device.bus_number() == device.bus_number
                && usb_device.address() == device.address
            {
                return Ok(usb_device);
            }
        }
        Err(ConnectError::DeviceNotFound)
    }

    fn prepare_handle(handle: &mut DeviceHandle<GlobalContext>) -> bool {
        // Not every platform lets us detach the HID driver, the strip may still answer anyway.
        if let Err(error) = handle.set_auto_detach_kernel_driver(true) {
            debug!("Kernel driver auto-detach unavailable: {}", error);
        }

        match handle.active_configuration() {
            Ok(CONFIGURATION) => {}
            _ => debug!(
                "Set Active Config: {:?}",
                handle.set_active_configuration(CONFIGURATION)
            ),
        }

        match handle.claim_interface(INTERFACE) {
            Ok(()) => true,
            Err(error) => {
                warn!("Unable to claim interface {}: {}", INTERFACE, error);
                false
            }
        }
    }
}

impl AttachPowerStrip for SisPmUSB {
    fn from_device(device: PowerStripDevice) -> Result<Box<dyn FullPowerStrip>, ConnectError> {
        let profile = Profile::for_device(device.vendor_id, device.product_id)?;

        // Firstly, we need to locate the USB device based on the location..
        let usb_device = SisPmUSB::find_device(&device)?;
        let mut handle = usb_device.open()?;
        info!(
            "Connected to {} power strip {:04x}:{:04x} at bus {}, address {}",
            profile, device.vendor_id, device.product_id, device.bus_number, device.address
        );

        let interface_claimed = SisPmUSB::prepare_handle(&mut handle);

        Ok(Box::new(Self {
            handle,
            device,
            profile,
            timeout: TRANSFER_TIMEOUT,
            interface_claimed,
        }))
    }
}

impl ExecutablePowerStrip for SisPmUSB {
    fn usb_device(&self) -> &PowerStripDevice {
        &self.device
    }

    fn profile(&self) -> Profile {
        self.profile
    }

    fn read_control(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        length: usize,
    ) -> Result<Vec<u8>, rusb::Error> {
        let mut buf = vec![0; length];
        let response_length = self.handle.read_control(
            rusb::request_type(Direction::In, RequestType::Class, Recipient::Interface),
            request,
            value,
            index,
            &mut buf,
            self.timeout,
        )?;
        buf.truncate(response_length);
        Ok(buf)
    }

    fn write_control(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<(), rusb::Error> {
        self.handle.write_control(
            rusb::request_type(Direction::Out, RequestType::Class, Recipient::Interface),
            request,
            value,
            index,
            data,
            self.timeout,
        )?;

        Ok(())
    }
}

impl PowerStripCommands for SisPmUSB {}
impl FullPowerStrip for SisPmUSB {}

impl Drop for SisPmUSB {
    fn drop(&mut self) {
        if self.interface_claimed {
            if let Err(error) = self.handle.release_interface(INTERFACE) {
                debug!("Unable to release interface on {:?}: {}", self.device, error);
            }
        }
    }
}

pub fn find_devices() -> Result<Vec<PowerStripDevice>, rusb::Error> {
    let mut found_devices: Vec<PowerStripDevice> = Vec::new();

    for device in rusb::devices()?.iter() {
        match device.device_descriptor() {
            Ok(descriptor) => found_devices.push(PowerStripDevice::new(
                device.bus_number(),
                device.address(),
                descriptor.vendor_id(),
                descriptor.product_id(),
            )),
            Err(error) => debug!("Skipping {:?}, no descriptor: {}", device, error),
        }
    }

    Ok(matching_devices(found_devices))
}
