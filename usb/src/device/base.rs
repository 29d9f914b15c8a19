use crate::commands::{decode_status, Command, REPORT_LENGTH};
use crate::devices::Profile;
use crate::error::{CommandError, ConnectError};
use log::debug;
use sispm_types::{Identity, OutletState};

// This is a basic SuperTrait which defines all the 'Parts' of a power strip for use.
pub trait FullPowerStrip: AttachPowerStrip + PowerStripCommands + Send {}

pub trait AttachPowerStrip {
    fn from_device(device: PowerStripDevice) -> Result<Box<dyn FullPowerStrip>, ConnectError>
    where
        Self: Sized;
}

// The raw capability to issue a control transfer. Implementations decide how the transfer gets
// onto the wire (libusb, or a mock in tests), nothing above this layer touches USB directly.
pub trait ExecutablePowerStrip {
    fn usb_device(&self) -> &PowerStripDevice;
    fn profile(&self) -> Profile;

    fn read_control(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        length: usize,
    ) -> Result<Vec<u8>, rusb::Error>;

    fn write_control(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<(), rusb::Error>;

    fn perform_request(&mut self, command: Command) -> Result<Vec<u8>, CommandError> {
        debug!(
            "{:?} on {:?} (request {:#04x}, value {:#06x})",
            command,
            self.usb_device(),
            command.request(),
            command.value()
        );

        match command.payload() {
            None => Ok(self.read_control(
                command.request(),
                command.value(),
                command.index(),
                REPORT_LENGTH,
            )?),
            Some(payload) => {
                self.write_control(command.request(), command.value(), command.index(), &payload)?;
                Ok(vec![])
            }
        }
    }
}

// These are commands that can be executed, but read_control / write_control must be implemented..
pub trait PowerStripCommands: ExecutablePowerStrip {
    fn bounds(&self) -> (u8, u8) {
        self.profile().bounds()
    }

    fn check_outlet(&self, outlet: u8) -> Result<(), CommandError> {
        let profile = self.profile();
        if !profile.contains(outlet) {
            return Err(CommandError::InvalidOutlet {
                outlet,
                min: profile.min_outlet(),
                max: profile.max_outlet(),
            });
        }
        Ok(())
    }

    fn get_identity(&mut self) -> Result<Option<Identity>, CommandError> {
        let result = self.perform_request(Command::GetIdentity)?;
        if result.is_empty() {
            debug!("{:?} did not report an identity", self.usb_device());
        }
        Ok(Identity::from_bytes(&result))
    }

    fn get_status(&mut self, outlet: u8) -> Result<OutletState, CommandError> {
        self.check_outlet(outlet)?;

        let result = self.perform_request(Command::GetStatus(outlet))?;
        decode_status(&result).ok_or(CommandError::MalformedResponse {
            expected: REPORT_LENGTH,
            received: result.len(),
        })
    }

    fn set_status(&mut self, outlet: u8, state: OutletState) -> Result<(), CommandError> {
        self.check_outlet(outlet)?;
        self.perform_request(Command::SetStatus(outlet, state))?;
        Ok(())
    }

    fn toggle(&mut self, outlet: u8) -> Result<OutletState, CommandError> {
        let state = self.get_status(outlet)?.toggled();
        self.set_status(outlet, state)?;
        Ok(state)
    }
}

// We primarily need the bus number, and address for comparison..
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerStripDevice {
    pub(crate) bus_number: u8,
    pub(crate) address: u8,
    pub(crate) vendor_id: u16,
    pub(crate) product_id: u16,
}

impl PowerStripDevice {
    pub fn new(bus_number: u8, address: u8, vendor_id: u16, product_id: u16) -> Self {
        Self {
            bus_number,
            address,
            vendor_id,
            product_id,
        }
    }

    pub fn bus_number(&self) -> u8 {
        self.bus_number
    }
    pub fn address(&self) -> u8 {
        self.address
    }
    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }
    pub fn product_id(&self) -> u16 {
        self.product_id
    }
}
