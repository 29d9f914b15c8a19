//! An in-memory power strip for tests.
//!
//! It answers the same control transfers real hardware does, records every transfer it was asked
//! to perform, and replays the last switch byte written to each outlet when that outlet is read.

use crate::commands::{REPORT_LENGTH, REQUEST_GET_REPORT, REQUEST_SET_REPORT};
use crate::device::base::{
    AttachPowerStrip, ExecutablePowerStrip, FullPowerStrip, PowerStripCommands, PowerStripDevice,
};
use crate::devices::{Profile, VID_SISPM};
use crate::error::ConnectError;
use rusb::{Direction, Recipient, RequestType};
use std::collections::{BTreeMap, VecDeque};

const IDENTITY_VALUE: u16 = 0x0301;
const OUTLET_VALUE_BASE: u16 = 0x0300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    /// Payload of a write, empty for reads.
    pub data: Vec<u8>,
    /// Requested length of a read, payload length for writes.
    pub length: usize,
}

#[derive(Debug)]
pub struct MockPowerStrip {
    device: PowerStripDevice,
    profile: Profile,
    identity: Vec<u8>,
    switches: BTreeMap<u8, u8>,
    responses: VecDeque<Vec<u8>>,
    failure: Option<rusb::Error>,
    transfers: Vec<Transfer>,
}

impl MockPowerStrip {
    pub fn new(product_id: u16) -> Self {
        Self::from_location(PowerStripDevice::new(1, 1, VID_SISPM, product_id))
    }

    fn from_location(device: PowerStripDevice) -> Self {
        let profile = Profile::for_device(device.vendor_id(), device.product_id())
            .expect("MockPowerStrip needs a supported product ID");

        Self {
            device,
            profile,
            identity: vec![0x01, 0x01, 0x53, 0x50, 0x26],
            switches: BTreeMap::new(),
            responses: VecDeque::new(),
            failure: None,
            transfers: vec![],
        }
    }

    pub fn at(mut self, bus_number: u8, address: u8) -> Self {
        self.device.bus_number = bus_number;
        self.device.address = address;
        self
    }

    pub fn with_identity(mut self, identity: &[u8]) -> Self {
        self.identity = identity.to_vec();
        self
    }

    /// The next read returns exactly this, instead of the simulated state.
    pub fn queue_response(&mut self, response: Vec<u8>) {
        self.responses.push_back(response);
    }

    /// The next transfer fails with this error, and has no effect.
    pub fn fail_next(&mut self, error: rusb::Error) {
        self.failure = Some(error);
    }

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn transfer_count(&self) -> usize {
        self.transfers.len()
    }

    fn outlet_for(value: u16) -> Option<u8> {
        let offset = value.checked_sub(OUTLET_VALUE_BASE)?;
        if offset % 3 != 0 {
            return None;
        }
        u8::try_from(offset / 3).ok()
    }
}

impl ExecutablePowerStrip for MockPowerStrip {
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
        self.transfers.push(Transfer {
            request_type: rusb::request_type(Direction::In, RequestType::Class, Recipient::Interface),
            request,
            value,
            index,
            data: vec![],
            length,
        });

        if let Some(error) = self.failure.take() {
            return Err(error);
        }

        let mut response = match self.responses.pop_front() {
            Some(response) => response,
            None if request != REQUEST_GET_REPORT => return Err(rusb::Error::Pipe),
            None if value == IDENTITY_VALUE => self.identity.clone(),
            None => {
                let outlet = Self::outlet_for(value).ok_or(rusb::Error::Pipe)?;
                let switch = self.switches.get(&outlet).copied().unwrap_or(0);
                vec![outlet.wrapping_mul(3), switch & 1, 0, 0, 0]
            }
        };
        response.truncate(length.min(REPORT_LENGTH));
        Ok(response)
    }

    fn write_control(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<(), rusb::Error> {
        self.transfers.push(Transfer {
            request_type: rusb::request_type(
                Direction::Out,
                RequestType::Class,
                Recipient::Interface,
            ),
            request,
            value,
            index,
            data: data.to_vec(),
            length: data.len(),
        });

        if let Some(error) = self.failure.take() {
            return Err(error);
        }

        if request != REQUEST_SET_REPORT || data.len() < 2 {
            return Err(rusb::Error::Pipe);
        }
        let outlet = Self::outlet_for(value).ok_or(rusb::Error::Pipe)?;
        self.switches.insert(outlet, data[1]);
        Ok(())
    }
}

impl AttachPowerStrip for MockPowerStrip {
    fn from_device(device: PowerStripDevice) -> Result<Box<dyn FullPowerStrip>, ConnectError> {
        Profile::for_device(device.vendor_id(), device.product_id())?;
        Ok(Box::new(Self::from_location(device)))
    }
}

impl PowerStripCommands for MockPowerStrip {}
impl FullPowerStrip for MockPowerStrip {}
