// The SiS-PM family all share one vendor ID, the product ID decides how many outlets there are
// and how they are numbered. Everything else about the protocol is identical.
use crate::error::ConnectError;
use std::ops::RangeInclusive;
use strum::Display;

pub const VID_SISPM: u16 = 0x04b4;

pub const PID_MSISPM_OLD: u16 = 0xfd10;
pub const PID_SISPM: u16 = 0xfd11;
pub const PID_MSISPM_FLASH: u16 = 0xfd12;
pub const PID_SISPM_FLASH_NEW: u16 = 0xfd13;
pub const PID_SISPM_EG_PMS2: u16 = 0xfd15;

// Ascending, this is also the order devices are reported in.
pub const PRODUCT_IDS: [u16; 5] = [
    PID_MSISPM_OLD,
    PID_SISPM,
    PID_MSISPM_FLASH,
    PID_SISPM_FLASH_NEW,
    PID_SISPM_EG_PMS2,
];

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum Profile {
    /// One outlet, addressed as 0.
    Single,
    /// One outlet, addressed as 1.
    Legacy,
    /// Four outlets, 1 to 4.
    Quad,
}

impl Profile {
    pub fn from_product_id(product_id: u16) -> Option<Self> {
        match product_id {
            PID_MSISPM_OLD => Some(Profile::Single),
            PID_SISPM => Some(Profile::Legacy),
            PID_MSISPM_FLASH | PID_SISPM_FLASH_NEW | PID_SISPM_EG_PMS2 => Some(Profile::Quad),
            _ => None,
        }
    }

    pub fn for_device(vendor_id: u16, product_id: u16) -> Result<Self, ConnectError> {
        if vendor_id != VID_SISPM {
            return Err(ConnectError::UnsupportedDevice {
                vendor_id,
                product_id,
            });
        }

        Self::from_product_id(product_id).ok_or(ConnectError::UnsupportedDevice {
            vendor_id,
            product_id,
        })
    }

    pub fn min_outlet(&self) -> u8 {
        match self {
            Profile::Single => 0,
            Profile::Legacy | Profile::Quad => 1,
        }
    }

    pub fn max_outlet(&self) -> u8 {
        match self {
            Profile::Single => 0,
            Profile::Legacy => 1,
            Profile::Quad => 4,
        }
    }

    pub fn bounds(&self) -> (u8, u8) {
        (self.min_outlet(), self.max_outlet())
    }

    pub fn outlets(&self) -> RangeInclusive<u8> {
        self.min_outlet()..=self.max_outlet()
    }

    pub fn contains(&self, outlet: u8) -> bool {
        self.outlets().contains(&outlet)
    }
}
