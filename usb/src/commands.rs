// Every request the strip understands is a class request on endpoint zero. The outlet number is
// encoded both in wValue and, for writes, in the first byte of the payload.
use sispm_types::OutletState;
use std::time::Duration;

pub const REQUEST_GET_REPORT: u8 = 0x01;
pub const REQUEST_SET_REPORT: u8 = 0x09;

pub const REPORT_LENGTH: usize = 5;
pub const TRANSFER_TIMEOUT: Duration = Duration::from_millis(500);

const VALUE_BASE: u16 = 0x0300;
const IDENTITY_VALUE: u16 = 0x0301;
const SWITCH_ON: u8 = 0x03;
const SWITCH_OFF: u8 = 0x00;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    GetIdentity,
    GetStatus(u8),
    SetStatus(u8, OutletState),
}

impl Command {
    pub fn request(&self) -> u8 {
        match self {
            Command::GetIdentity | Command::GetStatus(_) => REQUEST_GET_REPORT,
            Command::SetStatus(..) => REQUEST_SET_REPORT,
        }
    }

    pub fn value(&self) -> u16 {
        match self {
            Command::GetIdentity => IDENTITY_VALUE,
            Command::GetStatus(outlet) | Command::SetStatus(outlet, _) => {
                VALUE_BASE + 3 * *outlet as u16
            }
        }
    }

    pub fn index(&self) -> u16 {
        0
    }

    /// The report sent with a write, `None` for reads.
    pub fn payload(&self) -> Option<[u8; REPORT_LENGTH]> {
        match self {
            Command::GetIdentity | Command::GetStatus(_) => None,
            Command::SetStatus(outlet, state) => {
                let switch = match state {
                    OutletState::On => SWITCH_ON,
                    OutletState::Off => SWITCH_OFF,
                };
                Some([outlet_byte(*outlet), switch, 0, 0, 0])
            }
        }
    }
}

fn outlet_byte(outlet: u8) -> u8 {
    outlet.wrapping_mul(3)
}

/// Reads the switch state out of a status report.
pub fn decode_status(report: &[u8]) -> Option<OutletState> {
    report.get(1).map(|byte| OutletState::from(byte & 1 == 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_request_layout() {
        let command = Command::GetIdentity;
        assert_eq!(command.request(), 0x01);
        assert_eq!(command.value(), 0x0301);
        assert_eq!(command.index(), 0);
        assert_eq!(command.payload(), None);
    }

    #[test]
    fn status_request_addresses_outlet() {
        let command = Command::GetStatus(3);
        assert_eq!(command.request(), 0x01);
        assert_eq!(command.value(), 0x0309);
        assert_eq!(command.payload(), None);
    }

    #[test]
    fn switch_payloads() {
        let on = Command::SetStatus(3, OutletState::On);
        assert_eq!(on.request(), 0x09);
        assert_eq!(on.value(), 0x0309);
        assert_eq!(on.payload(), Some([9, 3, 0, 0, 0]));

        let off = Command::SetStatus(1, OutletState::Off);
        assert_eq!(off.value(), 0x0303);
        assert_eq!(off.payload(), Some([3, 0, 0, 0, 0]));

        assert_eq!(Command::SetStatus(0, OutletState::On).value(), 0x0300);
    }

    #[test]
    fn status_is_low_bit_of_second_byte() {
        assert_eq!(decode_status(&[9, 0, 0, 0, 0]), Some(OutletState::Off));
        assert_eq!(decode_status(&[9, 1, 0, 0, 0]), Some(OutletState::On));
        assert_eq!(decode_status(&[9, 0x03, 0, 0, 0]), Some(OutletState::On));
        assert_eq!(decode_status(&[9, 0x02, 0, 0, 0]), Some(OutletState::Off));
        assert_eq!(decode_status(&[9]), None);
    }
}
