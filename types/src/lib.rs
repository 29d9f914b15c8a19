#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Formatter;
use std::str::FromStr;
use strum::Display;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OutletState {
    Off,
    On,
}

impl OutletState {
    pub fn is_on(&self) -> bool {
        *self == OutletState::On
    }

    pub fn toggled(&self) -> Self {
        match self {
            OutletState::Off => OutletState::On,
            OutletState::On => OutletState::Off,
        }
    }
}

impl From<bool> for OutletState {
    fn from(value: bool) -> Self {
        match value {
            true => OutletState::On,
            false => OutletState::Off,
        }
    }
}

impl From<OutletState> for bool {
    fn from(value: OutletState) -> Self {
        value.is_on()
    }
}

/// The identifier a power strip reports about itself. Comparison is always done on the raw
/// bytes, the colon separated form is only for humans.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Identity(Vec<u8>);

impl Identity {
    /// Returns `None` for an empty read, which is how a strip says it has no identity.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }
        Some(Self(bytes.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (index, byte) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, ":")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Identity({})", self)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseIdentityError {
    #[error("Device ID is empty")]
    Empty,

    #[error("'{0}' is not a hexadecimal octet")]
    InvalidOctet(String),
}

impl FromStr for Identity {
    type Err = ParseIdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseIdentityError::Empty);
        }

        let mut bytes = Vec::new();
        for octet in s.split(':') {
            if octet.is_empty() || octet.len() > 2 {
                return Err(ParseIdentityError::InvalidOctet(octet.to_string()));
            }
            let byte = u8::from_str_radix(octet, 16)
                .map_err(|_| ParseIdentityError::InvalidOctet(octet.to_string()))?;
            bytes.push(byte);
        }
        Ok(Self(bytes))
    }
}

#[cfg(feature = "serde")]
impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Identity::from_str(&value).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OutletStatus {
    pub outlet: u8,
    /// `None` when the strip answered with a report too short to carry a state.
    pub state: Option<OutletState>,
}

// A snapshot of one strip, as printed by the client after it has applied its actions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceStatus {
    pub index: usize,
    pub identity: Option<Identity>,
    pub product_id: u16,
    pub outlets: Vec<OutletStatus>,
}
