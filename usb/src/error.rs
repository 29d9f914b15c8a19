#[derive(thiserror::Error, Debug)]
pub enum ConnectError {
    #[error("No device found")]
    DeviceNotFound,

    #[error("Unknown device {0}")]
    UnknownDeviceIndex(usize),

    #[error("Device with id {0} not found")]
    UnknownDeviceIdentity(String),

    #[error("{0} devices are connected, please specify which one to control")]
    AmbiguousDevice(usize),

    #[error("Device {vendor_id:04x}:{product_id:04x} is not a supported power strip")]
    UnsupportedDevice { vendor_id: u16, product_id: u16 },

    #[error("USB error: {0}")]
    UsbError(#[from] rusb::Error),

    #[error("Unable to identify device: {0}")]
    Command(#[from] CommandError),
}

#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error("Outlet {outlet} is out of range, device only has outlets {min}..{max}")]
    InvalidOutlet { outlet: u8, min: u8, max: u8 },

    #[error("USB error: {0}")]
    UsbError(#[from] rusb::Error),

    #[error("Malformed response from power strip, expected {expected} bytes but received {received}")]
    MalformedResponse { expected: usize, received: usize },
}
