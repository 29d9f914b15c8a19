//! Control of EnerGenie EG-PMS / SiS-PM multi-outlet power strips over USB.
//!
//! Nothing here touches the bus until one of the functions is called; [`registry::enumerate`]
//! is the usual starting point.

pub use rusb;
pub use sispm_types;

pub mod commands;
pub mod device;
pub mod devices;
pub mod error;
pub mod registry;

pub use device::base::{
    AttachPowerStrip, ExecutablePowerStrip, FullPowerStrip, PowerStripCommands, PowerStripDevice,
};
pub use registry::{enumerate, select_device, DeviceSelector};
