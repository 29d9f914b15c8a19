use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[clap(about, version, author)]
pub struct Cli {
    /// Select the device to be controlled by its ID, as printed in the status output
    /// (e.g. 01:01:53:50:26). Applies to the actions that follow it.
    #[clap(short = 'D', long, value_name = "ID")]
    pub device_id: Vec<String>,

    /// Select the device to be controlled by its index. Applies to the actions that follow it.
    /// This is optional if you have exactly one power strip, but required if you have more.
    #[clap(short = 'd', long, value_name = "DEVICE")]
    pub device: Vec<usize>,

    /// Switch an outlet on (may be repeated)
    #[clap(short = 'o', long, value_name = "OUTLET")]
    pub on: Vec<u8>,

    /// Switch an outlet off (may be repeated)
    #[clap(short = 'f', long, value_name = "OUTLET")]
    pub off: Vec<u8>,

    /// Toggle an outlet (may be repeated)
    #[clap(short = 't', long, value_name = "OUTLET")]
    pub toggle: Vec<u8>,

    /// How the status of all devices is printed once the actions have run
    #[clap(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Minimum log level to print out
    #[clap(long, value_enum, default_value = "warn")]
    pub log_level: LevelFilter,
}

#[derive(ValueEnum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum OutputFormat {
    Text,
    Json,
}

#[repr(usize)]
#[derive(ValueEnum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum LevelFilter {
    /// A level lower than all log levels.
    Off,
    /// Corresponds to the `Error` log level.
    Error,
    /// Corresponds to the `Warn` log level.
    Warn,
    /// Corresponds to the `Info` log level.
    Info,
    /// Corresponds to the `Debug` log level.
    Debug,
    /// Corresponds to the `Trace` log level.
    Trace,
}
