use crate::cli::{Cli, LevelFilter, OutputFormat};
use anyhow::{Context, Result};
use clap::{ArgMatches, CommandFactory, FromArgMatches};
use log::{debug, info, warn};
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};
use sispm_usb::error::CommandError;
use sispm_usb::sispm_types::{DeviceStatus, Identity, OutletState, OutletStatus};
use sispm_usb::{
    registry, DeviceSelector, ExecutablePowerStrip, FullPowerStrip, PowerStripCommands,
};
use std::io::Write;
use std::process::ExitCode;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Select(DeviceSelector),
    Switch(Action),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    On(u8),
    Off(u8),
    Toggle(u8),
}

impl Action {
    pub fn outlet(&self) -> u8 {
        match self {
            Action::On(outlet) | Action::Off(outlet) | Action::Toggle(outlet) => *outlet,
        }
    }
}

pub fn run_cli() -> Result<ExitCode> {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|error| error.exit());

    CombinedLogger::init(vec![TermLogger::new(
        match cli.log_level {
            LevelFilter::Off => log::LevelFilter::Off,
            LevelFilter::Error => log::LevelFilter::Error,
            LevelFilter::Warn => log::LevelFilter::Warn,
            LevelFilter::Info => log::LevelFilter::Info,
            LevelFilter::Debug => log::LevelFilter::Debug,
            LevelFilter::Trace => log::LevelFilter::Trace,
        },
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )])
    .context("Could not configure the logger")?;

    let steps = ordered_steps(&cli, &matches)?;

    let mut devices = registry::enumerate().context("Unable to enumerate USB devices")?;
    if report_missing_devices(&devices, &mut std::io::stderr())? {
        return Ok(ExitCode::FAILURE);
    }

    run_steps(&mut devices, &steps)?;

    // Always output the status of every device.
    let statuses = collect_status(&mut devices)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.format {
        OutputFormat::Text => write_text_status(&mut out, &statuses)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &statuses)?;
            writeln!(out)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

pub(crate) fn report_missing_devices(
    devices: &[Box<dyn FullPowerStrip>],
    err: &mut impl Write,
) -> std::io::Result<bool> {
    if !devices.is_empty() {
        return Ok(false);
    }
    writeln!(err, "No device found")?;
    Ok(true)
}

/// Clap keeps each flag's values apart, so the command line order is recovered from the
/// argument indices. A device selection applies to every action after it.
pub(crate) fn ordered_steps(cli: &Cli, matches: &ArgMatches) -> Result<Vec<Step>> {
    let mut steps: Vec<(usize, Step)> = Vec::new();

    for (index, id) in indexed(matches, "device_id", &cli.device_id) {
        let identity: Identity = id
            .parse()
            .with_context(|| format!("Invalid device ID '{}'", id))?;
        steps.push((index, Step::Select(DeviceSelector::Identity(identity))));
    }
    for (index, device) in indexed(matches, "device", &cli.device) {
        steps.push((index, Step::Select(DeviceSelector::Index(device))));
    }
    for (index, outlet) in indexed(matches, "on", &cli.on) {
        steps.push((index, Step::Switch(Action::On(outlet))));
    }
    for (index, outlet) in indexed(matches, "off", &cli.off) {
        steps.push((index, Step::Switch(Action::Off(outlet))));
    }
    for (index, outlet) in indexed(matches, "toggle", &cli.toggle) {
        steps.push((index, Step::Switch(Action::Toggle(outlet))));
    }

    steps.sort_by_key(|(index, _)| *index);
    Ok(steps.into_iter().map(|(_, step)| step).collect())
}

fn indexed<T: Clone>(matches: &ArgMatches, id: &str, values: &[T]) -> Vec<(usize, T)> {
    matches
        .indices_of(id)
        .into_iter()
        .flatten()
        .zip(values.iter().cloned())
        .collect()
}

/// Runs the steps in order. Actions before any selection go to the lone attached strip.
pub fn run_steps(devices: &mut [Box<dyn FullPowerStrip>], steps: &[Step]) -> Result<()> {
    let mut current = None;
    for step in steps {
        match step {
            Step::Select(selector) => {
                current = Some(registry::select_device(devices, Some(selector))?);
            }
            Step::Switch(action) => {
                let index = match current {
                    Some(index) => index,
                    None => {
                        let index = registry::select_device(devices, None)?;
                        current = Some(index);
                        index
                    }
                };
                apply_action(devices[index].as_mut(), *action)?;
            }
        }
    }
    Ok(())
}

/// An outlet the device doesn't have is reported and skipped, any USB failure stops the run.
pub fn apply_action(device: &mut dyn FullPowerStrip, action: Action) -> Result<()> {
    let outlet = action.outlet();
    let result = match action {
        Action::On(_) => device.set_status(outlet, OutletState::On),
        Action::Off(_) => device.set_status(outlet, OutletState::Off),
        Action::Toggle(_) => device.toggle(outlet).map(|state| {
            debug!("Outlet {} toggled to {}", outlet, state);
        }),
    };

    match result {
        Ok(()) => info!("{:?} applied to {:?}", action, device.usb_device()),
        Err(CommandError::InvalidOutlet { min, max, .. }) => {
            let identity = device.get_identity()?;
            warn!("{:?} skipped, outlet {} does not exist", action, outlet);
            eprintln!(
                "Device {} only has outlets {}..{}",
                describe_identity(identity.as_ref()),
                min,
                max
            );
        }
        Err(error) => {
            return Err(error).with_context(|| format!("Could not apply {:?}", action));
        }
    }
    Ok(())
}

/// A short status report leaves that outlet unknown, the listing carries on.
pub fn collect_status(devices: &mut [Box<dyn FullPowerStrip>]) -> Result<Vec<DeviceStatus>> {
    let mut statuses = Vec::with_capacity(devices.len());
    for (index, device) in devices.iter_mut().enumerate() {
        let identity = device.get_identity()?;

        let mut outlets = Vec::new();
        for outlet in device.profile().outlets() {
            let state = match device.get_status(outlet) {
                Ok(state) => Some(state),
                Err(CommandError::MalformedResponse { received, .. }) => {
                    warn!(
                        "Device {} sent a {} byte report for outlet {}",
                        index, received, outlet
                    );
                    None
                }
                Err(error) => {
                    return Err(error).with_context(|| {
                        format!("Could not read the status of device {}", index)
                    });
                }
            };
            outlets.push(OutletStatus { outlet, state });
        }

        statuses.push(DeviceStatus {
            index,
            identity,
            product_id: device.usb_device().product_id(),
            outlets,
        });
    }
    Ok(statuses)
}

pub fn write_text_status(out: &mut impl Write, statuses: &[DeviceStatus]) -> std::io::Result<()> {
    for status in statuses {
        writeln!(
            out,
            "device {}, {}",
            status.index,
            describe_identity(status.identity.as_ref())
        )?;
        for outlet in &status.outlets {
            match outlet.state {
                Some(state) => writeln!(out, "\tstatus[{}] = {}", outlet.outlet, state)?,
                None => writeln!(out, "\tstatus[{}] = unknown", outlet.outlet)?,
            }
        }
    }
    Ok(())
}

fn describe_identity(identity: Option<&Identity>) -> String {
    match identity {
        Some(identity) => identity.to_string(),
        None => String::from("unavailable"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sispm_usb::device::mock::MockPowerStrip;
    use sispm_usb::devices::{PID_MSISPM_FLASH, PID_MSISPM_OLD};

    fn matches(args: &[&str]) -> ArgMatches {
        Cli::command()
            .try_get_matches_from(std::iter::once("sispmctl").chain(args.iter().copied()))
            .unwrap()
    }

    fn steps(args: &[&str]) -> Vec<Step> {
        let matches = matches(args);
        let cli = Cli::from_arg_matches(&matches).unwrap();
        ordered_steps(&cli, &matches).unwrap()
    }

    fn two_strips() -> Vec<Box<dyn FullPowerStrip>> {
        vec![
            Box::new(MockPowerStrip::new(PID_MSISPM_FLASH)),
            Box::new(
                MockPowerStrip::new(PID_MSISPM_FLASH)
                    .at(1, 2)
                    .with_identity(&[1, 1, 0x53, 0x50, 0x27]),
            ),
        ]
    }

    #[test]
    fn actions_keep_command_line_order() {
        assert_eq!(
            steps(&["-o", "1", "-f", "2", "-t", "3", "--on", "4", "-f", "1"]),
            vec![
                Step::Switch(Action::On(1)),
                Step::Switch(Action::Off(2)),
                Step::Switch(Action::Toggle(3)),
                Step::Switch(Action::On(4)),
                Step::Switch(Action::Off(1)),
            ]
        );
    }

    #[test]
    fn no_steps_without_flags() {
        assert!(steps(&["--format", "json"]).is_empty());
    }

    #[test]
    fn device_selections_are_interleaved_with_actions() {
        assert_eq!(
            steps(&["-d", "0", "-o", "1", "-D", "01:01:53:50:27", "-f", "2", "-d", "1", "-t", "3"]),
            vec![
                Step::Select(DeviceSelector::Index(0)),
                Step::Switch(Action::On(1)),
                Step::Select(DeviceSelector::Identity(
                    Identity::from_bytes(&[1, 1, 0x53, 0x50, 0x27]).unwrap()
                )),
                Step::Switch(Action::Off(2)),
                Step::Select(DeviceSelector::Index(1)),
                Step::Switch(Action::Toggle(3)),
            ]
        );
    }

    #[test]
    fn malformed_device_id_is_rejected() {
        let matches = matches(&["-D", "nope"]);
        let cli = Cli::from_arg_matches(&matches).unwrap();
        assert!(ordered_steps(&cli, &matches).is_err());
    }

    #[test]
    fn each_action_goes_to_the_latest_selection() {
        let mut devices = two_strips();
        let steps = steps(&["-d", "0", "-o", "1", "-d", "1", "-o", "2", "-D", "01:01:53:50:27", "-o", "3"]);
        run_steps(&mut devices, &steps).unwrap();

        assert_eq!(devices[0].get_status(1).unwrap(), OutletState::On);
        assert_eq!(devices[0].get_status(2).unwrap(), OutletState::Off);
        assert_eq!(devices[1].get_status(1).unwrap(), OutletState::Off);
        assert_eq!(devices[1].get_status(2).unwrap(), OutletState::On);
        assert_eq!(devices[1].get_status(3).unwrap(), OutletState::On);
    }

    #[test]
    fn actions_without_selection_need_a_lone_device() {
        let mut devices = two_strips();
        assert!(run_steps(&mut devices, &[Step::Switch(Action::On(1))]).is_err());
        assert_eq!(devices[0].get_status(1).unwrap(), OutletState::Off);

        devices.truncate(1);
        run_steps(&mut devices, &[Step::Switch(Action::On(1))]).unwrap();
        assert_eq!(devices[0].get_status(1).unwrap(), OutletState::On);
    }

    #[test]
    fn unknown_device_index_is_an_error() {
        let mut devices = two_strips();
        let steps = [Step::Select(DeviceSelector::Index(2)), Step::Switch(Action::On(1))];
        assert!(run_steps(&mut devices, &steps).is_err());
    }

    #[test]
    fn actions_are_applied_in_order() {
        let mut strip = MockPowerStrip::new(PID_MSISPM_FLASH);
        for action in [Action::On(1), Action::Toggle(2), Action::Off(1), Action::Toggle(3)] {
            apply_action(&mut strip, action).unwrap();
        }

        assert_eq!(strip.get_status(1).unwrap(), OutletState::Off);
        assert_eq!(strip.get_status(2).unwrap(), OutletState::On);
        assert_eq!(strip.get_status(3).unwrap(), OutletState::On);
        assert_eq!(strip.get_status(4).unwrap(), OutletState::Off);
    }

    #[test]
    fn invalid_outlet_is_skipped_and_later_actions_run() {
        let mut devices: Vec<Box<dyn FullPowerStrip>> =
            vec![Box::new(MockPowerStrip::new(PID_MSISPM_FLASH))];
        let steps = [Step::Switch(Action::On(5)), Step::Switch(Action::On(2))];
        run_steps(&mut devices, &steps).unwrap();
        assert_eq!(devices[0].get_status(2).unwrap(), OutletState::On);
    }

    #[test]
    fn transport_failure_stops_the_run() {
        let mut strip = MockPowerStrip::new(PID_MSISPM_FLASH);
        strip.fail_next(sispm_usb::rusb::Error::NoDevice);
        let mut devices: Vec<Box<dyn FullPowerStrip>> = vec![Box::new(strip)];
        let steps = [Step::Switch(Action::On(1)), Step::Switch(Action::On(2))];
        assert!(run_steps(&mut devices, &steps).is_err());
        assert_eq!(devices[0].get_status(2).unwrap(), OutletState::Off);
    }

    #[test]
    fn missing_devices_print_a_plain_message() {
        let mut err = Vec::new();
        assert!(report_missing_devices(&[], &mut err).unwrap());
        assert_eq!(String::from_utf8(err).unwrap(), "No device found\n");

        let mut err = Vec::new();
        assert!(!report_missing_devices(&two_strips(), &mut err).unwrap());
        assert!(err.is_empty());
    }

    #[test]
    fn short_status_report_leaves_outlet_unknown() {
        let mut first = MockPowerStrip::new(PID_MSISPM_FLASH);
        // Identity read, then the report for outlet 1.
        first.queue_response(vec![1, 1, 0x53, 0x50, 0x26]);
        first.queue_response(vec![]);
        first.set_status(2, OutletState::On).unwrap();
        let mut devices: Vec<Box<dyn FullPowerStrip>> = vec![
            Box::new(first),
            Box::new(MockPowerStrip::new(PID_MSISPM_OLD).at(1, 2)),
        ];

        let statuses = collect_status(&mut devices).unwrap();
        let mut out = Vec::new();
        write_text_status(&mut out, &statuses).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "device 0, 01:01:53:50:26\n\
             \tstatus[1] = unknown\n\
             \tstatus[2] = on\n\
             \tstatus[3] = off\n\
             \tstatus[4] = off\n\
             device 1, 01:01:53:50:26\n\
             \tstatus[0] = off\n"
        );
        assert_eq!(
            serde_json::to_value(&statuses).unwrap()[0]["outlets"][0]["state"],
            serde_json::Value::Null
        );
    }

    #[test]
    fn transport_failure_stops_the_status_listing() {
        let mut strip = MockPowerStrip::new(PID_MSISPM_FLASH);
        strip.fail_next(sispm_usb::rusb::Error::Io);
        let mut devices: Vec<Box<dyn FullPowerStrip>> = vec![Box::new(strip)];
        assert!(collect_status(&mut devices).is_err());
    }

    #[test]
    fn status_is_printed_for_every_device() {
        let mut devices: Vec<Box<dyn FullPowerStrip>> = vec![
            Box::new(MockPowerStrip::new(PID_MSISPM_OLD).with_identity(&[])),
            Box::new(MockPowerStrip::new(PID_MSISPM_FLASH).at(1, 2)),
        ];
        devices[1].set_status(3, OutletState::On).unwrap();

        let statuses = collect_status(&mut devices).unwrap();
        let mut out = Vec::new();
        write_text_status(&mut out, &statuses).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "device 0, unavailable\n\
             \tstatus[0] = off\n\
             device 1, 01:01:53:50:26\n\
             \tstatus[1] = off\n\
             \tstatus[2] = off\n\
             \tstatus[3] = on\n\
             \tstatus[4] = off\n"
        );
    }

    #[test]
    fn json_status_uses_identity_strings() {
        let mut devices: Vec<Box<dyn FullPowerStrip>> =
            vec![Box::new(MockPowerStrip::new(PID_MSISPM_OLD).with_identity(&[]))];
        let statuses = collect_status(&mut devices).unwrap();
        let json = serde_json::to_value(&statuses).unwrap();
        assert_eq!(json[0]["identity"], serde_json::Value::Null);
        assert_eq!(json[0]["product_id"], 0xfd10);
        assert_eq!(json[0]["outlets"][0]["state"], "off");
    }
}
