use anyhow::Result;
use client::runner;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    runner::run_cli()
}
