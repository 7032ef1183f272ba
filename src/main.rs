mod cli;

use crate::cli::Arguments;
use anyhow::{anyhow, Context};
use chrono::TimeDelta;
use clap::Parser;
use lapwatch::{format, LapData, Stopwatch};
use std::io::{self, Write};
use std::process::{Command, ExitCode};
use tracing_log::LogTracer;

fn main() -> ExitCode {
    let arguments = cli::Arguments::parse();
    set_log_level(&arguments).expect("Failed to configure logging");

    tracing::debug!(?arguments, "starting lapwatch");

    match run(arguments) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(%e, "Unable to time the commands");
            ExitCode::FAILURE
        }
    }
}

fn set_log_level(arguments: &Arguments) -> anyhow::Result<()> {
    LogTracer::init()?;

    let level = match arguments.verbosity {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        3 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn run(arguments: Arguments) -> anyhow::Result<()> {
    let offset = TimeDelta::try_milliseconds(arguments.offset_ms)
        .ok_or_else(|| anyhow!("Offset of {}ms is out of range", arguments.offset_ms))?;

    let stopwatch = Stopwatch::new(offset, true);
    stopwatch.set_formatting_mode(arguments.format);
    if arguments.clock {
        stopwatch.set_formatter(format::clock);
    }

    for command in &arguments.commands {
        tracing::debug!(%command, "Running command");

        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .status()
            .with_context(|| format!("Failed to run `{command}`"))?;

        let mut data = LapData::new();
        data.insert(String::from("status"), status.code().into());
        let lap = stopwatch.lap_with_data(command.as_str(), Some(data));

        if status.success() {
            tracing::info!(%lap, "Command finished");
        } else {
            tracing::warn!(%lap, %status, "Command failed");
        }
    }

    let mut stdout = io::stdout().lock();
    stdout.write_all(&stopwatch.to_json_bytes())?;
    writeln!(stdout)?;

    Ok(())
}
