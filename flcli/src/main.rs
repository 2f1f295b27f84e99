//! # FPGALink Command-Line Interface
//!
//! Opens an FPGALink device and exchanges data with it over CommFPGA channels,
//! either by executing a single action string (`--action`) or interactively
//! (`--cli`). See the [`fl_action`] crate for the action language itself.
//!
//! The process exit code is `0` on success and the error kind of the failing
//! action string otherwise (e.g. `3` for a channel out of range, `12` for bad
//! arguments).
pub mod backends;
pub mod session;
pub mod signal;

use std::io;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use clap_num::maybe_hex;
use env_logger::Env;
use fl_action::{Config, error::ErrorKind};

use crate::backends::{Device, loopback::Loopback};
use crate::session::{Session, SessionError};

#[derive(Subcommand, Eq, PartialEq, Clone, Debug)]
enum DeviceImpl {
    /// In-memory device that returns written bytes on reads of the same channel
    Loopback,
}

#[derive(Parser)]
#[command(about = "Interact with an FPGALink device over CommFPGA channels", long_about=None)]
struct Args {
    #[arg(
        short,
        long,
        value_name = "ACTION",
        help = "A series of CommFPGA actions, e.g. \"w0 1a2b;r1 4\""
    )]
    action: Option<String>,

    #[arg(short, long, help = "Start up an interactive CommFPGA session")]
    cli: bool,

    #[arg(short, long, help = "Enable benchmarking & checksumming")]
    benchmark: bool,

    #[arg(
        short,
        long = "fm",
        value_name = "FIFO_MODE",
        help = "Which comm conduit to choose",
        default_value = "0x01",
        value_parser = maybe_hex::<u8>
    )]
    fifo_mode: u8,

    #[clap(subcommand)]
    device: Option<DeviceImpl>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if let Err(err) = e.print() {
                log::warn!("Could not print argument error: {}", err);
            }
            return if e.use_stderr() {
                ExitCode::from(ErrorKind::BadArguments.code())
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    log::debug!(
        "Parsed arguments: action={:?}, cli={}, benchmark={}, fifo_mode={}",
        args.action,
        args.cli,
        args.benchmark,
        args.fifo_mode
    );

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Failed action strings have already printed their diagnostic
            if !matches!(e, SessionError::Action(_)) {
                eprintln!("{}", e);
            }
            ExitCode::from(e.code())
        }
    }
}

fn run(args: &Args) -> Result<(), SessionError> {
    let config = Config {
        benchmark: args.benchmark,
        ..Config::default()
    };

    match args.device.clone().unwrap_or(DeviceImpl::Loopback) {
        DeviceImpl::Loopback => {
            println!("Attempting to open connection to FPGALink device loopback...");
            log::info!("Opening loopback device");
            let mut session = Session::new(Loopback::new(), "loopback", config);
            let result = drive(&mut session, args);
            log::debug!(
                "Loopback conduit at exit: {:?}",
                session.device().conduit()
            );
            result
        }
    }
}

fn drive<D: Device>(session: &mut Session<D>, args: &Args) -> Result<(), SessionError> {
    if args.action.is_none() && !args.cli {
        log::info!("Neither an action string nor an interactive session was requested");
    }
    if let Some(line) = &args.action {
        session.batch(
            line,
            args.fifo_mode,
            &mut io::stdout().lock(),
            &mut io::stderr().lock(),
        )?;
    }
    if args.cli {
        // Only the interactive loop polls the flag; elsewhere SIGINT keeps its default action
        if let Err(e) = signal::install() {
            log::warn!("Could not install SIGINT handler: {}", e);
        }
        session.interactive(
            args.fifo_mode,
            &mut io::stdin().lock(),
            &mut io::stdout().lock(),
            &mut io::stderr().lock(),
        )?;
    }
    Ok(())
}
