//! Process-wide SIGINT flag, polled by the interactive session between
//! action strings. A command in flight is never interrupted.
use std::{
    ffi::c_int,
    sync::atomic::{AtomicBool, Ordering},
};

use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_sigint(_: c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Installs the SIGINT handler unless the signal is currently ignored,
/// e.g. when started in the background by a shell.
pub fn install() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_sigint),
        SaFlags::empty(),
        SigSet::empty(),
    );
    // SAFETY: the handler only stores to an atomic, which is async-signal-safe.
    let previous = unsafe { sigaction(Signal::SIGINT, &action)? };
    if matches!(previous.handler(), SigHandler::SigIgn) {
        // SAFETY: restores the disposition that was active before.
        unsafe { sigaction(Signal::SIGINT, &previous)? };
        log::debug!("SIGINT is ignored, leaving it alone");
    }
    Ok(())
}

pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}
