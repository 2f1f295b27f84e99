pub mod loopback;

use fl_action::{Channels, error::DeviceError};

/// Trait that device backends implement on top of the channel operations
/// so that a session can check the device before talking to it.
pub trait Device: Channels {
    /// Whether the device firmware speaks CommFPGA at all.
    fn is_comm_capable(&self) -> bool;

    /// Whether the FPGA has been programmed and is ready to exchange data.
    fn is_running(&mut self) -> Result<bool, DeviceError>;
}
