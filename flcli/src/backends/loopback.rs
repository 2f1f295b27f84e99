//! # Loopback Backend
//!
//! An in-memory device for trying out action strings without hardware.
//! Every channel is a FIFO: bytes written to a channel are returned by
//! subsequent reads of the same channel.
//!
//! ```text
//! $ flcli -a 'w1 48656c6c6f;r1 5' loopback
//! 00000000 48 65 6C 6C 6F                                  Hello
//! ```
use std::{collections::VecDeque, time::Duration};

use fl_action::{Channels, error::DeviceError};

use crate::backends::Device;

const NUM_CHANNELS: usize = 128;

pub struct Loopback {
    fifos: Vec<VecDeque<u8>>,
    conduit: Option<u8>,
}

impl Loopback {
    pub fn new() -> Loopback {
        Loopback {
            fifos: vec![VecDeque::new(); NUM_CHANNELS],
            conduit: None,
        }
    }

    /// The conduit selected last, if any.
    pub fn conduit(&self) -> Option<u8> {
        self.conduit
    }

    /// Number of bytes waiting to be read from `channel`.
    #[cfg(test)]
    pub fn queued(&self, channel: u8) -> usize {
        self.fifos.get(channel as usize).map_or(0, VecDeque::len)
    }

    fn fifo(&mut self, channel: u8) -> Result<&mut VecDeque<u8>, DeviceError> {
        self.fifos
            .get_mut(channel as usize)
            .ok_or_else(|| DeviceError::Other(format!("Channel {} does not exist", channel)))
    }
}

impl Default for Loopback {
    fn default() -> Self {
        Self::new()
    }
}

impl Channels for Loopback {
    fn read_channel(
        &mut self,
        _timeout: Duration,
        channel: u8,
        buf: &mut [u8],
    ) -> Result<(), DeviceError> {
        let length = buf.len();
        let fifo = self.fifo(channel)?;
        if fifo.len() < length {
            log::debug!(
                "Loopback read of {} bytes from channel {}, but only {} queued",
                length,
                channel,
                fifo.len()
            );
            return Err(DeviceError::Timeout { channel });
        }
        for (dst, src) in buf.iter_mut().zip(fifo.drain(..length)) {
            *dst = src;
        }
        log::trace!("Loopback read channel {}: {:02x?}", channel, buf);
        Ok(())
    }

    fn write_channel(
        &mut self,
        _timeout: Duration,
        channel: u8,
        data: &[u8],
    ) -> Result<(), DeviceError> {
        log::trace!("Loopback write channel {}: {:02x?}", channel, data);
        self.fifo(channel)?.extend(data);
        Ok(())
    }

    fn set_conduit(&mut self, conduit: u8) -> Result<(), DeviceError> {
        log::debug!("Loopback conduit set to {}", conduit);
        self.conduit = Some(conduit);
        Ok(())
    }
}

impl Device for Loopback {
    fn is_comm_capable(&self) -> bool {
        true
    }

    fn is_running(&mut self) -> Result<bool, DeviceError> {
        Ok(true)
    }
}
