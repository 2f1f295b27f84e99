//! Test support: a scripted device that loops writes back to reads and
//! records every operation it is asked to perform.
use std::{
    collections::{HashMap, VecDeque},
    time::Duration,
};

use fl_action::{Channels, error::DeviceError};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Op {
    Read {
        channel: u8,
        length: usize,
        timeout: Duration,
    },
    Write {
        channel: u8,
        data: Vec<u8>,
        timeout: Duration,
    },
    SetConduit(u8),
}

/// Every channel is a FIFO: writes append to it, reads take from it.
/// A read that asks for more bytes than are queued times out.
#[derive(Debug, Default)]
pub struct ScriptedDevice {
    queues: HashMap<u8, VecDeque<u8>>,
    ops: Vec<Op>,
    fail_at: Option<usize>,
    conduit: Option<u8>,
}

impl ScriptedDevice {
    pub fn new() -> ScriptedDevice {
        ScriptedDevice::default()
    }

    /// Queue `data` to be returned by reads of `channel`.
    pub fn preload(mut self, channel: u8, data: &[u8]) -> Self {
        self.queues.entry(channel).or_default().extend(data);
        self
    }

    /// Make the `index`-th operation (counting from zero) fail.
    pub fn fail_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn conduit(&self) -> Option<u8> {
        self.conduit
    }

    pub fn queued(&self, channel: u8) -> Vec<u8> {
        self.queues
            .get(&channel)
            .map(|queue| queue.iter().copied().collect())
            .unwrap_or_default()
    }

    fn record(&mut self, op: Op) -> Result<(), DeviceError> {
        self.ops.push(op);
        if self.fail_at == Some(self.ops.len() - 1) {
            return Err(DeviceError::Other("injected failure".to_string()));
        }
        Ok(())
    }
}

impl Channels for ScriptedDevice {
    fn read_channel(
        &mut self,
        timeout: Duration,
        channel: u8,
        buf: &mut [u8],
    ) -> Result<(), DeviceError> {
        self.record(Op::Read {
            channel,
            length: buf.len(),
            timeout,
        })?;
        let length = buf.len();
        let queue = self.queues.entry(channel).or_default();
        if queue.len() < length {
            return Err(DeviceError::Timeout { channel });
        }
        for (dst, src) in buf.iter_mut().zip(queue.drain(..length)) {
            *dst = src;
        }
        Ok(())
    }

    fn write_channel(
        &mut self,
        timeout: Duration,
        channel: u8,
        data: &[u8],
    ) -> Result<(), DeviceError> {
        self.record(Op::Write {
            channel,
            data: data.to_vec(),
            timeout,
        })?;
        self.queues.entry(channel).or_default().extend(data);
        Ok(())
    }

    fn set_conduit(&mut self, conduit: u8) -> Result<(), DeviceError> {
        self.record(Op::SetConduit(conduit))?;
        self.conduit = Some(conduit);
        Ok(())
    }
}
