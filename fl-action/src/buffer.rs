use std::collections::TryReserveError;

/// Collects the bytes of every read in an action string that is not
/// redirected to a file, in command order.
#[derive(Debug, Default)]
pub struct Accumulator {
    data: Vec<u8>,
}

impl Accumulator {
    const INITIAL_CAPACITY: usize = 1024;

    pub fn new() -> Result<Accumulator, TryReserveError> {
        let mut data = Vec::new();
        data.try_reserve(Self::INITIAL_CAPACITY)?;
        Ok(Accumulator { data })
    }

    /// Grows the buffer by `count` zero bytes and returns the offset of the
    /// first new byte.
    pub fn append_zeroed(&mut self, count: usize) -> Result<usize, TryReserveError> {
        let offset = self.data.len();
        self.data.try_reserve(count)?;
        self.data.resize(offset + count, 0x00);
        Ok(offset)
    }

    /// Mutable view of everything from `offset` to the tail.
    pub fn tail_mut(&mut self, offset: usize) -> &mut [u8] {
        &mut self.data[offset..]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}
