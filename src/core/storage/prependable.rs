use crate::{
    Error,
    Result,
};

/// Fixed size buffer which is filled from the back toward the front, so that
/// lower layers can prepend their headers to whatever is already there.
#[derive(Clone, Debug)]
pub struct Prependable {
    buffer: Vec<u8>,
    used_from: usize,
}

impl Prependable {
    /// Creates a buffer with room for size bytes of headers.
    pub fn new(size: usize) -> Prependable {
        Prependable {
            buffer: vec![0; size],
            used_from: size,
        }
    }

    /// Reserves size bytes in front of the used region and returns them.
    pub fn prepend(&mut self, size: usize) -> Result<&mut [u8]> {
        if size > self.used_from {
            return Err(Error::Exhausted);
        }

        self.used_from -= size;
        Ok(&mut self.buffer[self.used_from .. self.used_from + size])
    }

    /// Returns the prepended bytes.
    pub fn view(&self) -> &[u8] {
        &self.buffer[self.used_from ..]
    }

    pub fn used_len(&self) -> usize {
        self.buffer.len() - self.used_from
    }

    pub fn available_len(&self) -> usize {
        self.used_from
    }
}
