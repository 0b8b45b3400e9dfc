use crate::error::Error;

/// A growable byte buffer for results, whose growth can fail instead of aborting.
///
/// Growth first asks for amortized room, then for exactly what is needed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputBuffer {
    buf: Vec<u8>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        let mut buffer = Self::new();
        buffer.reserve(capacity)?;
        Ok(buffer)
    }

    pub fn reserve(&mut self, additional: usize) -> Result<(), Error> {
        if self.buf.try_reserve(additional).is_ok() {
            return Ok(());
        }
        self.buf
            .try_reserve_exact(additional)
            .map_err(|source| Error::Allocation { additional, source })
    }

    pub fn push(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.reserve(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    pub fn push_byte(&mut self, byte: u8) -> Result<(), Error> {
        self.reserve(1)?;
        self.buf.push(byte);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
