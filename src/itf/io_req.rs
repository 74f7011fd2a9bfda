//! The `io_req` interface kind: a synchronous register/memory request and
//! its immediate response.

/// Outcome of a slave's response to an [`IoReq`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoStatus {
    /// The request completed; for a read, `req`'s data now holds the
    /// result.
    Ok,
    /// The offset, size, or direction was not one the slave understands.
    Invalid,
    /// The slave accepted the request but has not completed it yet (not
    /// produced by any peripheral in this crate; reserved for slaves that
    /// model asynchronous completion).
    Pending,
}

/// A single request/response exchange: an offset into the slave's register
/// or memory window, a direction, and a data buffer whose length is the
/// transfer size (and, for this crate's simplified DMA model, also its
/// "actual size" — there is no partial-transfer accounting).
#[derive(Debug, Clone)]
pub struct IoReq {
    /// Byte offset within the slave's address window.
    pub offset: u64,
    /// `true` for a write (data flows host -> slave), `false` for a read.
    pub is_write: bool,
    /// For a write: the bytes being written. For a read: filled in by the
    /// slave on success.
    pub data: Vec<u8>,
}

impl IoReq {
    /// A write request carrying `data`.
    pub fn new_write(offset: u64, data: Vec<u8>) -> Self {
        IoReq { offset, is_write: true, data }
    }

    /// A read request for `size` bytes, the buffer zero-initialized until
    /// a slave fills it in.
    pub fn new_read(offset: u64, size: usize) -> Self {
        IoReq { offset, is_write: false, data: vec![0; size] }
    }

    /// The transfer size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Reads up to the first 4 bytes of `data` as a little-endian word,
    /// the unit the DMA channels pull one byte at a time from.
    pub fn pending_word_le(&self) -> u32 {
        let mut bytes = [0u8; 4];
        let n = self.data.len().min(4);
        bytes[..n].copy_from_slice(&self.data[..n]);
        u32::from_le_bytes(bytes)
    }

    /// Reads `data` as a little-endian `u32`. Panics if shorter than 4
    /// bytes; callers validate `size() == 4` first (see
    /// `UartPeriph::custom_req`).
    pub fn read_u32_le(&self) -> u32 {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.data[..4]);
        u32::from_le_bytes(bytes)
    }

    /// Writes a little-endian `u32` into `data`. Panics if shorter than 4
    /// bytes.
    pub fn write_u32_le(&mut self, value: u32) {
        self.data[..4].copy_from_slice(&value.to_le_bytes());
    }
}
