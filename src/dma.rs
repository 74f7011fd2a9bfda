//! DMA channel base behavior shared by the TX- and RX-side peripherals,
//! grounded on `Io_tx_channel`/`Io_rx_channel` in
//! `udma_i2c_v2.cpp`/`udma_uart_v1.cpp`.
//!
//! A peripheral owns its channel(s) as plain fields; there is no back
//! reference from channel to peripheral because nothing in this crate
//! needs one — the peripheral's own event handler already has `&mut self`
//! and reads `self.tx`/`self.rx` directly.

use std::collections::VecDeque;

use crate::itf::IoReq;

/// Drains queued write requests a word (up to 4 bytes) at a time, with the
/// owning peripheral shifting individual bits or bytes out of the current
/// word via [`DmaTxChannel::consume_bits`]. Requests longer than 4 bytes
/// transparently reload the next word from the same request; the channel
/// only reports completion once every byte of a request has been consumed.
#[derive(Debug, Default)]
pub struct DmaTxChannel {
    ready: VecDeque<IoReq>,
    current: Option<IoReq>,
    offset: usize,
    word_len: usize,
    /// The current word being drained, one bit/byte at a time depending on
    /// the peripheral (I2C drains a byte per word-advance, UART a bit).
    pub pending_word: u32,
    /// Bits remaining in `pending_word` before the channel reloads the
    /// next word (or, if none remain in the request, is done).
    pub pending_bits: u32,
}

impl DmaTxChannel {
    /// Appends a request to the ready FIFO. If the channel is idle, starts
    /// draining it immediately.
    pub fn push_ready_req(&mut self, req: IoReq) {
        self.ready.push_back(req);
        self.pull_next();
    }

    /// True while a request is mid-drain or more are queued.
    pub fn is_busy(&self) -> bool {
        self.pending_bits != 0 || self.current.is_some() || !self.ready.is_empty()
    }

    /// Clears all channel state, including queued and in-flight requests.
    pub fn reset(&mut self) {
        self.ready.clear();
        self.current = None;
        self.offset = 0;
        self.word_len = 0;
        self.pending_word = 0;
        self.pending_bits = 0;
    }

    fn load_word(&mut self) {
        let req = self.current.as_ref().expect("load_word with no active request");
        let remaining = req.data.len() - self.offset;
        let n = remaining.min(4);
        let mut bytes = [0u8; 4];
        bytes[..n].copy_from_slice(&req.data[self.offset..self.offset + n]);
        self.pending_word = u32::from_le_bytes(bytes);
        self.pending_bits = (n as u32) * 8;
        self.word_len = n;
    }

    /// Pulls the next ready request into `pending_word`/`pending_bits` if
    /// the channel is currently idle. A no-op otherwise.
    pub fn pull_next(&mut self) {
        if self.pending_bits != 0 || self.current.is_some() {
            return;
        }
        if let Some(req) = self.ready.pop_front() {
            self.current = Some(req);
            self.offset = 0;
            self.load_word();
        }
    }

    /// Consumes `n` low bits of `pending_word` (`n` is 1 for the UART
    /// engine's bit-at-a-time drain, 8 for the I2C engine's byte-at-a-time
    /// drain). Reloads the next word from the same request if its bytes
    /// aren't yet exhausted; otherwise leaves `pending_bits` at zero for
    /// [`DmaTxChannel::take_completed`].
    pub fn consume_bits(&mut self, n: u32) {
        self.pending_word >>= n;
        self.pending_bits = self.pending_bits.saturating_sub(n);
        if self.pending_bits == 0 {
            self.offset += self.word_len;
            self.word_len = 0;
            if let Some(req) = &self.current {
                if self.offset < req.data.len() {
                    self.load_word();
                }
            }
        }
    }

    /// True once the active request's bytes are fully consumed.
    fn request_exhausted(&self) -> bool {
        match &self.current {
            Some(req) => self.pending_bits == 0 && self.offset >= req.data.len(),
            None => false,
        }
    }

    /// Hands back the request that just finished draining, once
    /// [`DmaTxChannel::request_exhausted`] is true, for the caller to trace
    /// or forward to the (out of scope) upstream DMA/interrupt fabric.
    pub fn take_completed(&mut self) -> Option<IoReq> {
        if self.request_exhausted() {
            self.current.take()
        } else {
            None
        }
    }
}

/// Fills queued read requests one byte at a time from a serial line.
#[derive(Debug, Default)]
pub struct DmaRxChannel {
    ready: VecDeque<IoReq>,
    active: Option<IoReq>,
    filled: usize,
    /// A single pushed byte held here when no read request is ready yet.
    /// The next request to arrive is pre-filled from it; a second byte
    /// pushed while still empty overwrites the first (no overrun
    /// modeling).
    holding: Option<u8>,
    completed: VecDeque<IoReq>,
}

impl DmaRxChannel {
    /// Appends a read request to the ready FIFO, activating it
    /// immediately if the channel has no request in flight.
    pub fn push_ready_req(&mut self, req: IoReq) {
        self.ready.push_back(req);
        self.activate_if_idle();
    }

    fn activate_if_idle(&mut self) {
        if self.active.is_some() {
            return;
        }
        if let Some(mut req) = self.ready.pop_front() {
            self.filled = 0;
            if let Some(byte) = self.holding.take() {
                if !req.data.is_empty() {
                    req.data[0] = byte;
                    self.filled = 1;
                }
            }
            self.active = Some(req);
        }
    }

    /// Pushes one received byte into the active request's buffer,
    /// completing and popping the next ready request once full. If no
    /// request is active, the byte is held in a one-deep register until
    /// one becomes ready.
    pub fn push_data(&mut self, byte: u8) {
        let req = match &mut self.active {
            Some(req) => req,
            None => {
                self.holding = Some(byte);
                return;
            }
        };
        if self.filled < req.data.len() {
            req.data[self.filled] = byte;
            self.filled += 1;
        }
        if self.filled >= req.data.len() {
            let done = self.active.take().unwrap();
            self.completed.push_back(done);
            self.filled = 0;
            self.activate_if_idle();
        }
    }

    /// Pops the oldest completed (fully filled) request, if any.
    pub fn take_completed(&mut self) -> Option<IoReq> {
        self.completed.pop_front()
    }

    /// Clears all channel state, including queued, active, and completed
    /// requests and the one-deep holding register.
    pub fn reset(&mut self) {
        self.ready.clear();
        self.active = None;
        self.filled = 0;
        self.holding = None;
        self.completed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_channel_drains_single_byte_then_idles() {
        let mut tx = DmaTxChannel::default();
        tx.push_ready_req(IoReq::new_write(0, vec![0xAB]));
        assert!(tx.is_busy());
        assert_eq!(tx.pending_bits, 8);
        assert!(tx.take_completed().is_none());
        tx.consume_bits(8);
        assert_eq!(tx.pending_bits, 0);
        let done = tx.take_completed();
        assert!(done.is_some());
        tx.pull_next();
        assert!(!tx.is_busy());
    }

    #[test]
    fn tx_channel_reloads_words_past_four_bytes() {
        let mut tx = DmaTxChannel::default();
        tx.push_ready_req(IoReq::new_write(0, vec![1, 2, 3, 4, 5, 6]));
        let mut bytes = Vec::new();
        while tx.is_busy() {
            bytes.push((tx.pending_word & 0xff) as u8);
            tx.consume_bits(8);
            if let Some(done) = tx.take_completed() {
                assert_eq!(done.data, vec![1, 2, 3, 4, 5, 6]);
                tx.pull_next();
            }
        }
        assert_eq!(bytes, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn rx_channel_fills_and_completes() {
        let mut rx = DmaRxChannel::default();
        rx.push_ready_req(IoReq::new_read(0, 2));
        rx.push_data(0x11);
        assert!(rx.take_completed().is_none());
        rx.push_data(0x22);
        let done = rx.take_completed().unwrap();
        assert_eq!(done.data, vec![0x11, 0x22]);
    }

    #[test]
    fn rx_channel_holds_byte_with_no_ready_request() {
        let mut rx = DmaRxChannel::default();
        rx.push_data(0x55);
        rx.push_ready_req(IoReq::new_read(0, 1));
        let done = rx.take_completed().unwrap();
        assert_eq!(done.data, vec![0x55]);
    }
}
