//! UART engine, v1, grounded on `Uart_periph_v1` in `udma_uart_v1.cpp` for
//! the TX path. The RX path has no counterpart in the retrieved source —
//! it's this crate's own addition, mirroring the TX framing symmetrically:
//! START/DATA/PARITY/STOP, LSB first, XOR parity, no overrun modeling.

use bitflags::bitflags;

use crate::component::Component;
use crate::config::ComponentConfig;
use crate::dma::{DmaRxChannel, DmaTxChannel};
use crate::error::Result;
use crate::itf::{IoReq, IoStatus, MasterPort};
use crate::scheduler::{ComponentId, Cycle, EventTag, Scheduler};
use crate::trace::Tracer;

const TX_EVENT: EventTag = 0;

/// Byte offset of the read-only STATUS register in this engine's
/// register window.
pub const STATUS_OFFSET: u64 = 0x00;
/// Byte offset of the read/write SETUP register.
pub const SETUP_OFFSET: u64 = 0x04;

bitflags! {
    /// STATUS register bits. Reading STATUS clears `RX_PE`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UartStatus: u32 {
        /// A TX request is mid-drain.
        const TX_BUSY = 1 << 0;
        /// A frame is mid-reception.
        const RX_BUSY = 1 << 1;
        /// A parity or stop-bit framing error was detected since STATUS
        /// was last read.
        const RX_PE = 1 << 2;
    }
}

/// Decoded SETUP register fields. Bit layout (this crate's own encoding,
/// documented here since it isn't present in the retrieved source):
///
/// ```text
/// bit 0      parity enable
/// bits 1-2   bit_length - 5 (so 0..=3 encodes 5..=8 data bits)
/// bit 3      stop_bits - 1 (so 0/1 encodes 1/2 stop bits)
/// bit 4      tx enable
/// bit 5      rx enable
/// bits 16-31 clkdiv
/// ```
#[derive(Debug, Clone, Copy)]
pub struct UartSetup {
    /// Whether a parity bit is sent/expected after the data bits.
    pub parity: bool,
    /// Data bits per frame, 5 through 8.
    pub bit_length: u8,
    /// Stop bits per frame, 1 or 2.
    pub stop_bits: u8,
    /// TX enable: when clear, the TX state machine still advances but
    /// drives nothing onto the line.
    pub tx: bool,
    /// RX enable, advisory only: [`UartPeriph::rx_sync`] always advances
    /// the RX state machine; callers gate on this themselves.
    pub rx: bool,
    /// Clock divider: cycles between successive bit transitions.
    pub clkdiv: u32,
}

const PARITY_BIT: u32 = 0;
const BIT_LENGTH_SHIFT: u32 = 1;
const BIT_LENGTH_MASK: u32 = 0b11;
const STOP_BITS_BIT: u32 = 3;
const TX_BIT: u32 = 4;
const RX_BIT: u32 = 5;
const CLKDIV_SHIFT: u32 = 16;

impl Default for UartSetup {
    fn default() -> Self {
        UartSetup::from_reg(0)
    }
}

impl UartSetup {
    /// Decodes a 32-bit SETUP register value.
    pub fn from_reg(value: u32) -> Self {
        UartSetup {
            parity: (value >> PARITY_BIT) & 1 != 0,
            bit_length: (((value >> BIT_LENGTH_SHIFT) & BIT_LENGTH_MASK) as u8) + 5,
            stop_bits: (((value >> STOP_BITS_BIT) & 1) as u8) + 1,
            tx: (value >> TX_BIT) & 1 != 0,
            rx: (value >> RX_BIT) & 1 != 0,
            clkdiv: value >> CLKDIV_SHIFT,
        }
    }

    /// Encodes back to a 32-bit register value.
    pub fn to_reg(self) -> u32 {
        ((self.parity as u32) << PARITY_BIT)
            | (((self.bit_length - 5) as u32 & BIT_LENGTH_MASK) << BIT_LENGTH_SHIFT)
            | (((self.stop_bits - 1) as u32 & 1) << STOP_BITS_BIT)
            | ((self.tx as u32) << TX_BIT)
            | ((self.rx as u32) << RX_BIT)
            | (self.clkdiv << CLKDIV_SHIFT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Start,
    Data,
    Parity,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RxState {
    Start,
    Data,
    Parity,
    Stop,
}

/// The UART engine: one `uart` master port for TX, one `uart_sync`-style
/// inbound method for RX, and a two-register memory-mapped window
/// (STATUS, SETUP) reachable through [`UartPeriph::custom_req`].
pub struct UartPeriph {
    name: String,
    tracer: Tracer,
    id: ComponentId,
    /// `line` master port, typed as `uart`: carries one bit per sync.
    pub line: MasterPort<u8>,
    tx: DmaTxChannel,
    rx: DmaRxChannel,
    setup_reg: u32,
    setup: UartSetup,
    rx_pe: bool,

    tx_state: TxState,
    tx_parity: u8,
    tx_sent_bits: u8,
    tx_stop_remaining: u8,
    next_bit_cycle: Option<Cycle>,

    rx_state: RxState,
    rx_shift: u8,
    rx_received_bits: u8,
    rx_parity: u8,
}

impl UartPeriph {
    /// Builds a `UartPeriph`. No configuration keys are required; framing
    /// (parity, bit length, stop bits, clkdiv, TX/RX enable) is all set at
    /// runtime through the SETUP register.
    pub fn build(name: impl Into<String>, _config: &ComponentConfig) -> Result<Self> {
        let name = name.into();
        Ok(UartPeriph {
            tracer: Tracer::new(name.clone()),
            name,
            id: ComponentId(0),
            line: MasterPort::new("line"),
            tx: DmaTxChannel::default(),
            rx: DmaRxChannel::default(),
            setup_reg: 0,
            setup: UartSetup::default(),
            rx_pe: false,
            tx_state: TxState::Start,
            tx_parity: 0,
            tx_sent_bits: 0,
            tx_stop_remaining: 0,
            next_bit_cycle: None,
            rx_state: RxState::Start,
            rx_shift: 0,
            rx_received_bits: 0,
            rx_parity: 0,
        })
    }

    /// Pushes bytes onto the TX channel and kicks the engine if it was
    /// idle.
    pub fn push_tx_bytes(&mut self, sched: &mut Scheduler, bytes: &[u8]) {
        self.tx.push_ready_req(IoReq::new_write(0, bytes.to_vec()));
        self.check_tx_state(sched);
    }

    /// Pops the next completed RX request (a request queued with
    /// [`UartPeriph::push_rx_buffer`] that has since been filled).
    pub fn take_rx_req(&mut self) -> Option<IoReq> {
        self.rx.take_completed()
    }

    /// Queues a buffer for the RX path to fill.
    pub fn push_rx_buffer(&mut self, size: usize) {
        self.rx.push_ready_req(IoReq::new_read(0, size));
    }

    /// Receives one line-level bit. Advances the RX state machine
    /// regardless of the SETUP `rx` enable bit (mirroring the TX path's
    /// SETUP gate would require timing information the line itself
    /// doesn't carry); callers that care about `rx` enablement should
    /// gate calls to this method on [`UartPeriph::setup`] themselves.
    pub fn rx_sync(&mut self, bit: u8) {
        match self.rx_state {
            RxState::Start => {
                if bit == 0 {
                    self.rx_shift = 0;
                    self.rx_received_bits = 0;
                    self.rx_parity = 0;
                    self.rx_state = RxState::Data;
                }
            }
            RxState::Data => {
                self.rx_shift |= bit << self.rx_received_bits;
                self.rx_parity ^= bit;
                self.rx_received_bits += 1;
                if self.rx_received_bits == self.setup.bit_length {
                    self.rx_received_bits = 0;
                    self.rx_state = if self.setup.parity { RxState::Parity } else { RxState::Stop };
                }
            }
            RxState::Parity => {
                if bit != self.rx_parity {
                    self.rx_pe = true;
                    self.tracer.warning("RX parity error");
                }
                self.rx_state = RxState::Stop;
            }
            RxState::Stop => {
                if bit != 1 {
                    self.rx_pe = true;
                    self.tracer.warning("RX framing error: missing stop bit");
                }
                self.rx_received_bits += 1;
                if self.rx_received_bits >= self.setup.stop_bits {
                    self.tracer.msg(format!("received byte 0x{:02x}", self.rx_shift));
                    self.rx.push_data(self.rx_shift);
                    self.rx_state = RxState::Start;
                }
            }
        }
    }

    /// True while a frame is mid-reception (START through the final STOP
    /// bit).
    pub fn rx_busy(&self) -> bool {
        self.rx_state != RxState::Start
    }

    /// Whether a parity or framing error has been latched since STATUS
    /// was last read. Unlike reading the STATUS register through
    /// [`UartPeriph::custom_req`], this does not clear the flag.
    pub fn rx_parity_error(&self) -> bool {
        self.rx_pe
    }

    /// The decoded SETUP fields currently in effect.
    pub fn setup(&self) -> UartSetup {
        self.setup
    }

    /// Dispatches a register access against this engine's STATUS/SETUP
    /// window.
    pub fn custom_req(&mut self, offset: u64, req: &mut IoReq) -> IoStatus {
        if req.size() != 4 {
            return IoStatus::Invalid;
        }
        match offset {
            STATUS_OFFSET => self.status_req(req),
            SETUP_OFFSET => self.setup_req(req),
            _ => {
                self.tracer.warning(format!("invalid register offset 0x{offset:x}"));
                IoStatus::Invalid
            }
        }
    }

    fn status_req(&mut self, req: &mut IoReq) -> IoStatus {
        if req.is_write {
            return IoStatus::Invalid;
        }
        let mut status = UartStatus::empty();
        status.set(UartStatus::TX_BUSY, self.tx.is_busy() || self.tx_state != TxState::Start);
        status.set(UartStatus::RX_BUSY, self.rx_busy());
        status.set(UartStatus::RX_PE, self.rx_pe);
        req.write_u32_le(status.bits());
        self.rx_pe = false;
        IoStatus::Ok
    }

    fn setup_req(&mut self, req: &mut IoReq) -> IoStatus {
        if req.is_write {
            let value = req.read_u32_le();
            self.setup_reg = value;
            self.setup = UartSetup::from_reg(value);
            self.tracer.msg(format!(
                "setup updated (parity={}, bit_length={}, stop_bits={}, tx={}, rx={}, clkdiv={})",
                self.setup.parity, self.setup.bit_length, self.setup.stop_bits, self.setup.tx, self.setup.rx, self.setup.clkdiv
            ));
        } else {
            req.write_u32_le(self.setup_reg);
        }
        IoStatus::Ok
    }

    fn check_tx_state(&mut self, sched: &mut Scheduler) {
        // Busy whenever more data bits are queued *or* the state machine
        // still owes trailing parity/stop bits for the frame already in
        // flight — `pending_bits` alone hits zero one step before `Stop`
        // finishes driving its last bit.
        let busy = self.tx.pending_bits != 0 || self.tx_state != TxState::Start;
        if busy && !sched.is_enqueued(self.id, TX_EVENT) {
            let now = sched.now();
            let delay = match self.next_bit_cycle {
                Some(next) if next > now => next - now,
                _ => 1,
            };
            sched
                .enqueue(self.id, TX_EVENT, delay)
                .expect("uart tx event already enqueued");
        }
    }

    fn advance_tx(&mut self, sched: &mut Scheduler) {
        let mut bit: Option<u8> = None;

        match self.tx_state {
            TxState::Start => {
                self.tx_parity = 0;
                self.tx_sent_bits = 0;
                self.tx_state = TxState::Data;
                bit = Some(0);
            }
            TxState::Data => {
                let b = (self.tx.pending_word & 1) as u8;
                self.tx.consume_bits(1);
                self.tx_parity ^= b;
                self.tx_sent_bits += 1;
                bit = Some(b);

                if let Some(done) = self.tx.take_completed() {
                    self.tracer.msg(format!("completed TX request ({} bytes)", done.size()));
                    self.tx.pull_next();
                }

                if self.tx_sent_bits == self.setup.bit_length {
                    self.tx_sent_bits = 0;
                    if self.setup.parity {
                        self.tx_state = TxState::Parity;
                    } else {
                        self.tx_stop_remaining = self.setup.stop_bits;
                        self.tx_state = TxState::Stop;
                    }
                }
            }
            TxState::Parity => {
                bit = Some(self.tx_parity);
                self.tx_stop_remaining = self.setup.stop_bits;
                self.tx_state = TxState::Stop;
            }
            TxState::Stop => {
                bit = Some(1);
                self.tx_stop_remaining -= 1;
                if self.tx_stop_remaining == 0 {
                    self.tx_state = TxState::Start;
                }
            }
        }

        if let Some(b) = bit {
            // Pacing is independent of whether anything is actually driven:
            // an unbound port still paces at clkdiv, and a bound port with
            // `tx` clear still advances, just silently.
            self.next_bit_cycle = Some(sched.now() + self.setup.clkdiv as u64);
            if self.setup.tx {
                self.line.sync(b, &self.tracer);
            }
        }

        self.check_tx_state(sched);
    }
}

impl Component for UartPeriph {
    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) {
        self.setup_reg = 0;
        self.setup = UartSetup::default();
        self.rx_pe = false;
        self.tx_state = TxState::Start;
        self.tx_parity = 0;
        self.tx_sent_bits = 0;
        self.tx_stop_remaining = 0;
        self.next_bit_cycle = None;
        self.tx.reset();
        self.rx_state = RxState::Start;
        self.rx_shift = 0;
        self.rx_received_bits = 0;
        self.rx_parity = 0;
        self.rx.reset();
    }

    fn set_id(&mut self, id: ComponentId) {
        self.id = id;
    }

    fn handle_event(&mut self, tag: EventTag, sched: &mut Scheduler) {
        debug_assert_eq!(tag, TX_EVENT);
        self.advance_tx(sched);
    }
}

impl crate::itf::UartSlave for UartPeriph {
    fn uart_sync(&mut self, bit: u8) {
        self.rx_sync(bit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Simulation;
    use crate::itf::UartSlave;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn setup_reg(parity: bool, bit_length: u8, stop_bits: u8, tx: bool, rx: bool, clkdiv: u32) -> u32 {
        UartSetup { parity, bit_length, stop_bits, tx, rx, clkdiv }.to_reg()
    }

    fn configure(periph: &mut UartPeriph, parity: bool, bit_length: u8, stop_bits: u8, tx: bool, rx: bool, clkdiv: u32) {
        let mut req = IoReq::new_write(SETUP_OFFSET, setup_reg(parity, bit_length, stop_bits, tx, rx, clkdiv).to_le_bytes().to_vec());
        periph.custom_req(SETUP_OFFSET, &mut req);
    }

    #[derive(Default)]
    struct LineRecorder {
        bits: Vec<u8>,
    }
    impl UartSlave for LineRecorder {
        fn uart_sync(&mut self, bit: u8) {
            self.bits.push(bit);
        }
    }

    #[test]
    fn setup_register_round_trips() {
        let value = setup_reg(true, 7, 2, true, true, 12);
        let decoded = UartSetup::from_reg(value);
        assert!(decoded.parity);
        assert_eq!(decoded.bit_length, 7);
        assert_eq!(decoded.stop_bits, 2);
        assert!(decoded.tx);
        assert!(decoded.rx);
        assert_eq!(decoded.clkdiv, 12);
        assert_eq!(decoded.to_reg(), value);
    }

    #[test]
    fn tx_frame_is_start_data_parity_stop() {
        let mut sim = Simulation::new();
        let periph = Rc::new(RefCell::new(UartPeriph::build("uart0", &ComponentConfig::new()).unwrap()));
        sim.register(periph.clone());
        let line = Rc::new(RefCell::new(LineRecorder::default()));
        crate::itf::bind_uart(&mut periph.borrow_mut().line, Rc::clone(&line));

        configure(&mut periph.borrow_mut(), true, 8, 1, true, false, 4);
        periph.borrow_mut().push_tx_bytes(sim.scheduler(), &[0b1011_0010]);
        sim.run_until(1000);

        // start(0), 8 data bits LSB-first, parity (xor of data bits), stop(1)
        let data_bits = [0, 1, 0, 0, 1, 1, 0, 1];
        let parity = data_bits.iter().fold(0u8, |a, b| a ^ b);
        let mut expected = vec![0u8];
        expected.extend_from_slice(&data_bits);
        expected.push(parity);
        expected.push(1);
        assert_eq!(line.borrow().bits, expected);
    }

    #[test]
    fn tx_disabled_suppresses_line_drive() {
        let mut sim = Simulation::new();
        let periph = Rc::new(RefCell::new(UartPeriph::build("uart0", &ComponentConfig::new()).unwrap()));
        sim.register(periph.clone());
        let line = Rc::new(RefCell::new(LineRecorder::default()));
        crate::itf::bind_uart(&mut periph.borrow_mut().line, Rc::clone(&line));

        configure(&mut periph.borrow_mut(), false, 8, 1, false, false, 4);
        periph.borrow_mut().push_tx_bytes(sim.scheduler(), &[0xFF]);
        sim.run_until(1000);

        assert!(line.borrow().bits.is_empty());
    }

    #[test]
    fn rx_loopback_round_trip_recovers_byte() {
        let mut tx_sim = Simulation::new();
        let tx = Rc::new(RefCell::new(UartPeriph::build("uart_tx", &ComponentConfig::new()).unwrap()));
        tx_sim.register(tx.clone());
        let rx = Rc::new(RefCell::new(UartPeriph::build("uart_rx", &ComponentConfig::new()).unwrap()));

        configure(&mut tx.borrow_mut(), false, 8, 1, true, false, 4);
        configure(&mut rx.borrow_mut(), false, 8, 1, false, true, 4);
        rx.borrow_mut().push_rx_buffer(1);

        crate::itf::bind_uart(&mut tx.borrow_mut().line, Rc::clone(&rx));

        tx.borrow_mut().push_tx_bytes(tx_sim.scheduler(), &[0xC3]);
        tx_sim.run_until(1000);

        let done = rx.borrow_mut().take_rx_req().expect("rx completed");
        assert_eq!(done.data, vec![0xC3]);
        assert!(!rx.borrow().rx_pe);
    }

    #[test]
    fn parity_mismatch_sets_rx_pe() {
        let mut rx = UartPeriph::build("uart_rx", &ComponentConfig::new()).unwrap();
        configure(&mut rx, true, 8, 1, false, true, 4);
        rx.push_rx_buffer(1);

        // Manually drive a frame for 0x01 with a deliberately wrong parity bit.
        rx.rx_sync(0); // start
        let data_bits = [1, 0, 0, 0, 0, 0, 0, 0];
        for b in data_bits {
            rx.rx_sync(b);
        }
        rx.rx_sync(0); // wrong parity (correct would be 1)
        rx.rx_sync(1); // stop

        assert!(rx.rx_pe);
        let done = rx.take_rx_req().expect("rx completed despite parity error");
        assert_eq!(done.data, vec![0x01]);
    }
}
