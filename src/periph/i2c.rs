//! I2C master engine, v2: a command-stream-driven bit-banger, grounded on
//! `I2c_periph_v2`/`I2c_tx_channel` in `udma_i2c_v2.cpp`.
//!
//! The peripheral drains a byte stream pushed onto its TX channel one
//! command at a time. Most commands (`START`, `STOP`, `WR`, `RD_ACK`,
//! `RD_NACK`) consume one stream byte and drive a handful of SCL/SDA
//! transitions at `clkdiv`-cycle spacing; `CFG` reconfigures `clkdiv` from
//! the next two stream bytes; `RPT` replays the command that follows it
//! `count` times in total (see [`I2cPeriph`]'s doc comment on `RPT` for the
//! exact accounting).

use crate::component::Component;
use crate::config::ComponentConfig;
use crate::dma::{DmaRxChannel, DmaTxChannel};
use crate::error::Result;
use crate::itf::{IoReq, IoStatus, MasterPort};
use crate::scheduler::{ComponentId, Cycle, EventTag, Scheduler};
use crate::trace::Tracer;

const TX_EVENT: EventTag = 0;

/// A command byte in the stream pushed onto [`I2cPeriph`]'s TX channel.
/// This crate's own encoding — the retrieved source for this engine does
/// not include the hardware's numeric opcode table, only the command
/// names and their state-machine behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum I2cCommand {
    /// Drives a START condition (SDA falls while SCL is high).
    Start = 0,
    /// Drives a STOP condition (SDA rises while SCL is high).
    Stop = 1,
    /// Samples one byte off the bus, driving an ACK afterward.
    RdAck = 2,
    /// Samples one byte off the bus, driving a NACK afterward.
    RdNack = 3,
    /// Writes the next stream byte onto the bus, MSB first.
    Wr = 4,
    /// Consumes the next stream byte with no bus activity beyond normal
    /// clkdiv-spaced pacing.
    Wait = 5,
    /// Replays the command that follows `count` times in total.
    Rpt = 6,
    /// Reconfigures `clkdiv` from the next two stream bytes, big-endian.
    Cfg = 7,
    /// Like [`I2cCommand::Wait`]; no event-driven wait modeling
    /// distinguishes it from `Wait` in this engine.
    WaitEv = 8,
}

impl TryFrom<u8> for I2cCommand {
    type Error = ();

    fn try_from(value: u8) -> std::result::Result<Self, ()> {
        Ok(match value {
            0 => I2cCommand::Start,
            1 => I2cCommand::Stop,
            2 => I2cCommand::RdAck,
            3 => I2cCommand::RdNack,
            4 => I2cCommand::Wr,
            5 => I2cCommand::Wait,
            6 => I2cCommand::Rpt,
            7 => I2cCommand::Cfg,
            8 => I2cCommand::WaitEv,
            _ => return Err(()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    WaitCmd,
    WaitRpt,
    WaitRptCmd,
    WaitCfg,
    Start0,
    Stop0,
    Stop1,
    Wr0,
    Wr1,
}

/// The I2C master engine.
pub struct I2cPeriph {
    name: String,
    tracer: Tracer,
    id: ComponentId,
    /// `bus` master port, typed as `i2c`: carries `(scl, sda)` pairs.
    pub bus: MasterPort<(u8, u8)>,
    tx: DmaTxChannel,
    rx: DmaRxChannel,
    state: State,
    clkdiv: u32,
    cfg_high_byte: u32,
    repeat_count: u32,
    repeat_command: u8,
    pending_value: u32,
    pending_value_bits: u32,
    waiting_rx: bool,
    rx_bit: u8,
    prev_scl: u8,
    prev_sda: u8,
    next_bit_cycle: Option<Cycle>,
}

impl I2cPeriph {
    /// Builds an `I2cPeriph`. No configuration keys are required; `clkdiv`
    /// is set at runtime via a `CFG` command in the stream, matching the
    /// original model.
    pub fn build(name: impl Into<String>, _config: &ComponentConfig) -> Result<Self> {
        let name = name.into();
        Ok(I2cPeriph {
            tracer: Tracer::new(name.clone()),
            name,
            id: ComponentId(0),
            bus: MasterPort::new("bus"),
            tx: DmaTxChannel::default(),
            rx: DmaRxChannel::default(),
            state: State::WaitCmd,
            clkdiv: 0,
            cfg_high_byte: 0,
            repeat_count: 0,
            repeat_command: 0,
            pending_value: 0,
            pending_value_bits: 0,
            waiting_rx: false,
            rx_bit: 1,
            prev_scl: 1,
            prev_sda: 1,
            next_bit_cycle: None,
        })
    }

    /// Pushes a command/data byte stream onto the TX channel and kicks the
    /// engine if it was idle.
    pub fn push_stream(&mut self, sched: &mut Scheduler, bytes: &[u8]) {
        self.tx.push_ready_req(IoReq::new_write(0, bytes.to_vec()));
        self.check_state(sched);
    }

    /// Pops the next completed RX byte, if any (bytes sampled off the bus
    /// by `RD_ACK`/`RD_NACK` commands).
    pub fn take_rx_byte(&mut self) -> Option<IoReq> {
        self.rx.take_completed()
    }

    /// Pre-loads a buffer the next `RD_ACK`/`RD_NACK` sampling runs will
    /// fill, mirroring how a DMA RX descriptor would be queued.
    pub fn push_rx_buffer(&mut self, size: usize) {
        self.rx.push_ready_req(IoReq::new_read(0, size));
    }

    /// Receives one bit sampled off `sda` by the bus slave currently being
    /// read from. Has no cycle latency of its own: the engine samples
    /// whatever was last delivered here on its next rising SCL edge.
    pub fn rx_sync(&mut self, bit: u8) {
        self.rx_bit = bit;
    }

    /// Always `IoStatus::Invalid`: this engine exposes no memory-mapped
    /// register window (grounded on `I2c_periph_v2::custom_req`, which
    /// likewise never accepts a request).
    pub fn custom_req(&mut self, _offset: u64, _req: &mut IoReq) -> IoStatus {
        IoStatus::Invalid
    }

    fn sync_bus(&mut self, scl: u8, sda: u8) {
        self.tracer.msg(format!("drive scl={scl} sda={sda}"));
        self.bus.sync((scl, sda), &self.tracer);
    }

    fn check_state(&mut self, sched: &mut Scheduler) {
        let busy = self.tx.pending_bits != 0 || self.state != State::WaitCmd || self.waiting_rx;
        if busy && !sched.is_enqueued(self.id, TX_EVENT) {
            let now = sched.now();
            let delay = match self.next_bit_cycle {
                Some(next) if next > now => next - now,
                _ => 1,
            };
            sched
                .enqueue(self.id, TX_EVENT, delay)
                .expect("i2c tx event already enqueued");
        }
    }

    fn advance(&mut self, sched: &mut Scheduler) {
        if self.waiting_rx {
            self.advance_rx_sample(sched);
        } else {
            self.advance_tx_word(sched);
        }
        self.check_state(sched);
    }

    fn advance_rx_sample(&mut self, sched: &mut Scheduler) {
        self.prev_scl = 1 - self.prev_scl;
        // The master doesn't drive SDA during a slave-driven read; ground it.
        self.sync_bus(self.prev_scl, 0);
        if self.prev_scl == 1 {
            let bit = self.rx_bit;
            self.pending_value = (self.pending_value << 1) | bit as u32;
            self.pending_value_bits -= 1;
            self.next_bit_cycle = Some(sched.now() + self.clkdiv as u64);
            if self.pending_value_bits == 0 {
                let byte = (self.pending_value & 0xff) as u8;
                self.tracer.msg(format!("sampled byte 0x{byte:02x}"));
                self.rx.push_data(byte);
                self.waiting_rx = false;
            }
        }
    }

    /// Replays the command that follows `RPT, count` that many times in
    /// total, not `count + 1`: the first execution *is* the first replay,
    /// it is not counted separately. `RPT, 3, WR, a, b, c` therefore
    /// executes exactly three `WR`s, consuming exactly `a`, `b`, `c`.
    fn advance_tx_word(&mut self, sched: &mut Scheduler) {
        let pending_byte = (self.tx.pending_word & 0xff) as u8;
        let mut bit: Option<(u8, u8)> = None;

        match self.state {
            State::WaitCmd | State::WaitRptCmd => {
                let command;
                if self.state == State::WaitCmd && self.repeat_count > 0 {
                    self.repeat_count -= 1;
                    command = self.repeat_command;
                } else {
                    command = pending_byte;
                    self.tx.consume_bits(8);
                    if self.state == State::WaitRptCmd {
                        self.repeat_command = command;
                        self.repeat_count = self.repeat_count.saturating_sub(1);
                    }
                }
                self.state = State::WaitCmd;

                match I2cCommand::try_from(command) {
                    Ok(I2cCommand::Cfg) => {
                        self.state = State::WaitCfg;
                        self.pending_value_bits = 0;
                    }
                    Ok(I2cCommand::Start) => {
                        self.state = State::Start0;
                        bit = Some((1, 1));
                    }
                    Ok(I2cCommand::Stop) => {
                        self.state = State::Stop0;
                        bit = Some((0, 0));
                    }
                    Ok(I2cCommand::Wr) => {
                        self.state = State::Wr0;
                        self.pending_value_bits = 8;
                    }
                    Ok(I2cCommand::RdAck) | Ok(I2cCommand::RdNack) => {
                        self.waiting_rx = true;
                        self.pending_value_bits = 8;
                    }
                    Ok(I2cCommand::Rpt) => {
                        self.state = State::WaitRpt;
                    }
                    Ok(I2cCommand::Wait) | Ok(I2cCommand::WaitEv) => {
                        // No timed-wait modeling beyond clkdiv spacing;
                        // the byte is simply consumed.
                    }
                    Err(()) => {
                        self.tracer.warning(format!("unknown I2C command byte 0x{command:02x}"));
                    }
                }
            }
            State::WaitCfg => {
                if self.pending_value_bits == 0 {
                    self.cfg_high_byte = (pending_byte as u32) << 8;
                } else {
                    self.clkdiv = self.cfg_high_byte | pending_byte as u32;
                    self.state = State::WaitCmd;
                    self.tracer.msg(format!("configured clkdiv={}", self.clkdiv));
                }
                self.pending_value_bits += 8;
                self.tx.consume_bits(8);
            }
            State::WaitRpt => {
                self.repeat_count = pending_byte as u32;
                self.tracer.msg(format!("repeat count set to {}", self.repeat_count));
                self.tx.consume_bits(8);
                self.state = State::WaitRptCmd;
            }
            State::Wr0 => {
                if self.pending_value_bits == 8 {
                    self.pending_value = self.tx.pending_word & 0xff;
                }
                let b = ((self.pending_value >> 7) & 1) as u8;
                self.prev_sda = b;
                self.pending_value = (self.pending_value << 1) & 0xff;
                self.pending_value_bits -= 1;
                bit = Some((0, b));
                self.state = State::Wr1;
            }
            State::Wr1 => {
                bit = Some((1, self.prev_sda));
                if self.pending_value_bits == 0 {
                    self.state = State::WaitCmd;
                    self.tx.consume_bits(8);
                } else {
                    self.state = State::Wr0;
                }
            }
            State::Stop0 => {
                self.state = State::Stop1;
                bit = Some((1, 0));
            }
            State::Start0 => {
                self.state = State::WaitCmd;
                bit = Some((1, 0));
            }
            State::Stop1 => {
                self.state = State::WaitCmd;
                bit = Some((1, 1));
            }
        }

        if let Some((scl, sda)) = bit {
            self.next_bit_cycle = Some(sched.now() + self.clkdiv as u64);
            self.prev_scl = scl;
            self.sync_bus(scl, sda);
        }

        if self.tx.pending_bits == 0 {
            if let Some(done) = self.tx.take_completed() {
                self.tracer.msg(format!("completed TX request ({} bytes)", done.size()));
            }
            self.tx.pull_next();
        }
    }

}

impl Component for I2cPeriph {
    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) {
        self.state = State::WaitCmd;
        self.clkdiv = 0;
        self.cfg_high_byte = 0;
        self.repeat_count = 0;
        self.repeat_command = 0;
        self.pending_value = 0;
        self.pending_value_bits = 0;
        self.waiting_rx = false;
        self.rx_bit = 1;
        self.prev_scl = 1;
        self.prev_sda = 1;
        self.next_bit_cycle = None;
        self.tx.reset();
        self.rx.reset();
    }

    fn set_id(&mut self, id: ComponentId) {
        self.id = id;
    }

    fn handle_event(&mut self, tag: EventTag, sched: &mut Scheduler) {
        debug_assert_eq!(tag, TX_EVENT);
        self.advance(sched);
    }
}
