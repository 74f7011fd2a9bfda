//! `CFG,0x00,0x08,START,RD_NACK,STOP` while the bound slave supplies bit
//! pattern `1,0,1,0,1,0,1,0` on successive SCL-rising edges. The RX channel
//! must receive exactly one byte equal to `0xAA` (the pattern read MSB
//! first).
//!
//! The engine drives SCL itself; there is no port for the slave to *push*
//! bits on its own schedule; it is instead the test's job to call
//! `rx_sync` with the next bit before the rising edge that samples it.
//! Single-stepping the scheduler cycle by cycle gives enough of a window: a
//! sampled (rising-edge) transition is always followed by one
//! non-sampling (falling-edge) transition before the next sample.

use std::cell::RefCell;
use std::rc::Rc;

use vp_core::component::Simulation;
use vp_core::config::ComponentConfig;
use vp_core::itf::{bind_i2c, I2cSlave};
use vp_core::periph::I2cPeriph;

#[derive(Default)]
struct BusRecorder {
    transitions: Vec<(u8, u8)>,
}

impl I2cSlave for BusRecorder {
    fn i2c_sync(&mut self, scl: u8, sda: u8) {
        self.transitions.push((scl, sda));
    }
}

#[test]
fn i2c_read_transaction_samples_msb_first_byte() {
    let mut sim = Simulation::new();
    let i2c = Rc::new(RefCell::new(I2cPeriph::build("i2c0", &ComponentConfig::new()).unwrap()));
    sim.register(i2c.clone());
    let bus = Rc::new(RefCell::new(BusRecorder::default()));
    bind_i2c(&mut i2c.borrow_mut().bus, Rc::clone(&bus));

    let bits = [1u8, 0, 1, 0, 1, 0, 1, 0];
    i2c.borrow_mut().push_rx_buffer(1);
    i2c.borrow_mut().rx_sync(bits[0]);

    let stream = [
        7u8, 0x00, 0x08, // CFG clkdiv=0x08
        0u8,             // START
        3u8,             // RD_NACK
        1u8,             // STOP
    ];
    i2c.borrow_mut().push_stream(sim.scheduler(), &stream);

    let mut bit_idx = 0usize;
    let mut last_len = 0;
    for c in 1..=10_000u64 {
        sim.run_until(c);
        if sim.scheduler().stop_requested() {
            break;
        }
        let len = bus.borrow().transitions.len();
        if len > last_len {
            last_len = len;
            // A sampling (rising) edge always lands on an even transition
            // count once past START's two transitions.
            if len > 2 && len % 2 == 0 {
                bit_idx += 1;
                if bit_idx < bits.len() {
                    i2c.borrow_mut().rx_sync(bits[bit_idx]);
                }
            }
        }
    }

    let done = i2c.borrow_mut().take_rx_byte().expect("one byte received");
    assert_eq!(done.data, vec![0xAA]);
}
