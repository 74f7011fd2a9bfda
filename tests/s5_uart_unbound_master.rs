//! An unbound UART master still completes a TX request — the missing
//! binding only suppresses the line drive and warns once — becoming
//! not-busy once its last bit
//! (start + `bit_length` + `stop_bits` edges, one `clkdiv` apart, with an
//! initial one-cycle kickoff delay) has been paced through.

use std::cell::RefCell;
use std::rc::Rc;

use vp_core::component::Simulation;
use vp_core::config::ComponentConfig;
use vp_core::itf::IoReq;
use vp_core::periph::uart::{UartSetup, STATUS_OFFSET, SETUP_OFFSET};
use vp_core::periph::UartPeriph;

#[test]
fn unbound_uart_tx_still_completes_on_schedule() {
    let mut sim = Simulation::new();
    let uart = Rc::new(RefCell::new(UartPeriph::build("uart0", &ComponentConfig::new()).unwrap()));
    sim.register(uart.clone());
    // Deliberately never bind `line`.

    let setup = UartSetup { parity: false, bit_length: 8, stop_bits: 1, tx: true, rx: false, clkdiv: 5 };
    let mut req = IoReq::new_write(SETUP_OFFSET, setup.to_reg().to_le_bytes().to_vec());
    uart.borrow_mut().custom_req(SETUP_OFFSET, &mut req);

    uart.borrow_mut().push_tx_bytes(sim.scheduler(), &[0xFF]);

    let frame_bits: u64 = 1 + 8 + 1;
    let clkdiv: u64 = 5;
    // The first edge fires one cycle after the push (the engine's kickoff
    // delay when no prior pacing cycle is known); every edge after that is
    // exactly `clkdiv` cycles later, so the last of `frame_bits` edges
    // lands at `1 + (frame_bits - 1) * clkdiv`.
    let last_edge_cycle = 1 + (frame_bits - 1) * clkdiv;

    let mut status_at = |sim: &mut Simulation, uart: &Rc<RefCell<UartPeriph>>, limit: u64| {
        sim.run_until(limit);
        let mut req = IoReq::new_read(STATUS_OFFSET, 4);
        uart.borrow_mut().custom_req(STATUS_OFFSET, &mut req);
        req.read_u32_le() & 0b1 != 0 // TX_BUSY bit
    };

    // Still busy one cycle before the frame's last bit lands...
    assert!(status_at(&mut sim, &uart, last_edge_cycle - 1));
    // ...and not busy once it has.
    assert!(!status_at(&mut sim, &uart, last_edge_cycle + 1));
}
