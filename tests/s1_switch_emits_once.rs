//! A `Switch` configured with `value=7` and bound to a wire slave syncs
//! exactly once, at elaboration, and never again once the scheduler runs.

use std::cell::RefCell;
use std::rc::Rc;

use vp_core::component::Simulation;
use vp_core::config::ComponentConfig;
use vp_core::itf::{bind_wire, WireSlave};
use vp_core::periph::Switch;

#[derive(Default)]
struct Recorder {
    seen: Vec<i64>,
}

impl WireSlave<i64> for Recorder {
    fn wire_sync(&mut self, value: i64) {
        self.seen.push(value);
    }
}

#[test]
fn switch_emits_configured_value_exactly_once() {
    let mut sim = Simulation::new();
    let cfg = ComponentConfig::new().with("value", 7i64);
    let switch = Rc::new(RefCell::new(Switch::build("sw0", &cfg).unwrap()));
    sim.register(switch.clone());

    let recorder = Rc::new(RefCell::new(Recorder::default()));
    bind_wire(&mut switch.borrow_mut().out, Rc::clone(&recorder));

    switch.borrow_mut().start();
    assert_eq!(sim.scheduler().now(), 0);

    // A clocked component's worth of simulation time passes; a Switch has
    // no event of its own, so nothing further is emitted.
    sim.run_until(1000);

    assert_eq!(recorder.borrow().seen, vec![7]);
}
