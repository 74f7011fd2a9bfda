//! A trivial wiring component, grounded on `switch_impl.cpp`.
//! Emits its configured scalar exactly once, at elaboration's `start()`,
//! on its `out` master port — a template for other elaboration-time
//! scalar propagation, not a clocked component.

use crate::config::ComponentConfig;
use crate::error::Result;
use crate::itf::MasterPort;
use crate::trace::Tracer;

/// A `wire<i64>` source with no clocked behavior at all.
pub struct Switch {
    name: String,
    tracer: Tracer,
    value: i64,
    /// `out` master port, typed as `wire<i64>`.
    pub out: MasterPort<i64>,
}

impl Switch {
    /// Builds a `Switch` from its configuration. Requires the `value` key.
    pub fn build(name: impl Into<String>, config: &ComponentConfig) -> Result<Self> {
        let name = name.into();
        let value = config.get_int(&name, "value")?;
        Ok(Switch {
            tracer: Tracer::new(name.clone()),
            name,
            value,
            out: MasterPort::new("out"),
        })
    }

    /// Elaboration-time `start()`: syncs `value` once onto `out`. Calling
    /// this more than once re-emits the value; callers are expected to
    /// invoke it exactly once, matching the original model's `start()`
    /// hook.
    pub fn start(&mut self) {
        self.tracer.msg(format!("emitting configured value {}", self.value));
        self.out.sync(self.value, &self.tracer);
    }
}

impl crate::component::Component for Switch {
    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) {
        // No clocked state; the port binding itself persists across reset.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itf::WireSlave;
    use std::cell::RefCell;
    use std::rc::Rc;

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
    fn emits_configured_value_once() {
        let cfg = ComponentConfig::new().with("value", 7i64);
        let mut sw = Switch::build("switch0", &cfg).unwrap();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        crate::itf::bind_wire(&mut sw.out, Rc::clone(&recorder));

        sw.start();

        assert_eq!(recorder.borrow().seen, vec![7]);
    }

    #[test]
    fn missing_value_is_config_error() {
        let cfg = ComponentConfig::new();
        assert!(Switch::build("switch0", &cfg).is_err());
    }
}
