//! A cycle-driven, single-threaded discrete-event simulation kernel for
//! modeling a SoC's peripherals at the bit level.
//!
//! The crate has three layers:
//!
//! - [`scheduler`] and [`component`]: the cycle-counted event queue and the
//!   component/port fabric that dispatches into it. Nothing below this
//!   layer knows about I2C, UART, or any other peripheral.
//! - [`itf`] and [`dma`]: the typed interface kinds (`wire<T>`, `i2c`,
//!   `uart`, `io_req`) ports are bound through, and the DMA channel base
//!   behavior (`push_ready_req`, draining, completion) peripherals share.
//! - [`periph`]: concrete peripheral models — an I2C master engine, a UART
//!   engine, and a trivial `Switch` wiring component — built on the two
//!   layers above.
//!
//! There are no locks and nothing here is required to be `Send`/`Sync`:
//! every component's state is owned by exactly one `Rc<RefCell<_>>` handle,
//! and the whole simulation advances on a single thread, one event at a
//! time.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use vp_core::component::Simulation;
//! use vp_core::config::ComponentConfig;
//! use vp_core::periph::Switch;
//! use vp_core::itf::WireSlave;
//!
//! #[derive(Default)]
//! struct Recorder(Vec<i64>);
//! impl WireSlave<i64> for Recorder {
//!     fn wire_sync(&mut self, value: i64) {
//!         self.0.push(value);
//!     }
//! }
//!
//! let mut sim = Simulation::new();
//! let cfg = ComponentConfig::new().with("value", 42i64);
//! let mut switch = Switch::build("switch0", &cfg).unwrap();
//! let recorder = Rc::new(RefCell::new(Recorder::default()));
//! vp_core::itf::bind_wire(&mut switch.out, Rc::clone(&recorder));
//! switch.start();
//! sim.register(Rc::new(RefCell::new(switch)));
//!
//! assert_eq!(recorder.borrow().0, vec![42]);
//! ```

#![deny(missing_docs)]

pub mod component;
pub mod config;
pub mod dma;
pub mod error;
pub mod itf;
pub mod periph;
pub mod scheduler;
pub mod trace;

pub use error::{Result, SimError};
