//! Typed interface kinds: `wire<T>`, `i2c`, `uart`, and
//! `io_req`. A master port's sync payload is fixed by its interface kind;
//! [`port::MasterPort`] is the one generic binding mechanism shared by the
//! first three. `io_req` is request/response rather than fire-and-forget
//! and is modeled directly as a method call (see `UartPeriph::custom_req`)
//! rather than through a port.

pub mod io_req;
pub mod port;

use std::cell::RefCell;
use std::rc::Rc;

pub use io_req::{IoReq, IoStatus};
pub use port::MasterPort;

/// A slave of the `wire<T>` interface kind.
pub trait WireSlave<T> {
    /// Receives a value synced from the bound master.
    fn wire_sync(&mut self, value: T);
}

/// Binds `port` to `slave`'s [`WireSlave::wire_sync`].
pub fn bind_wire<T, S>(port: &mut MasterPort<T>, slave: Rc<RefCell<S>>)
where
    T: 'static,
    S: WireSlave<T> + 'static,
{
    port.bind(Box::new(move |value| slave.borrow_mut().wire_sync(value)));
}

/// A slave of the `i2c` interface kind: receives `(scl, sda)` bit pairs.
pub trait I2cSlave {
    /// Receives one `(scl, sda)` transition from the bound master.
    fn i2c_sync(&mut self, scl: u8, sda: u8);
}

/// Binds `port` to `slave`'s [`I2cSlave::i2c_sync`].
pub fn bind_i2c<S>(port: &mut MasterPort<(u8, u8)>, slave: Rc<RefCell<S>>)
where
    S: I2cSlave + 'static,
{
    port.bind(Box::new(move |(scl, sda)| slave.borrow_mut().i2c_sync(scl, sda)));
}

/// A slave of the `uart` interface kind: receives one line-level bit at a
/// time.
pub trait UartSlave {
    /// Receives one bit synced from the bound master.
    fn uart_sync(&mut self, bit: u8);
}

/// Binds `port` to `slave`'s [`UartSlave::uart_sync`].
pub fn bind_uart<S>(port: &mut MasterPort<u8>, slave: Rc<RefCell<S>>)
where
    S: UartSlave + 'static,
{
    port.bind(Box::new(move |bit| slave.borrow_mut().uart_sync(bit)));
}
