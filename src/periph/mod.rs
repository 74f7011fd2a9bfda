//! Peripheral models built on the fabric in [`crate::component`],
//! [`crate::itf`], and [`crate::dma`]. Each module
//! here is a template other peripherals can be built the same way: own a
//! [`crate::dma::DmaTxChannel`]/[`crate::dma::DmaRxChannel`] directly, drive
//! bit-level transitions through a [`crate::itf::port::MasterPort`], and
//! self-schedule through [`crate::component::Component::handle_event`].

pub mod i2c;
pub mod switch;
pub mod uart;

pub use i2c::I2cPeriph;
pub use switch::Switch;
pub use uart::UartPeriph;
