//! Core traits for retro CPU emulation.

mod bus;

pub use bus::BusDevice;
