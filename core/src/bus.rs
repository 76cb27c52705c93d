/// A memory-mapped unit attached to the CPU's address bus.
///
/// The CPU resolves every memory access by scanning its device list in
/// insertion order and delegating to the first device whose inclusive
/// `[address_min, address_max]` range contains the address. Ranges of
/// different devices may overlap; the earlier device wins.
///
/// Addresses handed to a device are already masked to 16 bits and values
/// to 8 bits, so implementations never need to re-mask.
pub trait BusDevice {
    /// Lowest address (inclusive) this device is mapped at.
    fn address_min(&self) -> u16;

    /// Highest address (inclusive) this device is mapped at.
    fn address_max(&self) -> u16;

    /// Read the byte at the given address.
    ///
    /// Takes `&mut self` because reads from memory-mapped peripherals may
    /// have side effects (status latches, FIFO pops, and the like).
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);
}
