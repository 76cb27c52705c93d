//! CPU error types.

use thiserror::Error;

/// Result alias for fallible CPU operations.
pub type CpuResult<T> = Result<T, CpuError>;

/// Failures surfaced to the host.
///
/// Neither kind is retried internally. Ticking again after one of these is
/// undefined; the host must reset first.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuError {
    /// A read or write referenced an address no attached device covers.
    #[error("no bus device mapped at address ${0:04X}")]
    BusUnmapped(u16),

    /// The byte fetched at PC is not a legal 6502 opcode.
    #[error("illegal opcode ${opcode:02X} at ${pc:04X}")]
    IllegalOpcode { opcode: u8, pc: u16 },
}
