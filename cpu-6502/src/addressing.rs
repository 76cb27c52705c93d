//! Addressing-mode resolution.
//!
//! The 6502 has 13 addressing modes:
//! - Implied: no operand (e.g., CLC, RTS)
//! - Accumulator: operates on register A (e.g., ASL A)
//! - Immediate: #$nn (literal operand byte)
//! - Zero Page: $nn (8-bit address in page zero)
//! - Zero Page,X: $nn,X (wraps within page zero)
//! - Zero Page,Y: $nn,Y (wraps within page zero)
//! - Absolute: $nnnn (16-bit address)
//! - Absolute,X: $nnnn,X
//! - Absolute,Y: $nnnn,Y
//! - Absolute Indirect: ($nnnn) (JMP only, with the NMOS page-wrap quirk)
//! - Relative: signed branch offset (-128 to +127)
//! - Indexed Indirect: ($nn,X) (pointer in page zero indexed by X)
//! - Indirect Indexed: ($nn),Y (page-zero pointer plus Y)
//!
//! Each resolver consumes its operand bytes from PC, leaves PC past them,
//! and yields an [`Operand`]. Multi-byte fetches are little-endian. The
//! implied and accumulator forms fetch nothing and charge one internal
//! cycle instead.

use crate::decode::AddrMode;
use crate::error::CpuResult;
use crate::Mos6502;

/// The operand produced by addressing-mode resolution.
///
/// Replaces a shared "resolved address" slot: the executor receives the
/// operand as a value and routes accumulator forms at register A.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// Effective address in the 16-bit address space.
    Memory(u16),
    /// The operand is register A.
    Accumulator,
    /// No operand.
    Implied,
}

impl Mos6502<'_> {
    /// Fetches the byte at PC and advances PC.
    pub(crate) fn fetch(&mut self) -> CpuResult<u8> {
        let value = self.read(self.regs.pc)?;
        self.regs.pc = self.regs.pc.wrapping_add(1);
        Ok(value)
    }

    /// Fetches a little-endian 16-bit word at PC.
    pub(crate) fn fetch_word(&mut self) -> CpuResult<u16> {
        let low = self.fetch()?;
        let high = self.fetch()?;
        Ok(u16::from_le_bytes([low, high]))
    }

    /// Reads a little-endian 16-bit word from memory.
    pub(crate) fn read_word(&mut self, address: u16) -> CpuResult<u16> {
        let low = self.read(address)?;
        let high = self.read(address.wrapping_add(1))?;
        Ok(u16::from_le_bytes([low, high]))
    }

    /// Reads a 16-bit pointer with the NMOS page-wrap quirk: when the low
    /// byte sits at $xxFF, the high byte comes from $xx00 of the same
    /// page. Used by indirect JMP.
    fn read_word_page_wrapped(&mut self, address: u16) -> CpuResult<u16> {
        let low = self.read(address)?;
        let high_address = (address & 0xFF00) | (address.wrapping_add(1) & 0x00FF);
        let high = self.read(high_address)?;
        Ok(u16::from_le_bytes([low, high]))
    }

    /// Reads a 16-bit pointer out of page zero, wrapping within the page.
    fn read_word_zero_page(&mut self, pointer: u8) -> CpuResult<u16> {
        let low = self.read(pointer as u16)?;
        let high = self.read(pointer.wrapping_add(1) as u16)?;
        Ok(u16::from_le_bytes([low, high]))
    }

    /// Computes the operand for the given addressing mode.
    pub(crate) fn resolve(&mut self, mode: AddrMode) -> CpuResult<Operand> {
        let operand = match mode {
            AddrMode::Implied => {
                self.cycles += 1;
                Operand::Implied
            }
            AddrMode::Accumulator => {
                self.cycles += 1;
                Operand::Accumulator
            }
            // The operand byte itself is the target; the executor reads it.
            AddrMode::Immediate => {
                let address = self.regs.pc;
                self.regs.pc = address.wrapping_add(1);
                Operand::Memory(address)
            }
            AddrMode::ZeroPage => Operand::Memory(self.fetch()? as u16),
            AddrMode::ZeroPageX => {
                let base = self.fetch()?;
                Operand::Memory(base.wrapping_add(self.regs.x) as u16)
            }
            AddrMode::ZeroPageY => {
                let base = self.fetch()?;
                Operand::Memory(base.wrapping_add(self.regs.y) as u16)
            }
            AddrMode::Absolute => Operand::Memory(self.fetch_word()?),
            AddrMode::AbsoluteX => {
                let base = self.fetch_word()?;
                Operand::Memory(base.wrapping_add(self.regs.x as u16))
            }
            AddrMode::AbsoluteY => {
                let base = self.fetch_word()?;
                Operand::Memory(base.wrapping_add(self.regs.y as u16))
            }
            AddrMode::AbsoluteIndirect => {
                let pointer = self.fetch_word()?;
                Operand::Memory(self.read_word_page_wrapped(pointer)?)
            }
            AddrMode::Relative => {
                let offset = self.fetch()? as i8;
                Operand::Memory(self.regs.pc.wrapping_add(offset as u16))
            }
            AddrMode::IndexedIndirect => {
                let pointer = self.fetch()?.wrapping_add(self.regs.x);
                Operand::Memory(self.read_word_zero_page(pointer)?)
            }
            AddrMode::IndirectIndexed => {
                let pointer = self.fetch()?;
                let base = self.read_word_zero_page(pointer)?;
                Operand::Memory(base.wrapping_add(self.regs.y as u16))
            }
        };

        Ok(operand)
    }
}
