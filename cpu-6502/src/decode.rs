//! Opcode decode table.
//!
//! A dense 256-entry table mapping each legal opcode byte to its mnemonic,
//! addressing mode and operation. The holes are the undocumented opcodes,
//! which this core treats as illegal. The table is a compile-time constant
//! and dispatch is a match on the two tag enums, so decoding never
//! allocates.

/// Addressing-mode selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    /// No operand; one internal cycle.
    Implied,
    /// Operand is register A; one internal cycle.
    Accumulator,
    /// #$nn - the operand byte itself.
    Immediate,
    /// $nn - one byte, zero-extended.
    ZeroPage,
    /// $nn,X - wraps within page zero.
    ZeroPageX,
    /// $nn,Y - wraps within page zero.
    ZeroPageY,
    /// $nnnn.
    Absolute,
    /// $nnnn,X.
    AbsoluteX,
    /// $nnnn,Y.
    AbsoluteY,
    /// ($nnnn) - JMP only.
    AbsoluteIndirect,
    /// Signed 8-bit branch offset from the next instruction.
    Relative,
    /// ($nn,X) - pointer in page zero indexed by X.
    IndexedIndirect,
    /// ($nn),Y - page-zero pointer, then indexed by Y.
    IndirectIndexed,
}

/// Operation selector, one per mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    // Load/store
    Lda,
    Ldx,
    Ldy,
    Sta,
    Stx,
    Sty,
    // Register transfers
    Tax,
    Tay,
    Txa,
    Tya,
    Tsx,
    Txs,
    // Stack
    Pha,
    Php,
    Pla,
    Plp,
    // Shift/rotate
    Asl,
    Lsr,
    Rol,
    Ror,
    // Logic
    And,
    Eor,
    Ora,
    Bit,
    // Arithmetic
    Adc,
    Sbc,
    // Compare
    Cmp,
    Cpx,
    Cpy,
    // Increment/decrement
    Inc,
    Inx,
    Iny,
    Dec,
    Dex,
    Dey,
    // Control flow
    Jmp,
    Jsr,
    Rts,
    Brk,
    Rti,
    // Branches
    Bcc,
    Bcs,
    Beq,
    Bne,
    Bpl,
    Bmi,
    Bvc,
    Bvs,
    // Flag operations
    Clc,
    Sec,
    Cld,
    Sed,
    Cli,
    Sei,
    Clv,
    Nop,
}

/// One decode-table row: the triple driving resolution and execution.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeEntry {
    /// Human-readable mnemonic, for diagnostics.
    pub mnemonic: &'static str,
    /// Addressing-mode selector.
    pub mode: AddrMode,
    /// Operation selector.
    pub op: Op,
}

const fn entry(mnemonic: &'static str, mode: AddrMode, op: Op) -> Option<OpcodeEntry> {
    Some(OpcodeEntry { mnemonic, mode, op })
}

/// Decode table for the 151 legal opcodes, indexed by the opcode byte.
pub static OPCODE_TABLE: [Option<OpcodeEntry>; 256] = {
    use AddrMode::*;

    let mut t: [Option<OpcodeEntry>; 256] = [None; 256];

    // Load
    t[0xA9] = entry("LDA", Immediate, Op::Lda);
    t[0xA5] = entry("LDA", ZeroPage, Op::Lda);
    t[0xB5] = entry("LDA", ZeroPageX, Op::Lda);
    t[0xAD] = entry("LDA", Absolute, Op::Lda);
    t[0xBD] = entry("LDA", AbsoluteX, Op::Lda);
    t[0xB9] = entry("LDA", AbsoluteY, Op::Lda);
    t[0xA1] = entry("LDA", IndexedIndirect, Op::Lda);
    t[0xB1] = entry("LDA", IndirectIndexed, Op::Lda);
    t[0xA2] = entry("LDX", Immediate, Op::Ldx);
    t[0xA6] = entry("LDX", ZeroPage, Op::Ldx);
    t[0xB6] = entry("LDX", ZeroPageY, Op::Ldx);
    t[0xAE] = entry("LDX", Absolute, Op::Ldx);
    t[0xBE] = entry("LDX", AbsoluteY, Op::Ldx);
    t[0xA0] = entry("LDY", Immediate, Op::Ldy);
    t[0xA4] = entry("LDY", ZeroPage, Op::Ldy);
    t[0xB4] = entry("LDY", ZeroPageX, Op::Ldy);
    t[0xAC] = entry("LDY", Absolute, Op::Ldy);
    t[0xBC] = entry("LDY", AbsoluteX, Op::Ldy);

    // Store
    t[0x85] = entry("STA", ZeroPage, Op::Sta);
    t[0x95] = entry("STA", ZeroPageX, Op::Sta);
    t[0x8D] = entry("STA", Absolute, Op::Sta);
    t[0x9D] = entry("STA", AbsoluteX, Op::Sta);
    t[0x99] = entry("STA", AbsoluteY, Op::Sta);
    t[0x81] = entry("STA", IndexedIndirect, Op::Sta);
    t[0x91] = entry("STA", IndirectIndexed, Op::Sta);
    t[0x86] = entry("STX", ZeroPage, Op::Stx);
    t[0x96] = entry("STX", ZeroPageY, Op::Stx);
    t[0x8E] = entry("STX", Absolute, Op::Stx);
    t[0x84] = entry("STY", ZeroPage, Op::Sty);
    t[0x94] = entry("STY", ZeroPageX, Op::Sty);
    t[0x8C] = entry("STY", Absolute, Op::Sty);

    // Register transfers
    t[0xAA] = entry("TAX", Implied, Op::Tax);
    t[0xA8] = entry("TAY", Implied, Op::Tay);
    t[0x8A] = entry("TXA", Implied, Op::Txa);
    t[0x98] = entry("TYA", Implied, Op::Tya);
    t[0xBA] = entry("TSX", Implied, Op::Tsx);
    t[0x9A] = entry("TXS", Implied, Op::Txs);

    // Stack
    t[0x48] = entry("PHA", Implied, Op::Pha);
    t[0x08] = entry("PHP", Implied, Op::Php);
    t[0x68] = entry("PLA", Implied, Op::Pla);
    t[0x28] = entry("PLP", Implied, Op::Plp);

    // Shift/rotate
    t[0x0A] = entry("ASL", Accumulator, Op::Asl);
    t[0x06] = entry("ASL", ZeroPage, Op::Asl);
    t[0x16] = entry("ASL", ZeroPageX, Op::Asl);
    t[0x0E] = entry("ASL", Absolute, Op::Asl);
    t[0x1E] = entry("ASL", AbsoluteX, Op::Asl);
    t[0x4A] = entry("LSR", Accumulator, Op::Lsr);
    t[0x46] = entry("LSR", ZeroPage, Op::Lsr);
    t[0x56] = entry("LSR", ZeroPageX, Op::Lsr);
    t[0x4E] = entry("LSR", Absolute, Op::Lsr);
    t[0x5E] = entry("LSR", AbsoluteX, Op::Lsr);
    t[0x2A] = entry("ROL", Accumulator, Op::Rol);
    t[0x26] = entry("ROL", ZeroPage, Op::Rol);
    t[0x36] = entry("ROL", ZeroPageX, Op::Rol);
    t[0x2E] = entry("ROL", Absolute, Op::Rol);
    t[0x3E] = entry("ROL", AbsoluteX, Op::Rol);
    t[0x6A] = entry("ROR", Accumulator, Op::Ror);
    t[0x66] = entry("ROR", ZeroPage, Op::Ror);
    t[0x76] = entry("ROR", ZeroPageX, Op::Ror);
    t[0x6E] = entry("ROR", Absolute, Op::Ror);
    t[0x7E] = entry("ROR", AbsoluteX, Op::Ror);

    // Logic
    t[0x29] = entry("AND", Immediate, Op::And);
    t[0x25] = entry("AND", ZeroPage, Op::And);
    t[0x35] = entry("AND", ZeroPageX, Op::And);
    t[0x2D] = entry("AND", Absolute, Op::And);
    t[0x3D] = entry("AND", AbsoluteX, Op::And);
    t[0x39] = entry("AND", AbsoluteY, Op::And);
    t[0x21] = entry("AND", IndexedIndirect, Op::And);
    t[0x31] = entry("AND", IndirectIndexed, Op::And);
    t[0x49] = entry("EOR", Immediate, Op::Eor);
    t[0x45] = entry("EOR", ZeroPage, Op::Eor);
    t[0x55] = entry("EOR", ZeroPageX, Op::Eor);
    t[0x4D] = entry("EOR", Absolute, Op::Eor);
    t[0x5D] = entry("EOR", AbsoluteX, Op::Eor);
    t[0x59] = entry("EOR", AbsoluteY, Op::Eor);
    t[0x41] = entry("EOR", IndexedIndirect, Op::Eor);
    t[0x51] = entry("EOR", IndirectIndexed, Op::Eor);
    t[0x09] = entry("ORA", Immediate, Op::Ora);
    t[0x05] = entry("ORA", ZeroPage, Op::Ora);
    t[0x15] = entry("ORA", ZeroPageX, Op::Ora);
    t[0x0D] = entry("ORA", Absolute, Op::Ora);
    t[0x1D] = entry("ORA", AbsoluteX, Op::Ora);
    t[0x19] = entry("ORA", AbsoluteY, Op::Ora);
    t[0x01] = entry("ORA", IndexedIndirect, Op::Ora);
    t[0x11] = entry("ORA", IndirectIndexed, Op::Ora);
    t[0x24] = entry("BIT", ZeroPage, Op::Bit);
    t[0x2C] = entry("BIT", Absolute, Op::Bit);

    // Arithmetic
    t[0x69] = entry("ADC", Immediate, Op::Adc);
    t[0x65] = entry("ADC", ZeroPage, Op::Adc);
    t[0x75] = entry("ADC", ZeroPageX, Op::Adc);
    t[0x6D] = entry("ADC", Absolute, Op::Adc);
    t[0x7D] = entry("ADC", AbsoluteX, Op::Adc);
    t[0x79] = entry("ADC", AbsoluteY, Op::Adc);
    t[0x61] = entry("ADC", IndexedIndirect, Op::Adc);
    t[0x71] = entry("ADC", IndirectIndexed, Op::Adc);
    t[0xE9] = entry("SBC", Immediate, Op::Sbc);
    t[0xE5] = entry("SBC", ZeroPage, Op::Sbc);
    t[0xF5] = entry("SBC", ZeroPageX, Op::Sbc);
    t[0xED] = entry("SBC", Absolute, Op::Sbc);
    t[0xFD] = entry("SBC", AbsoluteX, Op::Sbc);
    t[0xF9] = entry("SBC", AbsoluteY, Op::Sbc);
    t[0xE1] = entry("SBC", IndexedIndirect, Op::Sbc);
    t[0xF1] = entry("SBC", IndirectIndexed, Op::Sbc);

    // Compare
    t[0xC9] = entry("CMP", Immediate, Op::Cmp);
    t[0xC5] = entry("CMP", ZeroPage, Op::Cmp);
    t[0xD5] = entry("CMP", ZeroPageX, Op::Cmp);
    t[0xCD] = entry("CMP", Absolute, Op::Cmp);
    t[0xDD] = entry("CMP", AbsoluteX, Op::Cmp);
    t[0xD9] = entry("CMP", AbsoluteY, Op::Cmp);
    t[0xC1] = entry("CMP", IndexedIndirect, Op::Cmp);
    t[0xD1] = entry("CMP", IndirectIndexed, Op::Cmp);
    t[0xE0] = entry("CPX", Immediate, Op::Cpx);
    t[0xE4] = entry("CPX", ZeroPage, Op::Cpx);
    t[0xEC] = entry("CPX", Absolute, Op::Cpx);
    t[0xC0] = entry("CPY", Immediate, Op::Cpy);
    t[0xC4] = entry("CPY", ZeroPage, Op::Cpy);
    t[0xCC] = entry("CPY", Absolute, Op::Cpy);

    // Increment/decrement
    t[0xE6] = entry("INC", ZeroPage, Op::Inc);
    t[0xF6] = entry("INC", ZeroPageX, Op::Inc);
    t[0xEE] = entry("INC", Absolute, Op::Inc);
    t[0xFE] = entry("INC", AbsoluteX, Op::Inc);
    t[0xE8] = entry("INX", Implied, Op::Inx);
    t[0xC8] = entry("INY", Implied, Op::Iny);
    t[0xC6] = entry("DEC", ZeroPage, Op::Dec);
    t[0xD6] = entry("DEC", ZeroPageX, Op::Dec);
    t[0xCE] = entry("DEC", Absolute, Op::Dec);
    t[0xDE] = entry("DEC", AbsoluteX, Op::Dec);
    t[0xCA] = entry("DEX", Implied, Op::Dex);
    t[0x88] = entry("DEY", Implied, Op::Dey);

    // Control flow
    t[0x00] = entry("BRK", Implied, Op::Brk);
    t[0x4C] = entry("JMP", Absolute, Op::Jmp);
    t[0x6C] = entry("JMP", AbsoluteIndirect, Op::Jmp);
    t[0x20] = entry("JSR", Absolute, Op::Jsr);
    t[0x40] = entry("RTI", Implied, Op::Rti);
    t[0x60] = entry("RTS", Implied, Op::Rts);

    // Branches
    t[0x90] = entry("BCC", Relative, Op::Bcc);
    t[0xB0] = entry("BCS", Relative, Op::Bcs);
    t[0xF0] = entry("BEQ", Relative, Op::Beq);
    t[0xD0] = entry("BNE", Relative, Op::Bne);
    t[0x10] = entry("BPL", Relative, Op::Bpl);
    t[0x30] = entry("BMI", Relative, Op::Bmi);
    t[0x50] = entry("BVC", Relative, Op::Bvc);
    t[0x70] = entry("BVS", Relative, Op::Bvs);

    // Flag operations
    t[0x18] = entry("CLC", Implied, Op::Clc);
    t[0x38] = entry("SEC", Implied, Op::Sec);
    t[0xD8] = entry("CLD", Implied, Op::Cld);
    t[0xF8] = entry("SED", Implied, Op::Sed);
    t[0x58] = entry("CLI", Implied, Op::Cli);
    t[0x78] = entry("SEI", Implied, Op::Sei);
    t[0xB8] = entry("CLV", Implied, Op::Clv);

    t[0xEA] = entry("NOP", Implied, Op::Nop);

    t
};
