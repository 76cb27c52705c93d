//! MOS 6502 CPU core.
//!
//! Implements the legal NMOS 6502 instruction set: 151 opcodes combining
//! 56 mnemonics with 13 addressing modes, executed against an ordered
//! list of memory-mapped [`BusDevice`]s. The CPU advances in discrete
//! clock ticks: an instruction is issued on the tick that finds the cycle
//! counter at zero, and the following ticks burn down its cycle cost.
//!
//! Cycle accounting flows through the documented sources only: one cycle
//! per bus access, one internal cycle for implied/accumulator operands,
//! the taken/page-crossing branch extras, and the seven-cycle reset.
//!
//! Out of scope: undocumented opcodes (fetching one is an error),
//! decimal-mode arithmetic (the D bit is stored but ADC/SBC always
//! compute in binary), and IRQ/NMI pin handling (software BRK/RTI only).

use std::cell::RefCell;

use emu_core::BusDevice;
use log::trace;

mod addressing;
mod decode;
mod error;
mod registers;

pub use addressing::Operand;
pub use decode::{AddrMode, Op, OpcodeEntry, OPCODE_TABLE};
pub use error::{CpuError, CpuResult};
pub use registers::{
    Registers, FLAG_B, FLAG_C, FLAG_D, FLAG_I, FLAG_N, FLAG_U, FLAG_V, FLAG_Z,
};

/// Bottom of the hardware stack page ($0100-$01FF, indexed by SP).
pub const STACK_BASE: u16 = 0x0100;

/// Location of the reset vector (low byte; high byte at +1).
pub const RESET_VECTOR: u16 = 0xFFFC;

/// Location of the IRQ/BRK vector (low byte; high byte at +1).
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// The MOS 6502 CPU state.
///
/// Holds the register file, the cycle counter of the in-flight
/// instruction, and a borrowed, ordered list of bus devices. The devices
/// sit behind `RefCell` so the host keeps DMA-style access to them
/// between ticks; everything is strictly single-threaded.
pub struct Mos6502<'a> {
    regs: Registers,
    /// Cycles left before the in-flight instruction retires.
    cycles: u32,
    devices: Vec<&'a RefCell<dyn BusDevice>>,
}

impl<'a> Mos6502<'a> {
    /// Creates a CPU attached to the given devices.
    ///
    /// Address resolution scans the list in order; where ranges overlap,
    /// the earlier device wins. Registers start zeroed - call
    /// [`reset`](Self::reset) or [`reset_from_vector`](Self::reset_from_vector)
    /// before ticking.
    pub fn new(devices: Vec<&'a RefCell<dyn BusDevice>>) -> Self {
        Self {
            regs: Registers::default(),
            cycles: 0,
            devices,
        }
    }

    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    /// Cycles still owed by the in-flight instruction.
    pub fn cycles_remaining(&self) -> u32 {
        self.cycles
    }

    // =========================================================================
    // Bus dispatch
    //
    // The sole accounting point for memory-access cycles: every successful
    // read or write charges one cycle, so addressing modes and instructions
    // inherit their timing from the fetches they perform.
    // =========================================================================

    /// Reads one byte through the bus. Charges one cycle.
    pub fn read(&mut self, address: u16) -> CpuResult<u8> {
        for device in &self.devices {
            let mut device = device.borrow_mut();
            if address >= device.address_min() && address <= device.address_max() {
                self.cycles += 1;
                return Ok(device.read(address));
            }
        }

        Err(CpuError::BusUnmapped(address))
    }

    /// Writes one byte through the bus. Charges one cycle.
    pub fn write(&mut self, address: u16, value: u8) -> CpuResult<()> {
        for device in &self.devices {
            let mut device = device.borrow_mut();
            if address >= device.address_min() && address <= device.address_max() {
                self.cycles += 1;
                device.write(address, value);
                return Ok(());
            }
        }

        Err(CpuError::BusUnmapped(address))
    }

    // =========================================================================
    // Reset and clock
    // =========================================================================

    /// Puts the CPU into its initial state with the given PC.
    ///
    /// A, X, Y, SP and P are cleared (only the U bit reads back as 1) and
    /// the cycle counter is primed with the seven cycles a hardware reset
    /// takes.
    pub fn reset(&mut self, pc: u16) {
        self.regs.reset(pc);
        self.regs.set_flag(FLAG_U, true);
        self.cycles = 7;
    }

    /// Like [`reset`](Self::reset), but takes the initial PC from the
    /// reset vector at $FFFC/$FFFD. Fails if the vector is unmapped.
    pub fn reset_from_vector(&mut self) -> CpuResult<()> {
        let pc = self.read_word(RESET_VECTOR)?;
        self.reset(pc);
        Ok(())
    }

    /// Advances the CPU by one external clock edge.
    ///
    /// While the previous instruction still owes cycles this only
    /// decrements the counter. Otherwise the opcode at PC is fetched,
    /// decoded, resolved and executed in full, leaving the counter at the
    /// instruction's remaining cost: an N-cycle instruction retires on
    /// the tick it was issued and turns the next N-1 ticks into pure
    /// decrements.
    pub fn tick(&mut self) -> CpuResult<()> {
        if self.cycles > 0 {
            self.cycles -= 1;
            return Ok(());
        }

        let pc = self.regs.pc;
        let opcode = self.read(pc)?;
        self.regs.pc = pc.wrapping_add(1);

        let Some(entry) = OPCODE_TABLE[opcode as usize] else {
            return Err(CpuError::IllegalOpcode { opcode, pc });
        };

        let operand = self.resolve(entry.mode)?;
        self.execute(entry.op, operand)?;
        trace!("{} {:?} (cycles={})", entry.mnemonic, entry.mode, self.cycles);

        // The tick spent issuing the instruction.
        self.cycles = self.cycles.saturating_sub(1);
        Ok(())
    }

    /// Finishes any pending cycles, then runs the next instruction to
    /// retirement. Convenience for tests and instruction-granular hosts.
    pub fn step(&mut self) -> CpuResult<()> {
        while self.cycles > 0 {
            self.tick()?;
        }
        self.tick()?;
        while self.cycles > 0 {
            self.tick()?;
        }

        Ok(())
    }

    // =========================================================================
    // Stack
    // =========================================================================

    fn push(&mut self, value: u8) -> CpuResult<()> {
        self.write(STACK_BASE + self.regs.sp as u16, value)?;
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        Ok(())
    }

    fn pull(&mut self) -> CpuResult<u8> {
        self.regs.sp = self.regs.sp.wrapping_add(1);
        self.read(STACK_BASE + self.regs.sp as u16)
    }

    /// Pushes a word high byte first, so pulls come back low-then-high.
    fn push_word(&mut self, value: u16) -> CpuResult<()> {
        self.push((value >> 8) as u8)?;
        self.push(value as u8)
    }

    fn pull_word(&mut self) -> CpuResult<u16> {
        let low = self.pull()?;
        let high = self.pull()?;
        Ok(u16::from_le_bytes([low, high]))
    }

    // =========================================================================
    // Operand access
    // =========================================================================

    /// Reads the operand value, from memory or from A for the
    /// accumulator form.
    fn read_operand(&mut self, operand: Operand) -> CpuResult<u8> {
        match operand {
            Operand::Memory(address) => self.read(address),
            _ => Ok(self.regs.a),
        }
    }

    /// Writes a result back to the operand, to memory or to A for the
    /// accumulator form.
    fn write_operand(&mut self, operand: Operand, value: u8) -> CpuResult<()> {
        match operand {
            Operand::Memory(address) => self.write(address, value),
            _ => {
                self.regs.a = value;
                Ok(())
            }
        }
    }

    // =========================================================================
    // ALU helpers
    // =========================================================================

    /// ADC core: A + value + C with the canonical carry/overflow rules.
    /// SBC routes through here with the one's complement of the operand.
    fn adc(&mut self, value: u8) {
        let sum = self.regs.a as u16 + value as u16 + self.regs.carry() as u16;
        let result = sum as u8;

        self.regs.set_flag(FLAG_C, sum > 0xFF);
        self.regs.set_flag(
            FLAG_V,
            (!(self.regs.a ^ value) & (self.regs.a ^ result)) & 0x80 != 0,
        );
        self.regs.a = result;
        self.regs.set_zn(result);
    }

    /// CMP/CPX/CPY: flags from register - value; both operands unchanged.
    fn compare(&mut self, register: u8, value: u8) {
        self.regs.set_flag(FLAG_C, register >= value);
        self.regs.set_zn(register.wrapping_sub(value));
    }

    fn asl(&mut self, value: u8) -> u8 {
        self.regs.set_flag(FLAG_C, value & 0x80 != 0);
        let result = value << 1;
        self.regs.set_zn(result);
        result
    }

    fn lsr(&mut self, value: u8) -> u8 {
        self.regs.set_flag(FLAG_C, value & 0x01 != 0);
        let result = value >> 1;
        self.regs.set_zn(result);
        result
    }

    fn rol(&mut self, value: u8) -> u8 {
        let carry_in = self.regs.carry() as u8;
        self.regs.set_flag(FLAG_C, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.regs.set_zn(result);
        result
    }

    fn ror(&mut self, value: u8) -> u8 {
        let carry_in = (self.regs.carry() as u8) << 7;
        self.regs.set_flag(FLAG_C, value & 0x01 != 0);
        let result = (value >> 1) | carry_in;
        self.regs.set_zn(result);
        result
    }

    /// Applies a taken branch: one extra cycle, two when the target sits
    /// on a different page than the branch operand byte.
    fn branch(&mut self, condition: bool, operand: Operand) {
        if !condition {
            return;
        }

        if let Operand::Memory(target) = operand {
            let operand_page = self.regs.pc.wrapping_sub(1) & 0xFF00;
            self.cycles += if target & 0xFF00 != operand_page { 2 } else { 1 };
            self.regs.pc = target;
        }
    }

    // =========================================================================
    // Instruction execution
    // =========================================================================

    fn execute(&mut self, op: Op, operand: Operand) -> CpuResult<()> {
        match op {
            // Load/store. Loads set Z/N from the value; stores never
            // touch flags.
            Op::Lda => {
                let value = self.read_operand(operand)?;
                self.regs.a = value;
                self.regs.set_zn(value);
            }
            Op::Ldx => {
                let value = self.read_operand(operand)?;
                self.regs.x = value;
                self.regs.set_zn(value);
            }
            Op::Ldy => {
                let value = self.read_operand(operand)?;
                self.regs.y = value;
                self.regs.set_zn(value);
            }
            Op::Sta => {
                if let Operand::Memory(address) = operand {
                    self.write(address, self.regs.a)?;
                }
            }
            Op::Stx => {
                if let Operand::Memory(address) = operand {
                    self.write(address, self.regs.x)?;
                }
            }
            Op::Sty => {
                if let Operand::Memory(address) = operand {
                    self.write(address, self.regs.y)?;
                }
            }

            // Register transfers. All but TXS set Z/N from the copy.
            Op::Tax => {
                self.regs.x = self.regs.a;
                self.regs.set_zn(self.regs.x);
            }
            Op::Tay => {
                self.regs.y = self.regs.a;
                self.regs.set_zn(self.regs.y);
            }
            Op::Txa => {
                self.regs.a = self.regs.x;
                self.regs.set_zn(self.regs.a);
            }
            Op::Tya => {
                self.regs.a = self.regs.y;
                self.regs.set_zn(self.regs.a);
            }
            Op::Tsx => {
                self.regs.x = self.regs.sp;
                self.regs.set_zn(self.regs.x);
            }
            Op::Txs => {
                self.regs.sp = self.regs.x;
            }

            // Stack.
            Op::Pha => {
                self.push(self.regs.a)?;
            }
            Op::Php => {
                let status = self.regs.pushed_status();
                self.push(status)?;
            }
            Op::Pla => {
                let value = self.pull()?;
                self.regs.a = value;
                self.regs.set_zn(value);
            }
            Op::Plp => {
                let status = self.pull()?;
                self.regs.set_status_from_pull(status);
            }

            // Shift/rotate, on A or on memory.
            Op::Asl => {
                let value = self.read_operand(operand)?;
                let result = self.asl(value);
                self.write_operand(operand, result)?;
            }
            Op::Lsr => {
                let value = self.read_operand(operand)?;
                let result = self.lsr(value);
                self.write_operand(operand, result)?;
            }
            Op::Rol => {
                let value = self.read_operand(operand)?;
                let result = self.rol(value);
                self.write_operand(operand, result)?;
            }
            Op::Ror => {
                let value = self.read_operand(operand)?;
                let result = self.ror(value);
                self.write_operand(operand, result)?;
            }

            // Logic.
            Op::And => {
                let value = self.read_operand(operand)?;
                self.regs.a &= value;
                self.regs.set_zn(self.regs.a);
            }
            Op::Eor => {
                let value = self.read_operand(operand)?;
                self.regs.a ^= value;
                self.regs.set_zn(self.regs.a);
            }
            Op::Ora => {
                let value = self.read_operand(operand)?;
                self.regs.a |= value;
                self.regs.set_zn(self.regs.a);
            }
            Op::Bit => {
                let value = self.read_operand(operand)?;
                self.regs.set_flag(FLAG_Z, self.regs.a & value == 0);
                self.regs.set_flag(FLAG_N, value & 0x80 != 0);
                self.regs.set_flag(FLAG_V, value & 0x40 != 0);
            }

            // Arithmetic. Binary only; SBC is ADC of the one's complement.
            Op::Adc => {
                let value = self.read_operand(operand)?;
                self.adc(value);
            }
            Op::Sbc => {
                let value = self.read_operand(operand)?;
                self.adc(value ^ 0xFF);
            }

            // Compare.
            Op::Cmp => {
                let value = self.read_operand(operand)?;
                self.compare(self.regs.a, value);
            }
            Op::Cpx => {
                let value = self.read_operand(operand)?;
                self.compare(self.regs.x, value);
            }
            Op::Cpy => {
                let value = self.read_operand(operand)?;
                self.compare(self.regs.y, value);
            }

            // Increment/decrement.
            Op::Inc => {
                if let Operand::Memory(address) = operand {
                    let result = self.read(address)?.wrapping_add(1);
                    self.regs.set_zn(result);
                    self.write(address, result)?;
                }
            }
            Op::Dec => {
                if let Operand::Memory(address) = operand {
                    let result = self.read(address)?.wrapping_sub(1);
                    self.regs.set_zn(result);
                    self.write(address, result)?;
                }
            }
            Op::Inx => {
                self.regs.x = self.regs.x.wrapping_add(1);
                self.regs.set_zn(self.regs.x);
            }
            Op::Iny => {
                self.regs.y = self.regs.y.wrapping_add(1);
                self.regs.set_zn(self.regs.y);
            }
            Op::Dex => {
                self.regs.x = self.regs.x.wrapping_sub(1);
                self.regs.set_zn(self.regs.x);
            }
            Op::Dey => {
                self.regs.y = self.regs.y.wrapping_sub(1);
                self.regs.set_zn(self.regs.y);
            }

            // Control flow.
            Op::Jmp => {
                if let Operand::Memory(target) = operand {
                    self.regs.pc = target;
                }
            }
            Op::Jsr => {
                if let Operand::Memory(target) = operand {
                    // Return address is the last byte of the JSR operand.
                    self.push_word(self.regs.pc.wrapping_sub(1))?;
                    self.regs.pc = target;
                }
            }
            Op::Rts => {
                self.regs.pc = self.pull_word()?.wrapping_add(1);
            }
            Op::Brk => {
                // Skip the padding byte so RTI resumes two bytes past the
                // BRK opcode, then push the return address and P with the
                // B artifact set. I is raised after the push, as on
                // hardware.
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.push_word(self.regs.pc)?;
                let status = self.regs.pushed_status();
                self.push(status)?;
                self.regs.set_flag(FLAG_I, true);
                self.regs.pc = self.read_word(IRQ_VECTOR)?;
            }
            Op::Rti => {
                let status = self.pull()?;
                self.regs.set_status_from_pull(status);
                self.regs.pc = self.pull_word()?;
            }

            // Branches.
            Op::Bcc => self.branch(!self.regs.carry(), operand),
            Op::Bcs => self.branch(self.regs.carry(), operand),
            Op::Beq => self.branch(self.regs.zero(), operand),
            Op::Bne => self.branch(!self.regs.zero(), operand),
            Op::Bpl => self.branch(!self.regs.negative(), operand),
            Op::Bmi => self.branch(self.regs.negative(), operand),
            Op::Bvc => self.branch(!self.regs.overflow(), operand),
            Op::Bvs => self.branch(self.regs.overflow(), operand),

            // Flag operations.
            Op::Clc => self.regs.set_flag(FLAG_C, false),
            Op::Sec => self.regs.set_flag(FLAG_C, true),
            Op::Cld => self.regs.set_flag(FLAG_D, false),
            Op::Sed => self.regs.set_flag(FLAG_D, true),
            Op::Cli => self.regs.set_flag(FLAG_I, false),
            Op::Sei => self.regs.set_flag(FLAG_I, true),
            Op::Clv => self.regs.set_flag(FLAG_V, false),

            Op::Nop => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// RAM covering a configurable window of the address space.
    struct Ram {
        min: u16,
        max: u16,
        bytes: Vec<u8>,
    }

    impl Ram {
        fn full() -> Self {
            Self::window(0x0000, 0xFFFF)
        }

        fn window(min: u16, max: u16) -> Self {
            Self {
                min,
                max,
                bytes: vec![0; 0x10000],
            }
        }

        fn load(&mut self, address: u16, program: &[u8]) {
            let start = address as usize;
            self.bytes[start..start + program.len()].copy_from_slice(program);
        }
    }

    impl BusDevice for Ram {
        fn address_min(&self) -> u16 {
            self.min
        }

        fn address_max(&self) -> u16 {
            self.max
        }

        fn read(&mut self, address: u16) -> u8 {
            self.bytes[address as usize]
        }

        fn write(&mut self, address: u16, value: u8) {
            self.bytes[address as usize] = value;
        }
    }

    fn cpu_with_program<'a>(
        ram: &'a RefCell<Ram>,
        origin: u16,
        program: &[u8],
    ) -> Mos6502<'a> {
        ram.borrow_mut().load(origin, program);
        let mut cpu = Mos6502::new(vec![ram as &RefCell<dyn BusDevice>]);
        cpu.reset(origin);
        cpu
    }

    /// Burns pending cycles, issues the next instruction with a single
    /// tick, and returns its total cycle cost.
    fn instruction_cycles(cpu: &mut Mos6502) -> u32 {
        while cpu.cycles_remaining() > 0 {
            cpu.tick().unwrap();
        }
        cpu.tick().unwrap();
        cpu.cycles_remaining() + 1
    }

    #[test]
    fn reset_initial_state() {
        let ram = RefCell::new(Ram::full());
        let mut cpu = Mos6502::new(vec![&ram as &RefCell<dyn BusDevice>]);
        cpu.reset(0x0400);

        let regs = cpu.registers();
        assert_eq!(regs.a, 0);
        assert_eq!(regs.x, 0);
        assert_eq!(regs.y, 0);
        assert_eq!(regs.sp, 0);
        assert_eq!(regs.p, 0x20);
        assert_eq!(regs.pc, 0x0400);
        assert_eq!(cpu.cycles_remaining(), 7);
    }

    #[test]
    fn reset_from_vector_reads_the_vector() {
        let ram = RefCell::new(Ram::full());
        ram.borrow_mut().load(RESET_VECTOR, &[0x00, 0x04]);
        let mut cpu = Mos6502::new(vec![&ram as &RefCell<dyn BusDevice>]);
        cpu.reset_from_vector().unwrap();

        assert_eq!(cpu.registers().pc, 0x0400);
        assert_eq!(cpu.cycles_remaining(), 7);
    }

    #[test]
    fn lda_immediate_sets_zero() {
        let ram = RefCell::new(Ram::full());
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0xA9, 0x00]);
        cpu.step().unwrap();

        assert_eq!(cpu.registers().a, 0x00);
        assert!(cpu.registers().zero());
        assert!(!cpu.registers().negative());
        assert_eq!(cpu.registers().pc, 0x0402);
    }

    #[test]
    fn lda_immediate_sets_negative() {
        let ram = RefCell::new(Ram::full());
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0xA9, 0x80]);
        cpu.step().unwrap();

        assert_eq!(cpu.registers().a, 0x80);
        assert!(!cpu.registers().zero());
        assert!(cpu.registers().negative());
    }

    #[test]
    fn lda_immediate_takes_two_cycles() {
        let ram = RefCell::new(Ram::full());
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0xA9, 0x42]);

        assert_eq!(instruction_cycles(&mut cpu), 2);
    }

    #[test]
    fn tick_cadence_between_instructions() {
        // LDA $10 costs three cycles: the issuing tick plus two decrements.
        let ram = RefCell::new(Ram::full());
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0xA5, 0x10, 0xA5, 0x11]);
        while cpu.cycles_remaining() > 0 {
            cpu.tick().unwrap();
        }

        cpu.tick().unwrap();
        assert_eq!(cpu.registers().pc, 0x0402);
        assert_eq!(cpu.cycles_remaining(), 2);

        cpu.tick().unwrap();
        cpu.tick().unwrap();
        assert_eq!(cpu.registers().pc, 0x0402);
        assert_eq!(cpu.cycles_remaining(), 0);

        cpu.tick().unwrap();
        assert_eq!(cpu.registers().pc, 0x0404);
    }

    #[test]
    fn adc_overflow_from_7f() {
        let ram = RefCell::new(Ram::full());
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0xA9, 0x7F, 0x69, 0x01]);
        cpu.step().unwrap();
        assert_eq!(cpu.registers().a, 0x7F);

        cpu.step().unwrap();
        assert_eq!(cpu.registers().a, 0x80);
        assert!(cpu.registers().overflow());
        assert!(cpu.registers().negative());
        assert!(!cpu.registers().carry());
        assert!(!cpu.registers().zero());
    }

    #[test]
    fn sbc_with_borrow_set() {
        // SEC; LDA #$05; SBC #$03
        let ram = RefCell::new(Ram::full());
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0x38, 0xA9, 0x05, 0xE9, 0x03]);
        cpu.step().unwrap();
        cpu.step().unwrap();
        cpu.step().unwrap();

        let regs = cpu.registers();
        assert_eq!(regs.a, 0x02);
        assert!(regs.carry());
        assert!(!regs.overflow());
        assert!(!regs.negative());
        assert!(!regs.zero());
    }

    #[test]
    fn adc_result_commutes() {
        for (a, m) in [(0x12u8, 0x34u8), (0xFF, 0x01), (0x80, 0x80), (0x00, 0x00)] {
            let mut results = [0u8; 2];
            for (slot, (lhs, rhs)) in results.iter_mut().zip([(a, m), (m, a)]) {
                let ram = RefCell::new(Ram::full());
                let mut cpu = cpu_with_program(&ram, 0x0400, &[0x69, rhs]);
                cpu.registers_mut().a = lhs;
                cpu.step().unwrap();
                *slot = cpu.registers().a;
            }

            assert_eq!(results[0], results[1], "A={a:02X} M={m:02X}");
        }
    }

    #[test]
    fn cmp_flag_rules() {
        // (register, operand, carry, zero)
        for (reg, value, carry, zero) in [
            (0x10u8, 0x10u8, true, true),
            (0x20, 0x10, true, false),
            (0x10, 0x20, false, false),
            (0x00, 0xFF, false, false),
        ] {
            let ram = RefCell::new(Ram::full());
            let mut cpu = cpu_with_program(&ram, 0x0400, &[0xC9, value]);
            cpu.registers_mut().a = reg;
            cpu.step().unwrap();

            assert_eq!(cpu.registers().carry(), carry, "reg={reg:02X} m={value:02X}");
            assert_eq!(cpu.registers().zero(), zero, "reg={reg:02X} m={value:02X}");
            assert_eq!(cpu.registers().a, reg);
        }
    }

    #[test]
    fn sta_leaves_flags_alone() {
        let ram = RefCell::new(Ram::full());
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0x85, 0x10]);
        cpu.registers_mut().a = 0x80;
        let status = cpu.registers().p;
        cpu.step().unwrap();

        assert_eq!(ram.borrow_mut().bytes[0x10], 0x80);
        assert_eq!(cpu.registers().p, status);
    }

    #[test]
    fn pha_pla_round_trip() {
        // LDA #$37; PHA; LDA #$00; PLA
        let ram = RefCell::new(Ram::full());
        let mut cpu =
            cpu_with_program(&ram, 0x0400, &[0xA9, 0x37, 0x48, 0xA9, 0x00, 0x68]);
        cpu.registers_mut().sp = 0xFF;
        for _ in 0..4 {
            cpu.step().unwrap();
        }

        assert_eq!(cpu.registers().a, 0x37);
        assert_eq!(cpu.registers().sp, 0xFF);
        assert!(!cpu.registers().zero());
    }

    #[test]
    fn php_plp_round_trip() {
        // SEC; PHP; CLC; PLP
        let ram = RefCell::new(Ram::full());
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0x38, 0x08, 0x18, 0x28]);
        cpu.registers_mut().sp = 0xFF;
        for _ in 0..4 {
            cpu.step().unwrap();
        }

        let regs = cpu.registers();
        assert!(regs.carry());
        assert!(regs.flag(FLAG_U));
        assert!(!regs.flag(FLAG_B));
        assert_eq!(regs.sp, 0xFF);
    }

    #[test]
    fn jsr_rts_round_trip() {
        let ram = RefCell::new(Ram::full());
        ram.borrow_mut().load(0x0700, &[0x60]); // RTS
        let mut cpu = cpu_with_program(&ram, 0x0600, &[0x20, 0x00, 0x07, 0xEA]);
        cpu.registers_mut().sp = 0xFF;

        cpu.step().unwrap(); // JSR $0700
        assert_eq!(cpu.registers().pc, 0x0700);
        assert_eq!(cpu.registers().sp, 0xFD);
        {
            let mut ram = ram.borrow_mut();
            assert_eq!(ram.read(0x01FF), 0x06);
            assert_eq!(ram.read(0x01FE), 0x02);
        }

        cpu.step().unwrap(); // RTS
        assert_eq!(cpu.registers().pc, 0x0603);
        assert_eq!(cpu.registers().sp, 0xFF);

        cpu.step().unwrap(); // the trailing NOP
        assert_eq!(cpu.registers().pc, 0x0604);
    }

    #[test]
    fn branch_cycle_accounting() {
        // Not taken: the two fetches only.
        let ram = RefCell::new(Ram::full());
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0xF0, 0x02]);
        assert_eq!(instruction_cycles(&mut cpu), 2);
        assert_eq!(cpu.registers().pc, 0x0402);

        // Taken within the page: one extra cycle.
        let ram = RefCell::new(Ram::full());
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0xF0, 0x02]);
        cpu.registers_mut().set_flag(FLAG_Z, true);
        assert_eq!(instruction_cycles(&mut cpu), 3);
        assert_eq!(cpu.registers().pc, 0x0404);
    }

    #[test]
    fn branch_page_cross_charges_two() {
        let ram = RefCell::new(Ram::full());
        let mut cpu = cpu_with_program(&ram, 0x00FE, &[0xF0, 0x02]);
        cpu.registers_mut().set_flag(FLAG_Z, true);

        assert_eq!(instruction_cycles(&mut cpu), 4);
        assert_eq!(cpu.registers().pc, 0x0102);
    }

    #[test]
    fn rol_then_ror_restores_value_and_carry() {
        let ram = RefCell::new(Ram::full());
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0x2A, 0x6A]);
        cpu.registers_mut().a = 0xB7;
        cpu.registers_mut().set_flag(FLAG_C, true);

        cpu.step().unwrap(); // ROL A
        assert_eq!(cpu.registers().a, 0x6F);
        assert!(cpu.registers().carry());

        cpu.step().unwrap(); // ROR A
        assert_eq!(cpu.registers().a, 0xB7);
        assert!(cpu.registers().carry());
    }

    #[test]
    fn asl_accumulator_writes_a() {
        let ram = RefCell::new(Ram::full());
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0x0A]);
        cpu.registers_mut().a = 0x81;
        cpu.step().unwrap();

        assert_eq!(cpu.registers().a, 0x02);
        assert!(cpu.registers().carry());
        assert_eq!(cpu.registers().pc, 0x0401);
    }

    #[test]
    fn lsr_memory_writes_back() {
        let ram = RefCell::new(Ram::full());
        ram.borrow_mut().bytes[0x10] = 0x41;
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0x46, 0x10]);
        cpu.step().unwrap();

        assert_eq!(ram.borrow_mut().bytes[0x10], 0x20);
        assert!(cpu.registers().carry());
    }

    #[test]
    fn inc_dec_write_memory() {
        let ram = RefCell::new(Ram::full());
        ram.borrow_mut().bytes[0x10] = 0xFF;
        ram.borrow_mut().bytes[0x11] = 0x01;
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0xE6, 0x10, 0xC6, 0x11]);

        cpu.step().unwrap(); // INC $10
        assert_eq!(ram.borrow_mut().bytes[0x10], 0x00);
        assert!(cpu.registers().zero());

        cpu.step().unwrap(); // DEC $11
        assert_eq!(ram.borrow_mut().bytes[0x11], 0x00);
        assert!(cpu.registers().zero());
    }

    #[test]
    fn bit_copies_high_bits() {
        let ram = RefCell::new(Ram::full());
        ram.borrow_mut().bytes[0x10] = 0xC0;
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0x24, 0x10]);
        cpu.registers_mut().a = 0x3F;
        cpu.step().unwrap();

        let regs = cpu.registers();
        assert!(regs.zero()); // $3F & $C0 == 0
        assert!(regs.negative());
        assert!(regs.overflow());
        assert_eq!(regs.a, 0x3F);
    }

    #[test]
    fn zero_page_x_wraps_within_page() {
        let ram = RefCell::new(Ram::full());
        ram.borrow_mut().bytes[0x10] = 0xAB;
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0xB5, 0x80]);
        cpu.registers_mut().x = 0x90;
        cpu.step().unwrap();

        assert_eq!(cpu.registers().a, 0xAB);
    }

    #[test]
    fn indexed_indirect_pointer_wraps_in_zero_page() {
        let ram = RefCell::new(Ram::full());
        {
            let mut ram = ram.borrow_mut();
            ram.bytes[0x00FF] = 0x45; // pointer low at $FF
            ram.bytes[0x0000] = 0x12; // pointer high wraps to $00
            ram.bytes[0x1245] = 0x5A;
        }
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0xA1, 0xFE]);
        cpu.registers_mut().x = 0x01;
        cpu.step().unwrap();

        assert_eq!(cpu.registers().a, 0x5A);
    }

    #[test]
    fn indirect_indexed_adds_y() {
        let ram = RefCell::new(Ram::full());
        {
            let mut ram = ram.borrow_mut();
            ram.bytes[0x40] = 0x00;
            ram.bytes[0x41] = 0x20;
            ram.bytes[0x2010] = 0x77;
        }
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0xB1, 0x40]);
        cpu.registers_mut().y = 0x10;
        cpu.step().unwrap();

        assert_eq!(cpu.registers().a, 0x77);
    }

    #[test]
    fn absolute_y_uses_y_not_x() {
        let ram = RefCell::new(Ram::full());
        ram.borrow_mut().bytes[0x2005] = 0x66;
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0xB9, 0x00, 0x20]);
        cpu.registers_mut().y = 0x05;
        cpu.registers_mut().x = 0xFF;
        cpu.step().unwrap();

        assert_eq!(cpu.registers().a, 0x66);
    }

    #[test]
    fn jmp_indirect_page_wrap_quirk() {
        let ram = RefCell::new(Ram::full());
        {
            let mut ram = ram.borrow_mut();
            ram.bytes[0x02FF] = 0x34;
            ram.bytes[0x0200] = 0x12; // high byte wraps to $0200, not $0300
            ram.bytes[0x0300] = 0xFF;
        }
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0x6C, 0xFF, 0x02]);
        cpu.step().unwrap();

        assert_eq!(cpu.registers().pc, 0x1234);
    }

    #[test]
    fn brk_and_rti() {
        let ram = RefCell::new(Ram::full());
        {
            let mut ram = ram.borrow_mut();
            ram.load(IRQ_VECTOR, &[0x00, 0x03]); // handler at $0300
            ram.load(0x0300, &[0x40]); // RTI
        }
        let mut cpu = cpu_with_program(&ram, 0x0210, &[0x00]);
        cpu.registers_mut().sp = 0xFF;

        cpu.step().unwrap(); // BRK
        assert_eq!(cpu.registers().pc, 0x0300);
        assert_eq!(cpu.registers().sp, 0xFC);
        assert!(cpu.registers().interrupt_disable());
        {
            let mut ram = ram.borrow_mut();
            assert_eq!(ram.read(0x01FF), 0x02); // return address $0212, high
            assert_eq!(ram.read(0x01FE), 0x12); // return address $0212, low
            assert_eq!(ram.read(0x01FD), 0x30); // pushed P: B and U set
        }

        cpu.step().unwrap(); // RTI
        assert_eq!(cpu.registers().pc, 0x0212);
        assert_eq!(cpu.registers().sp, 0xFF);
        assert_eq!(cpu.registers().p, 0x20); // I restored to its pre-BRK state
    }

    #[test]
    fn brk_takes_seven_cycles() {
        let ram = RefCell::new(Ram::full());
        ram.borrow_mut().load(IRQ_VECTOR, &[0x00, 0x03]);
        let mut cpu = cpu_with_program(&ram, 0x0210, &[0x00]);
        cpu.registers_mut().sp = 0xFF;

        assert_eq!(instruction_cycles(&mut cpu), 7);
    }

    #[test]
    fn illegal_opcode_reports_location() {
        let ram = RefCell::new(Ram::full());
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0x02]);

        assert_eq!(
            cpu.step(),
            Err(CpuError::IllegalOpcode {
                opcode: 0x02,
                pc: 0x0400
            })
        );
    }

    #[test]
    fn unmapped_address_reports_address() {
        let ram = RefCell::new(Ram::window(0x0000, 0x7FFF));
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0xAD, 0x00, 0x90]);

        assert_eq!(cpu.step(), Err(CpuError::BusUnmapped(0x9000)));
    }

    #[test]
    fn overlapping_devices_first_wins() {
        let front = RefCell::new(Ram::window(0x0000, 0x1FFF));
        let back = RefCell::new(Ram::full());
        front.borrow_mut().bytes[0x1000] = 0x11;
        back.borrow_mut().bytes[0x1000] = 0x22;

        let mut cpu = Mos6502::new(vec![
            &front as &RefCell<dyn BusDevice>,
            &back as &RefCell<dyn BusDevice>,
        ]);

        assert_eq!(cpu.read(0x1000), Ok(0x11));
        // Beyond the front device's window the scan falls through.
        assert_eq!(back.borrow_mut().bytes[0x2000], 0x00);
        cpu.write(0x2000, 0x33).unwrap();
        assert_eq!(back.borrow_mut().bytes[0x2000], 0x33);
        assert_eq!(front.borrow_mut().bytes[0x2000], 0x00);
    }

    #[test]
    fn transfers_update_flags_except_txs() {
        // TAX with A = 0 sets Z; TXS never touches P.
        let ram = RefCell::new(Ram::full());
        let mut cpu = cpu_with_program(&ram, 0x0400, &[0xAA, 0x9A]);
        cpu.step().unwrap();
        assert!(cpu.registers().zero());

        cpu.registers_mut().x = 0x80;
        let status = cpu.registers().p;
        cpu.step().unwrap();
        assert_eq!(cpu.registers().sp, 0x80);
        assert_eq!(cpu.registers().p, status);
    }
}
