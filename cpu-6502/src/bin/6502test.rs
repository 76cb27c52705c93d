//! Klaus Dormann's 6502 functional test suite runner.
//!
//! Runs the comprehensive functional test to verify CPU correctness. The
//! test image is loaded flat at $0000 and execution starts at $0400; the
//! test passes when PC reaches the success trap at $3469. A trap (PC
//! stuck in a loop anywhere else) indicates a failure.
//!
//! Download the test from: https://github.com/Klaus2m5/6502_65C02_functional_tests
//! This core computes ADC/SBC in binary only, so assemble the test with
//! its decimal section disabled (`disable_decimal = 1`).

use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::process;

use cpu_6502::Mos6502;
use emu_core::BusDevice;

/// PC of the success trap in the standard build of the test.
const SUCCESS_TRAP: u16 = 0x3469;

/// Flat 64 KiB of RAM covering the whole address space.
struct Ram {
    bytes: Vec<u8>,
}

impl Ram {
    fn new() -> Self {
        Self {
            bytes: vec![0; 0x10000],
        }
    }

    fn load(&mut self, address: u16, data: &[u8]) {
        let start = address as usize;
        self.bytes[start..start + data.len()].copy_from_slice(data);
    }
}

impl BusDevice for Ram {
    fn address_min(&self) -> u16 {
        0x0000
    }

    fn address_max(&self) -> u16 {
        0xFFFF
    }

    fn read(&mut self, address: u16) -> u8 {
        self.bytes[address as usize]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.bytes[address as usize] = value;
    }
}

fn main() {
    let test_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "test-roms/6502_functional_test.bin".to_string());

    let test_data = match fs::read(&test_path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Failed to load test ROM: {}", e);
            eprintln!();
            eprintln!("To run the 6502 functional test:");
            eprintln!("1. Download from: https://github.com/Klaus2m5/6502_65C02_functional_tests");
            eprintln!("2. Assemble 6502_functional_test.a65 with origin $0000 and disable_decimal = 1");
            eprintln!("3. Place the binary at test-roms/6502_functional_test.bin");
            eprintln!();
            eprintln!("Or specify the path: cargo run -p cpu-6502 --bin 6502test -- /path/to/test.bin");
            process::exit(1);
        }
    };

    println!("Running 6502 functional test suite...");
    println!("Test binary: {} ({} bytes)", test_path, test_data.len());
    println!();

    let ram = RefCell::new(Ram::new());
    ram.borrow_mut().load(0x0000, &test_data);

    let mut cpu = Mos6502::new(vec![&ram as &RefCell<dyn BusDevice>]);
    cpu.reset(0x0400);

    let mut last_pc = cpu.registers().pc;
    let mut stuck_count = 0;
    let mut total_ticks: u64 = 0;
    let mut instruction_count: u64 = 0;

    let start_time = std::time::Instant::now();

    loop {
        // A tick that finds the counter at zero issues a whole
        // instruction; the rest are cycle burn-down.
        let boundary = cpu.cycles_remaining() == 0;

        if let Err(e) = cpu.tick() {
            let regs = cpu.registers();
            println!("Execution failed: {}", e);
            println!(
                "  A=${:02X} X=${:02X} Y=${:02X} SP=${:02X} P=${:02X}",
                regs.a, regs.x, regs.y, regs.sp, regs.p
            );
            println!("  Instructions executed: {}", instruction_count);
            process::exit(1);
        }
        total_ticks += 1;

        if !boundary {
            continue;
        }
        instruction_count += 1;

        let pc = cpu.registers().pc;

        // Check for success.
        if pc == SUCCESS_TRAP {
            let elapsed = start_time.elapsed();
            println!("SUCCESS! All tests passed.");
            println!();
            println!("Statistics:");
            println!("  Instructions executed: {}", instruction_count);
            println!("  Total cycles: {}", total_ticks + cpu.cycles_remaining() as u64);
            println!("  Time elapsed: {:?}", elapsed);
            println!(
                "  Effective speed: {:.2} MHz",
                total_ticks as f64 / elapsed.as_secs_f64() / 1_000_000.0
            );
            process::exit(0);
        }

        // Check for a trap (PC stuck in a loop).
        if pc == last_pc {
            stuck_count += 1;
            if stuck_count >= 3 {
                let regs = cpu.registers();
                println!("TRAP detected at PC=${:04X}", pc);
                println!();
                println!("Test failed! The CPU got stuck in an infinite loop.");
                println!();
                println!("Context:");
                println!("  A=${:02X} X=${:02X} Y=${:02X}", regs.a, regs.x, regs.y);
                println!("  SP=${:02X} P=${:02X}", regs.sp, regs.p);
                println!("  Instructions executed: {}", instruction_count);

                println!();
                println!("Memory around PC:");
                let start = pc.saturating_sub(8) as usize;
                let ram = ram.borrow_mut();
                for offset in 0..16 {
                    print!("{:02X} ", ram.bytes[start + offset]);
                }
                println!();

                process::exit(1);
            }
        } else {
            stuck_count = 0;
        }

        last_pc = pc;

        // Progress indicator every million instructions.
        if instruction_count % 1_000_000 == 0 {
            print!(
                "\rExecuted {} million instructions, PC=${:04X}...",
                instruction_count / 1_000_000,
                pc
            );
            std::io::stdout().flush().unwrap();
        }
    }
}
