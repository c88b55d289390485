// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Decodes and runs instructions

#[cfg(test)]
mod tests;

pub mod behavior;
pub mod flags;
pub mod instruction;
pub mod mem;
pub mod mode;
pub mod quirks;

use self::{
    flags::{Flags, State},
    instruction::{
        disassembler::{Dis, Disassembler},
        Insn,
    },
    mem::{Mem, Region::Program, PROGRAM_START},
    quirks::Quirks,
};
use crate::{
    error::{Error, Result},
    io::Peripherals,
    screen::Screen,
};
use imperative_rs::InstructionSet;
use owo_colors::OwoColorize;
use std::fmt::Debug;

type Reg = usize;
type Adr = u16;
type Nib = u8;

/// Number of return addresses the stack can hold
pub const STACK_DEPTH: usize = 16;

/// Represents the internal state of the CPU interpreter
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CPU {
    /// Flags that control how the CPU behaves, but which aren't inherent to the
    /// chip-8. Includes [Quirks], pause, and debug.
    pub flags: Flags,
    // memory
    mem: Mem,
    screen: Screen,
    stack: [Adr; STACK_DEPTH],
    sp: usize,
    // registers
    pc: Adr,
    i: Adr,
    v: [u8; 16],
    delay: u8,
    sound: u8,
    // I/O
    keys: u16,
    key_latch: u16,
    // Execution data
    cycle: usize,
    #[cfg_attr(feature = "serde", serde(skip))]
    disassembler: Dis,
}

// public interface
impl CPU {
    /// Constructs a new, initialized CPU: zeroed memory with the font loaded,
    /// and the program counter at `0x200`
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// let cpu = CPU::new();
    /// assert_eq!(0x200, cpu.pc());
    /// assert_eq!(0xf0, cpu.mem().read(0x000));
    /// ```
    pub fn new() -> Self {
        let mut cpu = CPU {
            flags: Flags::default(),
            mem: Mem::new(),
            screen: Screen::new(),
            stack: [0; STACK_DEPTH],
            sp: 0,
            pc: PROGRAM_START,
            i: 0,
            v: [0; 16],
            delay: 0,
            sound: 0,
            keys: 0,
            key_latch: 0,
            cycle: 0,
            disassembler: Dis::default(),
        };
        cpu.initialize();
        cpu
    }

    /// Zeroes all of memory, reloads the font, then [resets](CPU::reset) the CPU
    pub fn initialize(&mut self) -> &mut Self {
        self.mem.clear().load_font();
        self.reset();
        self
    }

    /// Resets the emulator.
    ///
    /// Touches the registers, stack, pc, timers, keys, screen, and cycle count,
    /// and restores the default [Quirks].
    ///
    /// Does not touch memory, or the debug and pause [Flags].
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// let mut cpu = CPU::new();
    /// cpu.set_v(0x3, 0x41).unwrap();
    /// cpu.flags.quirks.shift_uses_x_register = true;
    /// cpu.reset();
    /// assert_eq!(0, cpu.v()[3]);
    /// assert_eq!(Quirks::default(), cpu.flags.quirks);
    /// ```
    pub fn reset(&mut self) -> &mut Self {
        self.flags.quirks = Quirks::default();
        // clear the stack
        self.stack = [0; STACK_DEPTH];
        self.sp = 0;
        // Reset the program counter
        self.pc = PROGRAM_START;
        // Zero the registers
        self.i = 0;
        self.v = [0; 16];
        self.delay = 0;
        self.sound = 0;
        // I/O
        self.keys = 0;
        self.key_latch = 0;
        self.screen.clear();
        // Execution data
        self.cycle = 0;
        self
    }

    /// Loads bytes into the CPU's program space, starting at `0x200`.
    ///
    /// Nothing else is touched: reset first for a clean run.
    ///
    /// Returns [Error::Capacity] if the program is larger than `0x1000 - 0x200` bytes.
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// let mut cpu = CPU::new();
    /// assert!(cpu.load(&[0; 0xe00]).is_ok());
    /// assert!(cpu.load(&[0; 0xe01]).is_err());
    /// ```
    pub fn load(&mut self, rom: &[u8]) -> Result<&mut Self> {
        self.mem.load_region(Program, rom)?;
        Ok(self)
    }

    /// Resets the CPU, wipes program memory, and loads a program from a file
    pub fn load_program(&mut self, rom: impl AsRef<std::path::Path>) -> Result<&mut Self> {
        let rom = std::fs::read(rom)?;
        self.reset().clear_program().load(&rom)
    }

    /// Zeroes program memory (`0x200..0x1000`)
    pub fn clear_program(&mut self) -> &mut Self {
        self.mem.clear_region(Program);
        self
    }

    /// Presses a key, and reports whether the key's state changed.
    /// If key does not exist, returns [Error::InvalidKey].
    ///
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// let mut cpu = CPU::default();
    ///
    /// // press key `7`
    /// let did_press = cpu.press(0x7).unwrap();
    /// assert!(did_press);
    ///
    /// // press key `7` again, even though it's already pressed
    /// let did_press = cpu.press(0x7).unwrap();
    /// // it was already pressed, so nothing's changed.
    /// assert!(!did_press);
    /// ```
    pub fn press(&mut self, key: usize) -> Result<bool> {
        let mask = Self::key_mask(key)?;
        let changed = self.keys & mask == 0;
        self.keys |= mask;
        Ok(changed)
    }

    /// Releases a key, and reports whether the key's state changed.
    /// If key is outside range `0..=0xF`, returns [Error::InvalidKey].
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// let mut cpu = CPU::default();
    /// // press key `7`
    /// cpu.press(0x7).unwrap();
    /// // release key `7`
    /// let changed = cpu.release(0x7).unwrap();
    /// assert!(changed); // key released
    /// // try releasing `7` again
    /// let changed = cpu.release(0x7).unwrap();
    /// assert!(!changed); // key was not held
    /// ```
    pub fn release(&mut self, key: usize) -> Result<bool> {
        let mask = Self::key_mask(key)?;
        let changed = self.keys & mask != 0;
        self.keys &= !mask;
        Ok(changed)
    }

    fn key_mask(key: usize) -> Result<u16> {
        match key {
            0..=0xf => Ok(1 << key),
            _ => Err(Error::InvalidKey { key }),
        }
    }

    /// Gets the keypad, one bit per key
    pub fn keypad(&self) -> u16 {
        self.keys
    }

    /// Sets the state of every key at once, one bit per key
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// let mut cpu = CPU::default();
    /// cpu.set_keypad(0b1000_0000_0000_0010);
    /// assert!(cpu.release(0xf).unwrap());
    /// assert!(cpu.release(0x1).unwrap());
    /// assert_eq!(0, cpu.keypad());
    /// ```
    pub fn set_keypad(&mut self, keys: u16) -> &mut Self {
        self.keys = keys;
        self
    }

    /// Sets a general purpose register in the CPU.
    /// If the register doesn't exist, returns [Error::InvalidRegister]
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// // Create a new CPU, and set v4 to 0x41
    /// let mut cpu = CPU::default();
    /// cpu.set_v(0x4, 0x41).unwrap();
    /// assert!(cpu.set_v(0x10, 0x41).is_err());
    /// ```
    pub fn set_v(&mut self, reg: Reg, value: u8) -> Result<()> {
        if let Some(gpr) = self.v.get_mut(reg) {
            *gpr = value;
            Ok(())
        } else {
            Err(Error::InvalidRegister { reg })
        }
    }

    /// Gets a slice of the entire general purpose registers
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// // Create a new CPU, and set v0 to 0x41
    /// let mut cpu = CPU::default();
    /// cpu.set_v(0x0, 0x41).unwrap();
    /// assert_eq!(
    ///     cpu.v(),
    ///     [0x41, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
    /// )
    /// ```
    pub fn v(&self) -> &[u8] {
        self.v.as_slice()
    }

    /// Gets the program counter
    pub fn pc(&self) -> Adr {
        self.pc
    }

    /// Sets the program counter
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// let mut cpu = CPU::default();
    /// cpu.load(&[0x00, 0x00, 0x61, 0x07]).unwrap();
    /// // skip the undecodable word at 0x200
    /// cpu.set_pc(0x202).execute(&mut rand::thread_rng()).unwrap();
    /// assert_eq!(0x07, cpu.v()[1]);
    /// assert_eq!(0x204, cpu.pc());
    /// ```
    pub fn set_pc(&mut self, pc: Adr) -> &mut Self {
        self.pc = pc;
        self
    }

    /// Gets the I register
    pub fn i(&self) -> Adr {
        self.i
    }

    /// Gets the stack pointer: the number of return addresses on the stack
    pub fn sp(&self) -> usize {
        self.sp
    }

    /// Gets the return addresses on the stack, oldest first
    pub fn stack(&self) -> &[Adr] {
        &self.stack[..self.sp]
    }

    /// Gets the value in the Sound Timer register
    pub fn sound(&self) -> u8 {
        self.sound
    }

    /// Gets the value in the Delay Timer register
    pub fn delay(&self) -> u8 {
        self.delay
    }

    /// Gets the number of instructions the CPU has executed
    pub fn cycle(&self) -> usize {
        self.cycle
    }

    /// Gets the CPU's memory
    pub fn mem(&self) -> &Mem {
        &self.mem
    }

    /// Gets the CPU's memory, mutably
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// let mut cpu = CPU::default();
    /// // patch in `ld v2, 0x99`
    /// cpu.mem_mut().write(0x200, 0x62);
    /// cpu.mem_mut().write(0x201, 0x99);
    /// cpu.execute(&mut rand::thread_rng()).unwrap();
    /// assert_eq!(0x99, cpu.v()[2]);
    /// ```
    pub fn mem_mut(&mut self) -> &mut Mem {
        &mut self.mem
    }

    /// Gets the screen
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Gets the raw video buffer: 64×32 bytes, each `0` or `1`
    pub fn video(&self) -> &[u8] {
        self.screen.as_slice()
    }

    /// Reports whether the CPU is running or halted
    pub fn state(&self) -> State {
        self.flags.state()
    }

    /// Counts the timers down by one, stopping at zero.
    ///
    /// Calls [Peripherals::stop_tone] when the sound timer reaches zero.
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// let mut cpu = CPU::default();
    /// cpu.step_timers(&mut rand::thread_rng());
    /// assert_eq!(0, cpu.delay());
    /// ```
    pub fn step_timers(&mut self, io: &mut impl Peripherals) -> &mut Self {
        self.delay = self.delay.saturating_sub(1);
        if self.sound > 0 {
            self.sound -= 1;
            if self.sound == 0 {
                io.stop_tone();
            }
        }
        self
    }

    /// Runs a single instruction, even if the CPU is paused,
    /// then counts the timers down once.
    ///
    /// Like with [CPU::execute], this returns [Error::UnknownOpcode]
    /// if the instruction can't be decoded.
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// let mut cpu = CPU::default();
    /// cpu.load(&[
    ///     0x00, 0xe0, // cls
    ///     0x12, 0x02, // jump 0x202 (pc)
    /// ]).unwrap();
    /// cpu.flags.pause = true;
    /// cpu.singlestep(&mut rand::thread_rng()).unwrap();
    /// assert_eq!(0x202, cpu.pc());
    /// assert_eq!(1, cpu.cycle());
    /// assert_eq!(State::Halted, cpu.state());
    /// ```
    pub fn singlestep(&mut self, io: &mut impl Peripherals) -> Result<&mut Self> {
        let paused = self.flags.pause;
        self.flags.pause = false;
        let result = self.execute(io).map(|_| ());
        self.flags.pause |= paused;
        result?;
        Ok(self.step_timers(io))
    }

    /// Runs up to `steps` instructions, stopping at the first error.
    ///
    /// Does not touch the timers.
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// let mut cpu = CPU::default();
    /// cpu.load(&[
    ///     0x00, 0xe0, // cls
    ///     0x12, 0x02, // jump 0x202 (pc)
    /// ]).unwrap();
    /// cpu.multistep(&mut rand::thread_rng(), 0x20)
    ///     .expect("The program should only have valid opcodes.");
    /// assert_eq!(0x202, cpu.pc());
    /// assert_eq!(0x20, cpu.cycle());
    /// ```
    pub fn multistep(&mut self, io: &mut impl Peripherals, steps: usize) -> Result<&mut Self> {
        for _ in 0..steps {
            self.execute(io)?;
        }
        Ok(self)
    }

    /// Executes a single instruction.
    ///
    /// Does nothing while the CPU is paused.
    ///
    /// Returns [Error::UnknownOpcode] if the instruction at `pc` can't be decoded, or
    /// [Error::StackOverflow]/[Error::StackUnderflow] if a call or return can't be
    /// carried out. Either way the CPU halts with `pc` left on the offending instruction.
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// let mut cpu = CPU::default();
    /// cpu.load(&[
    ///     0x00, 0xe0, // cls
    ///     0x12, 0x02, // jump 0x202 (pc)
    /// ]).unwrap();
    /// cpu.execute(&mut rand::thread_rng())
    ///     .expect("0x00e0 (cls) should be a valid opcode.");
    /// assert_eq!(0x202, cpu.pc());
    /// assert_eq!(1, cpu.cycle());
    /// ```
    /// Returns [Error::UnknownOpcode] if the instruction is not implemented.
    /// ```rust
    /// # use chip8vm::*;
    /// let mut cpu = CPU::default();
    /// # cpu.flags.debug = true; // enable live disassembly
    /// cpu.load(&[
    ///     0xff, 0xff, // invalid!
    ///     0x12, 0x02, // jump 0x202 (pc)
    /// ]).unwrap();
    /// dbg!(cpu.execute(&mut rand::thread_rng()))
    ///     .expect_err("Should return Error::UnknownOpcode { 0xffff }");
    /// assert_eq!(0x200, cpu.pc());
    /// assert_eq!(State::Halted, cpu.state());
    /// ```
    pub fn execute(&mut self, io: &mut impl Peripherals) -> Result<&mut Self> {
        // Do nothing if paused
        if self.flags.pause {
            return Ok(self);
        }
        // fetch opcode
        let (addr, word) = (self.pc, self.mem.read_word(self.pc));

        // Print opcode disassembly:
        if self.flags.debug {
            std::println!(
                "{:3} {:03x}: {:<36}",
                self.cycle.bright_black(),
                addr,
                self.disassembler.once(word)
            );
        }

        // decode opcode
        let insn = match Insn::decode(&word.to_be_bytes()) {
            Ok((_, insn)) => insn,
            Err(_) => {
                self.flags.pause = true;
                return Err(Error::UnknownOpcode { word, addr });
            }
        };
        if let Err(e) = self.dispatch(insn, io) {
            self.flags.pause = true;
            return Err(e);
        }
        self.cycle += 1;
        Ok(self)
    }

    /// Dumps the current state of all CPU registers, and the cycle count
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// let mut cpu = CPU::default();
    /// cpu.dump();
    /// ```
    /// outputs
    /// ```text
    /// PC: 0200, SP: 0, I: 0000
    /// v0: 00 v1: 00 v2: 00 v3: 00
    /// v4: 00 v5: 00 v6: 00 v7: 00
    /// v8: 00 v9: 00 vA: 00 vB: 00
    /// vC: 00 vD: 00 vE: 00 vF: 00
    /// DLY: 0, SND: 0, CYC:      0
    /// ```
    pub fn dump(&self) {
        std::println!(
            "PC: {:04x}, SP: {}, I: {:04x}\n{}DLY: {}, SND: {}, CYC: {:6}",
            self.pc,
            self.sp,
            self.i,
            self.v
                .into_iter()
                .enumerate()
                .map(|(i, gpr)| {
                    format!(
                        "v{i:X}: {gpr:02x} {}",
                        match i % 4 {
                            3 => "\n",
                            _ => "",
                        }
                    )
                })
                .collect::<String>(),
            self.delay,
            self.sound,
            self.cycle,
        );
    }
}

impl Debug for CPU {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CPU")
            .field("flags", &self.flags)
            .field("mem", &self.mem)
            .field("screen", &self.screen)
            .field("stack", &self.stack())
            .field("pc", &self.pc)
            .field("i", &self.i)
            .field("v", &self.v)
            .field("delay", &self.delay)
            .field("sound", &self.sound)
            .field("keys", &format_args!("{:016b}", self.keys))
            .field("cycle", &self.cycle)
            .finish_non_exhaustive()
    }
}

impl Default for CPU {
    /// Constructs a new, initialized CPU with debug mode OFF
    ///
    /// | value  | default | description
    /// |--------|---------|------------
    /// | font   |`0x0000` | Location of font memory.
    /// | pc     |`0x0200` | Start location.
    ///
    /// # Examples
    /// ```rust
    /// use chip8vm::*;
    /// let mut cpu = CPU::default();
    /// ```
    fn default() -> Self {
        Self::new()
    }
}
