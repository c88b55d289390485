// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! This crate implements the core of a Chip-8 interpreter: the machine state,
//! the instruction decoder, and the handlers for every base Chip-8 instruction.
//!
//! There is no clock, window, or audio in here. Whatever drives the [CPU]
//! decides how often to call [CPU::execute] and [CPU::step_timers], reads the
//! [Screen] when it wants to draw, and feeds keys in with [CPU::press] and
//! [CPU::release].
//!
//! ```rust
//! # use chip8vm::*;
//! # fn main() -> Result<()> {
//! let mut cpu = CPU::new();
//! cpu.load(&[
//!     0x60, 0x05, // mov #05, v0
//!     0xf0, 0x29, // font v0, I
//!     0xd0, 0x05, // draw #5, v0, v0
//! ])?;
//! cpu.multistep(&mut rand::thread_rng(), 3)?;
//! assert_eq!(0x206, cpu.pc());
//! # Ok(())
//! # }
//! ```

pub mod cpu;
pub mod error;
pub mod io;
pub mod screen;

pub use cpu::{
    flags::{Flags, State},
    instruction::{
        disassembler::{Dis, Disassembler},
        Insn,
    },
    mem::{Mem, Region},
    mode::Mode,
    quirks::Quirks,
    CPU,
};
pub use error::{Error, Result};
pub use io::Peripherals;
pub use screen::Screen;

/// Common imports for chip8vm
pub mod prelude {
    use super::*;
    pub use cpu::{
        flags::{Flags, State},
        instruction::disassembler::{Dis, Disassembler},
        mem::Region::*,
        CPU,
    };
    pub use error::{Error, Result};
    pub use io::Peripherals;
    pub use screen::{Screen, HEIGHT, WIDTH};
}
