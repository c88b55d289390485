// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Represents flags that aid in implementation but aren't a part of the Chip-8 machine

use super::Quirks;

/// Whether the [CPU](super::CPU) will execute instructions
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum State {
    /// Instructions execute normally
    Running,
    /// Paused by the user, or stopped on a fault
    Halted,
}

/// Represents flags that aid in operation, but aren't inherent to the CPU
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Flags {
    /// Set when debug (live disassembly) mode enabled
    pub debug: bool,
    /// Set when the emulator is paused by the user, or has faulted, and should not update
    pub pause: bool,
    /// Represents the set of emulator [Quirks] to enable
    pub quirks: Quirks,
}

impl Flags {
    /// Toggles debug mode
    ///
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// let mut cpu = CPU::default();
    /// assert_eq!(false, cpu.flags.debug);
    /// // Toggle debug mode
    /// cpu.flags.debug();
    /// assert_eq!(true, cpu.flags.debug);
    /// ```
    pub fn debug(&mut self) {
        self.debug = !self.debug
    }

    /// Toggles pause
    ///
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// let mut cpu = CPU::default();
    /// assert_eq!(State::Running, cpu.state());
    /// // Pause the cpu
    /// cpu.flags.pause();
    /// assert_eq!(State::Halted, cpu.state());
    /// ```
    pub fn pause(&mut self) {
        self.pause = !self.pause
    }

    /// Gets the [State] these flags describe
    pub fn state(&self) -> State {
        match self.pause {
            true => State::Halted,
            false => State::Running,
        }
    }
}
