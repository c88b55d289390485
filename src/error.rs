// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Error type for chip8vm

use thiserror::Error;

/// Result type, equivalent to [std::result::Result]<T, [enum@Error]>
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for chip8vm.
#[derive(Debug, Error)]
pub enum Error {
    /// The program doesn't fit between `0x200` and the top of memory
    #[error("program is {len} bytes, but only {capacity} bytes are available")]
    Capacity {
        /// Length of the rejected program
        len: usize,
        /// Bytes available for programs
        capacity: usize,
    },
    /// The word at `addr` didn't decode to any instruction
    #[error("opcode {word:04x} at {addr:03x} not recognized")]
    UnknownOpcode {
        /// The offending word
        word: u16,
        /// Where it was fetched from
        addr: u16,
    },
    /// A call was made with every stack entry in use
    #[error("stack overflow: call at {addr:03x} with a full stack")]
    StackOverflow {
        /// Address of the call instruction
        addr: u16,
    },
    /// A return was made with nothing on the stack
    #[error("stack underflow: return at {addr:03x} with an empty stack")]
    StackUnderflow {
        /// Address of the return instruction
        addr: u16,
    },
    /// Tried to press a key that doesn't exist
    #[error("tried to press key {key:X} which does not exist")]
    InvalidKey {
        /// The offending key
        key: usize,
    },
    /// Tried to get/set an out-of-bounds register
    #[error("tried to access register v{reg:X} which does not exist")]
    InvalidRegister {
        /// The offending register
        reg: usize,
    },
    /// Tried to convert string into mode, but it did not match.
    #[error("no suitable conversion of \"{mode}\" into Mode")]
    InvalidMode {
        /// The string which failed to become a mode
        mode: String,
    },
    /// Error originated in [std::io]
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}
