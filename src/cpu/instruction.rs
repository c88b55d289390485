// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)
#![allow(clippy::bad_bit_mask)]
//! Contains the definition of a Chip-8 [Insn]

pub mod disassembler;

use imperative_rs::InstructionSet;
use std::fmt::Display;

/// A decoded Chip-8 instruction.
///
/// In the opcode patterns, lowercase hex digits must match exactly; `x` and `y` name
/// registers, `n` is a nibble, `BB` a byte, and `AAA` an address.
#[allow(non_camel_case_types, non_snake_case, missing_docs)]
#[derive(Clone, Copy, Debug, InstructionSet, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Insn {
    /// | 00e0 | Clear the screen
    #[opcode = "0x00e0"]
    cls,
    /// | 00ee | Return from subroutine
    #[opcode = "0x00ee"]
    ret,
    /// | 1aaa | Jump to an absolute address
    #[opcode = "0x1AAA"]
    jp { A: u16 },
    /// | 2aaa | Push pc onto the stack, then jump to a
    #[opcode = "0x2AAA"]
    call { A: u16 },
    /// | 3xbb | Skip next instruction if vX == b
    #[opcode = "0x3xBB"]
    seb { B: u8, x: usize },
    /// | 4xbb | Skip next instruction if vX != b
    #[opcode = "0x4xBB"]
    sneb { B: u8, x: usize },
    /// | 5xy0 | Skip next instruction if vX == vY
    #[opcode = "0x5xy0"]
    se { y: usize, x: usize },
    /// | 6xbb | vX = b
    #[opcode = "0x6xBB"]
    ldb { B: u8, x: usize },
    /// | 7xbb | vX += b, without carry
    #[opcode = "0x7xBB"]
    addb { B: u8, x: usize },
    /// | 8xy0 | vX = vY
    #[opcode = "0x8xy0"]
    ld { y: usize, x: usize },
    /// | 8xy1 | vX |= vY
    #[opcode = "0x8xy1"]
    or { y: usize, x: usize },
    /// | 8xy2 | vX &= vY
    #[opcode = "0x8xy2"]
    and { y: usize, x: usize },
    /// | 8xy3 | vX ^= vY
    #[opcode = "0x8xy3"]
    xor { y: usize, x: usize },
    /// | 8xy4 | vX += vY, vF = carry
    #[opcode = "0x8xy4"]
    add { y: usize, x: usize },
    /// | 8xy5 | vX -= vY, vF = !borrow
    #[opcode = "0x8xy5"]
    sub { y: usize, x: usize },
    /// | 8xy6 | vX = vY >> 1 (or vX >> 1), vF = bit shifted out
    #[opcode = "0x8xy6"]
    shr { y: usize, x: usize },
    /// | 8xy7 | vX = vY - vX, vF = !borrow
    #[opcode = "0x8xy7"]
    subn { y: usize, x: usize },
    /// | 8xyE | vX = vY << 1 (or vX << 1), vF = bit shifted out
    #[opcode = "0x8xye"]
    shl { y: usize, x: usize },
    /// | 9xy0 | Skip next instruction if vX != vY
    #[opcode = "0x9xy0"]
    sne { y: usize, x: usize },
    /// | Aaaa | I = a
    #[opcode = "0xaAAA"]
    ldi { A: u16 },
    /// | Baaa | Jump to a + v0
    #[opcode = "0xbAAA"]
    jpr { A: u16 },
    /// | Cxbb | vX = random & b
    #[opcode = "0xcxBB"]
    rnd { B: u8, x: usize },
    /// | Dxyn | Draw the n-byte sprite at I to (vX, vY), vF = collision
    #[opcode = "0xdxyn"]
    drw { y: usize, x: usize, n: u8 },
    /// | Ex9E | Skip next instruction if key vX is down
    #[opcode = "0xex9e"]
    skp { x: usize },
    /// | ExA1 | Skip next instruction if key vX is up
    #[opcode = "0xexa1"]
    sknp { x: usize },
    /// | Fx07 | vX = DT
    #[opcode = "0xfx07"]
    lddt { x: usize },
    /// | Fx0A | Wait for a key to be released, then vX = key
    #[opcode = "0xfx0a"]
    ldk { x: usize },
    /// | Fx15 | DT = vX
    #[opcode = "0xfx15"]
    setdt { x: usize },
    /// | Fx18 | ST = vX
    #[opcode = "0xfx18"]
    setst { x: usize },
    /// | Fx1E | I += vX
    #[opcode = "0xfx1e"]
    addi { x: usize },
    /// | Fx29 | I = address of the font glyph for vX
    #[opcode = "0xfx29"]
    font { x: usize },
    /// | Fx33 | Store the decimal digits of vX at I, I+1, I+2
    #[opcode = "0xfx33"]
    bcd { x: usize },
    /// | Fx55 | Store v0..=vX at I
    #[opcode = "0xfx55"]
    stor { x: usize },
    /// | Fx65 | Load v0..=vX from I
    #[opcode = "0xfx65"]
    load { x: usize },
}

impl Display for Insn {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Insn::cls               => write!(f, "CLS"),
            Insn::ret               => write!(f, "RET"),
            Insn::jp { A }          => write!(f, "JP   0x{A:03x}"),
            Insn::call { A }        => write!(f, "CALL 0x{A:03x}"),
            Insn::seb { B, x }      => write!(f, "SE   V{x:X}, 0x{B:02x}"),
            Insn::sneb { B, x }     => write!(f, "SNE  V{x:X}, 0x{B:02x}"),
            Insn::se { y, x }       => write!(f, "SE   V{x:X}, V{y:X}"),
            Insn::ldb { B, x }      => write!(f, "LD   V{x:X}, 0x{B:02x}"),
            Insn::addb { B, x }     => write!(f, "ADD  V{x:X}, 0x{B:02x}"),
            Insn::ld { y, x }       => write!(f, "LD   V{x:X}, V{y:X}"),
            Insn::or { y, x }       => write!(f, "OR   V{x:X}, V{y:X}"),
            Insn::and { y, x }      => write!(f, "AND  V{x:X}, V{y:X}"),
            Insn::xor { y, x }      => write!(f, "XOR  V{x:X}, V{y:X}"),
            Insn::add { y, x }      => write!(f, "ADD  V{x:X}, V{y:X}"),
            Insn::sub { y, x }      => write!(f, "SUB  V{x:X}, V{y:X}"),
            Insn::shr { y, x }      => write!(f, "SHR  V{x:X}, V{y:X}"),
            Insn::subn { y, x }     => write!(f, "SUBN V{x:X}, V{y:X}"),
            Insn::shl { y, x }      => write!(f, "SHL  V{x:X}, V{y:X}"),
            Insn::sne { y, x }      => write!(f, "SNE  V{x:X}, V{y:X}"),
            Insn::ldi { A }         => write!(f, "LD   I, 0x{A:03x}"),
            Insn::jpr { A }         => write!(f, "JP   V0, 0x{A:03x}"),
            Insn::rnd { B, x }      => write!(f, "RND  V{x:X}, 0x{B:02x}"),
            Insn::drw { y, x, n }   => write!(f, "DRW  V{x:X}, V{y:X}, {n}"),
            Insn::skp { x }         => write!(f, "SKP  V{x:X}"),
            Insn::sknp { x }        => write!(f, "SKNP V{x:X}"),
            Insn::lddt { x }        => write!(f, "LD   V{x:X}, DT"),
            Insn::ldk { x }         => write!(f, "LD   V{x:X}, K"),
            Insn::setdt { x }       => write!(f, "LD   DT, V{x:X}"),
            Insn::setst { x }       => write!(f, "LD   ST, V{x:X}"),
            Insn::addi { x }        => write!(f, "ADD  I, V{x:X}"),
            Insn::font { x }        => write!(f, "LD   F, V{x:X}"),
            Insn::bcd { x }         => write!(f, "LD   B, V{x:X}"),
            Insn::stor { x }        => write!(f, "LD   [I], V{x:X}"),
            Insn::load { x }        => write!(f, "LD   V{x:X}, [I]"),
        }
    }
}
