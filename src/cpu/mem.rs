// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! The Mem represents the CPU's memory
//!
//! Contains some handy utils for reading and writing

use crate::error::{Error, Result};
use std::{
    fmt::{Debug, Display, Formatter},
    ops::Range,
};

/// Size of the address space, in bytes
pub const MEMORY_SIZE: usize = 0x1000;
/// Where programs are loaded, and where execution starts
pub const PROGRAM_START: u16 = 0x200;
/// Where the built-in font lives
pub const FONT_START: u16 = 0x000;

/// The built-in hexadecimal font: 16 glyphs, 5 bytes each
pub const FONT: [u8; 80] = [
    0xf0, 0x90, 0x90, 0x90, 0xf0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xf0, 0x10, 0xf0, 0x80, 0xf0, // 2
    0xf0, 0x10, 0xf0, 0x10, 0xf0, // 3
    0x90, 0x90, 0xf0, 0x10, 0x10, // 4
    0xf0, 0x80, 0xf0, 0x10, 0xf0, // 5
    0xf0, 0x80, 0xf0, 0x90, 0xf0, // 6
    0xf0, 0x10, 0x20, 0x40, 0x40, // 7
    0xf0, 0x90, 0xf0, 0x90, 0xf0, // 8
    0xf0, 0x90, 0xf0, 0x10, 0xf0, // 9
    0xf0, 0x90, 0xf0, 0x90, 0x90, // A
    0xe0, 0x90, 0xe0, 0x90, 0xe0, // B
    0xf0, 0x80, 0x80, 0x80, 0xf0, // C
    0xe0, 0x90, 0x90, 0x90, 0xe0, // D
    0xf0, 0x80, 0xf0, 0x80, 0xf0, // E
    0xf0, 0x80, 0xf0, 0x80, 0x80, // F
];

/// Represents a named region in memory
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Region {
    /// Character ROM (but writable!)
    Charset,
    /// Program memory
    Program,
}

impl Region {
    /// Gets the address range covered by this region
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// assert_eq!(0x000..0x050, Region::Charset.range());
    /// assert_eq!(0x200..0x1000, Region::Program.range());
    /// ```
    pub const fn range(self) -> Range<usize> {
        match self {
            Region::Charset => FONT_START as usize..FONT_START as usize + FONT.len(),
            Region::Program => PROGRAM_START as usize..MEMORY_SIZE,
        }
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Region::Charset => "Charset",
                Region::Program => "Program",
            }
        )
    }
}

/// 4 KiB of byte-addressed memory.
///
/// Addresses wrap at the top of memory, so every [u16] is a valid address.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mem {
    #[cfg_attr(feature = "serde", serde(with = "byte_array"))]
    memory: [u8; MEMORY_SIZE],
}

impl Mem {
    /// Constructs a zeroed Mem, with the font loaded into [Region::Charset]
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// let mem = Mem::new();
    /// assert_eq!(0xf0, mem.read(0x000));
    /// assert_eq!(0x00, mem.read(0x200));
    /// ```
    pub fn new() -> Self {
        let mut mem = Mem {
            memory: [0; MEMORY_SIZE],
        };
        mem.load_font();
        mem
    }

    /// Copies the built-in font into [Region::Charset]
    pub fn load_font(&mut self) -> &mut Self {
        self.memory[Region::Charset.range()].copy_from_slice(&FONT);
        self
    }

    /// Zeroes the whole address space, font included
    pub fn clear(&mut self) -> &mut Self {
        self.memory.fill(0);
        self
    }

    /// Reads the byte at `addr`
    #[inline(always)]
    pub fn read(&self, addr: u16) -> u8 {
        self.memory[addr as usize % MEMORY_SIZE]
    }

    /// Writes `data` to `addr`
    #[inline(always)]
    pub fn write(&mut self, addr: u16, data: u8) {
        self.memory[addr as usize % MEMORY_SIZE] = data;
    }

    /// Reads a big-endian word starting at `addr`
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// let mut mem = Mem::new();
    /// mem.write(0x200, 0x12);
    /// mem.write(0x201, 0x34);
    /// assert_eq!(0x1234, mem.read_word(0x200));
    /// ```
    #[inline(always)]
    pub fn read_word(&self, addr: u16) -> u16 {
        // Chip-8 is a big-endian system
        u16::from_be_bytes([self.read(addr), self.read(addr.wrapping_add(1))])
    }

    /// Loads data into the start of a named [Region].
    ///
    /// Returns [Error::Capacity] if `data` is longer than the region,
    /// in which case nothing is written.
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// # fn main() -> Result<()> {
    /// let mut mem = Mem::new();
    /// mem.load_region(Region::Program, b"Hello, world!")?;
    /// assert_eq!(b"Hello", &mem.get_region(Region::Program)[..5]);
    /// assert!(mem.load_region(Region::Charset, &[0; 81]).is_err());
    /// # Ok(())
    /// # }
    /// ```
    pub fn load_region(&mut self, name: Region, data: &[u8]) -> Result<&mut Self> {
        let region = self.get_region_mut(name);
        if data.len() > region.len() {
            return Err(Error::Capacity {
                len: data.len(),
                capacity: region.len(),
            });
        }
        region[..data.len()].copy_from_slice(data);
        Ok(self)
    }

    /// Fills a [Region] with zeroes
    pub fn clear_region(&mut self, name: Region) -> &mut Self {
        self.get_region_mut(name).fill(0);
        self
    }

    /// Gets a slice of a named [Region] of memory
    #[inline(always)]
    pub fn get_region(&self, name: Region) -> &[u8] {
        &self.memory[name.range()]
    }

    /// Gets a mutable slice of a named [Region] of memory
    #[inline(always)]
    pub fn get_region_mut(&mut self, name: Region) -> &mut [u8] {
        &mut self.memory[name.range()]
    }

    /// Gets the whole address space
    pub fn as_slice(&self) -> &[u8] {
        self.memory.as_slice()
    }
}

impl Default for Mem {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Mem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let used = self
            .get_region(Region::Program)
            .iter()
            .rposition(|&byte| byte != 0)
            .map_or(0, |last| last + 1);
        f.debug_struct("Mem")
            .field("program_len", &used)
            .finish_non_exhaustive()
    }
}

/// (De)serializes fixed-size byte arrays as byte strings.
///
/// serde only derives arrays up to 32 elements long.
#[cfg(feature = "serde")]
pub(crate) mod byte_array {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        bytes
            .try_into()
            .map_err(|bytes: Vec<u8>| D::Error::invalid_length(bytes.len(), &"a full memory image"))
    }
}
