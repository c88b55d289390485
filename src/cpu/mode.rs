// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Selects a preset [Quirks] set for the [super::CPU]

use super::Quirks;
use crate::error::Error;
use std::str::FromStr;

/// Names the interpreter a program was written for
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// Cosmac VIP interpreter
    #[default]
    Chip8,
    /// Chip-48 and Super-Chip interpreters
    SChip,
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chip8" | "chip-8" | "vip" => Ok(Mode::Chip8),
            "schip" | "superchip" | "chip48" | "chip-48" => Ok(Mode::SChip),
            _ => Err(Error::InvalidMode {
                mode: s.to_string(),
            }),
        }
    }
}

impl From<Mode> for Quirks {
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// let quirks: Quirks = "schip".parse::<Mode>().unwrap().into();
    /// assert!(quirks.shift_uses_x_register);
    /// assert!(!quirks.logical_ops_clear_vf);
    /// ```
    fn from(value: Mode) -> Self {
        match value {
            Mode::Chip8 => Quirks {
                clip_sprites: true,
                ..false.into()
            },
            Mode::SChip => true.into(),
        }
    }
}
