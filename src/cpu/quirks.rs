// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Controls the [Quirks] behavior of the CPU on a granular level.

/// Controls the quirk behavior of the CPU on a granular level.
///
/// `false` is Cosmac-VIP-like behavior
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quirks {
    /// Chip-48: Shift ops in `8xy`(`6`, `E`) read and write vX, ignoring vY
    pub shift_uses_x_register: bool,
    /// Cosmac VIP: Binary ops in `8xy`(`1`, `2`, `3`) set vF to 0
    pub logical_ops_clear_vf: bool,
    /// Cosmac VIP: `Fx55`/`Fx65` leave I at I + x + 1
    pub load_store_increments_i: bool,
    /// Chip-48: Indexed jumps go to `adr` + v`a`, where `a` is the high nibble of `adr`
    pub jump_uses_vx: bool,
    /// Sprites are cut off at the right and bottom edges, instead of wrapping around
    pub clip_sprites: bool,
}

impl From<bool> for Quirks {
    /// `true` selects every quirk that departs from the VIP, `false` none of them
    fn from(value: bool) -> Self {
        Quirks {
            shift_uses_x_register: value,
            logical_ops_clear_vf: !value,
            load_store_increments_i: !value,
            jump_uses_vx: value,
            clip_sprites: value,
        }
    }
}

impl Default for Quirks {
    /// VIP arithmetic, with wrapping sprites and an I register left alone by `Fx55`/`Fx65`
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// let quirks = Quirks::default();
    /// assert!(quirks.logical_ops_clear_vf);
    /// assert!(!quirks.shift_uses_x_register);
    /// ```
    fn default() -> Self {
        Quirks {
            shift_uses_x_register: false,
            logical_ops_clear_vf: true,
            load_store_increments_i: false,
            jump_uses_vx: false,
            clip_sprites: false,
        }
    }
}
