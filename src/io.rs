// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! The outside world, as far as the [CPU](crate::CPU) is concerned

use rand::{
    rngs::{StdRng, ThreadRng},
    Rng,
};

/// Things the [CPU](crate::CPU) asks of its host while running.
///
/// Any [ThreadRng] or [StdRng] will do when there's no speaker to switch off.
/// # Examples
/// ```rust
/// # use chip8vm::*;
/// struct Speaker {
///     playing: bool,
/// }
///
/// impl Peripherals for Speaker {
///     fn random_byte(&mut self) -> u8 {
///         4 // chosen by fair dice roll
///     }
///     fn stop_tone(&mut self) {
///         self.playing = false;
///     }
/// }
/// ```
pub trait Peripherals {
    /// Returns a uniformly distributed byte. Called once per `Cxbb`.
    fn random_byte(&mut self) -> u8;

    /// Called when the sound timer counts down to zero
    fn stop_tone(&mut self) {}
}

impl Peripherals for ThreadRng {
    fn random_byte(&mut self) -> u8 {
        self.gen()
    }
}

impl Peripherals for StdRng {
    fn random_byte(&mut self) -> u8 {
        self.gen()
    }
}
