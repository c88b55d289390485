// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Stores and displays the Chip-8's screen memory

use std::fmt::{Debug, Display, Formatter, Result};

/// Width of the screen, in pixels
pub const WIDTH: usize = 64;
/// Height of the screen, in pixels
pub const HEIGHT: usize = 32;

/// The monochrome framebuffer, one byte per pixel, row-major.
///
/// Every pixel is either `0` or `1`.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Screen {
    #[cfg_attr(feature = "serde", serde(with = "crate::cpu::mem::byte_array"))]
    pixels: [u8; WIDTH * HEIGHT],
}

impl Screen {
    /// Constructs a blank screen
    pub fn new() -> Self {
        Screen {
            pixels: [0; WIDTH * HEIGHT],
        }
    }

    /// Turns every pixel off
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Gets the pixel at (x, y). Anything off-screen is dark.
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// let mut screen = Screen::new();
    /// screen.toggle(3, 4);
    /// assert!(screen.pixel(3, 4));
    /// assert!(!screen.pixel(64, 4));
    /// ```
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < WIDTH && y < HEIGHT && self.pixels[y * WIDTH + x] != 0
    }

    /// Flips the pixel at (x, y), returning true if it was lit beforehand.
    ///
    /// Coordinates must already be on-screen; anything else is ignored.
    /// # Examples
    /// ```rust
    /// # use chip8vm::*;
    /// let mut screen = Screen::new();
    /// assert!(!screen.toggle(0, 0)); // off -> on
    /// assert!(screen.toggle(0, 0)); // on -> off: collision
    /// ```
    pub fn toggle(&mut self, x: usize, y: usize) -> bool {
        if x >= WIDTH || y >= HEIGHT {
            return false;
        }
        let pixel = &mut self.pixels[y * WIDTH + x];
        *pixel ^= 1;
        *pixel == 0
    }

    /// Gets the raw framebuffer
    pub fn as_slice(&self) -> &[u8] {
        self.pixels.as_slice()
    }

    /// Iterates over the rows of the screen, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.pixels.chunks_exact(WIDTH)
    }

    /// Counts the lit pixels
    pub fn lit(&self) -> usize {
        self.pixels.iter().filter(|&&px| px != 0).count()
    }

    /// Prints the screen to stdout
    pub fn print_screen(&self) {
        // draw with the drawille library, if available
        #[cfg(feature = "drawille")]
        {
            use drawille::Canvas;
            let mut canvas = Canvas::new(WIDTH as u32, HEIGHT as u32);
            self.pixels
                .iter()
                .enumerate()
                .filter(|(_, &px)| px != 0)
                .for_each(|(index, _)| {
                    canvas.set((index % WIDTH) as u32, (index / WIDTH) as u32)
                });
            println!("{}", canvas.frame());
        }
        #[cfg(not(feature = "drawille"))]
        println!("{self}");
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Screen {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("Screen")
            .field("lit", &self.lit())
            .finish_non_exhaustive()
    }
}

impl Display for Screen {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for row in self.rows() {
            let line: String = row
                .iter()
                .map(|&px| if px != 0 { '#' } else { ' ' })
                .collect();
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

impl From<&[u8]> for Screen {
    /// Builds a screen from a one-byte-per-pixel dump, ignoring anything past the end
    fn from(value: &[u8]) -> Self {
        let mut screen = Screen::new();
        for (pixel, &byte) in screen.pixels.iter_mut().zip(value) {
            *pixel = (byte != 0).into();
        }
        screen
    }
}
