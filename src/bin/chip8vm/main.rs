// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! chip8vm: runs a Chip-8 program headless, then shows what it drew
//!
//! Instructions and timer ticks are issued at their own rates,
//! paced against the wall clock one frame at a time.


use chip8vm::{error::Result, *};
use gumdrop::*;
use owo_colors::OwoColorize;
use rand::{rngs::StdRng, SeedableRng};
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

pub fn main() -> Result<()> {
    let options = Arguments::parse_args_default_or_exit();
    let mut state = State::new(options)?;
    for result in &mut state {
        if let Err(e) = result {
            eprintln!("{}", e.bold().red());
            break;
        }
    }
    state.ch8.cpu.screen().print_screen();
    state.ch8.cpu.dump();
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Options, Hash)]
struct Arguments {
    #[options(help = "Load a ROM to run.", required, free)]
    pub file: PathBuf,
    #[options(help = "Print this help message.")]
    help: bool,
    #[options(help = "Enable debug mode at startup.")]
    pub debug: bool,
    #[options(help = "Start paused, and single-step once per frame.")]
    pub pause: bool,

    #[options(help = "Set the instructions-per-second rate.", default = "540", meta = "IPS")]
    pub speed: u64,
    #[options(help = "Set the timer rate, in Hz.", default = "60", meta = "HZ")]
    pub timer_rate: u64,
    #[options(help = "Set the target framerate.", default = "60", meta = "FR")]
    pub frame_rate: u64,
    #[options(help = "Stop after this many frames.", meta = "N")]
    pub frames: Option<usize>,
    #[options(help = "Seed the random number generator.", no_short, meta = "SEED")]
    pub seed: Option<u64>,

    #[options(help = "Run in (Chip8, SChip) mode. If unspecified, sprites wrap and I is left alone.")]
    pub mode: Option<Mode>,

    #[options(
        short = "z",
        help = "Flip whether vF is set to 0 after a bitwise operation."
    )]
    pub vfreset: bool,
    #[options(
        short = "c",
        help = "Flip whether DMA instructions leave I past the last byte moved."
    )]
    pub memory: bool,
    #[options(
        short = "v",
        help = "Flip whether bit-shifts read vX instead of vY."
    )]
    pub shift: bool,
    #[options(
        short = "b",
        help = "Flip whether indexed jumps are relative to v[adr] instead of v0."
    )]
    pub jumping: bool,
    #[options(
        short = "w",
        help = "Flip whether sprites are clipped at the screen edges instead of wrapping."
    )]
    pub wrap: bool,

    #[options(
        help = "Hold down these keys for the whole run.",
        parse(try_from_str = "parse_hex"),
        meta = "KEY"
    )]
    pub key: Vec<u16>,
}

impl Arguments {
    /// The [Mode] preset (or [Quirks::default]), with each flip flag applied
    fn quirks(&self) -> Quirks {
        let mut quirks = self.mode.map_or_else(Quirks::default, Into::into);
        // Flip the state of the quirks
        quirks.logical_ops_clear_vf ^= self.vfreset;
        quirks.load_store_increments_i ^= self.memory;
        quirks.shift_uses_x_register ^= self.shift;
        quirks.jump_uses_vx ^= self.jumping;
        quirks.clip_sprites ^= self.wrap;
        quirks
    }
}

/// Parses a hexadecimal string into a u16
fn parse_hex(value: &str) -> std::result::Result<u16, std::num::ParseIntError> {
    u16::from_str_radix(value, 16)
}

/// The host side of the [Peripherals]: a seedable rng, and a speaker that can only be stopped
#[derive(Debug)]
pub struct Host {
    pub rng: StdRng,
    pub tones: usize,
}

impl Host {
    pub fn new(seed: Option<u64>) -> Self {
        Host {
            rng: match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            },
            tones: 0,
        }
    }
}

impl Peripherals for Host {
    fn random_byte(&mut self) -> u8 {
        self.rng.random_byte()
    }
    fn stop_tone(&mut self) {
        self.tones += 1;
    }
}

/// Turns elapsed time into a whole number of events at a fixed rate.
///
/// The fraction left over carries into the next call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacer {
    rate: u64,
    debt: u128,
}

impl Pacer {
    pub fn new(rate: u64) -> Self {
        Pacer { rate, debt: 0 }
    }
    /// Returns how many events are owed after `elapsed` more time
    pub fn owed(&mut self, elapsed: Duration) -> usize {
        self.debt += elapsed.as_nanos() * self.rate as u128;
        let owed = self.debt / 1_000_000_000;
        self.debt %= 1_000_000_000;
        owed as usize
    }
}

#[derive(Debug)]
pub struct Chip8 {
    pub cpu: CPU,
    pub host: Host,
}

#[derive(Debug)]
struct State {
    pub ch8: Chip8,
    pub insns: Pacer,
    pub timers: Pacer,
    pub rate: u64,
    pub frame: usize,
    pub frames: Option<usize>,
    pub ft: Instant,
}

impl State {
    fn new(options: Arguments) -> Result<Self> {
        let mut cpu = CPU::new();
        cpu.load_program(&options.file)?;
        cpu.flags = Flags {
            quirks: options.quirks(),
            debug: options.debug,
            pause: options.pause,
        };
        for key in options.key {
            cpu.press(key as usize)?;
        }
        Ok(State {
            ch8: Chip8 {
                cpu,
                host: Host::new(options.seed),
            },
            insns: Pacer::new(options.speed),
            timers: Pacer::new(options.timer_rate),
            rate: options.frame_rate.max(1),
            frame: 0,
            frames: options.frames,
            ft: Instant::now(),
        })
    }
    fn tick(&mut self, elapsed: Duration) -> Result<()> {
        let Chip8 { cpu, host } = &mut self.ch8;
        let (insns, timers) = (self.insns.owed(elapsed), self.timers.owed(elapsed));
        if cpu.flags.pause {
            cpu.singlestep(host)?;
            return Ok(());
        }
        cpu.multistep(host, insns)?;
        for _ in 0..timers {
            cpu.step_timers(host);
        }
        Ok(())
    }
    fn wait_for_next_frame(&mut self) -> Duration {
        let rate = Duration::from_nanos(1_000_000_000 / self.rate + 1);
        std::thread::sleep(rate.saturating_sub(self.ft.elapsed()));
        self.ft += rate;
        rate
    }
}

impl Iterator for State {
    type Item = Result<()>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.frames.is_some_and(|limit| self.frame >= limit) {
            return None;
        }
        let elapsed = self.wait_for_next_frame();
        self.frame += 1;
        Some(self.tick(elapsed))
    }
}
