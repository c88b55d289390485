// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! chip8vm-disasm: prints `addr: mnemonic word` for every word of a ROM

use chip8vm::{error::Result, *};
use gumdrop::*;
use owo_colors::OwoColorize;
use std::{fs::read, path::PathBuf};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Options, Hash)]
struct Arguments {
    #[options(help = "Show help text")]
    help: bool,
    #[options(help = "Load a ROM to disassemble", free, required)]
    pub file: PathBuf,
    #[options(
        help = "Load address (default 200)",
        default = "200",
        parse(try_from_str = "parse_hex")
    )]
    pub loadaddr: u16,
    #[options(help = "Start disassembling at offset...")]
    pub offset: usize,
    #[options(help = "Don't emit color codes")]
    pub plain: bool,
}

fn parse_hex(value: &str) -> std::result::Result<u16, std::num::ParseIntError> {
    u16::from_str_radix(value, 16)
}

fn main() -> Result<()> {
    let options = Arguments::parse_args_default_or_exit();
    let contents = &read(&options.file)?;
    let disassembler = if options.plain { Dis::plain() } else { Dis::default() };
    let start = options.loadaddr as usize + options.offset;
    let (words, tail) = split_words(contents.get(options.offset..).unwrap_or_default());
    for (addr, &insn) in words.iter().enumerate() {
        if options.plain {
            println!("{:03x}: {} {:04x}", start + 2 * addr, disassembler.once(insn), insn);
        } else {
            println!(
                "{:03x}: {} {:04x}",
                start + 2 * addr,
                disassembler.once(insn),
                insn.bright_black(),
            );
        }
    }
    // odd trailing byte
    if let Some(byte) = tail {
        println!("{:03x}: {:02x}", start + 2 * words.len(), byte);
    }
    Ok(())
}

/// Splits a ROM into big-endian words, and the last byte if the length is odd
fn split_words(bytes: &[u8]) -> (Vec<u16>, Option<u8>) {
    let words = bytes.chunks_exact(2);
    let tail = words.remainder().first().copied();
    (words.map(|w| u16::from_be_bytes([w[0], w[1]])).collect(), tail)
}
