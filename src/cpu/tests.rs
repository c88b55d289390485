// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Unit tests for [super::CPU]
//!
//! These run instructions, and ensure their output is consistent with previous builds
//!
//! General test format:
//! 1. Prepare to do the thing
//! 2. Do the thing
//! 3. Compare the result to the expected result

use super::*;
use crate::screen::{HEIGHT, WIDTH};
use rand::{random, rngs::StdRng, SeedableRng};


/// Deterministic randomness, and a count of every time the tone was stopped
struct TestIo {
    rng: StdRng,
    stopped: usize,
}

impl Peripherals for TestIo {
    fn random_byte(&mut self) -> u8 {
        self.rng.random_byte()
    }
    fn stop_tone(&mut self) {
        self.stopped += 1;
    }
}

fn setup_environment() -> (CPU, TestIo) {
    let mut cpu = CPU {
        flags: Flags {
            debug: true,
            pause: false,
            ..Default::default()
        },
        ..CPU::default()
    };
    // jp 0x200
    cpu.load(&[0x12, 0x00]).unwrap();
    (
        cpu,
        TestIo {
            rng: StdRng::seed_from_u64(0xc8),
            stopped: 0,
        },
    )
}

/// Words which match no instruction
mod unimplemented {
    use super::*;
    fn expect_unknown(word: u16) {
        let (mut cpu, mut io) = setup_environment();
        cpu.mem.load_region(Program, &word.to_be_bytes()).unwrap();
        match cpu.execute(&mut io) {
            Err(Error::UnknownOpcode { word: w, addr }) => {
                assert_eq!(word, w);
                assert_eq!(0x200, addr);
            }
            other => panic!("{word:04x} is not an instruction, but got {other:?}"),
        }
        // halted, with pc left on the bad word
        assert_eq!(State::Halted, cpu.state());
        assert_eq!(0x200, cpu.pc);
        assert_eq!(0, cpu.cycle);
    }
    #[test]
    fn ins_0nnn() {
        expect_unknown(0x0123);
    }
    #[test]
    fn ins_5xyn() {
        expect_unknown(0x500f);
    }
    #[test]
    fn ins_8xyn() {
        expect_unknown(0x800f);
    }
    #[test]
    fn ins_9xyn() {
        expect_unknown(0x900f);
    }
    #[test]
    fn ins_exbb() {
        expect_unknown(0xe00f);
    }
    #[test]
    fn ins_fxbb() {
        expect_unknown(0xf00f);
    }
    /// A halted CPU stays put until unpaused
    #[test]
    fn stays_halted() {
        let (mut cpu, mut io) = setup_environment();
        cpu.mem.load_region(Program, &[0xff, 0xff]).unwrap();
        cpu.execute(&mut io).unwrap_err();
        cpu.execute(&mut io).unwrap();
        cpu.multistep(&mut io, 10).unwrap();
        assert_eq!(0x200, cpu.pc);
        assert_eq!(0, cpu.cycle);
    }
}

mod sys {
    use super::*;
    /// 00e0: Clears the screen memory to 0
    #[test]
    fn clear_screen() {
        let (mut cpu, _) = setup_environment();
        cpu.screen.toggle(3, 4);
        cpu.screen.toggle(63, 31);
        cpu.clear_screen();
        assert!(cpu.video().iter().all(|&pixel| pixel == 0));
        assert_eq!(0x202, cpu.pc);
    }

    /// 00ee: Returns from subroutine
    #[test]
    fn ret() {
        let test_addr = random::<u16>() & 0x7fe;
        let (mut cpu, _) = setup_environment();
        // Place the address on the stack
        cpu.stack[0] = test_addr;
        cpu.sp = 1;

        cpu.ret().unwrap();

        // Verify the current address is the instruction after the call
        assert_eq!(test_addr + 2, cpu.pc);
        assert_eq!(0, cpu.sp);
    }

    /// 00ee: Returning with nothing on the stack is an error
    #[test]
    fn ret_underflow() {
        let (mut cpu, mut io) = setup_environment();
        cpu.load(&[0x00, 0xee]).unwrap();
        match cpu.execute(&mut io) {
            Err(Error::StackUnderflow { addr }) => assert_eq!(0x200, addr),
            other => panic!("Expected StackUnderflow, got {other:?}"),
        }
        assert_eq!(State::Halted, cpu.state());
        assert_eq!(0x200, cpu.pc);
        assert_eq!(0, cpu.sp);
    }
}

/// Tests control-flow instructions
///
/// Basically anything that touches the program counter
mod cf {
    use super::*;
    /// 1aaa: Sets the program counter to an absolute address
    #[test]
    fn jump() {
        let (mut cpu, _) = setup_environment();
        // Test all valid addresses
        for addr in 0x000..0x1000 {
            // Jump to an address
            cpu.jump(addr);
            // Verify the current address is the jump target address
            assert_eq!(addr, cpu.pc);
        }
    }

    /// 2aaa: Pushes pc onto the stack, then jumps to a
    #[test]
    fn call() {
        let test_addr = random::<u16>() & 0xfff;
        let (mut cpu, _) = setup_environment();
        // Save the current address
        let curr_addr = cpu.pc;
        // Call an address
        cpu.call(test_addr).unwrap();
        // Verify the current address is the called address
        assert_eq!(test_addr, cpu.pc);
        // Verify the previous address was stored on the stack
        assert_eq!(&[curr_addr], cpu.stack());
    }

    /// 2aaa, 00ee: A call and its return land on the instruction after the call
    #[test]
    fn call_ret() {
        let (mut cpu, mut io) = setup_environment();
        cpu.load(&[
            0x22, 0x04, // 200: call 0x204
            0x00, 0x00, // 202: (never decoded)
            0x00, 0xee, // 204: ret
        ])
        .unwrap();
        cpu.execute(&mut io).unwrap();
        assert_eq!(0x204, cpu.pc);
        assert_eq!(1, cpu.sp);
        cpu.execute(&mut io).unwrap();
        assert_eq!(0x202, cpu.pc);
        assert_eq!(0, cpu.sp);
    }

    /// 2aaa: Calls nest until the stack is full
    #[test]
    fn call_overflow() {
        let (mut cpu, mut io) = setup_environment();
        // 200: call 0x200
        cpu.load(&[0x22, 0x00]).unwrap();
        cpu.multistep(&mut io, STACK_DEPTH).unwrap();
        assert_eq!(STACK_DEPTH, cpu.sp);
        assert!(cpu.stack().iter().all(|&addr| addr == 0x200));
        match cpu.execute(&mut io) {
            Err(Error::StackOverflow { addr }) => assert_eq!(0x200, addr),
            other => panic!("Expected StackOverflow, got {other:?}"),
        }
        assert_eq!(State::Halted, cpu.state());
        assert_eq!(STACK_DEPTH, cpu.sp);
        assert_eq!(STACK_DEPTH, cpu.cycle);
    }

    /// 3xbb: Skips the next instruction if register X == b
    #[test]
    fn skip_equals_immediate() {
        let (mut cpu, _) = setup_environment();
        for word in 0..=0xfff {
            let (a, b, addr) = (word as u8, (word >> 4) as u8, random::<u16>() & 0x7fe);
            for x in 0..=0xf {
                // set the PC to a random address
                cpu.pc = addr;

                cpu.v[x] = a;

                cpu.skip_equals_immediate(x, b);

                assert_eq!(cpu.pc, addr + if a == b { 4 } else { 2 });
            }
        }
    }

    /// 4xbb: Skips the next instruction if register X != b
    #[test]
    fn skip_not_equals_immediate() {
        let (mut cpu, _) = setup_environment();
        for word in 0..=0xfff {
            let (a, b, addr) = (word as u8, (word >> 4) as u8, random::<u16>() & 0x7fe);
            for x in 0..=0xf {
                cpu.pc = addr;

                cpu.v[x] = a;

                cpu.skip_not_equals_immediate(x, b);

                assert_eq!(cpu.pc, addr + if a != b { 4 } else { 2 });
            }
        }
    }

    /// 5xy0: Skips the next instruction if register X == register Y
    #[test]
    fn skip_equals() {
        let (mut cpu, _) = setup_environment();
        for word in 0..=0xfff {
            let (a, b, addr) = (word as u8, (word >> 4) as u8, random::<u16>() & 0x7fe);
            for reg in 0..=0xff {
                let (x, y) = (reg & 0xf, reg >> 4);
                if x == y {
                    continue;
                }
                cpu.pc = addr;

                (cpu.v[x], cpu.v[y]) = (a, b);

                cpu.skip_equals(x, y);

                assert_eq!(cpu.pc, addr + if a == b { 4 } else { 2 });
            }
        }
    }

    /// 9xy0: Skip next instruction if X != y
    #[test]
    fn skip_not_equals() {
        let (mut cpu, _) = setup_environment();
        for word in 0..=0xfff {
            let (a, b, addr) = (word as u8, (word >> 4) as u8, random::<u16>() & 0x7fe);
            for reg in 0..=0xff {
                let (x, y) = (reg & 0xf, reg >> 4);
                if x == y {
                    continue;
                }
                cpu.pc = addr;

                (cpu.v[x], cpu.v[y]) = (a, b);

                cpu.skip_not_equals(x, y);

                assert_eq!(cpu.pc, addr + if a != b { 4 } else { 2 });
            }
        }
    }

    /// Badr: Jump to &adr + v0
    #[test]
    fn jump_indexed() {
        let (mut cpu, _) = setup_environment();
        // For every valid address
        for addr in 0..0x1000 {
            // For a handful of offsets
            for v0 in [0, 1, 0x7f, 0xff] {
                cpu.v[0] = v0;

                cpu.jump_indexed(addr);

                assert_eq!(cpu.pc, addr + v0 as u16);
            }
        }
    }

    /// Tests [Quirks::jump_uses_vx] behavior
    #[test]
    fn jump_indexed_quirk() {
        let (mut cpu, _) = setup_environment();
        cpu.flags.quirks.jump_uses_vx = true;

        // set v[0..F] to 0123456789abcdef
        for i in 0..0x10 {
            cpu.v[i] = i as u8;
        }
        for reg in 0..0x10 {
            // attempts to jump to 0x`reg`00 + v0
            cpu.jump_indexed(reg * 0x100);
            // jumps to 0x`reg`00 + v`reg` instead
            assert_eq!(cpu.pc, reg * 0x101);
        }
    }
}

mod math {
    use super::*;
    /// 6xbb: Loads immediate byte b into register vX
    #[test]
    fn load_immediate() {
        let (mut cpu, _) = setup_environment();
        for test_register in 0x0..=0xf {
            for test_byte in 0x0..=0xff {
                cpu.load_immediate(test_register, test_byte);
                assert_eq!(cpu.v[test_register], test_byte)
            }
        }
    }

    /// 7xbb: Adds immediate byte b to register vX
    #[test]
    fn add_immediate() {
        let (mut cpu, _) = setup_environment();
        for test_register in 0x0..=0xe {
            let mut sum = 0u8;
            for test_byte in 0x0..=0xff {
                cpu.v[0xf] = 0xc5; // sentinel
                // Note: Chip-8 allows unsigned overflow
                sum = sum.wrapping_add(test_byte);

                cpu.add_immediate(test_register, test_byte);

                assert_eq!(cpu.v[test_register], sum);
                // The carry is discarded
                assert_eq!(cpu.v[0xf], 0xc5);
            }
        }
    }

    /// 7xbb: 0xFF + 0x02 wraps to 0x01
    #[test]
    fn add_immediate_wraps() {
        let (mut cpu, _) = setup_environment();
        cpu.v[3] = 0xff;
        cpu.add_immediate(3, 0x02);
        assert_eq!(0x01, cpu.v[3]);
        assert_eq!(0, cpu.v[0xf]);
        assert_eq!(0x202, cpu.pc);
    }

    /// 8xy0: Loads the value of y into x
    #[test]
    fn load_register() {
        let (mut cpu, _) = setup_environment();
        // We use zero as a sentinel value for this test, so loop from 1 to 255
        for test_value in 1..=0xff {
            for reg in 0..=0xff {
                let (x, y) = (reg & 0xf, reg >> 4);
                if x == y {
                    continue;
                }
                // Set vY to the test value
                cpu.v[y] = test_value;
                // zero X
                cpu.v[x] = 0;

                cpu.load_register(x, y);

                // verify results
                assert_eq!(cpu.v[x], test_value);
                assert_eq!(cpu.v[y], test_value);
            }
        }
    }

    mod logic {
        use super::*;

        /// Runs a logical op over a spread of inputs, with and without the vF quirk
        fn test_logic(op: fn(&mut CPU, Reg, Reg), expect: fn(u8, u8) -> u8, clears_vf: bool) {
            let (mut cpu, _) = setup_environment();
            cpu.flags.quirks.logical_ops_clear_vf = clears_vf;
            for word in 0..=0xfff {
                let (a, b) = (word as u8, (word >> 4) as u8);
                for reg in 0..=0xff {
                    let (x, y) = (reg & 0xf, reg >> 4);

                    cpu.v[0xf] = 0xc5; // sentinel
                    (cpu.v[x], cpu.v[y]) = (a, b);

                    op(&mut cpu, x, y);

                    let expected = if x == y { expect(b, b) } else { expect(a, b) };
                    if x != 0xf {
                        assert_eq!(cpu.v[x], expected);
                    }
                    if clears_vf {
                        assert_eq!(cpu.v[0xf], 0);
                    } else if x != 0xf && y != 0xf {
                        assert_eq!(cpu.v[0xf], 0xc5);
                    }
                }
            }
        }

        /// 8xy1: Performs bitwise or of vX and vY, and stores the result in vX
        #[test]
        fn or() {
            test_logic(CPU::or, |a, b| a | b, true);
        }
        /// Same test, without [Quirks::logical_ops_clear_vf]
        #[test]
        fn or_quirk() {
            test_logic(CPU::or, |a, b| a | b, false);
        }
        /// 8xy2: Performs bitwise and of vX and vY, and stores the result in vX
        #[test]
        fn and() {
            test_logic(CPU::and, |a, b| a & b, true);
        }
        /// Same test, without [Quirks::logical_ops_clear_vf]
        #[test]
        fn and_quirk() {
            test_logic(CPU::and, |a, b| a & b, false);
        }
        /// 8xy3: Performs bitwise xor of vX and vY, and stores the result in vX
        #[test]
        fn xor() {
            test_logic(CPU::xor, |a, b| a ^ b, true);
        }
        /// Same test, without [Quirks::logical_ops_clear_vf]
        #[test]
        fn xor_quirk() {
            test_logic(CPU::xor, |a, b| a ^ b, false);
        }
    }

    /// 8xy4: Performs addition of vX and vY, and stores the result in vX, carry in vF
    ///       If X is F, *only* stores carry
    #[test]
    fn add() {
        let (mut cpu, _) = setup_environment();
        for word in 0..=0xfff {
            let (a, b) = (word as u8, (word >> 4) as u8);
            for reg in 0..=0xff {
                let (x, y) = (reg & 0xf, reg >> 4);
                // If x == y, a is discarded
                let (expected, carry) = if x == y { b } else { a }.overflowing_add(b);

                (cpu.v[x], cpu.v[y]) = (a, b);

                cpu.add(x, y);

                // if the destination is vF, the result was discarded, and only the carry was kept
                if x != 0xf {
                    assert_eq!(cpu.v[x], expected);
                }
                assert_eq!(cpu.v[0xf], carry.into());
            }
        }
    }

    /// 8xy4: 0xF0 + 0x20 = 0x10, with carry
    #[test]
    fn add_carries() {
        let (mut cpu, _) = setup_environment();
        (cpu.v[1], cpu.v[2]) = (0xf0, 0x20);
        cpu.add(1, 2);
        assert_eq!((0x10, 1), (cpu.v[1], cpu.v[0xf]));
    }

    /// 8xy5: Performs subtraction of vX and vY, and stores the result in vX, !borrow in vF
    #[test]
    fn sub() {
        let (mut cpu, _) = setup_environment();
        for word in 0..=0xfff {
            let (a, b) = (word as u8, (word >> 4) as u8);
            for reg in 0..=0xff {
                let (x, y) = (reg & 0xf, reg >> 4);
                let (expected, borrow) = if x == y { b } else { a }.overflowing_sub(b);

                (cpu.v[x], cpu.v[y]) = (a, b);

                cpu.sub(x, y);

                if x != 0xf {
                    assert_eq!(cpu.v[x], expected);
                }
                // The borrow flag for subtraction is inverted
                assert_eq!(cpu.v[0xf], (!borrow).into());
            }
        }
    }

    /// 8xy5: 0x10 - 0x20 = 0xF0, with borrow
    #[test]
    fn sub_borrows() {
        let (mut cpu, _) = setup_environment();
        (cpu.v[1], cpu.v[2]) = (0x10, 0x20);
        cpu.sub(1, 2);
        assert_eq!((0xf0, 0), (cpu.v[1], cpu.v[0xf]));
        // equal operands don't borrow
        (cpu.v[1], cpu.v[2]) = (0x20, 0x20);
        cpu.sub(1, 2);
        assert_eq!((0x00, 1), (cpu.v[1], cpu.v[0xf]));
    }

    /// 8xy7: Performs subtraction of vY and vX, and stores the result in vX, !borrow in vF
    #[test]
    fn backwards_sub() {
        let (mut cpu, _) = setup_environment();
        for word in 0..=0xfff {
            let (a, b) = (word as u8, (word >> 4) as u8);
            for reg in 0..=0xff {
                let (x, y) = (reg & 0xf, reg >> 4);
                let (expected, borrow) = b.overflowing_sub(if x == y { b } else { a });

                (cpu.v[x], cpu.v[y]) = (a, b);

                cpu.backwards_sub(x, y);

                if x != 0xf {
                    assert_eq!(cpu.v[x], expected);
                }
                assert_eq!(cpu.v[0xf], (!borrow).into());
            }
        }
    }

    mod shift_right {
        use super::*;
        /// 8xy6: Performs bitwise right shift of vY, stores the result in vX,
        ///       and the bit shifted out in vF
        #[test]
        fn shift_right() {
            let (mut cpu, _) = setup_environment();
            for word in 0..=0xff {
                for reg in 0..=0xff {
                    let (x, y) = (reg & 0xf, reg >> 4);
                    if x == y {
                        continue;
                    }
                    (cpu.v[x], cpu.v[y]) = (0xa5, word as u8);

                    cpu.shift_right(x, y);

                    if x != 0xf {
                        assert_eq!(cpu.v[x], (word as u8) >> 1);
                    }
                    assert_eq!(cpu.v[0xf], word as u8 & 1);
                }
            }
        }
        /// Same test, with [Quirks::shift_uses_x_register] set
        #[test]
        fn shift_right_quirk() {
            let (mut cpu, _) = setup_environment();
            cpu.flags.quirks.shift_uses_x_register = true;
            for word in 0..=0xff {
                for x in 0..=0xf {
                    cpu.v[x] = word as u8;

                    cpu.shift_right(x, 0xe - x % 0xe);

                    if x != 0xf {
                        assert_eq!(cpu.v[x], (word as u8) >> 1);
                    }
                    assert_eq!(cpu.v[0xf], word as u8 & 1);
                }
            }
        }
        /// With vX = 0xFF and vY = 0x04, the source register picks the outcome
        #[test]
        fn shift_right_source() {
            let (mut cpu, _) = setup_environment();
            (cpu.v[1], cpu.v[2]) = (0xff, 0x04);
            cpu.shift_right(1, 2);
            assert_eq!((0x02, 0), (cpu.v[1], cpu.v[0xf]));

            cpu.flags.quirks.shift_uses_x_register = true;
            (cpu.v[1], cpu.v[2]) = (0xff, 0x04);
            cpu.shift_right(1, 2);
            assert_eq!((0x7f, 1), (cpu.v[1], cpu.v[0xf]));
        }
    }

    mod shift_left {
        use super::*;
        /// 8xyE: Performs bitwise left shift of vY, stores the result in vX,
        ///       and the bit shifted out in vF
        #[test]
        fn shift_left() {
            let (mut cpu, _) = setup_environment();
            for word in 0..=0xff {
                for reg in 0..=0xff {
                    let (x, y) = (reg & 0xf, reg >> 4);
                    if x == y {
                        continue;
                    }
                    (cpu.v[x], cpu.v[y]) = (0xa5, word as u8);

                    cpu.shift_left(x, y);

                    if x != 0xf {
                        assert_eq!(cpu.v[x], (word as u8) << 1);
                    }
                    assert_eq!(cpu.v[0xf], word as u8 >> 7);
                }
            }
        }
        /// Same test, with [Quirks::shift_uses_x_register] set
        #[test]
        fn shift_left_quirk() {
            let (mut cpu, _) = setup_environment();
            cpu.flags.quirks.shift_uses_x_register = true;
            for word in 0..=0xff {
                for x in 0..=0xf {
                    cpu.v[x] = word as u8;

                    cpu.shift_left(x, 0xe - x % 0xe);

                    if x != 0xf {
                        assert_eq!(cpu.v[x], (word as u8) << 1);
                    }
                    assert_eq!(cpu.v[0xf], word as u8 >> 7);
                }
            }
        }
    }
}

/// Tests instructions that touch I
mod i {
    use super::*;
    /// Aadr: Load address #adr into register I
    #[test]
    fn load_i_immediate() {
        let (mut cpu, _) = setup_environment();
        for addr in 0..0x1000 {
            cpu.load_i_immediate(addr);
            assert_eq!(cpu.i, addr);
        }
    }

    /// Fx1e: Add vX to I
    #[test]
    fn add_i() {
        let (mut cpu, _) = setup_environment();
        for reg in 0..=0xf {
            for value in [0u8, 1, 0x7f, 0xff] {
                let i = random::<u16>();
                cpu.i = i;
                cpu.v[reg] = value;

                cpu.add_i(reg);

                assert_eq!(cpu.i, i.wrapping_add(value as u16));
            }
        }
    }

    /// Fx29: Load sprite for character vX into I
    #[test]
    fn load_sprite() {
        let (mut cpu, _) = setup_environment();
        for digit in 0..0x10 {
            cpu.v[0xa] = digit;
            cpu.load_sprite(0xa);
            assert_eq!(cpu.i, mem::FONT_START + 5 * digit as u16);
            // the glyph is really there
            let glyph = &mem::FONT[5 * digit as usize..][..5];
            for (offset, &byte) in glyph.iter().enumerate() {
                assert_eq!(byte, cpu.mem.read(cpu.i + offset as u16));
            }
        }
    }

    /// Fx33: BCD convert X into I`[0..3]`
    #[test]
    fn bcd_convert() {
        let (mut cpu, _) = setup_environment();
        cpu.i = 0x300;
        for value in 0..=0xffu8 {
            cpu.v[5] = value;

            cpu.bcd_convert(5);

            let digits = [value / 100, value / 10 % 10, value % 10];
            assert_eq!(&digits, &cpu.mem.as_slice()[0x300..0x303]);
            // I is left alone
            assert_eq!(0x300, cpu.i);
        }
    }

    /// Fx33: 0xFF is 2, 5, 5
    #[test]
    fn bcd_255() {
        let (mut cpu, _) = setup_environment();
        (cpu.i, cpu.v[0]) = (0x300, 0xff);
        cpu.bcd_convert(0);
        assert_eq!(&[2, 5, 5], &cpu.mem.as_slice()[0x300..0x303]);
    }

    mod dma {
        use super::*;
        const DATA: &[u8; 16] = b"ABCDEFGHIJKLMNOP";

        /// Fx55: DMA Stor from I to registers 0..=X
        #[test]
        fn store_dma() {
            let (mut cpu, _) = setup_environment();
            for len in 0..16 {
                cpu.mem.clear_region(Program);
                cpu.i = 0x400;
                cpu.v = *DATA;

                cpu.store_dma(len);

                assert_eq!(&DATA[..=len], &cpu.mem.as_slice()[0x400..=0x400 + len]);
                // one past the end is untouched
                assert_eq!(0, cpu.mem.read(0x401 + len as u16));
                assert_eq!(0x400, cpu.i);
            }
        }

        /// Fx55 with [Quirks::load_store_increments_i] set
        #[test]
        fn store_dma_quirk() {
            let (mut cpu, _) = setup_environment();
            cpu.flags.quirks.load_store_increments_i = true;
            for len in 0..16 {
                cpu.i = 0x400;
                cpu.store_dma(len);
                assert_eq!(0x400 + len as u16 + 1, cpu.i);
            }
        }

        /// Fx65: DMA Load from I to registers 0..=X
        #[test]
        fn load_dma() {
            let (mut cpu, _) = setup_environment();
            cpu.mem.load_region(Program, &[0; 0x200]).unwrap();
            cpu.mem.get_region_mut(Program)[0x200..0x210].copy_from_slice(DATA);
            for len in 0..16 {
                cpu.i = 0x400;
                cpu.v = [0; 16];

                cpu.load_dma(len);

                assert_eq!(&DATA[..=len], &cpu.v[..=len]);
                assert!(cpu.v[len + 1..].iter().all(|&v| v == 0));
                assert_eq!(0x400, cpu.i);
            }
        }

        /// Fx65 with [Quirks::load_store_increments_i] set
        #[test]
        fn load_dma_quirk() {
            let (mut cpu, _) = setup_environment();
            cpu.flags.quirks.load_store_increments_i = true;
            for len in 0..16 {
                cpu.i = 0x400;
                cpu.load_dma(len);
                assert_eq!(0x400 + len as u16 + 1, cpu.i);
            }
        }

        /// Transfers past the top of memory wrap around to 0x000
        #[test]
        fn store_dma_wraps() {
            let (mut cpu, _) = setup_environment();
            cpu.i = 0xffe;
            cpu.v[..4].copy_from_slice(b"wxyz");
            cpu.store_dma(3);
            assert_eq!(b"wx", &cpu.mem.as_slice()[0xffe..]);
            assert_eq!(b"yz", &cpu.mem.as_slice()[..2]);
        }
    }
}

/// Cxbb: Stores a random number & the provided byte into vX
mod rnd {
    use super::*;
    #[test]
    fn rand() {
        let (mut cpu, mut io) = setup_environment();
        for xor in 0..=0xffu8 {
            for x in 0..=0xf {
                cpu.rand(x, xor, &mut io);
                // The random number is masked by the byte
                assert_eq!(cpu.v[x] & !xor, 0);
            }
        }
    }
    #[test]
    fn rand_is_seeded() {
        let (mut a, mut io_a) = setup_environment();
        let (mut b, mut io_b) = setup_environment();
        for _ in 0..0x100 {
            a.rand(0, 0xff, &mut io_a);
            b.rand(0, 0xff, &mut io_b);
            assert_eq!(a.v[0], b.v[0]);
        }
    }
}

mod io {
    use super::*;

    /// Fx07: Get the current DT, and put it in vX
    #[test]
    fn load_delay_timer() {
        let (mut cpu, _) = setup_environment();
        for word in 0..=0xff {
            for x in 0..=0xf {
                cpu.delay = word as u8;
                cpu.load_delay_timer(x);
                assert_eq!(cpu.v[x], word as u8);
            }
        }
    }

    /// Fx15: Load vX into DT
    #[test]
    fn store_delay_timer() {
        let (mut cpu, _) = setup_environment();
        for word in 0..=0xff {
            for x in 0..=0xf {
                cpu.v[x] = word as u8;
                cpu.store_delay_timer(x);
                assert_eq!(cpu.delay, word as u8);
            }
        }
    }

    /// Fx18: Load vX into ST
    #[test]
    fn store_sound_timer() {
        let (mut cpu, _) = setup_environment();
        for word in 0..=0xff {
            for x in 0..=0xf {
                cpu.v[x] = word as u8;
                cpu.store_sound_timer(x);
                assert_eq!(cpu.sound, word as u8);
            }
        }
    }

    mod timers {
        use super::*;
        /// Both timers count down to 0, and stop there
        #[test]
        fn count_down() {
            let (mut cpu, mut io) = setup_environment();
            (cpu.delay, cpu.sound) = (3, 2);
            cpu.step_timers(&mut io);
            assert_eq!((2, 1), (cpu.delay, cpu.sound));
            cpu.step_timers(&mut io).step_timers(&mut io).step_timers(&mut io);
            assert_eq!((0, 0), (cpu.delay, cpu.sound));
        }
        /// The tone is stopped exactly once, when the sound timer reaches 0
        #[test]
        fn stop_tone() {
            let (mut cpu, mut io) = setup_environment();
            cpu.sound = 3;
            cpu.step_timers(&mut io).step_timers(&mut io);
            assert_eq!(0, io.stopped);
            cpu.step_timers(&mut io);
            assert_eq!(1, io.stopped);
            cpu.step_timers(&mut io).step_timers(&mut io);
            assert_eq!(1, io.stopped);
        }
        /// Timers don't move while instructions run
        #[test]
        fn execute_leaves_timers() {
            let (mut cpu, mut io) = setup_environment();
            (cpu.delay, cpu.sound) = (10, 10);
            cpu.multistep(&mut io, 5).unwrap();
            assert_eq!((10, 10), (cpu.delay, cpu.sound));
            cpu.singlestep(&mut io).unwrap();
            assert_eq!((9, 9), (cpu.delay, cpu.sound));
        }
    }

    mod keys {
        use super::*;
        /// Ex9E: Skip next instruction if key vX is down
        #[test]
        fn skip_key_equals() {
            let (mut cpu, _) = setup_environment();
            for key in 0..=0xf {
                cpu.v[0x5] = key as u8;
                cpu.pc = 0x200;
                cpu.set_keypad(0);
                cpu.skip_key_equals(0x5);
                assert_eq!(0x202, cpu.pc);

                cpu.pc = 0x200;
                cpu.press(key).unwrap();
                cpu.skip_key_equals(0x5);
                assert_eq!(0x204, cpu.pc);
            }
        }
        /// ExA1: Skip next instruction if key vX is up
        #[test]
        fn skip_key_not_equals() {
            let (mut cpu, _) = setup_environment();
            for key in 0..=0xf {
                cpu.v[0x5] = key as u8;
                cpu.pc = 0x200;
                cpu.set_keypad(0);
                cpu.skip_key_not_equals(0x5);
                assert_eq!(0x204, cpu.pc);

                cpu.pc = 0x200;
                cpu.press(key).unwrap();
                cpu.skip_key_not_equals(0x5);
                assert_eq!(0x202, cpu.pc);
            }
        }
        /// Only the low nibble of vX names a key
        #[test]
        fn skip_key_masks() {
            let (mut cpu, _) = setup_environment();
            cpu.press(0x3).unwrap();
            cpu.v[0x5] = 0xf3;
            cpu.skip_key_equals(0x5);
            assert_eq!(0x204, cpu.pc);
        }

        /// Fx0A: Wait for key, then vX = K
        #[test]
        fn wait_for_key() {
            let (mut cpu, mut io) = setup_environment();
            // 200: ld va, k
            cpu.load(&[0xfa, 0x0a]).unwrap();

            // nothing pressed: pc stays put
            cpu.execute(&mut io).unwrap();
            assert_eq!(0x200, cpu.pc);

            // pressed, but not yet released
            cpu.press(0x7).unwrap();
            cpu.execute(&mut io).unwrap();
            assert_eq!(0x200, cpu.pc);
            assert_eq!(0, cpu.v[0xa]);

            // released
            cpu.release(0x7).unwrap();
            cpu.execute(&mut io).unwrap();
            assert_eq!(0x202, cpu.pc);
            assert_eq!(0x7, cpu.v[0xa]);
            assert_eq!(0, cpu.key_latch);
        }

        /// Fx0A: A key that was released before the wait began doesn't count
        #[test]
        fn wait_for_key_ignores_stale() {
            let (mut cpu, _) = setup_environment();
            cpu.press(0x2).unwrap();
            cpu.release(0x2).unwrap();
            cpu.wait_for_key(0x0);
            assert_eq!(0x200, cpu.pc);
        }

        /// Keys outside `0..=0xf` are an error
        #[test]
        fn invalid_key() {
            let (mut cpu, _) = setup_environment();
            assert!(matches!(cpu.press(0x10), Err(Error::InvalidKey { key: 0x10 })));
            assert!(matches!(cpu.release(0x10), Err(Error::InvalidKey { key: 0x10 })));
            assert_eq!(0, cpu.keypad());
        }
    }

    mod draw {
        use super::*;

        fn lit(cpu: &CPU) -> usize {
            cpu.video().iter().filter(|&&p| p != 0).count()
        }

        /// Dxyn: Draws n-byte sprite to the screen at coordinates (vX, vY)
        #[test]
        fn draw() {
            let (mut cpu, _) = setup_environment();
            // glyph for 0
            cpu.i = mem::FONT_START;
            (cpu.v[0], cpu.v[1]) = (10, 5);

            cpu.draw(0, 1, 5);

            assert_eq!(0, cpu.v[0xf]);
            for (row, &byte) in mem::FONT[..5].iter().enumerate() {
                for col in 0..8 {
                    let expected = byte & (0x80 >> col) != 0;
                    assert_eq!(expected, cpu.screen.pixel(10 + col, 5 + row));
                }
            }
        }

        /// Drawing the same sprite twice restores the screen, and reports a collision
        #[test]
        fn draw_twice() {
            let (mut cpu, _) = setup_environment();
            cpu.i = mem::FONT_START + 5 * 8;
            (cpu.v[0], cpu.v[1]) = (0, 0);

            cpu.draw(0, 1, 5);
            assert_eq!(0, cpu.v[0xf]);
            assert_ne!(0, lit(&cpu));

            cpu.draw(0, 1, 5);
            assert_eq!(1, cpu.v[0xf]);
            assert_eq!(0, lit(&cpu));
        }

        /// The starting coordinate wraps, even when clipping
        #[test]
        fn draw_start_wraps() {
            for clip in [false, true] {
                let (mut cpu, _) = setup_environment();
                cpu.flags.quirks.clip_sprites = clip;
                cpu.mem.write(0x300, 0x80);
                cpu.i = 0x300;
                (cpu.v[0], cpu.v[1]) = (64 + 3, 32 + 2);

                cpu.draw(0, 1, 1);

                assert!(cpu.screen.pixel(3, 2));
                assert_eq!(1, lit(&cpu));
            }
        }

        /// Without clipping, sprites wrap around both edges
        #[test]
        fn draw_wraps() {
            let (mut cpu, _) = setup_environment();
            cpu.flags.quirks.clip_sprites = false;
            cpu.mem.load_region(Program, &[0; 0x100]).unwrap();
            cpu.mem.get_region_mut(Program)[0x100..0x102].copy_from_slice(&[0xff, 0xff]);
            cpu.i = 0x300;
            (cpu.v[0], cpu.v[1]) = (60, 31);

            cpu.draw(0, 1, 2);

            assert_eq!(16, lit(&cpu));
            for col in [60, 61, 62, 63, 0, 1, 2, 3] {
                assert!(cpu.screen.pixel(col, 31));
                assert!(cpu.screen.pixel(col, 0));
            }
        }

        /// With clipping, the part past the edges is dropped
        #[test]
        fn draw_clips() {
            let (mut cpu, _) = setup_environment();
            cpu.flags.quirks.clip_sprites = true;
            cpu.mem.load_region(Program, &[0; 0x100]).unwrap();
            cpu.mem.get_region_mut(Program)[0x100..0x102].copy_from_slice(&[0xff, 0xff]);
            cpu.i = 0x300;
            (cpu.v[0], cpu.v[1]) = (60, 31);

            cpu.draw(0, 1, 2);

            assert_eq!(4, lit(&cpu));
            for col in 60..WIDTH {
                assert!(cpu.screen.pixel(col, HEIGHT - 1));
            }
        }

        /// vF holds the collision even when it's used as a coordinate
        #[test]
        fn draw_vf_last() {
            let (mut cpu, _) = setup_environment();
            cpu.mem.write(0x300, 0x80);
            cpu.i = 0x300;
            (cpu.v[0], cpu.v[0xf]) = (7, 9);

            cpu.draw(0, 0xf, 1);
            assert!(cpu.screen.pixel(7, 9));
            assert_eq!(0, cpu.v[0xf]);
        }
    }
}

/// Tests the public interface: reset, load, and state
mod interface {
    use super::*;

    #[test]
    fn load_capacity() {
        let mut cpu = CPU::default();
        cpu.load(&[0xa5; 0xe00]).unwrap();
        assert_eq!(0xa5, cpu.mem.read(0xfff));
        match cpu.load(&[0; 0xe01]) {
            Err(Error::Capacity { len, capacity }) => {
                assert_eq!((0xe01, 0xe00), (len, capacity))
            }
            other => panic!("Expected Capacity error, got {other:?}"),
        }
        // nothing was written
        assert_eq!(0xa5, cpu.mem.read(0x200));
    }

    #[test]
    fn reset() {
        let (mut cpu, mut io) = setup_environment();
        cpu.load(&[0x22, 0x06, 0x61, 0x23]).unwrap();
        cpu.multistep(&mut io, 1).unwrap();
        (cpu.i, cpu.delay, cpu.sound, cpu.v[4]) = (0x123, 4, 5, 6);
        cpu.press(0x9).unwrap();
        cpu.screen.toggle(0, 0);
        cpu.flags.quirks = Quirks::from(true);

        cpu.reset();

        assert_eq!(0x200, cpu.pc);
        assert_eq!((0, 0, 0, 0), (cpu.i, cpu.delay, cpu.sound, cpu.sp));
        assert_eq!([0; 16], cpu.v);
        assert_eq!(0, cpu.keypad());
        assert_eq!(0, cpu.cycle);
        assert!(cpu.video().iter().all(|&p| p == 0));
        assert_eq!(Quirks::default(), cpu.flags.quirks);
        // memory and debug are kept
        assert_eq!(0x22, cpu.mem.read(0x200));
        assert!(cpu.flags.debug);
    }

    #[test]
    fn initialize() {
        let (mut cpu, _) = setup_environment();
        cpu.mem.write(0x000, 0);
        cpu.initialize();
        assert_eq!(0, cpu.mem.read(0x200));
        assert_eq!(&mem::FONT, cpu.mem.get_region(mem::Region::Charset));
    }

    #[test]
    fn state() {
        let (mut cpu, _) = setup_environment();
        assert_eq!(State::Running, cpu.state());
        cpu.flags.pause();
        assert_eq!(State::Halted, cpu.state());
    }

    #[test]
    fn singlestep_stays_running() {
        let (mut cpu, mut io) = setup_environment();
        cpu.singlestep(&mut io).unwrap();
        assert_eq!(State::Running, cpu.state());
        assert_eq!(1, cpu.cycle);
    }

    #[test]
    fn dump() {
        let (cpu, _) = setup_environment();
        cpu.dump();
    }

    #[test]
    fn debug() {
        let (cpu, _) = setup_environment();
        let debug = format!("{cpu:?}");
        assert!(debug.starts_with("CPU"));
        assert!(debug.contains("pc: 512"));
    }
}
