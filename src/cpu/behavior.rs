// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Contains implementations for each Chip-8 [Insn]
//!
//! Every handler leaves `pc` pointing at the next instruction to run.

use super::*;
use crate::screen::{HEIGHT, WIDTH};

impl CPU {
    /// Executes a single [Insn]
    #[rustfmt::skip]
    #[inline(always)]
    pub(super) fn dispatch(&mut self, instruction: Insn, io: &mut impl Peripherals) -> Result<()> {
        match instruction {
            Insn::cls               => self.clear_screen(),
            Insn::ret               => self.ret()?,
            Insn::jp    {       A } => self.jump(A),
            Insn::call  {       A } => self.call(A)?,
            Insn::seb   {    x, B } => self.skip_equals_immediate(x, B),
            Insn::sneb  {    x, B } => self.skip_not_equals_immediate(x, B),
            Insn::se    { y, x    } => self.skip_equals(x, y),
            Insn::ldb   {    x, B } => self.load_immediate(x, B),
            Insn::addb  {    x, B } => self.add_immediate(x, B),
            Insn::ld    { y, x    } => self.load_register(x, y),
            Insn::or    { y, x    } => self.or(x, y),
            Insn::and   { y, x    } => self.and(x, y),
            Insn::xor   { y, x    } => self.xor(x, y),
            Insn::add   { y, x    } => self.add(x, y),
            Insn::sub   { y, x    } => self.sub(x, y),
            Insn::shr   { y, x    } => self.shift_right(x, y),
            Insn::subn  { y, x    } => self.backwards_sub(x, y),
            Insn::shl   { y, x    } => self.shift_left(x, y),
            Insn::sne   { y, x    } => self.skip_not_equals(x, y),
            Insn::ldi   {       A } => self.load_i_immediate(A),
            Insn::jpr   {       A } => self.jump_indexed(A),
            Insn::rnd   {    x, B } => self.rand(x, B, io),
            Insn::drw   { y, x, n } => self.draw(x, y, n),
            Insn::skp   {    x    } => self.skip_key_equals(x),
            Insn::sknp  {    x    } => self.skip_key_not_equals(x),
            Insn::lddt  {    x    } => self.load_delay_timer(x),
            Insn::ldk   {    x    } => self.wait_for_key(x),
            Insn::setdt {    x    } => self.store_delay_timer(x),
            Insn::setst {    x    } => self.store_sound_timer(x),
            Insn::addi  {    x    } => self.add_i(x),
            Insn::font  {    x    } => self.load_sprite(x),
            Insn::bcd   {    x    } => self.bcd_convert(x),
            Insn::stor  {    x    } => self.store_dma(x),
            Insn::load  {    x    } => self.load_dma(x),
        }
        Ok(())
    }

    /// Moves on to the next instruction
    #[inline(always)]
    fn next(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }

    /// Skips the next instruction if `cond` holds, else moves on to it
    #[inline(always)]
    fn skip_if(&mut self, cond: bool) {
        self.pc = self.pc.wrapping_add(if cond { 4 } else { 2 });
    }
}

/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`00e0`| Clear screen memory to all 0       |
/// |`00ee`| Return from subroutine             |
impl CPU {
    /// |`00e0`| Clears the screen memory to 0
    #[inline(always)]
    pub(super) fn clear_screen(&mut self) {
        self.screen.clear();
        self.next();
    }
    /// |`00ee`| Returns from subroutine, to the instruction after the call
    ///
    /// Fails with [Error::StackUnderflow] if the stack is empty
    #[inline(always)]
    pub(super) fn ret(&mut self) -> Result<()> {
        if self.sp == 0 {
            return Err(Error::StackUnderflow { addr: self.pc });
        }
        self.sp -= 1;
        self.pc = self.stack[self.sp];
        self.next();
        Ok(())
    }
}

/// |`1aaa`| Sets pc to an absolute address
impl CPU {
    /// |`1aaa`| Sets the program counter to an absolute address
    #[inline(always)]
    pub(super) fn jump(&mut self, a: Adr) {
        self.pc = a;
    }
}

/// |`2aaa`| Pushes pc onto the stack, then jumps to a
impl CPU {
    /// |`2aaa`| Pushes pc onto the stack, then jumps to a
    ///
    /// Fails with [Error::StackOverflow] if all [STACK_DEPTH] entries are in use
    #[inline(always)]
    pub(super) fn call(&mut self, a: Adr) -> Result<()> {
        let Some(slot) = self.stack.get_mut(self.sp) else {
            return Err(Error::StackOverflow { addr: self.pc });
        };
        *slot = self.pc;
        self.sp += 1;
        self.pc = a;
        Ok(())
    }
}

/// |`3xbb`| Skips next instruction if register X == b
impl CPU {
    /// |`3xbb`| Skips the next instruction if register X == b
    #[inline(always)]
    pub(super) fn skip_equals_immediate(&mut self, x: Reg, b: u8) {
        self.skip_if(self.v[x] == b);
    }
}

/// |`4xbb`| Skips next instruction if register X != b
impl CPU {
    /// |`4xbb`| Skips the next instruction if register X != b
    #[inline(always)]
    pub(super) fn skip_not_equals_immediate(&mut self, x: Reg, b: u8) {
        self.skip_if(self.v[x] != b);
    }
}

/// |`5xy0`| Skips next instruction if register X == register Y
impl CPU {
    /// |`5xy0`| Skips the next instruction if register X == register Y
    #[inline(always)]
    pub(super) fn skip_equals(&mut self, x: Reg, y: Reg) {
        self.skip_if(self.v[x] == self.v[y]);
    }
}

/// |`6xbb`| Loads immediate byte b into register vX
impl CPU {
    /// |`6xbb`| Loads immediate byte b into register vX
    #[inline(always)]
    pub(super) fn load_immediate(&mut self, x: Reg, b: u8) {
        self.v[x] = b;
        self.next();
    }
}

/// |`7xbb`| Adds immediate byte b to register vX
impl CPU {
    /// |`7xbb`| Adds immediate byte b to register vX
    ///
    /// Wraps around, and never touches vF
    #[inline(always)]
    pub(super) fn add_immediate(&mut self, x: Reg, b: u8) {
        self.v[x] = self.v[x].wrapping_add(b);
        self.next();
    }
}

/// |`8xyn`| Performs ALU operation
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`8xy0`| X = Y                              |
/// |`8xy1`| X = X | Y                          |
/// |`8xy2`| X = X & Y                          |
/// |`8xy3`| X = X ^ Y                          |
/// |`8xy4`| X = X + Y; Set vF=carry            |
/// |`8xy5`| X = X - Y; Set vF=!borrow          |
/// |`8xy6`| X = Y >> 1; Set vF=shifted bit     |
/// |`8xy7`| X = Y - X; Set vF=!borrow          |
/// |`8xyE`| X = Y << 1; Set vF=shifted bit     |
///
/// Flags are written last, so when X is F, vF holds the flag.
impl CPU {
    /// |`8xy0`| Loads the value of y into x
    #[inline(always)]
    pub(super) fn load_register(&mut self, x: Reg, y: Reg) {
        self.v[x] = self.v[y];
        self.next();
    }
    /// |`8xy1`| Performs bitwise or of vX and vY, and stores the result in vX
    ///
    /// # Quirk
    /// The Cosmac VIP interpreter will clobber vF for any 8-series instruction
    #[inline(always)]
    pub(super) fn or(&mut self, x: Reg, y: Reg) {
        self.v[x] |= self.v[y];
        self.clobber_vf();
    }
    /// |`8xy2`| Performs bitwise and of vX and vY, and stores the result in vX
    ///
    /// # Quirk
    /// The Cosmac VIP interpreter will clobber vF for any 8-series instruction
    #[inline(always)]
    pub(super) fn and(&mut self, x: Reg, y: Reg) {
        self.v[x] &= self.v[y];
        self.clobber_vf();
    }
    /// |`8xy3`| Performs bitwise xor of vX and vY, and stores the result in vX
    ///
    /// # Quirk
    /// The Cosmac VIP interpreter will clobber vF for any 8-series instruction
    #[inline(always)]
    pub(super) fn xor(&mut self, x: Reg, y: Reg) {
        self.v[x] ^= self.v[y];
        self.clobber_vf();
    }
    #[inline(always)]
    fn clobber_vf(&mut self) {
        if self.flags.quirks.logical_ops_clear_vf {
            self.v[0xf] = 0;
        }
        self.next();
    }
    /// |`8xy4`| Performs addition of vX and vY, and stores the result in vX
    #[inline(always)]
    pub(super) fn add(&mut self, x: Reg, y: Reg) {
        let carry;
        (self.v[x], carry) = self.v[x].overflowing_add(self.v[y]);
        self.v[0xf] = carry.into();
        self.next();
    }
    /// |`8xy5`| Performs subtraction of vX and vY, and stores the result in vX
    #[inline(always)]
    pub(super) fn sub(&mut self, x: Reg, y: Reg) {
        let borrow;
        (self.v[x], borrow) = self.v[x].overflowing_sub(self.v[y]);
        self.v[0xf] = (!borrow).into();
        self.next();
    }
    /// |`8xy6`| Performs bitwise right shift of vY, and stores the result in vX
    ///
    /// # Quirk
    /// On the Chip-48, this shifts vX in place, and vY is ignored
    #[inline(always)]
    pub(super) fn shift_right(&mut self, x: Reg, y: Reg) {
        let src: Reg = if self.flags.quirks.shift_uses_x_register { x } else { y };
        let shift_out = self.v[src] & 1;
        self.v[x] = self.v[src] >> 1;
        self.v[0xf] = shift_out;
        self.next();
    }
    /// |`8xy7`| Performs subtraction of vY and vX, and stores the result in vX
    #[inline(always)]
    pub(super) fn backwards_sub(&mut self, x: Reg, y: Reg) {
        let borrow;
        (self.v[x], borrow) = self.v[y].overflowing_sub(self.v[x]);
        self.v[0xf] = (!borrow).into();
        self.next();
    }
    /// |`8xyE`| Performs bitwise left shift of vY, and stores the result in vX
    ///
    /// # Quirk
    /// On the Chip-48, this shifts vX in place, and vY is ignored
    #[inline(always)]
    pub(super) fn shift_left(&mut self, x: Reg, y: Reg) {
        let src: Reg = if self.flags.quirks.shift_uses_x_register { x } else { y };
        let shift_out: u8 = self.v[src] >> 7;
        self.v[x] = self.v[src] << 1;
        self.v[0xf] = shift_out;
        self.next();
    }
}

/// |`9xy0`| Skips next instruction if register X != register Y
impl CPU {
    /// |`9xy0`| Skip next instruction if X != y
    #[inline(always)]
    pub(super) fn skip_not_equals(&mut self, x: Reg, y: Reg) {
        self.skip_if(self.v[x] != self.v[y]);
    }
}

/// |`Aaaa`| Load address #a into register I
impl CPU {
    /// |`Aadr`| Load address #adr into register I
    #[inline(always)]
    pub(super) fn load_i_immediate(&mut self, a: Adr) {
        self.i = a;
        self.next();
    }
}

/// |`Baaa`| Jump to &adr + v0
impl CPU {
    /// |`Badr`| Jump to &adr + v0
    ///
    /// # Quirk
    /// On the Chip-48, this jumps to &adr + vX, where X is the high nibble of adr
    #[inline(always)]
    pub(super) fn jump_indexed(&mut self, a: Adr) {
        let reg = if self.flags.quirks.jump_uses_vx {
            (a >> 8 & 0xf) as Reg
        } else {
            0
        };
        self.pc = a.wrapping_add(self.v[reg] as Adr);
    }
}

/// |`Cxbb`| Stores a random number & the provided byte into vX
impl CPU {
    /// |`Cxbb`| Stores a random number & the provided byte into vX
    #[inline(always)]
    pub(super) fn rand(&mut self, x: Reg, b: u8, io: &mut impl Peripherals) {
        self.v[x] = io.random_byte() & b;
        self.next();
    }
}

/// |`Dxyn`| Draws n-byte sprite to the screen at coordinates (vX, vY)
impl CPU {
    /// |`Dxyn`| Draws n-byte sprite to the screen at coordinates (vX, vY)
    ///
    /// vF is set if any lit pixel was turned off.
    ///
    /// # Quirk
    /// Sprites wrap around both edges of the screen, unless
    /// [Quirks::clip_sprites] is set, in which case the part of the sprite
    /// past the right or bottom edge is not drawn.
    /// The starting coordinate always wraps.
    #[inline(always)]
    pub(super) fn draw(&mut self, x: Reg, y: Reg, n: Nib) {
        let (x, y) = (self.v[x] as usize % WIDTH, self.v[y] as usize % HEIGHT);
        let clip = self.flags.quirks.clip_sprites;
        let mut collision = false;
        for line in 0..n as usize {
            let (row, sprite) = (y + line, self.mem.read(self.i.wrapping_add(line as Adr)));
            if clip && row >= HEIGHT {
                break;
            }
            for bit in 0..8 {
                let col = x + bit;
                if clip && col >= WIDTH {
                    break;
                }
                if sprite & (0x80 >> bit) != 0 {
                    collision |= self.screen.toggle(col % WIDTH, row % HEIGHT);
                }
            }
        }
        self.v[0xf] = collision.into();
        self.next();
    }
}

/// |`Exbb`| Skips instruction on value of keypress
///
/// |opcode| effect                                 |
/// |------|----------------------------------------|
/// |`eX9e`| Skip next instruction if key vX is down|
/// |`eXa1`| Skip next instruction if key vX is up  |
impl CPU {
    /// |`Ex9E`| Skip next instruction if key vX is down
    #[inline(always)]
    pub(super) fn skip_key_equals(&mut self, x: Reg) {
        self.skip_if(self.keys & 1 << (self.v[x] & 0xf) != 0);
    }
    /// |`ExA1`| Skip next instruction if key vX is up
    #[inline(always)]
    pub(super) fn skip_key_not_equals(&mut self, x: Reg) {
        self.skip_if(self.keys & 1 << (self.v[x] & 0xf) == 0);
    }
}

/// |`Fxbb`| Performs IO
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`fX07`| Set vX to value in delay timer     |
/// |`fX0a`| Wait for a release, store key in vX|
/// |`fX15`| Set delay timer to the value in vX |
/// |`fX18`| Set sound timer to the value in vX |
/// |`fX1e`| Add vX to I                        |
/// |`fX29`| Load sprite for character x into I |
/// |`fX33`| BCD convert X into I[0..3]         |
/// |`fX55`| DMA Stor from I to registers 0..=X |
/// |`fX65`| DMA Load from I to registers 0..=X |
impl CPU {
    /// |`Fx07`| Get the current DT, and put it in vX
    /// ```py
    /// vX = DT
    /// ```
    #[inline(always)]
    pub(super) fn load_delay_timer(&mut self, x: Reg) {
        self.v[x] = self.delay;
        self.next();
    }
    /// |`Fx0A`| Wait for a key to be pressed and released, then vX = K
    ///
    /// Keys held down are latched on every call. The first latched key found up again
    /// completes the instruction; until then, pc stays put and this runs again.
    #[inline(always)]
    pub(super) fn wait_for_key(&mut self, x: Reg) {
        for key in 0..16u8 {
            let mask = 1 << key;
            if self.keys & mask != 0 {
                self.key_latch |= mask;
            }
            if self.key_latch & mask != 0 && self.keys & mask == 0 {
                self.v[x] = key;
                self.key_latch = 0;
                self.next();
                return;
            }
        }
    }
    /// |`Fx15`| Load vX into DT
    /// ```py
    /// DT = vX
    /// ```
    #[inline(always)]
    pub(super) fn store_delay_timer(&mut self, x: Reg) {
        self.delay = self.v[x];
        self.next();
    }
    /// |`Fx18`| Load vX into ST
    /// ```py
    /// ST = vX;
    /// ```
    #[inline(always)]
    pub(super) fn store_sound_timer(&mut self, x: Reg) {
        self.sound = self.v[x];
        self.next();
    }
    /// |`Fx1e`| Add vX to I,
    /// ```py
    /// I += vX;
    /// ```
    #[inline(always)]
    pub(super) fn add_i(&mut self, x: Reg) {
        self.i = self.i.wrapping_add(self.v[x] as Adr);
        self.next();
    }
    /// |`Fx29`| Load sprite for character x into I
    /// ```py
    /// I = sprite(X);
    /// ```
    #[inline(always)]
    pub(super) fn load_sprite(&mut self, x: Reg) {
        self.i = mem::FONT_START + 5 * self.v[x] as Adr;
        self.next();
    }
    /// |`Fx33`| BCD convert X into I`[0..3]`
    #[inline(always)]
    pub(super) fn bcd_convert(&mut self, x: Reg) {
        let x = self.v[x];
        self.mem.write(self.i, x / 100);
        self.mem.write(self.i.wrapping_add(1), x / 10 % 10);
        self.mem.write(self.i.wrapping_add(2), x % 10);
        self.next();
    }
    /// |`Fx55`| DMA Stor from I to registers 0..=X
    ///
    /// # Quirk
    /// The Cosmac VIP interpreter uses I to directly index memory,
    /// with the side effect of leaving I as I+X+1 after the transfer is done.
    #[inline(always)]
    pub(super) fn store_dma(&mut self, x: Reg) {
        for reg in 0..=x {
            self.mem.write(self.i.wrapping_add(reg as Adr), self.v[reg]);
        }
        self.dma_increment(x);
    }
    /// |`Fx65`| DMA Load from I to registers 0..=X
    ///
    /// # Quirk
    /// The Cosmac VIP interpreter uses I to directly index memory,
    /// with the side effect of leaving I as I+X+1 after the transfer is done.
    #[inline(always)]
    pub(super) fn load_dma(&mut self, x: Reg) {
        for reg in 0..=x {
            self.v[reg] = self.mem.read(self.i.wrapping_add(reg as Adr));
        }
        self.dma_increment(x);
    }
    #[inline(always)]
    fn dma_increment(&mut self, x: Reg) {
        if self.flags.quirks.load_store_increments_i {
            self.i = self.i.wrapping_add(x as Adr + 1);
        }
        self.next();
    }
}
