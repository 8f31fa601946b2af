//! Flag-accurate arithmetic and logic, decoupled from the register file.
//!
//! Every operation returns an [`AluResult`] carrying the computed value, a
//! mask of the flag bits it affects and the values for those bits. The caller
//! merges the result into F, so flags an operation does not touch survive
//! (e.g. `INC r8` leaves carry alone).

use crate::registers::{FLAG_C, FLAG_H, FLAG_N, FLAG_Z};

/// Result of an ALU operation. `value` is widened to `u16` so 8- and 16-bit
/// operations share one carrier; 8-bit callers truncate via [`AluResult::value8`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AluResult {
    pub value: u16,
    /// Which of Z/N/H/C this operation affects.
    pub affected: u8,
    /// Values for the affected bits. Bits outside `affected` are ignored.
    pub flags: u8,
}

impl AluResult {
    pub fn value8(&self) -> u8 {
        self.value as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    Left,
    Right,
}

/// 8-bit add with optional carry-in (0 or 1). Half-carry out of bit 3,
/// carry out of bit 7.
pub fn add8(a: u8, b: u8, carry: u8) -> AluResult {
    let wide = a as u16 + b as u16 + carry as u16;
    let value = wide as u8;
    let mut flags = 0;
    if value == 0 {
        flags |= FLAG_Z;
    }
    if (a & 0x0F) + (b & 0x0F) + carry > 0x0F {
        flags |= FLAG_H;
    }
    if wide > 0xFF {
        flags |= FLAG_C;
    }
    AluResult {
        value: value as u16,
        affected: FLAG_Z | FLAG_N | FLAG_H | FLAG_C,
        flags,
    }
}

/// 8-bit subtract with optional borrow-in (0 or 1). Half-carry means a
/// borrow from bit 4, carry a borrow out of bit 8.
pub fn sub8(a: u8, b: u8, carry: u8) -> AluResult {
    let wide = (a as i16) - (b as i16) - (carry as i16);
    let value = wide as u8;
    let mut flags = FLAG_N;
    if value == 0 {
        flags |= FLAG_Z;
    }
    if (a & 0x0F) as i16 - (b & 0x0F) as i16 - (carry as i16) < 0 {
        flags |= FLAG_H;
    }
    if wide < 0 {
        flags |= FLAG_C;
    }
    AluResult {
        value: value as u16,
        affected: FLAG_Z | FLAG_N | FLAG_H | FLAG_C,
        flags,
    }
}

/// Compare: subtract flags, but the reported value is the untouched
/// accumulator so the caller can write it back unchanged.
pub fn cmp8(a: u8, b: u8) -> AluResult {
    let mut res = sub8(a, b, 0);
    res.value = a as u16;
    res
}

pub fn and8(a: u8, b: u8) -> AluResult {
    let value = a & b;
    let mut flags = FLAG_H;
    if value == 0 {
        flags |= FLAG_Z;
    }
    AluResult {
        value: value as u16,
        affected: FLAG_Z | FLAG_N | FLAG_H | FLAG_C,
        flags,
    }
}

pub fn or8(a: u8, b: u8) -> AluResult {
    logic_result(a | b)
}

pub fn xor8(a: u8, b: u8) -> AluResult {
    logic_result(a ^ b)
}

fn logic_result(value: u8) -> AluResult {
    AluResult {
        value: value as u16,
        affected: FLAG_Z | FLAG_N | FLAG_H | FLAG_C,
        flags: if value == 0 { FLAG_Z } else { 0 },
    }
}

/// Increment leaves the carry flag untouched.
pub fn inc8(a: u8) -> AluResult {
    let value = a.wrapping_add(1);
    let mut flags = 0;
    if value == 0 {
        flags |= FLAG_Z;
    }
    if a & 0x0F == 0x0F {
        flags |= FLAG_H;
    }
    AluResult {
        value: value as u16,
        affected: FLAG_Z | FLAG_N | FLAG_H,
        flags,
    }
}

/// Decrement leaves the carry flag untouched.
pub fn dec8(a: u8) -> AluResult {
    let value = a.wrapping_sub(1);
    let mut flags = FLAG_N;
    if value == 0 {
        flags |= FLAG_Z;
    }
    if a & 0x0F == 0 {
        flags |= FLAG_H;
    }
    AluResult {
        value: value as u16,
        affected: FLAG_Z | FLAG_N | FLAG_H,
        flags,
    }
}

/// 16-bit add (ADD HL,rr). Z is untouched; half-carry out of bit 11,
/// carry out of bit 15.
pub fn add16(a: u16, b: u16) -> AluResult {
    let wide = a as u32 + b as u32;
    let mut flags = 0;
    if (a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF {
        flags |= FLAG_H;
    }
    if wide > 0xFFFF {
        flags |= FLAG_C;
    }
    AluResult {
        value: wide as u16,
        affected: FLAG_N | FLAG_H | FLAG_C,
        flags,
    }
}

/// 16-bit increment affects no flags.
pub fn inc16(a: u16) -> AluResult {
    AluResult {
        value: a.wrapping_add(1),
        affected: 0,
        flags: 0,
    }
}

/// 16-bit decrement affects no flags.
pub fn dec16(a: u16) -> AluResult {
    AluResult {
        value: a.wrapping_sub(1),
        affected: 0,
        flags: 0,
    }
}

/// SP plus signed 8-bit offset (ADD SP,e8 and LD HL,SP+e8). Z and N are
/// cleared; H and C come from unsigned byte arithmetic on the low byte.
pub fn offset16(base: u16, offset: i8) -> AluResult {
    let raw = offset as u8;
    let mut flags = 0;
    if (base & 0x0F) + (raw & 0x0F) as u16 > 0x0F {
        flags |= FLAG_H;
    }
    if (base & 0xFF) + raw as u16 > 0xFF {
        flags |= FLAG_C;
    }
    AluResult {
        value: base.wrapping_add(offset as i16 as u16),
        affected: FLAG_Z | FLAG_N | FLAG_H | FLAG_C,
        flags,
    }
}

/// Rotate through the carry flag: the old carry shifts in, the pushed-out
/// bit becomes the new carry. `check_zero` is false for the accumulator
/// forms (RLA/RRA), which always clear Z.
pub fn rotate(value: u8, carry_in: u8, dir: ShiftDirection, check_zero: bool) -> AluResult {
    let (out, carry) = match dir {
        ShiftDirection::Left => ((value << 1) | carry_in, value & 0x80 != 0),
        ShiftDirection::Right => ((value >> 1) | (carry_in << 7), value & 0x01 != 0),
    };
    rotate_result(out, carry, check_zero)
}

/// Circular rotate: the pushed-out bit wraps around and also becomes the
/// new carry. `check_zero` is false for the accumulator forms (RLCA/RRCA).
pub fn rotate_carry(value: u8, dir: ShiftDirection, check_zero: bool) -> AluResult {
    let (out, carry) = match dir {
        ShiftDirection::Left => (value.rotate_left(1), value & 0x80 != 0),
        ShiftDirection::Right => (value.rotate_right(1), value & 0x01 != 0),
    };
    rotate_result(out, carry, check_zero)
}

fn rotate_result(value: u8, carry: bool, check_zero: bool) -> AluResult {
    let mut flags = 0;
    if check_zero && value == 0 {
        flags |= FLAG_Z;
    }
    if carry {
        flags |= FLAG_C;
    }
    AluResult {
        value: value as u16,
        affected: FLAG_Z | FLAG_N | FLAG_H | FLAG_C,
        flags,
    }
}

/// Shift left/right. `logical` selects SRL over SRA for right shifts (SRA
/// keeps the sign bit); it is ignored for left shifts.
pub fn shift(value: u8, dir: ShiftDirection, logical: bool) -> AluResult {
    let (out, carry) = match dir {
        ShiftDirection::Left => (value << 1, value & 0x80 != 0),
        ShiftDirection::Right if logical => (value >> 1, value & 0x01 != 0),
        ShiftDirection::Right => ((value >> 1) | (value & 0x80), value & 0x01 != 0),
    };
    rotate_result(out, carry, true)
}

/// Exchange the high and low nibbles.
pub fn swap(value: u8) -> AluResult {
    AluResult {
        value: value.rotate_left(4) as u16,
        affected: FLAG_Z | FLAG_N | FLAG_H | FLAG_C,
        flags: if value == 0 { FLAG_Z } else { 0 },
    }
}

/// BIT b,r: Z reflects the complement of the tested bit, H is set, N
/// cleared, carry untouched. The value passes through unchanged.
pub fn test_bit(bit: u8, value: u8) -> AluResult {
    let mut flags = FLAG_H;
    if value & (1 << bit) == 0 {
        flags |= FLAG_Z;
    }
    AluResult {
        value: value as u16,
        affected: FLAG_Z | FLAG_N | FLAG_H,
        flags,
    }
}

/// SET b,r affects no flags.
pub fn set_bit(bit: u8, value: u8) -> AluResult {
    AluResult {
        value: (value | (1 << bit)) as u16,
        affected: 0,
        flags: 0,
    }
}

/// RES b,r affects no flags.
pub fn reset_bit(bit: u8, value: u8) -> AluResult {
    AluResult {
        value: (value & !(1 << bit)) as u16,
        affected: 0,
        flags: 0,
    }
}

/// Decimal adjust after a BCD add or subtract. The N flag decides the
/// direction of the correction; H and C decide whether each nibble needs
/// one. N itself is preserved, H always ends up cleared.
pub fn daa(a: u8, f: u8) -> AluResult {
    let subtract = f & FLAG_N != 0;
    let mut correction = 0u8;
    let mut carry = false;
    if f & FLAG_H != 0 || (!subtract && a & 0x0F > 0x09) {
        correction |= 0x06;
    }
    if f & FLAG_C != 0 || (!subtract && a > 0x99) {
        correction |= 0x60;
        carry = true;
    }
    let value = if subtract {
        a.wrapping_sub(correction)
    } else {
        a.wrapping_add(correction)
    };
    let mut flags = 0;
    if value == 0 {
        flags |= FLAG_Z;
    }
    if carry {
        flags |= FLAG_C;
    }
    AluResult {
        value: value as u16,
        affected: FLAG_Z | FLAG_H | FLAG_C,
        flags,
    }
}
