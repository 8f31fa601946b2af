use dotmatrix::alu::{self, ShiftDirection};
use dotmatrix::registers::{FLAG_C, FLAG_H, FLAG_N, FLAG_Z};

#[test]
fn add8_carries_between_nibbles() {
    let res = alu::add8(0x0C, 0x0F, 0);
    assert_eq!(res.value8(), 0x1B);
    assert_eq!(res.flags & FLAG_H, FLAG_H);
    assert_eq!(res.flags & (FLAG_Z | FLAG_N | FLAG_C), 0);
}

#[test]
fn add8_with_carry_in() {
    let res = alu::add8(0xFF, 0x00, 1);
    assert_eq!(res.value8(), 0x00);
    assert_eq!(res.flags, FLAG_Z | FLAG_H | FLAG_C);
}

#[test]
fn sub8_borrows() {
    let res = alu::sub8(0x32, 0x64, 0);
    assert_eq!(res.value8(), 0xCE);
    assert_eq!(res.flags & FLAG_C, FLAG_C);
    assert_eq!(res.flags & FLAG_N, FLAG_N);
    assert_eq!(res.flags & FLAG_Z, 0);
}

#[test]
fn sub8_half_borrow() {
    let res = alu::sub8(0x10, 0x01, 0);
    assert_eq!(res.value8(), 0x0F);
    assert_eq!(res.flags & FLAG_H, FLAG_H);
    assert_eq!(res.flags & FLAG_C, 0);
}

#[test]
fn cmp8_reports_the_accumulator_unchanged() {
    let res = alu::cmp8(0x3C, 0x3C);
    assert_eq!(res.value8(), 0x3C);
    assert_eq!(res.flags & FLAG_Z, FLAG_Z);
    assert_eq!(res.flags & FLAG_N, FLAG_N);
}

#[test]
fn inc8_wraps_without_touching_carry() {
    let res = alu::inc8(0xFF);
    assert_eq!(res.value8(), 0x00);
    assert_eq!(res.flags & (FLAG_Z | FLAG_H), FLAG_Z | FLAG_H);
    // Carry is not in the affected mask, so a set carry would survive.
    assert_eq!(res.affected & FLAG_C, 0);
}

#[test]
fn dec8_half_borrow_on_low_nibble_zero() {
    let res = alu::dec8(0x10);
    assert_eq!(res.value8(), 0x0F);
    assert_eq!(res.flags & FLAG_H, FLAG_H);
    assert_eq!(res.affected & FLAG_C, 0);
}

#[test]
fn and_or_xor_flags() {
    let res = alu::and8(0xF0, 0x0F);
    assert_eq!(res.value8(), 0);
    assert_eq!(res.flags, FLAG_Z | FLAG_H);

    let res = alu::or8(0xF0, 0x0F);
    assert_eq!(res.value8(), 0xFF);
    assert_eq!(res.flags, 0);

    let res = alu::xor8(0xAA, 0xAA);
    assert_eq!(res.value8(), 0);
    assert_eq!(res.flags, FLAG_Z);
}

#[test]
fn add16_carries_at_bit_11_and_15() {
    let res = alu::add16(0x0FFF, 0x0001);
    assert_eq!(res.value, 0x1000);
    assert_eq!(res.flags & FLAG_H, FLAG_H);
    assert_eq!(res.flags & FLAG_C, 0);
    // Z survives 16-bit adds.
    assert_eq!(res.affected & FLAG_Z, 0);

    let res = alu::add16(0x8000, 0x8000);
    assert_eq!(res.value, 0x0000);
    assert_eq!(res.flags & FLAG_C, FLAG_C);
}

#[test]
fn offset16_flags_come_from_the_low_byte() {
    let res = alu::offset16(0xFFF8, 0x08);
    assert_eq!(res.value, 0x0000);
    assert_eq!(res.flags, FLAG_H | FLAG_C);

    // Negative offsets still use unsigned byte arithmetic for H/C.
    let res = alu::offset16(0x000A, -2);
    assert_eq!(res.value, 0x0008);
    assert_eq!(res.flags & FLAG_C, FLAG_C);

    let res = alu::offset16(0x0000, -1);
    assert_eq!(res.value, 0xFFFF);
    assert_eq!(res.flags & (FLAG_H | FLAG_C), 0);
}

#[test]
fn rotate_through_carry() {
    let res = alu::rotate(0b1011_0010, 1, ShiftDirection::Left, false);
    assert_eq!(res.value8(), 0b0110_0101);
    assert_eq!(res.flags & FLAG_C, FLAG_C);

    let res = alu::rotate(0b0000_0001, 0, ShiftDirection::Right, false);
    assert_eq!(res.value8(), 0);
    // Accumulator form: Z is forced clear even for a zero result.
    assert_eq!(res.flags & FLAG_Z, 0);
    assert_eq!(res.affected & FLAG_Z, FLAG_Z);

    let res = alu::rotate(0b0000_0001, 0, ShiftDirection::Right, true);
    assert_eq!(res.flags & FLAG_Z, FLAG_Z);
}

#[test]
fn rotate_with_carry_wraps() {
    let res = alu::rotate_carry(0b1000_0000, ShiftDirection::Left, true);
    assert_eq!(res.value8(), 0b0000_0001);
    assert_eq!(res.flags & FLAG_C, FLAG_C);

    let res = alu::rotate_carry(0b0000_0001, ShiftDirection::Right, true);
    assert_eq!(res.value8(), 0b1000_0000);
    assert_eq!(res.flags & FLAG_C, FLAG_C);
}

#[test]
fn shifts() {
    let res = alu::shift(0b1000_0001, ShiftDirection::Left, false);
    assert_eq!(res.value8(), 0b0000_0010);
    assert_eq!(res.flags & FLAG_C, FLAG_C);

    // Arithmetic right keeps the sign bit.
    let res = alu::shift(0b1000_0010, ShiftDirection::Right, false);
    assert_eq!(res.value8(), 0b1100_0001);
    assert_eq!(res.flags & FLAG_C, 0);

    // Logical right does not.
    let res = alu::shift(0b1000_0010, ShiftDirection::Right, true);
    assert_eq!(res.value8(), 0b0100_0001);
}

#[test]
fn swap_exchanges_nibbles() {
    let res = alu::swap(0xA5);
    assert_eq!(res.value8(), 0x5A);
    assert_eq!(res.flags, 0);
    assert_eq!(alu::swap(0).flags, FLAG_Z);
}

#[test]
fn bit_ops() {
    let res = alu::test_bit(7, 0x7F);
    assert_eq!(res.flags & FLAG_Z, FLAG_Z);
    assert_eq!(res.flags & FLAG_H, FLAG_H);
    // BIT leaves carry alone.
    assert_eq!(res.affected & FLAG_C, 0);

    assert_eq!(alu::set_bit(3, 0x00).value8(), 0x08);
    assert_eq!(alu::reset_bit(3, 0xFF).value8(), 0xF7);
    assert_eq!(alu::set_bit(3, 0x00).affected, 0);
}

#[test]
fn daa_after_addition() {
    // 0x15 + 0x27 = 0x3C, which DAA corrects to BCD 42.
    let add = alu::add8(0x15, 0x27, 0);
    let res = alu::daa(add.value8(), add.flags);
    assert_eq!(res.value8(), 0x42);
    assert_eq!(res.flags & FLAG_C, 0);

    // 0x99 + 0x01 = 0x9A -> 0x00 with carry.
    let add = alu::add8(0x99, 0x01, 0);
    let res = alu::daa(add.value8(), add.flags);
    assert_eq!(res.value8(), 0x00);
    assert_eq!(res.flags & (FLAG_Z | FLAG_C), FLAG_Z | FLAG_C);
}

#[test]
fn daa_after_subtraction() {
    // 0x42 - 0x15 = 0x2D with a half-borrow; DAA corrects to BCD 27.
    let sub = alu::sub8(0x42, 0x15, 0);
    let res = alu::daa(sub.value8(), sub.flags | FLAG_N);
    assert_eq!(res.value8(), 0x27);
    // N itself is preserved rather than affected.
    assert_eq!(res.affected & FLAG_N, 0);
}
