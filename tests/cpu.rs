use dotmatrix::error::EmuError;
use dotmatrix::GameBoy;

/// Machine with `program` in work RAM and PC pointed at it.
fn machine(program: &[u8]) -> GameBoy {
    let mut gb = GameBoy::new();
    gb.bus.copy(0xC000, program);
    gb.cpu.regs.pc = 0xC000;
    gb
}

#[test]
fn ld_r16_imm16_takes_three_cycles() {
    let mut gb = machine(&[0x01, 0x34, 0x12]); // LD BC,0x1234
    assert_eq!(gb.step().unwrap(), 3);
    assert_eq!(gb.cpu.regs.bc(), 0x1234);
}

#[test]
fn memory_indirect_access_costs_an_extra_cycle() {
    let mut gb = machine(&[0x7E, 0x34]); // LD A,(HL) ; INC (HL)
    gb.cpu.regs.set_hl(0xC010);
    gb.bus.set(0xC010, 0x42);
    assert_eq!(gb.step().unwrap(), 2);
    assert_eq!(gb.cpu.regs.a, 0x42);
    assert_eq!(gb.step().unwrap(), 3);
    assert_eq!(gb.bus.get(0xC010), 0x43);
}

#[test]
fn push_takes_four_cycles_pop_three() {
    let mut gb = machine(&[0x01, 0x34, 0x12, 0xC5, 0xD1]); // LD BC ; PUSH BC ; POP DE
    let sp = gb.cpu.regs.sp;
    gb.step().unwrap();
    assert_eq!(gb.step().unwrap(), 4);
    assert_eq!(gb.cpu.regs.sp, sp.wrapping_sub(2));
    assert_eq!(gb.step().unwrap(), 3);
    assert_eq!(gb.cpu.regs.de(), 0x1234);
    assert_eq!(gb.cpu.regs.sp, sp);
}

#[test]
fn pop_af_keeps_the_flag_low_nibble_clear() {
    let mut gb = machine(&[0x01, 0xFF, 0x12, 0xC5, 0xF1]); // LD BC,0x12FF ; PUSH BC ; POP AF
    gb.step().unwrap();
    gb.step().unwrap();
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.af(), 0x12F0);
}

#[test]
fn conditional_jumps_only_charge_when_taken() {
    // Z is set post-boot, so JR NZ falls through and JR Z branches.
    let mut gb = machine(&[0x20, 0x10, 0x28, 0x10]);
    assert_eq!(gb.step().unwrap(), 2);
    assert_eq!(gb.cpu.regs.pc, 0xC002);
    assert_eq!(gb.step().unwrap(), 3);
    assert_eq!(gb.cpu.regs.pc, 0xC014);
}

#[test]
fn jp_imm16_and_jp_hl() {
    let mut gb = machine(&[0xC3, 0x10, 0xC0]); // JP 0xC010
    gb.bus.set(0xC010, 0xE9); // JP HL
    gb.cpu.regs.set_hl(0xC020);
    assert_eq!(gb.step().unwrap(), 4);
    assert_eq!(gb.cpu.regs.pc, 0xC010);
    assert_eq!(gb.step().unwrap(), 1);
    assert_eq!(gb.cpu.regs.pc, 0xC020);
}

#[test]
fn call_and_ret_round_trip() {
    let mut gb = machine(&[0xCD, 0x10, 0xC0]); // CALL 0xC010
    gb.bus.set(0xC010, 0xC9); // RET
    let sp = gb.cpu.regs.sp;
    assert_eq!(gb.step().unwrap(), 6);
    assert_eq!(gb.cpu.regs.pc, 0xC010);
    assert_eq!(gb.bus.get16(gb.cpu.regs.sp), 0xC003);
    assert_eq!(gb.step().unwrap(), 4);
    assert_eq!(gb.cpu.regs.pc, 0xC003);
    assert_eq!(gb.cpu.regs.sp, sp);
}

#[test]
fn conditional_ret_cycles() {
    // Z set: RET NZ falls through (2), RET Z returns (5).
    let mut gb = machine(&[0xC0, 0xC8]);
    gb.cpu.regs.sp = 0xC100;
    gb.bus.set16(0xC100, 0xC050);
    assert_eq!(gb.step().unwrap(), 2);
    assert_eq!(gb.step().unwrap(), 5);
    assert_eq!(gb.cpu.regs.pc, 0xC050);
}

#[test]
fn rst_pushes_and_vectors() {
    let mut gb = machine(&[0xEF]); // RST 0x28
    let sp = gb.cpu.regs.sp;
    assert_eq!(gb.step().unwrap(), 4);
    assert_eq!(gb.cpu.regs.pc, 0x0028);
    assert_eq!(gb.cpu.regs.sp, sp.wrapping_sub(2));
    assert_eq!(gb.bus.get16(gb.cpu.regs.sp), 0xC001);
}

#[test]
fn ldh_reaches_high_ram() {
    let mut gb = machine(&[0x3E, 0x5A, 0xE0, 0x80, 0x3E, 0x00, 0xF0, 0x80]);
    gb.step().unwrap(); // LD A,0x5A
    assert_eq!(gb.step().unwrap(), 3); // LDH (0x80),A
    assert_eq!(gb.bus.get(0xFF80), 0x5A);
    gb.step().unwrap(); // LD A,0
    assert_eq!(gb.step().unwrap(), 3); // LDH A,(0x80)
    assert_eq!(gb.cpu.regs.a, 0x5A);
}

#[test]
fn hl_post_increment_and_decrement_loads() {
    let mut gb = machine(&[0x22, 0x3A]); // LD (HL+),A ; LD A,(HL-)
    gb.cpu.regs.a = 0x77;
    gb.cpu.regs.set_hl(0xC040);
    gb.step().unwrap();
    assert_eq!(gb.bus.get(0xC040), 0x77);
    assert_eq!(gb.cpu.regs.hl(), 0xC041);
    gb.bus.set(0xC041, 0x33);
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.a, 0x33);
    assert_eq!(gb.cpu.regs.hl(), 0xC040);
}

#[test]
fn prefixed_instructions_cost_the_extra_fetch() {
    let mut gb = machine(&[0xCB, 0x37, 0xCB, 0xC6]); // SWAP A ; SET 0,(HL)
    gb.cpu.regs.a = 0xA5;
    gb.cpu.regs.set_hl(0xC020);
    assert_eq!(gb.step().unwrap(), 2);
    assert_eq!(gb.cpu.regs.a, 0x5A);
    assert_eq!(gb.step().unwrap(), 4);
    assert_eq!(gb.bus.get(0xC020), 0x01);
}

#[test]
fn add_sp_and_ld_hl_sp_offset() {
    let mut gb = machine(&[0xF8, 0x02, 0xE8, 0xFE]); // LD HL,SP+2 ; ADD SP,-2
    gb.cpu.regs.sp = 0xFFF0;
    assert_eq!(gb.step().unwrap(), 3);
    assert_eq!(gb.cpu.regs.hl(), 0xFFF2);
    assert_eq!(gb.step().unwrap(), 4);
    assert_eq!(gb.cpu.regs.sp, 0xFFEE);
}

#[test]
fn undefined_opcode_is_a_hard_error() {
    let mut gb = machine(&[0xD3]);
    assert!(matches!(
        gb.step(),
        Err(EmuError::UnknownOpcode { opcode: 0xD3 })
    ));
}

#[test]
fn step_frame_returns_even_with_the_lcd_disabled() {
    // LD A,0x11 ; LDH (0x40),A ; JR -2 — park the PPU, then spin.
    let mut gb = machine(&[0x3E, 0x11, 0xE0, 0x40, 0x18, 0xFE]);
    gb.step_frame().unwrap();
    gb.step_frame().unwrap();
    assert_eq!(gb.bus.ppu.ly(), 0);
    assert!(!gb.bus.ppu.frame_ready());
}

#[test]
fn arithmetic_loop_leaves_a_at_24() {
    // A = 5; A += 3; A -= 2; then multiply by 4 with a counted loop of
    // three further additions of the intermediate value.
    let mut gb = machine(&[
        0x3E, 0x05, // LD A,5
        0xC6, 0x03, // ADD A,3
        0xD6, 0x02, // SUB A,2
        0x4F, // LD C,A
        0x06, 0x03, // LD B,3
        0x81, // ADD A,C
        0x05, // DEC B
        0x20, 0xFC, // JR NZ,-4
        0x76, // HALT
    ]);
    while !gb.cpu.halted {
        gb.step().unwrap();
    }
    assert_eq!(gb.cpu.regs.a, 24);
}
