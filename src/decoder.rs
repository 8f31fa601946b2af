//! Opcode decoding.
//!
//! The 256-entry base and CB-prefixed opcode spaces are decoded lazily into
//! [`Instruction`] descriptors and memoized, so repeated execution of the
//! same opcode returns the same cached descriptor. Decoding follows the
//! block structure of the encoding: the top two opcode bits select one of
//! four layouts, and register/condition fields are sliced out of the
//! remaining bits.

use crate::{
    cpu::Cpu,
    error::EmuError,
    instruction::{Cond, Handler, Instruction, Kind, Operand, OperandKind, R8, R16, R16Mem, R16Stk},
};

pub struct Decoder {
    base: [Option<Instruction>; 256],
    prefixed: [Option<Instruction>; 256],
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            base: [None; 256],
            prefixed: [None; 256],
        }
    }

    /// Decode a base-space opcode. The eleven undefined opcodes are a hard
    /// error; everything else yields a cached descriptor.
    pub fn decode(&mut self, opcode: u8) -> Result<&Instruction, EmuError> {
        if self.base[opcode as usize].is_none() {
            self.base[opcode as usize] = Some(decode_base(opcode)?);
        }
        match &self.base[opcode as usize] {
            Some(inst) => Ok(inst),
            None => unreachable!(),
        }
    }

    /// Decode a CB-prefixed opcode. This space has no holes.
    pub fn decode_prefixed(&mut self, opcode: u8) -> &Instruction {
        self.prefixed[opcode as usize].get_or_insert_with(|| decode_cb(opcode))
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_base(opcode: u8) -> Result<Instruction, EmuError> {
    match opcode >> 6 {
        0 => decode_block0(opcode),
        1 => Ok(decode_block1(opcode)),
        2 => Ok(decode_block2(opcode)),
        _ => decode_block3(opcode),
    }
}

fn r8_op(r: R8) -> Operand {
    Operand::new(OperandKind::R8(r))
}

fn imm8() -> Operand {
    Operand::new(OperandKind::Imm8)
}

fn imm16() -> Operand {
    Operand::new(OperandKind::Imm16)
}

fn cond_op(opcode: u8) -> Operand {
    Operand::new(OperandKind::Cond(Cond::from_bits(opcode >> 3)))
}

/// Opcodes 0x00-0x3F: misc singletons, r16 column ops, r8 row ops and the
/// relative jumps.
fn decode_block0(opcode: u8) -> Result<Instruction, EmuError> {
    match opcode {
        0x00 => return Ok(Instruction::new(opcode, Kind::Nop, Cpu::nop)),
        // STOP carries a padding byte.
        0x10 => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Stop,
                Cpu::stop,
                &[imm8()],
            ));
        }
        0x07 => return Ok(Instruction::new(opcode, Kind::Rlca, Cpu::rotate_accumulator)),
        0x0F => return Ok(Instruction::new(opcode, Kind::Rrca, Cpu::rotate_accumulator)),
        0x17 => return Ok(Instruction::new(opcode, Kind::Rla, Cpu::rotate_accumulator)),
        0x1F => return Ok(Instruction::new(opcode, Kind::Rra, Cpu::rotate_accumulator)),
        0x27 => return Ok(Instruction::new(opcode, Kind::Daa, Cpu::daa)),
        0x2F => return Ok(Instruction::new(opcode, Kind::Cpl, Cpu::cpl)),
        0x37 => return Ok(Instruction::new(opcode, Kind::Scf, Cpu::scf)),
        0x3F => return Ok(Instruction::new(opcode, Kind::Ccf, Cpu::ccf)),
        0x18 => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Jr,
                Cpu::jr,
                &[imm8()],
            ));
        }
        0x08 => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Ld,
                Cpu::ld_imm16_ind_sp,
                &[Operand::indirect(OperandKind::Imm16), Operand::new(OperandKind::R16(R16::Sp))],
            ));
        }
        _ => {}
    }

    let r16 = Operand::new(OperandKind::R16(R16::from_bits(opcode >> 4)));
    let r16mem = Operand::indirect(OperandKind::R16Mem(R16Mem::from_bits(opcode >> 4)));
    match opcode & 0x0F {
        0x01 => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Ld,
                Cpu::ld_r16_imm16,
                &[r16, imm16()],
            ));
        }
        0x02 => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Ld,
                Cpu::ld_r16mem_a,
                &[r16mem, r8_op(R8::A)],
            ));
        }
        0x0A => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Ld,
                Cpu::ld_a_r16mem,
                &[r8_op(R8::A), r16mem],
            ));
        }
        0x03 => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Inc,
                Cpu::inc_dec_r16,
                &[r16],
            ));
        }
        0x0B => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Dec,
                Cpu::inc_dec_r16,
                &[r16],
            ));
        }
        0x09 => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Add,
                Cpu::add_hl_r16,
                &[Operand::new(OperandKind::R16(R16::Hl)), r16],
            ));
        }
        _ => {}
    }

    let r8 = r8_op(R8::from_bits(opcode >> 3));
    match opcode & 0x07 {
        0x04 => Ok(Instruction::with_operands(
            opcode,
            Kind::Inc,
            Cpu::inc_dec_r8,
            &[r8],
        )),
        0x05 => Ok(Instruction::with_operands(
            opcode,
            Kind::Dec,
            Cpu::inc_dec_r8,
            &[r8],
        )),
        0x06 => Ok(Instruction::with_operands(
            opcode,
            Kind::Ld,
            Cpu::ld_r8_imm8,
            &[r8, imm8()],
        )),
        // JR cc,e8 sits at 0b001cc000.
        0x00 if opcode & 0x20 != 0 => Ok(Instruction::with_operands(
            opcode,
            Kind::Jr,
            Cpu::jr,
            &[cond_op(opcode), imm8()],
        )),
        _ => Err(EmuError::UnknownOpcode { opcode }),
    }
}

/// Opcodes 0x40-0x7F: the LD r8,r8 quadrant, with HALT in the slot that
/// would be LD (HL),(HL).
fn decode_block1(opcode: u8) -> Instruction {
    if opcode == 0x76 {
        return Instruction::new(opcode, Kind::Halt, Cpu::halt);
    }
    Instruction::with_operands(
        opcode,
        Kind::Ld,
        Cpu::ld_r8_r8,
        &[r8_op(R8::from_bits(opcode >> 3)), r8_op(R8::from_bits(opcode))],
    )
}

/// Opcodes 0x80-0xBF: accumulator arithmetic against r8 operands.
fn decode_block2(opcode: u8) -> Instruction {
    Instruction::with_operands(
        opcode,
        alu_kind(opcode >> 3),
        Cpu::alu_a_r8,
        &[r8_op(R8::A), r8_op(R8::from_bits(opcode))],
    )
}

fn alu_kind(bits: u8) -> Kind {
    match bits & 0x07 {
        0 => Kind::Add,
        1 => Kind::Adc,
        2 => Kind::Sub,
        3 => Kind::Sbc,
        4 => Kind::And,
        5 => Kind::Xor,
        6 => Kind::Or,
        _ => Kind::Cp,
    }
}

/// Opcodes 0xC0-0xFF: fixed singletons, conditional control flow, stack
/// ops and restarts. All eleven undefined opcodes live here.
fn decode_block3(opcode: u8) -> Result<Instruction, EmuError> {
    match opcode {
        0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
            return Ok(Instruction::with_operands(
                opcode,
                alu_kind(opcode >> 3),
                Cpu::alu_a_imm8,
                &[r8_op(R8::A), imm8()],
            ));
        }
        0xC3 => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Jp,
                Cpu::jp,
                &[imm16()],
            ));
        }
        0xE9 => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Jp,
                Cpu::jp_hl,
                &[Operand::new(OperandKind::R16(R16::Hl))],
            ));
        }
        0xC9 => return Ok(Instruction::new(opcode, Kind::Ret, Cpu::ret)),
        0xD9 => return Ok(Instruction::new(opcode, Kind::Reti, Cpu::reti)),
        0xCD => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Call,
                Cpu::call,
                &[imm16()],
            ));
        }
        0xCB => return Ok(Instruction::new(opcode, Kind::Prefix, Cpu::prefix)),
        0xE0 => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Ldh,
                Cpu::ldh_imm8_a,
                &[Operand::indirect(OperandKind::Imm8), r8_op(R8::A)],
            ));
        }
        0xF0 => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Ldh,
                Cpu::ldh_a_imm8,
                &[r8_op(R8::A), Operand::indirect(OperandKind::Imm8)],
            ));
        }
        0xE2 => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Ldh,
                Cpu::ldh_c_a,
                &[Operand::indirect(OperandKind::R8(R8::C)), r8_op(R8::A)],
            ));
        }
        0xF2 => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Ldh,
                Cpu::ldh_a_c,
                &[r8_op(R8::A), Operand::indirect(OperandKind::R8(R8::C))],
            ));
        }
        0xEA => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Ld,
                Cpu::ld_imm16_ind_a,
                &[Operand::indirect(OperandKind::Imm16), r8_op(R8::A)],
            ));
        }
        0xFA => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Ld,
                Cpu::ld_a_imm16_ind,
                &[r8_op(R8::A), Operand::indirect(OperandKind::Imm16)],
            ));
        }
        0xE8 => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Add,
                Cpu::add_sp_imm8,
                &[Operand::new(OperandKind::R16(R16::Sp)), imm8()],
            ));
        }
        0xF8 => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Ld,
                Cpu::ld_hl_sp_imm8,
                &[
                    Operand::new(OperandKind::R16(R16::Hl)),
                    Operand::new(OperandKind::R16(R16::Sp)),
                    imm8(),
                ],
            ));
        }
        0xF9 => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Ld,
                Cpu::ld_sp_hl,
                &[
                    Operand::new(OperandKind::R16(R16::Sp)),
                    Operand::new(OperandKind::R16(R16::Hl)),
                ],
            ));
        }
        0xF3 => return Ok(Instruction::new(opcode, Kind::Di, Cpu::di)),
        0xFB => return Ok(Instruction::new(opcode, Kind::Ei, Cpu::ei)),
        _ => {}
    }

    let stk = Operand::new(OperandKind::R16Stk(R16Stk::from_bits(opcode >> 4)));
    match opcode & 0x0F {
        0x01 => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Pop,
                Cpu::pop_r16stk,
                &[stk],
            ));
        }
        0x05 => {
            return Ok(Instruction::with_operands(
                opcode,
                Kind::Push,
                Cpu::push_r16stk,
                &[stk],
            ));
        }
        _ => {}
    }

    // Conditional forms only exist in the 0xC0-0xDF half; their bit
    // patterns in the upper half are the undefined opcodes.
    match opcode & 0x07 {
        0x00 if opcode & 0x20 == 0 => Ok(Instruction::with_operands(
            opcode,
            Kind::Ret,
            Cpu::ret,
            &[cond_op(opcode)],
        )),
        0x02 if opcode & 0x20 == 0 => Ok(Instruction::with_operands(
            opcode,
            Kind::Jp,
            Cpu::jp,
            &[cond_op(opcode), imm16()],
        )),
        0x04 if opcode & 0x20 == 0 => Ok(Instruction::with_operands(
            opcode,
            Kind::Call,
            Cpu::call,
            &[cond_op(opcode), imm16()],
        )),
        0x07 => Ok(Instruction::with_operands(
            opcode,
            Kind::Rst,
            Cpu::rst,
            &[Operand::new(OperandKind::RstTarget(
                (opcode as u16 >> 3 & 0x07) * 8,
            ))],
        )),
        _ => Err(EmuError::UnknownOpcode { opcode }),
    }
}

/// CB space: rotates/shifts/swap in the low quarter, then BIT, RES and SET
/// with the bit index in bits 3-5 and the target register in bits 0-2.
fn decode_cb(opcode: u8) -> Instruction {
    let target = r8_op(R8::from_bits(opcode));
    match opcode >> 6 {
        0 => {
            let kind = match (opcode >> 3) & 0x07 {
                0 => Kind::Rlc,
                1 => Kind::Rrc,
                2 => Kind::Rl,
                3 => Kind::Rr,
                4 => Kind::Sla,
                5 => Kind::Sra,
                6 => Kind::Swap,
                _ => Kind::Srl,
            };
            Instruction::with_operands(opcode, kind, Cpu::cb_rotate_shift, &[target])
        }
        family => {
            let bit = Operand::new(OperandKind::Bit((opcode >> 3) & 0x07));
            let (kind, handler) = match family {
                1 => (Kind::Bit, Cpu::cb_bit as Handler),
                2 => (Kind::Res, Cpu::cb_res_set as Handler),
                _ => (Kind::Set, Cpu::cb_res_set as Handler),
            };
            Instruction::with_operands(opcode, kind, handler, &[bit, target])
        }
    }
}
