//! Instruction descriptors produced by the decoder and consumed by the CPU.
//!
//! A descriptor pairs an instruction kind with up to three typed operands
//! and the handler function that executes it. Descriptors are immutable
//! once built; the decoder caches them per opcode.

use crate::{bus::Bus, cpu::Cpu, error::EmuError};

/// Instruction family. Addressing variants are carried by the operands,
/// not by the kind (one `Ld` covers every load form).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Nop,
    Stop,
    Halt,
    Ld,
    Ldh,
    Inc,
    Dec,
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
    Daa,
    Cpl,
    Scf,
    Ccf,
    Jp,
    Jr,
    Call,
    Ret,
    Reti,
    Rst,
    Push,
    Pop,
    Di,
    Ei,
    Rlca,
    Rrca,
    Rla,
    Rra,
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Srl,
    Swap,
    Bit,
    Res,
    Set,
    /// The 0xCB escape byte; triggers a second fetch and decode.
    Prefix,
}

/// 8-bit register operand in hardware encoding order. Index 6 is the
/// memory cell addressed by HL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum R8 {
    B,
    C,
    D,
    E,
    H,
    L,
    HlInd,
    A,
}

impl R8 {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => R8::B,
            1 => R8::C,
            2 => R8::D,
            3 => R8::E,
            4 => R8::H,
            5 => R8::L,
            6 => R8::HlInd,
            _ => R8::A,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum R16 {
    Bc,
    De,
    Hl,
    Sp,
}

impl R16 {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => R16::Bc,
            1 => R16::De,
            2 => R16::Hl,
            _ => R16::Sp,
        }
    }
}

/// Register pairs addressable by PUSH/POP (AF replaces SP).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum R16Stk {
    Bc,
    De,
    Hl,
    Af,
}

impl R16Stk {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => R16Stk::Bc,
            1 => R16Stk::De,
            2 => R16Stk::Hl,
            _ => R16Stk::Af,
        }
    }
}

/// Register pairs usable as load addresses. The HL variants post-increment
/// or post-decrement the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum R16Mem {
    Bc,
    De,
    HlInc,
    HlDec,
}

impl R16Mem {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => R16Mem::Bc,
            1 => R16Mem::De,
            2 => R16Mem::HlInc,
            _ => R16Mem::HlDec,
        }
    }
}

/// Branch condition tested against the flags register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Nz,
    Z,
    Nc,
    C,
}

impl Cond {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Cond::Nz,
            1 => Cond::Z,
            2 => Cond::Nc,
            _ => Cond::C,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    R8(R8),
    R16(R16),
    R16Stk(R16Stk),
    R16Mem(R16Mem),
    Cond(Cond),
    /// Bit index 0-7 for BIT/RES/SET.
    Bit(u8),
    /// Restart target, already expanded to its absolute address.
    RstTarget(u16),
    Imm8,
    Imm16,
}

/// A typed operand. `address` marks indirection: the operand's value is a
/// memory address to load from or store to rather than the datum itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    pub kind: OperandKind,
    pub address: bool,
}

impl Operand {
    pub fn new(kind: OperandKind) -> Self {
        Self {
            kind,
            address: false,
        }
    }

    pub fn indirect(kind: OperandKind) -> Self {
        Self {
            kind,
            address: true,
        }
    }
}

/// Per-step execution outcome. Cycles are machine cycles; handlers add
/// their own costs on top of the opcode fetch.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstructionResult {
    pub cycles: u32,
}

impl InstructionResult {
    pub fn new() -> Self {
        Self { cycles: 0 }
    }
}

/// Handler signature every instruction is bound to at decode time.
pub type Handler =
    fn(&mut Cpu, &Instruction, &mut Bus, &mut InstructionResult) -> Result<(), EmuError>;

#[derive(Clone, Copy)]
pub struct Instruction {
    pub opcode: u8,
    pub kind: Kind,
    operands: [Option<Operand>; 3],
    /// Total encoded length in bytes, immediates included.
    pub size: u16,
    pub handler: Handler,
}

impl Instruction {
    pub fn new(opcode: u8, kind: Kind, handler: Handler) -> Self {
        Self {
            opcode,
            kind,
            operands: [None; 3],
            size: 1,
            handler,
        }
    }

    pub fn with_operands(opcode: u8, kind: Kind, handler: Handler, operands: &[Operand]) -> Self {
        let mut inst = Self::new(opcode, kind, handler);
        for (slot, op) in inst.operands.iter_mut().zip(operands) {
            *slot = Some(*op);
            inst.size += match op.kind {
                OperandKind::Imm8 => 1,
                OperandKind::Imm16 => 2,
                _ => 0,
            };
        }
        inst
    }

    pub fn operands(&self) -> impl Iterator<Item = &Operand> {
        self.operands.iter().flatten()
    }

    pub fn operand(&self, index: usize) -> &Operand {
        match &self.operands[index] {
            Some(op) => op,
            None => unreachable!("operand {index} missing on {:?}", self.kind),
        }
    }

    pub fn r8(&self, index: usize) -> R8 {
        match self.operand(index).kind {
            OperandKind::R8(r) => r,
            _ => unreachable!("operand {index} of {:?} is not r8", self.kind),
        }
    }

    pub fn r16(&self, index: usize) -> R16 {
        match self.operand(index).kind {
            OperandKind::R16(r) => r,
            _ => unreachable!("operand {index} of {:?} is not r16", self.kind),
        }
    }

    pub fn r16stk(&self, index: usize) -> R16Stk {
        match self.operand(index).kind {
            OperandKind::R16Stk(r) => r,
            _ => unreachable!("operand {index} of {:?} is not r16stk", self.kind),
        }
    }

    pub fn r16mem(&self, index: usize) -> R16Mem {
        match self.operand(index).kind {
            OperandKind::R16Mem(r) => r,
            _ => unreachable!("operand {index} of {:?} is not r16mem", self.kind),
        }
    }

    pub fn cond(&self, index: usize) -> Cond {
        match self.operand(index).kind {
            OperandKind::Cond(c) => c,
            _ => unreachable!("operand {index} of {:?} is not a condition", self.kind),
        }
    }

    pub fn bit(&self, index: usize) -> u8 {
        match self.operand(index).kind {
            OperandKind::Bit(b) => b,
            _ => unreachable!("operand {index} of {:?} is not a bit index", self.kind),
        }
    }

    pub fn rst_target(&self, index: usize) -> u16 {
        match self.operand(index).kind {
            OperandKind::RstTarget(t) => t,
            _ => unreachable!("operand {index} of {:?} is not a restart target", self.kind),
        }
    }
}

impl std::fmt::Debug for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instruction")
            .field("opcode", &self.opcode)
            .field("kind", &self.kind)
            .field("operands", &self.operands)
            .field("size", &self.size)
            .finish()
    }
}
