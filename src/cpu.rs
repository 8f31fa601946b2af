//! LR35902 CPU core.
//!
//! Each [`Cpu::step`] either services one pending interrupt or executes one
//! instruction: fetch an opcode byte, decode it through the cached decoder,
//! and run the handler the descriptor is bound to. Handlers accumulate
//! their machine-cycle cost into the step's [`InstructionResult`]; the
//! opcode fetch itself costs one cycle, immediate fetches one per byte,
//! memory accesses one each, and taken branches or 16-bit register moves
//! add internal delay cycles.

use log::trace;

use crate::{
    alu::{self, ShiftDirection},
    bus::Bus,
    decoder::Decoder,
    error::EmuError,
    instruction::{
        Cond, Instruction, InstructionResult, Kind, OperandKind, R8, R16, R16Mem, R16Stk,
    },
    registers::{FLAG_C, FLAG_H, FLAG_N, FLAG_Z, Registers},
};

/// Interrupt sources in service priority order. The bit index in IF/IE
/// doubles as the index into the vector table at 0x40.
pub const INT_VBLANK: u8 = 0;
pub const INT_STAT: u8 = 1;
pub const INT_TIMER: u8 = 2;
pub const INT_SERIAL: u8 = 3;
pub const INT_JOYPAD: u8 = 4;

/// Fixed cost of delivering an interrupt, in machine cycles.
const INTERRUPT_CYCLES: u32 = 5;

pub struct Cpu {
    pub regs: Registers,
    pub decoder: Decoder,
    /// Interrupt master enable.
    pub ime: bool,
    /// Countdown armed by EI. It is decremented once per completed
    /// instruction and flips IME on when it hits zero, so the instruction
    /// after EI always runs before any interrupt is taken.
    ime_delay: u8,
    pub halted: bool,
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            decoder: Decoder::new(),
            ime: false,
            ime_delay: 0,
            halted: false,
        }
    }

    /// Run one step: deliver at most one interrupt, or fetch, decode and
    /// execute a single instruction.
    pub fn step(&mut self, bus: &mut Bus) -> Result<InstructionResult, EmuError> {
        if let Some(result) = self.service_interrupt(bus) {
            return Ok(result);
        }

        if self.halted {
            // A pending interrupt wakes the CPU even with IME clear; it
            // just is not serviced until IME comes back.
            if bus.pending_interrupts() == 0 {
                return Ok(InstructionResult { cycles: 1 });
            }
            self.halted = false;
        }

        let mut result = InstructionResult::new();
        let opcode = self.fetch8(bus, &mut result);
        let inst = *self.decoder.decode(opcode)?;
        (inst.handler)(self, &inst, bus, &mut result)?;
        self.tick_ime_delay();
        Ok(result)
    }

    /// Deliver the highest-priority pending-and-enabled interrupt, if IME
    /// allows. Clears IME and the request bit, pushes PC and jumps to the
    /// fixed vector.
    fn service_interrupt(&mut self, bus: &mut Bus) -> Option<InstructionResult> {
        if !self.ime {
            return None;
        }
        let pending = bus.pending_interrupts();
        if pending == 0 {
            return None;
        }
        let index = pending.trailing_zeros() as u16;
        let vector = 0x40 + 8 * index;
        self.halted = false;
        self.ime = false;
        bus.if_reg &= !(1 << index);

        let mut result = InstructionResult::new();
        self.push16(bus, self.regs.pc, &mut result);
        self.regs.pc = vector;
        trace!("interrupt {index} serviced, vector {vector:#06x}");
        Some(InstructionResult {
            cycles: INTERRUPT_CYCLES,
        })
    }

    fn tick_ime_delay(&mut self) {
        if self.ime || self.ime_delay == 0 {
            return;
        }
        self.ime_delay -= 1;
        if self.ime_delay == 0 {
            self.ime = true;
        }
    }

    /// Arm the delayed IME enable used by EI and RETI.
    fn arm_ime(&mut self) {
        if !self.ime && self.ime_delay == 0 {
            self.ime_delay = 2;
        }
    }

    pub fn debug_state(&self) -> String {
        let r = &self.regs;
        format!(
            "AF={:04x} BC={:04x} DE={:04x} HL={:04x} SP={:04x} PC={:04x} IME={}",
            r.af(),
            r.bc(),
            r.de(),
            r.hl(),
            r.sp,
            r.pc,
            self.ime as u8,
        )
    }

    // ---- memory and operand plumbing ----

    fn fetch8(&mut self, bus: &mut Bus, result: &mut InstructionResult) -> u8 {
        let val = bus.get(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        result.cycles += 1;
        val
    }

    fn fetch16(&mut self, bus: &mut Bus, result: &mut InstructionResult) -> u16 {
        let lo = self.fetch8(bus, result);
        let hi = self.fetch8(bus, result);
        u16::from_le_bytes([lo, hi])
    }

    fn read8(&mut self, bus: &mut Bus, addr: u16, result: &mut InstructionResult) -> u8 {
        result.cycles += 1;
        bus.get(addr)
    }

    fn write8(&mut self, bus: &mut Bus, addr: u16, val: u8, result: &mut InstructionResult) {
        result.cycles += 1;
        bus.set(addr, val);
    }

    /// Push a word, high byte first. Costs 3 cycles (internal delay plus
    /// two writes).
    fn push16(&mut self, bus: &mut Bus, val: u16, result: &mut InstructionResult) {
        let [hi, lo] = val.to_be_bytes();
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.set(self.regs.sp, hi);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.set(self.regs.sp, lo);
        result.cycles += 3;
    }

    /// Pop a word. Costs 2 cycles.
    fn pop16(&mut self, bus: &mut Bus, result: &mut InstructionResult) -> u16 {
        let lo = bus.get(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = bus.get(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        result.cycles += 2;
        u16::from_le_bytes([lo, hi])
    }

    fn get_r8(&mut self, r: R8, bus: &mut Bus, result: &mut InstructionResult) -> u8 {
        match r {
            R8::B => self.regs.b,
            R8::C => self.regs.c,
            R8::D => self.regs.d,
            R8::E => self.regs.e,
            R8::H => self.regs.h,
            R8::L => self.regs.l,
            R8::HlInd => self.read8(bus, self.regs.hl(), result),
            R8::A => self.regs.a,
        }
    }

    fn set_r8(&mut self, r: R8, val: u8, bus: &mut Bus, result: &mut InstructionResult) {
        match r {
            R8::B => self.regs.b = val,
            R8::C => self.regs.c = val,
            R8::D => self.regs.d = val,
            R8::E => self.regs.e = val,
            R8::H => self.regs.h = val,
            R8::L => self.regs.l = val,
            R8::HlInd => self.write8(bus, self.regs.hl(), val, result),
            R8::A => self.regs.a = val,
        }
    }

    fn get_r16(&self, r: R16) -> u16 {
        match r {
            R16::Bc => self.regs.bc(),
            R16::De => self.regs.de(),
            R16::Hl => self.regs.hl(),
            R16::Sp => self.regs.sp,
        }
    }

    fn set_r16(&mut self, r: R16, val: u16) {
        match r {
            R16::Bc => self.regs.set_bc(val),
            R16::De => self.regs.set_de(val),
            R16::Hl => self.regs.set_hl(val),
            R16::Sp => self.regs.sp = val,
        }
    }

    fn get_r16stk(&self, r: R16Stk) -> u16 {
        match r {
            R16Stk::Bc => self.regs.bc(),
            R16Stk::De => self.regs.de(),
            R16Stk::Hl => self.regs.hl(),
            R16Stk::Af => self.regs.af(),
        }
    }

    fn set_r16stk(&mut self, r: R16Stk, val: u16) {
        match r {
            R16Stk::Bc => self.regs.set_bc(val),
            R16Stk::De => self.regs.set_de(val),
            R16Stk::Hl => self.regs.set_hl(val),
            R16Stk::Af => self.regs.set_af(val),
        }
    }

    /// Resolve a load address from a register pair, applying the HL
    /// post-increment/decrement where the encoding asks for it.
    fn r16mem_addr(&mut self, m: R16Mem) -> u16 {
        match m {
            R16Mem::Bc => self.regs.bc(),
            R16Mem::De => self.regs.de(),
            R16Mem::HlInc => {
                let addr = self.regs.hl();
                self.regs.set_hl(addr.wrapping_add(1));
                addr
            }
            R16Mem::HlDec => {
                let addr = self.regs.hl();
                self.regs.set_hl(addr.wrapping_sub(1));
                addr
            }
        }
    }

    fn cond_met(&self, c: Cond) -> bool {
        match c {
            Cond::Nz => !self.regs.flag(FLAG_Z),
            Cond::Z => self.regs.flag(FLAG_Z),
            Cond::Nc => !self.regs.flag(FLAG_C),
            Cond::C => self.regs.flag(FLAG_C),
        }
    }

    /// Whether a branch should be taken. Unconditional forms have no
    /// condition operand and always branch.
    fn branch_taken(&self, inst: &Instruction) -> bool {
        match inst.operands().next() {
            Some(op) => match op.kind {
                OperandKind::Cond(c) => self.cond_met(c),
                _ => true,
            },
            None => true,
        }
    }

    // ---- load handlers ----

    pub(crate) fn nop(
        &mut self,
        _inst: &Instruction,
        _bus: &mut Bus,
        _result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        Ok(())
    }

    pub(crate) fn stop(
        &mut self,
        _inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        // Consume the padding byte and idle like HALT until an interrupt
        // request arrives.
        let _ = self.fetch8(bus, result);
        self.halted = true;
        Ok(())
    }

    pub(crate) fn ld_r16_imm16(
        &mut self,
        inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let val = self.fetch16(bus, result);
        self.set_r16(inst.r16(0), val);
        Ok(())
    }

    pub(crate) fn ld_r16mem_a(
        &mut self,
        inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let addr = self.r16mem_addr(inst.r16mem(0));
        self.write8(bus, addr, self.regs.a, result);
        Ok(())
    }

    pub(crate) fn ld_a_r16mem(
        &mut self,
        inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let addr = self.r16mem_addr(inst.r16mem(1));
        self.regs.a = self.read8(bus, addr, result);
        Ok(())
    }

    pub(crate) fn ld_imm16_ind_sp(
        &mut self,
        _inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let addr = self.fetch16(bus, result);
        let [hi, lo] = self.regs.sp.to_be_bytes();
        self.write8(bus, addr, lo, result);
        self.write8(bus, addr.wrapping_add(1), hi, result);
        Ok(())
    }

    pub(crate) fn ld_r8_imm8(
        &mut self,
        inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let val = self.fetch8(bus, result);
        self.set_r8(inst.r8(0), val, bus, result);
        Ok(())
    }

    pub(crate) fn ld_r8_r8(
        &mut self,
        inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let val = self.get_r8(inst.r8(1), bus, result);
        self.set_r8(inst.r8(0), val, bus, result);
        Ok(())
    }

    pub(crate) fn ldh_imm8_a(
        &mut self,
        _inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let offset = self.fetch8(bus, result);
        self.write8(bus, 0xFF00 | offset as u16, self.regs.a, result);
        Ok(())
    }

    pub(crate) fn ldh_a_imm8(
        &mut self,
        _inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let offset = self.fetch8(bus, result);
        self.regs.a = self.read8(bus, 0xFF00 | offset as u16, result);
        Ok(())
    }

    pub(crate) fn ldh_c_a(
        &mut self,
        _inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        self.write8(bus, 0xFF00 | self.regs.c as u16, self.regs.a, result);
        Ok(())
    }

    pub(crate) fn ldh_a_c(
        &mut self,
        _inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        self.regs.a = self.read8(bus, 0xFF00 | self.regs.c as u16, result);
        Ok(())
    }

    pub(crate) fn ld_imm16_ind_a(
        &mut self,
        _inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let addr = self.fetch16(bus, result);
        self.write8(bus, addr, self.regs.a, result);
        Ok(())
    }

    pub(crate) fn ld_a_imm16_ind(
        &mut self,
        _inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let addr = self.fetch16(bus, result);
        self.regs.a = self.read8(bus, addr, result);
        Ok(())
    }

    pub(crate) fn ld_hl_sp_imm8(
        &mut self,
        _inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let offset = self.fetch8(bus, result) as i8;
        let res = alu::offset16(self.regs.sp, offset);
        self.regs.set_hl(res.value);
        self.regs.apply_flags(&res);
        result.cycles += 1;
        Ok(())
    }

    pub(crate) fn ld_sp_hl(
        &mut self,
        _inst: &Instruction,
        _bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        self.regs.sp = self.regs.hl();
        result.cycles += 1;
        Ok(())
    }

    // ---- arithmetic handlers ----

    fn apply_alu_a(&mut self, kind: Kind, operand: u8) {
        let a = self.regs.a;
        let res = match kind {
            Kind::Add => alu::add8(a, operand, 0),
            Kind::Adc => alu::add8(a, operand, self.regs.carry_bit()),
            Kind::Sub => alu::sub8(a, operand, 0),
            Kind::Sbc => alu::sub8(a, operand, self.regs.carry_bit()),
            Kind::And => alu::and8(a, operand),
            Kind::Xor => alu::xor8(a, operand),
            Kind::Or => alu::or8(a, operand),
            Kind::Cp => alu::cmp8(a, operand),
            _ => unreachable!("{kind:?} is not an accumulator operation"),
        };
        self.regs.a = res.value8();
        self.regs.apply_flags(&res);
    }

    pub(crate) fn alu_a_r8(
        &mut self,
        inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let operand = self.get_r8(inst.r8(1), bus, result);
        self.apply_alu_a(inst.kind, operand);
        Ok(())
    }

    pub(crate) fn alu_a_imm8(
        &mut self,
        inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let operand = self.fetch8(bus, result);
        self.apply_alu_a(inst.kind, operand);
        Ok(())
    }

    pub(crate) fn inc_dec_r8(
        &mut self,
        inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let r = inst.r8(0);
        let val = self.get_r8(r, bus, result);
        let res = match inst.kind {
            Kind::Inc => alu::inc8(val),
            _ => alu::dec8(val),
        };
        self.set_r8(r, res.value8(), bus, result);
        self.regs.apply_flags(&res);
        Ok(())
    }

    pub(crate) fn inc_dec_r16(
        &mut self,
        inst: &Instruction,
        _bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let r = inst.r16(0);
        let res = match inst.kind {
            Kind::Inc => alu::inc16(self.get_r16(r)),
            _ => alu::dec16(self.get_r16(r)),
        };
        self.set_r16(r, res.value);
        result.cycles += 1;
        Ok(())
    }

    pub(crate) fn add_hl_r16(
        &mut self,
        inst: &Instruction,
        _bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let res = alu::add16(self.regs.hl(), self.get_r16(inst.r16(1)));
        self.regs.set_hl(res.value);
        self.regs.apply_flags(&res);
        result.cycles += 1;
        Ok(())
    }

    pub(crate) fn add_sp_imm8(
        &mut self,
        _inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let offset = self.fetch8(bus, result) as i8;
        let res = alu::offset16(self.regs.sp, offset);
        self.regs.sp = res.value;
        self.regs.apply_flags(&res);
        result.cycles += 2;
        Ok(())
    }

    pub(crate) fn daa(
        &mut self,
        _inst: &Instruction,
        _bus: &mut Bus,
        _result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let res = alu::daa(self.regs.a, self.regs.f);
        self.regs.a = res.value8();
        self.regs.apply_flags(&res);
        Ok(())
    }

    pub(crate) fn cpl(
        &mut self,
        _inst: &Instruction,
        _bus: &mut Bus,
        _result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        self.regs.a = !self.regs.a;
        self.regs.f |= FLAG_N | FLAG_H;
        Ok(())
    }

    pub(crate) fn scf(
        &mut self,
        _inst: &Instruction,
        _bus: &mut Bus,
        _result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        self.regs.f = (self.regs.f & FLAG_Z) | FLAG_C;
        Ok(())
    }

    pub(crate) fn ccf(
        &mut self,
        _inst: &Instruction,
        _bus: &mut Bus,
        _result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        self.regs.f = (self.regs.f & FLAG_Z) | ((self.regs.f ^ FLAG_C) & FLAG_C);
        Ok(())
    }

    /// RLCA/RRCA/RLA/RRA. Unlike their CB cousins these always clear Z.
    pub(crate) fn rotate_accumulator(
        &mut self,
        inst: &Instruction,
        _bus: &mut Bus,
        _result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let a = self.regs.a;
        let carry = self.regs.carry_bit();
        let res = match inst.kind {
            Kind::Rlca => alu::rotate_carry(a, ShiftDirection::Left, false),
            Kind::Rrca => alu::rotate_carry(a, ShiftDirection::Right, false),
            Kind::Rla => alu::rotate(a, carry, ShiftDirection::Left, false),
            Kind::Rra => alu::rotate(a, carry, ShiftDirection::Right, false),
            _ => unreachable!("{:?} is not an accumulator rotate", inst.kind),
        };
        self.regs.a = res.value8();
        self.regs.apply_flags(&res);
        Ok(())
    }

    // ---- control flow handlers ----

    pub(crate) fn jr(
        &mut self,
        inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        // The offset byte is fetched whether or not the branch is taken.
        let offset = self.fetch8(bus, result) as i8;
        if self.branch_taken(inst) {
            self.regs.pc = self.regs.pc.wrapping_add(offset as i16 as u16);
            result.cycles += 1;
        }
        Ok(())
    }

    pub(crate) fn jp(
        &mut self,
        inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let target = self.fetch16(bus, result);
        if self.branch_taken(inst) {
            self.regs.pc = target;
            result.cycles += 1;
        }
        Ok(())
    }

    pub(crate) fn jp_hl(
        &mut self,
        _inst: &Instruction,
        _bus: &mut Bus,
        _result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        self.regs.pc = self.regs.hl();
        Ok(())
    }

    pub(crate) fn call(
        &mut self,
        inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let target = self.fetch16(bus, result);
        if self.branch_taken(inst) {
            self.push16(bus, self.regs.pc, result);
            self.regs.pc = target;
        }
        Ok(())
    }

    pub(crate) fn ret(
        &mut self,
        inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        // The conditional forms spend an extra cycle testing the flag.
        if inst.operands().next().is_some() {
            result.cycles += 1;
        }
        if self.branch_taken(inst) {
            self.regs.pc = self.pop16(bus, result);
            result.cycles += 1;
        }
        Ok(())
    }

    pub(crate) fn reti(
        &mut self,
        _inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        self.regs.pc = self.pop16(bus, result);
        result.cycles += 1;
        self.arm_ime();
        Ok(())
    }

    pub(crate) fn rst(
        &mut self,
        inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        self.push16(bus, self.regs.pc, result);
        self.regs.pc = inst.rst_target(0);
        Ok(())
    }

    pub(crate) fn push_r16stk(
        &mut self,
        inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let val = self.get_r16stk(inst.r16stk(0));
        self.push16(bus, val, result);
        Ok(())
    }

    pub(crate) fn pop_r16stk(
        &mut self,
        inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let val = self.pop16(bus, result);
        self.set_r16stk(inst.r16stk(0), val);
        Ok(())
    }

    pub(crate) fn di(
        &mut self,
        _inst: &Instruction,
        _bus: &mut Bus,
        _result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        self.ime = false;
        self.ime_delay = 0;
        Ok(())
    }

    pub(crate) fn ei(
        &mut self,
        _inst: &Instruction,
        _bus: &mut Bus,
        _result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        self.arm_ime();
        Ok(())
    }

    pub(crate) fn halt(
        &mut self,
        _inst: &Instruction,
        _bus: &mut Bus,
        _result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        self.halted = true;
        Ok(())
    }

    /// 0xCB escape: fetch and decode a second opcode, then run it.
    pub(crate) fn prefix(
        &mut self,
        _inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let opcode = self.fetch8(bus, result);
        let inst = *self.decoder.decode_prefixed(opcode);
        (inst.handler)(self, &inst, bus, result)
    }

    // ---- CB-prefixed handlers ----

    pub(crate) fn cb_rotate_shift(
        &mut self,
        inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let r = inst.r8(0);
        let val = self.get_r8(r, bus, result);
        let carry = self.regs.carry_bit();
        let res = match inst.kind {
            Kind::Rlc => alu::rotate_carry(val, ShiftDirection::Left, true),
            Kind::Rrc => alu::rotate_carry(val, ShiftDirection::Right, true),
            Kind::Rl => alu::rotate(val, carry, ShiftDirection::Left, true),
            Kind::Rr => alu::rotate(val, carry, ShiftDirection::Right, true),
            Kind::Sla => alu::shift(val, ShiftDirection::Left, false),
            Kind::Sra => alu::shift(val, ShiftDirection::Right, false),
            Kind::Srl => alu::shift(val, ShiftDirection::Right, true),
            Kind::Swap => alu::swap(val),
            _ => unreachable!("{:?} is not a rotate/shift", inst.kind),
        };
        self.set_r8(r, res.value8(), bus, result);
        self.regs.apply_flags(&res);
        Ok(())
    }

    pub(crate) fn cb_bit(
        &mut self,
        inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let val = self.get_r8(inst.r8(1), bus, result);
        let res = alu::test_bit(inst.bit(0), val);
        self.regs.apply_flags(&res);
        Ok(())
    }

    pub(crate) fn cb_res_set(
        &mut self,
        inst: &Instruction,
        bus: &mut Bus,
        result: &mut InstructionResult,
    ) -> Result<(), EmuError> {
        let r = inst.r8(1);
        let val = self.get_r8(r, bus, result);
        let res = match inst.kind {
            Kind::Res => alu::reset_bit(inst.bit(0), val),
            _ => alu::set_bit(inst.bit(0), val),
        };
        self.set_r8(r, res.value8(), bus, result);
        Ok(())
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
