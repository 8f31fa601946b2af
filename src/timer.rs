//! Divider and timer unit.
//!
//! DIV is the upper byte of a free-running 16-bit counter clocked every
//! T-cycle. TIMA increments on the falling edge of a selected counter bit
//! gated by the TAC enable, so DIV resets and TAC writes can themselves
//! clock TIMA.

pub struct Timer {
    /// 16-bit internal divider counter. DIV is the upper 8 bits.
    pub div: u16,
    /// Timer counter.
    pub tima: u8,
    /// Timer modulo, reloaded into TIMA on overflow.
    pub tma: u8,
    /// Timer control.
    pub tac: u8,
    last_signal: bool,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            div: 0,
            tima: 0,
            tma: 0,
            tac: 0,
            last_signal: false,
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0xFF04 => (self.div >> 8) as u8,
            0xFF05 => self.tima,
            0xFF06 => self.tma,
            0xFF07 => self.tac | 0xF8,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, addr: u16, val: u8, if_reg: &mut u8) {
        match addr {
            // Any write resets the whole internal counter.
            0xFF04 => {
                self.div = 0;
                self.edge(if_reg);
            }
            0xFF05 => self.tima = val,
            0xFF06 => self.tma = val,
            0xFF07 => {
                self.tac = val & 0x07;
                self.edge(if_reg);
            }
            _ => {}
        }
    }

    /// Advance the divider by `cycles` T-cycles, requesting a timer
    /// interrupt in `if_reg` on TIMA overflow.
    pub fn tick(&mut self, cycles: u32, if_reg: &mut u8) {
        for _ in 0..cycles {
            self.div = self.div.wrapping_add(1);
            self.edge(if_reg);
        }
    }

    /// Apply the falling-edge rule against the current counter state.
    fn edge(&mut self, if_reg: &mut u8) {
        let signal = self.signal();
        if self.last_signal && !signal {
            self.increment(if_reg);
        }
        self.last_signal = signal;
    }

    fn increment(&mut self, if_reg: &mut u8) {
        self.tima = self.tima.wrapping_add(1);
        if self.tima == 0 {
            self.tima = self.tma;
            *if_reg |= 0x04;
        }
    }

    fn signal(&self) -> bool {
        if self.tac & 0x04 == 0 {
            return false;
        }
        let bit = match self.tac & 0x03 {
            0x00 => 9,
            0x01 => 3,
            0x02 => 5,
            _ => 7,
        };
        (self.div >> bit) & 1 != 0
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
