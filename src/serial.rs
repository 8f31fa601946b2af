//! Serial transfer registers (0xFF01/0xFF02).
//!
//! No link cable is attached, so an internally-clocked transfer shifts in
//! all ones and completes after 8 bits at 8192 Hz. Outgoing bytes are
//! collected for the frontend; test ROMs report through this port.

/// Dots for one 8-bit transfer on the internal clock.
const TRANSFER_DOTS: u32 = 8 * 512;

pub struct Serial {
    sb: u8,
    sc: u8,
    countdown: u32,
    output: Vec<u8>,
}

impl Serial {
    pub fn new() -> Self {
        Self {
            sb: 0,
            sc: 0,
            countdown: 0,
            output: Vec::new(),
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0xFF01 => self.sb,
            0xFF02 => self.sc | 0x7E,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        match addr {
            0xFF01 => self.sb = val,
            0xFF02 => {
                self.sc = val & 0x81;
                if self.sc == 0x81 {
                    self.countdown = TRANSFER_DOTS;
                }
            }
            _ => {}
        }
    }

    pub fn tick(&mut self, dots: u32, if_reg: &mut u8) {
        if self.countdown == 0 {
            return;
        }
        self.countdown = self.countdown.saturating_sub(dots);
        if self.countdown == 0 {
            self.output.push(self.sb);
            // Disconnected link partners send all ones.
            self.sb = 0xFF;
            self.sc &= !0x80;
            *if_reg |= 0x08;
        }
    }

    /// Drain bytes written out since the last call.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }
}

impl Default for Serial {
    fn default() -> Self {
        Self::new()
    }
}
