//! Joypad register (0xFF00).
//!
//! The register multiplexes two nybbles of button lines behind two
//! active-low select bits. Pressed buttons read as zero; a high-to-low
//! transition on a selected line requests the joypad interrupt.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Right,
    Left,
    Up,
    Down,
    A,
    B,
    Select,
    Start,
}

impl Button {
    /// Returns whether the button sits in the action group, and its line bit.
    fn line(self) -> (bool, u8) {
        match self {
            Button::Right => (false, 0x01),
            Button::Left => (false, 0x02),
            Button::Up => (false, 0x04),
            Button::Down => (false, 0x08),
            Button::A => (true, 0x01),
            Button::B => (true, 0x02),
            Button::Select => (true, 0x04),
            Button::Start => (true, 0x08),
        }
    }
}

pub struct Joypad {
    /// Select bits as written (bit 4 selects d-pad, bit 5 action buttons;
    /// both active low).
    select: u8,
    /// Pressed state, 1 = held.
    dpad: u8,
    action: u8,
}

impl Joypad {
    pub fn new() -> Self {
        Self {
            select: 0x30,
            dpad: 0,
            action: 0,
        }
    }

    pub fn read(&self) -> u8 {
        let mut lines = 0x0F;
        if self.select & 0x10 == 0 {
            lines &= !self.dpad;
        }
        if self.select & 0x20 == 0 {
            lines &= !self.action;
        }
        0xC0 | self.select | lines
    }

    pub fn write(&mut self, val: u8) {
        self.select = val & 0x30;
    }

    pub fn press(&mut self, button: Button, if_reg: &mut u8) {
        let before = self.read() & 0x0F;
        let (action, bit) = button.line();
        if action {
            self.action |= bit;
        } else {
            self.dpad |= bit;
        }
        let after = self.read() & 0x0F;
        // Interrupt on a selected line going low.
        if before & !after != 0 {
            *if_reg |= 0x10;
        }
    }

    pub fn release(&mut self, button: Button) {
        let (action, bit) = button.line();
        if action {
            self.action &= !bit;
        } else {
            self.dpad &= !bit;
        }
    }
}

impl Default for Joypad {
    fn default() -> Self {
        Self::new()
    }
}
