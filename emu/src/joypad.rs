//! Joypad register (P1, 0xFF00).
//!
//! The program writes bits 4-5 to select action buttons or the d-pad, then
//! reads the active-low state of the selected group in bits 0-3.

/// Joypad buttons. The low four are the action group, the high four the d-pad,
/// each in P1 bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Button {
    A = 0,
    B = 1,
    Select = 2,
    Start = 3,
    Right = 4,
    Left = 5,
    Up = 6,
    Down = 7,
}

impl Button {
    /// Convert a raw host button index. Returns `None` if out of range.
    pub fn from_u8(value: u8) -> Option<Button> {
        const ALL: [Button; 8] = [
            Button::A,
            Button::B,
            Button::Select,
            Button::Start,
            Button::Right,
            Button::Left,
            Button::Up,
            Button::Down,
        ];
        ALL.get(value as usize).copied()
    }
}

pub struct Joypad {
    /// One bit per `Button`, set while held.
    pressed: u8,
    /// P1 bits 4-5 as last written (0 = group selected).
    select: u8,
}

impl Joypad {
    pub fn new() -> Self {
        Joypad {
            pressed: 0,
            select: 0x30,
        }
    }

    /// Update a button. Returns true on a release-to-press transition.
    pub fn set_button(&mut self, button: Button, pressed: bool) -> bool {
        let bit = 1 << button as u8;
        let was_pressed = self.pressed & bit != 0;
        if pressed {
            self.pressed |= bit;
        } else {
            self.pressed &= !bit;
        }
        pressed && !was_pressed
    }

    pub fn read(&self) -> u8 {
        let mut low = 0x0F;
        if self.select & 0x20 == 0 {
            low &= !self.pressed & 0x0F;
        }
        if self.select & 0x10 == 0 {
            low &= !(self.pressed >> 4) & 0x0F;
        }
        0xC0 | self.select | low
    }

    pub fn write(&mut self, value: u8) {
        self.select = value & 0x30;
    }
}

impl Default for Joypad {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_buttons_pressed() {
        let mut joypad = Joypad::new();
        joypad.write(0x10); // action buttons
        assert_eq!(joypad.read() & 0x0F, 0x0F);
    }

    #[test]
    fn test_a_button_pressed() {
        let mut joypad = Joypad::new();
        joypad.write(0x10);
        assert!(joypad.set_button(Button::A, true));
        assert_eq!(joypad.read() & 0x01, 0x00);
    }

    #[test]
    fn test_dpad_pressed() {
        let mut joypad = Joypad::new();
        joypad.write(0x20); // d-pad
        joypad.set_button(Button::Up, true);
        joypad.set_button(Button::Right, true);

        let result = joypad.read();
        assert_eq!(result & 0x01, 0x00); // Right
        assert_eq!(result & 0x04, 0x00); // Up
        assert_eq!(result & 0x0A, 0x0A);
    }

    #[test]
    fn test_unselected_group_hidden() {
        let mut joypad = Joypad::new();
        joypad.set_button(Button::Start, true);
        joypad.write(0x20);
        assert_eq!(joypad.read() & 0x0F, 0x0F);
        joypad.write(0x10);
        assert_eq!(joypad.read() & 0x08, 0x00);
    }

    #[test]
    fn test_repeat_press_is_not_an_edge() {
        let mut joypad = Joypad::new();
        assert!(joypad.set_button(Button::B, true));
        assert!(!joypad.set_button(Button::B, true));
        assert!(!joypad.set_button(Button::B, false));
        assert!(joypad.set_button(Button::B, true));
    }

    #[test]
    fn test_select_bits_echo() {
        let mut joypad = Joypad::new();
        joypad.write(0xFF);
        assert_eq!(joypad.read(), 0xFF);
        joypad.write(0x00);
        assert_eq!(joypad.read() & 0xF0, 0xC0);
    }

    #[test]
    fn test_button_from_u8() {
        assert_eq!(Button::from_u8(3), Some(Button::Start));
        assert_eq!(Button::from_u8(7), Some(Button::Down));
        assert_eq!(Button::from_u8(8), None);
    }
}
