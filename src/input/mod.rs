use tracing::trace;

use crate::cw::InputEvent;

/// Keys the input layer distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Other,
}

/// Raw input as delivered by a keyboard or pointer device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInput {
    KeyDown(Key),
    KeyUp(Key),
    PointerDown,
    PointerUp,
}

/// Turns raw key and pointer input into press events for the decoder.
///
/// The signal key and the pointer are separate press sources. They are OR-ed
/// together: the press starts when the first source goes down and ends when
/// the last one is released. Key auto-repeat and releases without a matching
/// press are dropped. Backspace deletes the last letter on every key-down.
#[derive(Debug, Clone)]
pub struct InputFilter {
    signal_key: char,
    key_held: bool,
    pointer_held: bool,
}

impl InputFilter {
    pub fn new(signal_key: char) -> Self {
        Self {
            signal_key,
            key_held: false,
            pointer_held: false,
        }
    }

    fn is_signal_key(&self, key: Key) -> bool {
        match key {
            Key::Char(c) => c.eq_ignore_ascii_case(&self.signal_key),
            _ => false,
        }
    }

    fn pressed(&self) -> bool {
        self.key_held || self.pointer_held
    }

    /// Feed one raw input stamped at `at_ms`
    pub fn filter(&mut self, input: RawInput, at_ms: u64) -> Option<InputEvent> {
        let was_pressed = self.pressed();

        match input {
            RawInput::KeyDown(Key::Backspace) => return Some(InputEvent::DeleteLast),
            RawInput::KeyDown(key) if self.is_signal_key(key) => {
                if self.key_held {
                    trace!(at_ms, "dropping key repeat");
                    return None;
                }
                self.key_held = true;
            }
            RawInput::KeyUp(key) if self.is_signal_key(key) => {
                if !self.key_held {
                    return None;
                }
                self.key_held = false;
            }
            RawInput::PointerDown => {
                if self.pointer_held {
                    return None;
                }
                self.pointer_held = true;
            }
            RawInput::PointerUp => {
                if !self.pointer_held {
                    return None;
                }
                self.pointer_held = false;
            }
            RawInput::KeyDown(_) | RawInput::KeyUp(_) => return None,
        }

        match (was_pressed, self.pressed()) {
            (false, true) => Some(InputEvent::PressStart { at_ms }),
            (true, false) => Some(InputEvent::PressEnd { at_ms }),
            _ => {
                trace!(at_ms, ?input, "coalesced with press from another source");
                None
            }
        }
    }

    /// Forget any held sources
    pub fn reset(&mut self) {
        self.key_held = false;
        self.pointer_held = false;
    }
}

impl Default for InputFilter {
    fn default() -> Self {
        Self::new('m')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_key_press() {
        let mut filter = InputFilter::default();
        assert_eq!(
            filter.filter(RawInput::KeyDown(Key::Char('m')), 10),
            Some(InputEvent::PressStart { at_ms: 10 })
        );
        assert_eq!(
            filter.filter(RawInput::KeyUp(Key::Char('M')), 90),
            Some(InputEvent::PressEnd { at_ms: 90 })
        );
    }

    #[test]
    fn test_key_repeat_dropped() {
        let mut filter = InputFilter::default();
        filter.filter(RawInput::KeyDown(Key::Char('m')), 0);
        assert_eq!(filter.filter(RawInput::KeyDown(Key::Char('m')), 30), None);
        assert_eq!(filter.filter(RawInput::KeyDown(Key::Char('m')), 60), None);
        assert_eq!(
            filter.filter(RawInput::KeyUp(Key::Char('m')), 400),
            Some(InputEvent::PressEnd { at_ms: 400 })
        );
    }

    #[test]
    fn test_other_keys_ignored() {
        let mut filter = InputFilter::default();
        assert_eq!(filter.filter(RawInput::KeyDown(Key::Char('x')), 0), None);
        assert_eq!(filter.filter(RawInput::KeyUp(Key::Other), 0), None);
        assert_eq!(filter.filter(RawInput::KeyUp(Key::Char('m')), 0), None);
        assert_eq!(filter.filter(RawInput::PointerUp, 0), None);
    }

    #[test]
    fn test_backspace_deletes_on_every_keydown() {
        let mut filter = InputFilter::default();
        assert_eq!(
            filter.filter(RawInput::KeyDown(Key::Backspace), 0),
            Some(InputEvent::DeleteLast)
        );
        assert_eq!(
            filter.filter(RawInput::KeyDown(Key::Backspace), 30),
            Some(InputEvent::DeleteLast)
        );
        assert_eq!(filter.filter(RawInput::KeyUp(Key::Backspace), 40), None);
    }

    #[test]
    fn test_key_and_pointer_coalesce() {
        let mut filter = InputFilter::default();
        assert_eq!(
            filter.filter(RawInput::KeyDown(Key::Char('m')), 0),
            Some(InputEvent::PressStart { at_ms: 0 })
        );
        assert_eq!(filter.filter(RawInput::PointerDown, 50), None);
        assert_eq!(filter.filter(RawInput::KeyUp(Key::Char('m')), 100), None);
        assert_eq!(
            filter.filter(RawInput::PointerUp, 300),
            Some(InputEvent::PressEnd { at_ms: 300 })
        );
    }

    #[test]
    fn test_custom_signal_key() {
        let mut filter = InputFilter::new('k');
        assert_eq!(filter.filter(RawInput::KeyDown(Key::Char('m')), 0), None);
        assert_eq!(
            filter.filter(RawInput::KeyDown(Key::Char('K')), 0),
            Some(InputEvent::PressStart { at_ms: 0 })
        );
        filter.reset();
        assert_eq!(filter.filter(RawInput::KeyUp(Key::Char('k')), 10), None);
    }
}
