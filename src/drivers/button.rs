//! Manual pre-positioning buttons.
//!
//! Three active-low momentary switches on pull-up inputs: jog left pump,
//! jog right pump, and Start.  Polled at `manual_poll_ms`; the slow poll
//! is the only debounce these need.  A read error counts as "released",
//! which leaves the pumps off.

use embedded_hal::digital::InputPin;

/// Which buttons are held down right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonSnapshot {
    pub left: bool,
    pub right: bool,
    pub start: bool,
}

pub struct ManualButtons<P> {
    left: P,
    right: P,
    start: P,
}

impl<P: InputPin> ManualButtons<P> {
    pub fn new(left: P, right: P, start: P) -> Self {
        Self { left, right, start }
    }

    pub fn read(&mut self) -> ButtonSnapshot {
        ButtonSnapshot {
            left: Self::pressed(&mut self.left),
            right: Self::pressed(&mut self.right),
            start: Self::pressed(&mut self.start),
        }
    }

    fn pressed(pin: &mut P) -> bool {
        pin.is_low().unwrap_or(false)
    }
}
