mod break_timer;
mod decoder;
mod timing;

use std::fmt;

use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::audio::Tone;

pub use break_timer::{BreakTimer, TimerToken};
pub use decoder::{lookup_pattern, pattern_of, resolve, MORSE_TABLE};
pub use timing::{classify, press_duration, DecoderTiming, BREAK_DELAY_MS, DOT_THRESHOLD_MS};

/// A single classified press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbol {
    Dot,
    Dash,
}

impl Symbol {
    pub fn as_char(self) -> char {
        match self {
            Symbol::Dot => '.',
            Symbol::Dash => '-',
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A resolved letter, or the `!` marker for an unrecognised sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Letter {
    Char(char),
    Unknown,
}

impl Letter {
    pub const FALLBACK_MARKER: char = '!';

    pub fn as_char(self) -> char {
        match self {
            Letter::Char(c) => c,
            Letter::Unknown => Self::FALLBACK_MARKER,
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl Serialize for Letter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.as_char())
    }
}

/// Normalised input consumed by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    PressStart { at_ms: u64 },
    PressEnd { at_ms: u64 },
    DeleteLast,
}

/// Notifications for the display side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DecodeEvent {
    ToneOn,
    SymbolAdded(Symbol),
    LetterResolved(Letter),
    LetterDeleted(Letter),
}

/// Read-only view of the decoder for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecoderSnapshot {
    pub pending: Vec<Symbol>,
    pub history: Vec<Letter>,
    pub pressing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyState {
    Idle,
    Pressing { since_ms: u64 },
}

/// Turns press-start/press-end timestamps into letters.
///
/// Time never advances on its own: the owner calls [`Decoder::poll`] with the
/// current time (or waits until [`Decoder::break_deadline_ms`]) so the break
/// timer can close out the pending letter.
pub struct Decoder<T: Tone> {
    timing: DecoderTiming,
    state: KeyState,
    /// Symbols of the letter currently being keyed
    pending: Vec<Symbol>,
    /// Letters resolved so far this session
    history: Vec<Letter>,
    break_timer: BreakTimer,
    tone: T,
}

impl<T: Tone> Decoder<T> {
    pub fn new(tone: T) -> Self {
        Self::with_timing(DecoderTiming::default(), tone)
    }

    pub fn with_timing(timing: DecoderTiming, tone: T) -> Self {
        Self {
            timing,
            state: KeyState::Idle,
            pending: Vec::new(),
            history: Vec::new(),
            break_timer: BreakTimer::new(timing.break_delay_ms),
            tone,
        }
    }

    /// Key went down. A second press-start while already pressing is
    /// ignored and the original start time is kept.
    pub fn press_start(&mut self, at_ms: u64) -> bool {
        if let KeyState::Pressing { since_ms } = self.state {
            debug!(at_ms, since_ms, "ignoring press-start while already pressing");
            return false;
        }

        self.break_timer.cancel_all();
        self.state = KeyState::Pressing { since_ms: at_ms };
        self.tone.tone_start();
        debug!(at_ms, "press started");
        true
    }

    /// Key went up. Returns the classified symbol, or `None` if no press was
    /// in progress.
    pub fn press_end(&mut self, at_ms: u64) -> Option<Symbol> {
        let since_ms = match self.state {
            KeyState::Pressing { since_ms } => since_ms,
            KeyState::Idle => {
                debug!(at_ms, "ignoring press-end while idle");
                return None;
            }
        };

        let duration_ms = press_duration(since_ms, at_ms);
        let symbol = self.timing.classify(duration_ms);

        self.state = KeyState::Idle;
        self.pending.push(symbol);
        self.tone.tone_stop();
        self.break_timer.arm(at_ms);

        debug!(duration_ms, %symbol, pending = %pattern_of(&self.pending), "press ended");
        Some(symbol)
    }

    /// Fire the break timer if it is due. Returns the letter appended to the
    /// history, if any.
    pub fn poll(&mut self, now_ms: u64) -> Option<Letter> {
        self.break_timer.poll(now_ms)?;
        self.on_break()
    }

    fn on_break(&mut self) -> Option<Letter> {
        if self.pending.is_empty() {
            debug!("break fired with nothing pending");
            return None;
        }

        let letter = resolve(&self.pending);
        info!(pattern = %pattern_of(&self.pending), %letter, "letter resolved");
        self.pending.clear();
        self.history.push(letter);
        Some(letter)
    }

    /// Remove the most recent letter from the history
    pub fn delete_last(&mut self) -> Option<Letter> {
        let removed = self.history.pop();
        if let Some(letter) = removed {
            info!(%letter, "letter deleted");
        }
        removed
    }

    /// Dispatch one normalised input event
    pub fn handle(&mut self, event: InputEvent) -> Option<DecodeEvent> {
        match event {
            InputEvent::PressStart { at_ms } => {
                self.press_start(at_ms).then_some(DecodeEvent::ToneOn)
            }
            InputEvent::PressEnd { at_ms } => self.press_end(at_ms).map(DecodeEvent::SymbolAdded),
            InputEvent::DeleteLast => self.delete_last().map(DecodeEvent::LetterDeleted),
        }
    }

    /// Drop the letter in progress without resolving it. History is kept.
    pub fn reset(&mut self) {
        if matches!(self.state, KeyState::Pressing { .. }) {
            self.tone.tone_stop();
        }
        self.state = KeyState::Idle;
        self.pending.clear();
        self.break_timer.cancel_all();
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// When the armed break will fire, if one is armed
    pub fn break_deadline_ms(&self) -> Option<u64> {
        self.break_timer.deadline_ms()
    }

    pub fn pending(&self) -> &[Symbol] {
        &self.pending
    }

    pub fn history(&self) -> &[Letter] {
        &self.history
    }

    /// History rendered as a string, unknown letters as `!`
    pub fn history_text(&self) -> String {
        self.history.iter().map(|l| l.as_char()).collect()
    }

    /// The fixed table, for reference display
    pub fn code_table(&self) -> &'static [(char, &'static str)] {
        MORSE_TABLE
    }

    pub fn is_pressing(&self) -> bool {
        matches!(self.state, KeyState::Pressing { .. })
    }

    pub fn timing(&self) -> DecoderTiming {
        self.timing
    }

    pub fn snapshot(&self) -> DecoderSnapshot {
        DecoderSnapshot {
            pending: self.pending.clone(),
            history: self.history.clone(),
            pressing: self.is_pressing(),
        }
    }

    pub fn tone(&self) -> &T {
        &self.tone
    }
}
