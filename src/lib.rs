//! Straight-key Morse decoding.
//!
//! Short presses become dots, long presses dashes, and a pause after the
//! last press closes out the letter through the code table.

pub mod audio;
pub mod config;
pub mod cw;
pub mod error;
pub mod input;
pub mod session;

pub use audio::{Sidetone, Silent, Tone};
pub use config::Settings;
pub use cw::{DecodeEvent, Decoder, DecoderSnapshot, InputEvent, Letter, Symbol};
pub use error::{Error, Result};
pub use input::{InputFilter, Key, RawInput};
pub use session::Session;
