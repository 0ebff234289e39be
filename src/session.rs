//! Event-driven runtime around a [`Decoder`].
//!
//! One worker thread owns every mutation: it waits on the command queue and,
//! while a break is armed, on a timer for the break deadline. Readers share
//! the decoder through a mutex for display.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::{debug, info, trace};

use crate::audio::Tone;
use crate::config::Settings;
use crate::cw::{DecodeEvent, Decoder, DecoderSnapshot, InputEvent, Letter, Symbol};
use crate::error::{Error, Result};
use crate::input::{InputFilter, RawInput};

/// Notifications beyond this many unread are dropped
const EVENT_QUEUE_CAPACITY: usize = 256;

/// Commands sent to the decoder thread
enum Command {
    Input(InputEvent),
    Reset,
    Shutdown,
}

pub struct Session<T: Tone + Send + 'static> {
    decoder: Arc<Mutex<Decoder<T>>>,
    input_filter: Mutex<InputFilter>,
    command_tx: Sender<Command>,
    event_rx: Receiver<DecodeEvent>,
    epoch: Instant,
    worker: Option<JoinHandle<()>>,
}

impl<T: Tone + Send + 'static> Session<T> {
    /// Start a session with its own decoder thread
    pub fn start(settings: &Settings, tone: T) -> Result<Self> {
        settings.validate()?;

        let decoder = Arc::new(Mutex::new(Decoder::with_timing(settings.timing(), tone)));
        let (command_tx, command_rx) = unbounded();
        let (event_tx, event_rx) = bounded(EVENT_QUEUE_CAPACITY);
        let epoch = Instant::now();

        let worker_decoder = Arc::clone(&decoder);
        let worker = thread::Builder::new()
            .name("telegraph-decoder".into())
            .spawn(move || decoder_thread(worker_decoder, command_rx, event_tx, epoch))?;

        info!(
            dot_threshold_ms = settings.dot_threshold_ms,
            break_delay_ms = settings.break_delay_ms,
            "session started"
        );

        Ok(Self {
            decoder,
            input_filter: Mutex::new(InputFilter::new(settings.signal_key)),
            command_tx,
            event_rx,
            epoch,
            worker: Some(worker),
        })
    }

    /// Milliseconds since the session started, the clock for all timestamps
    pub fn now_ms(&self) -> u64 {
        elapsed_ms(self.epoch)
    }

    /// Queue an event stamped on the session clock
    pub fn send(&self, event: InputEvent) -> Result<()> {
        self.command(Command::Input(event))
    }

    pub fn press_start(&self) -> Result<()> {
        self.send(InputEvent::PressStart {
            at_ms: self.now_ms(),
        })
    }

    pub fn press_end(&self) -> Result<()> {
        self.send(InputEvent::PressEnd {
            at_ms: self.now_ms(),
        })
    }

    pub fn delete_last(&self) -> Result<()> {
        self.send(InputEvent::DeleteLast)
    }

    /// Feed raw key/pointer input through the session's input filter
    pub fn feed(&self, input: RawInput) -> Result<()> {
        let event = self.input_filter.lock().filter(input, self.now_ms());
        match event {
            Some(event) => self.send(event),
            None => Ok(()),
        }
    }

    /// Drop the letter in progress
    pub fn reset(&self) -> Result<()> {
        self.input_filter.lock().reset();
        self.command(Command::Reset)
    }

    fn command(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| Error::SessionClosed)
    }

    /// Decoder notifications. Receivers share one queue.
    pub fn events(&self) -> Receiver<DecodeEvent> {
        self.event_rx.clone()
    }

    pub fn snapshot(&self) -> DecoderSnapshot {
        self.decoder.lock().snapshot()
    }

    pub fn pending(&self) -> Vec<Symbol> {
        self.decoder.lock().pending().to_vec()
    }

    pub fn history(&self) -> Vec<Letter> {
        self.decoder.lock().history().to_vec()
    }

    pub fn history_text(&self) -> String {
        self.decoder.lock().history_text()
    }

    /// Stop the decoder thread. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.command_tx.send(Command::Shutdown);
            if worker.join().is_err() {
                debug!("decoder thread panicked");
            }
            info!("session stopped");
        }
    }
}

impl<T: Tone + Send + 'static> Drop for Session<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn elapsed_ms(epoch: Instant) -> u64 {
    epoch.elapsed().as_millis() as u64
}

fn emit(events: &Sender<DecodeEvent>, event: DecodeEvent) {
    if let Err(TrySendError::Full(event)) = events.try_send(event) {
        trace!(?event, "event queue full, dropping notification");
    }
}

/// Apply one command on the decoder thread. Returns false on shutdown.
fn apply<T: Tone>(decoder: &Mutex<Decoder<T>>, command: Command, events: &Sender<DecodeEvent>) -> bool {
    match command {
        Command::Input(event) => {
            let mut decoder = decoder.lock();
            // A break that fell due before this press closes out the letter first
            if let InputEvent::PressStart { at_ms } = event {
                if let Some(letter) = decoder.poll(at_ms) {
                    emit(events, DecodeEvent::LetterResolved(letter));
                }
            }
            if let Some(output) = decoder.handle(event) {
                emit(events, output);
            }
            true
        }
        Command::Reset => {
            decoder.lock().reset();
            true
        }
        Command::Shutdown => false,
    }
}

fn decoder_thread<T: Tone>(
    decoder: Arc<Mutex<Decoder<T>>>,
    commands: Receiver<Command>,
    events: Sender<DecodeEvent>,
    epoch: Instant,
) {
    loop {
        // Re-read the deadline every pass: any command may arm or cancel it
        let deadline = decoder.lock().break_deadline_ms();
        let break_timer = match deadline {
            Some(deadline_ms) => crossbeam_channel::at(epoch + Duration::from_millis(deadline_ms)),
            None => crossbeam_channel::never(),
        };

        select! {
            recv(commands) -> msg => match msg {
                Ok(command) => {
                    if !apply(&decoder, command, &events) {
                        break;
                    }
                }
                Err(_) => break,
            },
            recv(break_timer) -> _ => {
                // select! picks randomly when both are ready; queued commands go first
                while let Ok(command) = commands.try_recv() {
                    if !apply(&decoder, command, &events) {
                        return;
                    }
                }
                let letter = decoder.lock().poll(elapsed_ms(epoch));
                if let Some(letter) = letter {
                    emit(&events, DecodeEvent::LetterResolved(letter));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Silent;
    use crate::input::Key;

    const WAIT: Duration = Duration::from_secs(3);

    fn wait_for_letter(events: &Receiver<DecodeEvent>) -> Letter {
        loop {
            match events.recv_timeout(WAIT).expect("no letter resolved") {
                DecodeEvent::LetterResolved(letter) => return letter,
                _ => continue,
            }
        }
    }

    #[test]
    fn test_explicit_timestamps_resolve_on_break() {
        let session = Session::start(&Settings::default(), Silent).unwrap();
        let events = session.events();

        let base = session.now_ms();
        session.send(InputEvent::PressStart { at_ms: base }).unwrap();
        session.send(InputEvent::PressEnd { at_ms: base + 300 }).unwrap();

        assert_eq!(wait_for_letter(&events), Letter::Char('T'));
        assert_eq!(session.history_text(), "T");
        assert!(session.pending().is_empty());
    }

    #[test]
    fn test_press_after_break_deadline_closes_letter() {
        let session = Session::start(&Settings::default(), Silent).unwrap();
        let events = session.events();

        // Queued faster than real time, but the stamps say 600 ms of silence
        session.send(InputEvent::PressStart { at_ms: 0 }).unwrap();
        session.send(InputEvent::PressEnd { at_ms: 100 }).unwrap();
        session.send(InputEvent::PressStart { at_ms: 700 }).unwrap();
        session.send(InputEvent::PressEnd { at_ms: 710 }).unwrap();

        assert_eq!(wait_for_letter(&events), Letter::Char('E'));
        assert_eq!(wait_for_letter(&events), Letter::Char('E'));
        assert_eq!(session.history_text(), "EE");
    }

    #[test]
    fn test_feed_raw_input() {
        let settings = Settings {
            break_delay_ms: 100,
            ..Default::default()
        };
        let session = Session::start(&settings, Silent).unwrap();
        let events = session.events();

        session.feed(RawInput::KeyDown(Key::Char('m'))).unwrap();
        session.feed(RawInput::KeyUp(Key::Char('m'))).unwrap();
        assert_eq!(wait_for_letter(&events), Letter::Char('E'));

        session.feed(RawInput::KeyDown(Key::Backspace)).unwrap();
        assert_eq!(
            events.recv_timeout(WAIT).unwrap(),
            DecodeEvent::LetterDeleted(Letter::Char('E'))
        );
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_send_after_shutdown_fails() {
        let mut session = Session::start(&Settings::default(), Silent).unwrap();
        session.shutdown();
        session.shutdown();
        assert!(matches!(session.press_start(), Err(Error::SessionClosed)));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = Settings {
            dot_threshold_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            Session::start(&settings, Silent),
            Err(Error::InvalidSetting(_))
        ));
    }
}
