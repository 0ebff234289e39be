mod sidetone;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Settings;

pub use sidetone::SidetoneGenerator;

/// Audible feedback while the key is down. Calls are fire-and-forget.
pub trait Tone {
    fn tone_start(&mut self);
    fn tone_stop(&mut self);
}

impl<T: Tone + ?Sized> Tone for Box<T> {
    fn tone_start(&mut self) {
        (**self).tone_start();
    }

    fn tone_stop(&mut self) {
        (**self).tone_stop();
    }
}

/// Tone service that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Tone for Silent {
    fn tone_start(&mut self) {}
    fn tone_stop(&mut self) {}
}

/// Shared handle to a sidetone generator.
///
/// The decoder keys it through [`Tone`]; an audio backend on another thread
/// pulls samples from a clone with [`Sidetone::render`].
#[derive(Debug, Clone)]
pub struct Sidetone {
    generator: Arc<Mutex<SidetoneGenerator>>,
}

impl Sidetone {
    pub fn new(frequency: f32, volume: f32, sample_rate: f32) -> Self {
        Self {
            generator: Arc::new(Mutex::new(SidetoneGenerator::new(
                frequency,
                volume,
                sample_rate,
            ))),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.sidetone_frequency,
            settings.sidetone_volume,
            settings.sample_rate,
        )
    }

    /// Fill `out` with the next mono samples
    pub fn render(&self, out: &mut [f32]) {
        self.generator.lock().fill(out);
    }

    pub fn is_keyed(&self) -> bool {
        self.generator.lock().is_keyed()
    }

    pub fn set_frequency(&self, frequency: f32) {
        self.generator.lock().set_frequency(frequency);
    }

    pub fn set_volume(&self, volume: f32) {
        self.generator.lock().set_volume(volume);
    }

    pub fn set_sample_rate(&self, sample_rate: f32) {
        self.generator.lock().set_sample_rate(sample_rate);
    }
}

impl Tone for Sidetone {
    fn tone_start(&mut self) {
        self.generator.lock().set_keyed(true);
    }

    fn tone_stop(&mut self) {
        self.generator.lock().set_keyed(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidetone_keyed_through_clone() {
        let monitor = Sidetone::from_settings(&Settings::default());
        let mut keyer = monitor.clone();

        keyer.tone_start();
        assert!(monitor.is_keyed());

        let mut buf = vec![0.0f32; 960];
        monitor.render(&mut buf);
        assert!(buf.iter().any(|s| *s != 0.0));

        keyer.tone_stop();
        assert!(!monitor.is_keyed());
    }

    #[test]
    fn test_boxed_tone_forwards() {
        let monitor = Sidetone::new(700.0, 0.3, 44_100.0);
        let mut boxed: Box<dyn Tone + Send> = Box::new(monitor.clone());
        boxed.tone_start();
        assert!(monitor.is_keyed());
        boxed.tone_stop();
        assert!(!monitor.is_keyed());
    }
}
