use std::f32::consts::PI;

/// Rise/fall time of the keying envelope
const ENVELOPE_SECONDS: f32 = 0.005;

/// Sine generator with a short attack/decay envelope so keying does not click
#[derive(Debug, Clone)]
pub struct SidetoneGenerator {
    phase: f32,
    phase_increment: f32,
    sample_rate: f32,
    frequency: f32,
    volume: f32,
    envelope: f32,
    envelope_step: f32,
    keyed: bool,
}

impl SidetoneGenerator {
    pub fn new(frequency: f32, volume: f32, sample_rate: f32) -> Self {
        let mut generator = Self {
            phase: 0.0,
            phase_increment: 0.0,
            sample_rate,
            frequency,
            volume: volume.clamp(0.0, 1.0),
            envelope: 0.0,
            envelope_step: 0.0,
            keyed: false,
        };
        generator.retune();
        generator
    }

    fn retune(&mut self) {
        self.phase_increment = 2.0 * PI * self.frequency / self.sample_rate;
        self.envelope_step = 1.0 / (ENVELOPE_SECONDS * self.sample_rate);
    }

    pub fn set_keyed(&mut self, keyed: bool) {
        self.keyed = keyed;
    }

    pub fn is_keyed(&self) -> bool {
        self.keyed
    }

    /// True while the tone is audible, including the decay tail after release
    pub fn is_sounding(&self) -> bool {
        self.envelope > 0.0
    }

    pub fn next_sample(&mut self) -> f32 {
        if self.keyed {
            self.envelope = (self.envelope + self.envelope_step).min(1.0);
        } else {
            self.envelope = (self.envelope - self.envelope_step).max(0.0);
        }

        let sample = self.phase.sin() * self.envelope * self.volume;

        self.phase += self.phase_increment;
        if self.phase >= 2.0 * PI {
            self.phase -= 2.0 * PI;
        }

        sample
    }

    /// Fill a mono buffer
    pub fn fill(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.next_sample();
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.retune();
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
        self.retune();
    }

    /// Volume is clamped to 0.0 - 1.0
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }
}
