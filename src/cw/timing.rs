use super::Symbol;

/// Presses shorter than this are dots, anything else is a dash
pub const DOT_THRESHOLD_MS: u64 = 250;

/// Silence after a press-end that closes out the current letter
pub const BREAK_DELAY_MS: u64 = 500;

/// Thresholds the decoder runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderTiming {
    pub dot_threshold_ms: u64,
    pub break_delay_ms: u64,
}

impl Default for DecoderTiming {
    fn default() -> Self {
        Self {
            dot_threshold_ms: DOT_THRESHOLD_MS,
            break_delay_ms: BREAK_DELAY_MS,
        }
    }
}

impl DecoderTiming {
    /// Classify a press duration against this timing's threshold
    pub fn classify(&self, duration_ms: u64) -> Symbol {
        classify_with(duration_ms, self.dot_threshold_ms)
    }
}

/// Classify a press duration with the standard 250 ms threshold.
///
/// The boundary belongs to the dash side: exactly 250 ms is a dash.
pub fn classify(duration_ms: u64) -> Symbol {
    classify_with(duration_ms, DOT_THRESHOLD_MS)
}

fn classify_with(duration_ms: u64, threshold_ms: u64) -> Symbol {
    if duration_ms < threshold_ms {
        Symbol::Dot
    } else {
        Symbol::Dash
    }
}

/// Press duration between two timestamps. A press-end stamped before its
/// press-start counts as a zero-length press.
pub fn press_duration(start_ms: u64, end_ms: u64) -> u64 {
    end_ms.saturating_sub(start_ms)
}
