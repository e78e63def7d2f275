//! Offline tempo estimation from a loaded sample buffer
//!
//! Envelope/peak/median analysis: the buffer is reduced to an RMS energy
//! envelope in ~50 ms windows, beats are picked as thresholded local maxima,
//! and the tempo comes from the median inter-peak interval (median instead
//! of mean for robustness against missed or spurious beats).
//!
//! The analysis is pure: it never touches deck state. The decoder agent
//! runs it off the audio thread and publishes the result afterwards, so a
//! freshly swapped deck may briefly report a tempo of zero.

/// Accepted tempo band. Estimates outside it are folded once (half-time
/// doubled, double-time halved) and then taken as-is.
const MIN_BPM: f64 = 60.0;
const MAX_BPM: f64 = 200.0;

/// Peak threshold as a multiple of the mean envelope level.
const PEAK_THRESHOLD_RATIO: f64 = 1.5;

/// Envelope window length as a divisor of the rate (rate/20 ≈ 50 ms).
const WINDOWS_PER_SECOND: usize = 20;

/// Result of a tempo analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BpmEstimate {
    /// Estimated tempo in beats per minute; 0 when undetectable.
    pub bpm: f64,
    /// Interval regularity in [0, 1]; 0 when undetectable.
    pub confidence: f64,
}

/// Estimate the tempo of a sample buffer.
///
/// `slot_rate` is the number of scalar samples per second in `samples` —
/// for an interleaved buffer that is `channels * sample_rate`. Buffers
/// shorter than two seconds yield a zero estimate.
pub fn analyze(samples: &[f32], slot_rate: usize) -> BpmEstimate {
    if slot_rate == 0 || samples.len() < slot_rate * 2 {
        return BpmEstimate::default();
    }

    let window = slot_rate / WINDOWS_PER_SECOND;
    let envelope = energy_envelope(samples, window);
    let peaks = detect_peaks(&envelope);
    if peaks.len() < 2 {
        return BpmEstimate::default();
    }

    let intervals: Vec<f64> = peaks.windows(2).map(|w| (w[1] - w[0]) as f64).collect();

    // Intervals are measured in envelope windows; each window spans
    // `window` samples.
    let interval_seconds = median(&intervals) * window as f64 / slot_rate as f64;
    if interval_seconds <= 0.0 {
        return BpmEstimate::default();
    }

    let mut bpm = 60.0 / interval_seconds;
    if bpm < MIN_BPM {
        bpm *= 2.0;
    }
    if bpm > MAX_BPM {
        bpm /= 2.0;
    }

    BpmEstimate {
        bpm,
        confidence: interval_confidence(&intervals),
    }
}

/// RMS level of each non-overlapping window; the trailing partial window
/// is dropped.
fn energy_envelope(samples: &[f32], window: usize) -> Vec<f64> {
    samples
        .chunks_exact(window)
        .map(|chunk| {
            let sum: f64 = chunk.iter().map(|&s| (s as f64) * (s as f64)).sum();
            (sum / window as f64).sqrt()
        })
        .collect()
}

/// Indices of envelope points that strictly exceed both neighbors and the
/// dynamic threshold.
fn detect_peaks(envelope: &[f64]) -> Vec<usize> {
    if envelope.len() < 3 {
        return Vec::new();
    }

    let mean = envelope.iter().sum::<f64>() / envelope.len() as f64;
    let threshold = mean * PEAK_THRESHOLD_RATIO;

    (1..envelope.len() - 1)
        .filter(|&i| {
            envelope[i] > envelope[i - 1]
                && envelope[i] > envelope[i + 1]
                && envelope[i] > threshold
        })
        .collect()
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Confidence from the coefficient of variation of the intervals: perfectly
/// regular beats score 1, noise scores 0.
fn interval_confidence(intervals: &[f64]) -> f64 {
    if intervals.len() < 2 {
        return 0.0;
    }

    let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
    if mean <= 0.0 {
        return 0.0;
    }

    let variance = intervals
        .iter()
        .map(|&v| (v - mean) * (v - mean))
        .sum::<f64>()
        / intervals.len() as f64;
    let cv = variance.sqrt() / mean;

    1.0 - cv.min(1.0)
}
