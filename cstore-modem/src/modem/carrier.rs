//! Carrier detector / calibrator: locks onto the lead-in tone and measures
//! the actual base frequency of the recording.
//!
//! Old tape recordings drift in speed and carry noise; measuring the base
//! frequency from the lead-in, rather than trusting the protocol's nominal
//! value, keeps the midpoint and bit-width computations aligned with the
//! actual recording.

use std::collections::VecDeque;

use crate::config::SAMPLE_RATE;
use crate::utils::errors::ModemError;

const LOCK_DURATION_SECS: f64 = 0.5;
const POST_LOCK_ADVANCE_SECS: f64 = 0.2;
const SCAN_STEP_SECS: f64 = 0.1;

/// Runtime state derived from carrier calibration, replacing `base_freq`
/// for every timing decision downstream (half-wave midpoint, bit lengths).
#[derive(Debug, Clone, Copy)]
pub struct CarrierLock {
    pub actual_base_freq: f64,
}

impl CarrierLock {
    /// Threshold, in samples, separating a ONE halfwave from a ZERO
    /// halfwave.
    pub fn hw_midpoint(&self) -> usize {
        (SAMPLE_RATE as f64 / (self.actual_base_freq * 1.5) + 0.5) as usize
    }

    /// Number of halfwaves spanning one ZERO bit at the given baud rate.
    pub fn hw_len_0(&self, baud: u32) -> usize {
        (self.actual_base_freq / baud as f64) as usize
    }

    /// Number of halfwaves spanning one ONE bit.
    pub fn hw_len_1(&self, baud: u32) -> usize {
        self.hw_len_0(baud) * 2
    }
}

fn push_bounded(window: &mut VecDeque<u8>, value: u8, cap: usize) {
    window.push_back(value);
    if window.len() > cap {
        window.pop_front();
    }
}

fn fill<I: Iterator<Item = u8>>(
    window: &mut VecDeque<u8>,
    sbc: &mut I,
    cap: usize,
    count: usize,
) -> bool {
    for _ in 0..count {
        match sbc.next() {
            Some(v) => push_bounded(window, v, cap),
            None => return false,
        }
    }
    true
}

/// Scans `sbc` for a steady lead-in tone at `base_freq`, then measures the
/// actual base frequency from a window further into the carrier.
pub fn calibrate<I: Iterator<Item = u8>>(
    sbc: &mut I,
    base_freq: u32,
) -> Result<CarrierLock, ModemError> {
    let sample_size = (SAMPLE_RATE as f64 * LOCK_DURATION_SECS) as usize;
    let mut window: VecDeque<u8> = VecDeque::with_capacity(sample_size);
    fill(&mut window, sbc, sample_size, sample_size.saturating_sub(1));

    let expected = base_freq as f64 * LOCK_DURATION_SECS * 2.0;
    let tolerance = base_freq as f64 / 25.0;

    loop {
        let Some(v) = sbc.next() else {
            return Err(ModemError::NoCarrier);
        };
        push_bounded(&mut window, v, sample_size);

        let sum: u64 = window.iter().map(|&b| b as u64).sum();
        if ((sum as f64) - expected).abs() < tolerance {
            let extra = (SAMPLE_RATE as f64 * POST_LOCK_ADVANCE_SECS) as usize;
            if !fill(&mut window, sbc, sample_size, extra) {
                return Err(ModemError::NoCarrier);
            }
            let sum: u64 = window.iter().map(|&b| b as u64).sum();
            let actual_base_freq = sum as f64 / LOCK_DURATION_SECS / 2.0;
            return Ok(CarrierLock { actual_base_freq });
        }

        let step = (SAMPLE_RATE as f64 * SCAN_STEP_SECS) as usize;
        if !fill(&mut window, sbc, sample_size, step.saturating_sub(1)) {
            return Err(ModemError::NoCarrier);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A clean sign-change stream for a sine wave at `freq` Hz sampled at
    /// 48 kHz: one sign change every `sample_rate / (2*freq)` samples.
    fn sine_sbc(freq: u32, total_samples: usize) -> Vec<u8> {
        let half_period = SAMPLE_RATE as f64 / (2.0 * freq as f64);
        let mut out = Vec::with_capacity(total_samples);
        let mut next_flip = half_period;
        for i in 0..total_samples {
            if i as f64 >= next_flip {
                out.push(1);
                next_flip += half_period;
            } else {
                out.push(0);
            }
        }
        out
    }

    #[test]
    fn converges_within_two_percent_for_clean_tone() {
        for freq in [1800u32, 2400, 4000, 5000] {
            let samples = sine_sbc(freq, SAMPLE_RATE as usize); // 1.0s of carrier
            let mut it = samples.into_iter();
            let lock = calibrate(&mut it, freq).expect("should lock");
            let err = (lock.actual_base_freq - freq as f64).abs() / freq as f64;
            assert!(err < 0.02, "freq {freq}: measured {}", lock.actual_base_freq);
        }
    }

    #[test]
    fn fails_with_no_carrier_on_short_stream() {
        let samples = vec![0u8; 100];
        let mut it = samples.into_iter();
        let err = calibrate(&mut it, 2400).unwrap_err();
        assert!(matches!(err, ModemError::NoCarrier));
    }
}
