//! The two-tone FSK modem: sign changes, half-waves, carrier calibration,
//! and bit/byte framing.
//!
//! Each stage is a lazy, pull-driven iterator that borrows its upstream
//! stage, mirroring the single-threaded cooperative pipeline the protocol
//! is specified against: sample order -> sign-change order -> half-wave
//! order -> bit order -> byte order, with no internal threads and no
//! shared state between stages.

pub mod bitframer;
pub mod byteframer;
pub mod carrier;
pub mod halfwave;
pub mod signchange;

use crate::config::SAMPLE_RATE;

/// A classified half-wave: the interval between two consecutive sign
/// changes, classified as ZERO or ONE tone based on its sample length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfWave {
    Zero,
    One,
}

/// Peak PCM sample values for the square wave written on encode: signed
/// +120 and -120, matching the original writer's amplitude. Only `LOW`
/// has the 0x80 sign bit set, which is all the decode side's
/// [`signchange`] stage actually looks at.
const HIGH: u8 = 0x78;
const LOW: u8 = 0x88;

/// Sample count of a ONE halfwave at `base_freq`; a ZERO halfwave is twice
/// this. Exposed so callers can size a span of idle carrier in halfwaves
/// without duplicating the formula.
pub fn one_halfwave_samples(base_freq: u32) -> usize {
    (SAMPLE_RATE as f64 / (2.0 * base_freq as f64)).round().max(1.0) as usize
}

/// Renders a run of halfwaves into raw signed-8-bit PCM samples at
/// `base_freq`, the inverse of the [`signchange`]/[`halfwave`] decode
/// stages: a ONE halfwave lasts `SAMPLE_RATE / (2*base_freq)` samples, a
/// ZERO halfwave twice that, each alternating sign from the last.
pub fn encode_halfwaves(hws: &[HalfWave], base_freq: u32) -> Vec<u8> {
    let one_samples = one_halfwave_samples(base_freq);
    let zero_samples = one_samples * 2;

    let mut out = Vec::new();
    let mut high = true;
    for hw in hws {
        let n = match hw {
            HalfWave::One => one_samples,
            HalfWave::Zero => zero_samples,
        };
        let sample = if high { HIGH } else { LOW };
        out.extend(std::iter::repeat_n(sample, n));
        high = !high;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modem::halfwave::HalfWaveClassifier;
    use crate::modem::signchange::SignChangeStream;

    #[test]
    fn encoded_halfwaves_decode_back_to_the_same_sequence() {
        let hws = vec![
            HalfWave::One,
            HalfWave::One,
            HalfWave::Zero,
            HalfWave::One,
            HalfWave::Zero,
            HalfWave::Zero,
        ];
        let base_freq = 2400;
        let pcm = encode_halfwaves(&hws, base_freq);

        let midpoint = (SAMPLE_RATE as f64 / (base_freq as f64 * 1.5) + 0.5) as usize;
        let sbc = SignChangeStream::new(pcm.into_iter());
        let decoded: Vec<HalfWave> = HalfWaveClassifier::new(sbc, midpoint).collect();

        assert_eq!(decoded, hws);
    }
}
