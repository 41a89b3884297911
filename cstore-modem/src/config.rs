//! Protocol configuration: sample rate, bit pattern, and the per-session
//! audio-stage filters.
//!
//! A [`ProtocolConfig`] is immutable for the lifetime of a session (open to
//! close); it never reflects calibration results measured on the read path
//! (those live in [`crate::modem::carrier::CarrierLock`]).

use std::fmt;

use crate::utils::errors::BitPatternError;

/// Fixed PCM sample rate for every session: 48 kHz, 8-bit signed, mono.
pub const SAMPLE_RATE: u32 = 48_000;

/// One symbol of a bit-pattern frame description.
///
/// `Data(n)` names the bit index in the *output byte*, not the position in
/// time the bit is transmitted at — the same digit can appear anywhere in
/// the pattern string relative to other digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitSymbol {
    /// `S` — a start bit: ZERO expected on read, ZERO emitted on write.
    Start,
    /// `0`..`7` — a data-bit slot, carrying the given bit of the byte.
    Data(u8),
    /// `E` — even parity over the data bits seen so far.
    ParityEven,
    /// `O` — odd parity over the data bits seen so far.
    ParityOdd,
    /// `-` — a stop bit: ONE expected/emitted, consumed but not scored.
    Stop,
}

/// Alternative, simpler configuration equivalent to a [`BitPattern`] string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    Even,
    Odd,
    None,
}

/// An ordered frame description, parsed once at session open and shared by
/// both the decoder and the encoder half of the byte framer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitPattern(Vec<BitSymbol>);

impl BitPattern {
    /// Parses a bit-pattern string over the alphabet `{S, 0..7, E, O, -}`.
    ///
    /// At least one `S` must appear (some protocols, like the Sharp PC-1211,
    /// use a second `S` mid-pattern); data-bit digits must be unique and in
    /// `0..7`.
    pub fn parse(spec: &str) -> Result<Self, BitPatternError> {
        let mut symbols = Vec::with_capacity(spec.len());
        let mut seen_data = [false; 8];
        let mut saw_start = false;

        for ch in spec.chars() {
            let symbol = match ch {
                'S' => {
                    saw_start = true;
                    BitSymbol::Start
                }
                '0'..='7' => {
                    let idx = ch as u8 - b'0';
                    if seen_data[idx as usize] {
                        return Err(BitPatternError::DuplicateDataBit(idx));
                    }
                    seen_data[idx as usize] = true;
                    BitSymbol::Data(idx)
                }
                'E' => BitSymbol::ParityEven,
                'O' => BitSymbol::ParityOdd,
                '-' => BitSymbol::Stop,
                other => return Err(BitPatternError::UnknownSymbol(other)),
            };
            symbols.push(symbol);
        }

        if !saw_start {
            return Err(BitPatternError::MissingStart(spec.to_string()));
        }

        Ok(Self(symbols))
    }

    /// Synthesizes a bit pattern from the `(databits, parity, stopbits)`
    /// equivalent configuration: `"S" + "0".."(databits-1)" + parity + "-"×stopbits`.
    pub fn from_parts(databits: u8, parity: Parity, stopbits: u8) -> Self {
        let mut symbols = vec![BitSymbol::Start];
        symbols.extend((0..databits).map(BitSymbol::Data));
        match parity {
            Parity::Even => symbols.push(BitSymbol::ParityEven),
            Parity::Odd => symbols.push(BitSymbol::ParityOdd),
            Parity::None => {}
        }
        symbols.extend(std::iter::repeat_n(BitSymbol::Stop, stopbits as usize));
        Self(symbols)
    }

    pub fn symbols(&self) -> &[BitSymbol] {
        &self.0
    }
}

impl fmt::Display for BitPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for sym in &self.0 {
            match sym {
                BitSymbol::Start => write!(f, "S")?,
                BitSymbol::Data(n) => write!(f, "{n}")?,
                BitSymbol::ParityEven => write!(f, "E")?,
                BitSymbol::ParityOdd => write!(f, "O")?,
                BitSymbol::Stop => write!(f, "-")?,
            }
        }
        Ok(())
    }
}

/// Immutable per-session protocol configuration.
#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    /// Frequency, in Hz, of a ONE halfwave; ZERO is half of this.
    pub base_freq: u32,
    /// Logical bit rate in bits/second.
    pub baud: u32,
    pub bit_pattern: BitPattern,
    /// Optional `gain` filter (dB) passed to the audio adapter.
    pub gain: Option<f32>,
    /// Optional `sinc` bandpass filter spec passed to the audio adapter.
    pub sinc: Option<String>,
}

impl ProtocolConfig {
    /// Number of halfwaves spanning one ZERO bit, measured against the
    /// *requested* (not calibrated) base frequency — used by the encoder,
    /// which never calibrates.
    pub fn hw_len_0(&self) -> usize {
        (self.base_freq / self.baud) as usize
    }

    /// Number of halfwaves spanning one ONE bit.
    pub fn hw_len_1(&self) -> usize {
        self.hw_len_0() * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_pattern() {
        let p = BitPattern::parse("S01234567E--").unwrap();
        assert_eq!(p.symbols().first(), Some(&BitSymbol::Start));
        assert_eq!(p.symbols().last(), Some(&BitSymbol::Stop));
        assert_eq!(p.to_string(), "S01234567E--");
    }

    #[test]
    fn parses_pc1211_pattern_with_two_starts() {
        let p = BitPattern::parse("S4567----S0123-----").unwrap();
        let starts = p
            .symbols()
            .iter()
            .filter(|s| **s == BitSymbol::Start)
            .count();
        assert_eq!(starts, 2);
    }

    #[test]
    fn rejects_duplicate_data_bit() {
        let err = BitPattern::parse("S00-").unwrap_err();
        assert!(matches!(err, BitPatternError::DuplicateDataBit(0)));
    }

    #[test]
    fn rejects_missing_start() {
        let err = BitPattern::parse("01234567E--").unwrap_err();
        assert!(matches!(err, BitPatternError::MissingStart(_)));
    }

    #[test]
    fn from_parts_matches_fx502p_shape() {
        let p = BitPattern::from_parts(8, Parity::Even, 2);
        assert_eq!(p.to_string(), "S01234567E--");
    }

    #[test]
    fn hw_lengths_match_base_freq_and_baud() {
        let cfg = ProtocolConfig {
            base_freq: 2400,
            baud: 300,
            bit_pattern: BitPattern::from_parts(8, Parity::Even, 2),
            gain: None,
            sinc: None,
        };
        assert_eq!(cfg.hw_len_0(), 8);
        assert_eq!(cfg.hw_len_1(), 16);
    }
}
