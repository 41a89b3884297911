//! Byte framer: walks a [`BitPattern`] against a [`BitFramer`], assembling
//! data bits into bytes and checking parity where the pattern calls for it.

use crate::config::{BitPattern, BitSymbol};
use crate::modem::bitframer::{encode_bit, BitFramer};
use crate::modem::HalfWave;
use crate::utils::errors::ModemError;

/// Decodes bytes out of a halfwave stream by walking the bit pattern symbol
/// by symbol, re-synchronizing on every `S` the pattern names.
pub struct ByteFramer<I> {
    framer: BitFramer<I>,
    pattern: BitPattern,
}

impl<I> ByteFramer<I>
where
    I: Iterator<Item = HalfWave>,
{
    pub fn new(inner: I, pattern: BitPattern, hw_len_0: usize, hw_len_1: usize) -> Self {
        Self {
            framer: BitFramer::new(inner, hw_len_0, hw_len_1),
            pattern,
        }
    }

    /// Decodes the next byte described by the bit pattern.
    pub fn next_byte(&mut self) -> Result<u8, ModemError> {
        let mut byte = 0u8;
        let mut parity_count = 0u32;

        for symbol in self.pattern.symbols() {
            match *symbol {
                BitSymbol::Start => {
                    self.framer.start_search()?;
                }
                BitSymbol::Data(idx) => {
                    let bit = self.framer.next_bit()?;
                    if bit == 1 {
                        byte |= 1 << idx;
                        parity_count += 1;
                    }
                }
                BitSymbol::ParityEven => {
                    let bit = self.framer.next_bit()?;
                    let expected = (parity_count % 2) as u8;
                    if bit != expected {
                        return Err(ModemError::ParityError {
                            expected,
                            got: bit,
                        });
                    }
                }
                BitSymbol::ParityOdd => {
                    let bit = self.framer.next_bit()?;
                    let expected = 1 - (parity_count % 2) as u8;
                    if bit != expected {
                        return Err(ModemError::ParityError {
                            expected,
                            got: bit,
                        });
                    }
                }
                BitSymbol::Stop => {
                    self.framer.next_bit()?;
                }
            }
        }

        if log::log_enabled!(log::Level::Trace) {
            let ch = byte as char;
            let shown = if ch.is_ascii_graphic() || ch == ' ' { ch } else { '.' };
            log::trace!("{byte:#04x} '{shown}'");
        }

        Ok(byte)
    }
}

/// Encodes a byte into its full halfwave run, following the same bit
/// pattern used for decoding.
pub fn encode_byte(byte: u8, pattern: &BitPattern, hw_len_0: usize, hw_len_1: usize) -> Vec<HalfWave> {
    let mut out = Vec::new();
    let mut parity_count = 0u32;

    for symbol in pattern.symbols() {
        match *symbol {
            BitSymbol::Start => {
                out.extend([
                    HalfWave::One,
                    HalfWave::One,
                    HalfWave::Zero,
                    HalfWave::Zero,
                    HalfWave::Zero,
                    HalfWave::Zero,
                ]);
                out.extend(encode_bit(0, hw_len_0, hw_len_1));
            }
            BitSymbol::Data(idx) => {
                let bit = (byte >> idx) & 1;
                if bit == 1 {
                    parity_count += 1;
                }
                out.extend(encode_bit(bit, hw_len_0, hw_len_1));
            }
            BitSymbol::ParityEven => {
                out.extend(encode_bit((parity_count % 2) as u8, hw_len_0, hw_len_1));
            }
            BitSymbol::ParityOdd => {
                out.extend(encode_bit(1 - (parity_count % 2) as u8, hw_len_0, hw_len_1));
            }
            BitSymbol::Stop => {
                out.extend(encode_bit(1, hw_len_0, hw_len_1));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Parity;

    #[test]
    fn round_trips_a_byte_through_encode_and_decode() {
        let pattern = BitPattern::from_parts(8, Parity::Even, 2);
        let hws = encode_byte(0b0110_1001, &pattern, 4, 8);
        let mut framer = ByteFramer::new(hws.into_iter(), pattern, 4, 8);
        let byte = framer.next_byte().unwrap();
        assert_eq!(byte, 0b0110_1001);
    }

    #[test]
    fn detects_bad_parity() {
        // Minimal pattern: start bit, one data bit, even parity.
        let pattern = BitPattern::parse("S0E").unwrap();
        let (hw_len_0, hw_len_1) = (2, 4);
        let mut hws = vec![
            HalfWave::One,
            HalfWave::One,
            HalfWave::Zero,
            HalfWave::Zero,
            HalfWave::Zero,
            HalfWave::Zero,
        ];
        hws.extend(encode_bit(0, hw_len_0, hw_len_1)); // start body
        hws.extend(encode_bit(1, hw_len_0, hw_len_1)); // data bit 0 = 1
        hws.extend(encode_bit(0, hw_len_0, hw_len_1)); // parity: should be 1, send 0

        let mut framer = ByteFramer::new(hws.into_iter(), pattern, hw_len_0, hw_len_1);
        let err = framer.next_byte().unwrap_err();
        assert!(matches!(err, ModemError::ParityError { .. }));
    }

    #[test]
    fn pc1211_pattern_resyncs_on_second_start() {
        let pattern = BitPattern::parse("S4567----S0123-----").unwrap();
        let hws = encode_byte(0b1010_0101, &pattern, 4, 8);
        let mut framer = ByteFramer::new(hws.into_iter(), pattern, 4, 8);
        let byte = framer.next_byte().unwrap();
        assert_eq!(byte, 0b1010_0101);
    }
}
