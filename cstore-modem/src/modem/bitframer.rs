//! Bit framer: finds the start-bit marker in a halfwave stream and decodes
//! the halfwaves between markers into logical bits, one bit per call.
//!
//! Encoding runs the opposite direction: turns a logical bit into the right
//! number of ONE/ZERO halfwaves.

use std::collections::VecDeque;

use crate::modem::HalfWave;
use crate::utils::errors::ModemError;

/// The fixed halfwave signature that announces a start bit: two ONE
/// halfwaves (the settle from the carrier) followed by four ZERO halfwaves.
const START_MARKER: [HalfWave; 6] = [
    HalfWave::One,
    HalfWave::One,
    HalfWave::Zero,
    HalfWave::Zero,
    HalfWave::Zero,
    HalfWave::Zero,
];

/// Decodes logical bits out of a halfwave stream, given the halfwave counts
/// that make up a ZERO bit and a ONE bit.
pub struct BitFramer<I> {
    inner: I,
    hw_len_0: usize,
    hw_len_1: usize,
    buf: VecDeque<HalfWave>,
}

impl<I> BitFramer<I>
where
    I: Iterator<Item = HalfWave>,
{
    pub fn new(inner: I, hw_len_0: usize, hw_len_1: usize) -> Self {
        Self {
            inner,
            hw_len_0,
            hw_len_1,
            buf: VecDeque::with_capacity(hw_len_1),
        }
    }

    /// Scans forward for the start-bit marker, consuming the halfwaves that
    /// make it up plus the trailing `hw_len_0` halfwaves of the start bit
    /// itself, and pre-fills the decode buffer for the first data bit.
    ///
    /// Returns `Ok(())` positioned to decode the bit immediately following
    /// the start bit.
    pub fn start_search(&mut self) -> Result<(), ModemError> {
        let mut window: VecDeque<HalfWave> = VecDeque::with_capacity(6);
        loop {
            let Some(hw) = self.inner.next() else {
                return Err(ModemError::NoCarrier);
            };
            window.push_back(hw);
            if window.len() > 6 {
                window.pop_front();
            }
            if window.len() == 6 && window.iter().eq(START_MARKER.iter()) {
                break;
            }
        }

        for _ in 0..self.hw_len_0 {
            if self.inner.next().is_none() {
                return Err(ModemError::NoCarrier);
            }
        }

        self.buf.clear();
        for _ in 0..self.hw_len_1 {
            match self.inner.next() {
                Some(hw) => self.buf.push_back(hw),
                None => return Err(ModemError::NoCarrier),
            }
        }
        Ok(())
    }

    /// Decodes the next data bit from the pre-filled buffer. A ZERO bit is
    /// shorter than a ONE bit, so the halfwave at `hw_len_0/2` has already
    /// settled to ZERO by the time a ZERO bit's sampling point arrives;
    /// only if that position is still ONE do we check the later `hw_len_1/2`
    /// position to confirm a ONE bit. Refills the buffer one halfwave at a
    /// time as it consumes the front.
    pub fn next_bit(&mut self) -> Result<u8, ModemError> {
        if self.buf.len() < self.hw_len_1 {
            return Err(ModemError::BitDecodeFailure);
        }

        let bit = if self.buf[self.hw_len_0 / 2] == HalfWave::Zero {
            0
        } else if self.buf[self.hw_len_1 / 2] == HalfWave::One {
            1
        } else {
            return Err(ModemError::BitDecodeFailure);
        };

        let consume = if bit == 1 {
            self.hw_len_1
        } else {
            self.hw_len_0
        };
        for _ in 0..consume {
            self.buf.pop_front();
        }
        for _ in 0..consume {
            match self.inner.next() {
                Some(hw) => self.buf.push_back(hw),
                None => return Err(ModemError::NoCarrier),
            }
        }

        Ok(bit)
    }
}

/// Encodes a logical bit into a run of ONE or ZERO halfwaves.
pub fn encode_bit(bit: u8, hw_len_0: usize, hw_len_1: usize) -> Vec<HalfWave> {
    if bit == 1 {
        vec![HalfWave::One; hw_len_1]
    } else {
        vec![HalfWave::Zero; hw_len_0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leadin_and_bits(bits: &[u8], hw_len_0: usize, hw_len_1: usize) -> Vec<HalfWave> {
        let mut hws = vec![
            HalfWave::One,
            HalfWave::One,
            HalfWave::Zero,
            HalfWave::Zero,
            HalfWave::Zero,
            HalfWave::Zero,
        ];
        hws.extend(std::iter::repeat_n(HalfWave::Zero, hw_len_0)); // start bit body
        for &b in bits {
            hws.extend(encode_bit(b, hw_len_0, hw_len_1));
        }
        hws
    }

    #[test]
    fn decodes_bits_following_start_marker() {
        let hws = leadin_and_bits(&[1, 0, 1, 1], 4, 8);
        let mut framer = BitFramer::new(hws.into_iter(), 4, 8);
        framer.start_search().unwrap();
        let decoded: Vec<u8> = (0..4).map(|_| framer.next_bit().unwrap()).collect();
        assert_eq!(decoded, vec![1, 0, 1, 1]);
    }

    #[test]
    fn start_search_fails_without_marker() {
        let hws = vec![HalfWave::Zero; 20];
        let mut framer = BitFramer::new(hws.into_iter(), 4, 8);
        let err = framer.start_search().unwrap_err();
        assert!(matches!(err, ModemError::NoCarrier));
    }
}
