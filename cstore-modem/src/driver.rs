//! Drives the save (tape-to-text) and load (text-to-tape) flows: wires an
//! [`AudioSession`] through the modem pipeline and a [`Model`]'s framing.

use crate::audio::{AudioByteIter, AudioFilters, AudioSession, Direction, Target};
use crate::modem::byteframer::{encode_byte, ByteFramer};
use crate::modem::halfwave::HalfWaveClassifier;
use crate::modem::signchange::SignChangeStream;
use crate::modem::{carrier, encode_halfwaves};
use crate::models::{FrameEvent, Model};
use crate::utils::errors::{AudioError, ModelError, ModemError};

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Modem(#[from] ModemError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Reads a tape image and returns the logical payload bytes, decoded
/// through the carrier lock, bit/byte framers, and the model's own
/// checksum/EOF framing.
pub fn save(target: Target, filters: &AudioFilters, model: &dyn Model) -> Result<Vec<u8>, DriverError> {
    let cfg = model.protocol_config();
    let session = AudioSession::open(target, Direction::Read, filters)?;
    let mut sbc = SignChangeStream::new(AudioByteIter::new(session));

    let lock = carrier::calibrate(&mut sbc, cfg.base_freq)?;
    let hws = HalfWaveClassifier::new(sbc, lock.hw_midpoint());
    let mut framer = ByteFramer::new(
        hws,
        cfg.bit_pattern.clone(),
        lock.hw_len_0(cfg.baud),
        lock.hw_len_1(cfg.baud),
    );

    let mut src = move || framer.next_byte();
    let payload = model.decode_frame(&mut src)?;
    Ok(payload)
}

/// Writes a logical payload to tape: splits it into the model's framing
/// events and renders each byte run or idle span as PCM through the audio
/// adapter.
pub fn load(target: Target, filters: &AudioFilters, model: &dyn Model, payload: &[u8]) -> Result<(), DriverError> {
    let cfg = model.protocol_config();
    let mut session = AudioSession::open(target, Direction::Write, filters)?;

    for event in model.encode_frame(payload) {
        match event {
            FrameEvent::Bytes(bytes) => {
                for b in bytes {
                    let hws = encode_byte(b, &cfg.bit_pattern, cfg.hw_len_0(), cfg.hw_len_1());
                    let pcm = encode_halfwaves(&hws, cfg.base_freq);
                    session.write_bytes(&pcm)?;
                }
            }
            FrameEvent::Idle(secs) => {
                // A full bit period of ones is `hw_len_1` halfwaves long;
                // `baud * secs` of those periods fill the requested span.
                let periods = (cfg.baud as f64 * secs).round() as usize;
                let hws = vec![crate::modem::HalfWave::One; periods * cfg.hw_len_1()];
                let pcm = encode_halfwaves(&hws, cfg.base_freq);
                session.write_bytes(&pcm)?;
            }
        }
    }

    session.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fx502p::Fx502p;

    #[test]
    fn driver_error_wraps_model_errors() {
        let err: DriverError = ModelError::UnrecognizedHeader("xx".into()).into();
        assert!(matches!(err, DriverError::Model(_)));
    }

    #[test]
    fn encode_frame_events_cover_every_payload_byte() {
        let model = Fx502p::default();
        let payload = vec![1u8, 2, 3];
        let events = model.encode_frame(&payload);
        let total: usize = events
            .iter()
            .filter_map(|e| match e {
                FrameEvent::Bytes(b) => Some(b.len()),
                FrameEvent::Idle(_) => None,
            })
            .sum();
        assert_eq!(total, payload.len() + 128);
    }
}
