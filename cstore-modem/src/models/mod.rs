//! Per-model framing and codecs layered on top of the modem: EOF/checksum
//! framing, and bidirectional byte<->text transcoding.

pub mod fx502p;
pub mod pc1211;

use crate::config::ProtocolConfig;
use crate::utils::errors::ModelError;

/// A pull source of framed bytes off the byte framer, abstracted so model
/// framing code doesn't need to know about the modem pipeline underneath.
pub type ByteSource<'a> = dyn FnMut() -> Result<u8, crate::utils::errors::ModemError> + 'a;

/// One unit of work for the write path: either raw framed bytes to push
/// through the byte encoder, or a span of idle carrier tone (seconds).
/// PC-1211 interleaves both (idle tone after the filename record and every
/// 80 payload bytes); FX-502P only ever emits bytes after its lead-in.
#[derive(Debug, Clone)]
pub enum FrameEvent {
    Bytes(Vec<u8>),
    Idle(f64),
}

/// A calculator-tape protocol: modem configuration plus the framing and
/// text codec layered on top of it.
pub trait Model {
    fn protocol_config(&self) -> ProtocolConfig;

    /// Reads framed bytes off `src` until this model's terminator, applying
    /// whatever checksum/EOF logic the model requires, and returns the
    /// logical payload (header included, checksum/EOF bytes stripped).
    fn decode_frame(&self, src: &mut ByteSource) -> Result<Vec<u8>, ModelError>;

    /// Splits a logical payload into the write-side events needed to frame
    /// it back onto the wire (checksum bytes inserted, idle tones placed).
    fn encode_frame(&self, payload: &[u8]) -> Vec<FrameEvent>;

    fn bytes2text(&self, data: &[u8]) -> Result<String, ModelError>;

    fn text2bytes(&self, text: &str) -> Result<Vec<u8>, ModelError>;
}
