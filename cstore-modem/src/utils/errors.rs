//! Error types for the modem, framing, and per-model codec layers.
//!
//! Grouped by the component that raises them, following the error kinds in
//! the protocol's design: audio I/O, the FSK modem, bit-pattern
//! configuration, and the per-model framing/codec layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("failed to launch audio process {0:?}")]
    Spawn(Vec<String>, #[source] std::io::Error),

    #[error("audio pipe closed unexpectedly")]
    PipeClosed,

    #[error("audio I/O error")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ModemError {
    #[error("lead-in carrier not detected before end of stream")]
    NoCarrier,

    #[error("ambiguous half-wave buffer at bit boundary")]
    BitDecodeFailure,

    #[error("parity error: expected {expected}, got {got}")]
    ParityError { expected: u8, got: u8 },
}

#[derive(Error, Debug)]
pub enum BitPatternError {
    #[error("bit pattern '{0}' has no start symbol 'S'")]
    MissingStart(String),

    #[error("duplicate data-bit index {0} in bit pattern")]
    DuplicateDataBit(u8),

    #[error("unknown bit-pattern symbol '{0}'")]
    UnknownSymbol(char),
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error(transparent)]
    Modem(#[from] ModemError),

    #[error("unrecognized header: {0}")]
    UnrecognizedHeader(String),

    #[error("unsupported token '{0}' on encode")]
    UnsupportedToken(String),

    #[error("checksum error: expected {expected:#04x}, got {got:#04x}")]
    ChecksumError { expected: u8, got: u8 },

    #[error("reserved-key payload of {0} bytes exceeds the 57-byte limit")]
    LengthError(usize),

    #[error("{0} error(s) parsing text:\n{1}")]
    ParseError(usize, String),
}
