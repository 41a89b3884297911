//! Kansas City Standard audio modem and per-calculator-model codecs.
//!
//! ## Technical Overview
//!
//! A Kansas City Standard modem encodes each bit as a burst of FSK tone:
//! twice as many cycles of the base frequency for a ZERO as for a ONE, both
//! halves the same duration. This crate turns that into a lazy, pull-driven
//! pipeline with no threads and no shared mutable state: raw samples flow
//! through sign-change detection, half-wave classification, carrier
//! calibration, bit framing, and byte framing, one `Iterator::next()` call
//! at a time.
//!
//! On top of the modem sits a per-model layer: each vintage calculator
//! (CASIO FX-502P, Sharp PC-1211, and its Reserved-Keys variant) frames and
//! checksums its bytes differently, and transcodes between the raw on-tape
//! bytes and a human-readable text representation of programs and memory
//! registers.
//!
//! ## Quick Start
//!
//! Steps for saving a tape image to text:
//!
//! 1. Build an [`audio::AudioSession`] reading from a file or a live capture.
//! 2. Calibrate the carrier with [`modem::carrier::calibrate`].
//! 3. Drive a [`modem::bitframer::BitFramer`] and
//!    [`modem::byteframer::ByteFramer`] over the sample stream.
//! 4. Hand the framed bytes to a [`models::Model::decode_frame`] and render
//!    them with [`models::Model::bytes2text`].
//!
//! [`driver::Driver`] wires these stages together for both the save and
//! load directions.

/// Protocol configuration: sample rate, bit-pattern description, and the
/// per-session audio filters.
pub mod config;

/// The modem pipeline: sign-change detection, half-wave classification,
/// carrier calibration, and bit/byte framing.
///
/// - **Sign changes** ([`modem::signchange`]): zero-crossing detection
/// - **Half-waves** ([`modem::halfwave`]): debounced ZERO/ONE classification
/// - **Carrier** ([`modem::carrier`]): lead-in lock and frequency calibration
/// - **Bit framing** ([`modem::bitframer`]): start-bit search and bit decode
/// - **Byte framing** ([`modem::byteframer`]): bit-pattern symbol walking
pub mod modem;

/// Audio process adapters: spawns `sox`/`rec`/`play` for file or live
/// capture and playback, piping raw signed 8-bit mono samples.
pub mod audio;

/// Per-model framing and codecs layered on top of the modem.
///
/// - **FX-502P** ([`models::fx502p`]): 8E2 framing, BCD program/memory codec
/// - **PC-1211** ([`models::pc1211`]): checksum framing, BASIC tokenizer
/// - **PC-1211 Reserved-Keys** ([`models::pc1211::res`]): flat reserved-key
///   entry framing
pub mod models;

/// Drives the save (tape-to-text) and load (text-to-tape) flows end to end.
pub mod driver;

/// Error types and other supporting infrastructure.
///
/// - **Error Handling** ([`utils::errors`]): concern-scoped error enums
pub mod utils;
