//! Sharp PC-1211 framing and codec: the `S4567----S0123-----` split-nibble
//! bit pattern, a running nibble-sum checksum inserted every 8 payload
//! bytes, a nibble-swapped filename record, and BCD program-line numbers.

pub mod res;
pub mod tokens;

use std::collections::HashMap;

use crate::config::{BitPattern, ProtocolConfig};
use crate::models::{ByteSource, FrameEvent, Model};
use crate::utils::errors::ModelError;

/// Record identity byte every PC-1211 tape image starts with.
const IDENT: u8 = 0x80;
/// Filename record terminator, written after the 7 nibble-swapped tokens.
const FNAME_TERM: u8 = 0x5f;
/// End-of-program marker; its trailing idle tone is longer than the
/// per-checksum idle used mid-stream.
const EOF_MARKER: u8 = 0xf0;

pub struct Pc1211 {
    tokens_t2b: HashMap<&'static str, u8>,
    tokens_b2t: HashMap<u8, &'static str>,
}

impl Default for Pc1211 {
    fn default() -> Self {
        Self {
            tokens_t2b: tokens::build_tokens_t2b(),
            tokens_b2t: tokens::build_tokens_b2t(),
        }
    }
}

impl Model for Pc1211 {
    fn protocol_config(&self) -> ProtocolConfig {
        ProtocolConfig {
            base_freq: 4000,
            baud: 500,
            bit_pattern: BitPattern::parse("S4567----S0123-----").expect("valid pattern"),
            gain: None,
            sinc: None,
        }
    }

    fn decode_frame(&self, src: &mut ByteSource) -> Result<Vec<u8>, ModelError> {
        decode_program(src)
    }

    fn encode_frame(&self, payload: &[u8]) -> Vec<FrameEvent> {
        encode_program(payload)
    }

    fn bytes2text(&self, data: &[u8]) -> Result<String, ModelError> {
        if data.len() < 9 || data[0] != IDENT {
            return Err(ModelError::UnrecognizedHeader(format!("{:02x}", data.first().copied().unwrap_or(0))));
        }

        let fname = decode_filename(data, &self.tokens_b2t);
        let mut output = format!("PROGRAM \"{fname}\"\n");

        let mut i = 9;
        while i + 1 < data.len() {
            let Some(lineno) = decode_line_number(data[i], data[i + 1]) else {
                break;
            };
            i += 2;
            output.push_str(&format!("{lineno}:"));
            while i < data.len() && data[i] != 0x00 {
                let b = data[i];
                i += 1;
                match self.tokens_b2t.get(&b) {
                    Some(tok) => output.push_str(tok),
                    None => output.push_str(&format!("[{b:02X}]")),
                }
            }
            i += 1; // skip the 0x00 terminator
            output.push('\n');
        }

        Ok(output)
    }

    fn text2bytes(&self, text: &str) -> Result<Vec<u8>, ModelError> {
        let mut lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_uppercase);

        let header = lines
            .next()
            .ok_or_else(|| ModelError::UnrecognizedHeader(String::new()))?;
        if !header.starts_with("PROGRAM") {
            return Err(ModelError::UnrecognizedHeader(header));
        }
        let fname = header["PROGRAM".len()..].trim().trim_matches('"').to_string();

        let mut data = vec![IDENT];
        data.extend(encode_filename(&fname, &self.tokens_t2b)?);

        let mut errors = Vec::new();
        for line in lines {
            let Some((lineno_str, body)) = line.split_once(':') else {
                errors.push(format!("missing line number in '{line}'"));
                continue;
            };
            let Ok(lineno) = lineno_str.trim().parse::<u32>() else {
                errors.push(format!("bad line number '{lineno_str}'"));
                continue;
            };
            if lineno > 999 {
                errors.push(format!("line number {lineno} exceeds 999"));
                continue;
            }
            let (b1, b2) = encode_line_number(lineno);
            data.push(b1);
            data.push(b2);

            match tokenize_line(body.trim(), &self.tokens_t2b) {
                Ok(mut toks) => data.append(&mut toks),
                Err(ModelError::UnsupportedToken(t)) => errors.push(format!("unsupported token '{t}'")),
                Err(e) => errors.push(e.to_string()),
            }
            data.push(0x00);
        }

        if !errors.is_empty() {
            return Err(ModelError::ParseError(errors.len(), errors.join("\n")));
        }

        data.push(EOF_MARKER);
        Ok(data)
    }
}

/// Folds one more byte's nibbles into a running checksum, carrying on a
/// high-nibble overflow past 0xff.
fn checksum_add(chksum: u8, b: u8) -> u8 {
    let mut acc = chksum as u16 + (((b & 0xf0) >> 4) as u16);
    if acc > 0xff {
        acc += 1;
    }
    let acc = (acc & 0xff) as u8;
    ((acc as u16 + (b & 0x0f) as u16) & 0xff) as u8
}

fn nibble_swap(b: u8) -> u8 {
    ((b & 0xf0) >> 4) | ((b & 0x0f) << 4)
}

fn encode_line_number(n: u32) -> (u8, u8) {
    let h = (n / 100) % 10;
    let t = (n / 10) % 10;
    let u = n % 10;
    (0xe0 | h as u8, ((t as u8) << 4) | u as u8)
}

fn decode_line_number(b1: u8, b2: u8) -> Option<u32> {
    if b1 & 0xf0 != 0xe0 {
        return None;
    }
    let h = (b1 & 0x0f) as u32;
    let t = ((b2 & 0xf0) >> 4) as u32;
    let u = (b2 & 0x0f) as u32;
    Some(h * 100 + t * 10 + u)
}

/// Builds the 8-byte filename record: up to 7 characters, nibble-swapped in
/// reverse order and left-padded with zero tokens, terminated by `0x5f`.
fn encode_filename(fname: &str, tokens_t2b: &HashMap<&'static str, u8>) -> Result<Vec<u8>, ModelError> {
    let chars: Vec<char> = fname.chars().take(7).collect();
    let mut toks = Vec::with_capacity(7);
    for c in &chars {
        let key = c.to_string();
        let byte = *tokens_t2b
            .get(key.as_str())
            .ok_or_else(|| ModelError::UnsupportedToken(key.clone()))?;
        toks.push(byte);
    }
    toks.reverse();
    while toks.len() < 7 {
        toks.insert(0, 0x00);
    }

    let mut out: Vec<u8> = toks.into_iter().map(nibble_swap).collect();
    out.push(FNAME_TERM);
    Ok(out)
}

/// Reads the filename back out of `data[1..8]` (the 7 nibble-swapped
/// tokens); `data[8]` is the terminator and isn't consulted here.
fn decode_filename(data: &[u8], tokens_b2t: &HashMap<u8, &'static str>) -> String {
    let mut fname = String::new();
    for i in (1..=7).rev() {
        let b = nibble_swap(data[i]);
        if b != 0 {
            fname.push_str(tokens_b2t.get(&b).copied().unwrap_or("?"));
        }
    }
    fname
}

/// Tokenizes one program line's body: keywords (a run of uppercase letters
/// matched against the table with its trailing space) take priority, then
/// quoted strings (character by character), then the `|E` escape, then a
/// single-character fallback.
fn tokenize_line(line: &str, tokens_t2b: &HashMap<&'static str, u8>) -> Result<Vec<u8>, ModelError> {
    let chars: Vec<char> = line.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }

        if chars[i].is_ascii_uppercase() {
            let mut j = i;
            while j < chars.len() && chars[j].is_ascii_uppercase() {
                j += 1;
            }
            if j - i >= 2 {
                let key = format!("{} ", chars[i..j].iter().collect::<String>());
                if let Some(&b) = tokens_t2b.get(key.as_str()) {
                    out.push(b);
                    i = j;
                    while i < chars.len() && chars[i].is_whitespace() {
                        i += 1;
                    }
                    continue;
                }
            }
        }

        if chars[i] == '"' {
            let mut j = i + 1;
            while j < chars.len() && chars[j] != '"' {
                j += 1;
            }
            if j >= chars.len() {
                return Err(ModelError::ParseError(1, format!("unterminated string in '{line}'")));
            }
            for &c in &chars[i..=j] {
                let key = c.to_string();
                let b = *tokens_t2b
                    .get(key.as_str())
                    .ok_or_else(|| ModelError::UnsupportedToken(key.clone()))?;
                out.push(b);
            }
            i = j + 1;
            continue;
        }

        if chars[i] == '|' && chars.get(i + 1) == Some(&'E') {
            if let Some(&b) = tokens_t2b.get("|E") {
                out.push(b);
                i += 2;
                continue;
            }
        }

        let key = chars[i].to_string();
        let b = *tokens_t2b
            .get(key.as_str())
            .ok_or_else(|| ModelError::UnsupportedToken(key.clone()))?;
        out.push(b);
        i += 1;
    }

    Ok(out)
}

/// Walks the logical payload (ident, filename record, line records, EOF
/// marker) and strips out the checksum bytes inserted every 9th byte,
/// returning the underlying data plus the ident and filename checksums
/// folded out. Mirrors the write side's insertion points: a checksum after
/// the 8-byte filename record, then one every 8 payload bytes after that,
/// with resets at the filename boundary and every 80 payload bytes.
fn decode_program(src: &mut ByteSource) -> Result<Vec<u8>, ModelError> {
    let ident = src()?;
    if ident != IDENT {
        return Err(ModelError::UnrecognizedHeader(format!("{ident:02x}")));
    }
    let mut out = vec![ident];

    let mut chksum = 0u8;
    let mut count = 0u32;
    let mut have_filename = false;

    loop {
        let b = src()?;
        count += 1;

        if count % 9 == 0 {
            if b != chksum {
                return Err(ModelError::ChecksumError { expected: chksum, got: b });
            }
            log::trace!("checksum {chksum:#04x} verified");
            if !have_filename {
                have_filename = true;
                chksum = 0;
                count = 0;
            } else if count == 90 {
                chksum = 0;
                count = 0;
            }
        } else {
            chksum = checksum_add(chksum, b);
            out.push(b);
            if b == EOF_MARKER {
                break;
            }
        }
    }

    Ok(out)
}

/// The inverse of [`decode_program`]: replays the same checksum bookkeeping
/// over the logical payload and splits the result into [`FrameEvent`]s,
/// inserting idle tone where the original writer would pause the carrier.
fn encode_program(payload: &[u8]) -> Vec<FrameEvent> {
    let mut events = vec![FrameEvent::Idle(4.0)];
    let mut pending = Vec::new();
    let mut chksum = 0u8;
    let mut count = 0u32;

    if payload.is_empty() {
        return events;
    }

    pending.push(payload[0]);
    let mut i = 1;

    for _ in 0..8.min(payload.len().saturating_sub(1)) {
        let b = payload[i];
        i += 1;
        pending.push(b);
        chksum = checksum_add(chksum, b);
        count += 1;
        if count % 8 == 0 {
            pending.push(chksum);
            log::debug!("emitting checksum {chksum:#04x} after filename record");
        }
    }
    chksum = 0;
    count = 0;
    events.push(FrameEvent::Bytes(std::mem::take(&mut pending)));
    events.push(FrameEvent::Idle(0.25));

    while i < payload.len() {
        let b = payload[i];
        i += 1;
        pending.push(b);
        chksum = checksum_add(chksum, b);
        count += 1;
        if count % 8 == 0 {
            pending.push(chksum);
            log::debug!("emitting checksum {chksum:#04x} at payload offset {i}");
            if count == 80 {
                chksum = 0;
                count = 0;
                events.push(FrameEvent::Bytes(std::mem::take(&mut pending)));
                events.push(FrameEvent::Idle(4.0));
            }
        }
        if b == EOF_MARKER {
            events.push(FrameEvent::Bytes(std::mem::take(&mut pending)));
            events.push(FrameEvent::Idle(0.5));
            break;
        }
    }

    if !pending.is_empty() {
        events.push(FrameEvent::Bytes(pending));
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_number_round_trips() {
        let (b1, b2) = encode_line_number(10);
        assert_eq!((b1, b2), (0xe0, 0x10));
        assert_eq!(decode_line_number(b1, b2), Some(10));
    }

    #[test]
    fn tokenizes_print_with_quoted_string() {
        let model = Pc1211::default();
        let toks = tokenize_line("PRINT \"HI\"", &model.tokens_t2b).unwrap();
        assert_eq!(toks, vec![0xc1, 0x12, 0x58, 0x59, 0x12]);
    }

    #[test]
    fn filename_round_trips_through_nibble_swap() {
        let model = Pc1211::default();
        let record = encode_filename("AB", &model.tokens_t2b).unwrap();
        assert_eq!(record.len(), 8);
        let mut data = vec![IDENT];
        data.extend(record);
        let fname = decode_filename(&data, &model.tokens_b2t);
        assert_eq!(fname, "AB");
    }

    #[test]
    fn checksum_runs_every_eight_payload_bytes() {
        let payload = vec![IDENT, 0, 0, 0, 0, 0, 0, 0, 0x5f, 0xe0, 0x10, 0xc1, 0x00, EOF_MARKER];
        let events = encode_program(&payload);
        // first Bytes group after the lead-in idle is the ident + filename + its checksum
        let FrameEvent::Bytes(first) = &events[1] else {
            panic!("expected bytes event");
        };
        assert_eq!(first.len(), 10); // ident + 8 filename bytes + checksum
    }

    #[test]
    fn decode_program_rejects_bad_checksum() {
        let model = Pc1211::default();
        let mut bytes = vec![IDENT, 0, 0, 0, 0, 0, 0, 0, 0, 0xff].into_iter();
        let mut src = move || bytes.next().ok_or(crate::utils::errors::ModemError::NoCarrier);
        let err = model.decode_frame(&mut src).unwrap_err();
        assert!(matches!(err, ModelError::ChecksumError { .. }));
    }
}
