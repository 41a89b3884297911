//! Sharp PC-1211 Reserved-Keys variant: the same checksum framing and
//! filename record as the ordinary program protocol, but the payload after
//! the filename is a flat run of reserved-key entries instead of
//! line-numbered program lines, padded to a fixed 58-byte record.

use std::collections::HashMap;

use crate::config::{BitPattern, ProtocolConfig};
use crate::models::pc1211::tokens as pc1211_tokens;
use crate::models::pc1211::{decode_filename, decode_program, encode_filename, encode_program, tokenize_line};
use crate::models::{ByteSource, FrameEvent, Model};
use crate::utils::errors::ModelError;

const IDENT: u8 = 0x80;
const EOF_MARKER: u8 = 0xf0;
/// Total record length including the trailing EOF marker; the payload
/// before it is padded with `0x00` up to 57 bytes.
const RECORD_LEN: usize = 58;

pub struct Pc1211Res {
    tokens_t2b: HashMap<&'static str, u8>,
    tokens_b2t: HashMap<u8, &'static str>,
    reskeys_t2b: HashMap<&'static str, u8>,
    reskeys_b2t: HashMap<u8, &'static str>,
}

impl Default for Pc1211Res {
    fn default() -> Self {
        Self {
            tokens_t2b: pc1211_tokens::build_tokens_t2b(),
            tokens_b2t: pc1211_tokens::build_tokens_b2t(),
            reskeys_t2b: pc1211_tokens::build_reskeys_t2b(),
            reskeys_b2t: pc1211_tokens::build_reskeys_b2t(),
        }
    }
}

impl Model for Pc1211Res {
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
            return Err(ModelError::UnrecognizedHeader(format!(
                "{:02x}",
                data.first().copied().unwrap_or(0)
            )));
        }

        let fname = decode_filename(data, &self.tokens_b2t);
        let mut output = format!("RESERVED \"{fname}\"\n");

        let mut i = 9;
        while i < data.len() && data[i] != EOF_MARKER && data[i] != 0x00 {
            let key = data[i];
            i += 1;
            match self.reskeys_b2t.get(&key) {
                Some(mnemonic) => output.push_str(mnemonic),
                None => return Err(ModelError::UnrecognizedHeader(format!("{key:02x}"))),
            }
            while i < data.len()
                && data[i] != 0x00
                && data[i] != EOF_MARKER
                && !self.reskeys_b2t.contains_key(&data[i])
            {
                let b = data[i];
                i += 1;
                match self.tokens_b2t.get(&b) {
                    Some(tok) => output.push_str(tok),
                    None => output.push_str(&format!("[{b:02X}]")),
                }
            }
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
        if !header.starts_with("RESERVED") {
            return Err(ModelError::UnrecognizedHeader(header));
        }
        let fname = header["RESERVED".len()..].trim().trim_matches('"').to_string();

        let mut data = vec![IDENT];
        data.extend(encode_filename(&fname, &self.tokens_t2b)?);

        let mut errors = Vec::new();
        for line in lines {
            if line.len() < 2 {
                errors.push(format!("reserved key line too short: '{line}'"));
                continue;
            }
            let (key, rest) = line.split_at(2);
            match self.reskeys_t2b.get(key) {
                Some(&byte) => data.push(byte),
                None => {
                    errors.push(format!("unknown reserved key '{key}'"));
                    continue;
                }
            }
            match tokenize_line(rest.trim(), &self.tokens_t2b) {
                Ok(mut toks) => data.append(&mut toks),
                Err(ModelError::UnsupportedToken(t)) => errors.push(format!("unsupported token '{t}'")),
                Err(e) => errors.push(e.to_string()),
            }
        }

        if !errors.is_empty() {
            return Err(ModelError::ParseError(errors.len(), errors.join("\n")));
        }

        if data.len() > RECORD_LEN - 1 {
            return Err(ModelError::LengthError(data.len()));
        }
        data.resize(RECORD_LEN - 1, 0x00);
        data.push(EOF_MARKER);
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_key_round_trips_through_encode_and_decode() {
        let model = Pc1211Res::default();
        let text = "RESERVED \"X\"\nA:PRINT \"HI\"\n";
        let bytes = model.text2bytes(text).unwrap();
        assert_eq!(bytes.len(), RECORD_LEN);
        assert_eq!(bytes[0], IDENT);
        assert_eq!(*bytes.last().unwrap(), EOF_MARKER);

        let decoded = model.bytes2text(&bytes).unwrap();
        assert!(decoded.contains("RESERVED \"X\""));
        assert!(decoded.contains("A:PRINT \"HI\""));
    }

    #[test]
    fn overlong_entries_are_rejected() {
        let model = Pc1211Res::default();
        let mut text = String::from("RESERVED \"\"\n");
        for _ in 0..20 {
            text.push_str("A:PRINT \"0123456789\"\n");
        }
        let err = model.text2bytes(&text).unwrap_err();
        assert!(matches!(err, ModelError::LengthError(_)));
    }
}
