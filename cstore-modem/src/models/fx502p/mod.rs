//! CASIO FX-502P framing and codec: 8E2 framing (handled by the generic
//! byte framer), a 0xFF EOF sentinel (no checksum), and the program/memory
//! text transcoders.

pub mod tokens;

use std::collections::HashMap;

use crate::config::{BitPattern, Parity, ProtocolConfig};
use crate::models::{ByteSource, FrameEvent, Model};
use crate::utils::errors::ModelError;

/// Register save order on the wire: `MF`, `M9..M0`, `M1F`, `M19..M10`.
const MEMORY_SEQ: [&str; 22] = [
    "MF", "M9", "M8", "M7", "M6", "M5", "M4", "M3", "M2", "M1", "M0", "M1F", "M19", "M18", "M17",
    "M16", "M15", "M14", "M13", "M12", "M11", "M10",
];

pub struct Fx502p {
    tokens_t2b: HashMap<String, u8>,
}

impl Default for Fx502p {
    fn default() -> Self {
        Self {
            tokens_t2b: tokens::build_tokens_t2b(),
        }
    }
}

impl Model for Fx502p {
    fn protocol_config(&self) -> ProtocolConfig {
        ProtocolConfig {
            base_freq: 2400,
            baud: 300,
            bit_pattern: BitPattern::from_parts(8, Parity::Even, 2),
            gain: None,
            sinc: None,
        }
    }

    fn decode_frame(&self, src: &mut ByteSource) -> Result<Vec<u8>, ModelError> {
        let mut out = Vec::new();
        loop {
            let b = src()?;
            if b == 0xff {
                break;
            }
            out.push(b);
        }
        Ok(out)
    }

    fn encode_frame(&self, payload: &[u8]) -> Vec<FrameEvent> {
        let mut bytes = payload.to_vec();
        bytes.extend(std::iter::repeat_n(0xffu8, 128));
        vec![FrameEvent::Idle(4.0), FrameEvent::Bytes(bytes)]
    }

    fn bytes2text(&self, data: &[u8]) -> Result<String, ModelError> {
        if data.len() < 2 {
            return Err(ModelError::UnrecognizedHeader(String::new()));
        }
        let header = format!("{:02X}{:02X}", data[1], data[0]);
        let kind = header.as_bytes()[0];
        let digits = &header[1..];

        match kind {
            b'B' => Ok(render_program(format!("FP{digits}"), &data[2..])),
            b'F' => Ok(render_memory(format!("F {digits}"), &data[2..])?),
            _ => Err(ModelError::UnrecognizedHeader(header)),
        }
    }

    fn text2bytes(&self, text: &str) -> Result<Vec<u8>, ModelError> {
        let mut lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_uppercase);

        let header = lines
            .next()
            .ok_or_else(|| ModelError::UnrecognizedHeader(String::new()))?;

        if let Some(digits) = header.strip_prefix("FP") {
            program_text2bytes(digits, lines, &self.tokens_t2b)
        } else if let Some(digits) = header.strip_prefix("F ") {
            memory_text2bytes(digits, lines)
        } else {
            Err(ModelError::UnrecognizedHeader(header))
        }
    }
}

fn header_bytes(digits: &str, type_nibble: char) -> Result<(u8, u8), ModelError> {
    if digits.len() != 3 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ModelError::UnrecognizedHeader(digits.to_string()));
    }
    let b0 = u8::from_str_radix(&digits[1..3], 16)
        .map_err(|_| ModelError::UnrecognizedHeader(digits.to_string()))?;
    let b1 = u8::from_str_radix(&format!("{type_nibble}{}", &digits[0..1]), 16)
        .map_err(|_| ModelError::UnrecognizedHeader(digits.to_string()))?;
    Ok((b0, b1))
}

fn render_program(header: String, data: &[u8]) -> String {
    let mut output = header;
    let mut line: Vec<&str> = Vec::new();

    for &byte in data {
        let token = tokens::TOKENS_B2T[byte as usize];
        if let Some(stripped) = token.strip_suffix(':') {
            if !line.is_empty() {
                output.push_str("\n    ");
                output.push_str(&line.join(" "));
                line.clear();
            }
            output.push('\n');
            if stripped.starts_with('P') {
                output.push_str(token);
            } else {
                output.push_str("  ");
                output.push_str(token);
            }
        } else {
            line.push(token);
        }

        if line.join(" ").len() >= 70 {
            output.push_str("\n    ");
            output.push_str(&line.join(" "));
            line.clear();
        }
    }

    if !line.is_empty() {
        output.push_str("\n    ");
        output.push_str(&line.join(" "));
    }

    output.push('\n');
    output
}

fn render_memory(header: String, data: &[u8]) -> Result<String, ModelError> {
    let mut output = header;
    output.push('\n');

    for (i, name) in MEMORY_SEQ.iter().enumerate() {
        let reg = &data[i * 8..i * 8 + 8];
        let value = bcd_bytes_to_number(reg)?;
        if value != 0.0 {
            output.push_str(name);
            output.push_str(": ");
            output.push_str(&format!("{value:?}"));
            output.push('\n');
        }
    }

    output.push('\n');
    Ok(output)
}

/// Reads a BCD byte's two nibbles as a two-digit decimal number (each
/// nibble is itself a decimal digit 0-9).
fn bcd_byte_to_decimal(b: u8) -> u32 {
    ((b >> 4) as u32) * 10 + (b & 0x0f) as u32
}

/// Packs a two-digit decimal number (0-99) into a BCD byte.
fn decimal_to_bcd_byte(v: u32) -> u8 {
    (((v / 10) as u8) << 4) | ((v % 10) as u8)
}

/// Decodes an 8-byte BCD register into its floating-point value, per
/// §4.7's exponent/flags/mantissa layout.
fn bcd_bytes_to_number(reg: &[u8]) -> Result<f64, ModelError> {
    let exponent_bcd = reg[0];
    let flags = reg[1];

    // 12 BCD nibbles in reverse byte order.
    let mut digits = String::new();
    for &byte in reg[2..8].iter().rev() {
        digits.push_str(&format!("{byte:02X}"));
    }
    // The leading nibble is always the padding zero added on encode; the
    // mantissa is the next digit, a decimal point, then the rest.
    let mantissa_str = format!("{}.{}", &digits[1..2], &digits[2..]);
    let mut value: f64 = mantissa_str.parse().unwrap_or(0.0);

    if flags & 0x08 != 0 {
        value = -value;
    }

    let exponent = bcd_byte_to_decimal(exponent_bcd) as i32;
    let exponent = if flags & 0x01 != 0 {
        exponent
    } else {
        -(100 - exponent)
    };

    Ok(value * 10f64.powi(exponent))
}

/// Encodes a value into an 8-byte BCD register, the inverse of
/// [`bcd_bytes_to_number`].
fn number_to_bcd_bytes(value: f64) -> [u8; 8] {
    if value == 0.0 {
        return [0; 8];
    }

    let mut flags = 0u8;
    let formatted = format!("{value:1.9e}");
    let (mantissa, exp_str) = formatted.split_once('e').expect("exponential form");
    let negative = mantissa.starts_with('-');
    if negative {
        flags |= 0x08;
    }
    let mantissa = mantissa.trim_start_matches('-');
    let (lead, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let exponent: i32 = exp_str.trim_start_matches('+').parse().expect("numeric exponent");
    let exp_byte = if exponent >= 0 {
        flags |= 0x01;
        decimal_to_bcd_byte(exponent as u32)
    } else {
        decimal_to_bcd_byte((100 - (-exponent)) as u32)
    };

    // Leading padding zero, the one mantissa digit before the point, the
    // nine digits after it, and a trailing padding zero: 12 hex nibbles.
    let mut digits = String::from("0");
    digits.push_str(lead);
    digits.push_str(frac);
    digits.push('0');

    let mut out = [0u8; 8];
    out[0] = exp_byte;
    out[1] = flags;
    let pairs = [[10, 12], [8, 10], [6, 8], [4, 6], [2, 4], [0, 2]];
    for (slot, [lo, hi]) in pairs.iter().enumerate() {
        let pair = &digits[*lo..*hi];
        out[2 + slot] = u8::from_str_radix(pair, 16).unwrap_or(0);
    }
    out
}

fn program_text2bytes(
    digits: &str,
    lines: impl Iterator<Item = String>,
    tokens_t2b: &HashMap<String, u8>,
) -> Result<Vec<u8>, ModelError> {
    let (b0, b1) = header_bytes(digits, 'B')?;
    let mut data = vec![b0, b1];

    let mut errors = Vec::new();
    for line in lines {
        for tok in line.split_whitespace() {
            if tok == "INV" {
                continue;
            }
            match tokens_t2b.get(tok) {
                Some(&byte) => data.push(byte),
                None => errors.push(format!("unrecognized token '{tok}'")),
            }
        }
    }

    if errors.is_empty() {
        Ok(data)
    } else {
        Err(ModelError::ParseError(errors.len(), errors.join("\n")))
    }
}

fn memory_text2bytes(
    digits: &str,
    lines: impl Iterator<Item = String>,
) -> Result<Vec<u8>, ModelError> {
    let (b0, b1) = header_bytes(digits, 'F')?;
    let mut data = vec![b0, b1];

    let mut registers: HashMap<&str, f64> = MEMORY_SEQ.iter().map(|&n| (n, 0.0)).collect();
    let mut errors = Vec::new();

    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            errors.push(format!("invalid format '{line}'"));
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        let Ok(val) = value.parse::<f64>() else {
            errors.push(format!("bad register value '{value}'"));
            continue;
        };
        match registers.get_mut(name) {
            Some(slot) => *slot = val,
            None => errors.push(format!("unknown register '{name}'")),
        }
    }

    if !errors.is_empty() {
        return Err(ModelError::ParseError(errors.len(), errors.join("\n")));
    }

    for name in MEMORY_SEQ {
        data.extend(number_to_bcd_bytes(registers[name]));
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_register_round_trips() {
        let bytes = number_to_bcd_bytes(0.0);
        assert_eq!(bytes, [0; 8]);
        assert_eq!(bcd_bytes_to_number(&bytes).unwrap(), 0.0);
    }

    #[test]
    fn negative_exponent_register_round_trips() {
        let bytes = number_to_bcd_bytes(-1500.0);
        let value = bcd_bytes_to_number(&bytes).unwrap();
        assert!((value - -1500.0).abs() < 1e-6, "got {value}");
    }

    #[test]
    fn positive_small_value_round_trips() {
        for v in [1.0, 3.14159, 0.001, 99999.0] {
            let bytes = number_to_bcd_bytes(v);
            let back = bcd_bytes_to_number(&bytes).unwrap();
            assert!((back - v).abs() / v.abs() < 1e-6, "{v} -> {back}");
        }
    }

    #[test]
    fn program_header_decodes_fp() {
        let model = Fx502p::default();
        // data[1]=0xB0, data[0]=0x42 -> "B042" -> kind 'B', digits "042"
        let text = model.bytes2text(&[0x42, 0xB0]).unwrap();
        assert!(text.starts_with("FP042"));
    }

    #[test]
    fn decode_frame_stops_at_first_ff() {
        let model = Fx502p::default();
        let mut data = vec![0x01u8, 0x02, 0x03, 0xff, 0xff, 0xff].into_iter();
        let mut src = move || {
            data.next()
                .ok_or(crate::utils::errors::ModemError::NoCarrier)
        };
        let frame = model.decode_frame(&mut src).unwrap();
        assert_eq!(frame, vec![0x01, 0x02, 0x03]);
    }
}
