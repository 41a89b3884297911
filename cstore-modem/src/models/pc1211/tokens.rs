//! Byte<->mnemonic token table for the Sharp PC-1211 BASIC tokenizer,
//! transcribed from the calculator's program byte encoding. Unlike the
//! FX-502P table this one is sparse: only defined byte values carry a
//! token, and undefined bytes render as `[HH]` on decode.

/// `(byte, mnemonic)` pairs as they appear on the wire.
pub const TOKENS_B2T: &[(u8, &str)] = &[
    (0x11, " "),
    (0x12, "\""),
    (0x13, "?"),
    (0x14, "!"),
    (0x15, "#"),
    (0x16, "%"),
    (0x17, "¥"),
    (0x18, "$"),
    (0x19, "π"),
    (0x1a, "√"),
    (0x1b, ","),
    (0x1c, ";"),
    (0x1d, ":"),
    (0x30, "("),
    (0x31, ")"),
    (0x32, ">"),
    (0x33, "<"),
    (0x34, "="),
    (0x35, "+"),
    (0x36, "-"),
    (0x37, "*"),
    (0x38, "/"),
    (0x39, "^"),
    (0x40, "0"),
    (0x41, "1"),
    (0x42, "2"),
    (0x43, "3"),
    (0x44, "4"),
    (0x45, "5"),
    (0x46, "6"),
    (0x47, "7"),
    (0x48, "8"),
    (0x49, "9"),
    (0x4b, "|E"),
    (0x51, "A"),
    (0x52, "B"),
    (0x53, "C"),
    (0x54, "D"),
    (0x55, "E"),
    (0x56, "F"),
    (0x57, "G"),
    (0x58, "H"),
    (0x59, "I"),
    (0x5a, "J"),
    (0x5b, "K"),
    (0x5c, "L"),
    (0x5d, "M"),
    (0x5e, "N"),
    (0x5f, "O"),
    (0x60, "P"),
    (0x61, "Q"),
    (0x62, "R"),
    (0x63, "S"),
    (0x64, "T"),
    (0x65, "U"),
    (0x66, "V"),
    (0x67, "W"),
    (0x68, "X"),
    (0x69, "Y"),
    (0x6a, "Z"),
    (0x91, "STEP "),
    (0x92, "THEN "),
    (0xa0, "SIN "),
    (0xa1, "COS "),
    (0xa2, "TAN "),
    (0xa3, "ASN "),
    (0xa4, "ACS "),
    (0xa5, "ATN "),
    (0xa6, "EXP "),
    (0xa7, "LN "),
    (0xa8, "LOG "),
    (0xa9, "INT "),
    (0xaa, "ABS "),
    (0xab, "SGN "),
    (0xac, "DEG "),
    (0xad, "DMS "),
    (0xb0, "RUN "),
    (0xb1, "NEW "),
    (0xb2, "MEM "),
    (0xb3, "LIST "),
    (0xb4, "CONT "),
    (0xb5, "DEBUG "),
    (0xb6, "CSAVE "),
    (0xb7, "CLOAD "),
    (0xc0, "GRAD "),
    (0xc1, "PRINT "),
    (0xc2, "INPUT "),
    (0xc3, "RADIAN "),
    (0xc4, "DEGREE "),
    (0xc5, "CLEAR "),
    (0xd0, "IF "),
    (0xd1, "FOR "),
    (0xd2, "LET "),
    (0xd3, "REM "),
    (0xd4, "END "),
    (0xd5, "NEXT "),
    (0xd6, "STOP "),
    (0xd7, "GOTO "),
    (0xd8, "GOSUB "),
    (0xd9, "CHAIN "),
    (0xda, "PAUSE "),
    (0xdb, "BEEP "),
    (0xdc, "AREAD "),
    (0xde, "RETURN "),
    (0xdd, "USING "),
];

/// Reverse lookup: mnemonic text (already upper-case, including the
/// trailing space that keywords carry) to its byte value. Adds the
/// `SQRT ` convenience alias for the square-root glyph token, matching
/// what the calculator's own keyboard shortcut would tokenize to.
pub fn build_tokens_t2b() -> std::collections::HashMap<&'static str, u8> {
    let mut map: std::collections::HashMap<&'static str, u8> =
        TOKENS_B2T.iter().map(|&(b, tok)| (tok, b)).collect();
    map.insert("SQRT ", 0x1a);
    map
}

/// Forward lookup by byte value, for detokenizing program/filename bytes.
pub fn build_tokens_b2t() -> std::collections::HashMap<u8, &'static str> {
    TOKENS_B2T.iter().copied().collect()
}

/// Reserved-key entry tokens for the PC-1211 Reserved-Keys variant: each
/// entry in a reserved-key record starts with one of these two-character
/// mnemonics (e.g. `A:`), distinct from the ordinary BASIC token table.
pub const RESKEYS_B2T: &[(u8, &str)] = &[
    (0xe1, "A:"),
    (0xe2, "B:"),
    (0xe3, "C:"),
    (0xe4, "D:"),
    (0xe6, "F:"),
    (0xe7, "G:"),
    (0xe8, "H:"),
    (0xea, "J:"),
    (0xeb, "K:"),
    (0xec, "L:"),
    (0xed, "M:"),
    (0xee, "N:"),
    (0xf1, " :"),
    (0xf3, "S:"),
    (0xf4, "=:"),
    (0xf6, "V:"),
    (0xf8, "X:"),
    (0xfa, "Z:"),
];

pub fn build_reskeys_t2b() -> std::collections::HashMap<&'static str, u8> {
    RESKEYS_B2T.iter().map(|&(b, tok)| (tok, b)).collect()
}

pub fn build_reskeys_b2t() -> std::collections::HashMap<u8, &'static str> {
    RESKEYS_B2T.iter().copied().collect()
}
