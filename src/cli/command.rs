use std::path::PathBuf;

use clap::{Parser as ClapParser, ValueEnum};

#[derive(Debug, ClapParser)]
#[command(
    name       = env!("CARGO_PKG_NAME"),
    version    = env!("CARGO_PKG_VERSION"),
    author     = env!("CARGO_PKG_AUTHORS"),
    about      = "Save and load vintage programmable-calculator cassette-tape programs",
    long_about = None,
)]
pub struct Cli {
    /// Which calculator's tape protocol to speak.
    #[arg(value_enum)]
    pub protocol: Protocol,

    /// Whether to record a tape to text/binary, or play text/binary to tape.
    #[arg(value_enum)]
    pub action: Action,

    /// Input path: audio to decode (save) or text/binary to encode (load).
    /// Defaults to the live audio device on save, or stdin on load.
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Output path: text/binary to write (save) or audio to produce (load).
    /// Defaults to stdout on save, or the live audio device on load.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Treat the text side of the transfer as raw bytes instead of a
    /// mnemonic/BCD listing.
    #[arg(short, long)]
    pub binary: bool,

    /// Enable diagnostic logging.
    #[arg(short, long)]
    pub debug: bool,

    /// Gain, in dB, passed to the audio adapter.
    #[arg(long, value_name = "FLOAT")]
    pub gain: Option<f32>,

    /// Bandpass filter spec (sox `sinc` syntax) passed to the audio adapter.
    #[arg(long, value_name = "SPEC")]
    pub sinc: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Protocol {
    /// CASIO FX-502P: 8E2 framing, no checksum, BCD program/memory codec.
    #[value(name = "fx502p")]
    Fx502p,
    /// Sharp PC-1211: checksummed framing, BASIC tokenizer.
    #[value(name = "pc1211")]
    Pc1211,
    /// Sharp PC-1211 Reserved-Keys variant: flat reserved-key entries.
    #[value(name = "pc1211-res")]
    Pc1211Res,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    /// Record a cassette-tape image and transcode it to text or bytes.
    Save,
    /// Transcode text or bytes and play them out as a cassette-tape image.
    Load,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_save_invocation() {
        let cli = Cli::parse_from(["cstore", "fx502p", "save"]);
        assert_eq!(cli.protocol, Protocol::Fx502p);
        assert_eq!(cli.action, Action::Save);
        assert!(cli.input.is_none());
        assert!(!cli.binary);
    }

    #[test]
    fn parses_pc1211_res_protocol_name() {
        let cli = Cli::parse_from(["cstore", "pc1211-res", "load", "-b", "-i", "tape.bin"]);
        assert_eq!(cli.protocol, Protocol::Pc1211Res);
        assert_eq!(cli.action, Action::Load);
        assert!(cli.binary);
        assert_eq!(cli.input.as_deref(), Some(std::path::Path::new("tape.bin")));
    }

    #[test]
    fn parses_gain_and_sinc_filters() {
        let cli = Cli::parse_from([
            "cstore", "pc1211", "save", "--gain", "-3.0", "--sinc", "300-3000",
        ]);
        assert_eq!(cli.gain, Some(-3.0));
        assert_eq!(cli.sinc.as_deref(), Some("300-3000"));
    }
}
