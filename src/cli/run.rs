use std::fs;
use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use cstore_modem::audio::{AudioFilters, Target};
use cstore_modem::driver;
use cstore_modem::models::fx502p::Fx502p;
use cstore_modem::models::pc1211::res::Pc1211Res;
use cstore_modem::models::pc1211::Pc1211;
use cstore_modem::models::Model;

use super::command::{Action, Cli, Protocol};

/// Builds the codec for the selected protocol; `-b/--binary` bypasses its
/// text transcoder entirely, so the model is chosen purely by wire format.
fn build_model(protocol: Protocol) -> Box<dyn Model> {
    match protocol {
        Protocol::Fx502p => Box::new(Fx502p::default()),
        Protocol::Pc1211 => Box::new(Pc1211::default()),
        Protocol::Pc1211Res => Box::new(Pc1211Res::default()),
    }
}

pub fn run(cli: &Cli) -> Result<()> {
    let filters = AudioFilters {
        gain: cli.gain,
        sinc: cli.sinc.clone(),
    };
    let model = build_model(cli.protocol);

    match cli.action {
        Action::Save => cmd_save(cli, &filters, model.as_ref()),
        Action::Load => cmd_load(cli, &filters, model.as_ref()),
    }
}

/// Tape-to-text: read a cassette image off the audio adapter, decode it
/// through the modem and the model's framing, and render it as text (or
/// raw bytes under `-b`) to the output path or stdout.
fn cmd_save(cli: &Cli, filters: &AudioFilters, model: &dyn Model) -> Result<()> {
    let input_path = cli.input.as_ref().map(path_str).transpose()?;
    let target = match input_path {
        Some(path) => Target::File(path),
        None => Target::Live,
    };

    let payload = driver::save(target, filters, model)
        .with_context(|| "decoding cassette audio")?;

    let bytes = if cli.binary {
        payload
    } else {
        model
            .bytes2text(&payload)
            .with_context(|| "transcoding decoded bytes to text")?
            .into_bytes()
    };

    write_output(cli.output.as_deref(), &bytes)
}

/// Text-to-tape: read text (or raw bytes under `-b`) from the input path or
/// stdin, encode it through the model's framing and the modem, and play it
/// out to the output path or the live audio device.
fn cmd_load(cli: &Cli, filters: &AudioFilters, model: &dyn Model) -> Result<()> {
    let input = read_input(cli.input.as_deref())?;

    let payload = if cli.binary {
        input
    } else {
        let text = String::from_utf8(input).with_context(|| "input is not valid UTF-8 text")?;
        model
            .text2bytes(&text)
            .with_context(|| "transcoding text to tape bytes")?
    };

    let output_path = cli.output.as_ref().map(path_str).transpose()?;
    let target = match output_path {
        Some(path) => Target::File(path),
        None => Target::Live,
    };

    driver::load(target, filters, model, &payload).with_context(|| "encoding cassette audio")
}

fn path_str(path: &std::path::PathBuf) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| anyhow::anyhow!("path {path:?} is not valid UTF-8"))
}

fn read_input(path: Option<&std::path::Path>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    match path {
        Some(path) => {
            fs::File::open(path)
                .with_context(|| format!("opening input {path:?}"))?
                .read_to_end(&mut buf)?;
        }
        None => {
            io::stdin().lock().read_to_end(&mut buf)?;
        }
    }
    Ok(buf)
}

fn write_output(path: Option<&std::path::Path>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, bytes).with_context(|| format!("writing output {path:?}"))?;
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(bytes)?;
            lock.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_model_picks_the_right_protocol_config() {
        let fx = build_model(Protocol::Fx502p);
        assert_eq!(fx.protocol_config().base_freq, 2400);

        let pc = build_model(Protocol::Pc1211);
        assert_eq!(pc.protocol_config().base_freq, 4000);

        let res = build_model(Protocol::Pc1211Res);
        assert_eq!(res.protocol_config().base_freq, 4000);
    }
}
