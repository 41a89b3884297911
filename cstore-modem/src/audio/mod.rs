//! Audio I/O adapter: spawns an external `sox`/`rec`/`play` process and
//! presents its stdin/stdout as a byte-granular PCM channel.
//!
//! PCM format is fixed for every session: 48 kHz, 8-bit signed, mono,
//! headerless. The adapter owns the child process exclusively; it is
//! reaped on [`AudioSession::close`] or on `Drop` if `close` was skipped.

use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};

use crate::config::SAMPLE_RATE;
use crate::utils::errors::AudioError;

/// Where PCM samples come from or go to.
pub enum Target<'a> {
    /// A file path, or `-` for a pipe already wired up by the caller.
    File(&'a str),
    /// The live audio device (microphone for read, speakers for write).
    Live,
}

/// Direction a session is opened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// Optional filters applied by the external audio process.
#[derive(Debug, Clone, Default)]
pub struct AudioFilters {
    pub gain: Option<f32>,
    pub sinc: Option<String>,
}

fn push_filters(args: &mut Vec<String>, filters: &AudioFilters) {
    if let Some(gain) = filters.gain {
        args.push("gain".to_string());
        args.push(gain.to_string());
    }
    if let Some(sinc) = &filters.sinc {
        args.push("sinc".to_string());
        args.push(sinc.clone());
    }
}

fn pcm_args() -> Vec<String> {
    vec![
        "-q".to_string(),
        "-b8".to_string(),
        "-c1".to_string(),
        format!("-r{SAMPLE_RATE}"),
        "-e".to_string(),
        "signed".to_string(),
        "-t".to_string(),
        "raw".to_string(),
    ]
}

fn build_command(target: &Target, direction: Direction, filters: &AudioFilters) -> Vec<String> {
    let mut args;
    let program = match (target, direction) {
        (Target::File(path), Direction::Read) => {
            args = vec![path.to_string()];
            args.extend(pcm_args());
            args.push("-".to_string());
            push_filters(&mut args, filters);
            "sox"
        }
        (Target::Live, Direction::Read) => {
            args = pcm_args();
            args.push("-".to_string());
            push_filters(&mut args, filters);
            "rec"
        }
        (Target::Live, Direction::Write) => {
            args = pcm_args();
            args.push("-".to_string());
            push_filters(&mut args, filters);
            "play"
        }
        (Target::File(path), Direction::Write) => {
            args = pcm_args();
            args.push("-".to_string());
            args.push(path.to_string());
            push_filters(&mut args, filters);
            "sox"
        }
    };
    let mut full = vec![program.to_string()];
    full.extend(args);
    full
}

/// An open audio session: a child process with one pipe wired up for
/// reading or writing raw PCM.
pub struct AudioSession {
    child: Child,
    direction: Direction,
    argv: Vec<String>,
}

impl AudioSession {
    pub fn open(
        target: Target,
        direction: Direction,
        filters: &AudioFilters,
    ) -> Result<Self, AudioError> {
        let argv = build_command(&target, direction, filters);
        let program = &argv[0];
        let args = &argv[1..];

        let mut cmd = Command::new(program);
        cmd.args(args);
        match direction {
            Direction::Read => {
                cmd.stdout(Stdio::piped());
                cmd.stdin(Stdio::null());
            }
            Direction::Write => {
                cmd.stdin(Stdio::piped());
                cmd.stdout(Stdio::null());
            }
        }
        cmd.stderr(Stdio::null());

        let child = cmd
            .spawn()
            .map_err(|e| AudioError::Spawn(argv.clone(), e))?;

        Ok(Self {
            child,
            direction,
            argv,
        })
    }

    /// Reads the next PCM byte; returns `None` at sticky end-of-stream.
    pub fn read_byte(&mut self) -> Result<Option<u8>, AudioError> {
        debug_assert_eq!(self.direction, Direction::Read);
        let stdout = self
            .child
            .stdout
            .as_mut()
            .ok_or(AudioError::PipeClosed)?;
        let mut buf = [0u8; 1];
        match stdout.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) => Err(AudioError::Io(e)),
        }
    }

    /// Writes a chunk of PCM bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), AudioError> {
        debug_assert_eq!(self.direction, Direction::Write);
        let stdin = self.child.stdin.as_mut().ok_or(AudioError::PipeClosed)?;
        stdin.write_all(bytes).map_err(AudioError::Io)
    }

    /// Closes the session. On write, flushes and waits for the child to
    /// drain its own buffers and exit; on read, kills the child outright
    /// since a reader that stops early has no reason to let it keep
    /// producing into a closed pipe.
    pub fn close(mut self) -> Result<(), AudioError> {
        match self.direction {
            Direction::Write => {
                if let Some(mut stdin) = self.child.stdin.take() {
                    stdin.flush().map_err(AudioError::Io)?;
                }
                self.child.wait().map_err(AudioError::Io)?;
            }
            Direction::Read => {
                let _ = self.child.kill();
                let _ = self.child.wait();
            }
        }
        Ok(())
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl Drop for AudioSession {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Adapts an [`AudioSession`] opened for reading into a plain byte
/// iterator, so it can sit upstream of the sign-change/halfwave/bit/byte
/// pipeline without those stages knowing about process plumbing.
pub struct AudioByteIter {
    session: AudioSession,
}

impl AudioByteIter {
    pub fn new(session: AudioSession) -> Self {
        Self { session }
    }
}

impl Iterator for AudioByteIter {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        self.session.read_byte().ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_sox_decode_command_with_filters() {
        let filters = AudioFilters {
            gain: Some(-3.0),
            sinc: Some("300-3000".to_string()),
        };
        let argv = build_command(&Target::File("in.wav"), Direction::Read, &filters);
        assert_eq!(argv[0], "sox");
        assert!(argv.contains(&"in.wav".to_string()));
        assert!(argv.contains(&"-r48000".to_string()));
        assert!(argv.windows(2).any(|w| w[0] == "gain" && w[1] == "-3"));
        assert!(argv
            .windows(2)
            .any(|w| w[0] == "sinc" && w[1] == "300-3000"));
    }

    #[test]
    fn builds_rec_command_for_live_read() {
        let argv = build_command(&Target::Live, Direction::Read, &AudioFilters::default());
        assert_eq!(argv[0], "rec");
    }

    #[test]
    fn builds_play_command_for_live_write() {
        let argv = build_command(&Target::Live, Direction::Write, &AudioFilters::default());
        assert_eq!(argv[0], "play");
    }

    #[test]
    fn builds_sox_encode_command_for_file_write() {
        let argv = build_command(
            &Target::File("out.wav"),
            Direction::Write,
            &AudioFilters::default(),
        );
        assert_eq!(argv[0], "sox");
        assert_eq!(argv.last(), Some(&"out.wav".to_string()));
    }
}
