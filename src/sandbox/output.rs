//! Sandbox output routing
//!
//! The runtime hands us the combined output stream as tagged frames. Frames
//! are routed to their logical channel and decoded as UTF-8 per channel, so
//! a character split across two frames of the same channel survives intact.

use serde::{Deserialize, Serialize};

/// Logical channel an output frame belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputChannel {
    /// Program stdout
    Stdout,
    /// Program stderr
    Stderr,
    /// Merged terminal output of a TTY sandbox
    Console,
}

/// One frame of sandbox output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub channel: OutputChannel,
    pub data: Vec<u8>,
}

impl OutputChunk {
    pub fn new(channel: OutputChannel, data: impl Into<Vec<u8>>) -> Self {
        OutputChunk {
            channel,
            data: data.into(),
        }
    }

    pub fn stdout(data: impl Into<Vec<u8>>) -> Self {
        Self::new(OutputChannel::Stdout, data)
    }

    pub fn stderr(data: impl Into<Vec<u8>>) -> Self {
        Self::new(OutputChannel::Stderr, data)
    }

    pub fn console(data: impl Into<Vec<u8>>) -> Self {
        Self::new(OutputChannel::Console, data)
    }
}

/// Incremental UTF-8 decoder that carries incomplete trailing sequences
/// over to the next push. Invalid bytes become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `bytes` (plus any carried tail) as is complete
    pub fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            // Incomplete sequence at the end; wait for more bytes
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush whatever is left, replacing an unfinished sequence
    pub fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}

/// Collects a batch execution's stdout and stderr
#[derive(Debug, Default)]
pub struct OutputAccumulator {
    stdout: String,
    stderr: String,
    stdout_decoder: Utf8Decoder,
    stderr_decoder: Utf8Decoder,
}

impl OutputAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a frame to its channel buffer. Console frames count as stdout.
    pub fn push(&mut self, chunk: &OutputChunk) {
        match chunk.channel {
            OutputChannel::Stdout | OutputChannel::Console => {
                let text = self.stdout_decoder.push(&chunk.data);
                self.stdout.push_str(&text);
            }
            OutputChannel::Stderr => {
                let text = self.stderr_decoder.push(&chunk.data);
                self.stderr.push_str(&text);
            }
        }
    }

    /// Output decoded so far (excluding carried partial characters)
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// Finalize into `(stdout, stderr)`
    pub fn finish(mut self) -> (String, String) {
        let tail = self.stdout_decoder.finish();
        self.stdout.push_str(&tail);
        let tail = self.stderr_decoder.finish();
        self.stderr.push_str(&tail);
        (self.stdout, self.stderr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_carries_split_characters() {
        let mut decoder = Utf8Decoder::new();
        let bytes = "héllo→".as_bytes();

        // Split inside 'é' (2 bytes) and inside '→' (3 bytes)
        let mut out = decoder.push(&bytes[..2]);
        out += &decoder.push(&bytes[2..7]);
        out += &decoder.push(&bytes[7..]);
        out += &decoder.finish();

        assert_eq!(out, "héllo→");
    }

    #[test]
    fn test_decoder_replaces_invalid_bytes() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.push(&[b'a', 0xff, b'b']), "a\u{FFFD}b");
        assert_eq!(decoder.push(&[0xe2, 0x82]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
    }

    #[test]
    fn test_interleaved_channels_keep_their_order() {
        let mut acc = OutputAccumulator::new();
        let frames = [
            OutputChunk::stdout("out 1\n"),
            OutputChunk::stderr("err 1\n"),
            OutputChunk::stdout("out 2\n"),
            OutputChunk::stderr("err 2\n"),
            OutputChunk::stdout("out 3\n"),
        ];
        for frame in &frames {
            acc.push(frame);
        }

        let (stdout, stderr) = acc.finish();
        assert_eq!(stdout, "out 1\nout 2\nout 3\n");
        assert_eq!(stderr, "err 1\nerr 2\n");
    }

    #[test]
    fn test_split_character_does_not_leak_across_channels() {
        let euro = "€".as_bytes();
        let mut acc = OutputAccumulator::new();
        acc.push(&OutputChunk::stdout(&euro[..1]));
        acc.push(&OutputChunk::stderr("boom"));
        acc.push(&OutputChunk::stdout(&euro[1..]));

        assert_eq!(acc.stdout(), "€");
        assert_eq!(acc.stderr(), "boom");
    }

    #[test]
    fn test_console_frames_count_as_stdout() {
        let mut acc = OutputAccumulator::new();
        acc.push(&OutputChunk::console("$ "));
        let (stdout, stderr) = acc.finish();
        assert_eq!(stdout, "$ ");
        assert!(stderr.is_empty());
    }
}
