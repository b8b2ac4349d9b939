//! Splits a child interpreter's stdout into program output and control frames.
//!
//! A control frame is one line starting with the ASCII record separator:
//! `\x1eINPUT <json string>\n` asks for a line of input with the given
//! prompt, `\x1eERROR <json string>\n` reports the program's fault.
//! Everything else is program output and is passed through as soon as it
//! forms complete UTF-8.

pub(crate) const MARKER: u8 = 0x1e;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Frame {
    Output(String),
    Input(String),
    Fault(String),
}

#[derive(Debug, Default)]
pub(crate) struct FrameDecoder {
    pending: Vec<u8>,
}

impl FrameDecoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Next complete frame, or `None` until more bytes arrive
    pub(crate) fn next_frame(&mut self) -> Option<Frame> {
        if self.pending.first() == Some(&MARKER) {
            let end = self.pending.iter().position(|&b| b == b'\n')?;
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            return Some(parse_control(&line[1..line.len() - 1]));
        }

        let upto = self
            .pending
            .iter()
            .position(|&b| b == MARKER)
            .unwrap_or(self.pending.len());

        let complete = match std::str::from_utf8(&self.pending[..upto]) {
            Ok(_) => upto,
            // A multi-byte character split across reads; wait for the rest.
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => upto,
        };
        if complete == 0 {
            return None;
        }

        let bytes: Vec<u8> = self.pending.drain(..complete).collect();
        Some(Frame::Output(String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Whatever is left once the stream has ended, as plain output
    pub(crate) fn finish(&mut self) -> Option<Frame> {
        if self.pending.is_empty() {
            return None;
        }
        let bytes = std::mem::take(&mut self.pending);
        Some(Frame::Output(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

fn parse_control(body: &[u8]) -> Frame {
    let text = String::from_utf8_lossy(body);
    let (kind, payload) = text.split_once(' ').unwrap_or((&*text, "\"\""));

    match (kind, serde_json::from_str::<String>(payload)) {
        ("INPUT", Ok(prompt)) => Frame::Input(prompt),
        ("ERROR", Ok(message)) => Frame::Fault(message),
        _ => {
            tracing::warn!(frame = %text, "unrecognised control frame, treating as output");
            Frame::Output(format!("{}\n", text))
        }
    }
}
