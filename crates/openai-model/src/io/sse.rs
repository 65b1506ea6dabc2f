use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    Chunks(ChunksError),
    InvalidPayload,
}

/// Reads the `data` payloads of server-sent events from a chunk stream.
///
/// Only the subset of the format that chat completion endpoints use is
/// supported: comment lines are skipped, `data` lines of one event are
/// joined with `\n`, and every other field is ignored. Events without any
/// `data` line are dropped.
pub struct Sse {
    buf: Vec<u8>,
    chunks: Chunks,
    exhausted: bool,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: Vec::new(),
            chunks,
            exhausted: false,
        }
    }

    /// Returns the payload of the next event, or `None` when the stream has
    /// ended. A trailing event without its blank line is discarded.
    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            while let Some(block) = self.take_block() {
                if let Some(data) = parse_block(&block)? {
                    return Ok(Some(data));
                }
            }

            if self.exhausted {
                return Ok(None);
            }
            match self.chunks.next_chunk().await.map_err(Error::Chunks)? {
                Some(bytes) => self.push_normalized(&bytes),
                None => self.exhausted = true,
            }
        }
    }

    fn push_normalized(&mut self, bytes: &[u8]) {
        self.buf.extend(bytes.iter().copied().filter(|b| *b != b'\r'));
    }

    fn take_block(&mut self) -> Option<Vec<u8>> {
        let end = self.buf.windows(2).position(|w| w == b"\n\n")?;
        let block = self.buf[..end].to_vec();
        self.buf.drain(..end + 2);
        Some(block)
    }
}

const KNOWN_FIELDS: [&str; 4] = ["data", "event", "id", "retry"];

fn parse_block(block: &[u8]) -> Result<Option<String>, Error> {
    let block = str::from_utf8(block).map_err(|_| Error::InvalidPayload)?;
    let mut data: Option<String> = None;
    for line in block.split('\n') {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => {
                (field, value.strip_prefix(' ').unwrap_or(value))
            }
            None => (line, ""),
        };
        if !KNOWN_FIELDS.contains(&field) {
            return Err(Error::InvalidPayload);
        }
        if field != "data" {
            trace!("ignoring sse field: {field}");
            continue;
        }
        match &mut data {
            Some(data) => {
                data.push('\n');
                data.push_str(value);
            }
            None => data = Some(value.to_owned()),
        }
    }
    Ok(data)
}
