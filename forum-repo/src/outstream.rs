//! The opaque output sink every repository command writes its JSON
//! response through (spec 6's "commands return JSON through an opaque
//! sink" boundary). The edge process (HTTP, CLI, test harness) owns the
//! concrete `OutStream`; commands never see more than this trait.

use serde::Serialize;
use std::io::{self, Write};

pub trait OutStream {
    fn write_bytes(&mut self, bytes: &[u8]);
}

/// Default `OutStream`: serializes to JSON and writes to any `io::Write`.
/// Matches the shape of a single HTTP response body, but is equally at
/// home writing to a `Vec<u8>` in a test.
pub struct JsonOutStream<W: Write> {
    writer: W,
}

impl<W: Write> JsonOutStream<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_value<T: Serialize>(&mut self, value: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, value)?;
        Ok(())
    }
}

impl<W: Write> OutStream for JsonOutStream<W> {
    fn write_bytes(&mut self, bytes: &[u8]) {
        let _ = self.writer.write_all(bytes);
    }
}

/// Write a value to any `OutStream`, independent of the concrete writer
/// `JsonOutStream` wraps - the shape commands actually call.
pub fn write_json<S: OutStream, T: Serialize>(out: &mut S, value: &T) {
    match serde_json::to_vec(value) {
        Ok(bytes) => out.write_bytes(&bytes),
        Err(err) => {
            tracing::error!(%err, "failed to serialize response");
            out.write_bytes(b"{\"status\":\"InvalidParameters\"}");
        }
    }
}
