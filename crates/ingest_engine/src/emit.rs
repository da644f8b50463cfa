use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use ingest_core::Record;

use crate::EmitError;

/// Appends records to a sink as JSON lines, one write and flush per record,
/// so everything emitted before a crash is already on the sink.
///
/// Writers from concurrent source runs are serialized by the inner lock.
pub struct RecordEmitter<W: Write + Send> {
    sink: Mutex<W>,
    emitted: AtomicUsize,
}

impl<W: Write + Send> RecordEmitter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink: Mutex::new(sink),
            emitted: AtomicUsize::new(0),
        }
    }

    pub fn emit(&self, record: &Record) -> Result<(), EmitError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        sink.write_all(line.as_bytes())?;
        sink.flush()?;
        self.emitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Records written so far.
    pub fn emitted(&self) -> usize {
        self.emitted.load(Ordering::Relaxed)
    }

    pub fn into_inner(self) -> W {
        self.sink.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
