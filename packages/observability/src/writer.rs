//! Append-only JSONL file writer.

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// Shared handle to an append-mode log file.
///
/// Each write is flushed immediately so concurrent processes appending to
/// the same file see whole lines.
#[derive(Clone)]
pub struct FileLogWriter {
    inner: Arc<Mutex<BufWriter<File>>>,
}

impl FileLogWriter {
    /// Open (or create) the file, creating parent directories as needed.
    pub fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(BufWriter::with_capacity(8192, file))),
        })
    }
}

impl Write for FileLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock();
        let written = guard.write(buf)?;
        guard.flush()?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

/// [`MakeWriter`] handing out clones of one [`FileLogWriter`].
#[derive(Clone)]
pub struct WriterFactory {
    writer: FileLogWriter,
}

impl WriterFactory {
    pub fn new(writer: FileLogWriter) -> Self {
        Self { writer }
    }
}

impl<'a> MakeWriter<'a> for WriterFactory {
    type Writer = FileLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer.clone()
    }
}
