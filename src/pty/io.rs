//! Blocking PTY I/O loops.
//!
//! PTY handles only offer blocking reads and writes. Each session runs one
//! reader loop and one writer loop on dedicated threads; the writer is fed
//! through a channel so that nothing holding session state ever blocks on
//! the shell's input.

use std::io::{Read, Write};

use tokio::sync::mpsc;
use tracing::{debug, error, trace};

/// Default buffer size for reading PTY output.
pub const READ_BUFFER_SIZE: usize = 4096;

/// Why a reader loop stopped.
#[derive(Debug)]
pub enum ReadEnd {
    /// The stream reported end of file.
    Eof,
    /// The PTY was closed underneath the reader (EIO / broken pipe).
    Closed,
    /// The sink asked to stop.
    Stopped,
    /// Any other I/O error.
    Failed(std::io::Error),
}

/// Blocking reader for PTY output.
pub struct PtyReader<R: Read> {
    reader: R,
    buffer_size: usize,
}

impl<R: Read> PtyReader<R> {
    /// Create a new PtyReader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer_size: READ_BUFFER_SIZE,
        }
    }

    #[cfg(test)]
    fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Read until the stream ends, handing every chunk to `sink`.
    ///
    /// The sink returns `false` to stop early.
    pub fn run<F>(mut self, mut sink: F) -> ReadEnd
    where
        F: FnMut(&[u8]) -> bool,
    {
        let mut buf = vec![0u8; self.buffer_size];

        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => {
                    debug!("PTY reader: EOF");
                    return ReadEnd::Eof;
                }
                Ok(n) => {
                    trace!("PTY reader: read {} bytes", n);
                    if !sink(&buf[..n]) {
                        debug!("PTY reader: stopped by sink");
                        return ReadEnd::Stopped;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    // EIO on Unix means the PTY slave was closed
                    #[cfg(unix)]
                    if e.raw_os_error() == Some(libc::EIO) {
                        debug!("PTY reader: PTY closed (EIO)");
                        return ReadEnd::Closed;
                    }

                    if e.kind() == std::io::ErrorKind::BrokenPipe {
                        debug!("PTY reader: broken pipe");
                        return ReadEnd::Closed;
                    }

                    error!("PTY reader error: {}", e);
                    return ReadEnd::Failed(e);
                }
            }
        }
    }
}

/// Blocking writer for PTY input.
///
/// Receives buffers through a channel and writes each one fully.
pub struct PtyWriter<W: Write> {
    writer: W,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl<W: Write> PtyWriter<W> {
    /// Create a new PtyWriter.
    pub fn new(writer: W, rx: mpsc::UnboundedReceiver<Vec<u8>>) -> Self {
        Self { writer, rx }
    }

    /// Write buffers until every sender is dropped or a write fails.
    ///
    /// Must not be called from inside an async context.
    pub fn run(mut self) {
        while let Some(data) = self.rx.blocking_recv() {
            trace!("PTY writer: writing {} bytes", data.len());
            if let Err(e) = self.writer.write_all(&data) {
                if e.kind() == std::io::ErrorKind::BrokenPipe {
                    debug!("PTY writer: broken pipe");
                } else {
                    error!("PTY writer error: {}", e);
                }
                return;
            }
            if let Err(e) = self.writer.flush() {
                error!("PTY writer flush error: {}", e);
                return;
            }
        }
        debug!("PTY writer: channel closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct FailingReader(std::io::ErrorKind);

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(self.0, "boom"))
        }
    }

    #[test]
    fn test_reader_basic() {
        let data = b"Hello, World!\nTest line 2\n";
        let mut received = Vec::new();

        let end = PtyReader::new(Cursor::new(data.to_vec()))
            .with_buffer_size(5)
            .run(|chunk| {
                assert!(chunk.len() <= 5);
                received.extend_from_slice(chunk);
                true
            });

        assert!(matches!(end, ReadEnd::Eof));
        assert_eq!(received, data);
    }

    #[test]
    fn test_reader_empty() {
        let end = PtyReader::new(Cursor::new(Vec::new())).run(|_| panic!("no data expected"));
        assert!(matches!(end, ReadEnd::Eof));
    }

    #[test]
    fn test_reader_stopped_by_sink() {
        let mut calls = 0;
        let end = PtyReader::new(Cursor::new(vec![b'x'; 64]))
            .with_buffer_size(8)
            .run(|_| {
                calls += 1;
                false
            });
        assert!(matches!(end, ReadEnd::Stopped));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_reader_broken_pipe_is_close() {
        let end = PtyReader::new(FailingReader(std::io::ErrorKind::BrokenPipe)).run(|_| true);
        assert!(matches!(end, ReadEnd::Closed));
    }

    #[test]
    fn test_reader_other_error() {
        let end = PtyReader::new(FailingReader(std::io::ErrorKind::Other)).run(|_| true);
        assert!(matches!(end, ReadEnd::Failed(_)));
    }

    #[test]
    fn test_writer_basic() {
        let buf = SharedBuf::default();
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = PtyWriter::new(buf.clone(), rx);

        tx.send(b"Hello".to_vec()).unwrap();
        tx.send(b", World!".to_vec()).unwrap();
        drop(tx);

        let handle = std::thread::spawn(move || writer.run());
        handle.join().unwrap();

        assert_eq!(buf.0.lock().unwrap().as_slice(), b"Hello, World!");
    }
}
