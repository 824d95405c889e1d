//! Splitting the raw output byte stream into lines.

use super::OutputSanitizer;

/// Accumulates raw chunks and yields complete, cleaned lines.
///
/// Chunks from the PTY can split a line (or a UTF-8 sequence) anywhere, so
/// bytes are buffered until a `\n` arrives.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    /// Create an empty splitter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\n' {
                lines.push(OutputSanitizer::clean_line(&self.pending));
                self.pending.clear();
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }

    /// Return the unterminated tail, if any. Used at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = OutputSanitizer::clean_line(&self.pending);
        self.pending.clear();
        Some(line)
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_chunk() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.push(b"one\ntwo\n");
        assert_eq!(lines, vec!["one", "two"]);
        assert_eq!(splitter.pending_len(), 0);
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.push(b"hel").is_empty());
        assert_eq!(splitter.pending_len(), 3);
        assert_eq!(splitter.push(b"lo\r\nwor"), vec!["hello"]);
        assert_eq!(splitter.push(b"ld\n"), vec!["world"]);
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        let text = "héllo\n".as_bytes();
        let mut splitter = LineSplitter::new();
        assert!(splitter.push(&text[..2]).is_empty());
        assert_eq!(splitter.push(&text[2..]), vec!["héllo"]);
    }

    #[test]
    fn test_empty_lines_kept() {
        let mut splitter = LineSplitter::new();
        assert_eq!(splitter.push(b"\n\nx\n"), vec!["", "", "x"]);
    }

    #[test]
    fn test_finish_returns_tail() {
        let mut splitter = LineSplitter::new();
        splitter.push(b"done\npartial");
        assert_eq!(splitter.finish(), Some("partial".to_string()));
        assert_eq!(splitter.finish(), None);
    }
}
