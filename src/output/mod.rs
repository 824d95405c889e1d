//! Output processing and sanitization.
//!
//! This module turns the raw PTY byte stream into clean text lines:
//! - Line splitting across arbitrary chunk boundaries
//! - ANSI escape code and carriage return stripping
//!
//! # Example
//!
//! ```
//! use shell_queue::output::{LineSplitter, OutputSanitizer};
//!
//! let clean = OutputSanitizer::clean_line(b"\x1b[31mRed text\x1b[0m\r");
//! assert_eq!(clean, "Red text");
//!
//! let mut splitter = LineSplitter::new();
//! let lines = splitter.push(b"first\r\nsec");
//! assert_eq!(lines, vec!["first"]);
//! ```

mod lines;
mod sanitizer;

pub use lines::LineSplitter;
pub use sanitizer::OutputSanitizer;
