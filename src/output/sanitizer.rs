//! Escape sequence stripping for shell output lines.

use vte::{Params, Parser, Perform};

/// Turns raw terminal lines into plain text.
pub struct OutputSanitizer;

impl OutputSanitizer {
    /// Clean one raw line (without its `\n`).
    ///
    /// Control sequences and carriage returns are dropped; tabs are kept.
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn clean_line(raw: &[u8]) -> String {
        let mut text = LineText::default();
        Parser::new().advance(&mut text, raw);
        text.0
    }
}

/// Collects the printable characters of a line.
#[derive(Default)]
struct LineText(String);

impl Perform for LineText {
    fn print(&mut self, c: char) {
        self.0.push(c);
    }

    fn execute(&mut self, byte: u8) {
        if byte == b'\t' {
            self.0.push('\t');
        }
    }

    fn hook(&mut self, _params: &Params, _intermediates: &[u8], _ignore: bool, _action: char) {}

    fn put(&mut self, _byte: u8) {}

    fn unhook(&mut self) {}

    // Window titles set by shells with a fancy PS1
    fn osc_dispatch(&mut self, _params: &[&[u8]], _bell_terminated: bool) {}

    // Cursor movement, colors, bracketed paste toggles
    fn csi_dispatch(
        &mut self,
        _params: &Params,
        _intermediates: &[u8],
        _ignore: bool,
        _action: char,
    ) {
    }

    fn esc_dispatch(&mut self, _intermediates: &[u8], _ignore: bool, _byte: u8) {}
}
