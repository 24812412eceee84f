use std::io::Write;
use std::sync::OnceLock;

use regex::Regex;
use tracing::info;

use crate::error::Result;

fn reasoning_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Thought for \d+s\n").expect("valid header regex"))
}

/// Writes only the not-yet-written tail of a growing reply.
///
/// The cursor counts `char`s and never moves backwards, so the concatenated
/// output of a monotonically growing reply equals its final text. A snapshot
/// shorter than the cursor writes nothing.
pub struct IncrementalPrinter<W: Write> {
    out: W,
    emitted: usize,
    text: String,
    saw_reasoning_header: bool,
}

impl<W: Write> IncrementalPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            emitted: 0,
            text: String::new(),
            saw_reasoning_header: false,
        }
    }

    /// Write whatever part of `content` lies beyond the cursor. Returns the
    /// number of chars written.
    pub fn emit(&mut self, content: &str) -> Result<usize> {
        if !self.saw_reasoning_header {
            if let Some(header) = reasoning_header_re().find(content) {
                self.saw_reasoning_header = true;
                info!("[{}]", header.as_str().trim_end());
            }
        }

        let len = content.chars().count();
        if len <= self.emitted {
            return Ok(0);
        }

        let tail: String = content.chars().skip(self.emitted).collect();
        self.out.write_all(tail.as_bytes())?;
        self.out.flush()?;

        let written = len - self.emitted;
        self.emitted = len;
        self.text.push_str(&tail);
        Ok(written)
    }

    /// Chars written so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Everything written so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn saw_reasoning_header(&self) -> bool {
        self.saw_reasoning_header
    }

    /// Terminate the output with a newline.
    pub fn finish(mut self) -> Result<W> {
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_only_the_new_suffix() {
        let mut printer = IncrementalPrinter::new(Vec::new());
        assert_eq!(printer.emit("Hel").unwrap(), 3);
        assert_eq!(printer.emit("Hello").unwrap(), 2);
        assert_eq!(printer.emit("Hello").unwrap(), 0);
        assert_eq!(printer.emitted(), 5);
        assert_eq!(printer.finish().unwrap(), b"Hello\n");
    }

    #[test]
    fn shorter_snapshot_writes_nothing() {
        let mut printer = IncrementalPrinter::new(Vec::new());
        printer.emit("a long answer").unwrap();
        assert_eq!(printer.emit("short").unwrap(), 0);
        assert_eq!(printer.text(), "a long answer");
    }

    #[test]
    fn multibyte_text_is_not_split() {
        let mut printer = IncrementalPrinter::new(Vec::new());
        printer.emit("héllo ").unwrap();
        printer.emit("héllo wörld ✓").unwrap();
        assert_eq!(printer.text(), "héllo wörld ✓");
    }

    #[test]
    fn reasoning_header_is_written_once() {
        let mut printer = IncrementalPrinter::new(Vec::new());
        printer.emit("Thought for 4s\n").unwrap();
        assert!(printer.saw_reasoning_header());
        printer.emit("Thought for 4s\nThe answer").unwrap();
        printer.emit("Thought for 4s\nThe answer is 4.").unwrap();
        let out = printer.finish().unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Thought for 4s\nThe answer is 4.\n"
        );
    }
}
