use crate::selection::FileListing;
use std::io::{self, Write};

/// The display regions a dispatch writes into.
pub trait Page {
    /// Replaces the file-names region.
    fn show_file_names(&mut self, listing: &FileListing);

    /// Writes the answer as plain text into the output region.
    fn show_answer(&mut self, answer: &str);

    /// A blocking, user-facing message.
    fn alert(&mut self, message: &str);
}

/// Renders regions to a terminal: file names and answers on `out`, alerts on
/// `err`.
pub struct TerminalPage<O: Write, E: Write> {
    out: O,
    err: E,
}

impl TerminalPage<io::Stdout, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> TerminalPage<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

impl<O: Write, E: Write> Page for TerminalPage<O, E> {
    fn show_file_names(&mut self, listing: &FileListing) {
        let mut text = format!("{}\n", FileListing::HEADING);
        for name in &listing.names {
            text.push_str(&format!("  {}\n", name));
        }
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            log::warn!("Failed to render file names: {}", e);
        }
    }

    fn show_answer(&mut self, answer: &str) {
        if let Err(e) = writeln!(self.out, "{}", answer).and_then(|_| self.out.flush()) {
            log::warn!("Failed to render answer: {}", e);
        }
    }

    fn alert(&mut self, message: &str) {
        if let Err(e) = writeln!(self.err, "{}", message).and_then(|_| self.err.flush()) {
            log::warn!("Failed to show alert: {}", e);
        }
    }
}
