use std::io::Write;

/// The session's output stream.
///
/// Raw mode turns off output post-processing, so a bare `\n` would not
/// return the cursor to column 0; every line is written with `\r\n`.
pub struct Output<W: Write> {
    inner: W,
}

impl<W: Write> Output<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Writes `text` line by line and flushes. Write failures are logged and
    /// swallowed: losing output is not a reason to stop the clock.
    pub fn say(&mut self, text: &str) {
        let result = text
            .lines()
            .try_for_each(|line| write!(self.inner, "{line}\r\n"))
            .and_then(|()| self.inner.flush());
        if let Err(e) = result {
            log::warn!("Failed to write to terminal: {e}");
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
