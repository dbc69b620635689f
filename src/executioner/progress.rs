//! Streaming progress indicator.
//!
//! Renders a single redrawn line to whatever sink the caller attached. With
//! no sink the indicator still tracks counts but draws nothing, so callers
//! without an attached output observe identical control flow.

use std::io::{self, Write};

const BAR_WIDTH: usize = 28;

/// Optional output sink for progress and status lines.
pub struct OutputSink<'a> {
    out: Option<&'a mut dyn Write>,
}

impl<'a> OutputSink<'a> {
    pub fn new(out: Option<&'a mut dyn Write>) -> Self {
        Self { out }
    }

    pub fn writeln(&mut self, line: &str) -> io::Result<()> {
        if let Some(out) = self.out.as_deref_mut() {
            writeln!(out, "{line}")?;
            out.flush()?;
        }
        Ok(())
    }

    fn write_raw(&mut self, chunk: &str) -> io::Result<()> {
        if let Some(out) = self.out.as_deref_mut() {
            write!(out, "{chunk}")?;
            out.flush()?;
        }
        Ok(())
    }
}

/// A bounded progress bar, sized once at the start of a run.
pub struct Progress {
    total: u64,
    current: u64,
    finished: bool,
}

impl Progress {
    pub fn start(total: u64) -> Self {
        Self {
            total: total.max(1),
            current: 0,
            finished: false,
        }
    }

    pub fn advance(&mut self, n: u64, sink: &mut OutputSink<'_>) -> io::Result<()> {
        self.current = (self.current + n).min(self.total);
        self.draw(sink)
    }

    /// Complete the bar. Idempotent; called on every exit path of a run.
    pub fn finish(&mut self, sink: &mut OutputSink<'_>) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.current = self.total;
        self.draw(sink)?;
        sink.write_raw("\n\n")
    }

    fn draw(&self, sink: &mut OutputSink<'_>) -> io::Result<()> {
        let pct = self.current * 100 / self.total;
        let filled = (self.current as usize * BAR_WIDTH) / self.total as usize;
        let mut bar = String::with_capacity(BAR_WIDTH);
        for i in 0..BAR_WIDTH {
            bar.push(if i < filled {
                '='
            } else if i == filled {
                '>'
            } else {
                ' '
            });
        }
        sink.write_raw(&format!(
            "\r  {}/{} [{}] {:>3}%",
            self.current, self.total, bar, pct
        ))
    }
}
