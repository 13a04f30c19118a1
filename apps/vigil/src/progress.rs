//! Progress side-channel for scan runs.
//!
//! Events carry no meaning for the result of a run; sinks only observe.

use std::io::Write;
use std::sync::Mutex;

/// Default number of files between two progress markers.
pub const DEFAULT_BATCH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Emitted when file `index` (0-based) starts and `index % batch == 0`.
    Batch { index: usize, total: usize },
    /// Emitted once after the last file.
    Finished { processed: usize },
}

pub trait ProgressSink: Send + Sync {
    fn event(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn event(&self, event: ProgressEvent) {
        self(event)
    }
}

pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn event(&self, _: ProgressEvent) {}
}

/// Terse terminal marker line: `120 [0.. 50.. 100.. ]`.
pub struct StdoutProgress<W: Write + Send = std::io::Stdout> {
    out: Mutex<W>,
}

impl StdoutProgress {
    pub fn new() -> Self {
        Self::with_writer(std::io::stdout())
    }
}

impl Default for StdoutProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> StdoutProgress<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write + Send> ProgressSink for StdoutProgress<W> {
    fn event(&self, event: ProgressEvent) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        // Progress output is best effort; a closed stdout must not fail the scan.
        let _ = match event {
            ProgressEvent::Batch { index: 0, total } => write!(out, "{} [0.. ", total),
            ProgressEvent::Batch { index, .. } => write!(out, "{}.. ", index),
            ProgressEvent::Finished { .. } => writeln!(out, "]"),
        };
        let _ = out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdout_progress_format() {
        let sink = StdoutProgress::with_writer(Vec::new());
        sink.event(ProgressEvent::Batch { index: 0, total: 120 });
        sink.event(ProgressEvent::Batch { index: 50, total: 120 });
        sink.event(ProgressEvent::Batch { index: 100, total: 120 });
        sink.event(ProgressEvent::Finished { processed: 120 });
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "120 [0.. 50.. 100.. ]\n");
    }

    #[test]
    fn test_closure_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |e: ProgressEvent| seen.lock().unwrap().push(e);
        sink.event(ProgressEvent::Finished { processed: 0 });
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
