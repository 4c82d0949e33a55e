//! Terminal progress for a generation run.

use crate::cli::output::{progress_bar, OutputMode, Styled};
use statemap::{PayloadOrigin, ProgressSink, RegionId};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

const BAR_WIDTH: usize = 24;

/// Draws a single-line progress bar on stderr, or one line per region with
/// `--verbose`. Silent in quiet and JSON modes.
pub struct StderrProgress {
    mode: OutputMode,
    styled: Styled,
    bar_drawn: AtomicBool,
}

impl StderrProgress {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            styled: Styled::new(),
            bar_drawn: AtomicBool::new(false),
        }
    }

    fn end_bar(&self) {
        if self.bar_drawn.swap(false, Ordering::SeqCst) {
            eprintln!();
        }
    }
}

impl ProgressSink for StderrProgress {
    fn fetch_started(&self, total: usize) {
        if self.mode.chatty() {
            eprintln!("  Fetching {total} regions...");
        }
    }

    fn region_fetched(&self, id: &RegionId, origin: PayloadOrigin, done: usize, total: usize) {
        if !self.mode.chatty() {
            return;
        }
        if self.mode.verbose {
            let from = match origin {
                PayloadOrigin::Cache => self.styled.dim("cache"),
                PayloadOrigin::Network => self.styled.green("network"),
            };
            eprintln!("    {done:>4}/{total} {id:<16} {from}");
            return;
        }
        eprint!("\r  {} {done}/{total}", progress_bar(done, total, BAR_WIDTH));
        let _ = std::io::stderr().flush();
        self.bar_drawn.store(true, Ordering::SeqCst);
    }

    fn composing(&self, records: usize) {
        self.end_bar();
        if self.mode.chatty() {
            eprintln!("  Composing topology from {records} regions...");
        }
    }

    fn written(&self, path: &Path, _bytes: u64) {
        if self.mode.chatty() {
            eprintln!("  {} Wrote {}", self.styled.ok_sym(), path.display());
        }
    }

    fn finish(&self) {
        self.end_bar();
    }
}
