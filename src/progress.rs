use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::scanner::SharedProgress;

const REFRESH: Duration = Duration::from_millis(100);

/// Whether to draw the bar. Verbose runs log every port to stderr, which
/// would tear a bar drawn on the same stream.
pub fn bar_enabled(no_progress: bool, verbose: bool) -> bool {
    !no_progress && !verbose
}

/// Progress bar driven by the scanner's shared counter.
///
/// The bar is refreshed from `SharedProgress::scanned_done` on a fixed tick
/// instead of being touched by the workers themselves.
pub struct ProgressReporter {
    bar: ProgressBar,
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

impl ProgressReporter {
    pub fn spawn(total: u64, shared: SharedProgress) -> Self {
        let bar = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("Scanning ports [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);

        let stop = CancellationToken::new();
        let handle = {
            let bar = bar.clone();
            let stop = stop.clone();
            tokio::spawn(async move {
                let mut tick = tokio::time::interval(REFRESH);
                loop {
                    tokio::select! {
                        _ = stop.cancelled() => break,
                        _ = tick.tick() => {
                            bar.set_position(shared.scanned());
                            bar.set_message(format!("{} open", shared.open()));
                        }
                    }
                }
            })
        };

        Self { bar, stop, handle }
    }

    /// Hidden reporter for runs where [`bar_enabled`] is false; `finish` is
/// still safe to call.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            stop: CancellationToken::new(),
            handle: tokio::spawn(async {}),
        }
    }

    /// Stop ticking and leave the bar at `done`.
    pub async fn finish(self, done: u64) {
        self.stop.cancel();
        let _ = self.handle.await;
        self.bar.set_position(done);
        self.bar.finish();
    }

    /// Stop ticking and remove the bar, for scans that never started.
    pub async fn clear(self) {
        self.stop.cancel();
        let _ = self.handle.await;
        self.bar.finish_and_clear();
    }
}
