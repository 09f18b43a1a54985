use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Latest progress reported by an encoder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressRecord {
    /// Last reported completed-frame count
    pub frame: u64,
    /// Encoder reported `progress=end`
    pub finished: bool,
}

impl ProgressRecord {
    /// Apply one line of `-progress` output. Lines that are not a well-formed
    /// `frame=` or `progress=end` marker leave the record untouched.
    pub fn apply_line(&mut self, line: &str) -> bool {
        let line = line.trim();

        if let Some(value) = line.strip_prefix("frame=") {
            if let Ok(frame) = value.trim().parse::<u64>() {
                self.frame = frame;
                return true;
            }
        } else if line.starts_with("progress=end") {
            self.finished = true;
            return true;
        }

        false
    }
}

/// Create a progress channel. The sink is the only writer; readers take snapshots.
pub fn channel() -> (ProgressSink, ProgressReader) {
    let (tx, rx) = watch::channel(ProgressRecord::default());
    (ProgressSink { tx }, ProgressReader { rx })
}

/// Writing half of the progress channel, handed to the encoder
#[derive(Debug)]
pub struct ProgressSink {
    tx: watch::Sender<ProgressRecord>,
}

impl ProgressSink {
    /// Parse one line of encoder output into the shared record
    pub fn feed_line(&self, line: &str) {
        self.tx.send_if_modified(|record| record.apply_line(line));
    }

    /// Mark the current encode as finished
    pub fn finish(&self) {
        self.tx.send_if_modified(|record| {
            if record.finished {
                false
            } else {
                record.finished = true;
                true
            }
        });
    }

    /// Clear the record before the next encode reuses the channel
    pub fn reset(&self) {
        self.tx.send_replace(ProgressRecord::default());
    }
}

/// Reading half of the progress channel
#[derive(Debug, Clone)]
pub struct ProgressReader {
    rx: watch::Receiver<ProgressRecord>,
}

impl ProgressReader {
    pub fn snapshot(&self) -> ProgressRecord {
        *self.rx.borrow()
    }
}

/// Where a progress monitor draws its output.
pub trait ProgressView: Send + Sync {
    /// Redraw the in-progress line
    fn update(&self, label: &str, bar: &str);

    /// Replace the in-progress line with a completion mark
    fn complete(&self, label: &str);

    /// The encode for `label` failed and its monitor was stopped
    fn interrupted(&self, _label: &str) {}
}

/// `#` bar proportional to `frame / total`, never longer than `len`
pub fn render_bar(frame: u64, total: u64, len: usize) -> String {
    if total == 0 {
        return String::new();
    }

    let filled = (len as f64 * frame as f64 / total as f64).round() as usize;
    "#".repeat(filled.min(len))
}

/// Polls the progress channel on a fixed interval until the encoder finishes
pub struct ProgressMonitor {
    reader: ProgressReader,
    label: String,
    total_frames: u64,
    bar_len: usize,
    interval: Duration,
    view: Arc<dyn ProgressView>,
}

impl ProgressMonitor {
    pub fn new(
        reader: ProgressReader,
        label: impl Into<String>,
        total_frames: u64,
        bar_len: usize,
        interval: Duration,
        view: Arc<dyn ProgressView>,
    ) -> Self {
        Self {
            reader,
            label: label.into(),
            total_frames,
            bar_len,
            interval,
            view,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Returns only once the end marker has been observed
    pub async fn run(self) {
        loop {
            let record = self.reader.snapshot();

            if record.finished {
                debug!(label = %self.label, frame = record.frame, "progress complete");
                self.view.complete(&self.label);
                return;
            }

            let bar = render_bar(record.frame, self.total_frames, self.bar_len);
            self.view.update(&self.label, &bar);

            tokio::time::sleep(self.interval).await;
        }
    }
}
