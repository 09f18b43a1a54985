use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use crate::config::Settings;
use crate::ffmpeg::{Encoder, MediaInspector};
use crate::progress::{self, ProgressMonitor, ProgressSink, ProgressView};
use crate::scanner::{self, Entry};
use crate::Result;

/// Everything the encoder needs for one file
#[derive(Debug, Clone, PartialEq)]
pub struct EncodingJob {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub codec: String,
    pub bitrate_bps: u64,
    pub overwrite: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    /// Output files in the order they were produced
    pub outputs: Vec<PathBuf>,
}

/// Runs a batch strictly one file at a time, pairing every encode with its own
/// progress monitor.
pub struct EncodingManager<'a, I: ?Sized, E: ?Sized> {
    settings: &'a Settings,
    inspector: &'a I,
    encoder: &'a E,
    view: Arc<dyn ProgressView>,
}

impl<'a, I, E> EncodingManager<'a, I, E>
where
    I: MediaInspector + ?Sized,
    E: Encoder + ?Sized,
{
    pub fn new(settings: &'a Settings, inspector: &'a I, encoder: &'a E, view: Arc<dyn ProgressView>) -> Self {
        Self {
            settings,
            inspector,
            encoder,
            view,
        }
    }

    /// Encode `items` in order into `output_dir`. The first failure aborts the
    /// rest of the batch; outputs already written are left in place.
    pub async fn run_batch(&self, items: &[Entry], bitrate_kbps: u32, output_dir: &Path) -> Result<BatchSummary> {
        scanner::create_output_directory(output_dir)?;

        let (sink, reader) = progress::channel();
        let total = items.len();
        let mut summary = BatchSummary::default();

        info!(files = total, bitrate_kbps, output = %output_dir.display(), "starting batch");

        for (index, item) in items.iter().enumerate() {
            let total_frames = self.inspector.probe(&item.path).await?.total_frames;
            let output_path = scanner::generate_output_path(&item.path, output_dir, &self.settings.output_suffix)?;

            let job = EncodingJob {
                input_path: item.path.clone(),
                output_path: output_path.clone(),
                codec: self.settings.codec.clone(),
                bitrate_bps: u64::from(bitrate_kbps) * 1000,
                overwrite: true,
            };

            let label = format!("{}/{} | {} |", index + 1, total, item.name);
            let monitor = ProgressMonitor::new(
                reader.clone(),
                label.clone(),
                total_frames,
                self.settings.progress_bar_len,
                self.settings.poll_interval,
                self.view.clone(),
            )
            .spawn();

            info!(input = %job.input_path.display(), output = %job.output_path.display(), "encoding");

            if let Err(e) = self.encoder.encode(&job, &sink).await {
                error!(input = %job.input_path.display(), "encode failed, aborting batch: {}", e);
                monitor.abort();
                if let Err(join_error) = monitor.await {
                    if !join_error.is_cancelled() {
                        warn!("progress monitor panicked: {}", join_error);
                    }
                }
                self.view.interrupted(&label);
                return Err(e);
            }

            finish_and_join(&sink, monitor).await;
            sink.reset();
            summary.outputs.push(output_path);
        }

        info!(files = summary.outputs.len(), "batch complete");
        Ok(summary)
    }
}

async fn finish_and_join(sink: &ProgressSink, monitor: tokio::task::JoinHandle<()>) {
    // The encoder normally reports progress=end itself
    sink.finish();
    if let Err(join_error) = monitor.await {
        warn!("progress monitor did not finish cleanly: {}", join_error);
    }
}
