#![allow(dead_code)]

use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;

use video_compressor::config::Settings;
use video_compressor::encoder::EncodingJob;
use video_compressor::ffmpeg::{Encoder, MediaInfo, MediaInspector};
use video_compressor::progress::{ProgressSink, ProgressView};
use video_compressor::session::Session;
use video_compressor::tui::Console;
use video_compressor::{AppError, Result};

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Reads the frame count from the fixture file's contents
pub struct FixtureInspector;

#[async_trait]
impl MediaInspector for FixtureInspector {
    async fn probe(&self, path: &Path) -> Result<MediaInfo> {
        let contents = fs::read_to_string(path)?;
        let total_frames: u64 = contents
            .trim()
            .parse()
            .map_err(|_| AppError::probe_error(path, "invalid data found when processing input"))?;

        Ok(MediaInfo {
            duration_secs: total_frames as f64 / 25.0,
            bitrate_bps: 6_000_000,
            size_bytes: 48_000_000,
            total_frames,
        })
    }
}

/// Reports progress in a few steps and writes a small output file
pub struct ScriptedEncoder {
    pub log: Log,
    pub fail_on: Option<String>,
}

impl ScriptedEncoder {
    pub fn new(log: Log) -> Self {
        Self { log, fail_on: None }
    }
}

#[async_trait]
impl Encoder for ScriptedEncoder {
    async fn encode(&self, job: &EncodingJob, sink: &ProgressSink) -> Result<()> {
        let name = job.input_path.file_name().unwrap().to_string_lossy().to_string();
        self.log.lock().unwrap().push(format!("encode {} {}", name, job.bitrate_bps));

        if self.fail_on.as_deref() == Some(name.as_str()) {
            return Err(AppError::EncodingError(format!("{} ended with exit status 1", name)));
        }

        let total: u64 = fs::read_to_string(&job.input_path)?.trim().parse().unwrap();
        for step in 1..=4 {
            sink.feed_line(&format!("frame={}", total * step / 4));
            sink.feed_line("progress=continue");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        sink.feed_line("progress=end");

        fs::write(&job.output_path, b"encoded")?;
        Ok(())
    }
}

/// Records completion events in the same log as the encoder, and every
/// rendered bar as `(label, bar)`
pub struct LogView {
    pub log: Log,
    pub bars: Arc<Mutex<Vec<(String, String)>>>,
}

impl LogView {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            bars: Arc::default(),
        }
    }

    pub fn bars_for(&self, label: &str) -> Vec<String> {
        self.bars
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| l == label)
            .map(|(_, bar)| bar.clone())
            .collect()
    }
}

impl ProgressView for LogView {
    fn update(&self, label: &str, bar: &str) {
        self.bars.lock().unwrap().push((label.to_string(), bar.to_string()));
    }

    fn complete(&self, label: &str) {
        self.log.lock().unwrap().push(format!("complete {}", label));
    }

    fn interrupted(&self, label: &str) {
        self.log.lock().unwrap().push(format!("interrupted {}", label));
    }
}

pub fn fast_settings() -> Settings {
    Settings {
        poll_interval: Duration::from_millis(5),
        ..Settings::default()
    }
}

/// Write a fixture video whose probe reports `frames` frames
pub fn write_video(dir: &Path, name: &str, frames: u64) {
    fs::write(dir.join(name), frames.to_string()).expect("Failed to create test video");
}

pub async fn new_session(dir: &Path, log: &Log) -> Session<FixtureInspector, ScriptedEncoder> {
    Session::new(
        fast_settings(),
        FixtureInspector,
        ScriptedEncoder::new(log.clone()),
        Arc::new(LogView::new(log)),
        dir,
    )
    .await
    .expect("Failed to start session")
}

pub fn console(input: &'static str) -> Console<Cursor<&'static str>, Vec<u8>> {
    Console::new(Cursor::new(input), Vec::new())
}

pub fn written(console: &Console<Cursor<&'static str>, Vec<u8>>) -> String {
    String::from_utf8_lossy(console.output()).to_string()
}

pub fn names<I, E>(session: &Session<I, E>) -> Vec<String>
where
    I: MediaInspector,
    E: Encoder,
{
    session.directory().entries().iter().map(|e| e.name.clone()).collect()
}
