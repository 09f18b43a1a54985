use std::path::{Path, PathBuf};
use std::process::Stdio;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, error};
use crate::config::Settings;
use crate::encoder::EncodingJob;
use crate::progress::ProgressSink;
use crate::{AppError, Result};

/// Container facts needed for the directory view and progress reporting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaInfo {
    pub duration_secs: f64,
    pub bitrate_bps: u64,
    pub size_bytes: u64,
    pub total_frames: u64,
}

impl MediaInfo {
    pub fn bitrate_kbps(&self) -> u64 {
        self.bitrate_bps / 1000
    }
}

/// Reads container metadata for a single file.
#[async_trait]
pub trait MediaInspector: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<MediaInfo>;
}

/// Runs one external encode, reporting progress lines into `sink`.
#[async_trait]
pub trait Encoder: Send + Sync {
    async fn encode(&self, job: &EncodingJob, sink: &ProgressSink) -> Result<()>;
}

/// Media inspection through the `ffprobe` executable
#[derive(Debug, Clone)]
pub struct FfprobeInspector {
    program: PathBuf,
}

impl FfprobeInspector {
    pub fn new(settings: &Settings) -> Self {
        Self {
            program: settings.ffprobe_program.clone(),
        }
    }

    fn probe_args(path: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-select_streams".to_string(),
            "v:0".to_string(),
            "-show_entries".to_string(),
            "stream=nb_frames,r_frame_rate:format=duration,bit_rate,size".to_string(),
            "-of".to_string(),
            "default=noprint_wrappers=1".to_string(),
            path.to_string_lossy().to_string(),
        ]
    }
}

#[async_trait]
impl MediaInspector for FfprobeInspector {
    async fn probe(&self, path: &Path) -> Result<MediaInfo> {
        let output = Command::new(&self.program)
            .args(Self::probe_args(path))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| AppError::probe_error(path, format!("Failed to execute ffprobe: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::probe_error(path, format!("ffprobe failed: {}", stderr.trim())));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let info = parse_probe_output(&stdout).map_err(|reason| AppError::probe_error(path, reason))?;
        debug!(path = %path.display(), frames = info.total_frames, "probed");
        Ok(info)
    }
}

/// Parse `key=value` lines produced by ffprobe's default writer.
///
/// Example output:
/// ```text
/// r_frame_rate=30000/1001
/// nb_frames=1798
/// duration=60.026633
/// size=15728640
/// bit_rate=2096215
/// ```
pub fn parse_probe_output(stdout: &str) -> std::result::Result<MediaInfo, String> {
    let mut duration: Option<f64> = None;
    let mut bitrate_bps: Option<u64> = None;
    let mut size_bytes: Option<u64> = None;
    let mut nb_frames: Option<u64> = None;
    let mut frame_rate: Option<f64> = None;

    for line in stdout.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };

        match key {
            "duration" => duration = value.parse::<f64>().ok().or(duration),
            "bit_rate" => bitrate_bps = value.parse::<u64>().ok().or(bitrate_bps),
            "size" => size_bytes = value.parse::<u64>().ok().or(size_bytes),
            "nb_frames" => nb_frames = value.parse::<u64>().ok().or(nb_frames),
            "r_frame_rate" => {
                if let Some((num, den)) = value.split_once('/') {
                    if let (Ok(n), Ok(d)) = (num.parse::<f64>(), den.parse::<f64>()) {
                        if d > 0.0 {
                            frame_rate = Some(n / d);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    let Some(duration_secs) = duration else {
        return Err("failed to detect duration".to_string());
    };

    // Some containers leave nb_frames as N/A
    let total_frames = nb_frames.unwrap_or_else(|| match frame_rate {
        Some(fps) => (duration_secs * fps).round() as u64,
        None => 0,
    });

    Ok(MediaInfo {
        duration_secs,
        bitrate_bps: bitrate_bps.unwrap_or(0),
        size_bytes: size_bytes.unwrap_or(0),
        total_frames,
    })
}

/// In-process media inspection through the FFmpeg libraries
#[cfg(feature = "libav")]
#[derive(Debug, Default, Clone)]
pub struct LibavInspector;

#[cfg(feature = "libav")]
#[async_trait]
impl MediaInspector for LibavInspector {
    async fn probe(&self, path: &Path) -> Result<MediaInfo> {
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || probe_with_libav(&owned))
            .await
            .map_err(|e| AppError::probe_error(path, format!("probe task failed: {}", e)))?
    }
}

#[cfg(feature = "libav")]
fn probe_with_libav(path: &Path) -> Result<MediaInfo> {
    use ffmpeg_next as libav;

    libav::init().map_err(|e| AppError::probe_error(path, format!("FFmpeg init failed: {}", e)))?;

    let input = libav::format::input(&path)
        .map_err(|e| AppError::probe_error(path, format!("Failed to open file: {}", e)))?;

    let duration = input.duration();
    if duration <= 0 {
        return Err(AppError::probe_error(path, "failed to detect duration"));
    }
    let duration_secs = duration as f64 / f64::from(libav::ffi::AV_TIME_BASE);

    let total_frames = input
        .streams()
        .best(libav::media::Type::Video)
        .map(|stream| {
            let frames = stream.frames();
            if frames > 0 {
                frames as u64
            } else {
                let rate = stream.avg_frame_rate();
                if rate.denominator() > 0 {
                    (duration_secs * f64::from(rate.numerator()) / f64::from(rate.denominator())).round() as u64
                } else {
                    0
                }
            }
        })
        .ok_or_else(|| AppError::probe_error(path, "no video stream"))?;

    let size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    Ok(MediaInfo {
        duration_secs,
        bitrate_bps: input.bit_rate().max(0) as u64,
        size_bytes,
        total_frames,
    })
}

/// Encoding through the `ffmpeg` executable
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
}

impl FfmpegEncoder {
    pub fn new(settings: &Settings) -> Self {
        Self {
            program: settings.ffmpeg_program.clone(),
        }
    }

    /// Generate FFmpeg command arguments for a job, with progress reported on stdout
    pub fn generate_command_args(job: &EncodingJob) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-nostats".to_string(),
        ];

        if job.overwrite {
            args.push("-y".to_string());
        }

        args.extend([
            "-i".to_string(),
            job.input_path.to_string_lossy().to_string(),
            "-c:v".to_string(),
            job.codec.clone(),
            "-b:v".to_string(),
            job.bitrate_bps.to_string(),
            "-progress".to_string(),
            "pipe:1".to_string(),
        ]);

        args.push(job.output_path.to_string_lossy().to_string());
        args
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn encode(&self, job: &EncodingJob, sink: &ProgressSink) -> Result<()> {
        let args = Self::generate_command_args(job);
        debug!(?args, "spawning ffmpeg");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AppError::EncodingError(format!("Failed to spawn FFmpeg process: {}", e)))?;

        // stderr is drained concurrently with stdout
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut text = String::new();
                let _ = stderr.read_to_string(&mut text).await;
                text
            })
        });

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                sink.feed_line(&line);
            }
        }

        let status = child.wait().await
            .map_err(|e| AppError::EncodingError(format!("FFmpeg process failed: {}", e)))?;

        let stderr_text = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            let details = stderr_text.trim();
            error!(input = %job.input_path.display(), code = ?status.code(), "ffmpeg failed");
            return Err(AppError::EncodingError(if details.is_empty() {
                format!("FFmpeg failed on {:?} with exit code {:?}", job.input_path, status.code())
            } else {
                format!(
                    "FFmpeg failed on {:?} with exit code {:?}. Error output: {}",
                    job.input_path,
                    status.code(),
                    details
                )
            }));
        }

        Ok(())
    }
}
