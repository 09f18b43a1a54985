use std::path::PathBuf;
use std::time::Duration;
use crate::{AppError, Result};

/// How often a progress monitor re-reads the progress channel.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Width of the `#` progress bar.
pub const DEFAULT_PROGRESS_BAR_LEN: usize = 40;

/// File names longer than this are cut with `...` in the directory view.
pub const DEFAULT_MAX_FILENAME_LEN: usize = 20;

pub const ENV_FFMPEG: &str = "VIDEO_COMPRESSOR_FFMPEG";
pub const ENV_FFPROBE: &str = "VIDEO_COMPRESSOR_FFPROBE";
pub const ENV_CODEC: &str = "VIDEO_COMPRESSOR_CODEC";
pub const ENV_EXTENSIONS: &str = "VIDEO_COMPRESSOR_EXTENSIONS";
pub const ENV_POLL_MS: &str = "VIDEO_COMPRESSOR_POLL_MS";

/// Runtime settings for a compression session
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Lowercase file extensions shown in the directory view
    pub video_extensions: Vec<String>,
    /// Video codec handed to the encoder
    pub codec: String,
    /// Inserted between file stem and extension for output files
    pub output_suffix: String,
    pub poll_interval: Duration,
    pub progress_bar_len: usize,
    pub max_filename_len: usize,
    pub ffmpeg_program: PathBuf,
    pub ffprobe_program: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            video_extensions: vec!["mp4".to_string()],
            codec: "hevc_nvenc".to_string(),
            output_suffix: "c".to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            progress_bar_len: DEFAULT_PROGRESS_BAR_LEN,
            max_filename_len: DEFAULT_MAX_FILENAME_LEN,
            ffmpeg_program: PathBuf::from("ffmpeg"),
            ffprobe_program: PathBuf::from("ffprobe"),
        }
    }
}

impl Settings {
    /// Default settings with environment overrides applied, then validated
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(program) = lookup(ENV_FFMPEG) {
            settings.ffmpeg_program = PathBuf::from(program);
        }
        if let Some(program) = lookup(ENV_FFPROBE) {
            settings.ffprobe_program = PathBuf::from(program);
        }
        if let Some(codec) = lookup(ENV_CODEC) {
            settings.codec = codec.trim().to_string();
        }
        if let Some(extensions) = lookup(ENV_EXTENSIONS) {
            settings.video_extensions = parse_extensions(&extensions);
        }
        if let Some(poll_ms) = lookup(ENV_POLL_MS) {
            let millis: u64 = poll_ms.trim().parse().map_err(|_| {
                AppError::ConfigError(format!("{} must be a number of milliseconds, got '{}'", ENV_POLL_MS, poll_ms))
            })?;
            settings.poll_interval = Duration::from_millis(millis);
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.video_extensions.is_empty() {
            return Err(AppError::ConfigError(
                "At least one video extension must be configured".to_string()
            ));
        }

        if self.codec.is_empty() {
            return Err(AppError::ConfigError("Video codec must not be empty".to_string()));
        }

        if self.progress_bar_len == 0 {
            return Err(AppError::ConfigError("Progress bar length must be at least 1".to_string()));
        }

        if self.poll_interval.is_zero() {
            return Err(AppError::ConfigError("Progress poll interval must not be zero".to_string()));
        }

        Ok(())
    }

    /// Case-insensitive check against the configured extensions
    pub fn is_video_extension(&self, extension: &str) -> bool {
        let extension = extension.to_lowercase();
        self.video_extensions.iter().any(|allowed| *allowed == extension)
    }
}

fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert_eq!(settings.video_extensions, vec!["mp4".to_string()]);
        assert_eq!(settings.codec, "hevc_nvenc");
        assert_eq!(settings.output_suffix, "c");
        assert_eq!(settings.poll_interval, Duration::from_millis(500));
        assert_eq!(settings.progress_bar_len, 40);
        assert_eq!(settings.max_filename_len, 20);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_no_overrides_yields_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_environment_overrides() {
        let settings = Settings::from_lookup(lookup_from(&[
            (ENV_FFMPEG, "/opt/ffmpeg/bin/ffmpeg"),
            (ENV_CODEC, "libx265"),
            (ENV_EXTENSIONS, "MP4, .mkv,,mov"),
            (ENV_POLL_MS, "100"),
        ]))
        .unwrap();

        assert_eq!(settings.ffmpeg_program, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(settings.ffprobe_program, PathBuf::from("ffprobe"));
        assert_eq!(settings.codec, "libx265");
        assert_eq!(settings.video_extensions, vec!["mp4", "mkv", "mov"]);
        assert_eq!(settings.poll_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_invalid_poll_interval_is_config_error() {
        let result = Settings::from_lookup(lookup_from(&[(ENV_POLL_MS, "fast")]));
        assert!(matches!(result, Err(AppError::ConfigError(_))));

        let result = Settings::from_lookup(lookup_from(&[(ENV_POLL_MS, "0")]));
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_empty_extension_list_rejected() {
        let result = Settings::from_lookup(lookup_from(&[(ENV_EXTENSIONS, " , ")]));

        if let Err(AppError::ConfigError(msg)) = result {
            assert!(msg.contains("extension"));
        } else {
            panic!("Expected ConfigError");
        }
    }

    #[test]
    fn test_is_video_extension_case_insensitive() {
        let settings = Settings::default();
        assert!(settings.is_video_extension("mp4"));
        assert!(settings.is_video_extension("MP4"));
        assert!(!settings.is_video_extension("mkv"));
        assert!(!settings.is_video_extension(""));
    }
}
