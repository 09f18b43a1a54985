pub mod cli;
pub mod config;
pub mod encoder;
pub mod ffmpeg;
pub mod progress;
pub mod scanner;
pub mod selection;
pub mod session;
pub mod tui;

use std::path::PathBuf;
use thiserror::Error;

/// Code shown for failures that are not command validation errors.
pub const CATCH_ALL_CODE: u16 = 1000;

/// Validation failures of a single REPL command. These never mutate session state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Command not found.")]
    UnknownCommand(String),

    #[error("Could not find the folder specified.")]
    DirectoryNotFound(PathBuf),

    #[error("Given argument is invalid.")]
    InvalidArgument(String),

    #[error("This video is already selected.")]
    AlreadySelected(String),

    #[error("This video is not in selection.")]
    NotInSelection(usize),

    #[error("No videos are selected for compression.")]
    NoVideosSelected,

    #[error("Please set a target bitrate using the 'bitrate' command.")]
    NoTargetBitrate,

    #[error("Please set an output path using the 'output' command.")]
    NoOutputPath,

    #[error("The 'folder' you tried to select for output, is a video file, not a folder...")]
    NotAFolder(String),

    #[error("Only video files can be selected, not folders.")]
    NotAFile(String),
}

impl CommandError {
    pub fn code(&self) -> u16 {
        match self {
            CommandError::UnknownCommand(_) => 1,
            CommandError::DirectoryNotFound(_) => 2,
            CommandError::InvalidArgument(_) => 3,
            CommandError::AlreadySelected(_) => 4,
            CommandError::NotInSelection(_) => 5,
            CommandError::NoVideosSelected => 6,
            CommandError::NoTargetBitrate => 7,
            CommandError::NoOutputPath => 8,
            CommandError::NotAFolder(_) => 9,
            CommandError::NotAFile(_) => 10,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("File scanning error: {0}")]
    ScanError(String),

    #[error("Media inspection failed for {path:?}: {reason}")]
    ProbeError { path: PathBuf, reason: String },

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("TUI error: {0}")]
    TuiError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Command(#[from] CommandError),
}

impl AppError {
    pub fn probe_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        AppError::ProbeError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Code printed in the REPL error line.
    pub fn code(&self) -> u16 {
        match self {
            AppError::Command(err) => err.code(),
            _ => CATCH_ALL_CODE,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
