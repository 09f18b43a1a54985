use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::str::FromStr;
use crate::CommandError;

/// Named bitrate presets accepted by the `bitrate` command
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum BitratePreset {
    /// Small files, visibly softer picture
    Low,
    /// Balanced quality and size
    Medium,
    /// Close to source quality
    High,
}

impl BitratePreset {
    pub fn kbps(&self) -> u32 {
        match self {
            BitratePreset::Low => 1000,
            BitratePreset::Medium => 2500,
            BitratePreset::High => 5000,
        }
    }
}

/// Argument of the `bitrate` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitrateArg {
    Kbps(u32),
    Preset(BitratePreset),
}

impl BitrateArg {
    pub fn kbps(&self) -> u32 {
        match self {
            BitrateArg::Kbps(kbps) => *kbps,
            BitrateArg::Preset(preset) => preset.kbps(),
        }
    }
}

impl FromStr for BitrateArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.chars().all(|c| c.is_ascii_digit()) && !s.is_empty() {
            let kbps: u32 = s.parse()
                .map_err(|_| format!("'{}' is not a valid bitrate", s))?;
            if kbps == 0 {
                return Err("Bitrate must be at least 1 kbps".to_string());
            }
            return Ok(BitrateArg::Kbps(kbps));
        }

        <BitratePreset as ValueEnum>::from_str(s, true)
            .map(BitrateArg::Preset)
            .map_err(|_| format!("'{}' is neither a number nor low/medium/high", s))
    }
}

/// One line typed at the session prompt
#[derive(Debug, Parser)]
#[command(
    name = "video-compressor",
    no_binary_name = true,
    subcommand_required = true,
    disable_help_flag = true,
    disable_help_subcommand = true,
    disable_version_flag = true
)]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand, PartialEq)]
pub enum Command {
    /// The main command to change directory. Use it like you would in regular terminal.
    #[command(disable_help_flag = true)]
    Cd {
        #[arg(required = true, allow_hyphen_values = true)]
        target: Vec<String>,
    },
    /// Adds video to selection by ID shown in the directory view.
    Add { id: usize },
    /// Adds all videos in current folder to selection.
    #[command(name = "addall")]
    AddAll,
    /// Removes video from selection by ID.
    Remove { id: usize },
    /// Removes all videos from selection.
    #[command(name = "removeall")]
    RemoveAll,
    /// Shows all selected videos.
    View,
    /// Sets the target bitrate after compression in kbps or low/medium/high.
    Bitrate { value: BitrateArg },
    /// Sets the output folder by ID or path.
    #[command(disable_help_flag = true)]
    Output {
        #[arg(required = true, allow_hyphen_values = true)]
        target: Vec<String>,
    },
    /// Starts compressing all videos in selection.
    Run,
    /// Quits the program.
    #[command(alias = "exit")]
    Quit,
    /// Shows this help screen.
    Help,
}

impl Command {
    /// Parse one prompt line. `Ok(None)` means the line was blank.
    pub fn parse_line(line: &str) -> Result<Option<Command>, CommandError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(verb) = tokens.first() else {
            return Ok(None);
        };

        if CommandLine::command().find_subcommand(verb).is_none() {
            return Err(CommandError::UnknownCommand(verb.to_string()));
        }

        let command = CommandLine::try_parse_from(tokens.iter().copied())
            .map_err(|e| CommandError::InvalidArgument(e.kind().to_string()))?
            .command;

        // Path arguments keep their exact spacing
        Ok(Some(match command {
            Command::Cd { .. } => Command::Cd { target: vec![raw_argument(line)] },
            Command::Output { .. } => Command::Output { target: vec![raw_argument(line)] },
            other => other,
        }))
    }
}

/// Everything after the verb, untouched apart from the outer whitespace
fn raw_argument(line: &str) -> String {
    line.trim()
        .split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim_start().to_string())
        .unwrap_or_default()
}

/// Join a multi-token path argument and strip surrounding quotes
pub fn clean_argument(parts: &[String]) -> String {
    parts
        .iter()
        .map(|part| part.trim_matches(|c| c == '"' || c == '\''))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `(name, description)` for every verb, in declaration order
pub fn command_descriptions() -> Vec<(String, String)> {
    let root = CommandLine::command();
    let mut descriptions = Vec::new();

    for sub in root.get_subcommands() {
        let about = sub.get_about().map(|a| a.to_string()).unwrap_or_default();
        descriptions.push((sub.get_name().to_string(), about.clone()));
        for alias in sub.get_all_aliases() {
            descriptions.push((alias.to_string(), "Equivalent to quit.".to_string()));
        }
    }

    descriptions
}
