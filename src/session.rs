use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};
use crate::cli::{clean_argument, BitrateArg, Command};
use crate::config::Settings;
use crate::encoder::EncodingManager;
use crate::ffmpeg::{Encoder, MediaInspector};
use crate::progress::ProgressView;
use crate::scanner::{resolve_path, Directory};
use crate::selection::SelectionSet;
use crate::tui::{self, Console};
use crate::{AppError, CommandError, Result};

/// What the REPL does after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// All state of one interactive session.
///
/// The directory listing is only ever replaced together with the current
/// directory, so it always reflects `current_dir`.
pub struct Session<I, E> {
    settings: Settings,
    inspector: I,
    encoder: E,
    view: Arc<dyn ProgressView>,
    directory: Directory,
    selection: SelectionSet,
    target_bitrate: u32,
    output_path: Option<PathBuf>,
}

impl<I: MediaInspector, E: Encoder> Session<I, E> {
    pub async fn new(settings: Settings, inspector: I, encoder: E, view: Arc<dyn ProgressView>, start_dir: &Path) -> Result<Self> {
        let selection = SelectionSet::new();
        let start_dir = resolve_path(&std::env::current_dir()?, start_dir);
        let directory = Directory::scan(&start_dir, &settings, &inspector, &selection).await?;

        Ok(Self {
            settings,
            inspector,
            encoder,
            view,
            directory,
            selection,
            target_bitrate: 0,
            output_path: None,
        })
    }

    pub fn current_dir(&self) -> &Path {
        self.directory.path()
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn target_bitrate(&self) -> u32 {
        self.target_bitrate
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    /// Rescan `path` and make it the current directory. State is untouched on failure.
    pub async fn set_current_dir(&mut self, path: &Path) -> Result<()> {
        let directory = Directory::scan(path, &self.settings, &self.inspector, &self.selection).await?;
        self.directory = directory;
        Ok(())
    }

    /// Run the prompt loop until `quit`/`exit` or end of input
    pub async fn run<R: BufRead, W: Write>(&mut self, console: &mut Console<R, W>) -> Result<()> {
        let mut pending_error: Option<String> = None;

        loop {
            console.clear()?;
            if let Some(message) = pending_error.take() {
                console.print(&message)?;
            }
            self.render(console)?;

            let prompt = format!("{} >> ", self.current_dir().display());
            let Some(line) = console.read_line(&prompt)? else {
                return Ok(());
            };

            match self.handle_line(&line, console).await {
                Ok(Flow::Quit) => return Ok(()),
                Ok(Flow::Continue) => {}
                Err(e) => {
                    match &e {
                        AppError::Command(err) => debug!(?err, "command rejected"),
                        other => error!("{}", other),
                    }
                    pending_error = Some(format!("Error {}: {}", e.code(), e));
                }
            }
        }
    }

    fn render<R: BufRead, W: Write>(&self, console: &mut Console<R, W>) -> Result<()> {
        for line in tui::render_directory(&self.directory, self.output_path(), &self.settings) {
            console.print(&line)?;
        }
        console.print("")?;
        console.print(&tui::render_status(self.selection.len(), self.target_bitrate, self.output_path()))?;
        Ok(())
    }

    /// Parse and execute one prompt line
    pub async fn handle_line<R: BufRead, W: Write>(&mut self, line: &str, console: &mut Console<R, W>) -> Result<Flow> {
        match Command::parse_line(line)? {
            Some(command) => self.execute(command, console).await,
            None => Ok(Flow::Continue),
        }
    }

    pub async fn execute<R: BufRead, W: Write>(&mut self, command: Command, console: &mut Console<R, W>) -> Result<Flow> {
        debug!(?command, "dispatch");

        match command {
            Command::Cd { target } => self.cd(&clean_argument(&target)).await?,
            Command::Add { id } => self.selection.add(&mut self.directory, id)?,
            Command::AddAll => {
                self.selection.add_all(&mut self.directory);
            }
            Command::Remove { id } => self.selection.remove(&mut self.directory, id)?,
            Command::RemoveAll => self.selection.remove_all(&mut self.directory),
            Command::View => {
                console.clear()?;
                console.print(&tui::render_selection(&self.selection))?;
                console.pause()?;
            }
            Command::Bitrate { value } => self.set_bitrate(value),
            Command::Output { target } => self.set_output(&clean_argument(&target))?,
            Command::Run => self.run_batch(console).await?,
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => {
                console.clear()?;
                console.print(&tui::render_help())?;
                console.pause()?;
            }
        }

        Ok(Flow::Continue)
    }

    async fn cd(&mut self, target: &str) -> Result<()> {
        let resolved = resolve_path(self.current_dir(), Path::new(target));
        if !resolved.is_dir() {
            return Err(CommandError::DirectoryNotFound(resolved).into());
        }
        self.set_current_dir(&resolved).await
    }

    fn set_bitrate(&mut self, value: BitrateArg) {
        self.target_bitrate = value.kbps();
        info!(kbps = self.target_bitrate, "target bitrate set");
    }

    fn set_output(&mut self, target: &str) -> Result<()> {
        if !target.is_empty() && target.chars().all(|c| c.is_ascii_digit()) {
            let id: usize = target.parse()
                .map_err(|_| CommandError::InvalidArgument(target.to_string()))?;
            let entry = self.directory
                .get(id)
                .ok_or_else(|| CommandError::DirectoryNotFound(PathBuf::from(target)))?;
            if entry.is_file() {
                return Err(CommandError::NotAFolder(entry.name.clone()).into());
            }
            self.output_path = Some(entry.path.clone());
            return Ok(());
        }

        let resolved = resolve_path(self.current_dir(), Path::new(target));
        if !resolved.is_dir() {
            return Err(CommandError::DirectoryNotFound(resolved).into());
        }
        self.output_path = Some(resolved);
        Ok(())
    }

    /// Check every precondition of `run`, in reporting order
    pub fn check_ready(&self) -> std::result::Result<(u32, &Path), CommandError> {
        if self.selection.is_empty() {
            return Err(CommandError::NoVideosSelected);
        }
        if self.target_bitrate == 0 {
            return Err(CommandError::NoTargetBitrate);
        }
        let output = self.output_path().ok_or(CommandError::NoOutputPath)?;
        Ok((self.target_bitrate, output))
    }

    async fn run_batch<R: BufRead, W: Write>(&mut self, console: &mut Console<R, W>) -> Result<()> {
        let (bitrate, output) = self.check_ready()?;
        let output = output.to_path_buf();

        if !confirm(console, &tui::render_confirmation(&self.selection, bitrate, &output))? {
            return Ok(());
        }

        let manager = EncodingManager::new(&self.settings, &self.inspector, &self.encoder, self.view.clone());
        let summary = manager.run_batch(self.selection.as_slice(), bitrate, &output).await?;

        console.print(&tui::render_done(summary.outputs.len(), &output))?;
        console.pause()?;
        Ok(())
    }
}

/// Ask until the answer is `y` or `n`. End of input counts as `n`.
fn confirm<R: BufRead, W: Write>(console: &mut Console<R, W>, summary: &str) -> Result<bool> {
    loop {
        console.clear()?;
        console.print(summary)?;

        let Some(answer) = console.read_line("Confirm? (y/n) ")? else {
            return Ok(false);
        };

        match answer.trim().to_lowercase().as_str() {
            "y" => return Ok(true),
            "n" => return Ok(false),
            _ => {}
        }
    }
}
