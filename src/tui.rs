use std::io::{stdout, BufRead, Write};
use std::path::Path;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Cell, Row, Table, Widget},
};
use crossterm::{
    cursor::{MoveTo, MoveToColumn},
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};
use tracing::warn;
use crate::cli::command_descriptions;
use crate::config::Settings;
use crate::progress::ProgressView;
use crate::scanner::{Directory, Entry};
use crate::selection::SelectionSet;
use crate::{AppError, Result};

pub const CONTINUE_MESSAGE: &str = "\nPress 'enter' to continue\n";

const ID_WIDTH: u16 = 3;
const EXTENSION_WIDTH: u16 = 10;
const SIZE_WIDTH: u16 = 9;
const DURATION_WIDTH: u16 = 9;
const BITRATE_WIDTH: u16 = 14;
const SELECTED_WIDTH: u16 = 8;
const MARKER_WIDTH: u16 = 13;

/// Render the directory listing as plain text lines
pub fn render_directory(directory: &Directory, output_path: Option<&Path>, settings: &Settings) -> Vec<String> {
    let name_width = settings.max_filename_len.max(4) as u16;
    let widths = [
        ID_WIDTH,
        name_width,
        EXTENSION_WIDTH,
        SIZE_WIDTH,
        DURATION_WIDTH,
        BITRATE_WIDTH,
        SELECTED_WIDTH,
        MARKER_WIDTH,
    ];

    let header = Row::new(vec!["ID", "Filename", "Extension", "Size", "Duration", "Bitrate", "Selected", ""])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = directory
        .entries()
        .iter()
        .map(|entry| entry_row(entry, output_path, settings.max_filename_len))
        .collect();

    let spacing: u16 = 1;
    let width = widths.iter().sum::<u16>() + spacing * (widths.len() as u16 - 1);
    let height = rows.len() as u16 + 1;

    let table = Table::new(rows, widths.map(Constraint::Length))
        .header(header)
        .column_spacing(spacing);

    let mut buffer = Buffer::empty(Rect::new(0, 0, width, height));
    table.render(buffer.area, &mut buffer);
    buffer_lines(&buffer)
}

fn entry_row(entry: &Entry, output_path: Option<&Path>, max_name_len: usize) -> Row<'static> {
    let name = truncate_name(&entry.name, max_name_len);

    match entry.media() {
        Some(media) => Row::new(vec![
            Cell::from(entry.id.to_string()),
            Cell::from(name),
            Cell::from(entry.extension.clone()),
            Cell::from(format_size(media.size_bytes)),
            Cell::from(format_duration(media.duration_secs)),
            Cell::from(format!("{} kbps", group_thousands(media.bitrate_kbps()))),
            Cell::from(if entry.is_selected { "✓" } else { "" }),
            Cell::from(""),
        ]),
        None => {
            let marker = if output_path == Some(entry.path.as_path()) { "<- Output dir" } else { "" };
            Row::new(vec![
                Cell::from(entry.id.to_string()),
                Cell::from(name),
                Cell::from(entry.extension.clone()),
                Cell::from(""),
                Cell::from(""),
                Cell::from(""),
                Cell::from(""),
                Cell::from(marker),
            ])
        }
    }
}

fn buffer_lines(buffer: &Buffer) -> Vec<String> {
    let width = buffer.area.width as usize;
    buffer
        .content
        .chunks(width)
        .map(|row| {
            let line: String = row.iter().map(|cell| cell.symbol()).collect();
            line.trim_end().to_string()
        })
        .collect()
}

/// One-line summary of the session settings shown under the listing
pub fn render_status(selected: usize, bitrate_kbps: u32, output_path: Option<&Path>) -> String {
    let bitrate = if bitrate_kbps == 0 {
        "not set".to_string()
    } else {
        format!("{} kbps", group_thousands(u64::from(bitrate_kbps)))
    };
    let output = output_path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "not set".to_string());

    format!("Selected: {} | Target bitrate: {} | Output: {}", selected, bitrate, output)
}

pub fn render_selection(selection: &SelectionSet) -> String {
    let mut text = String::from("The following videos are currently selected:\n");
    for entry in selection.iter() {
        text.push_str(&entry.name);
        text.push('\n');
    }
    text
}

pub fn render_confirmation(selection: &SelectionSet, bitrate_kbps: u32, output_path: &Path) -> String {
    let rule = "-".repeat(42);
    let mut text = String::from("The following videos are to be compressed:\n");
    text.push_str(&rule);
    text.push('\n');
    for entry in selection.iter() {
        text.push_str(&entry.name);
        text.push('\n');
    }
    text.push_str(&rule);
    text.push('\n');
    text.push_str(&format!("Target bitrate: {} kbps\n", bitrate_kbps));
    text.push_str(&format!("Output path: {}\n", output_path.display()));
    text
}

pub fn render_done(count: usize, output_path: &Path) -> String {
    if count == 1 {
        format!("Done!\n1 compressed video is stored in '{}'", output_path.display())
    } else {
        format!("Done!\nAll {} compressed videos are stored in '{}'", count, output_path.display())
    }
}

pub fn render_help() -> String {
    let mut text = String::from("You can use the following commands:\n\n");
    for (name, about) in command_descriptions() {
        text.push_str(&format!("{} : {}\n", name, about));
    }
    text
}

/// Cut names longer than `max_len` to `max_len` characters ending in `...`
pub fn truncate_name(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        return name.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let mut truncated: String = name.chars().take(keep).collect();
    truncated.push_str("...");
    truncated
}

/// Decimal megabytes, switching to gigabytes above 1000 MB
pub fn format_size(bytes: u64) -> String {
    let megabytes = bytes / 1_000_000;
    if megabytes > 1000 {
        format!("{:.2} GB", megabytes as f64 / 1000.0)
    } else {
        format!("{} MB", megabytes)
    }
}

/// `m:ss`
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Line-oriented terminal IO for the session prompt
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Show `prompt` and read one line. `None` at end of input.
    pub fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(|c| c == '\r' || c == '\n').to_string()))
    }

    pub fn print(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        queue!(self.output, Clear(ClearType::All), MoveTo(0, 0))
            .map_err(|e| AppError::TuiError(e.to_string()))?;
        self.output.flush()?;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        self.read_line(CONTINUE_MESSAGE)?;
        Ok(())
    }

    pub fn output(&self) -> &W {
        &self.output
    }
}

/// Draws progress on the current terminal line of stdout
#[derive(Debug, Clone)]
pub struct TerminalProgress {
    bar_len: usize,
}

impl TerminalProgress {
    pub fn new(settings: &Settings) -> Self {
        Self {
            bar_len: settings.progress_bar_len,
        }
    }

    fn redraw(&self, text: String) {
        if let Err(e) = draw_line(&mut stdout(), &text) {
            warn!("failed to draw progress line: {}", e);
        }
    }
}

/// Overwrite the current terminal line with `text`
fn draw_line<W: Write>(out: &mut W, text: &str) -> std::io::Result<()> {
    queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine), Print(text))?;
    out.flush()
}

impl ProgressView for TerminalProgress {
    fn update(&self, label: &str, bar: &str) {
        self.redraw(format!("{} {:<width$} |", label, bar, width = self.bar_len));
    }

    fn complete(&self, label: &str) {
        self.redraw(format!("{} ✓\n", label));
    }

    fn interrupted(&self, label: &str) {
        self.redraw(format!("{} ✗\n", label));
    }
}
