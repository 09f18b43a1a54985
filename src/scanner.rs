use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use crate::config::Settings;
use crate::ffmpeg::{MediaInfo, MediaInspector};
use crate::selection::SelectionSet;
use crate::{AppError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum EntryKind {
    Folder,
    Video(MediaInfo),
}

/// One child of the current directory.
///
/// `id` is only meaningful within the listing that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: usize,
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
    pub extension: String,
    pub is_selected: bool,
}

impl Entry {
    pub fn folder(path: PathBuf) -> Self {
        Self {
            id: 0,
            name: file_name_of(&path),
            path,
            kind: EntryKind::Folder,
            extension: "Folder".to_string(),
            is_selected: false,
        }
    }

    pub fn video(path: PathBuf, media: MediaInfo) -> Self {
        let extension = path.extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            id: 0,
            name: file_name_of(&path),
            path,
            kind: EntryKind::Video(media),
            extension,
            is_selected: false,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, EntryKind::Video(_))
    }

    pub fn media(&self) -> Option<&MediaInfo> {
        match &self.kind {
            EntryKind::Video(media) => Some(media),
            EntryKind::Folder => None,
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Scanned contents of one directory
#[derive(Debug, Clone, PartialEq)]
pub struct Directory {
    path: PathBuf,
    entries: Vec<Entry>,
}

impl Directory {
    /// List `path`, keeping folders and allow-listed videos.
    ///
    /// Every video is probed; a probe failure fails the whole scan. Entries already in
    /// `selection` are moved to the end in selection order and flagged selected.
    pub async fn scan<I>(path: &Path, settings: &Settings, inspector: &I, selection: &SelectionSet) -> Result<Self>
    where
        I: MediaInspector + ?Sized,
    {
        if !path.exists() {
            return Err(AppError::ScanError(format!("Directory does not exist: {:?}", path)));
        }
        if !path.is_dir() {
            return Err(AppError::ScanError(format!("Path is not a directory: {:?}", path)));
        }

        let mut children: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(path)? {
            children.push(entry?.path());
        }
        children.sort_by_key(|child| file_name_of(child).to_lowercase());

        let mut entries = Vec::new();
        let mut selected = Vec::new();

        for child in children {
            let entry = if child.is_dir() {
                Entry::folder(child)
            } else if child.is_file() && has_video_extension(&child, settings) {
                let media = inspector.probe(&child).await?;
                Entry::video(child, media)
            } else {
                continue;
            };

            match selection.position(&entry.path) {
                Some(pos) => selected.push((pos, entry)),
                None => entries.push(entry),
            }
        }

        selected.sort_by_key(|(pos, _)| *pos);
        entries.extend(selected.into_iter().map(|(_, mut entry)| {
            entry.is_selected = true;
            entry
        }));

        for (id, entry) in entries.iter_mut().enumerate() {
            entry.id = id;
        }

        debug!(path = %path.display(), entries = entries.len(), "scanned directory");

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, id: usize) -> Option<&Entry> {
        self.entries.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: usize) -> Option<&mut Entry> {
        self.entries.get_mut(id)
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [Entry] {
        &mut self.entries
    }
}

fn has_video_extension(path: &Path, settings: &Settings) -> bool {
    path.extension()
        .map(|ext| settings.is_video_extension(&ext.to_string_lossy()))
        .unwrap_or(false)
}

/// Resolve `target` against `base` and remove `.` and `..` components without
/// touching the filesystem.
pub fn resolve_path(base: &Path, target: &Path) -> PathBuf {
    let joined = if target.is_absolute() {
        target.to_path_buf()
    } else {
        base.join(target)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Popping at the root is a no-op, like `cd ..` in `/`
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Create output directory if it doesn't exist
pub fn create_output_directory(output_dir: &Path) -> Result<()> {
    if !output_dir.exists() {
        fs::create_dir_all(output_dir)
            .map_err(AppError::from)?;
    } else if !output_dir.is_dir() {
        return Err(AppError::ScanError(
            format!("Output path exists but is not a directory: {:?}", output_dir)
        ));
    }

    Ok(())
}

/// Generate output filename by inserting `suffix` between stem and extension
pub fn generate_output_filename(input_path: &Path, suffix: &str) -> Result<PathBuf> {
    let file_stem = input_path.file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| AppError::ScanError(
            format!("Invalid filename: {:?}", input_path)
        ))?;

    let extension = input_path.extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| AppError::ScanError(
            format!("No file extension found: {:?}", input_path)
        ))?;

    Ok(PathBuf::from(format!("{}{}.{}", file_stem, suffix, extension)))
}

/// Generate full output path for an input file
pub fn generate_output_path(input_path: &Path, output_dir: &Path, suffix: &str) -> Result<PathBuf> {
    let output_filename = generate_output_filename(input_path, suffix)?;
    Ok(output_dir.join(output_filename))
}
