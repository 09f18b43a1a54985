use std::path::Path;
use tracing::debug;
use crate::scanner::{Directory, Entry};
use crate::CommandError;

/// Videos chosen for the next batch, unique by path and kept across directory changes.
///
/// Listing ids are resolved through the directory passed to each call; the set
/// itself only ever compares paths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSet {
    items: Vec<Entry>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, directory: &mut Directory, id: usize) -> Result<(), CommandError> {
        let entry = directory
            .get_mut(id)
            .ok_or_else(|| CommandError::InvalidArgument(id.to_string()))?;

        if !entry.is_file() {
            return Err(CommandError::NotAFile(entry.name.clone()));
        }
        if self.contains(&entry.path) {
            return Err(CommandError::AlreadySelected(entry.name.clone()));
        }

        entry.is_selected = true;
        debug!(path = %entry.path.display(), "selected");
        self.items.push(entry.clone());
        Ok(())
    }

    /// Select every video in `directory` not already selected. Returns how many were added.
    pub fn add_all(&mut self, directory: &mut Directory) -> usize {
        let mut added = 0;

        for entry in directory.entries_mut() {
            if entry.is_file() && !self.contains(&entry.path) {
                entry.is_selected = true;
                self.items.push(entry.clone());
                added += 1;
            }
        }

        added
    }

    pub fn remove(&mut self, directory: &mut Directory, id: usize) -> Result<(), CommandError> {
        let entry = directory
            .get_mut(id)
            .ok_or(CommandError::NotInSelection(id))?;

        let position = self
            .position(&entry.path)
            .ok_or(CommandError::NotInSelection(id))?;

        entry.is_selected = false;
        let removed = self.items.remove(position);
        debug!(path = %removed.path.display(), "deselected");
        Ok(())
    }

    pub fn remove_all(&mut self, directory: &mut Directory) {
        for entry in directory.entries_mut() {
            entry.is_selected = false;
        }
        self.items.clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.position(path).is_some()
    }

    /// Index of `path` in selection order
    pub fn position(&self, path: &Path) -> Option<usize> {
        self.items.iter().position(|item| item.path == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Entry] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
