//! Append-only journal of applied edits.
//!
//! Every successfully applied action is appended as one JSON line with
//! file locking. The journal lets an editing session rebuild its current
//! snapshot from the original when the stored one is lost.

use crate::{Edit, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// What was applied to the current snapshot
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum JournalAction {
    Edit(Edit),
    Undo,
}

/// One journal line
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct JournalEntry {
    pub id: Uuid,
    pub applied_at: DateTime<Utc>,
    pub action: JournalAction,
}

impl JournalEntry {
    pub fn new(action: JournalAction) -> Self {
        Self {
            id: Uuid::new_v4(),
            applied_at: Utc::now(),
            action,
        }
    }
}

/// Destination for applied actions
pub trait EditSink {
    fn append(&mut self, entry: &JournalEntry) -> Result<()>;
}

/// JSONL journal file with locking
pub struct EditJournal {
    path: PathBuf,
}

impl EditJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drop every entry, used when a new workout is imported
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            tracing::debug!("Cleared edit journal {:?}", self.path);
        }
        Ok(())
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl EditSink for EditJournal {
    fn append(&mut self, entry: &JournalEntry) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended journal entry {}", entry.id);
        Ok(())
    }
}

/// Read all entries from a journal file, skipping lines that fail to parse
pub fn read_journal(path: &Path) -> Result<Vec<JournalEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<JournalEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Failed to parse journal entry at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} journal entries", entries.len());
    Ok(entries)
}
