//! Editing session with original/current snapshots and undo.
//!
//! The session holds the workout as imported and the workout after the
//! latest edit. Undo is a full restore of the imported snapshot, not a step
//! back. Each change is written to the snapshot store and, when a sink is
//! attached, appended to the edit journal.

use crate::journal::{EditSink, JournalAction, JournalEntry};
use crate::store::{SnapshotKey, SnapshotStore};
use crate::{codec, renumber, validate, Edit, Error, Result, Workout};

/// Result of an applied action
#[derive(Debug)]
pub struct EditOutcome {
    /// The new current snapshot
    pub workout: Workout,
    /// Set when the new snapshot could not be persisted
    pub warning: Option<Error>,
}

/// Fresh working copy of the original snapshot
fn working_copy(original: &Workout) -> Workout {
    let mut workout = original.clone();
    renumber::renumber(&mut workout);
    workout
}

/// Rebuild the current snapshot from the original and a journal
///
/// Only the actions after the last undo matter. An edit that no longer
/// applies is skipped with a warning.
pub fn replay(original: &Workout, entries: &[JournalEntry]) -> Workout {
    let start = entries
        .iter()
        .rposition(|e| e.action == JournalAction::Undo)
        .map_or(0, |i| i + 1);

    let mut current = working_copy(original);
    for entry in &entries[start..] {
        if let JournalAction::Edit(edit) = &entry.action {
            match edit.apply(&current) {
                Ok(next) => current = next,
                Err(e) => tracing::warn!("Skipping journal entry {} ({}): {}", entry.id, edit, e),
            }
        }
    }

    tracing::info!("Replayed {} journal entries", entries.len() - start);
    current
}

/// Explicit editing context for one workout
pub struct EditSession<S: SnapshotStore> {
    store: S,
    journal: Option<Box<dyn EditSink>>,
    original: Workout,
    current: Workout,
}

impl<S: SnapshotStore> EditSession<S> {
    /// Start editing a freshly decoded workout
    ///
    /// Both snapshots are written to the store; a write failure is returned
    /// as a warning next to the session.
    pub fn open(store: S, workout: Workout) -> (Self, Option<Error>) {
        let current = working_copy(&workout);
        let mut session = Self {
            store,
            journal: None,
            original: workout,
            current,
        };

        let original_warning = session.persist(SnapshotKey::Original);
        let current_warning = session.persist(SnapshotKey::Current);
        let warning = original_warning.or(current_warning);

        tracing::info!(
            "Opened workout with {} lengths and {} laps",
            session.original.segments.len(),
            session.original.laps.len()
        );
        (session, warning)
    }

    /// Reopen the workout held by `store`
    ///
    /// When the current snapshot is missing or unreadable it is rebuilt from
    /// the original and `entries`.
    pub fn resume(store: S, entries: &[JournalEntry]) -> Result<Self> {
        let original = store
            .get(SnapshotKey::Original)
            .ok_or_else(|| Error::State("no workout has been imported".into()))?;
        let original = codec::from_value(original)?;

        let stored = store
            .get(SnapshotKey::Current)
            .and_then(|value| match codec::from_value(value) {
                Ok(workout) => Some(workout),
                Err(e) => {
                    tracing::warn!("Stored current snapshot is invalid: {}", e);
                    None
                }
            });

        let mut session = Self {
            store,
            journal: None,
            current: working_copy(&original),
            original,
        };

        match stored {
            Some(current) => session.current = current,
            None => {
                tracing::warn!("Rebuilding current snapshot from the edit journal");
                session.current = replay(&session.original, entries);
                if let Some(e) = session.persist(SnapshotKey::Current) {
                    tracing::warn!("Rebuilt snapshot was not saved: {}", e);
                }
            }
        }

        Ok(session)
    }

    /// Attach a journal that receives every applied action
    pub fn with_journal(mut self, sink: Box<dyn EditSink>) -> Self {
        self.journal = Some(sink);
        self
    }

    pub fn original(&self) -> &Workout {
        &self.original
    }

    pub fn current(&self) -> &Workout {
        &self.current
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Apply an edit to the current snapshot
    ///
    /// Rejected edits leave the current snapshot untouched. A failed write
    /// does not roll back the edit.
    pub fn apply(&mut self, edit: &Edit) -> Result<EditOutcome> {
        self.current = edit.apply(&self.current)?;

        let problems = validate::validate(&self.current);
        if !problems.is_empty() {
            tracing::warn!("Inconsistent snapshot after {}: {:?}", edit, problems);
        }

        tracing::info!("Applied {}", edit);
        Ok(self.commit(JournalAction::Edit(edit.clone())))
    }

    /// Restore the current snapshot to the original
    pub fn undo(&mut self) -> EditOutcome {
        self.current = working_copy(&self.original);
        tracing::info!("Restored original workout");
        self.commit(JournalAction::Undo)
    }

    fn commit(&mut self, action: JournalAction) -> EditOutcome {
        let warning = self.persist(SnapshotKey::Current);

        if let Some(journal) = self.journal.as_mut() {
            if let Err(e) = journal.append(&JournalEntry::new(action)) {
                tracing::warn!("Failed to append to edit journal: {}", e);
            }
        }

        EditOutcome {
            workout: self.current.clone(),
            warning,
        }
    }

    /// Write one snapshot, returning the failure as a storage warning
    fn persist(&mut self, key: SnapshotKey) -> Option<Error> {
        let workout = match key {
            SnapshotKey::Original => &self.original,
            SnapshotKey::Current => &self.current,
        };

        let result = codec::to_value(workout).and_then(|value| self.store.set(key, &value));
        match result {
            Ok(()) => {
                tracing::info!("Saved {} snapshot", key.as_str());
                None
            }
            Err(e) => {
                tracing::warn!("Failed to save {} snapshot: {}", key.as_str(), e);
                Some(match e {
                    Error::StorageUnavailable(_) => e,
                    other => Error::StorageUnavailable(other.to_string()),
                })
            }
        }
    }
}
