// Imports
use crate::annotation::{Annotation, AnnotationId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::debug;

/// The action of a committed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "change_action")]
pub enum ChangeAction {
    #[serde(rename = "add")]
    Add,
    #[serde(rename = "update")]
    Update,
    #[serde(rename = "delete")]
    Delete,
}

impl ChangeAction {
    /// Combines an earlier, not yet committed action with a later one on the same annotation.
    ///
    /// Returns None when the two cancel out.
    fn followed_by(self, later: Self) -> Option<Self> {
        match (self, later) {
            (Self::Add, Self::Delete) => None,
            (Self::Add, _) => Some(Self::Add),
            (Self::Update, later) => Some(later),
            (Self::Delete, Self::Delete) => Some(Self::Delete),
            // restored before being committed
            (Self::Delete, _) => Some(Self::Update),
        }
    }
}

/// A committed change of one annotation, with full snapshots of both states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "change")]
pub struct Change {
    #[serde(rename = "action")]
    pub action: ChangeAction,
    /// None when the annotation was added.
    #[serde(rename = "previous_state")]
    pub previous_state: Option<Annotation>,
    /// The state after the change. Trashed annotations are included with `deleted_at` set.
    #[serde(rename = "current_state")]
    pub current_state: Option<Annotation>,
}

impl Change {
    /// The id of the changed annotation.
    pub fn id(&self) -> Option<AnnotationId> {
        self.current_state
            .as_ref()
            .or(self.previous_state.as_ref())
            .map(|annotation| annotation.id)
    }
}

/// The collaborator receiving committed changes, one group per gesture.
pub trait ChangeLog: std::fmt::Debug {
    /// Records the changes of one committed gesture.
    fn record(&mut self, changes: Vec<Change>);

    /// Steps back one entry, returning its changes. The engine restores their previous states.
    fn undo(&mut self) -> Option<Vec<Change>> {
        None
    }

    /// Steps forward one entry, returning its changes. The engine restores their current states.
    fn redo(&mut self) -> Option<Vec<Change>> {
        None
    }

    fn can_undo(&self) -> bool {
        false
    }

    fn can_redo(&self) -> bool {
        false
    }
}

/// A bounded undo/redo history.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Vec<Change>>,
    /// The number of entries currently applied.
    live_index: usize,
    max_len: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(Self::MAX_LEN_DEFAULT)
    }
}

impl History {
    pub const MAX_LEN_DEFAULT: usize = 100;

    pub fn new(max_len: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            live_index: 0,
            max_len: max_len.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.live_index = 0;
    }
}

impl ChangeLog for History {
    fn record(&mut self, changes: Vec<Change>) {
        if changes.is_empty() {
            debug!("No changes, no need to record.");
            return;
        }
        // as soon as new changes are recorded, remove the future
        self.entries.truncate(self.live_index);
        self.entries.push_back(changes);
        self.live_index += 1;

        // truncate history if necessary
        while self.entries.len() > self.max_len {
            self.entries.pop_front();
            self.live_index -= 1;
        }
    }

    fn undo(&mut self) -> Option<Vec<Change>> {
        if !self.can_undo() {
            return None;
        }
        self.live_index -= 1;
        self.entries.get(self.live_index).cloned()
    }

    fn redo(&mut self) -> Option<Vec<Change>> {
        if !self.can_redo() {
            return None;
        }
        let changes = self.entries.get(self.live_index).cloned();
        self.live_index += 1;
        changes
    }

    fn can_undo(&self) -> bool {
        self.live_index > 0
    }

    fn can_redo(&self) -> bool {
        self.live_index < self.entries.len()
    }
}

#[derive(Debug, Clone)]
struct PendingEntry {
    id: AnnotationId,
    action: ChangeAction,
    previous_state: Option<Annotation>,
}

/// Edits that are not yet committed to the change log.
///
/// Edits of the same annotation are coalesced into one change, keeping the state from before the first edit.
/// Annotations with pending edits are dirty.
#[derive(Debug, Clone, Default)]
pub struct PendingChanges {
    entries: Vec<PendingEntry>,
    last_edit: Option<Instant>,
}

impl PendingChanges {
    /// Registers an edit of the annotation. `previous_state` is its state right before the edit.
    pub fn touch(
        &mut self,
        id: AnnotationId,
        action: ChangeAction,
        previous_state: Option<Annotation>,
        now: Instant,
    ) {
        self.last_edit = Some(now);

        match self.entries.iter().position(|entry| entry.id == id) {
            Some(i) => match self.entries[i].action.followed_by(action) {
                Some(combined) => self.entries[i].action = combined,
                None => {
                    self.entries.remove(i);
                }
            },
            None => self.entries.push(PendingEntry {
                id,
                action,
                previous_state: previous_state.map(|state| state.snapshot()),
            }),
        }
    }

    /// Whether the annotation has pending edits.
    pub fn contains(&self, id: AnnotationId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the debounce window since the last edit has passed.
    pub fn is_due(&self, now: Instant, debounce: Duration) -> bool {
        !self.entries.is_empty()
            && self
                .last_edit
                .map(|last| now.saturating_duration_since(last) >= debounce)
                .unwrap_or(true)
    }

    /// Takes all pending edits as changes, looking up the current states.
    pub fn take(&mut self, current_state: impl Fn(AnnotationId) -> Option<Annotation>) -> Vec<Change> {
        self.last_edit = None;

        std::mem::take(&mut self.entries)
            .into_iter()
            .map(|entry| Change {
                action: entry.action,
                previous_state: entry.previous_state,
                current_state: current_state(entry.id).map(|state| state.snapshot()),
            })
            .collect()
    }
}
