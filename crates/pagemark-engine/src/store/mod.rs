// Modules
pub mod merge;

// Re-exports
pub use merge::{ImportError, ImportReport, MergeOutcome};

// Imports
use crate::annotation::{Annotation, AnnotationId};
use crate::changelog::{Change, ChangeAction, PendingChanges};
use crate::hooks::LifecycleEvent;
use crate::timestamp::{Stamper, Timestamp};
use itertools::Itertools;
use p2d::bounding_volume::{Aabb, BoundingVolume};
use pagemark_compose::ext::AabbExt;
use pagemark_compose::{PixelRect, Viewport};
use slotmap::{HopSlotMap, SecondaryMap};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::warn;

slotmap::new_key_type! {
    pub struct AnnotationKey;
}

/// What the presentation layer needs to render one annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderItem {
    pub key: AnnotationKey,
    pub id: AnnotationId,
    pub kind: &'static str,
    pub bounds: PixelRect,
}

/// The working set of annotations.
///
/// Annotations are keyed by slotmap keys locally and by their stable [AnnotationId] across sessions.
/// Every annotation has a chrono component holding its position in the paint order, the most recently
/// inserted or interacted with is painted last.
///
/// Trashed annotations stay in the store until they are dropped with [AnnotationStore::drop_tombstoned],
/// which only happens once they have no pending edits left.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    annotations: HopSlotMap<AnnotationKey, Annotation>,
    ids: HashMap<AnnotationId, AnnotationKey>,
    chrono_components: SecondaryMap<AnnotationKey, u32>,
    /// Incrementing counter for chrono_components.
    ///
    /// Value must be kept equal to the chrono component of the newest inserted or interacted annotation.
    chrono_counter: u32,
    stamper: Stamper,
    pending: PendingChanges,
    lifecycle_events: Vec<LifecycleEvent>,
}

impl AnnotationStore {
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn get(&self, key: AnnotationKey) -> Option<&Annotation> {
        self.annotations.get(key)
    }

    /// Mutable access without stamping or recording the edit.
    ///
    /// Callers must commit the edit with [AnnotationStore::commit_edit] eventually.
    pub(crate) fn get_mut(&mut self, key: AnnotationKey) -> Option<&mut Annotation> {
        self.annotations.get_mut(key)
    }

    pub fn key_for_id(&self, id: AnnotationId) -> Option<AnnotationKey> {
        self.ids.get(&id).copied()
    }

    pub fn get_by_id(&self, id: AnnotationId) -> Option<&Annotation> {
        self.key_for_id(id).and_then(|key| self.get(key))
    }

    /// Inserts an annotation as is, replacing an annotation with the same id.
    pub(crate) fn insert(&mut self, annotation: Annotation) -> AnnotationKey {
        let id = annotation.id;
        let live_thread_item = annotation.kind.is_thread_item() && !annotation.is_tombstoned();

        if let Some(key) = self.key_for_id(id) {
            let was_live = self.is_live_thread_item(key);
            if let Some(existing) = self.annotations.get_mut(key) {
                *existing = annotation;
            }
            self.push_lifecycle_transition(id, was_live, key);
            return key;
        }

        let key = self.annotations.insert(annotation);
        self.ids.insert(id, key);
        self.chrono_counter += 1;
        self.chrono_components.insert(key, self.chrono_counter);
        if live_thread_item {
            self.lifecycle_events.push(LifecycleEvent::Attached(id));
        }
        key
    }

    /// Inserts a locally created annotation, stamping it and recording the addition.
    pub fn insert_new(&mut self, mut annotation: Annotation, now: Instant) -> AnnotationKey {
        annotation.added_at = self.stamper.stamp();
        annotation.deleted_at = None;
        let id = annotation.id;
        let key = self.insert(annotation);
        self.pending.touch(id, ChangeAction::Add, None, now);
        key
    }

    /// Records an edit done through [AnnotationStore::get_mut], stamping a fresh `added_at`.
    pub(crate) fn commit_edit(
        &mut self,
        key: AnnotationKey,
        action: ChangeAction,
        previous_state: Annotation,
        now: Instant,
    ) -> Option<Timestamp> {
        let stamp = self.stamper.stamp();
        let annotation = self.annotations.get_mut(key)?;
        annotation.added_at = stamp;
        if action == ChangeAction::Delete {
            annotation.deleted_at = Some(stamp);
        }
        let id = annotation.id;

        self.pending.touch(id, action, Some(previous_state), now);
        Some(stamp)
    }

    /// Edits the annotation, stamping a fresh `added_at` and recording the edit.
    ///
    /// Returns false if the key is not in the store.
    pub fn modify(
        &mut self,
        key: AnnotationKey,
        now: Instant,
        f: impl FnOnce(&mut Annotation),
    ) -> bool {
        let Some(annotation) = self.annotations.get_mut(key) else {
            return false;
        };
        let previous_state = annotation.snapshot();
        f(annotation);
        self.commit_edit(key, ChangeAction::Update, previous_state, now)
            .is_some()
    }

    /// Trashes the annotation. It is kept as tombstone for undo and sync.
    pub fn trash(&mut self, key: AnnotationKey, now: Instant) -> bool {
        let Some(annotation) = self.annotations.get(key) else {
            return false;
        };
        if annotation.is_tombstoned() {
            return false;
        }
        let id = annotation.id;
        let previous_state = annotation.snapshot();
        let was_live = self.is_live_thread_item(key);

        let trashed = self
            .commit_edit(key, ChangeAction::Delete, previous_state, now)
            .is_some();
        self.push_lifecycle_transition(id, was_live, key);
        trashed
    }

    /// Restores a state from the history, stamping it as the newest edit.
    ///
    /// `None` for `state` means the annotation did not exist before, so it gets trashed.
    pub(crate) fn restore_state(&mut self, state: Option<&Annotation>, id: AnnotationId) {
        let stamp = self.stamper.stamp();

        match state {
            Some(state) => {
                let mut restored = state.snapshot();
                restored.added_at = stamp;
                let key = self.insert(restored);
                self.update_chrono_to_last(key);
            }
            None => {
                let Some(key) = self.key_for_id(id) else {
                    return;
                };
                let was_live = self.is_live_thread_item(key);
                if let Some(annotation) = self.annotations.get_mut(key) {
                    annotation.added_at = stamp;
                    annotation.deleted_at = Some(stamp);
                }
                self.push_lifecycle_transition(id, was_live, key);
            }
        }
    }

    /// Takes the pending edits as committed changes.
    pub fn flush_pending(&mut self) -> Vec<Change> {
        let annotations = &self.annotations;
        let ids = &self.ids;
        self.pending.take(|id| {
            ids.get(&id)
                .and_then(|key| annotations.get(*key))
                .map(Annotation::snapshot)
        })
    }

    /// Whether there are pending edits whose debounce window has passed.
    pub fn pending_is_due(&self, now: Instant, debounce: Duration) -> bool {
        self.pending.is_due(now, debounce)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Whether the annotation has uncommitted edits.
    pub fn is_dirty(&self, key: AnnotationKey) -> bool {
        self.annotations
            .get(key)
            .map(|annotation| self.pending.contains(annotation.id))
            .unwrap_or(false)
    }

    pub fn is_tombstoned(&self, key: AnnotationKey) -> Option<bool> {
        self.annotations.get(key).map(Annotation::is_tombstoned)
    }

    /// Physically removes trashed annotations without uncommitted edits. Returns their ids.
    pub fn drop_tombstoned(&mut self) -> Vec<AnnotationId> {
        let droppable = self
            .annotations
            .iter()
            .filter(|(_, annotation)| {
                annotation.is_tombstoned()
                    && !self.pending.contains(annotation.id)
                    && annotation.gesture_start().is_none()
            })
            .map(|(key, _)| key)
            .collect::<Vec<AnnotationKey>>();

        droppable
            .into_iter()
            .filter_map(|key| {
                self.chrono_components.remove(key);
                let annotation = self.annotations.remove(key)?;
                self.ids.remove(&annotation.id);
                Some(annotation.id)
            })
            .collect()
    }

    pub fn keys_unordered(&self) -> Vec<AnnotationKey> {
        self.annotations.keys().collect()
    }

    /// All keys in paint order, trashed annotations included.
    pub fn keys_sorted_chrono(&self) -> Vec<AnnotationKey> {
        self.chrono_components
            .iter()
            .sorted_unstable_by_key(|(_, t)| **t)
            .map(|(key, _)| key)
            .collect()
    }

    /// The keys of live annotations in paint order.
    pub fn keys_as_rendered(&self) -> Vec<AnnotationKey> {
        self.keys_sorted_chrono()
            .into_iter()
            .filter(|key| self.is_tombstoned(*key) == Some(false))
            .collect()
    }

    /// Moves the annotation to the top of the paint order.
    pub fn update_chrono_to_last(&mut self, key: AnnotationKey) {
        if let Some(t) = self.chrono_components.get_mut(key) {
            self.chrono_counter += 1;
            *t = self.chrono_counter;
        }
    }

    /// The validated pixel bounds of a live annotation with own geometry.
    ///
    /// Invalid bounds are logged and treated as if the annotation had none, so one broken annotation does
    /// not prevent processing the others.
    pub fn live_bounds(&self, key: AnnotationKey, viewport: &Viewport) -> Option<Aabb> {
        let annotation = self.annotations.get(key)?;
        if annotation.is_tombstoned() {
            return None;
        }
        let bounds = annotation.bounding_rect(viewport)?;
        if let Err(e) = bounds.assert_valid() {
            warn!(
                "Skipping annotation `{}` with kind `{}`, Err: {e:?}",
                annotation.id,
                annotation.kind.name()
            );
            return None;
        }
        Some(bounds)
    }

    /// The top-most live annotation whose bounds, loosened by the tolerance, contain the position.
    pub fn hit_test(
        &self,
        pos: na::Vector2<f64>,
        viewport: &Viewport,
        tolerance: f64,
    ) -> Option<AnnotationKey> {
        self.keys_sorted_chrono().into_iter().rev().find(|key| {
            self.live_bounds(*key, viewport)
                .map(|bounds| bounds.contains_pos_w_tolerance(pos, tolerance))
                .unwrap_or(false)
        })
    }

    /// The live annotations whose bounds are fully contained in the pixel rect, in paint order.
    pub fn keys_in_rect(&self, rect: Aabb, viewport: &Viewport) -> Vec<AnnotationKey> {
        self.keys_sorted_chrono()
            .into_iter()
            .filter(|key| {
                self.live_bounds(*key, viewport)
                    .map(|bounds| rect.contains(&bounds))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// The render data of all live annotations with own geometry, in paint order.
    pub fn render_items(&self, viewport: &Viewport) -> Vec<RenderItem> {
        self.keys_sorted_chrono()
            .into_iter()
            .filter_map(|key| {
                let bounds = self.live_bounds(key, viewport)?;
                let annotation = self.annotations.get(key)?;
                Some(RenderItem {
                    key,
                    id: annotation.id,
                    kind: annotation.kind.name(),
                    bounds: PixelRect::from_aabb(bounds),
                })
            })
            .collect()
    }

    /// Snapshots of all annotations in paint order, trashed ones included.
    pub fn export_snapshots(&self) -> Vec<Annotation> {
        self.keys_sorted_chrono()
            .into_iter()
            .filter_map(|key| self.annotations.get(key).map(Annotation::snapshot))
            .collect()
    }

    /// Takes the comment thread lifecycle events that happened since the last call.
    pub fn drain_lifecycle_events(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.lifecycle_events)
    }

    fn is_live_thread_item(&self, key: AnnotationKey) -> bool {
        self.annotations
            .get(key)
            .map(|annotation| annotation.kind.is_thread_item() && !annotation.is_tombstoned())
            .unwrap_or(false)
    }

    fn push_lifecycle_transition(&mut self, id: AnnotationId, was_live: bool, key: AnnotationKey) {
        match (was_live, self.is_live_thread_item(key)) {
            (false, true) => self.lifecycle_events.push(LifecycleEvent::Attached(id)),
            (true, false) => self.lifecycle_events.push(LifecycleEvent::Detached(id)),
            _ => {}
        }
    }
}
