// Imports
use super::{AnnotationKey, AnnotationStore};
use crate::annotation::{Annotation, AnnotationKind};
use tracing::{debug, warn};

/// The outcome of merging a remote snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The annotation was unknown and got inserted.
    Inserted(AnnotationKey),
    /// The remote snapshot was newer and replaced the local annotation.
    Replaced(AnnotationKey),
    /// The remote snapshot was not newer. Only its flags were applied.
    Ignored(AnnotationKey),
}

/// Errors when importing remote annotation snapshots.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("expected a JSON array of annotations")]
    NotAnArray,
    #[error("annotation has no kind type")]
    MissingKind,
    #[error("unrecognized annotation kind `{0}`")]
    UnknownKind(String),
    #[error("malformed annotation JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Counts of an import pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub inserted: usize,
    pub replaced: usize,
    pub ignored: usize,
    pub skipped: usize,
}

/// Deserializes a single annotation snapshot, rejecting unknown kinds before looking at the rest.
pub fn annotation_from_json(value: serde_json::Value) -> Result<Annotation, ImportError> {
    let kind = value
        .get("kind")
        .and_then(|kind| kind.get("type"))
        .and_then(|kind_type| kind_type.as_str())
        .ok_or(ImportError::MissingKind)?;
    if !AnnotationKind::NAMES.contains(&kind) {
        return Err(ImportError::UnknownKind(kind.to_string()));
    }

    Ok(serde_json::from_value(value)?)
}

impl AnnotationStore {
    /// Merges a snapshot coming from the sync collaborator.
    ///
    /// Last write wins: the snapshot replaces the local annotation only when its `added_at` is strictly newer.
    /// The flags are applied in any case.
    pub fn merge_remote(&mut self, remote: Annotation) -> MergeOutcome {
        let remote = remote.snapshot();
        self.stamper.observe(remote.added_at);
        if let Some(deleted_at) = remote.deleted_at {
            self.stamper.observe(deleted_at);
        }

        let Some(key) = self.key_for_id(remote.id) else {
            return MergeOutcome::Inserted(self.insert(remote));
        };
        let Some(local) = self.annotations.get_mut(key) else {
            return MergeOutcome::Inserted(self.insert(remote));
        };

        local.flags = remote.flags.clone();
        if remote.added_at <= local.added_at {
            debug!(
                "Ignoring remote update of annotation `{}`, remote {} is not newer than local {}",
                remote.id, remote.added_at, local.added_at
            );
            return MergeOutcome::Ignored(key);
        }
        let gesture_limits = local.gesture_start().map(|start| start.limits);
        let id = remote.id;
        let key = self.insert(remote);

        // The rest of the gesture is applied to the remote geometry.
        if let Some(limits) = gesture_limits {
            debug!("Remote update of annotation `{id}` replaces its gesture start");
            if let Some(replaced) = self.annotations.get_mut(key) {
                replaced.remember_start(limits);
            }
        }

        MergeOutcome::Replaced(key)
    }

    /// Imports a JSON array of remote snapshots.
    ///
    /// Unrecognized kinds and malformed entries are logged and skipped without aborting the import.
    pub fn import_remote_json(&mut self, json: &str) -> Result<ImportReport, ImportError> {
        let values = match serde_json::from_str::<serde_json::Value>(json)? {
            serde_json::Value::Array(values) => values,
            _ => return Err(ImportError::NotAnArray),
        };
        let mut report = ImportReport::default();

        for (i, value) in values.into_iter().enumerate() {
            match annotation_from_json(value) {
                Ok(annotation) => match self.merge_remote(annotation) {
                    MergeOutcome::Inserted(_) => report.inserted += 1,
                    MergeOutcome::Replaced(_) => report.replaced += 1,
                    MergeOutcome::Ignored(_) => report.ignored += 1,
                },
                Err(e) => {
                    warn!("Skipping annotation at index {i} while importing, Err: {e}");
                    report.skipped += 1;
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationFlags, GeometryLimits, ShapeData};
    use crate::timestamp::Timestamp;
    use approx::assert_relative_eq;
    use pagemark_compose::{Color, NormalizedRect, Viewport};

    fn square(at: i64, left: f64) -> Annotation {
        Annotation::new(
            AnnotationKind::Square(ShapeData {
                rect: NormalizedRect::new(left, 0.1, left + 0.2, 0.3),
                line_width: 2.0,
                color: Color::RED,
            }),
            "author",
            Timestamp::from_millis(at),
        )
    }

    #[test]
    fn last_write_wins() {
        let mut store = AnnotationStore::default();
        let local = square(2000, 0.1);
        let id = local.id;
        let key = match store.merge_remote(local.clone()) {
            MergeOutcome::Inserted(key) => key,
            other => panic!("unexpected outcome {other:?}"),
        };

        let mut older = square(1000, 0.5);
        older.id = id;
        older.flags = AnnotationFlags {
            error: true,
            role: Some(String::from("viewer")),
        };
        assert_eq!(store.merge_remote(older), MergeOutcome::Ignored(key));
        let merged = store.get(key).unwrap();
        assert_eq!(merged.kind, local.kind);
        assert!(merged.flags.error);

        let mut newer = square(3000, 0.5);
        newer.id = id;
        assert_eq!(store.merge_remote(newer.clone()), MergeOutcome::Replaced(key));
        assert_eq!(store.get(key).unwrap().kind, newer.kind);
        assert_eq!(store.get(key).unwrap().added_at, Timestamp::from_millis(3000));
    }

    #[test]
    fn equal_timestamps_are_ignored() {
        let mut store = AnnotationStore::default();
        let local = square(2000, 0.1);
        let key = store.insert(local.clone());

        let mut same = square(2000, 0.6);
        same.id = local.id;
        assert_eq!(store.merge_remote(same), MergeOutcome::Ignored(key));
        assert_eq!(store.get(key).unwrap().kind, local.kind);
    }

    #[test]
    fn replacement_during_a_gesture_keeps_a_gesture_start() {
        let limits = GeometryLimits {
            viewport: Viewport::new(1000.0, 1000.0, 1.0),
            min_safe_margin: 1.0,
            min_size: 8.0,
        };
        let mut store = AnnotationStore::default();
        let local = square(2000, 0.1);
        let key = store.insert(local.clone());
        store.get_mut(key).unwrap().remember_start(limits);

        let mut newer = square(3000, 0.5);
        newer.id = local.id;
        assert_eq!(store.merge_remote(newer.clone()), MergeOutcome::Replaced(key));

        let start = store.get(key).unwrap().gesture_start().unwrap().clone();
        assert_eq!(start.kind, newer.kind);
        assert_eq!(start.limits, limits);

        // Moving after the merge moves the remote geometry.
        let annotation = store.get_mut(key).unwrap();
        annotation.move_by(na::vector![10.0, 0.0]);
        let bounds = annotation.bounding_rect(&limits.viewport).unwrap();
        assert_relative_eq!(bounds.mins, na::point![509.0, 99.0], epsilon = 1e-9);
    }

    #[test]
    fn import_skips_unknown_and_malformed() {
        let mut store = AnnotationStore::default();
        let valid = serde_json::to_value(square(1000, 0.1)).unwrap();
        let json = serde_json::json!([
            valid,
            { "id": "7f6c3c34-9a4b-4c2e-8a54-0d5d1f4b3c21", "added_at": 1, "kind": { "type": "sticker" } },
            { "id": "not-a-uuid", "added_at": 1, "kind": { "type": "square" } }
        ]);

        let report = store.import_remote_json(&json.to_string()).unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(store.len(), 1);

        assert!(matches!(
            store.import_remote_json("{}"),
            Err(ImportError::NotAnArray)
        ));
    }

    #[test]
    fn unknown_kind_is_reported() {
        let value = serde_json::json!({ "kind": { "type": "sticker" } });
        assert!(matches!(
            annotation_from_json(value),
            Err(ImportError::UnknownKind(kind)) if kind == "sticker"
        ));
    }
}
