// Imports
use crate::annotation::Annotation;

/// Decides whether the local user may mutate an annotation.
///
/// Consulted before every mutating call. A denial silently skips the annotation.
pub trait PermissionOracle: std::fmt::Debug {
    /// Whether the annotation may be moved, resized or erased from.
    fn can_manage(&self, annotation: &Annotation) -> bool;

    /// Whether the annotation may be trashed.
    fn can_delete(&self, annotation: &Annotation) -> bool;
}

/// Permits everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PermissionOracle for AllowAll {
    fn can_manage(&self, _annotation: &Annotation) -> bool {
        true
    }

    fn can_delete(&self, _annotation: &Annotation) -> bool {
        true
    }
}

/// Permits mutating only the annotations authored by the given user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorOnly {
    pub author_id: String,
}

impl AuthorOnly {
    pub fn new(author_id: impl Into<String>) -> Self {
        Self {
            author_id: author_id.into(),
        }
    }
}

impl PermissionOracle for AuthorOnly {
    fn can_manage(&self, annotation: &Annotation) -> bool {
        annotation.author_id == self.author_id
    }

    fn can_delete(&self, annotation: &Annotation) -> bool {
        annotation.author_id == self.author_id
    }
}
