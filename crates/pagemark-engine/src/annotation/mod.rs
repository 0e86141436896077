// Modules
pub mod arrow;
pub mod comment;
pub mod geometry;
pub mod highlight;
pub mod image;
pub mod ink;
pub mod shape;
pub mod textbox;

// Re-exports
pub use arrow::ArrowData;
pub use comment::{CommentData, ReplyData};
pub use geometry::{ArrowEnd, Geometry, GeometryLimits, Handle, ResizeCorner};
pub use highlight::{HighlightData, HighlightStyle};
pub use image::ImageData;
pub use ink::InkData;
pub use shape::ShapeData;
pub use textbox::{FontAttrs, TextBoxData};

// Imports
use crate::timestamp::Timestamp;
use p2d::bounding_volume::Aabb;
use pagemark_compose::Viewport;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The stable, opaque id of an annotation, shared across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(uuid::Uuid);

impl AnnotationId {
    /// A new random id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AnnotationId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(uuid::Uuid::parse_str(s)?))
    }
}

/// Flags that are applied from remote updates regardless of their timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename = "annotation_flags")]
pub struct AnnotationFlags {
    /// The annotation failed to sync.
    #[serde(rename = "error")]
    pub error: bool,
    /// The role of the author in the document.
    #[serde(rename = "role")]
    pub role: Option<String>,
}

/// The kind-specific data of an annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnnotationKind {
    #[serde(rename = "ink")]
    Ink(InkData),
    #[serde(rename = "circle")]
    Circle(ShapeData),
    #[serde(rename = "square")]
    Square(ShapeData),
    #[serde(rename = "arrow")]
    Arrow(ArrowData),
    #[serde(rename = "textbox")]
    TextBox(TextBoxData),
    #[serde(rename = "image")]
    Image(ImageData),
    #[serde(rename = "highlight")]
    Highlight(HighlightData),
    #[serde(rename = "comment")]
    Comment(CommentData),
    #[serde(rename = "reply")]
    Reply(ReplyData),
}

impl AnnotationKind {
    /// The serialized names of all kinds.
    pub const NAMES: [&'static str; 9] = [
        "ink",
        "circle",
        "square",
        "arrow",
        "textbox",
        "image",
        "highlight",
        "comment",
        "reply",
    ];

    /// The serialized name of the kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ink(_) => "ink",
            Self::Circle(_) => "circle",
            Self::Square(_) => "square",
            Self::Arrow(_) => "arrow",
            Self::TextBox(_) => "textbox",
            Self::Image(_) => "image",
            Self::Highlight(_) => "highlight",
            Self::Comment(_) => "comment",
            Self::Reply(_) => "reply",
        }
    }

    /// Whether the kind is part of a comment thread.
    pub fn is_thread_item(&self) -> bool {
        matches!(self, Self::Comment(_) | Self::Reply(_))
    }
}

impl Geometry for AnnotationKind {
    fn bounds(&self, viewport: &Viewport) -> Option<Aabb> {
        match self {
            Self::Ink(ink) => ink.bounds(viewport),
            Self::Circle(shape) | Self::Square(shape) => shape.bounds(viewport),
            Self::Arrow(arrow) => arrow.bounds(viewport),
            Self::TextBox(textbox) => textbox.bounds(viewport),
            Self::Image(image) => image.bounds(viewport),
            Self::Highlight(highlight) => highlight.bounds(viewport),
            Self::Comment(comment) => comment.bounds(viewport),
            Self::Reply(reply) => reply.bounds(viewport),
        }
    }

    fn safe_margin(&self, limits: &GeometryLimits) -> f64 {
        match self {
            Self::Ink(ink) => ink.safe_margin(limits),
            Self::Circle(shape) | Self::Square(shape) => shape.safe_margin(limits),
            Self::Arrow(arrow) => arrow.safe_margin(limits),
            Self::TextBox(textbox) => textbox.safe_margin(limits),
            Self::Image(image) => image.safe_margin(limits),
            Self::Highlight(highlight) => highlight.safe_margin(limits),
            Self::Comment(comment) => comment.safe_margin(limits),
            Self::Reply(reply) => reply.safe_margin(limits),
        }
    }

    fn translated(&self, offset: na::Vector2<f64>, limits: &GeometryLimits) -> Self {
        match self {
            Self::Ink(ink) => Self::Ink(ink.translated(offset, limits)),
            Self::Circle(shape) => Self::Circle(shape.translated(offset, limits)),
            Self::Square(shape) => Self::Square(shape.translated(offset, limits)),
            Self::Arrow(arrow) => Self::Arrow(arrow.translated(offset, limits)),
            Self::TextBox(textbox) => Self::TextBox(textbox.translated(offset, limits)),
            Self::Image(image) => Self::Image(image.translated(offset, limits)),
            Self::Highlight(highlight) => Self::Highlight(highlight.translated(offset, limits)),
            Self::Comment(comment) => Self::Comment(comment.translated(offset, limits)),
            Self::Reply(reply) => Self::Reply(reply.translated(offset, limits)),
        }
    }

    fn resized(
        &self,
        corner: ResizeCorner,
        offset: na::Vector2<f64>,
        keep_ratio: bool,
        limits: &GeometryLimits,
    ) -> Self {
        match self {
            Self::Ink(ink) => Self::Ink(ink.resized(corner, offset, keep_ratio, limits)),
            Self::Circle(shape) => Self::Circle(shape.resized(corner, offset, keep_ratio, limits)),
            Self::Square(shape) => Self::Square(shape.resized(corner, offset, keep_ratio, limits)),
            Self::Arrow(arrow) => Self::Arrow(arrow.resized(corner, offset, keep_ratio, limits)),
            Self::TextBox(textbox) => {
                Self::TextBox(textbox.resized(corner, offset, keep_ratio, limits))
            }
            Self::Image(image) => Self::Image(image.resized(corner, offset, keep_ratio, limits)),
            Self::Highlight(highlight) => {
                Self::Highlight(highlight.resized(corner, offset, keep_ratio, limits))
            }
            Self::Comment(comment) => {
                Self::Comment(comment.resized(corner, offset, keep_ratio, limits))
            }
            Self::Reply(reply) => Self::Reply(reply.resized(corner, offset, keep_ratio, limits)),
        }
    }

    fn locks_aspect_ratio(&self) -> bool {
        match self {
            Self::Ink(ink) => ink.locks_aspect_ratio(),
            Self::Circle(shape) | Self::Square(shape) => shape.locks_aspect_ratio(),
            Self::Arrow(arrow) => arrow.locks_aspect_ratio(),
            Self::TextBox(textbox) => textbox.locks_aspect_ratio(),
            Self::Image(image) => image.locks_aspect_ratio(),
            Self::Highlight(highlight) => highlight.locks_aspect_ratio(),
            Self::Comment(comment) => comment.locks_aspect_ratio(),
            Self::Reply(reply) => reply.locks_aspect_ratio(),
        }
    }

    fn snapped(&self, margin: f64, handle: Handle, limits: &GeometryLimits) -> Self {
        match self {
            Self::Ink(ink) => Self::Ink(ink.snapped(margin, handle, limits)),
            Self::Circle(shape) => Self::Circle(shape.snapped(margin, handle, limits)),
            Self::Square(shape) => Self::Square(shape.snapped(margin, handle, limits)),
            Self::Arrow(arrow) => Self::Arrow(arrow.snapped(margin, handle, limits)),
            Self::TextBox(textbox) => Self::TextBox(textbox.snapped(margin, handle, limits)),
            Self::Image(image) => Self::Image(image.snapped(margin, handle, limits)),
            Self::Highlight(highlight) => Self::Highlight(highlight.snapped(margin, handle, limits)),
            Self::Comment(comment) => Self::Comment(comment.snapped(margin, handle, limits)),
            Self::Reply(reply) => Self::Reply(reply.snapped(margin, handle, limits)),
        }
    }
}

/// The geometry remembered at gesture start, which all mutations of the gesture are applied to.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureStart {
    pub kind: AnnotationKind,
    pub limits: GeometryLimits,
    /// The pixel bounds at gesture start.
    pub bounds: Option<Aabb>,
}

/// An annotation on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "annotation")]
pub struct Annotation {
    #[serde(rename = "id")]
    pub id: AnnotationId,
    /// Advances with every accepted local or merged remote edit.
    #[serde(rename = "added_at")]
    pub added_at: Timestamp,
    /// Set when the annotation is trashed. Trashed annotations are kept for undo and sync.
    #[serde(default, rename = "deleted_at")]
    pub deleted_at: Option<Timestamp>,
    #[serde(default, rename = "author_id")]
    pub author_id: String,
    #[serde(default, rename = "flags")]
    pub flags: AnnotationFlags,
    #[serde(rename = "kind")]
    pub kind: AnnotationKind,
    #[serde(skip)]
    start: Option<GestureStart>,
}

impl Annotation {
    /// A new annotation with a fresh id.
    pub fn new(kind: AnnotationKind, author_id: impl Into<String>, added_at: Timestamp) -> Self {
        Self {
            id: AnnotationId::new(),
            added_at,
            deleted_at: None,
            author_id: author_id.into(),
            flags: AnnotationFlags::default(),
            kind,
            start: None,
        }
    }

    /// A copy without gesture state, as handed to the change log and sync.
    pub fn snapshot(&self) -> Self {
        Self {
            start: None,
            ..self.clone()
        }
    }

    /// Whether the annotation is trashed.
    pub fn is_tombstoned(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// The bounding rect in pixels. None for annotations without own geometry.
    pub fn bounding_rect(&self, viewport: &Viewport) -> Option<Aabb> {
        self.kind.bounds(viewport)
    }

    /// Snapshots the current geometry. Following mutations of the gesture are computed against this snapshot.
    pub fn remember_start(&mut self, limits: GeometryLimits) {
        self.start = Some(GestureStart {
            bounds: self.kind.bounds(&limits.viewport),
            kind: self.kind.clone(),
            limits,
        });
    }

    /// The remembered gesture start, if a gesture is in progress.
    pub fn gesture_start(&self) -> Option<&GestureStart> {
        self.start.as_ref()
    }

    /// Ends the gesture, forgetting the remembered start.
    pub fn finish_gesture(&mut self) {
        self.start = None;
    }

    /// Moves by the total pointer displacement of the gesture, in pixels.
    ///
    /// # Panics
    ///
    /// Panics when no gesture start was remembered.
    pub fn move_by(&mut self, offset: na::Vector2<f64>) {
        let start = self.expect_start("move");
        self.kind = start.kind.translated(offset, &start.limits);
    }

    /// Resizes by dragging the corner by the total pointer displacement of the gesture.
    ///
    /// `proportional` is the modifier state, kinds that lock their aspect ratio invert it.
    ///
    /// # Panics
    ///
    /// Panics when no gesture start was remembered.
    pub fn resize(&mut self, corner: ResizeCorner, offset: na::Vector2<f64>, proportional: bool) {
        let start = self.expect_start("resize");
        let keep_ratio = proportional != start.kind.locks_aspect_ratio();
        self.kind = start.kind.resized(corner, offset, keep_ratio, &start.limits);
    }

    /// Moves a single endpoint of an arrow. Does nothing for other kinds.
    ///
    /// # Panics
    ///
    /// Panics when no gesture start was remembered.
    pub fn point(&mut self, end: ArrowEnd, offset: na::Vector2<f64>) {
        let start = self.expect_start("point");
        match &start.kind {
            AnnotationKind::Arrow(arrow) => {
                self.kind =
                    AnnotationKind::Arrow(arrow.with_endpoint_moved(end, offset, &start.limits));
            }
            other => debug!(
                "Moving an endpoint of annotation `{}` with kind `{}` has no effect",
                self.id,
                other.name()
            ),
        }
    }

    /// Pulls the annotation back inside the page, adjusting what the handle controls.
    ///
    /// The effective margin is never smaller than the annotation's own safe margin.
    pub fn snap_to_bounds(&mut self, margin: f64, handle: Handle, limits: &GeometryLimits) {
        let margin = margin.max(self.kind.safe_margin(limits));
        self.kind = self.kind.snapped(margin, handle, limits);
    }

    fn expect_start(&self, operation: &str) -> GestureStart {
        match &self.start {
            Some(start) => start.clone(),
            None => panic!(
                "`{operation}` of annotation `{}` called without a remembered gesture start",
                self.id
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pagemark_compose::coordspace;
    use pagemark_compose::{Color, NormalizedRect};

    fn limits() -> GeometryLimits {
        GeometryLimits {
            viewport: Viewport::new(1000.0, 1000.0, 1.0),
            min_safe_margin: 1.0,
            min_size: 8.0,
        }
    }

    fn square() -> Annotation {
        Annotation::new(
            AnnotationKind::Square(ShapeData {
                rect: NormalizedRect::new(0.10, 0.10, 0.30, 0.30),
                line_width: 20.0,
                color: Color::RED,
            }),
            "author",
            Timestamp::from_millis(1),
        )
    }

    fn rect_of(annotation: &Annotation) -> NormalizedRect {
        match &annotation.kind {
            AnnotationKind::Square(shape) => shape.rect,
            _ => unreachable!(),
        }
    }

    #[test]
    fn repeated_moves_do_not_compound() {
        let mut annotation = square();
        annotation.remember_start(limits());

        annotation.move_by(na::vector![50.0, 0.0]);
        annotation.move_by(na::vector![50.0, 0.0]);
        let rect = coordspace::rect_to_pixels(&rect_of(&annotation), &limits().viewport);
        assert_relative_eq!(rect.left, 150.0, epsilon = 1e-9);
    }

    #[test]
    fn scenario_move_is_clamped() {
        let mut annotation = square();
        annotation.remember_start(limits());
        annotation.move_by(na::vector![950.0, 0.0]);

        let rect = coordspace::rect_to_pixels(&rect_of(&annotation), &limits().viewport);
        assert_relative_eq!(rect.left, 790.0, epsilon = 1e-9);
        assert!(rect.right() <= 990.0 + 1e-9);
    }

    #[test]
    fn snap_margin_is_at_least_the_safe_margin() {
        let mut annotation = square();
        if let AnnotationKind::Square(shape) = &mut annotation.kind {
            shape.rect = NormalizedRect::new(0.0, 0.10, 0.20, 0.30);
        }

        annotation.snap_to_bounds(0.0, Handle::Move, &limits());
        let rect = coordspace::rect_to_pixels(&rect_of(&annotation), &limits().viewport);
        assert_relative_eq!(rect.left, 10.0, epsilon = 1e-9);
        assert_relative_eq!(rect.width, 200.0, epsilon = 1e-9);

        annotation.snap_to_bounds(30.0, Handle::Move, &limits());
        let rect = coordspace::rect_to_pixels(&rect_of(&annotation), &limits().viewport);
        assert_relative_eq!(rect.left, 30.0, epsilon = 1e-9);
    }

    #[test]
    #[should_panic]
    fn move_without_start_panics() {
        let mut annotation = square();
        annotation.move_by(na::vector![1.0, 1.0]);
    }

    #[test]
    fn images_lock_aspect_ratio_unless_modifier() {
        let mut image = Annotation::new(
            AnnotationKind::Image(ImageData {
                rect: NormalizedRect::new(0.1, 0.1, 0.3, 0.2),
                content_ref: String::from("img"),
            }),
            "author",
            Timestamp::from_millis(1),
        );
        image.remember_start(limits());

        image.resize(ResizeCorner::BottomRight, na::vector![200.0, 0.0], false);
        let AnnotationKind::Image(data) = &image.kind else {
            unreachable!()
        };
        let rect = coordspace::rect_to_pixels(&data.rect, &limits().viewport);
        assert_relative_eq!(rect.width / rect.height, 2.0, epsilon = 1e-6);

        image.resize(ResizeCorner::BottomRight, na::vector![200.0, 0.0], true);
        let AnnotationKind::Image(data) = &image.kind else {
            unreachable!()
        };
        let rect = coordspace::rect_to_pixels(&data.rect, &limits().viewport);
        assert_relative_eq!(rect.height, 100.0, epsilon = 1e-6);
    }

    #[test]
    fn serialized_kind_is_tagged() {
        let mut original = square();
        original.remember_start(limits());
        let json = serde_json::to_value(&original).unwrap();
        assert_eq!(json["kind"]["type"], "square");
        assert!(json.get("start").is_none());

        let back: Annotation = serde_json::from_value(json).unwrap();
        assert_eq!(back, original.snapshot());
    }
}
