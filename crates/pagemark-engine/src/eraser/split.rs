// Imports
use pagemark_compose::ext::Vector2Ext;
use pagemark_compose::shapes::{Circle, CrossingKind};

/// The outcome of erasing a path with an eraser circle.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitOutcome {
    /// The circle does not touch the path.
    Untouched,
    /// Nothing of the path survives.
    Removed,
    /// The surviving sub-paths, in path order.
    ///
    /// Sub-paths start and end exactly at the cut points on the circle boundary.
    Pieces(Vec<Vec<na::Vector2<f64>>>),
}

/// Cuts the circle out of the pixel path.
///
/// The path is walked segment by segment. Endpoints inside the circle are dropped and every crossing of the
/// circle boundary becomes a cut point: entering the circle closes the current sub-path at the crossing, leaving
/// it starts a new one there. Degenerate sub-paths with less than two points are discarded.
pub fn split_path(points: &[na::Vector2<f64>], circle: &Circle) -> SplitOutcome {
    let (first, rest) = match points {
        [] => return SplitOutcome::Untouched,
        [single] => {
            return if circle.contains(*single) {
                SplitOutcome::Removed
            } else {
                SplitOutcome::Untouched
            };
        }
        [first, rest @ ..] => (*first, rest),
    };

    let mut touched = false;
    let mut pieces = Vec::new();
    let mut current = Vec::new();

    if circle.contains(first) {
        touched = true;
    } else {
        current.push(first);
    }

    let mut start = first;
    for &end in rest {
        for crossing in circle.segment_crossings(start, end) {
            touched = true;
            push_point(&mut current, crossing.pos);
            if crossing.kind == CrossingKind::Enter {
                close_piece(&mut pieces, &mut current);
            }
        }

        if circle.contains(end) {
            touched = true;
        } else {
            push_point(&mut current, end);
        }
        start = end;
    }

    if !touched {
        return SplitOutcome::Untouched;
    }
    close_piece(&mut pieces, &mut current);

    if pieces.is_empty() {
        SplitOutcome::Removed
    } else {
        SplitOutcome::Pieces(pieces)
    }
}

/// Pushes the point, skipping it if it coincides with the previous one.
///
/// Crossings computed at a segment end can land on the end point itself.
fn push_point(current: &mut Vec<na::Vector2<f64>>, pos: na::Vector2<f64>) {
    if current.last().map(|last| last.approx_eq(&pos)).unwrap_or(false) {
        return;
    }
    current.push(pos);
}

fn close_piece(pieces: &mut Vec<Vec<na::Vector2<f64>>>, current: &mut Vec<na::Vector2<f64>>) {
    let piece = std::mem::take(current);
    if piece.len() > 1 {
        pieces.push(piece);
    }
}
