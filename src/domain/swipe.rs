/// Swipe resolution: a pointer-down / pointer-up pair becomes a cardinal
/// move command, or nothing when the net vector is degenerate.
///
/// Pure function, no side effects; the tracking of the pending press
/// position lives in the input layer.
///
/// Axis convention is y-up: a swipe with positive y resolves Forward.
/// Terminal rows grow downward, so the input layer negates row deltas
/// before calling in here.

use glam::Vec2;

use super::grid::MoveDir;

/// Resolve the gesture from press position to release position.
///
/// The larger-magnitude axis wins; an exact tie goes to the horizontal
/// axis.
pub fn resolve(down: Vec2, up: Vec2) -> Option<MoveDir> {
    let swipe = up - down;
    if swipe == Vec2::ZERO {
        return None;
    }

    if swipe.x.abs() >= swipe.y.abs() {
        Some(if swipe.x > 0.0 { MoveDir::Right } else { MoveDir::Left })
    } else {
        Some(if swipe.y > 0.0 { MoveDir::Forward } else { MoveDir::Back })
    }
}
