/// Grid geometry: cardinal move directions and integer cell coordinates.
///
/// The player's position is a continuous `Vec3` (x/z are the horizontal
/// grid axes, y is stack height), but motion happens in unit steps between
/// cell centers, which sit at integer x/z. Arrival snaps the position
/// exactly onto the center, so converting back to a `GridPoint` is a plain
/// round — no epsilon scans needed for set membership.

use glam::Vec3;

/// Distance below which the player counts as arrived at the target cell
/// (and is snapped onto its center).
pub const ARRIVE_EPS: f32 = 0.1;

/// A cardinal move direction. Forward is +Z, Right is +X.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Forward,
    Back,
    Left,
    Right,
}

impl MoveDir {
    /// Fixed scan order for push-obstacle redirection.
    pub const SCAN_ORDER: [MoveDir; 4] =
        [MoveDir::Forward, MoveDir::Back, MoveDir::Left, MoveDir::Right];

    /// Unit step vector in world space.
    pub fn unit(self) -> Vec3 {
        match self {
            MoveDir::Forward => Vec3::Z,
            MoveDir::Back => Vec3::NEG_Z,
            MoveDir::Left => Vec3::NEG_X,
            MoveDir::Right => Vec3::X,
        }
    }

    pub fn opposite(self) -> MoveDir {
        match self {
            MoveDir::Forward => MoveDir::Back,
            MoveDir::Back => MoveDir::Forward,
            MoveDir::Left => MoveDir::Right,
            MoveDir::Right => MoveDir::Left,
        }
    }

    /// Back and Left re-attempt the move when stranded on a line tile
    /// without bricks; Forward and Right stop instead.
    pub fn is_retreat_safe(self) -> bool {
        matches!(self, MoveDir::Back | MoveDir::Left)
    }
}

/// An integer cell coordinate on the horizontal plane.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GridPoint {
    pub x: i32,
    pub z: i32,
}

impl GridPoint {
    pub fn new(x: i32, z: i32) -> Self {
        GridPoint { x, z }
    }

    /// Cell containing a world-space point.
    pub fn from_world(p: Vec3) -> Self {
        GridPoint {
            x: p.x.round() as i32,
            z: p.z.round() as i32,
        }
    }

    /// Center of this cell at the given height.
    pub fn to_world(self, y: f32) -> Vec3 {
        Vec3::new(self.x as f32, y, self.z as f32)
    }

    /// Neighbor cell one step in the given direction.
    pub fn step(self, dir: MoveDir) -> Self {
        let v = dir.unit();
        GridPoint {
            x: self.x + v.x as i32,
            z: self.z + v.z as i32,
        }
    }
}

/// Constant-speed step toward `target`, never overshooting.
pub fn move_towards(from: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let delta = target - from;
    let dist = delta.length();
    if dist <= max_delta || dist <= f32::EPSILON {
        target
    } else {
        from + delta / dist * max_delta
    }
}
