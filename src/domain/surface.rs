/// Surface categories and query masks.
///
/// Every cell of a level carries exactly one surface category; spatial
/// queries filter by a mask of categories, mirroring layered raycasts.

/// What a grid cell is, as far as the player controller cares.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Surface {
    /// Collectible support block; grants a brick on first visit.
    Brick,
    /// Plain solid ground, nothing to collect.
    Ground,
    /// Pay tile: consumes one brick on first crossing, hides its group.
    Line,
    /// Decorative pre-destination tile.
    WinPos,
    /// Level goal.
    Destination,
    /// Blocking obstacle that may be bypassed via lateral redirection.
    Pushable,
}

impl Surface {
    const fn bit(self) -> u8 {
        match self {
            Surface::Brick => 1 << 0,
            Surface::Ground => 1 << 1,
            Surface::Line => 1 << 2,
            Surface::WinPos => 1 << 3,
            Surface::Destination => 1 << 4,
            Surface::Pushable => 1 << 5,
        }
    }
}

/// A set of surface categories for layered queries.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SurfaceMask(u8);

impl SurfaceMask {
    pub const BRICK: SurfaceMask = SurfaceMask(Surface::Brick.bit());
    pub const GROUND: SurfaceMask = SurfaceMask(Surface::Ground.bit());
    pub const LINE: SurfaceMask = SurfaceMask(Surface::Line.bit());
    pub const WIN_POS: SurfaceMask = SurfaceMask(Surface::WinPos.bit());
    pub const DESTINATION: SurfaceMask = SurfaceMask(Surface::Destination.bit());
    pub const PUSHABLE: SurfaceMask = SurfaceMask(Surface::Pushable.bit());

    /// Every category a move command may target.
    pub const WALKABLE: SurfaceMask = Self::BRICK
        .union(Self::GROUND)
        .union(Self::LINE)
        .union(Self::WIN_POS)
        .union(Self::DESTINATION)
        .union(Self::PUSHABLE);

    pub const fn union(self, other: SurfaceMask) -> SurfaceMask {
        SurfaceMask(self.0 | other.0)
    }

    pub fn contains(self, surface: Surface) -> bool {
        self.0 & surface.bit() != 0
    }
}

impl std::ops::BitOr for SurfaceMask {
    type Output = SurfaceMask;

    fn bitor(self, rhs: SurfaceMask) -> SurfaceMask {
        self.union(rhs)
    }
}
