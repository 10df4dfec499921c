/// Events emitted during a controller update.
/// The orchestrator and presentation layer consume these.

use crate::domain::grid::{GridPoint, MoveDir};

#[derive(Clone, Copy, Debug)]
pub enum GameEvent {
    /// A brick was granted at a freshly visited brick cell.
    BrickPicked { cell: GridPoint },
    /// A line cell was crossed for the first time; `paid` is false when the
    /// stacking-policy floor turned the pop into a no-op.
    LineConsumed { cell: GridPoint, paid: bool },
    /// A brick pop re-revealed this many hidden line groups.
    LineGroupsRestored { count: usize },
    /// A pushable obstacle redirected the move direction.
    PushRedirected { from: MoveDir, to: MoveDir },
    /// The destination cell was reached; fired exactly once per level.
    DestinationReached,
}
