/// The player movement & brick-economy controller.
///
/// One state machine drives everything:
///
///   Idle --(valid swipe)--> Moving --(arrive at destination)--> Completed
///     ^                        |
///     +------(blocked)---------+
///
/// Arrival processing order (every snap onto a cell center):
///   1. destination check — win cue, completion sequence, latch, return
///   2. tile settlement   — brick pickup / line consumption at this cell
///   3. stranded-on-line rule — out of bricks on a line: retreat-safe
///      directions re-resolve the same direction, others stop
///   4. look-ahead        — extend the target one more cell if walkable,
///      redirecting around pushable obstacles
///
/// Collaborators are injected per call (`SpatialQuery`, `SceneOps`); the
/// controller owns only its ledger and tracking sets, which live for one
/// level and are wiped atomically by `initialize()`.

use std::collections::HashSet;

use glam::Vec3;

use crate::config::PlayerConfig;
use crate::domain::grid::{self, GridPoint, MoveDir, ARRIVE_EPS};
use crate::domain::services::{
    AnimationCue, EffectHandle, GroupId, Hit, ObjectHandle, Pose, SceneOps, SpatialQuery,
};
use crate::domain::stack::BrickStack;
use crate::domain::surface::SurfaceMask;
use super::event::GameEvent;

/// How far below a probe point a surface may sit and still count.
const PROBE_REACH: f32 = 5.0;

/// Fixed facing applied after destination completion (toward the chest
/// decoration, when the level has one; purely cosmetic).
const WIN_YAW_DEG: f32 = -145.0;

/// Euler rotation for spawned brick instances, from the brick prefab.
const BRICK_ROTATION: Vec3 = Vec3::new(-90.0, 0.0, 180.0);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Motion {
    Idle,
    Moving,
    /// Terminal once the destination is reached; only `initialize()`
    /// re-enters the machine.
    Completed,
}

pub struct PlayerController {
    position: Vec3,
    target: Vec3,
    move_dir: Option<MoveDir>,
    motion: Motion,
    facing_yaw: f32,

    stack: BrickStack,
    /// Established by `initialize()`; asserted present afterwards.
    stack_root: Option<ObjectHandle>,

    /// Cells whose brick was already granted this level.
    visited: HashSet<GridPoint>,
    /// Line cells already paid for this level.
    consumed_lines: HashSet<GridPoint>,
    /// Line groups seen by probes / hidden by settlement; restored
    /// wholesale on the next brick pop.
    revealed_groups: HashSet<GroupId>,

    win_effect: Option<EffectHandle>,

    move_speed: f32,
    minimum_stack_height: usize,
}

impl PlayerController {
    pub fn new(cfg: &PlayerConfig) -> Self {
        PlayerController {
            position: Vec3::ZERO,
            target: Vec3::ZERO,
            move_dir: None,
            motion: Motion::Idle,
            facing_yaw: 0.0,
            stack: BrickStack::new(cfg.brick_height, cfg.minimum_stack_height),
            stack_root: None,
            visited: HashSet::new(),
            consumed_lines: HashSet::new(),
            revealed_groups: HashSet::new(),
            win_effect: None,
            move_speed: cfg.move_speed,
            minimum_stack_height: cfg.minimum_stack_height,
        }
    }

    // ── Accessors ──

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn cell(&self) -> GridPoint {
        GridPoint::from_world(self.position)
    }

    pub fn motion(&self) -> Motion {
        self.motion
    }

    pub fn move_dir(&self) -> Option<MoveDir> {
        self.move_dir
    }

    pub fn brick_count(&self) -> usize {
        self.stack.len()
    }

    pub fn facing_yaw(&self) -> f32 {
        self.facing_yaw
    }

    /// Assign the visual effect fired at destination completion.
    /// The orchestrator calls this before play.
    pub fn set_visual_effect(&mut self, effect: EffectHandle) {
        self.win_effect = Some(effect);
    }

    // ── Lifecycle ──

    /// Atomic per-level reset: destroy owned instances, wipe the ledger and
    /// all tracking sets, re-anchor the stack root, place the player at the
    /// spawn cell at ground height. A caller never observes a partial reset.
    pub fn initialize(&mut self, spawn: GridPoint, scene: &mut dyn SceneOps) {
        for handle in self.stack.clear() {
            scene.destroy(handle);
        }
        if let Some(root) = self.stack_root.take() {
            scene.destroy(root);
        }
        self.visited.clear();
        self.consumed_lines.clear();
        self.revealed_groups.clear();

        self.position = spawn.to_world(0.0);
        self.target = self.position;
        self.move_dir = None;
        self.motion = Motion::Idle;
        self.facing_yaw = 0.0;

        self.stack_root = Some(scene.spawn_stack_root(self.position));
    }

    // ── Swipe entry ──

    /// Accept a resolved swipe while idle. Returns true when the command is
    /// valid and motion begins; an invalid target is silently ignored.
    pub fn try_move(&mut self, dir: MoveDir, spatial: &dyn SpatialQuery) -> bool {
        if self.motion != Motion::Idle {
            return false;
        }
        if self.resolve_target(dir, spatial) {
            self.move_dir = Some(dir);
            true
        } else {
            false
        }
    }

    /// Re-run target resolution for `dir` from the current cell. Walkability
    /// is decided now, not at arrival.
    fn resolve_target(&mut self, dir: MoveDir, spatial: &dyn SpatialQuery) -> bool {
        let target_cell = self.cell().step(dir);
        if self.probe(spatial, target_cell, SurfaceMask::WALKABLE).is_none() {
            return false;
        }
        self.target = target_cell.to_world(self.position.y);
        self.motion = Motion::Moving;
        true
    }

    // ── Tick update ──

    /// Advance one time step. The host loop calls this once per tick with
    /// the elapsed delta; `world` is the scene acting as both services.
    pub fn update<W: SpatialQuery + SceneOps>(
        &mut self,
        dt: f32,
        world: &mut W,
        events: &mut Vec<GameEvent>,
    ) {
        if self.motion != Motion::Moving {
            return;
        }
        debug_assert!(
            self.stack_root.is_some(),
            "initialize() must run before update()"
        );

        self.position = grid::move_towards(self.position, self.target, self.move_speed * dt);
        if self.position.distance(self.target) >= ARRIVE_EPS {
            return;
        }
        // Exact snap: keeps cell-membership tests exact, no drift.
        self.position = self.target;
        self.on_arrival(world, events);
    }

    fn on_arrival<W: SpatialQuery + SceneOps>(
        &mut self,
        world: &mut W,
        events: &mut Vec<GameEvent>,
    ) {
        let cell = self.cell();

        // 1. Destination: completion runs at most once, latched by the
        // Completed state.
        if self
            .query_down(&*world, cell, SurfaceMask::DESTINATION)
            .is_some()
        {
            world.trigger_cue(AnimationCue::TriggerWin);
            self.complete_destination(world, events);
            self.motion = Motion::Completed;
            return;
        }

        // 2. Settlement for the cell the player now occupies. Whether it is
        // a line cell is decided here: settlement hides the crossed group,
        // so a later query against this cell would miss.
        let on_line = self.settle_tile(cell, world, events);

        let dir = match self.move_dir {
            Some(d) => d,
            None => {
                self.stop(world);
                return;
            }
        };

        // 3. Stranded on a line without the bricks to pay for it: retreat-safe
        // directions redo direction resolution, the others stop.
        if on_line && self.stack.len() <= self.minimum_stack_height {
            if dir.is_retreat_safe() && self.resolve_target(dir, &*world) {
                return;
            }
            self.stop(world);
            return;
        }

        // 4. Look ahead one cell; keep rolling while the surface holds.
        let next = cell.step(dir);
        if self.probe(&*world, next, SurfaceMask::WALKABLE).is_none() {
            self.stop(world);
            return;
        }

        if self
            .query_down(&*world, next, SurfaceMask::PUSHABLE)
            .is_some()
        {
            match self.find_push_detour(next, &*world) {
                Some(detour) => {
                    events.push(GameEvent::PushRedirected { from: dir, to: detour });
                    self.move_dir = Some(detour);
                    self.target = cell.step(detour).to_world(self.position.y);
                    world.trigger_cue(AnimationCue::SetMoving(true));
                }
                // No detour: the push is inert, a plain blocking obstacle.
                None => self.stop(world),
            }
        } else {
            self.target = next.to_world(self.position.y);
            world.trigger_cue(AnimationCue::SetMoving(true));
        }
    }

    fn stop(&mut self, scene: &mut dyn SceneOps) {
        self.motion = Motion::Idle;
        self.move_dir = None;
        scene.trigger_cue(AnimationCue::SetMoving(false));
    }

    // ── Queries ──

    fn query_down(
        &self,
        spatial: &dyn SpatialQuery,
        cell: GridPoint,
        mask: SurfaceMask,
    ) -> Option<Hit> {
        spatial.query_downward(cell.to_world(self.position.y), mask, PROBE_REACH)
    }

    /// Read-then-mark walkability probe: a line group discovered here is
    /// recorded as already counted, so validity and settlement can inspect
    /// the same tile within one tick without double effects.
    fn probe(
        &mut self,
        spatial: &dyn SpatialQuery,
        cell: GridPoint,
        mask: SurfaceMask,
    ) -> Option<Hit> {
        if let Some(hit) = self.query_down(spatial, cell, SurfaceMask::LINE) {
            if let Some(group) = hit.group {
                self.revealed_groups.insert(group);
            }
        }
        self.query_down(spatial, cell, mask)
    }

    // ── Settlement ──

    /// Settle the occupied cell; returns whether it carries a line marker.
    /// The line is queried before its group is hidden, so the caller can
    /// still act on the answer afterwards.
    fn settle_tile<W: SpatialQuery + SceneOps>(
        &mut self,
        cell: GridPoint,
        world: &mut W,
        events: &mut Vec<GameEvent>,
    ) -> bool {
        // Brick pickup: once per cell per level.
        if !self.visited.contains(&cell)
            && self.query_down(&*world, cell, SurfaceMask::BRICK).is_some()
        {
            if let Some(dir) = self.move_dir {
                // The consumed tile is the one just stepped off.
                let behind = cell.step(dir.opposite());
                if let Some(hit) = self.query_down(&*world, behind, SurfaceMask::BRICK) {
                    world.set_visible(hit.object, false);
                }
            }
            self.acquire_brick(world);
            self.visited.insert(cell);
            events.push(GameEvent::BrickPicked { cell });
        }

        // Line consumption: once per cell per level.
        let line_hit = self.query_down(&*world, cell, SurfaceMask::LINE);
        if let Some(hit) = line_hit {
            if !self.consumed_lines.contains(&cell) {
                let paid = self.consume_brick(world, events);
                // The crossed group goes dark until a brick is paid back.
                if let Some(group) = hit.group {
                    world.set_group_visible(group, false);
                    self.revealed_groups.insert(group);
                }
                self.consumed_lines.insert(cell);
                events.push(GameEvent::LineConsumed { cell, paid });
            }
        }

        // A consumed line whose group went dark still counts as one.
        line_hit.is_some() || self.consumed_lines.contains(&cell)
    }

    /// Push a new brick onto the stack and stand on top of it.
    fn acquire_brick(&mut self, scene: &mut dyn SceneOps) {
        let root = self
            .stack_root
            .expect("initialize() establishes the brick stack root");
        let handle = scene.spawn_brick(Pose {
            position: self.position,
            rotation: BRICK_ROTATION,
        });
        let local_y = self.stack.push(handle);
        scene.attach_to_stack(handle, root, local_y);
        self.position.y = self.stack.top_offset();
        self.target.y = self.position.y;
    }

    /// Pop the bottom brick, paying back all hidden line groups. Returns
    /// false when the floor policy made the pop a no-op.
    fn consume_brick(&mut self, scene: &mut dyn SceneOps, events: &mut Vec<GameEvent>) -> bool {
        let bottom = match self.stack.pop_bottom() {
            Some(handle) => handle,
            None => return false,
        };
        scene.destroy(bottom);

        // Pay-it-back: every group hidden since the last pop comes back,
        // and the set empties.
        let restored = self.revealed_groups.len();
        for group in self.revealed_groups.drain() {
            scene.set_group_visible(group, true);
        }
        if restored > 0 {
            events.push(GameEvent::LineGroupsRestored { count: restored });
        }

        // Reposition survivors so offsets stay contiguous from the new bottom.
        if let Some(root) = self.stack_root {
            for rec in self.stack.records() {
                scene.attach_to_stack(rec.handle, root, self.stack.local_offset(rec.height_index));
            }
        }
        self.position.y = self.stack.top_offset();
        self.target.y = self.position.y;
        true
    }

    // ── Destination completion ──

    fn complete_destination(&mut self, scene: &mut dyn SceneOps, events: &mut Vec<GameEvent>) {
        for handle in self.stack.clear() {
            scene.destroy(handle);
        }
        self.position.y = 0.0;
        self.target = self.position;
        self.move_dir = None;

        if let Some(effect) = self.win_effect {
            scene.play_effect(effect);
        }
        self.facing_yaw = WIN_YAW_DEG;
        events.push(GameEvent::DestinationReached);
    }

    // ── Push-obstacle redirection ──

    /// Greedy single-tile detour: scan the four cardinals from the obstacle
    /// cell, in fixed order, for a brick-surfaced neighbor.
    fn find_push_detour(&self, obstacle: GridPoint, spatial: &dyn SpatialQuery) -> Option<MoveDir> {
        let origin = obstacle.to_world(self.position.y);
        MoveDir::SCAN_ORDER.into_iter().find(|d| {
            spatial
                .query_directional(origin, d.unit(), SurfaceMask::BRICK, 1.0)
                .is_some()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use crate::domain::surface::Surface;
    use crate::sim::board::LevelBoard;

    const DT: f32 = 1.0 / 30.0;

    fn controller(minimum_stack_height: usize) -> PlayerController {
        PlayerController::new(&PlayerConfig {
            move_speed: 5.0,
            brick_height: 0.3,
            minimum_stack_height,
        })
    }

    /// Tick until the controller leaves the Moving state, collecting events.
    fn settle(pc: &mut PlayerController, board: &mut LevelBoard) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..10_000 {
            if pc.motion() != Motion::Moving {
                return events;
            }
            pc.update(DT, board, &mut events);
        }
        panic!("controller never came to rest");
    }

    /// Straight corridor along +Z starting at the origin:
    /// surfaces[i] sits at z = i. Each line cell gets its own group.
    fn corridor(surfaces: &[Surface]) -> LevelBoard {
        let mut board = LevelBoard::new();
        let mut group = 0;
        for (i, &s) in surfaces.iter().enumerate() {
            let g = if s == Surface::Line {
                group += 1;
                Some(GroupId(group))
            } else {
                None
            };
            board.insert_cell(GridPoint::new(0, i as i32), s, g);
        }
        board
    }

    fn init_at_origin(pc: &mut PlayerController, board: &mut LevelBoard) {
        pc.initialize(GridPoint::new(0, 0), board);
    }

    // ── Initialization ──

    #[test]
    fn initialize_resets_everything() {
        let mut board = corridor(&[Surface::Brick, Surface::Brick, Surface::Ground]);
        let mut pc = controller(0);
        init_at_origin(&mut pc, &mut board);

        assert!(pc.try_move(MoveDir::Forward, &board));
        settle(&mut pc, &mut board);
        assert!(pc.brick_count() > 0);

        pc.initialize(GridPoint::new(0, 0), &mut board);
        assert_eq!(pc.brick_count(), 0);
        assert_eq!(pc.motion(), Motion::Idle);
        assert_eq!(pc.move_dir(), None);
        assert!(pc.visited.is_empty());
        assert!(pc.consumed_lines.is_empty());
        assert!(pc.revealed_groups.is_empty());
        assert_eq!(pc.position(), GridPoint::new(0, 0).to_world(0.0));
    }

    // ── Swipe validity ──

    #[test]
    fn move_into_void_is_ignored() {
        let mut board = corridor(&[Surface::Brick]);
        let mut pc = controller(0);
        init_at_origin(&mut pc, &mut board);

        assert!(!pc.try_move(MoveDir::Forward, &board));
        assert_eq!(pc.motion(), Motion::Idle);
        assert!(!pc.try_move(MoveDir::Left, &board));
    }

    // ── Brick economy ──

    #[test]
    fn brick_count_is_pickups_minus_consumption() {
        let mut board = corridor(&[
            Surface::Brick,
            Surface::Brick,
            Surface::Brick,
            Surface::Line,
            Surface::Line,
            Surface::Ground,
        ]);
        let mut pc = controller(0);
        init_at_origin(&mut pc, &mut board);

        assert!(pc.try_move(MoveDir::Forward, &board));
        let events = settle(&mut pc, &mut board);

        let picked = events
            .iter()
            .filter(|e| matches!(e, GameEvent::BrickPicked { .. }))
            .count();
        let paid = events
            .iter()
            .filter(|e| matches!(e, GameEvent::LineConsumed { paid: true, .. }))
            .count();
        assert_eq!(picked, 2);
        assert_eq!(paid, 2);
        assert_eq!(pc.brick_count(), 0);
        // Out of bricks on the second line, moving Forward: halted there.
        assert_eq!(pc.cell(), GridPoint::new(0, 4));
        assert_eq!(pc.motion(), Motion::Idle);
    }

    #[test]
    fn revisiting_a_brick_cell_grants_nothing() {
        let mut board = corridor(&[Surface::Ground, Surface::Brick, Surface::Ground]);
        let mut pc = controller(0);
        init_at_origin(&mut pc, &mut board);

        assert!(pc.try_move(MoveDir::Forward, &board));
        settle(&mut pc, &mut board);
        assert_eq!(pc.cell(), GridPoint::new(0, 2));
        assert_eq!(pc.brick_count(), 1);

        // Walk back across the same brick cell and forward again.
        assert!(pc.try_move(MoveDir::Back, &board));
        settle(&mut pc, &mut board);
        assert!(pc.try_move(MoveDir::Forward, &board));
        settle(&mut pc, &mut board);
        assert_eq!(pc.brick_count(), 1);
    }

    #[test]
    fn revisiting_a_consumed_line_charges_nothing() {
        // Main lane up x=0 with two line groups; the pay-back at the second
        // line restores the first group, and a side lane at x=1 leads back
        // onto that restored (but already consumed) cell.
        let mut board = corridor(&[
            Surface::Brick,
            Surface::Brick,
            Surface::Brick,
            Surface::Line,
            Surface::Brick,
            Surface::Line,
            Surface::Ground,
        ]);
        for z in 3..=6 {
            board.insert_cell(GridPoint::new(1, z), Surface::Ground, None);
        }
        let mut pc = controller(0);
        init_at_origin(&mut pc, &mut board);

        assert!(pc.try_move(MoveDir::Forward, &board));
        settle(&mut pc, &mut board);
        assert_eq!(pc.cell(), GridPoint::new(0, 6));
        let count_after_first_pass = pc.brick_count();
        assert_eq!(count_after_first_pass, 1); // picked 3, paid 2
        // The first line group came back with the second pop.
        assert!(board.cell(GridPoint::new(0, 3)).unwrap().visible);

        // Around the side lane and back onto the restored line cell.
        assert!(pc.try_move(MoveDir::Right, &board));
        settle(&mut pc, &mut board);
        assert!(pc.try_move(MoveDir::Back, &board));
        settle(&mut pc, &mut board);
        assert_eq!(pc.cell(), GridPoint::new(1, 3));
        assert!(pc.try_move(MoveDir::Left, &board));
        let events = settle(&mut pc, &mut board);

        assert_eq!(pc.cell(), GridPoint::new(0, 3));
        // Already-consumed cell: no second charge.
        assert_eq!(pc.brick_count(), count_after_first_pass);
        assert!(!events
            .iter()
            .any(|e| matches!(e, GameEvent::LineConsumed { .. })));
    }

    #[test]
    fn pop_restores_hidden_groups_and_empties_the_set() {
        let mut board = corridor(&[
            Surface::Brick,
            Surface::Brick,
            Surface::Brick,
            Surface::Line,
            Surface::Brick,
            Surface::Line,
            Surface::Ground,
        ]);
        let line_a = GridPoint::new(0, 3);
        let line_b = GridPoint::new(0, 5);
        let mut pc = controller(0);
        init_at_origin(&mut pc, &mut board);

        assert!(pc.try_move(MoveDir::Forward, &board));
        let events = settle(&mut pc, &mut board);

        // Paying at line B restored line A's group.
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::LineGroupsRestored { count } if *count >= 1)));
        assert!(board.cell(line_a).unwrap().visible);
        // Line B stays dark until the next pay-back; its group is the only
        // one pending.
        assert!(!board.cell(line_b).unwrap().visible);
        assert_eq!(pc.revealed_groups.len(), 1);
    }

    #[test]
    fn floor_one_never_pops_the_last_brick() {
        let mut board = corridor(&[
            Surface::Brick,
            Surface::Brick,
            Surface::Line,
            Surface::Ground,
        ]);
        let mut pc = controller(1);
        init_at_origin(&mut pc, &mut board);

        assert!(pc.try_move(MoveDir::Forward, &board));
        let events = settle(&mut pc, &mut board);

        // One brick picked; the line pop was a no-op under floor 1, which
        // also leaves the player stranded on the line.
        assert_eq!(pc.brick_count(), 1);
        assert_eq!(pc.cell(), GridPoint::new(0, 2));
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::LineConsumed { paid: false, .. })));
    }

    // ── Traversal scenarios ──

    #[test]
    fn scenario_pickup_consume_halt_forward() {
        // Origin ground, brick at 1, line at 2, destination at 3.
        let mut board = corridor(&[
            Surface::Ground,
            Surface::Brick,
            Surface::Line,
            Surface::Destination,
        ]);
        let mut pc = controller(0);
        init_at_origin(&mut pc, &mut board);

        assert!(pc.try_move(MoveDir::Forward, &board));
        let events = settle(&mut pc, &mut board);

        // Picked 1 at cell 1, paid it at cell 2, and — Forward not being
        // retreat-safe — halted on the line cell in Idle.
        assert_eq!(pc.brick_count(), 0);
        assert_eq!(pc.cell(), GridPoint::new(0, 2));
        assert_eq!(pc.motion(), Motion::Idle);
        assert!(!events
            .iter()
            .any(|e| matches!(e, GameEvent::DestinationReached)));
    }

    #[test]
    fn scenario_retreat_safe_direction_keeps_rolling() {
        // Identical corridors, one per swipe direction: pick one brick, pay
        // it at the line, run dry there. Forward must halt on the line;
        // Back must re-resolve and roll past onto solid ground.
        let mut fwd = corridor(&[
            Surface::Ground,
            Surface::Brick,
            Surface::Line,
            Surface::Ground,
            Surface::Ground,
        ]);
        let mut pc = controller(0);
        init_at_origin(&mut pc, &mut fwd);
        assert!(pc.try_move(MoveDir::Forward, &fwd));
        settle(&mut pc, &mut fwd);
        assert_eq!(pc.cell(), GridPoint::new(0, 2));
        assert_eq!(pc.motion(), Motion::Idle);

        // Mirrored along -Z so the same swipe is Back (retreat-safe).
        let mut back = LevelBoard::new();
        back.insert_cell(GridPoint::new(0, 0), Surface::Ground, None);
        back.insert_cell(GridPoint::new(0, -1), Surface::Brick, None);
        back.insert_cell(GridPoint::new(0, -2), Surface::Line, Some(GroupId(1)));
        back.insert_cell(GridPoint::new(0, -3), Surface::Ground, None);
        back.insert_cell(GridPoint::new(0, -4), Surface::Ground, None);
        let mut pc = controller(0);
        pc.initialize(GridPoint::new(0, 0), &mut back);
        assert!(pc.try_move(MoveDir::Back, &back));
        settle(&mut pc, &mut back);
        assert_eq!(pc.cell(), GridPoint::new(0, -4));
        assert_eq!(pc.motion(), Motion::Idle);
    }

    // ── Destination ──

    #[test]
    fn destination_completes_exactly_once() {
        let mut board = corridor(&[Surface::Ground, Surface::Brick, Surface::Destination]);
        let mut pc = controller(0);
        init_at_origin(&mut pc, &mut board);
        pc.set_visual_effect(EffectHandle(9));

        assert!(pc.try_move(MoveDir::Forward, &board));
        let events = settle(&mut pc, &mut board);

        let completions = events
            .iter()
            .filter(|e| matches!(e, GameEvent::DestinationReached))
            .count();
        assert_eq!(completions, 1);
        assert_eq!(pc.motion(), Motion::Completed);
        assert_eq!(pc.brick_count(), 0);
        assert_eq!(pc.position().y, 0.0);
        assert_eq!(pc.facing_yaw(), WIN_YAW_DEG);
        assert_eq!(board.effects(), &[EffectHandle(9)]);
        assert!(board.drain_cues().contains(&AnimationCue::TriggerWin));

        // Further ticks and swipes on the destination cell do nothing.
        let mut more = Vec::new();
        for _ in 0..100 {
            pc.update(DT, &mut board, &mut more);
        }
        assert!(!pc.try_move(MoveDir::Back, &board));
        assert!(more.is_empty());
        assert_eq!(board.effects().len(), 1);
    }

    #[test]
    fn completion_destroys_all_stacked_bricks() {
        let mut board = corridor(&[
            Surface::Ground,
            Surface::Brick,
            Surface::Brick,
            Surface::Destination,
        ]);
        let mut pc = controller(0);
        init_at_origin(&mut pc, &mut board);

        assert!(pc.try_move(MoveDir::Forward, &board));
        settle(&mut pc, &mut board);

        assert_eq!(pc.motion(), Motion::Completed);
        // Only the stack root survives in the spawned-object table.
        assert_eq!(board.spawned_count(), 1);
    }

    // ── Push redirection ──

    #[test]
    fn push_detour_scans_in_fixed_order() {
        // Pushable ahead with brick surfaces both left and right of it:
        // Left precedes Right once Forward/Back fail.
        let mut board = LevelBoard::new();
        board.insert_cell(GridPoint::new(0, 0), Surface::Ground, None);
        board.insert_cell(GridPoint::new(0, 1), Surface::Ground, None);
        board.insert_cell(GridPoint::new(0, 2), Surface::Pushable, None);
        board.insert_cell(GridPoint::new(-1, 2), Surface::Brick, None);
        board.insert_cell(GridPoint::new(1, 2), Surface::Brick, None);
        // Somewhere for the redirected move to land.
        board.insert_cell(GridPoint::new(-1, 1), Surface::Ground, None);
        let mut pc = controller(0);
        init_at_origin(&mut pc, &mut board);

        assert!(pc.try_move(MoveDir::Forward, &board));
        let events = settle(&mut pc, &mut board);

        let redirect = events.iter().find_map(|e| match e {
            GameEvent::PushRedirected { from, to } => Some((*from, *to)),
            _ => None,
        });
        assert_eq!(redirect, Some((MoveDir::Forward, MoveDir::Left)));
        assert_eq!(pc.cell().x, -1);
    }

    #[test]
    fn inert_push_blocks_motion() {
        let mut board = LevelBoard::new();
        board.insert_cell(GridPoint::new(0, 0), Surface::Ground, None);
        board.insert_cell(GridPoint::new(0, 1), Surface::Ground, None);
        board.insert_cell(GridPoint::new(0, 2), Surface::Pushable, None);
        // No brick surface adjacent to the obstacle: the push is inert.
        let mut pc = controller(0);
        init_at_origin(&mut pc, &mut board);

        assert!(pc.try_move(MoveDir::Forward, &board));
        settle(&mut pc, &mut board);

        assert_eq!(pc.cell(), GridPoint::new(0, 1));
        assert_eq!(pc.motion(), Motion::Idle);
    }

    // ── Height ledger ──

    #[test]
    fn player_height_tracks_stack() {
        let mut board = corridor(&[
            Surface::Ground,
            Surface::Brick,
            Surface::Brick,
            Surface::Ground,
        ]);
        let mut pc = controller(0);
        init_at_origin(&mut pc, &mut board);

        assert!(pc.try_move(MoveDir::Forward, &board));
        settle(&mut pc, &mut board);

        assert_eq!(pc.brick_count(), 2);
        assert!((pc.position().y - 0.6).abs() < 1e-5);
    }
}
