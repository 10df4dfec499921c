/// The in-memory level scene: one cell per grid point plus a table of
/// spawned instances (the brick stack and its root).
///
/// `LevelBoard` is both service seams at once — `SpatialQuery` resolves
/// against the cell map, `SceneOps` mutates cells and the spawned table —
/// so the controller and its tests drive a single value.

use std::collections::HashMap;

use glam::Vec3;

use crate::domain::grid::GridPoint;
use crate::domain::services::{
    AnimationCue, EffectHandle, GroupId, Hit, ObjectHandle, Pose, SceneOps, SpatialQuery,
};
use crate::domain::surface::{Surface, SurfaceMask};

/// A static level tile.
#[derive(Clone, Copy, Debug)]
pub struct BoardCell {
    pub handle: ObjectHandle,
    pub surface: Surface,
    pub group: Option<GroupId>,
    pub visible: bool,
}

/// A dynamic instance created through `SceneOps`.
#[derive(Clone, Copy, Debug)]
struct SpawnedObject {
    #[allow(dead_code)]
    pose: Pose,
    parent: Option<ObjectHandle>,
    local_y: f32,
}

pub struct LevelBoard {
    cells: HashMap<GridPoint, BoardCell>,
    cell_by_handle: HashMap<ObjectHandle, GridPoint>,
    spawned: HashMap<ObjectHandle, SpawnedObject>,
    next_handle: u32,
    cues: Vec<AnimationCue>,
    effects: Vec<EffectHandle>,
}

impl LevelBoard {
    pub fn new() -> Self {
        LevelBoard {
            cells: HashMap::new(),
            cell_by_handle: HashMap::new(),
            spawned: HashMap::new(),
            next_handle: 1,
            cues: Vec::new(),
            effects: Vec::new(),
        }
    }

    fn alloc_handle(&mut self) -> ObjectHandle {
        let h = ObjectHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    /// Place a tile; replaces any tile already at the point.
    pub fn insert_cell(&mut self, at: GridPoint, surface: Surface, group: Option<GroupId>) {
        let handle = self.alloc_handle();
        if let Some(old) = self.cells.insert(
            at,
            BoardCell {
                handle,
                surface,
                group,
                visible: true,
            },
        ) {
            self.cell_by_handle.remove(&old.handle);
        }
        self.cell_by_handle.insert(handle, at);
    }

    pub fn cell(&self, at: GridPoint) -> Option<&BoardCell> {
        self.cells.get(&at)
    }

    pub fn cells(&self) -> impl Iterator<Item = (GridPoint, &BoardCell)> {
        self.cells.iter().map(|(p, c)| (*p, c))
    }

    /// Number of live spawned instances (stack root plus bricks).
    pub fn spawned_count(&self) -> usize {
        self.spawned.len()
    }

    pub fn effects(&self) -> &[EffectHandle] {
        &self.effects
    }

    /// Take the animation cues queued since the last drain.
    pub fn drain_cues(&mut self) -> Vec<AnimationCue> {
        std::mem::take(&mut self.cues)
    }

    fn visible_cell_at(&self, at: GridPoint, mask: SurfaceMask) -> Option<Hit> {
        let cell = self.cells.get(&at)?;
        if !cell.visible || !mask.contains(cell.surface) {
            return None;
        }
        Some(Hit {
            object: cell.handle,
            surface: cell.surface,
            group: cell.group,
        })
    }
}

impl SpatialQuery for LevelBoard {
    fn query_downward(&self, point: Vec3, mask: SurfaceMask, max_distance: f32) -> Option<Hit> {
        // Tiles sit at y = 0; the probe point is at stack height.
        if point.y > max_distance {
            return None;
        }
        self.visible_cell_at(GridPoint::from_world(point), mask)
    }

    fn query_directional(
        &self,
        point: Vec3,
        dir: Vec3,
        mask: SurfaceMask,
        max_distance: f32,
    ) -> Option<Hit> {
        let origin = GridPoint::from_world(point);
        let steps = max_distance.floor() as i32;
        for i in 1..=steps {
            let probe = GridPoint::from_world(point + dir * i as f32);
            if probe == origin {
                continue;
            }
            if let Some(hit) = self.visible_cell_at(probe, mask) {
                return Some(hit);
            }
        }
        None
    }
}

impl SceneOps for LevelBoard {
    fn spawn_stack_root(&mut self, at: Vec3) -> ObjectHandle {
        let handle = self.alloc_handle();
        self.spawned.insert(
            handle,
            SpawnedObject {
                pose: Pose {
                    position: at,
                    rotation: Vec3::ZERO,
                },
                parent: None,
                local_y: 0.0,
            },
        );
        handle
    }

    fn spawn_brick(&mut self, pose: Pose) -> ObjectHandle {
        let handle = self.alloc_handle();
        self.spawned.insert(
            handle,
            SpawnedObject {
                pose,
                parent: None,
                local_y: 0.0,
            },
        );
        handle
    }

    fn attach_to_stack(&mut self, brick: ObjectHandle, root: ObjectHandle, local_y: f32) {
        if let Some(obj) = self.spawned.get_mut(&brick) {
            obj.parent = Some(root);
            obj.local_y = local_y;
        }
    }

    fn destroy(&mut self, object: ObjectHandle) {
        self.spawned.remove(&object);
    }

    fn set_visible(&mut self, object: ObjectHandle, visible: bool) {
        if let Some(at) = self.cell_by_handle.get(&object) {
            if let Some(cell) = self.cells.get_mut(at) {
                cell.visible = visible;
            }
        }
    }

    fn set_group_visible(&mut self, group: GroupId, visible: bool) {
        for cell in self.cells.values_mut() {
            if cell.group == Some(group) {
                cell.visible = visible;
            }
        }
    }

    fn trigger_cue(&mut self, cue: AnimationCue) {
        self.cues.push(cue);
    }

    fn play_effect(&mut self, effect: EffectHandle) {
        self.effects.push(effect);
    }
}
