/// Collaborator seams consumed by the player controller.
///
/// The controller never owns the scene: it asks a `SpatialQuery` what lies
/// under or beside a point, and tells a `SceneOps` what to spawn, hide, or
/// destroy. Both are injected at every call site, so tests drive the
/// controller against a plain in-memory board.

use glam::Vec3;

use super::surface::{Surface, SurfaceMask};

/// Identity of a scene object (a tile or a spawned instance).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ObjectHandle(pub u32);

/// Identity of a line-parent group; its children hide and show together.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GroupId(pub u32);

/// Opaque handle to a visual effect the orchestrator assigns before play.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EffectHandle(pub u32);

/// Result of a spatial query.
#[derive(Clone, Copy, Debug)]
pub struct Hit {
    pub object: ObjectHandle,
    pub surface: Surface,
    /// Line-parent identity, when the hit object belongs to a line group.
    pub group: Option<GroupId>,
}

/// Spawn pose for a brick instance (position + euler rotation, degrees).
#[derive(Clone, Copy, Debug)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Vec3,
}

/// Closed set of animation cues, replacing free-form animator parameters.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnimationCue {
    TriggerWin,
    SetMoving(bool),
}

/// Read-only layered queries against the scene. Side-effect free.
pub trait SpatialQuery {
    /// Is there an object of a masked category directly below `point`,
    /// within `max_distance`?
    fn query_downward(&self, point: Vec3, mask: SurfaceMask, max_distance: f32) -> Option<Hit>;

    /// Is there an object of a masked category along `dir` from `point`,
    /// within `max_distance`? The origin cell itself is excluded.
    fn query_directional(
        &self,
        point: Vec3,
        dir: Vec3,
        mask: SurfaceMask,
        max_distance: f32,
    ) -> Option<Hit>;
}

/// Mutations the controller is allowed to request from the scene.
pub trait SceneOps {
    /// Spawn the anchor all stacked bricks attach under.
    fn spawn_stack_root(&mut self, at: Vec3) -> ObjectHandle;

    /// Spawn a brick instance at a pose; returns its handle.
    fn spawn_brick(&mut self, pose: Pose) -> ObjectHandle;

    /// Parent a brick under the stack root at a local height offset.
    fn attach_to_stack(&mut self, brick: ObjectHandle, root: ObjectHandle, local_y: f32);

    fn destroy(&mut self, object: ObjectHandle);

    fn set_visible(&mut self, object: ObjectHandle, visible: bool);

    /// Show or hide every child of a line-parent group at once.
    fn set_group_visible(&mut self, group: GroupId, visible: bool);

    fn trigger_cue(&mut self, cue: AnimationCue);

    fn play_effect(&mut self, effect: EffectHandle);
}
