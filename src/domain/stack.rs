/// The brick-stack ledger: an explicit ordered sequence of brick records,
/// bottom-to-top, each holding its height index.
///
/// The ledger owns bookkeeping only — spawning and destroying the visual
/// instances is the controller's job through `SceneOps`. Invariants:
///   - `len()` is the current brick inventory
///   - height indices are contiguous from 0; a pop reindexes explicitly
///   - a pop that would drop the count below `minimum_height` is a no-op
///     (the configurable stacking-policy floor, 0 or 1)

use super::services::ObjectHandle;

#[derive(Clone, Copy, Debug)]
pub struct BrickRecord {
    pub handle: ObjectHandle,
    pub height_index: usize,
}

pub struct BrickStack {
    records: Vec<BrickRecord>,
    brick_height: f32,
    minimum_height: usize,
}

impl BrickStack {
    pub fn new(brick_height: f32, minimum_height: usize) -> Self {
        BrickStack {
            records: Vec::new(),
            brick_height,
            minimum_height,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Can the stack pay one brick without dropping below the floor?
    pub fn can_pay(&self) -> bool {
        self.records.len() > self.minimum_height
    }

    /// Local height offset for a record index.
    pub fn local_offset(&self, height_index: usize) -> f32 {
        height_index as f32 * self.brick_height
    }

    /// Height the player stands at: the top of the stack.
    pub fn top_offset(&self) -> f32 {
        self.records.len() as f32 * self.brick_height
    }

    /// Push a brick on top; returns its local height offset.
    pub fn push(&mut self, handle: ObjectHandle) -> f32 {
        let height_index = self.records.len();
        self.records.push(BrickRecord { handle, height_index });
        self.local_offset(height_index)
    }

    /// Pop the bottom brick, if the floor policy allows it.
    /// Remaining records are reindexed so offsets stay contiguous from 0.
    pub fn pop_bottom(&mut self) -> Option<ObjectHandle> {
        if !self.can_pay() {
            return None;
        }
        let bottom = self.records.remove(0);
        for (i, rec) in self.records.iter_mut().enumerate() {
            rec.height_index = i;
        }
        Some(bottom.handle)
    }

    /// Drain the entire ledger, yielding the handles to destroy.
    pub fn clear(&mut self) -> Vec<ObjectHandle> {
        self.records.drain(..).map(|r| r.handle).collect()
    }

    pub fn records(&self) -> &[BrickRecord] {
        &self.records
    }
}
