//! Bounded undo history of full scene snapshots.

use crate::scene::Scene;

/// Maximum number of undo snapshots to keep.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Ordered, capacity-bounded stack of scene snapshots.
///
/// A snapshot is a deep copy of the three scene collections, taken before a
/// mutating command applies. Continuous drag/resize/pan never push per-move;
/// the gesture machine records one snapshot per completed gesture instead.
#[derive(Debug, Clone, Default)]
pub struct History {
    snapshots: Vec<Scene>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a deep copy of the current scene (call before making changes).
    pub fn push(&mut self, scene: &Scene) {
        self.push_snapshot(scene.clone());
    }

    /// Push an already-cloned snapshot, evicting the oldest past capacity.
    pub fn push_snapshot(&mut self, snapshot: Scene) {
        self.snapshots.push(snapshot);
        if self.snapshots.len() > MAX_UNDO_HISTORY {
            self.snapshots.remove(0);
        }
    }

    /// Restore the most recent snapshot into `scene`.
    /// Returns false (leaving `scene` untouched) when the stack is empty.
    pub fn undo(&mut self, scene: &mut Scene) -> bool {
        match self.snapshots.pop() {
            Some(snapshot) => {
                *scene = snapshot;
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.snapshots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}
