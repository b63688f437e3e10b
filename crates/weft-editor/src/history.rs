//! Snapshot-based undo/redo history.
//!
//! Each entry is a complete graph snapshot captured **before** a
//! recorded mutation ran. Undo hands back the newest snapshot and
//! parks the caller's live state on the redo stack; redo is the mirror
//! image. Recording a new snapshot invalidates the redo stack, and the
//! undo stack is capped — the oldest entry falls off first.

use weft_graph::WorkflowGraph;

/// Default maximum number of undo entries.
pub const MAX_HISTORY_DEPTH: usize = 100;

/// Bounded pair of undo/redo snapshot stacks.
#[derive(Debug)]
pub struct History {
    undo_stack: Vec<WorkflowGraph>,
    redo_stack: Vec<WorkflowGraph>,
    max_depth: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_depth(MAX_HISTORY_DEPTH)
    }

    pub fn with_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth),
            redo_stack: Vec::new(),
            max_depth,
        }
    }

    /// Record a pre-mutation snapshot. Any redoable future is dropped,
    /// and the oldest entry is trimmed once the cap is reached.
    pub fn push_snapshot(&mut self, snapshot: WorkflowGraph) {
        self.undo_stack.push(snapshot);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// Pop the newest undo snapshot, parking `current` on the redo
    /// stack. `None` (and `current` untouched conceptually) when there
    /// is nothing to undo.
    pub fn undo(&mut self, current: WorkflowGraph) -> Option<WorkflowGraph> {
        let restored = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(restored)
    }

    /// Pop the newest redo snapshot, parking `current` on the undo
    /// stack. Does not trim: redo only ever returns entries that came
    /// off the undo stack, so the cap cannot be exceeded here.
    pub fn redo(&mut self, current: WorkflowGraph) -> Option<WorkflowGraph> {
        let restored = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(restored)
    }

    /// Drop both stacks without touching any live state.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// The undo entries, oldest first. Read-only inspection.
    pub fn undo_stack(&self) -> &[WorkflowGraph] {
        &self.undo_stack
    }

    /// The redo entries, oldest first. Read-only inspection.
    pub fn redo_stack(&self) -> &[WorkflowGraph] {
        &self.redo_stack
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
