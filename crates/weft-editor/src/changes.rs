//! Change-batch adapter for canvas interaction layers.
//!
//! Drag loops, marquee selection, and keyboard deletes arrive as flat
//! batches of change descriptors. Applying a batch never records
//! history — gesture code decides where the undo boundary sits by
//! calling [`WorkflowStore::push_history_snapshot`] first (typically
//! at gesture start). Descriptors that reference ids which no longer
//! exist are skipped; stale changes from in-flight gestures are
//! expected, not errors.

use crate::store::WorkflowStore;
use weft_graph::{EdgeId, NodeId, Position};

/// A single change to one node, as reported by the canvas layer.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeChange {
    Position { id: NodeId, position: Position },
    Select { id: NodeId, selected: bool },
    Remove { id: NodeId },
}

/// A single change to one edge, as reported by the canvas layer.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeChange {
    Select { id: EdgeId, selected: bool },
    Remove { id: EdgeId },
}

impl WorkflowStore {
    /// Apply a batch of node changes in order, without recording.
    /// Removals cascade incident edges exactly like the recorded
    /// remove action.
    pub fn apply_node_changes(&mut self, changes: &[NodeChange]) {
        for change in changes {
            let result = match change {
                NodeChange::Position { id, position } => {
                    self.graph_mut().set_position(*id, *position)
                }
                NodeChange::Select { id, selected } => {
                    self.graph_mut().set_selected(*id, *selected)
                }
                NodeChange::Remove { id } => self.graph_mut().remove_node(*id).map(|_| ()),
            };
            if let Err(err) = result {
                log::trace!("skipped stale node change: {err}");
            }
        }
    }

    /// Apply a batch of edge changes in order, without recording.
    pub fn apply_edge_changes(&mut self, changes: &[EdgeChange]) {
        for change in changes {
            let result = match change {
                EdgeChange::Select { id, selected } => {
                    self.graph_mut().set_edge_selected(*id, *selected)
                }
                EdgeChange::Remove { id } => self.graph_mut().remove_edge(*id).map(|_| ()),
            };
            if let Err(err) = result {
                log::trace!("skipped stale edge change: {err}");
            }
        }
    }
}
