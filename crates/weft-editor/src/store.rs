//! The workflow store — the single mutable aggregate a canvas UI
//! talks to.
//!
//! It owns the graph, the undo/redo history, and the group-selection
//! context, and runs every recorded action as a snapshot-before-mutate
//! transaction: the pre-state is cloned, the mutating primitive runs,
//! and the clone becomes an undo entry only if the primitive
//! succeeded. Failed actions are silent no-ops — the graph, the
//! history, and the redo stack are left exactly as they were, and the
//! failure goes out through the collaborator seams instead of a panic
//! or an error return.

use crate::history::History;
use crate::session::{Notifier, NullNotifier, NullSessionSink, SessionSink, Severity};
use std::sync::Arc;
use weft_graph::{
    ConnectRequest, EdgeId, GraphError, GroupId, NodeDataPatch, NodeId, NodeKind, Position,
    WorkflowGraph,
};

pub struct WorkflowStore {
    graph: WorkflowGraph,
    history: History,
    /// Group-selection context. Not part of graph snapshots.
    selected_group: Option<GroupId>,
    session: Arc<dyn SessionSink>,
    notifier: Arc<dyn Notifier>,
}

impl WorkflowStore {
    /// An empty store with no-op collaborators.
    pub fn new() -> Self {
        Self::with_collaborators(Arc::new(NullSessionSink), Arc::new(NullNotifier))
    }

    /// An empty store reporting to the given collaborators. Announces
    /// session start immediately; session end goes out on drop.
    pub fn with_collaborators(session: Arc<dyn SessionSink>, notifier: Arc<dyn Notifier>) -> Self {
        session.session_started();
        Self {
            graph: WorkflowGraph::new(),
            history: History::new(),
            selected_group: None,
            session,
            notifier,
        }
    }

    // ─── Reads ───────────────────────────────────────────────────────────

    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selected_group(&self) -> Option<GroupId> {
        self.selected_group
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ─── Recorded Actions ────────────────────────────────────────────────

    /// Add a node of `kind` at `position`. Always succeeds.
    pub fn add_node(&mut self, kind: NodeKind, position: Position) -> NodeId {
        self.push_history_snapshot();
        let id = self.graph.insert_node(kind, position);
        log::debug!("added {} node {id}", kind.label());
        id
    }

    /// Remove a node and its incident edges. Unknown id: silent no-op.
    pub fn remove_node(&mut self, id: NodeId) {
        if let Some(removed) = self.record(|graph| graph.remove_node(id)) {
            log::debug!("removed node {id} and {} edges", removed.edges.len());
        }
    }

    /// Validate and create a connection. Returns the new edge id, or
    /// `None` when the request was rejected (no-op).
    pub fn connect(&mut self, request: ConnectRequest) -> Option<EdgeId> {
        self.record(|graph| graph.connect(request))
    }

    /// Remove an edge. Unknown id: silent no-op.
    pub fn remove_edge(&mut self, id: EdgeId) {
        self.record(|graph| graph.remove_edge(id));
    }

    /// Apply a kind-checked partial update to a node's payload.
    ///
    /// History-exempt patches (gallery appends) skip recording so that
    /// streamed generation results never pollute the undo stack.
    pub fn update_node_data(&mut self, id: NodeId, patch: NodeDataPatch) {
        if patch.is_history_exempt() {
            if let Err(err) = self.graph.patch_node_data(id, patch) {
                self.report(&err);
            }
            return;
        }
        self.record(|graph| graph.patch_node_data(id, patch));
    }

    /// Group the given nodes. Returns the new group id, or `None` when
    /// the set was empty or contained an unknown node (no-op).
    pub fn create_group(&mut self, node_ids: &[NodeId]) -> Option<GroupId> {
        self.record(|graph| graph.create_group(node_ids))
    }

    /// Delete a group with its member nodes and their edges. Clears
    /// the group-selection context if it pointed at the deleted group.
    pub fn delete_group_with_nodes(&mut self, group_id: GroupId) {
        if let Some(removed) = self.record(|graph| graph.remove_group_with_members(group_id)) {
            if self.selected_group == Some(group_id) {
                self.selected_group = None;
            }
            log::debug!(
                "deleted group {group_id}: {} nodes, {} edges",
                removed.member_count,
                removed.edge_count
            );
        }
    }

    /// Reset to an empty workflow. Leaves the history stacks alone;
    /// callers wanting a full reset also call [`Self::clear_history`].
    pub fn clear_workflow(&mut self) {
        self.graph.clear();
        self.selected_group = None;
        log::debug!("workflow cleared");
    }

    // ─── Selection Context ───────────────────────────────────────────────

    /// Set or clear the selected group. Pure selection context — never
    /// recorded. Selecting an unknown group is ignored.
    pub fn set_selected_group(&mut self, group_id: Option<GroupId>) {
        if let Some(id) = group_id
            && self.graph.group(id).is_none()
        {
            log::debug!("ignoring selection of unknown group {id}");
            return;
        }
        self.selected_group = group_id;
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Capture the current graph as an undo entry and drop any
    /// redoable future. Recorded actions call this implicitly;
    /// interaction layers call it directly at gesture start so a burst
    /// of non-recorded changes undoes as one step.
    pub fn push_history_snapshot(&mut self) {
        self.history.push_snapshot(self.graph.clone());
    }

    /// Swap the live graph for the newest undo snapshot. Returns false
    /// (and changes nothing) when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        if !self.history.can_undo() {
            return false;
        }
        let current = self.graph.clone();
        match self.history.undo(current) {
            Some(snapshot) => {
                self.graph = snapshot;
                true
            }
            None => false,
        }
    }

    /// Swap the live graph for the newest redo snapshot. Returns false
    /// (and changes nothing) when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        if !self.history.can_redo() {
            return false;
        }
        let current = self.graph.clone();
        match self.history.redo(current) {
            Some(snapshot) => {
                self.graph = snapshot;
                true
            }
            None => false,
        }
    }

    /// Drop all undo and redo entries. The live graph is untouched.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // ─── Internals ───────────────────────────────────────────────────────

    /// Run a mutating primitive as one transaction: clone the graph,
    /// apply, and push the clone as an undo entry only on success.
    /// Primitives validate before they write, so on failure the clone
    /// is simply dropped.
    pub(crate) fn record<T>(
        &mut self,
        op: impl FnOnce(&mut WorkflowGraph) -> Result<T, GraphError>,
    ) -> Option<T> {
        let before = self.graph.clone();
        match op(&mut self.graph) {
            Ok(value) => {
                self.history.push_snapshot(before);
                Some(value)
            }
            Err(err) => {
                self.report(&err);
                None
            }
        }
    }

    pub(crate) fn graph_mut(&mut self) -> &mut WorkflowGraph {
        &mut self.graph
    }

    pub(crate) fn set_selected_group_unchecked(&mut self, group_id: Option<GroupId>) {
        self.selected_group = group_id;
    }

    /// Route a rejected mutation to the collaborators.
    pub(crate) fn report(&self, err: &GraphError) {
        let message = err.to_string();
        log::debug!("rejected mutation: {message}");
        self.session.notice(Severity::Warning, &message);
        self.notifier.notify(Severity::Warning, &message);
    }
}

impl Default for WorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WorkflowStore {
    fn drop(&mut self) {
        self.session.session_ended();
    }
}
