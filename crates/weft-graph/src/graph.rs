//! The workflow graph: a flat node collection with handle-addressed
//! edges and a group sidecar, backed by a `StableDiGraph` arena.
//!
//! Every mutating primitive validates first and only then writes, so a
//! call that returns `Err` has not touched the graph. Removing a node
//! drops its incident edges in the same call; removing a group drops
//! its members and their edges. The whole value is `Clone` — a clone
//! is a self-contained snapshot, index maps included.

use crate::error::GraphError;
use crate::geometry::{Position, Rect};
use crate::id::{EdgeId, GroupId, NodeId};
use crate::model::{ConnectRequest, Edge, Group, Node, NodeDataPatch, NodeKind};
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// Margin added around member extents when a group frame is computed.
pub const GROUP_PADDING: f32 = 24.0;

/// A node removal, with the edges that went down with it.
#[derive(Debug, Clone)]
pub struct RemovedNode {
    pub node: Node,
    pub edges: SmallVec<[Edge; 4]>,
}

/// A group removal: the group record plus cascade counts.
#[derive(Debug, Clone)]
pub struct RemovedGroup {
    pub group: Group,
    pub member_count: usize,
    pub edge_count: usize,
}

/// Serializable projection of a graph's observable state.
///
/// Nodes and edges are in graph iteration order; groups are sorted by
/// id so two equal graphs always produce equal content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowContent {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub groups: Vec<Group>,
}

// ─── Workflow Graph ──────────────────────────────────────────────────────

/// The complete canvas state — nodes, edges, and groups.
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
    /// Node arena; edge weights carry the full edge record.
    graph: StableDiGraph<Node, Edge>,

    /// Index from NodeId → NodeIndex for fast lookup.
    id_index: HashMap<NodeId, NodeIndex>,

    /// Index from EdgeId → EdgeIndex for fast lookup.
    edge_index: HashMap<EdgeId, EdgeIndex>,

    /// Group records by id. Membership lives on the nodes.
    groups: HashMap<GroupId, Group>,
}

impl WorkflowGraph {
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            id_index: HashMap::new(),
            edge_index: HashMap::new(),
            groups: HashMap::new(),
        }
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// Create a node of `kind` at `position` with a fresh id and default
    /// payload. Returns the new node's id.
    pub fn insert_node(&mut self, kind: NodeKind, position: Position) -> NodeId {
        let node = Node::new(kind, position);
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        id
    }

    /// Insert a fully-formed node record (duplication, state import).
    pub fn insert_node_record(&mut self, node: Node) -> Result<NodeId, GraphError> {
        if self.id_index.contains_key(&node.id) {
            return Err(GraphError::invalid(format!(
                "duplicate node id: {}",
                node.id
            )));
        }
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        Ok(id)
    }

    /// Remove a node and every edge attached to it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<RemovedNode, GraphError> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| GraphError::not_found("node", id))?;

        let mut edges: SmallVec<[Edge; 4]> = SmallVec::new();
        for dir in [Direction::Outgoing, Direction::Incoming] {
            for edge in self.graph.edges_directed(idx, dir) {
                edges.push(edge.weight().clone());
            }
        }

        // StableGraph drops incident edges together with the node.
        let node = self
            .graph
            .remove_node(idx)
            .ok_or_else(|| GraphError::not_found("node", id))?;
        self.id_index.remove(&id);
        for edge in &edges {
            self.edge_index.remove(&edge.id);
        }
        Ok(RemovedNode { node, edges })
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.id_index
            .get(&id)
            .and_then(|idx| self.graph.node_weight(*idx))
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let idx = self.id_index.get(&id).copied()?;
        self.graph.node_weight_mut(idx)
    }

    fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    /// All nodes in ascending arena order. Deterministic for a given
    /// mutation sequence, and preserved exactly across clones.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph
            .node_indices()
            .filter_map(|idx| self.graph.node_weight(idx))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn set_position(&mut self, id: NodeId, position: Position) -> Result<(), GraphError> {
        let node = self
            .node_mut(id)
            .ok_or_else(|| GraphError::not_found("node", id))?;
        node.position = position;
        Ok(())
    }

    pub fn set_selected(&mut self, id: NodeId, selected: bool) -> Result<(), GraphError> {
        let node = self
            .node_mut(id)
            .ok_or_else(|| GraphError::not_found("node", id))?;
        node.selected = selected;
        Ok(())
    }

    /// Make exactly `ids` the selection: every listed node becomes
    /// selected, every other node and every edge is deselected.
    /// Unknown ids are ignored.
    pub fn select_only(&mut self, ids: &[NodeId]) {
        let chosen: HashSet<NodeId> = ids.iter().copied().collect();
        let node_ids: Vec<NodeId> = self.id_index.keys().copied().collect();
        for id in node_ids {
            if let Some(node) = self.node_mut(id) {
                node.selected = chosen.contains(&id);
            }
        }
        let edge_ids: Vec<EdgeId> = self.edge_index.keys().copied().collect();
        for id in edge_ids {
            if let Some(edge) = self.edge_mut(id) {
                edge.selected = false;
            }
        }
    }

    /// Ids of the currently selected nodes, in arena order.
    pub fn selected_nodes(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|n| n.selected)
            .map(|n| n.id)
            .collect()
    }

    /// Apply a kind-checked partial update to a node's payload.
    pub fn patch_node_data(&mut self, id: NodeId, patch: NodeDataPatch) -> Result<(), GraphError> {
        let node = self
            .node_mut(id)
            .ok_or_else(|| GraphError::not_found("node", id))?;
        node.data.apply_patch(patch)
    }

    // ─── Edges ───────────────────────────────────────────────────────────

    /// Validate and create a connection. Both endpoints must exist, the
    /// handles must be real ports on the endpoint kinds, self-loops and
    /// exact duplicates are rejected, and a new source arriving at an
    /// occupied input handle displaces the edge already there.
    pub fn connect(&mut self, request: ConnectRequest) -> Result<EdgeId, GraphError> {
        let ConnectRequest {
            source,
            source_handle,
            target,
            target_handle,
        } = request;

        let source_kind = self
            .node(source)
            .ok_or_else(|| GraphError::not_found("node", source))?
            .kind;
        let target_kind = self
            .node(target)
            .ok_or_else(|| GraphError::not_found("node", target))?
            .kind;

        if source == target {
            return Err(GraphError::invalid("cannot connect a node to itself"));
        }
        if !source_kind.outputs().contains(&source_handle.as_str()) {
            return Err(GraphError::invalid(format!(
                "{} node {source} has no output handle '{source_handle}'",
                source_kind.label()
            )));
        }
        if !target_kind.inputs().contains(&target_handle.as_str()) {
            return Err(GraphError::invalid(format!(
                "{} node {target} has no input handle '{target_handle}'",
                target_kind.label()
            )));
        }

        let duplicate = self.edges().any(|e| {
            e.source == source
                && e.source_handle == source_handle
                && e.target == target
                && e.target_handle == target_handle
        });
        if duplicate {
            return Err(GraphError::invalid(format!(
                "connection {source}:{source_handle} -> {target}:{target_handle} already exists"
            )));
        }

        // An input handle holds at most one edge; a different source
        // arriving there displaces the existing one.
        let occupied = self
            .edges()
            .find(|e| e.target == target && e.target_handle == target_handle)
            .map(|e| e.id);
        if let Some(existing) = occupied {
            let removed = self.remove_edge(existing)?;
            log::debug!(
                "edge {} displaced from input {target}:{target_handle}",
                removed.id
            );
        }

        self.insert_edge_record(Edge {
            id: EdgeId::fresh(),
            source,
            source_handle,
            target,
            target_handle,
            selected: false,
        })
    }

    /// Insert a fully-formed edge record (duplication, state import).
    /// Endpoints must exist; handle and duplicate checks are the
    /// caller's responsibility.
    pub fn insert_edge_record(&mut self, edge: Edge) -> Result<EdgeId, GraphError> {
        if self.edge_index.contains_key(&edge.id) {
            return Err(GraphError::invalid(format!(
                "duplicate edge id: {}",
                edge.id
            )));
        }
        let source = self
            .index_of(edge.source)
            .ok_or_else(|| GraphError::not_found("node", edge.source))?;
        let target = self
            .index_of(edge.target)
            .ok_or_else(|| GraphError::not_found("node", edge.target))?;

        let id = edge.id;
        let idx = self.graph.add_edge(source, target, edge);
        self.edge_index.insert(id, idx);
        Ok(id)
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Result<Edge, GraphError> {
        let idx = self
            .edge_index
            .remove(&id)
            .ok_or_else(|| GraphError::not_found("edge", id))?;
        self.graph
            .remove_edge(idx)
            .ok_or_else(|| GraphError::not_found("edge", id))
    }

    /// Look up an edge by id.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edge_index
            .get(&id)
            .and_then(|idx| self.graph.edge_weight(*idx))
    }

    fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        let idx = self.edge_index.get(&id).copied()?;
        self.graph.edge_weight_mut(idx)
    }

    /// All edges in ascending arena order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph
            .edge_indices()
            .filter_map(|idx| self.graph.edge_weight(idx))
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn set_edge_selected(&mut self, id: EdgeId, selected: bool) -> Result<(), GraphError> {
        let edge = self
            .edge_mut(id)
            .ok_or_else(|| GraphError::not_found("edge", id))?;
        edge.selected = selected;
        Ok(())
    }

    /// Edges that start or end at the given node.
    pub fn edges_touching(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges()
            .filter(move |e| e.source == id || e.target == id)
    }

    // ─── Groups ──────────────────────────────────────────────────────────

    /// Group the given nodes under a fresh group. Every id must exist;
    /// nodes already in another group are reassigned. The frame rect is
    /// the padded bounding box of the member cards.
    pub fn create_group(&mut self, ids: &[NodeId]) -> Result<GroupId, GraphError> {
        if ids.is_empty() {
            return Err(GraphError::invalid("cannot group an empty node set"));
        }
        for id in ids {
            if !self.contains_node(*id) {
                return Err(GraphError::not_found("node", id));
            }
        }
        let rect = self
            .bounding_rect_of(ids.iter().copied())
            .ok_or_else(|| GraphError::invalid("cannot group an empty node set"))?
            .expand(GROUP_PADDING);

        let group_id = GroupId::fresh();
        for id in ids {
            if let Some(node) = self.node_mut(*id) {
                node.group_id = Some(group_id);
            }
        }
        let name = format!("Group {}", self.groups.len() + 1);
        self.groups.insert(
            group_id,
            Group {
                id: group_id,
                name,
                rect,
            },
        );
        Ok(group_id)
    }

    /// Insert a fully-formed group record (duplication, state import).
    pub fn insert_group_record(&mut self, group: Group) -> Result<GroupId, GraphError> {
        if self.groups.contains_key(&group.id) {
            return Err(GraphError::invalid(format!(
                "duplicate group id: {}",
                group.id
            )));
        }
        let id = group.id;
        self.groups.insert(id, group);
        Ok(id)
    }

    /// Remove a group together with its member nodes and, through the
    /// node cascade, every edge attached to a member.
    pub fn remove_group_with_members(
        &mut self,
        group_id: GroupId,
    ) -> Result<RemovedGroup, GraphError> {
        let group = self
            .groups
            .get(&group_id)
            .cloned()
            .ok_or_else(|| GraphError::not_found("group", group_id))?;

        let members = self.members_of(group_id);
        let mut edge_count = 0;
        for id in &members {
            if let Ok(removed) = self.remove_node(*id) {
                edge_count += removed.edges.len();
            }
        }
        self.groups.remove(&group_id);
        Ok(RemovedGroup {
            group,
            member_count: members.len(),
            edge_count,
        })
    }

    /// Look up a group by id.
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    /// All group records, sorted by id for deterministic iteration.
    pub fn groups(&self) -> Vec<&Group> {
        let mut groups: Vec<&Group> = self.groups.values().collect();
        groups.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        groups
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Member node ids of a group, in arena order.
    pub fn members_of(&self, group_id: GroupId) -> Vec<NodeId> {
        self.nodes()
            .filter(|n| n.group_id == Some(group_id))
            .map(|n| n.id)
            .collect()
    }

    // ─── Bounds & Lifecycle ──────────────────────────────────────────────

    /// Union of the card rects of the given nodes. `None` when no id
    /// resolves to a node.
    pub fn bounding_rect_of(&self, ids: impl IntoIterator<Item = NodeId>) -> Option<Rect> {
        Rect::bounding(ids.into_iter().filter_map(|id| Some(self.node(id)?.rect())))
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0 && self.groups.is_empty()
    }

    /// Drop all nodes, edges, and groups.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    // ─── Content Projection ──────────────────────────────────────────────

    /// Snapshot the observable state as plain, serializable records.
    pub fn content(&self) -> WorkflowContent {
        let nodes = self.nodes().cloned().collect();
        let edges = self.edges().cloned().collect();
        let groups = self.groups().into_iter().cloned().collect();
        WorkflowContent {
            nodes,
            edges,
            groups,
        }
    }

    /// Rebuild a graph from exported content, re-checking referential
    /// integrity along the way.
    pub fn from_content(content: WorkflowContent) -> Result<Self, GraphError> {
        let mut graph = WorkflowGraph::new();
        for group in content.groups {
            graph.insert_group_record(group)?;
        }
        for node in content.nodes {
            if let Some(group_id) = node.group_id
                && !graph.groups.contains_key(&group_id)
            {
                return Err(GraphError::not_found("group", group_id));
            }
            graph.insert_node_record(node)?;
        }
        for edge in content.edges {
            graph.insert_edge_record(edge)?;
        }
        Ok(graph)
    }
}

impl Default for WorkflowGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;

    fn chain(graph: &mut WorkflowGraph) -> (NodeId, NodeId, NodeId) {
        let prompt = graph.insert_node(NodeKind::Prompt, Position::ZERO);
        let generator = graph.insert_node(NodeKind::ImageGen, Position::new(300.0, 0.0));
        let gallery = graph.insert_node(NodeKind::Gallery, Position::new(600.0, 0.0));
        graph
            .connect(ConnectRequest::new(prompt, "text", generator, "text"))
            .unwrap();
        graph
            .connect(ConnectRequest::new(generator, "image", gallery, "image"))
            .unwrap();
        (prompt, generator, gallery)
    }

    #[test]
    fn insert_and_lookup() {
        let mut graph = WorkflowGraph::new();
        let id = graph.insert_node(NodeKind::Prompt, Position::new(10.0, 20.0));

        let node = graph.node(id).unwrap();
        assert_eq!(node.kind, NodeKind::Prompt);
        assert_eq!(node.position, Position::new(10.0, 20.0));
        assert!(!node.selected);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn remove_node_cascades_incident_edges() {
        let mut graph = WorkflowGraph::new();
        let (_, generator, _) = chain(&mut graph);
        assert_eq!(graph.edge_count(), 2);

        let edge_ids: Vec<EdgeId> = graph.edges().map(|e| e.id).collect();
        let removed = graph.remove_node(generator).unwrap();

        assert_eq!(removed.edges.len(), 2, "both incident edges cascade");
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.node_count(), 2);
        for id in edge_ids {
            assert!(graph.edge(id).is_none(), "edge index stays in sync");
        }
    }

    #[test]
    fn remove_unknown_node_is_an_error() {
        let mut graph = WorkflowGraph::new();
        let ghost = NodeId::fresh();
        let err = graph.remove_node(ghost).unwrap_err();
        assert!(matches!(err, GraphError::NotFound { entity: "node", .. }));
    }

    #[test]
    fn connect_rejects_self_loops_and_unknown_handles() {
        let mut graph = WorkflowGraph::new();
        let prompt = graph.insert_node(NodeKind::Prompt, Position::ZERO);
        let generator = graph.insert_node(NodeKind::ImageGen, Position::new(300.0, 0.0));

        let loop_err = graph
            .connect(ConnectRequest::new(generator, "image", generator, "text"))
            .unwrap_err();
        assert!(matches!(loop_err, GraphError::InvalidOperation(_)));

        let handle_err = graph
            .connect(ConnectRequest::new(prompt, "image", generator, "text"))
            .unwrap_err();
        assert!(matches!(handle_err, GraphError::InvalidOperation(_)));

        assert_eq!(graph.edge_count(), 0, "failed connects leave no edges");
    }

    #[test]
    fn connect_rejects_exact_duplicates() {
        let mut graph = WorkflowGraph::new();
        let prompt = graph.insert_node(NodeKind::Prompt, Position::ZERO);
        let generator = graph.insert_node(NodeKind::ImageGen, Position::new(300.0, 0.0));

        graph
            .connect(ConnectRequest::new(prompt, "text", generator, "text"))
            .unwrap();
        let err = graph
            .connect(ConnectRequest::new(prompt, "text", generator, "text"))
            .unwrap_err();

        assert!(matches!(err, GraphError::InvalidOperation(_)));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn connect_displaces_edge_on_occupied_input() {
        let mut graph = WorkflowGraph::new();
        let a = graph.insert_node(NodeKind::Prompt, Position::ZERO);
        let b = graph.insert_node(NodeKind::Prompt, Position::new(0.0, 200.0));
        let generator = graph.insert_node(NodeKind::ImageGen, Position::new(300.0, 0.0));

        let first = graph
            .connect(ConnectRequest::new(a, "text", generator, "text"))
            .unwrap();
        let second = graph
            .connect(ConnectRequest::new(b, "text", generator, "text"))
            .unwrap();

        assert!(graph.edge(first).is_none(), "old edge is displaced");
        assert_eq!(graph.edge(second).unwrap().source, b);
        assert_eq!(graph.edge_count(), 1, "one edge per input handle");
    }

    #[test]
    fn create_group_assigns_members_and_pads_bounds() {
        let mut graph = WorkflowGraph::new();
        let a = graph.insert_node(NodeKind::Prompt, Position::ZERO);
        let b = graph.insert_node(NodeKind::ImageGen, Position::new(400.0, 100.0));

        let group_id = graph.create_group(&[a, b]).unwrap();

        assert_eq!(graph.node(a).unwrap().group_id, Some(group_id));
        assert_eq!(graph.node(b).unwrap().group_id, Some(group_id));

        let rect = graph.group(group_id).unwrap().rect;
        let Size { width, height } = NodeKind::ImageGen.nominal_size();
        assert_eq!(rect.x, -GROUP_PADDING);
        assert_eq!(rect.y, -GROUP_PADDING);
        assert_eq!(rect.max_x(), 400.0 + width + GROUP_PADDING);
        assert_eq!(rect.max_y(), 100.0 + height + GROUP_PADDING);
    }

    #[test]
    fn create_group_with_unknown_member_changes_nothing() {
        let mut graph = WorkflowGraph::new();
        let a = graph.insert_node(NodeKind::Prompt, Position::ZERO);
        let ghost = NodeId::fresh();

        let err = graph.create_group(&[a, ghost]).unwrap_err();

        assert!(matches!(err, GraphError::NotFound { .. }));
        assert_eq!(graph.node(a).unwrap().group_id, None);
        assert_eq!(graph.group_count(), 0);
    }

    #[test]
    fn remove_group_cascades_members_and_edges() {
        let mut graph = WorkflowGraph::new();
        let (prompt, generator, gallery) = chain(&mut graph);
        let group_id = graph.create_group(&[prompt, generator]).unwrap();

        let removed = graph.remove_group_with_members(group_id).unwrap();

        assert_eq!(removed.member_count, 2);
        assert_eq!(removed.edge_count, 2, "edges counted once each");
        assert!(graph.node(prompt).is_none());
        assert!(graph.node(generator).is_none());
        assert!(graph.node(gallery).is_some(), "non-members survive");
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.group(group_id).is_none());
    }

    #[test]
    fn regrouping_reassigns_membership() {
        let mut graph = WorkflowGraph::new();
        let a = graph.insert_node(NodeKind::Prompt, Position::ZERO);
        let b = graph.insert_node(NodeKind::Prompt, Position::new(300.0, 0.0));

        let first = graph.create_group(&[a, b]).unwrap();
        let second = graph.create_group(&[b]).unwrap();

        assert_eq!(graph.node(a).unwrap().group_id, Some(first));
        assert_eq!(graph.node(b).unwrap().group_id, Some(second));
        assert_eq!(graph.members_of(first), vec![a]);
    }

    #[test]
    fn content_round_trips_through_export() {
        let mut graph = WorkflowGraph::new();
        let (prompt, generator, _) = chain(&mut graph);
        graph.create_group(&[prompt, generator]).unwrap();
        graph.set_selected(prompt, true).unwrap();

        let content = graph.content();
        let rebuilt = WorkflowGraph::from_content(content.clone()).unwrap();

        assert_eq!(rebuilt.content(), content);
        assert_eq!(rebuilt.node_count(), 3);
        assert_eq!(rebuilt.edge_count(), 2);
        assert_eq!(rebuilt.group_count(), 1);
        assert!(rebuilt.node(prompt).unwrap().selected);
    }

    #[test]
    fn clones_are_independent_snapshots() {
        let mut graph = WorkflowGraph::new();
        let (prompt, _, _) = chain(&mut graph);

        let snapshot = graph.clone();
        graph.remove_node(prompt).unwrap();

        assert!(graph.node(prompt).is_none());
        assert!(snapshot.node(prompt).is_some(), "snapshot is unaffected");
        assert_eq!(snapshot.edge_count(), 2);
    }
}
