//! Duplication of the node selection or a whole group.
//!
//! Clones get fresh ids and deep-copied payloads. Edges are cloned
//! only when both endpoints are part of the duplicated set, remapped
//! onto the clone ids; edges crossing the set boundary are not
//! duplicated. Placement translates every clone by one offset, by
//! default just past the source bounding box so clones never land on
//! top of their sources. The whole operation is a single undo step.

use crate::store::WorkflowStore;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use weft_graph::{Edge, EdgeId, GraphError, Group, GroupId, Node, NodeId, Position, Rect};

/// Gap between the source bounding box and the clones, in canvas units.
pub const DUPLICATE_MARGIN: f32 = 40.0;

/// What to duplicate and where to put it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateOptions {
    /// Duplicate this group's full membership instead of the current
    /// node selection. When `None`, a currently selected group (the
    /// store's group-selection context) takes the same role.
    pub group: Option<GroupId>,
    /// Translation applied to every clone. `None` picks the default
    /// placement: source bounding width plus margin, along +x.
    pub offset: Option<Position>,
}

impl WorkflowStore {
    /// Duplicate the selected nodes, or a group's full membership.
    ///
    /// Returns the clone ids in source order; empty when there was
    /// nothing to duplicate (reported, no-op). The clones become the
    /// new selection, and a cloned group becomes the selected group.
    pub fn duplicate_selected(&mut self, options: DuplicateOptions) -> Vec<NodeId> {
        // Resolve the source set.
        let group_target = options.group.or(self.selected_group());
        let source_ids: Vec<NodeId> = match group_target {
            Some(group_id) => {
                if self.graph().group(group_id).is_none() {
                    self.report(&GraphError::NotFound {
                        entity: "group",
                        id: group_id.to_string(),
                    });
                    return Vec::new();
                }
                self.graph().members_of(group_id)
            }
            None => self.graph().selected_nodes(),
        };
        if source_ids.is_empty() {
            self.report(&GraphError::InvalidOperation(
                "nothing selected to duplicate".into(),
            ));
            return Vec::new();
        }
        let source_set: HashSet<NodeId> = source_ids.iter().copied().collect();

        // Groups travel with the clones only when fully covered.
        let whole_groups: SmallVec<[GroupId; 2]> = self
            .graph()
            .groups()
            .into_iter()
            .filter(|group| {
                let members = self.graph().members_of(group.id);
                !members.is_empty() && members.iter().all(|m| source_set.contains(m))
            })
            .map(|group| group.id)
            .collect();

        // Placement: clones land beside the source bounds by default.
        let member_bounds = self.graph().bounding_rect_of(source_ids.iter().copied());
        let group_rects = whole_groups
            .iter()
            .filter_map(|id| Some(self.graph().group(*id)?.rect));
        let bounds = Rect::bounding(member_bounds.into_iter().chain(group_rects));
        let offset = options.offset.unwrap_or_else(|| {
            let width = bounds.map(|b| b.width).unwrap_or(0.0);
            Position::new(width + DUPLICATE_MARGIN, 0.0)
        });

        // One undo step for the whole duplication.
        self.push_history_snapshot();
        let graph = self.graph_mut();

        // Clone whole groups first so member clones can point at them.
        let mut group_map: HashMap<GroupId, GroupId> = HashMap::new();
        for group_id in &whole_groups {
            let Some(group) = graph.group(*group_id).cloned() else {
                continue;
            };
            let clone = Group {
                id: GroupId::fresh(),
                name: format!("{} Copy", group.name),
                rect: group.rect.translated(offset),
            };
            let clone_id = clone.id;
            if graph.insert_group_record(clone).is_ok() {
                group_map.insert(*group_id, clone_id);
            }
        }

        // Clone nodes with fresh ids and deep-copied payloads.
        let mut id_map: HashMap<NodeId, NodeId> = HashMap::new();
        let mut new_ids: Vec<NodeId> = Vec::with_capacity(source_ids.len());
        for old_id in &source_ids {
            let Some(original) = graph.node(*old_id).cloned() else {
                continue;
            };
            let clone = Node {
                id: NodeId::fresh(),
                kind: original.kind,
                position: original.position + offset,
                data: original.data,
                selected: false,
                // Members of partially covered groups come out detached.
                group_id: original.group_id.and_then(|g| group_map.get(&g).copied()),
            };
            let clone_id = clone.id;
            if graph.insert_node_record(clone).is_ok() {
                id_map.insert(*old_id, clone_id);
                new_ids.push(clone_id);
            }
        }

        // Remap edges whose endpoints both live in the source set.
        let internal_edges: Vec<Edge> = graph
            .edges()
            .filter(|e| source_set.contains(&e.source) && source_set.contains(&e.target))
            .cloned()
            .collect();
        for edge in internal_edges {
            let (Some(&source), Some(&target)) =
                (id_map.get(&edge.source), id_map.get(&edge.target))
            else {
                continue;
            };
            let _ = graph.insert_edge_record(Edge {
                id: EdgeId::fresh(),
                source,
                source_handle: edge.source_handle,
                target,
                target_handle: edge.target_handle,
                selected: false,
            });
        }

        // The clones become the selection.
        graph.select_only(&new_ids);
        if let Some(source_group) = group_target
            && let Some(&clone_group) = group_map.get(&source_group)
        {
            self.set_selected_group_unchecked(Some(clone_group));
        }

        log::debug!(
            "duplicated {} nodes ({} groups) at offset ({}, {})",
            new_ids.len(),
            group_map.len(),
            offset.x,
            offset.y
        );
        new_ids
    }
}
