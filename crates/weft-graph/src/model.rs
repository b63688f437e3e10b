//! Workflow data model: nodes, edges, groups, and node payloads.
//!
//! The canvas is a flat collection of typed nodes connected by handle-
//! addressed edges. Node payloads are a closed tagged union — one
//! variant per node kind — so a node's `kind` and its `data` always
//! agree, and patches are rejected when they target the wrong variant.

use crate::error::GraphError;
use crate::geometry::{Position, Rect, Size};
use crate::id::{EdgeId, GroupId, NodeId};
use serde::{Deserialize, Serialize};

// ─── Node Kinds & Ports ──────────────────────────────────────────────────

/// The node kinds available on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Text prompt authoring node.
    Prompt,
    /// Image generation node, consumes a prompt.
    ImageGen,
    /// Gallery node collecting generated images.
    Gallery,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Prompt => "prompt",
            NodeKind::ImageGen => "image-gen",
            NodeKind::Gallery => "gallery",
        }
    }

    /// Input handle names accepted by this kind.
    pub fn inputs(&self) -> &'static [&'static str] {
        match self {
            NodeKind::Prompt => &[],
            NodeKind::ImageGen => &["text"],
            NodeKind::Gallery => &["image"],
        }
    }

    /// Output handle names exposed by this kind.
    pub fn outputs(&self) -> &'static [&'static str] {
        match self {
            NodeKind::Prompt => &["text"],
            NodeKind::ImageGen => &["image"],
            NodeKind::Gallery => &[],
        }
    }

    /// Card footprint used for bounds, grouping, and placement.
    pub fn nominal_size(&self) -> Size {
        match self {
            NodeKind::Prompt => Size::new(240.0, 140.0),
            NodeKind::ImageGen => Size::new(220.0, 180.0),
            NodeKind::Gallery => Size::new(320.0, 240.0),
        }
    }
}

// ─── Node Payloads ───────────────────────────────────────────────────────

/// Payload of a [`NodeKind::Prompt`] node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptData {
    pub text: String,
}

/// Payload of a [`NodeKind::ImageGen`] node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageGenData {
    pub model: String,
    pub steps: u32,
    pub cfg_scale: f32,
    pub seed: Option<i64>,
}

impl Default for ImageGenData {
    fn default() -> Self {
        Self {
            model: "stable-diffusion-xl".into(),
            steps: 20,
            cfg_scale: 7.5,
            seed: None,
        }
    }
}

/// One generated image as it lands in a gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: String,
    pub seed: Option<i64>,
}

/// Payload of a [`NodeKind::Gallery`] node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GalleryData {
    pub images: Vec<GeneratedImage>,
}

/// Node payload — exactly one variant per [`NodeKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeData {
    Prompt(PromptData),
    ImageGen(ImageGenData),
    Gallery(GalleryData),
}

impl NodeData {
    /// The default payload for a freshly created node of `kind`.
    pub fn default_for(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Prompt => NodeData::Prompt(PromptData::default()),
            NodeKind::ImageGen => NodeData::ImageGen(ImageGenData::default()),
            NodeKind::Gallery => NodeData::Gallery(GalleryData::default()),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Prompt(_) => NodeKind::Prompt,
            NodeData::ImageGen(_) => NodeKind::ImageGen,
            NodeData::Gallery(_) => NodeKind::Gallery,
        }
    }

    /// Shallow-merge a patch into this payload. Fails without modifying
    /// anything when the patch targets a different kind.
    pub fn apply_patch(&mut self, patch: NodeDataPatch) -> Result<(), GraphError> {
        match (self, patch) {
            (NodeData::Prompt(data), NodeDataPatch::Prompt(p)) => {
                if let Some(text) = p.text {
                    data.text = text;
                }
                Ok(())
            }
            (NodeData::ImageGen(data), NodeDataPatch::ImageGen(p)) => {
                if let Some(model) = p.model {
                    data.model = model;
                }
                if let Some(steps) = p.steps {
                    data.steps = steps;
                }
                if let Some(cfg_scale) = p.cfg_scale {
                    data.cfg_scale = cfg_scale;
                }
                if let Some(seed) = p.seed {
                    data.seed = Some(seed);
                }
                Ok(())
            }
            (NodeData::Gallery(data), NodeDataPatch::Gallery(p)) => {
                data.images.extend(p.append_images);
                Ok(())
            }
            (data, patch) => Err(GraphError::invalid(format!(
                "cannot apply a {} patch to a {} node",
                patch.kind().label(),
                data.kind().label()
            ))),
        }
    }
}

// ─── Payload Patches ─────────────────────────────────────────────────────

/// Partial update for a prompt payload. `None` fields are left as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptPatch {
    pub text: Option<String>,
}

/// Partial update for an image-gen payload. `None` fields are left as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageGenPatch {
    pub model: Option<String>,
    pub steps: Option<u32>,
    pub cfg_scale: Option<f32>,
    pub seed: Option<i64>,
}

/// Append-only update for a gallery payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GalleryPatch {
    pub append_images: Vec<GeneratedImage>,
}

/// A kind-tagged partial update to a node payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeDataPatch {
    Prompt(PromptPatch),
    ImageGen(ImageGenPatch),
    Gallery(GalleryPatch),
}

impl NodeDataPatch {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeDataPatch::Prompt(_) => NodeKind::Prompt,
            NodeDataPatch::ImageGen(_) => NodeKind::ImageGen,
            NodeDataPatch::Gallery(_) => NodeKind::Gallery,
        }
    }

    /// Gallery appends stream in from generation runs; recording each
    /// one would bury the user's own edits in the undo stack, so they
    /// bypass history.
    pub fn is_history_exempt(&self) -> bool {
        matches!(self, NodeDataPatch::Gallery(_))
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// A single node on the workflow canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Top-left corner of the node card, in canvas units.
    pub position: Position,
    pub data: NodeData,
    pub selected: bool,
    /// The group this node belongs to, if any.
    pub group_id: Option<GroupId>,
}

impl Node {
    /// Create a node of `kind` at `position` with a fresh id and the
    /// kind's default payload.
    pub fn new(kind: NodeKind, position: Position) -> Self {
        Self {
            id: NodeId::fresh(),
            kind,
            position,
            data: NodeData::default_for(kind),
            selected: false,
            group_id: None,
        }
    }

    /// The node card's footprint on the canvas.
    pub fn rect(&self) -> Rect {
        Rect::from_position_size(self.position, self.kind.nominal_size())
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────

/// A directed connection from an output handle to an input handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub source_handle: String,
    pub target: NodeId,
    pub target_handle: String,
    pub selected: bool,
}

/// The endpoints of a connection attempt, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub source: NodeId,
    pub source_handle: String,
    pub target: NodeId,
    pub target_handle: String,
}

impl ConnectRequest {
    pub fn new(
        source: NodeId,
        source_handle: impl Into<String>,
        target: NodeId,
        target_handle: impl Into<String>,
    ) -> Self {
        Self {
            source,
            source_handle: source_handle.into(),
            target,
            target_handle: target_handle.into(),
        }
    }
}

// ─── Groups ──────────────────────────────────────────────────────────────

/// A named frame around a set of member nodes.
///
/// Membership lives on the nodes (`Node::group_id`); the group record
/// holds the display name and the frame rect computed from member
/// extents at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub rect: Rect,
}
