pub mod error;
pub mod geometry;
pub mod graph;
pub mod id;
pub mod model;

pub use error::GraphError;
pub use geometry::{Position, Rect, Size};
pub use graph::{GROUP_PADDING, RemovedGroup, RemovedNode, WorkflowContent, WorkflowGraph};
pub use id::{EdgeId, GroupId, NodeId};
pub use model::*;
