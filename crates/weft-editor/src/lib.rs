//! Editor state for a Weft workflow canvas: a synchronous store over
//! the graph with snapshot undo/redo, non-recording change batches,
//! and selection-or-group duplication.

pub mod changes;
pub mod duplicate;
pub mod history;
pub mod session;
pub mod store;

pub use changes::{EdgeChange, NodeChange};
pub use duplicate::{DUPLICATE_MARGIN, DuplicateOptions};
pub use history::{History, MAX_HISTORY_DEPTH};
pub use session::{
    LogSessionSink, MemoryNotifier, MemorySink, Notifier, NullNotifier, NullSessionSink,
    SessionEvent, SessionSink, Severity,
};
pub use store::WorkflowStore;
