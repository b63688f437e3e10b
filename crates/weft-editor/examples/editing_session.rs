//! Drives a short editing session against the store and prints the
//! observable state after each stage. Run with `RUST_LOG=debug` to see
//! the store's own logging alongside.

use std::sync::Arc;
use weft_editor::{DuplicateOptions, LogSessionSink, NodeChange, NullNotifier, WorkflowStore};
use weft_graph::{ConnectRequest, NodeDataPatch, NodeKind, Position, PromptPatch};

fn main() {
    env_logger::init();

    let mut store =
        WorkflowStore::with_collaborators(Arc::new(LogSessionSink), Arc::new(NullNotifier));

    // Author the standard chain: prompt feeds a generator, images land
    // in a gallery.
    let prompt = store.add_node(NodeKind::Prompt, Position::ZERO);
    let generator = store.add_node(NodeKind::ImageGen, Position::new(320.0, 0.0));
    let gallery = store.add_node(NodeKind::Gallery, Position::new(640.0, 0.0));
    store.connect(ConnectRequest::new(prompt, "text", generator, "text"));
    store.connect(ConnectRequest::new(generator, "image", gallery, "image"));
    store.update_node_data(
        prompt,
        NodeDataPatch::Prompt(PromptPatch {
            text: Some("dusk harbor, rain".into()),
        }),
    );
    let Some(group) = store.create_group(&[prompt, generator]) else {
        eprintln!("grouping two freshly added nodes cannot fail");
        return;
    };
    print_state("authored", &store);

    // Duplicate the group, then drag the clones below the original as
    // one gesture: snapshot first, then a non-recorded move batch.
    store.set_selected_group(Some(group));
    let clones = store.duplicate_selected(DuplicateOptions::default());
    store.push_history_snapshot();
    let moves: Vec<NodeChange> = clones
        .iter()
        .filter_map(|id| {
            let position = store.graph().node(*id)?.position;
            Some(NodeChange::Position {
                id: *id,
                position: Position::new(position.x, position.y + 400.0),
            })
        })
        .collect();
    store.apply_node_changes(&moves);
    print_state("duplicated and dragged", &store);

    // Walk the whole session back, then forward again.
    while store.undo() {}
    print_state("fully undone", &store);
    while store.redo() {}
    print_state("fully redone", &store);
}

fn print_state(stage: &str, store: &WorkflowStore) {
    println!(
        "{stage}: {} nodes, {} edges, {} groups (undo {} / redo {})",
        store.graph().node_count(),
        store.graph().edge_count(),
        store.graph().group_count(),
        store.history().undo_depth(),
        store.history().redo_depth(),
    );
}
