//! Integration tests: snapshot undo/redo through the workflow store.
//!
//! Exercises the history laws end to end: every recorded action can be
//! walked back to the exact prior state, redo mirrors undo, new
//! actions drop the redoable future, and exempt updates leave the
//! stacks alone.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use weft_editor::{
    LogSessionSink, MAX_HISTORY_DEPTH, MemoryNotifier, NullNotifier, NullSessionSink,
    WorkflowStore,
};
use weft_graph::{
    ConnectRequest, GalleryPatch, GeneratedImage, ImageGenPatch, NodeData, NodeDataPatch, NodeKind,
    Position, PromptPatch, WorkflowContent,
};

fn make_store() -> WorkflowStore {
    let _ = env_logger::builder().is_test(true).try_init();
    WorkflowStore::with_collaborators(Arc::new(LogSessionSink), Arc::new(NullNotifier))
}

fn prompt_text(text: &str) -> NodeDataPatch {
    NodeDataPatch::Prompt(PromptPatch {
        text: Some(text.into()),
    })
}

// ─── Exact restore for every recorded action ────────────────────────────

#[test]
fn undo_walks_back_through_every_recorded_action() {
    let mut store = make_store();
    let mut stages: Vec<WorkflowContent> = Vec::new();

    stages.push(store.graph().content());
    let prompt = store.add_node(NodeKind::Prompt, Position::ZERO);

    stages.push(store.graph().content());
    let generator = store.add_node(NodeKind::ImageGen, Position::new(320.0, 0.0));

    stages.push(store.graph().content());
    let edge = store
        .connect(ConnectRequest::new(prompt, "text", generator, "text"))
        .unwrap();

    stages.push(store.graph().content());
    store.update_node_data(prompt, prompt_text("dusk harbor, rain"));

    stages.push(store.graph().content());
    store.remove_edge(edge);

    stages.push(store.graph().content());
    store
        .connect(ConnectRequest::new(prompt, "text", generator, "text"))
        .unwrap();

    stages.push(store.graph().content());
    store.remove_node(generator);

    stages.push(store.graph().content());
    let group = store.create_group(&[prompt]).unwrap();

    stages.push(store.graph().content());
    store.delete_group_with_nodes(group);

    // Walk the whole session backwards, one exact restore per action.
    for expected in stages.iter().rev() {
        assert!(store.undo(), "an undo entry exists per recorded action");
        assert_eq!(&store.graph().content(), expected);
    }
    assert!(!store.can_undo());
}

// ─── The cascade scenario ───────────────────────────────────────────────

#[test]
fn removing_a_connected_node_cascades_and_undo_restores() {
    let mut store = make_store();
    let prompt = store.add_node(NodeKind::Prompt, Position::ZERO);
    let generator = store.add_node(NodeKind::ImageGen, Position::new(200.0, 0.0));
    let edge = store
        .connect(ConnectRequest::new(prompt, "text", generator, "text"))
        .unwrap();
    let before_removal = store.graph().content();

    store.remove_node(prompt);
    assert_eq!(store.graph().node_count(), 1);
    assert_eq!(store.graph().edge_count(), 0, "cascade removed the edge");

    assert!(store.undo());
    assert_eq!(store.graph().content(), before_removal);
    assert!(store.graph().node(prompt).is_some());
    assert!(
        store.graph().edge(edge).is_some(),
        "edge restored with its original id"
    );
}

// ─── Redo ───────────────────────────────────────────────────────────────

#[test]
fn redo_reapplies_undone_action() {
    let mut store = make_store();
    store.add_node(NodeKind::Prompt, Position::ZERO);
    let after = store.graph().content();

    assert!(store.undo());
    assert!(store.graph().is_empty());

    assert!(store.redo());
    assert_eq!(store.graph().content(), after);
    assert!(!store.can_redo());
    assert!(store.can_undo());
}

#[test]
fn undo_then_redo_is_lossless() {
    let mut store = make_store();
    let prompt = store.add_node(NodeKind::Prompt, Position::ZERO);
    let generator = store.add_node(NodeKind::ImageGen, Position::new(320.0, 0.0));
    store
        .connect(ConnectRequest::new(prompt, "text", generator, "text"))
        .unwrap();
    store.create_group(&[prompt, generator]).unwrap();
    let after = store.graph().content();

    assert!(store.undo());
    assert!(store.redo());

    assert_eq!(store.graph().content(), after);
}

#[test]
fn new_action_clears_redo_stack() {
    let mut store = make_store();
    store.add_node(NodeKind::Prompt, Position::ZERO);
    store.undo();
    assert!(store.can_redo(), "should be able to redo after undo");

    store.add_node(NodeKind::Gallery, Position::ZERO);

    assert!(
        !store.can_redo(),
        "redo stack should be cleared after new action"
    );
}

// ─── Empty stack edge cases ─────────────────────────────────────────────

#[test]
fn undo_redo_on_empty_history_are_noops() {
    let mut store = make_store();
    store.add_node(NodeKind::Prompt, Position::ZERO);
    store.clear_history();
    let before = store.graph().content();

    assert!(!store.undo());
    assert!(!store.redo());
    assert_eq!(store.graph().content(), before);
}

// ─── Payload edits ──────────────────────────────────────────────────────

#[test]
fn payload_edits_record_and_undo_in_order() {
    let mut store = make_store();
    let prompt = store.add_node(NodeKind::Prompt, Position::ZERO);
    store.update_node_data(prompt, prompt_text("alpha"));
    store.update_node_data(prompt, prompt_text("beta"));
    assert_eq!(
        store.history().undo_depth(),
        3,
        "one undo entry per recorded edit"
    );

    let text_of = |store: &WorkflowStore| match &store.graph().node(prompt).unwrap().data {
        NodeData::Prompt(data) => data.text.clone(),
        other => panic!("expected prompt payload, got {other:?}"),
    };

    assert_eq!(text_of(&store), "beta");
    store.undo();
    assert_eq!(text_of(&store), "alpha");
    store.undo();
    assert_eq!(text_of(&store), "", "back to the default payload");
}

#[test]
fn mismatched_payload_patch_is_a_silent_noop() {
    let notifier = MemoryNotifier::new();
    let mut store =
        WorkflowStore::with_collaborators(Arc::new(NullSessionSink), notifier.clone());
    let prompt = store.add_node(NodeKind::Prompt, Position::ZERO);
    store.update_node_data(prompt, prompt_text("keep me"));
    let before = store.graph().content();
    let depth = store.history().undo_depth();

    // Wrong-kind patches through both the exempt and recorded paths.
    store.update_node_data(
        prompt,
        NodeDataPatch::Gallery(GalleryPatch {
            append_images: vec![GeneratedImage {
                url: "blob:oops".into(),
                seed: None,
            }],
        }),
    );
    store.update_node_data(prompt, NodeDataPatch::ImageGen(ImageGenPatch::default()));

    assert_eq!(store.graph().content(), before);
    assert_eq!(store.history().undo_depth(), depth, "no snapshots pushed");
    assert_eq!(notifier.notices().len(), 2, "both rejections surfaced");
}

// ─── History exemption ──────────────────────────────────────────────────

#[test]
fn gallery_appends_bypass_history() {
    let mut store = make_store();
    let gallery = store.add_node(NodeKind::Gallery, Position::ZERO);
    store.clear_history();

    for n in 0..3 {
        store.update_node_data(
            gallery,
            NodeDataPatch::Gallery(GalleryPatch {
                append_images: vec![GeneratedImage {
                    url: format!("blob:{n}"),
                    seed: Some(n),
                }],
            }),
        );
    }

    assert!(!store.can_undo(), "appends recorded nothing");
    let NodeData::Gallery(data) = &store.graph().node(gallery).unwrap().data else {
        panic!("expected gallery payload");
    };
    assert_eq!(data.images.len(), 3, "appends still applied");

    // A normal recorded action afterwards behaves as usual.
    store.add_node(NodeKind::Prompt, Position::new(400.0, 0.0));
    assert!(store.can_undo());
}

#[test]
fn exempt_updates_do_not_disturb_a_parked_redo() {
    let mut store = make_store();
    let gallery = store.add_node(NodeKind::Gallery, Position::ZERO);
    store.add_node(NodeKind::Prompt, Position::new(400.0, 0.0));

    store.undo();
    assert!(store.can_redo());
    let undo_depth = store.history().undo_depth();

    // A generation result streams in while the user sits mid-history.
    store.update_node_data(
        gallery,
        NodeDataPatch::Gallery(GalleryPatch {
            append_images: vec![GeneratedImage {
                url: "blob:late".into(),
                seed: None,
            }],
        }),
    );

    assert!(store.can_redo(), "redo stack untouched by the exempt update");
    assert_eq!(store.history().undo_depth(), undo_depth);
}

// ─── Depth cap ──────────────────────────────────────────────────────────

#[test]
fn history_depth_is_capped() {
    let mut store = make_store();
    for i in 0..(MAX_HISTORY_DEPTH + 3) {
        store.add_node(NodeKind::Prompt, Position::new(i as f32 * 10.0, 0.0));
    }
    assert_eq!(store.history().undo_depth(), MAX_HISTORY_DEPTH);

    let mut undone = 0;
    while store.undo() {
        undone += 1;
    }
    assert_eq!(undone, MAX_HISTORY_DEPTH);
    assert_eq!(
        store.graph().node_count(),
        3,
        "the oldest actions fell off the stack and are permanent"
    );
}

// ─── Clearing ───────────────────────────────────────────────────────────

#[test]
fn clear_history_keeps_the_graph() {
    let mut store = make_store();
    store.add_node(NodeKind::Prompt, Position::ZERO);
    store.add_node(NodeKind::Gallery, Position::new(400.0, 0.0));
    store.undo();

    store.clear_history();

    assert!(!store.can_undo());
    assert!(!store.can_redo());
    assert_eq!(store.graph().node_count(), 1, "live graph untouched");
}
