use outliner_core::tree::edit::{expand, move_down};
use outliner_core::{Session, State, ROOT_THING};

fn two_items() -> State {
    let (state, _) = State::empty().add_child(ROOT_THING, "a");
    let (state, _) = state.add_child(ROOT_THING, "b");
    state
}

#[test]
fn new_session_shows_root_thing() {
    let session = Session::new(two_items());
    let tree = session.tree();
    let root = tree.root();
    assert_eq!(tree.thing(root), ROOT_THING);
    assert!(tree.expanded(root));
    assert_eq!(tree.children(root).len(), 2);
    assert!(session.history().is_empty());
}

#[test]
fn undo_restores_previous_state_and_view() {
    let mut session = Session::new(two_items());
    let root = session.tree().root();
    let a_node = session.tree().children(root)[0];

    let (thing, node) = session.create_child(a_node);
    assert!(session.state().exists(&thing));
    assert!(session.tree().has_focus(node));
    assert_eq!(session.history().len(), 1);

    assert!(session.undo());
    assert!(!session.state().exists(&thing));
    assert!(session.tree().children(a_node).is_empty());
    assert_eq!(session.tree().focused(), None);
    assert!(!session.undo());
}

#[test]
fn edits_without_graph_change_are_not_recorded() {
    let mut session = Session::new(two_items());
    let root = session.tree().root();
    let a_node = session.tree().children(root)[0];

    session.indent(a_node);
    session.set_content(a_node, "");
    session.toggle(root);
    session.focus_down();
    assert!(session.history().is_empty());

    session.set_content(a_node, "hello");
    assert_eq!(session.state().content("a"), Some("hello"));
    assert_eq!(session.history().len(), 1);
}

#[test]
fn history_limit_bounds_undo_depth() {
    let mut session = Session::with_history_limit(two_items(), 2);
    let root = session.tree().root();
    let a_node = session.tree().children(root)[0];

    for content in ["one", "two", "three"] {
        session.set_content(a_node, content);
    }
    assert_eq!(session.history().len(), 2);
    assert!(session.undo());
    assert!(session.undo());
    assert!(!session.undo());
    assert_eq!(session.state().content("a"), Some("one"));
}

#[test]
fn structural_edits_prune_unreachable_positions() {
    let mut session = Session::new(two_items());
    let root = session.tree().root();
    let b_node = session.tree().children(root)[1];

    session.indent(b_node);
    let a_node = session.tree().children(root)[0];
    assert_eq!(session.state().children("a"), vec!["b"]);
    assert!(session.tree().get(b_node).is_none());
    assert_eq!(
        session.tree().arena_len(),
        session.tree().all_nodes().count()
    );

    let moved = session.tree().children(a_node)[0];
    session.unindent(moved);
    assert_eq!(session.state().children(ROOT_THING), vec!["a", "b"]);
    assert!(session.undo());
    assert_eq!(session.state().children("a"), vec!["b"]);
    assert_eq!(session.tree().children(root).len(), 1);
    assert_eq!(
        session.tree().arena_len(),
        session.tree().all_nodes().count()
    );
}

#[test]
fn remove_and_remove_thing_go_through_history() {
    let mut session = Session::new(two_items());
    let root = session.tree().root();
    let b_node = session.tree().children(root)[1];
    session.remove(b_node);
    assert_eq!(session.state().children(ROOT_THING), vec!["a"]);
    assert!(session.state().exists("b"));

    let a_node = session.tree().children(root)[0];
    session.remove_thing(a_node);
    assert!(!session.state().exists("a"));
    assert_eq!(session.history().len(), 2);

    assert!(session.undo());
    assert!(session.undo());
    assert_eq!(session.state().children(ROOT_THING), vec!["a", "b"]);
    assert_eq!(session.tree().children(root).len(), 2);
}

#[test]
fn apply_accepts_arbitrary_transactions() {
    let (state, _) = two_items().add_child("a", "a1");
    let (state, _) = state.add_child("a", "a2");
    let mut session = Session::new(state);
    let root = session.tree().root();
    let a_node = session.tree().children(root)[0];

    session.update_tree("expand", |state, tree| expand(state, tree, a_node));
    let a1 = session.tree().children(a_node)[0];
    session.apply("move_down", |state, tree| move_down(state, tree, a1));
    assert_eq!(session.state().children("a"), vec!["a2", "a1"]);
    assert_eq!(session.history().len(), 1);
}

#[test]
fn select_zooms_into_a_thing() {
    let mut session = Session::new(two_items());
    session.select("a");
    let tree = session.tree();
    let root = tree.root();
    assert_eq!(tree.thing(root), "a");
    assert_eq!(tree.other_parents_children(root).len(), 1);
    assert!(session.history().is_empty());
}

#[test]
fn create_sibling_after_focuses_new_item() {
    let mut session = Session::new(two_items());
    let root = session.tree().root();
    let a_node = session.tree().children(root)[0];
    let (thing, node) = session.create_sibling_after(a_node);
    assert_eq!(session.state().children(ROOT_THING)[1], thing);
    assert!(session.tree().has_focus(node));

    session.focus_up();
    assert!(session.tree().has_focus(a_node));
}

#[test]
fn thing_shown_at_the_top_is_never_removed() {
    let (state, _) = two_items().add_child("a", "b");
    let (state, _) = state.add_child("b", "a");
    let mut session = Session::new(state);
    session.select("a");
    let root = session.tree().root();
    let b_node = session.tree().children(root)[0];
    session.toggle(b_node);
    let inner_a = session.tree().children(b_node)[0];
    assert_eq!(session.tree().thing(inner_a), "a");

    session.remove_thing(inner_a);
    assert!(session.state().exists("a"));
    assert_eq!(session.tree().thing(root), "a");
    assert_eq!(session.tree().children(b_node), &[inner_a]);
    assert!(session.history().is_empty());
}
