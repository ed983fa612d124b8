//! State transitions, view hooks, dispatch queue, and undo history.

use asyncflow_editor::{ApplyError, EditorState, EditorView};
use asyncflow_primitives::{MetaKey, Selection, UndoPolicy};
use asyncflow_query::QuerySink;
use pretty_assertions::assert_eq;

use crate::common::{TracePlugin, init_tracing};

#[test]
fn plugins_init_and_apply_in_registration_order() {
	let first = TracePlugin::new("first");
	let first_key = first.state_key();
	let second = TracePlugin::new("second").observing(first_key);
	let second_key = second.state_key();

	let state = EditorState::builder("abc").plugin(first).plugin(second).build();
	assert_eq!(second_key.get(&state).unwrap(), &vec!["second init saw 1".to_string()]);

	let mut tr = state.tr();
	tr.insert(3, "d").unwrap();
	let next = state.apply(&tr).unwrap();

	assert_eq!(next.doc().to_string(), "abcd");
	assert_eq!(
		first_key.get(&next).unwrap(),
		&vec!["first init".to_string(), "first apply v0->v1 doc".to_string()]
	);
	assert_eq!(second_key.get(&next).unwrap().len(), 2);
	// The old state is untouched.
	assert_eq!(first_key.get(&state).unwrap().len(), 1);
	assert_eq!(state.doc().to_string(), "abc");
}

#[test]
fn mismatched_transaction_is_rejected() {
	let state = EditorState::builder("abc").build();
	let mut stale = state.tr();
	stale.insert(0, "x").unwrap();

	let mut tr = state.tr();
	tr.insert(3, "y").unwrap();
	let next = state.apply(&tr).unwrap();

	assert_eq!(
		next.apply(&stale).unwrap_err(),
		ApplyError::Mismatched { expected: 1, found: 0 }
	);
}

#[test]
fn metadata_only_transaction_applies_at_any_version() {
	let state = EditorState::builder("abc").build();
	let stale = state.tr();

	let mut tr = state.tr();
	tr.delete(0, 1).unwrap();
	let next = state.apply(&tr).unwrap();

	let after = next.apply(&stale).unwrap();
	assert_eq!(after.doc().to_string(), "bc");
	assert_eq!(after.version(), next.version());
}

#[test]
fn selection_maps_through_steps() {
	let state = EditorState::builder("hello world")
		.selection(Selection::point(6))
		.build();
	let mut tr = state.tr();
	tr.insert(0, ">> ").unwrap();
	let next = state.apply(&tr).unwrap();
	assert_eq!(next.selection(), Selection::point(9));

	let mut tr = next.tr();
	tr.set_selection(Selection::new(0, 99));
	let clamped = next.apply(&tr).unwrap();
	assert_eq!(clamped.selection(), Selection::new(0, 14));
	assert_eq!(clamped.version(), next.version());
}

#[test]
fn view_hooks_run_per_transition_and_destroy_once() {
	init_tracing();
	let plugin = TracePlugin::new("trace");
	let counters = plugin.counters();
	let mut view = EditorView::new(EditorState::builder("").plugin(plugin).build());

	view.insert_text("a").unwrap();
	view.set_selection(Selection::point(0)).unwrap();
	assert_eq!(counters.updates(), 2);

	view.destroy();
	view.destroy();
	assert!(view.is_destroyed());
	drop(view);
	assert_eq!(counters.destroys(), 1);
}

#[test]
fn dropping_view_runs_destroy() {
	let plugin = TracePlugin::new("trace");
	let counters = plugin.counters();
	drop(EditorView::new(EditorState::builder("").plugin(plugin).build()));
	assert_eq!(counters.destroys(), 1);
}

#[test]
fn queued_transactions_apply_on_drain() {
	let plugin = TracePlugin::new("trace");
	let key = plugin.state_key();
	let mut view = EditorView::new(EditorState::builder("abc").plugin(plugin).build());
	let dispatcher = view.dispatcher();

	let mut tr = dispatcher.transaction();
	tr.insert(3, "!").unwrap();
	dispatcher.dispatch(tr);
	dispatcher.dispatch(dispatcher.transaction());
	assert_eq!(view.state().doc().to_string(), "abc");

	assert_eq!(view.drain(), 2);
	assert_eq!(view.state().doc().to_string(), "abc!");
	assert_eq!(key.get(view.state()).unwrap().len(), 3);
}

#[test]
fn stale_queued_transaction_is_dropped() {
	let mut view = EditorView::new(EditorState::builder("abc").build());
	let dispatcher = view.dispatcher();

	let mut stale = dispatcher.transaction();
	stale.insert(0, "x").unwrap();
	view.insert_text("y").unwrap();
	dispatcher.dispatch(stale);

	assert_eq!(view.drain(), 0);
	assert_eq!(view.state().doc().to_string(), "abcy");
}

#[tokio::test(flavor = "current_thread")]
async fn background_task_feeds_view() {
	let mut view = EditorView::new(EditorState::builder("abc").build());
	let dispatcher = view.dispatcher();
	let key = MetaKey::named("background");

	tokio::spawn(async move {
		let mut tr = dispatcher.transaction();
		tr.set_meta(key, 7u8);
		dispatcher.dispatch(tr);
	});

	view.next_dispatch().await.unwrap();
	assert_eq!(view.state().doc().to_string(), "abc");
}

#[test]
fn undo_reverts_recorded_edits() {
	let mut view = EditorView::new(EditorState::builder("hello").build());
	view.insert_text(" world").unwrap();

	let mut tr = view.state().tr();
	tr.replace(0, 1, "J").unwrap().insert(0, "[").unwrap();
	view.dispatch(tr).unwrap();
	assert_eq!(view.state().doc().to_string(), "[Jello world");
	assert_eq!(view.history().len(), 2);

	assert!(view.undo().unwrap());
	assert_eq!(view.state().doc().to_string(), "hello world");
	assert_eq!(view.state().selection(), Selection::point(11));

	assert!(view.undo().unwrap());
	assert_eq!(view.state().doc().to_string(), "hello");
	assert!(!view.undo().unwrap());
}

#[test]
fn skipped_transactions_stay_out_of_history() {
	let mut view = EditorView::new(EditorState::builder("abc").build());
	view.insert_text("d").unwrap();

	let mut tag = view.state().tr();
	tag.set_meta(MetaKey::unique(), ()).set_undo_policy(UndoPolicy::Skip);
	view.dispatch(tag).unwrap();
	assert_eq!(view.history().len(), 1);

	let mut remote = view.state().tr();
	remote.insert(0, "r").unwrap().set_undo_policy(UndoPolicy::Skip);
	view.dispatch(remote).unwrap();
	assert!(view.history().is_empty());
	assert_eq!(view.state().doc().to_string(), "rabcd");
}
