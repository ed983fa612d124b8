//! One plugin slot owning successive queries, driven through a real view.

use std::time::Duration;

use asyncflow_editor::{EditorState, EditorView, Plugin, PluginKey, PluginView, ViewContext};
use asyncflow_primitives::{MetaKey, Transaction};
use asyncflow_query::{AsyncQuery, AsyncQueryOptions, QueryStatus, ViewUpdateOptions};
use pretty_assertions::assert_eq;
use tokio::time::Instant;

use crate::common::init_tracing;

/// Transactions carrying a value under this key start a new query for it.
const START: MetaKey = MetaKey::named("start-query");

#[derive(Debug, Clone)]
struct SlotState {
	query: AsyncQuery<&'static str, String>,
	loading_seen: usize,
	errors_seen: usize,
	result: Option<String>,
}

struct SlotPlugin {
	key: PluginKey<SlotState>,
	delay: Duration,
}

impl Plugin for SlotPlugin {
	type State = SlotState;

	fn key(&self) -> &PluginKey<SlotState> {
		&self.key
	}

	fn init(&self, _state: &EditorState) -> SlotState {
		SlotState {
			query: AsyncQuery::empty(),
			loading_seen: 0,
			errors_seen: 0,
			result: None,
		}
	}

	fn apply(
		&self,
		tr: &Transaction,
		prev: &SlotState,
		_old_state: &EditorState,
		_new_state: &EditorState,
	) -> SlotState {
		let mut next = prev.clone();
		if prev.query.status_changed(tr, QueryStatus::Loading) {
			next.loading_seen += 1;
		}
		if prev.query.status_changed(tr, QueryStatus::Error) {
			next.errors_seen += 1;
		}
		if prev.query.status_changed(tr, QueryStatus::Success) {
			next.result = prev.query.data();
		}

		if let Some(&parameters) = tr.meta::<&'static str>(&START) {
			prev.query.cancel();
			let delay = self.delay;
			next.query = AsyncQuery::new(
				AsyncQueryOptions::new()
					.meta_key(self.key.meta_key())
					.parameters(parameters)
					.query(move || async move {
						tokio::time::sleep(delay).await;
						Ok(parameters.to_uppercase())
					}),
			);
		}
		next
	}

	fn view(&self) -> Option<Box<dyn PluginView>> {
		Some(Box::new(SlotView(self.key)))
	}
}

struct SlotView(PluginKey<SlotState>);

impl PluginView for SlotView {
	fn update(&mut self, ctx: &ViewContext<'_>, _old_state: &EditorState) {
		if let Some(state) = self.0.get(ctx.state()) {
			let _started = state.query.view_update(ctx.dispatcher(), ViewUpdateOptions::default());
		}
	}

	fn destroy(&mut self, ctx: &ViewContext<'_>) {
		if let Some(state) = self.0.get(ctx.state()) {
			state.query.view_destroy();
		}
	}
}

fn slot_editor() -> (EditorView, PluginKey<SlotState>) {
	init_tracing();
	let key = PluginKey::new("slot");
	let plugin = SlotPlugin {
		key,
		delay: Duration::from_millis(10),
	};
	(EditorView::new(EditorState::builder("doc").plugin(plugin).build()), key)
}

fn start(view: &mut EditorView, parameters: &'static str) {
	let mut tr = view.state().tr();
	tr.set_meta(START, parameters);
	view.dispatch(tr).unwrap();
}

fn slot(view: &EditorView, key: PluginKey<SlotState>) -> SlotState {
	key.get(view.state()).cloned().unwrap()
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn loading_then_success_round_trip() {
	let (mut view, key) = slot_editor();
	let began = Instant::now();
	start(&mut view, "a");

	// The loading tag was queued synchronously by the view update.
	assert_eq!(view.drain(), 1);
	assert_eq!(slot(&view, key).loading_seen, 1);

	view.next_dispatch().await.unwrap();
	assert!(began.elapsed() >= Duration::from_millis(10));

	let state = slot(&view, key);
	assert_eq!(state.query.status(), QueryStatus::Success);
	assert_eq!(state.query.data().as_deref(), Some("A"));
	assert_eq!(state.result.as_deref(), Some("A"));
	assert!(view.history().is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn replaced_query_tags_do_not_match_successor() {
	let (mut view, key) = slot_editor();
	start(&mut view, "a");
	view.drain();
	let first = slot(&view, key).query;

	tokio::time::sleep(Duration::from_millis(5)).await;
	start(&mut view, "b");
	assert!(first.canceled());
	view.drain();

	// First the canceled query's completion, then the successor's.
	view.next_dispatch().await.unwrap();
	let state = slot(&view, key);
	assert_eq!(state.errors_seen, 0);
	assert_eq!(state.result, None);

	view.next_dispatch().await.unwrap();
	let state = slot(&view, key);
	assert_eq!(state.result.as_deref(), Some("B"));
	assert_eq!(state.loading_seen, 2);
	assert_eq!(first.status(), QueryStatus::Error);
	assert_eq!(first.data(), None);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn destroying_view_cancels_live_query() {
	let (mut view, key) = slot_editor();
	start(&mut view, "a");
	let query = slot(&view, key).query;
	drop(view);

	assert!(query.canceled());
	tokio::time::sleep(Duration::from_millis(50)).await;
	assert_eq!(query.status(), QueryStatus::Error);
}
