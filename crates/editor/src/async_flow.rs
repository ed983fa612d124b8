//! Logs the last typed character after a debounce, resolved through an
//! [`AsyncQuery`].

use std::time::Duration;

use asyncflow_primitives::Transaction;
use asyncflow_query::{
	AsyncQuery, AsyncQueryOptions, QueryStatus, ViewUpdateOptions, compute_changed_ranges,
};
use tracing::{debug, info};

use crate::plugin::{Plugin, PluginKey, PluginView, ViewContext};
use crate::EditorState;


/// Settings for [`AsyncFlowPlugin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsyncFlowConfig {
	/// How long each query waits before resolving. Defaults to one second.
	pub debounce: Duration,
	/// Which query transitions are dispatched. Defaults to ignoring loading and
	/// canceled transitions.
	pub view_update: ViewUpdateOptions,
}

impl Default for AsyncFlowConfig {
	fn default() -> Self {
		Self {
			debounce: Duration::from_millis(1000),
			view_update: ViewUpdateOptions {
				ignore_canceled: true,
				ignore_loading: true,
				..ViewUpdateOptions::default()
			},
		}
	}
}

/// State of [`AsyncFlowPlugin`].
#[derive(Debug, Clone)]
pub struct AsyncFlowState {
	/// The current query. Its parameters are the character it resolves.
	pub query: AsyncQuery<String, String>,
	/// The most recently resolved character.
	pub query_result: Option<String>,
}

/// Resolves the character typed at the cursor through a debounced query.
///
/// Each new character cancels the pending query and starts another one; only
/// the last character typed within the debounce window is ever reported.
pub struct AsyncFlowPlugin {
	key: PluginKey<AsyncFlowState>,
	config: AsyncFlowConfig,
}

impl AsyncFlowPlugin {
	/// Creates the plugin.
	pub fn new(config: AsyncFlowConfig) -> Self {
		Self {
			key: PluginKey::new("async-flow"),
			config,
		}
	}

	/// Returns the key for reading the plugin's state.
	pub fn state_key(&self) -> PluginKey<AsyncFlowState> {
		self.key
	}

	fn create_query(&self, character: String) -> AsyncQuery<String, String> {
		let debounce = self.config.debounce;
		let value = character.clone();
		AsyncQuery::new(
			AsyncQueryOptions::new()
				.meta_key(self.key.meta_key())
				.parameters(character)
				.query(move || {
					let value = value.clone();
					async move {
						tokio::time::sleep(debounce).await;
						anyhow::Ok(value)
					}
				}),
		)
	}
}

impl Default for AsyncFlowPlugin {
	fn default() -> Self {
		Self::new(AsyncFlowConfig::default())
	}
}

impl Plugin for AsyncFlowPlugin {
	type State = AsyncFlowState;

	fn key(&self) -> &PluginKey<AsyncFlowState> {
		&self.key
	}

	fn init(&self, _state: &EditorState) -> AsyncFlowState {
		AsyncFlowState {
			query: AsyncQuery::empty(),
			query_result: None,
		}
	}

	fn apply(
		&self,
		tr: &Transaction,
		prev: &AsyncFlowState,
		_old_state: &EditorState,
		new_state: &EditorState,
	) -> AsyncFlowState {
		if prev.query.status_changed(tr, QueryStatus::Success) {
			return AsyncFlowState {
				query: prev.query.clone(),
				query_result: prev.query.data(),
			};
		}

		let Some(character) = typed_character(new_state, tr) else {
			return prev.clone();
		};
		if prev.query.parameters() == Some(&character) {
			return prev.clone();
		}

		prev.query.cancel();
		debug!(character = %character, replaced = %prev.query.query_id(), "async_flow.new_query");
		AsyncFlowState {
			query: self.create_query(character),
			query_result: prev.query_result.clone(),
		}
	}

	fn view(&self) -> Option<Box<dyn PluginView>> {
		Some(Box::new(AsyncFlowView {
			key: self.key,
			options: self.config.view_update,
		}))
	}
}

struct AsyncFlowView {
	key: PluginKey<AsyncFlowState>,
	options: ViewUpdateOptions,
}

impl PluginView for AsyncFlowView {
	fn update(&mut self, ctx: &ViewContext<'_>, old_state: &EditorState) {
		let Some(next) = self.key.get(ctx.state()) else {
			return;
		};

		if next.query.view_update(ctx.dispatcher(), self.options).is_some() {
			debug!(query = %next.query, "async_flow.query_started");
		}

		let prev_result = self.key.get(old_state).and_then(|prev| prev.query_result.as_ref());
		if let Some(result) = &next.query_result
			&& prev_result != Some(result)
		{
			info!(result = %result, "query data loaded");
		}
	}

	fn destroy(&mut self, ctx: &ViewContext<'_>) {
		if let Some(state) = self.key.get(ctx.state()) {
			state.query.view_destroy();
		}
	}
}

/// Returns the last character of the first change touching an empty selection.
fn typed_character(state: &EditorState, tr: &Transaction) -> Option<String> {
	let selection = state.selection();
	if !selection.is_empty() {
		return None;
	}

	let cursor = selection.span();
	let ranges = compute_changed_ranges(tr);
	let first = ranges.changed_ranges.iter().find(|range| range.intersects(&cursor))?;

	let doc = state.doc();
	if first.to > doc.len_chars() {
		return None;
	}
	doc.slice(first.from..first.to).chars().last().map(String::from)
}
