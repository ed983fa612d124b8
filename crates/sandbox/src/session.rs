//! The scripted typing session.

use std::time::Duration;

use asyncflow_editor::{ApplyError, AsyncFlowPlugin, EditorState, EditorView};
use asyncflow_primitives::Selection;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};

use crate::config::SandboxConfig;

/// Document the session types into.
pub const INITIAL_TEXT: &str = "This editor uses queries to implement async behavior. It uses promises to log the last character typed on a 1 second debounce.";

/// Types `config.text` at the end of [`INITIAL_TEXT`] and waits for the last
/// query to settle. Returns the last resolved character.
pub async fn run(config: &SandboxConfig) -> anyhow::Result<Option<String>> {
	let plugin = AsyncFlowPlugin::new(config.flow_config());
	let key = plugin.state_key();
	let state = EditorState::builder(INITIAL_TEXT)
		.selection(Selection::point(INITIAL_TEXT.chars().count()))
		.plugin(plugin)
		.build();
	let mut view = EditorView::new(state);

	info!(chars = config.text.chars().count(), "session.start");
	let mut buf = [0; 4];
	for ch in config.text.chars() {
		view.insert_text(ch.encode_utf8(&mut buf))?;
		pump(&mut view, config.interval()).await?;
	}

	// One extra interval of slack past the last debounce.
	pump(&mut view, config.debounce() + config.interval()).await?;

	let result = key.get(view.state()).and_then(|state| state.query_result.clone());
	info!(doc = %view.state().doc(), "session.finished");
	view.destroy();
	Ok(result)
}

/// Applies dispatched transactions as they arrive until `window` elapsed.
async fn pump(view: &mut EditorView, window: Duration) -> Result<(), ApplyError> {
	let deadline = Instant::now() + window;
	loop {
		tokio::select! {
			applied = view.next_dispatch() => {
				applied?;
				debug!(version = view.state().version(), "session.applied_dispatch");
			}
			() = sleep_until(deadline) => return Ok(()),
		}
	}
}
