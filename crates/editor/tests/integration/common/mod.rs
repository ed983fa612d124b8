//! Common utilities for editor integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use asyncflow_editor::{EditorState, Plugin, PluginKey, PluginView, ViewContext};
use asyncflow_primitives::Transaction;

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt::try_init();
}

/// Counts view hook invocations.
#[derive(Debug, Default)]
pub struct ViewCounters {
	pub updates: AtomicUsize,
	pub destroys: AtomicUsize,
}

impl ViewCounters {
	pub fn updates(&self) -> usize {
		self.updates.load(Ordering::SeqCst)
	}

	pub fn destroys(&self) -> usize {
		self.destroys.load(Ordering::SeqCst)
	}
}

/// Records every hook call as a line of text.
pub struct TracePlugin {
	key: PluginKey<Vec<String>>,
	label: &'static str,
	observe: Option<PluginKey<Vec<String>>>,
	counters: Arc<ViewCounters>,
}

impl TracePlugin {
	pub fn new(label: &'static str) -> Self {
		Self {
			key: PluginKey::new(label),
			label,
			observe: None,
			counters: Arc::default(),
		}
	}

	/// Also records how many lines `other` had when this plugin ran.
	pub fn observing(mut self, other: PluginKey<Vec<String>>) -> Self {
		self.observe = Some(other);
		self
	}

	pub fn state_key(&self) -> PluginKey<Vec<String>> {
		self.key
	}

	pub fn counters(&self) -> Arc<ViewCounters> {
		Arc::clone(&self.counters)
	}

	fn observed(&self, state: &EditorState) -> String {
		match self.observe.and_then(|key| key.get(state)) {
			Some(lines) => format!(" saw {}", lines.len()),
			None => String::new(),
		}
	}
}

impl Plugin for TracePlugin {
	type State = Vec<String>;

	fn key(&self) -> &PluginKey<Vec<String>> {
		&self.key
	}

	fn init(&self, state: &EditorState) -> Vec<String> {
		vec![format!("{} init{}", self.label, self.observed(state))]
	}

	fn apply(
		&self,
		tr: &Transaction,
		prev: &Vec<String>,
		old_state: &EditorState,
		new_state: &EditorState,
	) -> Vec<String> {
		let mut lines = prev.clone();
		lines.push(format!(
			"{} apply v{}->v{}{}",
			self.label,
			old_state.version(),
			new_state.version(),
			if tr.doc_changed() { " doc" } else { "" }
		));
		lines
	}

	fn view(&self) -> Option<Box<dyn PluginView>> {
		Some(Box::new(CountingView(Arc::clone(&self.counters))))
	}
}

struct CountingView(Arc<ViewCounters>);

impl PluginView for CountingView {
	fn update(&mut self, _ctx: &ViewContext<'_>, _old_state: &EditorState) {
		self.0.updates.fetch_add(1, Ordering::SeqCst);
	}

	fn destroy(&mut self, _ctx: &ViewContext<'_>) {
		self.0.destroys.fetch_add(1, Ordering::SeqCst);
	}
}
