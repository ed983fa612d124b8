use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use asyncflow_primitives::{MetaKey, Rope, Selection, Transaction};

use crate::ApplyError;
use crate::plugin::{ErasedPlugin, Plugin, PluginValue};

/// Immutable editor state: document, selection, and every plugin's state.
///
/// Cloning is cheap; the rope and plugin states are shared.
#[derive(Clone)]
pub struct EditorState {
	doc: Rope,
	version: u64,
	selection: Selection,
	plugins: Arc<[Arc<dyn ErasedPlugin>]>,
	plugin_states: HashMap<MetaKey, PluginValue>,
}

impl EditorState {
	/// Starts building a state around `doc`.
	pub fn builder(doc: impl Into<Rope>) -> EditorStateBuilder {
		EditorStateBuilder {
			doc: doc.into(),
			selection: None,
			plugins: Vec::new(),
		}
	}

	/// Returns the document.
	pub fn doc(&self) -> &Rope {
		&self.doc
	}

	/// Returns the document version, bumped by every document change.
	pub fn version(&self) -> u64 {
		self.version
	}

	/// Returns the selection.
	pub fn selection(&self) -> Selection {
		self.selection
	}

	/// Starts a transaction against this state.
	pub fn tr(&self) -> Transaction {
		Transaction::new(&self.doc, self.version)
	}

	/// Applies `tr`, producing the next state.
	///
	/// # Errors
	///
	/// Returns [`ApplyError::Mismatched`] if `tr` carries steps built against
	/// another document version. Metadata-only transactions apply to any version.
	pub fn apply(&self, tr: &Transaction) -> Result<EditorState, ApplyError> {
		let has_steps = !tr.steps().is_empty();
		if has_steps && tr.base_version() != self.version {
			return Err(ApplyError::Mismatched {
				expected: self.version,
				found: tr.base_version(),
			});
		}

		let doc = if has_steps {
			tr.doc().clone()
		} else {
			self.doc.clone()
		};
		let selection = tr
			.selection()
			.unwrap_or_else(|| tr.steps().iter().fold(self.selection, |sel, step| sel.map(step)))
			.clamp(doc.len_chars());
		let version = if tr.doc_changed() {
			self.version + 1
		} else {
			self.version
		};

		let mut next = EditorState {
			doc,
			version,
			selection,
			plugins: Arc::clone(&self.plugins),
			plugin_states: HashMap::with_capacity(self.plugins.len()),
		};

		for plugin in self.plugins.iter() {
			let key = plugin.key();
			let value = match self.plugin_states.get(&key) {
				Some(prev) => plugin.apply(tr, prev, self, &next),
				None => plugin.init(&next),
			};
			next.plugin_states.insert(key, value);
		}

		Ok(next)
	}

	pub(crate) fn plugin_state(&self, key: &MetaKey) -> Option<&(dyn std::any::Any + Send + Sync)> {
		self.plugin_states.get(key).map(|value| value.as_ref())
	}

	pub(crate) fn plugins(&self) -> &[Arc<dyn ErasedPlugin>] {
		&self.plugins
	}
}

impl fmt::Debug for EditorState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EditorState")
			.field("doc_len", &self.doc.len_chars())
			.field("version", &self.version)
			.field("selection", &self.selection)
			.field(
				"plugins",
				&self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
			)
			.finish()
	}
}

/// Builder for the initial [`EditorState`].
pub struct EditorStateBuilder {
	doc: Rope,
	selection: Option<Selection>,
	plugins: Vec<Arc<dyn ErasedPlugin>>,
}

impl EditorStateBuilder {
	/// Sets the initial selection. Defaults to a cursor at the end of the document.
	pub fn selection(mut self, selection: Selection) -> Self {
		self.selection = Some(selection);
		self
	}

	/// Registers a plugin. Plugins run in registration order.
	pub fn plugin<T: Plugin>(mut self, plugin: T) -> Self {
		self.plugins.push(Arc::new(plugin));
		self
	}

	/// Builds the state, running every plugin's `init` hook.
	pub fn build(self) -> EditorState {
		let len = self.doc.len_chars();
		let selection = self.selection.unwrap_or(Selection::point(len)).clamp(len);
		let mut state = EditorState {
			doc: self.doc,
			version: 0,
			selection,
			plugins: self.plugins.into(),
			plugin_states: HashMap::new(),
		};

		let plugins = Arc::clone(&state.plugins);
		for plugin in plugins.iter() {
			let value = plugin.init(&state);
			state.plugin_states.insert(plugin.key(), value);
		}
		state
	}
}
