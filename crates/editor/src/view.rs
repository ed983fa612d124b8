use std::sync::Arc;

use asyncflow_primitives::{MetaKey, Selection, Transaction, UndoPolicy};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::plugin::{PluginView, ViewContext};
use crate::{ApplyError, Dispatcher, EditError, EditorState, History};

/// Owner of the current [`EditorState`] and the plugins' view hooks.
///
/// Every applied transaction is followed by a round of [`PluginView::update`]
/// calls. Transactions sent through the [`Dispatcher`] are queued and applied
/// by [`drain`](Self::drain) or [`next_dispatch`](Self::next_dispatch), so view
/// hooks never re-enter the view.
pub struct EditorView {
	state: EditorState,
	views: Vec<(MetaKey, Box<dyn PluginView>)>,
	dispatcher: Arc<Dispatcher>,
	inbox: mpsc::UnboundedReceiver<Transaction>,
	history: History,
	destroyed: bool,
}

impl EditorView {
	/// Creates a view around `state`, instantiating every plugin's view hooks.
	pub fn new(state: EditorState) -> Self {
		let (dispatcher, inbox) = Dispatcher::new(&state);
		let views = state
			.plugins()
			.iter()
			.filter_map(|plugin| plugin.view().map(|view| (plugin.key(), view)))
			.collect();

		Self {
			state,
			views,
			dispatcher: Arc::new(dispatcher),
			inbox,
			history: History::default(),
			destroyed: false,
		}
	}

	/// Returns the current state.
	pub fn state(&self) -> &EditorState {
		&self.state
	}

	/// Returns the dispatcher feeding this view.
	pub fn dispatcher(&self) -> Arc<Dispatcher> {
		Arc::clone(&self.dispatcher)
	}

	/// Returns the undo history.
	pub fn history(&self) -> &History {
		&self.history
	}

	/// Returns true once [`destroy`](Self::destroy) ran.
	pub fn is_destroyed(&self) -> bool {
		self.destroyed
	}

	/// Applies `tr` and runs every view update.
	///
	/// # Errors
	///
	/// Returns [`ApplyError`] if the state rejects the transaction or the view
	/// was destroyed; the state is left unchanged.
	pub fn dispatch(&mut self, tr: Transaction) -> Result<(), ApplyError> {
		self.commit(tr, true)
	}

	/// Applies every queued transaction without waiting. Returns how many were
	/// applied; rejected transactions are logged and skipped.
	pub fn drain(&mut self) -> usize {
		let mut applied = 0;
		while let Ok(tr) = self.inbox.try_recv() {
			match self.dispatch(tr) {
				Ok(()) => applied += 1,
				Err(err) => warn!(error = %err, "dropping queued transaction"),
			}
		}
		applied
	}

	/// Waits for the next queued transaction and applies it.
	pub async fn next_dispatch(&mut self) -> Result<(), ApplyError> {
		match self.inbox.recv().await {
			Some(tr) => self.dispatch(tr),
			None => Err(ApplyError::Destroyed),
		}
	}

	/// Replaces the selection with `text` and leaves the cursor after it.
	pub fn insert_text(&mut self, text: &str) -> Result<(), EditError> {
		let sel = self.state.selection();
		let mut tr = self.state.tr();
		tr.replace(sel.from(), sel.to(), text)?;
		tr.set_selection(Selection::point(sel.from() + text.chars().count()));
		self.dispatch(tr)?;
		Ok(())
	}

	/// Moves the selection.
	pub fn set_selection(&mut self, selection: Selection) -> Result<(), ApplyError> {
		let mut tr = self.state.tr();
		tr.set_selection(selection);
		self.dispatch(tr)
	}

	/// Reverts the most recent recorded transaction. Returns false when there is
	/// nothing to undo.
	pub fn undo(&mut self) -> Result<bool, EditError> {
		let Some(entry) = self.history.pop() else {
			return Ok(false);
		};

		let mut tr = self.state.tr();
		for step in entry.inverse {
			tr.step(step)?;
		}
		tr.set_selection(entry.selection)
			.set_undo_policy(UndoPolicy::Skip);
		self.commit(tr, false)?;
		Ok(true)
	}

	/// Runs every view's destroy hook. Later calls do nothing.
	pub fn destroy(&mut self) {
		if self.destroyed {
			return;
		}
		self.destroyed = true;
		debug!(views = self.views.len(), "editor.destroy");

		let ctx = ViewContext {
			state: &self.state,
			dispatcher: &self.dispatcher,
		};
		for (_, view) in &mut self.views {
			view.destroy(&ctx);
		}
	}

	fn commit(&mut self, tr: Transaction, record: bool) -> Result<(), ApplyError> {
		if self.destroyed {
			return Err(ApplyError::Destroyed);
		}

		let next = self.state.apply(&tr)?;
		if record {
			self.history.record(&tr, self.state.doc(), self.state.selection());
		}
		trace!(tr = %tr.id(), version = next.version(), "editor.apply");

		let old = std::mem::replace(&mut self.state, next);
		self.dispatcher.publish(&self.state);

		let ctx = ViewContext {
			state: &self.state,
			dispatcher: &self.dispatcher,
		};
		for (_, view) in &mut self.views {
			view.update(&ctx, &old);
		}
		Ok(())
	}
}

impl Drop for EditorView {
	fn drop(&mut self) {
		self.destroy();
	}
}
