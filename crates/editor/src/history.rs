use asyncflow_primitives::{ChangeSet, Rope, Selection, Transaction, UndoPolicy};

const DEFAULT_DEPTH: usize = 100;

/// One undoable transaction: the inverse steps, newest first, and the
/// selection before the edit.
#[derive(Debug, Clone)]
pub(crate) struct UndoEntry {
	pub(crate) inverse: Vec<ChangeSet>,
	pub(crate) selection: Selection,
}

/// Undo stack of document-changing transactions.
///
/// Transactions marked [`UndoPolicy::Skip`] are never recorded. A skipped
/// transaction that still rewrites the document clears the stack, since the
/// recorded inverses no longer line up with the document.
#[derive(Debug, Clone)]
pub struct History {
	entries: Vec<UndoEntry>,
	depth: usize,
}

impl Default for History {
	fn default() -> Self {
		Self::with_depth(DEFAULT_DEPTH)
	}
}

impl History {
	/// Creates a history keeping at most `depth` entries.
	pub fn with_depth(depth: usize) -> Self {
		Self {
			entries: Vec::new(),
			depth,
		}
	}

	/// Returns the number of undoable entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns true if there is nothing to undo.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Drops every entry.
	pub fn clear(&mut self) {
		self.entries.clear();
	}

	/// Records `tr`, applied to a state with document `before` and selection
	/// `selection`. Returns true if an entry was added.
	pub(crate) fn record(&mut self, tr: &Transaction, before: &Rope, selection: Selection) -> bool {
		if !tr.doc_changed() {
			return false;
		}
		if tr.undo_policy() == UndoPolicy::Skip {
			self.clear();
			return false;
		}

		let mut doc = before.clone();
		let mut inverse = Vec::with_capacity(tr.steps().len());
		for step in tr.steps() {
			inverse.push(step.invert(&doc));
			step.apply(&mut doc);
		}
		inverse.reverse();

		self.entries.push(UndoEntry { inverse, selection });
		if self.entries.len() > self.depth {
			self.entries.remove(0);
		}
		true
	}

	pub(crate) fn pop(&mut self) -> Option<UndoEntry> {
		self.entries.pop()
	}
}
