//! Change sets and the transactions that carry them.
//!
//! A [`Transaction`] starts from a document snapshot, accumulates zero or more
//! [`ChangeSet`] steps, and carries a typed [`Meta`] side channel. Transactions
//! that carry only metadata (no steps) are how background work signals back into
//! the synchronous editor state machine.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use crate::meta::{Meta, MetaKey};
use crate::range::{CharIdx, CharLen};
use crate::{Rope, Selection};

mod changeset;
mod types;

#[cfg(test)]
mod tests;

pub use changeset::ChangeSet;
pub use types::{Bias, Change, Insertion, Operation, Tendril, UndoPolicy};

/// Errors raised while building a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
	/// A change reaches outside the document.
	#[error("range {from}..{to} is out of bounds for document of length {len}")]
	OutOfBounds {
		/// Requested start.
		from: CharIdx,
		/// Requested end.
		to: CharIdx,
		/// Document length at the time of the change.
		len: CharLen,
	},
	/// Changes were not sorted or overlapped.
	#[error("overlapping change at {at}")]
	Overlapping {
		/// Start of the offending change.
		at: CharIdx,
	},
	/// A step was built against a document of another length.
	#[error("step expects a document of length {expected}, found {actual}")]
	LengthMismatch {
		/// Length the step was built for.
		expected: CharLen,
		/// Length of the transaction's current document.
		actual: CharLen,
	},
}

/// Process-unique transaction identity.
///
/// Identity is what consumers memoize on: two transactions never share an id,
/// even when their contents are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl TransactionId {
	fn next() -> Self {
		static NEXT: AtomicU64 = AtomicU64::new(1);
		Self(NEXT.fetch_add(1, Ordering::Relaxed))
	}
}

impl fmt::Display for TransactionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "tr#{}", self.0)
	}
}

/// An atomic description of a state change.
///
/// Deliberately not `Clone`: a transaction's identity is its [`TransactionId`].
pub struct Transaction {
	id: TransactionId,
	base_version: u64,
	doc: Rope,
	steps: Vec<ChangeSet>,
	selection: Option<Selection>,
	meta: Meta,
	undo: UndoPolicy,
}

impl Transaction {
	/// Starts a transaction against `doc` at document `version`.
	pub fn new(doc: &Rope, version: u64) -> Self {
		Self {
			id: TransactionId::next(),
			base_version: version,
			doc: doc.clone(),
			steps: Vec::new(),
			selection: None,
			meta: Meta::default(),
			undo: UndoPolicy::default(),
		}
	}

	/// Returns this transaction's identity.
	pub fn id(&self) -> TransactionId {
		self.id
	}

	/// Returns the document version the transaction was started against.
	pub fn base_version(&self) -> u64 {
		self.base_version
	}

	/// Returns the document with every step applied.
	pub fn doc(&self) -> &Rope {
		&self.doc
	}

	/// Returns the steps in the order they were added.
	pub fn steps(&self) -> &[ChangeSet] {
		&self.steps
	}

	/// Returns true if any step rewrites the document.
	pub fn doc_changed(&self) -> bool {
		self.steps.iter().any(|step| !step.is_identity())
	}

	/// Appends a step built against the transaction's current document.
	///
	/// # Errors
	///
	/// Returns [`TransactionError::LengthMismatch`] if the step does not span the
	/// current document.
	pub fn step(&mut self, step: ChangeSet) -> Result<&mut Self, TransactionError> {
		let actual = self.doc.len_chars();
		if step.len() != actual {
			return Err(TransactionError::LengthMismatch {
				expected: step.len(),
				actual,
			});
		}
		step.apply(&mut self.doc);
		if let Some(sel) = self.selection.as_mut() {
			*sel = sel.map(&step);
		}
		self.steps.push(step);
		Ok(self)
	}

	/// Replaces `from..to` with `text` as one step.
	pub fn replace(
		&mut self,
		from: CharIdx,
		to: CharIdx,
		text: &str,
	) -> Result<&mut Self, TransactionError> {
		let replacement = (!text.is_empty()).then(|| text.to_string());
		let step = ChangeSet::from_changes(
			self.doc.slice(..),
			[Change {
				start: from,
				end: to,
				replacement,
			}],
		)?;
		self.step(step)
	}

	/// Inserts `text` at `pos` as one step.
	pub fn insert(&mut self, pos: CharIdx, text: &str) -> Result<&mut Self, TransactionError> {
		self.replace(pos, pos, text)
	}

	/// Deletes `from..to` as one step.
	pub fn delete(&mut self, from: CharIdx, to: CharIdx) -> Result<&mut Self, TransactionError> {
		self.replace(from, to, "")
	}

	/// Maps a pre-transaction position through every step.
	pub fn map_pos(&self, pos: CharIdx, bias: Bias) -> CharIdx {
		self.steps.iter().fold(pos, |pos, step| step.map_pos(pos, bias))
	}

	/// Sets an explicit selection for the resulting state.
	///
	/// Steps added afterwards map it forward.
	pub fn set_selection(&mut self, selection: Selection) -> &mut Self {
		self.selection = Some(selection);
		self
	}

	/// Returns the explicit selection, if one was set.
	pub fn selection(&self) -> Option<Selection> {
		self.selection
	}

	/// Attaches `value` under `key`.
	pub fn set_meta<T: Any + Send + Sync>(&mut self, key: MetaKey, value: T) -> &mut Self {
		self.meta.set(key, value);
		self
	}

	/// Looks up metadata of type `T` under `key`.
	pub fn meta<T: Any>(&self, key: &MetaKey) -> Option<&T> {
		self.meta.get(key)
	}

	/// Sets whether the transaction is recorded in undo history.
	pub fn set_undo_policy(&mut self, policy: UndoPolicy) -> &mut Self {
		self.undo = policy;
		self
	}

	/// Returns the undo policy.
	pub fn undo_policy(&self) -> UndoPolicy {
		self.undo
	}
}

impl fmt::Debug for Transaction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Transaction")
			.field("id", &self.id)
			.field("base_version", &self.base_version)
			.field("steps", &self.steps.len())
			.field("selection", &self.selection)
			.field("meta", &self.meta)
			.field("undo", &self.undo)
			.finish()
	}
}
