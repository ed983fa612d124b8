use super::TransactionError;
use super::types::{Bias, Change, Insertion, Operation, Tendril};
use crate::range::{CharIdx, CharLen};
use crate::{Rope, RopeSlice};

/// A sequence of operations rewriting one document into the next.
///
/// A changeset is a single elementary step of a [`Transaction`](super::Transaction):
/// it spans exactly `len` characters of the source document and produces a
/// document of `len_after` characters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
	/// Sequence of retain/delete/insert operations.
	pub(super) changes: Vec<Operation>,
	/// Length of the source document before changes.
	pub(super) len: CharLen,
	/// Length of the document after applying changes.
	pub(super) len_after: CharLen,
}

impl ChangeSet {
	/// Creates a changeset that leaves `doc` untouched.
	pub fn identity(doc: RopeSlice) -> Self {
		let mut cs = Self::default();
		cs.retain(doc.len_chars());
		cs
	}

	/// Builds a changeset from sorted, non-overlapping changes against `doc`.
	///
	/// # Errors
	///
	/// Returns [`TransactionError::OutOfBounds`] if a change reaches past the end
	/// of the document and [`TransactionError::Overlapping`] if changes are
	/// unsorted or overlap.
	pub fn from_changes(
		doc: RopeSlice,
		changes: impl IntoIterator<Item = Change>,
	) -> Result<Self, TransactionError> {
		let doc_len = doc.len_chars();
		let mut cs = Self::default();
		let mut last = 0;

		for change in changes {
			if change.start > change.end || change.end > doc_len {
				return Err(TransactionError::OutOfBounds {
					from: change.start,
					to: change.end,
					len: doc_len,
				});
			}
			if change.start < last {
				return Err(TransactionError::Overlapping { at: change.start });
			}
			cs.retain(change.start - last);
			cs.delete(change.end - change.start);
			if let Some(text) = change.replacement {
				cs.insert(text);
			}
			last = change.end;
		}

		cs.retain(doc_len - last);
		Ok(cs)
	}

	/// Returns the length of the source document (before changes).
	pub fn len(&self) -> CharLen {
		self.len
	}

	/// Returns the length of the document after applying changes.
	pub fn len_after(&self) -> CharLen {
		self.len_after
	}

	/// Returns true if this changeset contains no operations.
	pub fn is_empty(&self) -> bool {
		self.changes.is_empty()
	}

	/// Returns true if applying this changeset leaves the document unchanged.
	pub fn is_identity(&self) -> bool {
		self.changes.iter().all(|op| matches!(op, Operation::Retain(_)))
	}

	/// Returns a slice of all operations in this changeset.
	pub fn changes(&self) -> &[Operation] {
		&self.changes
	}

	/// Adds a retain operation, merging with a preceding retain.
	pub(crate) fn retain(&mut self, n: CharLen) {
		if n == 0 {
			return;
		}

		self.len += n;
		self.len_after += n;

		if let Some(Operation::Retain(count)) = self.changes.last_mut() {
			*count += n;
		} else {
			self.changes.push(Operation::Retain(n));
		}
	}

	/// Adds a delete operation, merging with a preceding delete.
	pub(crate) fn delete(&mut self, n: CharLen) {
		if n == 0 {
			return;
		}

		self.len += n;

		if let Some(Operation::Delete(count)) = self.changes.last_mut() {
			*count += n;
		} else {
			self.changes.push(Operation::Delete(n));
		}
	}

	/// Adds an insert operation.
	///
	/// Inserts are kept ahead of an adjacent delete so that an insert/delete pair
	/// always reads as insert-then-delete.
	pub(crate) fn insert(&mut self, text: Tendril) {
		if text.is_empty() {
			return;
		}

		let ins = Insertion::new(text);
		self.len_after += ins.char_len;

		match self.changes.as_mut_slice() {
			[.., Operation::Insert(prev)] | [.., Operation::Insert(prev), Operation::Delete(_)] => {
				prev.text.push_str(&ins.text);
				prev.char_len += ins.char_len;
			}
			[.., last @ Operation::Delete(_)] => {
				let del = std::mem::replace(last, Operation::Insert(ins));
				self.changes.push(del);
			}
			_ => {
				self.changes.push(Operation::Insert(ins));
			}
		}
	}

	/// Applies this changeset to a document, modifying it in place.
	///
	/// The caller guarantees `doc.len_chars() == self.len()`.
	pub fn apply(&self, doc: &mut Rope) {
		debug_assert_eq!(doc.len_chars(), self.len);

		let mut pos = 0;
		for op in &self.changes {
			match op {
				Operation::Retain(n) => pos += n,
				Operation::Delete(n) => doc.remove(pos..pos + n),
				Operation::Insert(ins) => {
					doc.insert(pos, &ins.text);
					pos += ins.char_len;
				}
			}
		}
	}

	/// Inverts this changeset to create one that undoes its effects.
	///
	/// `doc` is the document as it was before this changeset was applied.
	pub fn invert(&self, doc: &Rope) -> ChangeSet {
		let mut result = ChangeSet::default();

		let mut pos = 0;
		for op in &self.changes {
			match op {
				Operation::Retain(n) => {
					result.retain(*n);
					pos += n;
				}
				Operation::Delete(n) => {
					result.insert(doc.slice(pos..pos + n).to_string());
					pos += n;
				}
				Operation::Insert(ins) => result.delete(ins.char_len),
			}
		}

		result
	}

	/// Maps a position through this changeset using the specified bias.
	pub fn map_pos(&self, pos: CharIdx, bias: Bias) -> CharIdx {
		let mut old_pos = 0;
		let mut new_pos = 0;

		for op in &self.changes {
			if old_pos > pos {
				break;
			}

			match op {
				Operation::Retain(n) => {
					if old_pos + n > pos {
						return new_pos + (pos - old_pos);
					}
					old_pos += n;
					new_pos += n;
				}
				Operation::Delete(n) => {
					if old_pos + n > pos {
						return new_pos;
					}
					old_pos += n;
				}
				Operation::Insert(ins) => {
					if old_pos != pos || bias == Bias::Right {
						new_pos += ins.char_len;
					}
				}
			}
		}

		new_pos + pos.saturating_sub(old_pos)
	}

	/// Reports every contiguous rewritten span as
	/// `(old_from, old_to, new_from, new_to)`, in document order.
	///
	/// Adjacent deletes and inserts collapse into one span. A pure deletion
	/// reports `new_from == new_to`; a pure insertion reports `old_from == old_to`.
	pub fn for_each_change(&self, mut f: impl FnMut(CharIdx, CharIdx, CharIdx, CharIdx)) {
		let mut old_pos = 0;
		let mut new_pos = 0;
		let mut open: Option<(CharIdx, CharIdx)> = None;

		for op in &self.changes {
			match op {
				Operation::Retain(n) => {
					if let Some((old_from, new_from)) = open.take() {
						f(old_from, old_pos, new_from, new_pos);
					}
					old_pos += n;
					new_pos += n;
				}
				Operation::Delete(n) => {
					open.get_or_insert((old_pos, new_pos));
					old_pos += n;
				}
				Operation::Insert(ins) => {
					open.get_or_insert((old_pos, new_pos));
					new_pos += ins.char_len;
				}
			}
		}

		if let Some((old_from, new_from)) = open {
			f(old_from, old_pos, new_from, new_pos);
		}
	}
}
