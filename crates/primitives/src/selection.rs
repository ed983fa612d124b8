use crate::range::{CharIdx, Span};
use crate::transaction::{Bias, ChangeSet};

/// A single cursor or selection defined by anchor and head positions.
///
/// The anchor is the fixed end, and the head moves during selection extension.
/// A selection whose anchor equals its head is a bare cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
	/// The fixed end of the selection.
	pub anchor: CharIdx,
	/// The moving end of the selection (cursor position).
	pub head: CharIdx,
}

impl Selection {
	/// Creates a selection from anchor to head.
	pub const fn new(anchor: CharIdx, head: CharIdx) -> Self {
		Self { anchor, head }
	}

	/// Creates a zero-width selection (cursor) at the given position.
	pub const fn point(pos: CharIdx) -> Self {
		Self::new(pos, pos)
	}

	/// Returns the smaller of anchor and head.
	#[inline]
	pub fn from(&self) -> CharIdx {
		self.anchor.min(self.head)
	}

	/// Returns the larger of anchor and head.
	#[inline]
	pub fn to(&self) -> CharIdx {
		self.anchor.max(self.head)
	}

	/// Returns true if anchor equals head.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.anchor == self.head
	}

	/// Returns the undirected extent of the selection.
	pub fn span(&self) -> Span {
		Span::new(self.from(), self.to())
	}

	/// Maps the selection through a change set.
	///
	/// A cursor sitting at an insertion point moves past the inserted text.
	pub fn map(&self, changes: &ChangeSet) -> Self {
		if self.is_empty() {
			let pos = changes.map_pos(self.head, Bias::Right);
			return Self::point(pos);
		}
		Self {
			anchor: changes.map_pos(self.anchor, Bias::Left),
			head: changes.map_pos(self.head, Bias::Right),
		}
	}

	/// Clamps both ends into `0..=max`.
	pub fn clamp(self, max: CharIdx) -> Self {
		Self::new(self.anchor.min(max), self.head.min(max))
	}
}
