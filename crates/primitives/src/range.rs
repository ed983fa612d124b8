/// A position in the text, measured in characters (not bytes).
///
/// This is the canonical coordinate space for asyncflow documents.
pub type CharIdx = usize;

/// A length or count in the text, measured in characters (not bytes).
///
/// This is distinct from CharIdx to avoid accidentally passing an index
/// where a length is expected or vice versa.
pub type CharLen = usize;

/// A contiguous span of the document, `from` inclusive and `to` exclusive.
///
/// Unlike a selection, a span carries no direction: `from <= to` always holds
/// for spans produced by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
	/// Start of the span.
	pub from: CharIdx,
	/// End of the span (exclusive).
	pub to: CharIdx,
}

impl Span {
	/// Creates a span covering `from..to`.
	pub const fn new(from: CharIdx, to: CharIdx) -> Self {
		Self { from, to }
	}

	/// Creates an empty span at `pos`.
	pub const fn point(pos: CharIdx) -> Self {
		Self::new(pos, pos)
	}

	/// Returns the length of the span in characters.
	#[inline]
	pub fn len(&self) -> CharLen {
		self.to.saturating_sub(self.from)
	}

	/// Returns true if the span covers no characters.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.from == self.to
	}

	/// Returns true if the two spans overlap or touch.
	///
	/// Touching counts: a cursor sitting right after an insertion intersects it.
	#[inline]
	pub fn intersects(&self, other: &Span) -> bool {
		self.from <= other.to && self.to >= other.from
	}
}

impl From<std::ops::Range<CharIdx>> for Span {
	fn from(range: std::ops::Range<CharIdx>) -> Self {
		Self::new(range.start, range.end)
	}
}
