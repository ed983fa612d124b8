//! Which spans of the document a transaction rewrote.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use asyncflow_primitives::{Span, Transaction, TransactionId};
use parking_lot::Mutex;

/// Spans rewritten by one transaction, in post-step coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangedRanges {
	/// One span per rewritten region, in the order the steps were applied.
	/// Spans are neither merged nor sorted.
	pub changed_ranges: Vec<Span>,
	/// True if any rewritten region is non-empty after the step.
	pub is_insertion: bool,
	/// True if any rewritten region is empty after the step.
	pub is_deletion: bool,
}

impl ChangedRanges {
	/// Walks every step of `tr` without caching.
	pub fn compute(tr: &Transaction) -> Self {
		let mut out = Self::default();
		for step in tr.steps() {
			step.for_each_change(|_, _, new_from, new_to| {
				if new_from == new_to {
					out.is_deletion = true;
				} else {
					out.is_insertion = true;
				}
				out.changed_ranges.push(Span::new(new_from, new_to));
			});
		}
		out
	}
}

/// Caches the changed ranges of the most recently inspected transaction.
///
/// Several consumers commonly inspect the same transaction during one update
/// pass. Only the last `(transaction, result)` pair is kept: asking again for
/// the same transaction returns the same [`Arc`], and any other transaction
/// replaces the entry.
///
/// Entries are keyed by transaction id and step count. Steps are append-only,
/// so a transaction that gained steps since it was cached is recomputed.
#[derive(Debug)]
pub struct ChangeRangeDetector {
	last: Mutex<Option<(CacheKey, Arc<ChangedRanges>)>>,
	computations: AtomicU64,
}

type CacheKey = (TransactionId, usize);

impl Default for ChangeRangeDetector {
	fn default() -> Self {
		Self::new()
	}
}

impl ChangeRangeDetector {
	/// Creates a detector with an empty cache.
	pub const fn new() -> Self {
		Self {
			last: parking_lot::const_mutex(None),
			computations: AtomicU64::new(0),
		}
	}

	/// Returns the changed ranges of `tr`, reusing the cached result when `tr`
	/// is the transaction seen last and has not gained steps since.
	pub fn compute(&self, tr: &Transaction) -> Arc<ChangedRanges> {
		let key = (tr.id(), tr.steps().len());
		let mut last = self.last.lock();
		if let Some((cached, ranges)) = last.as_ref()
			&& *cached == key
		{
			return Arc::clone(ranges);
		}

		self.computations.fetch_add(1, Ordering::Relaxed);
		let ranges = Arc::new(ChangedRanges::compute(tr));
		*last = Some((key, Arc::clone(&ranges)));
		ranges
	}

	/// Returns how many times the ranges were actually computed.
	pub fn computations(&self) -> u64 {
		self.computations.load(Ordering::Relaxed)
	}
}

/// Returns the changed ranges of `tr` through a process-wide single-entry cache.
///
/// See [`ChangeRangeDetector`] for when the cached entry is reused.
pub fn compute_changed_ranges(tr: &Transaction) -> Arc<ChangedRanges> {
	static DETECTOR: ChangeRangeDetector = ChangeRangeDetector::new();
	DETECTOR.compute(tr)
}
