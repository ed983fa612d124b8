use std::fmt;

/// Lifecycle state of an [`AsyncQuery`](crate::AsyncQuery).
///
/// Transitions only move forward within one instance: `Idle` → `Loading` →
/// `Success` or `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryStatus {
	/// Created but not yet run.
	Idle,
	/// Running; the query function has not settled.
	Loading,
	/// Canceled, or the query function failed.
	Error,
	/// The query function returned successfully.
	Success,
}

impl QueryStatus {
	/// Returns the lowercase name of the status.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Idle => "idle",
			Self::Loading => "loading",
			Self::Error => "error",
			Self::Success => "success",
		}
	}
}

impl fmt::Display for QueryStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Restricts [`AsyncQuery::status_changed`](crate::AsyncQuery::status_changed)
/// to a set of live statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter<'a> {
	/// Match regardless of status.
	#[default]
	Any,
	/// Match only when the query currently has this status.
	One(QueryStatus),
	/// Match when the query currently has any of these statuses.
	AnyOf(&'a [QueryStatus]),
}

impl StatusFilter<'_> {
	/// Returns true if `status` passes the filter.
	pub fn allows(&self, status: QueryStatus) -> bool {
		match self {
			Self::Any => true,
			Self::One(expected) => *expected == status,
			Self::AnyOf(set) => set.contains(&status),
		}
	}
}

impl From<QueryStatus> for StatusFilter<'_> {
	fn from(status: QueryStatus) -> Self {
		Self::One(status)
	}
}

impl<'a> From<&'a [QueryStatus]> for StatusFilter<'a> {
	fn from(set: &'a [QueryStatus]) -> Self {
		Self::AnyOf(set)
	}
}

impl<'a, const N: usize> From<&'a [QueryStatus; N]> for StatusFilter<'a> {
	fn from(set: &'a [QueryStatus; N]) -> Self {
		Self::AnyOf(set)
	}
}
