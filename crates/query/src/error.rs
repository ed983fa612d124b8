use std::sync::Arc;

use thiserror::Error;

/// Failure recorded on a query that ended in [`QueryStatus::Error`](crate::QueryStatus::Error).
#[derive(Debug, Clone, Error)]
pub enum QueryError {
	/// The query was canceled while loading. Any later result was discarded.
	#[error("Canceled")]
	Canceled,
	/// The query function itself failed.
	#[error("query failed: {0:#}")]
	Failed(Arc<anyhow::Error>),
}

impl QueryError {
	/// Returns true for the synthetic cancellation error.
	pub fn is_canceled(&self) -> bool {
		matches!(self, Self::Canceled)
	}

	/// Returns the underlying failure, if the query function failed.
	pub fn failure(&self) -> Option<&anyhow::Error> {
		match self {
			Self::Canceled => None,
			Self::Failed(err) => Some(err),
		}
	}
}

impl From<anyhow::Error> for QueryError {
	fn from(err: anyhow::Error) -> Self {
		Self::Failed(Arc::new(err))
	}
}
