use asyncflow_primitives::Transaction;

/// Dispatch capability handed to [`AsyncQuery::view_update`](crate::AsyncQuery::view_update).
///
/// Implementations must accept transactions from background tasks; the editor's
/// dispatcher queues them for its event loop.
pub trait QuerySink: Send + Sync {
	/// Starts a fresh transaction against the current editor state.
	fn transaction(&self) -> Transaction;

	/// Hands a transaction to the editor for application.
	fn dispatch(&self, tr: Transaction);
}
