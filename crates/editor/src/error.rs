use asyncflow_primitives::TransactionError;
use thiserror::Error;

/// Errors raised when a transaction cannot be applied to the editor state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
	/// The transaction's steps were built against another document version.
	#[error("mismatched transaction: built against version {found}, state is at {expected}")]
	Mismatched {
		/// Current document version.
		expected: u64,
		/// Version the transaction was started from.
		found: u64,
	},
	/// The view was destroyed.
	#[error("editor view destroyed")]
	Destroyed,
}

/// Errors raised by editing helpers that build and dispatch a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
	/// The transaction could not be built.
	#[error(transparent)]
	Transaction(#[from] TransactionError),
	/// The transaction could not be applied.
	#[error(transparent)]
	Apply(#[from] ApplyError),
}
