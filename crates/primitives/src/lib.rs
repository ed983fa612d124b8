//! Core types for the asyncflow editor model: documents, selections, transactions,
//! and the metadata side channel carried by transactions.

/// Boxed future alias.
pub mod future;
/// Transaction metadata keys and the typed metadata map.
pub mod meta;
/// Character spans and index aliases.
pub mod range;
/// Cursor and selection type.
pub mod selection;
/// Change sets and transactions.
pub mod transaction;

pub use future::BoxFutureStatic;
pub use meta::{Meta, MetaKey};
pub use range::{CharIdx, CharLen, Span};
pub use ropey::{Rope, RopeSlice};
pub use selection::Selection;
pub use transaction::{
	Bias, Change, ChangeSet, Transaction, TransactionError, TransactionId, UndoPolicy,
};
