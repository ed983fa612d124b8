use asyncflow_primitives::{Rope, Transaction};
use asyncflow_query::QuerySink;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::trace;

use crate::EditorState;

struct DocSnapshot {
	doc: Rope,
	version: u64,
}

/// Queue feeding transactions back into an [`EditorView`](crate::EditorView).
///
/// Safe to use from background tasks. Transactions are applied in the order
/// they were dispatched, the next time the view drains its queue.
pub struct Dispatcher {
	snapshot: RwLock<DocSnapshot>,
	tx: mpsc::UnboundedSender<Transaction>,
}

impl Dispatcher {
	pub(crate) fn new(state: &EditorState) -> (Self, mpsc::UnboundedReceiver<Transaction>) {
		let (tx, rx) = mpsc::unbounded_channel();
		let dispatcher = Self {
			snapshot: RwLock::new(DocSnapshot {
				doc: state.doc().clone(),
				version: state.version(),
			}),
			tx,
		};
		(dispatcher, rx)
	}

	/// Records the state new transactions should start from.
	pub(crate) fn publish(&self, state: &EditorState) {
		let mut snapshot = self.snapshot.write();
		if snapshot.version != state.version() {
			snapshot.doc = state.doc().clone();
			snapshot.version = state.version();
		}
	}
}

impl QuerySink for Dispatcher {
	fn transaction(&self) -> Transaction {
		let snapshot = self.snapshot.read();
		Transaction::new(&snapshot.doc, snapshot.version)
	}

	fn dispatch(&self, tr: Transaction) {
		let id = tr.id();
		if self.tx.send(tr).is_err() {
			trace!(tr = %id, "editor view gone; dropping transaction");
		}
	}
}
