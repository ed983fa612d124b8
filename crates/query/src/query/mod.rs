use std::fmt;
use std::sync::Arc;

use asyncflow_primitives::{BoxFutureStatic, MetaKey, Transaction, UndoPolicy};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::trace;
use uuid::Uuid;

use crate::options::{AsyncQueryOptions, CancelFn, QueryFn, ViewUpdateOptions};
use crate::sink::QuerySink;
use crate::spawn::spawn_settlement;
use crate::{QueryError, QueryStatus, StatusFilter};


/// Per-instance query identity.
///
/// Unlike the [`MetaKey`], which a whole lineage of queries may share, every
/// query instance gets its own id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryId(Uuid);

impl QueryId {
	/// Draws a fresh id.
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for QueryId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for QueryId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0.simple())
	}
}

/// Payload attached under a query's [`MetaKey`] on every dispatched transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTag {
	/// The query that dispatched the transaction.
	pub query_id: QueryId,
}

/// How a run ended, decided once the query function settles.
enum Settlement<D> {
	Success(Option<D>),
	Failure(anyhow::Error),
	Canceled,
}

struct QueryState<D> {
	status: QueryStatus,
	data: Option<D>,
	error: Option<QueryError>,
	canceled: bool,
}

struct Shared<P, D> {
	meta_key: MetaKey,
	query_id: QueryId,
	enabled: bool,
	parameters: Option<P>,
	query_fn: Option<QueryFn<D>>,
	cancel_fn: Option<CancelFn>,
	state: Mutex<QueryState<D>>,
}

/// A single asynchronous operation owned by a plugin.
///
/// `AsyncQuery` is a cheap handle: clones share the same instance, so plugin
/// state snapshots and the background settlement task all observe one status.
/// Two handles compare equal when they refer to the same instance.
///
/// Public methods never fail; failures are captured into [`error`](Self::error)
/// and [`status`](Self::status).
pub struct AsyncQuery<P = (), D = ()> {
	shared: Arc<Shared<P, D>>,
}

impl<P, D> Clone for AsyncQuery<P, D> {
	fn clone(&self) -> Self {
		Self {
			shared: Arc::clone(&self.shared),
		}
	}
}

impl<P, D> PartialEq for AsyncQuery<P, D> {
	fn eq(&self, other: &Self) -> bool {
		self.shared.query_id == other.shared.query_id
	}
}

impl<P, D> Eq for AsyncQuery<P, D> {}

impl<P, D> AsyncQuery<P, D> {
	/// Creates an idle query.
	pub fn new(options: AsyncQueryOptions<P, D>) -> Self {
		let AsyncQueryOptions {
			meta_key,
			parameters,
			query,
			cancel,
			enabled,
			query_id,
		} = options;

		Self {
			shared: Arc::new(Shared {
				meta_key: meta_key.unwrap_or_else(MetaKey::unique),
				query_id: query_id.unwrap_or_default(),
				enabled,
				parameters,
				query_fn: query,
				cancel_fn: cancel,
				state: Mutex::new(QueryState {
					status: QueryStatus::Idle,
					data: None,
					error: None,
					canceled: false,
				}),
			}),
		}
	}

	/// Creates a disabled query that never runs.
	///
	/// Useful as the initial value of plugin state before any real work exists.
	pub fn empty() -> Self {
		Self::new(AsyncQueryOptions::new().enabled(false))
	}

	/// Returns the current status.
	pub fn status(&self) -> QueryStatus {
		self.shared.state.lock().status
	}

	/// Returns the recorded failure, if the query ended in error.
	pub fn error(&self) -> Option<QueryError> {
		self.shared.state.lock().error.clone()
	}

	/// Returns true if the query was canceled while loading.
	pub fn canceled(&self) -> bool {
		self.shared.state.lock().canceled
	}

	/// Returns false for permanently inert queries.
	pub fn enabled(&self) -> bool {
		self.shared.enabled
	}

	/// Returns the caller-supplied parameters.
	pub fn parameters(&self) -> Option<&P> {
		self.shared.parameters.as_ref()
	}

	/// Returns the key used to tag dispatched transactions.
	pub fn meta_key(&self) -> MetaKey {
		self.shared.meta_key
	}

	/// Returns this instance's id.
	pub fn query_id(&self) -> QueryId {
		self.shared.query_id
	}

	/// Returns the tag this query attaches to its transactions.
	pub fn tag(&self) -> QueryTag {
		QueryTag {
			query_id: self.shared.query_id,
		}
	}

	/// Cancels the query if it is loading.
	///
	/// The status becomes [`QueryStatus::Error`] with [`QueryError::Canceled`],
	/// then the cancel callback runs. Idle and settled queries are left untouched,
	/// so the callback runs at most once per run.
	pub fn cancel(&self) {
		{
			let mut state = self.shared.state.lock();
			if state.status != QueryStatus::Loading {
				return;
			}
			state.status = QueryStatus::Error;
			state.canceled = true;
			state.error = Some(QueryError::Canceled);
		}

		trace!(query_id = %self.shared.query_id, "query.cancel");
		if let Some(cancel_fn) = &self.shared.cancel_fn {
			cancel_fn();
		}
	}

	/// Cancels the query when the owning view is torn down.
	pub fn view_destroy(&self) {
		self.cancel();
	}

	/// Returns true if `tr` was dispatched by this query instance and the query's
	/// current status passes `filter`.
	///
	/// The identity check uses the tag carried by `tr`, but the status check
	/// reads the live status. A loading tag inspected after the query settled
	/// therefore fails a `Loading` filter.
	///
	/// Disabled queries never match.
	pub fn status_changed<'a>(&self, tr: &Transaction, filter: impl Into<StatusFilter<'a>>) -> bool {
		if !self.shared.enabled {
			return false;
		}
		let tagged = tr
			.meta::<QueryTag>(&self.shared.meta_key)
			.is_some_and(|tag| tag.query_id == self.shared.query_id);
		tagged && filter.into().allows(self.status())
	}

	fn settle(&self, result: anyhow::Result<Option<D>>) {
		let mut state = self.shared.state.lock();
		let settlement = if state.canceled {
			Settlement::Canceled
		} else {
			match result {
				Ok(data) => Settlement::Success(data),
				Err(err) => Settlement::Failure(err),
			}
		};

		match settlement {
			Settlement::Success(data) => {
				state.data = data;
				state.status = QueryStatus::Success;
			}
			Settlement::Failure(err) => {
				state.error = Some(QueryError::from(err));
				state.status = QueryStatus::Error;
			}
			Settlement::Canceled => {
				state.error = Some(QueryError::Canceled);
				state.status = QueryStatus::Error;
			}
		}
		trace!(query_id = %self.shared.query_id, status = %state.status, "query.settled");
	}

	fn emit_tag<S: QuerySink + ?Sized>(&self, sink: &S) {
		let mut tr = sink.transaction();
		tr.set_undo_policy(UndoPolicy::Skip)
			.set_meta(self.shared.meta_key, self.tag());
		trace!(query_id = %self.shared.query_id, tr = %tr.id(), "query.dispatch_tag");
		sink.dispatch(tr);
	}

	fn completion_suppressed(&self, options: ViewUpdateOptions) -> bool {
		let state = self.shared.state.lock();
		(state.canceled && options.ignore_canceled)
			|| (state.status == QueryStatus::Success && options.ignore_success)
			|| (state.status == QueryStatus::Error && options.ignore_error)
	}
}

impl<P, D: Clone> AsyncQuery<P, D> {
	/// Returns the data of a successful query.
	pub fn data(&self) -> Option<D> {
		self.shared.state.lock().data.clone()
	}
}

impl<P, D> AsyncQuery<P, D>
where
	P: Send + Sync + 'static,
	D: Send + 'static,
{
	/// Runs the query function and records its outcome.
	///
	/// The status becomes [`QueryStatus::Loading`] before this returns. The
	/// returned future completes once the query function settled and the query
	/// reached `Success` or `Error`; it never fails. A result arriving after
	/// [`cancel`](Self::cancel) is discarded.
	///
	/// Only [`view_update`](Self::view_update) should call this, and only on an
	/// idle query. Disabled queries stay idle.
	pub fn run(&self) -> BoxFutureStatic<()> {
		if !self.shared.enabled {
			return Box::pin(std::future::ready(()));
		}

		{
			let mut state = self.shared.state.lock();
			state.status = QueryStatus::Loading;
			state.canceled = false;
		}
		trace!(query_id = %self.shared.query_id, "query.run");

		let pending = self.shared.query_fn.as_ref().map(|query_fn| query_fn());
		let this = self.clone();
		Box::pin(async move {
			let result = match pending {
				Some(fut) => fut.await.map(Some),
				None => Ok(None),
			};
			this.settle(result);
		})
	}

	/// Starts an idle query from the view layer.
	///
	/// Call once per view update. Disabled queries and queries that already left
	/// `Idle` are ignored, so each query runs at most once.
	///
	/// Unless suppressed by `options`, two transactions tagged with
	/// [`QueryTag`] under the query's [`MetaKey`] are dispatched through `sink`,
	/// both kept out of undo history:
	///
	/// * one synchronously, before this returns, signalling that loading started;
	/// * one from a background task once the query settled.
	///
	/// Returns the background task's handle when the query was started.
	pub fn view_update<S>(&self, sink: &Arc<S>, options: ViewUpdateOptions) -> Option<JoinHandle<()>>
	where
		S: QuerySink + ?Sized + 'static,
	{
		if !self.shared.enabled || self.status() != QueryStatus::Idle {
			return None;
		}

		let settled = self.run();
		// Queued before the settlement task exists, so it always precedes the
		// completion tag.
		if !options.ignore_loading {
			self.emit_tag(&**sink);
		}

		let this = self.clone();
		let completion_sink = Arc::clone(sink);
		Some(spawn_settlement(async move {
			settled.await;
			if !this.completion_suppressed(options) {
				this.emit_tag(&*completion_sink);
			}
		}))
	}
}

impl<P: fmt::Debug, D> fmt::Display for AsyncQuery<P, D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.shared.state.lock();
		f.write_str("Query(")?;
		if let Some(parameters) = &self.shared.parameters {
			write!(f, "{parameters:?}")?;
		}
		write!(
			f,
			") {{ status: {}, canceled: {}, enabled: {} }}",
			state.status, state.canceled, self.shared.enabled
		)
	}
}

impl<P: fmt::Debug, D> fmt::Debug for AsyncQuery<P, D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.shared.state.lock();
		f.debug_struct("AsyncQuery")
			.field("query_id", &self.shared.query_id)
			.field("meta_key", &self.shared.meta_key)
			.field("parameters", &self.shared.parameters)
			.field("status", &state.status)
			.field("canceled", &state.canceled)
			.field("enabled", &self.shared.enabled)
			.finish()
	}
}
