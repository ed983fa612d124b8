use std::fmt;
use std::future::Future;
use std::sync::Arc;

use asyncflow_primitives::{BoxFutureStatic, MetaKey};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::QueryId;

/// Zero-argument async function producing a query's data.
pub type QueryFn<D> = Arc<dyn Fn() -> BoxFutureStatic<anyhow::Result<D>> + Send + Sync>;

/// Callback invoked when a loading query is canceled.
pub type CancelFn = Arc<dyn Fn() + Send + Sync>;

/// Construction options for [`AsyncQuery`](crate::AsyncQuery).
///
/// Every field is optional:
///
/// * `meta_key`: fresh [`MetaKey::unique`] when unset. Pass the owning plugin's
///   key so successive queries of one slot share it.
/// * `parameters`: unset. Callers compare parameters to decide whether a new
///   query is needed.
/// * `query`: unset means the query succeeds immediately with no data.
/// * `cancel`: unset means cancellation only stops honoring the result.
/// * `enabled`: `true`. A disabled query never runs.
/// * `query_id`: fresh [`QueryId`] when unset.
pub struct AsyncQueryOptions<P, D> {
	pub meta_key: Option<MetaKey>,
	pub parameters: Option<P>,
	pub query: Option<QueryFn<D>>,
	pub cancel: Option<CancelFn>,
	pub enabled: bool,
	pub query_id: Option<QueryId>,
}

impl<P, D> Default for AsyncQueryOptions<P, D> {
	fn default() -> Self {
		Self {
			meta_key: None,
			parameters: None,
			query: None,
			cancel: None,
			enabled: true,
			query_id: None,
		}
	}
}

impl<P, D> AsyncQueryOptions<P, D> {
	/// Creates options with every field at its default.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the metadata key used to tag dispatched transactions.
	pub fn meta_key(mut self, key: MetaKey) -> Self {
		self.meta_key = Some(key);
		self
	}

	/// Sets the query parameters.
	pub fn parameters(mut self, parameters: P) -> Self {
		self.parameters = Some(parameters);
		self
	}

	/// Sets the query function.
	pub fn query<F, Fut>(mut self, f: F) -> Self
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = anyhow::Result<D>> + Send + 'static,
	{
		self.query = Some(Arc::new(move || Box::pin(f()) as BoxFutureStatic<anyhow::Result<D>>));
		self
	}

	/// Sets the cancel callback.
	pub fn cancel<F>(mut self, f: F) -> Self
	where
		F: Fn() + Send + Sync + 'static,
	{
		self.cancel = Some(Arc::new(f));
		self
	}

	/// Cancels `token` when the query is canceled while loading.
	///
	/// The query function can hold a clone of the token and stop early.
	pub fn cancel_token(self, token: CancellationToken) -> Self {
		self.cancel(move || token.cancel())
	}

	/// Enables or disables the query.
	pub fn enabled(mut self, enabled: bool) -> Self {
		self.enabled = enabled;
		self
	}

	/// Overrides the generated query id.
	pub fn query_id(mut self, id: QueryId) -> Self {
		self.query_id = Some(id);
		self
	}
}

impl<P: fmt::Debug, D> fmt::Debug for AsyncQueryOptions<P, D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AsyncQueryOptions")
			.field("meta_key", &self.meta_key)
			.field("parameters", &self.parameters)
			.field("query", &self.query.is_some())
			.field("cancel", &self.cancel.is_some())
			.field("enabled", &self.enabled)
			.field("query_id", &self.query_id)
			.finish()
	}
}

/// Suppression flags for the transactions dispatched by
/// [`AsyncQuery::view_update`](crate::AsyncQuery::view_update).
///
/// All flags default to `false`. Every canceled query is also an error, so
/// `ignore_error` suppresses canceled completions too; `ignore_canceled`
/// suppresses only those.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewUpdateOptions {
	/// Skip the completion transaction for canceled queries.
	pub ignore_canceled: bool,
	/// Skip the completion transaction for successful queries.
	pub ignore_success: bool,
	/// Skip the completion transaction for failed or canceled queries.
	pub ignore_error: bool,
	/// Skip the transaction sent when loading starts.
	pub ignore_loading: bool,
}
