//! Asynchronous queries for a synchronous, transactional editor state machine.
//!
//! Editor state transitions are synchronous: a [`Transaction`] goes in, a new
//! state comes out. An [`AsyncQuery`] lets a plugin own one piece of async work
//! inside that model:
//!
//! * the plugin creates the query in its `apply` step (idle, nothing runs yet),
//! * [`AsyncQuery::view_update`] starts it exactly once from the view layer,
//! * on settlement the query dispatches a metadata-only transaction tagged with
//!   its identity,
//! * the plugin recognizes that transaction with [`AsyncQuery::status_changed`]
//!   and folds the result into its state.
//!
//! [`compute_changed_ranges`] is the usual trigger input: it reports which spans
//! of the document a transaction rewrote.
//!
//! [`Transaction`]: asyncflow_primitives::Transaction

mod changed_ranges;
mod error;
mod options;
mod query;
mod sink;
mod spawn;
mod status;

pub use changed_ranges::{ChangeRangeDetector, ChangedRanges, compute_changed_ranges};
pub use error::QueryError;
pub use options::{AsyncQueryOptions, CancelFn, QueryFn, ViewUpdateOptions};
pub use query::{AsyncQuery, QueryId, QueryTag};
pub use sink::QuerySink;
pub use status::{QueryStatus, StatusFilter};
