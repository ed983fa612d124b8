//! Synchronous editor state machine with plugin hooks.
//!
//! [`EditorState`] is immutable: [`EditorState::apply`] turns a transaction into
//! the next state and runs every plugin's `apply` hook. [`EditorView`] owns the
//! current state, runs plugin view hooks after each transition, and exposes a
//! [`Dispatcher`] through which background work (such as an
//! [`AsyncQuery`](asyncflow_query::AsyncQuery)) feeds transactions back in.
//!
//! [`AsyncFlowPlugin`] is the reference integration: it watches typed
//! characters and resolves each one through a debounced async query.

mod async_flow;
mod dispatch;
mod error;
mod history;
mod plugin;
mod state;
mod view;

pub use async_flow::{AsyncFlowConfig, AsyncFlowPlugin, AsyncFlowState};
pub use dispatch::Dispatcher;
pub use error::{ApplyError, EditError};
pub use history::History;
pub use plugin::{Plugin, PluginKey, PluginView, ViewContext};
pub use state::{EditorState, EditorStateBuilder};
pub use view::EditorView;
