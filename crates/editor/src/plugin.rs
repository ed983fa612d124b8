use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use asyncflow_primitives::{MetaKey, Transaction};
use tracing::warn;

use crate::{Dispatcher, EditorState};

/// Typed handle to one plugin's state slot.
///
/// The key doubles as the plugin's [`MetaKey`], so queries owned by the plugin
/// tag their transactions with it.
pub struct PluginKey<S> {
	key: MetaKey,
	name: &'static str,
	_state: PhantomData<fn() -> S>,
}

impl<S> PluginKey<S> {
	/// Creates a fresh key.
	pub fn new(name: &'static str) -> Self {
		Self {
			key: MetaKey::unique(),
			name,
			_state: PhantomData,
		}
	}

	/// Returns the plugin name.
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Returns the metadata key shared by the plugin and its queries.
	pub fn meta_key(&self) -> MetaKey {
		self.key
	}
}

impl<S: Send + Sync + 'static> PluginKey<S> {
	/// Returns this plugin's state in `state`.
	pub fn get<'a>(&self, state: &'a EditorState) -> Option<&'a S> {
		state.plugin_state(&self.key)?.downcast_ref::<S>()
	}
}

impl<S> Clone for PluginKey<S> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<S> Copy for PluginKey<S> {}

impl<S> fmt::Debug for PluginKey<S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PluginKey")
			.field("name", &self.name)
			.field("key", &self.key)
			.finish()
	}
}

/// A participant in the editor state machine.
pub trait Plugin: Send + Sync + 'static {
	/// Per-plugin state stored in every [`EditorState`].
	type State: Send + Sync + 'static;

	/// Returns the key under which the state is stored.
	fn key(&self) -> &PluginKey<Self::State>;

	/// Produces the initial state. Plugins registered earlier are already
	/// initialized in `state`.
	fn init(&self, state: &EditorState) -> Self::State;

	/// Produces the next state for `tr`.
	///
	/// `new_state` carries the new document and selection; plugin states in it
	/// are only filled for plugins registered earlier.
	fn apply(
		&self,
		tr: &Transaction,
		prev: &Self::State,
		old_state: &EditorState,
		new_state: &EditorState,
	) -> Self::State;

	/// Creates the plugin's view hooks, if any.
	fn view(&self) -> Option<Box<dyn PluginView>> {
		None
	}
}

/// View-side hooks of a plugin.
pub trait PluginView: Send {
	/// Runs after every state transition.
	fn update(&mut self, ctx: &ViewContext<'_>, old_state: &EditorState);

	/// Runs once when the view is torn down.
	fn destroy(&mut self, _ctx: &ViewContext<'_>) {}
}

/// What view hooks see of the editor view.
pub struct ViewContext<'a> {
	pub(crate) state: &'a EditorState,
	pub(crate) dispatcher: &'a Arc<Dispatcher>,
}

impl<'a> ViewContext<'a> {
	/// Returns the current state.
	pub fn state(&self) -> &'a EditorState {
		self.state
	}

	/// Returns the dispatcher for feeding transactions back into the view.
	pub fn dispatcher(&self) -> &'a Arc<Dispatcher> {
		self.dispatcher
	}
}

pub(crate) type PluginValue = Arc<dyn Any + Send + Sync>;

/// Object-safe view of a [`Plugin`] with its state type erased.
pub(crate) trait ErasedPlugin: Send + Sync {
	fn key(&self) -> MetaKey;
	fn name(&self) -> &'static str;
	fn init(&self, state: &EditorState) -> PluginValue;
	fn apply(
		&self,
		tr: &Transaction,
		prev: &PluginValue,
		old_state: &EditorState,
		new_state: &EditorState,
	) -> PluginValue;
	fn view(&self) -> Option<Box<dyn PluginView>>;
}

impl<T: Plugin> ErasedPlugin for T {
	fn key(&self) -> MetaKey {
		Plugin::key(self).meta_key()
	}

	fn name(&self) -> &'static str {
		Plugin::key(self).name()
	}

	fn init(&self, state: &EditorState) -> PluginValue {
		Arc::new(Plugin::init(self, state))
	}

	fn apply(
		&self,
		tr: &Transaction,
		prev: &PluginValue,
		old_state: &EditorState,
		new_state: &EditorState,
	) -> PluginValue {
		match prev.downcast_ref::<T::State>() {
			Some(prev) => Arc::new(Plugin::apply(self, tr, prev, old_state, new_state)),
			None => {
				warn!(plugin = ErasedPlugin::name(self), "plugin state has foreign type; reinitializing");
				ErasedPlugin::init(self, new_state)
			}
		}
	}

	fn view(&self) -> Option<Box<dyn PluginView>> {
		Plugin::view(self)
	}
}
