//! Out-of-band metadata attached to transactions.
//!
//! Producers tag a transaction under a [`MetaKey`] and consumers look the tag
//! up again while applying it. The values never touch the document.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

/// Opaque identity token used to key transaction metadata.
///
/// Keys compare by identity: two [`MetaKey::unique`] calls never collide, while
/// clones of one key always match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetaKey(KeyRepr);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum KeyRepr {
	Named(&'static str),
	Unique(Uuid),
}

impl MetaKey {
	/// Creates a well-known key from a static name.
	pub const fn named(name: &'static str) -> Self {
		Self(KeyRepr::Named(name))
	}

	/// Draws a fresh key that matches nothing but its own clones.
	pub fn unique() -> Self {
		Self(KeyRepr::Unique(Uuid::new_v4()))
	}
}

impl fmt::Display for MetaKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.0 {
			KeyRepr::Named(name) => f.write_str(name),
			KeyRepr::Unique(id) => write!(f, "key${}", id.simple()),
		}
	}
}

/// Typed metadata map carried by a transaction.
#[derive(Default)]
pub struct Meta {
	entries: HashMap<MetaKey, Box<dyn Any + Send + Sync>>,
}

impl Meta {
	/// Stores `value` under `key`, replacing any previous value.
	pub fn set<T: Any + Send + Sync>(&mut self, key: MetaKey, value: T) {
		self.entries.insert(key, Box::new(value));
	}

	/// Returns the value under `key` if present and of type `T`.
	pub fn get<T: Any>(&self, key: &MetaKey) -> Option<&T> {
		self.entries.get(key)?.downcast_ref::<T>()
	}

	/// Returns true if no metadata is attached.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Iterates the keys present in the map.
	pub fn keys(&self) -> impl Iterator<Item = &MetaKey> {
		self.entries.keys()
	}
}

impl fmt::Debug for Meta {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.entries.keys()).finish()
	}
}
