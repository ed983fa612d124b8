//! Log feed captured from tracing events.
//!
//! [`LogFeed`] is a [`tracing_subscriber::Layer`] that keeps every event it
//! sees and forwards it to registered listeners. Listeners are removed when
//! their [`Subscription`] is dropped.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;

/// One captured event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
	pub level: Level,
	pub target: String,
	pub message: String,
}

impl fmt::Display for LogEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:>5} {}: {}", self.level, self.target, self.message)
	}
}

type Listener = Arc<dyn Fn(&LogEntry) + Send + Sync>;

#[derive(Default)]
struct Inner {
	entries: Mutex<Vec<LogEntry>>,
	listeners: Mutex<Vec<(u64, Listener)>>,
	next_listener: AtomicU64,
}

/// Shared buffer of captured events. Clones share the buffer.
#[derive(Clone, Default)]
pub struct LogFeed {
	inner: Arc<Inner>,
}

impl LogFeed {
	pub fn new() -> Self {
		Self::default()
	}

	/// Calls `listener` with every event captured from now on, until the
	/// returned [`Subscription`] is dropped.
	pub fn subscribe<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&LogEntry) + Send + Sync + 'static,
	{
		let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
		self.inner.listeners.lock().push((id, Arc::new(listener)));
		Subscription {
			feed: Arc::downgrade(&self.inner),
			id,
		}
	}

	/// Returns a copy of every captured event, oldest first.
	pub fn entries(&self) -> Vec<LogEntry> {
		self.inner.entries.lock().clone()
	}

	/// Drops every captured event. Listeners stay registered.
	pub fn clear(&self) {
		self.inner.entries.lock().clear();
	}

	fn push(&self, entry: LogEntry) {
		// Listeners may log themselves; call them without holding either lock.
		let listeners: Vec<Listener> = self
			.inner
			.listeners
			.lock()
			.iter()
			.map(|(_, listener)| Arc::clone(listener))
			.collect();
		for listener in &listeners {
			listener(&entry);
		}
		self.inner.entries.lock().push(entry);
	}
}

impl fmt::Debug for LogFeed {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LogFeed")
			.field("entries", &self.inner.entries.lock().len())
			.field("listeners", &self.inner.listeners.lock().len())
			.finish()
	}
}

/// Registration handle returned by [`LogFeed::subscribe`].
#[must_use = "dropping a subscription unsubscribes its listener"]
pub struct Subscription {
	feed: Weak<Inner>,
	id: u64,
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(inner) = self.feed.upgrade() {
			inner.listeners.lock().retain(|(id, _)| *id != self.id);
		}
	}
}

/// Visitor for extracting the message field from events.
#[derive(Default)]
struct MessageVisitor {
	message: String,
	fields: Vec<(String, String)>,
}

impl MessageVisitor {
	fn finish(self, fallback: &str) -> String {
		let message = if self.message.is_empty() {
			fallback.to_string()
		} else {
			self.message
		};
		if self.fields.is_empty() {
			return message;
		}

		let fields = self
			.fields
			.iter()
			.map(|(k, v)| format!("{k}={v}"))
			.collect::<Vec<_>>()
			.join(" ");
		format!("{message} {{{fields}}}")
	}
}

impl Visit for MessageVisitor {
	fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
		if field.name() == "message" {
			self.message = format!("{value:?}");
		} else {
			self.fields.push((field.name().to_string(), format!("{value:?}")));
		}
	}

	fn record_str(&mut self, field: &Field, value: &str) {
		if field.name() == "message" {
			self.message = value.to_string();
		} else {
			self.fields.push((field.name().to_string(), value.to_string()));
		}
	}
}

impl<S: Subscriber> tracing_subscriber::Layer<S> for LogFeed {
	fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
		let metadata = event.metadata();
		// Only WARN+ from crates outside the workspace.
		if !metadata.target().starts_with("asyncflow") && *metadata.level() > Level::WARN {
			return;
		}

		let mut visitor = MessageVisitor::default();
		event.record(&mut visitor);
		self.push(LogEntry {
			level: *metadata.level(),
			target: metadata.target().to_string(),
			message: visitor.finish(metadata.name()),
		});
	}
}
