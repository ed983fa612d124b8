//! Async-flow sandbox.
//!
//! Types a scripted string into an editor running the async-flow plugin, then
//! prints the log feed captured during the session.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use clap::Parser;
use tracing::info;

mod config;
mod log_feed;
mod session;

use crate::config::SandboxConfig;
use crate::log_feed::LogFeed;

/// Sandbox command line arguments.
#[derive(Parser, Debug)]
#[command(name = "asyncflow-sandbox")]
#[command(about = "Type into an editor whose plugin resolves the last character through async queries")]
struct Args {
	/// Characters to type, one keystroke each
	#[arg(short, long)]
	text: Option<String>,

	/// Pause between keystrokes in milliseconds
	#[arg(long, value_name = "MS")]
	interval_ms: Option<u64>,

	/// Query debounce in milliseconds
	#[arg(long, value_name = "MS")]
	debounce_ms: Option<u64>,

	/// TOML configuration file
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

impl Args {
	fn resolve_config(&self) -> anyhow::Result<SandboxConfig> {
		let mut config = match &self.config {
			Some(path) => SandboxConfig::load(path)?,
			None => SandboxConfig::default(),
		};
		if let Some(text) = &self.text {
			config.text.clone_from(text);
		}
		if let Some(interval_ms) = self.interval_ms {
			config.interval_ms = interval_ms;
		}
		if let Some(debounce_ms) = self.debounce_ms {
			config.debounce_ms = debounce_ms;
		}
		Ok(config)
	}
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	let feed = LogFeed::new();
	setup_tracing(args.verbose, feed.clone());

	let config = args.resolve_config()?;
	info!(?config, "starting asyncflow-sandbox");

	// Only the typing session goes into the printed feed.
	feed.clear();
	let loaded = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&loaded);
	let subscription = feed.subscribe(move |entry| {
		if entry.message.starts_with("query data loaded") {
			counter.fetch_add(1, Ordering::Relaxed);
		}
	});

	let result = session::run(&config).await?;
	drop(subscription);

	println!("--- console ---");
	for entry in feed.entries() {
		println!("{entry}");
	}
	println!(
		"--- {} result(s) loaded, last: {} ---",
		loaded.load(Ordering::Relaxed),
		result.as_deref().unwrap_or("none")
	);

	Ok(())
}

fn setup_tracing(verbose: bool, feed: LogFeed) {
	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("asyncflow_query=trace,asyncflow_editor=trace,asyncflow_sandbox=debug,info")
		} else {
			EnvFilter::new("info")
		}
	});

	let stderr_layer = tracing_subscriber::fmt::layer()
		.with_writer(std::io::stderr)
		.with_target(true);

	tracing_subscriber::registry()
		.with(filter)
		.with(stderr_layer)
		.with(feed)
		.init();
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn flags_override_defaults() {
		let args = Args::parse_from(["asyncflow-sandbox", "--text", "ok", "--debounce-ms", "20"]);
		let config = args.resolve_config().unwrap();
		assert_eq!(config.text, "ok");
		assert_eq!(config.debounce_ms, 20);
		assert_eq!(config.interval_ms, SandboxConfig::default().interval_ms);
		assert!(!args.verbose);
	}

	#[test]
	fn missing_config_file_is_an_error() {
		let args = Args::parse_from(["asyncflow-sandbox", "-c", "/nonexistent/sandbox.toml"]);
		assert!(args.resolve_config().is_err());
	}
}
