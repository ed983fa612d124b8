use std::future::Future;
use std::sync::OnceLock;

use tokio::task::JoinHandle;

fn runtime_handle() -> tokio::runtime::Handle {
	if let Ok(handle) = tokio::runtime::Handle::try_current() {
		return handle;
	}

	static GLOBAL_RT: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
	let runtime = GLOBAL_RT.get_or_init(|| {
		tokio::runtime::Builder::new_multi_thread()
			.enable_all()
			.worker_threads(1)
			.thread_name("asyncflow-query")
			.build()
			.expect("failed to build asyncflow-query fallback tokio runtime")
	});
	runtime.handle().clone()
}

/// Spawns a query settlement task on the ambient runtime.
///
/// Falls back to a lazily built background runtime when called outside tokio.
pub(crate) fn spawn_settlement<F>(fut: F) -> JoinHandle<()>
where
	F: Future<Output = ()> + Send + 'static,
{
	tracing::trace!("query.spawn_settlement");
	runtime_handle().spawn(fut)
}
