use std::future::Future;
use std::pin::Pin;

/// Boxed future that can be moved onto another task.
///
/// Query functions return this so callers can store them behind `dyn Fn`.
pub type BoxFutureStatic<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
