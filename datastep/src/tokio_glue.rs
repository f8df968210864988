//! Glue code for working with `tokio`.

use std::panic;
use tokio::task;

use crate::common::*;

/// Standard future type for this crate. Like `Result`, but used by async. We
/// mark it as `Send` so it can be moved between threads, and box it so that
/// trait methods can return it.
pub(crate) type BoxFuture<T, E = Error> =
    futures::future::BoxFuture<'static, Result<T, E>>;

/// Run a synchronous function `f` in a background worker thread and return its
/// value. Panics in `f` are resumed on the calling task.
pub(crate) async fn spawn_blocking<F, T>(f: F) -> Result<T>
where
    F: (FnOnce() -> Result<T>) + Send + 'static,
    T: Send + 'static,
{
    match task::spawn_blocking(f).await {
        Ok(f_result) => f_result,
        Err(join_err) => match join_err.try_into_panic() {
            Ok(panic_value) => panic::resume_unwind(panic_value),
            Err(join_err) => {
                Err(format_err!("background thread failed: {}", join_err))
            }
        },
    }
}

#[tokio::test]
async fn spawn_blocking_returns_value_and_errors() {
    assert_eq!(spawn_blocking(|| Ok(2 + 2)).await.unwrap(), 4);
    let err = spawn_blocking(|| -> Result<()> { Err(format_err!("nope")) })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "nope");
}
