//! The functions in this module should be used to execute futures, serving
//! as a facade to the underlying executor implementation which currently is
//! tokio.

use std::future::Future as Future03;
use tokio::task::JoinHandle;

/// Does not abort on panic, panics result in an `Err` in `JoinHandle`.
pub fn spawn_allow_panic<T: Send + 'static>(
    f: impl Future03<Output = T> + Send + 'static,
) -> JoinHandle<T> {
    tokio::spawn(f)
}
